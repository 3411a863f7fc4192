use axum::{
    extract::{FromRequest, Request},
    http::header,
    Form, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::AppError, handlers::convert::ConvertFailure, models::ConvertRequest};

/// `POST /convert` 的请求体，支持 JSON 和表单两种编码
///
/// 表单中的值都是字符串，年份因此按字符串查询
pub struct ConvertPayload(pub ConvertRequest);

#[derive(Deserialize)]
struct ConvertForm {
    subject: String,
    year: String,
}

impl<S: Send + Sync> FromRequest<S> for ConvertPayload {
    type Rejection = ConvertFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(form) = Form::<ConvertForm>::from_request(req, state)
                .await
                .map_err(|e| AppError::Payload(e.body_text()))?;
            return Ok(ConvertPayload(ConvertRequest {
                subject: form.subject,
                year: Value::String(form.year),
            }));
        }

        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::Payload(e.body_text()))?;

        // 只接受对象；数组会被 serde 按字段顺序解析成结构体
        if !body.is_object() {
            return Err(AppError::Payload("请求体必须是 JSON 对象".to_string()).into());
        }

        let request = serde_json::from_value::<ConvertRequest>(body)
            .map_err(|e| AppError::Payload(e.to_string()))?;
        Ok(ConvertPayload(request))
    }
}
