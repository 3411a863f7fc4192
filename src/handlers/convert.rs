use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{error, info};

use crate::{
    error::AppError,
    handlers::extract::ConvertPayload,
    models::{ConvertResponse, ErrorResponse},
    AppState,
};

/// 失败响应中固定的错误信息
pub const CONVERT_ERROR_MESSAGE: &str = "Error processing the conversion";

pub fn routes() -> Router<AppState> {
    Router::new().route("/convert", post(convert))
}

async fn convert(
    State(state): State<AppState>,
    ConvertPayload(request): ConvertPayload,
) -> Result<Json<ConvertResponse>, ConvertFailure> {
    info!("{} {}", request.subject, request.year);

    let questions = state
        .questions
        .convert_questions(&request.subject, &request.year)
        .await?;

    Ok(Json(ConvertResponse { questions }))
}

/// 请求级失败
///
/// 不区分原因，一律返回 500 和固定信息
#[derive(Debug)]
pub struct ConvertFailure(pub AppError);

impl From<AppError> for ConvertFailure {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ConvertFailure {
    fn into_response(self) -> Response {
        error!("Conversion error: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                success: false,
                error: CONVERT_ERROR_MESSAGE.to_string(),
            }),
        )
            .into_response()
    }
}
