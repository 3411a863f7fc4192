use crate::utils::logging::truncate_text;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 题目记录
///
/// 只关心 `title`，其余字段（`subjectId`、`year`、`qNum` 等）原样透传
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Question {
    /// 从文档字段构建题目记录
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        let title = match fields.remove("title") {
            Some(Value::String(title)) => Some(title),
            Some(other) => {
                // 非字符串的 title 不参与转换，放回透传字段
                fields.insert("title".to_string(), other);
                None
            }
            None => None,
        };
        Self { title, fields }
    }

    /// 题号（排序字段）
    pub fn q_num(&self) -> Option<i64> {
        self.fields.get("qNum").and_then(Value::as_i64)
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview = truncate_text(self.title.as_deref().unwrap_or(""), 80);

        match self.q_num() {
            Some(q_num) => write!(f, "#{} {}", q_num, preview),
            None => write!(f, "#? {}", preview),
        }
    }
}

/// `POST /convert` 请求体
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConvertRequest {
    pub subject: String,
    /// 年份，保持原始 JSON 类型（数字和字符串在题库中是不同的值）
    pub year: Value,
}

/// `POST /convert` 成功响应
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResponse {
    pub questions: Vec<Question>,
}

/// 失败响应
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
