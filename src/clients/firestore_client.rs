/// Firestore 题库客户端
///
/// 通过 REST `runQuery` 接口按科目和年份查询题目
use crate::clients::firestore_value;
use crate::config::Config;
use crate::error::StoreError;
use crate::models::Question;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";

/// 模拟器接受任意 token，`owner` 拥有全部权限
const EMULATOR_TOKEN: &str = "owner";

/// 题库能力：按科目 + 年份取出按题号排序的题目
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn fetch_questions(&self, subject: &str, year: &Value)
        -> Result<Vec<Question>, StoreError>;
}

/// Firestore 客户端
pub struct FirestoreClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    database_id: String,
    collection: String,
    token: String,
}

impl FirestoreClient {
    /// 创建新的 Firestore 客户端
    pub fn new(config: &Config) -> Self {
        let (base_url, token) = match &config.firestore_emulator_host {
            Some(host) => (format!("http://{}/v1", host), EMULATOR_TOKEN.to_string()),
            None => (
                FIRESTORE_API_BASE.to_string(),
                config.firestore_access_token.clone().unwrap_or_default(),
            ),
        };

        Self {
            http: reqwest::Client::new(),
            base_url,
            project_id: config.firestore_project_id.clone(),
            database_id: config.firestore_database_id.clone(),
            collection: config.firestore_collection.clone(),
            token,
        }
    }

    /// `runQuery` 接口地址
    pub fn endpoint(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents:runQuery",
            self.base_url, self.project_id, self.database_id
        )
    }

    /// 构建结构化查询
    ///
    /// `subjectId == subject AND year == year ORDER BY qNum ASC`
    pub fn build_query(&self, subject: &str, year: &Value) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "compositeFilter": {
                        "op": "AND",
                        "filters": [
                            equal_filter("subjectId", &json!(subject)),
                            equal_filter("year", year),
                        ]
                    }
                },
                "orderBy": [{
                    "field": { "fieldPath": "qNum" },
                    "direction": "ASCENDING"
                }]
            }
        })
    }
}

/// 等值过滤；`null` 只能用一元过滤 `IS_NULL` 表达
fn equal_filter(field: &str, value: &Value) -> Value {
    if value.is_null() {
        return json!({
            "unaryFilter": {
                "op": "IS_NULL",
                "field": { "fieldPath": field }
            }
        });
    }

    json!({
        "fieldFilter": {
            "field": { "fieldPath": field },
            "op": "EQUAL",
            "value": firestore_value::encode(value)
        }
    })
}

/// 解析 `runQuery` 的响应
///
/// 响应是一个数组，每项可能带 `document`；无结果时只有 `readTime`
pub fn parse_run_query(body: &Value) -> Result<Vec<Question>, StoreError> {
    let rows = body
        .as_array()
        .ok_or_else(|| StoreError::Decode("runQuery 响应不是数组".to_string()))?;

    let questions = rows
        .iter()
        .filter_map(|row| row.get("document"))
        .map(|document| {
            Question::from_fields(firestore_value::decode_fields(document.get("fields")))
        })
        .collect();

    Ok(questions)
}

#[async_trait]
impl QuestionStore for FirestoreClient {
    async fn fetch_questions(
        &self,
        subject: &str,
        year: &Value,
    ) -> Result<Vec<Question>, StoreError> {
        let endpoint = self.endpoint();
        let query = self.build_query(subject, year);

        debug!("查询题库: {}", endpoint);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(&query)
            .send()
            .await
            .map_err(|source| StoreError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::BadResponse {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|source| StoreError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        let questions = parse_run_query(&body)?;
        debug!("题库返回 {} 道题目", questions.len());

        Ok(questions)
    }
}
