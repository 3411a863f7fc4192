//! 题目转换服务
//!
//! 从题库取出题目，逐题替换标题中的公式

use crate::clients::QuestionStore;
use crate::error::AppResult;
use crate::models::Question;
use crate::services::LatexConverter;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// 题目转换服务
#[derive(Clone)]
pub struct QuestionService {
    store: Arc<dyn QuestionStore>,
    converter: LatexConverter,
}

impl QuestionService {
    /// 创建新的题目转换服务
    pub fn new(store: Arc<dyn QuestionStore>, converter: LatexConverter) -> Self {
        Self { store, converter }
    }

    /// 查询并转换题目
    ///
    /// # 参数
    /// - `subject`: 科目ID
    /// - `year`: 年份（保持请求中的 JSON 类型）
    ///
    /// # 返回
    /// 返回按题号排序、标题已替换的题目列表；查询失败时整体失败
    pub async fn convert_questions(&self, subject: &str, year: &Value) -> AppResult<Vec<Question>> {
        let mut questions = self.store.fetch_questions(subject, year).await?;

        info!("✓ 找到 {} 道题目 ({} / {})", questions.len(), subject, year);

        // 逐题处理，题目之间不并发
        for question in questions.iter_mut() {
            debug!("转换题目 {}", question);
            if let Some(title) = question.title.as_deref() {
                let converted = self.converter.process_string(title).await;
                question.title = Some(converted);
            }
        }

        Ok(questions)
    }
}
