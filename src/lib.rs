//! # Question LaTeX Server
//!
//! 从题库取出题目，把标题中的 LaTeX 公式转换成行内 SVG 后以 JSON 返回
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Clients）
//! - `clients/` - 外部协作方，只暴露能力
//! - `FirestoreClient` - 按科目 + 年份查询题目（`QuestionStore`）
//! - `MathJaxClient` - 把 LaTeX 片段渲染成 SVG（`MathRenderer`）
//!
//! ### ② 业务能力层（Services）
//! - `LatexConverter` - 按分隔符扫描文本并替换公式
//! - `QuestionService` - 查询题目并逐题转换标题
//!
//! ### ③ 接口层（Handlers）
//! - `GET /` - 存活检查
//! - `POST /convert` - 转换指定科目和年份的题目
//!
//! ### ④ 编排层（App）
//! - `app` - 启动时一次性构建配置和客户端，然后开始监听
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use axum::{middleware, Router};

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::Question;
pub use services::{LatexConverter, QuestionService};

#[derive(Clone)]
pub struct AppState {
    pub questions: QuestionService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::homepage::routes())
        .merge(handlers::convert::routes())
        .layer(middleware::from_fn(handlers::cors::cors))
        .with_state(state)
}
