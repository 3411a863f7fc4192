use crate::clients::{FirestoreClient, MathJaxClient};
use crate::config::Config;
use crate::services::{LatexConverter, QuestionService};
use crate::utils::logging::log_startup;
use crate::{router, AppState};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// 应用主结构
pub struct App {
    config: Config,
    state: AppState,
}

impl App {
    /// 初始化应用
    ///
    /// 加载凭据、构建客户端，全部完成后才开始监听
    pub async fn initialize(mut config: Config) -> Result<Self> {
        config.load_credentials().context("无法加载 Firestore 凭据")?;
        config.validate().context("配置不完整")?;

        log_startup(&config);

        let store = Arc::new(FirestoreClient::new(&config));
        let renderer = Arc::new(MathJaxClient::new(&config));
        let state = AppState {
            questions: QuestionService::new(store, LatexConverter::new(renderer)),
        };

        Ok(Self { config, state })
    }

    /// 运行 HTTP 服务
    pub async fn run(self) -> Result<()> {
        let address = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("无法监听端口 {}", self.config.port))?;

        info!("Server running on port {}", self.config.port);

        axum::serve(listener, router(self.state))
            .await
            .context("HTTP 服务异常退出")?;

        Ok(())
    }
}
