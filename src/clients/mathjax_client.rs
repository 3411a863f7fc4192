/// MathJax 渲染客户端
///
/// 调用外部 MathJax 排版服务，把 LaTeX 片段转成 SVG
use crate::config::Config;
use crate::error::RenderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 输入格式（排版模式）
///
/// 只按行间公式排版，行内显示由替换服务通过样式处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Tex,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Tex => "TeX",
        }
    }
}

/// 渲染能力：一个 LaTeX 片段 → 一段 SVG 标记
#[async_trait]
pub trait MathRenderer: Send + Sync {
    async fn render(&self, latex: &str, format: InputFormat) -> Result<String, RenderError>;
}

#[derive(Debug, Serialize)]
struct TypesetRequest<'a> {
    math: &'a str,
    format: &'static str,
    svg: bool,
    font: &'a str,
}

#[derive(Debug, Deserialize)]
struct TypesetResponse {
    #[serde(default)]
    svg: Option<String>,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

/// MathJax 客户端
pub struct MathJaxClient {
    http: reqwest::Client,
    url: String,
    font: String,
}

impl MathJaxClient {
    /// 创建新的 MathJax 客户端，字体在此固定
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.mathjax_url.clone(),
            font: config.mathjax_font.clone(),
        }
    }
}

#[async_trait]
impl MathRenderer for MathJaxClient {
    async fn render(&self, latex: &str, format: InputFormat) -> Result<String, RenderError> {
        debug!("渲染公式: {}", latex);

        let request = TypesetRequest {
            math: latex,
            format: format.as_str(),
            svg: true,
            font: &self.font,
        };

        let response = self.http.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::BadResponse {
                status: status.as_u16(),
            });
        }

        let body: TypesetResponse = response.json().await?;
        into_svg(body)
    }
}

fn into_svg(body: TypesetResponse) -> Result<String, RenderError> {
    if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
        return Err(RenderError::Tex(errors));
    }

    match body.svg {
        Some(svg) if !svg.is_empty() => Ok(svg),
        _ => Err(RenderError::EmptyOutput),
    }
}
