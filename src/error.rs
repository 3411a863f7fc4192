use thiserror::Error;

/// 请求级错误类型
///
/// 单个公式的渲染错误在替换服务内部处理，不会出现在这里
#[derive(Debug, Error)]
pub enum AppError {
    /// 题库（Firestore）错误
    #[error("题库错误: {0}")]
    Store(#[from] StoreError),
    /// 请求体错误
    #[error("请求体错误: {0}")]
    Payload(String),
}

/// 题库查询错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 返回非 2xx 状态码
    #[error("返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 返回内容无法解析
    #[error("响应解析失败: {0}")]
    Decode(String),
}

/// 公式渲染错误
#[derive(Debug, Error)]
pub enum RenderError {
    /// 网络请求失败
    #[error("渲染请求失败: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 渲染服务返回非 2xx 状态码
    #[error("渲染服务返回错误响应: status={status}")]
    BadResponse { status: u16 },
    /// 渲染服务报告了 TeX 错误
    #[error("TeX 错误: {}", .0.join("; "))]
    Tex(Vec<String>),
    /// 渲染结果为空
    #[error("渲染结果为空")]
    EmptyOutput,
}

/// 替换流程错误（非单个公式失败）
#[derive(Debug, Error)]
pub enum ConvertError {
    /// 渲染任务异常退出
    #[error("渲染任务异常退出: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 缺少必需配置
    #[error("缺少配置项 {0}")]
    Missing(String),
    /// 凭据文件读取失败
    #[error("读取凭据文件失败 ({path}): {source}")]
    CredentialsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 凭据文件解析失败
    #[error("解析凭据文件失败 ({path}): {source}")]
    CredentialsParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
