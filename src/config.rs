use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// 程序配置
///
/// 进程启动时读取一次，之后不再修改
#[derive(Clone, Debug)]
pub struct Config {
    /// 监听端口
    pub port: u16,
    // --- Firestore 配置 ---
    pub firestore_project_id: String,
    pub firestore_database_id: String,
    /// 题目集合名称
    pub firestore_collection: String,
    pub firestore_access_token: Option<String>,
    /// 模拟器地址（如 `localhost:8080`），设置后不使用真实凭据
    pub firestore_emulator_host: Option<String>,
    /// TOML 凭据文件路径
    pub firestore_credentials: Option<String>,
    // --- MathJax 配置 ---
    pub mathjax_url: String,
    /// 渲染字体
    pub mathjax_font: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            firestore_project_id: String::new(),
            firestore_database_id: "(default)".to_string(),
            firestore_collection: "questions".to_string(),
            firestore_access_token: None,
            firestore_emulator_host: None,
            firestore_credentials: None,
            mathjax_url: "http://127.0.0.1:8003/typeset".to_string(),
            mathjax_font: "TeX".to_string(),
        }
    }
}

/// 凭据文件内容
#[derive(Debug, Default, Deserialize)]
pub struct FirestoreCredentials {
    pub project_id: Option<String>,
    pub access_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构建配置，未设置或无法解析的值使用默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        Self {
            port: lookup("PORT").and_then(|v| v.parse().ok()).unwrap_or(default.port),
            firestore_project_id: lookup("FIRESTORE_PROJECT_ID").unwrap_or(default.firestore_project_id),
            firestore_database_id: lookup("FIRESTORE_DATABASE_ID").unwrap_or(default.firestore_database_id),
            firestore_collection: lookup("FIRESTORE_COLLECTION").unwrap_or(default.firestore_collection),
            firestore_access_token: lookup("FIRESTORE_ACCESS_TOKEN").filter(|v| !v.is_empty()),
            firestore_emulator_host: lookup("FIRESTORE_EMULATOR_HOST").filter(|v| !v.is_empty()),
            firestore_credentials: lookup("FIRESTORE_CREDENTIALS").filter(|v| !v.is_empty()),
            mathjax_url: lookup("MATHJAX_URL").unwrap_or(default.mathjax_url),
            mathjax_font: lookup("MATHJAX_FONT").unwrap_or(default.mathjax_font),
        }
    }

    /// 加载凭据文件（如果配置了）
    ///
    /// 文件中的值只补充环境变量中缺失的部分
    pub fn load_credentials(&mut self) -> Result<(), ConfigError> {
        let Some(path) = self.firestore_credentials.clone() else {
            return Ok(());
        };

        let credentials = read_credentials(Path::new(&path))?;

        if self.firestore_project_id.is_empty() {
            if let Some(project_id) = credentials.project_id {
                self.firestore_project_id = project_id;
            }
        }
        if self.firestore_access_token.is_none() {
            self.firestore_access_token = credentials.access_token;
        }

        Ok(())
    }

    /// 检查启动所需的配置是否齐全
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.firestore_project_id.is_empty() {
            return Err(ConfigError::Missing("FIRESTORE_PROJECT_ID".to_string()));
        }
        if self.firestore_emulator_host.is_none() && self.firestore_access_token.is_none() {
            return Err(ConfigError::Missing("FIRESTORE_ACCESS_TOKEN".to_string()));
        }
        Ok(())
    }
}

fn read_credentials(path: &Path) -> Result<FirestoreCredentials, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::CredentialsRead {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::CredentialsParse {
        path: path.display().to_string(),
        source,
    })
}
