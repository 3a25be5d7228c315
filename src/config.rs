//! 程序配置
//!
//! 配置来源（优先级从高到低）：命令行参数 → `config.toml` → 内置默认值。
//! API 密钥从 `env_var_name` 指定的环境变量中读取，每次运行只读取一次。

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, ConfigError};

/// 单个远程服务的配置（对应 `[reranker.openai]` / `[llm.openai]`）
#[derive(Clone, Debug, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub model: String,
    /// 存放 Bearer 密钥的环境变量名
    #[serde(default = "default_env_var")]
    pub env_var_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// 单次请求超时（秒），未设置时按服务类型取默认值
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderSection {
    pub openai: EndpointConfig,
}

/// 流水线参数
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 评估阶段同时进行的远程请求数
    pub evaluate_concurrency: usize,
    /// 重新生成阶段同时进行的远程请求数
    pub regenerate_concurrency: usize,
    /// 每个单词的最大尝试次数
    pub max_retries: usize,
    /// 低于该分数的单词需要重新生成
    pub threshold: f64,
    /// 两次尝试之间的等待时间（毫秒）
    pub retry_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            evaluate_concurrency: 20,
            regenerate_concurrency: 30,
            max_retries: 3,
            threshold: 1.0,
            retry_delay_ms: 1000,
        }
    }
}

/// 配置文件
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_reranker")]
    pub reranker: ProviderSection,
    #[serde(default = "default_llm")]
    pub llm: ProviderSection,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reranker: default_reranker(),
            llm: default_llm(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载；文件不存在时使用默认值
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("⚠️ 配置文件 {} 不存在，使用默认配置", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(AppError::file_read_failed(path.display().to_string(), e)),
        };
        Self::from_toml_str(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            AppError::Config(ConfigError::InvalidFile {
                path: origin.to_string(),
                source,
            })
        })
    }
}

/// 解析后的远程服务设置，传入各个客户端
#[derive(Clone, Debug)]
pub struct RemoteSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout: Duration,
}

/// 命令行对远程服务配置的覆盖
#[derive(Clone, Debug, Default)]
pub struct EndpointOverrides {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

impl EndpointConfig {
    /// 合并命令行覆盖并读取环境变量中的密钥
    pub fn resolve(&self, overrides: &EndpointOverrides, default_timeout: Duration) -> RemoteSettings {
        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| std::env::var(&self.env_var_name).ok())
            .filter(|key| !key.is_empty());
        RemoteSettings {
            base_url: overrides.base_url.clone().unwrap_or_else(|| self.base_url.clone()),
            model: overrides.model.clone().unwrap_or_else(|| self.model.clone()),
            api_key,
            temperature: overrides.temperature.unwrap_or(self.temperature),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(default_timeout),
        }
    }
}

impl RemoteSettings {
    /// 打印当前使用的服务配置（不输出密钥）
    pub fn log(&self, title: &str) {
        info!("{}:", title);
        info!("  Base URL: {}", self.base_url);
        info!("  Model: {}", self.model);
        info!(
            "  API Key: {}",
            if self.api_key.is_some() { "***" } else { "Not set" }
        );
    }
}

/// 相似度请求默认超时
pub const RERANK_TIMEOUT: Duration = Duration::from_secs(30);
/// 聊天请求默认超时
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

fn default_env_var() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_reranker() -> ProviderSection {
    ProviderSection {
        openai: EndpointConfig {
            base_url: "http://127.0.0.1:8000".to_string(),
            model: "BAAI/bge-reranker-v2-m3".to_string(),
            env_var_name: default_env_var(),
            temperature: default_temperature(),
            timeout_secs: None,
        },
    }
}

fn default_llm() -> ProviderSection {
    ProviderSection {
        openai: EndpointConfig {
            base_url: "http://127.0.0.1:8001/v1".to_string(),
            model: "llm_instruct".to_string(),
            env_var_name: default_env_var(),
            temperature: default_temperature(),
            timeout_secs: None,
        },
    }
}
