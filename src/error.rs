use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 远程服务错误
    #[error("远程服务错误: {0}")]
    Remote(#[from] RemoteError),
    /// 数据解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    InvalidFile {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在，请设置 API 密钥或使用 --dry-run")]
    MissingCredential { var_name: String },
    /// 参数取值非法
    #[error("参数 {name} 非法: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 备份失败，原文件保持不变
    #[error("备份文件失败 ({path}): {source}")]
    BackupFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 没有匹配的文件
    #[error("{dir} 中没有匹配 {pattern} 的文件")]
    NoMatches { dir: String, pattern: String },
    /// glob 模式非法
    #[error("文件匹配模式非法 ({pattern}): {reason}")]
    BadPattern { pattern: String, reason: String },
}

/// 远程服务错误
#[derive(Debug, Error)]
pub enum RemoteError {
    /// 网络请求失败（包括超时）
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 返回非成功状态码
    #[error("返回错误状态 ({endpoint}): {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// 响应体无法解析或缺少字段
    #[error("响应格式不符合预期 ({endpoint}): {detail}")]
    Malformed { endpoint: String, detail: String },
    /// 请求体构建失败
    #[error("构建请求失败: {0}")]
    BuildRequest(String),
}

/// 数据解析错误
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON 解析失败
    #[error("JSON 解析失败 ({path}): {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return AppError::File(FileError::NotFound { path: path.into() });
        }
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建 JSON 解析错误
    pub fn json_failed(path: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::Parse(ParseError::Json {
            path: path.into(),
            source,
        })
    }

    /// 创建请求失败错误
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Remote(RemoteError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建响应格式错误
    pub fn malformed(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        AppError::Remote(RemoteError::Malformed {
            endpoint: endpoint.into(),
            detail: detail.into(),
        })
    }

    /// 是否为远程调用失败（可以按缺失信号处理）
    pub fn is_remote(&self) -> bool {
        matches!(self, AppError::Remote(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
