use std::path::PathBuf;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
///
/// `Io`, `Parse` and `Render` abort a run. `NotApi` and `Lookup` are absorbed by the
/// stage that raised them, and `SchemaSource` ends only the dependent generation step.
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    ParseError { file: PathBuf, message: String },
    NotApi { method: String },
    Lookup { name: String },
    RenderError { message: String, text: String },
    SchemaSource(String),
    Config(String),
    InvalidArgument(String),
    SerializationError(String),
}

impl Error {
    /// Whether this error must stop the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::NotApi { .. } | Error::Lookup { .. } | Error::SchemaSource(_)
        )
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO 错误: {}", e),
            Error::ParseError { file, message } => {
                write!(f, "解析错误 {}: {}", file.display(), message)
            }
            Error::NotApi { method } => write!(f, "{} 不是 API", method),
            Error::Lookup { name } => write!(f, "未找到声明: {}", name),
            Error::RenderError { message, text } => {
                write!(f, "代码生成错误: {}\n{}", message, text)
            }
            Error::SchemaSource(msg) => write!(f, "表结构查询失败: {}", msg),
            Error::Config(msg) => write!(f, "配置错误: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "无效参数: {}", msg),
            Error::SerializationError(msg) => write!(f, "序列化错误: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON 序列化错误: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML 序列化错误: {}", err))
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::ParseError {
            file: PathBuf::from("<unknown>"),
            message: err.to_string(),
        }
    }
}
