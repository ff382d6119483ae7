// common/error.rs
use thiserror::Error;

/// 全局错误类型：只有启动期的致命条件会走到这里
#[derive(Debug, Error)]
pub enum DashError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid symbol catalog: {0}")]
    Catalog(String),

    #[error("random source unavailable: {0}")]
    RandomSource(String),

    #[error("invalid viewport: {0}")]
    Viewport(String),

    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unexpected error: {0}")]
    Other(String),
}

pub type DashResult<T> = Result<T, DashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn read_missing() -> DashResult<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.toml")?)
        }
        assert!(matches!(read_missing(), Err(DashError::Io(_))));
    }

    #[test]
    fn display_includes_context() {
        let err = DashError::Catalog("duplicate symbol GOOG".to_string());
        assert_eq!(err.to_string(), "invalid symbol catalog: duplicate symbol GOOG");
    }
}
