use common::{DashError, DashResult};
use tracing_subscriber::EnvFilter;

/// 解析过滤指令：RUST_LOG 非空时优先，否则用配置里的级别。两者写错都报 Config 错误
pub fn build_filter(rust_log: Option<&str>, default_level: &str) -> DashResult<EnvFilter> {
    match rust_log.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| DashError::Config(format!("invalid RUST_LOG {directives:?}: {e}"))),
        None => EnvFilter::try_new(default_level)
            .map_err(|e| DashError::Config(format!("invalid log_level {default_level:?}: {e}"))),
    }
}

/// 安装全局订阅器；重复调用无副作用
pub fn init_with_default(default_level: &str) -> DashResult<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(rust_log.as_deref(), default_level)?;

    // fmt 订阅器自带 tracing-log 桥接，各 crate 的 log:: 记录也会输出
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
    Ok(())
}
