// runtime.rs
use std::sync::{Arc, Mutex};

use common::DashResult;
use market_sim::RngFactors;
use subscription::JsonFileKv;

use crate::config::FinalConfig;
use crate::context::DashboardSession;

pub struct Runtime {
    pub session: DashboardSession,
}

impl Runtime {
    /// 创建 Runtime：打开订阅文件、取系统随机源、构造会话
    pub fn new(config: FinalConfig, identity: Option<&str>) -> DashResult<Self> {
        match &config.source {
            Some(path) => log::info!(target: "app::runtime", "[启动] 配置文件: {}", path.display()),
            None => log::info!(target: "app::runtime", "[启动] 未发现配置文件，使用默认配置"),
        }
        log::info!(
            target: "app::runtime",
            "[启动] 标的 {} 个，tick 间隔 {} ms，历史窗口 {}",
            config.catalog.len(),
            config.tick_period.as_millis(),
            config.history_capacity
        );

        let source = RngFactors::from_os()?;
        let kv = JsonFileKv::open(&config.storage_path);
        log::info!(target: "app::runtime", "[启动] 订阅文件: {}", kv.path().display());
        let kv = Arc::new(Mutex::new(kv));
        let session = DashboardSession::new(config, identity, Box::new(kv), Box::new(source))?;
        log::info!(target: "app::runtime", "[启动] 用户 {} 的会话已创建", session.store().identity());
        Ok(Self { session })
    }

    /// 启动服务：启动调度器
    pub fn start_service(&mut self) -> DashResult<()> {
        if self.session.activate()? {
            log::info!(target: "app::runtime", "服务已启动！按 Ctrl+C 退出。");
        }
        Ok(())
    }

    pub fn stop_service(&mut self) {
        if self.session.deactivate() {
            log::info!(target: "app::runtime", "服务已停止");
        }
    }

    /// 启动后一直运行到 Ctrl+C
    pub async fn run_until_ctrl_c(&mut self) -> DashResult<()> {
        self.start_service()?;
        tokio::signal::ctrl_c().await?;
        log::info!(target: "app::runtime", "收到退出信号，程序结束。");
        self.stop_service();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config_in(dir: &std::path::Path) -> FinalConfig {
        FinalConfig {
            storage_path: dir.join("subs.json"),
            ..FinalConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn service_ticks_and_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut rt = Runtime::new(config_in(dir.path()), Some("trader@example.com")).unwrap();
        rt.session.toggle_by_name("TSLA");

        rt.start_service().unwrap();
        assert!(rt.session.scheduler().is_running());
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        rt.stop_service();
        assert!(!rt.session.scheduler().is_running());

        let tsla_history = {
            let market = market_sim::market::read_market(rt.session.market());
            let tsla = market.catalog().get("TSLA").unwrap().clone();
            market.history(&tsla)
        };
        assert_eq!(tsla_history.len(), 2);

        let content = std::fs::read_to_string(dir.path().join("subs.json")).unwrap();
        assert!(content.contains("subscriptions_trader@example.com"));
        assert!(content.contains("TSLA"));

        let reopened = Runtime::new(config_in(dir.path()), Some("trader@example.com")).unwrap();
        let names: Vec<&str> = reopened.session.subscriptions().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["TSLA"]);
    }

    #[test]
    fn runtime_requires_identity() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Runtime::new(config_in(dir.path()), Some("  ")).is_err());
    }
}
