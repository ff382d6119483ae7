mod commands;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use app::config::load_config;
use app::logging;
use app::runtime::Runtime;
use clap::Parser;
use common::DashResult;
use event_engine::event::EventPayload;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::Outcome;

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "模拟行情看板：订阅、实时价格、走势图")]
struct Cli {
    /// 配置文件路径，不存在时使用默认配置
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// 用户标识，订阅列表按用户保存
    #[arg(long, env = "STOCKDASH_USER")]
    user: Option<String>,
}

async fn run_system(cli: Cli) -> DashResult<()> {
    println!("[启动] 加载配置...");
    let config = load_config(&cli.config)?;
    logging::init_with_default(&config.log_level)?;

    let mut runtime = Runtime::new(config, cli.user.as_deref())?;
    runtime.start_service()?;

    println!("{}", render::format_catalog(&runtime.session));
    println!("{}", render::format_subscriptions(runtime.session.subscriptions()));
    println!("输入 help 查看指令");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut refresh = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("收到退出信号，程序结束。");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin 关闭
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match commands::parse(&line) {
                    Ok(cmd) => match commands::handle(&mut runtime.session, cmd) {
                        Outcome::Output(text) => println!("{text}"),
                        Outcome::Quit => break,
                    },
                    Err(msg) => println!("{msg}"),
                }
            }
            _ = refresh.tick() => {
                for event in runtime.session.drain_events() {
                    if let EventPayload::Tick(tick) = &event.data {
                        if let Some(text) = render::format_tick(&runtime.session, tick) {
                            println!("{text}");
                        }
                    }
                }
            }
        }
    }

    runtime.stop_service();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run_system(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}
