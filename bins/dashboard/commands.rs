use app::context::DashboardSession;
use chart::Projection;

use crate::render::{format_catalog, format_quotes, format_subscriptions};

pub const HELP: &str = "\
可用指令:
  list            所有标的及订阅状态
  prices          已订阅标的的最新价格
  toggle SYM      订阅 / 取消订阅
  select SYM      选中一个已订阅的标的查看走势
  unselect        取消选中
  chart [PATH]    把选中标的的走势写成 SVG（默认 trend.svg）
  help            显示本帮助
  quit            退出";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Prices,
    Toggle(String),
    Select(String),
    Unselect,
    Chart(Option<String>),
    Quit,
}

pub enum Outcome {
    Output(String),
    Quit,
}

pub fn parse(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Err("空指令，输入 help 查看帮助".to_string());
    };
    let arg = parts.next().map(str::to_string);

    match (cmd.to_lowercase().as_str(), arg) {
        ("help" | "?", _) => Ok(Command::Help),
        ("list" | "ls", _) => Ok(Command::List),
        ("prices" | "p", _) => Ok(Command::Prices),
        ("toggle" | "sub" | "t", Some(sym)) => Ok(Command::Toggle(sym)),
        ("select" | "sel" | "s", Some(sym)) => Ok(Command::Select(sym)),
        ("toggle" | "sub" | "t" | "select" | "sel" | "s", None) => Err(format!("{cmd} 需要一个标的代码")),
        ("unselect", _) => Ok(Command::Unselect),
        ("chart" | "c", path) => Ok(Command::Chart(path)),
        ("quit" | "exit" | "q", _) => Ok(Command::Quit),
        (other, _) => Err(format!("未知指令 {other}，输入 help 查看帮助")),
    }
}

pub fn handle(session: &mut DashboardSession, command: Command) -> Outcome {
    let text = match command {
        Command::Help => HELP.to_string(),
        Command::List => format_catalog(session),
        Command::Prices => format_quotes(&session.subscribed_quotes()),
        Command::Toggle(sym) => match session.toggle_by_name(&sym) {
            Some(subs) => format_subscriptions(&subs),
            None => format!("⚠️ 不支持的标的 {sym}"),
        },
        Command::Select(sym) => {
            if session.select_by_name(&sym) {
                format!("已选中 {}", sym.to_uppercase())
            } else {
                format!("⚠️ {sym} 未订阅，先 toggle {sym}")
            }
        }
        Command::Unselect => {
            session.clear_selection();
            "已取消选中".to_string()
        }
        Command::Chart(path) => write_chart(session, path.as_deref().unwrap_or("trend.svg")),
        Command::Quit => return Outcome::Quit,
    };
    Outcome::Output(text)
}

fn write_chart(session: &DashboardSession, path: &str) -> String {
    let Some(symbol) = session.selected() else {
        return "⚠️ 还没有选中标的，先 select SYM".to_string();
    };
    let note = match session.trend() {
        Projection::Empty => "（样本不足两个，写入占位图）",
        Projection::Polyline(_) => "",
    };
    match std::fs::write(path, session.trend_svg()) {
        Ok(()) => format!("📈 {symbol} 走势已写入 {path}{note}"),
        Err(e) => format!("❌ 写入 {path} 失败: {e}"),
    }
}
