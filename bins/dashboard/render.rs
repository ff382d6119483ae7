use app::context::DashboardSession;
use common::{PriceState, Symbol};
use event_engine::event::TickEvent;

/// 单行报价，例如 `GOOG   $153.00   +3.00  (+2.00%)`
pub fn format_quote(symbol: &Symbol, q: &PriceState) -> String {
    format!(
        "{:<6} ${:>10.2} {:>+9.2}  ({:+.2}%)",
        symbol.as_str(),
        q.price,
        q.change,
        q.change_percent
    )
}

pub fn format_quotes(quotes: &[(Symbol, PriceState)]) -> String {
    if quotes.is_empty() {
        return "No subscriptions，先 toggle SYM 订阅".to_string();
    }
    quotes
        .iter()
        .map(|(s, q)| format_quote(s, q))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_subscriptions(subs: &[Symbol]) -> String {
    if subs.is_empty() {
        return "当前订阅：无".to_string();
    }
    let names: Vec<&str> = subs.iter().map(Symbol::as_str).collect();
    format!("当前订阅：{}", names.join(", "))
}

/// 目录列表：订阅的打勾，选中的加星号
pub fn format_catalog(session: &DashboardSession) -> String {
    let store = session.store();
    let mut lines = vec!["Supported stocks:".to_string()];
    for symbol in store.catalog().symbols() {
        let mark = if store.is_subscribed(symbol) { "✓" } else { " " };
        let star = if store.selected() == Some(symbol) { " *" } else { "" };
        lines.push(format!("  [{mark}] {symbol}{star}"));
    }
    lines.join("\n")
}

/// 每个 tick 只打印已订阅的标的
pub fn format_tick(session: &DashboardSession, tick: &TickEvent) -> Option<String> {
    let subs = session.subscriptions();
    if subs.is_empty() {
        return None;
    }
    let mut lines = vec![format!("── tick #{} @ {} UTC", tick.seq, tick.at.format("%H:%M:%S"))];
    for symbol in subs {
        if let Some(q) = tick.quote(symbol) {
            lines.push(format!("  {}", format_quote(symbol, q)));
        }
    }
    Some(lines.join("\n"))
}
