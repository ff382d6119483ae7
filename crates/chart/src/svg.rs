use std::fmt::Write;

use crate::projector::{Projection, Viewport};

/// 渲染完整的 SVG 文档；`window` 用于 x 轴说明（最近多少个 tick）
pub fn render_svg(projection: &Projection, viewport: &Viewport, title: Option<&str>, window: usize) -> String {
    let Viewport {
        width,
        height,
        padding_left: pl,
        padding_right: pr,
        padding_top: pt,
        ..
    } = *viewport;
    let baseline = viewport.baseline();

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="trend-chart" width="100%" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    if let Some(title) = title {
        let _ = writeln!(out, "  <title>{}</title>", escape(title));
    }

    let Some(geometry) = projection.geometry() else {
        let _ = writeln!(
            out,
            r#"  <text x="{}" y="{}" text-anchor="middle" class="trend-empty">Subscribe to a stock and select it to see its trend.</text>"#,
            width / 2.0,
            height / 2.0
        );
        out.push_str("</svg>\n");
        return out;
    };

    // x 轴、y 轴
    let _ = writeln!(
        out,
        r#"  <line x1="{pl}" y1="{baseline}" x2="{}" y2="{baseline}" class="trend-axis-line" />"#,
        width - pr
    );
    let _ = writeln!(
        out,
        r#"  <line x1="{pl}" y1="{pt}" x2="{pl}" y2="{baseline}" class="trend-axis-line" />"#
    );

    // y 轴标签：上 max 下 min
    let _ = writeln!(
        out,
        r#"  <text x="{}" y="{}" text-anchor="end" class="trend-axis-label">{:.2}</text>"#,
        pl - 6.0,
        pt + 4.0,
        geometry.max_label
    );
    let _ = writeln!(
        out,
        r#"  <text x="{}" y="{baseline}" dy="0.35em" text-anchor="end" class="trend-axis-label">{:.2}</text>"#,
        pl - 6.0,
        geometry.min_label
    );
    let _ = writeln!(
        out,
        r#"  <text x="{}" y="{}" text-anchor="middle" class="trend-axis-label">Time → (last {window} ticks)</text>"#,
        (pl + (width - pr)) / 2.0,
        height - 8.0
    );

    let _ = writeln!(
        out,
        r#"  <path d="{}" class="trend-line" fill="none" />"#,
        geometry.path_data()
    );
    out.push_str("</svg>\n");
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
