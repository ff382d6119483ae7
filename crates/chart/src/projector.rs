use common::{round2, DashError, DashResult};
use ordered_float::OrderedFloat;
use serde::Deserialize;

/// 绘图区域（像素），内部可绘制区域宽高都必须 > 0
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 700.0,
            height: 220.0,
            // 左侧留给 y 轴标签
            padding_left: 44.0,
            padding_right: 20.0,
            padding_top: 16.0,
            padding_bottom: 30.0,
        }
    }
}

impl Viewport {
    pub fn new(
        width: f64,
        height: f64,
        padding_left: f64,
        padding_right: f64,
        padding_top: f64,
        padding_bottom: f64,
    ) -> DashResult<Self> {
        let vp = Self {
            width,
            height,
            padding_left,
            padding_right,
            padding_top,
            padding_bottom,
        };
        vp.validate()?;
        Ok(vp)
    }

    pub fn validate(&self) -> DashResult<()> {
        let fields = [
            ("width", self.width),
            ("height", self.height),
            ("padding_left", self.padding_left),
            ("padding_right", self.padding_right),
            ("padding_top", self.padding_top),
            ("padding_bottom", self.padding_bottom),
        ];
        for (name, v) in fields {
            if !v.is_finite() || v < 0.0 {
                return Err(DashError::Viewport(format!("{name} must be a non-negative number, got {v}")));
            }
        }
        if self.inner_width() <= 0.0 {
            return Err(DashError::Viewport("horizontal padding leaves no drawable width".to_string()));
        }
        if self.inner_height() <= 0.0 {
            return Err(DashError::Viewport("vertical padding leaves no drawable height".to_string()));
        }
        Ok(())
    }

    pub fn inner_width(&self) -> f64 {
        self.width - self.padding_left - self.padding_right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.padding_top - self.padding_bottom
    }

    /// x 轴所在的 y 坐标
    pub fn baseline(&self) -> f64 {
        self.height - self.padding_bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineGeometry {
    pub points: Vec<Point>,
    /// y 轴标注用，已取 2 位小数
    pub min_label: f64,
    pub max_label: f64,
}

impl PolylineGeometry {
    /// SVG path 的 d 属性：`M x0 y0 L x1 y1 ...`
    pub fn path_data(&self) -> String {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} {} {}", if i == 0 { "M" } else { "L" }, p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// 少于两个样本，调用方显示占位
    Empty,
    Polyline(PolylineGeometry),
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        matches!(self, Projection::Empty)
    }

    pub fn geometry(&self) -> Option<&PolylineGeometry> {
        match self {
            Projection::Polyline(g) => Some(g),
            Projection::Empty => None,
        }
    }
}

/// 把价格序列按 min/max 归一化映射到视口，价格越高 y 越小
pub fn project(series: &[f64], viewport: &Viewport) -> Projection {
    if series.len() < 2 {
        return Projection::Empty;
    }

    // len >= 2，min/max 一定存在
    let (Some(min), Some(max)) = (
        series.iter().copied().map(OrderedFloat).min(),
        series.iter().copied().map(OrderedFloat).max(),
    ) else {
        return Projection::Empty;
    };
    let (min, max) = (min.into_inner(), max.into_inner());
    let range = if max == min { 1.0 } else { max - min };

    let step_x = viewport.inner_width() / (series.len() - 1) as f64;
    let inner_height = viewport.inner_height();
    let baseline = viewport.baseline();

    let points = series
        .iter()
        .enumerate()
        .map(|(i, value)| Point {
            x: viewport.padding_left + step_x * i as f64,
            y: baseline - ((value - min) / range) * inner_height,
        })
        .collect();

    Projection::Polyline(PolylineGeometry {
        points,
        min_label: round2(min),
        max_label: round2(max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polyline(series: &[f64]) -> PolylineGeometry {
        match project(series, &Viewport::default()) {
            Projection::Polyline(g) => g,
            Projection::Empty => panic!("expected polyline for {series:?}"),
        }
    }

    #[test]
    fn short_series_is_empty() {
        let vp = Viewport::default();
        assert_eq!(project(&[], &vp), Projection::Empty);
        assert_eq!(project(&[5.0], &vp), Projection::Empty);
        assert!(project(&[5.0], &vp).geometry().is_none());
    }

    #[test]
    fn maps_min_to_bottom_and_max_to_top() {
        let g = polyline(&[1.0, 2.0, 3.0]);
        assert_eq!(
            g.points,
            vec![
                Point { x: 44.0, y: 190.0 },
                Point { x: 362.0, y: 103.0 },
                Point { x: 680.0, y: 16.0 },
            ]
        );
        assert_eq!(g.min_label, 1.0);
        assert_eq!(g.max_label, 3.0);
        assert_eq!(g.path_data(), "M 44 190 L 362 103 L 680 16");
    }

    #[test]
    fn flat_series_is_a_flat_line() {
        let g = polyline(&[5.0, 5.0, 5.0]);
        assert_eq!(g.points.len(), 3);
        assert!(g.points.iter().all(|p| p.y == g.points[0].y));
        assert_eq!(g.points[0].y, 190.0);
        assert_eq!(g.min_label, 5.0);
        assert_eq!(g.max_label, 5.0);
    }

    #[test]
    fn labels_are_rounded() {
        let g = polyline(&[150.004, 153.456]);
        assert_eq!(g.min_label, 150.0);
        assert_eq!(g.max_label, 153.46);
    }

    #[test]
    fn sixty_points_span_inner_width() {
        let series: Vec<f64> = (0..60).map(|i| 100.0 + (i % 7) as f64).collect();
        let vp = Viewport::default();
        let g = polyline(&series);
        assert_eq!(g.points.len(), 60);
        assert_eq!(g.points[0].x, vp.padding_left);
        assert!((g.points[59].x - (vp.width - vp.padding_right)).abs() < 1e-9);
        assert!(g.points.iter().all(|p| p.y >= vp.padding_top - 1e-9 && p.y <= vp.baseline() + 1e-9));
    }

    #[test]
    fn projection_is_deterministic() {
        let series = [3.0, 1.0, 4.0, 1.0, 5.0];
        let vp = Viewport::new(300.0, 100.0, 10.0, 10.0, 5.0, 5.0).unwrap();
        assert_eq!(project(&series, &vp), project(&series, &vp));
    }

    #[test]
    fn invalid_viewports_are_rejected() {
        assert!(matches!(
            Viewport::new(100.0, 100.0, 60.0, 40.0, 0.0, 0.0),
            Err(DashError::Viewport(_))
        ));
        assert!(Viewport::new(100.0, 100.0, 0.0, 0.0, 50.0, 50.0).is_err());
        assert!(Viewport::new(-1.0, 100.0, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(Viewport::new(f64::INFINITY, 100.0, 0.0, 0.0, 0.0, 0.0).is_err());
        assert!(Viewport::default().validate().is_ok());
    }
}
