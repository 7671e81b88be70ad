//! Category snapshot bar chart.

use crate::chart::draw::{
    axis_ops, check_values, CanvasBounds, ChartError, ChartFrame, DrawOp, TextAnchor, DOMAIN_MAX,
    LABEL_OFFSET,
};
use crate::model::derived::CategorySnapshot;

pub const EMPTY_SNAPSHOT_MESSAGE: &str = "No category data for the latest assessment.";
/// Share of each slot left empty between neighbouring bars.
pub const BAR_GAP_RATIO: f64 = 0.2;

/// Geometry of one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BarLayout {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Places bar `index` of `count` so all bars fit the plot width.
pub fn bar_layout(bounds: &CanvasBounds, index: usize, count: usize, value: f64) -> BarLayout {
    let slot = bounds.plot_width() / count.max(1) as f64;
    let gap = slot * BAR_GAP_RATIO;
    let height = value / DOMAIN_MAX * bounds.plot_height();
    BarLayout {
        x: bounds.padding() + index as f64 * slot + gap / 2.0,
        y: bounds.baseline() - height,
        width: slot - gap,
        height,
    }
}

pub fn render_bars(
    bounds: &CanvasBounds,
    snapshot: &[CategorySnapshot],
) -> Result<ChartFrame, ChartError> {
    check_values(snapshot.iter().map(|entry| entry.average_support))?;
    if snapshot.is_empty() {
        return Ok(ChartFrame::Empty {
            message: EMPTY_SNAPSHOT_MESSAGE.to_string(),
        });
    }

    let mut ops = axis_ops(bounds);
    for (index, entry) in snapshot.iter().enumerate() {
        let bar = bar_layout(bounds, index, snapshot.len(), entry.average_support);
        ops.push(DrawOp::Rect {
            x: bar.x,
            y: bar.y,
            width: bar.width,
            height: bar.height,
        });
        ops.push(DrawOp::Text {
            x: bar.center_x(),
            y: bar.y - 4.0,
            text: format!("{:.1}", entry.average_support),
            anchor: TextAnchor::Middle,
        });
        ops.push(DrawOp::Text {
            x: bar.center_x(),
            y: bounds.baseline() + LABEL_OFFSET,
            text: entry.category_id.clone(),
            anchor: TextAnchor::Middle,
        });
    }
    Ok(ChartFrame::Drawn { ops })
}
