//! Progress line chart.
//!
//! Points are spread evenly across the plot width in series order; a single
//! point sits at the horizontal center. Date labels are thinned once the
//! series grows past [`MAX_POINT_LABELS`], keeping the first and last.

use crate::chart::draw::{
    axis_ops, check_values, CanvasBounds, ChartError, ChartFrame, DrawOp, StrokeRole, TextAnchor,
    LABEL_OFFSET,
};
use crate::model::derived::SeriesPoint;

pub const EMPTY_SERIES_MESSAGE: &str = "No assessments with responses yet.";
/// Every point is labeled up to this many points.
pub const MAX_POINT_LABELS: usize = 8;
pub const POINT_RADIUS: f64 = 3.0;

/// x coordinate of point `index` out of `count`.
pub fn point_x(bounds: &CanvasBounds, index: usize, count: usize) -> f64 {
    if count <= 1 {
        return bounds.width() / 2.0;
    }
    bounds.padding() + index as f64 * bounds.plot_width() / (count - 1) as f64
}

/// Indices that get a date label.
///
/// Labeled indices are at least one stride apart, including the forced
/// last label.
pub fn labeled_indices(count: usize) -> Vec<usize> {
    if count <= MAX_POINT_LABELS {
        return (0..count).collect();
    }
    let stride = (count + MAX_POINT_LABELS - 1) / MAX_POINT_LABELS;
    let last = count - 1;
    (0..count)
        .filter(|index| *index == last || (index % stride == 0 && last - index >= stride))
        .collect()
}

pub fn render_line(bounds: &CanvasBounds, points: &[SeriesPoint]) -> Result<ChartFrame, ChartError> {
    check_values(points.iter().map(|point| point.average_support))?;
    if points.is_empty() {
        return Ok(ChartFrame::Empty {
            message: EMPTY_SERIES_MESSAGE.to_string(),
        });
    }

    let count = points.len();
    let coords: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(index, point)| (point_x(bounds, index, count), bounds.y_for(point.average_support)))
        .collect();

    let mut ops = axis_ops(bounds);
    for pair in coords.windows(2) {
        ops.push(DrawOp::Line {
            x1: pair[0].0,
            y1: pair[0].1,
            x2: pair[1].0,
            y2: pair[1].1,
            role: StrokeRole::Series,
        });
    }
    for (cx, cy) in &coords {
        ops.push(DrawOp::Circle {
            cx: *cx,
            cy: *cy,
            r: POINT_RADIUS,
        });
    }
    for index in labeled_indices(count) {
        ops.push(DrawOp::Text {
            x: coords[index].0,
            y: bounds.baseline() + LABEL_OFFSET,
            text: points[index].date.format("%Y-%m-%d").to_string(),
            anchor: TextAnchor::Middle,
        });
    }
    Ok(ChartFrame::Drawn { ops })
}
