//! SVG surface for chart frames.

use crate::chart::draw::{CanvasBounds, ChartFrame, DrawOp, StrokeRole, TextAnchor};
use std::fmt::Write;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn stroke(role: StrokeRole) -> (&'static str, f64) {
    match role {
        StrokeRole::Axis => ("#444444", 1.0),
        StrokeRole::Tick => ("#888888", 1.0),
        StrokeRole::Series => ("#1f77b4", 2.0),
    }
}

/// Renders `frame` as a standalone SVG document.
pub fn to_svg(bounds: &CanvasBounds, frame: &ChartFrame) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = bounds.width(),
        h = bounds.height()
    );
    match frame {
        ChartFrame::Empty { message } => {
            let _ = writeln!(
                out,
                r#"  <text x="{:.2}" y="{:.2}" text-anchor="{}">{}</text>"#,
                bounds.width() / 2.0,
                bounds.height() / 2.0,
                TextAnchor::Middle.as_str(),
                escape(message)
            );
        }
        ChartFrame::Drawn { ops } => {
            for op in ops {
                write_op(&mut out, op);
            }
        }
    }
    out.push_str("</svg>\n");
    out
}

fn write_op(out: &mut String, op: &DrawOp) {
    let _ = match op {
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            role,
        } => {
            let (color, width) = stroke(*role);
            writeln!(
                out,
                r#"  <line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{color}" stroke-width="{width}"/>"#
            )
        }
        DrawOp::Circle { cx, cy, r } => writeln!(
            out,
            r##"  <circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="#1f77b4"/>"##
        ),
        DrawOp::Rect {
            x,
            y,
            width,
            height,
        } => writeln!(
            out,
            r##"  <rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" fill="#4c9f70"/>"##
        ),
        DrawOp::Text { x, y, text, anchor } => writeln!(
            out,
            r#"  <text x="{x:.2}" y="{y:.2}" text-anchor="{}">{}</text>"#,
            anchor.as_str(),
            escape(text)
        ),
    };
}

#[cfg(test)]
mod tests {
    use super::to_svg;
    use crate::chart::draw::{CanvasBounds, ChartFrame, DrawOp, TextAnchor};

    #[test]
    fn empty_frame_renders_message() {
        let bounds = CanvasBounds::new(300.0, 120.0, 10.0).expect("valid bounds");
        let svg = to_svg(
            &bounds,
            &ChartFrame::Empty {
                message: "No data <yet>".to_string(),
            },
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("No data &lt;yet&gt;"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn drawn_frame_is_deterministic() {
        let bounds = CanvasBounds::new(300.0, 120.0, 10.0).expect("valid bounds");
        let frame = ChartFrame::Drawn {
            ops: vec![
                DrawOp::Circle {
                    cx: 1.0,
                    cy: 2.0,
                    r: 3.0,
                },
                DrawOp::Text {
                    x: 4.0,
                    y: 5.0,
                    text: "C1".to_string(),
                    anchor: TextAnchor::Middle,
                },
            ],
        };
        let first = to_svg(&bounds, &frame);
        assert_eq!(first, to_svg(&bounds, &frame));
        assert!(first.contains(r#"<circle cx="1.00" cy="2.00" r="3.00""#));
        assert!(first.contains(">C1</text>"));
    }
}
