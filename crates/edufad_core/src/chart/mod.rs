//! Chart rendering.
//!
//! # Responsibility
//! - Map dashboard aggregates and canvas bounds to draw instructions.
//! - Adapt draw instructions to a concrete surface (SVG).
//!
//! # Invariants
//! - Geometry is pure and deterministic; only `svg` knows about a surface.
//! - Empty input yields `ChartFrame::Empty`, malformed input `ChartError`.

pub mod bar;
pub mod draw;
pub mod line;
pub mod svg;

pub use bar::render_bars;
pub use draw::{CanvasBounds, ChartError, ChartFrame, DrawOp};
pub use line::render_line;
pub use svg::to_svg;
