//! Draw instructions shared by every chart.
//!
//! # Invariants
//! - The value domain is fixed to `[0, 3]` regardless of the data.
//! - Bounds always satisfy `width > 2 * padding` and `height > 2 * padding`.
//! - Instruction lists are a pure function of their inputs.

use crate::model::response::SUPPORT_MAX;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper end of the fixed value domain.
pub const DOMAIN_MAX: f64 = SUPPORT_MAX as f64;
/// Length of an axis tick mark.
pub const TICK_LENGTH: f64 = 4.0;
/// Vertical offset of labels under the baseline.
pub const LABEL_OFFSET: f64 = 14.0;

/// Canvas size and padding in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    width: f64,
    height: f64,
    padding: f64,
}

impl CanvasBounds {
    pub fn new(width: f64, height: f64, padding: f64) -> Result<Self, ChartError> {
        let finite = width.is_finite() && height.is_finite() && padding.is_finite();
        if !finite || padding < 0.0 || width <= 2.0 * padding || height <= 2.0 * padding {
            return Err(ChartError::InvalidBounds {
                width,
                height,
                padding,
            });
        }
        Ok(Self {
            width,
            height,
            padding,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn plot_width(&self) -> f64 {
        self.width - 2.0 * self.padding
    }

    pub fn plot_height(&self) -> f64 {
        self.height - 2.0 * self.padding
    }

    /// y coordinate of value 0.
    pub fn baseline(&self) -> f64 {
        self.height - self.padding
    }

    /// Maps a domain value to its y coordinate.
    pub fn y_for(&self, value: f64) -> f64 {
        self.baseline() - (value / DOMAIN_MAX) * self.plot_height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeRole {
    Axis,
    Tick,
    Series,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// One surface-independent drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        role: StrokeRole,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        anchor: TextAnchor,
    },
}

/// Renderer output.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartFrame {
    /// Nothing to plot; the surface shows `message` instead of empty axes.
    Empty { message: String },
    Drawn { ops: Vec<DrawOp> },
}

impl ChartFrame {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    pub fn ops(&self) -> &[DrawOp] {
        match self {
            Self::Empty { .. } => &[],
            Self::Drawn { ops } => ops,
        }
    }
}

/// Malformed chart input.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    InvalidBounds {
        width: f64,
        height: f64,
        padding: f64,
    },
    ValueOutOfDomain {
        index: usize,
        value: f64,
    },
}

impl Display for ChartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBounds {
                width,
                height,
                padding,
            } => write!(
                f,
                "canvas {width}x{height} cannot fit padding {padding} on both sides"
            ),
            Self::ValueOutOfDomain { index, value } => {
                write!(f, "value {value} at position {index} is outside [0, {DOMAIN_MAX}]")
            }
        }
    }
}

impl Error for ChartError {}

pub(crate) fn check_values(values: impl Iterator<Item = f64>) -> Result<(), ChartError> {
    for (index, value) in values.enumerate() {
        if !value.is_finite() || !(0.0..=DOMAIN_MAX).contains(&value) {
            return Err(ChartError::ValueOutOfDomain { index, value });
        }
    }
    Ok(())
}

/// Both axes plus ticks and labels at every integer of the domain.
pub(crate) fn axis_ops(bounds: &CanvasBounds) -> Vec<DrawOp> {
    let left = bounds.padding();
    let mut ops = vec![
        DrawOp::Line {
            x1: left,
            y1: bounds.padding(),
            x2: left,
            y2: bounds.baseline(),
            role: StrokeRole::Axis,
        },
        DrawOp::Line {
            x1: left,
            y1: bounds.baseline(),
            x2: bounds.width() - bounds.padding(),
            y2: bounds.baseline(),
            role: StrokeRole::Axis,
        },
    ];
    for tick in 0..=SUPPORT_MAX {
        let y = bounds.y_for(f64::from(tick));
        ops.push(DrawOp::Line {
            x1: left - TICK_LENGTH,
            y1: y,
            x2: left,
            y2: y,
            role: StrokeRole::Tick,
        });
        ops.push(DrawOp::Text {
            x: left - TICK_LENGTH - 2.0,
            y,
            text: tick.to_string(),
            anchor: TextAnchor::End,
        });
    }
    ops
}
