//! Placement of the axis segments relative to the data cloud.

use crate::error::{bail_invalid, Result, TourError};
use crate::frames::{BasisRow, FrameTables};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where the renderer draws the axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxesPosition {
    #[default]
    Center,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Axes are not drawn.
    Off,
    /// Explicit scale (`zoom`) and translation (`pan`) per coordinate.
    PanZoom { pan: [f64; 2], zoom: [f64; 2] },
}

impl AxesPosition {
    /// Scale and offset applied as `scale * v + offset`, or `None` for
    /// [`AxesPosition::Off`].
    pub fn transform(&self) -> Option<([f64; 2], [f64; 2])> {
        const BIG: f64 = 2.0 / 3.0;
        const SMALL: f64 = 1.0 / 4.0;
        const SIDE: f64 = 5.0 / 3.0;
        let (scale, offset) = match *self {
            AxesPosition::Center => ([BIG, BIG], [0.0, 0.0]),
            AxesPosition::Left => ([BIG, BIG], [-SIDE, 0.0]),
            AxesPosition::Right => ([BIG, BIG], [SIDE, 0.0]),
            AxesPosition::TopLeft => ([SMALL, SMALL], [-BIG, BIG]),
            AxesPosition::TopRight => ([SMALL, SMALL], [BIG, BIG]),
            AxesPosition::BottomLeft => ([SMALL, SMALL], [-BIG, -BIG]),
            AxesPosition::BottomRight => ([SMALL, SMALL], [BIG, -BIG]),
            AxesPosition::Off => return None,
            AxesPosition::PanZoom { pan, zoom } => (zoom, pan),
        };
        Some((scale, offset))
    }

    pub fn pan_zoom(pan: [f64; 2], zoom: [f64; 2]) -> Result<Self> {
        if pan.iter().chain(zoom.iter()).any(|v| !v.is_finite()) {
            bail_invalid!("pan and zoom must be finite.");
        }
        Ok(AxesPosition::PanZoom { pan, zoom })
    }
}

impl FromStr for AxesPosition {
    type Err = TourError;

    fn from_str(value: &str) -> Result<Self> {
        Ok(match value {
            "center" => AxesPosition::Center,
            "left" => AxesPosition::Left,
            "right" => AxesPosition::Right,
            "top_left" | "topleft" => AxesPosition::TopLeft,
            "top_right" | "topright" => AxesPosition::TopRight,
            "bottom_left" | "bottomleft" => AxesPosition::BottomLeft,
            "bottom_right" | "bottomright" => AxesPosition::BottomRight,
            "off" => AxesPosition::Off,
            other => bail_invalid!("Unknown axes position \"{}\".", other),
        })
    }
}

/// Scales and translates basis rows in place; `Off` removes them.
pub fn position_axes(rows: &mut Vec<BasisRow>, position: &AxesPosition) {
    match position.transform() {
        Some((scale, offset)) => {
            for row in rows.iter_mut() {
                row.x = scale[0] * row.x + offset[0];
                row.y = scale[1] * row.y + offset[1];
            }
        }
        None => rows.clear(),
    }
}

impl FrameTables {
    pub fn position_axes(&mut self, position: &AxesPosition) {
        position_axes(&mut self.basis, position);
    }
}
