//! Manual tour path generation.
//!
//! A path walks the out-of-plane angle phi of the manipulation variable from
//! its resting value out to `phi_min`, across to `phi_max` and back, rotating
//! the manipulation space at every step and keeping its first two columns as
//! the frame basis. How the walk is discretised is an [`AnglePolicy`].

use crate::basis::{Basis, ManipVar};
use crate::error::{bail_invalid, Result, TourError};
use crate::manip_space::create_manip_space;
use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::str::FromStr;

/// Slack allowed when comparing phi bounds against the resting angle.
const PHI_EPS: f64 = 1e-9;

/// Upper bound on frames produced by one path.
pub const MAX_FRAMES: usize = 100_000;

/// Direction along which the manipulation variable's contribution moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManipType {
    /// Along the variable's own in-plane direction.
    #[default]
    Radial,
    Horizontal,
    Vertical,
}

impl FromStr for ManipType {
    type Err = TourError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "radial" => Ok(ManipType::Radial),
            "horizontal" => Ok(ManipType::Horizontal),
            "vertical" => Ok(ManipType::Vertical),
            other => bail_invalid!(
                "Unknown manip_type \"{}\", expected radial, horizontal or vertical.",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TourSettings {
    pub manip_type: ManipType,
    /// Explicit in-plane angle; overrides `manip_type` when set.
    #[serde(default)]
    pub theta: Option<f64>,
    pub phi_min: f64,
    pub phi_max: f64,
}

impl Default for TourSettings {
    fn default() -> Self {
        Self {
            manip_type: ManipType::Radial,
            theta: None,
            phi_min: 0.0,
            phi_max: FRAC_PI_2,
        }
    }
}

/// Discretisation of the phi walk.
///
/// Implementations decide which phi values become frames and how the
/// manipulation variable's in-plane coordinates (`x`, `y`) orient the walk.
pub trait AnglePolicy {
    /// Phi value of every frame, starting at `phi_start` and walking
    /// start -> `phi_min` -> `phi_max` -> start.
    fn phi_path(&self, phi_start: f64, phi_min: f64, phi_max: f64) -> Result<Vec<f64>>;

    /// Theta for [`ManipType::Radial`].
    fn radial_theta(&self, x: f64, y: f64) -> f64 {
        y.atan2(x)
    }

    /// Multiplier applied to every rotation angle.
    fn direction(&self, _x: f64) -> f64 {
        1.0
    }
}

/// Splits the path into exactly `n_frames` frames.
///
/// The first frame is the resting basis; the remaining steps are shared as
/// evenly as possible between the three legs, earlier legs taking the
/// leftovers, and every leg ends exactly on its target angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedFrameCount {
    pub n_frames: usize,
}

impl Default for FixedFrameCount {
    fn default() -> Self {
        Self { n_frames: 20 }
    }
}

impl AnglePolicy for FixedFrameCount {
    fn phi_path(&self, phi_start: f64, phi_min: f64, phi_max: f64) -> Result<Vec<f64>> {
        if self.n_frames < 4 {
            bail_invalid!(
                "n_frames must be at least 4 to visit phi_min and phi_max, got {}.",
                self.n_frames
            );
        }
        if self.n_frames > MAX_FRAMES {
            bail_invalid!("n_frames {} exceeds the limit of {}.", self.n_frames, MAX_FRAMES);
        }

        let steps = self.n_frames - 1;
        let legs = [(phi_start, phi_min), (phi_min, phi_max), (phi_max, phi_start)];
        let mut path = Vec::with_capacity(self.n_frames);
        path.push(phi_start);
        for (leg, &(from, to)) in legs.iter().enumerate() {
            let leg_steps = steps / 3 + usize::from(leg < steps % 3);
            for j in 1..=leg_steps {
                let t = j as f64 / leg_steps as f64;
                path.push(from * (1.0 - t) + to * t);
            }
        }
        Ok(path)
    }
}

/// Walks every leg in increments of `step` radians.
///
/// A leg whose length is not a multiple of `step` ends with one shorter step
/// onto its target. Radial theta is taken in the right half-plane and the walk
/// is mirrored when the variable points left, so the motion keeps the same
/// visual sense on either side of the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedAngleStep {
    pub step: f64,
}

impl Default for FixedAngleStep {
    fn default() -> Self {
        Self { step: 0.05 }
    }
}

impl FixedAngleStep {
    fn walk_leg(&self, from: f64, to: f64, path: &mut Vec<f64>) -> Result<()> {
        let distance = (to - from).abs();
        let sign = (to - from).signum();
        let steps = (distance / self.step).floor();
        let room = MAX_FRAMES.saturating_sub(path.len() + 1);
        if !steps.is_finite() || steps > room as f64 {
            bail_invalid!(
                "A step of {} radians needs more than {} frames.",
                self.step,
                MAX_FRAMES
            );
        }
        let full_steps = steps as usize;

        for i in 1..=full_steps {
            path.push(from + sign * self.step * i as f64);
        }
        let remainder = distance - self.step * full_steps as f64;
        if remainder > PHI_EPS {
            path.push(to);
        } else if full_steps > 0 {
            // Snap the last full step onto the target.
            if let Some(last) = path.last_mut() {
                *last = to;
            }
        }
        Ok(())
    }
}

impl AnglePolicy for FixedAngleStep {
    fn phi_path(&self, phi_start: f64, phi_min: f64, phi_max: f64) -> Result<Vec<f64>> {
        if !self.step.is_finite() || self.step <= 0.0 {
            bail_invalid!("Angle step must be positive and finite, got {}.", self.step);
        }

        let mut path = vec![phi_start];
        self.walk_leg(phi_start, phi_min, &mut path)?;
        self.walk_leg(phi_min, phi_max, &mut path)?;
        self.walk_leg(phi_max, phi_start, &mut path)?;
        Ok(path)
    }

    fn radial_theta(&self, x: f64, y: f64) -> f64 {
        if x == 0.0 && y == 0.0 {
            return 0.0;
        }
        (y / x).atan()
    }

    fn direction(&self, x: f64) -> f64 {
        if x < 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}

/// Policy selected at runtime, e.g. from a string setting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PathPolicy {
    FrameCount(FixedFrameCount),
    AngleStep(FixedAngleStep),
}

impl AnglePolicy for PathPolicy {
    fn phi_path(&self, phi_start: f64, phi_min: f64, phi_max: f64) -> Result<Vec<f64>> {
        match self {
            PathPolicy::FrameCount(p) => p.phi_path(phi_start, phi_min, phi_max),
            PathPolicy::AngleStep(p) => p.phi_path(phi_start, phi_min, phi_max),
        }
    }

    fn radial_theta(&self, x: f64, y: f64) -> f64 {
        match self {
            PathPolicy::FrameCount(p) => p.radial_theta(x, y),
            PathPolicy::AngleStep(p) => p.radial_theta(x, y),
        }
    }

    fn direction(&self, x: f64) -> f64 {
        match self {
            PathPolicy::FrameCount(p) => p.direction(x),
            PathPolicy::AngleStep(p) => p.direction(x),
        }
    }
}

/// An ordered sequence of (p, 2) frame bases for one manipulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourPath {
    pub frames: Vec<DMatrix<f64>>,
    /// Variable labels of the source basis.
    pub labels: Option<Vec<String>>,
    /// 1-based index of the manipulated variable.
    pub manip_var: usize,
    pub theta: f64,
    /// Out-of-plane angle of the manipulated variable in the source basis.
    pub phi_start: f64,
    /// Out-of-plane angle of each frame.
    pub phi: Vec<f64>,
}

impl TourPath {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of variables, p.
    pub fn nvars(&self) -> usize {
        self.frames.first().map_or(0, |frame| frame.nrows())
    }
}

/// Out-of-plane angle of the manipulated variable: the angle between its
/// contribution to the projection plane and its full unit extent.
pub fn phi_start(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt().min(1.0).acos()
}

/// Generates the manual tour of `manip_var` through `basis`.
///
/// All inputs are checked before the first rotation.
pub fn manual_tour<P: AnglePolicy + ?Sized>(
    basis: &Basis,
    manip_var: &ManipVar,
    policy: &P,
    settings: &TourSettings,
) -> Result<TourPath> {
    if basis.ncols() != 2 {
        bail_invalid!(
            "Manual tours need a 2-column basis, got {} columns.",
            basis.ncols()
        );
    }
    let row = basis.resolve_manip_var(manip_var)?;
    if !settings.phi_min.is_finite() || !settings.phi_max.is_finite() {
        bail_invalid!("phi_min and phi_max must be finite.");
    }
    if let Some(theta) = settings.theta {
        if !theta.is_finite() {
            bail_invalid!("theta must be finite, got {}.", theta);
        }
    }

    let x = basis.matrix()[(row, 0)];
    let y = basis.matrix()[(row, 1)];
    let start = phi_start(x, y);
    if settings.phi_min > start + PHI_EPS {
        bail_invalid!(
            "phi_min ({}) must not exceed the starting phi ({}).",
            settings.phi_min,
            start
        );
    }
    if settings.phi_max < start - PHI_EPS {
        bail_invalid!(
            "phi_max ({}) must not be below the starting phi ({}).",
            settings.phi_max,
            start
        );
    }

    let theta = settings.theta.unwrap_or_else(|| match settings.manip_type {
        ManipType::Radial => policy.radial_theta(x, y),
        ManipType::Horizontal => 0.0,
        ManipType::Vertical => FRAC_PI_2,
    });
    let direction = policy.direction(x);
    let phi = policy.phi_path(start, settings.phi_min, settings.phi_max)?;

    let space = create_manip_space(basis, manip_var)?;
    let frames = phi
        .iter()
        .map(|&target| {
            space
                .rotate(theta, direction * (start - target))
                .map(|rotated| rotated.projection())
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "manual tour of var {}: {} frames, theta = {:.4}, phi_start = {:.4}, phi in [{:.4}, {:.4}]",
        row + 1,
        frames.len(),
        theta,
        start,
        settings.phi_min,
        settings.phi_max
    );

    Ok(TourPath {
        frames,
        labels: basis.labels().map(|labels| labels.to_vec()),
        manip_var: row + 1,
        theta,
        phi_start: start,
        phi,
    })
}
