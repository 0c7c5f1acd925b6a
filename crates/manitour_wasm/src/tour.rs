//! WASM wrapper around a basis and its most recent manual tour.

use anyhow::{anyhow, Context, Result};
use js_sys::Float64Array;
use manitour_core::{
    flatten, manip_var_of, manual_tour, AxesPosition, Basis, FixedAngleStep, FixedFrameCount,
    FlattenOptions, FrameTables, ManipType, ManipVar, PathPolicy, TourPath, TourSettings,
};
use nalgebra::DMatrix;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmManualTour {
    basis: Basis,
    path: Option<TourPath>,
}

/// Tour path as sent to JS: frames flattened row-major, `p * 2` values each.
#[derive(Debug, Serialize)]
pub(crate) struct TourPayload {
    p: usize,
    manip_var: usize,
    theta: f64,
    phi_start: f64,
    phi: Vec<f64>,
    frames: Vec<f64>,
}

impl TourPayload {
    fn from_path(path: &TourPath) -> Self {
        let p = path.nvars();
        let mut frames = Vec::with_capacity(path.len() * p * 2);
        for frame in &path.frames {
            for row in frame.row_iter() {
                frames.extend(row.iter().copied());
            }
        }
        Self {
            p,
            manip_var: path.manip_var,
            theta: path.theta,
            phi_start: path.phi_start,
            phi: path.phi.clone(),
            frames,
        }
    }
}

fn labels_or_none(labels: Vec<String>) -> Option<Vec<String>> {
    if labels.is_empty() {
        None
    } else {
        Some(labels)
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

impl WasmManualTour {
    pub(crate) fn from_parts(
        values: &[f64],
        p: usize,
        d: usize,
        labels: Vec<String>,
    ) -> Result<Self> {
        let basis = Basis::from_row_slice(p, d, values).context("Invalid basis")?;
        let basis = match labels_or_none(labels) {
            Some(labels) => {
                Basis::with_labels(basis.matrix().clone(), labels).context("Invalid basis")?
            }
            None => basis,
        };
        Ok(Self { basis, path: None })
    }

    pub(crate) fn run_tour(
        &mut self,
        manip_var: usize,
        manip_type: &str,
        policy: PathPolicy,
        phi_min: f64,
        phi_max: f64,
    ) -> Result<TourPayload> {
        let manip_type: ManipType = manip_type.parse()?;
        let settings = TourSettings {
            manip_type,
            theta: None,
            phi_min,
            phi_max,
        };
        let path = manual_tour(&self.basis, &ManipVar::Index(manip_var), &policy, &settings)
            .context("Manual tour failed")?;
        let payload = TourPayload::from_path(&path);
        self.path = Some(path);
        Ok(payload)
    }

    pub(crate) fn build_tables(
        &self,
        data: &[f64],
        n_obs: usize,
        data_labels: Vec<String>,
        axes: &str,
    ) -> Result<FrameTables> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| anyhow!("No tour has been generated yet."))?;
        let p = path.nvars();
        let matrix = if data.is_empty() {
            None
        } else {
            if n_obs == 0 || n_obs.checked_mul(p) != Some(data.len()) {
                return Err(anyhow!(
                    "Data has {} values, expected {} observations of {} variables.",
                    data.len(),
                    n_obs,
                    p
                ));
            }
            Some(DMatrix::from_row_slice(n_obs, p, data))
        };
        let data_labels = labels_or_none(data_labels);
        let options = FlattenOptions {
            data: matrix.as_ref(),
            basis_labels: None,
            data_labels: data_labels.as_deref(),
        };

        let mut tables = flatten(path, &options).context("Flattening failed")?;
        let position: AxesPosition = axes.parse()?;
        tables.position_axes(&position);
        Ok(tables)
    }

    pub(crate) fn frame_values(&self, index: usize) -> Result<Vec<f64>> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| anyhow!("No tour has been generated yet."))?;
        let frame = path
            .frames
            .get(index)
            .ok_or_else(|| anyhow!("Frame {} out of range, tour has {}.", index, path.len()))?;
        Ok(frame.transpose().as_slice().to_vec())
    }
}

#[wasm_bindgen]
impl WasmManualTour {
    /// `values` holds the (p, d) basis row by row; `labels` may be empty.
    #[wasm_bindgen(constructor)]
    pub fn new(
        values: Vec<f64>,
        p: usize,
        d: usize,
        labels: Vec<String>,
    ) -> Result<WasmManualTour, JsValue> {
        console_error_panic_hook::set_once();
        Self::from_parts(&values, p, d, labels).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
    }

    pub fn manual_tour_frame_count(
        &mut self,
        manip_var: usize,
        manip_type: &str,
        n_frames: usize,
        phi_min: f64,
        phi_max: f64,
    ) -> Result<JsValue, JsValue> {
        let policy = PathPolicy::FrameCount(FixedFrameCount { n_frames });
        let payload = self
            .run_tour(manip_var, manip_type, policy, phi_min, phi_max)
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        to_js(&payload)
    }

    pub fn manual_tour_angle_step(
        &mut self,
        manip_var: usize,
        manip_type: &str,
        step: f64,
        phi_min: f64,
        phi_max: f64,
    ) -> Result<JsValue, JsValue> {
        let policy = PathPolicy::AngleStep(FixedAngleStep { step });
        let payload = self
            .run_tour(manip_var, manip_type, policy, phi_min, phi_max)
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        to_js(&payload)
    }

    /// Long tables for the last generated tour. Pass an empty `data` slice to
    /// skip the data table.
    pub fn flatten(
        &self,
        data: Vec<f64>,
        n_obs: usize,
        data_labels: Vec<String>,
        axes: &str,
    ) -> Result<JsValue, JsValue> {
        let tables = self
            .build_tables(&data, n_obs, data_labels, axes)
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        to_js(&tables)
    }

    pub fn manip_var_of(&self) -> usize {
        manip_var_of(&self.basis)
    }

    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        self.basis.ensure_orthonormal(tolerance).is_ok()
    }

    pub fn frame_count(&self) -> usize {
        self.path.as_ref().map_or(0, |path| path.len())
    }

    /// One frame of the last tour as a row-major (p, 2) array.
    pub fn frame(&self, index: usize) -> Result<Float64Array, JsValue> {
        let values = self
            .frame_values(index)
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
        Ok(Float64Array::from(values.as_slice()))
    }
}
