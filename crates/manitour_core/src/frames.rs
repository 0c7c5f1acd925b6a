//! Flattening of tour paths into long tables for a renderer.
//!
//! The basis table holds one row per (frame, variable) with the variable's
//! axis end point; the data table holds one row per (frame, observation) with
//! the projected, per-frame mean-centred point.

use crate::basis::{Basis, ManipVar};
use crate::error::{bail_invalid, Result};
use crate::tour::TourPath;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisRow {
    pub x: f64,
    pub y: f64,
    /// 1-based frame id.
    pub frame: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub x: f64,
    pub y: f64,
    /// 1-based frame id.
    pub frame: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTables {
    pub basis: Vec<BasisRow>,
    pub data: Option<Vec<DataRow>>,
    /// 1-based index of the manipulated variable, if any.
    pub manip_var: Option<usize>,
    /// Variables per frame in the basis table, p.
    pub nvars: usize,
    /// Frames flattened; unchanged when the axes are switched off.
    pub n_frames: usize,
}

impl FrameTables {
    pub fn frame_count(&self) -> usize {
        self.n_frames
    }

    /// Whether basis table row `index` belongs to the manipulated variable.
    ///
    /// False for rows past the end of the basis table, including every row
    /// once the axes are switched off.
    pub fn is_manip_row(&self, index: usize) -> bool {
        if index >= self.basis.len() {
            return false;
        }
        match self.manip_var {
            Some(var) if self.nvars > 0 => index % self.nvars + 1 == var,
            _ => false,
        }
    }
}

/// Optional inputs to [`flatten`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenOptions<'a> {
    /// n x p observations to project.
    pub data: Option<&'a DMatrix<f64>>,
    /// Axis labels, recycled over every (frame, variable) row.
    pub basis_labels: Option<&'a [String]>,
    /// Observation labels, recycled over every (frame, observation) row.
    pub data_labels: Option<&'a [String]>,
}

/// Flattens every frame of `path`.
pub fn flatten(path: &TourPath, options: &FlattenOptions<'_>) -> Result<FrameTables> {
    flatten_frames(
        &path.frames,
        path.labels.as_deref(),
        Some(path.manip_var),
        options,
    )
}

/// Flattens a single basis as a one-frame table.
pub fn flatten_basis(
    basis: &Basis,
    manip_var: Option<&ManipVar>,
    options: &FlattenOptions<'_>,
) -> Result<FrameTables> {
    let manip_var = match manip_var {
        Some(var) => Some(basis.resolve_manip_var(var)? + 1),
        None => None,
    };
    flatten_frames(
        std::slice::from_ref(basis.matrix()),
        basis.labels(),
        manip_var,
        options,
    )
}

/// Default axis label: the first three characters of the variable name.
pub fn abbreviate(name: &str) -> String {
    name.chars().take(3).collect()
}

fn flatten_frames(
    frames: &[DMatrix<f64>],
    names: Option<&[String]>,
    manip_var: Option<usize>,
    options: &FlattenOptions<'_>,
) -> Result<FrameTables> {
    let first = match frames.first() {
        Some(frame) => frame,
        None => bail_invalid!("Cannot flatten a tour path with no frames."),
    };
    let p = first.nrows();
    for (i, frame) in frames.iter().enumerate() {
        if frame.shape() != (p, 2) {
            bail_invalid!(
                "Frame {} has shape {}x{}, expected {}x2.",
                i + 1,
                frame.nrows(),
                frame.ncols(),
                p
            );
        }
    }
    let n_frames = frames.len();

    let basis_labels: Vec<String> = match options.basis_labels {
        Some(labels) => {
            check_recyclable("basis_labels", labels.len(), p * n_frames)?;
            labels.to_vec()
        }
        None => match names {
            Some(names) => names.iter().map(|name| abbreviate(name)).collect(),
            None => (1..=p).map(|i| format!("V{i}")).collect(),
        },
    };

    let mut basis = Vec::with_capacity(p * n_frames);
    for (f, frame) in frames.iter().enumerate() {
        for v in 0..p {
            let row = f * p + v;
            basis.push(BasisRow {
                x: frame[(v, 0)],
                y: frame[(v, 1)],
                frame: f + 1,
                label: basis_labels[row % basis_labels.len()].clone(),
            });
        }
    }

    let data = match options.data {
        Some(data) => Some(project_data(frames, data, options.data_labels)?),
        None => {
            if options.data_labels.is_some() {
                bail_invalid!("data_labels given without data.");
            }
            None
        }
    };

    Ok(FrameTables {
        basis,
        data,
        manip_var,
        nvars: p,
        n_frames,
    })
}

fn project_data(
    frames: &[DMatrix<f64>],
    data: &DMatrix<f64>,
    labels: Option<&[String]>,
) -> Result<Vec<DataRow>> {
    let p = frames[0].nrows();
    if data.ncols() != p {
        bail_invalid!(
            "Data has {} columns but the basis has {} variables.",
            data.ncols(),
            p
        );
    }
    if data.iter().any(|v| !v.is_finite()) {
        bail_invalid!("Data entries must be finite.");
    }
    let n = data.nrows();
    if let Some(labels) = labels {
        check_recyclable("data_labels", labels.len(), n * frames.len())?;
    }

    let mut rows = Vec::with_capacity(n * frames.len());
    for (f, frame) in frames.iter().enumerate() {
        let mut projected = data * frame;
        for mut column in projected.column_iter_mut() {
            let mean = column.mean();
            column.add_scalar_mut(-mean);
        }
        for i in 0..n {
            rows.push(DataRow {
                x: projected[(i, 0)],
                y: projected[(i, 1)],
                frame: f + 1,
                label: labels.map(|labels| labels[(f * n + i) % labels.len()].clone()),
            });
        }
    }
    Ok(rows)
}

fn check_recyclable(what: &str, len: usize, rows: usize) -> Result<()> {
    if len == 0 || rows % len != 0 {
        bail_invalid!(
            "{} has length {}, which does not evenly divide {} rows.",
            what,
            len,
            rows
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::{manual_tour, FixedFrameCount, TourSettings};

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn small_path() -> TourPath {
        let basis = Basis::with_labels(
            DMatrix::identity(3, 2),
            labels(&["sepal_length", "sepal_width", "petal_length"]),
        )
        .expect("basis");
        manual_tour(
            &basis,
            &ManipVar::Index(3),
            &FixedFrameCount { n_frames: 4 },
            &TourSettings::default(),
        )
        .expect("tour")
    }

    #[test]
    fn flatten_abbreviates_variable_names() {
        let tables = flatten(&small_path(), &FlattenOptions::default()).expect("tables");
        assert_eq!(tables.basis.len(), 12);
        assert_eq!(tables.frame_count(), 4);
        assert_eq!(tables.basis[0].label, "sep");
        assert_eq!(tables.basis[2].label, "pet");
        assert_eq!(tables.basis[11].frame, 4);
        assert!(tables.data.is_none());
        assert_eq!(tables.manip_var, Some(3));
        assert!(tables.is_manip_row(2));
        assert!(tables.is_manip_row(5));
        assert!(!tables.is_manip_row(4));
    }

    #[test]
    fn flatten_defaults_to_positional_labels() {
        let basis = Basis::identity(3, 2).expect("basis");
        let tables = flatten_basis(&basis, None, &FlattenOptions::default()).expect("tables");
        let got: Vec<&str> = tables.basis.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(got, vec!["V1", "V2", "V3"]);
        assert_eq!(tables.manip_var, None);
        assert!(!tables.is_manip_row(0));
    }

    #[test]
    fn flatten_recycles_supplied_labels() {
        let path = small_path();
        let axis_labels = labels(&["a", "b", "c"]);
        let options = FlattenOptions {
            basis_labels: Some(&axis_labels),
            ..FlattenOptions::default()
        };
        let tables = flatten(&path, &options).expect("tables");
        assert_eq!(tables.basis[3].label, "a");
        assert_eq!(tables.basis[7].label, "b");

        let bad = labels(&["a", "b", "c", "d", "e"]);
        let options = FlattenOptions {
            basis_labels: Some(&bad),
            ..FlattenOptions::default()
        };
        assert_err_contains(flatten(&path, &options), "does not evenly divide 12 rows");
    }

    #[test]
    fn flatten_projects_and_centres_data() {
        let path = small_path();
        let data = DMatrix::from_row_slice(
            4,
            3,
            &[1.0, 2.0, 3.0, 4.0, 0.0, -1.0, 2.0, 2.0, 2.0, 5.0, 1.0, 0.0],
        );
        let obs = labels(&["w", "x", "y", "z"]);
        let options = FlattenOptions {
            data: Some(&data),
            data_labels: Some(&obs),
            ..FlattenOptions::default()
        };
        let tables = flatten(&path, &options).expect("tables");
        let rows = tables.data.expect("data table");
        assert_eq!(rows.len(), 16);

        // First frame is the identity basis: centred first two columns.
        assert!((rows[0].x - (1.0 - 3.0)).abs() < 1e-12);
        assert!((rows[0].y - (2.0 - 1.25)).abs() < 1e-12);
        assert_eq!(rows[5].label.as_deref(), Some("x"));

        for frame in 1..=4 {
            let in_frame: Vec<&DataRow> = rows.iter().filter(|r| r.frame == frame).collect();
            assert_eq!(in_frame.len(), 4);
            let mean_x: f64 = in_frame.iter().map(|r| r.x).sum::<f64>() / 4.0;
            let mean_y: f64 = in_frame.iter().map(|r| r.y).sum::<f64>() / 4.0;
            assert!(mean_x.abs() < 1e-12);
            assert!(mean_y.abs() < 1e-12);
        }
    }

    #[test]
    fn flatten_rejects_mismatched_data() {
        let path = small_path();
        let data = DMatrix::<f64>::zeros(5, 4);
        let options = FlattenOptions {
            data: Some(&data),
            ..FlattenOptions::default()
        };
        assert_err_contains(flatten(&path, &options), "4 columns but the basis has 3");

        let data = DMatrix::<f64>::zeros(5, 3);
        let obs = labels(&["a", "b", "c"]);
        let options = FlattenOptions {
            data: Some(&data),
            data_labels: Some(&obs),
            ..FlattenOptions::default()
        };
        assert_err_contains(flatten(&path, &options), "data_labels has length 3");
    }

    #[test]
    fn flatten_rejects_empty_path() {
        let mut path = small_path();
        path.frames.clear();
        assert_err_contains(flatten(&path, &FlattenOptions::default()), "no frames");
    }

    #[test]
    fn abbreviate_handles_short_and_multibyte_names() {
        assert_eq!(abbreviate("x"), "x");
        assert_eq!(abbreviate("größe"), "grö");
    }
}
