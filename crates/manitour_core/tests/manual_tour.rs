use manitour_core::{
    flatten, is_orthonormal, manip_var_of, manual_tour, orthonormalize, Basis, FixedFrameCount,
    FlattenOptions, ManipVar, TourError, TourPath, TourSettings,
};
use nalgebra::DMatrix;
use std::f64::consts::FRAC_PI_2;

fn six_variable_basis() -> Basis {
    let raw = DMatrix::from_row_slice(
        6,
        2,
        &[
            0.8, 0.1, -0.3, 0.5, 0.2, 0.2, 0.4, -0.6, 0.1, 0.3, -0.2, 0.4,
        ],
    );
    let labels = ["V1", "V2", "V3", "V4", "V5", "V6"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    Basis::with_labels(orthonormalize(&raw).expect("orthonormal"), labels).expect("basis")
}

fn twenty_frame_tour(basis: &Basis) -> TourPath {
    let settings = TourSettings {
        phi_min: 0.0,
        phi_max: FRAC_PI_2,
        ..TourSettings::default()
    };
    manual_tour(
        basis,
        &ManipVar::Index(4),
        &FixedFrameCount { n_frames: 20 },
        &settings,
    )
    .expect("tour")
}

#[test]
fn six_variable_tour_produces_twenty_orthonormal_frames() {
    let basis = six_variable_basis();
    let tour = twenty_frame_tour(&basis);

    assert_eq!(tour.len(), 20);
    assert_eq!(tour.manip_var, 4);
    for frame in &tour.frames {
        assert_eq!(frame.shape(), (6, 2));
        assert!(is_orthonormal(frame, 1e-9));
    }
    assert!((&tour.frames[0] - basis.matrix()).amax() < 1e-9);
    assert!((&tour.frames[19] - basis.matrix()).amax() < 1e-9);

    let tables = flatten(&tour, &FlattenOptions::default()).expect("tables");
    assert_eq!(tables.basis.len(), 120);
    assert!(tables.data.is_none());
    for (i, row) in tables.basis.iter().enumerate() {
        assert_eq!(row.frame, i / 6 + 1);
        assert_eq!(row.label, format!("V{}", i % 6 + 1));
    }
}

#[test]
fn data_table_is_centred_per_frame() {
    let basis = six_variable_basis();
    let tour = twenty_frame_tour(&basis);
    let data = DMatrix::from_fn(10, 6, |i, j| ((i * 7 + j * 3) % 11) as f64 + 0.25 * j as f64);

    let options = FlattenOptions {
        data: Some(&data),
        ..FlattenOptions::default()
    };
    let tables = flatten(&tour, &options).expect("tables");
    let rows = tables.data.expect("data table");
    assert_eq!(rows.len(), 200);

    for frame in 1..=20 {
        let (sum_x, sum_y, count) = rows
            .iter()
            .filter(|r| r.frame == frame)
            .fold((0.0, 0.0, 0), |(sx, sy, c), r| (sx + r.x, sy + r.y, c + 1));
        assert_eq!(count, 10);
        assert!((sum_x / 10.0).abs() < 1e-9);
        assert!((sum_y / 10.0).abs() < 1e-9);
    }
}

#[test]
fn invalid_manip_var_and_phi_bounds_are_rejected() {
    let basis = six_variable_basis();
    let policy = FixedFrameCount::default();
    for bad in [0, 7] {
        let err = manual_tour(&basis, &ManipVar::Index(bad), &policy, &TourSettings::default())
            .expect_err("expected invalid manip_var");
        assert!(matches!(err, TourError::InvalidArgument(_)));
    }

    let settings = TourSettings {
        phi_min: FRAC_PI_2,
        ..TourSettings::default()
    };
    let err = manual_tour(&basis, &ManipVar::Index(4), &policy, &settings)
        .expect_err("expected phi ordering error");
    assert!(matches!(err, TourError::InvalidArgument(_)));
}

#[test]
fn manip_var_by_name_matches_index() {
    let basis = six_variable_basis();
    let policy = FixedFrameCount::default();
    let by_name = manual_tour(&basis, &"V4".into(), &policy, &TourSettings::default())
        .expect("tour");
    let by_index = twenty_frame_tour(&basis);
    assert_eq!(by_name, by_index);
}

#[test]
fn tours_run_independently_on_threads() {
    let basis = six_variable_basis();
    let handles: Vec<_> = (1..=6)
        .map(|var| {
            let basis = basis.clone();
            std::thread::spawn(move || {
                manual_tour(
                    &basis,
                    &ManipVar::Index(var),
                    &FixedFrameCount::default(),
                    &TourSettings::default(),
                )
            })
        })
        .collect();
    for handle in handles {
        let tour = handle.join().expect("thread").expect("tour");
        assert_eq!(tour.len(), 20);
    }
    assert!(manip_var_of(&basis) >= 1);
}
