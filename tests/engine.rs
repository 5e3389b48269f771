use chrono::NaiveDate;
use ndarray::Array3;

use rastercube::core::assemble::{Uncertainty, assemble_cube};
use rastercube::{
    Composite, Engine, Error, Grid, ParameterData, Query, QueryResponse, TransformKind,
    TransformSpec,
};

fn day(ordinal: u32) -> NaiveDate {
    NaiveDate::from_yo_opt(2017, ordinal).unwrap()
}

fn times() -> Vec<NaiveDate> {
    vec![day(1), day(6), day(11)]
}

/// 2x2 grid, rows at lat 40.5 / 39.5, cols at lon -3.5 / -2.5
fn grid() -> Grid {
    Grid::new(vec![40.5, 39.5], vec![-3.5, -2.5])
}

/// Values per timestep, row-major
fn composite(steps: &[[f64; 4]]) -> Composite {
    let flat: Vec<f64> = steps.iter().flatten().copied().collect();
    Composite::new(grid(), Array3::from_shape_vec((steps.len(), 2, 2), flat).unwrap())
}

fn parameter(name: &str, steps: &[[f64; 4]], spec: TransformSpec) -> ParameterData {
    let raw = assemble_cube(name, composite(steps), times(), Uncertainty::Fraction(0.2)).unwrap();
    ParameterData::from_raw_cube(name, spec, raw)
}

fn engine() -> Engine {
    let nan = f64::NAN;
    Engine::from_parameters([
        parameter(
            "lai",
            &[
                [10.0, 1.0, 2.0, nan],
                [12.0, 3.0, nan, 4.0],
                [14.0, nan, 5.0, 6.0],
            ],
            TransformSpec::IDENTITY,
        ),
        parameter(
            "cab",
            &[
                [0.2, 0.4, 0.6, 0.8],
                [0.3, 0.5, 0.7, 0.9],
                [0.1, 0.2, 0.3, 0.4],
            ],
            TransformSpec::new(TransformKind::LogInverse, -2.0),
        ),
    ])
}

#[test]
fn lists_sorted_parameters() {
    assert_eq!(engine().list_parameters(), vec!["cab", "lai"]);
}

#[test]
fn timesteps_are_strictly_increasing() {
    let steps = engine().get_timesteps("lai").unwrap();
    assert_eq!(steps, times());
    assert!(steps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn timeseries_returns_pixel_means_in_order() {
    let series = engine().get_timeseries("lai", 40.4, -3.6).unwrap();
    assert_eq!(series.latitude, 40.5);
    assert_eq!(series.longitude, -3.5);
    let means: Vec<f64> = series.points.iter().map(|p| p.mean).collect();
    assert_eq!(means, vec![10.0, 12.0, 14.0]);
    let dates: Vec<NaiveDate> = series.points.iter().map(|p| p.time).collect();
    assert_eq!(dates, times());
    assert!((series.points[0].min - 8.0).abs() < 1e-12);
    assert!((series.points[0].max - 12.0).abs() < 1e-12);
}

#[test]
fn vis_stats_mean_skips_nan_cell() {
    let nan = f64::NAN;
    let values = [
        [1.0, 2.0, 3.0, 4.0],
        [5.0, nan, 7.0, 8.0],
        [9.0, 10.0, 11.0, 12.0],
    ];
    let engine = Engine::from_parameters([parameter("cw", &values, TransformSpec::IDENTITY)]);

    let finite: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    assert_eq!(finite.len(), 11);
    let expected = finite.iter().sum::<f64>() / 11.0;

    let stats = engine.get_vis_stats("cw").unwrap();
    assert!((stats.core.mean - expected).abs() < 1e-12);
    assert_eq!(stats.core.count, 11);
    assert_eq!(stats.core.min, 1.0);
    assert_eq!(stats.core.max, 12.0);
    assert!(stats.core.std.is_finite());
    // |max - min| = 2 * 0.2 * value
    assert!((stats.unc_range.max - 4.8).abs() < 1e-12);
}

#[test]
fn area_aggregate_averages_finite_cells_only() {
    let agg = engine()
        .get_area_aggregate("lai", (39.0, 41.0), (-4.0, -2.0))
        .unwrap();
    assert_eq!(agg.times, times());
    let expected = [13.0 / 3.0, 19.0 / 3.0, 25.0 / 3.0];
    for (got, want) in agg.mean.iter().zip(expected) {
        assert!((got - want).abs() < 1e-12, "{got} != {want}");
    }
    assert_eq!(agg.cell_counts, vec![3, 3, 3]);
    for t in 0..3 {
        assert!((agg.min[t] - 0.8 * expected[t]).abs() < 1e-9);
        assert!((agg.max[t] - 1.2 * expected[t]).abs() < 1e-9);
    }
}

#[test]
fn area_aggregate_accepts_reversed_ranges_and_subsets() {
    let agg = engine()
        .get_area_aggregate("lai", (41.0, 40.0), (-2.0, -3.0))
        .unwrap();
    // Only the north-east pixel: 1, 3, NaN
    assert_eq!(agg.mean[0], 1.0);
    assert_eq!(agg.mean[1], 3.0);
    assert!(agg.mean[2].is_nan());
    assert_eq!(agg.cell_counts, vec![1, 1, 0]);
}

#[test]
fn empty_area_is_not_found() {
    let err = engine()
        .get_area_aggregate("lai", (10.0, 11.0), (-4.0, -2.0))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn timestep_requires_exact_date() {
    let engine = engine();
    let slice = engine.get_timestep("lai", day(6)).unwrap();
    assert_eq!(slice.time, day(6));
    assert_eq!(slice.cells.len(), 4);
    assert_eq!(slice.cells[0].mean, 12.0);
    assert_eq!((slice.cells[3].latitude, slice.cells[3].longitude), (39.5, -2.5));
    assert_eq!(slice.cells[3].mean, 4.0);

    assert!(matches!(
        engine.get_timestep("lai", day(7)),
        Err(Error::NotFound(_))
    ));
    assert_eq!(engine.get_timestep_at("lai", 2).unwrap().time, day(11));
    assert!(engine.get_timestep_at("lai", 3).is_err());
}

#[test]
fn log_inverse_parameter_is_ordered() {
    let engine = engine();
    for t in engine.get_timesteps("cab").unwrap() {
        for cell in engine.get_timestep("cab", t).unwrap().cells {
            assert!(cell.min <= cell.mean && cell.mean <= cell.max, "{cell:?}");
        }
    }
}

#[test]
fn unknown_parameter_is_not_found() {
    let engine = engine();
    assert!(matches!(engine.get_timesteps("fapar"), Err(Error::NotFound(_))));
    assert!(matches!(engine.get_vis_stats("fapar"), Err(Error::NotFound(_))));
    assert!(matches!(
        engine.get_timeseries("fapar", 0.0, 0.0),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        engine.get_timeseries("lai", f64::NAN, 0.0),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn tagged_queries_dispatch() {
    let engine = engine();
    let query: Query = serde_json::from_str(
        r#"{"kind": "timeseries", "parameter": "lai", "lat": 40.5, "lon": -3.5}"#,
    )
    .unwrap();
    match engine.handle(&query).unwrap() {
        QueryResponse::Timeseries(series) => assert_eq!(series.points.len(), 3),
        other => panic!("unexpected response {other:?}"),
    }

    match engine.handle(&Query::ListParameters).unwrap() {
        QueryResponse::Parameters(names) => assert_eq!(names, vec!["cab", "lai"]),
        other => panic!("unexpected response {other:?}"),
    }

    let missing = Query::Timestep {
        parameter: "lai".into(),
        time: day(2),
    };
    assert!(matches!(engine.handle(&missing), Err(Error::NotFound(_))));
    assert_eq!(missing.parameter(), Some("lai"));
    assert_eq!(Query::ListParameters.parameter(), None);

    let stats = Query::VisStats {
        parameter: "lai".into(),
    };
    let json = serde_json::to_value(engine.handle(&stats).unwrap()).unwrap();
    assert_eq!(json["kind"], "vis_stats");
    assert!(json["data"]["core"]["mean"].is_number());
}

#[test]
fn query_kind_matches_serialized_tag() {
    let queries = [
        Query::ListParameters,
        Query::Timesteps {
            parameter: "lai".into(),
        },
        Query::Timestep {
            parameter: "lai".into(),
            time: day(1),
        },
        Query::Timeseries {
            parameter: "lai".into(),
            lat: 40.5,
            lon: -3.5,
        },
        Query::AreaAggregate {
            parameter: "lai".into(),
            lat_range: (39.0, 41.0),
            lon_range: (-4.0, -2.0),
        },
        Query::VisStats {
            parameter: "cab".into(),
        },
    ];
    for query in queries {
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["kind"], query.kind());
        assert_eq!(json["parameter"].as_str(), query.parameter());
    }
}

#[test]
fn concurrent_readers_share_engine() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Engine>();

    let engine = engine();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let series = engine.get_timeseries("lai", 40.5, -3.5).unwrap();
                assert_eq!(series.points[2].mean, 14.0);
                engine.get_vis_stats("cab").unwrap();
            });
        }
    });
}

#[test]
fn in_memory_engine_cannot_reload() {
    let mut engine = engine();
    assert!(engine.reload("lai").is_err());
    assert_eq!(engine.get_timesteps("lai").unwrap().len(), 3);
}
