//! Integration tests for fc-engine: compile, register, replay, evaluate.

use fc_core::{Tolerances, Value, ValueKind, Vec3, nearly_equal};
use fc_engine::{
    ContextDef, EvalResult, FieldCalculator, FieldContext, FieldData, GeometrySet, GeometrySetDef,
    QuantityDataDef, ScriptRecorder,
};
use fc_expr::{Expr, Fields, GeomDomain, Geometry, consts};

/// A small rectangular radiation surface with phasor-like E and H data.
fn radiation_context() -> FieldContext {
    let points = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
    ];
    // each sample covers a quarter of the unit square
    let mut ctx = FieldContext::new(points, vec![0.25; 4]).unwrap();
    ctx.add_geometry(GeometrySet {
        name: "aperture".into(),
        domain: GeomDomain::Surface,
        samples: vec![0, 1, 2, 3],
    })
    .unwrap();
    ctx.add_quantity(
        "E",
        FieldData::from_vectors([
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
        ]),
    )
    .unwrap();
    ctx.add_quantity(
        "H",
        FieldData::from_vectors([
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ]),
    )
    .unwrap();
    ctx
}

#[test]
fn radiated_power_pipeline() {
    let mut calc = FieldCalculator::new();
    let aperture = Geometry::surface("aperture");

    // S = 0.5 * E x H, P = integrate(mag(S)) over the aperture
    calc.add_named_expression(
        "S_avg",
        &(0.5 * Fields::vector("E").cross(Fields::vector("H"))),
    )
    .unwrap();
    calc.add_named_expression("P_rad", &Expr::named("S_avg").mag().integrate(&aperture))
        .unwrap();

    let ctx = radiation_context();
    match calc.evaluate("P_rad", &ctx).unwrap() {
        EvalResult::Value(Value::Scalar(p)) => {
            // |S| per point: 0.5 * [1, 2, 6, 8]; weighted sum * 0.25
            let expected = 0.25 * 0.5 * (1.0 + 2.0 + 6.0 + 8.0);
            assert!(nearly_equal(p, expected, Tolerances::default()));
        }
        other => panic!("expected scalar power, got {other:?}"),
    }

    // the intermediate field result is also evaluable on its own
    match calc.evaluate("S_avg", &ctx).unwrap() {
        EvalResult::Field(f) => {
            assert_eq!(f.kind(), ValueKind::Vector);
            assert_eq!(f.values()[0], Value::vector(0.0, 0.0, 0.5));
        }
        other => panic!("expected field, got {other:?}"),
    }
}

#[test]
fn energy_density_uses_physical_constants() {
    let mut calc = FieldCalculator::new();
    calc.add_named_expression(
        "w_e",
        &(0.5 * consts::eps0() * Fields::vector("E").dot(Fields::vector("E"))),
    )
    .unwrap();

    let ctx = radiation_context();
    match calc.evaluate("w_e", &ctx).unwrap() {
        EvalResult::Field(f) => {
            let expected = 0.5 * 8.854_187_812_8e-12 * 4.0;
            let got = f.values()[1].as_scalar().unwrap();
            assert!(nearly_equal(got, expected, Tolerances::default()));
        }
        other => panic!("expected field, got {other:?}"),
    }
}

#[test]
fn same_program_replays_identically_on_engine_and_recorder() {
    let mut calc = FieldCalculator::new();
    let aperture = Geometry::surface("aperture");
    calc.add_named_expression("e_peak", &Fields::vector("E").mag().maximum(&aperture))
        .unwrap();

    // recorder sees the exact call sequence
    let mut recorder = ScriptRecorder::new();
    calc.replay_onto("e_peak", &mut recorder).unwrap();
    let script = recorder.script();
    assert!(script.contains("push_quantity E vector"));
    assert!(script.contains("reduce maximum"));
    assert!(script.ends_with("push_named e_peak\n"));

    // engine produces the value
    let ctx = radiation_context();
    assert_eq!(
        calc.evaluate("e_peak", &ctx).unwrap(),
        EvalResult::Value(Value::scalar(4.0))
    );
}

#[test]
fn context_defs_build_and_evaluate() {
    let def = ContextDef {
        points: vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [1.0, 0.0, 0.0]],
        weights: Some(vec![0.25, 0.5, 0.25]),
        geometries: vec![GeometrySetDef {
            name: "wire".into(),
            domain: GeomDomain::Line,
            samples: vec![0, 1, 2],
        }],
        quantities: vec![QuantityDataDef::Scalar {
            name: "sigma".into(),
            values: vec![1.0, 3.0, 5.0],
        }],
    };
    let ctx = def.build().unwrap();

    let mut calc = FieldCalculator::new();
    let wire = Geometry::line("wire");
    calc.add_named_expression("sigma_avg", &Fields::scalar("sigma").mean(&wire))
        .unwrap();

    // (0.25*1 + 0.5*3 + 0.25*5) / 1.0 = 3.0
    assert_eq!(
        calc.evaluate("sigma_avg", &ctx).unwrap(),
        EvalResult::Value(Value::scalar(3.0))
    );
}

#[test]
fn complex_quantities_flow_through_named_expressions() {
    let def = ContextDef {
        points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
        weights: None,
        geometries: vec![],
        quantities: vec![QuantityDataDef::Complex {
            name: "V".into(),
            values: vec![[3.0, 4.0], [0.0, 2.0]],
        }],
    };
    let ctx = def.build().unwrap();

    let mut calc = FieldCalculator::new();
    let v = Fields::complex("V");
    calc.add_named_expression("v_mag", &(v.clone() * v.conj()).real().sqrt())
        .unwrap();

    match calc.evaluate("v_mag", &ctx).unwrap() {
        EvalResult::Field(f) => {
            assert_eq!(f.kind(), ValueKind::Scalar);
            let tol = Tolerances::default();
            assert!(nearly_equal(f.values()[0].as_scalar().unwrap(), 5.0, tol));
            assert!(nearly_equal(f.values()[1].as_scalar().unwrap(), 2.0, tol));
        }
        other => panic!("expected field, got {other:?}"),
    }
}

#[test]
fn kind_errors_from_file_programs_surface_at_replay() {
    // a context whose quantity kind disagrees with the program
    let mut ctx = FieldContext::with_unit_weights(vec![Vec3::zeros()]);
    ctx.add_quantity("E", FieldData::from_scalars([1.0])).unwrap();

    let mut calc = FieldCalculator::new();
    calc.add_named_expression("e_mag", &Fields::vector("E").mag())
        .unwrap();

    assert!(calc.evaluate("e_mag", &ctx).is_err());
}
