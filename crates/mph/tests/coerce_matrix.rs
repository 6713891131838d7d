use std::path::{Path, PathBuf};

use mph::coerce::{to_engine, to_host};
use mph::engine::{EngineResult, Entity};
use mph::{EngineError, HostValue, Model, NdArray, Value, ValueType};
use proptest::prelude::*;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("capacitor.json")
}

fn load() -> Model {
    mph::memory::open(&fixture()).unwrap_or_else(|e| panic!("failed to load fixture: {e}"))
}

fn strs(items: &[&str]) -> HostValue {
    HostValue::List(items.iter().map(|s| HostValue::from(*s)).collect())
}

#[test]
fn write_then_read_matrix() {
    let model = load();
    let step = model.node("functions/step");
    let cases: Vec<(&str, HostValue, HostValue)> = vec![
        ("flag", HostValue::Bool(true), HostValue::Bool(true)),
        ("count", HostValue::Int(3), HostValue::Int(3)),
        ("scale", HostValue::Float(2.5), HostValue::Float(2.5)),
        ("funcname", HostValue::from("ramp"), HostValue::from("ramp")),
        // Unset text reads as none.
        ("empty", HostValue::from(""), HostValue::None),
        ("none", HostValue::None, HostValue::None),
        (
            "flags",
            HostValue::from(vec![true, false]),
            HostValue::from(vec![true, false]),
        ),
        (
            "indices",
            HostValue::from(vec![1i64, 2, 3]),
            HostValue::from(vec![1i64, 2, 3]),
        ),
        (
            "values",
            HostValue::from(vec![0.5, 1.5]),
            HostValue::from(vec![0.5, 1.5]),
        ),
        (
            "grid",
            HostValue::from(NdArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap()),
            HostValue::from(NdArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap()),
        ),
        (
            "counts",
            HostValue::from(NdArray::new(vec![2, 3], vec![1i64, 2, 3, 4, 5, 6]).unwrap()),
            HostValue::from(NdArray::new(vec![2, 3], vec![1i64, 2, 3, 4, 5, 6]).unwrap()),
        ),
        // String arrays come back as plain lists.
        ("names", HostValue::from(vec!["a", "b"]), strs(&["a", "b"])),
        (
            "table",
            HostValue::from(
                NdArray::new(vec![2, 2], vec!["a", "b", "c", "d"].into_iter().map(String::from).collect())
                    .unwrap(),
            ),
            HostValue::List(vec![strs(&["a", "b"]), strs(&["c", "d"])]),
        ),
        (
            "scalar",
            HostValue::FloatArray(NdArray::scalar(7.0)),
            HostValue::Float(7.0),
        ),
    ];
    for (name, written, expected) in cases {
        step.set_property(name, written.clone())
            .unwrap_or_else(|e| panic!("writing {name}: {e}"));
        assert_eq!(step.property(name).unwrap(), expected, "for {name}");
    }
}

#[test]
fn ragged_object_array_becomes_string_matrix() {
    let model = load();
    let step = model.node("functions/step");
    let ragged = HostValue::Objects(vec![
        HostValue::List(vec![HostValue::Int(1), HostValue::Int(2), HostValue::Int(3)]),
        HostValue::List(vec![HostValue::Int(4), HostValue::Int(5)]),
    ]);
    assert_eq!(
        to_engine(&ragged).unwrap(),
        Value::StringMatrix(vec![
            vec!["1".into(), "2".into(), "3".into()],
            vec!["4".into(), "5".into()],
        ])
    );
    step.set_property("ragged", ragged).unwrap();
    assert_eq!(
        step.property("ragged").unwrap(),
        HostValue::List(vec![strs(&["1", "2", "3"]), strs(&["4", "5"])])
    );
}

#[test]
fn empty_string_matrix_reads_as_one_empty_row() {
    let model = load();
    let step = model.node("functions/step");
    let empty = NdArray::<String>::new(vec![0, 0], Vec::new()).unwrap();
    step.set_property("cells", empty).unwrap();
    assert_eq!(
        step.property("cells").unwrap(),
        HostValue::List(vec![HostValue::List(Vec::new())])
    );
}

#[test]
fn declared_types_drive_reads() {
    let model = load();

    let selection = model.node("selections/anode");
    assert_eq!(selection.property("entities").unwrap(), strs(&["1", "2"]));

    let export = model.node("exports/data");
    assert_eq!(export.property("filename").unwrap(), HostValue::Path(PathBuf::new()));
    export.set_property("filename", PathBuf::from("out/data.txt")).unwrap();
    assert_eq!(
        export.property("filename").unwrap(),
        HostValue::Path(PathBuf::from("out/data.txt"))
    );

    let medium = model.node("materials/medium");
    let rows = |rows: Vec<Vec<f64>>| {
        HostValue::Objects(
            rows.into_iter()
                .map(|row| HostValue::FloatArray(NdArray::from_vec(row)))
                .collect(),
        )
    };
    assert_eq!(
        medium.property("relpermittivity").unwrap(),
        rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]])
    );
    medium
        .set_property("relpermittivity", rows(vec![vec![2.0], vec![3.0, 4.0]]))
        .unwrap();
    assert_eq!(
        medium.property("relpermittivity").unwrap(),
        rows(vec![vec![2.0], vec![3.0, 4.0]])
    );

    // Integers written to a floating point property stay floating point.
    let step = model.node("functions/step");
    step.set_property("location", 1).unwrap();
    assert_eq!(step.property("location").unwrap(), HostValue::Float(1.0));
}

#[test]
fn unconvertible_host_values() {
    let three_d = HostValue::FloatArray(NdArray::new(vec![2, 1, 2], vec![0.0; 4]).unwrap());
    let err = to_engine(&three_d).unwrap_err();
    assert!(err.is_type_conversion());
    assert!(err.to_string().contains("3-dimensional float array"), "{err}");

    let too_many_rows = HostValue::Objects(vec![
        HostValue::from(vec![1.0]),
        HostValue::from(vec![2.0]),
        HostValue::from(vec![3.0]),
    ]);
    assert!(to_engine(&too_many_rows).unwrap_err().is_type_conversion());

    let mixed = HostValue::Objects(vec![HostValue::from(vec![1.0]), HostValue::Int(2)]);
    assert!(to_engine(&mixed).unwrap_err().is_type_conversion());

    let nested = HostValue::Objects(vec![HostValue::List(vec![HostValue::List(vec![])])]);
    assert!(to_engine(&nested).unwrap_err().is_type_conversion());

    assert!(to_engine(&HostValue::Int(1 << 40)).unwrap_err().is_type_conversion());
    assert!(to_engine(&HostValue::Complex(num_complex::Complex64::new(1.0, 1.0)))
        .unwrap_err()
        .is_type_conversion());

    let model = load();
    let err = model
        .node("functions/step")
        .set_property("grid", three_d)
        .unwrap_err();
    assert!(err.is_type_conversion());
}

#[test]
fn object_array_of_scalars_is_string_array() {
    let objects = HostValue::Objects(vec![HostValue::from("a"), HostValue::Int(1), HostValue::Bool(true)]);
    assert_eq!(
        to_engine(&objects).unwrap(),
        Value::StringArray(vec!["a".into(), "1".into(), "true".into()])
    );
    assert_eq!(to_engine(&HostValue::Objects(vec![])).unwrap(), Value::StringArray(vec![]));
}

fn matrix() -> impl Strategy<Value = NdArray<f64>> {
    (1usize..4, 1usize..4).prop_flat_map(|(rows, columns)| {
        prop::collection::vec(-1e9f64..1e9, rows * columns)
            .prop_map(move |data| NdArray::new(vec![rows, columns], data).unwrap())
    })
}

proptest! {
    #[test]
    fn scalars_survive_the_engine(i in any::<i32>(), x in -1e300f64..1e300, s in ".{0,16}") {
        let model = load();
        let step = model.node("functions/step");
        step.set_property("i", i).unwrap();
        step.set_property("x", x).unwrap();
        step.set_property("s", s.as_str()).unwrap();
        prop_assert_eq!(step.property("i").unwrap(), HostValue::Int(i64::from(i)));
        prop_assert_eq!(step.property("x").unwrap(), HostValue::Float(x));
        let expected = if s.is_empty() { HostValue::None } else { HostValue::Str(s) };
        prop_assert_eq!(step.property("s").unwrap(), expected);
    }

    #[test]
    fn rectangular_matrices_survive_the_engine(m in matrix()) {
        let model = load();
        let step = model.node("functions/step");
        step.set_property("m", m.clone()).unwrap();
        prop_assert_eq!(step.property("m").unwrap(), HostValue::FloatArray(m));
    }
}

/// A feature that declares whatever type it is told to.
struct Declares(&'static str, Value);

impl Entity for Declares {
    fn tag(&self) -> String {
        "odd1".to_string()
    }

    fn set_tag(&self, _tag: &str) -> EngineResult<()> {
        Ok(())
    }

    fn label(&self) -> String {
        "odd".to_string()
    }

    fn set_label(&self, _label: &str) -> EngineResult<()> {
        Ok(())
    }

    fn properties(&self) -> EngineResult<Vec<String>> {
        Ok(vec!["value".to_string()])
    }

    fn value_type(&self, name: &str) -> EngineResult<String> {
        match name {
            "value" => Ok(self.0.to_string()),
            other => Err(EngineError::NoSuchProperty(other.to_string())),
        }
    }

    fn get(&self, _name: &str, _as_type: &ValueType) -> EngineResult<Value> {
        Ok(self.1.clone())
    }

    fn set(&self, _name: &str, _value: Value) -> EngineResult<()> {
        Ok(())
    }
}

#[test]
fn unknown_and_mismatched_engine_types() {
    let err = to_host(&Declares("Quaternion", Value::Int(1)), "value").unwrap_err();
    assert!(err.is_type_conversion());
    assert!(err.to_string().contains("Quaternion"), "{err}");

    let err = to_host(&Declares("Int", Value::String("1".into())), "value").unwrap_err();
    assert!(err.is_type_conversion());

    let err = to_host(
        &Declares("DoubleRowMatrix", Value::DoubleMatrix(vec![vec![1.0]; 3])),
        "value",
    )
    .unwrap_err();
    assert!(err.is_type_conversion());

    assert_eq!(
        to_host(&Declares("None", Value::Int(1)), "value").unwrap(),
        HostValue::None
    );

    let err = to_host(&Declares("Int", Value::Int(1)), "other").unwrap_err();
    assert!(matches!(err, mph::Error::Engine(EngineError::NoSuchProperty(_))));
}
