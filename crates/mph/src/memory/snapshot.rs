//! JSON snapshots of a model held by the reference engine.
//!
//! ```json
//! {
//!   "label": "capacitor.mph",
//!   "version": "COMSOL Multiphysics 6.1.0.282",
//!   "parameters": [{"name": "U", "value": "1[V]", "description": "voltage"}],
//!   "groups": {
//!     "functions": [
//!       {"tag": "step1", "label": "step", "type": "Step",
//!        "properties": {"funcname": "step", "location": {"type": "Double", "value": 0.5}}}
//!     ]
//!   }
//! }
//! ```
//!
//! Properties are either plain JSON values, whose engine type is inferred,
//! or objects naming the type explicitly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;

use crate::engine::ProblemReport;
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub version: String,
    pub products: Vec<String>,
    pub parameters: Vec<ParameterSnapshot>,
    /// Features per group, keyed by group name or alias.
    pub groups: IndexMap<String, Vec<FeatureSnapshot>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub tag: String,
    /// Defaults to the tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comments: String,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySnapshot>,
    /// Sub-features. Absent means the usual container for the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<FeatureSnapshot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolutionData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<ProblemSnapshot>,
}

/// A warning or error the feature reports, with the ones nested under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemSnapshot {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub selection: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<ProblemSnapshot>,
}

impl From<&ProblemSnapshot> for ProblemReport {
    fn from(problem: &ProblemSnapshot) -> Self {
        ProblemReport {
            kind: problem.kind.clone(),
            message: problem.message.clone(),
            selection: problem.selection.clone(),
            nested: problem.problems.iter().map(ProblemReport::from).collect(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertySnapshot {
    Typed {
        #[serde(rename = "type")]
        value_type: String,
        value: JsonValue,
    },
    Plain(JsonValue),
}

/// Stored results of a solution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolutionData {
    pub computed: bool,
    /// Inner solution values, such as times.
    pub inner: Vec<f64>,
    /// Outer solution values, such as sweep parameter values.
    pub outer: Vec<f64>,
    /// Results per expression.
    pub results: IndexMap<String, StoredResult>,
}

/// Values of one expression, indexed by outer solution, inner solution,
/// and point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    #[serde(default)]
    pub global: bool,
    pub real: Vec<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imag: Option<Vec<Vec<Vec<f64>>>>,
}

impl PropertySnapshot {
    /// Declared type and value.
    pub fn decode(&self) -> Result<(ValueType, Value), String> {
        match self {
            PropertySnapshot::Typed { value_type, value } => {
                let declared: ValueType = value_type.parse().unwrap_or_else(|never| match never {});
                let decoded = decode_typed(&declared, value)?;
                Ok((declared, decoded))
            }
            PropertySnapshot::Plain(value) => infer(value),
        }
    }

    pub fn encode(declared: &ValueType, value: &Value) -> PropertySnapshot {
        PropertySnapshot::Typed {
            value_type: declared.to_string(),
            value: encode(value),
        }
    }
}

fn expected(what: &str, json: &JsonValue) -> String {
    format!("expected {what}, got {json}")
}

fn bool_of(json: &JsonValue) -> Result<bool, String> {
    json.as_bool().ok_or_else(|| expected("a boolean", json))
}

fn int_of(json: &JsonValue) -> Result<i32, String> {
    json.as_i64()
        .and_then(|i| i32::try_from(i).ok())
        .ok_or_else(|| expected("a 32-bit integer", json))
}

fn double_of(json: &JsonValue) -> Result<f64, String> {
    json.as_f64().ok_or_else(|| expected("a number", json))
}

fn string_of(json: &JsonValue) -> Result<String, String> {
    json.as_str()
        .map(str::to_string)
        .ok_or_else(|| expected("a string", json))
}

fn items(json: &JsonValue) -> Result<&Vec<JsonValue>, String> {
    json.as_array().ok_or_else(|| expected("an array", json))
}

fn vector<T>(json: &JsonValue, item: fn(&JsonValue) -> Result<T, String>) -> Result<Vec<T>, String> {
    items(json)?.iter().map(item).collect()
}

fn matrix<T>(json: &JsonValue, item: fn(&JsonValue) -> Result<T, String>) -> Result<Vec<Vec<T>>, String> {
    items(json)?.iter().map(|row| vector(row, item)).collect()
}

/// Decode a value stored under an explicit type.
fn decode_typed(declared: &ValueType, json: &JsonValue) -> Result<Value, String> {
    Ok(match declared {
        ValueType::None => Value::None,
        ValueType::Boolean => Value::Boolean(bool_of(json)?),
        ValueType::Int => Value::Int(int_of(json)?),
        ValueType::Double => Value::Double(double_of(json)?),
        ValueType::String | ValueType::File => Value::String(string_of(json)?),
        ValueType::BooleanArray => Value::BooleanArray(vector(json, bool_of)?),
        ValueType::IntArray => Value::IntArray(vector(json, int_of)?),
        ValueType::DoubleArray => Value::DoubleArray(vector(json, double_of)?),
        ValueType::StringArray | ValueType::Selection => Value::StringArray(vector(json, string_of)?),
        ValueType::BooleanMatrix => Value::BooleanMatrix(matrix(json, bool_of)?),
        ValueType::IntMatrix => Value::IntMatrix(matrix(json, int_of)?),
        ValueType::DoubleMatrix | ValueType::DoubleRowMatrix => Value::DoubleMatrix(matrix(json, double_of)?),
        ValueType::StringMatrix => Value::StringMatrix(matrix(json, string_of)?),
        ValueType::Unknown(tag) => return Err(format!("unknown value type \"{tag}\"")),
    })
}

/// Infer the engine type of a plain JSON value.
fn infer(json: &JsonValue) -> Result<(ValueType, Value), String> {
    let declared = match json {
        JsonValue::Null => ValueType::None,
        JsonValue::Bool(_) => ValueType::Boolean,
        JsonValue::Number(_) if int_of(json).is_ok() => ValueType::Int,
        JsonValue::Number(_) => ValueType::Double,
        JsonValue::String(_) => ValueType::String,
        JsonValue::Array(rows) if !rows.is_empty() && rows.iter().all(JsonValue::is_array) => {
            let cells: Vec<JsonValue> = rows.iter().flat_map(|row| row.as_array().cloned().unwrap_or_default()).collect();
            match scalar_kind(&cells) {
                Some(ValueType::Boolean) => ValueType::BooleanMatrix,
                Some(ValueType::Int) => ValueType::IntMatrix,
                Some(ValueType::Double) => ValueType::DoubleMatrix,
                Some(_) => ValueType::StringMatrix,
                None => return Err(format!("cannot infer the type of {json}")),
            }
        }
        JsonValue::Array(cells) => match scalar_kind(cells) {
            Some(ValueType::Boolean) => ValueType::BooleanArray,
            Some(ValueType::Int) => ValueType::IntArray,
            Some(ValueType::Double) => ValueType::DoubleArray,
            Some(_) => ValueType::StringArray,
            None => return Err(format!("cannot infer the type of {json}")),
        },
        JsonValue::Object(_) => return Err(format!("cannot infer the type of {json}")),
    };
    let value = decode_typed(&declared, json)?;
    Ok((declared, value))
}

/// Common scalar type of array cells. Empty arrays count as strings.
fn scalar_kind(cells: &[JsonValue]) -> Option<ValueType> {
    if cells.iter().all(JsonValue::is_boolean) {
        if cells.is_empty() {
            return Some(ValueType::String);
        }
        return Some(ValueType::Boolean);
    }
    if cells.iter().all(|cell| int_of(cell).is_ok()) {
        return Some(ValueType::Int);
    }
    if cells.iter().all(JsonValue::is_number) {
        return Some(ValueType::Double);
    }
    if cells.iter().all(JsonValue::is_string) {
        return Some(ValueType::String);
    }
    None
}

fn encode(value: &Value) -> JsonValue {
    match value {
        Value::None => JsonValue::Null,
        Value::Boolean(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Double(x) => json!(x),
        Value::String(s) => json!(s),
        Value::BooleanArray(v) => json!(v),
        Value::IntArray(v) => json!(v),
        Value::DoubleArray(v) => json!(v),
        Value::StringArray(v) => json!(v),
        Value::BooleanMatrix(m) => json!(m),
        Value::IntMatrix(m) => json!(m),
        Value::DoubleMatrix(m) => json!(m),
        Value::StringMatrix(m) => json!(m),
        Value::List(items) => JsonValue::Array(items.iter().map(encode).collect()),
    }
}
