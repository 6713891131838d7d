//! Host-side values: scalars, paths, and n-dimensional arrays.

use num_complex::Complex64;
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;

use crate::error::Error;

/// Dense n-dimensional array in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> NdArray<T> {
    /// # Errors
    ///
    /// `InvalidArgument` if the shape does not match the element count.
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self, Error> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::InvalidArgument(format!(
                "shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Zero-dimensional array holding one element.
    pub fn scalar(value: T) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    /// Stack rows into a matrix.
    ///
    /// # Errors
    ///
    /// `TypeConversion` if the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, Error> {
        let columns = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(row) = rows.iter().position(|row| row.len() != columns) {
            return Err(Error::TypeConversion(format!(
                "matrix row {row} has {} elements where {columns} were expected",
                rows[row].len()
            )));
        }
        let shape = vec![rows.len(), columns];
        let data = rows.into_iter().flatten().collect();
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Rows of a 2-D array, `None` for any other dimension.
    pub fn rows(&self) -> Option<Vec<&[T]>> {
        if self.ndim() != 2 {
            return None;
        }
        let columns = self.shape[1];
        if columns == 0 {
            return Some(vec![&[]; self.shape[0]]);
        }
        Some(self.data.chunks(columns).collect())
    }

    /// Drop all axes of length one.
    pub fn squeeze(mut self) -> Self {
        self.shape.retain(|&n| n != 1);
        self
    }
}

impl<T: Clone> NdArray<T> {
    /// Gather the given positions along `axis`, keeping the axis.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the axis or an index is out of range.
    pub fn select(&self, axis: usize, indices: &[usize]) -> Result<Self, Error> {
        if axis >= self.ndim() {
            return Err(Error::InvalidArgument(format!(
                "axis {axis} out of range for {}-dimensional array",
                self.ndim()
            )));
        }
        let n = self.shape[axis];
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(Error::InvalidArgument(format!(
                "index {bad} out of range for axis {axis} of length {n}"
            )));
        }
        let outer: usize = self.shape[..axis].iter().product();
        let inner: usize = self.shape[axis + 1..].iter().product();
        let mut data = Vec::with_capacity(outer * indices.len() * inner);
        for o in 0..outer {
            for &i in indices {
                let start = (o * n + i) * inner;
                data.extend_from_slice(&self.data[start..start + inner]);
            }
        }
        let mut shape = self.shape.clone();
        shape[axis] = indices.len();
        Ok(Self { shape, data })
    }

    /// Take one position along `axis`, removing the axis.
    pub fn index_axis(&self, axis: usize, index: usize) -> Result<Self, Error> {
        let mut out = self.select(axis, &[index])?;
        out.shape.remove(axis);
        Ok(out)
    }
}

/// A value on the host side of the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex64),
    Str(String),
    Path(PathBuf),
    /// Plain sequence, such as a list or tuple.
    List(Vec<HostValue>),
    /// Reference to an existing node, carried by its internal tag.
    Node(String),
    BoolArray(NdArray<bool>),
    IntArray(NdArray<i64>),
    FloatArray(NdArray<f64>),
    ComplexArray(NdArray<Complex64>),
    StrArray(NdArray<String>),
    /// Array of arbitrary objects. Items that are themselves lists make
    /// it two-dimensional, and such rows may differ in length.
    Objects(Vec<HostValue>),
}

impl HostValue {
    /// Name of the host type, for error messages.
    pub fn type_name(&self) -> String {
        fn array<T>(kind: &str, array: &NdArray<T>) -> String {
            format!("{}-dimensional {kind} array", array.ndim())
        }
        match self {
            HostValue::None => "none".to_string(),
            HostValue::Bool(_) => "bool".to_string(),
            HostValue::Int(_) => "int".to_string(),
            HostValue::Float(_) => "float".to_string(),
            HostValue::Complex(_) => "complex".to_string(),
            HostValue::Str(_) => "str".to_string(),
            HostValue::Path(_) => "path".to_string(),
            HostValue::List(_) => "list".to_string(),
            HostValue::Node(_) => "node".to_string(),
            HostValue::BoolArray(a) => array("bool", a),
            HostValue::IntArray(a) => array("int", a),
            HostValue::FloatArray(a) => array("float", a),
            HostValue::ComplexArray(a) => array("complex", a),
            HostValue::StrArray(a) => array("str", a),
            HostValue::Objects(_) => "object array".to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Float(x) => Some(*x),
            HostValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Render as JSON. Complex numbers become `{"re": .., "im": ..}`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            HostValue::None => JsonValue::Null,
            HostValue::Bool(b) => json!(b),
            HostValue::Int(i) => json!(i),
            HostValue::Float(x) => json!(x),
            HostValue::Complex(c) => complex_json(c),
            HostValue::Str(s) | HostValue::Node(s) => json!(s),
            HostValue::Path(p) => json!(p.display().to_string()),
            HostValue::List(items) | HostValue::Objects(items) => {
                JsonValue::Array(items.iter().map(HostValue::to_json).collect())
            }
            HostValue::BoolArray(a) => nested_json(a.shape(), a.data(), &|b| json!(b)),
            HostValue::IntArray(a) => nested_json(a.shape(), a.data(), &|i| json!(i)),
            HostValue::FloatArray(a) => nested_json(a.shape(), a.data(), &|x| json!(x)),
            HostValue::ComplexArray(a) => nested_json(a.shape(), a.data(), &complex_json),
            HostValue::StrArray(a) => nested_json(a.shape(), a.data(), &|s| json!(s)),
        }
    }

    /// Read a host value from JSON.
    ///
    /// Homogeneous arrays of booleans, integers, numbers, or strings become
    /// typed 1-D arrays, and rectangular nestings of those become typed
    /// 2-D arrays. Any other array becomes an object array.
    ///
    /// # Errors
    ///
    /// `TypeConversion` for JSON objects.
    pub fn from_json(value: &JsonValue) -> Result<HostValue, Error> {
        Ok(match value {
            JsonValue::Null => HostValue::None,
            JsonValue::Bool(b) => HostValue::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => HostValue::Int(i),
                None => HostValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => HostValue::Str(s.clone()),
            JsonValue::Array(items) => array_from_json(items)?,
            JsonValue::Object(_) => {
                return Err(Error::TypeConversion(
                    "cannot convert a JSON object to a host value".to_string(),
                ))
            }
        })
    }
}

fn complex_json(c: &Complex64) -> JsonValue {
    json!({"re": c.re, "im": c.im})
}

fn nested_json<T>(shape: &[usize], data: &[T], leaf: &dyn Fn(&T) -> JsonValue) -> JsonValue {
    match shape.split_first() {
        None => data.first().map(leaf).unwrap_or(JsonValue::Null),
        Some((&n, rest)) => {
            let step: usize = rest.iter().product();
            JsonValue::Array(
                (0..n)
                    .map(|i| nested_json(rest, &data[i * step..(i + 1) * step], leaf))
                    .collect(),
            )
        }
    }
}

fn array_from_json(items: &[JsonValue]) -> Result<HostValue, Error> {
    if !items.is_empty() {
        if let Some(flags) = items.iter().map(JsonValue::as_bool).collect::<Option<Vec<_>>>() {
            return Ok(HostValue::BoolArray(NdArray::from_vec(flags)));
        }
        if let Some(ints) = items.iter().map(JsonValue::as_i64).collect::<Option<Vec<_>>>() {
            return Ok(HostValue::IntArray(NdArray::from_vec(ints)));
        }
        if let Some(floats) = items.iter().map(JsonValue::as_f64).collect::<Option<Vec<_>>>() {
            return Ok(HostValue::FloatArray(NdArray::from_vec(floats)));
        }
        if let Some(strings) = items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
        {
            return Ok(HostValue::StrArray(NdArray::from_vec(strings)));
        }
    }
    let converted = items
        .iter()
        .map(HostValue::from_json)
        .collect::<Result<Vec<_>, _>>()?;
    if !converted.is_empty() {
        if let Some(matrix) = stack_rows(&converted) {
            return Ok(matrix);
        }
    }
    Ok(HostValue::Objects(converted))
}

/// Stack equally long typed 1-D rows into a 2-D array of the same type.
fn stack_rows(rows: &[HostValue]) -> Option<HostValue> {
    fn collect<T: Clone>(
        rows: &[HostValue],
        pick: impl Fn(&HostValue) -> Option<&NdArray<T>>,
    ) -> Option<NdArray<T>> {
        let picked = rows
            .iter()
            .map(|row| pick(row).filter(|a| a.ndim() == 1).map(|a| a.data().to_vec()))
            .collect::<Option<Vec<_>>>()?;
        NdArray::from_rows(picked).ok()
    }
    if let Some(m) = collect(rows, |v| match v {
        HostValue::BoolArray(a) => Some(a),
        _ => None,
    }) {
        return Some(HostValue::BoolArray(m));
    }
    if let Some(m) = collect(rows, |v| match v {
        HostValue::IntArray(a) => Some(a),
        _ => None,
    }) {
        return Some(HostValue::IntArray(m));
    }
    if let Some(m) = collect(rows, |v| match v {
        HostValue::FloatArray(a) => Some(a),
        _ => None,
    }) {
        return Some(HostValue::FloatArray(m));
    }
    if let Some(m) = collect(rows, |v| match v {
        HostValue::StrArray(a) => Some(a),
        _ => None,
    }) {
        return Some(HostValue::StrArray(m));
    }
    None
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(i64::from(value))
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

impl From<Complex64> for HostValue {
    fn from(value: Complex64) -> Self {
        HostValue::Complex(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Str(value)
    }
}

impl From<PathBuf> for HostValue {
    fn from(value: PathBuf) -> Self {
        HostValue::Path(value)
    }
}

impl From<&std::path::Path> for HostValue {
    fn from(value: &std::path::Path) -> Self {
        HostValue::Path(value.to_path_buf())
    }
}

impl From<Vec<bool>> for HostValue {
    fn from(value: Vec<bool>) -> Self {
        HostValue::BoolArray(NdArray::from_vec(value))
    }
}

impl From<Vec<i64>> for HostValue {
    fn from(value: Vec<i64>) -> Self {
        HostValue::IntArray(NdArray::from_vec(value))
    }
}

impl From<Vec<f64>> for HostValue {
    fn from(value: Vec<f64>) -> Self {
        HostValue::FloatArray(NdArray::from_vec(value))
    }
}

impl From<Vec<String>> for HostValue {
    fn from(value: Vec<String>) -> Self {
        HostValue::StrArray(NdArray::from_vec(value))
    }
}

impl From<Vec<&str>> for HostValue {
    fn from(value: Vec<&str>) -> Self {
        HostValue::StrArray(NdArray::from_vec(
            value.into_iter().map(str::to_string).collect(),
        ))
    }
}

impl From<NdArray<bool>> for HostValue {
    fn from(value: NdArray<bool>) -> Self {
        HostValue::BoolArray(value)
    }
}

impl From<NdArray<i64>> for HostValue {
    fn from(value: NdArray<i64>) -> Self {
        HostValue::IntArray(value)
    }
}

impl From<NdArray<f64>> for HostValue {
    fn from(value: NdArray<f64>) -> Self {
        HostValue::FloatArray(value)
    }
}

impl From<NdArray<String>> for HostValue {
    fn from(value: NdArray<String>) -> Self {
        HostValue::StrArray(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_shape() {
        assert!(NdArray::new(vec![2, 3], vec![0; 6]).is_ok());
        assert!(NdArray::new(vec![2, 3], vec![0; 5]).is_err());
    }

    #[test]
    fn test_from_rows() {
        let m = NdArray::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        assert_eq!(m.shape(), [2, 3]);
        assert_eq!(m.rows().unwrap(), vec![&[1, 2, 3][..], &[4, 5, 6][..]]);

        let err = NdArray::from_rows(vec![vec![1, 2, 3], vec![4, 5]]).unwrap_err();
        assert!(err.is_type_conversion());

        let empty = NdArray::<i32>::from_rows(vec![]).unwrap();
        assert_eq!(empty.shape(), [0, 0]);
    }

    #[test]
    fn test_select_and_index_axis() {
        // shape (2, 3, 2)
        let a = NdArray::new(vec![2, 3, 2], (0..12).collect::<Vec<_>>()).unwrap();
        let first = a.index_axis(1, 0).unwrap();
        assert_eq!(first.shape(), [2, 2]);
        assert_eq!(first.data(), [0, 1, 6, 7]);

        let picked = a.select(1, &[2, 0]).unwrap();
        assert_eq!(picked.shape(), [2, 2, 2]);
        assert_eq!(picked.data(), [4, 5, 0, 1, 10, 11, 6, 7]);

        assert!(a.select(1, &[3]).is_err());
        assert!(a.select(3, &[0]).is_err());
    }

    #[test]
    fn test_squeeze() {
        let a = NdArray::new(vec![1, 3, 1], vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(a.squeeze().shape(), [3]);
        let s = NdArray::new(vec![1, 1, 1], vec![4.0]).unwrap().squeeze();
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.data(), [4.0]);
    }

    #[test]
    fn test_json_roundtrip_of_typed_arrays() {
        let value = json!([[1, 2], [3, 4]]);
        let host = HostValue::from_json(&value).unwrap();
        assert_eq!(
            host,
            HostValue::IntArray(NdArray::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap())
        );
        assert_eq!(host.to_json(), value);

        let value = json!(["a", "b"]);
        let host = HostValue::from_json(&value).unwrap();
        assert_eq!(host, HostValue::from(vec!["a", "b"]));
        assert_eq!(host.to_json(), value);
    }

    #[test]
    fn test_json_ragged_becomes_objects() {
        let host = HostValue::from_json(&json!([[1, 2, 3], [4, 5]])).unwrap();
        match host {
            HostValue::Objects(rows) => assert_eq!(rows.len(), 2),
            other => panic!("expected object array, got {other:?}"),
        }
    }

    #[test]
    fn test_json_object_is_rejected() {
        let err = HostValue::from_json(&json!({"a": 1})).unwrap_err();
        assert!(err.is_type_conversion());
    }

    #[test]
    fn test_complex_json() {
        let host = HostValue::Complex(Complex64::new(1.0, -2.0));
        assert_eq!(host.to_json(), json!({"re": 1.0, "im": -2.0}));
    }
}
