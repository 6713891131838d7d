//! Conversion between host values and engine property values.
//!
//! Writing infers the engine representation from the host value's own
//! shape. Reading dispatches on the type tag the engine declares for the
//! property, never on a guess.

use log::debug;
use std::path::PathBuf;

use crate::engine::Entity;
use crate::error::Error;
use crate::host::{HostValue, NdArray};
use crate::value::{Value, ValueType};

/// Convert a host value to the engine's representation.
///
/// # Errors
///
/// `TypeConversion` naming the host type for complex numbers, arrays of
/// more than two dimensions, integers outside the 32-bit range, and
/// object arrays that mix rows with scalars.
pub fn to_engine(value: &HostValue) -> Result<Value, Error> {
    Ok(match value {
        HostValue::None => Value::None,
        HostValue::Bool(b) => Value::Boolean(*b),
        HostValue::Int(i) => Value::Int(int32(*i)?),
        HostValue::Float(x) => Value::Double(*x),
        HostValue::Str(s) => Value::String(s.clone()),
        HostValue::Path(p) => Value::String(p.display().to_string()),
        HostValue::Node(tag) => Value::String(tag.clone()),
        HostValue::List(items) => Value::List(items.iter().map(to_engine).collect::<Result<_, _>>()?),
        HostValue::BoolArray(a) => shaped(
            value,
            a,
            |x| Ok(Value::Boolean(*x)),
            |v| Ok(Value::BooleanArray(v.to_vec())),
            |rows| Ok(Value::BooleanMatrix(rows.iter().map(|r| r.to_vec()).collect())),
        )?,
        HostValue::IntArray(a) => shaped(
            value,
            a,
            |x| Ok(Value::Int(int32(*x)?)),
            |v| Ok(Value::IntArray(int32_row(v)?)),
            |rows| {
                Ok(Value::IntMatrix(
                    rows.iter().map(|r| int32_row(r)).collect::<Result<_, _>>()?,
                ))
            },
        )?,
        HostValue::FloatArray(a) => shaped(
            value,
            a,
            |x| Ok(Value::Double(*x)),
            |v| Ok(Value::DoubleArray(v.to_vec())),
            |rows| Ok(Value::DoubleMatrix(rows.iter().map(|r| r.to_vec()).collect())),
        )?,
        HostValue::StrArray(a) => shaped(
            value,
            a,
            |x| Ok(Value::String(x.clone())),
            |v| Ok(Value::StringArray(v.to_vec())),
            |rows| Ok(Value::StringMatrix(rows.iter().map(|r| r.to_vec()).collect())),
        )?,
        HostValue::Objects(items) => objects(items)?,
        HostValue::Complex(_) | HostValue::ComplexArray(_) => return Err(unsupported(value)),
    })
}

/// Read a property and convert it to a host value.
///
/// # Errors
///
/// `TypeConversion` naming the engine type tag if it is not one this
/// crate can convert, or if the engine returns a value not matching the
/// declared tag. Engine failures pass through.
pub fn to_host(entity: &dyn Entity, name: &str) -> Result<HostValue, Error> {
    let tag: ValueType = entity
        .value_type(name)?
        .parse()
        .unwrap_or_else(|never| match never {});
    if let ValueType::Unknown(raw) = &tag {
        return Err(Error::TypeConversion(format!(
            "cannot convert engine value type \"{raw}\" of property \"{name}\""
        )));
    }
    if tag == ValueType::None {
        return Ok(HostValue::None);
    }
    let value = entity.get(name, &tag)?;
    debug!("Casting property \"{name}\" of type {tag} to host value.");
    from_engine(&tag, value)
}

/// Convert an engine value read under the given type tag.
///
/// An empty `String` reads as [`HostValue::None`].
pub fn from_engine(tag: &ValueType, value: Value) -> Result<HostValue, Error> {
    Ok(match (tag, value) {
        (ValueType::None, _) => HostValue::None,
        (ValueType::Boolean, Value::Boolean(b)) => HostValue::Bool(b),
        (ValueType::Int, Value::Int(i)) => HostValue::Int(i64::from(i)),
        (ValueType::Double, Value::Double(x)) => HostValue::Float(x),
        (ValueType::String, Value::String(s)) if s.is_empty() => HostValue::None,
        (ValueType::String, Value::String(s)) => HostValue::Str(s),
        (ValueType::File, Value::String(s)) => HostValue::Path(PathBuf::from(s)),
        (ValueType::BooleanArray, Value::BooleanArray(v)) => HostValue::BoolArray(NdArray::from_vec(v)),
        (ValueType::IntArray, Value::IntArray(v)) => {
            HostValue::IntArray(NdArray::from_vec(v.into_iter().map(i64::from).collect()))
        }
        (ValueType::DoubleArray, Value::DoubleArray(v)) => HostValue::FloatArray(NdArray::from_vec(v)),
        (ValueType::BooleanMatrix, Value::BooleanMatrix(rows)) => HostValue::BoolArray(NdArray::from_rows(rows)?),
        (ValueType::IntMatrix, Value::IntMatrix(rows)) => HostValue::IntArray(NdArray::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(i64::from).collect())
                .collect(),
        )?),
        (ValueType::DoubleMatrix, Value::DoubleMatrix(rows)) => HostValue::FloatArray(NdArray::from_rows(rows)?),
        (ValueType::DoubleRowMatrix, Value::DoubleMatrix(rows)) => {
            if rows.len() > 2 {
                return Err(Error::TypeConversion(format!(
                    "cannot convert double-row matrix with {} rows, at most two are supported",
                    rows.len()
                )));
            }
            HostValue::Objects(
                rows.into_iter()
                    .map(|row| HostValue::FloatArray(NdArray::from_vec(row)))
                    .collect(),
            )
        }
        (ValueType::Selection, Value::StringArray(keys)) => HostValue::List(keys.into_iter().map(HostValue::Str).collect()),
        (ValueType::StringArray, Value::StringArray(v)) => HostValue::List(v.into_iter().map(HostValue::Str).collect()),
        (ValueType::StringMatrix, Value::StringMatrix(rows)) => {
            if rows.is_empty() {
                return Ok(HostValue::List(vec![HostValue::List(Vec::new())]));
            }
            HostValue::List(
                rows.into_iter()
                    .map(|row| HostValue::List(row.into_iter().map(HostValue::Str).collect()))
                    .collect(),
            )
        }
        (ValueType::Unknown(raw), _) => {
            return Err(Error::TypeConversion(format!(
                "cannot convert engine value type \"{raw}\""
            )))
        }
        (tag, other) => {
            return Err(Error::TypeConversion(format!(
                "engine returned {} for a property of type {tag}",
                other.kind()
            )))
        }
    })
}

fn unsupported(value: &HostValue) -> Error {
    Error::TypeConversion(format!(
        "cannot convert values of host type \"{}\"",
        value.type_name()
    ))
}

fn int32(value: i64) -> Result<i32, Error> {
    i32::try_from(value).map_err(|_| {
        Error::TypeConversion(format!("integer {value} does not fit the engine's 32-bit range"))
    })
}

fn int32_row(row: &[i64]) -> Result<Vec<i32>, Error> {
    row.iter().map(|&i| int32(i)).collect()
}

/// Dispatch a typed array on its dimension.
fn shaped<T>(
    host: &HostValue,
    array: &NdArray<T>,
    scalar: impl Fn(&T) -> Result<Value, Error>,
    vector: impl Fn(&[T]) -> Result<Value, Error>,
    matrix: impl Fn(&[&[T]]) -> Result<Value, Error>,
) -> Result<Value, Error> {
    match array.ndim() {
        0 => match array.data().first() {
            Some(x) => scalar(x),
            None => Err(unsupported(host)),
        },
        1 => vector(array.data()),
        2 => match array.rows() {
            Some(rows) => matrix(&rows),
            None => Err(unsupported(host)),
        },
        _ => Err(unsupported(host)),
    }
}

/// Object arrays.
///
/// Rows given as lists make a (possibly ragged) string matrix. Rows given
/// as numeric vectors make a double-row matrix of at most two rows.
/// Scalars make a string array.
fn objects(items: &[HostValue]) -> Result<Value, Error> {
    if items.is_empty() {
        return Ok(Value::StringArray(Vec::new()));
    }
    if items.iter().all(|item| matches!(item, HostValue::List(_))) {
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            if let HostValue::List(cells) = item {
                rows.push(cells.iter().map(cell).collect::<Result<Vec<_>, _>>()?);
            }
        }
        return Ok(Value::StringMatrix(rows));
    }
    if items.iter().all(numeric_row) {
        if items.len() > 2 {
            return Err(Error::TypeConversion(format!(
                "will not cast object arrays with {} numeric rows, at most two are supported",
                items.len()
            )));
        }
        let rows = items
            .iter()
            .map(|item| match item {
                HostValue::FloatArray(a) => a.data().to_vec(),
                HostValue::IntArray(a) => a.data().iter().map(|&i| i as f64).collect(),
                _ => Vec::new(),
            })
            .collect();
        return Ok(Value::DoubleMatrix(rows));
    }
    if items.iter().any(|item| matches!(item, HostValue::List(_)) || numeric_row(item)) {
        return Err(Error::TypeConversion(
            "cannot cast object array that mixes rows and scalars".to_string(),
        ));
    }
    Ok(Value::StringArray(items.iter().map(cell).collect::<Result<_, _>>()?))
}

fn numeric_row(item: &HostValue) -> bool {
    match item {
        HostValue::FloatArray(a) => a.ndim() == 1,
        HostValue::IntArray(a) => a.ndim() == 1,
        _ => false,
    }
}

/// Text of one object array cell.
fn cell(value: &HostValue) -> Result<String, Error> {
    Ok(match value {
        HostValue::None => String::new(),
        HostValue::Bool(b) => b.to_string(),
        HostValue::Int(i) => i.to_string(),
        HostValue::Float(x) => x.to_string(),
        HostValue::Str(s) | HostValue::Node(s) => s.clone(),
        HostValue::Path(p) => p.display().to_string(),
        HostValue::List(_) | HostValue::Objects(_) => {
            return Err(Error::TypeConversion(
                "cannot cast object arrays of dimension higher than 2".to_string(),
            ))
        }
        other => return Err(unsupported(other)),
    })
}
