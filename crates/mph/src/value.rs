//! The engine's dynamically typed property value model.

use std::fmt;
use std::str::FromStr;

/// Type tag the engine declares for a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    BooleanArray,
    BooleanMatrix,
    Double,
    DoubleArray,
    DoubleMatrix,
    DoubleRowMatrix,
    File,
    Int,
    IntArray,
    IntMatrix,
    None,
    Selection,
    String,
    StringArray,
    StringMatrix,
    /// Any tag this crate does not know how to convert.
    Unknown(String),
}

impl ValueType {
    pub fn as_str(&self) -> &str {
        match self {
            ValueType::Boolean => "Boolean",
            ValueType::BooleanArray => "BooleanArray",
            ValueType::BooleanMatrix => "BooleanMatrix",
            ValueType::Double => "Double",
            ValueType::DoubleArray => "DoubleArray",
            ValueType::DoubleMatrix => "DoubleMatrix",
            ValueType::DoubleRowMatrix => "DoubleRowMatrix",
            ValueType::File => "File",
            ValueType::Int => "Int",
            ValueType::IntArray => "IntArray",
            ValueType::IntMatrix => "IntMatrix",
            ValueType::None => "None",
            ValueType::Selection => "Selection",
            ValueType::String => "String",
            ValueType::StringArray => "StringArray",
            ValueType::StringMatrix => "StringMatrix",
            ValueType::Unknown(tag) => tag,
        }
    }
}

impl FromStr for ValueType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Boolean" => ValueType::Boolean,
            "BooleanArray" => ValueType::BooleanArray,
            "BooleanMatrix" => ValueType::BooleanMatrix,
            "Double" => ValueType::Double,
            "DoubleArray" => ValueType::DoubleArray,
            "DoubleMatrix" => ValueType::DoubleMatrix,
            "DoubleRowMatrix" => ValueType::DoubleRowMatrix,
            "File" => ValueType::File,
            "Int" => ValueType::Int,
            "IntArray" => ValueType::IntArray,
            "IntMatrix" => ValueType::IntMatrix,
            "None" => ValueType::None,
            "Selection" => ValueType::Selection,
            "String" => ValueType::String,
            "StringArray" => ValueType::StringArray,
            "StringMatrix" => ValueType::StringMatrix,
            other => ValueType::Unknown(other.to_string()),
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value in the engine's own representation.
///
/// Matrices are sequences of rows. The engine only ever hands out
/// rectangular matrices, but string matrices written to it may be ragged.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Boolean(bool),
    Int(i32),
    Double(f64),
    String(String),
    BooleanArray(Vec<bool>),
    IntArray(Vec<i32>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
    BooleanMatrix(Vec<Vec<bool>>),
    IntMatrix(Vec<Vec<i32>>),
    DoubleMatrix(Vec<Vec<f64>>),
    StringMatrix(Vec<Vec<String>>),
    /// Untyped sequence, handed to the engine as is.
    List(Vec<Value>),
}

impl Value {
    /// The type tag a property holding this value would declare.
    ///
    /// Lists carry no tag of their own.
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::None => ValueType::None,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Int(_) => ValueType::Int,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::BooleanArray(_) => ValueType::BooleanArray,
            Value::IntArray(_) => ValueType::IntArray,
            Value::DoubleArray(_) => ValueType::DoubleArray,
            Value::StringArray(_) => ValueType::StringArray,
            Value::BooleanMatrix(_) => ValueType::BooleanMatrix,
            Value::IntMatrix(_) => ValueType::IntMatrix,
            Value::DoubleMatrix(_) => ValueType::DoubleMatrix,
            Value::StringMatrix(_) => ValueType::StringMatrix,
            Value::List(_) => return None,
        })
    }

    /// Short description for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Boolean(_) => "Boolean",
            Value::Int(_) => "Int",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::BooleanArray(_) => "BooleanArray",
            Value::IntArray(_) => "IntArray",
            Value::DoubleArray(_) => "DoubleArray",
            Value::StringArray(_) => "StringArray",
            Value::BooleanMatrix(_) => "BooleanMatrix",
            Value::IntMatrix(_) => "IntMatrix",
            Value::DoubleMatrix(_) => "DoubleMatrix",
            Value::StringMatrix(_) => "StringMatrix",
            Value::List(_) => "List",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        let tags = [
            "Boolean",
            "BooleanArray",
            "BooleanMatrix",
            "Double",
            "DoubleArray",
            "DoubleMatrix",
            "DoubleRowMatrix",
            "File",
            "Int",
            "IntArray",
            "IntMatrix",
            "None",
            "Selection",
            "String",
            "StringArray",
            "StringMatrix",
        ];
        for tag in tags {
            let parsed: ValueType = tag.parse().unwrap();
            assert!(!matches!(parsed, ValueType::Unknown(_)), "{tag}");
            assert_eq!(parsed.to_string(), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_kept() {
        let parsed: ValueType = "Quaternion".parse().unwrap();
        assert_eq!(parsed, ValueType::Unknown("Quaternion".to_string()));
        assert_eq!(parsed.as_str(), "Quaternion");
    }

    #[test]
    fn test_value_type_of_values() {
        assert_eq!(Value::Int(3).value_type(), Some(ValueType::Int));
        assert_eq!(
            Value::StringMatrix(vec![vec!["a".into()]]).value_type(),
            Some(ValueType::StringMatrix)
        );
        assert_eq!(Value::List(vec![]).value_type(), None);
    }
}
