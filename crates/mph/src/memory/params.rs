use indexmap::IndexMap;
use num_complex::Complex64;
use std::cell::RefCell;

use crate::engine::{EngineResult, Parameters};
use crate::error::EngineError;

/// References between parameters are followed this many levels deep.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    value: String,
    description: String,
}

/// Global parameters of the reference engine.
///
/// Values evaluate if they are real or complex number literals, optionally
/// followed by a unit in square brackets, or the name of another parameter.
#[derive(Debug, Default)]
pub struct MemoryParameters {
    entries: RefCell<IndexMap<String, Entry>>,
}

impl MemoryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(name, value, description)` of every parameter, in order.
    pub(crate) fn entries(&self) -> Vec<(String, String, String)> {
        self.entries
            .borrow()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value.clone(), entry.description.clone()))
            .collect()
    }

    fn entry(&self, name: &str) -> EngineResult<Entry> {
        self.entries
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NoSuchProperty(name.to_string()))
    }

    fn number(&self, name: &str, depth: usize) -> EngineResult<Complex64> {
        if depth > MAX_DEPTH {
            return Err(EngineError::Call(format!(
                "parameter \"{name}\" refers to itself"
            )));
        }
        let value = self.entry(name)?.value;
        let expression = strip_unit(&value);
        if let Ok(x) = expression.parse::<f64>() {
            return Ok(Complex64::new(x, 0.0));
        }
        if let Ok(z) = expression.parse::<Complex64>() {
            return Ok(z);
        }
        if self.entries.borrow().contains_key(expression) {
            return self.number(expression, depth + 1);
        }
        Err(EngineError::Call(format!(
            "cannot evaluate expression \"{value}\" of parameter \"{name}\""
        )))
    }
}

/// The expression without a trailing unit such as `[mm]`.
fn strip_unit(value: &str) -> &str {
    let value = value.trim();
    match value.strip_suffix(']').and_then(|rest| rest.rfind('[')) {
        Some(start) => value[..start].trim(),
        None => value,
    }
}

impl Parameters for MemoryParameters {
    fn names(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    fn get(&self, name: &str) -> EngineResult<String> {
        Ok(self.entry(name)?.value)
    }

    fn set(&self, name: &str, value: &str, description: Option<&str>) -> EngineResult<()> {
        let mut entries = self.entries.borrow_mut();
        let description = match description {
            Some(text) => text.to_string(),
            None => entries
                .get(name)
                .map(|entry| entry.description.clone())
                .unwrap_or_default(),
        };
        entries.insert(
            name.to_string(),
            Entry {
                value: value.to_string(),
                description,
            },
        );
        Ok(())
    }

    fn description(&self, name: &str) -> EngineResult<String> {
        Ok(self.entry(name)?.description)
    }

    fn evaluate(&self, name: &str) -> EngineResult<f64> {
        let z = self.number(name, 0)?;
        if z.im != 0.0 {
            return Err(EngineError::Call(format!(
                "parameter \"{name}\" has a complex value"
            )));
        }
        Ok(z.re)
    }

    fn evaluate_complex(&self, name: &str) -> EngineResult<(f64, f64)> {
        let z = self.number(name, 0)?;
        Ok((z.re, z.im))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MemoryParameters {
        let params = MemoryParameters::new();
        params.set("U", "1[V]", Some("voltage")).unwrap();
        params.set("d", "2.5 [mm]", None).unwrap();
        params.set("Z", "1+2i", None).unwrap();
        params.set("V", "U", None).unwrap();
        params
    }

    #[test]
    fn test_strip_unit() {
        assert_eq!(strip_unit("1[V]"), "1");
        assert_eq!(strip_unit(" 2.5 [mm] "), "2.5");
        assert_eq!(strip_unit("a[1]+b"), "a[1]+b");
        assert_eq!(strip_unit("3"), "3");
    }

    #[test]
    fn test_evaluate() {
        let params = params();
        assert_eq!(params.evaluate("U").unwrap(), 1.0);
        assert_eq!(params.evaluate("d").unwrap(), 2.5);
        assert_eq!(params.evaluate("V").unwrap(), 1.0);
        assert!(params.evaluate("Z").is_err());
        assert_eq!(params.evaluate_complex("Z").unwrap(), (1.0, 2.0));
        assert_eq!(
            params.evaluate("missing"),
            Err(EngineError::NoSuchProperty("missing".into()))
        );
    }

    #[test]
    fn test_self_reference() {
        let params = MemoryParameters::new();
        params.set("a", "b", None).unwrap();
        params.set("b", "a", None).unwrap();
        assert!(matches!(params.evaluate("a"), Err(EngineError::Call(_))));
    }

    #[test]
    fn test_description_is_kept() {
        let params = params();
        params.set("U", "2[V]", None).unwrap();
        assert_eq!(params.description("U").unwrap(), "voltage");
        params.set("U", "2[V]", Some("")).unwrap();
        assert_eq!(params.description("U").unwrap(), "");
        assert_eq!(params.names(), ["U", "d", "Z", "V"]);
    }
}
