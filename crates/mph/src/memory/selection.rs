//! Entity selections of the reference engine.

use mph_node_path::Group;
use std::rc::{Rc, Weak};

use super::tree::MemoryFeature;
use crate::engine::{EngineResult, Selection};
use crate::error::EngineError;
use crate::value::{Value, ValueType};

/// The selection of one feature, kept in the feature's properties.
///
/// Explicit selection features store their entity numbers as strings in
/// `entities`. Other features store them in `selection`, or follow the
/// selection feature whose tag is stored in `named`.
pub struct MemorySelection {
    feature: Weak<MemoryFeature>,
    explicit: bool,
}

impl MemorySelection {
    pub(crate) fn new(feature: Weak<MemoryFeature>, explicit: bool) -> Self {
        Self { feature, explicit }
    }

    fn feature(&self) -> EngineResult<Rc<MemoryFeature>> {
        self.feature
            .upgrade()
            .ok_or_else(|| EngineError::Call("the selecting feature was removed".to_string()))
    }
}

fn numbers(value: Value) -> EngineResult<Vec<i32>> {
    match value {
        Value::None => Ok(Vec::new()),
        Value::Int(i) => Ok(vec![i]),
        Value::IntArray(entities) => Ok(entities),
        Value::StringArray(items) => items
            .iter()
            .map(|item| {
                item.trim()
                    .parse::<i32>()
                    .map_err(|_| EngineError::Call(format!("\"{item}\" is not an entity number")))
            })
            .collect(),
        other => Err(EngineError::Call(format!(
            "entity numbers must be integers, not {}",
            other.kind()
        ))),
    }
}

/// Entity numbers stored under `name`. A missing property selects nothing.
fn stored(feature: &MemoryFeature, name: &str) -> EngineResult<Vec<i32>> {
    match feature.value(name) {
        Ok(value) => numbers(value),
        Err(EngineError::NoSuchProperty(_)) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

fn selection_feature(feature: &MemoryFeature, tag: &str) -> EngineResult<Rc<MemoryFeature>> {
    feature
        .document()?
        .container(Group::Selections)?
        .find(tag)
        .ok_or_else(|| EngineError::NoSuchTag(tag.to_string()))
}

impl Selection for MemorySelection {
    fn entities(&self) -> EngineResult<Vec<i32>> {
        let feature = self.feature()?;
        if self.explicit {
            return stored(&feature, "entities");
        }
        match self.named()? {
            Some(tag) => stored(&*selection_feature(&feature, &tag)?, "entities"),
            None => stored(&feature, "selection"),
        }
    }

    fn set(&self, entities: &[i32]) -> EngineResult<()> {
        let feature = self.feature()?;
        if self.explicit {
            let numbers = entities.iter().map(i32::to_string).collect();
            feature.put("entities", ValueType::Selection, Value::StringArray(numbers));
        } else {
            feature.drop_property("named");
            feature.put("selection", ValueType::IntArray, Value::IntArray(entities.to_vec()));
        }
        Ok(())
    }

    fn all(&self) -> EngineResult<()> {
        let count = self.feature()?.document()?.entity_count()?;
        let all: Vec<i32> = (1..=count).collect();
        self.set(&all)
    }

    fn named(&self) -> EngineResult<Option<String>> {
        if self.explicit {
            return Err(EngineError::Unsupported("named"));
        }
        match self.feature()?.value("named") {
            Ok(Value::String(tag)) if !tag.is_empty() => Ok(Some(tag)),
            Ok(_) | Err(EngineError::NoSuchProperty(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set_named(&self, tag: &str) -> EngineResult<()> {
        if self.explicit {
            return Err(EngineError::Unsupported("named"));
        }
        let feature = self.feature()?;
        selection_feature(&feature, tag)?;
        feature.drop_property("selection");
        feature.put("named", ValueType::String, Value::String(tag.to_string()));
        Ok(())
    }
}
