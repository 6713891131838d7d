//! A reference engine that keeps the whole model tree in process.
//!
//! Models are loaded from and saved to JSON [snapshots](snapshot::Snapshot).
//! Solutions carry precomputed results, which evaluation features look up
//! by expression. This is enough to drive every operation of [`Model`]
//! without a running simulation engine.

use log::{debug, info};
use mph_node_path::Group;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engine::{ContainerRef, Document, EngineResult, FileFormat, Parameters, ParametersRef};
use crate::error::{EngineError, Error};
use crate::model::Model;
use crate::value::Value;

mod params;
mod selection;
pub mod snapshot;
mod tree;

pub use params::MemoryParameters;
pub use selection::MemorySelection;
pub use snapshot::{
    FeatureSnapshot, ParameterSnapshot, ProblemSnapshot, PropertySnapshot, Snapshot, SolutionData,
    StoredResult,
};
pub use tree::{MemoryContainer, MemoryFeature};

/// Version string reported for documents that do not name one.
pub const DEFAULT_VERSION: &str = "COMSOL Multiphysics 6.2.0.290";

/// Counter behind document tags, shared by every document in the process.
static NEXT_TAG: AtomicUsize = AtomicUsize::new(1);

/// A tag no other document in this process carries: `Model1`, `Model2`, ...
fn next_tag() -> String {
    format!("Model{}", NEXT_TAG.fetch_add(1, Ordering::Relaxed))
}

pub struct MemoryDocument {
    tag: String,
    label: RefCell<String>,
    file: RefCell<Option<PathBuf>>,
    version: String,
    products: Vec<String>,
    groups: BTreeMap<Group, Rc<MemoryContainer>>,
    parameters: Rc<MemoryParameters>,
}

impl MemoryDocument {
    /// An empty document.
    pub fn new(label: &str) -> Rc<Self> {
        Self::build(label, DEFAULT_VERSION, vec!["COMSOL Multiphysics".to_string()])
    }

    /// Each document built gets a fresh tag.
    fn build(label: &str, version: &str, products: Vec<String>) -> Rc<Self> {
        Rc::new_cyclic(|document| Self {
            tag: next_tag(),
            label: RefCell::new(label.to_string()),
            file: RefCell::new(None),
            version: version.to_string(),
            products,
            groups: Group::ALL
                .iter()
                .map(|&group| (group, MemoryContainer::new(group, false, document.clone())))
                .collect(),
            parameters: Rc::new(MemoryParameters::new()),
        })
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Rc<Self>, Error> {
        let label = or_default(&snapshot.label, "Untitled.mph");
        let version = or_default(&snapshot.version, DEFAULT_VERSION);
        let document = Self::build(label, version, snapshot.products.clone());
        *document.file.borrow_mut() = snapshot.file.clone();

        for parameter in &snapshot.parameters {
            document
                .parameters
                .set(&parameter.name, &parameter.value, Some(&parameter.description))?;
        }
        for (name, features) in &snapshot.groups {
            let group: Group = name.parse().map_err(|_| {
                Error::InvalidArgument(format!("snapshot names unknown group \"{name}\""))
            })?;
            document.container(group)?.restore(features)?;
        }
        debug!("Restored document \"{}\" from snapshot.", document.tag);
        Ok(document)
    }

    pub fn from_json(text: &str) -> Result<Rc<Self>, Error> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        Self::from_snapshot(&snapshot)
    }

    /// Load a snapshot file. The document remembers the file it came from.
    pub fn load(file: &Path) -> Result<Rc<Self>, Error> {
        info!("Loading model from \"{}\".", file.display());
        let text = fs::read_to_string(file)?;
        let mut snapshot: Snapshot = serde_json::from_str(&text)?;
        if snapshot.label.is_empty() {
            if let Some(name) = file.file_name() {
                snapshot.label = name.to_string_lossy().into_owned();
            }
        }
        snapshot.file = Some(file.to_path_buf());
        let document = Self::from_snapshot(&snapshot)?;
        info!("Finished loading model \"{}\".", document.label.borrow());
        Ok(document)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            label: self.label.borrow().clone(),
            file: self.file.borrow().clone(),
            version: self.version.clone(),
            products: self.products.clone(),
            parameters: self
                .parameters
                .entries()
                .into_iter()
                .map(|(name, value, description)| ParameterSnapshot {
                    name,
                    value,
                    description,
                })
                .collect(),
            groups: self
                .groups
                .iter()
                .filter(|(_, container)| !container.features().is_empty())
                .map(|(group, container)| (group.name().to_string(), container.snapshot()))
                .collect(),
        }
    }

    /// The container of a group, with its concrete type.
    pub fn container(&self, group: Group) -> EngineResult<&Rc<MemoryContainer>> {
        self.groups
            .get(&group)
            .ok_or(EngineError::Unsupported("group"))
    }

    /// A top-level feature, with its concrete type.
    pub fn feature(&self, group: Group, tag: &str) -> Option<Rc<MemoryFeature>> {
        self.container(group).ok()?.find(tag)
    }

    /// Number of domains of the first geometry, which a selection of
    /// everything covers.
    pub(crate) fn entity_count(&self) -> EngineResult<i32> {
        let geometry = self
            .container(Group::Geometries)?
            .features()
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Call("the model has no geometry".to_string()))?;
        match geometry.value("domains") {
            Ok(Value::Int(count)) if count >= 0 => Ok(count),
            Ok(other) => Err(EngineError::Call(format!(
                "invalid number of domains: {}",
                other.kind()
            ))),
            Err(EngineError::NoSuchProperty(_)) => {
                Err(EngineError::Call("the geometry reports no domains".to_string()))
            }
            Err(err) => Err(err),
        }
    }

    fn script(&self, format: FileFormat) -> String {
        let mut text = String::new();
        let comment = match format {
            FileFormat::Java => "//",
            FileFormat::Matlab => "%",
            FileFormat::Vba | FileFormat::Comsol => "'",
        };
        text.push_str(&format!("{comment} {}\n", self.label.borrow()));
        text.push_str(&format!("{comment} {}\n", self.version));
        for (name, value, _) in self.parameters.entries() {
            let line = match format {
                FileFormat::Java => format!("model.param().set(\"{name}\", \"{value}\");"),
                FileFormat::Matlab => format!("model.param.set('{name}', '{value}');"),
                FileFormat::Vba | FileFormat::Comsol => {
                    format!("Call model.param().set(\"{name}\", \"{value}\")")
                }
            };
            text.push_str(&line);
            text.push('\n');
        }
        text
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Open a snapshot file as a model.
pub fn open(file: &Path) -> Result<Model, Error> {
    Model::new(MemoryDocument::load(file)?)
}

impl Document for MemoryDocument {
    fn tag(&self) -> String {
        self.tag.clone()
    }

    fn label(&self) -> String {
        self.label.borrow().clone()
    }

    fn set_label(&self, label: &str) -> EngineResult<()> {
        *self.label.borrow_mut() = label.to_string();
        Ok(())
    }

    fn file_path(&self) -> Option<PathBuf> {
        self.file.borrow().clone()
    }

    fn engine_version(&self) -> EngineResult<String> {
        Ok(self.version.clone())
    }

    fn used_products(&self) -> EngineResult<Vec<String>> {
        Ok(self.products.clone())
    }

    fn group(&self, group: Group) -> EngineResult<ContainerRef> {
        Ok(self.container(group)?.clone() as ContainerRef)
    }

    fn parameters(&self) -> EngineResult<ParametersRef> {
        Ok(self.parameters.clone() as ParametersRef)
    }

    fn reset_history(&self) -> EngineResult<()> {
        debug!("History of \"{}\" reset.", self.tag);
        Ok(())
    }

    fn save(&self, path: &Path, format: FileFormat) -> EngineResult<()> {
        let call = |err: String| EngineError::Call(format!("cannot save \"{}\": {err}", path.display()));
        let content = match format {
            FileFormat::Comsol => {
                serde_json::to_string_pretty(&self.snapshot()).map_err(|err| call(err.to_string()))?
            }
            _ => self.script(format),
        };
        fs::write(path, content).map_err(|err| call(err.to_string()))?;
        if format == FileFormat::Comsol {
            *self.file.borrow_mut() = Some(path.to_path_buf());
            if let Some(name) = path.file_name() {
                *self.label.borrow_mut() = name.to_string_lossy().into_owned();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_restore_and_snapshot() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "label": "demo.mph",
            "parameters": [{"name": "U", "value": "1[V]", "description": "voltage"}],
            "groups": {
                "function": [{"tag": "step1", "label": "step", "type": "Step",
                              "properties": {"funcname": "step"}}],
                "datasets": [{"tag": "dset1", "type": "Solution",
                              "properties": {"solution": "sol1"}}],
                "solutions": [{"tag": "sol1", "solution": {"computed": true}}]
            }
        }))
        .unwrap();
        let document = MemoryDocument::from_snapshot(&snapshot).unwrap();
        assert_eq!(document.label(), "demo.mph");
        assert_eq!(document.engine_version().unwrap(), DEFAULT_VERSION);
        assert!(document.feature(Group::Functions, "step1").is_some());

        let again = document.snapshot();
        assert_eq!(again.parameters, snapshot.parameters);
        assert_eq!(
            again.groups.keys().collect::<Vec<_>>(),
            ["functions", "solutions", "datasets"]
        );
    }

    #[test]
    fn test_tags_are_unique() {
        let text = r#"{"label": "demo.mph"}"#;
        let first = MemoryDocument::from_json(text).unwrap();
        let second = MemoryDocument::from_json(text).unwrap();
        let empty = MemoryDocument::new("demo.mph");
        assert!(first.tag().starts_with("Model"));
        assert_ne!(first.tag(), second.tag());
        assert_ne!(first.tag(), empty.tag());
        assert_eq!(first.label(), second.label());
    }

    #[test]
    fn test_script() {
        let document = MemoryDocument::from_json(
            r#"{"label": "demo.mph", "parameters": [{"name": "U", "value": "1[V]"}]}"#,
        )
        .unwrap();
        assert_eq!(
            document.script(FileFormat::Matlab),
            format!("% demo.mph\n% {DEFAULT_VERSION}\nmodel.param.set('U', '1[V]');\n")
        );
        assert!(document.script(FileFormat::Vba).ends_with("Call model.param().set(\"U\", \"1[V]\")\n"));
    }

    #[test]
    fn test_unknown_group() {
        let result = MemoryDocument::from_json(r#"{"groups": {"gadgets": []}}"#);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_every_group_is_provided() {
        let document = MemoryDocument::new("empty.mph");
        for group in Group::ALL {
            assert!(document.group(group).is_ok(), "{group}");
        }
    }
}
