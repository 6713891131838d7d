//! Boundary to the simulation engine.
//!
//! The engine's object API is reached only through the traits in this
//! module. An implementation wraps whatever bridge object the engine hands
//! out; [`crate::memory`] provides one that lives entirely in process.
//!
//! Engine objects are handles into state owned by the engine, so all
//! methods take `&self`. They are shared as `Rc<dyn ...>`, which keeps a
//! model and everything derived from it on the thread that created it.

use mph_node_path::Group;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{EngineError, Error};
use crate::host::NdArray;
use crate::value::{Value, ValueType};

pub type EngineResult<T> = Result<T, EngineError>;

pub type DocumentRef = Rc<dyn Document>;
pub type ContainerRef = Rc<dyn Container>;
pub type EntityRef = Rc<dyn Entity>;
pub type ParametersRef = Rc<dyn Parameters>;
pub type SelectionRef = Rc<dyn Selection>;

/// Root of a model document.
pub trait Document {
    fn tag(&self) -> String;
    fn label(&self) -> String;
    fn set_label(&self, label: &str) -> EngineResult<()>;
    /// File the document was loaded from or last saved to.
    fn file_path(&self) -> Option<PathBuf>;
    /// Version string of the engine that last saved the document.
    fn engine_version(&self) -> EngineResult<String>;
    /// Product names required to work with the document.
    fn used_products(&self) -> EngineResult<Vec<String>>;
    /// Container bound to a top-level group.
    fn group(&self, group: Group) -> EngineResult<ContainerRef>;
    fn parameters(&self) -> EngineResult<ParametersRef>;
    fn reset_history(&self) -> EngineResult<()>;
    fn save(&self, path: &Path, format: FileFormat) -> EngineResult<()>;
}

/// Ordered collection of features, addressed by internal tag.
pub trait Container {
    /// Tags of all items, in engine enumeration order.
    fn tags(&self) -> Vec<String>;
    fn get(&self, tag: &str) -> EngineResult<EntityRef>;
    fn create(&self, tag: &str, args: &[Value]) -> EngineResult<EntityRef>;
    fn remove(&self, tag: &str) -> EngineResult<()>;
    /// A tag starting with `prefix` that no item in this container has.
    fn unique_tag(&self, prefix: &str) -> String;

    fn clear_stored_data(&self) -> EngineResult<()> {
        Err(EngineError::Unsupported("clear_stored_data"))
    }
}

/// A feature node in the model tree.
///
/// Only identity, labelling and property access are required. Everything
/// else defaults to [`EngineError::Unsupported`].
pub trait Entity {
    fn tag(&self) -> String;
    fn set_tag(&self, tag: &str) -> EngineResult<()>;
    fn label(&self) -> String;
    fn set_label(&self, label: &str) -> EngineResult<()>;

    /// Feature type, such as `Block` or `Step`.
    fn entity_type(&self) -> EngineResult<String> {
        Err(EngineError::Unsupported("entity_type"))
    }

    fn comments(&self) -> EngineResult<String> {
        Err(EngineError::Unsupported("comments"))
    }

    fn set_comments(&self, _text: &str) -> EngineResult<()> {
        Err(EngineError::Unsupported("set_comments"))
    }

    /// Sub-feature container, if this kind of feature has one.
    fn features(&self) -> Option<ContainerRef> {
        None
    }

    fn properties(&self) -> EngineResult<Vec<String>>;
    /// The engine's type tag for a property.
    fn value_type(&self, name: &str) -> EngineResult<String>;
    /// Read a property in the representation belonging to `as_type`.
    fn get(&self, name: &str, as_type: &ValueType) -> EngineResult<Value>;
    fn set(&self, name: &str, value: Value) -> EngineResult<()>;

    fn is_active(&self) -> EngineResult<bool> {
        Err(EngineError::Unsupported("is_active"))
    }

    fn set_active(&self, _active: bool) -> EngineResult<()> {
        Err(EngineError::Unsupported("set_active"))
    }

    fn run(&self) -> EngineResult<()> {
        Err(EngineError::Unsupported("run"))
    }

    fn import_data(&self) -> EngineResult<()> {
        Err(EngineError::Unsupported("import_data"))
    }

    fn discard_data(&self) -> EngineResult<()> {
        Err(EngineError::Unsupported("discard_data"))
    }

    /// Solutions: true until the solution has been computed.
    fn is_empty(&self) -> EngineResult<bool> {
        Err(EngineError::Unsupported("is_empty"))
    }

    /// Solutions and meshes: drop computed data.
    fn clear(&self) -> EngineResult<()> {
        Err(EngineError::Unsupported("clear"))
    }

    /// Evaluation features: compute the configured expressions.
    fn evaluate(&self) -> EngineResult<EvalData> {
        Err(EngineError::Unsupported("evaluate"))
    }

    /// Solutions: indices and values of inner solutions (time steps).
    fn inner_solutions(&self) -> EngineResult<(Vec<i32>, Vec<f64>)> {
        Err(EngineError::Unsupported("inner_solutions"))
    }

    /// Solutions: indices and values of outer solutions (sweep steps).
    fn outer_solutions(&self) -> EngineResult<(Vec<i32>, Vec<f64>)> {
        Err(EngineError::Unsupported("outer_solutions"))
    }

    /// Entities the feature applies to. An explicit selection feature is
    /// its own selection.
    fn selection(&self) -> EngineResult<SelectionRef> {
        Err(EngineError::Unsupported("selection"))
    }

    /// Warnings and errors reported by the feature.
    fn problems(&self) -> EngineResult<Vec<ProblemReport>> {
        Ok(Vec::new())
    }
}

/// Geometric entities (domains, boundaries, edges or points) by number.
pub trait Selection {
    /// Entity numbers currently selected, one-based.
    fn entities(&self) -> EngineResult<Vec<i32>>;
    /// Select exactly these entities. An empty slice clears the selection.
    fn set(&self, entities: &[i32]) -> EngineResult<()>;
    /// Select every entity of the geometry.
    fn all(&self) -> EngineResult<()>;

    /// Tag of the selection feature this one follows, if any.
    fn named(&self) -> EngineResult<Option<String>> {
        Err(EngineError::Unsupported("named"))
    }

    fn set_named(&self, _tag: &str) -> EngineResult<()> {
        Err(EngineError::Unsupported("named"))
    }
}

/// A warning or error attached to a feature, as the engine reports it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemReport {
    /// Engine type of the problem, such as `Error` or `Warning`.
    pub kind: String,
    pub message: String,
    /// Selection the problem refers to. Empty if none.
    pub selection: String,
    pub nested: Vec<ProblemReport>,
}

/// Global model parameters.
pub trait Parameters {
    fn names(&self) -> Vec<String>;
    fn get(&self, name: &str) -> EngineResult<String>;
    /// Set a value expression. A `None` description keeps the current one.
    fn set(&self, name: &str, value: &str, description: Option<&str>) -> EngineResult<()>;
    fn description(&self, name: &str) -> EngineResult<String>;
    fn evaluate(&self, name: &str) -> EngineResult<f64>;
    /// Real and imaginary part.
    fn evaluate_complex(&self, name: &str) -> EngineResult<(f64, f64)>;
}

/// Raw numbers returned by an evaluation feature.
///
/// Global and field evaluations are shaped (expression, inner solution,
/// point). Point evaluations have the inner selection applied already.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalData {
    pub real: NdArray<f64>,
    pub imag: Option<NdArray<f64>>,
}

impl EvalData {
    pub fn is_complex(&self) -> bool {
        self.imag.is_some()
    }
}

/// Format a document is saved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Comsol,
    Java,
    Matlab,
    Vba,
}

impl FileFormat {
    /// File ending, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Comsol => "mph",
            FileFormat::Java => "java",
            FileFormat::Matlab => "m",
            FileFormat::Vba => "vba",
        }
    }

    /// Deduce the format from a file ending. No ending means `Comsol`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "" | "mph" => Some(FileFormat::Comsol),
            "java" => Some(FileFormat::Java),
            "m" => Some(FileFormat::Matlab),
            "vba" => Some(FileFormat::Vba),
            _ => None,
        }
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Comsol" | "mph" | ".mph" => Ok(FileFormat::Comsol),
            "Java" | "java" | ".java" => Ok(FileFormat::Java),
            "Matlab" | "m" | ".m" => Ok(FileFormat::Matlab),
            "VBA" | "vba" | ".vba" => Ok(FileFormat::Vba),
            other => Err(Error::InvalidArgument(format!(
                "invalid file format \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Comsol => "Comsol",
            FileFormat::Java => "Java",
            FileFormat::Matlab => "Matlab",
            FileFormat::Vba => "VBA",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_format_synonyms() {
        for (raw, format) in [
            ("Comsol", FileFormat::Comsol),
            (".mph", FileFormat::Comsol),
            ("java", FileFormat::Java),
            ("m", FileFormat::Matlab),
            ("VBA", FileFormat::Vba),
        ] {
            assert_eq!(raw.parse::<FileFormat>().unwrap(), format);
        }
        assert!("docx".parse::<FileFormat>().is_err());
    }

    #[test]
    fn test_file_format_extension() {
        assert_eq!(FileFormat::from_extension(""), Some(FileFormat::Comsol));
        assert_eq!(FileFormat::from_extension("m"), Some(FileFormat::Matlab));
        assert_eq!(FileFormat::from_extension("txt"), None);
        assert_eq!(FileFormat::Vba.extension(), "vba");
    }
}
