//! Path-based scripting interface to a simulation engine's model tree.
//!
//! A [`Model`] wraps one document of the engine. Nodes of its tree are
//! addressed by slash-separated paths of display labels, starting with a
//! built-in group, and handled through lightweight [`Node`] handles that
//! resolve their path anew on every operation. Property values cross the
//! boundary to the engine through a fixed set of type conversions.
//!
//! The engine itself is reached through the traits in [`engine`]. The
//! [`memory`] module implements them in process, backed by JSON snapshots.
//!
//! # Example
//!
//! ```
//! use mph::memory::MemoryDocument;
//! use mph::{HostValue, Model};
//!
//! let document = MemoryDocument::from_json(r#"{
//!     "label": "demo.mph",
//!     "groups": {"functions": [
//!         {"tag": "step1", "label": "step", "type": "Step",
//!          "properties": {"funcname": "step", "location": 0.5}}
//!     ]}
//! }"#).unwrap();
//! let model = Model::new(document).unwrap();
//!
//! let step = model.node("function/step");
//! assert!(step.exists().unwrap());
//! assert_eq!(step.property("location").unwrap(), HostValue::Float(0.5));
//!
//! step.set_property("funcname", "ramp").unwrap();
//! assert_eq!(model.property("functions/step", "funcname").unwrap(), HostValue::from("ramp"));
//! ```

pub mod coerce;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod memory;
pub mod model;
pub mod node;
pub mod resolve;
pub mod value;

pub use config::{Config, SessionKind};
pub use engine::FileFormat;
pub use error::{EngineError, Error};
pub use host::{HostValue, NdArray};
pub use model::{EvalOptions, Inner, Model, Reference};
pub use node::{Category, Node, Problem, Selected, Selector, Toggle};
pub use value::{Value, ValueType};

pub use mph_node_path::{Group, NodePath};
