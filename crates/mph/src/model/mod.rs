//! The model facade: one loaded document and convenience operations on it.

use indexmap::IndexMap;
use log::{debug, error, info};
use mph_node_path::Group;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Div;
use std::path::PathBuf;

use crate::engine::{ContainerRef, DocumentRef, ParametersRef};
use crate::error::{EngineError, Error};
use crate::host::HostValue;
use crate::node::Node;

mod evaluate;
mod files;
mod products;

pub use evaluate::{EvalOptions, Inner};
pub use products::product_name;

/// A node given either by name within the relevant group, or as a handle.
///
/// Names that contain a slash are taken as paths from the root.
#[derive(Debug, Clone, Copy)]
pub enum Reference<'a, 'm> {
    Name(&'a str),
    Node(&'a Node<'m>),
}

impl<'a> From<&'a str> for Reference<'a, '_> {
    fn from(name: &'a str) -> Self {
        Reference::Name(name)
    }
}

impl<'a, 'm> From<&'a Node<'m>> for Reference<'a, 'm> {
    fn from(node: &'a Node<'m>) -> Self {
        Reference::Node(node)
    }
}

/// Wrapper around one model document.
///
/// The containers of the built-in groups are looked up once, when the
/// model is constructed, and kept for its lifetime. Two wrappers compare
/// equal if they wrap documents with the same tag.
pub struct Model {
    document: DocumentRef,
    groups: BTreeMap<Group, ContainerRef>,
}

impl Model {
    /// Wrap a document. Groups the engine does not provide are left out.
    pub fn new(document: DocumentRef) -> Result<Self, Error> {
        let mut groups = BTreeMap::new();
        for group in Group::ALL {
            match document.group(group) {
                Ok(container) => {
                    groups.insert(group, container);
                }
                Err(EngineError::Unsupported(_)) => {
                    debug!("Engine does not provide group \"{group}\".");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(Self { document, groups })
    }

    /// The wrapped engine document.
    pub fn document(&self) -> &DocumentRef {
        &self.document
    }

    /// Cached container of a built-in group.
    pub fn group(&self, group: Group) -> Option<&ContainerRef> {
        self.groups.get(&group)
    }

    /// Groups available in this model, in canonical order.
    pub fn groups(&self) -> impl Iterator<Item = Group> + '_ {
        self.groups.keys().copied()
    }

    pub fn root(&self) -> Node<'_> {
        Node::new(self, "")
    }

    pub fn node(&self, path: &str) -> Node<'_> {
        Node::new(self, path)
    }

    /// True if the node at `path` exists.
    pub fn contains(&self, path: &str) -> Result<bool, Error> {
        self.node(path).exists()
    }

    /// Model name: the document label without `.mph` ending.
    pub fn name(&self) -> String {
        let label = self.document.label();
        match label.strip_suffix(".mph") {
            Some(stem) => stem.to_string(),
            None => label,
        }
    }

    /// File the model was loaded from, if any.
    pub fn file(&self) -> Option<PathBuf> {
        self.document.file_path()
    }

    /// Labels of all items of a group.
    pub fn names(&self, group: Group) -> Result<Vec<String>, Error> {
        Ok(Node::new(self, group)
            .children()?
            .iter()
            .map(|node| node.name().to_string())
            .collect())
    }

    pub fn functions(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Functions)
    }

    pub fn components(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Components)
    }

    pub fn geometries(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Geometries)
    }

    pub fn selections(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Selections)
    }

    pub fn physics(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Physics)
    }

    pub fn multiphysics(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Multiphysics)
    }

    pub fn materials(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Materials)
    }

    pub fn meshes(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Meshes)
    }

    pub fn studies(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Studies)
    }

    pub fn solutions(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Solutions)
    }

    pub fn datasets(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Datasets)
    }

    pub fn plots(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Plots)
    }

    pub fn exports(&self) -> Result<Vec<String>, Error> {
        self.names(Group::Exports)
    }

    // Parameters

    fn params(&self) -> Result<ParametersRef, Error> {
        Ok(self.document.parameters()?)
    }

    /// Value expression of a parameter, as entered, unit included.
    pub fn parameter(&self, name: &str) -> Result<String, Error> {
        self.params()?.get(name).map_err(|_| {
            let message = format!("parameter \"{name}\" is not defined");
            error!("{message}");
            Error::InvalidArgument(message)
        })
    }

    /// Set a parameter. Numbers refer to default units, strings may carry
    /// a unit in square brackets.
    pub fn set_parameter(&self, name: &str, value: impl Into<HostValue>) -> Result<(), Error> {
        let expression = match value.into() {
            HostValue::Str(s) => s,
            HostValue::Int(i) => i.to_string(),
            HostValue::Float(x) => expression_of(x),
            HostValue::Complex(c) => {
                let sign = if c.im.is_sign_negative() { '-' } else { '+' };
                format!("{}{sign}{}i", expression_of(c.re), expression_of(c.im.abs()))
            }
            other => {
                let message = format!(
                    "cannot use a value of host type \"{}\" as parameter",
                    other.type_name()
                );
                error!("{message}");
                return Err(Error::TypeConversion(message));
            }
        };
        Ok(self.params()?.set(name, &expression, None)?)
    }

    /// Numerical value of a parameter. Falls back to complex evaluation.
    pub fn evaluate_parameter(&self, name: &str) -> Result<HostValue, Error> {
        let params = self.params()?;
        if let Ok(value) = params.evaluate(name) {
            return Ok(HostValue::Float(value));
        }
        match params.evaluate_complex(name) {
            Ok((re, im)) => Ok(HostValue::Complex(num_complex::Complex64::new(re, im))),
            Err(_) => {
                let message = format!("evaluation of parameter \"{name}\" failed");
                error!("{message}");
                Err(Error::Runtime(message))
            }
        }
    }

    /// All parameters as value expressions, in engine order.
    pub fn parameters(&self) -> Result<IndexMap<String, String>, Error> {
        let params = self.params()?;
        params
            .names()
            .into_iter()
            .map(|name| -> Result<(String, String), Error> {
                let value = params.get(&name)?;
                Ok((name, value))
            })
            .collect()
    }

    /// All parameters, evaluated.
    pub fn evaluated_parameters(&self) -> Result<IndexMap<String, HostValue>, Error> {
        self.params()?
            .names()
            .into_iter()
            .map(|name| -> Result<(String, HostValue), Error> {
                let value = self.evaluate_parameter(&name)?;
                Ok((name, value))
            })
            .collect()
    }

    pub fn description(&self, name: &str) -> Result<String, Error> {
        Ok(self.params()?.description(name)?)
    }

    pub fn set_description(&self, name: &str, text: &str) -> Result<(), Error> {
        let value = self.parameter(name)?;
        Ok(self.params()?.set(name, &value, Some(text))?)
    }

    pub fn descriptions(&self) -> Result<IndexMap<String, String>, Error> {
        let params = self.params()?;
        params
            .names()
            .into_iter()
            .map(|name| -> Result<(String, String), Error> {
                let text = params.description(&name)?;
                Ok((name, text))
            })
            .collect()
    }

    // Tree access by path

    pub fn property(&self, path: &str, name: &str) -> Result<HostValue, Error> {
        self.node(path).property(name)
    }

    pub fn set_property(&self, path: &str, name: &str, value: impl Into<HostValue>) -> Result<(), Error> {
        self.node(path).set_property(name, value)
    }

    pub fn properties(&self, path: &str) -> Result<BTreeMap<String, HostValue>, Error> {
        self.node(path).properties_map()
    }

    /// Create a node.
    ///
    /// If `path` exists, the new node becomes its child and is named by the
    /// engine. Otherwise it is created in the parent of `path`, named after
    /// the last segment.
    pub fn create(&self, path: &str, args: &[HostValue]) -> Result<Node<'_>, Error> {
        let node = self.node(path);
        if node.exists()? {
            return node.create(args, None);
        }
        match node.parent() {
            Some(parent) => parent.create(args, Some(node.name())),
            None => node.create(args, None),
        }
    }

    pub fn remove(&self, path: &str) -> Result<(), Error> {
        self.node(path).remove()
    }

    // Solving

    /// Run the named geometry sequence, or all of them.
    pub fn build(&self, geometry: Option<Reference<'_, '_>>) -> Result<(), Error> {
        self.run_sequences(Group::Geometries, geometry, "geometry sequence")
    }

    /// Run the named mesh sequence, or all of them.
    pub fn mesh(&self, mesh: Option<Reference<'_, '_>>) -> Result<(), Error> {
        self.run_sequences(Group::Meshes, mesh, "mesh sequence")
    }

    /// Solve the named study, or all of them.
    pub fn solve(&self, study: Option<Reference<'_, '_>>) -> Result<(), Error> {
        self.run_sequences(Group::Studies, study, "study")
    }

    fn run_sequences(
        &self,
        group: Group,
        reference: Option<Reference<'_, '_>>,
        what: &str,
    ) -> Result<(), Error> {
        let nodes = match reference {
            Some(reference) => vec![self.member(group, reference, what)?],
            None => {
                let all = Node::new(self, group).children()?;
                if all.is_empty() {
                    let message = format!("no {what} defined in the model");
                    error!("{message}");
                    return Err(Error::Runtime(message));
                }
                all
            }
        };
        for node in nodes {
            info!("Running {what} \"{}\".", node.name());
            node.run()?;
            info!("Finished {what}.");
        }
        Ok(())
    }

    /// Locate an existing item of `group`.
    pub(crate) fn member(
        &self,
        group: Group,
        reference: Reference<'_, '_>,
        what: &str,
    ) -> Result<Node<'_>, Error> {
        let node = match reference {
            Reference::Name(name) if name.contains('/') => self.node(name),
            Reference::Name(name) => Node::new(self, group).join(name),
            Reference::Node(node) => {
                if node.model() != self {
                    let message = format!("node \"{node}\" belongs to a different model");
                    error!("{message}");
                    return Err(Error::InvalidArgument(message));
                }
                Node::new(self, node.path().clone())
            }
        };
        if node.parent() != Some(Node::new(self, group)) {
            let message = format!("node \"{node}\" is not a {what} node");
            error!("{message}");
            return Err(Error::InvalidArgument(message));
        }
        if !node.exists()? {
            let message = format!("{what} \"{}\" does not exist", node.name());
            error!("{message}");
            return Err(Error::Lookup(message));
        }
        Ok(node)
    }

    // Housekeeping

    /// Clear stored plot, solution, and mesh data.
    pub fn clear(&self) -> Result<(), Error> {
        if let Some(plots) = self.group(Group::Plots) {
            info!("Clearing stored plot data.");
            match plots.clear_stored_data() {
                Ok(()) | Err(EngineError::Unsupported(_)) => {}
                Err(err) => return Err(err.into()),
            }
            info!("Finished clearing plots.");
        }
        info!("Clearing solution data.");
        for solution in Node::new(self, Group::Solutions).children()? {
            solution.feature("clear")?.clear()?;
        }
        info!("Finished clearing solutions.");
        info!("Clearing mesh data.");
        for mesh in Node::new(self, Group::Meshes).children()? {
            mesh.feature("clear")?.clear()?;
        }
        info!("Finished clearing meshes.");
        Ok(())
    }

    /// Reset the modeling history.
    pub fn reset(&self) -> Result<(), Error> {
        info!("Resetting modeling history.");
        self.document.reset_history()?;
        info!("Finished resetting history.");
        Ok(())
    }

    /// Assign a new name to the model.
    pub fn rename(&self, name: &str) -> Result<(), Error> {
        Ok(self.document.set_label(name)?)
    }
}

/// Text of a number as a parameter expression. Very large and very small
/// magnitudes use exponent notation.
fn expression_of(x: f64) -> String {
    if x != 0.0 && x.is_finite() && !(1e-4..1e16).contains(&x.abs()) {
        format!("{x:e}")
    } else {
        x.to_string()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.document.tag() == other.document.tag()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model(\"{}\")", self.name())
    }
}

impl<'m> Div<&str> for &'m Model {
    type Output = Node<'m>;

    fn div(self, path: &str) -> Node<'m> {
        self.node(path)
    }
}
