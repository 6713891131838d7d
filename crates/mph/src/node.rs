//! Handles to positions in the model tree.

use log::{debug, error, info};
use mph_node_path::{validate_segment, NodePath};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Div;
use std::path::Path;
use std::str::FromStr;

use crate::coerce::{to_engine, to_host};
use crate::engine::{ContainerRef, EntityRef};
use crate::error::{EngineError, Error};
use crate::host::HostValue;
use crate::model::Model;
use crate::resolve::{child_labels, exists, resolve, Target};

mod problems;
mod selection;

pub use problems::{Category, Problem};
pub use selection::{Selected, Selector};

/// A possibly nonexistent node of a model.
///
/// Creating a handle never touches the tree. Every operation resolves the
/// path anew, so a handle notices when its node is created, renamed or
/// removed behind its back.
#[derive(Clone)]
pub struct Node<'m> {
    model: &'m Model,
    path: NodePath,
}

/// Requested change of a feature's activation flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Toggle {
    #[default]
    Flip,
    On,
    Off,
}

impl FromStr for Toggle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flip" => Ok(Toggle::Flip),
            "on" | "enable" | "activate" => Ok(Toggle::On),
            "off" | "disable" | "deactivate" => Ok(Toggle::Off),
            other => Err(Error::InvalidArgument(format!(
                "invalid toggle action \"{other}\""
            ))),
        }
    }
}

impl<'m> Node<'m> {
    pub fn new(model: &'m Model, path: impl Into<NodePath>) -> Self {
        Self {
            model,
            path: path.into(),
        }
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Last path segment. Empty for the root.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    pub fn is_group(&self) -> bool {
        self.path.is_group()
    }

    pub fn join(&self, child: &str) -> Node<'m> {
        Node::new(self.model, self.path.join(child))
    }

    /// Handle on the child with exactly this name, which may contain `/`.
    pub fn child(&self, name: &str) -> Node<'m> {
        Node::new(self.model, self.path.child(name))
    }

    pub fn parent(&self) -> Option<Node<'m>> {
        self.path.parent().map(|path| Node::new(self.model, path))
    }

    pub fn exists(&self) -> Result<bool, Error> {
        exists(self.model, &self.path)
    }

    /// True if a child of the given name exists.
    pub fn contains(&self, name: &str) -> Result<bool, Error> {
        self.join(name).exists()
    }

    /// Snapshot of the existing children.
    pub fn children(&self) -> Result<Vec<Node<'m>>, Error> {
        match resolve(self.model, &self.path)? {
            Target::Root(_) => Ok(self
                .model
                .groups()
                .map(|group| Node::new(self.model, group))
                .collect()),
            target => match target.container() {
                Some(container) => Ok(child_labels(container.as_ref())?
                    .iter()
                    .map(|label| self.child(label))
                    .collect()),
                None => Ok(Vec::new()),
            },
        }
    }

    /// Internal tag of the node. Groups and the root have none.
    pub fn tag(&self) -> Result<Option<String>, Error> {
        Ok(match resolve(self.model, &self.path)? {
            Target::Root(document) => Some(document.tag()),
            Target::Group(..) => None,
            Target::Feature(entity) => Some(entity.tag()),
        })
    }

    /// Feature type, such as `Block`, if the node reports one.
    pub fn entity_type(&self) -> Result<Option<String>, Error> {
        match resolve(self.model, &self.path)? {
            Target::Feature(entity) => match entity.entity_type() {
                Ok(kind) => Ok(Some(kind)),
                Err(EngineError::Unsupported(_)) => Ok(None),
                Err(err) => Err(err.into()),
            },
            _ => Ok(None),
        }
    }

    pub fn comment(&self) -> Result<String, Error> {
        Ok(self.feature("read comments of")?.comments()?)
    }

    pub fn set_comment(&self, text: &str) -> Result<(), Error> {
        Ok(self.feature("comment on")?.set_comments(text)?)
    }

    /// Change the display label. The handle follows the node to its new path.
    pub fn rename(&mut self, name: &str) -> Result<(), Error> {
        self.forbid_structural("rename")?;
        let renamed = self.path.with_name(name)?;
        let entity = self.feature("rename")?;
        entity.set_label(name)?;
        debug!("Renamed \"{}\" to \"{renamed}\".", self.path);
        self.path = renamed;
        Ok(())
    }

    /// Assign a new internal tag.
    pub fn retag(&self, tag: &str) -> Result<(), Error> {
        self.forbid_structural("change tag of")?;
        Ok(self.feature("change tag of")?.set_tag(tag)?)
    }

    pub fn property(&self, name: &str) -> Result<HostValue, Error> {
        let entity = self.feature("read properties of")?;
        to_host(entity.as_ref(), name)
    }

    pub fn set_property(&self, name: &str, value: impl Into<HostValue>) -> Result<(), Error> {
        let entity = self.feature("set properties of")?;
        let value = to_engine(&value.into())?;
        Ok(entity.set(name, value)?)
    }

    /// Names of the declared properties.
    pub fn properties(&self) -> Result<Vec<String>, Error> {
        Ok(self.feature("list properties of")?.properties()?)
    }

    /// All properties with their values, sorted by name.
    pub fn properties_map(&self) -> Result<BTreeMap<String, HostValue>, Error> {
        let entity = self.feature("list properties of")?;
        let names = match entity.properties() {
            Ok(names) => names,
            Err(EngineError::Unsupported(_)) => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        names
            .into_iter()
            .map(|name| -> Result<(String, HostValue), Error> {
                let value = to_host(entity.as_ref(), &name)?;
                Ok((name, value))
            })
            .collect()
    }

    pub fn toggle(&self, action: Toggle) -> Result<(), Error> {
        let entity = self.feature("toggle")?;
        let active = match action {
            Toggle::Flip => !entity.is_active()?,
            Toggle::On => true,
            Toggle::Off => false,
        };
        Ok(entity.set_active(active)?)
    }

    /// Perform the node's "run" action.
    pub fn run(&self) -> Result<(), Error> {
        let entity = self.feature("run")?;
        match entity.run() {
            Err(EngineError::Unsupported(_)) => {
                let message = format!("node \"{self}\" does not implement the run operation");
                error!("{message}");
                Err(Error::Runtime(message))
            }
            other => Ok(other?),
        }
    }

    /// Load external data from `file` into the node.
    pub fn import(&self, file: &Path) -> Result<(), Error> {
        if !file.exists() {
            let message = format!("file \"{}\" does not exist", file.display());
            error!("{message}");
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                message,
            )));
        }
        let entity = self.feature("import data into")?;
        info!("Loading external data from file \"{}\".", file.display());
        entity.set(
            "filename",
            to_engine(&HostValue::Path(file.to_path_buf()))?,
        )?;
        entity.discard_data()?;
        entity.import_data()?;
        info!("Finished loading external data.");
        Ok(())
    }

    /// Create a child node.
    ///
    /// The first string argument is taken as the feature type and gives the
    /// tag its prefix. Without a `name`, the label the engine assigns is
    /// used for the returned handle.
    pub fn create(&self, args: &[HostValue], name: Option<&str>) -> Result<Node<'m>, Error> {
        if self.is_root() {
            let message = "cannot create nodes at the root of the model tree".to_string();
            error!("{message}");
            return Err(Error::Permission(message));
        }
        if let Some(name) = name {
            validate_segment(name)?;
        }
        let container = self.child_container()?;
        let tag = container.unique_tag(&tag_prefix(args));
        let args = args.iter().map(to_engine).collect::<Result<Vec<_>, _>>()?;
        let entity = container.create(&tag, &args)?;
        let label = match name {
            Some(name) => {
                entity.set_label(name)?;
                name.to_string()
            }
            None => entity.label(),
        };
        let child = self.child(&label);
        debug!("Created \"{child}\" with tag \"{tag}\".");
        Ok(child)
    }

    /// Remove the node from the tree. The handle stays usable and reports
    /// that the node no longer exists.
    pub fn remove(&self) -> Result<(), Error> {
        self.forbid_structural("remove")?;
        let entity = self.feature("remove")?;
        let Some(parent) = self.parent() else {
            return Err(Error::Permission("cannot remove the root node".to_string()));
        };
        let container = parent.child_container()?;
        container.remove(&entity.tag())?;
        debug!("Removed \"{self}\".");
        Ok(())
    }

    /// This node as an argument to another engine call: its internal tag.
    pub fn as_argument(&self) -> Result<HostValue, Error> {
        Ok(HostValue::Node(self.feature("reference")?.tag()))
    }

    fn forbid_structural(&self, action: &str) -> Result<(), Error> {
        let message = if self.is_root() {
            format!("cannot {action} the root node")
        } else if self.is_group() {
            format!("cannot {action} a built-in group")
        } else {
            return Ok(());
        };
        error!("{message}");
        Err(Error::Permission(message))
    }

    /// The engine feature behind a node below group level.
    pub(crate) fn feature(&self, action: &str) -> Result<EntityRef, Error> {
        self.forbid_structural(action)?;
        match resolve(self.model, &self.path)? {
            Target::Feature(entity) => Ok(entity),
            _ => Err(Error::Lookup(format!(
                "node \"{self}\" does not exist in model tree"
            ))),
        }
    }

    /// Container new children of this node go into.
    fn child_container(&self) -> Result<ContainerRef, Error> {
        resolve(self.model, &self.path)?.container().ok_or_else(|| {
            let message = format!("node \"{self}\" does not support feature creation");
            error!("{message}");
            Error::Runtime(message)
        })
    }
}

/// Tag prefix for a new feature: the start of its type name.
fn tag_prefix(args: &[HostValue]) -> String {
    match args.iter().find_map(HostValue::as_str) {
        Some(kind) if !kind.is_empty() => kind.to_lowercase().chars().take(3).collect(),
        _ => "tag".to_string(),
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.model == other.model
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node(\"{}\")", self.path)
    }
}

impl<'m> Div<&str> for &Node<'m> {
    type Output = Node<'m>;

    fn div(self, child: &str) -> Node<'m> {
        self.join(child)
    }
}

impl<'m> Div<&str> for Node<'m> {
    type Output = Node<'m>;

    fn div(self, child: &str) -> Node<'m> {
        self.join(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_words() {
        assert_eq!("flip".parse::<Toggle>().unwrap(), Toggle::Flip);
        for word in ["on", "enable", "activate"] {
            assert_eq!(word.parse::<Toggle>().unwrap(), Toggle::On);
        }
        for word in ["off", "disable", "deactivate"] {
            assert_eq!(word.parse::<Toggle>().unwrap(), Toggle::Off);
        }
        assert!(matches!(
            "sideways".parse::<Toggle>(),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(Toggle::default(), Toggle::Flip);
    }

    #[test]
    fn test_tag_prefix() {
        assert_eq!(tag_prefix(&[HostValue::from("Block")]), "blo");
        assert_eq!(tag_prefix(&[HostValue::Int(3), HostValue::from("Step")]), "ste");
        assert_eq!(tag_prefix(&[HostValue::from("At")]), "at");
        assert_eq!(tag_prefix(&[]), "tag");
        assert_eq!(tag_prefix(&[HostValue::Int(2)]), "tag");
    }
}
