//! Mapping node paths onto live engine objects.
//!
//! Below the group level, nodes are matched by display label, one level
//! at a time. When several siblings carry the same label the first one in
//! engine enumeration order wins.

use log::debug;
use mph_node_path::{format_node_path, validate_node_path, Group, NodePath};

use crate::engine::{Container, ContainerRef, DocumentRef, EntityRef};
use crate::error::Error;
use crate::model::Model;

/// Engine object a path resolves to.
#[derive(Clone)]
pub enum Target {
    Root(DocumentRef),
    Group(Group, ContainerRef),
    Feature(EntityRef),
}

impl Target {
    /// Container holding the children of this object, if it has one.
    pub fn container(&self) -> Option<ContainerRef> {
        match self {
            Target::Root(_) => None,
            Target::Group(_, container) => Some(container.clone()),
            Target::Feature(entity) => entity.features(),
        }
    }

    pub fn as_feature(&self) -> Option<&EntityRef> {
        match self {
            Target::Feature(entity) => Some(entity),
            _ => None,
        }
    }
}

/// Resolve a path against the live tree.
///
/// # Errors
///
/// `Lookup` naming the first segment that cannot be found, and
/// `InvalidArgument` for paths too long or too deep to be real. Failures of
/// the engine calls made during the walk pass through.
pub fn resolve(model: &Model, path: &NodePath) -> Result<Target, Error> {
    validate_node_path(&path.to_string())?;
    if path.is_root() {
        return Ok(Target::Root(model.document().clone()));
    }
    let segments = path.segments();
    let group = path
        .group()
        .ok_or_else(|| Error::Lookup(format!("\"{}\" is not a built-in group", segments[0])))?;
    let container = model.group(group).ok_or_else(|| {
        Error::Lookup(format!("group \"{group}\" is not available in this model"))
    })?;
    let mut target = Target::Group(group, container.clone());
    for (depth, name) in segments.iter().enumerate().skip(1) {
        let here = format_node_path(&segments[..depth]);
        let Some(container) = target.container() else {
            return Err(Error::Lookup(format!(
                "node \"{here}\" has no child named \"{name}\""
            )));
        };
        match find_child(container.as_ref(), name)? {
            Some(entity) => target = Target::Feature(entity),
            None => {
                return Err(Error::Lookup(format!(
                    "node \"{here}\" has no child named \"{name}\""
                )))
            }
        }
    }
    Ok(target)
}

/// Check whether a path resolves. Only lookup failures count as absence.
pub fn exists(model: &Model, path: &NodePath) -> Result<bool, Error> {
    match resolve(model, path) {
        Ok(_) => Ok(true),
        Err(err) if err.is_lookup() => {
            debug!("Node \"{path}\" does not exist: {err}");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// First item of `container` whose label is `label`.
pub fn find_child(container: &dyn Container, label: &str) -> Result<Option<EntityRef>, Error> {
    for tag in container.tags() {
        let entity = container.get(&tag)?;
        if entity.label() == label {
            return Ok(Some(entity));
        }
    }
    Ok(None)
}

/// Labels of all items of `container`, in engine enumeration order.
pub fn child_labels(container: &dyn Container) -> Result<Vec<String>, Error> {
    container
        .tags()
        .iter()
        .map(|tag| -> Result<String, Error> { Ok(container.get(tag)?.label()) })
        .collect()
}
