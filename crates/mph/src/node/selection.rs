//! Entity selections of nodes.

use log::{debug, error};
use mph_node_path::Group;

use super::Node;
use crate::engine::SelectionRef;
use crate::error::{EngineError, Error};
use crate::host::HostValue;

/// What [`Node::select`] assigns.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector<'a, 'n> {
    /// Follow a selection feature, making a "named" selection.
    Named(&'a Node<'n>),
    /// Domain, boundary, edge, or point numbers, making a "manual"
    /// selection. An empty list clears it.
    Entities(Vec<i32>),
    All,
    Clear,
}

/// What [`Node::selection`] reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Selected<'m> {
    /// The selection feature followed.
    Named(Node<'m>),
    Entities(Vec<i32>),
}

impl<'a, 'n> From<&'a Node<'n>> for Selector<'a, 'n> {
    fn from(node: &'a Node<'n>) -> Self {
        Selector::Named(node)
    }
}

impl From<i32> for Selector<'_, '_> {
    fn from(entity: i32) -> Self {
        Selector::Entities(vec![entity])
    }
}

impl From<Vec<i32>> for Selector<'_, '_> {
    fn from(entities: Vec<i32>) -> Self {
        Selector::Entities(entities)
    }
}

impl From<&[i32]> for Selector<'_, '_> {
    fn from(entities: &[i32]) -> Self {
        Selector::Entities(entities.to_vec())
    }
}

fn entity_number(value: i64) -> Result<i32, Error> {
    i32::try_from(value)
        .map_err(|_| Error::InvalidArgument(format!("entity number {value} is out of range")))
}

impl TryFrom<HostValue> for Selector<'_, '_> {
    type Error = Error;

    /// Host values that name entities: an integer or a list or array of
    /// them, `"all"`, or none.
    fn try_from(value: HostValue) -> Result<Self, Self::Error> {
        match value {
            HostValue::None => Ok(Selector::Clear),
            HostValue::Str(s) if s == "all" => Ok(Selector::All),
            HostValue::Int(i) => Ok(Selector::Entities(vec![entity_number(i)?])),
            HostValue::IntArray(array) if array.ndim() <= 1 => array
                .into_data()
                .into_iter()
                .map(entity_number)
                .collect::<Result<_, _>>()
                .map(Selector::Entities),
            HostValue::List(items) | HostValue::Objects(items)
                if items.iter().all(|item| matches!(item, HostValue::Int(_))) =>
            {
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        HostValue::Int(i) => Some(entity_number(i)),
                        _ => None,
                    })
                    .collect::<Result<_, _>>()
                    .map(Selector::Entities)
            }
            _ => {
                let message =
                    "entity must be a node, \"all\", or an array of integers".to_string();
                error!("{message}");
                Err(Error::InvalidArgument(message))
            }
        }
    }
}

impl<'m> Node<'m> {
    /// Assign the node's selection.
    ///
    /// # Errors
    ///
    /// `Lookup` if this node or a named selection node does not exist,
    /// `Runtime` for geometry features, and `InvalidArgument` if the node
    /// neither has a selection nor is one, or cannot follow named ones.
    pub fn select(&self, selector: Selector<'_, '_>) -> Result<(), Error> {
        let selection = self.selection_object("change")?;
        match selector {
            Selector::Named(node) => {
                if !node.exists()? {
                    let message = format!("assigned node \"{node}\" does not exist");
                    error!("{message}");
                    return Err(Error::Lookup(message));
                }
                let tag = node.feature("select")?.tag();
                match selection.set_named(&tag) {
                    Err(EngineError::Unsupported(_)) => {
                        let message = format!("node \"{self}\" does not support named selections");
                        error!("{message}");
                        return Err(Error::InvalidArgument(message));
                    }
                    other => other?,
                }
            }
            Selector::Entities(entities) => selection.set(&entities)?,
            Selector::All => selection.all()?,
            Selector::Clear => selection.set(&[])?,
        }
        debug!("Changed selection of \"{self}\".");
        Ok(())
    }

    /// The selection feature followed, the selected entity numbers, or
    /// `None` if nothing is selected.
    ///
    /// # Errors
    ///
    /// As for [`Node::select`], and `Lookup` if the followed selection
    /// feature cannot be found among the selections.
    pub fn selection(&self) -> Result<Option<Selected<'m>>, Error> {
        let selection = self.selection_object("query")?;
        let named = match selection.named() {
            Ok(tag) => tag.filter(|tag| !tag.is_empty()),
            Err(EngineError::Unsupported(_)) => None,
            Err(err) => return Err(err.into()),
        };
        if let Some(tag) = named {
            for node in Node::new(self.model, Group::Selections).children()? {
                if node.tag()?.as_deref() == Some(tag.as_str()) {
                    return Ok(Some(Selected::Named(node)));
                }
            }
            let message = format!("found no selection with reported tag \"{tag}\"");
            error!("{message}");
            return Err(Error::Lookup(message));
        }
        let entities = selection.entities()?;
        Ok(if entities.is_empty() {
            None
        } else {
            Some(Selected::Entities(entities))
        })
    }

    fn selection_object(&self, action: &str) -> Result<SelectionRef, Error> {
        let entity = self.feature(&format!("{action} the selection of"))?;
        if self.path.group() == Some(Group::Geometries) && self.path.depth() > 2 {
            let message =
                format!("cannot {action} the selection of geometry feature \"{self}\" here");
            error!("{message}");
            return Err(Error::Runtime(message));
        }
        match entity.selection() {
            Err(EngineError::Unsupported(_)) => {
                let message = format!("node \"{self}\" neither has nor is a selection");
                error!("{message}");
                Err(Error::InvalidArgument(message))
            }
            other => Ok(other?),
        }
    }
}
