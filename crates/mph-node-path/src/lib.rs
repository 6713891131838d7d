//! Node paths into a simulation model tree.
//!
//! A node path is written as slash-separated node names, starting with the
//! name of a built-in group, e.g. `functions/step` or `meshes/mesh/Size`.
//! Leading, trailing, and repeated slashes are tolerated. The empty string
//! and `/` both denote the root of the tree. The first segment may be an
//! alias of a group name (`function` for `functions`, `results` for
//! `plots`), which is replaced by the canonical name.
//!
//! This crate is purely syntactic: it never checks that a path names a
//! node that actually exists.
//!
//! # Example
//!
//! ```
//! use mph_node_path::{format_node_path, parse_node_path, NodePath};
//!
//! let path = NodePath::parse("/function/step/");
//! assert_eq!(path.segments(), ["functions", "step"]);
//! assert_eq!(path.to_string(), "functions/step");
//!
//! assert_eq!(parse_node_path("a//b/"), vec!["a", "b"]);
//! assert_eq!(format_node_path(&["a".to_string(), "b".to_string()]), "a/b");
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod group;
pub use group::{aliases, resolve_alias, Group};

pub mod validate;
pub use validate::{validate_node_path, validate_segment};

/// Separator between node names.
pub const SEPARATOR: char = '/';

/// Split a path string into its non-empty segments.
///
/// No alias substitution takes place.
///
/// # Example
///
/// ```
/// use mph_node_path::parse_node_path;
///
/// assert_eq!(parse_node_path(""), Vec::<String>::new());
/// assert_eq!(parse_node_path("/"), Vec::<String>::new());
/// assert_eq!(parse_node_path("//a///b//"), vec!["a", "b"]);
/// ```
pub fn parse_node_path(path: &str) -> Vec<String> {
    path.split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join segments into a path string.
pub fn format_node_path(segments: &[String]) -> String {
    segments.join("/")
}

/// Check if `parent` is a proper prefix of `child`.
pub fn is_child(parent: &[String], child: &[String]) -> bool {
    parent.len() < child.len() && child[..parent.len()] == *parent
}

/// Position of a node in the model tree, relative to the root.
///
/// The root is represented by a single empty segment, so that the
/// segment list is never empty. Every other path consists of non-empty
/// segments, none of which contains the separator, and its first segment
/// has been passed through [`resolve_alias`]. Segments appended with
/// [`NodePath::child`] are taken literally and may contain the separator,
/// since engine labels are free text.
///
/// Equality is structural: two paths with the same segments are equal
/// however they were written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// The root path.
    pub fn root() -> Self {
        Self {
            segments: vec![String::new()],
        }
    }

    /// Normalize a path string.
    ///
    /// Never fails: validity of the named nodes is checked only when the
    /// path is resolved against a model.
    pub fn parse(path: &str) -> Self {
        Self::from_segments(parse_node_path(path))
    }

    /// Build a path from segments, normalizing as [`NodePath::parse`] does.
    ///
    /// Segments that contain the separator are split at it, and empty
    /// segments are dropped.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for segment in segments {
            out.extend(parse_node_path(segment.as_ref()));
        }
        if out.is_empty() {
            return Self::root();
        }
        let first = resolve_alias(&out[0]).to_string();
        out[0] = first;
        Self { segments: out }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].is_empty()
    }

    /// True if the path names a top-level group (known or not).
    pub fn is_group(&self) -> bool {
        self.segments.len() == 1 && !self.segments[0].is_empty()
    }

    /// Number of segments below the root. The root has depth 0.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.segments.len()
        }
    }

    /// The group named by the first segment, if it is a built-in one.
    pub fn group(&self) -> Option<Group> {
        if self.is_root() {
            return None;
        }
        Group::from_name(&self.segments[0])
    }

    /// Last segment. The root yields the empty root marker.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Parent path, computed syntactically. The root has none.
    ///
    /// # Example
    ///
    /// ```
    /// use mph_node_path::NodePath;
    ///
    /// let size = NodePath::parse("meshes/mesh/Size");
    /// assert_eq!(size.parent(), Some(NodePath::parse("meshes/mesh")));
    /// assert_eq!(NodePath::parse("functions").parent(), Some(NodePath::root()));
    /// assert_eq!(NodePath::root().parent(), None);
    /// ```
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        if self.segments.len() == 1 {
            return Some(Self::root());
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Extend the path by one or more names.
    ///
    /// The `child` string is parsed like a path, so `"a/b"` appends two
    /// segments. Joining onto the root applies alias substitution to the
    /// new first segment.
    pub fn join(&self, child: &str) -> NodePath {
        if self.is_root() {
            return Self::parse(child);
        }
        let mut segments = self.segments.clone();
        segments.extend(parse_node_path(child));
        Self { segments }
    }

    /// Extend the path by exactly one name, taken literally.
    ///
    /// Unlike [`NodePath::join`], the name is never split at the separator,
    /// so a node labelled `a/b` keeps a single segment. On the root the name
    /// is a group name and goes through alias substitution.
    ///
    /// # Example
    ///
    /// ```
    /// use mph_node_path::NodePath;
    ///
    /// let sweep = NodePath::parse("datasets").child("sweep/solution");
    /// assert_eq!(sweep.segments(), ["datasets", "sweep/solution"]);
    /// assert_eq!(sweep.name(), "sweep/solution");
    /// ```
    pub fn child(&self, name: &str) -> NodePath {
        if self.is_root() {
            return Self::parse(name);
        }
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Replace the last segment, as a rename does.
    ///
    /// # Errors
    ///
    /// `NoParent` for the root, and the errors of [`validate_segment`].
    pub fn with_name(&self, name: &str) -> Result<NodePath, NodePathError> {
        if self.is_root() {
            return Err(NodePathError::NoParent);
        }
        validate_segment(name)?;
        if self.segments.len() == 1 {
            return Ok(Self::parse(name));
        }
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = name.to_string();
        }
        Ok(Self { segments })
    }

    /// True if `self` is an ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        is_child(&self.segments, &other.segments)
    }
}

impl Default for NodePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_node_path(&self.segments))
    }
}

impl FromStr for NodePath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for NodePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<Group> for NodePath {
    fn from(group: Group) -> Self {
        Self::parse(group.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodePathError {
    #[error("\"{0}\" is not a built-in group")]
    UnknownGroup(String),
    #[error("the root node has no parent")]
    NoParent,
    #[error("node name must not be empty")]
    EmptySegment,
    #[error("node name \"{0}\" contains the path separator")]
    SegmentContainsSeparator(String),
    #[error("path too long")]
    PathTooLong,
    #[error("path too deep")]
    PathTooDeep,
}
