//! Built-in top-level groups of the model tree.

use std::fmt;
use std::str::FromStr;

use crate::NodePathError;

/// One of the fixed top-level collections of a model.
///
/// The declaration order is the order in which the root node lists its
/// children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Group {
    Parameters,
    Functions,
    Components,
    Geometries,
    Views,
    Selections,
    Coordinates,
    Variables,
    Couplings,
    Physics,
    Multiphysics,
    Materials,
    Meshes,
    Studies,
    Solutions,
    Batches,
    Datasets,
    Evaluations,
    Tables,
    Plots,
    Exports,
}

/// Accepted aliases for group names, mapped to the canonical name.
const ALIASES: &[(&str, &str)] = &[
    ("parameter", "parameters"),
    ("function", "functions"),
    ("component", "components"),
    ("geometry", "geometries"),
    ("view", "views"),
    ("selection", "selections"),
    ("variable", "variables"),
    ("coupling", "couplings"),
    ("material", "materials"),
    ("mesh", "meshes"),
    ("study", "studies"),
    ("solution", "solutions"),
    ("batch", "batches"),
    ("dataset", "datasets"),
    ("evaluation", "evaluations"),
    ("table", "tables"),
    ("plot", "plots"),
    ("result", "plots"),
    ("results", "plots"),
    ("export", "exports"),
];

impl Group {
    pub const ALL: [Group; 21] = [
        Group::Parameters,
        Group::Functions,
        Group::Components,
        Group::Geometries,
        Group::Views,
        Group::Selections,
        Group::Coordinates,
        Group::Variables,
        Group::Couplings,
        Group::Physics,
        Group::Multiphysics,
        Group::Materials,
        Group::Meshes,
        Group::Studies,
        Group::Solutions,
        Group::Batches,
        Group::Datasets,
        Group::Evaluations,
        Group::Tables,
        Group::Plots,
        Group::Exports,
    ];

    /// Canonical name, as used for the first segment of a node path.
    pub fn name(self) -> &'static str {
        match self {
            Group::Parameters => "parameters",
            Group::Functions => "functions",
            Group::Components => "components",
            Group::Geometries => "geometries",
            Group::Views => "views",
            Group::Selections => "selections",
            Group::Coordinates => "coordinates",
            Group::Variables => "variables",
            Group::Couplings => "couplings",
            Group::Physics => "physics",
            Group::Multiphysics => "multiphysics",
            Group::Materials => "materials",
            Group::Meshes => "meshes",
            Group::Studies => "studies",
            Group::Solutions => "solutions",
            Group::Batches => "batches",
            Group::Datasets => "datasets",
            Group::Evaluations => "evaluations",
            Group::Tables => "tables",
            Group::Plots => "plots",
            Group::Exports => "exports",
        }
    }

    /// Looks up a group by canonical name only.
    pub fn from_name(name: &str) -> Option<Group> {
        Group::ALL.iter().copied().find(|group| group.name() == name)
    }
}

/// Maps a group alias to its canonical name.
///
/// Names that are not aliases, including canonical names and names of
/// no group at all, are returned unchanged.
///
/// # Example
///
/// ```
/// use mph_node_path::resolve_alias;
///
/// assert_eq!(resolve_alias("function"), "functions");
/// assert_eq!(resolve_alias("results"), "plots");
/// assert_eq!(resolve_alias("functions"), "functions");
/// assert_eq!(resolve_alias("anything"), "anything");
/// ```
pub fn resolve_alias(name: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

/// All `(alias, canonical)` pairs.
pub fn aliases() -> &'static [(&'static str, &'static str)] {
    ALIASES
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Group {
    type Err = NodePathError;

    /// Parses canonical names and aliases alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Group::from_name(resolve_alias(s)).ok_or_else(|| NodePathError::UnknownGroup(s.to_string()))
    }
}
