//! Warnings and errors reported in the model tree.

use std::fmt;

use super::Node;
use crate::engine::ProblemReport;
use crate::error::{EngineError, Error};
use crate::resolve::{resolve, Target};

/// Severity of a [`Problem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Error,
    Warning,
}

impl Category {
    /// Deduced from the engine's problem type. Types that name neither
    /// have no category.
    pub fn of(kind: &str) -> Option<Category> {
        let kind = kind.to_lowercase();
        if kind.contains("error") {
            Some(Category::Error)
        } else if kind.contains("warning") {
            Some(Category::Warning)
        } else {
            None
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Error => "error",
            Category::Warning => "warning",
        })
    }
}

/// A problem reported by a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem<'m> {
    pub message: String,
    pub category: Option<Category>,
    /// The node reporting it.
    pub node: Node<'m>,
    /// Selection the problem refers to. Empty if not applicable.
    pub selection: String,
}

/// Depth first: each problem precedes the ones nested under it.
fn flatten<'m>(report: ProblemReport, node: &Node<'m>, out: &mut Vec<Problem<'m>>) {
    out.push(Problem {
        message: report.message.trim().to_string(),
        category: Category::of(&report.kind),
        node: node.clone(),
        selection: report.selection,
    });
    for nested in report.nested {
        flatten(nested, node, out);
    }
}

impl<'m> Node<'m> {
    /// Problems reported by the node and everything beneath it.
    ///
    /// On the root this collects every problem in the model.
    pub fn problems(&self) -> Result<Vec<Problem<'m>>, Error> {
        let mut problems = Vec::new();
        if let Target::Feature(entity) = resolve(self.model, &self.path)? {
            let reports = match entity.problems() {
                Ok(reports) => reports,
                Err(EngineError::Unsupported(_)) => Vec::new(),
                Err(err) => return Err(err.into()),
            };
            for report in reports {
                flatten(report, self, &mut problems);
            }
        }
        for child in self.children()? {
            problems.extend(child.problems()?);
        }
        Ok(problems)
    }
}
