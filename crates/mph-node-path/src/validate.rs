//! Validation of node paths and node names.

use crate::{NodePathError, SEPARATOR};

/// Maximum allowed path string length.
const MAX_PATH_STRING_LENGTH: usize = 1024;

/// Maximum allowed path depth.
const MAX_PATH_DEPTH: usize = 256;

/// Validate a raw node path string.
///
/// Parsing itself never fails. This check is for callers that accept
/// paths from outside, such as the command line.
///
/// # Example
///
/// ```
/// use mph_node_path::validate_node_path;
///
/// validate_node_path("functions/step").unwrap();
/// validate_node_path("").unwrap();
/// validate_node_path(&"a/".repeat(300)).unwrap_err();
/// ```
pub fn validate_node_path(path: &str) -> Result<(), NodePathError> {
    if path.len() > MAX_PATH_STRING_LENGTH {
        return Err(NodePathError::PathTooLong);
    }
    let depth = path.split(SEPARATOR).filter(|s| !s.is_empty()).count();
    if depth > MAX_PATH_DEPTH {
        return Err(NodePathError::PathTooDeep);
    }
    Ok(())
}

/// Validate a single node name, such as a new label given to `rename`.
///
/// # Example
///
/// ```
/// use mph_node_path::validate_segment;
///
/// validate_segment("step").unwrap();
/// validate_segment("").unwrap_err();
/// validate_segment("a/b").unwrap_err();
/// ```
pub fn validate_segment(name: &str) -> Result<(), NodePathError> {
    if name.is_empty() {
        return Err(NodePathError::EmptySegment);
    }
    if name.contains(SEPARATOR) {
        return Err(NodePathError::SegmentContainsSeparator(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_root() {
        assert!(validate_node_path("").is_ok());
        assert!(validate_node_path("/").is_ok());
    }

    #[test]
    fn test_validate_long_path() {
        let long = "a".repeat(2000);
        assert_eq!(validate_node_path(&long), Err(NodePathError::PathTooLong));
    }

    #[test]
    fn test_validate_deep_path() {
        let deep = "a/".repeat(300);
        assert_eq!(validate_node_path(&deep), Err(NodePathError::PathTooDeep));
        let max = "a/".repeat(256);
        assert!(validate_node_path(&max).is_ok());
    }

    #[test]
    fn test_repeated_separators_do_not_count() {
        let sparse = "/".repeat(600);
        assert!(validate_node_path(&sparse).is_ok());
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("Block 1").is_ok());
        assert_eq!(validate_segment(""), Err(NodePathError::EmptySegment));
        assert_eq!(
            validate_segment("sweep/solution"),
            Err(NodePathError::SegmentContainsSeparator("sweep/solution".to_string()))
        );
    }
}
