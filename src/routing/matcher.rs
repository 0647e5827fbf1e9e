//! Forward table module
//!
//! Holds the ordered set of forward patterns and resolves request paths
//! against them.

use std::fmt;

use super::pattern::{PathPattern, PatternError};

/// Reason a forward table could not be built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardTableError {
    Pattern(PatternError),
    InvalidTarget(String),
    TargetIsForwarded { target: String, pattern: String },
}

impl fmt::Display for ForwardTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(e) => write!(f, "invalid forward pattern: {e}"),
            Self::InvalidTarget(t) => {
                write!(f, "forward target '{t}' must be an absolute path without wildcards")
            }
            Self::TargetIsForwarded { target, pattern } => write!(
                f,
                "forward target '{target}' matches forward pattern '{pattern}' and would loop"
            ),
        }
    }
}

impl std::error::Error for ForwardTableError {}

impl From<PatternError> for ForwardTableError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

/// Immutable table of forward bindings, shared by all requests
#[derive(Debug, Clone)]
pub struct ForwardTable {
    patterns: Vec<PathPattern>,
    target: String,
}

impl ForwardTable {
    /// Compile pattern strings into a table forwarding to `target`
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn new<S: AsRef<str>>(patterns: &[S], target: &str) -> Result<Self, ForwardTableError> {
        if !target.starts_with('/') || target.contains('*') || target.contains('?') {
            return Err(ForwardTableError::InvalidTarget(target.to_string()));
        }

        let mut compiled: Vec<PathPattern> = Vec::with_capacity(patterns.len());
        for raw in patterns {
            let pattern = PathPattern::parse(raw.as_ref())?;
            if pattern.matches(target) {
                return Err(ForwardTableError::TargetIsForwarded {
                    target: target.to_string(),
                    pattern: pattern.to_string(),
                });
            }
            if !compiled.contains(&pattern) {
                compiled.push(pattern);
            }
        }

        Ok(Self {
            patterns: compiled,
            target: target.to_string(),
        })
    }

    /// Return the forward target if `path` matches any pattern
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.matching_pattern(path).map(|_| self.target.as_str())
    }

    /// Find the first pattern matching `path`
    pub fn matching_pattern(&self, path: &str) -> Option<&PathPattern> {
        self.patterns.iter().find(|p| p.matches(path))
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_PATHS: [&str; 5] = [
        "/search",
        "/reservations",
        "/dashboard",
        "/flights",
        "/booking/**",
    ];

    fn default_table() -> ForwardTable {
        ForwardTable::new(&DEFAULT_PATHS, "/").unwrap()
    }

    #[test]
    fn test_literal_paths_forward_to_root() {
        let table = default_table();
        for path in ["/search", "/reservations", "/dashboard", "/flights"] {
            assert_eq!(table.resolve(path), Some("/"), "path {path}");
        }
    }

    #[test]
    fn test_booking_subtree_forwards_to_root() {
        let table = default_table();
        for path in ["/booking", "/booking/", "/booking/ABC123", "/booking/ABC123/seat/4C"] {
            assert_eq!(table.resolve(path), Some("/"), "path {path}");
        }
    }

    #[test]
    fn test_unrelated_paths_not_forwarded() {
        let table = default_table();
        for path in ["/", "/about", "/searching", "/bookings", "/flights/", "/index.html"] {
            assert_eq!(table.resolve(path), None, "path {path}");
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let table = default_table();
        let first = table.resolve("/booking/XYZ").map(str::to_string);
        for _ in 0..10 {
            assert_eq!(table.resolve("/booking/XYZ").map(str::to_string), first);
        }
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        let table = ForwardTable::new(&["/booking/*", "/booking/**"], "/").unwrap();
        assert_eq!(
            table.matching_pattern("/booking/1").map(ToString::to_string),
            Some("/booking/*".to_string())
        );
        assert_eq!(
            table.matching_pattern("/booking/1/2").map(ToString::to_string),
            Some("/booking/**".to_string())
        );
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let table = ForwardTable::new(&["/search", "/flights", "/search"], "/").unwrap();
        assert_eq!(table.patterns().len(), 2);
        assert_eq!(table.patterns()[0].to_string(), "/search");
    }

    #[test]
    fn test_target_that_would_loop_is_rejected() {
        let err = ForwardTable::new(&["/**"], "/").unwrap_err();
        assert!(matches!(err, ForwardTableError::TargetIsForwarded { .. }));

        let err = ForwardTable::new(&["/app/**"], "/app/index.html").unwrap_err();
        assert!(matches!(err, ForwardTableError::TargetIsForwarded { .. }));
    }

    #[test]
    fn test_invalid_target_is_rejected() {
        assert!(matches!(
            ForwardTable::new(&["/search"], "index.html"),
            Err(ForwardTableError::InvalidTarget(_))
        ));
        assert!(matches!(
            ForwardTable::new(&["/search"], "/app/*"),
            Err(ForwardTableError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        assert!(matches!(
            ForwardTable::new(&["search"], "/"),
            Err(ForwardTableError::Pattern(PatternError::NotAbsolute(_)))
        ));
    }

    #[test]
    fn test_custom_target() {
        let table = ForwardTable::new(&["/app/**"], "/index.html").unwrap();
        assert_eq!(table.resolve("/app/settings"), Some("/index.html"));
        assert_eq!(table.target(), "/index.html");
    }
}
