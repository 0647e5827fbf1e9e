//! Path pattern module
//!
//! Parses forward patterns such as `/search` or `/booking/**` and matches
//! request paths against them.

use std::fmt;

/// A compiled forward pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Path must be equal (`/search`)
    Exact(String),
    /// Base path or anything below it (`/booking/**`), stored without the wildcard
    Subtree(String),
    /// Exactly one segment below the base (`/booking/*`), stored without the wildcard
    Segment(String),
}

/// Reason a pattern string was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    Empty,
    NotAbsolute(String),
    Whitespace(String),
    MisplacedWildcard(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "pattern is empty"),
            Self::NotAbsolute(p) => write!(f, "pattern '{p}' must start with '/'"),
            Self::Whitespace(p) => write!(f, "pattern '{p}' contains whitespace"),
            Self::MisplacedWildcard(p) => write!(
                f,
                "pattern '{p}' may only use '*' or '**' as its whole last segment"
            ),
        }
    }
}

impl std::error::Error for PatternError {}

impl PathPattern {
    /// Parse a pattern string
    ///
    /// # Examples
    /// - `/flights` matches only `/flights`
    /// - `/booking/**` matches `/booking`, `/booking/` and `/booking/42/seats`
    /// - `/booking/*` matches `/booking/42` but not `/booking/42/seats`
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PatternError::NotAbsolute(raw.to_string()));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(PatternError::Whitespace(raw.to_string()));
        }

        let (base, last) = raw.rsplit_once('/').unwrap_or(("", raw));
        if base.contains('*') {
            return Err(PatternError::MisplacedWildcard(raw.to_string()));
        }

        match last {
            "**" => Ok(Self::Subtree(base.to_string())),
            "*" => Ok(Self::Segment(base.to_string())),
            s if s.contains('*') => Err(PatternError::MisplacedWildcard(raw.to_string())),
            _ => Ok(Self::Exact(raw.to_string())),
        }
    }

    /// Check whether a request path matches this pattern
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Subtree(base) => {
                if path == base {
                    return true;
                }
                // "/**" has an empty base and covers every absolute path
                path.strip_prefix(base.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            }
            Self::Segment(base) => path
                .strip_prefix(base.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|segment| !segment.contains('/')),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "{p}"),
            Self::Subtree(base) => write!(f, "{base}/**"),
            Self::Segment(base) => write!(f, "{base}/*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(
            PathPattern::parse("/search").unwrap(),
            PathPattern::Exact("/search".to_string())
        );
        assert_eq!(
            PathPattern::parse("/booking/**").unwrap(),
            PathPattern::Subtree("/booking".to_string())
        );
        assert_eq!(
            PathPattern::parse("/booking/*").unwrap(),
            PathPattern::Segment("/booking".to_string())
        );
        assert_eq!(
            PathPattern::parse("/**").unwrap(),
            PathPattern::Subtree(String::new())
        );
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(PathPattern::parse(""), Err(PatternError::Empty));
        assert!(matches!(
            PathPattern::parse("search"),
            Err(PatternError::NotAbsolute(_))
        ));
        assert!(matches!(
            PathPattern::parse("/my flights"),
            Err(PatternError::Whitespace(_))
        ));
        assert!(matches!(
            PathPattern::parse("/booking/**/seats"),
            Err(PatternError::MisplacedWildcard(_))
        ));
        assert!(matches!(
            PathPattern::parse("/booking/id-*"),
            Err(PatternError::MisplacedWildcard(_))
        ));
    }

    #[test]
    fn test_exact_match() {
        let p = PathPattern::parse("/dashboard").unwrap();
        assert!(p.matches("/dashboard"));
        assert!(!p.matches("/dashboard/"));
        assert!(!p.matches("/dashboards"));
        assert!(!p.matches("/Dashboard"));
    }

    #[test]
    fn test_subtree_match() {
        let p = PathPattern::parse("/booking/**").unwrap();
        assert!(p.matches("/booking"));
        assert!(p.matches("/booking/"));
        assert!(p.matches("/booking/42"));
        assert!(p.matches("/booking/42/passengers/1"));
        assert!(!p.matches("/bookings"));
        assert!(!p.matches("/book"));
        assert!(!p.matches("/"));
    }

    #[test]
    fn test_segment_match() {
        let p = PathPattern::parse("/booking/*").unwrap();
        assert!(p.matches("/booking/"));
        assert!(p.matches("/booking/42"));
        assert!(!p.matches("/booking"));
        assert!(!p.matches("/booking/42/seats"));
        assert!(!p.matches("/bookingx/42"));
    }

    #[test]
    fn test_root_subtree_matches_everything() {
        let p = PathPattern::parse("/**").unwrap();
        assert!(p.matches("/"));
        assert!(p.matches("/anything/at/all"));
    }

    #[test]
    fn test_display_round_trips_source() {
        for raw in ["/search", "/booking/**", "/booking/*"] {
            assert_eq!(PathPattern::parse(raw).unwrap().to_string(), raw);
        }
    }
}
