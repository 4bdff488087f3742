//! Route pattern parsing.
//!
//! Patterns are written as slash-separated segments. A segment is either
//! literal text, a placeholder (`{id}`), a constrained placeholder
//! (`{id:\d+}`) or a trailing catch-all (`*path`). Optional trailing parts
//! are wrapped in brackets and may nest: `/archive[/{year}[/{month}]]`
//! expands to three concrete patterns.

use std::fmt;

use regex::Regex;

use crate::error::RouteError;

/// Normalizes a path: ensures a leading `/` and strips trailing slashes.
///
/// The root path normalizes to the empty string so that it can be used
/// as a group prefix; callers registering a route turn an empty result
/// into `/`.
///
/// ```rust
/// use trellis_router::normalize_path;
///
/// assert_eq!(normalize_path("users/"), "/users");
/// assert_eq!(normalize_path("/"), "");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    while normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Expands optional brackets into the list of concrete patterns,
/// shortest first.
///
/// ```rust
/// use trellis_router::expand_optional;
///
/// let forms = expand_optional("/a[/b[/c]]").unwrap();
/// assert_eq!(forms, vec!["/a", "/a/b", "/a/b/c"]);
/// ```
pub fn expand_optional(pattern: &str) -> Result<Vec<String>, RouteError> {
    let without_closing = pattern.trim_end_matches(']');
    let optionals = pattern.len() - without_closing.len();

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in without_closing.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '[' if depth == 0 => {
                parts.push(&without_closing[start..i]);
                start = i + 1;
            }
            ']' if depth == 0 => {
                return Err(RouteError::OptionalNotAtEnd {
                    pattern: pattern.to_string(),
                })
            }
            _ => {}
        }
    }
    parts.push(&without_closing[start..]);

    if optionals != parts.len() - 1 {
        return Err(RouteError::UnbalancedOptional {
            pattern: pattern.to_string(),
        });
    }

    let mut current = String::new();
    let mut forms = Vec::with_capacity(parts.len());
    for (n, part) in parts.iter().enumerate() {
        if n != 0 && part.is_empty() {
            return Err(RouteError::EmptyOptional {
                pattern: pattern.to_string(),
            });
        }
        current.push_str(part);
        forms.push(current.clone());
    }
    Ok(forms)
}

/// A compiled placeholder constraint.
///
/// The regex is anchored so that it must match the whole segment.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
}

impl Constraint {
    fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The constraint as written in the pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `value` satisfies the constraint.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Constraint {}

/// One segment of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text
    Static(String),
    /// Named placeholder, optionally constrained
    Param {
        /// Capture name
        name: String,
        /// Regex the captured value must satisfy
        constraint: Option<Constraint>,
    },
    /// Catch-all capturing the rest of the path
    Wildcard(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(s) => f.write_str(s),
            Self::Param {
                name,
                constraint: None,
            } => write!(f, "{{{name}}}"),
            Self::Param {
                name,
                constraint: Some(c),
            } => write!(f, "{{{name}:{}}}", c.as_str()),
            Self::Wildcard(name) => write!(f, "*{name}"),
        }
    }
}

/// A single concrete pattern (no optional brackets left).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parses a concrete pattern such as `/users/{id:\d+}/posts`.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();

        let raw_segments = split_segments(pattern);
        let count = raw_segments.len();
        for (i, raw) in raw_segments.into_iter().enumerate() {
            let segment = parse_segment(pattern, raw)?;
            match &segment {
                Segment::Param { .. } | Segment::Wildcard(_) => {
                    let name = placeholder_name(raw);
                    if names.contains(&name) {
                        return Err(RouteError::DuplicatePlaceholder {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    names.push(name);
                    if matches!(segment, Segment::Wildcard(_)) && i + 1 != count {
                        return Err(RouteError::WildcardNotLast {
                            pattern: pattern.to_string(),
                        });
                    }
                }
                Segment::Static(_) => {}
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of all placeholders, in order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } | Segment::Wildcard(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// A key under which patterns that match exactly the same paths compare
    /// equal, regardless of placeholder names.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut key = String::new();
        for segment in &self.segments {
            key.push('/');
            match segment {
                Segment::Static(s) => key.push_str(s),
                Segment::Param { constraint, .. } => {
                    key.push_str("{:");
                    if let Some(c) = constraint {
                        key.push_str(c.as_str());
                    }
                    key.push('}');
                }
                Segment::Wildcard(_) => key.push('*'),
            }
        }
        key
    }

    /// Builds a concrete path by substituting placeholders.
    pub fn render<'v>(
        &self,
        mut lookup: impl FnMut(&str) -> Option<&'v str>,
    ) -> Result<String, RouteError> {
        if self.segments.is_empty() {
            return Ok("/".to_string());
        }

        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Static(s) => path.push_str(s),
                Segment::Param { name, constraint } => {
                    let value = lookup(name).ok_or_else(|| RouteError::MissingParameter {
                        pattern: self.raw.clone(),
                        name: name.clone(),
                    })?;
                    if let Some(c) = constraint {
                        if !c.is_match(value) {
                            return Err(RouteError::ConstraintViolation {
                                name: name.clone(),
                                value: value.to_string(),
                                constraint: c.as_str().to_string(),
                            });
                        }
                    }
                    path.push_str(value);
                }
                Segment::Wildcard(name) => {
                    let value = lookup(name).ok_or_else(|| RouteError::MissingParameter {
                        pattern: self.raw.clone(),
                        name: name.clone(),
                    })?;
                    path.push_str(value.trim_start_matches('/'));
                }
            }
        }
        Ok(path)
    }
}

/// Splits on `/` outside of braces and drops empty segments.
fn split_segments(pattern: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in pattern.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                if i > start {
                    segments.push(&pattern[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < pattern.len() {
        segments.push(&pattern[start..]);
    }
    segments
}

fn placeholder_name(raw: &str) -> &str {
    if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        inner.split_once(':').map_or(inner, |(name, _)| name).trim()
    } else {
        raw.trim_start_matches('*')
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn parse_segment(pattern: &str, raw: &str) -> Result<Segment, RouteError> {
    let invalid = || RouteError::InvalidSegment {
        pattern: pattern.to_string(),
        segment: raw.to_string(),
    };

    if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
        let (name, constraint) = match inner.split_once(':') {
            Some((name, source)) => (name.trim(), Some(source.trim())),
            None => (inner.trim(), None),
        };
        if !is_valid_name(name) {
            return Err(invalid());
        }
        let constraint = match constraint {
            Some(source) if !source.is_empty() => {
                Some(Constraint::new(source).map_err(|source| RouteError::InvalidConstraint {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                    source,
                })?)
            }
            Some(_) => return Err(invalid()),
            None => None,
        };
        return Ok(Segment::Param {
            name: name.to_string(),
            constraint,
        });
    }

    if raw.contains(['{', '}']) {
        return Err(invalid());
    }

    if let Some(name) = raw.strip_prefix('*') {
        if !is_valid_name(name) {
            return Err(invalid());
        }
        return Ok(Segment::Wildcard(name.to_string()));
    }

    Ok(Segment::Static(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("users"), "/users");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("/users//"), "/users");
        assert_eq!(normalize_path("/"), "");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_expand_without_optionals() {
        assert_eq!(expand_optional("/users/{id}").unwrap(), vec!["/users/{id}"]);
    }

    #[test]
    fn test_expand_nested_optionals() {
        let forms = expand_optional("/archive[/{year:\\d{4}}[/{month}]]").unwrap();
        assert_eq!(
            forms,
            vec!["/archive", "/archive/{year:\\d{4}}", "/archive/{year:\\d{4}}/{month}"]
        );
    }

    #[test]
    fn test_expand_ignores_brackets_inside_constraints() {
        let forms = expand_optional("/files/{name:[a-z]+}").unwrap();
        assert_eq!(forms, vec!["/files/{name:[a-z]+}"]);
    }

    #[test]
    fn test_expand_rejects_optional_in_middle() {
        let err = expand_optional("/a[/b]/c").unwrap_err();
        assert!(matches!(err, RouteError::OptionalNotAtEnd { .. }));
    }

    #[test]
    fn test_expand_rejects_unbalanced() {
        let err = expand_optional("/a[/b").unwrap_err();
        assert!(matches!(err, RouteError::UnbalancedOptional { .. }));
    }

    #[test]
    fn test_expand_rejects_empty_optional() {
        let err = expand_optional("/a[]").unwrap_err();
        assert!(matches!(err, RouteError::EmptyOptional { .. }));
    }

    #[test]
    fn test_parse_segments() {
        let pattern = RoutePattern::parse("/users/{id:\\d+}/files/*rest").unwrap();
        let segments = pattern.segments();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], Segment::Static("users".to_string()));
        match &segments[1] {
            Segment::Param { name, constraint } => {
                assert_eq!(name, "id");
                assert_eq!(constraint.as_ref().map(Constraint::as_str), Some("\\d+"));
            }
            other => panic!("unexpected segment {other:?}"),
        }
        assert_eq!(segments[3], Segment::Wildcard("rest".to_string()));
        assert_eq!(pattern.placeholders().collect::<Vec<_>>(), vec!["id", "rest"]);
    }

    #[test]
    fn test_parse_constraint_with_slash() {
        let pattern = RoutePattern::parse("/d/{date:\\d+/\\d+}").unwrap();
        assert_eq!(pattern.segments().len(), 2);
    }

    #[test]
    fn test_parse_rejects_mixed_segment() {
        let err = RoutePattern::parse("/file-{name}.json").unwrap_err();
        assert!(matches!(err, RouteError::InvalidSegment { .. }));
    }

    #[test]
    fn test_parse_rejects_duplicate_placeholder() {
        let err = RoutePattern::parse("/{id}/x/{id}").unwrap_err();
        assert!(matches!(err, RouteError::DuplicatePlaceholder { name, .. } if name == "id"));
    }

    #[test]
    fn test_parse_rejects_bad_regex() {
        let err = RoutePattern::parse("/{id:(}").unwrap_err();
        assert!(matches!(err, RouteError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_parse_rejects_wildcard_not_last() {
        let err = RoutePattern::parse("/*rest/more").unwrap_err();
        assert!(matches!(err, RouteError::WildcardNotLast { .. }));
    }

    #[test]
    fn test_canonical_ignores_names() {
        let a = RoutePattern::parse("/users/{id}").unwrap();
        let b = RoutePattern::parse("/users/{uid}").unwrap();
        let c = RoutePattern::parse("/users/{id:\\d+}").unwrap();
        assert_eq!(a.canonical(), b.canonical());
        assert_ne!(a.canonical(), c.canonical());
    }

    #[test]
    fn test_render() {
        let pattern = RoutePattern::parse("/users/{id:\\d+}/posts/{slug}").unwrap();
        let path = pattern
            .render(|name| match name {
                "id" => Some("7"),
                "slug" => Some("hello"),
                _ => None,
            })
            .unwrap();
        assert_eq!(path, "/users/7/posts/hello");

        let err = pattern.render(|_| Some("abc")).unwrap_err();
        assert!(matches!(err, RouteError::ConstraintViolation { .. }));

        let err = pattern.render(|_| None).unwrap_err();
        assert!(matches!(err, RouteError::MissingParameter { name, .. } if name == "id"));
    }

    #[test]
    fn test_render_root() {
        let pattern = RoutePattern::parse("/").unwrap();
        assert_eq!(pattern.render(|_| None).unwrap(), "/");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(path in "[a-z/]{0,24}") {
            let once = normalize_path(&path);
            prop_assert_eq!(normalize_path(&once), once.clone());
            prop_assert!(once.is_empty() || once.starts_with('/'));
            prop_assert!(!once.ends_with('/'));
        }

        #[test]
        fn expansion_prefixes_grow(base in "/[a-z]{1,8}", opt in "/[a-z]{1,8}") {
            let forms = expand_optional(&format!("{base}[{opt}]")).unwrap();
            prop_assert_eq!(forms.len(), 2);
            prop_assert!(forms[1].starts_with(&forms[0]));
        }
    }
}
