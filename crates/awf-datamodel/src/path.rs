// SPDX-License-Identifier: MIT OR Apache-2.0
//! Path grammar: `/workflow` ( `/` segment | `[` index `]` | `.` field )*
//! (`spec.md` §4.1).

use awf_error::{ErrorCode, WorkflowError};
use std::fmt;

/// One step in a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A `/field` or `.field` step.
    Field(String),
    /// A `[index]` step.
    Index(usize),
}

/// A fully parsed `/workflow/...` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The parsed segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// `true` if this path names the root (`/workflow` with no further
    /// segments).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/workflow")?;
        for seg in &self.segments {
            match seg {
                PathSegment::Field(name) => write!(f, "/{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

const ROOT: &str = "/workflow";

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parse a path string. Fails with `StructureMalformed` if the grammar does
/// not match, or the path does not start with `/workflow`.
pub fn parse_path(input: &str) -> Result<Path, WorkflowError> {
    if !input.starts_with(ROOT) {
        return Err(WorkflowError::new(
            ErrorCode::StructureMalformed,
            format!("path {input:?} must start with /workflow"),
        ));
    }
    let rest = &input[ROOT.len()..];
    let mut segments = Vec::new();
    let chars: Vec<char> = rest.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '/' | '.' => {
                let sep = chars[i];
                i += 1;
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                if start == i {
                    return Err(malformed(input, sep, "expected a non-empty identifier"));
                }
                segments.push(PathSegment::Field(chars[start..i].iter().collect()));
            }
            '[' => {
                i += 1;
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if start == i {
                    return Err(malformed(input, '[', "expected a non-negative integer index"));
                }
                let digits: String = chars[start..i].iter().collect();
                if i >= chars.len() || chars[i] != ']' {
                    return Err(malformed(input, '[', "unterminated index"));
                }
                i += 1;
                let idx: usize = digits.parse().map_err(|_| {
                    WorkflowError::new(ErrorCode::StructureMalformed, format!("invalid array index in {input:?}"))
                })?;
                segments.push(PathSegment::Index(idx));
            }
            other => return Err(malformed(input, other, "unexpected character")),
        }
    }
    Ok(Path { segments })
}

fn malformed(input: &str, at: char, why: &str) -> WorkflowError {
    WorkflowError::new(ErrorCode::StructureMalformed, format!("invalid path {input:?}: {why} (near {at:?})"))
}

/// `true` if `s` parses successfully as a `/workflow...` path.
#[must_use]
pub fn is_path_literal(s: &str) -> bool {
    parse_path(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_root() {
        let p = parse_path("/workflow").unwrap();
        assert!(p.is_root());
    }

    #[test]
    fn parses_field_segments() {
        let p = parse_path("/workflow/users").unwrap();
        assert_eq!(p.segments(), &[PathSegment::Field("users".to_string())]);
    }

    #[test]
    fn parses_mixed_segments() {
        let p = parse_path("/workflow/users[2].name").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Field("users".to_string()),
                PathSegment::Index(2),
                PathSegment::Field("name".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_missing_root() {
        assert!(parse_path("/other/path").is_err());
    }

    #[test]
    fn rejects_empty_segment() {
        assert!(parse_path("/workflow/").is_err());
        assert!(parse_path("/workflow.").is_err());
    }

    #[test]
    fn rejects_unterminated_index() {
        assert!(parse_path("/workflow/users[2").is_err());
    }

    #[test]
    fn rejects_non_numeric_index() {
        assert!(parse_path("/workflow/users[abc]").is_err());
    }

    #[test]
    fn display_round_trips() {
        let original = "/workflow/users[2].name";
        let parsed = parse_path(original).unwrap();
        assert_eq!(parsed.to_string(), original);
    }

    #[test]
    fn is_path_literal_helper() {
        assert!(is_path_literal("/workflow/a"));
        assert!(!is_path_literal("not a path"));
    }

    proptest::proptest! {
        #[test]
        fn parse_format_round_trip(
            fields in proptest::collection::vec("[a-zA-Z][a-zA-Z0-9_-]{0,8}", 0..6),
            index in 0usize..1000,
        ) {
            let mut s = String::from("/workflow");
            for (i, f) in fields.iter().enumerate() {
                if i % 2 == 0 {
                    s.push('/');
                } else {
                    s.push('.');
                }
                s.push_str(f);
            }
            s.push_str(&format!("[{index}]"));
            let parsed = parse_path(&s).unwrap();
            // Re-rendering always uses `/` before fields, so compare segment
            // lists rather than exact string form for mixed separators.
            let rendered = parsed.to_string();
            let reparsed = parse_path(&rendered).unwrap();
            prop_assert_eq!(parsed, reparsed);
        }
    }
}
