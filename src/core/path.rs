//! Path expressions for addressing values inside webhook payloads
//!
//! A path is a dot-separated list of segments:
//!
//! - `data.guestName` - object keys
//! - `listingCustomFields[0]` - a key followed by one or more array indices
//! - `financeField.find(f => f.name === "baseRate").total` - a predicate
//!   lookup: the first array element whose `name` equals `"baseRate"`
//!
//! Expressions are parsed into [`Segment`]s and evaluated left to right.
//! Resolution never fails loudly: a bad expression or a missing value
//! resolves to `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::value::PayloadExt;

/// Key whose `find` segments are anchored at `data.financeField` in
/// [`FindAnchor::Legacy`] mode
pub const FINANCE_FIELD: &str = "financeField";

/// One step of a path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key lookup
    Key(String),
    /// Array index lookup
    Index(usize),
    /// First array element whose `property` is the string `value`
    Find { property: String, value: String },
}

/// Where a `financeField.find(...)` lookup starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindAnchor {
    /// Always search `data.financeField`, ignoring anything written before
    /// the predicate
    #[default]
    Legacy,
    /// The predicate applies to whatever the preceding segments resolved to
    Relative,
}

/// Errors from parsing a path expression
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid path '{path}' at position {position}: {message}")]
pub struct PathError {
    pub path: String,
    pub position: usize,
    pub message: String,
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    segments: Vec<Segment>,
}

impl PathExpr {
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let segments = Parser::new(s).path()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Position of the first `find(...)` segment written right after
    /// `financeField`; the key only has to end with it, so
    /// `myfinanceField.find(...)` counts too
    fn finance_find(&self) -> Option<usize> {
        self.segments
            .windows(2)
            .position(|pair| {
                matches!(
                    pair,
                    [Segment::Key(key), Segment::Find { .. }] if key.ends_with(FINANCE_FIELD)
                )
            })
            .map(|i| i + 1)
    }

    /// Resolve against a payload
    pub fn evaluate<'a>(&self, payload: &'a Value, anchor: FindAnchor) -> Option<&'a Value> {
        match (anchor, self.finance_find()) {
            (FindAnchor::Legacy, Some(find_at)) => {
                let root = payload.field("data")?.present()?.field(FINANCE_FIELD)?;
                walk(root, &self.segments[find_at..])
            }
            _ => walk(payload, &self.segments),
        }
    }
}

fn walk<'a>(root: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        let node = current.present()?;
        current = match segment {
            Segment::Key(key) => node.field(key)?,
            Segment::Index(index) => node.item(*index)?,
            Segment::Find { property, value } => node.as_array()?.iter().find(|element| {
                element.field(property).and_then(Value::as_str) == Some(value.as_str())
            })?,
        };
    }
    Some(current)
}

impl FromStr for PathExpr {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            let dot = if i > 0 { "." } else { "" };
            match segment {
                Segment::Index(index) => write!(f, "[{}]", index)?,
                Segment::Key(key) => write!(f, "{}{}", dot, key)?,
                Segment::Find { property, value } => write!(
                    f,
                    "{}find(f => f.{} === \"{}\")",
                    dot,
                    property,
                    value.replace('\\', "\\\\").replace('"', "\\\"")
                )?,
            }
        }
        Ok(())
    }
}

/// Resolve a path expression against a payload
///
/// Returns `None` when the path does not resolve, and also when the path
/// itself is malformed (logged at warn level).
pub fn extract<'a>(payload: &'a Value, path: &str, anchor: FindAnchor) -> Option<&'a Value> {
    let expr = match PathExpr::parse(path) {
        Ok(expr) => expr,
        Err(e) => {
            warn!(error = %e, "Unusable path expression");
            return None;
        }
    };
    let value = expr.evaluate(payload, anchor);
    debug!(path, found = value.is_some(), "Resolved path");
    value
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), PathError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", token)))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>) -> PathError {
        PathError {
            path: self.src.to_string(),
            position: self.pos,
            message: message.into(),
        }
    }

    fn path(mut self) -> Result<Vec<Segment>, PathError> {
        if self.src.trim().is_empty() {
            return Err(self.error("empty path"));
        }

        let mut segments = Vec::new();
        loop {
            self.segment(&mut segments)?;
            match self.peek() {
                None => break,
                Some('.') => {
                    self.bump();
                }
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(segments)
    }

    fn segment(&mut self, out: &mut Vec<Segment>) -> Result<(), PathError> {
        if self.rest().starts_with("find(") {
            out.push(self.find()?);
        } else {
            let start = self.pos;
            while let Some(c) = self.peek() {
                if matches!(c, '.' | '[' | ']' | '(' | ')') {
                    break;
                }
                self.bump();
            }
            let key = &self.src[start..self.pos];
            if !key.is_empty() {
                out.push(Segment::Key(key.to_string()));
            } else if self.peek() != Some('[') {
                return Err(self.error("empty segment"));
            }
        }

        while self.eat("[") {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            let digits = &self.src[start..self.pos];
            if digits.is_empty() {
                return Err(self.error("expected array index"));
            }
            let index = digits
                .parse::<usize>()
                .map_err(|_| self.error("array index out of range"))?;
            self.expect("]")?;
            out.push(Segment::Index(index));
        }
        Ok(())
    }

    /// `find(f => f.prop === "value")`
    fn find(&mut self) -> Result<Segment, PathError> {
        self.expect("find(")?;
        self.skip_ws();
        let param = self.ident()?;
        self.skip_ws();
        self.expect("=>")?;
        self.skip_ws();
        let bound = self.ident()?;
        if bound != param {
            return Err(self.error(format!("expected '{}'", param)));
        }
        self.expect(".")?;
        let property = self.ident()?;
        self.skip_ws();
        if !self.eat("===") && !self.eat("==") {
            return Err(self.error("expected '==='"));
        }
        self.skip_ws();
        let value = self.literal()?;
        self.skip_ws();
        self.expect(")")?;
        Ok(Segment::Find { property, value })
    }

    fn ident(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.bump();
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn literal(&mut self) -> Result<String, PathError> {
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        self.bump();

        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => value.push(c),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE_RATE: &str = r#"data.financeField.find(f => f.name === "baseRate").total"#;

    fn key(k: &str) -> Segment {
        Segment::Key(k.to_string())
    }

    #[test]
    fn test_parse_dotted() {
        let expr = PathExpr::parse("data.guestName").unwrap();
        assert_eq!(expr.segments(), &[key("data"), key("guestName")]);
    }

    #[test]
    fn test_parse_indices() {
        let expr = PathExpr::parse("data.listingCustomFields[0].value").unwrap();
        assert_eq!(
            expr.segments(),
            &[
                key("data"),
                key("listingCustomFields"),
                Segment::Index(0),
                key("value")
            ]
        );

        let expr = PathExpr::parse("[1][2]").unwrap();
        assert_eq!(expr.segments(), &[Segment::Index(1), Segment::Index(2)]);
    }

    #[test]
    fn test_parse_find() {
        let expr = PathExpr::parse(BASE_RATE).unwrap();
        assert_eq!(
            expr.segments(),
            &[
                key("data"),
                key("financeField"),
                Segment::Find {
                    property: "name".to_string(),
                    value: "baseRate".to_string()
                },
                key("total")
            ]
        );
    }

    #[test]
    fn test_parse_find_variants() {
        let expr = PathExpr::parse("items.find(item=>item.kind=='fee')").unwrap();
        assert_eq!(
            expr.segments()[1],
            Segment::Find {
                property: "kind".to_string(),
                value: "fee".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(PathExpr::parse("").is_err());
        assert!(PathExpr::parse("a..b").is_err());
        assert!(PathExpr::parse("a.b[").is_err());
        assert!(PathExpr::parse("a.b[x]").is_err());
        assert!(PathExpr::parse("a.b[1").is_err());
        assert!(PathExpr::parse("a.find(f => g.name === \"x\")").is_err());
        assert!(PathExpr::parse("a.find(f => f.name === x)").is_err());
        assert!(PathExpr::parse("a.find(f => f.name === \"x\"").is_err());

        let err = PathExpr::parse("a.b]").unwrap_err();
        assert_eq!(err.position, 3);
    }

    #[test]
    fn test_display_roundtrip() {
        for path in [
            "data.guestName",
            "a.b[1][2].c",
            BASE_RATE,
            r#"data.financeField.find(f => f.name === "with \"quote\"")"#,
        ] {
            let expr = PathExpr::parse(path).unwrap();
            let rendered = expr.to_string();
            assert_eq!(PathExpr::parse(&rendered).unwrap(), expr);
        }
        assert_eq!(PathExpr::parse("a.b[1]").unwrap().to_string(), "a.b[1]");
    }

    #[test]
    fn test_extract_finance_field() {
        let payload = json!({"data": {"financeField": [{"name": "baseRate", "total": 150}]}});
        assert_eq!(extract(&payload, BASE_RATE, FindAnchor::Legacy), Some(&json!(150)));

        let missing = BASE_RATE.replace("baseRate", "cleaningFee");
        assert_eq!(extract(&payload, &missing, FindAnchor::Legacy), None);
    }

    #[test]
    fn test_extract_whole_element() {
        let payload = json!({"data": {"financeField": [
            {"name": "tax", "total": 5},
            {"name": "baseRate", "total": 150}
        ]}});
        let path = r#"data.financeField.find(f => f.name === "baseRate")"#;
        assert_eq!(
            extract(&payload, path, FindAnchor::Legacy),
            Some(&json!({"name": "baseRate", "total": 150}))
        );
    }

    #[test]
    fn test_find_is_strict_string_compare() {
        let payload = json!({"data": {"financeField": [{"name": 5, "total": 1}]}});
        let path = r#"data.financeField.find(f => f.name === "5").total"#;
        assert_eq!(extract(&payload, path, FindAnchor::Legacy), None);
    }

    #[test]
    fn test_extract_index() {
        let payload = json!({"a": {"b": [10, 20, 30]}});
        assert_eq!(extract(&payload, "a.b[1]", FindAnchor::Legacy), Some(&json!(20)));
        assert_eq!(extract(&payload, "a.b[3]", FindAnchor::Legacy), None);
        assert_eq!(extract(&payload, "a[0]", FindAnchor::Legacy), None);
    }

    #[test]
    fn test_extract_null_short_circuits() {
        let payload = json!({"a": null});
        assert_eq!(extract(&payload, "a.b", FindAnchor::Legacy), None);
        assert_eq!(extract(&payload, "a", FindAnchor::Legacy), Some(&Value::Null));
    }

    #[test]
    fn test_extract_malformed_path_is_none() {
        let payload = json!({"a": {"b": [1]}});
        assert_eq!(extract(&payload, "a.b[x]", FindAnchor::Legacy), None);
        assert_eq!(extract(&payload, "a.b[", FindAnchor::Legacy), None);
    }

    #[test]
    fn test_legacy_anchor_ignores_prefix() {
        let payload = json!({"data": {"financeField": [{"name": "baseRate", "total": 150}]}});
        let path = r#"financeField.find(f => f.name === "baseRate").total"#;
        assert_eq!(extract(&payload, path, FindAnchor::Legacy), Some(&json!(150)));
        assert_eq!(extract(&payload, path, FindAnchor::Relative), None);

        let other = r#"reservation.financeField.find(f => f.name === "baseRate").total"#;
        assert_eq!(extract(&payload, other, FindAnchor::Legacy), Some(&json!(150)));
    }

    #[test]
    fn test_legacy_anchor_matches_key_suffix() {
        let payload = json!({"data": {
            "financeField": [{"name": "baseRate", "total": 150}],
            "myfinanceField": [{"name": "baseRate", "total": 99}]
        }});
        let path = r#"data.myfinanceField.find(f => f.name === "baseRate").total"#;
        assert_eq!(extract(&payload, path, FindAnchor::Legacy), Some(&json!(150)));
        assert_eq!(extract(&payload, path, FindAnchor::Relative), Some(&json!(99)));

        // financeField must come right before the predicate
        let nested = r#"data.financeFieldItems.find(f => f.name === "baseRate").total"#;
        assert_eq!(extract(&payload, nested, FindAnchor::Legacy), None);
    }

    #[test]
    fn test_relative_find_composes_at_depth() {
        let payload = json!({"data": {"items": [
            {"lines": [{"kind": "rent", "amount": 90}, {"kind": "fee", "amount": 12}]}
        ]}});
        let path = r#"data.items[0].lines.find(l => l.kind === "fee").amount"#;
        assert_eq!(extract(&payload, path, FindAnchor::Relative), Some(&json!(12)));
        // Not a financeField lookup, so legacy mode composes too
        assert_eq!(extract(&payload, path, FindAnchor::Legacy), Some(&json!(12)));
    }
}
