//! Provider filters
//!
//! LDAP-style predicates over provider properties, e.g.
//! `(&(objectClass=demo.Hello)(|(lang=en*)(!(service.ranking<=0))))`.
//!
//! Supported operators: `=` (with `*` wildcards and presence), `~=`
//! (case and whitespace insensitive equality), `>=`, `<=`, and the
//! `&`, `|`, `!` combinators. Attribute names match case-insensitively
//! when no exact key exists. Array-valued properties match when any
//! element matches.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::value_objects::Properties;

/// Parsed provider filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Filter {
    /// All sub-filters match
    And(Vec<Filter>),
    /// At least one sub-filter matches
    Or(Vec<Filter>),
    /// The sub-filter does not match
    Not(Box<Filter>),
    /// Exact equality
    Equal {
        /// Attribute name
        key: String,
        /// Expected value
        value: String,
    },
    /// Case and whitespace insensitive equality
    Approx {
        /// Attribute name
        key: String,
        /// Expected value
        value: String,
    },
    /// Greater or equal
    GreaterEq {
        /// Attribute name
        key: String,
        /// Lower bound
        value: String,
    },
    /// Less or equal
    LessEq {
        /// Attribute name
        key: String,
        /// Upper bound
        value: String,
    },
    /// Attribute is present
    Present {
        /// Attribute name
        key: String,
    },
    /// Wildcard match; `parts` are the literal pieces between `*`
    Substring {
        /// Attribute name
        key: String,
        /// Literal segments
        parts: Vec<String>,
    },
}

impl Filter {
    /// Parse a filter expression
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser::new(text);
        let filter = parser.parse_filter()?;
        parser.skip_whitespace();
        if parser.peek().is_some() {
            return Err(parser.error("trailing characters after filter"));
        }
        Ok(filter)
    }

    /// Evaluate the filter against a property map
    pub fn matches(&self, properties: &Properties) -> bool {
        match self {
            Self::And(filters) => filters.iter().all(|f| f.matches(properties)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(properties)),
            Self::Not(filter) => !filter.matches(properties),
            Self::Equal { key, value } => {
                lookup(properties, key).is_some_and(|v| compare(v, value, Op::Equal))
            }
            Self::Approx { key, value } => {
                lookup(properties, key).is_some_and(|v| compare(v, value, Op::Approx))
            }
            Self::GreaterEq { key, value } => {
                lookup(properties, key).is_some_and(|v| compare(v, value, Op::GreaterEq))
            }
            Self::LessEq { key, value } => {
                lookup(properties, key).is_some_and(|v| compare(v, value, Op::LessEq))
            }
            Self::Present { key } => lookup(properties, key).is_some(),
            Self::Substring { key, parts } => {
                lookup(properties, key).is_some_and(|v| substring_value(v, parts))
            }
        }
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Filter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(filters) => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Or(filters) => {
                f.write_str("(|")?;
                for filter in filters {
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
            Self::Not(filter) => write!(f, "(!{filter})"),
            Self::Equal { key, value } => write!(f, "({key}={})", escape(value)),
            Self::Approx { key, value } => write!(f, "({key}~={})", escape(value)),
            Self::GreaterEq { key, value } => write!(f, "({key}>={})", escape(value)),
            Self::LessEq { key, value } => write!(f, "({key}<={})", escape(value)),
            Self::Present { key } => write!(f, "({key}=*)"),
            Self::Substring { key, parts } => {
                let joined: Vec<String> = parts.iter().map(|p| escape(p)).collect();
                write!(f, "({key}={})", joined.join("*"))
            }
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

#[derive(Clone, Copy)]
enum Op {
    Equal,
    Approx,
    GreaterEq,
    LessEq,
}

fn lookup<'p>(properties: &'p Properties, key: &str) -> Option<&'p Value> {
    properties.get(key).or_else(|| {
        properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn compare(actual: &Value, expected: &str, op: Op) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| compare(item, expected, op)),
        Value::String(s) => match op {
            Op::Equal => s == expected,
            Op::Approx => normalize(s) == normalize(expected),
            Op::GreaterEq => s.as_str() >= expected,
            Op::LessEq => s.as_str() <= expected,
        },
        Value::Number(n) => {
            let (Some(actual), Ok(expected)) = (n.as_f64(), expected.trim().parse::<f64>()) else {
                return false;
            };
            let Some(ordering) = actual.partial_cmp(&expected) else {
                return false;
            };
            match op {
                Op::Equal | Op::Approx => ordering == Ordering::Equal,
                Op::GreaterEq => ordering != Ordering::Less,
                Op::LessEq => ordering != Ordering::Greater,
            }
        }
        Value::Bool(b) => match op {
            Op::Equal | Op::Approx => expected.trim().eq_ignore_ascii_case(&b.to_string()),
            Op::GreaterEq | Op::LessEq => false,
        },
        Value::Null | Value::Object(_) => false,
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn substring_value(actual: &Value, parts: &[String]) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| substring_value(item, parts)),
        Value::String(s) => substring_matches(s, parts),
        Value::Number(n) => substring_matches(&n.to_string(), parts),
        Value::Bool(b) => substring_matches(&b.to_string(), parts),
        Value::Null | Value::Object(_) => false,
    }
}

fn substring_matches(s: &str, parts: &[String]) -> bool {
    let Some((first, rest)) = parts.split_first() else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return s == first;
    };
    let Some(mut remaining) = s.strip_prefix(first.as_str()) else {
        return false;
    };
    for part in middle {
        match remaining.find(part.as_str()) {
            Some(index) => remaining = &remaining[index + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last.as_str())
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '(' | ')' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// Parsing
// ============================================================================

struct Parser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::invalid_filter(self.text, format!("{message} at position {}", self.pos))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn parse_filter(&mut self) -> Result<Filter> {
        self.skip_whitespace();
        self.expect('(')?;
        let filter = self.parse_component()?;
        self.skip_whitespace();
        self.expect(')')?;
        Ok(filter)
    }

    fn parse_component(&mut self) -> Result<Filter> {
        self.skip_whitespace();
        match self.peek() {
            Some('&') => {
                self.pos += 1;
                Ok(Filter::And(self.parse_list()?))
            }
            Some('|') => {
                self.pos += 1;
                Ok(Filter::Or(self.parse_list()?))
            }
            Some('!') => {
                self.pos += 1;
                Ok(Filter::Not(Box::new(self.parse_filter()?)))
            }
            Some(_) => self.parse_item(),
            None => Err(self.error("unexpected end of filter")),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Filter>> {
        let mut filters = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('(') {
                filters.push(self.parse_filter()?);
            } else {
                break;
            }
        }
        if filters.is_empty() {
            return Err(self.error("empty filter list"));
        }
        Ok(filters)
    }

    fn parse_item(&mut self) -> Result<Filter> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '<' | '>' | '~' | '(' | ')') {
                break;
            }
            self.pos += 1;
        }
        let key: String = self.chars[start..self.pos].iter().collect();
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let op = match (self.peek(), self.peek_at(1)) {
            (Some('='), _) => {
                self.pos += 1;
                None
            }
            (Some('>'), Some('=')) => {
                self.pos += 2;
                Some(Op::GreaterEq)
            }
            (Some('<'), Some('=')) => {
                self.pos += 2;
                Some(Op::LessEq)
            }
            (Some('~'), Some('=')) => {
                self.pos += 2;
                Some(Op::Approx)
            }
            _ => return Err(self.error("expected operator")),
        };

        let mut segments = self.parse_value()?;
        let Some(op) = op else {
            return Ok(match segments.len() {
                1 => Filter::Equal {
                    key,
                    value: segments.remove(0),
                },
                2 if segments.iter().all(String::is_empty) => Filter::Present { key },
                _ => Filter::Substring {
                    key,
                    parts: segments,
                },
            });
        };

        if segments.len() != 1 {
            return Err(self.error("wildcards are only allowed with '='"));
        }
        let value = segments.remove(0);
        Ok(match op {
            Op::GreaterEq => Filter::GreaterEq { key, value },
            Op::LessEq => Filter::LessEq { key, value },
            Op::Approx | Op::Equal => Filter::Approx { key, value },
        })
    }

    /// Value segments split on unescaped `*`
    fn parse_value(&mut self) -> Result<Vec<String>> {
        let mut segments = vec![String::new()];
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated value")),
                Some(')') => break,
                Some('(') => return Err(self.error("unescaped '(' in value")),
                Some('*') => {
                    self.pos += 1;
                    segments.push(String::new());
                }
                Some(c) => {
                    self.pos += 1;
                    let literal = if c == '\\' {
                        let escaped = self
                            .peek()
                            .ok_or_else(|| self.error("dangling escape"))?;
                        self.pos += 1;
                        escaped
                    } else {
                        c
                    };
                    if let Some(last) = segments.last_mut() {
                        last.push(literal);
                    }
                }
            }
        }
        Ok(segments)
    }
}
