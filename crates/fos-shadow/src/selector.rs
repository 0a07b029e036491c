//! Select predicates for `<content select="...">`
//!
//! A predicate is a single compound selector: an optional type selector or
//! `*` followed by any number of `#id`, `.class`, `[name]` and
//! `[name=value]` parts. Anything else (combinators, pseudo-classes, selector
//! lists) is malformed and never matches.

use fos_dom::{DomTree, NodeId};
use std::collections::HashMap;

/// One part of a compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

impl SimpleSelector {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        match self {
            Self::Universal => true,
            Self::Type(tag) => tree.tag_name(node) == Some(tag.as_str()),
            Self::Id(id) => tree.element_id(node) == Some(id.as_str()),
            Self::Class(class) => tree.has_class(node, class),
            Self::Attribute { name, value } => match (tree.get_attribute(node, name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
        }
    }

    /// Attribute whose change can flip the result of this part
    fn dependent_attribute(&self) -> Option<&str> {
        match self {
            Self::Universal | Self::Type(_) => None,
            Self::Id(_) => Some("id"),
            Self::Class(_) => Some("class"),
            Self::Attribute { name, .. } => Some(name.as_str()),
        }
    }
}

/// Parsed `select` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Missing or blank predicate: matches every node, including text
    All,
    /// Compound selector: matches elements satisfying every part
    Compound(Vec<SimpleSelector>),
    /// Malformed predicate: matches nothing
    Invalid,
}

impl Selector {
    /// Parse a `select` attribute value
    pub fn parse(select: Option<&str>) -> Self {
        let Some(select) = select.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::All;
        };
        match parse_compound(select) {
            Some(parts) => Self::Compound(parts),
            None => {
                tracing::debug!(select, "malformed select predicate never matches");
                Self::Invalid
            }
        }
    }

    /// Whether `node` satisfies the predicate
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        match self {
            Self::All => true,
            Self::Invalid => false,
            Self::Compound(parts) => {
                tree.get(node).is_some_and(|n| n.is_element())
                    && parts.iter().all(|part| part.matches(tree, node))
            }
        }
    }

    /// Attribute names this predicate reads
    pub fn dependent_attributes(&self) -> impl Iterator<Item = &str> {
        let parts: &[SimpleSelector] = match self {
            Self::Compound(parts) => parts,
            Self::All | Self::Invalid => &[],
        };
        parts.iter().filter_map(SimpleSelector::dependent_attribute)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Read an identifier starting at `pos`, returning it and the end offset
fn read_ident(s: &str, pos: usize) -> Option<(&str, usize)> {
    let rest = &s[pos..];
    let len = rest.find(|c| !is_ident_char(c)).unwrap_or(rest.len());
    (len > 0).then(|| (&rest[..len], pos + len))
}

fn parse_compound(s: &str) -> Option<Vec<SimpleSelector>> {
    let mut parts = Vec::new();
    let mut pos = 0;

    if s.starts_with('*') {
        parts.push(SimpleSelector::Universal);
        pos = 1;
    } else if let Some((tag, end)) = read_ident(s, 0) {
        parts.push(SimpleSelector::Type(tag.to_ascii_lowercase()));
        pos = end;
    }

    while pos < s.len() {
        let marker = s[pos..].chars().next()?;
        match marker {
            '#' => {
                let (id, end) = read_ident(s, pos + 1)?;
                parts.push(SimpleSelector::Id(id.to_string()));
                pos = end;
            }
            '.' => {
                let (class, end) = read_ident(s, pos + 1)?;
                parts.push(SimpleSelector::Class(class.to_string()));
                pos = end;
            }
            '[' => {
                let close = s[pos..].find(']')? + pos;
                parts.push(parse_attribute(&s[pos + 1..close])?);
                pos = close + 1;
            }
            _ => return None,
        }
    }

    Some(parts)
}

fn parse_attribute(inner: &str) -> Option<SimpleSelector> {
    let (name, value) = match inner.split_once('=') {
        Some((name, value)) => (name.trim(), Some(unquote(value.trim())?)),
        None => (inner.trim(), None),
    };
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    Some(SimpleSelector::Attribute {
        name: name.to_ascii_lowercase(),
        value: value.map(str::to_string),
    })
}

fn unquote(value: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote) {
            return inner.strip_suffix(quote);
        }
    }
    (!value.is_empty() && value.chars().all(is_ident_char)).then_some(value)
}

/// Parsed predicates keyed by their source text
#[derive(Debug, Default)]
pub struct SelectorCache {
    parsed: HashMap<String, Selector>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse once per distinct predicate text
    pub fn get(&mut self, select: Option<&str>) -> &Selector {
        let key = select.unwrap_or_default();
        if !self.parsed.contains_key(key) {
            self.parsed.insert(key.to_string(), Selector::parse(select));
        }
        &self.parsed[key]
    }

    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }
}
