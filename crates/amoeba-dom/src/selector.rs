//! Selector parsing and matching
//!
//! Supports the subset Amoeba documents for its query functions: type,
//! universal, id, class and attribute selectors (presence, `=`, `~=`, `|=`,
//! `^=`, `$=`, `*=`) combined into compounds such as
//! `input#name.required[type='text']`, joined by descendant (whitespace) or
//! child (`>`) combinators, with comma-separated alternatives.

use crate::{DomTree, NodeId};

/// Selector parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Unexpected end of selector")]
    UnexpectedEnd,
}

/// Compiled selector list
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    alternatives: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttrSelector {
    name: String,
    test: Option<(AttrOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        if source.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let alternatives = Parser::new(source).parse_list()?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    /// The source text this selector was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether `node` matches any alternative
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches_at(tree, node, complex.compounds.len() - 1))
    }

    /// First matching descendant of `scope` in document order
    pub fn query_first(&self, tree: &DomTree, scope: NodeId) -> Option<NodeId> {
        tree.descendants(scope)
            .into_iter()
            .find(|&id| self.matches(tree, id))
    }

    /// All matching descendants of `scope` in document order
    pub fn query_all(&self, tree: &DomTree, scope: NodeId) -> Vec<NodeId> {
        tree.descendants(scope)
            .into_iter()
            .filter(|&id| self.matches(tree, id))
            .collect()
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl ComplexSelector {
    fn matches_at(&self, tree: &DomTree, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(tree, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => tree
                .parent(node)
                .is_some_and(|parent| self.matches_at(tree, parent, index - 1)),
            Combinator::Descendant => tree
                .ancestors(node)
                .any(|ancestor| self.matches_at(tree, ancestor, index - 1)),
        }
    }
}

impl Compound {
    fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(elem) = tree.get(node).and_then(|n| n.as_element()) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !elem.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| elem.has_class(class)) {
            return false;
        }
        self.attrs.iter().all(|attr| match elem.get_attr(&attr.name) {
            None => false,
            Some(value) => attr.test.as_ref().is_none_or(|(op, expected)| op.test(value, expected)),
        })
    }
}

impl AttrOp {
    fn test(self, value: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => value == expected,
            AttrOp::Includes => value.split_whitespace().any(|v| v == expected),
            AttrOp::DashMatch => {
                value == expected
                    || value
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttrOp::Prefix => !expected.is_empty() && value.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && value.ends_with(expected),
            AttrOp::Substring => !expected.is_empty() && value.contains(expected),
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar { ch, offset: self.pos },
            None => SelectorError::UnexpectedEnd,
        }
    }

    /// Skip whitespace, reporting whether any was consumed
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, ch: char) -> Result<(), SelectorError> {
        if self.peek() == Some(ch) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn is_ident_char(c: char) -> bool {
        c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(Self::is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>, SelectorError> {
        let mut list = Vec::new();
        loop {
            self.skip_ws();
            list.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => return Ok(list),
                Some(',') => self.pos += 1,
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => self.pos += 1,
            Some(c) if Self::is_ident_char(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();

        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(AttrSelector { name, test: None });
        }

        let op = match self.bump() {
            Some('=') => AttrOp::Equals,
            Some(c) => {
                let op = match c {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    '*' => AttrOp::Substring,
                    ch => {
                        return Err(SelectorError::UnexpectedChar {
                            ch,
                            offset: self.pos - 1,
                        });
                    }
                };
                self.expect('=')?;
                op
            }
            None => return Err(SelectorError::UnexpectedEnd),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.expect(quote)?;
                value
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        self.expect(']')?;

        Ok(AttrSelector {
            name,
            test: Some((op, value)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let ul = tree.create_element("ul");
        tree.set_attr(ul, "id", "users");
        let li = tree.create_element("li");
        tree.set_attr(li, "class", "row active");
        tree.set_attr(li, "data-role", "admin-user");
        let a = tree.create_element("a");
        tree.set_attr(a, "href", "https://example.com/profile");
        tree.append_child(tree.root(), ul).unwrap();
        tree.append_child(ul, li).unwrap();
        tree.append_child(li, a).unwrap();
        (tree, ul, li, a)
    }

    #[test]
    fn test_simple_selectors() {
        let (tree, ul, li, _) = fixture();

        assert!(Selector::parse("ul").unwrap().matches(&tree, ul));
        assert!(Selector::parse("UL").unwrap().matches(&tree, ul));
        assert!(Selector::parse("#users").unwrap().matches(&tree, ul));
        assert!(Selector::parse(".row").unwrap().matches(&tree, li));
        assert!(Selector::parse("li.row.active").unwrap().matches(&tree, li));
        assert!(!Selector::parse("li.row.missing").unwrap().matches(&tree, li));
        assert!(Selector::parse("*").unwrap().matches(&tree, li));
    }

    #[test]
    fn test_attribute_selectors() {
        let (tree, _, li, a) = fixture();

        assert!(Selector::parse("[data-role]").unwrap().matches(&tree, li));
        assert!(Selector::parse("[data-role='admin-user']").unwrap().matches(&tree, li));
        assert!(Selector::parse("[data-role|=admin]").unwrap().matches(&tree, li));
        assert!(Selector::parse("[class~=active]").unwrap().matches(&tree, li));
        assert!(Selector::parse("a[href^=\"https\"]").unwrap().matches(&tree, a));
        assert!(Selector::parse("a[href$=profile]").unwrap().matches(&tree, a));
        assert!(Selector::parse("a[href*=example]").unwrap().matches(&tree, a));
        assert!(!Selector::parse("a[href*='']").unwrap().matches(&tree, a));
        assert!(!Selector::parse("[title]").unwrap().matches(&tree, a));
    }

    #[test]
    fn test_combinators() {
        let (tree, ul, _, a) = fixture();

        assert!(Selector::parse("ul a").unwrap().matches(&tree, a));
        assert!(Selector::parse("ul > li > a").unwrap().matches(&tree, a));
        assert!(!Selector::parse("ul > a").unwrap().matches(&tree, a));
        assert!(Selector::parse("p, #users").unwrap().matches(&tree, ul));
        assert_eq!(
            Selector::parse("#users li a").unwrap().query_all(&tree, tree.root()),
            vec![a]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("ul >"), Err(SelectorError::UnexpectedEnd));
        assert_eq!(
            Selector::parse("ul, > li"),
            Err(SelectorError::UnexpectedChar { ch: '>', offset: 4 })
        );
        assert!(Selector::parse("[href").is_err());
        assert!(Selector::parse("a[href!=x]").is_err());
    }
}
