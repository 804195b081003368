//! Runtime values and the type classifier
//!
//! [`Value`] is the dynamic value model the toolkit accepts wherever the
//! caller may hand over "anything": iteration subjects, content to insert,
//! attribute maps, query data. [`classify`] maps every value to exactly one
//! [`Category`].

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::SystemTime;

use amoeba_dom::NodeId;
use serde::{Deserialize, Serialize};

/// Ordered string-keyed mapping
pub type Map = BTreeMap<String, Value>;

/// Closed set of value categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Number,
    String,
    Sequence,
    Mapping,
    Function,
    Boolean,
    Date,
    #[serde(rename = "regexp")]
    RegExp,
    Node,
    NodeCollection,
    Undefined,
}

impl Category {
    /// Canonical lowercase tag
    pub fn name(self) -> &'static str {
        match self {
            Category::Number => "number",
            Category::String => "string",
            Category::Sequence => "sequence",
            Category::Mapping => "mapping",
            Category::Function => "function",
            Category::Boolean => "boolean",
            Category::Date => "date",
            Category::RegExp => "regexp",
            Category::Node => "node",
            Category::NodeCollection => "node-collection",
            Category::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callable value
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(&[Value]) -> Value>);

impl Function {
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function")
    }
}

/// Functions compare by identity
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Dynamic value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Function(Function),
    Date(SystemTime),
    /// Regular expression, kept as its source pattern
    RegExp(String),
    Node(NodeId),
    NodeList(Vec<NodeId>),
}

/// Classify a value. Total and deterministic; `Null` lands in
/// [`Category::Mapping`] like the untyped "object" tag it descends from.
pub fn classify(value: &Value) -> Category {
    match value {
        Value::Null => Category::Mapping,
        Value::Undefined => Category::Undefined,
        Value::Bool(_) => Category::Boolean,
        Value::Number(_) => Category::Number,
        Value::String(_) => Category::String,
        Value::Array(_) => Category::Sequence,
        Value::Object(_) => Category::Mapping,
        Value::Function(_) => Category::Function,
        Value::Date(_) => Category::Date,
        Value::RegExp(_) => Category::RegExp,
        Value::Node(_) => Category::Node,
        Value::NodeList(_) => Category::NodeCollection,
    }
}

impl Value {
    /// Category of this value
    pub fn category(&self) -> Category {
        classify(self)
    }

    /// Build an object from key/value pairs
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Look up a key of an object
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Look up an element of an array
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        write!(f, "{n:.0}")
    } else {
        write!(f, "{n}")
    }
}

/// Text rendering used for text nodes, templates and query strings
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => format_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(item, Value::Undefined | Value::Null) {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Function(_) => f.write_str("function"),
            Value::Date(time) => match time.duration_since(SystemTime::UNIX_EPOCH) {
                Ok(elapsed) => write!(f, "{}", elapsed.as_millis()),
                Err(_) => f.write_str("Invalid Date"),
            },
            Value::RegExp(pattern) => write!(f, "/{pattern}/"),
            Value::Node(id) => write!(f, "[node {}]", id.index()),
            Value::NodeList(_) => f.write_str("[object NodeList]"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<Vec<NodeId>> for Value {
    fn from(ids: Vec<NodeId>) -> Self {
        Value::NodeList(ids)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<SystemTime> for Value {
    fn from(time: SystemTime) -> Self {
        Value::Date(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_every_variant() {
        let cases = [
            (Value::Null, Category::Mapping),
            (Value::Undefined, Category::Undefined),
            (Value::Bool(false), Category::Boolean),
            (Value::Number(1.5), Category::Number),
            (Value::from("hi"), Category::String),
            (Value::Array(vec![]), Category::Sequence),
            (Value::Object(Map::new()), Category::Mapping),
            (Value::Function(Function::new(|_| Value::Undefined)), Category::Function),
            (Value::Date(SystemTime::UNIX_EPOCH), Category::Date),
            (Value::RegExp("a+".into()), Category::RegExp),
            (Value::Node(NodeId::ROOT), Category::Node),
            (Value::NodeList(vec![NodeId::ROOT]), Category::NodeCollection),
        ];
        for (value, expected) in cases {
            assert_eq!(classify(&value), expected, "{value:?}");
            assert_eq!(classify(&value), classify(&value));
        }
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::NodeCollection.to_string(), "node-collection");
        assert_eq!(Category::RegExp.name(), "regexp");
        assert_eq!(Category::Mapping.name(), "mapping");
    }

    #[test]
    fn test_number_display() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_array_display() {
        let value = Value::Array(vec![1.into(), Value::Null, "x".into()]);
        assert_eq!(value.to_string(), "1,,x");
    }

    #[test]
    fn test_function_identity() {
        let f = Function::new(|args| args.first().cloned().unwrap_or_default());
        let g = Function::new(|_| Value::Null);
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
        assert_eq!(f.call(&["echo".into()]), Value::from("echo"));
    }
}
