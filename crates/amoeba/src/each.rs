//! Generic iteration over classified values
//!
//! The visitor receives `(value, key)` pairs chosen by the subject's
//! [`Category`]. Visitor failures are never caught here: the `try_` variants
//! stop at the first `Err` and hand it back unchanged.

use std::convert::Infallible;
use std::fmt;

use crate::value::{classify, Category, Value};

/// Position of a visited item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    Index(usize),
    Name(&'a str),
}

impl Key<'_> {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

/// Visit `subject` with `receiver` bound as the visitor's first argument
pub fn try_each_with<'s, R, E, F>(subject: &'s Value, receiver: &R, mut visitor: F) -> Result<&'s Value, E>
where
    R: ?Sized,
    F: FnMut(&R, &Value, Key<'_>) -> Result<(), E>,
{
    match (classify(subject), subject) {
        (Category::Number, Value::Number(n)) => {
            // Same bound as `for (i = 0; i < n; i++)`
            let count = if *n > 0.0 { n.ceil() as usize } else { 0 };
            for i in 0..count {
                visitor(receiver, &Value::Number(i as f64), Key::Index(i))?;
            }
        }
        (Category::Mapping, Value::Object(map)) => {
            for (key, value) in map {
                visitor(receiver, value, Key::Name(key))?;
            }
        }
        (Category::String, Value::String(s)) => {
            for (i, ch) in s.chars().enumerate() {
                visitor(receiver, &Value::String(ch.to_string()), Key::Index(i))?;
            }
        }
        (Category::Sequence, Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                visitor(receiver, item, Key::Index(i))?;
            }
        }
        (Category::NodeCollection, Value::NodeList(nodes)) => {
            for (i, node) in nodes.iter().enumerate() {
                visitor(receiver, &Value::Node(*node), Key::Index(i))?;
            }
        }
        // `Null` is a mapping without keys; the rest are not iterable
        _ => {}
    }
    Ok(subject)
}

/// Visit `subject`; the subject itself is the receiver
pub fn try_each<'s, E, F>(subject: &'s Value, mut visitor: F) -> Result<&'s Value, E>
where
    F: FnMut(&Value, Key<'_>) -> Result<(), E>,
{
    try_each_with(subject, subject, |_, value, key| visitor(value, key))
}

/// Infallible form of [`try_each_with`]
pub fn each_with<'s, R, F>(subject: &'s Value, receiver: &R, mut visitor: F) -> &'s Value
where
    R: ?Sized,
    F: FnMut(&R, &Value, Key<'_>),
{
    let result: Result<&Value, Infallible> = try_each_with(subject, receiver, |r, value, key| {
        visitor(r, value, key);
        Ok(())
    });
    match result {
        Ok(subject) => subject,
        Err(never) => match never {},
    }
}

/// Infallible form of [`try_each`]
pub fn each<'s, F>(subject: &'s Value, mut visitor: F) -> &'s Value
where
    F: FnMut(&Value, Key<'_>),
{
    each_with(subject, subject, |_, value, key| visitor(value, key))
}
