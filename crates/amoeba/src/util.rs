//! Utility namespace
//!
//! Deep merge, query strings, templating, element creation, script loading
//! and request building. Network I/O is delegated to a caller-supplied
//! [`Transport`].

use std::rc::Rc;

use amoeba_dom::SharedDocument;
use url::form_urlencoded;

use crate::config::Config;
use crate::each::{each, Key};
use crate::handle::{Handler, NodeApi, NodeHandle};
use crate::insert::Position;
use crate::value::{classify, Category, Map, Value};

/// Content type of form-encoded request bodies
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Utility errors
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Deep merge `properties` into `subject`.
///
/// Nested arrays and objects merge recursively; a nested slot holding a
/// different kind of value is first replaced by an empty container of the
/// incoming kind. Other values overwrite. `subject` itself is never
/// replaced: an object takes array entries under their index keys, an
/// array skips named keys, and a scalar is left as is. Properties that are
/// not arrays or objects leave `subject` untouched.
pub fn extend<'a>(subject: &'a mut Value, properties: &Value) -> &'a mut Value {
    if empty_like(properties).is_none() {
        return subject;
    }

    each(properties, |value, key| {
        let Some(slot) = slot_mut(subject, key) else {
            tracing::debug!(%key, "key has no slot in subject, skipped");
            return;
        };
        match empty_like(value) {
            Some(empty) => {
                if std::mem::discriminant(slot) != std::mem::discriminant(&empty) {
                    *slot = empty;
                }
                extend(slot, value);
            }
            None => *slot = value.clone(),
        }
    });
    subject
}

/// Empty container of the same kind, for arrays and objects
fn empty_like(value: &Value) -> Option<Value> {
    match value {
        Value::Array(_) => Some(Value::Array(Vec::new())),
        Value::Object(_) => Some(Value::Object(Map::new())),
        _ => None,
    }
}

fn slot_mut<'a>(container: &'a mut Value, key: Key<'_>) -> Option<&'a mut Value> {
    match container {
        Value::Object(map) => Some(map.entry(key.to_string()).or_default()),
        Value::Array(items) => {
            let index = key.as_index()?;
            if items.len() <= index {
                items.resize(index + 1, Value::Undefined);
            }
            items.get_mut(index)
        }
        _ => None,
    }
}

/// Encode the entries of `subject` as `key=value` pairs joined by `&`
pub fn to_query(subject: &Value) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    each(subject, |value, key| {
        serializer.append_pair(&key.to_string(), &value.to_string());
    });
    serializer.finish()
}

/// Decode the query part of `subject` into an object. Everything up to the
/// first `?` and any trailing `#fragment` are ignored. A value ends at the
/// next raw `=`, `+` decodes to a space, and keys without a value map to
/// `Null`.
pub fn parse_query(subject: &str) -> Value {
    let query = match subject.split_once('?') {
        Some((_, rest)) => rest,
        None => subject,
    };
    let query = match query.rfind('#') {
        Some(index) => &query[..index],
        None => query,
    };

    let map = query
        .split('&')
        .map(|pair| match pair.match_indices('=').nth(1) {
            Some((end, _)) => &pair[..end],
            None => pair,
        })
        .flat_map(|pair| form_urlencoded::parse(pair.as_bytes()))
        .map(|(key, value)| {
            let value = if value.is_empty() {
                Value::Null
            } else {
                Value::String(value.into_owned())
            };
            (key.into_owned(), value)
        })
        .collect::<Map>();
    Value::Object(map)
}

/// Replace the first occurrence of each `{key}` token with the value's text
pub fn template(text: &str, data: &Value, delimiters: (&str, &str)) -> String {
    let (open, close) = delimiters;
    let mut out = text.to_string();
    each(data, |value, key| {
        let token = format!("{open}{key}{close}");
        out = out.replacen(&token, &value.to_string(), 1);
    });
    out
}

/// An outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: String,
    /// Entries sent as the query string (GET) or a form body
    pub data: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            data: None,
            headers: Vec::new(),
        }
    }
}

impl Request {
    /// Build a request. GET data is appended to the url; other methods send
    /// it as a form-encoded body.
    pub fn build(url: &str, options: RequestOptions) -> Result<Self, UtilError> {
        let method = options.method.to_uppercase();
        if !matches!(
            method.as_str(),
            "GET" | "HEAD" | "POST" | "PUT" | "PATCH" | "DELETE" | "OPTIONS"
        ) {
            return Err(UtilError::UnsupportedMethod(options.method));
        }

        let mut request = Request {
            method,
            url: url.to_string(),
            headers: options.headers,
            body: None,
        };

        let query = options.data.as_ref().map(to_query).unwrap_or_default();
        if query.is_empty() {
            return Ok(request);
        }

        if matches!(request.method.as_str(), "GET" | "HEAD") {
            request.url.push(if request.url.contains('?') { '&' } else { '?' });
            request.url.push_str(&query);
        } else {
            request.headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
            request
                .headers
                .push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
            request.body = Some(query);
        }
        Ok(request)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response handed back by a [`Transport`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Performs requests on behalf of [`Util::request`]
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response, UtilError>;
}

/// Utility namespace bound to one document
#[derive(Debug, Clone)]
pub struct Util {
    document: SharedDocument,
    config: Rc<Config>,
}

impl Util {
    pub(crate) fn new(document: SharedDocument, config: Rc<Config>) -> Self {
        Self { document, config }
    }

    /// Classify a value
    pub fn type_of(&self, value: &Value) -> Category {
        classify(value)
    }

    /// Iterate a value; see [`crate::each()`]
    pub fn each<'s>(&self, subject: &'s Value, visitor: impl FnMut(&Value, Key<'_>)) -> &'s Value {
        each(subject, visitor)
    }

    pub fn extend<'a>(&self, subject: &'a mut Value, properties: &Value) -> &'a mut Value {
        extend(subject, properties)
    }

    pub fn to_query(&self, subject: &Value) -> String {
        to_query(subject)
    }

    pub fn parse_query(&self, subject: &str) -> Value {
        parse_query(subject)
    }

    /// [`template`] with the configured delimiters
    pub fn template(&self, text: &str, data: &Value) -> String {
        let (open, close) = &self.config.template_delimiters;
        template(text, data, (open.as_str(), close.as_str()))
    }

    /// Create an element with `attributes`, optionally inserting it
    /// relative to `parent`
    pub fn create(
        &self,
        tag: &str,
        attributes: &Value,
        parent: Option<&NodeHandle>,
        position: impl Into<Option<Position>>,
    ) -> NodeHandle {
        let node = {
            let mut doc = self.document.borrow_mut();
            let node = doc.tree.create_element(tag);
            each(attributes, |value, key| {
                if !matches!(value, Value::Undefined | Value::Null) {
                    doc.tree.set_attr(node, &key.to_string(), &value.to_string());
                }
            });
            node
        };
        tracing::debug!(tag, ?node, "created element");

        let element = NodeHandle::new(Rc::clone(&self.document), Rc::clone(&self.config), Some(node));
        match parent {
            Some(parent) if Rc::ptr_eq(parent.document(), &self.document) => {
                parent.insert(&element, position);
            }
            Some(_) => tracing::warn!(tag, "parent belongs to another document, element left detached"),
            None => {}
        }
        element
    }

    /// Append a `script` element for `url` to the body, binding `on_load`
    /// to its `load` event
    pub fn load(&self, url: &str, on_load: Option<&Handler>) -> NodeHandle {
        let body = {
            let doc = self.document.borrow();
            doc.body().to_option().unwrap_or(doc.tree.root())
        };
        let body = NodeHandle::new(Rc::clone(&self.document), Rc::clone(&self.config), Some(body));

        let script = self.create("script", &Value::Undefined, Some(&body), Position::Bottom);
        if let Some(handler) = on_load {
            script.on("load", handler);
        }
        script.set_attr("src", url);
        tracing::debug!(url, "script queued");
        script
    }

    /// Build a request and hand it to `transport`; `on_load` receives the
    /// response body when the transport succeeds
    pub fn request<T: Transport + ?Sized>(
        &self,
        transport: &T,
        url: &str,
        options: RequestOptions,
        on_load: Option<&dyn Fn(&Response)>,
    ) -> Result<Response, UtilError> {
        let request = Request::build(url, options)?;
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let response = transport.send(&request)?;
        if let Some(on_load) = on_load {
            on_load(&response);
        }
        Ok(response)
    }
}
