//! Amoeba
//!
//! A micro toolkit over a document tree: a total value classifier, generic
//! iteration, selector-filtered traversal, positional insertion and a
//! chainable node handle with class editing and delegated events.
//!
//! # Example
//! ```rust,ignore
//! use amoeba::{Amoeba, NodeApi, Position};
//! use amoeba_dom::parse_html;
//!
//! let amoeba = Amoeba::new(parse_html("<ul id='list'><li>x</li></ul>"));
//! let list = amoeba.get("#list", None).unwrap();
//! list.insert("first", Position::Top).add_class("ready");
//! ```

mod amoeba;
mod config;
mod each;
mod handle;
mod insert;
mod traverse;
mod util;
mod value;

pub use amoeba::Amoeba;
pub use config::{Config, DelegationPhase, SiblingScan};
pub use each::{each, each_with, try_each, try_each_with, Key};
pub use handle::{EventSpec, Handler, NodeApi, NodeHandle};
pub use insert::{insert, resolve, Content, Position};
pub use traverse::{children, next, previous, siblings, Filter};
pub use util::{
    extend, parse_query, template, to_query, Request, RequestOptions, Response, Transport, Util,
    UtilError, FORM_CONTENT_TYPE,
};
pub use value::{classify, Category, Function, Map, Value};

// Host tree, for callers that build documents directly
pub use amoeba_dom as dom;

/// Toolkit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
