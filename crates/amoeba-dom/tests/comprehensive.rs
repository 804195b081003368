//! Comprehensive tests for amoeba-dom
//!
//! Parsing into the arena, selector matching and event dispatch working
//! together on real markup.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use amoeba_dom::{
    dispatch, parse_html, ClassList, Event, EventPhase, HandlerId, HtmlParser, ListenerCallback,
    ListenerOptions, NodeData, Selector,
};

const PAGE: &str = r#"
    <html>
        <head><title>Fixture</title></head>
        <body>
            <div id="app" class="shell main">
                <ul id="list">
                    <li class="row active">one</li>
                    <!-- separator -->
                    <li class="row">two</li>
                    <li class="row active" data-kind="last">three</li>
                </ul>
                <a href="https://example.com/docs" lang="en-US">docs</a>
            </div>
        </body>
    </html>
"#;

#[test]
fn test_parse_builds_skeleton() {
    common::init_tracing();
    let doc = HtmlParser::new().parse_with_url(PAGE, "https://example.com/");

    assert_eq!(doc.url(), "https://example.com/");
    assert_eq!(doc.title(), "Fixture");
    assert_eq!(doc.tree.tag_name(doc.body()), Some("body"));
    assert_eq!(doc.tree.parent(doc.head()), Some(doc.document_element()));
}

#[test]
fn test_parse_keeps_text_and_comments() {
    let doc = parse_html(PAGE);
    let list = doc.get_element_by_id("list").unwrap();

    let kinds: Vec<&'static str> = doc
        .tree
        .children(list)
        .map(|(_, node)| match node.data {
            NodeData::Element(_) => "element",
            NodeData::Text(_) => "text",
            NodeData::Comment(_) => "comment",
            _ => "other",
        })
        .collect();

    assert!(kinds.contains(&"comment"));
    assert!(kinds.contains(&"text"));
    assert_eq!(kinds.iter().filter(|k| **k == "element").count(), 3);
}

#[test]
fn test_selectors_against_markup() {
    let doc = parse_html(PAGE);
    let tree = &doc.tree;
    let root = tree.root();

    let rows = Selector::parse("#list > li.row").unwrap().query_all(tree, root);
    assert_eq!(rows.len(), 3);

    let active = Selector::parse("ul .active").unwrap().query_all(tree, root);
    assert_eq!(active, vec![rows[0], rows[2]]);

    let last = Selector::parse("li[data-kind=last]").unwrap();
    assert_eq!(last.query_first(tree, root), Some(rows[2]));

    let link = Selector::parse("a[href^=https][lang|=en]").unwrap();
    assert!(link.query_first(tree, root).is_some());

    let either = Selector::parse("title, #app").unwrap().query_all(tree, root);
    assert_eq!(either.len(), 2);

    assert!(!Selector::parse("div > li").unwrap().matches(tree, rows[0]));
    assert!(Selector::parse("div li").unwrap().matches(tree, rows[0]));
}

#[test]
fn test_class_list_from_attribute() {
    let doc = parse_html(PAGE);
    let app = doc.get_element_by_id("app").unwrap();
    let mut classes = ClassList::parse(doc.tree.get_attr(app, "class").unwrap());

    assert!(classes.contains("shell"));
    assert!(!classes.add("main"));
    assert!(classes.add("wide"));
    assert_eq!(classes.value(), "shell main wide");
}

#[test]
fn test_dispatch_through_parsed_tree() {
    common::init_tracing();
    let doc = parse_html(PAGE).shared();
    let (app, row) = {
        let d = doc.borrow();
        let app = d.get_element_by_id("app").unwrap();
        let row = Selector::parse("li").unwrap().query_first(&d.tree, app).unwrap();
        (app, row)
    };

    let log = Rc::new(RefCell::new(Vec::new()));
    let record = |label: &'static str| -> ListenerCallback {
        let log = Rc::clone(&log);
        Rc::new(move |event: &mut Event| log.borrow_mut().push((label, event.phase)))
    };

    {
        let mut d = doc.borrow_mut();
        d.listeners.add(app, "click", HandlerId::next(), ListenerOptions::capture(), record("app-capture"));
        d.listeners.add(app, "click", HandlerId::next(), ListenerOptions::default(), record("app-bubble"));
        d.listeners.add(row, "click", HandlerId::next(), ListenerOptions::default(), record("row"));
    }

    let event = dispatch(&doc, row, Event::new("click"));
    assert_eq!(event.target, row);
    assert_eq!(
        *log.borrow(),
        vec![
            ("app-capture", EventPhase::Capturing),
            ("row", EventPhase::AtTarget),
            ("app-bubble", EventPhase::Bubbling),
        ]
    );

    log.borrow_mut().clear();
    dispatch(&doc, row, Event::non_bubbling("click"));
    assert_eq!(
        *log.borrow(),
        vec![("app-capture", EventPhase::Capturing), ("row", EventPhase::AtTarget)]
    );
}

#[test]
fn test_listener_may_mutate_tree() {
    let doc = parse_html(PAGE).shared();
    let list = doc.borrow().get_element_by_id("list").unwrap();

    let weak = Rc::downgrade(&doc);
    let grow: ListenerCallback = Rc::new(move |event: &mut Event| {
        if let Some(doc) = weak.upgrade() {
            let mut d = doc.borrow_mut();
            let li = d.tree.create_element("li");
            let _ = d.tree.append_child(event.target, li);
        }
    });
    doc.borrow_mut()
        .listeners
        .add(list, "grow", HandlerId::next(), ListenerOptions::default(), grow);

    dispatch(&doc, list, Event::new("grow"));
    assert_eq!(doc.borrow().tree.element_children(list).count(), 4);
}
