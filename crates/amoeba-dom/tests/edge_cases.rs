//! Edge case tests for amoeba-dom

use amoeba_dom::{parse_html, Document, DomError, DomTree, NodeId, Selector, SelectorError};

#[test]
fn test_parse_empty_input() {
    let doc = parse_html("");
    assert!(doc.tree.len() >= 1, "Even empty HTML should have root");
    assert!(doc.body().is_valid());
}

#[test]
fn test_parse_malformed_markup() {
    let doc = parse_html("<div><p>Unclosed paragraph<span>Unclosed span</div>");
    let spans = Selector::parse("div span").unwrap().query_all(&doc.tree, doc.tree.root());
    assert_eq!(spans.len(), 1);
}

#[test]
fn test_selector_errors() {
    assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
    assert_eq!(Selector::parse("li["), Err(SelectorError::UnexpectedEnd));
    assert!(matches!(
        Selector::parse("a!b"),
        Err(SelectorError::UnexpectedChar { ch: '!', offset: 1 })
    ));
    assert!("ul > li".parse::<Selector>().is_ok());
}

#[test]
fn test_unknown_node_ids() {
    let mut tree = DomTree::new();
    let ghost = NodeId::NONE;

    assert_eq!(tree.parent(ghost), None);
    assert_eq!(tree.children(ghost).count(), 0);
    assert_eq!(tree.text_content(ghost), "");
    assert!(!tree.set_attr(ghost, "id", "x"));
    assert_eq!(tree.append_child(tree.root(), ghost), Err(DomError::NotFound(ghost)));
    tree.detach(ghost);
}

#[test]
fn test_document_cannot_be_inserted() {
    let mut doc = Document::default();
    let body = doc.body();
    let root = doc.tree.root();
    assert_eq!(
        doc.tree.append_child(body, root),
        Err(DomError::InvalidNodeType(root))
    );
}

#[test]
fn test_selector_on_non_elements() {
    let mut tree = DomTree::new();
    let text = tree.create_text("plain");
    let any = Selector::parse("*").unwrap();
    assert!(!any.matches(&tree, text));
    assert!(!any.matches(&tree, tree.root()));
}

#[test]
fn test_empty_document_has_no_skeleton() {
    let doc = Document::empty("about:blank");
    assert!(!doc.body().is_valid());
    assert_eq!(doc.title(), "");
    assert_eq!(doc.get_element_by_id("x"), None);
}
