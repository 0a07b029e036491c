//! Composition and rendering tests for fos-shadow
//!
//! Builds small documents through `ComposedDocument` and checks the live tree
//! after each flush.

use fos_shadow::{ComposedDocument, LiveTree, MemoryLiveTree, NodeId};

type Doc = ComposedDocument<MemoryLiveTree>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Host element in the document with the given light children
fn host(doc: &mut Doc, tag: &str, children: &[NodeId]) -> NodeId {
    let host = doc.create_element(tag);
    let root = doc.tree().root();
    doc.append_child(root, host).unwrap();
    for &child in children {
        doc.append_child(host, child).unwrap();
    }
    host
}

fn content(doc: &mut Doc, select: Option<&str>) -> NodeId {
    let point = doc.create_element("content");
    if let Some(select) = select {
        doc.set_attribute(point, "select", select).unwrap();
    }
    point
}

fn elements(doc: &mut Doc, tags: &[&str]) -> Vec<NodeId> {
    tags.iter().map(|tag| doc.create_element(tag)).collect()
}

fn dump(doc: &Doc, node: NodeId) -> String {
    doc.live().dump(doc.tree(), node)
}

#[test]
fn test_distribution_completeness() {
    init_tracing();
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a", "b", "c"]);
    let host = host(&mut doc, "x-host", &kids);
    let root = doc.attach_shadow(host).unwrap();
    let point = content(&mut doc, None);
    doc.append_child(root, point).unwrap();

    assert_eq!(doc.distributed_nodes(point).unwrap(), kids);
    assert_eq!(doc.live().children_of(host), kids.as_slice());
}

#[test]
fn test_second_render_is_a_no_op() {
    init_tracing();
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a", "b"]);
    let host = host(&mut doc, "x-host", &kids);
    let root = doc.attach_shadow(host).unwrap();
    let wrapper = doc.create_element("div");
    let point = content(&mut doc, None);
    doc.append_child(root, wrapper).unwrap();
    doc.append_child(wrapper, point).unwrap();
    doc.flush().unwrap();
    doc.live().reset_stats();

    // Clean engine: nothing is even composed
    assert_eq!(doc.render(host).unwrap(), 0);

    // Dirty engine, unchanged tree: composed again, no live mutation
    assert!(doc.invalidate(host));
    assert_eq!(doc.flush().unwrap(), 1);
    assert_eq!(doc.live().stats().mutations(), 0);
    assert_eq!(dump(&doc, host), "x-host\n  div\n    a\n    b\n");
}

#[test]
fn test_fallback_content() {
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["span"]);
    let host = host(&mut doc, "x-host", &kids);
    let root = doc.attach_shadow(host).unwrap();
    let point = content(&mut doc, Some("div"));
    let fallback = doc.create_element("p");
    doc.append_child(root, point).unwrap();
    doc.append_child(point, fallback).unwrap();

    assert!(doc.distributed_nodes(point).unwrap().is_empty());
    assert_eq!(doc.live().children_of(host), &[fallback]);

    // A matching node replaces the fallback
    let div = doc.create_element("div");
    doc.append_child(host, div).unwrap();
    doc.flush().unwrap();
    assert_eq!(doc.live().children_of(host), &[div]);
    assert_eq!(doc.live().parent(fallback), None);
}

#[test]
fn test_fallback_children_are_watched() {
    let mut doc = Doc::default();
    let host = host(&mut doc, "x-host", &[]);
    let root = doc.attach_shadow(host).unwrap();
    let point = content(&mut doc, None);
    doc.append_child(root, point).unwrap();
    doc.flush().unwrap();

    let fallback = doc.create_text("empty");
    doc.append_child(point, fallback).unwrap();
    assert!(doc.renderer().is_dirty(host));
    doc.flush().unwrap();
    assert_eq!(dump(&doc, host), "x-host\n  \"empty\"\n");
}

#[test]
fn test_shadow_root_chaining() {
    init_tracing();
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a", "b"]);
    let host = host(&mut doc, "x-host", &kids);

    let older = doc.attach_shadow(host).unwrap();
    let section = doc.create_element("section");
    let point = content(&mut doc, None);
    let older_shadow = doc.create_element("shadow");
    doc.append_child(older, section).unwrap();
    doc.append_child(section, point).unwrap();
    doc.append_child(older, older_shadow).unwrap();
    doc.flush().unwrap();
    let before = dump(&doc, host);
    assert_eq!(before, "x-host\n  section\n    a\n    b\n");

    let newer = doc.attach_shadow(host).unwrap();
    let newer_shadow = doc.create_element("shadow");
    doc.append_child(newer, newer_shadow).unwrap();
    doc.live().reset_stats();
    doc.flush().unwrap();

    assert_eq!(dump(&doc, host), before);
    assert_eq!(doc.live().stats().mutations(), 0);
    assert_eq!(doc.distributed_nodes(newer_shadow).unwrap(), kids);
    assert_eq!(doc.distributed_nodes(point).unwrap(), kids);
}

#[test]
fn test_older_root_receives_leftovers() {
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a", "b"]);
    let host = host(&mut doc, "x-host", &kids);

    let older = doc.attach_shadow(host).unwrap();
    let older_point = content(&mut doc, None);
    doc.append_child(older, older_point).unwrap();

    let newer = doc.attach_shadow(host).unwrap();
    let first = content(&mut doc, Some("b"));
    let shadow = doc.create_element("shadow");
    doc.append_child(newer, first).unwrap();
    doc.append_child(newer, shadow).unwrap();
    doc.flush().unwrap();

    assert_eq!(doc.live().children_of(host), &[kids[1], kids[0]]);
    assert_eq!(doc.distributed_nodes(older_point).unwrap(), vec![kids[0]]);
}

#[test]
fn test_clean_nested_host_is_skipped() {
    init_tracing();
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a"]);
    let outer = host(&mut doc, "x-outer", &kids);
    let outer_root = doc.attach_shadow(outer).unwrap();
    let outer_point = content(&mut doc, None);
    let inner = doc.create_element("x-inner");
    let inner_child = doc.create_text("light");
    doc.append_child(outer_root, outer_point).unwrap();
    doc.append_child(outer_root, inner).unwrap();
    doc.append_child(inner, inner_child).unwrap();

    let inner_root = doc.attach_shadow(inner).unwrap();
    let wrapper = doc.create_element("div");
    let inner_point = content(&mut doc, None);
    doc.append_child(inner_root, wrapper).unwrap();
    doc.append_child(wrapper, inner_point).unwrap();
    doc.flush().unwrap();
    assert_eq!(
        dump(&doc, outer),
        "x-outer\n  a\n  x-inner\n    div\n      \"light\"\n"
    );

    // Re-render the outer host only
    let b = doc.create_element("b");
    doc.append_child(outer, b).unwrap();
    doc.live().reset_stats();
    doc.flush().unwrap();

    assert_eq!(doc.live().children_of(outer), &[kids[0], b, inner]);
    assert_eq!(doc.live().snapshot_count(outer), 1);
    assert_eq!(doc.live().snapshot_count(inner), 0);
    assert_eq!(doc.live().snapshot_count(wrapper), 0);
}

#[test]
fn test_reprojected_content_follows_outer_host() {
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["x", "y"]);
    let outer = host(&mut doc, "x-outer", &kids);
    let outer_root = doc.attach_shadow(outer).unwrap();
    let inner = doc.create_element("x-inner");
    let reprojection = content(&mut doc, Some("x"));
    doc.append_child(outer_root, inner).unwrap();
    doc.append_child(inner, reprojection).unwrap();

    let inner_root = doc.attach_shadow(inner).unwrap();
    let section = doc.create_element("section");
    let inner_point = content(&mut doc, None);
    doc.append_child(inner_root, section).unwrap();
    doc.append_child(section, inner_point).unwrap();
    doc.flush().unwrap();
    assert_eq!(doc.live().children_of(section), &[kids[0]]);

    // Only the outer host sees the new child; the inner one must follow
    let x2 = doc.create_element("x");
    doc.append_child(outer, x2).unwrap();
    assert!(!doc.renderer().is_dirty(inner));
    doc.flush().unwrap();

    assert_eq!(doc.live().children_of(section), &[kids[0], x2]);
    assert_eq!(doc.live().parent(kids[1]), None);
    assert!(!doc.renderer().is_dirty(inner));
}

#[test]
fn test_deeply_reprojected_content_follows_outer_host() {
    init_tracing();
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a"]);
    let outer = host(&mut doc, "x-outer", &kids);
    let outer_root = doc.attach_shadow(outer).unwrap();
    let inner = doc.create_element("x-inner");
    let div = doc.create_element("div");
    let reprojection = content(&mut doc, None);
    doc.append_child(outer_root, inner).unwrap();
    doc.append_child(inner, div).unwrap();
    doc.append_child(div, reprojection).unwrap();

    let inner_root = doc.attach_shadow(inner).unwrap();
    let inner_point = content(&mut doc, None);
    doc.append_child(inner_root, inner_point).unwrap();
    doc.flush().unwrap();
    assert_eq!(doc.live().children_of(div), &[kids[0]]);

    // The insertion point sits below a light child of the nested host
    let b = doc.create_element("b");
    doc.append_child(outer, b).unwrap();
    assert!(!doc.renderer().is_dirty(inner));
    doc.flush().unwrap();

    assert_eq!(doc.distributed_nodes(reprojection).unwrap(), vec![kids[0], b]);
    assert_eq!(doc.live().children_of(div), &[kids[0], b]);
    assert_eq!(
        dump(&doc, outer),
        "x-outer\n  x-inner\n    div\n      a\n      b\n"
    );
}

#[test]
fn test_attribute_change_reaches_reprojecting_host() {
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a"]);
    let outer = host(&mut doc, "x-outer", &kids);
    let outer_root = doc.attach_shadow(outer).unwrap();
    let inner = doc.create_element("x-inner");
    let reprojection = content(&mut doc, None);
    doc.append_child(outer_root, inner).unwrap();
    doc.append_child(inner, reprojection).unwrap();

    let inner_root = doc.attach_shadow(inner).unwrap();
    let picky = content(&mut doc, Some(".on"));
    doc.append_child(inner_root, picky).unwrap();
    doc.flush().unwrap();
    assert!(doc.live().children_of(inner).is_empty());
    assert_eq!(doc.renderer().owner_of(kids[0]), None);

    // Unmatched and unrendered, yet the nested host pools it
    assert!(doc.set_attribute(kids[0], "class", "on").unwrap());
    assert!(doc.renderer().is_dirty(inner));
    assert!(!doc.renderer().is_dirty(outer));
    doc.flush().unwrap();
    assert_eq!(doc.live().children_of(inner), &[kids[0]]);
}

#[test]
fn test_removed_insertion_point_is_forgotten() {
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a", "b"]);
    let host = host(&mut doc, "x-host", &kids);
    let root = doc.attach_shadow(host).unwrap();
    let first = content(&mut doc, Some("a"));
    let rest = content(&mut doc, None);
    doc.append_child(root, first).unwrap();
    doc.append_child(root, rest).unwrap();
    assert_eq!(doc.distributed_nodes(first).unwrap(), vec![kids[0]]);

    doc.remove_child(root, first).unwrap();
    assert_eq!(doc.distributed_nodes(rest).unwrap(), kids);
    assert!(doc.distributed_nodes(first).unwrap().is_empty());
    assert_eq!(doc.renderer().distributions().len(), 1);
    assert_eq!(doc.live().children_of(host), kids.as_slice());
}

#[test]
fn test_removed_and_unmatched_children_scenario() {
    init_tracing();
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["x", "y"]);
    let (x, y) = (kids[0], kids[1]);
    let h = host(&mut doc, "x-host", &kids);
    let root = doc.attach_shadow(h).unwrap();
    let div = doc.create_element("div");
    let point = content(&mut doc, Some("y"));
    doc.append_child(root, div).unwrap();
    doc.append_child(div, point).unwrap();
    doc.flush().unwrap();

    assert_eq!(dump(&doc, h), "x-host\n  div\n    y\n");
    assert_eq!(doc.live().parent(x), None);

    doc.remove_child(h, y).unwrap();
    let more = elements(&mut doc, &["z", "w"]);
    for &node in &more {
        doc.append_child(h, node).unwrap();
    }
    doc.flush().unwrap();

    assert_eq!(dump(&doc, h), "x-host\n  div\n");
    assert_eq!(doc.live().parent(y), None);
}

#[test]
fn test_attribute_dependency_invalidation() {
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["li", "li"]);
    doc.set_attribute(kids[0], "data-slot", "side").unwrap();
    let host = host(&mut doc, "x-list", &kids);
    let root = doc.attach_shadow(host).unwrap();
    let main = content(&mut doc, Some("[data-slot=main]"));
    doc.append_child(root, main).unwrap();
    doc.flush().unwrap();
    assert!(doc.live().children_of(host).is_empty());

    assert!(!doc.set_attribute(kids[0], "title", "ignored").unwrap());
    assert!(doc.renderer().scheduler().pending().is_empty());

    assert!(doc.set_attribute(kids[0], "data-slot", "main").unwrap());
    assert_eq!(doc.distributed_nodes(main).unwrap(), vec![kids[0]]);
    assert_eq!(doc.live().children_of(host), &[kids[0]]);

    assert!(doc.remove_attribute(kids[0], "data-slot").unwrap());
    doc.flush().unwrap();
    assert!(doc.live().children_of(host).is_empty());
}

#[test]
fn test_malformed_select_matches_nothing() {
    let mut doc = Doc::default();
    let kids = elements(&mut doc, &["a"]);
    let host = host(&mut doc, "x-host", &kids);
    let root = doc.attach_shadow(host).unwrap();
    let broken = content(&mut doc, Some("a > b"));
    let rest = content(&mut doc, None);
    doc.append_child(root, broken).unwrap();
    doc.append_child(root, rest).unwrap();

    assert!(doc.distributed_nodes(broken).unwrap().is_empty());
    assert_eq!(doc.distributed_nodes(rest).unwrap(), kids);
}

#[test]
fn test_removed_host_is_forgotten() {
    let mut doc = Doc::default();
    let host = host(&mut doc, "x-host", &[]);
    doc.attach_shadow(host).unwrap();
    doc.flush().unwrap();

    let root = doc.tree().root();
    doc.remove_child(root, host).unwrap();
    assert!(doc.remove_host(host));
    assert!(!doc.invalidate(host));
    assert_eq!(doc.renderer().engine_count(), 0);
}
