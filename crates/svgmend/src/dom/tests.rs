use super::*;

#[test]
fn parse_keeps_qualified_names_and_attribute_order() {
    let root = parse(
        r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" id="a" width="100%" viewBox="0 0 10 10"><use xlink:href="#x"/></svg>"##,
    )
    .unwrap();

    assert!(root.name.is(Some(SVG_NAMESPACE), "svg"));
    assert!(root.is_svg_root());
    let keys: Vec<&str> = root.attributes.keys().map(|k| k.local.as_str()).collect();
    assert_eq!(keys, vec!["id", "width", "viewBox"]);
    assert_eq!(root.namespaces.len(), 2);

    let use_el = &root.children[0];
    assert!(use_el.name.is(Some(SVG_NAMESPACE), "use"));
    assert!(use_el.namespaces.is_empty());
    assert_eq!(
        use_el
            .attributes
            .get(&QName::new(Some("http://www.w3.org/1999/xlink"), "href"))
            .map(String::as_str),
        Some("#x")
    );
}

#[test]
fn parse_splits_text_and_tail() {
    let root = parse("<p>one<b>two</b>three<br/>four</p>").unwrap();
    assert_eq!(root.text.as_deref(), Some("one"));
    assert_eq!(root.children[0].text.as_deref(), Some("two"));
    assert_eq!(root.children[0].tail.as_deref(), Some("three"));
    assert_eq!(root.children[1].text, None);
    assert_eq!(root.children[1].tail.as_deref(), Some("four"));
}

#[test]
fn parse_keeps_comments_and_processing_instructions_as_nodes() {
    let root = parse("<p>a<!-- note -->b<?render fast?></p>").unwrap();
    assert_eq!(root.text.as_deref(), Some("a"));
    assert_eq!(root.children.len(), 2);

    let comment = &root.children[0];
    assert_eq!(comment.kind, NodeKind::Comment);
    assert!(!comment.is_element());
    assert_eq!(comment.text.as_deref(), Some(" note "));
    assert_eq!(comment.tail.as_deref(), Some("b"));

    assert_eq!(
        root.children[1].kind,
        NodeKind::ProcessingInstruction {
            target: "render".to_string()
        }
    );
    assert_eq!(root.children[1].text.as_deref(), Some("fast"));
}

#[test]
fn serialization_round_trips_comments_and_processing_instructions() {
    let input = r#"<svg xmlns="http://www.w3.org/2000/svg"><!-- legend --><g><?pi?><?app mode="x"?>t</g>
</svg>"#;
    let root = parse(input).unwrap();
    assert_eq!(root.to_xml_string(), input);
}

#[test]
fn any_descendant_ignores_comment_nodes() {
    let root = parse("<a><!-- c --></a>").unwrap();
    assert!(!root.any_descendant(&|e| e.local_name().is_empty()));
}

#[test]
fn root_start_tag_span_points_at_the_document_element() {
    let text = r#"<?xml version="1.0"?><!-- <svg x="1"> --><svg a="1>2" b='>'><svg/></svg>"#;
    let doc = parse_document(text).unwrap();
    assert_eq!(
        &text[doc.root_start_tag.clone()],
        r#"<svg a="1>2" b='>'>"#
    );
    assert_eq!(doc.root.attribute("a"), Some("1>2"));

    let text = "\n<svg\n  width=\"1\"/>\n";
    let doc = parse_document(text).unwrap();
    assert_eq!(&text[doc.root_start_tag], "<svg\n  width=\"1\"/>");
}

#[test]
fn parse_rejects_truncated_input() {
    assert!(parse("<svg><g>").is_err());
}

#[test]
fn opening_tag_emits_declarations_then_attributes() {
    let root = parse(
        r#"<svg id="d" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="10"><g/></svg>"#,
    )
    .unwrap();
    assert_eq!(
        root.opening_tag(),
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" id="d" width="10">"#
    );
}

#[test]
fn opening_tag_escapes_attribute_values() {
    let mut root = Element::new(QName::local("svg"));
    root.set_attribute("aria-label", r#"a < b & "c""#);
    assert_eq!(
        root.opening_tag(),
        r#"<svg aria-label="a &lt; b &amp; &quot;c&quot;">"#
    );
}

#[test]
fn set_attribute_keeps_position_and_remove_shifts() {
    let mut el = Element::new(QName::local("svg"));
    el.set_attribute("width", "100%");
    el.set_attribute("style", "x");
    el.set_attribute("viewBox", "0 0 1 1");
    el.set_attribute("width", "1");
    assert_eq!(el.remove_attribute("style").as_deref(), Some("x"));
    let keys: Vec<&str> = el.attributes.keys().map(|k| k.local.as_str()).collect();
    assert_eq!(keys, vec!["width", "viewBox"]);
    assert_eq!(el.attribute("width"), Some("1"));
}

#[test]
fn serialization_reemits_nested_default_namespace() {
    let input = r#"<svg xmlns="http://www.w3.org/2000/svg"><foreignObject width="10"><div xmlns="http://www.w3.org/1999/xhtml">a<br/>b</div></foreignObject></svg>"#;
    let root = parse(input).unwrap();
    assert_eq!(root.to_xml_string(), input);
}

#[test]
fn serialization_round_trips_prefixed_attributes_and_text() {
    let input = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
  <style>.a &gt; .b { fill: red; }</style>
  <use xlink:href="#m" xml:space="preserve"/>
</svg>"##;
    let root = parse(input).unwrap();
    assert_eq!(root.to_xml_string(), input);
}

#[test]
fn new_elements_inherit_default_namespace_without_declaration() {
    let mut root = parse(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).unwrap();
    let mut text = Element::new(QName::svg("text"));
    text.text = Some("hi".to_string());
    root.children.push(text);
    assert_eq!(
        root.to_xml_string(),
        r#"<svg xmlns="http://www.w3.org/2000/svg"><text>hi</text></svg>"#
    );
}

#[test]
fn unnamespaced_child_under_default_namespace_is_undeclared() {
    let mut root = parse(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).unwrap();
    root.children.push(Element::new(QName::local("plain")));
    assert_eq!(
        root.to_xml_string(),
        r#"<svg xmlns="http://www.w3.org/2000/svg"><plain xmlns=""/></svg>"#
    );
}

#[test]
fn any_descendant_searches_the_whole_subtree() {
    let root = parse("<a><b><c/></b></a>").unwrap();
    assert!(root.any_descendant(&|e| e.local_name() == "c"));
    assert!(!root.any_descendant(&|e| e.local_name() == "a"));
}
