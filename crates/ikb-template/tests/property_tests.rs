//! Property tests for the lexer and parser.

use ikb_template::{AttrValue, Node, TokenKind, TokenValue, parse_template, tokenize};
use proptest::prelude::*;

proptest! {
    #[test]
    fn text_without_braces_is_one_token(text in "[^{}]{1,200}") {
        let tokens = tokenize(&text).unwrap();
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(tokens[0].kind, TokenKind::Text);
        prop_assert_eq!(tokens[0].text(), text.as_str());
        prop_assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn tokenize_never_panics(input in "\\PC{0,200}") {
        let _ = tokenize(&input);
    }

    #[test]
    fn parse_never_panics(input in "[{}/a-c =\"|:,0-9.!-]{0,80}") {
        let _ = parse_template(&input);
    }

    #[test]
    fn integers_round_trip(n in any::<i64>()) {
        let tokens = tokenize(&format!("{{x n={} /}}", n)).unwrap();
        prop_assert_eq!(&tokens[4].value, &TokenValue::Int(n));
    }

    #[test]
    fn strings_round_trip(s in "\\PC{0,40}") {
        let quoted = serde_json::Value::String(s.clone()).to_string();
        let doc = parse_template(&format!("{{x v={} /}}", quoted)).unwrap();
        let tag = doc.children[0].as_tag().unwrap();
        let expected = AttrValue::Str(s);
        prop_assert_eq!(tag.attr("v"), Some(&expected));
    }

    #[test]
    fn sibling_tags_keep_order(names in prop::collection::vec("[a-z][a-z_]{0,8}", 1..8)) {
        let names: Vec<String> = names
            .into_iter()
            .filter(|n| !matches!(n.as_str(), "true" | "false" | "null" | "ikb_cms" | "ikb_platform"))
            .collect();
        let source: String = names.iter().map(|n| format!("{{{} /}}", n)).collect();
        let doc = parse_template(&source).unwrap();
        let parsed: Vec<String> = doc
            .children
            .iter()
            .filter_map(Node::as_tag)
            .map(|t| t.name.clone())
            .collect();
        prop_assert_eq!(parsed, names);
    }
}
