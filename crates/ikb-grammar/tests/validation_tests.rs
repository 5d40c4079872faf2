//! End-to-end checks of the grammar against the built-in registry.

use std::sync::Arc;

use ikb_error_reporting::codes;
use ikb_grammar::{Grammar, SecurityMode, validate_type};
use ikb_registry::{CmsType, Profile, Registry};
use ikb_template::parse_template;
use pretty_assertions::assert_eq;
use serde_json::json;

fn grammar(platform: Option<&str>) -> Grammar {
    let registry = Arc::new(Registry::load(Profile::Full, CmsType::Native).unwrap());
    Grammar::new(registry).with_platform(platform.map(str::to_string))
}

#[test]
fn numeric_coercion() {
    assert!(validate_type(&json!("123"), "integer"));
    assert!(!validate_type(&json!("12.5"), "integer"));
    assert!(!validate_type(&json!("abc"), "number"));
}

#[test]
fn union_types() {
    assert!(!validate_type(&json!(true), "string|number"));
    assert!(validate_type(&json!(123), "string|number"));
}

#[test]
fn filter_platform_gating() {
    let chain = |grammar: &Grammar| {
        let parsed = grammar
            .parse_expression(r#"photo | srcset:sizes="100vw" | escape"#)
            .unwrap();
        grammar.validate_filter_chain_rich(&parsed.filters)
    };

    for allowed in ["web", "amp", "pwa"] {
        let result = chain(&grammar(Some(allowed)));
        assert_eq!(result.error_count(), 0, "platform {}", allowed);
    }

    for denied in ["ios", "android", "electron"] {
        let grammar = grammar(Some(denied));
        let result = chain(&grammar);
        assert!(result.error_count() >= 1, "platform {}", denied);
        assert!(
            result
                .errors_only()
                .any(|e| e.message.contains("not available on platform"))
        );
        let parsed = grammar.parse_expression(r#"photo | srcset:sizes="100vw""#).unwrap();
        assert!(grammar.validate_filter_chain(&parsed.filters).is_err());
    }
}

#[test]
fn leaf_components_reject_children() {
    let grammar = grammar(None);
    let leaves: Vec<String> = grammar
        .registry()
        .list_components()
        .into_iter()
        .filter(|c| c.is_leaf)
        .map(|c| c.name.clone())
        .collect();
    assert!(!leaves.is_empty());

    for child in ["text", "{!-- note --}", "{ikb_text /}", "{page.title | escape}"] {
        for leaf in &leaves {
            let source = format!("{{{leaf}}}{child}{{/{leaf}}}");
            let doc = parse_template(&source).unwrap();
            let tag = doc.children[0].as_tag().unwrap();
            let result = grammar.validate_component_rich(tag);
            assert!(
                result
                    .errors_only()
                    .any(|e| e.message.contains("leaf component")),
                "{}",
                source
            );
            assert!(grammar.validate_component(tag).is_err());
        }
    }
}

#[test]
fn required_props_are_named() {
    let grammar = grammar(None);
    let doc = parse_template("{ikb_link}About{/ikb_link}").unwrap();
    let err = grammar
        .validate_component(doc.children[0].as_tag().unwrap())
        .unwrap_err();
    assert_eq!(err.code, codes::MISSING_REQUIRED_PROP);
    assert!(err.message.contains("href"));
}

#[test]
fn rich_results_collect_everything() {
    let grammar = grammar(None);
    let doc = parse_template(r#"{ikb_image width="wide" loading="soon"}x{/ikb_image}"#).unwrap();
    let tag = doc.children[0].as_tag().unwrap();

    let rich = grammar.validate_component_rich(tag);
    let mut codes: Vec<&str> = rich.iter().map(|e| e.code.as_str()).collect();
    codes.sort_unstable();
    let mut expected = vec![
        codes::MISSING_REQUIRED_PROP,
        codes::LEAF_COMPONENT_CHILDREN,
        codes::INVALID_PROP_TYPE,
        codes::INVALID_ENUM_VALUE,
    ];
    expected.sort_unstable();
    assert_eq!(codes, expected);

    // The plain form reports only the first
    let first = grammar.validate_component(tag).unwrap_err();
    assert_eq!(&first, rich.first_error().unwrap());
}

#[test]
fn security_mode_changes_severity_only() {
    let doc = parse_template("<p>{post.title}</p>").unwrap();
    let mut grammar = grammar(None);

    let strict = grammar.validate_document_rich(&doc);
    assert_eq!((strict.error_count(), strict.warning_count()), (1, 0));

    grammar.set_mode(SecurityMode::Lenient);
    let lenient = grammar.validate_document_rich(&doc);
    assert_eq!((lenient.error_count(), lenient.warning_count()), (0, 1));
    assert_eq!(strict.errors[0].code, lenient.errors[0].code);
}

#[test]
fn grammar_is_shareable_across_threads() {
    let grammar = Arc::new(grammar(None));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let grammar = Arc::clone(&grammar);
            std::thread::spawn(move || {
                for j in 0..25 {
                    let text = format!("item{} | truncate:{} | escape", i, j % 5 + 1);
                    let parsed = grammar.parse_expression(&text).unwrap();
                    assert!(parsed.has_escaping);
                    assert!(grammar.validate_filter_chain(&parsed.filters).is_ok());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(grammar.cached_expressions(), 20);
}
