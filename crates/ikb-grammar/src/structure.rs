// Structural checks: root kind, tag and attribute names, reserved words

use ikb_error_reporting::{ValidationError, ValidationResult, codes};
use ikb_template::{Document, Node, Tag};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::locate;

/// Words that cannot be used as tag or attribute names. Renderers compile
/// templates into host-language code where these are keywords.
pub const RESERVED_WORDS: &[&str] = &[
    "if", "else", "elseif", "endif", "for", "foreach", "endfor", "while", "endwhile", "break",
    "continue", "return", "function", "import", "include", "extends", "macro", "yield", "this",
    "self",
];

static TAG_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*(:[A-Za-z_][A-Za-z0-9_-]*)?$").expect("valid tag name regex")
});

static ATTR_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid attribute name regex"));

pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

pub fn is_valid_tag_name(name: &str) -> bool {
    TAG_NAME_RE.is_match(name)
}

pub fn is_valid_attribute_name(name: &str) -> bool {
    ATTR_NAME_RE.is_match(name)
}

/// Check the root kind and every tag name and attribute name in the tree.
pub fn check_structure(root: &Node, result: &mut ValidationResult) {
    if let Node::Document(doc) = root {
        check_document(doc, result);
    } else {
        let loc = root.loc();
        result.push(
            ValidationError::error(
                codes::INVALID_ROOT,
                format!("Template root must be a document, found {}", root.kind()),
            )
            .at(loc.line, loc.column, loc.offset),
        );
        visit(std::slice::from_ref(root), result);
    }
}

/// Check every tag name and attribute name below a document.
pub fn check_document(doc: &Document, result: &mut ValidationResult) {
    visit(&doc.children, result);
}

/// Pre-order over `nodes` and their descendants.
fn visit(nodes: &[Node], result: &mut ValidationResult) {
    let mut levels = vec![nodes.iter()];
    while let Some(level) = levels.last_mut() {
        let Some(node) = level.next() else {
            levels.pop();
            continue;
        };
        if let Node::Tag(tag) = node {
            check_tag_names(tag, result);
        }
        levels.push(node.children().iter());
    }
}

fn check_tag_names(tag: &Tag, result: &mut ValidationResult) {
    let start = result.len();

    let local = tag.name.rsplit(':').next().unwrap_or(&tag.name);
    if !is_valid_tag_name(&tag.name) {
        result
            .error(codes::INVALID_TAG_NAME, format!("Invalid tag name '{}'", tag.name))
            .node_name = Some(tag.name.clone());
    } else if is_reserved(local) {
        result
            .error(
                codes::RESERVED_WORD,
                format!("'{}' is a reserved word and cannot be used as a tag name", local),
            )
            .node_name = Some(tag.name.clone());
    }

    for name in tag.attrs.keys() {
        let finding = if !is_valid_attribute_name(name) {
            ValidationError::error(
                codes::INVALID_ATTRIBUTE_NAME,
                format!("Invalid attribute name '{}' on '{}'", name, tag.name),
            )
        } else if is_reserved(name) {
            ValidationError::error(
                codes::RESERVED_WORD,
                format!(
                    "'{}' is a reserved word and cannot be used as an attribute name",
                    name
                ),
            )
        } else {
            continue;
        };
        result.push(finding.with_node("attribute", name.clone()));
    }

    for diagnostic in result.errors.iter_mut().skip(start) {
        if diagnostic.node_kind.is_none() {
            diagnostic.node_kind = Some("tag".to_string());
        }
    }
    locate(result, start, tag.loc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ikb_template::{Location, Text, parse_template};
    use pretty_assertions::assert_eq;

    fn check(source: &str) -> ValidationResult {
        let doc = parse_template(source).unwrap();
        let mut result = ValidationResult::new();
        check_structure(&Node::Document(doc), &mut result);
        result
    }

    fn codes_of(result: &ValidationResult) -> Vec<&str> {
        result.iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn test_root_must_be_document() {
        let text = Node::Text(Text {
            value: "hi".to_string(),
            loc: Location::new(1, 1, 0),
        });
        let mut result = ValidationResult::new();
        check_structure(&text, &mut result);
        assert_eq!(codes_of(&result), vec![codes::INVALID_ROOT]);
    }

    #[test]
    fn test_valid_names() {
        assert!(check(r#"{ikb_section data-x="1"}{core:text /}{/ikb_section}"#).is_empty());
    }

    #[test]
    fn test_reserved_tag_name() {
        let result = check("{if}{/if}");
        assert_eq!(codes_of(&result), vec![codes::RESERVED_WORD]);
        let result = check("{core:for /}");
        assert_eq!(codes_of(&result), vec![codes::RESERVED_WORD]);
    }

    #[test]
    fn test_reserved_attribute_name() {
        let result = check(r#"{ikb_section while="x"}{/ikb_section}"#);
        assert_eq!(codes_of(&result), vec![codes::RESERVED_WORD]);
        assert_eq!(result.iter().next().unwrap().node_name.as_deref(), Some("while"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_tag_name("9lives"));
        assert!(!is_valid_tag_name("a:b:c"));
        assert!(!is_valid_tag_name("a.b"));
        assert!(is_valid_tag_name("core:text"));
        assert!(!is_valid_attribute_name("ns:attr"));
        assert!(!is_valid_attribute_name("-x"));
    }

    #[test]
    fn test_nested_tags_are_visited() {
        let result = check("{ikb_section}{ikb_grid}{return /}{/ikb_grid}{/ikb_section}");
        assert_eq!(codes_of(&result), vec![codes::RESERVED_WORD]);
        assert_eq!(result.iter().next().unwrap().line, Some(1));
        assert_eq!(result.iter().next().unwrap().column, Some(24));
    }
}
