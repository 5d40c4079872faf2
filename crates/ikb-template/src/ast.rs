//! Template AST types.
//!
//! Every node carries a [`Location`] so later passes can attach source
//! positions to their diagnostics. All types serialize with `serde`; nodes are
//! tagged with a `"type"` field, which is the shape renderers consume.

use indexmap::IndexMap;
use serde::Serialize;

/// Start position of a node or token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Location {
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    /// 0-based byte offset
    pub offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// A node in the template AST.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// The root of a compilation unit
    Document(Document),

    /// Component tag: `{name attr=value}...{/name}` or `{name /}`
    Tag(Tag),

    /// Literal text, passed through unchanged
    Text(Text),

    /// Comment (never rendered): `{!-- ... --}`
    Comment(Comment),

    /// Interpolation site: `{path | filter:args}`
    Expression(Expression),
}

impl Node {
    pub fn loc(&self) -> Location {
        match self {
            Node::Document(_) => Location::new(1, 1, 0),
            Node::Tag(tag) => tag.loc,
            Node::Text(text) => text.loc,
            Node::Comment(comment) => comment.loc,
            Node::Expression(expr) => expr.loc,
        }
    }

    /// Short kind name, as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Document(_) => "document",
            Node::Tag(_) => "tag",
            Node::Text(_) => "text",
            Node::Comment(_) => "comment",
            Node::Expression(_) => "expression",
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Node::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Child nodes, empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document(doc) => &doc.children,
            Node::Tag(tag) => &tag.children,
            _ => &[],
        }
    }
}

/// The root node.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Document {
    pub children: Vec<Node>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cms_header: Option<CmsHeader>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_header: Option<PlatformHeader>,

    /// Tags that were still open at end of input and closed by the parser.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unclosed: Vec<UnclosedTag>,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }

    /// Visit every node below the root, depth-first in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        let mut levels = vec![self.children.iter()];
        while let Some(level) = levels.last_mut() {
            match level.next() {
                Some(node) => {
                    visit(node);
                    levels.push(node.children().iter());
                }
                None => {
                    levels.pop();
                }
            }
        }
    }

    /// Number of nodes below the root.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// All tags in document order.
    pub fn tags(&self) -> Vec<&Tag> {
        let mut tags = Vec::new();
        self.walk(&mut |node| {
            if let Node::Tag(tag) = node {
                tags.push(tag);
            }
        });
        tags
    }

    pub fn is_fully_closed(&self) -> bool {
        self.unclosed.is_empty()
    }
}

/// Component tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    pub attrs: IndexMap<String, AttrValue>,
    pub children: Vec<Node>,
    pub self_closing: bool,
    pub loc: Location,
}

impl Tag {
    pub fn new(name: impl Into<String>, loc: Location) -> Self {
        Self {
            name: name.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
            self_closing: false,
            loc,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub value: String,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub value: String,
    pub loc: Location,
}

/// Interpolation site.
///
/// `raw` is a canonical rendering `path | filter:arg,name=value | filter2`,
/// independent of the whitespace used in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub raw: String,
    pub loc: Location,
}

/// Attribute value.
///
/// Serializes as the plain JSON value, except for expressions which keep
/// their `raw` text and location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Expression(Expression),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, AttrValue::Expression(_))
    }

    /// The value as JSON, or `None` for expressions (only known at render time).
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            AttrValue::Str(s) => serde_json::Value::String(s.clone()),
            AttrValue::Int(n) => serde_json::Value::from(*n),
            AttrValue::Float(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            AttrValue::Bool(b) => serde_json::Value::Bool(*b),
            AttrValue::Null => serde_json::Value::Null,
            AttrValue::Expression(_) => return None,
        })
    }

    /// Convert a JSON value back, as used when applying registry defaults.
    ///
    /// Arrays and objects have no attribute spelling; they are kept as their
    /// JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttrValue::Null,
            serde_json::Value::Bool(b) => AttrValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => AttrValue::Int(i),
                None => AttrValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => AttrValue::Str(s.clone()),
            other => AttrValue::Str(other.to_string()),
        }
    }

    /// Render the value the way a header or plain-text consumer would read it.
    pub fn to_plain_string(&self) -> String {
        match self {
            AttrValue::Str(s) => s.clone(),
            AttrValue::Int(n) => n.to_string(),
            AttrValue::Float(n) => format_float(*n),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Null => "null".to_string(),
            AttrValue::Expression(expr) => expr.raw.clone(),
        }
    }
}

/// Format a float so it reads back as a float (`2` becomes `2.0`).
pub(crate) fn format_float(n: f64) -> String {
    let s = n.to_string();
    if s.contains('.') || !n.is_finite() {
        s
    } else {
        format!("{}.0", s)
    }
}

/// `{ikb_cms type="drupal" set="blocks,views" /}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmsHeader {
    #[serde(rename = "type")]
    pub cms_type: Option<String>,
    pub set: Vec<String>,
    pub loc: Location,
}

/// `{ikb_platform type="web" targets="wordpress,drupal" version="1.0.0" /}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformHeader {
    #[serde(rename = "type")]
    pub platform_type: Option<String>,
    pub targets: Vec<String>,
    pub version: Option<String>,
    pub loc: Location,
}

/// A tag the parser closed at end of input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnclosedTag {
    pub name: String,
    pub loc: Location,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn loc() -> Location {
        Location::new(1, 1, 0)
    }

    fn tag(name: &str, children: Vec<Node>) -> Node {
        let mut tag = Tag::new(name, loc());
        tag.children = children;
        Node::Tag(tag)
    }

    #[test]
    fn test_walk_is_depth_first_in_order() {
        let doc = Document::new(vec![
            tag("a", vec![tag("b", vec![tag("e", vec![])]), tag("c", vec![])]),
            tag("d", vec![]),
        ]);
        let names: Vec<_> = doc.tags().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "e", "c", "d"]);
        assert_eq!(doc.node_count(), 5);
    }

    #[test]
    fn test_node_serializes_with_type_tag() {
        let mut t = Tag::new("ikb_section", Location::new(2, 3, 10));
        t.attrs
            .insert("type".to_string(), AttrValue::Str("hero".to_string()));
        t.attrs.insert("n".to_string(), AttrValue::Int(3));
        let json = serde_json::to_value(Node::Tag(t)).unwrap();
        assert_eq!(json["type"], "tag");
        assert_eq!(json["name"], "ikb_section");
        assert_eq!(json["attrs"]["type"], "hero");
        assert_eq!(json["attrs"]["n"], 3);
        assert_eq!(json["loc"]["line"], 2);
    }

    #[test]
    fn test_attr_json_conversion() {
        assert_eq!(
            AttrValue::Float(1.5).to_json(),
            Some(serde_json::json!(1.5))
        );
        assert_eq!(
            AttrValue::from_json(&serde_json::json!("transparent")),
            AttrValue::Str("transparent".to_string())
        );
        assert_eq!(AttrValue::from_json(&serde_json::json!(4)), AttrValue::Int(4));
        let expr = AttrValue::Expression(Expression {
            raw: "x".to_string(),
            loc: loc(),
        });
        assert_eq!(expr.to_json(), None);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(1.25), "1.25");
        assert_eq!(format_float(-0.5), "-0.5");
    }
}
