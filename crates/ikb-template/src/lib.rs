//! Lexer, AST and parser for the IKB template language.
//!
//! Templates mix literal text with brace-delimited constructs:
//!
//! - Tags: `{ikb_section type="hero"}...{/ikb_section}` or `{ikb_image src="a.png" /}`
//! - Namespaced tags: `{core:text}`
//! - Interpolations with filters: `{post.title | truncate:40,end="..." | esc_html}`
//! - Comments: `{!-- never rendered --}`
//! - Header declarations: `{ikb_cms type="drupal" set="views" /}`,
//!   `{ikb_platform type="web" targets="wordpress" version="1.0.0" /}`
//!
//! This crate only builds the located AST. It knows nothing about which
//! components or filters exist; that is the registry's and grammar's job.
//!
//! # Example
//!
//! ```
//! use ikb_template::{AttrValue, parse_template};
//!
//! let doc = parse_template("{ikb_section type=\"hero\" title=\"Welcome\"}").unwrap();
//! let section = doc.children[0].as_tag().unwrap();
//! assert_eq!(section.attr("type"), Some(&AttrValue::Str("hero".to_string())));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    AttrValue, CmsHeader, Comment, Document, Expression, Location, Node, PlatformHeader, Tag,
    Text, UnclosedTag,
};
pub use error::{LexError, ParseError, ParseErrorKind, TemplateError, TemplateResult};
pub use lexer::{Lexer, tokenize};
pub use parser::{
    CMS_HEADER_TAG, MAX_NESTING_DEPTH, PLATFORM_HEADER_TAG, Parser, parse, parse_template,
};
pub use token::{Token, TokenKind, TokenValue};
