//! Compilation pipeline for IKB templates
//!
//! This crate ties the lexer, parser, registry and grammar together into a
//! single `compile` call that CMS renderers consume.
//!
//! # Architecture
//!
//! - [`CompilerOptions`] - Profile, CMS, platform and security mode
//! - [`Compiler`] - Holds a registry snapshot and a grammar bound to it
//! - [`CompiledDocument`] - The normalized AST plus [`CompilationMetadata`]
//!
//! # Example
//!
//! ```
//! use ikb_compiler::{Compiler, CompilerOptions};
//!
//! let compiler = Compiler::new(CompilerOptions::default()).unwrap();
//! let compiled = compiler
//!     .compile(r#"{ikb_section type="hero" title="Welcome"}{/ikb_section}"#)
//!     .unwrap();
//!
//! assert!(compiled.is_renderable());
//! ```

pub mod compiler;
pub mod document;
pub mod error;
pub mod options;

pub use compiler::Compiler;
pub use document::{CompilationMetadata, CompiledDocument};
pub use error::{CompileError, CompileResult};
pub use options::CompilerOptions;
