//! # rgq - structured queries over ripgrep
//!
//! rgq translates a small boolean query language into a single ripgrep
//! invocation, optionally scoped to repositories found under a set of
//! workspace roots.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`query`] - Query parsing, predicate tree and simplification
//! - [`compile`] - Predicate → ripgrep arguments (case, pattern, globs)
//! - [`workspace`] - Repository discovery and `repo:` resolution
//! - [`plan`] - Decides between searching, listing repositories or giving up
//! - [`runner`] - Spawns ripgrep and maps its exit status
//! - [`output`] - Repository listings, suggestions and JSON plans
//! - [`config`] - User configuration and workspace roots
//!
//! ## Quick Start
//!
//! ```
//! use rgq::compile::compile;
//! use rgq::query::parse_query;
//!
//! let query = parse_query("foo bar -f:test").unwrap();
//! let invocation = compile(&query).unwrap();
//! assert_eq!(invocation.args(), ["--iglob", "!*test*", "-i", "-e", "foo.*?bar"]);
//! ```
//!
//! Queries with `repo:` atoms are evaluated once per discovered repository;
//! see [`plan::plan`].

pub mod compile;
pub mod config;
pub mod error;
pub mod output;
pub mod plan;
pub mod query;
pub mod runner;
pub mod workspace;

pub use error::{Error, Result};
