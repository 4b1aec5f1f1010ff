//! The library code for `folio`, the article backend of a personal blog.
//! Articles are markdown files in a single directory, each with an optional
//! YAML front-matter block. The work breaks down into two steps:
//!
//! 1. Reading and parsing article files ([`crate::frontmatter`]) and scanning
//!    their bodies for structure ([`crate::markdown`])
//! 2. Deriving listings and article pages from them ([`crate::store`])
//!
//! A listing is a set of [`ArticleSummary`] values sorted newest first. An
//! article page is an [`ArticleDetail`]: the body without its title line plus
//! a table of contents built from its level 2-4 headings. Both are recomputed
//! from disk on every call.
//!
//! [`crate::server`] exposes the two operations over HTTP as JSON.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod config;
pub mod date;
pub mod error;
pub mod frontmatter;
pub mod markdown;
pub mod server;
pub mod store;

pub use article::{ArticleDetail, ArticleSummary, Heading};
pub use error::{Error, Result};
pub use store::ArticleStore;
