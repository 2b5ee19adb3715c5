//! # MarkupKit HTML
//!
//! Lenient markup parser for MarkupKit.
//!
//! This crate provides a tokenizer and tree builder that work together
//! to turn markup text into a tree via a sink interface. The default sink
//! produces a forest of [`Record`]s; callers that want their own tree can
//! implement [`TreeSink`] and use [`parse_with`].

pub mod entities;
pub mod record;
pub mod tokenizer;
pub mod tree_builder;

pub use record::{Record, RecordSink, DOCTYPE_NAME};
pub use tokenizer::{Attributes, Token};

use markupkit_common::MarkupKitError;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),

    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

impl From<ParseError> for MarkupKitError {
    fn from(err: ParseError) -> Self {
        MarkupKitError::parse(err.to_string())
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Trait for receiving parse events and building a tree structure.
///
/// The tree builder guarantees balanced calls: every `start_element` is
/// followed by exactly one `end_element`, void and self-closed elements
/// immediately.
pub trait TreeSink {
    /// Called when a doctype declaration is encountered.
    fn doctype(&mut self, name: String);

    /// Called when a start tag is encountered.
    fn start_element(&mut self, name: String, attrs: Attributes, self_closing: bool);

    /// Called when an element is closed, explicitly or implicitly.
    fn end_element(&mut self, name: String);

    /// Called when text content is encountered.
    fn text(&mut self, data: String);

    /// Called when a comment is encountered.
    fn comment(&mut self, data: String);
}

/// Parse markup into the provided sink.
pub fn parse_with<S: TreeSink>(html: &str, sink: S) -> ParseResult<S> {
    let tokens = tokenizer::tokenize(html)?;
    debug!(input_len = html.len(), tokens = tokens.len(), "tokenized markup");
    tree_builder::build_tree(tokens, sink)
}

/// Parse markup into a forest of records.
pub fn parse(html: &str) -> ParseResult<Vec<Record>> {
    let records = parse_with(html, RecordSink::new())?.finish();
    debug!(roots = records.len(), "parsed markup");
    Ok(records)
}

/// Parse UTF-8 encoded markup into a forest of records.
pub fn parse_bytes(html: &[u8]) -> ParseResult<Vec<Record>> {
    parse(std::str::from_utf8(html)?)
}
