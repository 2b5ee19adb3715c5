//! # MarkupKit Templates
//!
//! Turns markup text and template files into [`markupkit_dom`] trees.
//!
//! A template is markup with `{{ name }}` placeholders. Values come from
//! [`Slots`], are entity-escaped on the way in and are never rescanned.
//! Executable templates (by file extension) are first evaluated by a
//! [`TemplateHost`].
//!
//! ```ignore
//! let compiler = TemplateCompiler::new();
//! let slots = Slots::new().with("greeting", "Hi & bye");
//! let node = compiler.compile_str("<p>{{greeting}}</p>", &slots, false)?.into_node();
//! ```

pub mod compiler;
pub mod loader;
pub mod materialize;
pub mod slots;

pub use compiler::TemplateCompiler;
pub use loader::{load_template, locate, CommandHost, TemplateHost};
pub use materialize::{is_document, materialize, materialize_record, Materialized};
pub use slots::{find_placeholders, substitute, Placeholder, SlotValue, Slots};
