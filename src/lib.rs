//! Section-based content editing core for the folio blog.
//!
//! Stored post bodies are HTML strings in which code blocks are embedded as
//! `<pre>` elements. The [`application::codec`] module turns such a body into
//! an ordered list of text and code sections and back, the
//! [`application::editor`] module mutates that list, and the remaining
//! modules derive what is shown to readers and stored alongside a post.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
