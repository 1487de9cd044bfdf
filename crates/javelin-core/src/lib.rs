//! Core shared types for Javelin.
//!
//! This crate is intentionally small and nearly dependency-free: the text
//! model, byte-range edits, and a couple of helpers everything else builds on.

mod edit;
mod panic_util;
mod text;

pub use edit::{apply_text_edits, normalize_text_edits, EditError, TextEdit};
pub use panic_util::panic_message;
pub use text::{LineCol, LineIndex, SourceText};
pub use text_size::{TextRange, TextSize};
