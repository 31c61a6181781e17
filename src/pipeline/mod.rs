//! Pipeline stages for document classification.
//!
//! Each submodule implements exactly one step after text extraction, so each
//! can be tested on its own and the model backend can be swapped without
//! touching budgeting or pricing.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ budget ──▶ llm ──▶ cost
//! (path/URL) (by ext)  (truncate) (chat)  (µ$)
//! ```
//!
//! 1. [`input`]: load the document bytes and filename from disk or a URL
//! 2. [`crate::extract`]: pick the adapter by extension and pull plain text
//! 3. [`budget`]: cut the text so prompt + document fit the context window
//! 4. [`llm`]: the one stage with network I/O, bounded by a timeout
//! 5. [`cost`]: integer microdollar pricing from the reported usage

pub mod budget;
pub mod cost;
pub mod input;
pub mod llm;
