//! JSON Feed output.
//!
//! `FeedAssembler` turns a catalog response into a JSON Feed 1.1 document,
//! passing every item body through an `HtmlSanitizer`.

mod assembler;
mod sanitize;
mod types;

pub use assembler::FeedAssembler;
pub use sanitize::{AllowListSanitizer, HtmlSanitizer};
pub use types::*;
