//! Inbound query validation.

mod validator;

pub use validator::{invalid_query_message, validate, SearchQuery};
