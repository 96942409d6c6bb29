//! Browser automation abstraction.
//!
//! This module provides an `Automation` trait covering the handful of browser
//! capabilities the login sequence needs (navigate, find elements, read
//! cookies) plus a bounded polling wait built on top of them.

mod chromium;
mod types;

pub use chromium::ChromiumAutomation;
pub use types::*;
