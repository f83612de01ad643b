//! HTTP request handlers.
//!
//! - [`items`]: JSON listing and row update (`/api/*`)
//! - [`forms`]: HTML form posts (`/submit`, `/update`)
//! - [`pages`]: the embedded HTML pages

pub mod forms;
pub mod items;
pub mod pages;
