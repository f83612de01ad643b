//! Request and response models.
//!
//! - [`items`]: JSON listing and row update
//! - [`forms`]: URL-encoded submissions from the HTML pages

pub mod forms;
pub mod items;
