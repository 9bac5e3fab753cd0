//! Review comments for an open design file: fetched from the comments API,
//! normalized, summarized and filtered, with navigation back to the place in
//! the document each comment points at.

pub mod comments;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod format;
pub mod navigation;
pub mod response;
pub mod session;
