//! HTTP handlers for upload-service.

pub mod upload;

pub use upload::*;
