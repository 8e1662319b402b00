//! Business logic services for the API.
//!
//! # Services
//!
//! - `photos` - Photo lifecycle: upload, set-main and delete under the
//!   one-main-photo rule

pub mod photos;

pub use photos::{PhotoError, PhotoManager, PhotoOperation, PhotoUpload, ensure_caller};
