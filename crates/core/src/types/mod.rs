//! Core types for Free Ads.
//!
//! This module provides type-safe wrappers for the marketplace domain.

pub mod classified_ad;
pub mod id;
pub mod photo;
pub mod user;

pub use classified_ad::{ClassifiedAd, PhotoRuleError};
pub use id::*;
pub use photo::{NewPhoto, Photo, PhotoView};
pub use user::User;
