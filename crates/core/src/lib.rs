//! Free Ads Core - Shared domain types.
//!
//! This crate provides the types shared by the Free Ads components:
//! - `api` - The HTTP service managing classified ad photos
//! - `cli` - Command-line tools for migrations, seeding and the current-user resolver
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no I/O, no database access,
//! no HTTP clients. The main-photo rules live on [`ClassifiedAd`] so every
//! store implementation and the photo service agree on them.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, users, classified ads and photos

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
