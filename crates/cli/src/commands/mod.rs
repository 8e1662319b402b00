//! CLI subcommands.

pub mod me;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read the database URL, preferring `FREE_ADS_DATABASE_URL` over `DATABASE_URL`.
fn database_url() -> Option<SecretString> {
    std::env::var("FREE_ADS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
