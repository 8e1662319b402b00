//! Show the profile of the user a token belongs to.
//!
//! # Usage
//!
//! ```bash
//! fa-cli me --api-url http://localhost:5000 --token "$TOKEN"
//! ```

use secrecy::SecretString;
use url::Url;

use crate::resolver::{CurrentUserResolver, HttpUserSource, Resolution};

/// Resolve the current user and print the profile or the fallback.
///
/// # Errors
///
/// Returns an error only if `api_url` is not a valid URL; lookup failures
/// are reported through the printed notification.
pub async fn show(api_url: &str, token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let base_url = Url::parse(api_url)?;
    let source = HttpUserSource::new(base_url, SecretString::from(token.to_string()));

    match CurrentUserResolver::new(source).resolve(token).await {
        Resolution::Resolved(user) => {
            #[allow(clippy::print_stdout)]
            {
                println!("{}", serde_json::to_string_pretty(&user)?);
            }
        }
        Resolution::Redirected { notification, to } => {
            #[allow(clippy::print_stdout)]
            {
                println!("{notification}");
                println!("-> {to}");
            }
        }
    }
    Ok(())
}
