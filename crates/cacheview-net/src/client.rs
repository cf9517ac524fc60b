use std::time::Duration;

use cacheview_core::config::NetworkConfig;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::error::FetchError;

/// Build the shared HTTP client from `[network]` settings.
pub fn build_client(config: &NetworkConfig) -> Result<Client, FetchError> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(Policy::limited(config.max_redirects))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()?;
    Ok(client)
}
