use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid API base URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),
}
