use thiserror::Error;

#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("invalid identifier: must be non-empty after trimming")]
    EmptyIdentifier,

    #[error("invalid bot token: {0}")]
    InvalidToken(String),

    #[error("invalid action '{0}': expected 'kick' or 'ban'")]
    InvalidAction(String),

    #[error("invalid community id '{0}': must be a numeric snowflake")]
    InvalidCommunityId(String),

    #[error("no username column found: the roster needs a header containing 'username' or 'discord'")]
    NoUsernameColumn,

    #[error("could not read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("run task aborted: {0}")]
    RunAborted(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PurgeError>;
