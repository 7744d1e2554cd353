use thiserror::Error;

#[derive(Error, Debug)]
pub enum VigilError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}
