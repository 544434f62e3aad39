use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Client is not initialized: {0}")]
    NotInitialized(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Request failed: {0} - {1}")]
    RequestFailed(String, String),

    #[error("Stream interrupted: {0}")]
    Stream(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;
