use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store call itself failed (I/O, quota, closed handle...).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Codec error for key '{0}': {1}")]
    Codec(String, String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn codec(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Codec(key.into(), err.to_string())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(format!("I/O error: {err}"))
    }
}
