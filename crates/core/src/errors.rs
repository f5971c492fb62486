use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Contention: {0}")]
    Contention(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    /// Whether the caller may retry the same request unchanged.
    /// Only lock/transaction timeouts qualify; a capacity rejection is
    /// definitive until some other party releases.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Contention(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
