use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetError {
    #[error("You already own a pet of kind '{0}'")]
    AlreadyOwned(String),

    #[error("Unknown pet kind: '{0}'")]
    InvalidKind(String),

    #[error("Pet kind '{0}' is disabled")]
    KindDisabled(String),

    #[error("Level {required} required, you are level {current}")]
    LevelTooLow { required: u32, current: u32 },

    #[error("Economy service is not available")]
    EconomyUnavailable,

    #[error("Insufficient funds: ${needed:.2} more needed")]
    InsufficientFunds { needed: f64 },

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Payment verification failed: balance did not decrease")]
    PaymentVerificationFailed,

    #[error("Revival window expired")]
    RevivalWindowExpired,

    #[error("A pet is already spawned")]
    AlreadySpawned,

    #[error("Pet '{0}' not found")]
    PetNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Host error: {0}")]
    Host(String),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, PetError>;

impl<T> From<std::sync::PoisonError<T>> for PetError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
