use thiserror::Error;

/// Engine-wide error type.
///
/// Variants fall into four kinds: input validation, authorization,
/// state consistency, and suspension. Every rejected operation surfaces
/// synchronously with one of these; there are no silent retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("deposits are suspended")]
    DepositsSuspended,

    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u64, available: u64 },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("division by zero")]
    DivideByZero,

    #[error("unauthorized")]
    Unauthorized,

    #[error("experience multiplier must be greater than zero")]
    ZeroMultiplier,

    #[error("invalid level thresholds: {0}")]
    InvalidThresholds(&'static str),

    #[error("achievement already granted")]
    AlreadyGranted,

    #[error("achievements are non-transferable")]
    TransferForbidden,

    #[error("snapshot {0} not found")]
    SnapshotNotFound(u64),

    #[error("too many snapshot entries: {provided} provided, max {max}")]
    TooManyEntries { provided: usize, max: usize },
}

impl EngineError {
    /// Stable numeric code for read-side consumers and logs.
    pub fn code(&self) -> u32 {
        match self {
            EngineError::ZeroAmount => 0,
            EngineError::DepositsSuspended => 1,
            EngineError::InsufficientShares { .. } => 2,
            EngineError::ArithmeticOverflow => 3,
            EngineError::DivideByZero => 4,
            EngineError::Unauthorized => 5,
            EngineError::ZeroMultiplier => 6,
            EngineError::InvalidThresholds(_) => 7,
            EngineError::AlreadyGranted => 8,
            EngineError::TransferForbidden => 9,
            EngineError::SnapshotNotFound(_) => 10,
            EngineError::TooManyEntries { .. } => 11,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
