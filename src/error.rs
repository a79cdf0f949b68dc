use thiserror::Error;

/// Domain rule violations raised by ledger operations.
///
/// Storage and transport problems never surface through this type; those are
/// logged and degrade to the last known state instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FundError {
    #[error("person name cannot be empty")]
    EmptyName,
    #[error("expense description cannot be empty")]
    EmptyDescription,
    #[error("invalid amount {0}: must be a finite number")]
    InvalidAmount(f64),
    #[error("invalid payment {0}: must be greater than zero")]
    NonPositivePayment(f64),
    #[error("no person with id {0}")]
    UnknownPerson(String),
    #[error("no expense with id {0}")]
    UnknownExpense(String),
    #[error("ledger is not started yet")]
    NotStarted,
    #[error("ledger is detached; no further changes are accepted")]
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundWarnCode {
    StoreWriteFailed,
    StoreReadCorrupt,
    StoreWatchFailed,
    RemoteSubscribeFailed,
    RemoteListenFailed,
    RemoteWriteFailed,
    RemoteDocumentMalformed,
    SettingsCorrupt,
    GeneratorFailed,
}

impl FundWarnCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StoreWriteFailed => "W001_STORE_WRITE_FAILED",
            Self::StoreReadCorrupt => "W002_STORE_READ_CORRUPT",
            Self::StoreWatchFailed => "W003_STORE_WATCH_FAILED",
            Self::RemoteSubscribeFailed => "W004_REMOTE_SUBSCRIBE_FAILED",
            Self::RemoteListenFailed => "W005_REMOTE_LISTEN_FAILED",
            Self::RemoteWriteFailed => "W006_REMOTE_WRITE_FAILED",
            Self::RemoteDocumentMalformed => "W007_REMOTE_DOCUMENT_MALFORMED",
            Self::SettingsCorrupt => "W008_SETTINGS_CORRUPT",
            Self::GeneratorFailed => "W009_GENERATOR_FAILED",
        }
    }
}
