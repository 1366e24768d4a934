use thiserror::Error;

// Failures surfaced by the ballot components. None of them is fatal to the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BallotError {
    // Catalog
    #[error("Failed to fetch candidates: {0}")]
    Fetch(String),
    #[error("Unexpected candidate data: {0}")]
    Format(String),

    // Biometric gate
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Verification(String),

    // Submission
    #[error("{0}")]
    Submission(String),
    #[error("There are no votes to submit.")]
    EmptyBatch,

    // Local guards, never reach the network
    #[error("Please select a candidate for {0} before voting.")]
    NoSelection(String),
    #[error("Candidate {candidate} is not running for {position}.")]
    UnknownCandidate { position: String, candidate: String },
    #[error("Please wait for the current action to finish.")]
    Busy,
    #[error("Cannot {0} right now.")]
    InvalidState(&'static str),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not reach {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
