use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("setsToPlay must be 1, 3 or 5, found {found}")]
    InvalidSetsToPlay { found: u32 },

    #[error("setsNeededToWin {found} does not match setsToPlay {sets_to_play} (expected {expected})")]
    MismatchedSetsNeeded { sets_to_play: u32, found: u32, expected: u32 },

    #[error("set number must be positive")]
    NonPositiveSetNumber,

    #[error("schemaVersion must be positive")]
    NonPositiveSchemaVersion,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
