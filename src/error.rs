use thiserror::Error;

/// Errors surfaced to callers.
///
/// Only contract violations and I/O end up here. Inconsistent data inside
/// records never fails a run; it is recorded in the invalid properties map.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("initial items data must be an array, not {0}")]
    NotAnArray(&'static str),

    #[error("all elements of the array must be of the same type instead of {0:?}")]
    MixedItemTypes(Vec<&'static str>),

    #[error("items must be objects (not arrays) to be supported")]
    NestedArrays,

    #[error("unsupported item type ({0})")]
    UnsupportedItemType(&'static str),

    #[error("invalid header renaming pattern `{pattern}`: {source}")]
    InvalidRenaming {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to write CSV")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlattenError>;
