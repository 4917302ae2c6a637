// error.rs - Error taxonomy for the statistics pipeline

use thiserror::Error;

/// Errors raised while preparing alignment statistics
#[derive(Debug, Error)]
pub enum PrepError {
    /// Malformed record stream (missing `>`, ragged sequences, nothing left after filtering)
    #[error("format error: {message}")]
    Format { message: String },

    /// A matrix or statistics table could not be allocated
    #[error("cannot allocate {what} ({elements} elements)")]
    Resource { what: &'static str, elements: usize },

    /// Not enough informative sites or draws to compute a statistic
    #[error("degenerate columns: {message}")]
    DegenerateColumn { message: String },

    /// Invalid numeric option or alphabet
    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error while {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("TOML error while {context}: {message}")]
    Toml { context: String, message: String },

    #[error("CSV error while {context}: {source}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },
}

impl PrepError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateColumn {
            message: message.into(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn toml(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Toml {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, PrepError>;

/// Allocate a zero-filled table, reporting allocation failure instead of aborting
pub(crate) fn zeroed_table(what: &'static str, elements: usize) -> Result<Vec<f64>> {
    let mut table = Vec::new();
    table
        .try_reserve_exact(elements)
        .map_err(|_| PrepError::Resource { what, elements })?;
    table.resize(elements, 0.0);
    Ok(table)
}

/// Size of a pairwise table: `n_sites * (n_sites - 1) / 2 * block`, checked for overflow
pub(crate) fn pair_table_len(what: &'static str, n_sites: usize, block: usize) -> Result<usize> {
    n_sites
        .checked_mul(n_sites.saturating_sub(1))
        .and_then(|n| (n / 2).checked_mul(block))
        .ok_or(PrepError::Resource {
        what,
        elements: usize::MAX,
    })
}
