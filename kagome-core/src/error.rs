//! Error types for the kagome core library.
//!
//! Defines the error enums exposed by the public API, their stable
//! machine-readable codes, and a convenient result alias.

use std::sync::Arc;

use thiserror::Error;

macro_rules! impl_error_codes {
    ($ErrTy:ident { $($Variant:ident $( { $($pattern:tt)* } )? => $code:expr),+ $(,)? }) => {
        impl $ErrTy {
            /// Return the stable machine-readable code for this error.
            pub const fn code(&self) -> &'static str {
                match self {
                    $(Self::$Variant $( { $($pattern)* } )? => $code,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::GraphSource`] implementations.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphSourceError {
    /// Reading the underlying medium failed.
    #[error("failed to read `{path}`: {message}")]
    Io {
        /// Path or identifier of the medium that failed.
        path: Arc<str>,
        /// Stringified operating-system error.
        message: String,
    },
    /// A record did not have the expected triple shape.
    #[error("line {line} has {fields} fields but a triple needs 3")]
    MalformedRecord {
        /// One-based line number of the offending record.
        line: usize,
        /// Number of fields the record actually contained.
        fields: usize,
    },
    /// A record contained an empty entity or relation label.
    #[error("line {line} contains an empty field")]
    EmptyField {
        /// One-based line number of the offending record.
        line: usize,
    },
    /// The source yielded no edges at all.
    #[error("graph source produced no edges")]
    Empty,
}

impl_error_codes!(GraphSourceError {
    Io { .. } => "GRAPH_SOURCE_IO",
    MalformedRecord { .. } => "GRAPH_SOURCE_MALFORMED_RECORD",
    EmptyField { .. } => "GRAPH_SOURCE_EMPTY_FIELD",
    Empty => "GRAPH_SOURCE_EMPTY",
});

/// Error type produced when configuring or running [`crate::Kagome`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum KagomeError {
    /// A fraction-valued option fell outside `[0, 1]`.
    #[error("{name} must lie in [0, 1] (got {got})")]
    FractionOutOfRange {
        /// Name of the offending configuration option.
        name: &'static str,
        /// The invalid value supplied by the caller.
        got: f64,
    },
    /// The negatives factor must be strictly positive.
    #[error("negatives_factor must be greater than 0 (got {got})")]
    NonPositiveNegativesFactor {
        /// The invalid factor supplied by the caller.
        got: f64,
    },
    /// The PPR teleport probability must lie strictly inside `(0, 1)`.
    #[error("ppr alpha must lie in (0, 1) (got {got})")]
    InvalidAlpha {
        /// The invalid teleport probability supplied by the caller.
        got: f64,
    },
    /// At least one fold must be generated.
    #[error("number_splits must be at least 1")]
    ZeroSplits,
    /// The requested negatives strategy name is not recognised.
    #[error("unknown negatives strategy `{name}`")]
    UnknownStrategy {
        /// The unrecognised strategy name.
        name: String,
    },
    /// A [`crate::GraphSource`] failed while the graph was being read.
    #[error("graph source `{data_source}` failed: {error}")]
    Source {
        /// Identifier of the graph source that produced the error.
        data_source: Arc<str>,
        /// Underlying source error.
        #[source]
        error: GraphSourceError,
    },
}

impl_error_codes!(KagomeError {
    FractionOutOfRange { .. } => "KAGOME_FRACTION_OUT_OF_RANGE",
    NonPositiveNegativesFactor { .. } => "KAGOME_NON_POSITIVE_NEGATIVES_FACTOR",
    InvalidAlpha { .. } => "KAGOME_INVALID_ALPHA",
    ZeroSplits => "KAGOME_ZERO_SPLITS",
    UnknownStrategy { .. } => "KAGOME_UNKNOWN_STRATEGY",
    Source { .. } => "KAGOME_SOURCE_FAILURE",
});

impl KagomeError {
    /// Retrieve the inner [`GraphSourceError`] code when the error originated
    /// in a [`crate::GraphSource`].
    #[must_use]
    pub const fn source_code(&self) -> Option<&'static str> {
        match self {
            Self::Source { error, .. } => Some(error.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, KagomeError>;
