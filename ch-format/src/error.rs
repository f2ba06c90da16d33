use thiserror::Error;

/// Result alias used throughout the codec layer.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failure surface of the type grammar, codec registry, and every codec
/// family built on top of [`ch_types`].
///
/// [`Error::Io`] forwards [`ch_types::Error`] unchanged — in particular its
/// `Underflow` variant, which the streaming reader matches on to decide
/// "pull more bytes" (§4.8 of the wire-format notes this crate implements).
/// Every other variant here is fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A primitive I/O failure (bounds, varint width, UTF-8).
    #[error(transparent)]
    Io(#[from] ch_types::Error),
    /// The textual type descriptor did not match any known codec dispatch
    /// rule.
    #[error("unsupported type: {type_name}")]
    UnsupportedType {
        /// The offending textual type descriptor.
        type_name: String,
    },
    /// On encode, the supplied value's shape does not match the declared
    /// type (bad UUID length, out-of-range IPv4 octet, wrong tuple
    /// cardinality, ...).
    #[error("malformed value for type {type_name}: {reason}")]
    MalformedValue {
        /// The type the value was being encoded as.
        type_name: String,
        /// A short, human-readable description of the mismatch.
        reason: String,
    },
    /// An implicit `Dynamic`/`JSON` write received a value whose shape has
    /// no inferable ClickHouse type.
    #[error("cannot infer a type for this value: {reason}")]
    UnsupportedInference {
        /// Description of the un-inferable shape.
        reason: String,
    },
    /// An explicit conversion (e.g. `DateTime64` to a native calendar type)
    /// would discard sub-unit precision on the strict conversion path.
    #[error("conversion from {type_name} would lose precision")]
    PrecisionLoss {
        /// The source type of the conversion.
        type_name: String,
    },
    /// An explicit conversion would overflow the target representation.
    #[error("conversion from {type_name} overflows the target representation")]
    RangeError {
        /// The source type of the conversion.
        type_name: String,
    },
}

impl Error {
    /// True if this is a retryable underflow rather than a fatal error —
    /// forwards [`ch_types::Error::is_underflow`].
    pub fn is_underflow(&self) -> bool {
        matches!(self, Error::Io(inner) if inner.is_underflow())
    }

    pub(crate) fn malformed(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedValue {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(type_name: impl Into<String>) -> Self {
        Error::UnsupportedType {
            type_name: type_name.into(),
        }
    }
}
