//! Error taxonomy for the translation stage.
//!
//! Every error is raised where it is detected and returned unchanged to the
//! caller of `translate`; there is no partial-result recovery.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TranslateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// The type grammar rejects this surface type expression.
    #[error("unsupported type `{type_syntax}`: {reason}")]
    UnsupportedType {
        type_syntax: String,
        reason: UnsupportedReason,
    },

    /// A field, parameter or method lacks a usable explicit ordinal.
    #[error("malformed ordinal on {item} `{name}`: {reason}")]
    MalformedOrdinal {
        item: OrdinalItem,
        name: String,
        reason: String,
    },

    /// An attribute list defines the same key twice.
    #[error("duplicate attribute key `{key}`")]
    DuplicateAttribute { key: String },

    /// The upstream parser handed over a tree of the wrong shape.
    #[error("malformed syntax tree at `{path}`: {message}")]
    MalformedTree { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnsupportedReason {
    #[error("array of fixed-size array unsupported")]
    ArrayOfFixedArray,
    #[error("fixed-size array of array unsupported")]
    FixedArrayOfArray,
    #[error("fixed-size array length must be a positive integer")]
    BadFixedLength,
    #[error("unbalanced brackets")]
    UnbalancedBrackets,
    #[error("empty type name")]
    EmptyName,
    #[error("invalid type name")]
    InvalidName,
    #[error("nested deeper than {} levels", crate::kind::MAX_NESTING)]
    TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalItem {
    Field,
    Parameter,
    Method,
}

impl std::fmt::Display for OrdinalItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OrdinalItem::Field => "field",
            OrdinalItem::Parameter => "parameter",
            OrdinalItem::Method => "method",
        })
    }
}

impl TranslateError {
    pub(crate) fn unsupported(type_syntax: &str, reason: UnsupportedReason) -> Self {
        TranslateError::UnsupportedType {
            type_syntax: type_syntax.to_string(),
            reason,
        }
    }

    /// Short stable name of the error class, used by fixtures and logs.
    pub fn class(&self) -> &'static str {
        match self {
            TranslateError::UnsupportedType { .. } => "UnsupportedType",
            TranslateError::MalformedOrdinal { .. } => "MalformedOrdinal",
            TranslateError::DuplicateAttribute { .. } => "DuplicateAttribute",
            TranslateError::MalformedTree { .. } => "MalformedTree",
        }
    }
}
