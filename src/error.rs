use thiserror::Error;

use crate::data_type::DataType;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between raw query text and a result table.
///
/// Each stage of the pipeline owns its variants: the tokenizer raises `Lex`,
/// the parser `Parse`, schema handling the construction and compatibility
/// errors, and the evaluator the name-resolution and scalar typing errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("lex error at offset {offset}: {message}")]
    Lex { offset: usize, message: String },

    #[error("parse error at token {position}: expected {expected}, found {found}")]
    Parse {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("invalid schema: {0}")]
    SchemaConstruction(String),

    #[error("incompatible schemas: {left} vs {right}")]
    IncompatibleSchema { left: String, right: String },

    #[error("row does not match schema: {0}")]
    RowSchemaMismatch(String),

    #[error("type error: {0}")]
    ScalarType(String),
}

impl Error {
    pub(crate) fn value_type_mismatch(attr: &str, expected: DataType, found: DataType) -> Self {
        Error::RowSchemaMismatch(format!(
            "attribute {attr} expects {expected:?}, got {found:?}"
        ))
    }
}
