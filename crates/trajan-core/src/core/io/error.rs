use crate::core::models::builder::TopologyBuildError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyBuildError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Invalid integer format in {field} (value: '{value}')")]
    InvalidInt { field: String, value: String },
    #[error("Invalid float format in {field} (value: '{value}')")]
    InvalidFloat { field: String, value: String },
    #[error("Required field {field} is empty")]
    MissingRequiredField { field: String },
    #[error("Line is too short for {record} record (must be at least {min} chars)")]
    LineTooShort { record: &'static str, min: usize },
    #[error("CONECT line lists no atom serials")]
    InvalidConectFormat,
    #[error("Expected {expected} values, found {found}")]
    WrongValueCount { expected: &'static str, found: usize },
    #[error("Unexpected end of file")]
    UnexpectedEof,
}

impl FormatError {
    pub(crate) fn parse(line: usize, kind: ParseErrorKind) -> Self {
        FormatError::Parse { line, kind }
    }
}

pub(crate) fn parse_int<T: std::str::FromStr>(
    value: &str,
    field: &str,
    line: usize,
) -> Result<T, FormatError> {
    value.parse().map_err(|_| {
        FormatError::parse(
            line,
            ParseErrorKind::InvalidInt {
                field: field.into(),
                value: value.into(),
            },
        )
    })
}

pub(crate) fn parse_float(value: &str, field: &str, line: usize) -> Result<f64, FormatError> {
    value.parse().map_err(|_| {
        FormatError::parse(
            line,
            ParseErrorKind::InvalidFloat {
                field: field.into(),
                value: value.into(),
            },
        )
    })
}
