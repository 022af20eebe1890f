use crate::ircore::common::DocKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IrError {
    #[error("document id {0:?} has no numeric key")]
    MalformedDocId(String),
    #[error("numeric document key {0} appears twice in one postings list")]
    DuplicateDocKey(DocKey),
    #[error("invalid gap sequence: {0}")]
    InvalidGap(String),
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("{0} does not match the index")]
    ExportMismatch(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IrError {
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        IrError::Parse {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IrError>;
