pub mod common;
pub mod error;
pub mod index;
pub mod token;
pub mod doc;
pub mod query;
pub mod utils;
pub mod ranking;
pub mod eval;
pub mod engine;

pub use common::{DocId, Term};
pub use error::{IrError, Result};
