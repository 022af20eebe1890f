pub mod pl;
pub mod compression;

pub use compression::{CompressedIndex, Gaps};
pub use pl::{InvertedIndex, PostingsList};
