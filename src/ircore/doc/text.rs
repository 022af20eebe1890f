use super::Document;
use crate::ircore::common::DocId;
use crate::ircore::error::Result;
use encoding_rs::ISO_8859_2;
use encoding_rs_io::DecodeReaderBytesBuilder;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::Path;

pub trait TextFileLoader {
    fn parse_file(id: DocId, path: &Path) -> Result<Document>;
}

impl TextFileLoader for Document {
    fn parse_file(id: DocId, path: &Path) -> Result<Document> {
        let content = read_text(path)?;
        Ok(Document::new(id, content, path.to_string_lossy().to_string()))
    }
}

/// UTF-8 first; anything else is decoded as ISO-8859-2.
pub fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            log::debug!("{} is not utf-8, decoding as iso-8859-2", path.display());
            read_to_string_non_utf8_encoding(path)
        }
        Err(e) => Err(e.into()),
    }
}

fn read_to_string_non_utf8_encoding(path: &Path) -> Result<String> {
    let mut decoder = DecodeReaderBytesBuilder::new()
        .encoding(Some(ISO_8859_2))
        .build(File::open(path)?);
    let mut dest = String::new();
    decoder.read_to_string(&mut dest)?;
    Ok(dest)
}
