use crate::ircore::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub fn write_file<T: Serialize>(filepath: &Path, obj: &T) -> Result<()> {
    if let Some(dir) = filepath.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(filepath)?);
    bincode::serialize_into(&mut writer, obj)?;
    writer.flush()?;
    Ok(())
}

pub fn read_file<T: DeserializeOwned>(filepath: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(filepath)?);
    let obj = bincode::deserialize_from(reader)?;
    Ok(obj)
}

// creates parent directories, used by every text exporter
pub fn create_text_file(filepath: &Path) -> Result<BufWriter<File>> {
    if let Some(dir) = filepath.parent() {
        fs::create_dir_all(dir)?;
    }
    Ok(BufWriter::new(File::create(filepath)?))
}

pub fn open_text_file(filepath: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(filepath)?))
}
