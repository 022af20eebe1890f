use super::text::TextFileLoader;
use super::Document;
use crate::ircore::common::DocId;
use crate::ircore::doc::cfg::Cfg;
use crate::ircore::error::Result;
use std::path::Path;

pub struct Corpus;

impl Corpus {
    /// Loads the top-level files of `dir` carrying the configured extension.
    /// The file stem becomes the document id.
    pub fn scan(dir: &Path, cfg: &Cfg) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for entry in dir.read_dir()? {
            let path = entry?.path();
            if Self::ignore(&path) {
                log::debug!("ignore {}", path.display());
                continue;
            }
            if !path.is_file() || !Self::has_ext(&path, &cfg.file_ext) {
                continue;
            }
            let stem = match path.file_stem() {
                Some(stem) => stem.to_string_lossy().to_string(),
                None => continue,
            };
            docs.push(Document::parse_file(DocId::new(stem), &path)?);
        }
        docs.sort_by(|a, b| a.id().cmp(b.id()));
        log::info!("{} documents loaded from {}", docs.len(), dir.display());
        Ok(docs)
    }

    fn ignore(path: &Path) -> bool {
        // hidden files, unix style
        path.file_name()
            .map(|name| name.to_string_lossy().starts_with('.'))
            .unwrap_or(false)
    }

    fn has_ext(path: &Path, ext: &str) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext.trim_start_matches('.')))
            .unwrap_or(false)
    }
}
