use crate::ircore::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CFG_NAME: &str = ".rircfg";

/// Per-corpus settings, read from `.rircfg` in the corpus directory.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(default)]
pub struct Cfg {
    pub file_ext: String,
    pub use_stemming: bool,
    pub top_k: usize,
    pub synonyms: Option<PathBuf>,
    // query term -> boost applied to expanded queries
    pub term_weights: BTreeMap<String, f64>,
}

impl Default for Cfg {
    fn default() -> Self {
        Cfg {
            file_ext: String::from("txt"),
            use_stemming: true,
            top_k: 10,
            synonyms: None,
            term_weights: BTreeMap::new(),
        }
    }
}

impl Cfg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(repo_cfg: &str) -> Result<Self> {
        if repo_cfg.trim().is_empty() {
            return Ok(Cfg::new());
        }
        Ok(serde_yaml::from_str(repo_cfg)?)
    }

    /// Defaults when the corpus has no `.rircfg`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CFG_NAME);
        if !path.is_file() {
            log::debug!("no {} in {}, using defaults", CFG_NAME, dir.display());
            return Ok(Cfg::new());
        }
        let cfg = Self::from_str(&fs::read_to_string(&path)?)?;
        log::info!("config loaded from {}", path.display());
        Ok(cfg)
    }

    pub fn synonyms_path(&self, corpus_dir: &Path) -> Option<PathBuf> {
        self.synonyms.as_ref().map(|p| corpus_dir.join(p))
    }
}
