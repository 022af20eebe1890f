use crate::ircore::common::Term;
use crate::ircore::error::{IrError, Result};
use crate::ircore::token::tokenizer::Normalizer;
use crate::ircore::utils::serialize::{create_text_file, open_text_file};
use crate::ircore::utils::sparse_vector::SparseVector;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

static DEFAULT_SYNONYMS: Lazy<BTreeMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    BTreeMap::from([
        ("weather", vec!["climate", "temperature", "condition"]),
        ("temperature", vec!["heat", "cold", "warm"]),
        ("rain", vec!["precipitation", "rainfall", "wet"]),
        ("snow", vec!["snowfall", "snowstorm", "blizzard"]),
        ("sun", vec!["sunny", "bright", "clear"]),
        ("wind", vec!["breeze", "gust", "storm"]),
        ("beach", vec!["shore", "coast", "seaside"]),
        ("outdoor", vec!["outside", "outdoors", "exterior"]),
        ("activity", vec!["activity", "action", "sport"]),
        ("enjoy", vec!["like", "love", "appreciate"]),
        ("plan", vec!["schedule", "arrange", "organize"]),
        ("relax", vec!["rest", "relieve", "unwind"]),
        ("season", vec!["period", "time", "quarter"]),
        ("change", vec!["alter", "modify", "transform"]),
        ("predict", vec!["forecast", "prognosticate", "anticipate"]),
        ("meteorologist", vec!["weather forecaster", "meteorology expert"]),
        ("unpredictable", vec!["erratic", "unstable", "variable"]),
    ])
});

/// Static synonym expansion and per-term weight boosting.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExpansion {
    synonyms: BTreeMap<Term, Vec<String>>,
    term_weights: BTreeMap<Term, f64>,
}

impl QueryExpansion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_synonyms() -> Self {
        let mut expansion = Self::new();
        for (term, synonyms) in DEFAULT_SYNONYMS.iter() {
            expansion.add_synonyms(term, synonyms.as_slice());
        }
        expansion
    }

    pub fn add_synonyms<S: AsRef<str>>(&mut self, term: &str, synonyms: &[S]) {
        self.synonyms.insert(
            term.to_lowercase(),
            synonyms.iter().map(|s| s.as_ref().trim().to_lowercase()).collect(),
        );
    }

    pub fn synonyms_of(&self, term: &str) -> Option<&Vec<String>> {
        self.synonyms.get(term)
    }

    pub fn synonym_count(&self) -> usize {
        self.synonyms.len()
    }

    /// Original tokens first, then the synonyms of each token in query order.
    pub fn expand_with_synonyms<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<Term> {
        let mut expanded: Vec<Term> = tokens.iter().map(|t| t.as_ref().to_owned()).collect();
        for token in tokens {
            if let Some(synonyms) = self.synonyms.get(token.as_ref()) {
                expanded.extend(synonyms.iter().cloned());
            }
        }
        expanded
    }

    // weight > 1 boosts a term, < 1 damps it
    pub fn set_term_weight(&mut self, term: &str, weight: f64) {
        self.term_weights.insert(term.to_lowercase(), weight);
    }

    pub fn expand_with_weights(&self, query: &SparseVector) -> SparseVector {
        let mut boosted = query.clone();
        for (term, weight) in &self.term_weights {
            if let Some(value) = boosted.get_mut(term) {
                *value *= weight;
            }
        }
        boosted
    }

    /// Runs keys and synonyms through the same normalizer as the corpus so
    /// they line up with indexed terms. Multi-word synonyms become several
    /// terms, keys that do not normalize to a single term are dropped.
    pub fn normalized(&self, normalizer: &Normalizer) -> Self {
        let mut normalized = Self::new();
        for (term, synonyms) in &self.synonyms {
            if let Some(key) = single_token(term, normalizer) {
                let terms: Vec<Term> = synonyms
                    .iter()
                    .flat_map(|s| normalizer.parse_tokens(s))
                    .collect();
                normalized.synonyms.entry(key).or_default().extend(terms);
            }
        }
        for (term, weight) in &self.term_weights {
            if let Some(key) = single_token(term, normalizer) {
                normalized.term_weights.insert(key, *weight);
            }
        }
        normalized
    }

    // term\tsynonym1,synonym2,...
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (term, synonyms) in &self.synonyms {
            writeln!(writer, "{}\t{}", term, synonyms.join(","))?;
        }
        Ok(())
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut expansion = Self::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (term, synonyms) = line
                .split_once('\t')
                .ok_or_else(|| IrError::parse(n + 1, "missing tab separator"))?;
            let synonyms: Vec<&str> = synonyms.split(',').filter(|s| !s.trim().is_empty()).collect();
            expansion.add_synonyms(term.trim(), &synonyms);
        }
        Ok(expansion)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut writer = create_text_file(path)?;
        self.write_to(&mut writer)?;
        writer.flush()?;
        log::info!("synonyms saved to {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let expansion = Self::read_from(open_text_file(path)?)?;
        log::info!("loaded {} terms with synonyms from {}", expansion.synonym_count(), path.display());
        Ok(expansion)
    }
}

fn single_token(term: &str, normalizer: &Normalizer) -> Option<Term> {
    let mut tokens = normalizer.parse_tokens(term);
    if tokens.len() == 1 {
        tokens.pop()
    } else {
        None
    }
}
