use crate::ircore::common::Term;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    use_stemming: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(true)
    }
}

impl Normalizer {
    pub fn new(use_stemming: bool) -> Self {
        Normalizer { use_stemming }
    }

    pub fn use_stemming(&self) -> bool {
        self.use_stemming
    }

    pub fn normalize(&self, text: &str) -> String {
        text.to_lowercase()
    }

    // every character other than an ascii letter or whitespace is deleted
    // before segmentation, so "rain-fall" stays one word
    pub fn parse_tokens(&self, text: &str) -> Vec<Term> {
        let letters: String = self
            .normalize(text)
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
            .collect();
        let words = letters.unicode_words().map(str::to_owned);
        if self.use_stemming {
            let stemmer = Stemmer::create(Algorithm::English);
            words.map(|word| stemmer.stem(&word).into_owned()).collect()
        } else {
            words.collect()
        }
    }
}
