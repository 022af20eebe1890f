pub mod expansion;

use crate::ircore::common::Term;
use crate::ircore::token::tokenizer::Normalizer;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    text: String,
    tokens: Vec<Term>,
}

impl Query {
    pub fn parse(text: &str, normalizer: &Normalizer) -> Self {
        Query {
            text: text.to_owned(),
            tokens: normalizer.parse_tokens(text),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Term] {
        &self.tokens
    }

    // nothing left after normalization
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
