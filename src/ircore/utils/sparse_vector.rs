use crate::ircore::common::Term;
use std::collections::HashMap;

// missing terms read as 0.0
pub type SparseVector = HashMap<Term, f64>;

pub trait SparseVectorOp {
    fn vec_len(&self) -> f64;
    fn vec_set(&mut self, term: &str, value: f64) -> f64;
    fn vec_get(&self, term: &str) -> f64;
    fn vec_dot(&self, other: &SparseVector) -> f64;
}

impl SparseVectorOp for SparseVector {
    fn vec_len(&self) -> f64 {
        self.values().map(|v| v * v).sum::<f64>().sqrt()
    }
    fn vec_set(&mut self, term: &str, value: f64) -> f64 {
        self.insert(term.to_owned(), value);
        value
    }
    fn vec_get(&self, term: &str) -> f64 {
        self.get(term).copied().unwrap_or_default()
    }
    // iterate the shorter vector, terms missing on either side contribute 0
    fn vec_dot(&self, other: &SparseVector) -> f64 {
        let (short, long) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        short
            .iter()
            .filter_map(|(term, value)| long.get(term).map(|other_value| value * other_value))
            .sum()
    }
}
