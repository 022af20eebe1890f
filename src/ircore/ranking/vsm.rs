use crate::ircore::common::{DocId, Term, TokenizedDocs};
use crate::ircore::error::Result;
use crate::ircore::index::pl::InvertedIndex;
use crate::ircore::ranking::{sort_scores, DocScore};
use crate::ircore::utils::serialize::create_text_file;
use crate::ircore::utils::sparse_vector::{SparseVector, SparseVectorOp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::Path;

pub type TfTable = HashMap<DocId, SparseVector>;

/// idf = ln(N / df). Only terms seen in at least one document are stored,
/// every other term reads as 0.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdfTable {
    idf: HashMap<Term, f64>,
}

impl IdfTable {
    fn from_document_frequency<'a, I>(df: I, total_documents: usize) -> Self
    where
        I: IntoIterator<Item = (&'a Term, usize)>,
    {
        let n = total_documents as f64;
        let idf = df
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(term, count)| (term.clone(), (n / count as f64).ln()))
            .collect();
        IdfTable { idf }
    }

    // same table as compute_idf, taken from the index's document frequencies
    pub fn from_index(index: &InvertedIndex, total_documents: usize) -> Self {
        Self::from_document_frequency(
            index
                .postings_lists()
                .iter()
                .map(|(term, postings)| (term, postings.len())),
            total_documents,
        )
    }

    pub fn get(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or_default()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.idf.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Term, &f64)> {
        self.idf.iter()
    }
}

// count / length over one token sequence, empty for an empty sequence
fn term_frequency<S: AsRef<str>>(tokens: &[S]) -> SparseVector {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_ref()).or_insert(0) += 1;
    }
    let length = tokens.len() as f64;
    counts
        .into_iter()
        .map(|(term, count)| (term.to_owned(), count as f64 / length))
        .collect()
}

pub fn compute_tf(docs: &TokenizedDocs) -> TfTable {
    let tf: TfTable = docs
        .iter()
        .map(|(doc_id, tokens)| (doc_id.clone(), term_frequency(tokens)))
        .collect();
    log::debug!("tf computed for {} documents", tf.len());
    tf
}

pub fn compute_idf(docs: &TokenizedDocs, total_documents: usize) -> IdfTable {
    let mut df: HashMap<&Term, usize> = HashMap::new();
    for tokens in docs.values() {
        let unique: HashSet<&Term> = tokens.iter().collect();
        for term in unique {
            *df.entry(term).or_insert(0) += 1;
        }
    }
    let idf = IdfTable::from_document_frequency(df, total_documents);
    log::debug!("idf computed for {} terms", idf.len());
    idf
}

/// Weights every stored tf entry by its idf and returns the vectors together
/// with their euclidean norms.
pub fn compute_tfidf(tf: &TfTable, idf: &IdfTable) -> (TfTable, HashMap<DocId, f64>) {
    let mut tfidf = TfTable::with_capacity(tf.len());
    let mut norms = HashMap::with_capacity(tf.len());
    for (doc_id, doc_tf) in tf {
        let weights: SparseVector = doc_tf
            .iter()
            .map(|(term, tf_value)| (term.clone(), tf_value * idf.get(term)))
            .collect();
        norms.insert(doc_id.clone(), weights.vec_len());
        tfidf.insert(doc_id.clone(), weights);
    }
    log::debug!("tf-idf computed for {} documents", tfidf.len());
    (tfidf, norms)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSpaceRanker {
    idf: IdfTable,
    tfidf: TfTable,
    doc_norms: HashMap<DocId, f64>,
    document_count: usize,
}

impl VectorSpaceRanker {
    /// The only way to obtain a ranker: tf, idf and tf-idf are computed here,
    /// in that order, so a half-built ranker never exists.
    pub fn build(docs: &TokenizedDocs) -> Self {
        let document_count = docs.len();
        let tf = compute_tf(docs);
        let idf = compute_idf(docs, document_count);
        let (tfidf, doc_norms) = compute_tfidf(&tf, &idf);
        log::info!(
            "vector space model built: {} documents, {} terms",
            document_count,
            idf.len()
        );
        VectorSpaceRanker {
            idf,
            tfidf,
            doc_norms,
            document_count,
        }
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn idf(&self) -> &IdfTable {
        &self.idf
    }

    pub fn tfidf_of(&self, doc_id: &DocId) -> Option<&SparseVector> {
        self.tfidf.get(doc_id)
    }

    pub fn norm_of(&self, doc_id: &DocId) -> f64 {
        self.doc_norms.get(doc_id).copied().unwrap_or_default()
    }

    /// Query tf over its own tokens times the corpus idf. Terms unknown to
    /// the corpus stay in the vector with weight 0.
    pub fn query_vector<S: AsRef<str>>(&self, query_tokens: &[S]) -> SparseVector {
        let mut query = term_frequency(query_tokens);
        for (term, weight) in query.iter_mut() {
            *weight *= self.idf.get(term);
        }
        query
    }

    pub fn cosine_similarity(&self, query: &SparseVector, doc_id: &DocId) -> f64 {
        self.similarity(query, query.vec_len(), doc_id)
    }

    fn similarity(&self, query: &SparseVector, query_norm: f64, doc_id: &DocId) -> f64 {
        let doc_vector = match self.tfidf.get(doc_id) {
            Some(v) => v,
            None => return 0.0,
        };
        let denominator = query_norm * self.norm_of(doc_id);
        if denominator == 0.0 {
            return 0.0;
        }
        (query.vec_dot(doc_vector) / denominator).clamp(0.0, 1.0)
    }

    /// Top `k` documents by cosine similarity. Documents scoring 0 are left
    /// out and equal scores are ordered by ascending document id.
    pub fn rank_documents(&self, query: &SparseVector, k: usize) -> Vec<DocScore> {
        let query_norm = query.vec_len();
        let mut scores: Vec<DocScore> = self
            .tfidf
            .keys()
            .filter_map(|doc_id| {
                let score = self.similarity(query, query_norm, doc_id);
                if score > 0.0 {
                    Some(DocScore {
                        docid: doc_id.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();
        sort_scores(&mut scores);
        scores.truncate(k);
        scores
    }

    // docid header, then "  term\tvalue" lines, documents and terms sorted
    pub fn write_tfidf<W: Write>(&self, writer: &mut W) -> Result<()> {
        let sorted_docs: BTreeMap<&DocId, &SparseVector> = self.tfidf.iter().collect();
        for (doc_id, weights) in sorted_docs {
            writeln!(writer, "{}", doc_id)?;
            let sorted_terms: BTreeMap<&Term, &f64> = weights.iter().collect();
            for (term, value) in sorted_terms {
                writeln!(writer, "  {}\t{:.6}", term, value)?;
            }
        }
        Ok(())
    }

    pub fn save_tfidf(&self, path: &Path) -> Result<()> {
        let mut writer = create_text_file(path)?;
        self.write_tfidf(&mut writer)?;
        writer.flush()?;
        log::info!("tf-idf values saved to {}", path.display());
        Ok(())
    }
}
