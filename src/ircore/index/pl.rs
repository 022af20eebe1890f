use crate::ircore::common::{DocId, Term, TokenizedDocs};
use crate::ircore::error::{IrError, Result};
use crate::ircore::utils::serialize::{create_text_file, open_text_file};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};
use std::path::Path;

// always iterated in DocId order, which is what gap encoding relies on
pub type PostingsList = BTreeSet<DocId>;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    // term -> documents containing the term, never empty
    postings_lists: BTreeMap<Term, PostingsList>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex {
            postings_lists: BTreeMap::new(),
        }
    }

    pub fn from_postings(postings_lists: BTreeMap<Term, PostingsList>) -> Self {
        let postings_lists = postings_lists
            .into_iter()
            .filter(|(_, postings)| !postings.is_empty())
            .collect();
        InvertedIndex { postings_lists }
    }

    /// Rebuilds the index from scratch. A term repeated inside one document
    /// yields a single posting.
    pub fn build(&mut self, docs: &TokenizedDocs) {
        self.postings_lists.clear();
        for (doc_id, tokens) in docs {
            for token in tokens {
                self.postings_lists
                    .entry(token.clone())
                    .or_default()
                    .insert(doc_id.clone());
            }
        }
        log::info!("inverted index built with {} terms", self.postings_lists.len());
    }

    /// Documents containing every term. No terms means no documents, and a
    /// term outside the vocabulary empties the result.
    pub fn search_and<S: AsRef<str>>(&self, terms: &[S]) -> BTreeSet<DocId> {
        let mut iter = terms.iter();
        let mut result = match iter.next() {
            Some(first) => self.postings_of(first.as_ref()),
            None => return BTreeSet::new(),
        };
        for term in iter {
            if result.is_empty() {
                break;
            }
            match self.postings_lists.get(term.as_ref()) {
                Some(postings) => result = &result & postings,
                None => result.clear(),
            }
        }
        result
    }

    pub fn search_or<S: AsRef<str>>(&self, terms: &[S]) -> BTreeSet<DocId> {
        let mut result = BTreeSet::new();
        for term in terms {
            if let Some(postings) = self.postings_lists.get(term.as_ref()) {
                result.extend(postings.iter().cloned());
            }
        }
        result
    }

    pub fn postings_of(&self, term: &str) -> PostingsList {
        self.postings_lists.get(term).cloned().unwrap_or_default()
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings_lists.get(term).map_or(0, |postings| postings.len())
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &Term> {
        self.postings_lists.keys()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.postings_lists.len()
    }

    pub fn postings_lists(&self) -> &BTreeMap<Term, PostingsList> {
        &self.postings_lists
    }

    // total number of postings over all terms
    pub fn postings_count(&self) -> usize {
        self.postings_lists.values().map(|postings| postings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.postings_lists.is_empty()
    }

    // term\tdocid1,docid2,...
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (term, postings) in &self.postings_lists {
            let ids: Vec<&str> = postings.iter().map(|id| id.as_str()).collect();
            writeln!(writer, "{}\t{}", term, ids.join(","))?;
        }
        Ok(())
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut postings_lists = BTreeMap::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (term, ids) = line
                .split_once('\t')
                .ok_or_else(|| IrError::parse(n + 1, "missing tab separator"))?;
            let postings: PostingsList = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(DocId::new)
                .collect();
            if postings.is_empty() {
                return Err(IrError::parse(n + 1, format!("empty postings for {:?}", term)));
            }
            postings_lists.insert(term.to_owned(), postings);
        }
        Ok(InvertedIndex { postings_lists })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut writer = create_text_file(path)?;
        self.write_to(&mut writer)?;
        writer.flush()?;
        log::info!("inverted index saved to {}", path.display());
        Ok(())
    }

    // the current index is replaced only if the whole file parses
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let loaded = Self::read_from(open_text_file(path)?)?;
        *self = loaded;
        log::info!("inverted index loaded from {}", path.display());
        Ok(())
    }
}
