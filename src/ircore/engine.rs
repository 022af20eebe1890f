use crate::ircore::common::{DocId, TokenizedDocs};
use crate::ircore::doc::cfg::Cfg;
use crate::ircore::doc::dir::Corpus;
use crate::ircore::doc::Document;
use crate::ircore::error::{IrError, Result};
use crate::ircore::eval::Evaluation;
use crate::ircore::index::compression::{self, CompressedIndex};
use crate::ircore::index::InvertedIndex;
use crate::ircore::query::expansion::QueryExpansion;
use crate::ircore::query::Query;
use crate::ircore::ranking::vsm::VectorSpaceRanker;
use crate::ircore::ranking::DocScore;
use crate::ircore::token::dictionary::Dictionary;
use crate::ircore::token::tokenizer::Normalizer;
use crate::ircore::utils::serialize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

pub const DICTIONARY_FILE: &str = "dictionary.txt";
pub const INVERTED_INDEX_FILE: &str = "inverted_index.txt";
pub const COMPRESSED_INDEX_FILE: &str = "compressed_index.txt";
pub const TFIDF_FILE: &str = "tfidf.txt";
pub const SYNONYMS_FILE: &str = "synonyms.txt";

// results kept per evaluation query, at least as many as the report shows
const EVAL_RESULTS: usize = 10;
// in chars
pub const PREVIEW_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub path: String,
    pub token_count: usize,
    pub preview: String,
}

/// Ranked results of one query run without and with expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub without_expansion: Vec<DocScore>,
    pub with_expansion: Vec<DocScore>,
    // retrieved only with expansion
    pub new_documents: BTreeSet<DocId>,
}

/// First `PREVIEW_LEN` characters of `content`, with `...` appended when cut.
pub fn content_preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_LEN) {
        Some((end, _)) => format!("{}...", &content[..end]),
        None => content.to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub document_count: usize,
    pub vocabulary_size: usize,
    pub total_tokens: usize,
    pub average_tokens: f64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "documents:       {}", self.document_count)?;
        writeln!(f, "vocabulary size: {}", self.vocabulary_size)?;
        writeln!(f, "total tokens:    {}", self.total_tokens)?;
        write!(f, "average tokens:  {:.2}", self.average_tokens)
    }
}

/// Everything built from one corpus: the Boolean index, the vector space
/// ranker and the query expansion tables. The whole engine is what gets
/// snapshotted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    cfg: Cfg,
    normalizer: Normalizer,
    index: InvertedIndex,
    ranker: VectorSpaceRanker,
    // as loaded, and run through the normalizer for query time
    synonyms: QueryExpansion,
    expansion: QueryExpansion,
    doc_meta: BTreeMap<DocId, DocMeta>,
}

impl Engine {
    pub fn build(documents: &[Document], cfg: Cfg) -> Self {
        Self::build_with_synonyms(documents, cfg, QueryExpansion::with_default_synonyms())
    }

    /// Term weights from `cfg` are added to `synonyms` before use.
    pub fn build_with_synonyms(documents: &[Document], cfg: Cfg, mut synonyms: QueryExpansion) -> Self {
        for (term, weight) in &cfg.term_weights {
            synonyms.set_term_weight(term, *weight);
        }
        let normalizer = Normalizer::new(cfg.use_stemming);
        let expansion = synonyms.normalized(&normalizer);
        let mut engine = Engine {
            cfg,
            normalizer,
            index: InvertedIndex::new(),
            ranker: VectorSpaceRanker::build(&TokenizedDocs::new()),
            synonyms,
            expansion,
            doc_meta: BTreeMap::new(),
        };
        engine.rebuild(documents);
        engine
    }

    pub fn build_from_dir(dir: &Path) -> Result<Self> {
        let cfg = Cfg::load_from_dir(dir)?;
        let documents = Corpus::scan(dir, &cfg)?;
        let synonyms = match cfg.synonyms_path(dir) {
            Some(path) => QueryExpansion::load_from_file(&path)?,
            None => QueryExpansion::with_default_synonyms(),
        };
        Ok(Self::build_with_synonyms(&documents, cfg, synonyms))
    }

    /// Replaces the corpus. Index, ranker and document table are built
    /// aside and swapped in together.
    pub fn rebuild(&mut self, documents: &[Document]) {
        let mut tokenized = TokenizedDocs::new();
        let mut doc_meta = BTreeMap::new();
        for doc in documents {
            let tokens = self.normalizer.parse_tokens(doc.get_content());
            let meta = DocMeta {
                path: doc.get_path().to_owned(),
                token_count: tokens.len(),
                preview: content_preview(doc.get_content()),
            };
            if tokenized.insert(doc.id().clone(), tokens).is_some() {
                log::warn!("document {} appears twice, keeping the last one", doc.id());
            }
            doc_meta.insert(doc.id().clone(), meta);
        }
        let mut index = InvertedIndex::new();
        index.build(&tokenized);
        let ranker = VectorSpaceRanker::build(&tokenized);

        self.index = index;
        self.ranker = ranker;
        self.doc_meta = doc_meta;
        log::info!("{} documents indexed", self.doc_count());
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn ranker(&self) -> &VectorSpaceRanker {
        &self.ranker
    }

    pub fn doc_count(&self) -> usize {
        self.doc_meta.len()
    }

    pub fn doc_path(&self, doc_id: &DocId) -> Option<&str> {
        self.doc_meta.get(doc_id).map(|meta| meta.path.as_str())
    }

    pub fn doc_preview(&self, doc_id: &DocId) -> Option<&str> {
        self.doc_meta.get(doc_id).map(|meta| meta.preview.as_str())
    }

    /// Top `k` documents by cosine similarity. With `use_expansion` the query
    /// gets the synonyms of its terms and the configured term weights.
    pub fn search(&self, text: &str, k: usize, use_expansion: bool) -> Vec<DocScore> {
        let query = Query::parse(text, &self.normalizer);
        if query.is_empty() {
            log::info!("query {:?} has no terms after normalization", query.text());
            return vec![];
        }
        let vector = if use_expansion {
            let tokens = self.expansion.expand_with_synonyms(query.tokens());
            log::debug!("expanded query: {}", tokens.join(" "));
            self.expansion
                .expand_with_weights(&self.ranker.query_vector(tokens.as_slice()))
        } else {
            self.ranker.query_vector(query.tokens())
        };
        self.ranker.rank_documents(&vector, k)
    }

    pub fn compare(&self, text: &str, k: usize) -> Comparison {
        let without_expansion = self.search(text, k, false);
        let with_expansion = self.search(text, k, true);
        let before: BTreeSet<&DocId> = without_expansion.iter().map(|d| &d.docid).collect();
        let new_documents = with_expansion
            .iter()
            .filter(|d| !before.contains(&d.docid))
            .map(|d| d.docid.clone())
            .collect();
        Comparison {
            without_expansion,
            with_expansion,
            new_documents,
        }
    }

    pub fn search_and(&self, text: &str) -> BTreeSet<DocId> {
        let query = Query::parse(text, &self.normalizer);
        self.index.search_and(query.tokens())
    }

    pub fn search_or(&self, text: &str) -> BTreeSet<DocId> {
        let query = Query::parse(text, &self.normalizer);
        self.index.search_or(query.tokens())
    }

    pub fn compressed_index(&self) -> Result<CompressedIndex> {
        compression::compress_index(&self.index)
    }

    pub fn compression_ratio(&self) -> Result<f64> {
        let compressed = self.compressed_index()?;
        Ok(compression::compression_ratio(&self.index, &compressed))
    }

    pub fn dictionary(&self) -> Dictionary {
        Dictionary::from_index(&self.index)
    }

    /// Writes every text export into `dir`. Document ids without a numeric
    /// key cannot be gap encoded; only the compressed index is skipped then.
    pub fn save_all(&self, dir: &Path) -> Result<()> {
        self.dictionary().save_to_file(&dir.join(DICTIONARY_FILE))?;
        self.index.save_to_file(&dir.join(INVERTED_INDEX_FILE))?;
        match self.compressed_index() {
            Ok(compressed) => compressed.save_to_file(&dir.join(COMPRESSED_INDEX_FILE))?,
            Err(e @ IrError::MalformedDocId(_)) | Err(e @ IrError::DuplicateDocKey(_)) => {
                log::warn!("{} not written: {}", COMPRESSED_INDEX_FILE, e);
            }
            Err(e) => return Err(e),
        }
        self.ranker.save_tfidf(&dir.join(TFIDF_FILE))?;
        self.synonyms.save_to_file(&dir.join(SYNONYMS_FILE))?;
        Ok(())
    }

    /// Reads the exports in `dir` back and checks them against the index.
    /// A missing compressed index is accepted, `save_all` may skip it.
    pub fn verify_exports(&self, dir: &Path) -> Result<()> {
        if Dictionary::load_from_file(&dir.join(DICTIONARY_FILE))? != self.dictionary() {
            return Err(IrError::ExportMismatch(DICTIONARY_FILE.to_owned()));
        }
        let mut index = InvertedIndex::new();
        index.load_from_file(&dir.join(INVERTED_INDEX_FILE))?;
        if index != self.index {
            return Err(IrError::ExportMismatch(INVERTED_INDEX_FILE.to_owned()));
        }
        let compressed_path = dir.join(COMPRESSED_INDEX_FILE);
        if compressed_path.is_file() {
            let compressed = CompressedIndex::load_from_file(&compressed_path)?;
            if compression::decompress_index(&compressed)? != self.index {
                return Err(IrError::ExportMismatch(COMPRESSED_INDEX_FILE.to_owned()));
            }
        }
        log::info!("exports in {} match the index", dir.display());
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        serialize::write_file(path, self)?;
        log::info!("index saved to {}", path.display());
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let engine: Engine = serialize::read_file(path)?;
        log::info!("index of {} documents loaded from {}", engine.doc_count(), path.display());
        Ok(engine)
    }

    pub fn stats(&self) -> Stats {
        let document_count = self.doc_count();
        let total_tokens: usize = self.doc_meta.values().map(|meta| meta.token_count).sum();
        let average_tokens = if document_count == 0 {
            0.0
        } else {
            total_tokens as f64 / document_count as f64
        };
        Stats {
            document_count,
            vocabulary_size: self.index.vocabulary_size(),
            total_tokens,
            average_tokens,
        }
    }

    /// Runs every judged query and records precision at each of `k_values`.
    pub fn evaluate(&self, evaluation: &mut Evaluation, k_values: &[usize], use_expansion: bool) {
        let k = k_values.iter().copied().max().unwrap_or(0).max(EVAL_RESULTS);
        let queries: Vec<(String, String)> = evaluation
            .queries()
            .map(|(id, query)| (id.clone(), query.text.clone()))
            .collect();
        for (query_id, text) in queries {
            let results = self.search(&text, k, use_expansion);
            log::debug!("query {}: {} results", query_id, results.len());
            evaluation.add_result(&query_id, results);
        }
        evaluation.evaluate_all(k_values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EPSILON: f64 = 1e-9;

    fn docs(texts: &[(&str, &str)]) -> Vec<Document> {
        texts
            .iter()
            .map(|(id, text)| Document::new(*id, text.to_string(), format!("{}.txt", id)))
            .collect()
    }

    fn no_stemming() -> Cfg {
        Cfg {
            use_stemming: false,
            ..Cfg::new()
        }
    }

    fn weather_engine() -> Engine {
        Engine::build(
            &docs(&[
                ("Doc1", "Sun and rain."),
                ("Doc2", "Rain and snow."),
                ("Doc3", "Sun and snow."),
            ]),
            no_stemming(),
        )
    }

    fn ids(results: &[DocScore]) -> Vec<&str> {
        results.iter().map(|r| r.docid.as_str()).collect()
    }

    #[test]
    fn test_weather_search() {
        let engine = weather_engine();
        for use_expansion in [false, true] {
            let results = engine.search("rain", 10, use_expansion);
            assert_eq!(ids(&results), vec!["Doc1", "Doc2"]);
            for result in &results {
                assert!((result.score - 1.0 / 2f64.sqrt()).abs() < EPSILON);
            }
        }
        assert_eq!(ids(&engine.search("rain", 1, false)), vec!["Doc1"]);
        assert!(engine.search("rain", 0, false).is_empty());
    }

    #[test]
    fn test_empty_query() {
        let engine = weather_engine();
        assert!(engine.search("?! 2024", 10, false).is_empty());
        assert!(engine.search_and("").is_empty());
        assert!(engine.search("hail", 10, false).is_empty());
    }

    #[test]
    fn test_boolean_search() {
        let engine = weather_engine();
        let and: Vec<String> = engine.search_and("SUN snow").iter().map(|d| d.to_string()).collect();
        assert_eq!(and, vec!["Doc3"]);
        let or: Vec<String> = engine.search_or("rain hail").iter().map(|d| d.to_string()).collect();
        assert_eq!(or, vec!["Doc1", "Doc2"]);
        assert!(engine.search_and("rain hail").is_empty());
    }

    #[test]
    fn test_search_with_synonyms() {
        let engine = Engine::build(
            &docs(&[
                ("Doc1", "wind and sun"),
                ("Doc2", "storm at sea"),
                ("Doc3", "sun and sand"),
            ]),
            no_stemming(),
        );
        assert_eq!(ids(&engine.search("wind", 10, false)), vec!["Doc1"]);
        let expanded = engine.search("wind", 10, true);
        let mut found = ids(&expanded);
        found.sort();
        assert_eq!(found, vec!["Doc1", "Doc2"]);
    }

    #[test]
    fn test_term_weight() {
        let plain = weather_engine().search("sun rain", 10, true);
        assert_eq!(ids(&plain), vec!["Doc1", "Doc2", "Doc3"]);
        let mut cfg = no_stemming();
        cfg.term_weights.insert("Sun".to_string(), 3.0);
        let engine = Engine::build(
            &docs(&[
                ("Doc1", "Sun and rain."),
                ("Doc2", "Rain and snow."),
                ("Doc3", "Sun and snow."),
            ]),
            cfg,
        );
        let boosted = engine.search("sun rain", 10, true);
        assert_eq!(ids(&boosted), vec!["Doc1", "Doc3", "Doc2"]);
        // weights only take part in expanded queries
        assert_eq!(ids(&engine.search("sun rain", 10, false)), vec!["Doc1", "Doc2", "Doc3"]);
    }

    #[test]
    fn test_compare() {
        let engine = Engine::build(
            &docs(&[
                ("Doc1", "wind and sun"),
                ("Doc2", "storm at sea"),
                ("Doc3", "sun and sand"),
            ]),
            no_stemming(),
        );
        let comparison = engine.compare("wind", 5);
        assert_eq!(ids(&comparison.without_expansion), vec!["Doc1"]);
        assert_eq!(comparison.with_expansion.len(), 2);
        let new: Vec<&str> = comparison.new_documents.iter().map(|d| d.as_str()).collect();
        assert_eq!(new, vec!["Doc2"]);

        let same = engine.compare("sand", 5);
        assert_eq!(same.without_expansion, same.with_expansion);
        assert!(same.new_documents.is_empty());
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("Sun and rain."), "Sun and rain.");
        let exact = "a".repeat(PREVIEW_LEN);
        assert_eq!(content_preview(&exact), exact);
        // multi-byte characters are counted as characters, not bytes
        let long = "é".repeat(PREVIEW_LEN + 50);
        let preview = content_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_LEN + 3);
        assert!(preview.starts_with(&"é".repeat(PREVIEW_LEN)));

        let engine = Engine::build(&docs(&[("Doc1", long.as_str()), ("Doc2", "Rain and snow.")]), no_stemming());
        assert_eq!(engine.doc_preview(&DocId::new("Doc1")), Some(preview.as_str()));
        assert_eq!(engine.doc_preview(&DocId::new("Doc2")), Some("Rain and snow."));
        assert_eq!(engine.doc_preview(&DocId::new("Doc9")), None);
    }

    #[test]
    fn test_stemming() {
        let engine = Engine::build(
            &docs(&[("Doc1", "It rains every day"), ("Doc2", "Sunny days")]),
            Cfg::new(),
        );
        let found: Vec<String> = engine.search_and("raining").iter().map(|d| d.to_string()).collect();
        assert_eq!(found, vec!["Doc1"]);
        assert_eq!(engine.search_or("day").len(), 2);
    }

    #[test]
    fn test_rebuild() {
        let mut engine = weather_engine();
        engine.rebuild(&docs(&[("Doc7", "hail")]));
        assert_eq!(engine.doc_count(), 1);
        assert!(engine.search("rain", 10, false).is_empty());
        assert_eq!(engine.ranker().document_count(), 1);
        assert_eq!(engine.index().vocabulary_size(), 1);
    }

    #[test]
    fn test_stats() {
        let stats = weather_engine().stats();
        assert_eq!(stats.document_count, 3);
        assert_eq!(stats.vocabulary_size, 4);
        assert_eq!(stats.total_tokens, 9);
        assert!((stats.average_tokens - 3.0).abs() < EPSILON);
        let empty = Engine::build(&[], Cfg::new()).stats();
        assert_eq!(empty.average_tokens, 0.0);
    }

    #[test]
    fn test_compression() {
        let engine = weather_engine();
        let compressed = engine.compressed_index().unwrap();
        assert_eq!(compressed.get("snow"), Some(&vec![2, 1]));
        assert_eq!(engine.compression_ratio().unwrap(), 0.0);
    }

    #[test]
    fn test_save_all() {
        let dir = tempfile::tempdir().unwrap();
        let engine = weather_engine();
        engine.save_all(dir.path()).unwrap();
        for name in [DICTIONARY_FILE, INVERTED_INDEX_FILE, COMPRESSED_INDEX_FILE, TFIDF_FILE, SYNONYMS_FILE] {
            assert!(dir.path().join(name).is_file(), "{} missing", name);
        }
        let index = fs::read_to_string(dir.path().join(INVERTED_INDEX_FILE)).unwrap();
        assert_eq!(index, "and\tDoc1,Doc2,Doc3\nrain\tDoc1,Doc2\nsnow\tDoc2,Doc3\nsun\tDoc1,Doc3\n");
        let compressed = fs::read_to_string(dir.path().join(COMPRESSED_INDEX_FILE)).unwrap();
        assert!(compressed.contains("snow\t2,1\n"));
        let dictionary = fs::read_to_string(dir.path().join(DICTIONARY_FILE)).unwrap();
        assert!(dictionary.starts_with("and\t3\n"));
    }

    #[test]
    fn test_verify_exports() {
        let dir = tempfile::tempdir().unwrap();
        let engine = weather_engine();
        engine.save_all(dir.path()).unwrap();
        engine.verify_exports(dir.path()).unwrap();

        fs::write(dir.path().join(COMPRESSED_INDEX_FILE), "rain\t1\n").unwrap();
        assert!(matches!(
            engine.verify_exports(dir.path()),
            Err(IrError::ExportMismatch(name)) if name == COMPRESSED_INDEX_FILE
        ));
        fs::write(dir.path().join(DICTIONARY_FILE), "rain\t2\n").unwrap();
        assert!(matches!(
            engine.verify_exports(dir.path()),
            Err(IrError::ExportMismatch(name)) if name == DICTIONARY_FILE
        ));
        assert!(engine.verify_exports(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_save_all_skips_compression_for_named_docs() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::build(&docs(&[("notes", "rain"), ("Doc1", "rain")]), no_stemming());
        engine.save_all(dir.path()).unwrap();
        assert!(dir.path().join(INVERTED_INDEX_FILE).is_file());
        assert!(dir.path().join(TFIDF_FILE).is_file());
        assert!(!dir.path().join(COMPRESSED_INDEX_FILE).exists());
        engine.verify_exports(dir.path()).unwrap();
        assert!(matches!(engine.compression_ratio(), Err(IrError::MalformedDocId(_))));
    }

    #[test]
    fn test_save_and_load_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".rir/rir.idx");
        let engine = weather_engine();
        engine.save_to(&path).unwrap();
        let loaded = Engine::load_from(&path).unwrap();
        assert_eq!(loaded.doc_count(), 3);
        assert_eq!(loaded.index(), engine.index());
        assert_eq!(loaded.search("rain", 10, true), engine.search("rain", 10, true));
        assert_eq!(loaded.doc_path(&DocId::new("Doc2")), Some("Doc2.txt"));
        assert!(Engine::load_from(&dir.path().join("absent.idx")).is_err());
    }

    #[test]
    fn test_build_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Doc1.txt"), "Do you quarrel, sir?").unwrap();
        fs::write(dir.path().join("Doc2.txt"), "Quarrel sir! no, sir!").unwrap();
        fs::write(dir.path().join("Doc3.txt"), "Well, sir.").unwrap();
        fs::write(dir.path().join("synonyms.tsv"), "fight\tquarrel\n").unwrap();
        fs::write(dir.path().join(".rircfg"), "use_stemming: false\nsynonyms: synonyms.tsv\n").unwrap();

        let engine = Engine::build_from_dir(dir.path()).unwrap();
        assert_eq!(engine.doc_count(), 3);
        assert!(!engine.cfg().use_stemming);
        assert!(engine.search("fight", 10, false).is_empty());
        let results = engine.search("fight", 10, true);
        assert_eq!(ids(&results), vec!["Doc2", "Doc1"]);
    }

    #[test]
    fn test_build_from_dir_with_term_weights() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Doc1.txt"), "Sun and rain.").unwrap();
        fs::write(dir.path().join("Doc2.txt"), "Rain and snow.").unwrap();
        fs::write(dir.path().join("Doc3.txt"), "Sun and snow.").unwrap();
        fs::write(
            dir.path().join(".rircfg"),
            "use_stemming: false\nterm_weights:\n  sun: 3.0\n",
        )
        .unwrap();

        let engine = Engine::build_from_dir(dir.path()).unwrap();
        assert_eq!(engine.cfg().term_weights.get("sun"), Some(&3.0));
        assert_eq!(ids(&engine.search("sun rain", 10, false)), vec!["Doc1", "Doc2", "Doc3"]);
        assert_eq!(ids(&engine.search("sun rain", 10, true)), vec!["Doc1", "Doc3", "Doc2"]);
    }

    #[test]
    fn test_evaluate() {
        let engine = weather_engine();
        let mut evaluation = Evaluation::new();
        evaluation.add_query("Q1", "rain", ["Doc1"]);
        evaluation.add_query("Q2", "snow", ["Doc2", "Doc3"]);
        engine.evaluate(&mut evaluation, &[1, 2], false);
        assert!((evaluation.precision_at_k("Q1", 2) - 0.5).abs() < EPSILON);
        assert!((evaluation.mean_precision(1) - 1.0).abs() < EPSILON);
        assert!((evaluation.mean_precision(2) - 0.75).abs() < EPSILON);
    }
}
