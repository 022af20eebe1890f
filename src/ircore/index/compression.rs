use crate::ircore::common::{DocId, DocKey, Term};
use crate::ircore::error::{IrError, Result};
use crate::ircore::index::pl::{InvertedIndex, PostingsList};
use crate::ircore::utils::serialize::{create_text_file, open_text_file};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

pub type Gaps = Vec<DocKey>;

/// Gap encoding: the first numeric key, then the distance to each following
/// key. Every member needs a numeric key (a canonical `Doc<n>` id).
pub fn encode(postings: &PostingsList) -> Result<Gaps> {
    let mut keys = Vec::with_capacity(postings.len());
    for doc_id in postings {
        let key = doc_id
            .key()
            .ok_or_else(|| IrError::MalformedDocId(doc_id.as_str().to_owned()))?;
        keys.push(key);
    }
    keys.sort_unstable();
    let mut gaps = Vec::with_capacity(keys.len());
    let mut prev: Option<DocKey> = None;
    for key in keys {
        match prev {
            None => gaps.push(key),
            Some(p) if p == key => return Err(IrError::DuplicateDocKey(key)),
            Some(p) => gaps.push(key - p),
        }
        prev = Some(key);
    }
    Ok(gaps)
}

pub fn decode(gaps: &[DocKey]) -> Result<PostingsList> {
    let mut postings = PostingsList::new();
    let mut current: Option<DocKey> = None;
    for (i, &gap) in gaps.iter().enumerate() {
        let key = match current {
            None => gap,
            Some(_) if gap == 0 => {
                return Err(IrError::InvalidGap(format!("zero gap at position {}", i)))
            }
            Some(prev) => prev
                .checked_add(gap)
                .ok_or_else(|| IrError::InvalidGap(format!("key overflow at position {}", i)))?,
        };
        postings.insert(DocId::from_key(key));
        current = Some(key);
    }
    Ok(postings)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompressedIndex {
    gaps: BTreeMap<Term, Gaps>,
}

impl CompressedIndex {
    pub fn get(&self, term: &str) -> Option<&Gaps> {
        self.gaps.get(term)
    }

    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }

    // total number of stored gap values
    pub fn entries_count(&self) -> usize {
        self.gaps.values().map(|gaps| gaps.len()).sum()
    }

    // term\tgap1,gap2,...
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (term, gaps) in &self.gaps {
            let gaps_str: Vec<String> = gaps.iter().map(|gap| gap.to_string()).collect();
            writeln!(writer, "{}\t{}", term, gaps_str.join(","))?;
        }
        Ok(())
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut gaps = BTreeMap::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (term, gaps_str) = line
                .split_once('\t')
                .ok_or_else(|| IrError::parse(n + 1, "missing tab separator"))?;
            let term_gaps = gaps_str
                .split(',')
                .map(|gap| {
                    gap.trim()
                        .parse::<DocKey>()
                        .map_err(|e| IrError::parse(n + 1, format!("gap {:?}: {}", gap, e)))
                })
                .collect::<Result<Gaps>>()?;
            gaps.insert(term.to_owned(), term_gaps);
        }
        Ok(CompressedIndex { gaps })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut writer = create_text_file(path)?;
        self.write_to(&mut writer)?;
        writer.flush()?;
        log::info!("compressed index saved to {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let compressed = Self::read_from(open_text_file(path)?)?;
        log::info!("compressed index loaded from {}", path.display());
        Ok(compressed)
    }
}

pub fn compress_index(index: &InvertedIndex) -> Result<CompressedIndex> {
    let mut gaps = BTreeMap::new();
    for (term, postings) in index.postings_lists() {
        gaps.insert(term.clone(), encode(postings)?);
    }
    Ok(CompressedIndex { gaps })
}

pub fn decompress_index(compressed: &CompressedIndex) -> Result<InvertedIndex> {
    let mut postings_lists = BTreeMap::new();
    for (term, gaps) in &compressed.gaps {
        postings_lists.insert(term.clone(), decode(gaps)?);
    }
    Ok(InvertedIndex::from_postings(postings_lists))
}

/// Percentage of postings entries saved by the compressed form, 0 for an
/// empty index.
pub fn compression_ratio(original: &InvertedIndex, compressed: &CompressedIndex) -> f64 {
    let original_size = original.postings_count();
    if original_size == 0 {
        return 0.0;
    }
    let compressed_size = compressed.entries_count();
    (1.0 - compressed_size as f64 / original_size as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ircore::index::pl::tests::tokenized;

    fn postings(names: &[&str]) -> PostingsList {
        names.iter().map(|name| DocId::new(*name)).collect()
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(&postings(&["Doc4", "Doc1", "Doc3"])).unwrap(), vec![1, 2, 1]);
        assert_eq!(encode(&postings(&["Doc2", "Doc10"])).unwrap(), vec![2, 8]);
        assert_eq!(encode(&postings(&["Doc0"])).unwrap(), vec![0]);
        assert_eq!(encode(&PostingsList::new()).unwrap(), Gaps::new());
    }

    #[test]
    fn test_encode_malformed() {
        let res = encode(&postings(&["Doc1", "notes"]));
        assert!(matches!(res, Err(IrError::MalformedDocId(name)) if name == "notes"));
        assert!(encode(&postings(&["Doc01"])).is_err());
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(&[1, 2, 1]).unwrap(), postings(&["Doc1", "Doc3", "Doc4"]));
        assert!(decode(&[]).unwrap().is_empty());
        assert!(matches!(decode(&[3, 0]), Err(IrError::InvalidGap(_))));
        assert!(matches!(decode(&[u32::MAX, 1]), Err(IrError::InvalidGap(_))));
    }

    #[test]
    fn test_round_trip() {
        let sets = [
            postings(&["Doc1"]),
            postings(&["Doc0", "Doc1", "Doc2"]),
            postings(&["Doc5", "Doc17", "Doc1000", "Doc1001"]),
            postings(&["Doc4294967295", "Doc7"]),
        ];
        for set in sets.iter() {
            assert_eq!(&decode(&encode(set).unwrap()).unwrap(), set);
        }
    }

    #[test]
    fn test_compress_and_decompress_index() {
        let mut idx = InvertedIndex::new();
        idx.build(&tokenized(&[
            ("Doc1", "sun and rain"),
            ("Doc3", "rain and snow"),
            ("Doc4", "rain wind"),
            ("Doc5", "sun"),
        ]));
        let compressed = compress_index(&idx).unwrap();
        assert_eq!(compressed.get("rain"), Some(&vec![1, 2, 1]));
        assert_eq!(compressed.get("sun"), Some(&vec![1, 4]));
        assert_eq!(compressed.len(), idx.vocabulary_size());
        assert_eq!(decompress_index(&compressed).unwrap(), idx);
        // gap encoding keeps one value per posting
        assert_eq!(compression_ratio(&idx, &compressed), 0.0);
    }

    #[test]
    fn test_compress_index_with_malformed_id() {
        let mut idx = InvertedIndex::new();
        idx.build(&tokenized(&[("Doc1", "rain"), ("readme", "rain")]));
        assert!(matches!(compress_index(&idx), Err(IrError::MalformedDocId(_))));
        // the index itself is untouched and still searchable
        assert_eq!(idx.document_frequency("rain"), 2);
    }

    #[test]
    fn test_compression_ratio() {
        let empty = InvertedIndex::new();
        assert_eq!(compression_ratio(&empty, &CompressedIndex::default()), 0.0);
        let mut idx = InvertedIndex::new();
        idx.build(&tokenized(&[("Doc1", "a b"), ("Doc2", "a b")]));
        let mut compressed = compress_index(&idx).unwrap();
        compressed.gaps.insert("b".to_string(), vec![1]);
        assert!((compression_ratio(&idx, &compressed) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_write_and_read() {
        let mut idx = InvertedIndex::new();
        idx.build(&tokenized(&[("Doc2", "rain"), ("Doc9", "rain snow")]));
        let compressed = compress_index(&idx).unwrap();
        let mut out = Vec::new();
        compressed.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "rain\t2,7\nsnow\t9\n");
        assert_eq!(CompressedIndex::read_from(text.as_bytes()).unwrap(), compressed);
        assert!(matches!(
            CompressedIndex::read_from("rain\t2,x\n".as_bytes()),
            Err(IrError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compressed_index.txt");
        let mut idx = InvertedIndex::new();
        idx.build(&tokenized(&[("Doc1", "rain"), ("Doc3", "rain")]));
        let compressed = compress_index(&idx).unwrap();
        compressed.save_to_file(&path).unwrap();
        let loaded = CompressedIndex::load_from_file(&path).unwrap();
        assert_eq!(decompress_index(&loaded).unwrap(), idx);
    }
}
