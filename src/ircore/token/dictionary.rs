use crate::ircore::common::Term;
use crate::ircore::error::{IrError, Result};
use crate::ircore::index::pl::InvertedIndex;
use crate::ircore::utils::serialize::{create_text_file, open_text_file};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Term -> document frequency, the view written to `dictionary.txt`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dictionary {
    document_frequency: BTreeMap<Term, usize>,
}

impl Dictionary {
    pub fn from_index(index: &InvertedIndex) -> Self {
        let document_frequency = index
            .postings_lists()
            .iter()
            .map(|(term, postings)| (term.clone(), postings.len()))
            .collect();
        Dictionary { document_frequency }
    }

    pub fn get(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    pub fn term_count(&self) -> usize {
        self.document_frequency.len()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (term, df) in &self.document_frequency {
            writeln!(writer, "{}\t{}", term, df)?;
        }
        Ok(())
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut document_frequency = BTreeMap::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let (term, df) = line
                .split_once('\t')
                .ok_or_else(|| IrError::parse(n + 1, "missing tab separator"))?;
            let df = df
                .trim()
                .parse::<usize>()
                .map_err(|e| IrError::parse(n + 1, e.to_string()))?;
            document_frequency.insert(term.to_owned(), df);
        }
        Ok(Dictionary { document_frequency })
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut writer = create_text_file(path)?;
        self.write_to(&mut writer)?;
        writer.flush()?;
        log::info!("dictionary saved to {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::read_from(open_text_file(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ircore::index::pl::tests::tokenized;

    #[test]
    fn test_dictionary() {
        let mut index = InvertedIndex::new();
        index.build(&tokenized(&[
            ("Doc1", "sun and rain"),
            ("Doc2", "rain and snow rain"),
        ]));
        let dict = Dictionary::from_index(&index);
        assert_eq!(dict.term_count(), 4);
        assert_eq!(dict.get("rain"), 2);
        assert_eq!(dict.get("sun"), 1);
        assert_eq!(dict.get("hail"), 0);

        let mut out = Vec::new();
        dict.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "and\t2\nrain\t2\nsnow\t1\nsun\t1\n");
        assert_eq!(Dictionary::read_from(text.as_bytes()).unwrap(), dict);
        assert!(Dictionary::read_from("rain\tmany\n".as_bytes()).is_err());
    }
}
