pub mod vsm;

use crate::ircore::common::DocId;
use crate::ircore::error::Result;
use crate::ircore::utils::serialize::create_text_file;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocScore {
    pub docid: DocId,
    pub score: f64,
}

// score descending, ties broken by ascending document id
pub fn sort_scores(scores: &mut [DocScore]) {
    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.docid.cmp(&b.docid))
    });
}

// rank\tdocid\tscore
pub fn write_results<W: Write>(writer: &mut W, results: &[DocScore]) -> Result<()> {
    for (rank, doc) in results.iter().enumerate() {
        writeln!(writer, "{}\t{}\t{:.6}", rank + 1, doc.docid, doc.score)?;
    }
    Ok(())
}

pub fn save_results(path: &Path, results: &[DocScore]) -> Result<()> {
    let mut writer = create_text_file(path)?;
    write_results(&mut writer, results)?;
    writer.flush()?;
    log::info!("results saved to {}", path.display());
    Ok(())
}
