use crate::ircore::common::DocId;
use crate::ircore::error::{IrError, Result};
use crate::ircore::ranking::DocScore;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};

const REPORT_TOP: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct EvalQuery {
    pub text: String,
    pub relevant: BTreeSet<DocId>,
}

/// Precision@k bookkeeping over a fixed set of judged queries.
#[derive(Debug, Default)]
pub struct Evaluation {
    queries: BTreeMap<String, EvalQuery>,
    results: BTreeMap<String, Vec<DocScore>>,
    // query id -> k -> precision
    precision: BTreeMap<String, BTreeMap<usize, f64>>,
}

impl Evaluation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_query<I, D>(&mut self, query_id: &str, text: &str, relevant: I)
    where
        I: IntoIterator<Item = D>,
        D: Into<DocId>,
    {
        self.queries.insert(
            query_id.to_owned(),
            EvalQuery {
                text: text.to_owned(),
                relevant: relevant.into_iter().map(Into::into).collect(),
            },
        );
    }

    pub fn queries(&self) -> impl Iterator<Item = (&String, &EvalQuery)> {
        self.queries.iter()
    }

    pub fn add_result(&mut self, query_id: &str, results: Vec<DocScore>) {
        self.results.insert(query_id.to_owned(), results);
    }

    /// Relevant documents among the first `k` results, divided by `k`.
    pub fn precision_at_k(&self, query_id: &str, k: usize) -> f64 {
        if k == 0 {
            return 0.0;
        }
        let (query, results) = match (self.queries.get(query_id), self.results.get(query_id)) {
            (Some(query), Some(results)) => (query, results),
            _ => return 0.0,
        };
        let hits = results
            .iter()
            .take(k)
            .filter(|doc| query.relevant.contains(&doc.docid))
            .count();
        hits as f64 / k as f64
    }

    pub fn evaluate_all(&mut self, k_values: &[usize]) {
        let mut precision = BTreeMap::new();
        for query_id in self.queries.keys() {
            let per_k: BTreeMap<usize, f64> = k_values
                .iter()
                .map(|&k| (k, self.precision_at_k(query_id, k)))
                .collect();
            precision.insert(query_id.clone(), per_k);
        }
        self.precision = precision;
    }

    // mean over the evaluated queries that have a value for k
    pub fn mean_precision(&self, k: usize) -> f64 {
        let values: Vec<f64> = self
            .precision
            .values()
            .filter_map(|per_k| per_k.get(&k).copied())
            .collect();
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    pub fn write_report<W: Write>(&self, writer: &mut W) -> Result<()> {
        let rule = "=".repeat(60);
        writeln!(writer, "{}", rule)?;
        writeln!(writer, "SYSTEM EVALUATION REPORT")?;
        writeln!(writer, "{}", rule)?;
        if self.precision.is_empty() {
            writeln!(writer, "No evaluation results.")?;
            return Ok(());
        }
        for (query_id, query) in &self.queries {
            writeln!(writer)?;
            writeln!(writer, "[Query {}] {}", query_id, query.text)?;
            let relevant: Vec<&str> = query.relevant.iter().map(|id| id.as_str()).collect();
            writeln!(writer, "Relevant documents: {}", relevant.join(", "))?;
            if let Some(results) = self.results.get(query_id) {
                writeln!(writer, "Retrieved documents (top-{}):", REPORT_TOP)?;
                for (rank, doc) in results.iter().take(REPORT_TOP).enumerate() {
                    let mark = if query.relevant.contains(&doc.docid) { "YES" } else { "NO" };
                    writeln!(
                        writer,
                        "  {:2}. {:8} {:.6} {}",
                        rank + 1,
                        doc.docid.as_str(),
                        doc.score,
                        mark
                    )?;
                }
            }
            if let Some(per_k) = self.precision.get(query_id) {
                writeln!(writer, "Precision values:")?;
                for (k, precision) in per_k {
                    writeln!(writer, "  Precision@{:2}: {:.4}", k, precision)?;
                }
            }
        }
        let ks: BTreeSet<usize> = self.precision.values().flat_map(|per_k| per_k.keys().copied()).collect();
        writeln!(writer)?;
        for k in ks {
            writeln!(writer, "Mean Precision@{:2}: {:.4}", k, self.mean_precision(k))?;
        }
        Ok(())
    }
}

/// Judged queries, one per line: `id\tquery text\tDocA,DocB,...`.
pub fn read_queries<R: BufRead>(reader: R) -> Result<Evaluation> {
    let mut evaluation = Evaluation::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 3 {
            return Err(IrError::parse(n + 1, "expected id, query and relevant documents"));
        }
        let relevant = fields[2]
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(DocId::new);
        evaluation.add_query(fields[0].trim(), fields[1].trim(), relevant);
    }
    Ok(evaluation)
}
