//! Stateless retrieval-quality metrics: precision, recall, F1, average
//! precision, and DCG, computed over two parallel gold-standard/run files.
//!
//! Both files are line-delimited JSON, one object per line:
//! `{"query_id": <id>, "documents_pmid": [<pmid>, ...]}`. The gold file's
//! list is the relevant set; the run file's list is the ranked retrieval
//! result, most relevant first.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct QueryResult {
    query_id: String,
    documents_pmid: Vec<i64>,
}

/// Which metrics to compute for a query pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Precision,
    Recall,
    F1,
    Ap,
    Dcg,
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "precision" => Ok(Metric::Precision),
            "recall" => Ok(Metric::Recall),
            "f1" => Ok(Metric::F1),
            "ap" => Ok(Metric::Ap),
            "dcg" => Ok(Metric::Dcg),
            other => Err(other.to_string()),
        }
    }
}

/// Per-query metric values, keyed by query id.
pub type QueryScores = HashMap<String, f32>;

/// Load a gold/run file into `query_id -> ordered pmid list`.
fn load(path: &Path) -> std::io::Result<HashMap<String, Vec<i64>>> {
    let file = File::open(path)?;
    let mut map = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<QueryResult>(&line) {
            Ok(result) => {
                map.insert(result.query_id, result.documents_pmid);
            }
            Err(err) => {
                tracing::warn!(%err, line = %line, "skipping malformed evaluator line");
            }
        }
    }
    Ok(map)
}

/// Evaluate `run_path` against `gold_path` for the requested `metrics`,
/// returning one `QueryScores` map per requested metric.
pub fn evaluate(
    gold_path: &Path,
    run_path: &Path,
    metrics: &[Metric],
) -> std::io::Result<HashMap<Metric, QueryScores>> {
    let gold = load(gold_path)?;
    let run = load(run_path)?;

    let mut out: HashMap<Metric, QueryScores> = metrics.iter().map(|&m| (m, HashMap::new())).collect();

    for (query_id, relevant) in &gold {
        let retrieved = run.get(query_id).cloned().unwrap_or_default();
        let relevant_set: HashSet<i64> = relevant.iter().copied().collect();

        for &metric in metrics {
            let value = match metric {
                Metric::Precision => precision(&relevant_set, &retrieved),
                Metric::Recall => recall(&relevant_set, &retrieved),
                Metric::F1 => f1(&relevant_set, &retrieved),
                Metric::Ap => average_precision(&relevant_set, &retrieved),
                Metric::Dcg => dcg(&relevant_set, &retrieved),
            };
            out.get_mut(&metric).unwrap().insert(query_id.clone(), value);
        }
    }
    Ok(out)
}

fn precision(relevant: &HashSet<i64>, retrieved: &[i64]) -> f32 {
    if retrieved.is_empty() {
        return 0.0;
    }
    let hits = retrieved.iter().filter(|pmid| relevant.contains(pmid)).count();
    hits as f32 / retrieved.len() as f32
}

fn recall(relevant: &HashSet<i64>, retrieved: &[i64]) -> f32 {
    if relevant.is_empty() {
        return 0.0;
    }
    let hits = retrieved.iter().filter(|pmid| relevant.contains(pmid)).count();
    hits as f32 / relevant.len() as f32
}

fn f1(relevant: &HashSet<i64>, retrieved: &[i64]) -> f32 {
    let p = precision(relevant, retrieved);
    let r = recall(relevant, retrieved);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Average precision: mean of precision@k at each rank holding a relevant
/// document, divided by the number of relevant documents (not by the
/// number of hits), so a query that never retrieves all its relevant
/// documents is still penalized.
fn average_precision(relevant: &HashSet<i64>, retrieved: &[i64]) -> f32 {
    if relevant.is_empty() {
        return 0.0;
    }
    let mut hits = 0;
    let mut sum = 0.0;
    for (rank, pmid) in retrieved.iter().enumerate() {
        if relevant.contains(pmid) {
            hits += 1;
            sum += hits as f32 / (rank + 1) as f32;
        }
    }
    sum / relevant.len() as f32
}

/// Discounted cumulative gain with binary relevance, discounting rank `i`
/// (0-based) by `log2(i + 2)`.
fn dcg(relevant: &HashSet<i64>, retrieved: &[i64]) -> f32 {
    retrieved
        .iter()
        .enumerate()
        .filter(|(_, pmid)| relevant.contains(pmid))
        .map(|(i, _)| 1.0 / ((i as f32 + 2.0).log2()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_jsonl(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn scenario_from_the_seed_example() {
        let dir = tempfile::tempdir().unwrap();
        let gold = write_jsonl(dir.path(), "gold.jsonl", &[r#"{"query_id":"q1","documents_pmid":[1,2,3]}"#]);
        let run = write_jsonl(dir.path(), "run.jsonl", &[r#"{"query_id":"q1","documents_pmid":[1,4,2]}"#]);

        let metrics = [Metric::Precision, Metric::Recall, Metric::F1, Metric::Ap, Metric::Dcg];
        let scores = evaluate(&gold, &run, &metrics).unwrap();

        let precision = scores[&Metric::Precision]["q1"];
        let recall = scores[&Metric::Recall]["q1"];
        let f1 = scores[&Metric::F1]["q1"];
        let ap = scores[&Metric::Ap]["q1"];
        let dcg = scores[&Metric::Dcg]["q1"];

        assert!((precision - 2.0 / 3.0).abs() < 1e-6);
        assert!((recall - 2.0 / 3.0).abs() < 1e-6);
        assert!((f1 - 2.0 / 3.0).abs() < 1e-6);
        let expected_ap = (1.0 / 1.0 + 2.0 / 3.0) / 3.0;
        assert!((ap - expected_ap).abs() < 1e-6);
        let expected_dcg = 1.0 / 2.0f32.log2() + 1.0 / 4.0f32.log2();
        assert!((dcg - expected_dcg).abs() < 1e-6);
    }

    #[test]
    fn precision_is_zero_for_empty_retrieval() {
        let relevant: HashSet<i64> = [1, 2].into_iter().collect();
        assert_eq!(precision(&relevant, &[]), 0.0);
    }

    #[test]
    fn recall_is_zero_when_no_relevant_documents_exist() {
        let relevant: HashSet<i64> = HashSet::new();
        assert_eq!(recall(&relevant, &[1, 2]), 0.0);
    }
}
