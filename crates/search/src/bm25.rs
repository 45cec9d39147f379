//! BM25 (Okapi) keyword ranking.

use crate::config::SearchConfig;
use crate::error::Result;
use crate::tokenize::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    pub epsilon: f64,
}

impl From<&SearchConfig> for Bm25Params {
    fn from(config: &SearchConfig) -> Self {
        Self {
            k1: config.k1,
            b: config.b,
            epsilon: config.epsilon,
        }
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        (&SearchConfig::default()).into()
    }
}

/// Term statistics over a tokenized corpus.
///
/// Terms whose IDF would be negative (present in more than half of the documents) get
/// `epsilon * mean_idf` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bm25Model {
    params: Bm25Params,
    doc_freqs: Vec<BTreeMap<String, u32>>,
    doc_len: Vec<usize>,
    avgdl: f64,
    idf: BTreeMap<String, f64>,
}

impl Bm25Model {
    pub fn new(corpus: &[Vec<String>], params: Bm25Params) -> Self {
        let mut doc_freqs = Vec::with_capacity(corpus.len());
        let mut doc_len = Vec::with_capacity(corpus.len());
        let mut containing: BTreeMap<String, usize> = BTreeMap::new();

        for document in corpus {
            let mut frequencies: BTreeMap<String, u32> = BTreeMap::new();
            for token in document {
                *frequencies.entry(token.clone()).or_insert(0) += 1;
            }
            for term in frequencies.keys() {
                *containing.entry(term.clone()).or_insert(0) += 1;
            }
            doc_len.push(document.len());
            doc_freqs.push(frequencies);
        }

        let total: usize = doc_len.iter().sum();
        let avgdl = if corpus.is_empty() {
            0.0
        } else {
            total as f64 / corpus.len() as f64
        };

        let n = corpus.len() as f64;
        let mut idf: BTreeMap<String, f64> = containing
            .into_iter()
            .map(|(term, count)| {
                let count = count as f64;
                (term, (n - count + 0.5).ln() - (count + 0.5).ln())
            })
            .collect();

        if !idf.is_empty() {
            let mean = idf.values().sum::<f64>() / idf.len() as f64;
            let floor = params.epsilon * mean;
            for value in idf.values_mut() {
                if *value < 0.0 {
                    *value = floor;
                }
            }
        }

        Self {
            params,
            doc_freqs,
            doc_len,
            avgdl,
            idf,
        }
    }

    /// Score of every document for the query tokens, in corpus order
    pub fn scores(&self, query: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_freqs.len()];
        if self.avgdl <= 0.0 {
            return scores;
        }

        let Bm25Params { k1, b, .. } = self.params;
        for term in query {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };
            for (doc, score) in scores.iter_mut().enumerate() {
                let freq = self.doc_freqs[doc].get(term).copied().unwrap_or(0) as f64;
                if freq == 0.0 {
                    continue;
                }
                let norm = k1 * (1.0 - b + b * self.doc_len[doc] as f64 / self.avgdl);
                *score += idf * (freq * (k1 + 1.0) / (freq + norm));
            }
        }
        scores
    }

    pub fn len(&self) -> usize {
        self.doc_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_freqs.is_empty()
    }
}

/// BM25 model plus the node id of each document, by position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordIndex {
    pub model: Bm25Model,
    pub node_map: Vec<String>,
}

impl KeywordIndex {
    /// Build from `(node_id, text)` pairs; texts without tokens are left out
    pub fn build(documents: impl IntoIterator<Item = (String, String)>, params: Bm25Params) -> Self {
        let mut corpus = Vec::new();
        let mut node_map = Vec::new();
        for (id, text) in documents {
            let tokens = tokenize(&text);
            if tokens.is_empty() {
                continue;
            }
            corpus.push(tokens);
            node_map.push(id);
        }

        log::info!("Keyword index built over {} nodes", node_map.len());
        Self {
            model: Bm25Model::new(&corpus, params),
            node_map,
        }
    }

    /// Node ids with a positive score, best first; equal scores keep corpus order
    pub fn search(&self, query: &str, limit: usize) -> Vec<(String, f64)> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<(usize, f64)> = self
            .model
            .scores(&tokens)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);

        ranked
            .into_iter()
            .filter_map(|(doc, score)| self.node_map.get(doc).map(|id| (id.clone(), score)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        codemap_graph::write_json(path, self).await?;
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let index = codemap_graph::read_json("keyword index", path).await?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn docs() -> Vec<(String, String)> {
        [
            ("m.load_config", "function load_config reads the yaml config file"),
            ("m.save_user", "function save_user writes a user row"),
            ("m.parse", "function parse tokenizes input text"),
            ("m.empty", "  "),
            ("m.render", "function render draws the user page"),
            ("m.delete", "function delete removes a row"),
            ("m.log", "function log prints a line"),
        ]
        .iter()
        .map(|(id, text)| (id.to_string(), text.to_string()))
        .collect()
    }

    #[test]
    fn ranks_matching_documents() {
        let index = KeywordIndex::build(docs(), Bm25Params::default());
        assert_eq!(index.len(), 6);

        let hits = index.search("config", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "m.load_config");

        let users: Vec<String> = index.search("user", 10).into_iter().map(|h| h.0).collect();
        assert_eq!(users, vec!["m.save_user", "m.render"]);
    }

    #[test]
    fn unknown_terms_score_nothing() {
        let index = KeywordIndex::build(docs(), Bm25Params::default());
        assert!(index.search("kubernetes", 10).is_empty());
        assert!(index.search("", 10).is_empty());
    }

    #[test]
    fn common_terms_use_the_epsilon_floor() {
        let corpus: Vec<Vec<String>> = vec![
            vec!["a".into(), "b".into()],
            vec!["a".into(), "c".into()],
            vec!["a".into(), "d".into()],
        ];
        let model = Bm25Model::new(&corpus, Bm25Params::default());
        let idf_b = (3.0f64 - 1.0 + 0.5).ln() - (1.0f64 + 0.5).ln();
        let idf_a = (3.0f64 - 3.0 + 0.5).ln() - (3.0f64 + 0.5).ln();
        let mean = (idf_a + 3.0 * idf_b) / 4.0;
        assert!((model.idf["a"] - 0.25 * mean).abs() < 1e-12);
        assert!((model.idf["b"] - idf_b).abs() < 1e-12);

        let scores = model.scores(&["b".to_string()]);
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn serializes_model_and_node_map() {
        let index = KeywordIndex::build(docs(), Bm25Params::default());
        let json = serde_json::to_value(&index).unwrap();
        assert!(json.get("model").is_some());
        assert_eq!(json["node_map"][0], "m.load_config");

        let back: KeywordIndex = serde_json::from_value(json).unwrap();
        assert_eq!(back.node_map, index.node_map);
        let ids = |idx: &KeywordIndex| -> Vec<String> {
            idx.search("user row", 10).into_iter().map(|h| h.0).collect()
        };
        assert_eq!(ids(&back), ids(&index));
    }
}
