use std::collections::HashMap;

/// Reciprocal Rank Fusion for combining multiple rankings
#[derive(Debug, Clone, Copy)]
pub struct RRFFusion {
    /// RRF constant k (typically 60)
    k: f64,
}

impl RRFFusion {
    pub fn new(k: f64) -> Self {
        Self { k }
    }

    /// Contribution of zero-based rank `rank`
    pub fn contribution(&self, rank: usize) -> f64 {
        1.0 / (self.k + rank as f64 + 1.0)
    }

    /// Fuse ranked id lists, best first.
    ///
    /// RRF formula: score(d) = Σ 1 / (k + rank_i(d) + 1)
    ///
    /// Ties keep the order in which ids first appear, scanning the lists in the order
    /// given. A repeated id within one list counts at its best rank only.
    pub fn fuse(&self, lists: &[&[String]], limit: usize) -> Vec<(String, f64)> {
        let mut scores: HashMap<&str, (usize, f64)> = HashMap::new();
        let mut order = 0usize;

        for list in lists {
            let mut seen = std::collections::HashSet::new();
            for (rank, id) in list.iter().enumerate() {
                if !seen.insert(id.as_str()) {
                    continue;
                }
                let entry = scores.entry(id.as_str()).or_insert_with(|| {
                    order += 1;
                    (order, 0.0)
                });
                entry.1 += self.contribution(rank);
            }
        }

        let mut fused: Vec<(&str, usize, f64)> = scores
            .into_iter()
            .map(|(id, (first_seen, score))| (id, first_seen, score))
            .collect();
        fused.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.1.cmp(&b.1)));
        fused.truncate(limit);

        fused
            .into_iter()
            .map(|(id, _, score)| (id.to_string(), score))
            .collect()
    }
}

impl Default for RRFFusion {
    fn default() -> Self {
        Self::new(60.0)
    }
}
