use crate::types::{QValueResult, ScoreRecord};
use anyhow::Result;

/// Empirical null distribution: scores sorted ascending, with the tail
/// probability of each sorted position.
#[derive(Debug, Clone)]
pub struct NullDistribution {
    sorted: Vec<f64>,
    tail: Vec<f64>,
}

impl NullDistribution {
    /// Sort the null scores and build the tail-probability table.
    ///
    /// Duplicates are kept; rank position matters for ties.
    pub fn new(mut scores: Vec<f64>) -> Result<Self> {
        if scores.is_empty() {
            anyhow::bail!("Null distribution is empty; need at least one score");
        }
        scores.sort_by(|a, b| a.total_cmp(b));

        let n = scores.len();
        let n_f64 = n as f64;
        // (i + 1) / N for ascending rank i, reversed
        let mut tail: Vec<f64> = (1..=n).map(|k| k as f64 / n_f64).collect();
        tail.reverse();

        Ok(NullDistribution {
            sorted: scores,
            tail,
        })
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn sorted_scores(&self) -> &[f64] {
        &self.sorted
    }

    pub fn tail_probabilities(&self) -> &[f64] {
        &self.tail
    }

    /// Leftmost insertion index of `z`: every score before it is `< z`.
    pub fn bisect_left(&self, z: f64) -> usize {
        self.sorted.partition_point(|&x| x < z)
    }

    /// Fraction of the null distribution at or above `z`.
    ///
    /// A score tied with null values is placed before all of them, which gives
    /// the higher q-value among ties. Scores above every null value get 0.
    pub fn q_value(&self, z: f64) -> f64 {
        let i = self.bisect_left(z);
        if i == self.sorted.len() {
            0.0
        } else {
            self.tail[i]
        }
    }
}

/// Attach a q-value to every observed record, lazily and in input order.
pub fn compute_q_values<'a, I>(null: &'a NullDistribution, observed: I) -> impl Iterator<Item = Result<QValueResult>> + 'a
where
    I: IntoIterator<Item = Result<ScoreRecord>>,
    I::IntoIter: 'a,
{
    observed.into_iter().map(move |record| {
        let record = record?;
        let q_value = null.q_value(record.score);
        Ok(QValueResult { record, q_value })
    })
}

/// Running summary of emitted q-values, for the stderr report.
#[derive(Debug, Default, Clone)]
pub struct QValueSummary {
    pub n_observed: u64,
    pub n_at_or_below: u64,
    pub min_q: Option<f64>,
}

impl QValueSummary {
    pub fn add(&mut self, q: f64, threshold: f64) {
        self.n_observed += 1;
        if q <= threshold {
            self.n_at_or_below += 1;
        }
        self.min_q = Some(self.min_q.map_or(q, |m| m.min(q)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(score: f64) -> Result<ScoreRecord> {
        Ok(ScoreRecord {
            fields: vec!["x".to_string(), score.to_string()],
            score,
        })
    }

    #[test]
    fn test_tail_table() {
        let null = NullDistribution::new(vec![3.0, 1.0, 2.0]).unwrap();
        assert_eq!(null.sorted_scores(), &[1.0, 2.0, 3.0]);
        let tail = null.tail_probabilities();
        assert_relative_eq!(tail[0], 1.0);
        assert_relative_eq!(tail[1], 2.0 / 3.0);
        assert_relative_eq!(tail[2], 1.0 / 3.0);
    }

    #[test]
    fn test_worked_example() {
        let null = NullDistribution::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(format!("{:.4}", null.q_value(2.0)), "0.6667");
        assert_eq!(null.q_value(5.0), 0.0);
        assert_relative_eq!(null.q_value(0.5), 1.0);
    }

    #[test]
    fn test_boundaries() {
        let null = NullDistribution::new(vec![4.0, 4.0, 7.5, 9.0]).unwrap();
        // at or below the minimum
        assert_relative_eq!(null.q_value(4.0), 1.0);
        assert_relative_eq!(null.q_value(-100.0), 1.0);
        // equal to the maximum is not above it
        assert_relative_eq!(null.q_value(9.0), 0.25);
        assert_eq!(null.q_value(9.0001), 0.0);
    }

    #[test]
    fn test_ties_take_conservative_rank() {
        let null = NullDistribution::new(vec![1.0, 2.0, 2.0, 2.0, 3.0]).unwrap();
        assert_eq!(null.bisect_left(2.0), 1);
        assert_relative_eq!(null.q_value(2.0), 0.8);
        // just above the tied block
        assert_relative_eq!(null.q_value(2.5), 0.2);
    }

    #[test]
    fn test_monotone_and_in_range() {
        let scores: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 / 7.0).collect();
        let null = NullDistribution::new(scores).unwrap();
        let mut prev = f64::INFINITY;
        for k in -50..400 {
            let z = k as f64 * 0.05;
            let q = null.q_value(z);
            assert!((0.0..=1.0).contains(&q), "q out of range: {}", q);
            assert!(q <= prev, "q increased at z={}", z);
            prev = q;
        }
    }

    #[test]
    fn test_nan_score_bisects_to_front() {
        let null = NullDistribution::new(vec![1.0, 2.0]).unwrap();
        assert_relative_eq!(null.q_value(f64::NAN), 1.0);
    }

    #[test]
    fn test_empty_null_rejected() {
        assert!(NullDistribution::new(vec![]).is_err());
    }

    #[test]
    fn test_compute_q_values_preserves_order() {
        let null = NullDistribution::new(vec![1.0, 2.0, 3.0]).unwrap();
        let observed = vec![record(5.0), record(0.5), record(2.0)];
        let results: Vec<_> = compute_q_values(&null, observed)
            .collect::<Result<_>>()
            .unwrap();
        let qs: Vec<f64> = results.iter().map(|r| r.q_value).collect();
        assert_relative_eq!(qs[0], 0.0);
        assert_relative_eq!(qs[1], 1.0);
        assert_relative_eq!(qs[2], 2.0 / 3.0);
        assert_eq!(results[1].record.fields[0], "x");
    }

    #[test]
    fn test_compute_q_values_propagates_errors() {
        let null = NullDistribution::new(vec![1.0]).unwrap();
        let observed = vec![record(0.0), Err(anyhow::anyhow!("bad row"))];
        let results: Result<Vec<_>> = compute_q_values(&null, observed).collect();
        assert!(results.is_err());
    }

    #[test]
    fn test_summary() {
        let mut summary = QValueSummary::default();
        for q in [0.5, 0.01, 0.05, 0.2] {
            summary.add(q, 0.05);
        }
        assert_eq!(summary.n_observed, 4);
        assert_eq!(summary.n_at_or_below, 2);
        assert_eq!(summary.min_q, Some(0.01));
    }
}
