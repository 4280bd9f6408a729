/// A tab-delimited input row carrying a score in one of its columns
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub fields: Vec<String>,
    pub score: f64,
}

impl ScoreRecord {
    /// The record as it was read, fields re-joined with tabs.
    pub fn raw(&self) -> String {
        self.fields.join("\t")
    }
}

/// A uniquely-mappable genomic segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub contig: String,
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A sampled (line number, fragment length) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinenumPair {
    pub line: i64,
    pub fragment_length: i64,
}

/// One-base tag coordinate emitted for each fragment end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub contig: String,
    pub start: i64,
    pub end: i64,
}

impl TagRecord {
    pub fn at(contig: &str, start: i64) -> Self {
        TagRecord {
            contig: contig.to_string(),
            start,
            end: start + 1,
        }
    }
}

/// An observed record together with its empirical q-value
#[derive(Debug, Clone)]
pub struct QValueResult {
    pub record: ScoreRecord,
    pub q_value: f64,
}

/// Fragment-length distribution with weights normalized to sum to one
#[derive(Debug, Clone)]
pub struct FragmentLengthDistribution {
    pub lengths: Vec<i64>,
    pub probabilities: Vec<f64>,
}

impl FragmentLengthDistribution {
    /// Build from raw (length, weight) rows, normalizing the weights.
    pub fn from_weights(rows: Vec<(i64, f64)>) -> anyhow::Result<Self> {
        if rows.is_empty() {
            anyhow::bail!("Fragment-length distribution is empty");
        }
        if let Some(&(len, w)) = rows.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            anyhow::bail!("Invalid weight {} for fragment length {}", w, len);
        }
        let total: f64 = rows.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            anyhow::bail!("Fragment-length weights sum to {}; need a positive total", total);
        }

        let (lengths, weights): (Vec<i64>, Vec<f64>) = rows.into_iter().unzip();
        let probabilities = weights.into_iter().map(|w| w / total).collect();
        Ok(FragmentLengthDistribution {
            lengths,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalizes_weights() {
        let dist = FragmentLengthDistribution::from_weights(vec![(100, 2.0), (200, 6.0)]).unwrap();
        assert_eq!(dist.lengths, vec![100, 200]);
        assert_relative_eq!(dist.probabilities[0], 0.25);
        assert_relative_eq!(dist.probabilities[1], 0.75);
    }

    #[test]
    fn test_rejects_bad_weights() {
        assert!(FragmentLengthDistribution::from_weights(vec![]).is_err());
        assert!(FragmentLengthDistribution::from_weights(vec![(100, 0.0)]).is_err());
        assert!(FragmentLengthDistribution::from_weights(vec![(100, -1.0), (200, 3.0)]).is_err());
        assert!(FragmentLengthDistribution::from_weights(vec![(100, f64::NAN)]).is_err());
    }

    #[test]
    fn test_tag_record_is_one_base() {
        let tag = TagRecord::at("chr1", 41);
        assert_eq!(tag.end - tag.start, 1);
    }
}
