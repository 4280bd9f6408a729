//! Seeded sampling of fragment start lines and fragment lengths.
//!
//! Start lines are drawn uniformly from `1..=num_unique_positions`, lengths
//! from the normalized fragment-length distribution. All draws are with
//! replacement and come from a single Xoshiro256++ stream, so the same seed
//! always produces the same pairs.

use crate::types::{FragmentLengthDistribution, LinenumPair};
use anyhow::{Context, Result};
use rand::distributions::{Distribution, Uniform, WeightedIndex};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Iterator over sampled pairs; yields exactly `num_fragments` items.
pub struct LinenumSampler<'a> {
    lengths: &'a [i64],
    length_index: WeightedIndex<f64>,
    positions: Uniform<i64>,
    rng: Xoshiro256PlusPlus,
    remaining: u64,
}

impl<'a> Iterator for LinenumSampler<'a> {
    type Item = LinenumPair;

    fn next(&mut self) -> Option<LinenumPair> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let line = self.positions.sample(&mut self.rng) + 1;
        let fragment_length = self.lengths[self.length_index.sample(&mut self.rng)];
        Some(LinenumPair {
            line,
            fragment_length,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

/// Draw `num_fragments` (line, length) pairs.
pub fn sample(
    dist: &FragmentLengthDistribution,
    num_unique_positions: u64,
    num_fragments: u64,
    seed: u64,
) -> Result<LinenumSampler<'_>> {
    if num_unique_positions == 0 {
        anyhow::bail!("Number of unique positions must be at least 1");
    }
    let upper = i64::try_from(num_unique_positions)
        .with_context(|| format!("Too many unique positions: {}", num_unique_positions))?;
    let length_index =
        WeightedIndex::new(&dist.probabilities).context("Invalid fragment-length probabilities")?;

    Ok(LinenumSampler {
        lengths: &dist.lengths,
        length_index,
        positions: Uniform::new(0, upper),
        rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        remaining: num_fragments,
    })
}

/// Same draws as [`sample`], stably sorted by line number so the result can be
/// fed straight into the coordinate mapper.
pub fn sample_sorted(
    dist: &FragmentLengthDistribution,
    num_unique_positions: u64,
    num_fragments: u64,
    seed: u64,
) -> Result<Vec<LinenumPair>> {
    let mut pairs: Vec<LinenumPair> = sample(dist, num_unique_positions, num_fragments, seed)?.collect();
    pairs.sort_by_key(|p| p.line);
    Ok(pairs)
}
