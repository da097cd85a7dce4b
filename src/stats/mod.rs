//! Median latency and ranking order for repeated region sampling

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

/// Samples accumulated for one region during ranking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSamples {
    pub code: String,
    /// Latencies of 200 responses
    pub samples: Vec<Duration>,
    /// Probes that returned another status or failed in transport
    pub errors: u32,
}

impl RegionSamples {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn add_sample(&mut self, latency: Duration) {
        self.samples.push(latency);
    }

    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    pub fn median(&self) -> Option<Duration> {
        median(&self.samples)
    }
}

/// A region's place in the ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRanking {
    /// 1-based position
    pub rank: usize,
    pub code: String,
    pub median: Option<Duration>,
    pub samples: usize,
    pub errors: u32,
}

/// Median of `samples`; the mean of the two middle values for even counts
pub fn median(samples: &[Duration]) -> Option<Duration> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2)
    } else {
        Some(sorted[mid])
    }
}

/// Order regions by ascending median. Regions without a single successful
/// sample go last; ties are broken by region code.
pub fn rank(regions: Vec<RegionSamples>) -> Vec<RegionRanking> {
    let mut rankings: Vec<RegionRanking> = regions
        .into_iter()
        .map(|region| RegionRanking {
            rank: 0,
            median: region.median(),
            samples: region.samples.len(),
            errors: region.errors,
            code: region.code,
        })
        .collect();

    rankings.sort_by(compare_rankings);
    for (index, ranking) in rankings.iter_mut().enumerate() {
        ranking.rank = index + 1;
    }

    rankings
}

fn compare_rankings(a: &RegionRanking, b: &RegionRanking) -> Ordering {
    match (a.median, b.median) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.code.cmp(&b.code))
}
