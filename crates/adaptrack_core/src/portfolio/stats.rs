//! Distribution statistics over portfolio metrics.

use serde::{Deserialize, Serialize};

/// Five-number summary plus mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summarizes the finite values; `None` when there are none.
///
/// Quartiles use linear interpolation between closest ranks.
pub fn distribution(values: &[f64]) -> Option<Distribution> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    Some(Distribution {
        count,
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[count - 1],
        mean,
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram over the observed range of the finite values.
///
/// The last bucket is closed on both ends. A degenerate range collapses to a
/// single bucket.
pub fn histogram(values: &[f64], buckets: usize) -> Vec<HistogramBucket> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || buckets == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBucket {
            lower: min,
            upper: max,
            count: finite.len(),
        }];
    }

    let width = (max - min) / buckets as f64;
    let mut out: Vec<HistogramBucket> = (0..buckets)
        .map(|index| HistogramBucket {
            lower: min + width * index as f64,
            upper: if index + 1 == buckets {
                max
            } else {
                min + width * (index + 1) as f64
            },
            count: 0,
        })
        .collect();
    for value in finite {
        let index = (((value - min) / width) as usize).min(buckets - 1);
        out[index].count += 1;
    }
    out
}
