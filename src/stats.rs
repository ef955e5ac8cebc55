use std::collections::HashMap;

use crate::dataset::Artifact;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("price overview is undefined for an empty dataset")]
pub struct EmptyDataset;

/// Quartiles by zero-based floor-division indexing into the sorted prices,
/// no interpolation; `avg` is the floored mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceOverview {
    pub p25: u32,
    pub p50: u32,
    pub p75: u32,
    pub avg: u32,
}

pub fn price_overview(artifacts: &[&Artifact]) -> Result<PriceOverview, EmptyDataset> {
    let mut prices: Vec<u32> = artifacts.iter().map(|a| a.price).collect();
    if prices.is_empty() {
        return Err(EmptyDataset);
    }
    prices.sort_unstable();
    let n = prices.len();
    let sum: u64 = prices.iter().map(|&p| u64::from(p)).sum();
    Ok(PriceOverview {
        p25: prices[n / 4],
        p50: prices[n / 2],
        p75: prices[n / 4 * 3],
        avg: (sum / n as u64) as u32,
    })
}

/// The three most frequent discount values and their share of all records.
///
/// Ranking is by descending count; equal counts keep the order in which the
/// discount value first appeared in `artifacts`. Callers pass the id-sorted
/// sequence so the outcome is deterministic.
pub fn discount_frequency(artifacts: &[&Artifact]) -> Vec<(u8, f64)> {
    let total = artifacts.len();
    if total == 0 {
        return Vec::new();
    }

    let mut first_seen: Vec<u8> = Vec::new();
    let mut counts: HashMap<u8, usize> = HashMap::new();
    for a in artifacts {
        let slot = counts.entry(a.discount).or_insert(0);
        if *slot == 0 {
            first_seen.push(a.discount);
        }
        *slot += 1;
    }

    // Stable sort keeps first-appearance order among equal counts.
    let mut ranked: Vec<(u8, usize)> = first_seen.iter().map(|d| (*d, counts[d])).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(3)
        .map(|(discount, count)| (discount, count as f64 / total as f64))
        .collect()
}
