//! Derived metric computation
//!
//! Pure transforms over the current asset population: z-score
//! normalization of each feature plus the blended breakout proxy scores.
//! Deterministic given its input; recomputed from scratch every cycle.

use serde::{Deserialize, Serialize};

use crate::types::{AssetScores, AssetSnapshot, BreakoutSignal, DerivedMetrics};

/// Static weight table for the blended scores.
///
/// These are illustrative proxies, not validated trading signals; the
/// defaults mirror the dashboard's original tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// 24h-change weight in the relative-strength blend
    pub rs_weight_24h: f64,
    /// 7d-change weight in the relative-strength blend
    pub rs_weight_7d: f64,
    /// OI z-score weight in the composite score
    pub composite_oi_weight: f64,
    /// Price z-score weight in the composite score
    pub composite_price_weight: f64,
    /// Composite level above which an asset is flagged High
    pub signal_threshold: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            rs_weight_24h: 0.4,
            rs_weight_7d: 0.6,
            composite_oi_weight: 0.5,
            composite_price_weight: 0.5,
            signal_threshold: 1.0,
        }
    }
}

/// Compute derived scores for every asset in the set.
///
/// Empty input yields an empty map. The output covers exactly the input
/// population.
pub fn derive(assets: &[AssetSnapshot], weights: &ScoreWeights) -> DerivedMetrics {
    if assets.is_empty() {
        return DerivedMetrics::new();
    }

    let changes_24h: Vec<f64> = assets.iter().map(|a| a.change_24h_pct).collect();
    let volumes: Vec<f64> = assets.iter().map(|a| a.volume).collect();

    // CoinGecko's markets endpoint reports no open interest, so volume is
    // the OI proxy unless every asset carries a real figure.
    let oi_values: Vec<f64> = if assets.iter().all(|a| a.open_interest.is_some()) {
        assets.iter().map(|a| a.open_interest.unwrap_or(0.0)).collect()
    } else {
        volumes.clone()
    };

    let relative_strength: Vec<f64> = assets
        .iter()
        .map(|a| weights.rs_weight_24h * a.change_24h_pct + weights.rs_weight_7d * a.change_7d_pct)
        .collect();

    let price_z = zscores(&changes_24h);
    let volume_z = zscores(&volumes);
    let oi_z = zscores(&oi_values);
    let relative_strength_z = zscores(&relative_strength);

    let carry = if assets.iter().any(|a| a.funding_rate.is_some()) {
        let funding: Vec<f64> = assets.iter().map(|a| a.funding_rate.unwrap_or(0.0)).collect();
        zscores(&funding)
    } else {
        vec![0.0; assets.len()]
    };

    assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let composite =
                weights.composite_oi_weight * oi_z[i] + weights.composite_price_weight * price_z[i];
            let signal = if composite > weights.signal_threshold {
                BreakoutSignal::High
            } else {
                BreakoutSignal::Normal
            };

            (
                asset.id.clone(),
                AssetScores {
                    price_z: price_z[i],
                    volume_z: volume_z[i],
                    oi_z: oi_z[i],
                    relative_strength: relative_strength[i],
                    relative_strength_z: relative_strength_z[i],
                    composite,
                    volatility: asset.change_24h_pct.abs(),
                    htf_breakout: asset.change_7d_pct,
                    carry: carry[i],
                    signal,
                },
            )
        })
        .collect()
}

/// Population z-scores: `(x - mean) / stddev`.
///
/// A degenerate population (single asset, or all values equal) gets 0 for
/// every asset instead of a division by zero.
fn zscores(values: &[f64]) -> Vec<f64> {
    let mean = mean(values);
    let stddev = population_stddev(values, mean);
    if stddev == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mean) / stddev).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn asset(id: &str, price: f64, change_24h: f64, change_7d: f64, volume: f64) -> AssetSnapshot {
        AssetSnapshot {
            id: id.to_string(),
            ticker: id.to_uppercase(),
            name: id.to_string(),
            price,
            change_24h_pct: change_24h,
            change_7d_pct: change_7d,
            volume,
            open_interest: None,
            funding_rate: None,
            rank: 1,
        }
    }

    #[test]
    fn test_zscores_normalize_to_unit_population() {
        let values = vec![1.0, 4.0, 9.0, 16.0, 25.0];
        let z = zscores(&values);

        let z_mean = mean(&z);
        let z_std = population_stddev(&z, z_mean);
        assert!(z_mean.abs() < EPS);
        assert!((z_std - 1.0).abs() < EPS);
    }

    #[test]
    fn test_zscores_degenerate_population_is_zero() {
        assert_eq!(zscores(&[7.5, 7.5, 7.5]), vec![0.0, 0.0, 0.0]);
        assert_eq!(zscores(&[42.0]), vec![0.0]);
    }

    #[test]
    fn test_derive_empty_set_is_empty_map() {
        let metrics = derive(&[], &ScoreWeights::default());
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_derive_population_matches_input() {
        let assets = vec![
            asset("bitcoin", 67000.0, 1.5, 4.0, 28e9),
            asset("ethereum", 3500.0, -0.8, 2.1, 12e9),
            asset("solana", 150.0, 3.2, 9.5, 3e9),
        ];

        let metrics = derive(&assets, &ScoreWeights::default());

        assert_eq!(metrics.len(), assets.len());
        for a in &assets {
            assert!(metrics.contains_key(&a.id));
        }
    }

    #[test]
    fn test_derive_canned_three_asset_composite() {
        // prices 100/200/300, volumes 10/20/60
        let assets = vec![
            asset("alpha", 100.0, 1.0, 1.0, 10.0),
            asset("beta", 200.0, 2.0, 2.0, 20.0),
            asset("gamma", 300.0, 3.0, 3.0, 60.0),
        ];
        let weights = ScoreWeights::default();

        let metrics = derive(&assets, &weights);
        let again = derive(&assets, &weights);
        assert_eq!(metrics, again);

        // volumes: mean 30, population stddev sqrt(1400/3)
        let vol_std = (1400.0_f64 / 3.0).sqrt();
        let gamma = &metrics["gamma"];
        let expected_vol_z = 30.0 / vol_std;
        assert!((gamma.volume_z - expected_vol_z).abs() < EPS);
        // OI proxy falls back to volume, so oi_z tracks volume_z exactly
        assert!((gamma.oi_z - gamma.volume_z).abs() < EPS);

        // 24h changes: mean 2, stddev sqrt(2/3)
        let chg_std = (2.0_f64 / 3.0).sqrt();
        let expected_price_z = 1.0 / chg_std;
        assert!((gamma.price_z - expected_price_z).abs() < EPS);

        let expected_composite = 0.5 * expected_vol_z + 0.5 * expected_price_z;
        assert!((gamma.composite - expected_composite).abs() < EPS);
        assert_eq!(gamma.signal, BreakoutSignal::High);

        let alpha = &metrics["alpha"];
        assert!(alpha.composite < 0.0);
        assert_eq!(alpha.signal, BreakoutSignal::Normal);
    }

    #[test]
    fn test_relative_strength_blend() {
        let a = asset("bitcoin", 67000.0, 2.0, 5.0, 1.0);
        let b = asset("ethereum", 3500.0, -1.0, 1.0, 2.0);

        let metrics = derive(&[a, b], &ScoreWeights::default());

        // 0.4 * 24h + 0.6 * 7d
        assert!((metrics["bitcoin"].relative_strength - (0.4 * 2.0 + 0.6 * 5.0)).abs() < EPS);
        assert!((metrics["ethereum"].relative_strength - (0.4 * -1.0 + 0.6 * 1.0)).abs() < EPS);
    }

    #[test]
    fn test_volatility_and_htf_are_per_asset_passthroughs() {
        let metrics = derive(
            &[
                asset("bitcoin", 67000.0, -3.5, 6.0, 1.0),
                asset("ethereum", 3500.0, 1.0, -2.0, 2.0),
            ],
            &ScoreWeights::default(),
        );

        assert!((metrics["bitcoin"].volatility - 3.5).abs() < EPS);
        assert!((metrics["bitcoin"].htf_breakout - 6.0).abs() < EPS);
        assert!((metrics["ethereum"].htf_breakout + 2.0).abs() < EPS);
    }

    #[test]
    fn test_carry_zero_without_funding_data() {
        let metrics = derive(
            &[
                asset("bitcoin", 67000.0, 1.0, 2.0, 1.0),
                asset("ethereum", 3500.0, 2.0, 3.0, 2.0),
            ],
            &ScoreWeights::default(),
        );
        assert_eq!(metrics["bitcoin"].carry, 0.0);
        assert_eq!(metrics["ethereum"].carry, 0.0);
    }

    #[test]
    fn test_carry_uses_funding_when_reported() {
        let mut a = asset("perp-a", 1.0, 0.0, 0.0, 1.0);
        let mut b = asset("perp-b", 2.0, 0.0, 0.0, 2.0);
        let mut c = asset("perp-c", 3.0, 0.0, 0.0, 3.0);
        a.funding_rate = Some(0.01);
        b.funding_rate = Some(0.02);
        c.funding_rate = Some(0.03);

        let metrics = derive(&[a, b, c], &ScoreWeights::default());

        assert!(metrics["perp-a"].carry < 0.0);
        assert!(metrics["perp-b"].carry.abs() < EPS);
        assert!(metrics["perp-c"].carry > 0.0);
    }

    #[test]
    fn test_real_open_interest_used_when_fully_reported() {
        let mut a = asset("perp-a", 1.0, 0.0, 0.0, 100.0);
        let mut b = asset("perp-b", 2.0, 0.0, 0.0, 100.0);
        // OI ordering is the reverse of volume ordering
        a.open_interest = Some(500.0);
        b.open_interest = Some(100.0);

        let metrics = derive(&[a, b], &ScoreWeights::default());

        assert!(metrics["perp-a"].oi_z > 0.0);
        assert!(metrics["perp-b"].oi_z < 0.0);
        // equal volumes still z-score to zero
        assert_eq!(metrics["perp-a"].volume_z, 0.0);
    }
}
