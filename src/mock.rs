//! Mock fallback dataset
//!
//! Static, hand-authored asset set served when no real fetch has ever
//! succeeded, so consumers always have a well-formed input. Never
//! refreshed, never expires.

use crate::types::AssetSnapshot;

fn snap(
    id: &str,
    ticker: &str,
    name: &str,
    price: f64,
    change_24h: f64,
    change_7d: f64,
    volume: f64,
    rank: u32,
) -> AssetSnapshot {
    AssetSnapshot {
        id: id.to_string(),
        ticker: ticker.to_string(),
        name: name.to_string(),
        price,
        change_24h_pct: change_24h,
        change_7d_pct: change_7d,
        volume,
        open_interest: None,
        funding_rate: None,
        rank,
    }
}

/// Representative top-of-market placeholder data.
pub fn mock_assets() -> Vec<AssetSnapshot> {
    vec![
        snap("bitcoin", "BTC", "Bitcoin", 67_240.0, 1.8, 4.6, 28_400_000_000.0, 1),
        snap("ethereum", "ETH", "Ethereum", 3_512.0, 2.4, 6.1, 14_100_000_000.0, 2),
        snap("tether", "USDT", "Tether", 1.0, 0.0, 0.0, 51_200_000_000.0, 3),
        snap("binancecoin", "BNB", "BNB", 586.0, -0.6, 1.9, 1_720_000_000.0, 4),
        snap("solana", "SOL", "Solana", 152.3, 4.1, 11.2, 3_860_000_000.0, 5),
        snap("ripple", "XRP", "XRP", 0.52, -1.3, -2.7, 1_140_000_000.0, 6),
        snap("cardano", "ADA", "Cardano", 0.44, 0.9, -0.8, 388_000_000.0, 7),
        snap("dogecoin", "DOGE", "Dogecoin", 0.128, 3.0, 8.4, 942_000_000.0, 8),
        snap("chainlink", "LINK", "Chainlink", 14.85, 1.1, 3.3, 312_000_000.0, 9),
        snap("polkadot", "DOT", "Polkadot", 6.12, -2.1, -4.4, 178_000_000.0, 10),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_set_is_ranked_and_well_formed() {
        let assets = mock_assets();
        assert!(!assets.is_empty());
        assert!(assets.len() <= 100);

        for (i, asset) in assets.iter().enumerate() {
            assert_eq!(asset.rank as usize, i + 1);
            assert!(asset.price > 0.0);
            assert!(asset.volume > 0.0);
            assert!(!asset.ticker.is_empty());
        }
    }
}
