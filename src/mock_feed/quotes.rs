// src/mock_feed/quotes.rs

use std::collections::BTreeMap;

use rand::rngs::OsRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

/// Generate a random last-trade price per pair symbol, formatted the way the
/// live feed formats them.
pub fn seed_prices(symbols: &[String]) -> BTreeMap<String, String> {
    let mut rng = ChaCha12Rng::from_rng(OsRng).unwrap();
    let mut prices = BTreeMap::new();

    for symbol in symbols {
        let price: f64 = rng.gen_range(0.0001..50_000.0);
        prices.insert(symbol.clone(), format!("{:.8}", price));
    }
    prices
}
