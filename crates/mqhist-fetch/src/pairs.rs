//! Symbols published by the history server.

/// Every symbol the history server publishes archives for.
pub const DEFAULT_PAIRS: &[&str] = &[
    "AUDJPY", "AUDNZD", "AUDUSD", "CADJPY", "CHFJPY", "EURAUD", "EURCAD", "EURCHF", "EURGBP",
    "EURJPY", "EURNOK", "EURSEK", "EURUSD", "GBPCHF", "GBPJPY", "GBPUSD", "NZDUSD", "USDCAD",
    "USDCHF", "USDJPY", "USDNOK", "USDSEK", "USDSGD", "AUDCAD", "AUDCHF", "CADCHF", "EURNZD",
    "GBPAUD", "GBPCAD", "GBPNZD", "NZDCAD", "NZDCHF", "NZDJPY", "XAGUSD", "XAUUSD",
];

/// Returns true if `pair` is one of [`DEFAULT_PAIRS`] (case-insensitive).
#[must_use]
pub fn is_known_pair(pair: &str) -> bool {
    DEFAULT_PAIRS.iter().any(|p| p.eq_ignore_ascii_case(pair))
}
