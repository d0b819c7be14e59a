use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Point value of one contract for `symbol`.
///
/// Micro contracts are matched by substring so that dated symbols such as
/// `MESM4` resolve too; full-size contracts only on an exact match. Anything
/// else is priced per unit.
pub fn resolve_multiplier(symbol: &str) -> Decimal {
    let symbol = symbol.to_uppercase();

    if symbol.contains("MES") {
        dec!(5)
    } else if symbol.contains("MNQ") {
        dec!(2)
    } else if symbol == "ES" {
        dec!(50)
    } else if symbol == "NQ" {
        dec!(20)
    } else {
        Decimal::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_futures_multipliers() {
        assert_eq!(resolve_multiplier("ES"), dec!(50));
        assert_eq!(resolve_multiplier("nq"), dec!(20));
        assert_eq!(resolve_multiplier("MES"), dec!(5));
        assert_eq!(resolve_multiplier("mnqz4"), dec!(2));
    }

    #[test]
    fn test_substring_beats_exact() {
        // "MES" contains "ES" but must resolve as the micro contract
        assert_eq!(resolve_multiplier("MESH5"), dec!(5));
        // Full-size symbols with a contract suffix are not exact matches
        assert_eq!(resolve_multiplier("ESH5"), Decimal::ONE);
    }

    #[test]
    fn test_unknown_symbol_defaults_to_one() {
        assert_eq!(resolve_multiplier("AAPL"), Decimal::ONE);
        assert_eq!(resolve_multiplier(""), Decimal::ONE);
    }
}
