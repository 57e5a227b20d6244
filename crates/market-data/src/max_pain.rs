use crate::types::{OptionContract, OptionType};

/// Aggregate writer payout if the underlying settles at `settlement`.
pub fn writer_loss<'a, I>(contracts: I, settlement: u64) -> f64
where
    I: IntoIterator<Item = &'a OptionContract>,
{
    let settlement = settlement as f64;
    contracts
        .into_iter()
        .map(|c| {
            let strike = c.strike as f64;
            let intrinsic = match c.option_type {
                OptionType::Call => (settlement - strike).max(0.0),
                OptionType::Put => (strike - settlement).max(0.0),
            };
            intrinsic * c.open_interest
        })
        .sum()
}

/// Strike minimising aggregate writer loss.
///
/// Candidates are the distinct strikes in ascending order; the first minimum
/// wins, so ties resolve to the lower strike. Returns 0 for an empty set.
pub fn max_pain(contracts: &[&OptionContract]) -> u64 {
    let mut strikes: Vec<u64> = contracts.iter().map(|c| c.strike).collect();
    strikes.sort_unstable();
    strikes.dedup();

    let mut best: Option<(u64, f64)> = None;
    for strike in strikes {
        let loss = writer_loss(contracts.iter().copied(), strike);
        match best {
            Some((_, best_loss)) if loss >= best_loss => {}
            _ => best = Some((strike, loss)),
        }
    }

    best.map(|(strike, _)| strike).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Greeks;
    use chrono::NaiveDate;

    fn contract(strike: u64, option_type: OptionType, open_interest: f64) -> OptionContract {
        OptionContract {
            instrument_id: format!("BTC-01JAN25-{}-{}", strike, option_type.code()),
            expiration_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            strike,
            option_type,
            open_interest,
            volume: 0.0,
            mark_iv: None,
            underlying_price: None,
            greeks: Greeks::default(),
        }
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(max_pain(&[]), 0);
    }

    #[test]
    fn test_single_call() {
        let c = contract(100, OptionType::Call, 10.0);
        assert_eq!(max_pain(&[&c]), 100);
        assert_eq!(writer_loss([&c], 100), 0.0);
        assert_eq!(writer_loss([&c], 110), 100.0);
    }

    #[test]
    fn test_tie_returns_lower_strike() {
        // Loss is zero at both 100 and 200: calls at 200 pay nothing at or below 200
        let a = contract(100, OptionType::Call, 0.0);
        let b = contract(200, OptionType::Call, 5.0);
        assert_eq!(max_pain(&[&b, &a]), 100);
    }

    #[test]
    fn test_balanced_chain() {
        let contracts = vec![
            contract(90, OptionType::Put, 10.0),
            contract(100, OptionType::Call, 10.0),
            contract(100, OptionType::Put, 10.0),
            contract(110, OptionType::Call, 10.0),
        ];
        let refs: Vec<&OptionContract> = contracts.iter().collect();
        assert_eq!(max_pain(&refs), 100);
    }

    #[test]
    fn test_deterministic() {
        let contracts = vec![
            contract(40000, OptionType::Call, 3.0),
            contract(45000, OptionType::Put, 7.0),
            contract(50000, OptionType::Call, 12.0),
            contract(55000, OptionType::Put, 1.0),
        ];
        let refs: Vec<&OptionContract> = contracts.iter().collect();
        let first = max_pain(&refs);
        for _ in 0..5 {
            assert_eq!(max_pain(&refs), first);
        }
    }
}
