//! Property tests for the trade engine

use btc_trader::execution::{DecisionReason, Ledger, TradeEngine};
use btc_trader::risk::RiskPolicy;
use btc_trader::signal::Action;
use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::Buy), Just(Action::Sell), Just(Action::Hold)]
}

/// Prices between 20000.00 and 80000.00
fn price() -> impl Strategy<Value = Decimal> {
    (2_000_000i64..8_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #[test]
    fn test_all_in_all_out(steps in prop::collection::vec((action(), price()), 1..60)) {
        let engine = TradeEngine::new(RiskPolicy::default());
        let mut ledger = Ledger::with_quote(dec!(1000));

        for (signal, price) in steps {
            let before = ledger.clone();
            let record = engine.execute(&mut ledger, signal, price, Utc::now()).unwrap();

            prop_assert!(ledger.quote_balance() >= Decimal::ZERO);
            prop_assert!(ledger.base_balance() >= Decimal::ZERO);
            prop_assert!(ledger.quote_balance().is_zero() || ledger.base_balance().is_zero());
            prop_assert_eq!(record.quote_balance, ledger.quote_balance());
            prop_assert_eq!(record.base_balance, ledger.base_balance());
            prop_assert_eq!(record.requested_action, signal);
            prop_assert_eq!(ledger.entry_price().is_some(), !ledger.base_balance().is_zero());

            match record.profit {
                Some(profit) => {
                    prop_assert_eq!(record.executed_action, Action::Sell);
                    let entry = before.entry_price().unwrap();
                    prop_assert_eq!(profit, before.base_balance() * (price - entry));
                    // Proceeds credited once, profit reported separately
                    prop_assert_eq!(ledger.quote_balance(), before.quote_balance() + before.base_balance() * price);
                }
                None => {
                    prop_assert!(record.executed_action != Action::Sell || before.base_balance().is_zero());
                }
            }
        }
    }

    #[test]
    fn test_stop_loss_overrides_any_signal(signal in action(), entry in price(), drop_bp in 501u32..9_999) {
        let engine = TradeEngine::new(RiskPolicy::default());
        let mut ledger = Ledger::with_quote(dec!(1000));
        engine.execute(&mut ledger, Action::Buy, entry, Utc::now()).unwrap();

        let price = entry * (Decimal::ONE - Decimal::new(i64::from(drop_bp), 4));
        prop_assume!(price > Decimal::ZERO);

        let record = engine.execute(&mut ledger, signal, price, Utc::now()).unwrap();
        prop_assert_eq!(record.executed_action, Action::Sell);
        prop_assert_eq!(record.reason, DecisionReason::StopLoss);
        prop_assert!(ledger.base_balance().is_zero());
    }

    #[test]
    fn test_flat_never_sells(signal in action(), price in price()) {
        let engine = TradeEngine::default();
        let mut ledger = Ledger::with_quote(dec!(1000));

        let record = engine.execute(&mut ledger, signal, price, Utc::now()).unwrap();
        prop_assert_eq!(record.profit, None);
        if signal == Action::Buy {
            prop_assert!(ledger.quote_balance().is_zero());
        } else {
            prop_assert_eq!(ledger, Ledger::with_quote(dec!(1000)));
        }
    }

    #[test]
    fn test_equity_preserved_by_open(price in price()) {
        let engine = TradeEngine::default();
        let mut ledger = Ledger::with_quote(dec!(1000));

        engine.execute(&mut ledger, Action::Buy, price, Utc::now()).unwrap();
        let drift = (ledger.equity(price) - dec!(1000)).abs();
        prop_assert!(drift <= dec!(0.000001));
    }
}
