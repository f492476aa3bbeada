// In crates/decision/src/validate.rs
//
// Normalization and bounds-checking of proposed trade actions. All limits
// are explicit parameters so tests can vary them per scenario; nothing here
// touches account or position state.

use core_types::{Action, Position, Side, TradeAction};
use std::collections::HashMap;
use thiserror::Error;

/// The privileged instrument class with its own leverage/size ceilings.
pub const MAJOR_SYMBOLS: [&str; 2] = ["BTCUSDT", "ETHUSDT"];

/// Bounds applied to open actions, threaded in from configuration.
#[derive(Debug, Clone)]
pub struct RiskLimits {
    pub account_equity: f64,
    pub majors_max_leverage: u32,
    pub altcoin_max_leverage: u32,
    /// Position value cap as a multiple of equity for the majors.
    pub majors_size_multiplier: f64,
    /// Position value cap as a multiple of equity for everything else.
    pub altcoin_size_multiplier: f64,
    /// Tolerance band on the size cap, absorbing floating-point rounding.
    pub size_tolerance_pct: f64,
    pub min_reward_risk: f64,
    /// Where between stop and target the entry is assumed to sit, as a
    /// fraction of the stop-to-target distance from the stop.
    pub assumed_entry_offset: f64,
}

impl RiskLimits {
    pub fn new(account_equity: f64, majors_max_leverage: u32, altcoin_max_leverage: u32) -> Self {
        Self {
            account_equity,
            majors_max_leverage,
            altcoin_max_leverage,
            majors_size_multiplier: 10.0,
            altcoin_size_multiplier: 1.5,
            size_tolerance_pct: 0.01,
            min_reward_risk: 3.0,
            assumed_entry_offset: 0.2,
        }
    }

    pub fn is_major(symbol: &str) -> bool {
        MAJOR_SYMBOLS.contains(&symbol)
    }

    pub fn max_leverage_for(&self, symbol: &str) -> u32 {
        if Self::is_major(symbol) {
            self.majors_max_leverage
        } else {
            self.altcoin_max_leverage
        }
    }

    pub fn max_position_value_for(&self, symbol: &str) -> f64 {
        let multiplier = if Self::is_major(symbol) {
            self.majors_size_multiplier
        } else {
            self.altcoin_size_multiplier
        };
        self.account_equity * multiplier
    }
}

/// A first-failure validation error, identifying the offending action.
#[derive(Error, Debug)]
#[error("Decision #{n} rejected: {reason}", n = .index + 1)]
pub struct ValidationError {
    /// Zero-based position of the rejected action in the batch.
    pub index: usize,
    pub reason: String,
}

/// Folds wire aliases into canonical actions.
///
/// `hold_long`/`hold_short` become `hold`. A side-less `close` resolves to
/// `close_long`/`close_short` against the caller's open position for that
/// symbol; with no matching position it becomes `UnresolvedClose`, which
/// validation rejects rather than silently drops.
pub fn normalize_actions(actions: &mut [TradeAction], positions: &[Position]) {
    let sides: HashMap<&str, Side> = positions
        .iter()
        .map(|p| (p.symbol.as_str(), p.side))
        .collect();

    for action in actions.iter_mut() {
        match action.action {
            Action::HoldLong | Action::HoldShort => action.action = Action::Hold,
            Action::Close => {
                action.action = match sides.get(action.symbol.as_str()) {
                    Some(Side::Long) => Action::CloseLong,
                    Some(Side::Short) => Action::CloseShort,
                    None => Action::UnresolvedClose,
                };
            }
            _ => {}
        }
    }
}

/// Validates a normalized batch, failing fast on the first violation.
pub fn validate_actions(actions: &[TradeAction], limits: &RiskLimits) -> Result<(), ValidationError> {
    for (index, action) in actions.iter().enumerate() {
        if let Err(reason) = validate_action(action, limits) {
            return Err(ValidationError { index, reason });
        }
    }
    Ok(())
}

fn validate_action(action: &TradeAction, limits: &RiskLimits) -> Result<(), String> {
    match action.action {
        Action::OpenLong | Action::OpenShort => {}
        Action::CloseLong | Action::CloseShort | Action::Hold | Action::Wait => return Ok(()),
        Action::UnresolvedClose => {
            return Err(format!(
                "close for {} does not match any open position",
                action.symbol
            ));
        }
        other => return Err(format!("unrecognized action: {other}")),
    }

    let max_leverage = limits.max_leverage_for(&action.symbol);
    if action.leverage == 0 || action.leverage > max_leverage {
        return Err(format!(
            "leverage must be within 1-{max_leverage} for {}, got {}",
            action.symbol, action.leverage
        ));
    }

    if action.position_size_usd <= 0.0 {
        return Err(format!(
            "position size must be positive, got {:.2}",
            action.position_size_usd
        ));
    }

    let max_value = limits.max_position_value_for(&action.symbol);
    let tolerance = max_value * limits.size_tolerance_pct;
    if action.position_size_usd > max_value + tolerance {
        return Err(format!(
            "position value {:.0} USD exceeds the {:.0} USD cap for {}",
            action.position_size_usd, max_value, action.symbol
        ));
    }

    let (sl, tp) = (action.stop_loss, action.take_profit);
    if sl <= 0.0 || tp <= 0.0 {
        return Err("stop-loss and take-profit must both be positive".to_string());
    }

    let is_long = action.action == Action::OpenLong;
    if is_long && sl >= tp {
        return Err("stop-loss must be below take-profit for a long".to_string());
    }
    if !is_long && sl <= tp {
        return Err("stop-loss must be above take-profit for a short".to_string());
    }

    // Reward:risk from an entry assumed 20% of the stop-to-target distance
    // from the stop; risk and reward are both relative to that entry.
    let offset = limits.assumed_entry_offset;
    let entry = if is_long {
        sl + (tp - sl) * offset
    } else {
        sl - (sl - tp) * offset
    };

    let (risk_pct, reward_pct) = if is_long {
        ((entry - sl) / entry * 100.0, (tp - entry) / entry * 100.0)
    } else {
        ((sl - entry) / entry * 100.0, (entry - tp) / entry * 100.0)
    };

    let ratio = if risk_pct > 0.0 {
        reward_pct / risk_pct
    } else {
        0.0
    };
    if ratio < limits.min_reward_risk {
        return Err(format!(
            "reward:risk {ratio:.2}:1 is below the {:.1}:1 minimum [risk {risk_pct:.2}% reward {reward_pct:.2}%] [SL {sl:.2} TP {tp:.2}]",
            limits.min_reward_risk
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RiskLimits {
        RiskLimits::new(10_000.0, 50, 20)
    }

    fn open_long(symbol: &str) -> TradeAction {
        TradeAction {
            symbol: symbol.to_string(),
            action: Action::OpenLong,
            leverage: 10,
            position_size_usd: 5_000.0,
            stop_loss: 58_000.0,
            take_profit: 68_000.0,
            confidence: 80,
            risk_usd: 200.0,
            reasoning: "above VWAP".to_string(),
        }
    }

    fn held_position(symbol: &str, side: Side) -> Position {
        Position {
            symbol: symbol.to_string(),
            side,
            entry_price: 60_000.0,
            mark_price: 60_500.0,
            quantity: 0.1,
            leverage: 10,
            unrealized_pnl: 50.0,
            unrealized_pnl_pct: 8.3,
            liquidation_price: 54_000.0,
            margin_used: 600.0,
            update_time: 0,
        }
    }

    #[test]
    fn a_valid_open_long_passes() {
        assert!(validate_actions(&[open_long("BTCUSDT")], &limits()).is_ok());
    }

    #[test]
    fn rejects_zero_and_excessive_leverage() {
        let mut action = open_long("BTCUSDT");
        action.leverage = 0;
        assert!(validate_actions(&[action.clone()], &limits()).is_err());

        action.leverage = 51;
        let err = validate_actions(&[action], &limits()).unwrap_err();
        assert!(err.reason.contains("leverage"));
    }

    #[test]
    fn altcoins_get_the_lower_leverage_ceiling() {
        let mut action = open_long("DOGEUSDT");
        action.leverage = 21;
        action.position_size_usd = 5_000.0;
        let err = validate_actions(&[action], &limits()).unwrap_err();
        assert!(err.reason.contains("1-20"));
    }

    #[test]
    fn size_cap_depends_on_instrument_class() {
        // Majors cap: 10 x 10_000 = 100_000 USD.
        let mut action = open_long("BTCUSDT");
        action.position_size_usd = 150_000.0;
        assert!(validate_actions(&[action], &limits()).is_err());

        // Altcoin cap: 1.5 x 10_000 = 15_000 USD.
        let mut action = open_long("DOGEUSDT");
        action.position_size_usd = 20_000.0;
        let err = validate_actions(&[action], &limits()).unwrap_err();
        assert!(err.reason.contains("cap"));
    }

    #[test]
    fn size_cap_tolerates_one_percent_rounding() {
        let mut action = open_long("BTCUSDT");
        action.position_size_usd = 100_500.0; // within the 1% band over 100_000
        assert!(validate_actions(&[action], &limits()).is_ok());
    }

    #[test]
    fn rejects_inverted_stop_and_target() {
        let mut action = open_long("BTCUSDT");
        action.stop_loss = 68_000.0;
        action.take_profit = 58_000.0;
        assert!(validate_actions(&[action], &limits()).is_err());

        let mut short = open_long("BTCUSDT");
        short.action = Action::OpenShort;
        // For a short the stop must sit above the target; this is inverted.
        short.stop_loss = 58_000.0;
        short.take_profit = 68_000.0;
        assert!(validate_actions(&[short], &limits()).is_err());
    }

    #[test]
    fn reward_risk_bound_uses_the_assumed_entry_offset() {
        // With the default 20% offset the assumed entry pins the ratio at
        // 4:1 for any well-ordered stop/target pair, so the 3:1 floor holds.
        let mut action = open_long("BTCUSDT");
        action.stop_loss = 68_000.0;
        action.take_profit = 68_200.0;
        assert!(validate_actions(&[action.clone()], &limits()).is_ok());

        // A mid-range assumed entry drops the ratio to 1:1, below the floor.
        let mid_entry = RiskLimits {
            assumed_entry_offset: 0.5,
            ..limits()
        };
        let err = validate_actions(&[action.clone()], &mid_entry).unwrap_err();
        assert!(err.reason.contains("reward:risk"));

        // Raising the floor above the structural 4:1 also rejects.
        let strict = RiskLimits {
            min_reward_risk: 5.0,
            ..limits()
        };
        let err = validate_actions(&[action], &strict).unwrap_err();
        assert!(err.reason.contains("reward:risk"));
    }

    #[test]
    fn reward_risk_bound_applies_to_shorts() {
        let mut action = open_long("ETHUSDT");
        action.action = Action::OpenShort;
        action.leverage = 15;
        action.position_size_usd = 3_000.0;
        action.stop_loss = 3_100.0;
        action.take_profit = 2_900.0;
        assert!(validate_actions(&[action.clone()], &limits()).is_ok());

        let mid_entry = RiskLimits {
            assumed_entry_offset: 0.5,
            ..limits()
        };
        assert!(validate_actions(&[action], &mid_entry).is_err());
    }

    #[test]
    fn close_hold_wait_bypass_numeric_checks() {
        let action = TradeAction {
            symbol: "BTCUSDT".to_string(),
            action: Action::CloseLong,
            leverage: 0,
            position_size_usd: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            confidence: 0,
            risk_usd: 0.0,
            reasoning: String::new(),
        };
        assert!(validate_actions(&[action], &limits()).is_ok());
    }

    #[test]
    fn generic_close_resolves_against_open_positions() {
        let mut actions = vec![TradeAction {
            symbol: "ETHUSDT".to_string(),
            action: Action::Close,
            ..open_long("ETHUSDT")
        }];
        normalize_actions(&mut actions, &[held_position("ETHUSDT", Side::Short)]);
        assert_eq!(actions[0].action, Action::CloseShort);
    }

    #[test]
    fn unresolvable_close_fails_validation() {
        let mut actions = vec![TradeAction {
            symbol: "ETHUSDT".to_string(),
            action: Action::Close,
            ..open_long("ETHUSDT")
        }];
        normalize_actions(&mut actions, &[]);
        assert_eq!(actions[0].action, Action::UnresolvedClose);

        let err = validate_actions(&actions, &limits()).unwrap_err();
        assert_eq!(err.index, 0);
        assert!(err.reason.contains("open position"));
    }

    #[test]
    fn hold_aliases_normalize_to_hold() {
        let mut actions = vec![
            TradeAction {
                action: Action::HoldLong,
                ..open_long("BTCUSDT")
            },
            TradeAction {
                action: Action::HoldShort,
                ..open_long("ETHUSDT")
            },
        ];
        normalize_actions(&mut actions, &[]);
        assert_eq!(actions[0].action, Action::Hold);
        assert_eq!(actions[1].action, Action::Hold);
    }

    #[test]
    fn first_failure_reports_the_offending_index() {
        let good = open_long("BTCUSDT");
        let mut bad = open_long("ETHUSDT");
        bad.position_size_usd = -1.0;
        let err = validate_actions(&[good, bad], &limits()).unwrap_err();
        assert_eq!(err.index, 1);
        assert!(err.to_string().contains("Decision #2"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let mut action = open_long("BTCUSDT");
        action.action = Action::Unknown;
        let err = validate_actions(&[action], &limits()).unwrap_err();
        assert!(err.reason.contains("unrecognized"));
    }
}
