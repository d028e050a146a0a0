use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioParams {
    pub code: String,
    pub ps_entry: u32,
    pub entry_growth_rate: Decimal,
    pub default_retention: Decimal,
    pub terminal_retention: Decimal,
    pub lateral_multiplier: Decimal,
}

impl ScenarioParams {
    pub fn base(ps_entry: u32) -> Self {
        Self {
            code: "base".to_string(),
            ps_entry,
            entry_growth_rate: Decimal::ZERO,
            default_retention: dec!(0.95),
            terminal_retention: dec!(0.90),
            lateral_multiplier: Decimal::ONE,
        }
    }
}

/// Lateral multiplier published for the named scenarios.
pub fn standard_lateral_multiplier(code: &str) -> Option<Decimal> {
    match code.trim().to_ascii_lowercase().as_str() {
        "worst_case" => Some(dec!(0.30)),
        "base" => Some(dec!(1.00)),
        "best_case" => Some(dec!(1.50)),
        _ => None,
    }
}
