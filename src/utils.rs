use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

/// Convert a decimal to f64 for the solving engine
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Convert an f64 solver output back to a decimal
pub fn f64_to_decimal(f: f64) -> Decimal {
    Decimal::from_f64(f).unwrap_or(Decimal::ZERO)
}

/// Round a decimal to four places, the precision carried through reports
pub fn round_decimal(d: Decimal) -> Decimal {
    d.round_dp(4)
}
