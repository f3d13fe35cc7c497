use crate::error::{EngineError, EngineResult};

/// Fixed point scale (6 decimal places). The experience multiplier is
/// expressed in this scale: a multiplier of `10 * PRECISION` awards 10
/// experience per unit of realized yield.
pub const PRECISION: u64 = 1_000_000;

pub fn checked_add(a: u64, b: u64) -> EngineResult<u64> {
    a.checked_add(b).ok_or(EngineError::ArithmeticOverflow)
}

pub fn checked_sub(a: u64, b: u64) -> EngineResult<u64> {
    a.checked_sub(b).ok_or(EngineError::ArithmeticOverflow)
}

/// `a * b / divisor` with a u128 intermediate, truncating.
pub fn mul_div(a: u64, b: u64, divisor: u64) -> EngineResult<u64> {
    if divisor == 0 {
        return Err(EngineError::DivideByZero);
    }
    let wide = (a as u128)
        .checked_mul(b as u128)
        .ok_or(EngineError::ArithmeticOverflow)?
        / divisor as u128;
    u64::try_from(wide).map_err(|_| EngineError::ArithmeticOverflow)
}

/// `ceil(a * b / divisor)` with a u128 intermediate.
pub fn mul_div_round_up(a: u64, b: u64, divisor: u64) -> EngineResult<u64> {
    if divisor == 0 {
        return Err(EngineError::DivideByZero);
    }
    let product = (a as u128)
        .checked_mul(b as u128)
        .ok_or(EngineError::ArithmeticOverflow)?;
    let wide = (product + divisor as u128 - 1) / divisor as u128;
    u64::try_from(wide).map_err(|_| EngineError::ArithmeticOverflow)
}
