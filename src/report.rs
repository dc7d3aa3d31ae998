use alloy::primitives::U256;
use std::fmt::Display;
use std::io::{self, Write};

/// Writes `label: value` lines to an output sink.
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn report(&mut self, label: &str, value: impl Display) -> io::Result<()> {
        writeln!(self.out, "{}: {}", label, value)?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render a token amount, either as the raw integer or as a fixed-point
/// decimal when `decimals` is given.
pub fn format_amount(value: U256, decimals: Option<u8>, unit: &str) -> String {
    let amount = match decimals {
        Some(decimals) => u256_to_human(value, decimals),
        None => value.to_string(),
    };
    format!("{} {}", amount, unit)
}

pub fn u256_to_human(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    // 10^78 and above exceed U256, every value is then below one unit
    let (integer, fraction) = match U256::from(10u64).checked_pow(U256::from(decimals)) {
        Some(divisor) => (value / divisor, value % divisor),
        None => (U256::ZERO, value),
    };
    let mut fraction = fraction.to_string();
    let width = decimals as usize;
    while fraction.len() < width {
        fraction.insert(0, '0');
    }
    while fraction.ends_with('0') {
        fraction.pop();
    }
    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    }
}
