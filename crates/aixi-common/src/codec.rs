//! Fixed-width binary codec for actions, observations and rewards.
//!
//! Every value is written least-significant bit first: bit `i` of the value is
//! the `i`-th symbol emitted. Decoding reads the same order back.

use crate::error::{Error, Result};
use crate::symbol::Symbol;

/// Number of bits needed to encode `count` distinct values (`0..count`).
///
/// Never returns less than one bit, so a single-valued alphabet still
/// occupies a history slot.
pub fn bits_required(count: u64) -> u32 {
    if count <= 2 {
        return 1;
    }
    64 - (count - 1).leading_zeros()
}

/// Largest value representable in `bits` bits.
pub fn max_value(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Append `value` to `out` as `bits` symbols, LSB first.
///
/// # Panics
///
/// Panics if `value` does not fit in `bits` bits.
pub fn encode_into(out: &mut Vec<Symbol>, value: u64, bits: u32) {
    assert!(
        value <= max_value(bits),
        "value {value} does not fit in {bits} bits"
    );
    out.reserve(bits as usize);
    for i in 0..bits {
        out.push(Symbol::from((value >> i) & 1 == 1));
    }
}

/// Checked variant of [`encode_into`] for values from outside the agent.
pub fn try_encode_into(out: &mut Vec<Symbol>, value: u64, bits: u32) -> Result<()> {
    if value > max_value(bits) {
        return Err(Error::ValueOutOfRange { value, bits });
    }
    encode_into(out, value, bits);
    Ok(())
}

/// Encode `value` as `bits` symbols, LSB first.
pub fn encode(value: u64, bits: u32) -> Vec<Symbol> {
    let mut out = Vec::with_capacity(bits as usize);
    encode_into(&mut out, value, bits);
    out
}

/// Decode LSB-first symbols back into a value.
///
/// # Panics
///
/// Panics if more than 64 symbols are supplied.
pub fn decode(symbols: &[Symbol]) -> u64 {
    assert!(symbols.len() <= 64, "cannot decode {} bits into u64", symbols.len());
    symbols
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, s)| acc | ((s.is_one() as u64) << i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use Symbol::{One, Zero};

    #[test]
    fn bits_required_values() {
        assert_eq!(bits_required(0), 1);
        assert_eq!(bits_required(1), 1);
        assert_eq!(bits_required(2), 1);
        assert_eq!(bits_required(3), 2);
        assert_eq!(bits_required(4), 2);
        assert_eq!(bits_required(5), 3);
        assert_eq!(bits_required(9), 4);
        assert_eq!(bits_required(256), 8);
    }

    #[test]
    fn encode_is_lsb_first() {
        assert_eq!(encode(6, 3), vec![Zero, One, One]);
        assert_eq!(encode(1, 4), vec![One, Zero, Zero, Zero]);
    }

    #[test]
    fn decode_reads_lsb_first() {
        assert_eq!(decode(&[One, Zero, One]), 5);
        assert_eq!(decode(&[]), 0);
    }

    #[test]
    fn encode_into_appends() {
        let mut out = vec![One];
        encode_into(&mut out, 2, 2);
        assert_eq!(out, vec![One, Zero, One]);
    }

    #[test]
    fn try_encode_rejects_wide_values() {
        let mut out = Vec::new();
        let err = try_encode_into(&mut out, 8, 3).unwrap_err();
        assert_eq!(err.code(), 21);
        assert!(out.is_empty());
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn encode_panics_on_overflow() {
        let _ = encode(4, 2);
    }

    #[test]
    fn max_value_edges() {
        assert_eq!(max_value(0), 0);
        assert_eq!(max_value(5), 31);
        assert_eq!(max_value(64), u64::MAX);
    }
}
