//! Bits of the F register.

/// Sign: bit 7 of the result.
pub const SF: u8 = 0x80;
/// Zero.
pub const ZF: u8 = 0x40;
/// Undocumented copy of result bit 5.
pub const YF: u8 = 0x20;
/// Half carry out of bit 3 (or borrow into bit 4).
pub const HF: u8 = 0x10;
/// Undocumented copy of result bit 3.
pub const XF: u8 = 0x08;
/// Parity for logic ops, overflow for arithmetic.
pub const PF: u8 = 0x04;
/// Set by subtractions; read by DAA.
pub const NF: u8 = 0x02;
/// Carry.
pub const CF: u8 = 0x01;

/// Even parity.
#[must_use]
pub const fn parity(value: u8) -> bool {
    value.count_ones().is_multiple_of(2)
}

/// S, Z, Y and X for an 8-bit result.
#[must_use]
pub const fn sz53(value: u8) -> u8 {
    let zero = if value == 0 { ZF } else { 0 };
    (value & (SF | YF | XF)) | zero
}

/// S, Z, Y, X and parity for an 8-bit result.
#[must_use]
pub const fn sz53p(value: u8) -> u8 {
    let pv = if parity(value) { PF } else { 0 };
    sz53(value) | pv
}

/// `flag` if `condition` holds, else 0.
#[must_use]
pub const fn flag_if(condition: bool, flag: u8) -> u8 {
    if condition { flag } else { 0 }
}
