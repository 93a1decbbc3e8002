//! Flag-producing arithmetic for the Z80.
//!
//! Every function is pure: it takes operands (and the old F where the
//! instruction preserves some bits) and returns the value plus the complete
//! new F.

#![allow(clippy::verbose_bit_mask)] // Nibble masks read better spelled out.

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, flag_if, parity, sz53, sz53p};

/// Result of an ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

/// Result of a 16-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult16 {
    pub value: u16,
    pub flags: u8,
}

/// ADD/ADC.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let value = wide as u8;
    let flags = sz53(value)
        | flag_if((a & 0x0F) + (b & 0x0F) + c > 0x0F, HF)
        | flag_if((a ^ b) & 0x80 == 0 && (a ^ value) & 0x80 != 0, PF)
        | flag_if(wide > 0xFF, CF);
    AluResult { value, flags }
}

/// SUB/SBC.
#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c);
    let flags = sz53(value)
        | NF
        | flag_if((a & 0x0F) < (b & 0x0F) + c, HF)
        | flag_if((a ^ b) & 0x80 != 0 && (a ^ value) & 0x80 != 0, PF)
        | flag_if(u16::from(a) < u16::from(b) + u16::from(c), CF);
    AluResult { value, flags }
}

/// CP: a subtraction that keeps A. X/Y come from the operand, not the result.
#[must_use]
pub fn cp8(a: u8, b: u8) -> u8 {
    let diff = sub8(a, b, false);
    (diff.flags & !(XF | YF)) | (b & (XF | YF))
}

#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult { value, flags: sz53p(value) | HF }
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult { value, flags: sz53p(value) }
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult { value, flags: sz53p(value) }
}

/// Dispatch the eight accumulator operations by their opcode field
/// (ADD ADC SUB SBC AND XOR OR CP). Returns the new A and F.
#[must_use]
pub fn accumulate(op: u8, a: u8, operand: u8, f: u8) -> AluResult {
    let carry = f & CF != 0;
    match op & 7 {
        0 => add8(a, operand, false),
        1 => add8(a, operand, carry),
        2 => sub8(a, operand, false),
        3 => sub8(a, operand, carry),
        4 => and8(a, operand),
        5 => xor8(a, operand),
        6 => or8(a, operand),
        _ => AluResult { value: a, flags: cp8(a, operand) },
    }
}

/// INC r. Carry is preserved from `f`.
#[must_use]
pub fn inc8(value: u8, f: u8) -> AluResult {
    let result = value.wrapping_add(1);
    let flags = (f & CF)
        | sz53(result)
        | flag_if(value & 0x0F == 0x0F, HF)
        | flag_if(value == 0x7F, PF);
    AluResult { value: result, flags }
}

/// DEC r. Carry is preserved from `f`.
#[must_use]
pub fn dec8(value: u8, f: u8) -> AluResult {
    let result = value.wrapping_sub(1);
    let flags = (f & CF)
        | NF
        | sz53(result)
        | flag_if(value & 0x0F == 0, HF)
        | flag_if(value == 0x80, PF);
    AluResult { value: result, flags }
}

/// CB-prefixed rotate/shift selected by bits 3-5 of the opcode
/// (RLC RRC RL RR SLA SRA SLL SRL).
#[must_use]
pub fn shift(op: u8, value: u8, carry_in: bool) -> AluResult {
    let cin = u8::from(carry_in);
    let (result, carry_out) = match op & 7 {
        0 => (value.rotate_left(1), value >> 7),
        1 => (value.rotate_right(1), value & 1),
        2 => ((value << 1) | cin, value >> 7),
        3 => ((value >> 1) | (cin << 7), value & 1),
        4 => (value << 1, value >> 7),
        5 => ((value >> 1) | (value & 0x80), value & 1),
        // SLL shifts a 1 into bit 0.
        6 => ((value << 1) | 1, value >> 7),
        _ => (value >> 1, value & 1),
    };
    AluResult { value: result, flags: sz53p(result) | carry_out }
}

/// RLCA/RRCA/RLA/RRA: like the CB forms, but S, Z and P/V survive.
#[must_use]
pub fn rotate_a(op: u8, a: u8, f: u8) -> AluResult {
    let r = shift(op & 3, a, f & CF != 0);
    AluResult {
        value: r.value,
        flags: (f & (SF | ZF | PF)) | (r.value & (YF | XF)) | (r.flags & CF),
    }
}

/// BIT n. `xy_source` supplies the undocumented X/Y bits: the operand for
/// register forms, the high byte of WZ for memory forms.
#[must_use]
pub fn bit(n: u8, value: u8, xy_source: u8, f: u8) -> u8 {
    let tested = value & (1 << (n & 7));
    (f & CF)
        | HF
        | flag_if(tested == 0, ZF | PF)
        | (tested & SF)
        | (xy_source & (XF | YF))
}

/// SET n. Flags are untouched.
#[must_use]
pub const fn set_bit(n: u8, value: u8) -> u8 {
    value | (1 << (n & 7))
}

/// RES n. Flags are untouched.
#[must_use]
pub const fn res_bit(n: u8, value: u8) -> u8 {
    value & !(1 << (n & 7))
}

/// DAA: decimal-adjust A after a BCD add or subtract.
#[must_use]
pub fn daa(a: u8, f: u8) -> AluResult {
    let subtract = f & NF != 0;
    let mut correction = 0;
    let mut carry = f & CF != 0;

    if f & HF != 0 || a & 0x0F > 9 {
        correction |= 0x06;
    }
    if carry || a > 0x99 {
        correction |= 0x60;
        carry = true;
    }

    let value = if subtract {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    let half = if subtract {
        f & HF != 0 && a & 0x0F < 6
    } else {
        a & 0x0F > 9
    };

    let flags = sz53p(value) | (f & NF) | flag_if(half, HF) | flag_if(carry, CF);
    AluResult { value, flags }
}

#[must_use]
pub fn cpl(a: u8, f: u8) -> AluResult {
    let value = !a;
    AluResult {
        value,
        flags: (f & (SF | ZF | PF | CF)) | HF | NF | (value & (YF | XF)),
    }
}

#[must_use]
pub fn neg(a: u8) -> AluResult {
    sub8(0, a, false)
}

/// SCF. `q` is the F value written by the previous instruction (0 if it
/// left F alone); X/Y come from `(q ^ f) | a`.
#[must_use]
pub fn scf(a: u8, f: u8, q: u8) -> u8 {
    (f & (SF | ZF | PF)) | CF | (((q ^ f) | a) & (XF | YF))
}

/// CCF. H receives the old carry.
#[must_use]
pub fn ccf(a: u8, f: u8, q: u8) -> u8 {
    let old_carry = f & CF;
    (f & (SF | ZF | PF))
        | flag_if(old_carry != 0, HF)
        | (old_carry ^ CF)
        | (((q ^ f) | a) & (XF | YF))
}

/// ADD HL/IX/IY,rr. S, Z and P/V survive; X/Y come from the high byte.
#[must_use]
pub fn add16(a: u16, b: u16, f: u8) -> AluResult16 {
    let wide = u32::from(a) + u32::from(b);
    let value = wide as u16;
    let flags = (f & (SF | ZF | PF))
        | ((value >> 8) as u8 & (YF | XF))
        | flag_if((a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF, HF)
        | flag_if(wide > 0xFFFF, CF);
    AluResult16 { value, flags }
}

/// ADC HL,rr.
#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> AluResult16 {
    let c = u32::from(carry);
    let wide = u32::from(a) + u32::from(b) + c;
    let value = wide as u16;
    let hi = (value >> 8) as u8;
    let flags = (hi & (SF | YF | XF))
        | flag_if(value == 0, ZF)
        | flag_if(u32::from(a & 0x0FFF) + u32::from(b & 0x0FFF) + c > 0x0FFF, HF)
        | flag_if((a ^ b) & 0x8000 == 0 && (a ^ value) & 0x8000 != 0, PF)
        | flag_if(wide > 0xFFFF, CF);
    AluResult16 { value, flags }
}

/// SBC HL,rr.
#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> AluResult16 {
    let c = u32::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c as u16);
    let hi = (value >> 8) as u8;
    let flags = (hi & (SF | YF | XF))
        | NF
        | flag_if(value == 0, ZF)
        | flag_if(u32::from(a & 0x0FFF) < u32::from(b & 0x0FFF) + c, HF)
        | flag_if((a ^ b) & 0x8000 != 0 && (a ^ value) & 0x8000 != 0, PF)
        | flag_if(u32::from(a) < u32::from(b) + c, CF);
    AluResult16 { value, flags }
}

/// LDI/LDD/LDIR/LDDR after one transfer. `bc` is the decremented counter.
///
/// X and Y are bits 3 and 1 of `a + value`; a repeating step instead copies
/// them from the high byte of the rewound PC.
#[must_use]
pub fn block_transfer(f: u8, a: u8, value: u8, bc: u16, repeat_pch: Option<u8>) -> u8 {
    let n = a.wrapping_add(value);
    let xy = match repeat_pch {
        Some(pch) => pch & (XF | YF),
        None => (n & XF) | ((n << 4) & YF),
    };
    (f & (SF | ZF | CF)) | flag_if(bc != 0, PF) | xy
}

/// CPI/CPD/CPIR/CPDR after one compare. `bc` is the decremented counter.
#[must_use]
pub fn block_compare(f: u8, a: u8, value: u8, bc: u16, repeat_pch: Option<u8>) -> u8 {
    let diff = a.wrapping_sub(value);
    let half = a & 0x0F < value & 0x0F;
    let n = diff.wrapping_sub(u8::from(half));
    let xy = match repeat_pch {
        Some(pch) => pch & (XF | YF),
        None => (n & XF) | ((n << 4) & YF),
    };
    (f & CF)
        | NF
        | (diff & SF)
        | flag_if(diff == 0, ZF)
        | flag_if(half, HF)
        | flag_if(bc != 0, PF)
        | xy
}

/// INI/IND/OUTI/OUTD and their repeating forms.
///
/// `b` is the decremented counter and `k` the sum of the transferred byte
/// with `C±1` (input) or the updated L (output). A repeating step folds the
/// internal B adjustment into H and P/V and takes X/Y from the rewound PC.
#[must_use]
pub fn block_io(value: u8, b: u8, k: u16, repeat_pch: Option<u8>) -> u8 {
    let carry = k > 0xFF;
    let negative = value & 0x80 != 0;
    let p = (k as u8 & 7) ^ b;
    let base = flag_if(negative, NF) | flag_if(carry, CF);

    match repeat_pch {
        None => base | sz53(b) | flag_if(carry, HF) | flag_if(parity(p), PF),
        Some(pch) => {
            let (half, adjusted) = match (carry, negative) {
                (true, true) => (b & 0x0F == 0x00, p ^ (b.wrapping_sub(1) & 7)),
                (true, false) => (b & 0x0F == 0x0F, p ^ (b.wrapping_add(1) & 7)),
                (false, _) => (false, p ^ (b & 7)),
            };
            base | (b & SF)
                | (pch & (XF | YF))
                | flag_if(half, HF)
                | flag_if(parity(adjusted), PF)
        }
    }
}
