//! Copying selected registers from another CPU.
//!
//! Boards that run several Z80s from one clock keep the slaves in step with
//! a master by periodically aligning some of their registers with it.

use std::str::FromStr;

use bitflags::bitflags;

use crate::error::ParseRegisterError;
use crate::flags::CF;
use crate::registers::Reg8;

use super::Z80;

bitflags! {
    /// Registers (or register halves) copied by [`Z80::align_registers_with`].
    ///
    /// Parses from a string with one character per register:
    ///
    /// | Chars | Registers |
    /// |---|---|
    /// | `AFBCDEHL` | main bank |
    /// | `afbcdehl` | alternate bank |
    /// | `X` `x` `Y` `y` | IXH, IXL, IYH, IYL |
    /// | `1` `0` | F, F' without the carry bit |
    /// | `P` `S` `s` | PC, SP high, SP low |
    ///
    /// `T` is accepted and ignored. Whitespace around the string is trimmed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AlignRegisters: u32 {
        const A = 1 << 0;
        const F = 1 << 1;
        const B = 1 << 2;
        const C = 1 << 3;
        const D = 1 << 4;
        const E = 1 << 5;
        const H = 1 << 6;
        const L = 1 << 7;
        const IXH = 1 << 8;
        const IXL = 1 << 9;
        const IYH = 1 << 10;
        const IYL = 1 << 11;
        const F_NO_CARRY = 1 << 12;
        const ALT_F_NO_CARRY = 1 << 13;
        const PC = 1 << 14;
        const SPH = 1 << 15;
        const SPL = 1 << 16;
        const ALT_A = 1 << 17;
        const ALT_F = 1 << 18;
        const ALT_B = 1 << 19;
        const ALT_C = 1 << 20;
        const ALT_D = 1 << 21;
        const ALT_E = 1 << 22;
        const ALT_H = 1 << 23;
        const ALT_L = 1 << 24;
    }
}

/// Character for each bit, in bit order.
const ALIGN_CHARS: &str = "AFBCDEHLXxYy10PSsafbcdehl";

/// Whole-byte copies: flag, register, bank.
const BYTE_COPIES: [(AlignRegisters, Reg8, bool); 20] = [
    (AlignRegisters::A, Reg8::A, false),
    (AlignRegisters::F, Reg8::F, false),
    (AlignRegisters::B, Reg8::B, false),
    (AlignRegisters::C, Reg8::C, false),
    (AlignRegisters::D, Reg8::D, false),
    (AlignRegisters::E, Reg8::E, false),
    (AlignRegisters::H, Reg8::H, false),
    (AlignRegisters::L, Reg8::L, false),
    (AlignRegisters::IXH, Reg8::Ixh, false),
    (AlignRegisters::IXL, Reg8::Ixl, false),
    (AlignRegisters::IYH, Reg8::Iyh, false),
    (AlignRegisters::IYL, Reg8::Iyl, false),
    (AlignRegisters::ALT_A, Reg8::A, true),
    (AlignRegisters::ALT_F, Reg8::F, true),
    (AlignRegisters::ALT_B, Reg8::B, true),
    (AlignRegisters::ALT_C, Reg8::C, true),
    (AlignRegisters::ALT_D, Reg8::D, true),
    (AlignRegisters::ALT_E, Reg8::E, true),
    (AlignRegisters::ALT_H, Reg8::H, true),
    (AlignRegisters::ALT_L, Reg8::L, true),
];

impl FromStr for AlignRegisters {
    type Err = ParseRegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::empty();
        for c in s.trim().chars() {
            if c == 'T' {
                continue;
            }
            let bit = ALIGN_CHARS
                .find(c)
                .ok_or_else(|| ParseRegisterError::new(&c.to_string()))?;
            set |= Self::from_bits_retain(1 << bit);
        }
        Ok(set)
    }
}

impl Z80 {
    /// Take the interrupt and execution state of `src` (IFFs, IM, I, R,
    /// pending prefix, interrupt latches, block-loop state) plus the
    /// registers named in `which`.
    pub fn align_registers_with(&mut self, src: &Self, which: AlignRegisters) -> &mut Self {
        self.pending = src.pending;
        self.regs.iff1 = src.regs.iff1;
        self.regs.iff2 = src.regs.iff2;
        self.regs.im = src.regs.im;
        self.regs.i = src.regs.i;
        self.regs.r = src.regs.r;
        self.in_block_loop = src.in_block_loop;
        self.block_loop_before_interrupt = src.block_loop_before_interrupt;
        self.int_blocked = src.int_blocked;
        self.nmi_pending = src.nmi_pending;

        for (flag, reg, alt) in BYTE_COPIES {
            if which.contains(flag) {
                self.regs.set8(reg, alt, src.regs.get8(reg, alt));
            }
        }
        let carry_kept = [(AlignRegisters::F_NO_CARRY, false), (AlignRegisters::ALT_F_NO_CARRY, true)];
        for (flag, alt) in carry_kept {
            if which.contains(flag) {
                let own = self.regs.get8(Reg8::F, alt);
                let theirs = src.regs.get8(Reg8::F, alt);
                self.regs.set8(Reg8::F, alt, (own & CF) | (theirs & !CF));
            }
        }
        if which.contains(AlignRegisters::PC) {
            self.regs.pc = src.regs.pc;
        }
        if which.contains(AlignRegisters::SPH) {
            self.regs.sp = (self.regs.sp & 0x00FF) | (src.regs.sp & 0xFF00);
        }
        if which.contains(AlignRegisters::SPL) {
            self.regs.sp = (self.regs.sp & 0xFF00) | (src.regs.sp & 0x00FF);
        }
        self
    }
}
