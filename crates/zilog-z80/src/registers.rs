//! Z80 register file.
//!
//! Pairs are never stored: `bc()` is always `b:c`. The AF pair and the
//! BC/DE/HL group each have an alternate bank, swapped independently by
//! `EX AF,AF'` and `EXX`.

use std::fmt;
use std::str::FromStr;

use crate::error::{InvalidInterruptMode, ParseRegisterError};

/// Maskable interrupt response mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterruptMode {
    /// Execute the instruction on the data lines.
    #[default]
    Im0,
    /// Restart at 0x0038.
    Im1,
    /// Vectored through the table at `I:data`.
    Im2,
}

impl InterruptMode {
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Im0 => 0,
            Self::Im1 => 1,
            Self::Im2 => 2,
        }
    }
}

impl TryFrom<u8> for InterruptMode {
    type Error = InvalidInterruptMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Im0),
            1 => Ok(Self::Im1),
            2 => Ok(Self::Im2),
            other => Err(InvalidInterruptMode(other)),
        }
    }
}

/// 8-bit register selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg8 {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
    I,
    R,
}

/// 16-bit register selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    IX,
    IY,
    SP,
    PC,
    /// Internal MEMPTR.
    WZ,
}

impl FromStr for Reg8 {
    type Err = ParseRegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "a" => Self::A,
            "f" => Self::F,
            "b" => Self::B,
            "c" => Self::C,
            "d" => Self::D,
            "e" => Self::E,
            "h" => Self::H,
            "l" => Self::L,
            "ixh" | "xh" => Self::Ixh,
            "ixl" | "xl" => Self::Ixl,
            "iyh" | "yh" => Self::Iyh,
            "iyl" | "yl" => Self::Iyl,
            "i" => Self::I,
            "r" => Self::R,
            _ => return Err(ParseRegisterError::new(s)),
        })
    }
}

impl FromStr for Reg16 {
    type Err = ParseRegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "af" => Self::AF,
            "bc" => Self::BC,
            "de" => Self::DE,
            "hl" => Self::HL,
            "ix" => Self::IX,
            "iy" => Self::IY,
            "sp" => Self::SP,
            "pc" => Self::PC,
            "wz" | "memptr" => Self::WZ,
            _ => return Err(ParseRegisterError::new(s)),
        })
    }
}

impl fmt::Display for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::F => "F",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::H => "H",
            Self::L => "L",
            Self::Ixh => "IXH",
            Self::Ixl => "IXL",
            Self::Iyh => "IYH",
            Self::Iyl => "IYL",
            Self::I => "I",
            Self::R => "R",
        };
        f.write_str(name)
    }
}

/// Z80 register file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    /// Interrupt vector page.
    pub i: u8,
    /// Memory refresh counter. Bit 7 only changes on explicit writes.
    pub r: u8,
    /// WZ/MEMPTR. Leaks into the undocumented X/Y flags of BIT n,(HL).
    pub wz: u16,

    pub iff1: bool,
    pub iff2: bool,
    pub im: InterruptMode,
}

const fn join(hi: u8, lo: u8) -> u16 {
    (hi as u16) << 8 | lo as u16
}

impl Registers {
    #[must_use]
    pub const fn af(&self) -> u16 {
        join(self.a, self.f)
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        join(self.b, self.c)
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        join(self.d, self.e)
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        join(self.h, self.l)
    }

    pub fn set_af(&mut self, value: u16) {
        [self.a, self.f] = value.to_be_bytes();
    }

    pub fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    pub fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    pub fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }

    /// Read an 8-bit register; `alt` selects the alternate bank where one exists.
    #[must_use]
    pub const fn get8(&self, reg: Reg8, alt: bool) -> u8 {
        match (reg, alt) {
            (Reg8::A, false) => self.a,
            (Reg8::F, false) => self.f,
            (Reg8::B, false) => self.b,
            (Reg8::C, false) => self.c,
            (Reg8::D, false) => self.d,
            (Reg8::E, false) => self.e,
            (Reg8::H, false) => self.h,
            (Reg8::L, false) => self.l,
            (Reg8::A, true) => self.a_alt,
            (Reg8::F, true) => self.f_alt,
            (Reg8::B, true) => self.b_alt,
            (Reg8::C, true) => self.c_alt,
            (Reg8::D, true) => self.d_alt,
            (Reg8::E, true) => self.e_alt,
            (Reg8::H, true) => self.h_alt,
            (Reg8::L, true) => self.l_alt,
            (Reg8::Ixh, _) => (self.ix >> 8) as u8,
            (Reg8::Ixl, _) => self.ix as u8,
            (Reg8::Iyh, _) => (self.iy >> 8) as u8,
            (Reg8::Iyl, _) => self.iy as u8,
            (Reg8::I, _) => self.i,
            (Reg8::R, _) => self.r,
        }
    }

    pub fn set8(&mut self, reg: Reg8, alt: bool, value: u8) {
        match (reg, alt) {
            (Reg8::A, false) => self.a = value,
            (Reg8::F, false) => self.f = value,
            (Reg8::B, false) => self.b = value,
            (Reg8::C, false) => self.c = value,
            (Reg8::D, false) => self.d = value,
            (Reg8::E, false) => self.e = value,
            (Reg8::H, false) => self.h = value,
            (Reg8::L, false) => self.l = value,
            (Reg8::A, true) => self.a_alt = value,
            (Reg8::F, true) => self.f_alt = value,
            (Reg8::B, true) => self.b_alt = value,
            (Reg8::C, true) => self.c_alt = value,
            (Reg8::D, true) => self.d_alt = value,
            (Reg8::E, true) => self.e_alt = value,
            (Reg8::H, true) => self.h_alt = value,
            (Reg8::L, true) => self.l_alt = value,
            (Reg8::Ixh, _) => self.ix = (self.ix & 0x00FF) | u16::from(value) << 8,
            (Reg8::Ixl, _) => self.ix = (self.ix & 0xFF00) | u16::from(value),
            (Reg8::Iyh, _) => self.iy = (self.iy & 0x00FF) | u16::from(value) << 8,
            (Reg8::Iyl, _) => self.iy = (self.iy & 0xFF00) | u16::from(value),
            (Reg8::I, _) => self.i = value,
            (Reg8::R, _) => self.r = value,
        }
    }

    /// Read a 16-bit register; `alt` only affects AF, BC, DE and HL.
    #[must_use]
    pub const fn get16(&self, reg: Reg16, alt: bool) -> u16 {
        match (reg, alt) {
            (Reg16::AF, false) => self.af(),
            (Reg16::BC, false) => self.bc(),
            (Reg16::DE, false) => self.de(),
            (Reg16::HL, false) => self.hl(),
            (Reg16::AF, true) => join(self.a_alt, self.f_alt),
            (Reg16::BC, true) => join(self.b_alt, self.c_alt),
            (Reg16::DE, true) => join(self.d_alt, self.e_alt),
            (Reg16::HL, true) => join(self.h_alt, self.l_alt),
            (Reg16::IX, _) => self.ix,
            (Reg16::IY, _) => self.iy,
            (Reg16::SP, _) => self.sp,
            (Reg16::PC, _) => self.pc,
            (Reg16::WZ, _) => self.wz,
        }
    }

    pub fn set16(&mut self, reg: Reg16, alt: bool, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        match (reg, alt) {
            (Reg16::AF, false) => self.set_af(value),
            (Reg16::BC, false) => self.set_bc(value),
            (Reg16::DE, false) => self.set_de(value),
            (Reg16::HL, false) => self.set_hl(value),
            (Reg16::AF, true) => (self.a_alt, self.f_alt) = (hi, lo),
            (Reg16::BC, true) => (self.b_alt, self.c_alt) = (hi, lo),
            (Reg16::DE, true) => (self.d_alt, self.e_alt) = (hi, lo),
            (Reg16::HL, true) => (self.h_alt, self.l_alt) = (hi, lo),
            (Reg16::IX, _) => self.ix = value,
            (Reg16::IY, _) => self.iy = value,
            (Reg16::SP, _) => self.sp = value,
            (Reg16::PC, _) => self.pc = value,
            (Reg16::WZ, _) => self.wz = value,
        }
    }

    /// `EX AF,AF'`
    pub fn swap_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_alt);
        std::mem::swap(&mut self.f, &mut self.f_alt);
    }

    /// `EXX`
    pub fn swap_general(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_alt);
        std::mem::swap(&mut self.c, &mut self.c_alt);
        std::mem::swap(&mut self.d, &mut self.d_alt);
        std::mem::swap(&mut self.e, &mut self.e_alt);
        std::mem::swap(&mut self.h, &mut self.h_alt);
        std::mem::swap(&mut self.l, &mut self.l_alt);
    }

    /// Advance the low 7 bits of R, as every M1 cycle does.
    pub fn inc_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: [(Reg16, Reg8, Reg8); 4] = [
        (Reg16::AF, Reg8::A, Reg8::F),
        (Reg16::BC, Reg8::B, Reg8::C),
        (Reg16::DE, Reg8::D, Reg8::E),
        (Reg16::HL, Reg8::H, Reg8::L),
    ];

    #[test]
    fn pair_is_projection_of_bytes() {
        let mut regs = Registers::default();
        for alt in [false, true] {
            for (pair, hi, lo) in PAIRS {
                regs.set8(hi, alt, 0x12);
                regs.set8(lo, alt, 0x34);
                assert_eq!(regs.get16(pair, alt), 0x1234, "{pair:?} alt={alt}");

                regs.set16(pair, alt, 0xBEEF);
                assert_eq!(regs.get8(hi, alt), 0xBE);
                assert_eq!(regs.get8(lo, alt), 0xEF);
            }
        }
    }

    #[test]
    fn banks_are_independent() {
        let mut regs = Registers::default();
        regs.set16(Reg16::BC, false, 0x1111);
        regs.set16(Reg16::BC, true, 0x2222);
        regs.set16(Reg16::AF, true, 0x3333);
        assert_eq!(regs.bc(), 0x1111);
        assert_eq!(regs.af(), 0);

        regs.swap_general();
        assert_eq!(regs.bc(), 0x2222);
        assert_eq!(regs.get16(Reg16::BC, true), 0x1111);
        assert_eq!(regs.af(), 0, "EXX leaves AF alone");

        regs.swap_af();
        assert_eq!(regs.af(), 0x3333);
    }

    #[test]
    fn index_halves() {
        let mut regs = Registers::default();
        regs.set8(Reg8::Ixh, false, 0xAB);
        regs.set8(Reg8::Ixl, false, 0xCD);
        regs.set8(Reg8::Iyl, true, 0x01);
        assert_eq!(regs.ix, 0xABCD);
        assert_eq!(regs.iy, 0x0001);
        assert_eq!(regs.get16(Reg16::IX, true), 0xABCD, "no alternate IX");
    }

    #[test]
    fn r_keeps_bit_7() {
        let mut regs = Registers { r: 0xFF, ..Registers::default() };
        regs.inc_r();
        assert_eq!(regs.r, 0x80);
        regs.r = 0x7F;
        regs.inc_r();
        assert_eq!(regs.r, 0x00);
    }

    #[test]
    fn names_parse() {
        assert_eq!("IXH".parse::<Reg8>(), Ok(Reg8::Ixh));
        assert_eq!("sp".parse::<Reg16>(), Ok(Reg16::SP));
        let err = "q".parse::<Reg8>().unwrap_err();
        assert_eq!(err.name(), "q");
        assert_eq!(err.to_string(), "unknown Z80 register: \"q\"");
    }

    #[test]
    fn interrupt_mode_range() {
        assert_eq!(InterruptMode::try_from(2), Ok(InterruptMode::Im2));
        assert_eq!(InterruptMode::try_from(3), Err(InvalidInterruptMode(3)));
        assert_eq!(InterruptMode::Im1.number(), 1);
    }
}
