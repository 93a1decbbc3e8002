//! Signal lines between a CPU and the board driving it.
//!
//! The physical pins are active-low; these masks are active-high. A set bit
//! means the line is asserted.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Input lines sampled by the CPU on every step.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Signals: u8 {
        /// Maskable interrupt request (/INT).
        const INT = 0b0001;
        /// Non-maskable interrupt request (/NMI).
        const NMI = 0b0010;
        /// Reset (/RESET).
        const RESET = 0b0100;
        /// Wait-state request (/WAIT).
        const WAIT = 0b1000;
    }
}

bitflags! {
    /// Output lines driven by the CPU.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct OutSignals: u8 {
        /// /M1: the last step performed an opcode fetch.
        const M1 = 0b01;
        /// /HALT: the CPU is executing HALT and waiting for an interrupt.
        const HALT = 0b10;
    }
}

impl Signals {
    /// No line asserted.
    pub const NONE: Self = Self::empty();
}

impl OutSignals {
    pub const NONE: Self = Self::empty();
}

impl fmt::Display for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (i, (name, _)) in self.iter_names().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
