//! Cycle-accurate Zilog Z80 CPU core.
//!
//! The core is driven one M1-bounded step at a time (`Z80::step`), one tact
//! at a time (`Z80::tick`), or one instruction at a time
//! (`Z80::next_instruction`). Every call takes the board's bus and the
//! current state of the INT, NMI, RESET and WAIT lines.
//!
//! Timing comes from the static descriptor table in [`instruction`].

pub mod alu;
mod cpu;
mod error;
mod flags;
pub mod instruction;
mod registers;
mod snapshot;

pub use cpu::{AlignRegisters, Z80};
pub use error::{InvalidInterruptMode, ParseRegisterError};
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use instruction::{Descriptor, Family, Kind, Operands, descriptor};
pub use registers::{InterruptMode, Reg8, Reg16, Registers};
pub use snapshot::CpuSnapshot;
