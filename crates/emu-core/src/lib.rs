//! Core traits and types for cycle-accurate emulation.
//!
//! A CPU core never owns its memory. The board implements [`Bus`] and drives
//! the core with a [`Signals`] mask once per step; all timing is counted in
//! [`Tacts`] of the CPU clock.

mod bus;
mod cpu;
mod observable;
mod signals;
mod tacts;

pub use bus::{Bus, BusEvent, BusRegister, InterruptKind, MemoryAccess, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use signals::{OutSignals, Signals};
pub use tacts::Tacts;
