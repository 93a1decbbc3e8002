//! CPU core trait.

use crate::{Bus, OutSignals, Signals, Tacts};

/// A CPU core driven one clock tact at a time.
///
/// The bus is passed in on every call rather than owned, so a board can
/// share it with other components and interleave several CPUs.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by one clock tact with the given input lines.
    ///
    /// Tact counts are exact, but bus accesses are not spread across the
    /// tacts: a core may perform every access of a segment on its first
    /// tick and spend the following ticks paying out the segment's cost. A
    /// WAIT raised after that first tick stalls the CPU without delaying
    /// accesses that already happened.
    ///
    /// Returns true while an instruction (or interrupt acknowledgment) is
    /// still in progress, false at an instruction boundary.
    fn tick<B: Bus>(&mut self, bus: &mut B, signals: Signals) -> bool;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Current state of the output lines.
    fn out_signals(&self) -> OutSignals;

    /// Tacts elapsed since creation.
    fn total_tacts(&self) -> Tacts;

    /// Reset the CPU to its power-on register state.
    fn reset(&mut self);
}
