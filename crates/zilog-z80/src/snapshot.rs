//! Saved CPU state.

use emu_core::Tacts;

use crate::instruction::Family;
use crate::registers::Registers;

/// Everything that influences the CPU's future behaviour: registers plus
/// the execution latches. Restoring a snapshot and replaying the same bus
/// reproduces the same access trace.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuSnapshot {
    pub registers: Registers,
    pub halted: bool,
    /// Opcode table selected by prefix bytes already fetched.
    pub pending_prefix: Option<Family>,
    /// Interrupts are not sampled at the next boundary.
    pub int_blocked: bool,
    pub ld_a_ir: bool,
    pub q: u8,
    pub last_q: u8,
    pub nmi_pending: bool,
    pub in_block_loop: bool,
    /// Block-loop state of the instruction the last interrupt broke into.
    pub block_loop_before_interrupt: bool,
    pub last_m1_opcode: u8,
    pub last_opcode: u8,
    pub total_tacts: Tacts,
}
