//! Stepped driver: boundary sampling of RESET, NMI, INT and WAIT.
//!
//! A step is one M1-bounded segment: a prefix byte, a final opcode with its
//! execution, an interrupt acknowledgment, a reset, a halted NOP fetch or a
//! single WAIT tact. Interrupts are only looked at when no prefix is
//! pending, so a prefix chain is never split by an acknowledgment.

use emu_core::{Bus, BusRegister, InterruptKind, MemoryAccess, OutSignals, Signals};

use crate::flags::PF;
use crate::instruction::{Descriptor, Family, Kind, descriptor};
use crate::registers::InterruptMode;

use super::Z80;
use super::execute::Index;

const RESET_TACTS: u32 = 3;
const NMI_TACTS: u32 = 11;
const IM0_ACK_TACTS: u32 = 2;
const IM1_TACTS: u32 = 13;
const IM2_TACTS: u32 = 19;
const HALT_FETCH_TACTS: u32 = 4;
const NMI_VECTOR: u16 = 0x0066;
const IM1_VECTOR: u16 = 0x0038;

/// Tacts of the segment that ends `desc`, after its prefixes were paid for.
fn segment_tacts(desc: &Descriptor, taken: bool) -> u32 {
    let extra = if taken { u32::from(desc.extra_tacts) } else { 0 };
    u32::from(desc.tacts) + extra - u32::from(desc.family.prefix_tacts())
}

impl Z80 {
    /// Run one segment. Returns true while the instruction is still in
    /// flight: a prefix is pending or WAIT held the CPU.
    pub fn step<B: Bus>(&mut self, bus: &mut B, signals: Signals) -> bool {
        self.step_tacts = 0;
        self.tick_backlog = 0;
        self.out.set(OutSignals::M1, false);
        self.latch_nmi(signals);

        if signals.contains(Signals::WAIT) {
            self.end_step(1);
            return true;
        }

        let block_loop = std::mem::take(&mut self.in_block_loop);
        let (tacts, busy) = if let Some(family) = self.pending {
            self.run_segment(bus, family)
        } else if signals.contains(Signals::RESET) {
            self.reset_registers();
            log::debug!("Z80 reset");
            (RESET_TACTS, false)
        } else if let Some(acknowledged) = self.accept_interrupt(bus, signals, block_loop) {
            acknowledged
        } else if self.halted {
            self.halted_fetch(bus);
            (HALT_FETCH_TACTS, false)
        } else {
            self.run_segment(bus, Family::Plain)
        };

        self.end_step(tacts);
        busy
    }

    /// Advance by a single tact.
    ///
    /// Bus accesses are front-loaded: the first tick of a segment performs
    /// all of them, and the following ticks only pay out the segment's
    /// remaining cost. WAIT during those ticks adds tacts but cannot move
    /// an access that has already happened. An NMI seen on any tick is
    /// latched for the next boundary.
    ///
    /// Returns true while the current instruction is still in flight.
    pub fn tick<B: Bus>(&mut self, bus: &mut B, signals: Signals) -> bool {
        if self.tick_backlog > 0 {
            self.latch_nmi(signals);
            if signals.contains(Signals::WAIT) {
                self.total_tacts += 1u32;
                return true;
            }
            self.tick_backlog -= 1;
            return self.tick_backlog > 0 || self.pending.is_some();
        }

        let busy = self.step(bus, signals);
        self.tick_backlog = self.step_tacts.saturating_sub(1);
        busy || self.tick_backlog > 0
    }

    /// Run until the next instruction boundary and return the tacts spent.
    ///
    /// WAIT is ignored. An accepted interrupt or reset counts as the
    /// instruction.
    pub fn next_instruction<B: Bus>(&mut self, bus: &mut B, signals: Signals) -> u32 {
        let mut signals = signals;
        signals.remove(Signals::WAIT);

        let mut spent = 0;
        loop {
            let busy = self.step(bus, signals);
            spent += self.step_tacts;
            if !busy {
                return spent;
            }
        }
    }

    /// Like [`next_instruction`](Self::next_instruction), but a repeating
    /// block instruction runs until it completes. INT and RESET are only
    /// offered to the first step.
    pub fn next_instruction_skip_blocks<B: Bus>(&mut self, bus: &mut B, signals: Signals) -> u32 {
        let mut signals = signals;
        signals.remove(Signals::WAIT);

        let mut spent = 0;
        loop {
            let busy = self.step(bus, signals);
            spent += self.step_tacts;
            if !busy && !self.in_block_loop {
                return spent;
            }
            signals.remove(Signals::INT);
            signals.remove(Signals::RESET);
        }
    }

    /// Return to the reset state without spending tacts.
    pub fn reset(&mut self) {
        self.reset_registers();
        self.step_tacts = 0;
        log::debug!("Z80 reset");
    }

    /// NMI is sampled as a level. A line held across several boundaries is
    /// accepted at each of them; one raised while no boundary is reachable
    /// (WAIT, a prefix, the rest of a ticked segment) waits for the next.
    fn latch_nmi(&mut self, signals: Signals) {
        if signals.contains(Signals::NMI) {
            self.nmi_pending = true;
        }
    }

    fn end_step(&mut self, tacts: u32) {
        self.step_tacts = tacts;
        self.total_tacts += tacts;
        self.out.set(OutSignals::HALT, self.halted);
        log::trace!("{tacts:>2}T {self}");
    }

    /// Q and the LD A,I/R latch age by one instruction at every M1.
    fn begin_instruction(&mut self) {
        self.last_q = self.q;
        self.q = 0;
        self.ld_a_ir = false;
    }

    /// Fetch and run the next byte of the instruction stream.
    fn run_segment<B: Bus>(&mut self, bus: &mut B, family: Family) -> (u32, bool) {
        let idx = match family {
            Family::Dd | Family::DdCb => Index::Ix,
            Family::Fd | Family::FdCb => Index::Iy,
            _ => Index::Hl,
        };

        // DD CB d op: the displacement and the opcode are plain reads.
        if matches!(family, Family::DdCb | Family::FdCb) {
            let d = self.fetch_displacement(bus);
            let op = self.fetch_operand(bus);
            self.pending = None;
            self.last_opcode = op;
            self.execute_indexed_cb(bus, idx, d, op);
            return (segment_tacts(descriptor(family, op), false), false);
        }

        if family == Family::Plain {
            self.begin_instruction();
        }
        let op = self.fetch_opcode(bus);
        let desc = descriptor(family, op);
        if desc.kind == Kind::Prefix {
            self.pending = Some(family.after_prefix(op));
            return (u32::from(desc.tacts), true);
        }

        self.pending = None;
        self.last_opcode = op;
        let taken = match family {
            Family::Cb => {
                self.execute_cb(bus, op);
                false
            }
            Family::Ed => self.execute_ed(bus, op),
            _ => self.execute_main(bus, op, idx),
        };
        if self.halted {
            log::debug!("HALT at {:04X}", self.regs.pc.wrapping_sub(1));
        }
        (segment_tacts(desc, taken), false)
    }

    /// M1 cycle while halted: the CPU refetches the byte after HALT as a
    /// NOP without moving PC.
    fn halted_fetch<B: Bus>(&mut self, bus: &mut B) {
        self.begin_instruction();
        bus.read(self.regs.pc, MemoryAccess::Opcode);
        self.regs.inc_r();
        self.out.set(OutSignals::M1, true);
    }

    /// Sample NMI and INT at an instruction boundary. Returns the cost of the
    /// acknowledgment and whether it left a prefix pending, or `None` if
    /// nothing was accepted. `block_loop` says whether the interrupted
    /// instruction was a repeating block op; RETI/RETN restore it.
    fn accept_interrupt<B: Bus>(
        &mut self,
        bus: &mut B,
        signals: Signals,
        block_loop: bool,
    ) -> Option<(u32, bool)> {
        if std::mem::take(&mut self.int_blocked) {
            return None;
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            bus.on_interrupt(InterruptKind::Nmi);
            self.acknowledge(block_loop);
            self.regs.iff1 = false;
            self.push(bus, self.regs.pc);
            self.regs.pc = NMI_VECTOR;
            self.regs.wz = NMI_VECTOR;
            log::debug!("NMI accepted");
            return Some((NMI_TACTS, false));
        }

        if !self.regs.iff1 || !signals.contains(Signals::INT) {
            return None;
        }

        let mode = self.regs.im;
        bus.on_interrupt(InterruptKind::Maskable { mode: mode.number() });
        self.acknowledge(block_loop);
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        log::debug!("INT accepted in IM {}", mode.number());

        let acknowledged = match mode {
            InterruptMode::Im0 => {
                let op = bus.data_lines();
                self.last_m1_opcode = op;
                let desc = descriptor(Family::Plain, op);
                if desc.kind == Kind::Prefix {
                    self.pending = Some(Family::Plain.after_prefix(op));
                    return Some((IM0_ACK_TACTS + u32::from(desc.tacts), true));
                }
                self.last_opcode = op;
                let taken = self.execute_main(bus, op, Index::Hl);
                (IM0_ACK_TACTS + segment_tacts(desc, taken), false)
            }
            InterruptMode::Im1 => {
                self.push(bus, self.regs.pc);
                self.regs.pc = IM1_VECTOR;
                self.regs.wz = IM1_VECTOR;
                (IM1_TACTS, false)
            }
            InterruptMode::Im2 => {
                // The vector byte is taken during the acknowledge cycle,
                // before the return address goes on the stack.
                let low = bus.data_lines();
                self.push(bus, self.regs.pc);
                let page = bus.special_register(BusRegister::I, self.regs.i);
                let vector = u16::from_le_bytes([low, page]);
                self.regs.pc = self.read_word(bus, vector);
                self.regs.wz = self.regs.pc;
                (IM2_TACTS, false)
            }
        };
        Some(acknowledged)
    }

    /// Common start of every acknowledgment cycle.
    fn acknowledge(&mut self, block_loop: bool) {
        self.halted = false;
        self.block_loop_before_interrupt = block_loop;
        self.regs.inc_r();
        self.last_q = self.q;
        self.q = 0;
        // An interrupt taken straight after LD A,I/R sees P/V cleared.
        if std::mem::take(&mut self.ld_a_ir) {
            self.regs.f &= !PF;
        }
        self.out.set(OutSignals::M1, true);
    }
}
