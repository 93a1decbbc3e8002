//! Z80 CPU state, bus helpers and inspection.
//!
//! Execution lives in `execute` (instruction semantics) and `signals`
//! (the stepped driver that samples INT/NMI/RESET/WAIT).

mod align;
mod execute;
mod signals;

use std::fmt;

use emu_core::{Bus, BusRegister, MemoryAccess, Observable, OutSignals, Signals, Tacts, Value};

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::instruction::Family;
use crate::registers::{InterruptMode, Reg8, Reg16, Registers};
use crate::snapshot::CpuSnapshot;

pub use align::AlignRegisters;

/// Z80 CPU.
///
/// The CPU does not own the bus. The board passes it to every `step()` or
/// `tick()` call together with the current state of the input lines.
#[derive(Debug, Clone)]
pub struct Z80 {
    pub(crate) regs: Registers,

    /// HALT executed and no interrupt accepted since.
    halted: bool,
    /// Opcode table selected by prefix bytes already fetched.
    pending: Option<Family>,
    /// Skip interrupt sampling at the next instruction boundary (after EI
    /// or an undefined ED opcode).
    int_blocked: bool,
    /// Previous instruction was LD A,I or LD A,R.
    ld_a_ir: bool,
    /// F as written by the current instruction, 0 if it left F alone.
    q: u8,
    /// `q` of the previous instruction; feeds SCF/CCF.
    last_q: u8,
    /// NMI seen but not yet acknowledged.
    nmi_pending: bool,
    /// Last step rewound PC to repeat a block instruction.
    in_block_loop: bool,
    /// `in_block_loop` when the last interrupt was accepted; RETI and RETN
    /// put it back.
    block_loop_before_interrupt: bool,
    last_m1_opcode: u8,
    last_opcode: u8,
    out: OutSignals,

    step_tacts: u32,
    /// Tacts of the current step not yet handed out by `tick()`.
    tick_backlog: u32,
    total_tacts: Tacts,
}

impl Z80 {
    /// Create a Z80 in its reset state.
    #[must_use]
    pub fn new() -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            halted: false,
            pending: None,
            int_blocked: false,
            ld_a_ir: false,
            q: 0,
            last_q: 0,
            nmi_pending: false,
            in_block_loop: false,
            block_loop_before_interrupt: false,
            last_m1_opcode: 0,
            last_opcode: 0,
            out: OutSignals::NONE,
            step_tacts: 0,
            tick_backlog: 0,
            total_tacts: Tacts::ZERO,
        };
        cpu.reset_registers();
        cpu
    }

    /// Rebuild a CPU from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &CpuSnapshot) -> Self {
        let mut cpu = Self::new();
        cpu.restore(snapshot);
        cpu
    }

    /// Register state reached by /RESET.
    pub(crate) fn reset_registers(&mut self) {
        let regs = &mut self.regs;
        regs.pc = 0;
        regs.sp = 0xFFFF;
        regs.set_af(0xFFFF);
        regs.set16(Reg16::AF, true, 0xFFFF);
        regs.i = 0;
        regs.r = 0;
        regs.iff1 = false;
        regs.iff2 = false;
        regs.im = InterruptMode::Im0;

        self.halted = false;
        self.pending = None;
        self.int_blocked = false;
        self.ld_a_ir = false;
        self.q = 0;
        self.last_q = 0;
        self.nmi_pending = false;
        self.in_block_loop = false;
        self.block_loop_before_interrupt = false;
        self.out = OutSignals::NONE;
        self.tick_backlog = 0;
    }

    // === Inspection ===

    /// Total tacts elapsed since creation.
    #[must_use]
    pub const fn total_tacts(&self) -> Tacts {
        self.total_tacts
    }

    /// Tacts spent by the most recent `step()`.
    #[must_use]
    pub const fn step_tacts(&self) -> u32 {
        self.step_tacts
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// True while prefix bytes have been fetched but the opcode has not.
    #[must_use]
    pub const fn prefix_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// True if the last step rewound PC to repeat LDIR, CPIR, INIR, OTIR
    /// or one of their decrementing forms.
    #[must_use]
    pub const fn is_inside_block_loop(&self) -> bool {
        self.in_block_loop
    }

    /// Last byte read in an M1 cycle (prefixes included).
    #[must_use]
    pub const fn last_m1_opcode(&self) -> u8 {
        self.last_m1_opcode
    }

    /// Last opcode byte executed. For DDCB/FDCB forms this is the trailing
    /// byte, which is not an M1 fetch.
    #[must_use]
    pub const fn last_opcode(&self) -> u8 {
        self.last_opcode
    }

    #[must_use]
    pub const fn out_signals(&self) -> OutSignals {
        self.out
    }

    #[must_use]
    pub const fn regs(&self) -> &Registers {
        &self.regs
    }

    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.regs.pc
    }

    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.regs.sp
    }

    #[must_use]
    pub const fn a(&self) -> u8 {
        self.regs.a
    }

    #[must_use]
    pub const fn f(&self) -> u8 {
        self.regs.f
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        self.regs.bc()
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        self.regs.de()
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        self.regs.hl()
    }

    #[must_use]
    pub const fn wz(&self) -> u16 {
        self.regs.wz
    }

    // === Register access by name ===

    #[must_use]
    pub const fn get8(&self, reg: Reg8, alt: bool) -> u8 {
        self.regs.get8(reg, alt)
    }

    pub fn set8(&mut self, reg: Reg8, alt: bool, value: u8) {
        self.regs.set8(reg, alt, value);
    }

    #[must_use]
    pub const fn get16(&self, reg: Reg16, alt: bool) -> u16 {
        self.regs.get16(reg, alt)
    }

    pub fn set16(&mut self, reg: Reg16, alt: bool, value: u16) {
        self.regs.set16(reg, alt, value);
    }

    #[must_use]
    pub const fn interrupt_mode(&self) -> InterruptMode {
        self.regs.im
    }

    pub fn set_interrupt_mode(&mut self, mode: InterruptMode) {
        self.regs.im = mode;
    }

    #[must_use]
    pub const fn iff1(&self) -> bool {
        self.regs.iff1
    }

    #[must_use]
    pub const fn iff2(&self) -> bool {
        self.regs.iff2
    }

    pub fn set_iff(&mut self, iff1: bool, iff2: bool) {
        self.regs.iff1 = iff1;
        self.regs.iff2 = iff2;
    }

    // === Snapshots ===

    /// Capture everything that influences future execution.
    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            registers: self.regs,
            halted: self.halted,
            pending_prefix: self.pending,
            int_blocked: self.int_blocked,
            ld_a_ir: self.ld_a_ir,
            q: self.q,
            last_q: self.last_q,
            nmi_pending: self.nmi_pending,
            in_block_loop: self.in_block_loop,
            block_loop_before_interrupt: self.block_loop_before_interrupt,
            last_m1_opcode: self.last_m1_opcode,
            last_opcode: self.last_opcode,
            total_tacts: self.total_tacts,
        }
    }

    pub fn restore(&mut self, snapshot: &CpuSnapshot) {
        self.regs = snapshot.registers;
        self.halted = snapshot.halted;
        self.pending = snapshot.pending_prefix;
        self.int_blocked = snapshot.int_blocked;
        self.ld_a_ir = snapshot.ld_a_ir;
        self.q = snapshot.q;
        self.last_q = snapshot.last_q;
        self.nmi_pending = snapshot.nmi_pending;
        self.in_block_loop = snapshot.in_block_loop;
        self.block_loop_before_interrupt = snapshot.block_loop_before_interrupt;
        self.last_m1_opcode = snapshot.last_m1_opcode;
        self.last_opcode = snapshot.last_opcode;
        self.total_tacts = snapshot.total_tacts;
        self.out = OutSignals::NONE;
        self.out.set(OutSignals::HALT, self.halted);
        self.step_tacts = 0;
        self.tick_backlog = 0;
    }

    /// Compare architectural registers (both banks, IX, IY, SP, PC, I, R,
    /// IM, IFFs) with another CPU. With `compare_opcodes`, the last executed
    /// opcode bytes must match as well.
    #[must_use]
    pub fn same_state(&self, other: &Self, compare_opcodes: bool) -> bool {
        let (a, b) = (&self.regs, &other.regs);
        let architectural = Registers { wz: 0, ..*a } == Registers { wz: 0, ..*b };
        architectural
            && (!compare_opcodes
                || (self.last_m1_opcode == other.last_m1_opcode
                    && self.last_opcode == other.last_opcode))
    }

    // === Test helpers ===

    /// Set the program counter.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn set_pc(&mut self, value: u16) {
        self.regs.pc = value;
    }

    /// Set the stack pointer.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn set_sp(&mut self, value: u16) {
        self.regs.sp = value;
    }

    /// Pop a return address into PC, as if RET had executed, without
    /// spending any tacts. Used by CP/M harnesses to return from BDOS traps.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn force_ret<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.pop(bus);
        self.regs.pc = addr;
        self.pending = None;
    }

    // === Bus helpers ===

    /// M1 cycle: read the byte at PC as an opcode, advance PC and R.
    fn fetch_opcode<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let op = bus.read(self.regs.pc, MemoryAccess::Opcode);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.regs.inc_r();
        self.last_m1_opcode = op;
        self.out.set(OutSignals::M1, true);
        op
    }

    fn fetch_operand<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc, MemoryAccess::Operand);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_operand(bus);
        let hi = self.fetch_operand(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn fetch_displacement<B: Bus>(&mut self, bus: &mut B) -> i8 {
        self.fetch_operand(bus) as i8
    }

    fn read<B: Bus>(&mut self, bus: &mut B, addr: u16) -> u8 {
        bus.read(addr, MemoryAccess::Data)
    }

    fn read_word<B: Bus>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let lo = self.read(bus, addr);
        let hi = self.read(bus, addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn write<B: Bus>(&mut self, bus: &mut B, addr: u16, value: u8) {
        bus.write(addr, value);
    }

    fn write_word<B: Bus>(&mut self, bus: &mut B, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(bus, addr, lo);
        self.write(bus, addr.wrapping_add(1), hi);
    }

    fn register_value(&self, reg: BusRegister) -> u16 {
        match reg {
            BusRegister::A => u16::from(self.regs.a),
            BusRegister::B => u16::from(self.regs.b),
            BusRegister::I => u16::from(self.regs.i),
            BusRegister::Bc => self.regs.bc(),
            BusRegister::De => self.regs.de(),
            BusRegister::Hl => self.regs.hl(),
            BusRegister::Ix => self.regs.ix,
            BusRegister::Iy => self.regs.iy,
            BusRegister::Sp => self.regs.sp,
        }
    }

    /// Memory address held in `reg`, as substituted by the bus.
    fn pointer<B: Bus>(&self, bus: &mut B, reg: BusRegister) -> u16 {
        bus.pointer(reg, self.register_value(reg))
    }

    /// Port address (or, for A, its high byte) held in `reg`, as
    /// substituted by the bus.
    fn port_address<B: Bus>(&self, bus: &mut B, reg: BusRegister) -> u16 {
        bus.port_address(reg, self.register_value(reg))
    }

    /// Push high byte first, as the hardware does.
    fn push<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.pointer(bus, BusRegister::Sp).wrapping_sub(1);
        self.write(bus, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, lo);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let sp = self.pointer(bus, BusRegister::Sp);
        let value = self.read_word(bus, sp);
        self.regs.sp = sp.wrapping_add(2);
        value
    }

    /// Write F and latch it into Q.
    fn set_f(&mut self, value: u8) {
        self.regs.f = value;
        self.q = value;
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl emu_core::Cpu for Z80 {
    type Registers = Registers;

    fn tick<B: Bus>(&mut self, bus: &mut B, signals: Signals) -> bool {
        Z80::tick(self, bus, signals)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn out_signals(&self) -> OutSignals {
        self.out
    }

    fn total_tacts(&self) -> Tacts {
        self.total_tacts
    }

    fn reset(&mut self) {
        Z80::reset(self);
    }
}

impl fmt::Display for Z80 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.regs;
        write!(
            f,
            "PC={:04X},SP={:04X},IX={:04X},IY={:04X},AF={:04X},BC={:04X},DE={:04X},HL={:04X},\
             AF'={:04X},BC'={:04X},DE'={:04X},HL'={:04X},R={:02X},I={:02X},IM={},IFF1={},IFF2={},\
             M1={:02X},OP={:02X}",
            r.pc,
            r.sp,
            r.ix,
            r.iy,
            r.af(),
            r.bc(),
            r.de(),
            r.hl(),
            r.get16(Reg16::AF, true),
            r.get16(Reg16::BC, true),
            r.get16(Reg16::DE, true),
            r.get16(Reg16::HL, true),
            r.r,
            r.i,
            r.im.number(),
            r.iff1,
            r.iff2,
            self.last_m1_opcode,
            self.last_opcode,
        )
    }
}

/// All query paths supported by the Z80.
const Z80_QUERY_PATHS: &[&str] = &[
    // Main registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    "af", "bc", "de", "hl",
    // Alternate bank
    "a'", "f'", "b'", "c'", "d'", "e'", "h'", "l'",
    "af'", "bc'", "de'", "hl'",
    // Index and special registers
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    "sp", "pc", "i", "r", "wz",
    // Flags
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.p", "flags.n", "flags.c",
    // Interrupt state
    "iff1", "iff2", "im", "nmi_pending", "ei",
    // Execution state
    "halted", "prefix", "q", "p", "block_loop",
    "tacts", "step_tacts", "last_opcode",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        if let Some(flag) = path.strip_prefix("flags.") {
            let bit = match flag {
                "s" => SF,
                "z" => ZF,
                "y" => YF,
                "h" => HF,
                "x" => XF,
                "p" => PF,
                "n" => NF,
                "c" => CF,
                _ => return None,
            };
            return Some((r.f & bit != 0).into());
        }
        if let Some(name) = path.strip_suffix('\'') {
            return if name.len() == 1 {
                name.parse::<Reg8>().ok().map(|reg| r.get8(reg, true).into())
            } else {
                name.parse::<Reg16>().ok().map(|reg| r.get16(reg, true).into())
            };
        }

        match path {
            "im" => Some(r.im.number().into()),
            "iff1" => Some(r.iff1.into()),
            "iff2" => Some(r.iff2.into()),
            "nmi_pending" => Some(self.nmi_pending.into()),
            "ei" => Some(self.int_blocked.into()),
            "halted" => Some(self.halted.into()),
            "prefix" => Some(self.pending.map_or(0, |family| {
                family.prefix().last().copied().unwrap_or(0)
            }).into()),
            "q" => Some(self.q.into()),
            "p" => Some(self.ld_a_ir.into()),
            "block_loop" => Some(self.in_block_loop.into()),
            "tacts" => Some(self.total_tacts.get().into()),
            "step_tacts" => Some(u64::from(self.step_tacts).into()),
            "last_opcode" => Some(self.last_opcode.into()),
            _ => path
                .parse::<Reg8>()
                .map(|reg| Value::from(r.get8(reg, false)))
                .or_else(|_| path.parse::<Reg16>().map(|reg| Value::from(r.get16(reg, false))))
                .ok(),
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state() {
        let cpu = Z80::new();
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.sp(), 0xFFFF);
        assert_eq!(cpu.regs.af(), 0xFFFF);
        assert_eq!(cpu.get16(Reg16::AF, true), 0xFFFF);
        assert!(!cpu.iff1());
        assert_eq!(cpu.interrupt_mode(), InterruptMode::Im0);
    }

    #[test]
    fn queries() {
        let mut cpu = Z80::new();
        cpu.set16(Reg16::HL, true, 0x1234);
        cpu.set16(Reg16::IX, false, 0xABCD);
        cpu.set8(Reg8::F, false, ZF | CF);
        assert_eq!(cpu.query("hl'"), Some(Value::U16(0x1234)));
        assert_eq!(cpu.query("h'"), Some(Value::U8(0x12)));
        assert_eq!(cpu.query("ixl"), Some(Value::U8(0xCD)));
        assert_eq!(cpu.query("flags.z"), Some(Value::Bool(true)));
        assert_eq!(cpu.query("flags.s"), Some(Value::Bool(false)));
        assert_eq!(cpu.query("tacts"), Some(Value::U64(0)));
        assert_eq!(cpu.query("bogus"), None);
        for path in cpu.query_paths() {
            assert!(cpu.query(path).is_some(), "{path}");
        }
    }

    #[test]
    fn state_string() {
        let cpu = Z80::new();
        let s = cpu.to_string();
        assert!(s.starts_with("PC=0000,SP=FFFF,"), "{s}");
        assert!(s.contains("AF'=FFFF"), "{s}");
        assert!(s.contains("IM=0,IFF1=false"), "{s}");
    }

    #[test]
    fn same_state_ignores_wz() {
        let a = Z80::new();
        let mut b = Z80::new();
        b.set16(Reg16::WZ, false, 0x5555);
        assert!(a.same_state(&b, true));
        b.set8(Reg8::R, false, 1);
        assert!(!a.same_state(&b, false));
    }
}
