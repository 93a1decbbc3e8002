//! Snapshot and restore must reproduce execution exactly.

use emu_core::{BusEvent, SimpleBus, Signals};
use zilog_z80::{AlignRegisters, CF, CpuSnapshot, InterruptMode, Reg8, Reg16, Z80};

/// A loop that exercises block moves, indexed memory, I/O and DJNZ.
const PROGRAM: &[u8] = &[
    0x21, 0x00, 0x50, // LD HL,5000h
    0x11, 0x00, 0x60, // LD DE,6000h
    0x01, 0x10, 0x00, // LD BC,0010h
    0xED, 0xB0, //       LDIR
    0xDD, 0x21, 0x00, 0x50, // LD IX,5000h
    0xDD, 0x34, 0x03, // INC (IX+3)
    0x3E, 0x07, //       LD A,7
    0xD3, 0xFE, //       OUT (FEh),A
    0x37, //             SCF
    0x10, 0xFE, //       DJNZ $
    0xC3, 0x00, 0x00, // JP 0
];

fn new_bus() -> SimpleBus {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, PROGRAM);
    let pattern: Vec<u8> = (0..=0x0F).map(|n| n * 0x11).collect();
    bus.load(0x5000, &pattern);
    bus
}

fn copy_memory(from: &SimpleBus) -> SimpleBus {
    let mut bus = SimpleBus::new();
    for addr in 0..=0xFFFF {
        bus.poke(addr, from.peek(addr));
    }
    bus
}

fn run_steps(cpu: &mut Z80, bus: &mut SimpleBus, steps: usize) {
    for _ in 0..steps {
        cpu.step(bus, Signals::NONE);
    }
}

#[test]
fn restore_reproduces_bus_trace() {
    let mut cpu = Z80::new();
    let mut bus = new_bus();
    // Stop mid-LDIR, with a prefix pending.
    run_steps(&mut cpu, &mut bus, 10);
    assert!(cpu.prefix_pending());

    let snapshot = cpu.snapshot();
    let mut replay_bus = copy_memory(&bus);

    bus.enable_trace();
    run_steps(&mut cpu, &mut bus, 700);
    let original: Vec<BusEvent> = bus.take_trace();

    let mut replay = Z80::from_snapshot(&snapshot);
    replay_bus.enable_trace();
    run_steps(&mut replay, &mut replay_bus, 700);

    assert_eq!(replay_bus.take_trace(), original);
    assert!(replay.same_state(&cpu, true));
    assert_eq!(replay.total_tacts(), cpu.total_tacts());
    assert_eq!(replay.snapshot(), cpu.snapshot());
}

#[test]
fn same_state_detects_register_differences() {
    let mut a = Z80::new();
    let mut b = Z80::new();
    let mut bus_a = new_bus();
    let mut bus_b = new_bus();

    run_steps(&mut a, &mut bus_a, 3);
    run_steps(&mut b, &mut bus_b, 3);
    assert!(a.same_state(&b, true));

    run_steps(&mut b, &mut bus_b, 1);
    assert!(!a.same_state(&b, false));
}

#[test]
fn restore_keeps_halt_output() {
    let mut cpu = Z80::new();
    let mut bus = SimpleBus::new();
    bus.load(0, &[0x76]);
    cpu.step(&mut bus, Signals::NONE);

    let snapshot: CpuSnapshot = cpu.snapshot();
    assert!(snapshot.halted);
    let restored = Z80::from_snapshot(&snapshot);
    assert!(restored.is_halted());
    assert!(restored.out_signals().contains(emu_core::OutSignals::HALT));
}

#[cfg(feature = "serde")]
#[test]
fn snapshot_serialises_to_json() {
    let mut cpu = Z80::new();
    let mut bus = new_bus();
    run_steps(&mut cpu, &mut bus, 25);

    let snapshot = cpu.snapshot();
    let json = serde_json::to_string(&snapshot).expect("serialise");
    let back: CpuSnapshot = serde_json::from_str(&json).expect("deserialise");
    assert_eq!(back, snapshot);
}

fn master() -> Z80 {
    let mut cpu = Z80::new();
    cpu.set16(Reg16::AF, false, 0x1200);
    cpu.set16(Reg16::BC, false, 0x3456);
    cpu.set16(Reg16::HL, false, 0x789A);
    cpu.set16(Reg16::IX, false, 0xBCDE);
    cpu.set16(Reg16::SP, false, 0x8765);
    cpu.set16(Reg16::PC, false, 0x4321);
    cpu.set8(Reg8::A, true, 0x77);
    cpu.set8(Reg8::I, false, 0x3F);
    cpu.set_interrupt_mode(InterruptMode::Im2);
    cpu.set_iff(true, true);
    cpu
}

#[test]
fn align_copies_only_named_registers() {
    let src = master();
    let mut cpu = Z80::new();

    cpu.align_registers_with(&src, "AbXa".parse().unwrap());

    assert_eq!(cpu.a(), 0x12);
    assert_eq!(cpu.get8(Reg8::B, false), 0x00, "lowercase b is B'");
    assert_eq!(cpu.get8(Reg8::Ixh, false), 0xBC);
    assert_eq!(cpu.get8(Reg8::Ixl, false), 0x00);
    assert_eq!(cpu.get8(Reg8::A, true), 0x77);
    assert_eq!(cpu.hl(), 0x0000);
    assert_eq!(cpu.pc(), 0);
}

#[test]
fn align_always_takes_interrupt_state() {
    let src = master();
    let mut cpu = Z80::new();

    cpu.align_registers_with(&src, AlignRegisters::empty());

    assert_eq!(cpu.interrupt_mode(), InterruptMode::Im2);
    assert!(cpu.iff1() && cpu.iff2());
    assert_eq!(cpu.get8(Reg8::I, false), 0x3F);
    assert_eq!(cpu.a(), 0xFF);
}

#[test]
fn align_flags_without_carry_keeps_own_carry() {
    let mut src = Z80::new();
    src.set8(Reg8::F, false, 0xFE);
    let mut cpu = Z80::new();
    cpu.set8(Reg8::F, false, CF);

    cpu.align_registers_with(&src, AlignRegisters::F_NO_CARRY);
    assert_eq!(cpu.f(), 0xFF);

    cpu.set8(Reg8::F, false, 0);
    cpu.align_registers_with(&src, AlignRegisters::F_NO_CARRY);
    assert_eq!(cpu.f(), 0xFE);
}

#[test]
fn align_stack_pointer_by_halves() {
    let src = master();
    let mut cpu = Z80::new();
    cpu.set16(Reg16::SP, false, 0x1111);

    cpu.align_registers_with(&src, AlignRegisters::SPH);
    assert_eq!(cpu.sp(), 0x8711);

    cpu.align_registers_with(&src, "sP".parse().unwrap());
    assert_eq!(cpu.sp(), 0x8765);
    assert_eq!(cpu.pc(), 0x4321);
}

#[test]
fn aligned_cpus_run_in_step() {
    let bus = new_bus();
    let mut src = Z80::new();
    let mut src_bus = copy_memory(&bus);
    run_steps(&mut src, &mut src_bus, 9);

    let mut cpu = Z80::new();
    cpu.align_registers_with(&src, AlignRegisters::all());
    let mut cpu_bus = copy_memory(&src_bus);

    run_steps(&mut src, &mut src_bus, 20);
    run_steps(&mut cpu, &mut cpu_bus, 20);
    assert!(cpu.same_state(&src, false));
}
