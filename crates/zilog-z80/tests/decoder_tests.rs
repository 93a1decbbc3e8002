//! Every opcode in every family against its descriptor: bytes consumed from
//! the instruction stream, PC advance and tact cost.

use emu_core::{BusEvent, MemoryAccess, SimpleBus, Signals};
use zilog_z80::{Descriptor, Family, Kind, Reg16, Z80, descriptor};

const ORIGIN: u16 = 0x4000;

/// Opcodes that may legitimately leave PC somewhere other than the next
/// instruction.
fn changes_flow(desc: &Descriptor) -> bool {
    let op = desc.opcode;
    match desc.family {
        Family::Plain | Family::Dd | Family::Fd => {
            matches!(op, 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 | 0xC3 | 0xC9 | 0xCD | 0xE9)
                || (op >= 0xC0 && matches!(op & 7, 0 | 2 | 4 | 7))
        }
        // RETN/RETI and the repeating block ops.
        Family::Ed => op & 0xC7 == 0x45 || ((0xB0..=0xBB).contains(&op) && op & 7 <= 3),
        _ => false,
    }
}

fn run_one(desc: &Descriptor) -> (Z80, Vec<BusEvent>, u32) {
    let mut bus = SimpleBus::new();
    bus.load(ORIGIN, &desc.encode(4, 0x6000));

    let mut cpu = Z80::new();
    cpu.set16(Reg16::PC, false, ORIGIN);
    cpu.set16(Reg16::SP, false, 0x8000);
    cpu.set16(Reg16::HL, false, 0x6000);
    cpu.set16(Reg16::IX, false, 0x6100);
    cpu.set16(Reg16::IY, false, 0x6200);
    cpu.set16(Reg16::BC, false, 0x0101);

    bus.enable_trace();
    let tacts = cpu.next_instruction(&mut bus, Signals::NONE);
    (cpu, bus.take_trace(), tacts)
}

fn all_instructions() -> impl Iterator<Item = &'static Descriptor> {
    Family::ALL
        .into_iter()
        .flat_map(|family| (0..=0xFF).map(move |op| descriptor(family, op)))
        .filter(|desc| desc.kind == Kind::Instruction)
}

#[test]
fn stream_bytes_match_descriptor_length() {
    for desc in all_instructions() {
        let (_, trace, _) = run_one(desc);
        let fetched = trace
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    BusEvent::Read { access: MemoryAccess::Opcode | MemoryAccess::Operand, .. }
                )
            })
            .count();
        assert_eq!(
            fetched,
            usize::from(desc.length),
            "{:?} {:02X}: {trace:?}",
            desc.family,
            desc.opcode
        );
    }
}

#[test]
fn pc_advances_by_length() {
    for desc in all_instructions() {
        let (cpu, _, _) = run_one(desc);
        let next = ORIGIN.wrapping_add(u16::from(desc.length));
        if cpu.pc() != next {
            assert!(
                changes_flow(desc),
                "{:?} {:02X}: PC={:04X}, expected {next:04X}",
                desc.family,
                desc.opcode,
                cpu.pc()
            );
        }
    }
}

#[test]
fn executed_tacts_match_descriptor() {
    for desc in all_instructions() {
        let (_, _, tacts) = run_one(desc);
        let base = u32::from(desc.tacts);
        let extended = base + u32::from(desc.extra_tacts);
        assert!(
            tacts == base || (desc.is_conditional() && tacts == extended),
            "{:?} {:02X}: {tacts} tacts, descriptor says {base}/{extended}",
            desc.family,
            desc.opcode
        );
    }
}

#[test]
fn prefix_bytes_are_m1_fetches() {
    for desc in all_instructions() {
        let (_, trace, _) = run_one(desc);
        let m1 = trace
            .iter()
            .filter(|e| matches!(e, BusEvent::Read { access: MemoryAccess::Opcode, .. }))
            .count();
        let expected = match desc.family {
            Family::Plain => 1,
            Family::Cb | Family::Dd | Family::Fd | Family::Ed => 2,
            Family::DdCb | Family::FdCb => 2,
        };
        assert_eq!(m1, expected, "{:?} {:02X}", desc.family, desc.opcode);
    }
}
