//! Minimal CP/M harness for ZEXDOC/ZEXALL.
//!
//! CP/M memory layout:
//! - 0x0000: Warm boot (we use HALT)
//! - 0x0005: BDOS entry (we intercept CALL 5)
//! - 0x0006-0x0007: Top of TPA (programs read this for stack init)
//! - 0x0100: Program load address (TPA start)

use std::io::Write;
use std::path::Path;

use emu_core::{SimpleBus, Signals};
use zilog_z80::{Reg8, Z80};

fn run_zex(binary: &[u8]) -> bool {
    let mut bus = SimpleBus::new();
    bus.load(0x0100, binary);
    bus.load(0x0000, &[0x76]); // HALT
    bus.load(0x0005, &[0xC9]); // RET
    bus.load(0x0006, &[0x00, 0xFE]); // TPA top = 0xFE00

    let mut cpu = Z80::new();
    cpu.set_pc(0x0100);
    cpu.set_sp(0xFE00);

    let mut output = String::new();
    let mut instructions: u64 = 0;
    let mut stderr = std::io::stderr();

    loop {
        match cpu.pc() {
            0x0000 => {
                eprintln!("\nWarm boot after {instructions} instructions");
                break;
            }
            0x0005 => {
                match cpu.get8(Reg8::C, false) {
                    2 => output.push(char::from(cpu.get8(Reg8::E, false))),
                    9 => {
                        let mut addr = cpu.de();
                        while bus.peek(addr) != b'$' {
                            output.push(char::from(bus.peek(addr)));
                            addr = addr.wrapping_add(1);
                        }
                    }
                    func => eprintln!("\nUnknown BDOS function: {func}"),
                }
                let _ = write!(stderr, "{output}");
                output.clear();
                cpu.force_ret(&mut bus);
                continue;
            }
            _ => {}
        }

        cpu.next_instruction(&mut bus, Signals::NONE);
        instructions += 1;
        if instructions.is_multiple_of(100_000_000) {
            eprintln!("[{instructions} instructions]");
        }
        if cpu.is_halted() {
            eprintln!("\nHALT after {instructions} instructions");
            break;
        }
    }

    output.is_empty() || !output.contains("ERROR")
}

fn run_binary(name: &str) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name);
    let Ok(binary) = std::fs::read(&path) else {
        eprintln!("{} not found; skipping", path.display());
        return;
    };
    assert!(run_zex(&binary), "{name} reported errors");
}

#[test]
#[ignore]
fn zexdoc() {
    run_binary("zexdoc.com");
}

#[test]
#[ignore]
fn zexall() {
    run_binary("zexall.com");
}
