//! Integration tests using Tom Harte's `SingleStepTests` for the Z80.
//!
//! Each opcode file holds 1,000 cases giving the register and memory state
//! before and after one instruction, plus its bus cycles. The cycle count
//! must equal the tacts reported by `next_instruction`.
//!
//! Test data lives in `test-data/z80/v1/` at the workspace root.

use std::fs;
use std::panic;
use std::path::Path;

use emu_core::{SimpleBus, Signals, Tacts};
use serde::Deserialize;
use zilog_z80::{CpuSnapshot, InterruptMode, Reg16, Registers, Z80};

/// JSON test case format.
#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<serde_json::Value>,
    #[serde(default)]
    ports: Vec<(u16, u8, String)>,
}

/// JSON CPU state format.
#[derive(Deserialize)]
struct CpuState {
    pc: u16,
    sp: u16,
    a: u8,
    b: u8,
    c: u8,
    d: u8,
    e: u8,
    f: u8,
    h: u8,
    l: u8,
    i: u8,
    r: u8,
    ix: u16,
    iy: u16,
    wz: u16,
    #[serde(rename = "af_")]
    af_alt: u16,
    #[serde(rename = "bc_")]
    bc_alt: u16,
    #[serde(rename = "de_")]
    de_alt: u16,
    #[serde(rename = "hl_")]
    hl_alt: u16,
    iff1: u8,
    iff2: u8,
    im: u8,
    ei: u8,
    p: u8,
    q: u8,
    ram: Vec<(u16, u8)>,
}

fn registers(state: &CpuState) -> Registers {
    let mut regs = Registers {
        a: state.a,
        f: state.f,
        b: state.b,
        c: state.c,
        d: state.d,
        e: state.e,
        h: state.h,
        l: state.l,
        ix: state.ix,
        iy: state.iy,
        sp: state.sp,
        pc: state.pc,
        i: state.i,
        r: state.r,
        wz: state.wz,
        iff1: state.iff1 != 0,
        iff2: state.iff2 != 0,
        im: InterruptMode::try_from(state.im).unwrap_or_default(),
        ..Registers::default()
    };
    regs.set16(Reg16::AF, true, state.af_alt);
    regs.set16(Reg16::BC, true, state.bc_alt);
    regs.set16(Reg16::DE, true, state.de_alt);
    regs.set16(Reg16::HL, true, state.hl_alt);
    regs
}

/// Build the CPU and bus from the initial test state. The JSON `q` is the
/// flag latch of the instruction before the one under test.
fn setup(state: &CpuState, ports: &[(u16, u8, String)]) -> (Z80, SimpleBus) {
    let mut bus = SimpleBus::new();
    for &(addr, value) in &state.ram {
        bus.poke(addr, value);
    }
    for (port, value, dir) in ports {
        if dir == "r" {
            bus.set_port(*port, *value);
        }
    }

    let cpu = Z80::from_snapshot(&CpuSnapshot {
        registers: registers(state),
        halted: false,
        pending_prefix: None,
        int_blocked: state.ei != 0,
        ld_a_ir: state.p != 0,
        q: state.q,
        last_q: 0,
        nmi_pending: false,
        in_block_loop: false,
        block_loop_before_interrupt: false,
        last_m1_opcode: 0,
        last_opcode: 0,
        total_tacts: Tacts::ZERO,
    });
    (cpu, bus)
}

/// Compare the CPU/bus state against expected, returning a list of mismatches.
fn compare(cpu: &Z80, bus: &SimpleBus, expected: &CpuState) -> Vec<String> {
    let mut errors = Vec::new();
    let want = registers(expected);
    let got = cpu.regs();

    let pairs = [
        ("AF", Reg16::AF, false),
        ("BC", Reg16::BC, false),
        ("DE", Reg16::DE, false),
        ("HL", Reg16::HL, false),
        ("AF'", Reg16::AF, true),
        ("BC'", Reg16::BC, true),
        ("DE'", Reg16::DE, true),
        ("HL'", Reg16::HL, true),
        ("IX", Reg16::IX, false),
        ("IY", Reg16::IY, false),
        ("SP", Reg16::SP, false),
        ("PC", Reg16::PC, false),
        ("WZ", Reg16::WZ, false),
    ];
    for (name, reg, alt) in pairs {
        check_u16(&mut errors, name, got.get16(reg, alt), want.get16(reg, alt));
    }
    check_u8(&mut errors, "I", got.i, want.i);
    check_u8(&mut errors, "R", got.r, want.r);

    if (got.iff1, got.iff2) != (want.iff1, want.iff2) {
        errors.push(format!(
            "IFF: got {}/{}, want {}/{}",
            got.iff1, got.iff2, want.iff1, want.iff2
        ));
    }
    if got.im != want.im {
        errors.push(format!("IM: got {:?}, want {:?}", got.im, want.im));
    }

    let snapshot = cpu.snapshot();
    if u8::from(snapshot.int_blocked) != expected.ei {
        errors.push(format!("EI: got {}, want {}", snapshot.int_blocked, expected.ei));
    }
    if u8::from(snapshot.ld_a_ir) != expected.p {
        errors.push(format!("P: got {}, want {}", snapshot.ld_a_ir, expected.p));
    }
    check_u8(&mut errors, "Q", snapshot.q, expected.q);

    for &(addr, expected_val) in &expected.ram {
        let actual_val = bus.peek(addr);
        if actual_val != expected_val {
            errors.push(format!(
                "RAM[${addr:04X}]: got ${actual_val:02X}, want ${expected_val:02X}"
            ));
        }
    }

    errors
}

fn check_u8(errors: &mut Vec<String>, name: &str, actual: u8, expected: u8) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:02X}, want ${expected:02X}"));
    }
}

fn check_u16(errors: &mut Vec<String>, name: &str, actual: u16, expected: u16) {
    if actual != expected {
        errors.push(format!("{name}: got ${actual:04X}, want ${expected:04X}"));
    }
}

fn test_files() -> Vec<String> {
    let mut filenames = Vec::new();
    for opcode in 0..=0xFFu8 {
        if !matches!(opcode, 0xCB | 0xDD | 0xED | 0xFD) {
            filenames.push(format!("{opcode:02x}.json"));
        }
    }
    for prefix in ["cb", "dd", "ed", "fd", "dd cb __", "fd cb __"] {
        for opcode in 0..=0xFFu8 {
            filenames.push(format!("{prefix} {opcode:02x}.json"));
        }
    }
    filenames
}

/// Run all Z80 SingleStepTests.
#[test]
#[ignore = "requires test-data/z80; run with --ignored"]
fn run_all() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-data/z80/v1");
    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests.");
        return;
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;
    let mut total_files = 0u32;

    for filename in &test_files() {
        let path = test_dir.join(filename);
        if !path.exists() {
            continue;
        }

        let data = fs::read_to_string(&path).unwrap_or_else(|e| {
            panic!("Failed to read {}: {e}", path.display());
        });
        let tests: Vec<TestCase> = serde_json::from_str(&data).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {e}", path.display());
        });

        let mut file_pass = 0u32;
        let mut file_fail = 0u32;
        let mut first_failures: Vec<String> = Vec::new();

        for test in &tests {
            let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                let (mut cpu, mut bus) = setup(&test.initial, &test.ports);
                let tacts = cpu.next_instruction(&mut bus, Signals::NONE);

                let mut errors = compare(&cpu, &bus, &test.final_state);
                if tacts as usize != test.cycles.len() {
                    errors.push(format!("tacts: got {tacts}, want {}", test.cycles.len()));
                }
                errors
            }));

            match result {
                Ok(errors) if errors.is_empty() => file_pass += 1,
                Ok(errors) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!("  FAIL [{}]: {}", test.name, errors.join(", ")));
                    }
                }
                Err(_) => {
                    file_fail += 1;
                    if first_failures.len() < 5 {
                        first_failures.push(format!("  PANIC [{}]", test.name));
                    }
                }
            }
        }

        let status = if file_fail == 0 { "PASS" } else { "FAIL" };
        println!("{filename}: {status}: {file_pass}/{} passed", file_pass + file_fail);
        for msg in &first_failures {
            println!("{msg}");
        }

        total_pass += u64::from(file_pass);
        total_fail += u64::from(file_fail);
        total_files += 1;
    }

    println!();
    println!("=== Z80 SingleStepTests Summary ===");
    println!(
        "Files: {total_files}, Total: {}, Pass: {total_pass}, Fail: {total_fail}",
        total_pass + total_fail
    );

    assert_eq!(total_fail, 0, "{total_fail} tests failed");
}
