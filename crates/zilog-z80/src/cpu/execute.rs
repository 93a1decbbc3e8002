//! Instruction semantics for the Z80.
//!
//! Each routine runs one complete instruction against the bus, with every
//! access in hardware order. Timing is not computed here: the driver takes
//! it from the descriptor table. Routines that can take a longer path
//! (taken branch, continuing DJNZ, repeating block op) return `true` when
//! they did.

use emu_core::{Bus, BusRegister};

use crate::alu;
use crate::flags::{CF, PF, SF, ZF, flag_if, sz53, sz53p};
use crate::registers::InterruptMode;

use super::Z80;

/// Register that stands in for HL under the current prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Index {
    Hl,
    Ix,
    Iy,
}

impl Index {
    const fn register(self) -> BusRegister {
        match self {
            Self::Hl => BusRegister::Hl,
            Self::Ix => BusRegister::Ix,
            Self::Iy => BusRegister::Iy,
        }
    }
}

impl Z80 {
    // =========================================================================
    // Operand helpers
    // =========================================================================

    /// 8-bit register by its 3-bit opcode field. Field 6, the memory
    /// operand, never reaches here. H and L become the index halves under
    /// DD/FD.
    fn reg8(&self, r: u8, idx: Index) -> u8 {
        let regs = &self.regs;
        match (r, idx) {
            (0, _) => regs.b,
            (1, _) => regs.c,
            (2, _) => regs.d,
            (3, _) => regs.e,
            (4, Index::Hl) => regs.h,
            (5, Index::Hl) => regs.l,
            (4, Index::Ix) => (regs.ix >> 8) as u8,
            (5, Index::Ix) => regs.ix as u8,
            (4, Index::Iy) => (regs.iy >> 8) as u8,
            (5, Index::Iy) => regs.iy as u8,
            _ => regs.a,
        }
    }

    fn set_reg8(&mut self, r: u8, idx: Index, value: u8) {
        let regs = &mut self.regs;
        match (r, idx) {
            (0, _) => regs.b = value,
            (1, _) => regs.c = value,
            (2, _) => regs.d = value,
            (3, _) => regs.e = value,
            (4, Index::Hl) => regs.h = value,
            (5, Index::Hl) => regs.l = value,
            (4, Index::Ix) => regs.ix = (regs.ix & 0x00FF) | (value as u16) << 8,
            (5, Index::Ix) => regs.ix = (regs.ix & 0xFF00) | value as u16,
            (4, Index::Iy) => regs.iy = (regs.iy & 0x00FF) | (value as u16) << 8,
            (5, Index::Iy) => regs.iy = (regs.iy & 0xFF00) | value as u16,
            _ => regs.a = value,
        }
    }

    fn index_reg(&self, idx: Index) -> u16 {
        match idx {
            Index::Hl => self.regs.hl(),
            Index::Ix => self.regs.ix,
            Index::Iy => self.regs.iy,
        }
    }

    fn set_index_reg(&mut self, idx: Index, value: u16) {
        match idx {
            Index::Hl => self.regs.set_hl(value),
            Index::Ix => self.regs.ix = value,
            Index::Iy => self.regs.iy = value,
        }
    }

    /// Register pair by its 2-bit field: BC, DE, HL/IX/IY, SP.
    fn rp(&self, p: u8, idx: Index) -> u16 {
        match p {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.index_reg(idx),
            _ => self.regs.sp,
        }
    }

    fn set_rp(&mut self, p: u8, idx: Index, value: u16) {
        match p {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.set_index_reg(idx, value),
            _ => self.regs.sp = value,
        }
    }

    /// PUSH/POP pairs: AF replaces SP.
    fn rp2(&self, p: u8, idx: Index) -> u16 {
        if p == 3 { self.regs.af() } else { self.rp(p, idx) }
    }

    fn set_rp2(&mut self, p: u8, idx: Index, value: u16) {
        if p == 3 {
            self.regs.set_af(value);
        } else {
            self.set_rp(p, idx, value);
        }
    }

    /// Address of the `(HL)` operand, or `(IX+d)`/`(IY+d)` after reading the
    /// displacement. The indexed forms latch the address into WZ.
    fn memory_operand<B: Bus>(&mut self, bus: &mut B, idx: Index) -> u16 {
        if idx == Index::Hl {
            return self.pointer(bus, BusRegister::Hl);
        }
        let d = self.fetch_displacement(bus);
        let addr = self.pointer(bus, idx.register()).wrapping_add(d as u16);
        self.regs.wz = addr;
        addr
    }

    /// NZ Z NC C PO PE P M
    fn condition(&self, cc: u8) -> bool {
        let f = self.regs.f;
        match cc & 7 {
            0 => f & ZF == 0,
            1 => f & ZF != 0,
            2 => f & CF == 0,
            3 => f & CF != 0,
            4 => f & PF == 0,
            5 => f & PF != 0,
            6 => f & SF == 0,
            _ => f & SF != 0,
        }
    }

    fn jump_relative(&mut self, d: i8) {
        self.regs.pc = self.regs.pc.wrapping_add(d as u16);
        self.regs.wz = self.regs.pc;
    }

    fn ret<B: Bus>(&mut self, bus: &mut B) {
        self.regs.pc = self.pop(bus);
        self.regs.wz = self.regs.pc;
    }

    fn call<B: Bus>(&mut self, bus: &mut B, target: u16) {
        self.push(bus, self.regs.pc);
        self.regs.pc = target;
    }

    // =========================================================================
    // Unprefixed and DD/FD instructions
    // =========================================================================

    /// Execute an unprefixed opcode, or a DD/FD one with `idx` naming the
    /// index register. Returns true if a conditional path was taken.
    pub(super) fn execute_main<B: Bus>(&mut self, bus: &mut B, op: u8, idx: Index) -> bool {
        let y = (op >> 3) & 7;
        let z = op & 7;
        let p = y >> 1;
        let q = y & 1;

        match op >> 6 {
            0 => match z {
                0 => match y {
                    // NOP
                    0 => {}
                    // EX AF,AF'
                    1 => self.regs.swap_af(),
                    // DJNZ d
                    2 => {
                        let d = self.fetch_displacement(bus);
                        let b = bus.special_register(BusRegister::B, self.regs.b);
                        let b = b.wrapping_sub(1);
                        self.regs.b = b;
                        if b != 0 {
                            self.jump_relative(d);
                            return true;
                        }
                    }
                    // JR d
                    3 => {
                        let d = self.fetch_displacement(bus);
                        self.jump_relative(d);
                    }
                    // JR cc,d
                    _ => {
                        let d = self.fetch_displacement(bus);
                        if self.condition(y - 4) {
                            self.jump_relative(d);
                            return true;
                        }
                    }
                },

                // LD rr,nn
                1 if q == 0 => {
                    let nn = self.fetch_word(bus);
                    self.set_rp(p, idx, nn);
                }
                // ADD HL,rr
                1 => {
                    let hl = self.index_reg(idx);
                    let r = alu::add16(hl, self.rp(p, idx), self.regs.f);
                    self.regs.wz = hl.wrapping_add(1);
                    self.set_index_reg(idx, r.value);
                    self.set_f(r.flags);
                }

                2 => match (p, q) {
                    // LD (BC),A / LD (DE),A
                    (0 | 1, 0) => {
                        let reg = if p == 0 { BusRegister::Bc } else { BusRegister::De };
                        let addr = self.pointer(bus, reg);
                        self.write(bus, addr, self.regs.a);
                        self.regs.wz = (self.regs.a as u16) << 8 | (addr.wrapping_add(1) & 0xFF);
                    }
                    // LD A,(BC) / LD A,(DE)
                    (0 | 1, _) => {
                        let reg = if p == 0 { BusRegister::Bc } else { BusRegister::De };
                        let addr = self.pointer(bus, reg);
                        self.regs.a = self.read(bus, addr);
                        self.regs.wz = addr.wrapping_add(1);
                    }
                    // LD (nn),HL
                    (2, 0) => {
                        let nn = self.fetch_word(bus);
                        self.write_word(bus, nn, self.index_reg(idx));
                        self.regs.wz = nn.wrapping_add(1);
                    }
                    // LD HL,(nn)
                    (2, _) => {
                        let nn = self.fetch_word(bus);
                        let value = self.read_word(bus, nn);
                        self.set_index_reg(idx, value);
                        self.regs.wz = nn.wrapping_add(1);
                    }
                    // LD (nn),A
                    (_, 0) => {
                        let nn = self.fetch_word(bus);
                        self.write(bus, nn, self.regs.a);
                        self.regs.wz = (self.regs.a as u16) << 8 | (nn.wrapping_add(1) & 0xFF);
                    }
                    // LD A,(nn)
                    _ => {
                        let nn = self.fetch_word(bus);
                        self.regs.a = self.read(bus, nn);
                        self.regs.wz = nn.wrapping_add(1);
                    }
                },

                // INC rr / DEC rr
                3 => {
                    let value = self.rp(p, idx);
                    let value = if q == 0 { value.wrapping_add(1) } else { value.wrapping_sub(1) };
                    self.set_rp(p, idx, value);
                }

                // INC r / DEC r
                4 | 5 => {
                    let step = if z == 4 { alu::inc8 } else { alu::dec8 };
                    if y == 6 {
                        let addr = self.memory_operand(bus, idx);
                        let value = self.read(bus, addr);
                        let r = step(value, self.regs.f);
                        self.write(bus, addr, r.value);
                        self.set_f(r.flags);
                    } else {
                        let r = step(self.reg8(y, idx), self.regs.f);
                        self.set_reg8(y, idx, r.value);
                        self.set_f(r.flags);
                    }
                }

                // LD r,n
                6 => {
                    if y == 6 {
                        let addr = self.memory_operand(bus, idx);
                        let n = self.fetch_operand(bus);
                        self.write(bus, addr, n);
                    } else {
                        let n = self.fetch_operand(bus);
                        self.set_reg8(y, idx, n);
                    }
                }

                _ => match y {
                    // RLCA RRCA RLA RRA
                    0..=3 => {
                        let r = alu::rotate_a(y, self.regs.a, self.regs.f);
                        self.regs.a = r.value;
                        self.set_f(r.flags);
                    }
                    4 => {
                        let r = alu::daa(self.regs.a, self.regs.f);
                        self.regs.a = r.value;
                        self.set_f(r.flags);
                    }
                    5 => {
                        let r = alu::cpl(self.regs.a, self.regs.f);
                        self.regs.a = r.value;
                        self.set_f(r.flags);
                    }
                    6 => self.set_f(alu::scf(self.regs.a, self.regs.f, self.last_q)),
                    _ => self.set_f(alu::ccf(self.regs.a, self.regs.f, self.last_q)),
                },
            },

            // HALT
            1 if op == 0x76 => {
                self.halted = true;
            }

            // LD r,(HL) / LD r,(IX+d): the destination is never an index half.
            1 if z == 6 => {
                let addr = self.memory_operand(bus, idx);
                let value = self.read(bus, addr);
                self.set_reg8(y, Index::Hl, value);
            }
            // LD (HL),r / LD (IX+d),r
            1 if y == 6 => {
                let addr = self.memory_operand(bus, idx);
                let value = self.reg8(z, Index::Hl);
                self.write(bus, addr, value);
            }
            // LD r,r'
            1 => {
                let value = self.reg8(z, idx);
                self.set_reg8(y, idx, value);
            }

            // ALU A,r
            2 => {
                let operand = if z == 6 {
                    let addr = self.memory_operand(bus, idx);
                    self.read(bus, addr)
                } else {
                    self.reg8(z, idx)
                };
                self.accumulate(y, operand);
            }

            _ => match z {
                // RET cc
                0 => {
                    if self.condition(y) {
                        self.ret(bus);
                        return true;
                    }
                }

                // POP rr
                1 if q == 0 => {
                    let value = self.pop(bus);
                    self.set_rp2(p, idx, value);
                }
                1 => match p {
                    // RET
                    0 => self.ret(bus),
                    // EXX
                    1 => self.regs.swap_general(),
                    // JP (HL)
                    2 => self.regs.pc = self.index_reg(idx),
                    // LD SP,HL
                    _ => self.regs.sp = self.index_reg(idx),
                },

                // JP cc,nn
                2 => {
                    let nn = self.fetch_word(bus);
                    self.regs.wz = nn;
                    if self.condition(y) {
                        self.regs.pc = nn;
                    }
                }

                3 => match y {
                    // JP nn
                    0 => {
                        let nn = self.fetch_word(bus);
                        self.regs.wz = nn;
                        self.regs.pc = nn;
                    }
                    // OUT (n),A
                    2 => {
                        let n = self.fetch_operand(bus);
                        let a = self.regs.a;
                        let hi = self.port_address(bus, BusRegister::A) & 0xFF;
                        bus.io_write(hi << 8 | n as u16, a);
                        self.regs.wz = (a as u16) << 8 | (n.wrapping_add(1) as u16);
                    }
                    // IN A,(n)
                    3 => {
                        let n = self.fetch_operand(bus);
                        let hi = self.port_address(bus, BusRegister::A) & 0xFF;
                        let port = hi << 8 | n as u16;
                        self.regs.a = bus.io_read(port);
                        self.regs.wz = port.wrapping_add(1);
                    }
                    // EX (SP),HL
                    4 => {
                        let sp = self.pointer(bus, BusRegister::Sp);
                        let lo = self.read(bus, sp);
                        let hi = self.read(bus, sp.wrapping_add(1));
                        let [old_lo, old_hi] = self.index_reg(idx).to_le_bytes();
                        self.write(bus, sp.wrapping_add(1), old_hi);
                        self.write(bus, sp, old_lo);
                        let value = u16::from_le_bytes([lo, hi]);
                        self.set_index_reg(idx, value);
                        self.regs.wz = value;
                    }
                    // EX DE,HL (never IX/IY)
                    5 => {
                        let de = self.regs.de();
                        self.regs.set_de(self.regs.hl());
                        self.regs.set_hl(de);
                    }
                    // DI
                    6 => {
                        self.regs.iff1 = false;
                        self.regs.iff2 = false;
                    }
                    // EI
                    7 => {
                        self.regs.iff1 = true;
                        self.regs.iff2 = true;
                        self.int_blocked = true;
                    }
                    // CB is a prefix; the driver never gets here with it.
                    _ => {}
                },

                // CALL cc,nn
                4 => {
                    let nn = self.fetch_word(bus);
                    self.regs.wz = nn;
                    if self.condition(y) {
                        self.call(bus, nn);
                        return true;
                    }
                }

                // PUSH rr
                5 if q == 0 => {
                    let value = self.rp2(p, idx);
                    self.push(bus, value);
                }
                // CALL nn
                5 if p == 0 => {
                    let nn = self.fetch_word(bus);
                    self.regs.wz = nn;
                    self.call(bus, nn);
                }
                // DD, ED and FD are prefixes.
                5 => {}

                // ALU A,n
                6 => {
                    let n = self.fetch_operand(bus);
                    self.accumulate(y, n);
                }

                // RST p
                _ => {
                    let target = (y as u16) * 8;
                    self.call(bus, target);
                    self.regs.wz = target;
                }
            },
        }
        false
    }

    fn accumulate(&mut self, op: u8, operand: u8) {
        let r = alu::accumulate(op, self.regs.a, operand, self.regs.f);
        self.regs.a = r.value;
        self.set_f(r.flags);
    }

    // =========================================================================
    // CB prefix
    // =========================================================================

    pub(super) fn execute_cb<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let y = (op >> 3) & 7;
        let z = op & 7;
        let addr = if z == 6 { self.pointer(bus, BusRegister::Hl) } else { self.regs.hl() };
        let value = if z == 6 { self.read(bus, addr) } else { self.reg8(z, Index::Hl) };

        let result = match op >> 6 {
            0 => {
                let r = alu::shift(y, value, self.regs.f & CF != 0);
                self.set_f(r.flags);
                r.value
            }
            1 => {
                let xy_source = if z == 6 { (self.regs.wz >> 8) as u8 } else { value };
                self.set_f(alu::bit(y, value, xy_source, self.regs.f));
                return;
            }
            2 => alu::res_bit(y, value),
            _ => alu::set_bit(y, value),
        };

        if z == 6 {
            self.write(bus, addr, result);
        } else {
            self.set_reg8(z, Index::Hl, result);
        }
    }

    // =========================================================================
    // DDCB / FDCB
    // =========================================================================

    /// Indexed bit operation on `(IX+d)`. Forms with a register field other
    /// than 6 also copy the result into that register.
    pub(super) fn execute_indexed_cb<B: Bus>(&mut self, bus: &mut B, idx: Index, d: i8, op: u8) {
        let y = (op >> 3) & 7;
        let z = op & 7;
        let addr = self.pointer(bus, idx.register()).wrapping_add(d as u16);
        self.regs.wz = addr;
        let value = self.read(bus, addr);

        let result = match op >> 6 {
            0 => {
                let r = alu::shift(y, value, self.regs.f & CF != 0);
                self.set_f(r.flags);
                r.value
            }
            1 => {
                self.set_f(alu::bit(y, value, (addr >> 8) as u8, self.regs.f));
                return;
            }
            2 => alu::res_bit(y, value),
            _ => alu::set_bit(y, value),
        };

        self.write(bus, addr, result);
        if z != 6 {
            self.set_reg8(z, Index::Hl, result);
        }
    }

    // =========================================================================
    // ED prefix
    // =========================================================================

    /// Returns true if a block instruction repeated.
    pub(super) fn execute_ed<B: Bus>(&mut self, bus: &mut B, op: u8) -> bool {
        let y = (op >> 3) & 7;
        let z = op & 7;
        let p = y >> 1;
        let q = y & 1;

        match op >> 6 {
            1 => match z {
                // IN r,(C); ED 70 only sets flags.
                0 => {
                    let bc = self.port_address(bus, BusRegister::Bc);
                    let value = bus.io_read(bc);
                    self.regs.wz = bc.wrapping_add(1);
                    self.set_f((self.regs.f & CF) | sz53p(value));
                    if y != 6 {
                        self.set_reg8(y, Index::Hl, value);
                    }
                }
                // OUT (C),r; ED 71 outputs 0.
                1 => {
                    let bc = self.port_address(bus, BusRegister::Bc);
                    let value = if y == 6 { 0 } else { self.reg8(y, Index::Hl) };
                    bus.io_write(bc, value);
                    self.regs.wz = bc.wrapping_add(1);
                }
                // SBC HL,rr / ADC HL,rr
                2 => {
                    let hl = self.regs.hl();
                    let operand = self.rp(p, Index::Hl);
                    let carry = self.regs.f & CF != 0;
                    let r = if q == 0 {
                        alu::sbc16(hl, operand, carry)
                    } else {
                        alu::adc16(hl, operand, carry)
                    };
                    self.regs.wz = hl.wrapping_add(1);
                    self.regs.set_hl(r.value);
                    self.set_f(r.flags);
                }
                // LD (nn),rr / LD rr,(nn)
                3 => {
                    let nn = self.fetch_word(bus);
                    if q == 0 {
                        self.write_word(bus, nn, self.rp(p, Index::Hl));
                    } else {
                        let value = self.read_word(bus, nn);
                        self.set_rp(p, Index::Hl, value);
                    }
                    self.regs.wz = nn.wrapping_add(1);
                }
                // NEG
                4 => {
                    let r = alu::neg(self.regs.a);
                    self.regs.a = r.value;
                    self.set_f(r.flags);
                }
                // RETN / RETI
                5 => {
                    self.ret(bus);
                    self.regs.iff1 = self.regs.iff2;
                    self.in_block_loop = self.block_loop_before_interrupt;
                    if y == 1 {
                        bus.on_reti();
                    }
                }
                // IM 0/1/2, including the duplicate encodings.
                6 => {
                    self.regs.im = match y & 3 {
                        0 | 1 => InterruptMode::Im0,
                        2 => InterruptMode::Im1,
                        _ => InterruptMode::Im2,
                    };
                }
                _ => match y {
                    // LD I,A
                    0 => self.regs.i = self.regs.a,
                    // LD R,A
                    1 => self.regs.r = self.regs.a,
                    // LD A,I / LD A,R
                    2 | 3 => {
                        let value = if y == 2 { self.regs.i } else { self.regs.r };
                        self.regs.a = value;
                        self.set_f(
                            (self.regs.f & CF) | sz53(value) | flag_if(self.regs.iff2, PF),
                        );
                        self.ld_a_ir = true;
                    }
                    // RRD
                    4 => {
                        let hl = self.pointer(bus, BusRegister::Hl);
                        let value = self.read(bus, hl);
                        let a = self.regs.a;
                        self.write(bus, hl, (a << 4) | (value >> 4));
                        self.regs.a = (a & 0xF0) | (value & 0x0F);
                        self.regs.wz = hl.wrapping_add(1);
                        self.set_f((self.regs.f & CF) | sz53p(self.regs.a));
                    }
                    // RLD
                    5 => {
                        let hl = self.pointer(bus, BusRegister::Hl);
                        let value = self.read(bus, hl);
                        let a = self.regs.a;
                        self.write(bus, hl, (value << 4) | (a & 0x0F));
                        self.regs.a = (a & 0xF0) | (value >> 4);
                        self.regs.wz = hl.wrapping_add(1);
                        self.set_f((self.regs.f & CF) | sz53p(self.regs.a));
                    }
                    // ED 77 / ED 7F
                    _ => {}
                },
            },

            2 if z <= 3 && y >= 4 => return self.execute_block(bus, y, z),

            // NONI: an 8-tact NOP that also holds off interrupts for a boundary.
            _ => self.int_blocked = true,
        }
        false
    }

    /// LDI/CPI/INI/OUTI family. `y` selects direction (even = increment)
    /// and repetition (6, 7); `z` selects the operation.
    fn execute_block<B: Bus>(&mut self, bus: &mut B, y: u8, z: u8) -> bool {
        let increment = y & 1 == 0;
        let repeat = y >= 6;
        let step = |value: u16| {
            if increment { value.wrapping_add(1) } else { value.wrapping_sub(1) }
        };

        let hl = self.pointer(bus, BusRegister::Hl);
        let repeating = match z {
            // LDI LDD LDIR LDDR
            0 => {
                let value = self.read(bus, hl);
                let de = self.pointer(bus, BusRegister::De);
                self.write(bus, de, value);
                self.regs.set_hl(step(hl));
                self.regs.set_de(step(de));
                let bc = self.block_counter(bus);

                let repeating = repeat && bc != 0;
                let pch = self.rewind_block(repeating);
                self.set_f(alu::block_transfer(self.regs.f, self.regs.a, value, bc, pch));
                repeating
            }
            // CPI CPD CPIR CPDR
            1 => {
                let value = self.read(bus, hl);
                self.regs.set_hl(step(hl));
                let bc = self.block_counter(bus);
                self.regs.wz = step(self.regs.wz);

                let repeating = repeat && bc != 0 && self.regs.a != value;
                let pch = self.rewind_block(repeating);
                self.set_f(alu::block_compare(self.regs.f, self.regs.a, value, bc, pch));
                repeating
            }
            // INI IND INIR INDR
            2 => {
                let bc = self.port_address(bus, BusRegister::Bc);
                let value = bus.io_read(bc);
                self.regs.wz = step(bc);
                let b = self.regs.b.wrapping_sub(1);
                self.regs.b = b;
                self.write(bus, hl, value);
                self.regs.set_hl(step(hl));

                let c = if increment {
                    self.regs.c.wrapping_add(1)
                } else {
                    self.regs.c.wrapping_sub(1)
                };
                let k = value as u16 + c as u16;
                let repeating = repeat && b != 0;
                let pch = self.rewind_block(repeating);
                self.set_f(alu::block_io(value, b, k, pch));
                repeating
            }
            // OUTI OUTD OTIR OTDR
            _ => {
                let value = self.read(bus, hl);
                let b = self.regs.b.wrapping_sub(1);
                self.regs.b = b;
                let bc = self.port_address(bus, BusRegister::Bc);
                bus.io_write(bc, value);
                self.regs.wz = step(bc);
                self.regs.set_hl(step(hl));

                let k = value as u16 + self.regs.l as u16;
                let repeating = repeat && b != 0;
                let pch = self.rewind_block(repeating);
                self.set_f(alu::block_io(value, b, k, pch));
                repeating
            }
        };

        self.in_block_loop = repeating;
        repeating
    }

    /// Count BC down for LDI/CPI and friends, starting from the value the
    /// bus substitutes.
    fn block_counter<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let bc = bus.special_register_pair(BusRegister::Bc, self.regs.bc()).wrapping_sub(1);
        self.regs.set_bc(bc);
        bc
    }

    /// Point PC back at the ED prefix of a repeating block instruction.
    /// Returns the high byte of the rewound PC, which supplies X/Y.
    fn rewind_block(&mut self, repeating: bool) -> Option<u8> {
        if !repeating {
            return None;
        }
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.wz = self.regs.pc.wrapping_add(1);
        Some((self.regs.pc >> 8) as u8)
    }
}
