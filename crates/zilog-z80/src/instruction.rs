//! Static instruction descriptor table.
//!
//! Every (prefix family, opcode) pair maps to a [`Descriptor`] giving the
//! operand layout, the encoded length and the tact cost. The executor takes
//! its timing from here, so the table is the single source of truth for how
//! long an instruction runs.

/// One of the seven opcode tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Family {
    Plain,
    Cb,
    Dd,
    Fd,
    Ed,
    DdCb,
    FdCb,
}

impl Family {
    pub const ALL: [Self; 7] = [
        Self::Plain,
        Self::Cb,
        Self::Dd,
        Self::Fd,
        Self::Ed,
        Self::DdCb,
        Self::FdCb,
    ];

    /// Prefix bytes that select this table.
    #[must_use]
    pub const fn prefix(self) -> &'static [u8] {
        match self {
            Self::Plain => &[],
            Self::Cb => &[0xCB],
            Self::Dd => &[0xDD],
            Self::Fd => &[0xFD],
            Self::Ed => &[0xED],
            Self::DdCb => &[0xDD, 0xCB],
            Self::FdCb => &[0xFD, 0xCB],
        }
    }

    /// Table selected after `byte` is fetched as a prefix while in this one.
    ///
    /// A DD/FD/ED prefix replaces any earlier DD/FD; a run of ED bytes stays
    /// in the ED table.
    #[must_use]
    pub const fn after_prefix(self, byte: u8) -> Self {
        match (self, byte) {
            (Self::Dd, 0xCB) => Self::DdCb,
            (Self::Fd, 0xCB) => Self::FdCb,
            (_, 0xCB) => Self::Cb,
            (_, 0xDD) => Self::Dd,
            (_, 0xFD) => Self::Fd,
            (_, 0xED) => Self::Ed,
            (family, _) => family,
        }
    }

    /// Tacts already spent on prefix M1 cycles when the final byte arrives.
    #[must_use]
    pub const fn prefix_tacts(self) -> u8 {
        4 * self.prefix().len() as u8
    }

    const fn index(self) -> usize {
        match self {
            Self::Plain => 0,
            Self::Cb => 1,
            Self::Dd => 2,
            Self::Fd => 3,
            Self::Ed => 4,
            Self::DdCb => 5,
            Self::FdCb => 6,
        }
    }
}

/// Bytes that follow the opcode (or, for indexed bit ops, precede it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operands {
    None,
    /// Unsigned 8-bit immediate.
    Imm8,
    /// Little-endian 16-bit immediate.
    Imm16,
    /// Signed branch offset relative to the next instruction.
    Relative,
    /// Signed index displacement.
    Displacement,
    /// Displacement followed by an 8-bit immediate (`LD (IX+d),n`).
    DisplacementImm8,
}

impl Operands {
    #[must_use]
    pub const fn len(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Imm8 | Self::Relative | Self::Displacement => 1,
            Self::Imm16 | Self::DisplacementImm8 => 2,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Whether an entry is a complete instruction or a byte that selects another table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Instruction,
    Prefix,
}

/// Static description of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub family: Family,
    pub opcode: u8,
    pub kind: Kind,
    pub operands: Operands,
    /// Encoded length in bytes, prefixes included.
    pub length: u8,
    /// Tacts when no condition extends the instruction.
    pub tacts: u8,
    /// Added when a branch is taken, DJNZ loops, or a block op repeats.
    pub extra_tacts: u8,
}

impl Descriptor {
    /// True if the cost depends on a runtime condition.
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        self.extra_tacts != 0
    }

    /// Encode the instruction with the given operand values.
    ///
    /// `displacement` fills index displacements and relative offsets;
    /// `immediate` fills 8- and 16-bit immediates.
    #[must_use]
    pub fn encode(&self, displacement: i8, immediate: u16) -> Vec<u8> {
        let mut bytes = self.family.prefix().to_vec();
        let [lo, hi] = immediate.to_le_bytes();
        let d = displacement as u8;
        if matches!(self.family, Family::DdCb | Family::FdCb) {
            bytes.extend([d, self.opcode]);
            return bytes;
        }
        bytes.push(self.opcode);
        match self.operands {
            Operands::None => {}
            Operands::Imm8 => bytes.push(lo),
            Operands::Imm16 => bytes.extend([lo, hi]),
            Operands::Relative | Operands::Displacement => bytes.push(d),
            Operands::DisplacementImm8 => bytes.extend([d, lo]),
        }
        bytes
    }
}

/// Look up the descriptor for `opcode` in `family`.
#[must_use]
pub fn descriptor(family: Family, opcode: u8) -> &'static Descriptor {
    &TABLE[family.index()][usize::from(opcode)]
}

static TABLE: [[Descriptor; 256]; 7] = build();

const fn build() -> [[Descriptor; 256]; 7] {
    let blank = Descriptor {
        family: Family::Plain,
        opcode: 0,
        kind: Kind::Instruction,
        operands: Operands::None,
        length: 1,
        tacts: 4,
        extra_tacts: 0,
    };
    let mut table = [[blank; 256]; 7];
    let mut f = 0;
    while f < Family::ALL.len() {
        let mut op = 0;
        while op < 256 {
            table[f][op] = describe(Family::ALL[f], op as u8);
            op += 1;
        }
        f += 1;
    }
    table
}

const fn describe(family: Family, opcode: u8) -> Descriptor {
    let prefix_len = family.prefix().len() as u8;
    let (kind, operands, tacts, extra_tacts) = match family {
        Family::Plain => plain(opcode),
        Family::Cb => (Kind::Instruction, Operands::None, cb(opcode), 0),
        Family::Dd | Family::Fd => indexed(opcode),
        Family::Ed => ed(opcode),
        Family::DdCb | Family::FdCb => {
            let tacts = if opcode >> 6 == 1 { 20 } else { 23 };
            (Kind::Instruction, Operands::Displacement, tacts, 0)
        }
    };
    let length = match kind {
        Kind::Prefix => 1,
        Kind::Instruction => prefix_len + 1 + operands.len(),
    };
    Descriptor { family, opcode, kind, operands, length, tacts, extra_tacts }
}

const fn instr(operands: Operands, tacts: u8, extra: u8) -> (Kind, Operands, u8, u8) {
    (Kind::Instruction, operands, tacts, extra)
}

const PREFIX: (Kind, Operands, u8, u8) = (Kind::Prefix, Operands::None, 4, 0);

const fn plain(op: u8) -> (Kind, Operands, u8, u8) {
    let y = (op >> 3) & 7;
    let z = op & 7;
    let p = y >> 1;
    let q = y & 1;
    match op >> 6 {
        0 => match z {
            0 => match y {
                0 | 1 => instr(Operands::None, 4, 0),
                2 => instr(Operands::Relative, 8, 5),
                3 => instr(Operands::Relative, 12, 0),
                _ => instr(Operands::Relative, 7, 5),
            },
            1 if q == 0 => instr(Operands::Imm16, 10, 0),
            1 => instr(Operands::None, 11, 0),
            2 => match p {
                0 | 1 => instr(Operands::None, 7, 0),
                2 => instr(Operands::Imm16, 16, 0),
                _ => instr(Operands::Imm16, 13, 0),
            },
            3 => instr(Operands::None, 6, 0),
            4 | 5 if y == 6 => instr(Operands::None, 11, 0),
            6 if y == 6 => instr(Operands::Imm8, 10, 0),
            6 => instr(Operands::Imm8, 7, 0),
            _ => instr(Operands::None, 4, 0),
        },
        1 if op == 0x76 => instr(Operands::None, 4, 0),
        1 if y == 6 || z == 6 => instr(Operands::None, 7, 0),
        1 => instr(Operands::None, 4, 0),
        2 if z == 6 => instr(Operands::None, 7, 0),
        2 => instr(Operands::None, 4, 0),
        _ => match z {
            0 => instr(Operands::None, 5, 6),
            1 if q == 0 => instr(Operands::None, 10, 0),
            1 => match p {
                0 => instr(Operands::None, 10, 0),
                3 => instr(Operands::None, 6, 0),
                _ => instr(Operands::None, 4, 0),
            },
            2 => instr(Operands::Imm16, 10, 0),
            3 => match y {
                0 => instr(Operands::Imm16, 10, 0),
                1 => PREFIX,
                2 | 3 => instr(Operands::Imm8, 11, 0),
                4 => instr(Operands::None, 19, 0),
                _ => instr(Operands::None, 4, 0),
            },
            4 => instr(Operands::Imm16, 10, 7),
            5 if q == 0 => instr(Operands::None, 11, 0),
            5 if p == 0 => instr(Operands::Imm16, 17, 0),
            5 => PREFIX,
            6 => instr(Operands::Imm8, 7, 0),
            _ => instr(Operands::None, 11, 0),
        },
    }
}

/// True for DD/FD opcodes whose `(HL)` operand becomes `(IX+d)`.
#[must_use]
pub const fn uses_indexed_memory(op: u8) -> bool {
    match op {
        0x34..=0x36 => true,
        0x76 => false,
        0x40..=0x7F => op & 7 == 6 || (op >> 3) & 7 == 6,
        0x80..=0xBF => op & 7 == 6,
        _ => false,
    }
}

const fn indexed(op: u8) -> (Kind, Operands, u8, u8) {
    if matches!(op, 0xCB | 0xDD | 0xED | 0xFD) {
        return PREFIX;
    }
    let (kind, operands, tacts, extra) = plain(op);
    if op == 0x36 {
        instr(Operands::DisplacementImm8, 19, 0)
    } else if uses_indexed_memory(op) {
        instr(Operands::Displacement, tacts + 12, 0)
    } else {
        (kind, operands, tacts + 4, extra)
    }
}

const fn cb(op: u8) -> u8 {
    match (op >> 6, op & 7) {
        (1, 6) => 12,
        (_, 6) => 15,
        _ => 8,
    }
}

const fn ed(op: u8) -> (Kind, Operands, u8, u8) {
    if op == 0xED {
        return PREFIX;
    }
    let y = (op >> 3) & 7;
    let z = op & 7;
    match op >> 6 {
        1 => match z {
            0 | 1 => instr(Operands::None, 12, 0),
            2 => instr(Operands::None, 15, 0),
            3 => instr(Operands::Imm16, 20, 0),
            4 | 6 => instr(Operands::None, 8, 0),
            5 => instr(Operands::None, 14, 0),
            _ => match y {
                0..=3 => instr(Operands::None, 9, 0),
                4 | 5 => instr(Operands::None, 18, 0),
                _ => instr(Operands::None, 8, 0),
            },
        },
        2 if z <= 3 && y >= 4 => {
            if y >= 6 {
                instr(Operands::None, 16, 5)
            } else {
                instr(Operands::None, 16, 0)
            }
        }
        _ => instr(Operands::None, 8, 0),
    }
}
