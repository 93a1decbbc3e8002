//! Memory and I/O bus interface.

/// What a memory read is for.
///
/// Boards use this to model M1 contention and refresh, and to tell opcode
/// bytes apart from the operands that follow them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryAccess {
    /// M1 opcode fetch, including every prefix byte.
    Opcode,
    /// Non-M1 read from the instruction stream: immediates, displacements,
    /// and the trailing opcode of an indexed bit instruction.
    Operand,
    /// Ordinary data read (loads, stack pops, block transfers).
    Data,
}

/// Kind of interrupt being acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptKind {
    Nmi,
    /// Maskable interrupt accepted in the given interrupt mode (0, 1 or 2).
    Maskable { mode: u8 },
}

/// Register whose value the CPU is about to put to work as an address, a
/// port or a counter. Named in the [`Bus`] substitution hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusRegister {
    A,
    B,
    I,
    Bc,
    De,
    Hl,
    Ix,
    Iy,
    Sp,
}

/// Memory and I/O bus interface.
///
/// Besides the accesses themselves, the bus may substitute the register
/// values that drive them (the `pointer`, `special_register`,
/// `special_register_pair` and `port_address` hooks). Boards that run
/// several CPUs in lockstep use this to feed every core the same
/// addresses. The defaults leave the values alone.
///
/// The CPU calls into the bus for every access, in hardware order. The
/// callbacks are infallible; a bus that panics unwinds straight through the
/// core, leaving registers as far as the instruction had progressed.
pub trait Bus {
    /// Read a byte from memory.
    fn read(&mut self, address: u16, access: MemoryAccess) -> u8;

    /// Write a byte to memory.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte from an I/O port. The full 16-bit port address is given.
    fn io_read(&mut self, port: u16) -> u8;

    /// Write a byte to an I/O port.
    fn io_write(&mut self, port: u16, value: u8);

    /// Byte placed on the data lines by the interrupting device.
    ///
    /// IM 0 executes it as an opcode; IM 2 uses it as the low byte of the
    /// vector table address. An idle bus floats high.
    fn data_lines(&mut self) -> u8 {
        0xFF
    }

    /// Called after RETI has executed.
    fn on_reti(&mut self) {}

    /// Called when the CPU starts acknowledging an interrupt.
    fn on_interrupt(&mut self, _kind: InterruptKind) {}

    /// Memory address about to be taken from `reg` (BC, DE, HL, IX, IY or
    /// SP). Instructions that step the register continue from the returned
    /// value.
    fn pointer(&mut self, _reg: BusRegister, value: u16) -> u16 {
        value
    }

    /// Value of B about to be counted down by DJNZ, or of I about to form
    /// the IM 2 vector address.
    fn special_register(&mut self, _reg: BusRegister, value: u8) -> u8 {
        value
    }

    /// Value of BC about to be counted down by a block transfer or compare.
    fn special_register_pair(&mut self, _reg: BusRegister, value: u16) -> u16 {
        value
    }

    /// Port address about to be taken from BC, or the high byte of the port
    /// taken from A by `IN A,(n)` and `OUT (n),A`.
    fn port_address(&mut self, _reg: BusRegister, value: u16) -> u16 {
        value
    }
}

/// One recorded bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Read { address: u16, value: u8, access: MemoryAccess },
    Write { address: u16, value: u8 },
    IoRead { port: u16, value: u8 },
    IoWrite { port: u16, value: u8 },
    DataLines { value: u8 },
    Reti,
    Interrupt(InterruptKind),
}

/// Flat 64 KiB RAM bus for tests and simple boards.
///
/// Port reads return the value programmed with [`SimpleBus::set_port`]
/// (0xFF otherwise). Tracing is off by default.
pub struct SimpleBus {
    memory: Box<[u8; 0x1_0000]>,
    ports: Box<[u8; 0x1_0000]>,
    data_lines: u8,
    trace: Option<Vec<BusEvent>>,
    /// Port writes in the order they happened.
    pub io_writes: Vec<(u16, u8)>,
    /// Number of RETI notifications received.
    pub reti_count: u32,
    /// Interrupt acknowledgments received.
    pub interrupts: Vec<InterruptKind>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x1_0000]),
            ports: Box::new([0xFF; 0x1_0000]),
            data_lines: 0xFF,
            trace: None,
            io_writes: Vec::new(),
            reti_count: 0,
            interrupts: Vec::new(),
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at 64K.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.memory[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read memory without recording or side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }

    /// Value returned by reads of `port`.
    pub fn set_port(&mut self, port: u16, value: u8) {
        self.ports[usize::from(port)] = value;
    }

    /// Byte supplied on the data lines during interrupt acknowledgment.
    pub fn set_data_lines(&mut self, value: u8) {
        self.data_lines = value;
    }

    /// Start recording every transaction.
    pub fn enable_trace(&mut self) {
        self.trace = Some(Vec::new());
    }

    /// Recorded transactions (empty if tracing is off).
    #[must_use]
    pub fn trace(&self) -> &[BusEvent] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Take the recorded transactions, leaving tracing enabled.
    pub fn take_trace(&mut self) -> Vec<BusEvent> {
        self.trace.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn record(&mut self, event: BusEvent) {
        if let Some(trace) = &mut self.trace {
            trace.push(event);
        }
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16, access: MemoryAccess) -> u8 {
        let value = self.memory[usize::from(address)];
        self.record(BusEvent::Read { address, value, access });
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
        self.record(BusEvent::Write { address, value });
    }

    fn io_read(&mut self, port: u16) -> u8 {
        let value = self.ports[usize::from(port)];
        self.record(BusEvent::IoRead { port, value });
        value
    }

    fn io_write(&mut self, port: u16, value: u8) {
        self.io_writes.push((port, value));
        self.record(BusEvent::IoWrite { port, value });
    }

    fn data_lines(&mut self) -> u8 {
        let value = self.data_lines;
        self.record(BusEvent::DataLines { value });
        value
    }

    fn on_reti(&mut self) {
        self.reti_count += 1;
        self.record(BusEvent::Reti);
    }

    fn on_interrupt(&mut self, kind: InterruptKind) {
        self.interrupts.push(kind);
        self.record(BusEvent::Interrupt(kind));
    }
}
