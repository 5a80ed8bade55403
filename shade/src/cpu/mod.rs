use std::num::Wrapping;

use serde::Deserialize;
use serde::Serialize;

use crate::mem::MemoryLike;
use crate::Error;


/// The register file of the CPU. All eight bit registers wrap modulo 256 and the sixteen bit
/// registers wrap modulo 65536, which is enforced by storing them as `Wrapping` values.
///
/// The F register is not stored as a byte. It is modeled as the four flag bits it holds (see
/// [`Flags`]) and is only converted into a byte when read as part of the AF pair.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
#[display(
    "CPU {{ A=0x{:0>2X} F={} B=0x{:0>2X} C=0x{:0>2X} D=0x{:0>2X} E=0x{:0>2X} H=0x{:0>2X} L=0x{:0>2X} SP=0x{:0>4X} PC=0x{:0>4X} IME={} State={} }}",
    a,
    f,
    b,
    c,
    d,
    e,
    h,
    l,
    sp,
    pc,
    ime,
    state
)]
pub struct Cpu {
    pub a: Wrapping<u8>,
    pub f: Flags,
    pub b: Wrapping<u8>,
    pub c: Wrapping<u8>,
    pub d: Wrapping<u8>,
    pub e: Wrapping<u8>,
    pub h: Wrapping<u8>,
    pub l: Wrapping<u8>,
    /// The SP register
    pub sp: Wrapping<u16>,
    /// The PC register
    pub pc: Wrapping<u16>,
    /// The interrupt master enable flag.
    pub ime: bool,
    /// EI does not take effect until the instruction after it completes. This holds that pending
    /// enable.
    pub to_set_ime: bool,
    /// Once the CPU has halted (or stopped), this is set. The CPU can continue to be stepped, but
    /// the PC is not moved until some external component wakes it.
    pub state: CpuState,
}

#[derive(
    Debug, Default, Hash, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
pub enum CpuState {
    #[default]
    Running,
    Halted,
    Stopped,
}

/// The eight bit registers, addressable by name.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
pub enum HalfRegister {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
}

/// The sixteen bit register pairs, plus the stack pointer.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize,
)]
pub enum WideReg {
    AF,
    BC,
    DE,
    HL,
    SP,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum RegisterFlags {
    Z,
    N,
    H,
    C,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, derive_more::Display, Serialize, Deserialize,
)]
#[display(
    "Flags(Z={} N={} H={} C={})",
    *z as u8,
    *n as u8,
    *h as u8,
    *c as u8
)]
pub struct Flags {
    /// The zero flag
    pub z: bool,
    /// The substraction flag
    pub n: bool,
    /// The half-carry flag
    pub h: bool,
    /// The full carry flag
    pub c: bool,
}

impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            z: check_bit_const::<7>(value),
            n: check_bit_const::<6>(value),
            h: check_bit_const::<5>(value),
            c: check_bit_const::<4>(value),
        }
    }
}

impl Flags {
    pub fn set_from_byte(&mut self, val: u8) {
        *self = val.into();
    }

    /// The flags as they appear in the F register. The low nibble is always zero.
    pub fn as_byte(&self) -> u8 {
        bool_to_mask::<7>(self.z)
            | bool_to_mask::<6>(self.n)
            | bool_to_mask::<5>(self.h)
            | bool_to_mask::<4>(self.c)
    }

    pub fn get(&self, flag: RegisterFlags) -> bool {
        match flag {
            RegisterFlags::Z => self.z,
            RegisterFlags::N => self.n,
            RegisterFlags::H => self.h,
            RegisterFlags::C => self.c,
        }
    }

    pub fn set(&mut self, flag: RegisterFlags, val: bool) {
        match flag {
            RegisterFlags::Z => self.z = val,
            RegisterFlags::N => self.n = val,
            RegisterFlags::H => self.h = val,
            RegisterFlags::C => self.c = val,
        }
    }
}

const fn bit_select<const B: u8>() -> u8 {
    const {
        match B {
            n @ 0..=7 => 0x1 << n,
            _ => panic!("You must select between the 0th and 7th bit!"),
        }
    }
}

const fn bool_to_mask<const B: u8>(val: bool) -> u8 {
    (val as u8) << B
}

pub(crate) const fn check_bit(bit: u8, src: u8) -> bool {
    let bit = 0x1 << bit;
    (src & bit) == bit
}

pub const fn check_bit_const<const B: u8>(src: u8) -> bool {
    (src & bit_select::<B>()) == bit_select::<B>()
}

/// Interprets a byte from the instruction stream as a two's-complement offset. Bytes at or above
/// 0x80 are negative (`byte - 256`).
pub const fn signed(byte: u8) -> i8 {
    byte as i8
}

impl Cpu {
    /// Constructs a new CPU with each register set to 0.
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// Constructs a CPU in the state the boot ROM leaves it in right before jumping into the
    /// cartridge at 0x0100.
    pub fn post_boot() -> Self {
        let mut digest = Self::new();
        digest.write_af(0x01B0);
        digest.write_bc(0x0013);
        digest.write_de(0x00D8);
        digest.write_hl(0x014D);
        digest.sp = Wrapping(0xFFFE);
        digest.pc = Wrapping(0x0100);
        digest
    }

    /// Get the top four bits of the F register
    pub fn flags(&self) -> &Flags {
        &self.f
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.f
    }

    /// Returns the value of the Z flag
    pub fn zero_flag(&self) -> bool {
        self.f.z
    }

    /// Returns the value of the N flag
    pub fn subtraction_flag(&self) -> bool {
        self.f.n
    }

    /// Returns the value of the H flag
    pub fn half_carry_flag(&self) -> bool {
        self.f.h
    }

    /// Returns the value of the C flag
    pub fn carry_flag(&self) -> bool {
        self.f.c
    }

    pub fn reg(&self, reg: HalfRegister) -> u8 {
        match reg {
            HalfRegister::A => self.a.0,
            HalfRegister::F => self.f.as_byte(),
            HalfRegister::B => self.b.0,
            HalfRegister::C => self.c.0,
            HalfRegister::D => self.d.0,
            HalfRegister::E => self.e.0,
            HalfRegister::H => self.h.0,
            HalfRegister::L => self.l.0,
        }
    }

    /// Writes to an eight bit register. Writes to F drop the low nibble.
    pub fn set_reg(&mut self, reg: HalfRegister, val: u8) {
        match reg {
            HalfRegister::A => self.a = Wrapping(val),
            HalfRegister::F => self.f.set_from_byte(val),
            HalfRegister::B => self.b = Wrapping(val),
            HalfRegister::C => self.c = Wrapping(val),
            HalfRegister::D => self.d = Wrapping(val),
            HalfRegister::E => self.e = Wrapping(val),
            HalfRegister::H => self.h = Wrapping(val),
            HalfRegister::L => self.l = Wrapping(val),
        }
    }

    pub fn pair(&self, reg: WideReg) -> u16 {
        match reg {
            WideReg::AF => self.af(),
            WideReg::BC => self.bc(),
            WideReg::DE => self.de(),
            WideReg::HL => self.hl(),
            WideReg::SP => self.sp.0,
        }
    }

    /// Writes to a register pair, updating both of its halves.
    pub fn set_pair(&mut self, reg: WideReg, val: u16) {
        match reg {
            WideReg::AF => self.write_af(val),
            WideReg::BC => self.write_bc(val),
            WideReg::DE => self.write_de(val),
            WideReg::HL => self.write_hl(val),
            WideReg::SP => self.sp = Wrapping(val),
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a.0, self.f.as_byte()])
    }

    pub fn write_af(&mut self, val: u16) {
        let [a, f] = val.to_be_bytes();
        self.a = Wrapping(a);
        self.f.set_from_byte(f);
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b.0, self.c.0])
    }

    pub fn write_bc(&mut self, val: u16) {
        let [b, c] = val.to_be_bytes().map(Wrapping);
        self.b = b;
        self.c = c;
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d.0, self.e.0])
    }

    pub fn write_de(&mut self, val: u16) {
        let [d, e] = val.to_be_bytes().map(Wrapping);
        self.d = d;
        self.e = e;
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h.0, self.l.0])
    }

    pub fn write_hl(&mut self, val: u16) {
        let [h, l] = val.to_be_bytes().map(Wrapping);
        self.h = h;
        self.l = l;
    }

    pub fn inc_pc(&mut self) {
        self.pc += 1u16;
    }

    /// Reads the byte the PC points at and moves the PC past it. This is the only way bytes are
    /// consumed from the instruction stream, both for op codes and their immediates.
    pub fn fetch_byte<M: MemoryLike + ?Sized>(&mut self, mem: &M) -> Result<u8, Error> {
        let byte = mem.read_byte(self.pc.0)?;
        self.inc_pc();
        Ok(byte)
    }

    /// Fetches a little-endian word from the instruction stream, low byte first.
    pub fn fetch_word<M: MemoryLike + ?Sized>(&mut self, mem: &M) -> Result<u16, Error> {
        let lo = self.fetch_byte(mem)?;
        let hi = self.fetch_byte(mem)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Moves SP down by two, then stores the high byte at SP + 1 and the low byte at SP.
    pub fn push<M: MemoryLike + ?Sized>(&mut self, mem: &mut M, val: u16) -> Result<(), Error> {
        self.sp -= 2u16;
        let [lo, hi] = val.to_le_bytes();
        mem.write_byte(self.sp.0.wrapping_add(1), hi)?;
        mem.write_byte(self.sp.0, lo)
    }

    /// Loads the low byte from SP and the high byte from SP + 1, then moves SP up by two.
    pub fn pop<M: MemoryLike + ?Sized>(&mut self, mem: &M) -> Result<u16, Error> {
        let lo = mem.read_byte(self.sp.0)?;
        let hi = mem.read_byte(self.sp.0.wrapping_add(1))?;
        self.sp += 2u16;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub(crate) fn enable_interupts(&mut self) {
        self.to_set_ime = true;
    }

    pub(crate) fn disable_interupts(&mut self) {
        self.ime = false;
        self.to_set_ime = false;
    }

    /// Whether or not the CPU is fetching instructions.
    pub fn is_running(&self) -> bool {
        matches!(self.state, CpuState::Running)
    }

    /// Brings a halted or stopped CPU back into its running state. This is meant to be called by
    /// whatever is tracking interrupts.
    pub fn wake(&mut self) {
        self.state = CpuState::Running;
    }
}
