use std::fmt::Display;

use crate::cpu::signed;
use crate::cpu::Cpu;
use crate::cpu::HalfRegister;
use crate::cpu::WideReg;
use crate::mem::MemoryLike;
use crate::Error;

use super::Commit;
use super::Fault;

/// The declared shape of one of an instruction's operands. Operands are resolved when the
/// instruction executes, never when the table is built.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Operand {
    Reg(HalfRegister),
    Pair(WideReg),
    /// The byte that a register pair points to, e.g. `(HL)`.
    Indirect(WideReg),
    /// `(HL+)`, the byte HL points to. HL is incremented after the address is taken.
    HlIncrement,
    /// `(HL-)`, the byte HL points to. HL is decremented after the address is taken.
    HlDecrement,
    Imm8,
    /// A little-endian word from the instruction stream.
    Imm16,
    /// A two's-complement offset from the instruction stream.
    Signed8,
    /// The byte at `0xFF00 + immediate`.
    ZeroPage,
    /// The byte at `0xFF00 + C`.
    ZeroPageC,
    /// The byte at an address from the instruction stream.
    Absolute,
    Condition(Condition),
    /// A literal bit index, 0 through 7.
    Bit(u8),
    /// A restart vector.
    Vector(u8),
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum Condition {
    NZ,
    Z,
    NC,
    C,
}

impl Condition {
    pub fn passed(&self, cpu: &Cpu) -> bool {
        match self {
            Condition::NZ => !cpu.zero_flag(),
            Condition::Z => cpu.zero_flag(),
            Condition::NC => !cpu.carry_flag(),
            Condition::C => cpu.carry_flag(),
        }
    }
}

/// A place a value can be read from or written to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Location {
    Reg(HalfRegister),
    Pair(WideReg),
    Mem(u16),
}

impl Location {
    pub fn write_byte(self, val: u8) -> Commit {
        match self {
            Location::Reg(reg) => Commit::Reg(reg, val),
            Location::Mem(addr) => Commit::Mem(addr, val),
            Location::Pair(pair) => unreachable!("Can not write a byte into the {pair} pair"),
        }
    }

    pub fn write_word(self, val: u16) -> Commit {
        match self {
            Location::Pair(pair) => Commit::Pair(pair, val),
            Location::Mem(addr) => Commit::MemWord(addr, val),
            Location::Reg(reg) => unreachable!("Can not write a word into the {reg} register"),
        }
    }
}

/// An operand after resolution.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Resolved {
    At(Location),
    Byte(u8),
    Word(u16),
    Offset(i8),
    Condition(bool),
    Bit(u8),
    Vector(u16),
}

impl Resolved {
    /// Reads the byte value of this operand, dereferencing through the bus if needed.
    pub fn byte(&self, cpu: &Cpu, mem: &dyn MemoryLike) -> Result<u8, Error> {
        match *self {
            Resolved::At(Location::Reg(reg)) => Ok(cpu.reg(reg)),
            Resolved::At(Location::Mem(addr)) => mem.read_byte(addr),
            Resolved::Byte(b) => Ok(b),
            other => unreachable!("{other:?} does not hold a byte"),
        }
    }

    /// The word value of this operand.
    pub fn word(&self, cpu: &Cpu) -> u16 {
        match *self {
            Resolved::At(Location::Pair(pair)) => cpu.pair(pair),
            Resolved::Word(w) => w,
            other => unreachable!("{other:?} does not hold a word"),
        }
    }

    pub fn location(&self) -> Option<Location> {
        match *self {
            Resolved::At(loc) => Some(loc),
            _ => None,
        }
    }

    /// Whether this operand is sixteen bits wide.
    pub fn is_wide(&self) -> bool {
        matches!(self, Resolved::At(Location::Pair(_)) | Resolved::Word(_))
    }
}

impl Operand {
    /// Whether the operand names a memory cell rather than a value.
    pub fn is_dereferenced(&self) -> bool {
        matches!(
            self,
            Operand::Indirect(_)
                | Operand::HlIncrement
                | Operand::HlDecrement
                | Operand::ZeroPage
                | Operand::ZeroPageC
                | Operand::Absolute
        )
    }

    /// The number of bytes this operand consumes from the instruction stream.
    pub fn size(&self) -> u8 {
        match self {
            Operand::Imm8 | Operand::Signed8 | Operand::ZeroPage => 1,
            Operand::Imm16 | Operand::Absolute => 2,
            _ => 0,
        }
    }

    /// Turns this operand into a value or a location. Immediates are fetched from the instruction
    /// stream, so operands must be resolved in declaration order.
    pub fn resolve<M: MemoryLike + ?Sized>(
        self,
        cpu: &mut Cpu,
        mem: &M,
    ) -> Result<Resolved, Fault> {
        let digest = match self {
            Operand::Reg(reg) => Resolved::At(Location::Reg(reg)),
            Operand::Pair(pair) => Resolved::At(Location::Pair(pair)),
            Operand::Indirect(pair) => Resolved::At(Location::Mem(cpu.pair(pair))),
            Operand::HlIncrement => {
                let addr = cpu.hl();
                cpu.write_hl(addr.wrapping_add(1));
                Resolved::At(Location::Mem(addr))
            }
            Operand::HlDecrement => {
                let addr = cpu.hl();
                cpu.write_hl(addr.wrapping_sub(1));
                Resolved::At(Location::Mem(addr))
            }
            Operand::Imm8 => Resolved::Byte(cpu.fetch_byte(mem)?),
            Operand::Imm16 => Resolved::Word(cpu.fetch_word(mem)?),
            Operand::Signed8 => Resolved::Offset(signed(cpu.fetch_byte(mem)?)),
            Operand::ZeroPage => {
                let lo = cpu.fetch_byte(mem)?;
                Resolved::At(Location::Mem(0xFF00 | lo as u16))
            }
            Operand::ZeroPageC => Resolved::At(Location::Mem(0xFF00 | cpu.c.0 as u16)),
            Operand::Absolute => Resolved::At(Location::Mem(cpu.fetch_word(mem)?)),
            Operand::Condition(cond) => Resolved::Condition(cond.passed(cpu)),
            Operand::Bit(b) => Resolved::Bit(b),
            Operand::Vector(v) => Resolved::Vector(v as u16),
        };
        Ok(digest)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Pair(pair) => write!(f, "{pair}"),
            Operand::Indirect(pair) => write!(f, "({pair})"),
            Operand::HlIncrement => write!(f, "(HL+)"),
            Operand::HlDecrement => write!(f, "(HL-)"),
            Operand::Imm8 => write!(f, "d8"),
            Operand::Imm16 => write!(f, "d16"),
            Operand::Signed8 => write!(f, "r8"),
            Operand::ZeroPage => write!(f, "(a8)"),
            Operand::ZeroPageC => write!(f, "(C)"),
            Operand::Absolute => write!(f, "(a16)"),
            Operand::Condition(cond) => write!(f, "{cond}"),
            Operand::Bit(b) => write!(f, "{b}"),
            Operand::Vector(v) => write!(f, "{v:0>2X}H"),
        }
    }
}
