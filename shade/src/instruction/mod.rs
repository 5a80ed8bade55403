//! The declarative shape of every instruction and the per-family handlers that give them meaning.
//!
//! Execution is split into three phases. The dispatcher first resolves each operand of a
//! [`Descriptor`] into a [`Resolved`] value (fetching immediates as it goes). The descriptor's
//! [`Handler`] then computes an [`Outcome`] from those values without touching any state. Lastly,
//! the dispatcher commits the outcome's writes and applies the descriptor's [`FlagPolicies`].

use std::fmt::Display;

use crate::cpu::Cpu;
use crate::cpu::CpuState;
use crate::cpu::Flags;
use crate::cpu::HalfRegister;
use crate::cpu::WideReg;
use crate::mem::MemoryLike;
use crate::Error;

mod arithmetic;
mod bit;
mod bit_shift;
mod control;
mod jump;
mod load;
mod operand;

pub use arithmetic::*;
pub use bit::*;
pub use bit_shift::*;
pub use control::*;
pub use jump::*;
pub use load::*;
pub use operand::*;

/// Computes the outcome of an instruction from its resolved operands. Handlers never mutate the
/// CPU or the bus themselves.
pub type Handler = fn(&Cpu, &dyn MemoryLike, &[Resolved]) -> Result<Outcome, Fault>;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum Mnemonic {
    #[display("NOP")]
    Nop,
    #[display("STOP")]
    Stop,
    #[display("HALT")]
    Halt,
    /// Disable interupts
    #[display("DI")]
    Di,
    /// Enable interupts
    #[display("EI")]
    Ei,
    #[display("LD")]
    Ld,
    #[display("LDH")]
    Ldh,
    #[display("PUSH")]
    Push,
    #[display("POP")]
    Pop,
    #[display("ADD")]
    Add,
    #[display("ADC")]
    Adc,
    #[display("SUB")]
    Sub,
    #[display("SBC")]
    Sbc,
    #[display("AND")]
    And,
    #[display("XOR")]
    Xor,
    #[display("OR")]
    Or,
    #[display("CP")]
    Cp,
    #[display("INC")]
    Inc,
    #[display("DEC")]
    Dec,
    #[display("DAA")]
    Daa,
    /// ComPLement accumulator.
    #[display("CPL")]
    Cpl,
    /// Set Carry.
    #[display("SCF")]
    Scf,
    /// CompLement carry flag.
    #[display("CCF")]
    Ccf,
    #[display("JR")]
    Jr,
    #[display("JP")]
    Jp,
    #[display("CALL")]
    Call,
    #[display("RET")]
    Ret,
    #[display("RETI")]
    Reti,
    #[display("RST")]
    Rst,
    /// The RLA, RLCA, RRA, RRCA are, in a sense, bit shift operations. However, they are the only
    /// shifting ops that are not prefixed.
    #[display("RLCA")]
    Rlca,
    #[display("RRCA")]
    Rrca,
    #[display("RLA")]
    Rla,
    #[display("RRA")]
    Rra,
    #[display("RLC")]
    Rlc,
    #[display("RRC")]
    Rrc,
    #[display("RL")]
    Rl,
    #[display("RR")]
    Rr,
    #[display("SLA")]
    Sla,
    #[display("SRA")]
    Sra,
    #[display("SWAP")]
    Swap,
    #[display("SRL")]
    Srl,
    #[display("BIT")]
    Bit,
    #[display("RES")]
    Res,
    #[display("SET")]
    Set,
    /// Load the next byte as an op code for a prefixed instruction
    #[display("PREFIX")]
    Prefix,
    /// Used for the handful of op codes that the CPU does not define
    #[display("ILLEGAL")]
    Illegal,
    /// A slot in a table that nothing was defined for
    #[display("UNIMPLEMENTED")]
    Unimplemented,
}

impl Mnemonic {
    /// The family handler that gives this mnemonic its semantics.
    pub const fn handler(self) -> Handler {
        match self {
            Mnemonic::Nop => nop,
            Mnemonic::Stop => stop,
            Mnemonic::Halt => halt,
            Mnemonic::Di => di,
            Mnemonic::Ei => ei,
            Mnemonic::Ld | Mnemonic::Ldh => ld,
            Mnemonic::Push => push,
            Mnemonic::Pop => pop,
            Mnemonic::Add => add,
            Mnemonic::Adc => adc,
            Mnemonic::Sub => sub,
            Mnemonic::Sbc => sbc,
            Mnemonic::And => and,
            Mnemonic::Xor => xor,
            Mnemonic::Or => or,
            Mnemonic::Cp => cp,
            Mnemonic::Inc => inc,
            Mnemonic::Dec => dec,
            Mnemonic::Daa => daa,
            Mnemonic::Cpl => cpl,
            Mnemonic::Scf => scf,
            Mnemonic::Ccf => ccf,
            Mnemonic::Jr => jr,
            Mnemonic::Jp => jp,
            Mnemonic::Call => call,
            Mnemonic::Ret => ret,
            Mnemonic::Reti => reti,
            Mnemonic::Rst => rst,
            Mnemonic::Rlca => rlca,
            Mnemonic::Rrca => rrca,
            Mnemonic::Rla => rla,
            Mnemonic::Rra => rra,
            Mnemonic::Rlc => rlc,
            Mnemonic::Rrc => rrc,
            Mnemonic::Rl => rl,
            Mnemonic::Rr => rr,
            Mnemonic::Sla => sla,
            Mnemonic::Sra => sra,
            Mnemonic::Swap => swap,
            Mnemonic::Srl => srl,
            Mnemonic::Bit => bit,
            Mnemonic::Res => res,
            Mnemonic::Set => set,
            // The dispatcher intercepts the prefix before its handler could ever be called
            Mnemonic::Prefix => nop,
            Mnemonic::Illegal => illegal,
            Mnemonic::Unimplemented => unimplemented,
        }
    }
}

/// How a single flag is updated once an instruction completes.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
pub enum FlagPolicy {
    #[display("1")]
    Set,
    #[display("0")]
    Reset,
    /// The flag takes whatever value the family handler computed.
    #[display("*")]
    Affected,
    #[display("-")]
    Unaffected,
}

impl FlagPolicy {
    const fn from_char(c: u8) -> Self {
        match c {
            b'-' => Self::Unaffected,
            b'0' => Self::Reset,
            b'1' => Self::Set,
            _ => Self::Affected,
        }
    }

    fn resolve(self, current: bool, computed: bool) -> bool {
        match self {
            FlagPolicy::Set => true,
            FlagPolicy::Reset => false,
            FlagPolicy::Affected => computed,
            FlagPolicy::Unaffected => current,
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{z}{n}{h}{c}")]
pub struct FlagPolicies {
    pub z: FlagPolicy,
    pub n: FlagPolicy,
    pub h: FlagPolicy,
    pub c: FlagPolicy,
}

impl FlagPolicies {
    /// Parses the four character notation used by opcode tables, e.g. `"Z0HC"`. A `-` leaves the
    /// flag alone, `0` and `1` force it, and anything else takes the computed value.
    pub const fn parse(policies: &str) -> Self {
        let bytes = policies.as_bytes();
        if bytes.len() != 4 {
            panic!("Flag policies must list exactly one policy for each of Z, N, H, and C");
        }
        Self {
            z: FlagPolicy::from_char(bytes[0]),
            n: FlagPolicy::from_char(bytes[1]),
            h: FlagPolicy::from_char(bytes[2]),
            c: FlagPolicy::from_char(bytes[3]),
        }
    }

    /// Merges the flags computed by a handler into the current flags.
    pub fn apply(&self, current: Flags, computed: Flags) -> Flags {
        Flags {
            z: self.z.resolve(current.z, computed.z),
            n: self.n.resolve(current.n, computed.n),
            h: self.h.resolve(current.h, computed.h),
            c: self.c.resolve(current.c, computed.c),
        }
    }
}

/// The number of ticks an instruction takes.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Cycles {
    Fixed(u8),
    /// Conditional control transfers cost more when the transfer happens.
    Branch { taken: u8, skipped: u8 },
}

impl Cycles {
    pub fn cost(&self, taken: bool) -> u8 {
        match *self {
            Cycles::Fixed(n) => n,
            Cycles::Branch { taken: n, .. } if taken => n,
            Cycles::Branch { skipped, .. } => skipped,
        }
    }
}

impl From<u8> for Cycles {
    fn from(value: u8) -> Self {
        Self::Fixed(value)
    }
}

impl From<(u8, u8)> for Cycles {
    fn from((taken, skipped): (u8, u8)) -> Self {
        Self::Branch { taken, skipped }
    }
}

impl Display for Cycles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cycles::Fixed(n) => write!(f, "{n}"),
            Cycles::Branch { taken, skipped } => write!(f, "{taken}/{skipped}"),
        }
    }
}

/// The static description of a single opcode. Built once with the rest of the table and never
/// modified.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub opcode: u8,
    pub prefixed: bool,
    pub mnemonic: Mnemonic,
    /// Resolved left to right. The order matters since operands can consume bytes from the
    /// instruction stream.
    pub operands: heapless::Vec<Operand, 3>,
    pub cycles: Cycles,
    pub flags: FlagPolicies,
    pub handler: Handler,
}

impl Descriptor {
    pub fn new(
        opcode: u8,
        prefixed: bool,
        mnemonic: Mnemonic,
        operands: &[Operand],
        cycles: Cycles,
        flags: FlagPolicies,
    ) -> Self {
        let mut list = heapless::Vec::new();
        for op in operands {
            if list.push(*op).is_err() {
                unreachable!("No instruction takes more than three operands");
            }
        }
        Self {
            opcode,
            prefixed,
            mnemonic,
            operands: list,
            cycles,
            flags,
            handler: mnemonic.handler(),
        }
    }

    /// The placeholder for any slot of a table that was left undefined.
    pub fn unimplemented(opcode: u8, prefixed: bool) -> Self {
        Self::new(
            opcode,
            prefixed,
            Mnemonic::Unimplemented,
            &[],
            Cycles::Fixed(4),
            FlagPolicies::parse("----"),
        )
    }

    /// The number of bytes this instruction occupies in the instruction stream, including the
    /// prefix.
    pub fn size(&self) -> u8 {
        1 + self.prefixed as u8 + self.operands.iter().map(Operand::size).sum::<u8>()
    }
}

impl Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        if matches!(self.mnemonic, Mnemonic::Prefix) {
            return write!(f, " CB");
        }
        let mut sep = " ";
        for op in &self.operands {
            write!(f, "{sep}{op}")?;
            sep = ",";
        }
        Ok(())
    }
}

/// A write that a handler wants to make. Commits are applied in order.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Commit {
    Reg(HalfRegister, u8),
    Pair(WideReg, u16),
    Mem(u16, u8),
    /// A little-endian word write
    MemWord(u16, u16),
    Push(u16),
    Pop(WideReg),
    Jump(u16),
    /// Pops the PC from the stack.
    Return,
    Interrupts(ImeChange),
    State(CpuState),
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ImeChange {
    Disable,
    /// Enable interupts after the following instruction completes.
    EnableDelayed,
    EnableNow,
}

/// Everything a handler computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub commits: heapless::Vec<Commit, 3>,
    /// The flags as the family's arithmetic would set them. Only the flags whose policy is
    /// "affected" are taken from here.
    pub flags: Flags,
    /// Whether a conditional control transfer happened. Always true for everything else.
    pub taken: bool,
}

impl Outcome {
    pub fn new(flags: Flags) -> Self {
        Self {
            commits: heapless::Vec::new(),
            flags,
            taken: true,
        }
    }

    pub fn with(mut self, commit: Commit) -> Self {
        if self.commits.push(commit).is_err() {
            unreachable!("No instruction commits more than three writes");
        }
        self
    }

    pub fn skipped(mut self) -> Self {
        self.taken = false;
        self
    }
}

/// Why a handler could not produce an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Bus(Error),
    /// The handler for this opcode has not been written.
    Unsupported,
    /// The opcode is not a valid instruction.
    Illegal,
}

impl From<Error> for Fault {
    fn from(value: Error) -> Self {
        Self::Bus(value)
    }
}

/// Reads the byte value of a source operand.
pub(crate) fn source_byte(
    cpu: &Cpu,
    mem: &dyn MemoryLike,
    ops: &[Resolved],
    index: usize,
) -> Result<u8, Fault> {
    match ops.get(index) {
        Some(op) => op.byte(cpu, mem).map_err(Into::into),
        None => unreachable!("Missing operand #{index}"),
    }
}

/// Returns the destination operand, which is always the first.
pub(crate) fn destination(ops: &[Resolved]) -> Location {
    match ops.first().and_then(Resolved::location) {
        Some(loc) => loc,
        None => unreachable!("Instruction has no destination operand: {ops:?}"),
    }
}
