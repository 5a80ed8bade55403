use std::num::Wrapping;

use serde::Deserialize;
use serde::Serialize;
use tracing::error;
use tracing::trace;

use crate::cpu::Cpu;
use crate::instruction::Commit;
use crate::instruction::Descriptor;
use crate::instruction::Fault;
use crate::instruction::ImeChange;
use crate::instruction::Mnemonic;
use crate::instruction::Resolved;
use crate::lookup::InstructionSet;
use crate::lookup::PREFIX_OPCODE;
use crate::mem::MemoryLike;
use crate::Error;

/// The number of ticks a step takes while the CPU is not fetching instructions.
pub const IDLE_TICKS: u8 = 4;

/// Which table the next fetched byte is looked up in.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeState {
    #[default]
    Normal,
    /// The last byte was the `0xCB` prefix.
    Prefixed,
}

/// Fetches, decodes, and executes one instruction at a time.
///
/// Every error is fatal. Once a step fails, the error is kept and every following step returns it
/// again without touching the CPU or the bus.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Dispatcher {
    #[serde(skip)]
    table: InstructionSet,
    state: DecodeState,
    fault: Option<Error>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dispatcher that decodes with the given tables.
    pub fn with_table(table: InstructionSet) -> Self {
        Self {
            table,
            state: DecodeState::Normal,
            fault: None,
        }
    }

    pub fn table(&self) -> &InstructionSet {
        &self.table
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// The error that stopped this dispatcher, if any.
    pub fn fault(&self) -> Option<Error> {
        self.fault
    }

    /// Runs a single instruction and returns the number of ticks it took. A `0xCB` prefix is its
    /// own step, so a prefixed instruction takes two steps. The two costs sum to the cost of the
    /// instruction.
    pub fn step<M: MemoryLike>(&mut self, cpu: &mut Cpu, mem: &mut M) -> Result<u8, Error> {
        if let Some(err) = self.fault {
            return Err(err);
        }
        let digest = self.execute(cpu, mem);
        if let Err(err) = digest {
            error!("Halting execution: {err}");
            self.fault = Some(err);
        }
        digest
    }

    fn execute<M: MemoryLike>(&mut self, cpu: &mut Cpu, mem: &mut M) -> Result<u8, Error> {
        if !cpu.is_running() {
            return Ok(IDLE_TICKS);
        }
        let prefixed = matches!(self.state, DecodeState::Prefixed);
        let addr = cpu.pc.0;
        let opcode = cpu.fetch_byte(&*mem)?;
        self.state = DecodeState::Normal;
        let desc = self.table.lookup(opcode, prefixed);
        if desc.mnemonic == Mnemonic::Prefix {
            trace!("0x{addr:0>4X}: {desc}");
            self.state = DecodeState::Prefixed;
            return Ok(desc.cycles.cost(true));
        }

        // EI only takes effect once the instruction after it completes
        let pending_ime = cpu.to_set_ime;

        let mut ops = heapless::Vec::<Resolved, 3>::new();
        for op in desc.operands.iter() {
            let resolved = op
                .resolve(cpu, &*mem)
                .map_err(|fault| fault_to_error(fault, desc, addr))?;
            if ops.push(resolved).is_err() {
                unreachable!("No instruction takes more than three operands");
            }
        }

        let outcome =
            (desc.handler)(cpu, &*mem, &ops).map_err(|fault| fault_to_error(fault, desc, addr))?;
        for commit in outcome.commits.iter().copied() {
            apply_commit(cpu, mem, commit)?;
        }
        let flags = desc.flags.apply(*cpu.flags(), outcome.flags);
        *cpu.flags_mut() = flags;

        if pending_ime && cpu.to_set_ime {
            cpu.ime = true;
            cpu.to_set_ime = false;
        }

        trace!("0x{addr:0>4X}: {desc} => {cpu}");
        let mut cost = desc.cycles.cost(outcome.taken);
        if prefixed {
            cost = cost.saturating_sub(self.table.base(PREFIX_OPCODE).cycles.cost(true));
        }
        Ok(cost)
    }
}

fn fault_to_error(fault: Fault, desc: &Descriptor, addr: u16) -> Error {
    match fault {
        Fault::Bus(err) => err,
        Fault::Unsupported => Error::UnimplementedOpcode {
            opcode: desc.opcode,
            prefixed: desc.prefixed,
            addr,
        },
        Fault::Illegal => Error::IllegalOpcode {
            opcode: desc.opcode,
            addr,
        },
    }
}

fn apply_commit<M: MemoryLike>(cpu: &mut Cpu, mem: &mut M, commit: Commit) -> Result<(), Error> {
    match commit {
        Commit::Reg(reg, val) => cpu.set_reg(reg, val),
        Commit::Pair(pair, val) => cpu.set_pair(pair, val),
        Commit::Mem(addr, val) => mem.write_byte(addr, val)?,
        Commit::MemWord(addr, val) => mem.write_word(addr, val)?,
        Commit::Push(val) => cpu.push(mem, val)?,
        Commit::Pop(pair) => {
            let val = cpu.pop(&*mem)?;
            cpu.set_pair(pair, val);
        }
        Commit::Jump(addr) => cpu.pc = Wrapping(addr),
        Commit::Return => {
            let addr = cpu.pop(&*mem)?;
            cpu.pc = Wrapping(addr);
        }
        Commit::Interrupts(ImeChange::Disable) => cpu.disable_interupts(),
        Commit::Interrupts(ImeChange::EnableDelayed) => cpu.enable_interupts(),
        Commit::Interrupts(ImeChange::EnableNow) => {
            cpu.ime = true;
            cpu.to_set_ime = false;
        }
        Commit::State(state) => cpu.state = state,
    }
    Ok(())
}
