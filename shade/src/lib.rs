//! Shade is the core crate of the haunt project. Contained here is the CPU of a Game Boy-style
//! handheld (an SM83 core), the address bus that it sits on, and the memory bank controllers that
//! cartridges bring with them. This crate does no IO of its own and is meant to be driven by
//! something else, such as the `haunt` binary.
//!
//! # Notes
//! The SM83 is little endian. Words are stored low byte first, both in the instruction stream and
//! on the stack.

use serde::Deserialize;
use serde::Serialize;

pub mod cpu;
pub mod dispatch;
mod error;
pub mod instruction;
pub mod lookup;
pub mod mem;
pub mod rom;
pub(crate) mod utils;

pub use error::Error;
pub use error::MbcFeature;

use cpu::Cpu;
use dispatch::Dispatcher;
use mem::MemoryLike;
use mem::MemoryMap;

/// This is the core emulation primative. It holds the CPU and everything on its bus, and it is
/// agnostic to how (or if) it is displayed. The `Gameboy` does not provide a `run` method. It must
/// be stepped forward, which leaves managing the tick rate to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gameboy {
    pub cpu: Cpu,
    pub mem: MemoryMap,
    dispatcher: Dispatcher,
}

impl Gameboy {
    /// Inserts the cartridge and puts the machine into the state the boot ROM leaves it in.
    pub fn new(cart: Vec<u8>) -> Result<Self, Error> {
        let mut mem = MemoryMap::with_cartridge(cart)?;
        mem.post_boot_io();
        Ok(Self {
            cpu: Cpu::post_boot(),
            mem,
            dispatcher: Dispatcher::new(),
        })
    }

    /// A machine with zeroed registers and nothing in the cartridge slot. Any access to the
    /// cartridge windows fails until a cartridge is loaded.
    pub fn without_cartridge() -> Self {
        Self {
            cpu: Cpu::new(),
            mem: MemoryMap::new(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Replaces the inserted cartridge. The CPU is left as is.
    pub fn load_cartridge(&mut self, cart: Vec<u8>) -> Result<(), Error> {
        self.mem.load_cartridge(cart)
    }

    /// Runs the next instruction (or the next half of a prefixed one) and returns the ticks it
    /// took.
    pub fn step(&mut self) -> Result<u8, Error> {
        self.dispatcher.step(&mut self.cpu, &mut self.mem)
    }

    pub fn read_byte(&self, addr: u16) -> Result<u8, Error> {
        self.mem.read_byte(addr)
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) -> Result<(), Error> {
        self.mem.write_byte(addr, val)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Whether the CPU is fetching instructions, as opposed to being halted or stopped.
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }
}

impl Default for Gameboy {
    fn default() -> Self {
        Self::without_cartridge()
    }
}
