use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use super::blank_ram;
use super::split_rom;
use super::RamBank;
use super::RomBank;

/// A cartridge with no controller. Both ROM banks are always mapped and there is at most one bank
/// of RAM, which is always enabled.
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direct {
    rom: Box<[RomBank]>,
    ram: Box<[RamBank]>,
}

impl Direct {
    pub fn new(cart: &[u8], ram_banks: usize) -> Self {
        Self {
            rom: split_rom(cart, 2),
            ram: blank_ram(std::cmp::min(ram_banks, 1)),
        }
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..0x4000 => self.rom[0][index as usize],
            0x4000..0x8000 => self.rom[1][(index - 0x4000) as usize],
            0xA000..0xC000 => self
                .ram
                .first()
                .map(|bank| bank[(index - 0xA000) as usize])
                .unwrap_or(0xFF),
            index => unreachable!(
                "Memory controller is unable to read from memory address: 0x{index:0>4X}"
            ),
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..0x8000 => {
                warn!("Write of 0x{value:0>2X} to 0x{index:0>4X} on a cartridge without a controller")
            }
            0xA000..0xC000 => {
                if let Some(bank) = self.ram.first_mut() {
                    bank[(index - 0xA000) as usize] = value;
                }
            }
            _ => unreachable!(
                "Memory controller is unable to write to memory address: 0x{index:0>4X}"
            ),
        }
    }
}
