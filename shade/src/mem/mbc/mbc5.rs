use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::blank_ram;
use super::split_rom;
use super::RamBank;
use super::RomBank;

/// The MBC5 supports up to 8 MiB of ROM and 128 KiB of RAM. Unlike the earlier controllers, bank
/// 0 can be mapped into the switchable window.
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC5 {
    rom: Box<[RomBank]>,
    ram: Box<[RamBank]>,
    /// Nine bits wide
    rom_bank: u16,
    ram_bank: u8,
    ram_enabled: bool,
}

impl MBC5 {
    pub fn new(rom_banks: usize, ram_banks: usize, cart: &[u8]) -> Self {
        Self {
            rom: split_rom(cart, rom_banks),
            ram: blank_ram(ram_banks),
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
        }
    }

    pub fn rom_bank(&self) -> usize {
        self.rom_bank as usize % self.rom.len()
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..0x4000 => self.rom[0][index as usize],
            0x4000..0x8000 => self.rom[self.rom_bank()][(index - 0x4000) as usize],
            0xA000..0xC000 => match self.ram.get(self.ram_bank as usize) {
                Some(bank) if self.ram_enabled => bank[(index - 0xA000) as usize],
                _ => 0xFF,
            },
            index => unreachable!("MBC5 could not read from address: 0x{index:0>4X}"),
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..0x2000 => {
                self.ram_enabled = (value & 0x0F) == 0x0A;
                debug!("MBC5 RAM enabled: {}", self.ram_enabled);
            }
            0x2000..0x3000 => {
                self.rom_bank = (self.rom_bank & 0x100) | value as u16;
                debug!("MBC5 switched to ROM bank 0x{:0>3X}", self.rom_bank());
            }
            0x3000..0x4000 => {
                self.rom_bank = (self.rom_bank & 0xFF) | ((value as u16 & 0x1) << 8);
                debug!("MBC5 switched to ROM bank 0x{:0>3X}", self.rom_bank());
            }
            0x4000..0x6000 => {
                self.ram_bank = value & 0x0F;
                debug!("MBC5 switched to RAM bank 0x{:0>2X}", self.ram_bank);
            }
            0x6000..0x8000 => {}
            0xA000..0xC000 => match self.ram.get_mut(self.ram_bank as usize) {
                Some(bank) if self.ram_enabled => bank[(index - 0xA000) as usize] = value,
                _ => {}
            },
            i => unreachable!("MBC5 could not write to address: {i:#X}"),
        }
    }
}
