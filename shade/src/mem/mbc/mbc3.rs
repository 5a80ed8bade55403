use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;

use super::blank_ram;
use super::split_rom;
use super::RamBank;
use super::RomBank;
use crate::rom::ControllerKind;
use crate::Error;
use crate::MbcFeature;

/// What the 0xA000-0xBFFF window is currently mapped to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mbc3Select {
    Ram(u8),
    /// One of the real-time clock registers, 0x08 through 0x0C.
    Clock(u8),
    /// Any other value. Reads are open bus.
    Unmapped(u8),
}

/// The MBC3 supports up to 2 MiB of ROM, 32 KiB of RAM and, on some carts, a real-time clock.
/// The clock is not emulated.
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC3 {
    rom: Box<[RomBank]>,
    ram: Box<[RamBank]>,
    rom_bank: u8,
    select: Mbc3Select,
    ram_enabled: bool,
    timer: bool,
}

impl MBC3 {
    pub fn new(rom_banks: usize, ram_banks: usize, timer: bool, cart: &[u8]) -> Self {
        Self {
            rom: split_rom(cart, rom_banks),
            ram: blank_ram(ram_banks),
            rom_bank: 1,
            select: Mbc3Select::Ram(0),
            ram_enabled: false,
            timer,
        }
    }

    pub fn rom_bank(&self) -> usize {
        self.rom_bank as usize % self.rom.len()
    }

    fn clock_access(&self, feature: MbcFeature, index: u16) -> Error {
        let err = Error::UnsupportedMbcFeature {
            mbc: ControllerKind::MBC3 { timer: self.timer },
            feature,
            addr: index,
        };
        error!("{err}");
        err
    }

    pub fn read_byte(&self, index: u16) -> Result<u8, Error> {
        let digest = match index {
            0x0000..0x4000 => self.rom[0][index as usize],
            0x4000..0x8000 => self.rom[self.rom_bank()][(index - 0x4000) as usize],
            0xA000..0xC000 if !self.ram_enabled => 0xFF,
            0xA000..0xC000 => match self.select {
                Mbc3Select::Ram(bank) => self
                    .ram
                    .get(bank as usize)
                    .map(|bank| bank[(index - 0xA000) as usize])
                    .unwrap_or(0xFF),
                Mbc3Select::Clock(_) if self.timer => {
                    return Err(self.clock_access(MbcFeature::ClockRegisters, index))
                }
                Mbc3Select::Clock(_) | Mbc3Select::Unmapped(_) => 0xFF,
            },
            index => unreachable!("MBC3 could not read from address: 0x{index:0>4X}"),
        };
        Ok(digest)
    }

    pub fn write_byte(&mut self, index: u16, value: u8) -> Result<(), Error> {
        match index {
            0x0000..0x2000 => {
                self.ram_enabled = (value & 0x0F) == 0x0A;
                debug!("MBC3 RAM/clock enabled: {}", self.ram_enabled);
            }
            0x2000..0x4000 => {
                self.rom_bank = std::cmp::max(value & 0x7F, 1);
                debug!("MBC3 switched to ROM bank 0x{:0>2X}", self.rom_bank());
            }
            0x4000..0x6000 => {
                self.select = match value {
                    0x00..=0x03 => Mbc3Select::Ram(value),
                    0x08..=0x0C => Mbc3Select::Clock(value),
                    n => Mbc3Select::Unmapped(n),
                };
                debug!("MBC3 mapped {:?} into 0xA000", self.select);
            }
            // Latching the clock
            0x6000..0x8000 if self.timer => {
                return Err(self.clock_access(MbcFeature::ClockLatch, index))
            }
            0x6000..0x8000 => {}
            0xA000..0xC000 if !self.ram_enabled => {}
            0xA000..0xC000 => match self.select {
                Mbc3Select::Ram(bank) => {
                    if let Some(bank) = self.ram.get_mut(bank as usize) {
                        bank[(index - 0xA000) as usize] = value;
                    }
                }
                Mbc3Select::Clock(_) if self.timer => {
                    return Err(self.clock_access(MbcFeature::ClockRegisters, index))
                }
                Mbc3Select::Clock(_) | Mbc3Select::Unmapped(_) => {}
            },
            i => unreachable!("MBC3 could not write to address: {i:#X}"),
        }
        Ok(())
    }
}
