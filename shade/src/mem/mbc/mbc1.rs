use std::fmt::Display;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::blank_ram;
use super::split_rom;
use super::RamBank;
use super::RomBank;

#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC1 {
    rom: Box<[RomBank]>,
    ram: Box<[RamBank]>,
    /// The lower five bits of the switchable ROM bank. Written at 0x2000-0x3FFF. Never zero.
    bank_index_one: u8,
    /// The two bit register written at 0x4000-0x5FFF. Depending on the banking mode, this is
    /// either the upper bits of the ROM bank or the RAM bank.
    bank_index_two: u8,
    /// Determines if RAM can be read from and written to. The actual hardware uses an 8-bit
    /// register, so RAM is enabled when the lower 4 bits are `0xA`.
    ///
    /// Initially set to `false`, any writes to the memory addresses 0x0000 through 0x1FFF write to
    /// this register.
    ram_enabled: bool,
    /// Determines how `bank_index_two` is used. Written at 0x6000-0x7FFF.
    banking_mode: BankingMode,
}

impl Display for MBC1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MBC1 {{")?;
        writeln!(f, "  MODE:  {}", self.banking_mode)?;
        writeln!(f, "  RAMG:  {}", self.ram_enabled)?;
        writeln!(f, "  BANK1: 0b{:0>8b}", self.bank_index_one)?;
        writeln!(f, "  BANK2: 0b{:0>8b}", self.bank_index_two)?;
        writeln!(f, "  rom_bank: 0x{:0>2X}", self.rom_bank())?;
        writeln!(f, "  ram_bank: 0x{:0>2X}", self.ram_bank())?;
        writeln!(f, "}}")
    }
}

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum BankingMode {
    /// `bank_index_two` extends the ROM bank to seven bits. RAM is pinned to bank 0.
    #[default]
    RomBanking = 0,
    /// `bank_index_two` selects the RAM bank. The upper ROM bits are forced to 0.
    RamBanking = 1,
}

impl BankingMode {
    fn from_byte(value: u8) -> Self {
        if (value & 0x1) == 0 {
            Self::RomBanking
        } else {
            Self::RamBanking
        }
    }
}

impl MBC1 {
    pub fn new(rom_banks: usize, ram_banks: usize, cart: &[u8]) -> Self {
        Self {
            rom: split_rom(cart, rom_banks),
            ram: blank_ram(ram_banks),
            bank_index_one: 1,
            bank_index_two: 0,
            ram_enabled: false,
            banking_mode: BankingMode::RomBanking,
        }
    }

    pub fn banking_mode(&self) -> BankingMode {
        self.banking_mode
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    /// The bank currently mapped into 0x4000-0x7FFF, wrapped to the banks that are present.
    #[inline]
    pub fn rom_bank(&self) -> usize {
        let upper = match self.banking_mode {
            BankingMode::RomBanking => self.bank_index_two << 5,
            BankingMode::RamBanking => 0,
        };
        (upper | self.bank_index_one) as usize % self.rom.len()
    }

    /// NOTE: This does *not* take RAM enablement into consideration.
    #[inline]
    pub fn ram_bank(&self) -> usize {
        match self.banking_mode {
            BankingMode::RomBanking => 0,
            BankingMode::RamBanking => self.bank_index_two as usize % self.ram.len().max(1),
        }
    }

    #[inline]
    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            0x0000..0x4000 => self.rom[0][index as usize],
            0x4000..0x8000 => self.rom[self.rom_bank()][(index - 0x4000) as usize],
            0xA000..0xC000 => match self.ram.get(self.ram_bank()) {
                Some(bank) if self.ram_enabled => bank[(index - 0xA000) as usize],
                _ => 0xFF,
            },
            index => {
                unreachable!(
                    "Memory controller is unable to read from memory address: 0x{index:0>4X}"
                )
            }
        }
    }

    /// Writes to a register or RAM bank
    #[inline]
    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..0x2000 => {
                self.ram_enabled = (value & 0x0F) == 0x0A;
                debug!("MBC1 RAM enabled: {}", self.ram_enabled);
            }
            0x2000..0x4000 => {
                self.bank_index_one = std::cmp::max(0x1F & value, 1);
                debug!("MBC1 switched to ROM bank 0x{:0>2X}", self.rom_bank());
            }
            0x4000..0x6000 => {
                self.bank_index_two = 0x3 & value;
                debug!(
                    "MBC1 upper bank register set to {} in {} mode",
                    self.bank_index_two, self.banking_mode
                );
            }
            0x6000..0x8000 => {
                self.banking_mode = BankingMode::from_byte(value);
                debug!("MBC1 banking mode: {}", self.banking_mode);
            }
            0xA000..0xC000 => {
                let bank = self.ram_bank();
                match self.ram.get_mut(bank) {
                    Some(bank) if self.ram_enabled => bank[(index - 0xA000) as usize] = value,
                    _ => {}
                }
            }
            _ => unreachable!(
                "Memory controller is unable to write to memory address: 0x{index:0>4X}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::mem::mbc::blank_ram;
    use crate::mem::mbc::BankingMode;
    use crate::mem::mbc::RomBank;

    use super::MBC1;

    fn banked(rom_banks: usize, ram_banks: usize) -> MBC1 {
        let rom = (0..rom_banks)
            .map(|i| RomBank::from_iter(std::iter::repeat(i as u8)))
            .collect();
        MBC1 {
            rom,
            ram: blank_ram(ram_banks),
            bank_index_one: 1,
            bank_index_two: 0,
            ram_enabled: false,
            banking_mode: BankingMode::RomBanking,
        }
    }

    #[test]
    fn rom_bank_example() {
        let mut mbc = banked(128, 4);
        mbc.write_byte(0x2000, 0x12);
        mbc.write_byte(0x4000, 0x01);

        assert_eq!(mbc.read_byte(0x0000), 0);
        assert_eq!(mbc.read_byte(0x3FFF), 0);
        assert_eq!(mbc.read_byte(0x4000), 0x32);
        assert_eq!(mbc.read_byte(0x7FFF), 0x32);

        // The upper bits stop applying to ROM in RAM banking mode
        mbc.write_byte(0x6000, 0x01);
        assert_eq!(mbc.banking_mode(), BankingMode::RamBanking);
        assert_eq!(mbc.read_byte(0x0000), 0);
        assert_eq!(mbc.read_byte(0x4000), 0x12);
    }

    #[test]
    fn bank_zero_is_never_switchable() {
        let mut mbc = banked(128, 0);
        for val in [0x00, 0x20, 0x40, 0x60, 0x80, 0xE0] {
            mbc.write_byte(0x2000, val);
            assert_ne!(mbc.rom_bank(), 0, "wrote 0x{val:0>2X}");
            assert_eq!(mbc.read_byte(0x4000), 1);
        }
    }

    #[test]
    fn rom_bank_wraps_to_present_banks() {
        let mut mbc = banked(4, 0);
        mbc.write_byte(0x2000, 0x07);
        assert_eq!(mbc.rom_bank(), 3);
        assert_eq!(mbc.read_byte(0x4000), 3);
    }

    #[test]
    fn ram_enable_latch() {
        let mut mbc = banked(4, 1);
        mbc.write_byte(0x0000, 0x0A);
        assert!(mbc.ram_enabled());
        mbc.write_byte(0xA000, 0x42);
        assert_eq!(mbc.read_byte(0xA000), 0x42);

        for val in (0..=u8::MAX).filter(|v| v & 0x0F != 0x0A) {
            mbc.write_byte(0x1FFF, val);
            assert!(!mbc.ram_enabled());
            mbc.write_byte(0xA000, val ^ 0xFF);
            assert_eq!(mbc.read_byte(0xA000), 0xFF);
        }
        mbc.write_byte(0x1000, 0xFA);
        assert_eq!(mbc.read_byte(0xA000), 0x42);
    }

    #[test]
    fn ram_banking_mode_selects_ram() {
        let mut mbc = banked(4, 4);
        mbc.write_byte(0x0000, 0x0A);
        mbc.write_byte(0x6000, 0x01);
        for bank in 0..4u8 {
            mbc.write_byte(0x4000, bank);
            mbc.write_byte(0xA123, bank + 0x40);
        }
        for bank in 0..4u8 {
            mbc.write_byte(0x4000, bank);
            assert_eq!(mbc.read_byte(0xA123), bank + 0x40);
        }
        // ROM banking mode pins RAM to bank 0
        mbc.write_byte(0x6000, 0x00);
        assert_eq!(mbc.ram_bank(), 0);
        assert_eq!(mbc.read_byte(0xA123), 0x40);
    }

    #[test]
    fn bank_mode_creation() {
        (0..u8::MAX).for_each(|i| assert_eq!(BankingMode::from_byte(i) as u8, 0x1 & i))
    }
}
