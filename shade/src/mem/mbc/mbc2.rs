use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::debug;

use super::split_rom;
use super::RomBank;

/// The number of 4-bit cells built into the controller.
pub const MBC2_RAM_SIZE: usize = 512;

/// The MBC2 supports up to 16 ROM banks and has a small amount of RAM built in. Only the lower
/// four bits of each RAM cell exist.
#[serde_as]
#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MBC2 {
    rom: Box<[RomBank]>,
    rom_bank: u8,
    #[serde_as(as = "serde_with::Bytes")]
    ram: Vec<u8>,
    ram_enabled: bool,
}

impl MBC2 {
    pub fn new(rom_banks: usize, cart: &[u8]) -> Self {
        Self {
            rom: split_rom(cart, rom_banks),
            rom_bank: 1,
            ram: vec![0; MBC2_RAM_SIZE],
            ram_enabled: false,
        }
    }

    pub fn rom_bank(&self) -> usize {
        self.rom_bank as usize % self.rom.len()
    }

    pub fn read_byte(&self, index: u16) -> u8 {
        match index {
            i @ 0x0000..0x4000 => self.rom[0][i as usize],
            i @ 0x4000..0x8000 => self.rom[self.rom_bank()][(i - 0x4000) as usize],
            // The 512 cells repeat through the whole window
            i @ 0xA000..0xC000 if self.ram_enabled => 0xF0 | self.ram[(i & 0x01FF) as usize],
            0xA000..0xC000 => 0xFF,
            i => unreachable!("MBC2 could not read from address: {i:#X}"),
        }
    }

    pub fn write_byte(&mut self, index: u16, value: u8) {
        match index {
            0x0000..0x2000 => {
                self.ram_enabled = (value & 0x0F) == 0x0A;
                debug!("MBC2 RAM enabled: {}", self.ram_enabled);
            }
            0x2000..0x4000 => {
                if value & 0x10 == 0x10 {
                    self.rom_bank = std::cmp::max(value & 0x0F, 1);
                    debug!("MBC2 switched to ROM bank 0x{:0>2X}", self.rom_bank());
                }
            }
            0x4000..0x8000 => {}
            i @ 0xA000..0xC000 => {
                if self.ram_enabled {
                    self.ram[(i & 0x01FF) as usize] = 0x0F & value;
                }
            }
            i => unreachable!("MBC2 could not write to address: {i:#X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MBC2;
    use crate::mem::mbc::ROM_BANK_SIZE;

    fn cart() -> Vec<u8> {
        (0..16 * ROM_BANK_SIZE)
            .map(|i| (i / ROM_BANK_SIZE) as u8)
            .collect()
    }

    #[test]
    fn bank_select_needs_bit_four() {
        let mut mbc = MBC2::new(16, &cart());
        assert_eq!(mbc.read_byte(0x4000), 1);
        mbc.write_byte(0x2000, 0x05);
        assert_eq!(mbc.read_byte(0x4000), 1);
        mbc.write_byte(0x2000, 0x15);
        assert_eq!(mbc.read_byte(0x4000), 5);
        mbc.write_byte(0x3FFF, 0x10);
        assert_eq!(mbc.read_byte(0x4000), 1);
        assert_eq!(mbc.read_byte(0x0000), 0);
    }

    #[test]
    fn ram_cells_are_nibbles() {
        let mut mbc = MBC2::new(16, &cart());
        mbc.write_byte(0xA000, 0x0C);
        assert_eq!(mbc.read_byte(0xA000), 0xFF);

        mbc.write_byte(0x0000, 0x0A);
        for val in 0..=u8::MAX {
            mbc.write_byte(0xA010, val);
            assert_eq!(mbc.read_byte(0xA010), 0xF0 | (val & 0x0F));
        }
        mbc.write_byte(0xA001, 0x03);
        assert_eq!(mbc.read_byte(0xA201), 0xF3);
        assert_eq!(mbc.read_byte(0xBE01), 0xF3);
    }
}
