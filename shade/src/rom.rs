use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;

/// The handful of header fields needed to pick and size a memory bank controller. Per the Pan
/// Docs, the header of the ROM occupies the region between `0x100` and `0x14F`.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeHeader {
    /// The memory region between `0x134` and `0x143`, with trailing zeros trimmed. Non-ASCII
    /// bytes are replaced.
    pub title: String,
    /// The raw cartridge-type byte at `0x147`.
    pub kind: u8,
    /// The controller that `kind` decodes to.
    pub controller: ControllerKind,
    /// The number of 16 KiB ROM banks, decoded from the byte at `0x148`.
    pub rom_banks: usize,
    /// The number of 8 KiB RAM banks, decoded from the byte at `0x149`.
    pub ram_banks: usize,
    /// The unsigned byte at `0x14D`. The boot ROM checks this against the bytes between `0x134`
    /// and `0x14C`. A mismatch is only logged here.
    pub header_checksum: u8,
}

/// The family of memory bank controller that a cartridge is wired to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
pub enum ControllerKind {
    #[display("ROM-only")]
    RomOnly,
    MBC1,
    MBC2,
    #[display("MBC3{}", if *timer { " (timer)" } else { "" })]
    MBC3 { timer: bool },
    MBC5,
}

impl ControllerKind {
    pub fn from_byte(kind: u8) -> Result<Self, Error> {
        match kind {
            0x00 | 0x08 | 0x09 => Ok(Self::RomOnly),
            0x01..=0x03 => Ok(Self::MBC1),
            0x05 | 0x06 => Ok(Self::MBC2),
            0x0F | 0x10 => Ok(Self::MBC3 { timer: true }),
            0x11..=0x13 => Ok(Self::MBC3 { timer: false }),
            0x19..=0x1E => Ok(Self::MBC5),
            kind => Err(Error::UnsupportedCartridgeType { kind }),
        }
    }
}

/// Decodes the ROM-size code at `0x148` into a number of 16 KiB banks.
pub fn rom_bank_count(code: u8) -> Result<usize, Error> {
    match code {
        n @ 0x00..=0x08 => Ok(2 << n),
        0x52 => Ok(72),
        0x53 => Ok(80),
        0x54 => Ok(96),
        code => Err(Error::UnsupportedRomSize { code }),
    }
}

/// Decodes the RAM-size code at `0x149` into a number of 8 KiB banks. Code 1 (an unused 2 KiB
/// chip) is rounded up to a full bank.
pub fn ram_bank_count(code: u8) -> Result<usize, Error> {
    match code {
        0x00 => Ok(0),
        0x01 | 0x02 => Ok(1),
        0x03 => Ok(4),
        0x04 => Ok(16),
        0x05 => Ok(8),
        code => Err(Error::UnsupportedRamSize { code }),
    }
}

impl CartridgeHeader {
    pub const START_ADDR: usize = 0x100;
    pub const END_ADDR: usize = 0x14F;
    pub const TITLE: std::ops::RangeInclusive<usize> = 0x134..=0x143;
    pub const KIND_ADDR: usize = 0x147;
    pub const ROM_SIZE_ADDR: usize = 0x148;
    pub const RAM_SIZE_ADDR: usize = 0x149;
    pub const CHECKSUM_ADDR: usize = 0x14D;

    pub fn extract_from_rom(rom: &[u8]) -> Result<Self, Error> {
        if rom.len() <= Self::END_ADDR {
            return Err(Error::TruncatedCartridge { len: rom.len() });
        }
        let title = rom[Self::TITLE]
            .iter()
            .take_while(|b| **b != 0)
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' })
            .collect();
        let kind = rom[Self::KIND_ADDR];
        let controller = ControllerKind::from_byte(kind)?;
        let rom_banks = rom_bank_count(rom[Self::ROM_SIZE_ADDR])?;
        let ram_banks = ram_bank_count(rom[Self::RAM_SIZE_ADDR])?;
        let header_checksum = rom[Self::CHECKSUM_ADDR];
        let digest = Self {
            title,
            kind,
            controller,
            rom_banks,
            ram_banks,
            header_checksum,
        };
        let computed = Self::compute_checksum(rom);
        if computed != header_checksum {
            warn!(
                "Header checksum mismatch for \"{}\": header says 0x{header_checksum:0>2X}, computed 0x{computed:0>2X}",
                digest.title
            );
        }
        Ok(digest)
    }

    /// Computes the header checksum the boot ROM verifies.
    pub fn compute_checksum(rom: &[u8]) -> u8 {
        rom[0x134..Self::CHECKSUM_ADDR]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_sub(*b).wrapping_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_rom(kind: u8, rom_code: u8, ram_code: u8) -> Vec<u8> {
        let mut rom = vec![0; 0x8000];
        rom[0x134..0x139].copy_from_slice(b"SHADE");
        rom[CartridgeHeader::KIND_ADDR] = kind;
        rom[CartridgeHeader::ROM_SIZE_ADDR] = rom_code;
        rom[CartridgeHeader::RAM_SIZE_ADDR] = ram_code;
        rom[CartridgeHeader::CHECKSUM_ADDR] = CartridgeHeader::compute_checksum(&rom);
        rom
    }

    #[test]
    fn rom_codes() {
        let expected = [2, 4, 8, 16, 32, 64, 128, 256, 512];
        for (code, banks) in expected.into_iter().enumerate() {
            assert_eq!(rom_bank_count(code as u8), Ok(banks));
        }
        assert_eq!(rom_bank_count(0x52), Ok(72));
        assert_eq!(rom_bank_count(0x53), Ok(80));
        assert_eq!(rom_bank_count(0x54), Ok(96));
        assert_eq!(
            rom_bank_count(0x09),
            Err(Error::UnsupportedRomSize { code: 0x09 })
        );
    }

    #[test]
    fn ram_codes() {
        assert_eq!(ram_bank_count(0), Ok(0));
        assert_eq!(ram_bank_count(1), Ok(1));
        assert_eq!(ram_bank_count(2), Ok(1));
        assert_eq!(ram_bank_count(3), Ok(4));
        assert_eq!(ram_bank_count(4), Ok(16));
        assert_eq!(ram_bank_count(5), Ok(8));
        assert_eq!(
            ram_bank_count(6),
            Err(Error::UnsupportedRamSize { code: 6 })
        );
    }

    #[test]
    fn every_cartridge_type() {
        for kind in 0..=u8::MAX {
            let expected = match kind {
                0x00 | 0x08 | 0x09 => Some(ControllerKind::RomOnly),
                0x01..=0x03 => Some(ControllerKind::MBC1),
                0x05 | 0x06 => Some(ControllerKind::MBC2),
                0x0F..=0x10 => Some(ControllerKind::MBC3 { timer: true }),
                0x11..=0x13 => Some(ControllerKind::MBC3 { timer: false }),
                0x19..=0x1E => Some(ControllerKind::MBC5),
                _ => None,
            };
            match expected {
                Some(ctrl) => assert_eq!(ControllerKind::from_byte(kind), Ok(ctrl)),
                None => assert_eq!(
                    ControllerKind::from_byte(kind),
                    Err(Error::UnsupportedCartridgeType { kind })
                ),
            }
        }
    }

    #[test]
    fn header_extraction() {
        let rom = blank_rom(0x03, 0x01, 0x03);
        let header = CartridgeHeader::extract_from_rom(&rom).unwrap();
        assert_eq!(header.title, "SHADE");
        assert_eq!(header.controller, ControllerKind::MBC1);
        assert_eq!(header.rom_banks, 4);
        assert_eq!(header.ram_banks, 4);
    }

    #[test]
    fn short_image_has_no_header() {
        let rom = vec![0; 0x14F];
        assert_eq!(
            CartridgeHeader::extract_from_rom(&rom),
            Err(Error::TruncatedCartridge { len: 0x14F })
        );
    }

    #[test]
    fn bad_type_is_reported() {
        let rom = blank_rom(0xFC, 0x00, 0x00);
        assert_eq!(
            CartridgeHeader::extract_from_rom(&rom),
            Err(Error::UnsupportedCartridgeType { kind: 0xFC })
        );
    }
}
