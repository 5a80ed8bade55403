use std::fmt::Debug;
use std::ops::Index;
use std::ops::IndexMut;

mod direct;
mod mbc1;
mod mbc2;
mod mbc3;
mod mbc5;

pub use direct::*;
pub use mbc1::*;
pub use mbc2::*;
pub use mbc3::*;
pub use mbc5::*;
use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::info;
use tracing::warn;

use crate::rom::CartridgeHeader;
use crate::rom::ControllerKind;
use crate::Error;

/// The size of a ROM banks, 16 KiB.
pub const ROM_BANK_SIZE: usize = 16 * 1024;

/// The size of a RAM banks, 8 KiB.
pub const RAM_BANK_SIZE: usize = 8 * 1024;

pub type RomBank = Bank<ROM_BANK_SIZE>;
pub type RamBank = Bank<RAM_BANK_SIZE>;

/// A fixed-size chunk of cartridge memory. The length is always `N`.
#[serde_as]
#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank<const N: usize>(#[serde_as(as = "serde_with::Bytes")] Vec<u8>);

impl<const N: usize> Bank<N> {
    pub fn new() -> Self {
        Self(vec![0; N])
    }

    /// Copies up to `N` bytes out of the given data. Anything short of `N` is zero-filled.
    pub fn from_slice(data: &[u8]) -> Self {
        let mut digest = Self::new();
        let len = std::cmp::min(N, data.len());
        digest.0[..len].copy_from_slice(&data[..len]);
        digest
    }
}

impl<const N: usize> Default for Bank<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Index<usize> for Bank<N> {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const N: usize> IndexMut<usize> for Bank<N> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const N: usize> FromIterator<u8> for Bank<N> {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        let mut digest = Self::new();
        digest
            .0
            .iter_mut()
            .zip(iter)
            .for_each(|(dest, src)| *dest = src);
        digest
    }
}

impl<const N: usize> Debug for Bank<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bank({N} bytes)")
    }
}

/// Splits a (padded) cartridge image into its ROM banks.
pub(crate) fn split_rom(cart: &[u8], count: usize) -> Box<[RomBank]> {
    (0..count)
        .map(|i| i * ROM_BANK_SIZE)
        .map(|start| cart.get(start..).map(RomBank::from_slice).unwrap_or_default())
        .collect()
}

pub(crate) fn blank_ram(count: usize) -> Box<[RamBank]> {
    vec![RamBank::new(); count].into()
}

#[derive(Debug, Hash, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryBankController {
    /// There is no external MBC. The game ROM is mapped into the 32 KiB that starts at 0x0000 and
    /// extends to 0x7FFF. An additional 8 KiB of RAM could be connected. This 8 KiB starts at
    /// 0xA000 and extends to 0xBFFF.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/nombc.html).
    Direct(Direct),
    /// This memory controller is the first MBC chip. It supports up to 2 MiB of ROM and 32 KiB of
    /// RAM, but not both at once.
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC1.html).
    MBC1(MBC1),
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC2.html).
    MBC2(MBC2),
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC3.html).
    MBC3(MBC3),
    ///
    /// See the Pan Docs [here](https://gbdev.io/pandocs/MBC5.html).
    MBC5(MBC5),
}

impl MemoryBankController {
    /// Decodes the cartridge header and builds the controller it asks for. Images shorter than
    /// the declared ROM size are zero-padded.
    pub fn new(mut cart: Vec<u8>) -> Result<Self, Error> {
        let header = CartridgeHeader::extract_from_rom(&cart)?;
        let rom_size = header.rom_banks * ROM_BANK_SIZE;
        if rom_size > cart.len() {
            warn!(
                "Cartridge image is {} bytes, but the header declares {rom_size} bytes. Padding with zeros.",
                cart.len()
            );
            cart.resize(rom_size, 0);
        }
        info!(
            "Loading \"{}\": {} with {} ROM banks and {} RAM banks",
            header.title, header.controller, header.rom_banks, header.ram_banks
        );
        let digest = match header.controller {
            ControllerKind::RomOnly => Self::Direct(Direct::new(&cart, header.ram_banks)),
            ControllerKind::MBC1 => {
                Self::MBC1(MBC1::new(header.rom_banks, header.ram_banks, &cart))
            }
            ControllerKind::MBC2 => Self::MBC2(MBC2::new(header.rom_banks, &cart)),
            ControllerKind::MBC3 { timer } => Self::MBC3(MBC3::new(
                header.rom_banks,
                header.ram_banks,
                timer,
                &cart,
            )),
            ControllerKind::MBC5 => {
                Self::MBC5(MBC5::new(header.rom_banks, header.ram_banks, &cart))
            }
        };
        Ok(digest)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MemoryBankController::Direct(_) => "ROM-only",
            MemoryBankController::MBC1(_) => "MBC1",
            MemoryBankController::MBC2(_) => "MBC2",
            MemoryBankController::MBC3(_) => "MBC3",
            MemoryBankController::MBC5(_) => "MBC5",
        }
    }

    /// Reads from one of the two cartridge windows, 0x0000-0x7FFF or 0xA000-0xBFFF.
    pub(crate) fn read_byte(&self, index: u16) -> Result<u8, Error> {
        match self {
            MemoryBankController::Direct(controller) => Ok(controller.read_byte(index)),
            MemoryBankController::MBC1(controller) => Ok(controller.read_byte(index)),
            MemoryBankController::MBC2(controller) => Ok(controller.read_byte(index)),
            MemoryBankController::MBC3(controller) => controller.read_byte(index),
            MemoryBankController::MBC5(controller) => Ok(controller.read_byte(index)),
        }
    }

    /// Writes into one of the two cartridge windows. Writes below 0x8000 land in the controller's
    /// registers rather than in ROM.
    pub(crate) fn write_byte(&mut self, index: u16, value: u8) -> Result<(), Error> {
        match self {
            MemoryBankController::Direct(controller) => controller.write_byte(index, value),
            MemoryBankController::MBC1(controller) => controller.write_byte(index, value),
            MemoryBankController::MBC2(controller) => controller.write_byte(index, value),
            MemoryBankController::MBC3(controller) => return controller.write_byte(index, value),
            MemoryBankController::MBC5(controller) => controller.write_byte(index, value),
        }
        Ok(())
    }
}
