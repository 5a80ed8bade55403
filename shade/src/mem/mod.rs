mod mbc;

pub use mbc::*;

use serde::Deserialize;
use serde::Serialize;
use serde_with::serde_as;
use tracing::error;
use tracing::trace;

use crate::Error;

/// This trait is used to abstract over the memory map. This is used during testing and by the
/// instruction handlers, which only ever see a `&dyn MemoryLike`.
pub trait MemoryLike {
    fn read_byte(&self, addr: u16) -> Result<u8, Error>;

    fn write_byte(&mut self, addr: u16, val: u8) -> Result<(), Error>;

    /// Reads a little-endian word, low byte first.
    fn read_word(&self, addr: u16) -> Result<u16, Error> {
        let lo = self.read_byte(addr)?;
        let hi = self.read_byte(addr.wrapping_add(1))?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Writes a little-endian word, low byte first.
    fn write_word(&mut self, addr: u16, val: u16) -> Result<(), Error> {
        let [lo, hi] = val.to_le_bytes();
        self.write_byte(addr, lo)?;
        self.write_byte(addr.wrapping_add(1), hi)
    }
}

/// A flat bus. Every address past the end of the vector is out of range.
impl MemoryLike for Vec<u8> {
    fn read_byte(&self, addr: u16) -> Result<u8, Error> {
        self.get(addr as usize)
            .copied()
            .ok_or(Error::AddressOutOfRange {
                addr: addr as usize,
            })
    }

    fn write_byte(&mut self, addr: u16, val: u8) -> Result<(), Error> {
        let cell = self.get_mut(addr as usize).ok_or(Error::AddressOutOfRange {
            addr: addr as usize,
        })?;
        *cell = val;
        Ok(())
    }
}

/// The I/O registers as the boot ROM leaves them, as `(address, value)` pairs. Everything else in
/// the region is zero.
pub static POST_BOOT_IO: &[(u16, u8)] = &[
    // Timer
    (0xFF05, 0x00),
    (0xFF06, 0x00),
    (0xFF07, 0x00),
    // Sound
    (0xFF10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF17, 0x00),
    (0xFF19, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1E, 0xBF),
    (0xFF20, 0xFF),
    (0xFF21, 0x00),
    (0xFF22, 0x00),
    (0xFF23, 0xBF),
    (0xFF24, 0x77),
    (0xFF25, 0xF3),
    (0xFF26, 0xF1),
    // LCD
    (0xFF40, 0x91),
    (0xFF42, 0x00),
    (0xFF43, 0x00),
    (0xFF45, 0x00),
    (0xFF47, 0xFC),
    (0xFF48, 0xFF),
    (0xFF49, 0xFF),
    (0xFF4A, 0x00),
    (0xFF4B, 0x00),
];

/// The unified 16-bit address space. The cartridge windows (0x0000-0x7FFF and 0xA000-0xBFFF) are
/// delegated to the memory bank controller, if there is one. Everything else is owned here.
#[serde_as]
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMap {
    // The MBC
    mbc: Option<MemoryBankController>,
    // The video RAM
    #[serde_as(as = "serde_with::Bytes")]
    vram: [u8; 0x2000],
    // The working RAM
    #[serde(serialize_with = "crate::utils::serialize_slices_as_one")]
    #[serde(deserialize_with = "crate::utils::deserialize_slices_as_one")]
    wram: [[u8; 0x1000]; 2],
    // Object attribute memory
    #[serde_as(as = "serde_with::Bytes")]
    oam: [u8; 0xA0],
    #[serde_as(as = "serde_with::Bytes")]
    io: [u8; 0x80],
    // High RAM
    #[serde_as(as = "serde_with::Bytes")]
    hr: [u8; 0x7F],
    /// The interrupt enable register. Bits 0-4 flag where or not certain interrupt handlers can be
    /// called.
    ///  - Bit 0 corresponds to the VBlank interrupt
    ///  - Bit 1 corresponds to the LCD interrupt
    ///  - Bit 2 corresponds to the timer interrupt
    ///  - Bit 3 corresponds to the serial interrupt
    ///  - Bit 4 corresponds to the joypad interrupt
    /// When indexed, this register is at 0xFFFF.
    pub ie: u8,
}

impl MemoryMap {
    /// A memory map with no cartridge inserted. All internal memory is zeroed.
    pub fn new() -> Self {
        Self {
            mbc: None,
            vram: [0; 0x2000],
            wram: [[0; 0x1000]; 2],
            oam: [0; 0xA0],
            io: [0; 0x80],
            hr: [0; 0x7F],
            ie: 0,
        }
    }

    /// Constructs a memory map with the given cartridge inserted.
    pub fn with_cartridge(cart: Vec<u8>) -> Result<Self, Error> {
        let mut digest = Self::new();
        digest.load_cartridge(cart)?;
        Ok(digest)
    }

    /// Decodes the cartridge and replaces whatever controller was inserted before.
    pub fn load_cartridge(&mut self, cart: Vec<u8>) -> Result<(), Error> {
        self.mbc = Some(MemoryBankController::new(cart)?);
        Ok(())
    }

    pub fn mbc(&self) -> Option<&MemoryBankController> {
        self.mbc.as_ref()
    }

    /// Sets the I/O registers to the values the boot ROM leaves behind.
    pub fn post_boot_io(&mut self) {
        for (addr, val) in POST_BOOT_IO.iter().copied() {
            self.io[(addr - 0xFF00) as usize] = val;
        }
        self.ie = 0;
    }

    fn cart_read(&self, addr: u16) -> Result<u8, Error> {
        match &self.mbc {
            Some(mbc) => mbc.read_byte(addr),
            None => Err(no_cartridge(addr)),
        }
    }

    fn cart_write(&mut self, addr: u16, val: u8) -> Result<(), Error> {
        match &mut self.mbc {
            Some(mbc) => mbc.write_byte(addr, val),
            None => Err(no_cartridge(addr)),
        }
    }

    /// Reads by a host-sized address, for tooling that does its own address arithmetic.
    pub fn get(&self, addr: usize) -> Result<u8, Error> {
        let addr = u16::try_from(addr).map_err(|_| Error::AddressOutOfRange { addr })?;
        self.read_byte(addr)
    }

    /// Writes by a host-sized address, for tooling that does its own address arithmetic.
    pub fn set(&mut self, addr: usize, val: u8) -> Result<(), Error> {
        let addr = u16::try_from(addr).map_err(|_| Error::AddressOutOfRange { addr })?;
        self.write_byte(addr, val)
    }
}

fn no_cartridge(addr: u16) -> Error {
    let err = Error::MbcNotPresent { addr };
    error!("{err}");
    err
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLike for MemoryMap {
    fn read_byte(&self, addr: u16) -> Result<u8, Error> {
        let digest = match addr {
            n @ 0x0000..=0x7FFF => self.cart_read(n)?,
            n @ 0x8000..=0x9FFF => self.vram[(n - 0x8000) as usize],
            n @ 0xA000..=0xBFFF => self.cart_read(n)?,
            n @ 0xC000..=0xCFFF => self.wram[0][(n - 0xC000) as usize],
            n @ 0xD000..=0xDFFF => self.wram[1][(n - 0xD000) as usize],
            // Echo RAM
            n @ 0xE000..=0xEFFF => self.wram[0][(n - 0xE000) as usize],
            n @ 0xF000..=0xFDFF => self.wram[1][(n - 0xF000) as usize],
            n @ 0xFE00..=0xFE9F => self.oam[(n - 0xFE00) as usize],
            // NOTE: This region *should not* actually be accessed
            0xFEA0..=0xFEFF => 0xFF,
            n @ 0xFF00..=0xFF7F => self.io[(n - 0xFF00) as usize],
            n @ 0xFF80..=0xFFFE => self.hr[(n - 0xFF80) as usize],
            0xFFFF => self.ie,
        };
        Ok(digest)
    }

    fn write_byte(&mut self, addr: u16, val: u8) -> Result<(), Error> {
        trace!("Write of 0x{val:0>2X} to 0x{addr:0>4X}");
        match addr {
            n @ 0x0000..=0x7FFF => return self.cart_write(n, val),
            n @ 0x8000..=0x9FFF => self.vram[(n - 0x8000) as usize] = val,
            n @ 0xA000..=0xBFFF => return self.cart_write(n, val),
            n @ 0xC000..=0xCFFF => self.wram[0][(n - 0xC000) as usize] = val,
            n @ 0xD000..=0xDFFF => self.wram[1][(n - 0xD000) as usize] = val,
            // Echo RAM
            n @ 0xE000..=0xEFFF => self.wram[0][(n - 0xE000) as usize] = val,
            n @ 0xF000..=0xFDFF => self.wram[1][(n - 0xF000) as usize] = val,
            n @ 0xFE00..=0xFE9F => self.oam[(n - 0xFE00) as usize] = val,
            0xFEA0..=0xFEFF => {}
            n @ 0xFF00..=0xFF7F => self.io[(n - 0xFF00) as usize] = val,
            n @ 0xFF80..=0xFFFE => self.hr[(n - 0xFF80) as usize] = val,
            0xFFFF => self.ie = val,
        }
        Ok(())
    }
}
