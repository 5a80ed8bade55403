use serde::Deserialize;
use serde::Serialize;

use crate::rom::ControllerKind;

/// Every fatal condition the core can report. None of these are retried internally. Once one is
/// returned from a step, the emulated state can no longer be trusted to match the hardware, so it
/// is up to the caller to stop (or to inspect the state for debugging).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::Error,
    Serialize,
    Deserialize,
)]
pub enum Error {
    /// The opcode decoded to a table entry whose semantics have not been written.
    #[display("unimplemented opcode 0x{opcode:0>2X} (prefixed: {prefixed}) @ 0x{addr:0>4X}")]
    UnimplementedOpcode { opcode: u8, prefixed: bool, addr: u16 },
    /// The opcode is one of the byte values the instruction set reserves as never valid.
    #[display("illegal opcode 0x{opcode:0>2X} @ 0x{addr:0>4X}")]
    IllegalOpcode { opcode: u8, addr: u16 },
    /// An address past the end of the addressable space reached a bus.
    #[display("address 0x{addr:X} is outside of the addressable range")]
    AddressOutOfRange { addr: usize },
    /// The cartridge-type header byte does not map to a known memory bank controller.
    #[display("unsupported cartridge type 0x{kind:0>2X}")]
    UnsupportedCartridgeType { kind: u8 },
    /// The ROM-size header byte is not a known code.
    #[display("unsupported ROM size code 0x{code:0>2X}")]
    UnsupportedRomSize { code: u8 },
    /// The RAM-size header byte is not a known code.
    #[display("unsupported RAM size code 0x{code:0>2X}")]
    UnsupportedRamSize { code: u8 },
    /// The cartridge image is too short to even contain a header.
    #[display("cartridge image is only {len} bytes long and does not contain a header")]
    TruncatedCartridge { len: usize },
    /// A cartridge-owned window was accessed while no cartridge is inserted.
    #[display("no cartridge is loaded to service an access to 0x{addr:0>4X}")]
    MbcNotPresent { addr: u16 },
    /// The cartridge was accepted, but the running software touched a piece of its controller
    /// that is not emulated.
    #[display("{mbc} does not support {feature} (access to 0x{addr:0>4X})")]
    UnsupportedMbcFeature {
        mbc: ControllerKind,
        feature: MbcFeature,
        addr: u16,
    },
    /// Two instruction descriptors claimed the same opcode while building a table.
    #[display("opcode 0x{opcode:0>2X} (prefixed: {prefixed}) was defined twice")]
    DuplicateOpcode { opcode: u8, prefixed: bool },
}

/// The parts of a memory bank controller that are recognized but not emulated.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
pub enum MbcFeature {
    #[display("the real-time clock registers")]
    ClockRegisters,
    #[display("latching the real-time clock")]
    ClockLatch,
}
