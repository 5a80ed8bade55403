mod common;

use common::cartridge;
use shade::mem::MemoryBankController;
use shade::mem::MemoryLike;
use shade::mem::MemoryMap;
use shade::mem::ROM_BANK_SIZE;
use shade::rom::CartridgeHeader;
use shade::rom::ControllerKind;
use shade::Error;
use shade::Gameboy;
use shade::MbcFeature;

#[test_log::test]
fn header_decoding() {
    let cart = cartridge(0x13, 0x02, 0x03);
    let header = CartridgeHeader::extract_from_rom(&cart).unwrap();
    assert_eq!(header.title, "SHADE");
    assert_eq!(header.controller, ControllerKind::MBC3 { timer: false });
    assert_eq!(header.rom_banks, 8);
    assert_eq!(header.ram_banks, 4);
    assert_eq!(header.header_checksum, CartridgeHeader::compute_checksum(&cart));
}

#[test]
fn controller_selection() {
    let cases = [
        (0x00, "ROM-only"),
        (0x09, "ROM-only"),
        (0x01, "MBC1"),
        (0x03, "MBC1"),
        (0x05, "MBC2"),
        (0x0F, "MBC3"),
        (0x13, "MBC3"),
        (0x19, "MBC5"),
        (0x1E, "MBC5"),
    ];
    for (kind, name) in cases {
        let mbc = MemoryBankController::new(cartridge(kind, 0x01, 0x02)).unwrap();
        assert_eq!(mbc.name(), name, "cartridge type 0x{kind:0>2X}");
    }
}

#[test]
fn loader_rejects_bad_headers() {
    assert_eq!(
        MemoryBankController::new(cartridge(0x20, 0x00, 0x00)).err(),
        Some(Error::UnsupportedCartridgeType { kind: 0x20 })
    );

    let mut cart = cartridge(0x01, 0x00, 0x00);
    cart[CartridgeHeader::ROM_SIZE_ADDR] = 0x09;
    assert_eq!(
        MemoryBankController::new(cart).err(),
        Some(Error::UnsupportedRomSize { code: 0x09 })
    );

    let mut cart = cartridge(0x01, 0x00, 0x00);
    cart[CartridgeHeader::RAM_SIZE_ADDR] = 0x06;
    assert_eq!(
        MemoryBankController::new(cart).err(),
        Some(Error::UnsupportedRamSize { code: 0x06 })
    );

    assert_eq!(
        MemoryBankController::new(vec![0; 0x100]).err(),
        Some(Error::TruncatedCartridge { len: 0x100 })
    );
    assert!(Gameboy::new(vec![0; 0x14F]).is_err());
}

#[test_log::test]
fn short_images_are_padded() {
    let mut cart = cartridge(0x01, 0x01, 0x00);
    cart.truncate(0x150);
    let mem = MemoryMap::with_cartridge(cart).unwrap();
    assert_eq!(mem.read_byte(0x0147), Ok(0x01));
    assert_eq!(mem.read_byte(0x4000), Ok(0x00));
    assert_eq!(mem.read_byte(0x7FFF), Ok(0x00));
}

#[test]
fn empty_slot() {
    let mut mem = MemoryMap::new();
    assert_eq!(mem.read_byte(0x0000), Err(Error::MbcNotPresent { addr: 0x0000 }));
    assert_eq!(
        mem.write_byte(0xA000, 0x01),
        Err(Error::MbcNotPresent { addr: 0xA000 })
    );
    // Everything the CPU owns still works
    assert_eq!(mem.write_byte(0xC000, 0x01), Ok(()));
    assert_eq!(mem.read_byte(0xE000), Ok(0x01));
    mem.load_cartridge(cartridge(0x00, 0x00, 0x00)).unwrap();
    assert_eq!(mem.read_byte(0x0147), Ok(0x00));
}

#[test]
fn mbc1_bank_zero_is_bank_one() {
    let mut mem = MemoryMap::with_cartridge(cartridge(0x01, 0x01, 0x00)).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(1));
    mem.write_byte(0x2000, 0x00).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(1));
    mem.write_byte(0x2000, 0x02).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(2));
    // Only four banks are present
    mem.write_byte(0x2000, 0x07).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(3));
    assert_eq!(mem.read_byte(0x0000), Ok(0));
}

#[test]
fn mbc1_ram_enable() {
    let mut mem = MemoryMap::with_cartridge(cartridge(0x03, 0x01, 0x02)).unwrap();
    assert_eq!(mem.read_byte(0xA000), Ok(0xFF));
    mem.write_byte(0xA000, 0x42).unwrap();
    assert_eq!(mem.read_byte(0xA000), Ok(0xFF));

    mem.write_byte(0x0000, 0x0A).unwrap();
    mem.write_byte(0xA000, 0x42).unwrap();
    assert_eq!(mem.read_byte(0xA000), Ok(0x42));

    mem.write_byte(0x0000, 0x00).unwrap();
    assert_eq!(mem.read_byte(0xA000), Ok(0xFF));
    mem.write_byte(0x1FFF, 0x1A).unwrap();
    assert_eq!(mem.read_byte(0xA000), Ok(0x42));
}

#[test]
fn mbc2_ram_is_nibbles() {
    let mut mem = MemoryMap::with_cartridge(cartridge(0x06, 0x01, 0x00)).unwrap();
    mem.write_byte(0x0000, 0x0A).unwrap();
    mem.write_byte(0xA000, 0xAB).unwrap();
    assert_eq!(mem.read_byte(0xA000), Ok(0xFB));
    // The 512 cells repeat through the window
    assert_eq!(mem.read_byte(0xA200), Ok(0xFB));
    // ROM bank select ignores values without bit 4
    mem.write_byte(0x2000, 0x02).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(1));
    mem.write_byte(0x2000, 0x12).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(2));
}

#[test]
fn mbc3_clock_needs_a_timer() {
    let mut mem = MemoryMap::with_cartridge(cartridge(0x13, 0x02, 0x03)).unwrap();
    mem.write_byte(0x2000, 0x05).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(5));
    mem.write_byte(0x0000, 0x0A).unwrap();
    mem.write_byte(0x4000, 0x08).unwrap();
    assert_eq!(mem.read_byte(0xA000), Ok(0xFF));
    assert_eq!(mem.write_byte(0x6000, 0x01), Ok(()));

    let mut mem = MemoryMap::with_cartridge(cartridge(0x10, 0x02, 0x03)).unwrap();
    mem.write_byte(0x0000, 0x0A).unwrap();
    mem.write_byte(0x4000, 0x08).unwrap();
    assert!(matches!(
        mem.read_byte(0xA000),
        Err(Error::UnsupportedMbcFeature {
            mbc: ControllerKind::MBC3 { timer: true },
            feature: MbcFeature::ClockRegisters,
            ..
        })
    ));
    assert!(matches!(
        mem.write_byte(0x6000, 0x01),
        Err(Error::UnsupportedMbcFeature {
            feature: MbcFeature::ClockLatch,
            addr: 0x6000,
            ..
        })
    ));
}

#[test]
fn mbc5_nine_bit_banks() {
    let mut mem = MemoryMap::with_cartridge(cartridge(0x19, 0x08, 0x00)).unwrap();
    assert_eq!(mem.mbc().map(MemoryBankController::name), Some("MBC5"));
    mem.write_byte(0x2000, 0x00).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(0));
    mem.write_byte(0x2000, 0x34).unwrap();
    mem.write_byte(0x3000, 0x01).unwrap();
    assert_eq!(mem.read_byte(0x4000), Ok(0x34));
    assert_eq!(mem.read_byte(0x4001), Ok(0x01));
    assert_eq!(
        mem.get(ROM_BANK_SIZE),
        Ok(0x34),
    );
}
