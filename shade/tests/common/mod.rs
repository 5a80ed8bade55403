#![allow(dead_code)]

use shade::mem::ROM_BANK_SIZE;
use shade::rom::rom_bank_count;
use shade::rom::CartridgeHeader;

/// Builds a full cartridge image with a valid header. The first byte of every bank holds the
/// low byte of the bank's index and the second holds the high byte.
pub fn cartridge(kind: u8, rom_code: u8, ram_code: u8) -> Vec<u8> {
    let banks = rom_bank_count(rom_code).unwrap();
    let mut cart = vec![0u8; banks * ROM_BANK_SIZE];
    for bank in 0..banks {
        cart[bank * ROM_BANK_SIZE] = bank as u8;
        cart[bank * ROM_BANK_SIZE + 1] = (bank >> 8) as u8;
    }
    cart[CartridgeHeader::TITLE][..5].copy_from_slice(b"SHADE");
    cart[CartridgeHeader::KIND_ADDR] = kind;
    cart[CartridgeHeader::ROM_SIZE_ADDR] = rom_code;
    cart[CartridgeHeader::RAM_SIZE_ADDR] = ram_code;
    cart[CartridgeHeader::CHECKSUM_ADDR] = CartridgeHeader::compute_checksum(&cart);
    cart
}

/// A ROM-only cartridge with the program placed at the entry point, 0x0100.
pub fn with_program(program: &[u8]) -> Vec<u8> {
    let mut cart = cartridge(0x00, 0x00, 0x00);
    cart[0x0100..0x0100 + program.len()].copy_from_slice(program);
    cart
}
