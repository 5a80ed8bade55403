use super::*;

/// Rotate left. Bit 7 goes to both the carry and bit 0.
pub fn rotate_left(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.rotate_left(1);
    set_shift_flags(digest, val & 0x80 != 0, flags);
    digest
}

/// Rotate right. Bit 0 goes to both the carry and bit 7.
pub fn rotate_right(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.rotate_right(1);
    set_shift_flags(digest, val & 0x01 != 0, flags);
    digest
}

/// Rotate left through the carry.
pub fn rotate_left_carry(val: u8, flags: &mut Flags) -> u8 {
    let digest = (val << 1) | flags.c as u8;
    set_shift_flags(digest, val & 0x80 != 0, flags);
    digest
}

/// Rotate right through the carry.
pub fn rotate_right_carry(val: u8, flags: &mut Flags) -> u8 {
    let digest = (val >> 1) | ((flags.c as u8) << 7);
    set_shift_flags(digest, val & 0x01 != 0, flags);
    digest
}

pub fn shift_left_arithmetic(val: u8, flags: &mut Flags) -> u8 {
    let digest = val << 1;
    set_shift_flags(digest, val & 0x80 != 0, flags);
    digest
}

/// Bit 7 is kept.
pub fn shift_right_arithmetic(val: u8, flags: &mut Flags) -> u8 {
    let digest = (val >> 1) | (val & 0x80);
    set_shift_flags(digest, val & 0x01 != 0, flags);
    digest
}

pub fn shift_right_logical(val: u8, flags: &mut Flags) -> u8 {
    let digest = val >> 1;
    set_shift_flags(digest, val & 0x01 != 0, flags);
    digest
}

pub fn swap_nibbles(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.rotate_left(4);
    set_shift_flags(digest, false, flags);
    digest
}

fn set_shift_flags(digest: u8, carry: bool, flags: &mut Flags) {
    *flags = Flags {
        z: digest == 0,
        n: false,
        h: false,
        c: carry,
    };
}

/// Applies a byte operation to the value at the first operand and writes it back.
fn modify(
    cpu: &Cpu,
    mem: &dyn MemoryLike,
    ops: &[Resolved],
    op: fn(u8, &mut Flags) -> u8,
) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let val = op(source_byte(cpu, mem, ops, 0)?, &mut flags);
    Ok(Outcome::new(flags).with(destination(ops).write_byte(val)))
}

/// The unprefixed rotates always work on A and take no operands.
fn modify_a(cpu: &Cpu, op: fn(u8, &mut Flags) -> u8) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let val = op(cpu.a.0, &mut flags);
    Ok(Outcome::new(flags).with(Commit::Reg(HalfRegister::A, val)))
}

pub fn rlca(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    modify_a(cpu, rotate_left)
}

pub fn rrca(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    modify_a(cpu, rotate_right)
}

pub fn rla(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    modify_a(cpu, rotate_left_carry)
}

pub fn rra(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    modify_a(cpu, rotate_right_carry)
}

pub fn rlc(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    modify(cpu, mem, ops, rotate_left)
}

pub fn rrc(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    modify(cpu, mem, ops, rotate_right)
}

pub fn rl(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    modify(cpu, mem, ops, rotate_left_carry)
}

pub fn rr(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    modify(cpu, mem, ops, rotate_right_carry)
}

pub fn sla(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    modify(cpu, mem, ops, shift_left_arithmetic)
}

pub fn sra(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    modify(cpu, mem, ops, shift_right_arithmetic)
}

pub fn swap(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    modify(cpu, mem, ops, swap_nibbles)
}

pub fn srl(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    modify(cpu, mem, ops, shift_right_logical)
}
