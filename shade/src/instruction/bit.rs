use crate::cpu::check_bit;

use super::*;

fn bit_index(ops: &[Resolved]) -> u8 {
    match ops.first() {
        Some(Resolved::Bit(b)) if *b < 8 => *b,
        _ => unreachable!("Bit operations lead with a bit index: {ops:?}"),
    }
}

/// BIT b,r. Z is set when the bit is clear.
pub fn bit(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let b = bit_index(ops);
    let val = source_byte(cpu, mem, ops, 1)?;
    let flags = Flags {
        z: !check_bit(b, val),
        n: false,
        h: true,
        c: cpu.carry_flag(),
    };
    Ok(Outcome::new(flags))
}

/// RES b,r
pub fn res(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let b = bit_index(ops);
    let val = source_byte(cpu, mem, ops, 1)? & !(1 << b);
    Ok(Outcome::new(*cpu.flags()).with(target(ops).write_byte(val)))
}

/// SET b,r
pub fn set(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let b = bit_index(ops);
    let val = source_byte(cpu, mem, ops, 1)? | (1 << b);
    Ok(Outcome::new(*cpu.flags()).with(target(ops).write_byte(val)))
}

fn target(ops: &[Resolved]) -> Location {
    match ops.get(1).and_then(Resolved::location) {
        Some(loc) => loc,
        None => unreachable!("Bit operations need a target: {ops:?}"),
    }
}

#[cfg(test)]
mod tests {
    use std::num::Wrapping;

    use super::*;

    #[test]
    fn every_bit_of_every_byte() {
        let mem = vec![0u8; 0x10000];
        let mut cpu = Cpu::new();
        let reg = Resolved::At(Location::Reg(HalfRegister::D));
        for val in 0..=u8::MAX {
            cpu.d = Wrapping(val);
            for b in 0..8 {
                let ops = [Resolved::Bit(b), reg];
                let out = bit(&cpu, &mem, &ops).unwrap();
                assert_eq!(out.flags.z, val & (1 << b) == 0);
                assert!(out.flags.h);
                assert!(out.commits.is_empty());

                let out = res(&cpu, &mem, &ops).unwrap();
                assert_eq!(out.commits[0], Commit::Reg(HalfRegister::D, val & !(1 << b)));

                let out = set(&cpu, &mem, &ops).unwrap();
                assert_eq!(out.commits[0], Commit::Reg(HalfRegister::D, val | (1 << b)));
            }
        }
    }

    #[test]
    fn through_memory() {
        let mut mem = vec![0u8; 0x10000];
        mem[0xC000] = 0b1000_0000;
        let cpu = Cpu::new();
        let ops = [Resolved::Bit(7), Resolved::At(Location::Mem(0xC000))];
        assert!(!bit(&cpu, &mem, &ops).unwrap().flags.z);
        let out = res(&cpu, &mem, &ops).unwrap();
        assert_eq!(out.commits[0], Commit::Mem(0xC000, 0));
    }
}
