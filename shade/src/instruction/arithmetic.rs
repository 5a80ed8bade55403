use super::*;

/// Adds two bytes (and optionally the carry), returning the result and setting every flag.
pub fn add_bytes(a: u8, b: u8, carry: bool, flags: &mut Flags) -> u8 {
    let carry = carry as u8;
    let (digest, c1) = a.overflowing_add(b);
    let (digest, c2) = digest.overflowing_add(carry);
    flags.z = digest == 0;
    flags.n = false;
    flags.h = (a & 0x0F) + (b & 0x0F) + carry > 0x0F;
    flags.c = c1 || c2;
    digest
}

/// Subtracts `b` (and optionally the carry) from `a`, returning the result and setting every
/// flag.
pub fn sub_bytes(a: u8, b: u8, carry: bool, flags: &mut Flags) -> u8 {
    let carry = carry as u8;
    let digest = a.wrapping_sub(b).wrapping_sub(carry);
    flags.z = digest == 0;
    flags.n = true;
    flags.h = (a & 0x0F) < (b & 0x0F) + carry;
    flags.c = (a as u16) < (b as u16) + (carry as u16);
    digest
}

pub fn and_bytes(a: u8, b: u8, flags: &mut Flags) -> u8 {
    let digest = a & b;
    *flags = Flags {
        z: digest == 0,
        n: false,
        h: true,
        c: false,
    };
    digest
}

pub fn or_bytes(a: u8, b: u8, flags: &mut Flags) -> u8 {
    let digest = a | b;
    *flags = Flags {
        z: digest == 0,
        ..Flags::default()
    };
    digest
}

pub fn xor_bytes(a: u8, b: u8, flags: &mut Flags) -> u8 {
    let digest = a ^ b;
    *flags = Flags {
        z: digest == 0,
        ..Flags::default()
    };
    digest
}

/// INC leaves the carry alone.
pub fn inc_byte(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.wrapping_add(1);
    flags.z = digest == 0;
    flags.n = false;
    flags.h = val & 0x0F == 0x0F;
    digest
}

/// DEC leaves the carry alone.
pub fn dec_byte(val: u8, flags: &mut Flags) -> u8 {
    let digest = val.wrapping_sub(1);
    flags.z = digest == 0;
    flags.n = true;
    flags.h = val & 0x0F == 0x00;
    digest
}

/// `ADD HL,rr`. The half carry comes out of bit 11 and the carry out of bit 15. Z is untouched.
pub fn add_words(a: u16, b: u16, flags: &mut Flags) -> u16 {
    let (digest, carry) = a.overflowing_add(b);
    flags.n = false;
    flags.h = (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF;
    flags.c = carry;
    digest
}

/// Adds a signed offset to SP, as used by `ADD SP,r8` and `LD HL,SP+r8`. Both carries are
/// computed on the low byte, treating the offset as unsigned.
pub fn add_signed(sp: u16, offset: i8, flags: &mut Flags) -> u16 {
    let unsigned = offset as u8 as u16;
    flags.z = false;
    flags.n = false;
    flags.h = (sp & 0x000F) + (unsigned & 0x000F) > 0x000F;
    flags.c = (sp & 0x00FF) + unsigned > 0x00FF;
    sp.wrapping_add_signed(offset as i16)
}

/// ADD A,r / ADD HL,rr / ADD SP,r8
pub fn add(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let dest = destination(ops);
    let mut flags = *cpu.flags();
    let commit = match (dest, ops) {
        (Location::Pair(WideReg::SP), [_, Resolved::Offset(e)]) => {
            dest.write_word(add_signed(cpu.sp.0, *e, &mut flags))
        }
        (Location::Pair(pair), [_, src]) => {
            dest.write_word(add_words(cpu.pair(pair), src.word(cpu), &mut flags))
        }
        (_, [dst, _]) => {
            let a = dst.byte(cpu, mem)?;
            let b = source_byte(cpu, mem, ops, 1)?;
            dest.write_byte(add_bytes(a, b, false, &mut flags))
        }
        _ => unreachable!("Malformed ADD: {ops:?}"),
    };
    Ok(Outcome::new(flags).with(commit))
}

pub fn adc(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let b = source_byte(cpu, mem, ops, 1)?;
    let val = add_bytes(cpu.a.0, b, cpu.carry_flag(), &mut flags);
    Ok(Outcome::new(flags).with(Commit::Reg(HalfRegister::A, val)))
}

pub fn sub(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let b = source_byte(cpu, mem, ops, 0)?;
    let val = sub_bytes(cpu.a.0, b, false, &mut flags);
    Ok(Outcome::new(flags).with(Commit::Reg(HalfRegister::A, val)))
}

pub fn sbc(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let b = source_byte(cpu, mem, ops, 1)?;
    let val = sub_bytes(cpu.a.0, b, cpu.carry_flag(), &mut flags);
    Ok(Outcome::new(flags).with(Commit::Reg(HalfRegister::A, val)))
}

pub fn and(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let val = and_bytes(cpu.a.0, source_byte(cpu, mem, ops, 0)?, &mut flags);
    Ok(Outcome::new(flags).with(Commit::Reg(HalfRegister::A, val)))
}

pub fn xor(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let val = xor_bytes(cpu.a.0, source_byte(cpu, mem, ops, 0)?, &mut flags);
    Ok(Outcome::new(flags).with(Commit::Reg(HalfRegister::A, val)))
}

pub fn or(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let val = or_bytes(cpu.a.0, source_byte(cpu, mem, ops, 0)?, &mut flags);
    Ok(Outcome::new(flags).with(Commit::Reg(HalfRegister::A, val)))
}

/// A subtraction that only keeps the flags.
pub fn cp(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    sub_bytes(cpu.a.0, source_byte(cpu, mem, ops, 0)?, false, &mut flags);
    Ok(Outcome::new(flags))
}

/// INC r / INC (HL) / INC rr. The wide form does not touch the flags.
pub fn inc(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let commit = match destination(ops) {
        dest @ Location::Pair(pair) => dest.write_word(cpu.pair(pair).wrapping_add(1)),
        dest => dest.write_byte(inc_byte(source_byte(cpu, mem, ops, 0)?, &mut flags)),
    };
    Ok(Outcome::new(flags).with(commit))
}

/// DEC r / DEC (HL) / DEC rr. The wide form does not touch the flags.
pub fn dec(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let commit = match destination(ops) {
        dest @ Location::Pair(pair) => dest.write_word(cpu.pair(pair).wrapping_sub(1)),
        dest => dest.write_byte(dec_byte(source_byte(cpu, mem, ops, 0)?, &mut flags)),
    };
    Ok(Outcome::new(flags).with(commit))
}

#[cfg(test)]
mod tests {
    use std::num::Wrapping;

    use super::*;

    fn bytes() -> impl Iterator<Item = (u8, u8)> {
        (0..=u8::MAX).flat_map(|a| (0..=u8::MAX).map(move |b| (a, b)))
    }

    #[test]
    fn add_matches_wide_arithmetic() {
        for (a, b) in bytes() {
            for carry in [false, true] {
                let mut flags = Flags::default();
                let val = add_bytes(a, b, carry, &mut flags);
                let wide = a as u16 + b as u16 + carry as u16;
                assert_eq!(val as u16, wide & 0xFF);
                assert_eq!(flags.z, val == 0);
                assert!(!flags.n);
                assert_eq!(flags.h, (a & 0xF) + (b & 0xF) + carry as u8 > 0xF);
                assert_eq!(flags.c, wide > 0xFF);
            }
        }
    }

    #[test]
    fn sub_matches_wide_arithmetic() {
        for (a, b) in bytes() {
            for carry in [false, true] {
                let mut flags = Flags::default();
                let val = sub_bytes(a, b, carry, &mut flags);
                let wide = a as i16 - b as i16 - carry as i16;
                assert_eq!(val, wide as u8);
                assert_eq!(flags.z, val == 0);
                assert!(flags.n);
                assert_eq!(
                    flags.h,
                    (a & 0xF) as i16 - (b & 0xF) as i16 - (carry as i16) < 0
                );
                assert_eq!(flags.c, wide < 0);
            }
        }
    }

    #[test]
    fn wraparound_boundaries() {
        let mut flags = Flags::default();
        assert_eq!(add_bytes(0xFF, 0x01, false, &mut flags), 0x00);
        assert!(flags.z && flags.h && flags.c);
        assert_eq!(add_bytes(0x0F, 0x01, false, &mut flags), 0x10);
        assert!(!flags.z && flags.h && !flags.c);
        assert_eq!(sub_bytes(0x00, 0x01, false, &mut flags), 0xFF);
        assert!(!flags.z && flags.h && flags.c);
        assert_eq!(sub_bytes(0x10, 0x10, false, &mut flags), 0x00);
        assert!(flags.z && !flags.h && !flags.c);
    }

    #[test]
    fn logic_ops() {
        for (a, b) in bytes() {
            let mut flags = Flags::default();
            assert_eq!(and_bytes(a, b, &mut flags), a & b);
            assert_eq!(flags.as_byte(), if a & b == 0 { 0xA0 } else { 0x20 });
            assert_eq!(or_bytes(a, b, &mut flags), a | b);
            assert_eq!(flags.as_byte(), if a | b == 0 { 0x80 } else { 0x00 });
            assert_eq!(xor_bytes(a, b, &mut flags), a ^ b);
            assert_eq!(flags.as_byte(), if a ^ b == 0 { 0x80 } else { 0x00 });
        }
    }

    #[test]
    fn inc_dec_keep_carry() {
        for val in 0..=u8::MAX {
            for carry in [false, true] {
                let mut flags = Flags {
                    c: carry,
                    ..Flags::default()
                };
                assert_eq!(inc_byte(val, &mut flags), val.wrapping_add(1));
                assert_eq!(flags.z, val == 0xFF);
                assert_eq!(flags.h, val & 0xF == 0xF);
                assert!(!flags.n);
                assert_eq!(flags.c, carry);

                assert_eq!(dec_byte(val, &mut flags), val.wrapping_sub(1));
                assert_eq!(flags.z, val == 0x01);
                assert_eq!(flags.h, val & 0xF == 0x0);
                assert!(flags.n);
                assert_eq!(flags.c, carry);
            }
        }
    }

    #[test]
    fn add_words_boundaries() {
        let mut flags = Flags {
            z: true,
            ..Flags::default()
        };
        assert_eq!(add_words(0x0FFF, 0x0001, &mut flags), 0x1000);
        assert!(flags.h && !flags.c && flags.z);
        assert_eq!(add_words(0xFFFF, 0x0001, &mut flags), 0x0000);
        assert!(flags.h && flags.c);
        assert_eq!(add_words(0x8000, 0x8000, &mut flags), 0x0000);
        assert!(!flags.h && flags.c);
    }

    #[test]
    fn add_signed_boundaries() {
        let mut flags = Flags::default();
        assert_eq!(add_signed(0xFFF8, 0x08, &mut flags), 0x0000);
        assert!(flags.h && flags.c && !flags.z);
        assert_eq!(add_signed(0x0000, -1, &mut flags), 0xFFFF);
        assert!(!flags.h && !flags.c);
        assert_eq!(add_signed(0x1234, 0, &mut flags), 0x1234);
    }

    #[test]
    fn wide_inc_dec_ignore_flags() {
        let mem = vec![0u8; 0x10000];
        let mut cpu = Cpu::new();
        cpu.write_bc(0xFFFF);
        cpu.f.set_from_byte(0x50);
        let ops = [Resolved::At(Location::Pair(WideReg::BC))];
        let out = inc(&cpu, &mem, &ops).unwrap();
        assert_eq!(out.commits[0], Commit::Pair(WideReg::BC, 0x0000));
        assert_eq!(out.flags.as_byte(), 0x50);

        cpu.write_bc(0x0000);
        let out = dec(&cpu, &mem, &ops).unwrap();
        assert_eq!(out.commits[0], Commit::Pair(WideReg::BC, 0xFFFF));
        assert_eq!(out.flags.as_byte(), 0x50);
    }

    #[test]
    fn adc_uses_carry() {
        let mem = vec![0u8; 0x10000];
        let mut cpu = Cpu::new();
        cpu.a = Wrapping(0xFE);
        cpu.f.c = true;
        let ops = [
            Resolved::At(Location::Reg(HalfRegister::A)),
            Resolved::Byte(0x01),
        ];
        let out = adc(&cpu, &mem, &ops).unwrap();
        assert_eq!(out.commits[0], Commit::Reg(HalfRegister::A, 0x00));
        assert!(out.flags.z && out.flags.c && out.flags.h);
    }
}
