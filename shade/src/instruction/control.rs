use super::*;

/// Decimal adjusts A after a BCD addition or subtraction.
pub fn to_bcd(mut val: u8, flags: &mut Flags) -> u8 {
    if !flags.n {
        // after an addition, adjust if (half-)carry occurred or if result is out of bounds
        if flags.c || val > 0x99 {
            val = val.wrapping_add(0x60);
            flags.c = true;
        }
        if flags.h || (val & 0x0f) > 0x09 {
            val = val.wrapping_add(0x6);
        }
    } else {
        if flags.c {
            val = val.wrapping_sub(0x60);
        }
        if flags.h {
            val = val.wrapping_sub(0x6);
        }
    }
    flags.z = val == 0;
    flags.h = false;
    val
}

pub fn nop(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Ok(Outcome::new(*cpu.flags()))
}

pub fn halt(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Ok(Outcome::new(*cpu.flags()).with(Commit::State(CpuState::Halted)))
}

/// The byte after STOP has already been consumed as an operand and is ignored.
pub fn stop(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Ok(Outcome::new(*cpu.flags()).with(Commit::State(CpuState::Stopped)))
}

pub fn di(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Ok(Outcome::new(*cpu.flags()).with(Commit::Interrupts(ImeChange::Disable)))
}

pub fn ei(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Ok(Outcome::new(*cpu.flags()).with(Commit::Interrupts(ImeChange::EnableDelayed)))
}

pub fn daa(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    let val = to_bcd(cpu.a.0, &mut flags);
    Ok(Outcome::new(flags).with(Commit::Reg(HalfRegister::A, val)))
}

pub fn cpl(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Ok(Outcome::new(*cpu.flags()).with(Commit::Reg(HalfRegister::A, !cpu.a.0)))
}

/// The carry is forced by the flag policy.
pub fn scf(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Ok(Outcome::new(*cpu.flags()))
}

pub fn ccf(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    let mut flags = *cpu.flags();
    flags.c = !flags.c;
    Ok(Outcome::new(flags))
}

pub fn illegal(_: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Err(Fault::Illegal)
}

pub fn unimplemented(_: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Err(Fault::Unsupported)
}
