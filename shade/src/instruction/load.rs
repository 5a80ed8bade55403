use super::*;

/// LD and LDH. Handles every shape of load: byte to byte, word to pair, SP to memory, and the
/// three operand `LD HL,SP+r8`.
pub fn ld(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let dest = destination(ops);
    let mut flags = *cpu.flags();
    let commit = match ops {
        [_, Resolved::At(Location::Pair(WideReg::SP)), Resolved::Offset(e)] => {
            let val = add_signed(cpu.sp.0, *e, &mut flags);
            dest.write_word(val)
        }
        [_, src] if src.is_wide() => dest.write_word(src.word(cpu)),
        [_, src] => dest.write_byte(src.byte(cpu, mem)?),
        _ => unreachable!("Malformed load: {ops:?}"),
    };
    Ok(Outcome::new(flags).with(commit))
}

pub fn push(cpu: &Cpu, _: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let val = ops
        .first()
        .map(|op| op.word(cpu))
        .unwrap_or_else(|| unreachable!("PUSH without an operand"));
    Ok(Outcome::new(*cpu.flags()).with(Commit::Push(val)))
}

/// POP AF is the one pop that touches the flags, so the popped flags are previewed here for the
/// flag policy to pick up.
pub fn pop(cpu: &Cpu, mem: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let Location::Pair(pair) = destination(ops) else {
        unreachable!("POP into a non-pair: {ops:?}")
    };
    let flags = match pair {
        WideReg::AF => Flags::from(mem.read_byte(cpu.sp.0)?),
        _ => *cpu.flags(),
    };
    Ok(Outcome::new(flags).with(Commit::Pop(pair)))
}
