use super::*;

/// Splits off the optional leading condition. Unconditional transfers always pass.
fn condition(ops: &[Resolved]) -> (bool, &[Resolved]) {
    match ops {
        [Resolved::Condition(passed), rest @ ..] => (*passed, rest),
        rest => (true, rest),
    }
}

/// JP a16 / JP cc,a16 / JP HL
pub fn jp(cpu: &Cpu, _: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let (passed, rest) = condition(ops);
    let out = Outcome::new(*cpu.flags());
    if !passed {
        return Ok(out.skipped());
    }
    let target = match rest {
        [target] => target.word(cpu),
        _ => unreachable!("Malformed JP: {ops:?}"),
    };
    Ok(out.with(Commit::Jump(target)))
}

/// JR r8 / JR cc,r8. The offset is relative to the address after the instruction.
pub fn jr(cpu: &Cpu, _: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let (passed, rest) = condition(ops);
    let out = Outcome::new(*cpu.flags());
    if !passed {
        return Ok(out.skipped());
    }
    let target = match rest {
        [Resolved::Offset(e)] => cpu.pc.0.wrapping_add_signed(*e as i16),
        _ => unreachable!("Malformed JR: {ops:?}"),
    };
    Ok(out.with(Commit::Jump(target)))
}

/// CALL a16 / CALL cc,a16
pub fn call(cpu: &Cpu, _: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let (passed, rest) = condition(ops);
    let out = Outcome::new(*cpu.flags());
    if !passed {
        return Ok(out.skipped());
    }
    let target = match rest {
        [target] => target.word(cpu),
        _ => unreachable!("Malformed CALL: {ops:?}"),
    };
    Ok(out.with(Commit::Push(cpu.pc.0)).with(Commit::Jump(target)))
}

/// RET / RET cc
pub fn ret(cpu: &Cpu, _: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let (passed, _) = condition(ops);
    let out = Outcome::new(*cpu.flags());
    if !passed {
        return Ok(out.skipped());
    }
    Ok(out.with(Commit::Return))
}

/// Return from the subroutine and enable interupts immediately
pub fn reti(cpu: &Cpu, _: &dyn MemoryLike, _: &[Resolved]) -> Result<Outcome, Fault> {
    Ok(Outcome::new(*cpu.flags())
        .with(Commit::Return)
        .with(Commit::Interrupts(ImeChange::EnableNow)))
}

/// RST n. A one byte call to a fixed vector.
pub fn rst(cpu: &Cpu, _: &dyn MemoryLike, ops: &[Resolved]) -> Result<Outcome, Fault> {
    let target = match ops {
        [Resolved::Vector(v)] => *v,
        _ => unreachable!("Malformed RST: {ops:?}"),
    };
    Ok(Outcome::new(*cpu.flags())
        .with(Commit::Push(cpu.pc.0))
        .with(Commit::Jump(target)))
}
