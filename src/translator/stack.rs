use crate::asm::{AsmBuilder, Comp, Dest};
use crate::ast::Segment;
use crate::error::SegmentError;

use super::segment::{self, WriteTarget};
use super::EmitContext;

/// Holds a computed pop destination while SP is decremented.
pub const POP_TARGET: &str = "R13";

/// *SP = D; SP++
pub fn push_d(out: &mut AsmBuilder) {
    out.at("SP")
        .set(Dest::M, Comp::MPlusOne)
        .set(Dest::A, Comp::MMinusOne) // Don't need to refetch SP; this is safe
        .set(Dest::M, Comp::D);
}

/// SP--; D = *SP, leaving A pointing at the popped slot
pub fn pop_d(out: &mut AsmBuilder) {
    out.at("SP")
        .set(Dest::AM, Comp::MMinusOne)
        .set(Dest::D, Comp::M);
}

pub fn push_constant(out: &mut AsmBuilder, value: u16) {
    out.at(value).set(Dest::D, Comp::A);
    push_d(out);
}

pub fn push(
    out: &mut AsmBuilder,
    ctx: &EmitContext,
    segment: Segment,
    index: u16,
) -> Result<(), SegmentError> {
    segment::read(out, ctx, segment, index)?;
    push_d(out);
    Ok(())
}

pub fn pop(
    out: &mut AsmBuilder,
    ctx: &EmitContext,
    segment: Segment,
    index: u16,
) -> Result<(), SegmentError> {
    match segment::write_target(out, ctx, segment, index)? {
        WriteTarget::Computed => {
            out.at(POP_TARGET).set(Dest::M, Comp::D); // Stage the address before touching SP
            pop_d(out);
            out.at(POP_TARGET)
                .set(Dest::A, Comp::M)
                .set(Dest::M, Comp::D);
        }
        WriteTarget::Direct(addr) => {
            pop_d(out);
            out.at(addr).set(Dest::M, Comp::D);
        }
    }
    Ok(())
}

/// In place on the top of the stack.
pub fn unary(out: &mut AsmBuilder, op: Comp) {
    out.at("SP")
        .set(Dest::A, Comp::MMinusOne)
        .set(Dest::M, op);
}

// i.e. no conditions or jumps, just pop and run. `op` combines x (M) with y (D).
pub fn binary(out: &mut AsmBuilder, op: Comp) {
    pop_d(out); // Right arg in D
    out.set(Dest::A, Comp::AMinusOne) // Looking at second arg of stack, will overwrite
        .set(Dest::M, op);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Segment::*;
    use pretty_assertions::assert_eq;

    fn listing(out: &AsmBuilder) -> Vec<String> {
        out.instructions().iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn push_constant_sequence() {
        let mut out = AsmBuilder::new(false);
        push(&mut out, &EmitContext::new(), Constant, 7).unwrap();
        assert_eq!(
            listing(&out),
            vec!["@7", "D=A", "@SP", "M=M+1", "A=M-1", "M=D"]
        );
    }

    #[test]
    fn pop_indirect_stages_address_before_sp() {
        let mut out = AsmBuilder::new(false);
        pop(&mut out, &EmitContext::new(), Local, 2).unwrap();
        assert_eq!(
            listing(&out),
            vec![
                "@LCL", "D=M", "@2", "D=D+A", "@R13", "M=D", "@SP", "AM=M-1", "D=M", "@R13",
                "A=M", "M=D"
            ]
        );
    }

    #[test]
    fn pop_direct() {
        let mut out = AsmBuilder::new(false);
        pop(&mut out, &EmitContext::new(), Pointer, 0).unwrap();
        assert_eq!(listing(&out), vec!["@SP", "AM=M-1", "D=M", "@3", "M=D"]);
    }

    #[test]
    fn pop_constant_emits_nothing() {
        let mut out = AsmBuilder::new(false);
        assert!(pop(&mut out, &EmitContext::new(), Constant, 1).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn sub_computes_x_minus_y() {
        let mut out = AsmBuilder::new(false);
        binary(&mut out, Comp::MMinusD);
        assert_eq!(listing(&out), vec!["@SP", "AM=M-1", "D=M", "A=A-1", "M=M-D"]);
    }

    #[test]
    fn not_in_place() {
        let mut out = AsmBuilder::new(false);
        unary(&mut out, Comp::NotM);
        assert_eq!(listing(&out), vec!["@SP", "A=M-1", "M=!M"]);
    }
}
