//! Function declaration, call and return.
//!
//! A call leaves this frame on the stack, below the callee's locals:
//!
//! ```text
//! ARG ->  argument 0 .. argument n-1
//!         return address
//!         saved LCL
//!         saved ARG
//!         saved THIS
//!         saved THAT
//! LCL ->  local 0 .. local k-1
//! ```

use crate::asm::{AsmBuilder, Comp, Dest, Jump};

use super::stack::{pop_d, push_constant, push_d};
use super::EmitContext;

/// Callee frame base while returning.
pub const FRAME: &str = "R14";
/// Return address while returning.
pub const RETURN_ADDRESS: &str = "R15";

/// Saved pointers in push order; restored in reverse from FRAME-1 down.
const SAVED_POINTERS: [&str; 4] = ["LCL", "ARG", "THIS", "THAT"];

pub fn function(out: &mut AsmBuilder, ctx: &mut EmitContext, name: &str, locals: u16) {
    out.label(name);
    ctx.enter_function(name);
    for _ in 0..locals {
        push_constant(out, 0);
    }
}

pub fn call(out: &mut AsmBuilder, ctx: &mut EmitContext, name: &str, args: u16) {
    let return_sym = ctx.return_label();

    out.at(return_sym.as_str()).set(Dest::D, Comp::A);
    push_d(out);
    for pointer in SAVED_POINTERS {
        out.at(pointer).set(Dest::D, Comp::M);
        push_d(out);
    }

    // ARG = SP - 5 - args, in two steps so `args` alone is loaded
    out.at("SP")
        .set(Dest::D, Comp::M)
        .at(SAVED_POINTERS.len() as u16 + 1)
        .set(Dest::D, Comp::DMinusA)
        .at(args)
        .set(Dest::D, Comp::DMinusA)
        .at("ARG")
        .set(Dest::M, Comp::D);
    // LCL = SP
    out.at("SP")
        .set(Dest::D, Comp::M)
        .at("LCL")
        .set(Dest::M, Comp::D);

    out.at(name)
        .jump(Comp::Zero, Jump::JMP)
        .label(return_sym);
}

/// `dest = *(FRAME - offset)`
fn restore(out: &mut AsmBuilder, dest: &str, offset: u16) {
    out.at(FRAME)
        .set(Dest::D, Comp::M)
        .at(offset)
        .set(Dest::A, Comp::DMinusA)
        .set(Dest::D, Comp::M)
        .at(dest)
        .set(Dest::M, Comp::D);
}

pub fn ret(out: &mut AsmBuilder) {
    out.at("LCL")
        .set(Dest::D, Comp::M)
        .at(FRAME)
        .set(Dest::M, Comp::D);
    // Read before *ARG is overwritten; with no arguments they are the same slot
    restore(out, RETURN_ADDRESS, SAVED_POINTERS.len() as u16 + 1);

    // *ARG = pop()
    pop_d(out);
    out.at("ARG")
        .set(Dest::A, Comp::M)
        .set(Dest::M, Comp::D);
    // SP = ARG + 1, before ARG is restored
    out.at("ARG")
        .set(Dest::D, Comp::MPlusOne)
        .at("SP")
        .set(Dest::M, Comp::D);

    for (offset, pointer) in (1..).zip(SAVED_POINTERS.iter().rev()) {
        restore(out, pointer, offset);
    }

    out.at(RETURN_ADDRESS)
        .set(Dest::A, Comp::M)
        .jump(Comp::Zero, Jump::JMP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::{Address, Instruction};
    use pretty_assertions::assert_eq;

    fn listing(out: &AsmBuilder) -> Vec<String> {
        out.instructions().iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn function_zeroes_locals_and_sets_scope() {
        let mut ctx = EmitContext::new();
        let mut out = AsmBuilder::new(false);
        function(&mut out, &mut ctx, "Main.main", 2);
        assert_eq!(ctx.current_function(), "Main.main");
        let text = listing(&out);
        assert_eq!(text[0], "(Main.main)");
        assert_eq!(text.iter().filter(|l| *l == "@0").count(), 2);
        assert_eq!(text.len(), 1 + 2 * 6);
    }

    #[test]
    fn call_sequence() {
        let mut ctx = EmitContext::new();
        let mut out = AsmBuilder::new(false);
        call(&mut out, &mut ctx, "Math.max", 2);
        let text = listing(&out);
        assert_eq!(
            &text[..6],
            &["@Sys.init$ret.0", "D=A", "@SP", "M=M+1", "A=M-1", "M=D"]
        );
        assert_eq!(
            &text[text.len() - 15..],
            &[
                "@SP", "D=M", "@5", "D=D-A", "@2", "D=D-A", "@ARG", "M=D", "@SP", "D=M", "@LCL",
                "M=D", "@Math.max", "0;JMP", "(Sys.init$ret.0)"
            ]
        );
    }

    #[test]
    fn repeated_calls_get_distinct_return_labels() {
        let mut ctx = EmitContext::new();
        let mut out = AsmBuilder::new(false);
        ctx.enter_function("Main.fib");
        call(&mut out, &mut ctx, "Main.fib", 1);
        call(&mut out, &mut ctx, "Main.fib", 1);
        let text = listing(&out);
        assert!(text.contains(&"(Main.fib$ret.0)".to_string()));
        assert!(text.contains(&"(Main.fib$ret.1)".to_string()));
    }

    #[test]
    fn largest_argument_count_stays_loadable() {
        let mut ctx = EmitContext::new();
        let mut out = AsmBuilder::new(false);
        call(&mut out, &mut ctx, "Foo.bar", 0x7FFF);
        let too_wide: Vec<&Instruction> = out
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::Address(Address::Number(n)) if *n > 0x7FFF))
            .collect();
        assert!(too_wide.is_empty(), "{too_wide:?}");
        assert!(listing(&out).contains(&"@32767".to_string()));
    }

    #[test]
    fn return_restores_in_descending_order() {
        let mut out = AsmBuilder::new(false);
        ret(&mut out);
        let text = listing(&out);
        let restored: Vec<&str> = text
            .windows(2)
            .filter(|w| w[1] == "M=D" && w[0].starts_with('@'))
            .filter(|w| w[0] != "@R14" && w[0] != "@SP")
            .map(|w| w[0].as_str())
            .collect();
        assert_eq!(restored, vec!["@R15", "@THAT", "@THIS", "@ARG", "@LCL"]);
        assert_eq!(&text[text.len() - 3..], &["@R15", "A=M", "0;JMP"]);
    }
}
