use crate::asm::{AsmBuilder, Comp, Dest, Jump};

use super::stack::pop_d;
use super::EmitContext;

pub fn compare(out: &mut AsmBuilder, ctx: &mut EmitContext, jump: Jump) {
    let (true_sym, end_sym) = ctx.compare_labels();

    pop_d(out); // Right arg in D
    out.set(Dest::A, Comp::AMinusOne) // Looking at second arg of stack, will overwrite
        .set(Dest::D, Comp::MMinusD)
        .at(true_sym.as_str())
        .jump(Comp::D, jump)
        .set(Dest::D, Comp::Zero)
        .at(end_sym.as_str())
        .jump(Comp::Zero, Jump::JMP)
        .label(true_sym)
        .set(Dest::D, Comp::NegOne)
        .label(end_sym)
        .at("SP")
        .set(Dest::A, Comp::MMinusOne)
        .set(Dest::M, Comp::D);
}

pub fn label(out: &mut AsmBuilder, ctx: &EmitContext, label: &str) {
    out.label(ctx.scoped_label(label));
}

pub fn goto(out: &mut AsmBuilder, ctx: &EmitContext, label: &str) {
    out.at(ctx.scoped_label(label))
        .jump(Comp::Zero, Jump::JMP); // Unconditional jump
}

pub fn if_goto(out: &mut AsmBuilder, ctx: &EmitContext, label: &str) {
    pop_d(out);
    out.at(ctx.scoped_label(label))
        .jump(Comp::D, Jump::JNE); // False is 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::Instruction;
    use pretty_assertions::assert_eq;

    fn labels(out: &AsmBuilder) -> Vec<String> {
        out.instructions()
            .iter()
            .filter_map(|i| match i {
                Instruction::Label(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn each_comparison_gets_its_own_labels() {
        let mut ctx = EmitContext::new();
        let mut out = AsmBuilder::new(false);
        compare(&mut out, &mut ctx, Jump::JEQ);
        compare(&mut out, &mut ctx, Jump::JLT);
        ctx.begin_file("Other");
        ctx.enter_function("Other.test");
        compare(&mut out, &mut ctx, Jump::JGT);
        assert_eq!(
            labels(&out),
            vec![
                "Sys.init$cmp.true.0",
                "Sys.init$cmp.end.0",
                "Sys.init$cmp.true.1",
                "Sys.init$cmp.end.1",
                "Other.test$cmp.true.2",
                "Other.test$cmp.end.2",
            ]
        );
    }

    #[test]
    fn labels_are_scoped_to_the_current_function() {
        let mut ctx = EmitContext::new();
        let mut out = AsmBuilder::new(false);
        ctx.enter_function("Main.loop");
        label(&mut out, &ctx, "TOP");
        if_goto(&mut out, &ctx, "TOP");
        ctx.enter_function("Main.other");
        goto(&mut out, &ctx, "TOP");
        let text: Vec<String> = out.instructions().iter().map(|i| i.to_string()).collect();
        assert_eq!(
            text,
            vec![
                "(Main.loop$TOP)",
                "@SP",
                "AM=M-1",
                "D=M",
                "@Main.loop$TOP",
                "D;JNE",
                "@Main.other$TOP",
                "0;JMP",
            ]
        );
    }
}
