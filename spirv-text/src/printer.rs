//! Textual disassembler: turns a [`Module`] back into source text.
//!
//! Raw mode walks [`Module::instructions`] and prints one explicit line
//! per instruction, which is exactly the grammar [`crate::parser::assemble`]
//! accepts without any of the pretty sugar. Pretty mode layers type
//! shorthand, symbolic names (recovered from `OpName`), a `define`
//! function form, and inline decorations back on top, mirroring the
//! sugar the parser strips away when reading such text.

use std::collections::HashMap;

use spirv_ir::{Id, InstId, Module, Opcode, Operand};

use crate::AssembleOptions;

/// Disassemble `module` into source text.
///
/// `options.raw_mode` selects the fully explicit surface: every
/// instruction (including synthesized `OpName`s and `OpDecorate`s) is
/// printed as its own line, with no symbolic names or shorthand. This
/// is the only surface [`crate::parser::assemble`] is guaranteed to
/// read back into an identical module. The pretty surface trades that
/// guarantee for readability.
///
/// Any temporary ids left in `module` are renumbered first, since a
/// temporary id cannot be printed (see [`Module::id_value`]).
#[must_use]
pub fn disassemble(module: &mut Module, options: AssembleOptions) -> String {
    module.renumber_temp_ids();
    if options.raw_mode {
        disassemble_raw(module)
    } else {
        disassemble_pretty(module)
    }
}

fn disassemble_raw(module: &Module) -> String {
    let mut out = String::new();
    for inst in module.instructions() {
        out.push_str(&format_instruction(module, inst, &HashMap::new(), true));
        out.push('\n');
    }
    out
}

/// Collect the symbolic names available for pretty printing, keyed by
/// the id each `OpName` targets. Only a plain `OpName` counts: member
/// names and debug strings aren't part of the `%name` surface.
fn collect_names(module: &Module) -> HashMap<Id, String> {
    let mut names = HashMap::new();
    for inst in module.global_instructions() {
        if module.opcode(inst) != Opcode::OpName {
            continue;
        }
        let operands = module.operands(inst);
        if let (Some(Operand::Id(target)), Some(Operand::LiteralString(name))) = (operands.first(), operands.get(1)) {
            names.insert(*target, name.clone());
        }
    }
    names
}

fn disassemble_pretty(module: &Module) -> String {
    let names = collect_names(module);
    let mut out = String::new();

    for inst in module.global_instructions() {
        if should_skip_in_pretty_output(module, inst) {
            continue;
        }
        out.push_str(&format_instruction_with_decorations(module, inst, &names));
        out.push('\n');
    }

    for &function in module.functions() {
        print_function(module, function, &names, &mut out);
    }

    out
}

/// `OpName` is implied by every pretty-printed reference to its target
/// using the symbolic name directly; decorations that get folded into
/// their target's line are likewise dropped from the flat instruction
/// stream.
fn should_skip_in_pretty_output(module: &Module, inst: InstId) -> bool {
    if module.opcode(inst) == Opcode::OpName {
        return true;
    }
    if module.opcode(inst) == Opcode::OpDecorate {
        if let Some(Operand::Id(_)) = module.operands(inst).first() {
            return true;
        }
    }
    false
}

fn format_instruction_with_decorations(module: &Module, inst: InstId, names: &HashMap<Id, String>) -> String {
    let mut line = format_instruction(module, inst, names, false);
    for decoration in module.get_decorations(inst) {
        line.push(' ');
        line.push_str(&format_inline_decoration(module, decoration));
    }
    line
}

fn format_inline_decoration(module: &Module, decoration: InstId) -> String {
    let operands = module.operands(decoration);
    let Some(Operand::Enum(name)) = operands.get(1) else {
        return String::new();
    };
    let args: Vec<String> = operands.iter().skip(2).filter_map(Operand::as_literal_number).map(|n| n.to_string()).collect();
    if args.is_empty() {
        name.clone()
    } else {
        format!("{name}({})", args.join(", "))
    }
}

fn print_function(module: &Module, function: spirv_ir::FunctionId, names: &HashMap<Id, String>, out: &mut String) {
    let header = module.function_header(function);
    let ret_type = module.type_id(header).expect("OpFunction always has a result type");
    let func_id = module.result_id(header).expect("OpFunction always has a result id");

    out.push_str("define ");
    out.push_str(&id_display(module, ret_type, names, false));
    out.push(' ');
    out.push_str(&id_display(module, func_id, names, false));
    out.push('(');
    let params = module.function_parameters(function);
    for (i, &param) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let ty = module.type_id(param).expect("OpFunctionParameter always has a result type");
        out.push_str(&id_display(module, ty, names, false));
        out.push(' ');
        out.push_str(&id_display(module, module.result_id(param).expect("always has a result id"), names, false));
    }
    out.push_str(") {\n");

    for block in module.function_basic_blocks(function) {
        let label = module.label_inst(block);
        let label_id = module.result_id(label).expect("OpLabel always has a result id");
        out.push_str(&id_display(module, label_id, names, false));
        out.push_str(":\n");
        for body_inst in module.block_insts(block) {
            out.push_str(&format_instruction_with_decorations(module, body_inst, names));
            out.push('\n');
        }
    }

    out.push_str("}\n");
}

fn id_display(module: &Module, id: Id, names: &HashMap<Id, String>, raw: bool) -> String {
    if raw {
        return format!("%{}", module.id_value(id));
    }
    if let Some(shorthand) = type_shorthand(module, id) {
        return shorthand;
    }
    if let Some(name) = names.get(&id) {
        return format!("%{name}");
    }
    format!("%{}", module.id_value(id))
}

/// Mirrors `get_or_create_type`'s scalar and `<N x BASE>` shorthand on
/// the way back out: a type id whose defining instruction is one of the
/// scalar/vector builtins prints as the shorthand token instead of a
/// `%`-reference.
fn type_shorthand(module: &Module, id: Id) -> Option<String> {
    let inst = module.defining_inst(id)?;
    match module.opcode(inst) {
        Opcode::OpTypeVoid => Some("void".to_owned()),
        Opcode::OpTypeBool => Some("bool".to_owned()),
        Opcode::OpTypeInt => {
            let operands = module.operands(inst);
            let width = operands.first().and_then(Operand::as_literal_number)?;
            let signed = operands.get(1).and_then(Operand::as_literal_number)? == 1;
            Some(format!("{}{width}", if signed { "s" } else { "u" }))
        }
        Opcode::OpTypeFloat => {
            let width = module.operands(inst).first().and_then(Operand::as_literal_number)?;
            Some(format!("f{width}"))
        }
        Opcode::OpTypeVector => {
            let operands = module.operands(inst);
            let elem = operands.first().and_then(Operand::as_id)?;
            let count = operands.get(1).and_then(Operand::as_literal_number)?;
            let base = type_shorthand(module, elem)?;
            Some(format!("<{count} x {base}>"))
        }
        _ => None,
    }
}

/// The token a zero-valued (empty) mask operand prints as; every mask
/// kind this repository supports maps bit value `0` to `"None"`.
fn mask_zero_token() -> &'static str {
    "None"
}

fn format_operand(module: &Module, operand: &Operand, names: &HashMap<Id, String>, raw: bool) -> String {
    match operand {
        Operand::Id(id) => id_display(module, *id, names, raw),
        Operand::LiteralNumber(n) => n.to_string(),
        Operand::LiteralString(s) => format!("{s:?}"),
        Operand::Enum(name) => name.clone(),
        Operand::Mask(tokens) => {
            if tokens.is_empty() {
                mask_zero_token().to_owned()
            } else {
                tokens.join("|")
            }
        }
    }
}

fn format_instruction(module: &Module, inst: InstId, names: &HashMap<Id, String>, raw: bool) -> String {
    let opcode = module.opcode(inst);
    let mut line = String::new();
    if let Some(result) = module.result_id(inst) {
        line.push_str(&id_display(module, result, names, raw));
        line.push_str(" = ");
    }
    line.push_str(opcode.name());

    let mut first = true;
    if let Some(type_id) = module.type_id(inst) {
        line.push(' ');
        line.push_str(&id_display(module, type_id, names, raw));
        first = false;
    }
    for operand in module.operands(inst) {
        if first {
            line.push(' ');
            first = false;
        } else {
            line.push_str(", ");
        }
        line.push_str(&format_operand(module, operand, names, raw));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::assemble;

    #[coverage_helper::test]
    fn raw_round_trips_a_bare_type() {
        let mut module = assemble("%1 = OpTypeVoid", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        let text = disassemble(&mut module, AssembleOptions::RAW_OPTIONS);
        assert_eq!(text.trim(), "%1 = OpTypeVoid");
        let reparsed = assemble(&text, AssembleOptions::RAW_OPTIONS).unwrap();
        assert_eq!(reparsed.global_instructions().len(), 1);
    }

    #[coverage_helper::test]
    fn pretty_mode_uses_scalar_shorthand() {
        let mut module = assemble("%1 = OpTypeInt 32, 1", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        let text = disassemble(&mut module, AssembleOptions::DEFAULT_OPTIONS);
        assert!(text.contains("s32"), "expected shorthand in {text:?}");
    }

    #[coverage_helper::test]
    fn pretty_mode_omits_synthesized_op_name() {
        let mut module = assemble("define void %main() {\n%entry:\nOpReturn\n}", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        let text = disassemble(&mut module, AssembleOptions::DEFAULT_OPTIONS);
        assert!(!text.contains("OpName"), "OpName should be implied, got {text:?}");
        assert!(text.contains("define void %main"));
    }

    #[coverage_helper::test]
    fn pretty_mode_inlines_decorations() {
        let mut module = assemble("%s = OpTypeBool Block", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        let text = disassemble(&mut module, AssembleOptions::DEFAULT_OPTIONS);
        assert!(!text.contains("OpDecorate"), "decoration should be inlined, got {text:?}");
        assert!(text.contains("Block"));
    }

    #[coverage_helper::test]
    fn raw_mode_never_uses_shorthand_or_names() {
        let mut module = assemble("define void %main() {\n%entry:\nOpReturn\n}", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        let text = disassemble(&mut module, AssembleOptions::RAW_OPTIONS);
        assert!(!text.contains("define"));
        assert!(!text.contains("%main"));
        assert!(!text.contains("%entry:"));
    }
}
