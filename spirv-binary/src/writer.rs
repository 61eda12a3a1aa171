//! Encode a [`Module`] as a SPIR-V binary word stream.
//!
//! Renumber every temporary id first, then emit the fixed 5-word header
//! followed by every instruction in module order, each as a
//! `(word_count << 16) | opcode` word followed by its type id, result
//! id, and operands in that order.

use spirv_ir::{InstId, Module, OperandKind, Operand};

use crate::enumerant;

const MAGIC: u32 = 0x0723_0203;
const VERSION: u32 = 0x0001_0000;
const GENERATOR_MAGIC: u32 = 0;

fn push_literal_string(words: &mut Vec<u32>, s: &str) {
    let bytes = s.as_bytes();
    let mut i = 0;
    loop {
        let mut word = 0u32;
        for shift in 0..4 {
            let byte = bytes.get(i).copied().unwrap_or(0);
            word |= u32::from(byte) << (8 * shift);
            i += 1;
            if byte == 0 {
                break;
            }
        }
        words.push(word);
        if i > bytes.len() {
            break;
        }
    }
}

fn push_variable_operand(words: &mut Vec<u32>, module: &Module, kind: OperandKind, operands: &[Operand]) {
    match kind {
        OperandKind::VariableLiteralNumber => {
            for operand in operands {
                words.push(operand.as_literal_number().expect("VariableLiteralNumber operand must be a literal"));
            }
        }
        OperandKind::VariableId => {
            for operand in operands {
                let id = operand.as_id().expect("VariableId operand must be an id");
                words.push(module.id_value(id));
            }
        }
        OperandKind::VariableIdLiteralPair => {
            let mut it = operands.iter();
            while let Some(id_operand) = it.next() {
                let id = id_operand.as_id().expect("VariableIdLiteralPair id slot must be an id");
                words.push(module.id_value(id));
                let literal = it.next().and_then(Operand::as_literal_number).expect("paired literal operand");
                words.push(literal);
            }
        }
        OperandKind::VariableLiteralIdPair => {
            let mut it = operands.iter();
            while let Some(literal_operand) = it.next() {
                let literal = literal_operand.as_literal_number().expect("VariableLiteralIdPair literal slot must be a literal");
                words.push(literal);
                let id = it.next().and_then(Operand::as_id).expect("paired id operand");
                words.push(module.id_value(id));
            }
        }
        _ => unreachable!("push_variable_operand called with a non-variable kind"),
    }
}

fn output_instruction(words: &mut Vec<u32>, module: &Module, inst: InstId) {
    let start = words.len();
    words.push(0); // placeholder for (word_count << 16) | opcode

    let opcode = module.opcode(inst);
    let info = opcode.info();

    if info.has_type {
        words.push(module.id_value(module.type_id(inst).expect("typed opcode must carry a type id")));
    }
    if info.has_result {
        words.push(module.id_value(module.result_id(inst).expect("result opcode must carry a result id")));
    }

    let operands = module.operands(inst);
    let mut idx = 0;
    for &kind in info.operands {
        if matches!(
            kind,
            OperandKind::VariableId
                | OperandKind::VariableLiteralNumber
                | OperandKind::VariableIdLiteralPair
                | OperandKind::VariableLiteralIdPair
        ) {
            push_variable_operand(words, module, kind, &operands[idx..]);
            idx = operands.len();
            break;
        }
        let Some(operand) = operands.get(idx) else { break };
        match kind {
            OperandKind::Id | OperandKind::OptionalId => {
                words.push(module.id_value(operand.as_id().expect("Id operand must be an id")));
            }
            OperandKind::LiteralNumber | OperandKind::OptionalLiteralNumber => {
                words.push(operand.as_literal_number().expect("LiteralNumber operand must be a literal"));
            }
            OperandKind::LiteralString | OperandKind::OptionalLiteralString => {
                push_literal_string(words, operand.as_literal_string().expect("LiteralString operand must be a string"));
            }
            OperandKind::Enum(kind_name) => {
                let Operand::Enum(name) = operand else { panic!("Enum operand must be an Operand::Enum") };
                words.push(enumerant::enum_value(kind_name, name).expect("encoded enum token must be known"));
            }
            OperandKind::Mask(kind_name) => {
                let Operand::Mask(tokens) = operand else { panic!("Mask operand must be an Operand::Mask") };
                words.push(enumerant::mask_value(kind_name, tokens).expect("encoded mask tokens must be known"));
            }
            OperandKind::VariableId
            | OperandKind::VariableLiteralNumber
            | OperandKind::VariableIdLiteralPair
            | OperandKind::VariableLiteralIdPair => unreachable!("handled above"),
        }
        idx += 1;
    }

    let word_count = words.len() - start;
    #[allow(clippy::cast_possible_truncation, reason = "instruction word counts never approach u32 range")]
    {
        words[start] = ((word_count as u32) << 16) | opcode.number();
    }
}

/// Encode `module` as a SPIR-V binary, renumbering any temporary ids in
/// place first (the writer has no other way to give them concrete
/// values).
pub fn write_module(module: &mut Module) -> Vec<u8> {
    module.renumber_temp_ids();

    let mut words = vec![MAGIC, VERSION, GENERATOR_MAGIC, module.bound(), 0];
    for inst in module.instructions() {
        output_instruction(&mut words, module, inst);
    }

    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_module;
    use spirv_ir::Opcode;

    #[coverage_helper::test]
    fn writes_a_header_with_the_correct_magic_and_bound() {
        let mut module = Module::new();
        let bytes = write_module(&mut module);
        assert_eq!(bytes.len(), 20);
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), MAGIC);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), VERSION);
    }

    #[coverage_helper::test]
    fn round_trips_a_single_type_through_binary() {
        let mut module = Module::new();
        module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
        let bytes = write_module(&mut module);
        let read_back = read_module(&bytes).unwrap();
        assert_eq!(read_back.global_instructions().len(), 1);
        assert_eq!(read_back.opcode(read_back.global_instructions()[0]), Opcode::OpTypeVoid);
    }
}
