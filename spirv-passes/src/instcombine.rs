//! Peephole instruction combining.
//!
//! Canonicalizes commutative instructions so a constant operand always
//! comes second, rewrites a handful of algebraic identities (double
//! negation, multiply/add by a scalar identity, De Morgan's laws, vector
//! shuffle simplification), and fuses [`crate::constprop`] into the same
//! loop so a rewrite that becomes foldable is folded immediately rather
//! than waiting for a separate constant-propagation pass. Tends to leave
//! dead instructions behind; run `dead_inst_elim` afterwards.

use spirv_ir::{ConstValue, FunctionId, InstId, Module, Opcode, Operand};

use crate::constprop;

/// Run instruction combining over every function in the module.
pub fn run(module: &mut Module) {
    let functions: Vec<FunctionId> = module.functions().to_vec();
    for function in functions {
        for inst in module.function_instructions(function) {
            if !module.is_attached(inst) {
                continue;
            }
            let optimized = optimize_inst(module, inst);
            if optimized != inst {
                if module.is_attached(optimized) {
                    module.replace_uses_with(inst, optimized);
                    module.destroy_inst(inst);
                } else {
                    module.replace_with(inst, optimized).expect("optimized instruction is ready to attach");
                }
            }
        }
    }
}

/// Canonicalize, peephole-simplify to a fixed point, then try constant
/// folding. Returns `inst` unchanged if nothing applies.
pub(crate) fn optimize_inst(module: &mut Module, inst: InstId) -> InstId {
    let mut inst = canonicalize_inst(module, inst);
    loop {
        let next = peephole_inst(module, inst);
        if next == inst {
            break;
        }
        inst = next;
    }
    if let Some(folded) = constprop::optimize_inst(module, inst) {
        return folded;
    }
    inst
}

fn operand_id(module: &Module, inst: InstId, idx: usize) -> Id {
    module.operands(inst)[idx].as_id().expect("operand is an id")
}

use spirv_ir::Id;

fn operand_inst(module: &Module, inst: InstId, idx: usize) -> InstId {
    let id = operand_id(module, inst, idx);
    module.defining_inst(id).expect("operand id is defined")
}

/// Swap a commutative instruction's operands so that a lone constant
/// operand is always second.
fn canonicalize_inst(module: &mut Module, inst: InstId) -> InstId {
    if module.opcode(inst) == Opcode::OpExtInst {
        if !module.is_commutative(inst) {
            return inst;
        }
        let operands = module.operands(inst).to_vec();
        if operands.len() != 4 {
            return inst;
        }
        let (Some(lhs), Some(rhs)) = (operands[2].as_id(), operands[3].as_id()) else { return inst };
        let lhs_is_const = module.defining_inst(lhs).is_some_and(|i| is_constant_inst(module, i));
        let rhs_is_const = module.defining_inst(rhs).is_some_and(|i| is_constant_inst(module, i));
        if !(lhs_is_const && !rhs_is_const) {
            return inst;
        }
        let type_id = module.type_id(inst);
        let mut new_operands = operands.clone();
        new_operands.swap(2, 3);
        let new_inst = module.create_inst(Opcode::OpExtInst, type_id, new_operands, None).unwrap();
        module.insert_inst_before(new_inst, inst).unwrap();
        return new_inst;
    }

    if !module.is_commutative(inst) {
        return inst;
    }
    let operands = module.operands(inst);
    if operands.len() != 2 {
        return inst;
    }
    let (Some(lhs), Some(rhs)) = (operands[0].as_id(), operands[1].as_id()) else { return inst };
    let lhs_is_const = module.defining_inst(lhs).is_some_and(|i| is_constant_inst(module, i));
    let rhs_is_const = module.defining_inst(rhs).is_some_and(|i| is_constant_inst(module, i));
    if lhs_is_const && !rhs_is_const {
        let opcode = module.opcode(inst);
        let type_id = module.type_id(inst);
        let new_inst = module.create_inst(opcode, type_id, vec![Operand::Id(rhs), Operand::Id(lhs)], None).unwrap();
        module.insert_inst_before(new_inst, inst).unwrap();
        return new_inst;
    }
    inst
}

fn is_constant_inst(module: &Module, inst: InstId) -> bool {
    spirv_ir::CONSTANT_INSTRUCTIONS.contains(&module.opcode(inst))
}

fn peephole_inst(module: &mut Module, inst: InstId) -> InstId {
    match module.opcode(inst) {
        Opcode::OpBitcast => optimize_bitcast(module, inst),
        Opcode::OpCompositeConstruct => optimize_composite_construct(module, inst),
        Opcode::OpIAdd => optimize_iadd(module, inst),
        Opcode::OpIMul => optimize_imul(module, inst),
        Opcode::OpLogicalAnd => optimize_logical_and(module, inst),
        Opcode::OpLogicalEqual => optimize_logical_equal(module, inst),
        Opcode::OpLogicalNot => optimize_self_inverse(module, inst, Opcode::OpLogicalNot),
        Opcode::OpLogicalNotEqual => optimize_logical_not_equal(module, inst),
        Opcode::OpLogicalOr => optimize_logical_or(module, inst),
        Opcode::OpNot => optimize_self_inverse(module, inst, Opcode::OpNot),
        Opcode::OpSNegate => optimize_self_inverse(module, inst, Opcode::OpSNegate),
        Opcode::OpTranspose => optimize_self_inverse(module, inst, Opcode::OpTranspose),
        Opcode::OpVectorShuffle => optimize_vector_shuffle(module, inst),
        _ => inst,
    }
}

/// `bitcast(bitcast(x)) -> bitcast(x)` or `x` if the types line up.
fn optimize_bitcast(module: &mut Module, inst: InstId) -> InstId {
    let source = operand_inst(module, inst, 0);
    if module.opcode(source) != Opcode::OpBitcast {
        return inst;
    }
    let inner = operand_inst(module, source, 0);
    if module.type_id(inst) == module.type_id(inner) {
        return inner;
    }
    let inner_id = operand_id(module, source, 0);
    let type_id = module.type_id(inst);
    let new_inst = module.create_inst(Opcode::OpBitcast, type_id, vec![Operand::Id(inner_id)], None).unwrap();
    module.copy_decorations(new_inst, inst).ok();
    module.insert_inst_before(new_inst, inst).unwrap();
    new_inst
}

/// A chain of `OpCompositeExtract`s drawn from at most two source vectors
/// becomes a single `OpVectorShuffle`.
fn optimize_composite_construct(module: &mut Module, inst: InstId) -> InstId {
    let Some(type_id) = module.type_id(inst) else { return inst };
    let Some(type_inst) = module.defining_inst(type_id) else { return inst };
    if module.opcode(type_inst) != Opcode::OpTypeVector {
        return inst;
    }

    let operands = module.operands(inst).to_vec();
    let mut sources: Vec<Id> = Vec::new();
    for operand in &operands {
        let Some(id) = operand.as_id() else { return inst };
        let Some(extract) = module.defining_inst(id) else { return inst };
        if module.opcode(extract) != Opcode::OpCompositeExtract {
            return inst;
        }
        let src_id = operand_id(module, extract, 0);
        if !sources.contains(&src_id) {
            let Some(src_inst) = module.defining_inst(src_id) else { return inst };
            let Some(src_type) = module.type_id(src_inst) else { return inst };
            let Some(src_type_inst) = module.defining_inst(src_type) else { return inst };
            if module.opcode(src_type_inst) != Opcode::OpTypeVector {
                return inst;
            }
            sources.push(src_id);
        }
        if sources.len() > 2 {
            return inst;
        }
    }
    if sources.is_empty() {
        return inst;
    }

    let vec1_id = sources[0];
    let vec2_id = if sources.len() == 1 { sources[0] } else { sources[1] };
    let vec1_inst = module.defining_inst(vec1_id).unwrap();
    let vec1_type = module.type_id(vec1_inst).unwrap();
    let vec1_type_inst = module.defining_inst(vec1_type).unwrap();
    let vec1_len = module.operands(vec1_type_inst)[1].as_literal_number().unwrap();

    let mut shuffle_operands = vec![Operand::Id(vec1_id), Operand::Id(vec2_id)];
    for operand in &operands {
        let extract = module.defining_inst(operand.as_id().unwrap()).unwrap();
        let src_id = operand_id(module, extract, 0);
        let idx = module.operands(extract)[1].as_literal_number().unwrap();
        let idx = if src_id == vec1_id { idx } else { idx + vec1_len };
        shuffle_operands.push(Operand::LiteralNumber(idx));
    }

    let new_inst = module.create_inst(Opcode::OpVectorShuffle, Some(type_id), shuffle_operands, None).unwrap();
    module.copy_decorations(new_inst, inst).ok();
    module.insert_inst_before(new_inst, inst).unwrap();
    new_inst
}

fn is_zero(module: &Module, inst: InstId) -> bool {
    module.is_constant_value(inst, &ConstValue::Int(0))
}

/// `x + 0 -> x`.
fn optimize_iadd(module: &mut Module, inst: InstId) -> InstId {
    let rhs = operand_inst(module, inst, 1);
    if is_zero(module, rhs) { operand_inst(module, inst, 0) } else { inst }
}

/// `x * 0 -> 0`, `x * 1 -> x`, `x * -1 -> -x`.
fn optimize_imul(module: &mut Module, inst: InstId) -> InstId {
    let rhs = operand_inst(module, inst, 1);
    if module.is_constant_value(rhs, &ConstValue::Int(0)) {
        return rhs;
    }
    if module.is_constant_value(rhs, &ConstValue::Int(1)) {
        return operand_inst(module, inst, 0);
    }
    if module.is_constant_value(rhs, &ConstValue::Int(-1)) {
        let lhs_id = operand_id(module, inst, 0);
        let type_id = module.type_id(inst);
        let new_inst = module.create_inst(Opcode::OpSNegate, type_id, vec![Operand::Id(lhs_id)], None).unwrap();
        module.insert_inst_before(new_inst, inst).unwrap();
        return new_inst;
    }
    inst
}

fn same_operand(module: &Module, inst: InstId, a: usize, b: usize) -> bool {
    module.operands(inst)[a].as_id() == module.operands(inst)[b].as_id()
}

/// `x and true -> x`, `x and false -> false`, `x and x -> x`,
/// De Morgan: `(not a) and (not b) -> not (a or b)`.
fn optimize_logical_and(module: &mut Module, inst: InstId) -> InstId {
    let rhs = operand_inst(module, inst, 1);
    if module.is_constant_value(rhs, &ConstValue::Bool(true)) {
        return operand_inst(module, inst, 0);
    }
    if module.is_constant_value(rhs, &ConstValue::Bool(false)) {
        return rhs;
    }
    if same_operand(module, inst, 0, 1) {
        return operand_inst(module, inst, 0);
    }
    de_morgan(module, inst, Opcode::OpLogicalAnd, Opcode::OpLogicalOr)
}

/// `x or true -> true`, `x or false -> x`, `x or x -> x`,
/// De Morgan: `(not a) or (not b) -> not (a and b)`.
fn optimize_logical_or(module: &mut Module, inst: InstId) -> InstId {
    let rhs = operand_inst(module, inst, 1);
    if module.is_constant_value(rhs, &ConstValue::Bool(true)) {
        return rhs;
    }
    if module.is_constant_value(rhs, &ConstValue::Bool(false)) {
        return operand_inst(module, inst, 0);
    }
    if same_operand(module, inst, 0, 1) {
        return operand_inst(module, inst, 0);
    }
    de_morgan(module, inst, Opcode::OpLogicalOr, Opcode::OpLogicalAnd)
}

fn de_morgan(module: &mut Module, inst: InstId, self_op: Opcode, dual_op: Opcode) -> InstId {
    let lhs = operand_inst(module, inst, 0);
    let rhs = operand_inst(module, inst, 1);
    if module.opcode(lhs) != Opcode::OpLogicalNot || module.opcode(rhs) != Opcode::OpLogicalNot {
        return inst;
    }
    let _ = self_op;
    let op_a = operand_id(module, lhs, 0);
    let op_b = operand_id(module, rhs, 0);
    let type_id = module.type_id(inst);
    let dual_inst = module.create_inst(dual_op, type_id, vec![Operand::Id(op_a), Operand::Id(op_b)], None).unwrap();
    module.insert_inst_before(dual_inst, inst).unwrap();
    let dual_id = module.result_id(dual_inst).unwrap();
    let not_inst = module.create_inst(Opcode::OpLogicalNot, type_id, vec![Operand::Id(dual_id)], None).unwrap();
    module.insert_inst_after(not_inst, dual_inst).unwrap();
    not_inst
}

/// `Equal(x, true) -> x`, `Equal(x, false) -> not(x)`, `Equal(x, x) -> true`.
fn optimize_logical_equal(module: &mut Module, inst: InstId) -> InstId {
    let rhs = operand_inst(module, inst, 1);
    if module.is_constant_value(rhs, &ConstValue::Bool(true)) {
        return operand_inst(module, inst, 0);
    }
    if module.is_constant_value(rhs, &ConstValue::Bool(false)) {
        return negate(module, inst);
    }
    if same_operand(module, inst, 0, 1) {
        let type_id = module.type_id(inst).unwrap();
        return module.get_constant(type_id, ConstValue::Bool(true)).unwrap();
    }
    inst
}

/// `NotEqual(x, false) -> x`, `NotEqual(x, true) -> not(x)`, `NotEqual(x, x) -> false`.
fn optimize_logical_not_equal(module: &mut Module, inst: InstId) -> InstId {
    let rhs = operand_inst(module, inst, 1);
    if module.is_constant_value(rhs, &ConstValue::Bool(false)) {
        return operand_inst(module, inst, 0);
    }
    if module.is_constant_value(rhs, &ConstValue::Bool(true)) {
        return negate(module, inst);
    }
    if same_operand(module, inst, 0, 1) {
        let type_id = module.type_id(inst).unwrap();
        return module.get_constant(type_id, ConstValue::Bool(false)).unwrap();
    }
    inst
}

fn negate(module: &mut Module, inst: InstId) -> InstId {
    let lhs_id = operand_id(module, inst, 0);
    let type_id = module.type_id(inst);
    let new_inst = module.create_inst(Opcode::OpLogicalNot, type_id, vec![Operand::Id(lhs_id)], None).unwrap();
    module.insert_inst_before(new_inst, inst).unwrap();
    new_inst
}

/// Self-inverse operations: `not(not(x)) -> x`, `neg(neg(x)) -> x`,
/// `transpose(transpose(m)) -> m`.
fn optimize_self_inverse(module: &mut Module, inst: InstId, opcode: Opcode) -> InstId {
    let source = operand_inst(module, inst, 0);
    if module.opcode(source) == opcode { operand_inst(module, source, 0) } else { inst }
}

const UNDEF_COMPONENT: u32 = 0xFFFF_FFFF;

/// Canonicalize a vector shuffle: prefer using only the first source
/// vector, collapse an identical-source shuffle into a single-vector one,
/// and eliminate an identity permutation entirely.
fn optimize_vector_shuffle(module: &mut Module, inst: InstId) -> InstId {
    let mut vec1_inst = operand_inst(module, inst, 0);
    let mut vec2_inst = operand_inst(module, inst, 1);
    let operands = module.operands(inst).to_vec();
    let mut components: Vec<u32> = operands[2..].iter().map(|o| o.as_literal_number().unwrap()).collect();

    let vec1_type = module.type_id(vec1_inst).unwrap();
    let vec1_type_inst = module.defining_inst(vec1_type).unwrap();
    let mut vec1_len = module.operands(vec1_type_inst)[1].as_literal_number().unwrap();

    let mut using_vec1 = false;
    let mut using_vec2 = false;
    for &c in &components {
        if c != UNDEF_COMPONENT {
            if c < vec1_len { using_vec1 = true } else { using_vec2 = true }
        }
    }

    if !using_vec1 && !using_vec2 {
        let type_id = module.type_id(inst);
        let new_inst = module.create_inst(Opcode::OpUndef, type_id, vec![], None).unwrap();
        module.insert_inst_before(new_inst, inst).unwrap();
        return new_inst;
    } else if !using_vec2 {
        vec2_inst = vec1_inst;
    } else if !using_vec1 {
        for c in &mut components {
            if *c != UNDEF_COMPONENT {
                *c -= vec1_len;
            }
        }
        vec1_inst = vec2_inst;
    }

    if vec1_inst == vec2_inst {
        let vec1_type = module.type_id(vec1_inst).unwrap();
        let vec1_type_inst = module.defining_inst(vec1_type).unwrap();
        vec1_len = module.operands(vec1_type_inst)[1].as_literal_number().unwrap();
        for c in &mut components {
            if *c != UNDEF_COMPONENT && *c >= vec1_len {
                *c -= vec1_len;
            }
        }
    }

    if vec1_inst == vec2_inst && module.type_id(inst) == module.type_id(vec1_inst) {
        let is_identity = components.iter().enumerate().all(|(idx, &c)| c == UNDEF_COMPONENT || c as usize == idx);
        if is_identity {
            return vec1_inst;
        }
    }

    let vec1_id = module.result_id(vec1_inst).unwrap();
    let vec2_id = module.result_id(vec2_inst).unwrap();
    let mut new_operands = vec![Operand::Id(vec1_id), Operand::Id(vec2_id)];
    new_operands.extend(components.iter().map(|&c| Operand::LiteralNumber(c)));
    if new_operands == operands {
        return inst;
    }
    let type_id = module.type_id(inst);
    let new_inst = module.create_inst(Opcode::OpVectorShuffle, type_id, new_operands, None).unwrap();
    module.copy_decorations(new_inst, inst).ok();
    module.insert_inst_before(new_inst, inst).unwrap();
    new_inst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i32_module() -> (Module, Id) {
        let mut module = Module::new();
        let ty =
            module.get_global_inst(Opcode::OpTypeInt, None, vec![Operand::LiteralNumber(32), Operand::LiteralNumber(1)]).unwrap();
        (module, module.result_id(ty).unwrap())
    }

    #[coverage_helper::test]
    fn folds_add_with_zero_to_the_other_operand() {
        let (mut module, ty) = i32_module();
        let zero = module.get_constant(ty, ConstValue::Int(0)).unwrap();
        let zero_id = module.result_id(zero).unwrap();
        let block = module.create_block(None).unwrap();
        let undef = module.create_inst(Opcode::OpUndef, Some(ty), vec![], None).unwrap();
        module.append_inst_to_block(block, undef).unwrap();
        let undef_id = module.result_id(undef).unwrap();
        let add = module
            .create_inst(Opcode::OpIAdd, Some(ty), vec![Operand::Id(undef_id), Operand::Id(zero_id)], None)
            .unwrap();
        module.append_inst_to_block(block, add).unwrap();

        let result = optimize_inst(&mut module, add);
        assert_eq!(result, undef);
    }

    #[coverage_helper::test]
    fn canonicalizes_commutative_constant_to_second_operand() {
        let (mut module, ty) = i32_module();
        let five = module.get_constant(ty, ConstValue::Int(5)).unwrap();
        let five_id = module.result_id(five).unwrap();
        let block = module.create_block(None).unwrap();
        let undef = module.create_inst(Opcode::OpUndef, Some(ty), vec![], None).unwrap();
        module.append_inst_to_block(block, undef).unwrap();
        let undef_id = module.result_id(undef).unwrap();
        let add = module
            .create_inst(Opcode::OpIAdd, Some(ty), vec![Operand::Id(five_id), Operand::Id(undef_id)], None)
            .unwrap();
        module.append_inst_to_block(block, add).unwrap();

        let result = optimize_inst(&mut module, add);
        assert_eq!(module.operands(result)[0].as_id(), Some(undef_id));
        assert_eq!(module.operands(result)[1].as_id(), Some(five_id));
    }

    #[coverage_helper::test]
    fn double_logical_not_cancels() {
        let mut module = Module::new();
        let bool_ty = module.get_global_inst(Opcode::OpTypeBool, None, vec![]).unwrap();
        let bool_id = module.result_id(bool_ty).unwrap();
        let block = module.create_block(None).unwrap();
        let undef = module.create_inst(Opcode::OpUndef, Some(bool_id), vec![], None).unwrap();
        module.append_inst_to_block(block, undef).unwrap();
        let undef_id = module.result_id(undef).unwrap();
        let not1 = module.create_inst(Opcode::OpLogicalNot, Some(bool_id), vec![Operand::Id(undef_id)], None).unwrap();
        module.append_inst_to_block(block, not1).unwrap();
        let not1_id = module.result_id(not1).unwrap();
        let not2 = module.create_inst(Opcode::OpLogicalNot, Some(bool_id), vec![Operand::Id(not1_id)], None).unwrap();
        module.append_inst_to_block(block, not2).unwrap();

        let result = optimize_inst(&mut module, not2);
        assert_eq!(result, undef);
    }
}
