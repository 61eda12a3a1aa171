//! Constant propagation.
//!
//! For an instruction whose every `Id` operand is itself a constant
//! instruction, fold it to a constant and intern the result through
//! [`Module::get_constant`]/[`Module::get_global_inst`] so duplicate
//! constants are never created. Exposed both as its own pass (`run`) and
//! as `optimize_inst`, which `instcombine` calls on every instruction it
//! rewrites so a single combined loop covers both passes (spec.md §4.10's
//! last bullet).

use spirv_ir::{ConstValue, FunctionId, InstId, Module, Opcode, Operand};

/// Run constant propagation over every function in the module.
pub fn run(module: &mut Module) {
    let functions: Vec<FunctionId> = module.functions().to_vec();
    for function in functions {
        for inst in module.function_instructions(function) {
            if !module.is_attached(inst) {
                continue;
            }
            if let Some(folded) = optimize_inst(module, inst) {
                if folded != inst {
                    if module.is_attached(folded) {
                        module.replace_uses_with(inst, folded);
                        module.destroy_inst(inst);
                    } else {
                        module.replace_with(inst, folded).expect("folded instruction is ready to attach");
                    }
                }
            }
        }
    }
}

/// Fold `inst` to an existing or freshly interned constant instruction, if
/// every `Id` operand it has is itself constant-valued and its opcode is
/// one this pass knows how to fold.
pub(crate) fn optimize_inst(module: &mut Module, inst: InstId) -> Option<InstId> {
    let operand_ids: Vec<_> = module.operands(inst).iter().filter_map(Operand::as_id).collect();
    for id in operand_ids {
        let defining = module.defining_inst(id)?;
        module.value(defining)?;
    }
    match module.opcode(inst) {
        Opcode::OpCompositeConstruct => fold_composite_construct(module, inst),
        Opcode::OpCompositeExtract => fold_composite_extract(module, inst),
        Opcode::OpVectorShuffle => fold_vector_shuffle(module, inst),
        Opcode::OpLogicalAnd => fold_logical(module, inst, |a, b| a && b),
        Opcode::OpLogicalOr => fold_logical(module, inst, |a, b| a || b),
        Opcode::OpLogicalEqual => fold_logical(module, inst, |a, b| a == b),
        Opcode::OpLogicalNotEqual => fold_logical(module, inst, |a, b| a != b),
        Opcode::OpLogicalNot => fold_logical_not(module, inst),
        _ => None,
    }
}

fn fold_composite_construct(module: &mut Module, inst: InstId) -> Option<InstId> {
    let result_type = module.type_id(inst)?;
    let values: Vec<ConstValue> = module
        .operands(inst)
        .iter()
        .filter_map(Operand::as_id)
        .map(|id| module.defining_inst(id).and_then(|i| module.value(i)))
        .collect::<Option<_>>()?;
    module.get_constant(result_type, ConstValue::Composite(values)).ok()
}

fn fold_composite_extract(module: &mut Module, inst: InstId) -> Option<InstId> {
    let operands = module.operands(inst);
    let composite_id = operands[0].as_id()?;
    let indices: Vec<u32> = operands[1..].iter().filter_map(Operand::as_literal_number).collect();
    let mut value = module.defining_inst(composite_id).and_then(|i| module.value(i))?;
    for idx in indices {
        let ConstValue::Composite(elems) = value else { return None };
        value = elems.into_iter().nth(idx as usize)?;
    }
    let result_type = module.type_id(inst)?;
    module.get_constant(result_type, value).ok()
}

fn fold_vector_shuffle(module: &mut Module, inst: InstId) -> Option<InstId> {
    const UNDEF: u32 = 0xFFFF_FFFF;
    let operands = module.operands(inst);
    let vec1_id = operands[0].as_id()?;
    let vec2_id = operands[1].as_id()?;
    let vec1_val = module.defining_inst(vec1_id).and_then(|i| module.value(i))?;
    let vec2_val = module.defining_inst(vec2_id).and_then(|i| module.value(i))?;
    let mut combined = match vec1_val {
        ConstValue::Composite(v) => v,
        scalar => vec![scalar],
    };
    combined.extend(match vec2_val {
        ConstValue::Composite(v) => v,
        scalar => vec![scalar],
    });
    let indices: Vec<u32> = operands[2..].iter().filter_map(Operand::as_literal_number).collect();
    let result: Vec<ConstValue> = indices
        .into_iter()
        .map(|idx| if idx == UNDEF { combined.first().cloned() } else { combined.get(idx as usize).cloned() })
        .collect::<Option<_>>()?;
    let result_type = module.type_id(inst)?;
    module.get_constant(result_type, ConstValue::Composite(result)).ok()
}

fn fold_logical(module: &mut Module, inst: InstId, f: impl Fn(bool, bool) -> bool) -> Option<InstId> {
    let operands = module.operands(inst);
    let a = operands[0].as_id()?;
    let b = operands[1].as_id()?;
    let a_val = module.defining_inst(a).and_then(|i| module.value(i))?;
    let b_val = module.defining_inst(b).and_then(|i| module.value(i))?;
    let result = componentwise_bool(&a_val, &b_val, &f)?;
    let result_type = module.type_id(inst)?;
    module.get_constant(result_type, result).ok()
}

fn componentwise_bool(a: &ConstValue, b: &ConstValue, f: &impl Fn(bool, bool) -> bool) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Bool(x), ConstValue::Bool(y)) => Some(ConstValue::Bool(f(*x, *y))),
        (ConstValue::Composite(xs), ConstValue::Composite(ys)) if xs.len() == ys.len() => {
            let mapped: Vec<ConstValue> =
                xs.iter().zip(ys).map(|(x, y)| componentwise_bool(x, y, f)).collect::<Option<_>>()?;
            Some(ConstValue::Composite(mapped))
        }
        _ => None,
    }
}

fn fold_logical_not(module: &mut Module, inst: InstId) -> Option<InstId> {
    let operands = module.operands(inst);
    let a = operands[0].as_id()?;
    let a_val = module.defining_inst(a).and_then(|i| module.value(i))?;
    let result = componentwise_not(&a_val)?;
    let result_type = module.type_id(inst)?;
    module.get_constant(result_type, result).ok()
}

fn componentwise_not(a: &ConstValue) -> Option<ConstValue> {
    match a {
        ConstValue::Bool(x) => Some(ConstValue::Bool(!x)),
        ConstValue::Composite(xs) => {
            let mapped: Vec<ConstValue> = xs.iter().map(componentwise_not).collect::<Option<_>>()?;
            Some(ConstValue::Composite(mapped))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[coverage_helper::test]
    fn folds_logical_and_of_two_bool_constants() {
        let mut module = Module::new();
        let bool_ty = module.get_global_inst(Opcode::OpTypeBool, None, vec![]).unwrap();
        let bool_id = module.result_id(bool_ty).unwrap();
        let t = module.get_global_inst(Opcode::OpConstantTrue, Some(bool_id), vec![]).unwrap();
        let f = module.get_global_inst(Opcode::OpConstantFalse, Some(bool_id), vec![]).unwrap();
        let t_id = module.result_id(t).unwrap();
        let f_id = module.result_id(f).unwrap();
        let and_inst =
            module.create_inst(Opcode::OpLogicalAnd, Some(bool_id), vec![Operand::Id(t_id), Operand::Id(f_id)], None).unwrap();

        let folded = optimize_inst(&mut module, and_inst).expect("both operands are constant");
        assert_eq!(module.opcode(folded), Opcode::OpConstantFalse);
    }

    #[coverage_helper::test]
    fn does_not_fold_when_an_operand_is_not_constant() {
        let mut module = Module::new();
        let bool_ty = module.get_global_inst(Opcode::OpTypeBool, None, vec![]).unwrap();
        let bool_id = module.result_id(bool_ty).unwrap();
        let t = module.get_global_inst(Opcode::OpConstantTrue, Some(bool_id), vec![]).unwrap();
        let t_id = module.result_id(t).unwrap();
        let block = module.create_block(None).unwrap();
        let param = module.create_inst(Opcode::OpUndef, Some(bool_id), vec![], None).unwrap();
        module.append_inst_to_block(block, param).unwrap();
        let param_id = module.result_id(param).unwrap();
        let and_inst = module
            .create_inst(Opcode::OpLogicalAnd, Some(bool_id), vec![Operand::Id(t_id), Operand::Id(param_id)], None)
            .unwrap();

        assert!(optimize_inst(&mut module, and_inst).is_none());
    }
}
