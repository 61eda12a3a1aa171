//! Control-flow simplification.
//!
//! Four sub-passes run once per module, in order: fold constant-condition
//! branches to unconditional ones, remove blocks unreachable from the
//! entry block (full depth-first reachability, not just "has no
//! predecessors" — a loop body can still be reached only through a block
//! that is itself unreachable), merge a block into its sole predecessor
//! when safe, and collapse phis whose incoming values all agree.

use std::collections::HashSet;

use spirv_ir::{BlockId, FunctionId, Module, Opcode, Operand};

pub fn run(module: &mut Module) {
    let functions: Vec<FunctionId> = module.functions().to_vec();
    for &function in &functions {
        fold_constant_branches(module, function);
    }
    for &function in &functions {
        remove_unreachable_blocks(module, function);
    }
    for &function in &functions {
        merge_blocks(module, function);
    }
    for &function in &functions {
        collapse_phis(module, function);
    }
}

fn fold_constant_branches(module: &mut Module, function: FunctionId) {
    for block in module.function_basic_blocks(function) {
        let Some(&terminator) = module.block_insts(block).last() else { continue };
        let new_target = match module.opcode(terminator) {
            Opcode::OpBranchConditional => {
                let cond = module.operands(terminator)[0].as_id().expect("condition operand is an id");
                let then_id = module.operands(terminator)[1].as_id().expect("then target is an id");
                let else_id = module.operands(terminator)[2].as_id().expect("else target is an id");
                if then_id == else_id {
                    Some(then_id)
                } else if let Some(cond_inst) = module.defining_inst(cond) {
                    match module.opcode(cond_inst) {
                        Opcode::OpConstantTrue => Some(then_id),
                        Opcode::OpConstantFalse => Some(else_id),
                        _ => None,
                    }
                } else {
                    None
                }
            }
            Opcode::OpSwitch => {
                let operands = module.operands(terminator);
                let default_id = operands[1].as_id().expect("switch default target is an id");
                let mut targets = operands[2..].iter();
                let mut all_match_default = true;
                while let Some(_literal) = targets.next() {
                    match targets.next() {
                        Some(Operand::Id(target)) if *target == default_id => {}
                        _ => {
                            all_match_default = false;
                            break;
                        }
                    }
                }
                if all_match_default { Some(default_id) } else { None }
            }
            _ => None,
        };

        let Some(target) = new_target else { continue };
        remove_merge_header(module, block);
        let branch = module.create_inst(Opcode::OpBranch, None, vec![Operand::Id(target)], None).unwrap();
        module.insert_inst_before(branch, terminator).unwrap();
        module.destroy_inst(terminator);
    }
}

fn remove_merge_header(module: &mut Module, block: BlockId) {
    let insts = module.block_insts(block);
    let Some(&before_terminator) = insts.iter().rev().nth(1) else { return };
    if matches!(module.opcode(before_terminator), Opcode::OpSelectionMerge | Opcode::OpLoopMerge) {
        module.destroy_inst(before_terminator);
    }
}

fn remove_unreachable_blocks(module: &mut Module, function: FunctionId) {
    let blocks = module.function_basic_blocks(function);
    let Some(&entry) = blocks.first() else { return };
    let mut reachable = HashSet::new();
    let mut stack = vec![entry];
    while let Some(block) = stack.pop() {
        if !reachable.insert(block) {
            continue;
        }
        stack.extend(module.get_successors(block));
    }
    for block in blocks.into_iter().rev() {
        if !reachable.contains(&block) {
            module.destroy_block(block).unwrap();
        }
    }
}

fn merge_blocks(module: &mut Module, function: FunctionId) {
    let merge_targets = merge_target_set(module, function);
    let mut blocks = module.function_basic_blocks(function);
    let Some(entry) = blocks.first().copied() else { return };
    blocks.retain(|&b| b != entry);
    for block in blocks.into_iter().rev() {
        if merge_targets.contains(&block) {
            continue;
        }
        let preds = module.predecessors(block);
        let [pred] = preds.as_slice() else { continue };
        let pred_insts = module.block_insts(*pred);
        let Some(&pred_terminator) = pred_insts.last() else { continue };
        if module.opcode(pred_terminator) != Opcode::OpBranch {
            continue;
        }
        let branch_target = module.operands(pred_terminator)[0].as_id().expect("OpBranch target is an id");
        if module.defining_inst(branch_target) != Some(module.label_inst(block)) {
            continue;
        }

        module.destroy_inst(pred_terminator);
        for inst in module.block_insts(block) {
            module.remove_inst(inst).unwrap();
            module.append_inst_to_block(*pred, inst).unwrap();
        }
        module.destroy_block(block).unwrap();
    }
}

fn merge_target_set(module: &Module, function: FunctionId) -> HashSet<BlockId> {
    let mut targets = HashSet::new();
    for block in module.function_basic_blocks(function) {
        for inst in module.block_insts(block) {
            let target_operand = match module.opcode(inst) {
                Opcode::OpSelectionMerge | Opcode::OpLoopMerge => Some(0),
                _ => None,
            };
            if let Some(idx) = target_operand {
                if let Some(target_id) = module.operands(inst).get(idx).and_then(Operand::as_id) {
                    if let Some(label) = module.defining_inst(target_id) {
                        if let Some(b) = module.block_of(label) {
                            targets.insert(b);
                        }
                    }
                }
            }
            if module.opcode(inst) == Opcode::OpLoopMerge {
                if let Some(continue_id) = module.operands(inst).get(1).and_then(Operand::as_id) {
                    if let Some(label) = module.defining_inst(continue_id) {
                        if let Some(b) = module.block_of(label) {
                            targets.insert(b);
                        }
                    }
                }
            }
        }
    }
    targets
}

fn collapse_phis(module: &mut Module, function: FunctionId) {
    loop {
        let mut changed = false;
        let phis: Vec<_> = module
            .function_basic_blocks(function)
            .into_iter()
            .flat_map(|block| module.block_insts(block))
            .filter(|&inst| module.is_attached(inst) && module.opcode(inst) == Opcode::OpPhi)
            .collect();
        for phi in phis {
            if !module.is_attached(phi) {
                continue;
            }
            let operands = module.operands(phi);
            let values: Vec<_> = operands.iter().step_by(2).filter_map(Operand::as_id).collect();
            let Some(&first) = values.first() else { continue };
            if values.iter().all(|&v| v == first) {
                let value_inst = module.defining_inst(first).expect("phi value must be defined");
                module.replace_uses_with(phi, value_inst);
                module.destroy_inst(phi);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[coverage_helper::test]
    fn folds_constant_true_branch() {
        let mut module = Module::new();
        let void_ty = module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
        let void_id = module.result_id(void_ty).unwrap();
        let fn_ty = module.get_global_inst(Opcode::OpTypeFunction, None, vec![Operand::Id(void_id)]).unwrap();
        let fn_ty_id = module.result_id(fn_ty).unwrap();
        let func = module.create_function(vec![], fn_ty_id, None).unwrap();
        module.append_function(func);

        let entry = module.create_block(None).unwrap();
        let then_block = module.create_block(None).unwrap();
        let else_block = module.create_block(None).unwrap();
        module.append_basic_block(func, entry);
        module.append_basic_block(func, then_block);
        module.append_basic_block(func, else_block);

        let bool_ty = module.get_global_inst(Opcode::OpTypeBool, None, vec![]).unwrap();
        let bool_id = module.result_id(bool_ty).unwrap();
        let cond = module.get_global_inst(Opcode::OpConstantTrue, Some(bool_id), vec![]).unwrap();
        let cond_id = module.result_id(cond).unwrap();
        let then_label = module.result_id(module.label_inst(then_block)).unwrap();
        let else_label = module.result_id(module.label_inst(else_block)).unwrap();
        let branch = module
            .create_inst(
                Opcode::OpBranchConditional,
                None,
                vec![Operand::Id(cond_id), Operand::Id(then_label), Operand::Id(else_label)],
                None,
            )
            .unwrap();
        module.append_inst_to_block(entry, branch).unwrap();
        for block in [then_block, else_block] {
            let ret = module.create_inst(Opcode::OpReturn, None, vec![], None).unwrap();
            module.append_inst_to_block(block, ret).unwrap();
        }

        run(&mut module);

        let terminator = *module.block_insts(entry).last().unwrap();
        assert_eq!(module.opcode(terminator), Opcode::OpBranch);
        assert!(!module.is_attached(branch));
    }
}
