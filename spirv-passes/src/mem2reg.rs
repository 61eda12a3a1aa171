//! Memory-to-register promotion.
//!
//! Only `OpVariable` declarations at the top of a function's entry block
//! are considered. Each one is promoted to SSA form by walking blocks in
//! order, tracking the "current value" of the variable, inserting a fresh
//! `OpPhi` at any join point with more than one predecessor, and closing
//! phi operands with `OpUndef` for predecessors that never wrote the
//! variable. The pass is deliberately naive about phi placement (one at
//! every join point reached, not just where actually needed) and relies on
//! `dead_inst_elim` to clean up anything left unused.

use std::collections::HashMap;

use spirv_ir::{BlockId, FunctionId, Id, InstId, Module, Opcode, Operand};

pub fn run(module: &mut Module) {
    let functions: Vec<FunctionId> = module.functions().to_vec();
    for function in functions {
        process_function(module, function);
    }
}

fn process_function(module: &mut Module, function: FunctionId) {
    let Some(&entry_block) = module.function_basic_blocks(function).first() else { return };
    let candidates: Vec<InstId> = module
        .block_insts(entry_block)
        .into_iter()
        .take_while(|&inst| module.opcode(inst) == Opcode::OpVariable)
        .collect();
    for var in candidates {
        optimize_variable(module, function, var);
    }
}

fn optimize_variable(module: &mut Module, function: FunctionId, var: InstId) {
    let var_id = module.result_id(var).expect("OpVariable has a result id");
    if module.uses(var).is_empty() {
        module.destroy_inst(var);
        return;
    }
    for user in module.uses(var) {
        if !matches!(module.opcode(user), Opcode::OpLoad | Opcode::OpStore) {
            return;
        }
    }

    let pointee_type = module.type_id(var).expect("OpVariable has a type id");
    let pointee_type =
        pointee_type_of(module, pointee_type).expect("OpVariable's type is a pointer to the pointee type");

    let blocks = module.function_basic_blocks(function);
    let predecessors: HashMap<BlockId, Vec<BlockId>> =
        blocks.iter().map(|&block| (block, module.predecessors(block))).collect();

    let mut exit_value: HashMap<BlockId, Id> = HashMap::new();
    let mut created_phis: Vec<InstId> = Vec::new();

    for &block in &blocks {
        let preds = &predecessors[&block];
        let mut current = match preds.as_slice() {
            [] => None,
            [single] => exit_value.get(single).copied(),
            _ => {
                let phi = module.create_inst(Opcode::OpPhi, Some(pointee_type), Vec::new(), None).unwrap();
                module.prepend_inst_to_block(block, phi).unwrap();
                created_phis.push(phi);
                Some(module.result_id(phi).unwrap())
            }
        };

        for inst in module.block_insts(block) {
            match module.opcode(inst) {
                Opcode::OpLoad if module.operands(inst).first().and_then(Operand::as_id) == Some(var_id) => {
                    let value_id = match current {
                        Some(id) => id,
                        None => {
                            let undef = module.create_inst(Opcode::OpUndef, Some(pointee_type), Vec::new(), None).unwrap();
                            module.insert_inst_before(undef, inst).unwrap();
                            let id = module.result_id(undef).unwrap();
                            current = Some(id);
                            id
                        }
                    };
                    module.replace_uses_with(inst, module.defining_inst(value_id).unwrap());
                    module.destroy_inst(inst);
                }
                Opcode::OpStore if module.operands(inst).first().and_then(Operand::as_id) == Some(var_id) => {
                    let value_id = module.operands(inst)[1].as_id().expect("OpStore's second operand is the stored value");
                    current = Some(value_id);
                    module.destroy_inst(inst);
                }
                _ => {}
            }
        }

        if let Some(value_id) = current {
            exit_value.insert(block, value_id);
        }
    }

    for &block in &blocks {
        let Some(phi) = module.block_insts(block).into_iter().find(|&inst| created_phis.contains(&inst)) else {
            continue;
        };
        for &pred in &predecessors[&block] {
            let label = module.label_inst(pred);
            let value_id = match exit_value.get(&pred) {
                Some(&id) => id,
                None => {
                    let undef = module.create_inst(Opcode::OpUndef, Some(pointee_type), Vec::new(), None).unwrap();
                    insert_before_terminator(module, pred, undef);
                    module.result_id(undef).unwrap()
                }
            };
            let value_inst = module.defining_inst(value_id).expect("phi predecessor value must be defined");
            module.add_to_phi(phi, value_inst, label);
        }
    }

    for phi in created_phis {
        if module.is_attached(phi) && module.uses(phi).is_empty() {
            module.destroy_inst(phi);
        }
    }
    module.destroy_inst(var);
}

fn pointee_type_of(module: &Module, pointer_type: Id) -> Option<Id> {
    let type_inst = module.defining_inst(pointer_type)?;
    if module.opcode(type_inst) != Opcode::OpTypePointer {
        return None;
    }
    module.operands(type_inst).get(1).and_then(Operand::as_id)
}

fn insert_before_terminator(module: &mut Module, block: BlockId, inst: InstId) {
    let insts = module.block_insts(block);
    match insts.last() {
        Some(&terminator) => module.insert_inst_before(inst, terminator).unwrap(),
        None => module.append_inst_to_block(block, inst).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_ir::ConstValue;

    fn setup() -> (Module, FunctionId, Id, Id) {
        let mut module = Module::new();
        let i32_ty = module.get_global_inst(Opcode::OpTypeInt, None, vec![Operand::LiteralNumber(32), Operand::LiteralNumber(1)]).unwrap();
        let i32_id = module.result_id(i32_ty).unwrap();
        let ptr_ty = module
            .get_global_inst(Opcode::OpTypePointer, None, vec![Operand::Enum("Function".into()), Operand::Id(i32_id)])
            .unwrap();
        let ptr_id = module.result_id(ptr_ty).unwrap();
        let void_ty = module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
        let void_id = module.result_id(void_ty).unwrap();
        let fn_ty = module.get_global_inst(Opcode::OpTypeFunction, None, vec![Operand::Id(void_id)]).unwrap();
        let fn_ty_id = module.result_id(fn_ty).unwrap();
        let func = module.create_function(vec![], fn_ty_id, None).unwrap();
        module.append_function(func);
        (module, func, ptr_id, i32_id)
    }

    #[coverage_helper::test]
    fn promotes_single_block_store_then_load() {
        let (mut module, func, ptr_id, i32_id) = setup();
        let entry = module.create_block(None).unwrap();
        module.append_basic_block(func, entry);

        let var = module.create_inst(Opcode::OpVariable, Some(ptr_id), vec![Operand::Enum("Function".into())], None).unwrap();
        module.append_inst_to_block(entry, var).unwrap();
        let var_id = module.result_id(var).unwrap();

        let c42 = module.get_constant(i32_id, ConstValue::Int(42)).unwrap();
        let c42_id = module.result_id(c42).unwrap();
        let store = module.create_inst(Opcode::OpStore, None, vec![Operand::Id(var_id), Operand::Id(c42_id)], None).unwrap();
        module.append_inst_to_block(entry, store).unwrap();
        let load = module.create_inst(Opcode::OpLoad, Some(i32_id), vec![Operand::Id(var_id)], None).unwrap();
        module.append_inst_to_block(entry, load).unwrap();
        let ret = module.create_inst(Opcode::OpReturn, None, vec![], None).unwrap();
        module.append_inst_to_block(entry, ret).unwrap();

        run(&mut module);

        assert!(!module.is_attached(var));
        assert!(!module.is_attached(load));
        assert!(!module.is_attached(store));
        assert_eq!(module.block_insts(entry), vec![ret]);
    }
}
