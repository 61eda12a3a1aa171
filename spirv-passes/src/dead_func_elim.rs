//! Dead function elimination.
//!
//! A function is reachable if it is named by an `OpEntryPoint` or called
//! (directly or transitively) from a reachable function's `OpFunctionCall`
//! instructions. Everything else is destroyed.

use std::collections::{HashMap, HashSet};

use spirv_ir::{FunctionId, Module, Opcode};

/// Run dead function elimination over the whole module.
pub fn run(module: &mut Module) {
    let id_to_func: HashMap<spirv_ir::Id, FunctionId> = module
        .functions()
        .iter()
        .map(|&func| (module.result_id(module.function_header(func)).expect("OpFunction has a result id"), func))
        .collect();

    let mut reachable = HashSet::new();
    let entry_points: Vec<_> = module
        .global_instructions()
        .into_iter()
        .filter(|&inst| module.opcode(inst) == Opcode::OpEntryPoint)
        .collect();
    for entry in entry_points {
        if let Some(func_id) = module.operands(entry)[1].as_id() {
            if let Some(&func) = id_to_func.get(&func_id) {
                mark_reachable(module, func, &id_to_func, &mut reachable);
            }
        }
    }

    let unreachable: Vec<FunctionId> = module.functions().iter().copied().filter(|f| !reachable.contains(f)).collect();
    for func in unreachable {
        module.destroy_function(func).expect("function is still registered in the module");
    }
}

fn mark_reachable(
    module: &Module,
    func: FunctionId,
    id_to_func: &HashMap<spirv_ir::Id, FunctionId>,
    reachable: &mut HashSet<FunctionId>,
) {
    if !reachable.insert(func) {
        return;
    }
    for inst in module.function_instructions(func) {
        if module.opcode(inst) != Opcode::OpFunctionCall {
            continue;
        }
        let Some(callee_id) = module.operands(inst)[0].as_id() else { continue };
        if let Some(&callee) = id_to_func.get(&callee_id) {
            mark_reachable(module, callee, id_to_func, reachable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_ir::Operand;

    fn void_function(module: &mut Module) -> FunctionId {
        let void_ty = module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
        let void_id = module.result_id(void_ty).unwrap();
        let fn_ty = module.get_global_inst(Opcode::OpTypeFunction, None, vec![Operand::Id(void_id)]).unwrap();
        let fn_ty_id = module.result_id(fn_ty).unwrap();
        let func = module.create_function(vec![], fn_ty_id, None).unwrap();
        module.append_function(func);
        func
    }

    #[coverage_helper::test]
    fn destroys_functions_unreachable_from_entry_points() {
        let mut module = Module::new();
        let entry_func = void_function(&mut module);
        let dead_func = void_function(&mut module);
        let entry_id = module.result_id(module.function_header(entry_func)).unwrap();
        let _entry = module
            .get_global_inst(
                Opcode::OpEntryPoint,
                None,
                vec![Operand::Enum("Fragment".into()), Operand::Id(entry_id), Operand::LiteralString("main".into())],
            )
            .unwrap();

        run(&mut module);

        assert!(module.functions().contains(&entry_func));
        assert!(!module.functions().contains(&dead_func));
    }

    #[coverage_helper::test]
    fn keeps_functions_reachable_via_call() {
        let mut module = Module::new();
        let entry_func = void_function(&mut module);
        let callee_func = void_function(&mut module);
        let void_ty = module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
        let void_ty_id = module.result_id(void_ty).unwrap();
        let callee_header_id = module.result_id(module.function_header(callee_func)).unwrap();
        let block = module.create_block(None).unwrap();
        let call =
            module.create_inst(Opcode::OpFunctionCall, Some(void_ty_id), vec![Operand::Id(callee_header_id)], None).unwrap();
        module.append_inst_to_block(block, call).unwrap();
        module.append_basic_block(entry_func, block);

        let entry_id = module.result_id(module.function_header(entry_func)).unwrap();
        let _entry = module
            .get_global_inst(
                Opcode::OpEntryPoint,
                None,
                vec![Operand::Enum("Fragment".into()), Operand::Id(entry_id), Operand::LiteralString("main".into())],
            )
            .unwrap();

        run(&mut module);

        assert!(module.functions().contains(&callee_func));
    }
}
