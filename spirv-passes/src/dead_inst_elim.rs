//! Dead instruction elimination.
//!
//! Two sweeps: debug/decoration instructions whose target was already
//! removed are cleaned up first, then a reverse walk over every
//! instruction destroys anything with no side effects and no uses. `OpPhi`
//! destruction can retroactively kill an instruction already visited this
//! round (a phi's predecessor value may live in a block that appears later
//! in forward order, e.g. across a loop back edge), so the main sweep
//! repeats for as long as a round destroys at least one phi.

use spirv_ir::{Module, Opcode, Operand, DECORATION_INSTRUCTIONS, DEBUG_INSTRUCTIONS};

/// Run dead instruction elimination over the whole module.
pub fn run(module: &mut Module) {
    sweep_debug_and_decorations(module);
    main_sweep(module);
}

fn sweep_debug_and_decorations(module: &mut Module) {
    let debug_insts = module.global_instructions();
    for inst in debug_insts {
        if !module.is_attached(inst) || module.opcode(inst) == Opcode::OpString {
            continue;
        }
        if !DEBUG_INSTRUCTIONS.contains(&module.opcode(inst)) {
            continue;
        }
        if references_dead_target(module, inst) {
            module.destroy_inst(inst);
        }
    }

    let mut decoration_insts: Vec<_> = module
        .global_instructions()
        .into_iter()
        .filter(|&inst| DECORATION_INSTRUCTIONS.contains(&module.opcode(inst)))
        .collect();
    decoration_insts.reverse();
    for inst in decoration_insts {
        if !module.is_attached(inst) || module.opcode(inst) == Opcode::OpDecorationGroup {
            continue;
        }
        if references_dead_target(module, inst) {
            module.destroy_inst(inst);
        }
    }
}

fn references_dead_target(module: &Module, inst: spirv_ir::InstId) -> bool {
    match module.operands(inst).first().and_then(Operand::as_id) {
        Some(target) => module.defining_inst(target).is_none(),
        None => false,
    }
}

fn main_sweep(module: &mut Module) {
    loop {
        let mut phi_destroyed = false;
        for inst in module.instructions_reversed() {
            if !module.is_attached(inst) {
                continue;
            }
            if module.has_side_effects(inst) {
                continue;
            }
            if module.result_id(inst).is_none() {
                continue;
            }
            if !module.uses(inst).is_empty() {
                continue;
            }
            let is_phi = module.opcode(inst) == Opcode::OpPhi;
            module.destroy_inst(inst);
            if is_phi {
                phi_destroyed = true;
            }
        }
        if !phi_destroyed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_ir::{ConstValue, Operand as Op};

    fn scalar_module() -> (Module, spirv_ir::Id) {
        let mut module = Module::new();
        let ty = module.get_global_inst(Opcode::OpTypeInt, None, vec![Op::LiteralNumber(32), Op::LiteralNumber(1)]).unwrap();
        (module, module.result_id(ty).unwrap())
    }

    #[coverage_helper::test]
    fn removes_unused_pure_instruction() {
        let (mut module, ty) = scalar_module();
        let c1 = module.get_constant(ty, ConstValue::Int(1)).unwrap();
        let c1_id = module.result_id(c1).unwrap();
        let block = module.create_block(None).unwrap();
        let add = module.create_inst(Opcode::OpIAdd, Some(ty), vec![Op::Id(c1_id), Op::Id(c1_id)], None).unwrap();
        module.append_inst_to_block(block, add).unwrap();
        let ret = module.create_inst(Opcode::OpReturn, None, vec![], None).unwrap();
        module.append_inst_to_block(block, ret).unwrap();

        run(&mut module);

        assert!(!module.is_attached(add));
        assert!(module.is_attached(ret));
    }

    #[coverage_helper::test]
    fn keeps_side_effecting_instruction_even_with_no_uses() {
        let (mut module, ty) = scalar_module();
        let block = module.create_block(None).unwrap();
        let call = module.create_inst(Opcode::OpFunctionCall, Some(ty), vec![Op::Id(ty)], None).unwrap();
        module.append_inst_to_block(block, call).unwrap();

        run(&mut module);

        assert!(module.is_attached(call));
    }
}
