//! Cross-crate checks of the use-def invariants in spec.md §3/§8: every
//! operand id the graph knows about agrees with its defining instruction
//! and use-set in both directions, terminators are well-formed, and the
//! mutation APIs that touch the use-def web (`replace_uses_with`,
//! `renumber_temp_ids`) leave it consistent.

mod common;

use spirv_ir::{BRANCH_INSTRUCTIONS, ConstValue, Module, Opcode, Operand};

/// ∀ instruction `i`, ∀ operand `o` of `i` that is an Id: `i ∈ o.uses`.
/// ∀ Id `x`, ∀ `i ∈ x.uses`: `x` appears as `i.type_id` or in `i.operands`.
#[coverage_helper::test]
fn use_def_is_bidirectionally_consistent() {
    let mut module = Module::new();
    let i32_ty = common::int_type(&mut module, 32, true);
    let a = module.get_constant(i32_ty, ConstValue::Int(1)).unwrap();
    let a_id = module.result_id(a).unwrap();
    let b = module.get_constant(i32_ty, ConstValue::Int(2)).unwrap();
    let b_id = module.result_id(b).unwrap();

    let (func, block) = common::simple_void_function(&mut module);
    let _ = func;
    let sum = module
        .create_inst(Opcode::OpIAdd, Some(i32_ty), vec![Operand::Id(a_id), Operand::Id(b_id)], None)
        .unwrap();
    let ret = *module.block_insts(block).first().unwrap();
    module.insert_inst_before(sum, ret).unwrap();

    for inst in module.instructions() {
        let mut ids: Vec<_> = module.operands(inst).iter().filter_map(Operand::as_id).collect();
        ids.extend(module.type_id(inst));
        for id in ids {
            assert!(module.uses_of(id).contains(&inst), "{inst:?} operand not registered in its id's use-set");
        }
    }

    for &id in &[a_id, b_id] {
        for user in module.uses_of(id) {
            let referenced = module.type_id(user) == Some(id) || module.operands(user).iter().any(|o| o.as_id() == Some(id));
            assert!(referenced, "use-set entry does not actually reference the id");
        }
    }
}

/// ∀ concrete Id `x` with `x.defining_inst = d`: `d.result_id = x`, and a
/// result id cannot be given to a second instruction.
#[coverage_helper::test]
fn single_definition_is_enforced() {
    let mut module = Module::new();
    let ty = module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
    let ty_id = module.result_id(ty).unwrap();
    assert_eq!(module.defining_inst(ty_id), Some(ty));

    let err = module.create_inst(Opcode::OpTypeBool, None, vec![], Some(ty_id)).unwrap_err();
    assert!(matches!(err, spirv_ir::IrError::AlreadyDefined(_)));
}

/// ∀ basic block `b` in a function: `b.insts[-1].opcode` is a branch
/// instruction and no earlier instruction in `b` is a branch.
#[coverage_helper::test]
fn every_block_has_exactly_one_trailing_terminator() {
    let mut module = Module::new();
    let (_, block) = common::simple_void_function(&mut module);
    let insts = module.block_insts(block);
    let (last, body) = insts.split_last().unwrap();
    assert!(BRANCH_INSTRUCTIONS.contains(&module.opcode(*last)));
    for inst in body {
        assert!(!BRANCH_INSTRUCTIONS.contains(&module.opcode(*inst)));
    }
}

/// `get_constant(t, v)` called twice returns the same instruction.
#[coverage_helper::test]
fn get_constant_interning_is_idempotent() {
    let mut module = Module::new();
    let i32_ty = common::int_type(&mut module, 32, true);
    let first = module.get_constant(i32_ty, ConstValue::Int(7)).unwrap();
    let second = module.get_constant(i32_ty, ConstValue::Int(7)).unwrap();
    assert_eq!(first, second);
}

/// After `replace_uses_with`, the old id's use-set is empty and every
/// former user now references the new id.
#[coverage_helper::test]
fn replace_uses_with_migrates_every_user() {
    let mut module = Module::new();
    let i32_ty = common::int_type(&mut module, 32, true);
    let old = module.get_constant(i32_ty, ConstValue::Int(1)).unwrap();
    let old_id = module.result_id(old).unwrap();
    let new = module.get_constant(i32_ty, ConstValue::Int(2)).unwrap();

    let (_, block) = common::simple_void_function(&mut module);
    let user = module.create_inst(Opcode::OpCopyObject, Some(i32_ty), vec![Operand::Id(old_id)], None).unwrap();
    let ret = *module.block_insts(block).first().unwrap();
    module.insert_inst_before(user, ret).unwrap();

    module.replace_uses_with(old, new);

    assert!(module.uses_of(old_id).is_empty());
    let new_id = module.result_id(new).unwrap();
    assert_eq!(module.operands(user)[0].as_id(), Some(new_id));
}

/// After `renumber_temp_ids`, no id reachable from the module is temporary.
#[coverage_helper::test]
fn renumber_temp_ids_clears_every_temporary() {
    let mut module = Module::new();
    let (_, block) = common::simple_void_function(&mut module);
    assert!(module.is_temporary(module.result_id(module.label_inst(block)).unwrap()));

    module.renumber_temp_ids();

    for inst in module.instructions() {
        if let Some(id) = module.result_id(inst) {
            assert!(!module.is_temporary(id));
        }
    }
}
