//! The six concrete optimizer scenarios from spec.md §8, plus the
//! idempotence property `optimize(optimize(m))` graph-isomorphic to
//! `optimize(m)` (checked here via raw-mode disassembly text equality,
//! the same proxy `round_trip.rs` uses for graph isomorphism).

mod common;

use spirv_ir::{ConstValue, Module, Opcode, Operand};
use spirv_text::AssembleOptions;

/// 1. Constant branch folding: `OpBranchConditional %true %A %B` preceded
/// by `OpSelectionMerge %M None` folds to an unconditional branch to `%A`
/// and the `OpSelectionMerge` is destroyed. `simplify_cfg` also prunes the
/// now-unreachable `%B` and merges the single-predecessor `%A` into the
/// entry block in the same run, so the directly observable end state is
/// one block whose value is unambiguously `%A`'s, not `%B`'s.
#[coverage_helper::test]
fn constant_branch_folding() {
    let mut module = Module::new();
    let i32_id = common::int_type(&mut module, 32, true);
    let fn_ty = common::fn_type(&mut module, i32_id);
    let func = module.create_function(vec![], fn_ty, None).unwrap();
    let entry = module.create_block(None).unwrap();
    let then_block = module.create_block(None).unwrap();
    let else_block = module.create_block(None).unwrap();
    module.append_basic_block(func, entry);
    module.append_basic_block(func, then_block);
    module.append_basic_block(func, else_block);
    module.append_function(func);

    let bool_id = common::bool_type(&mut module);
    let cond = module.get_global_inst(Opcode::OpConstantTrue, Some(bool_id), vec![]).unwrap();
    let cond_id = module.result_id(cond).unwrap();
    let then_id = module.result_id(module.label_inst(then_block)).unwrap();
    let else_id = module.result_id(module.label_inst(else_block)).unwrap();

    let merge = module.create_inst(Opcode::OpSelectionMerge, None, vec![Operand::Id(else_id), Operand::Mask(vec![])], None).unwrap();
    module.append_inst_to_block(entry, merge).unwrap();
    let branch = module
        .create_inst(
            Opcode::OpBranchConditional,
            None,
            vec![Operand::Id(cond_id), Operand::Id(then_id), Operand::Id(else_id)],
            None,
        )
        .unwrap();
    module.append_inst_to_block(entry, branch).unwrap();

    let then_value = module.get_constant(i32_id, ConstValue::Int(1)).unwrap();
    let then_value_id = module.result_id(then_value).unwrap();
    let then_ret = module.create_inst(Opcode::OpReturnValue, None, vec![Operand::Id(then_value_id)], None).unwrap();
    module.append_inst_to_block(then_block, then_ret).unwrap();

    let else_value = module.get_constant(i32_id, ConstValue::Int(2)).unwrap();
    let else_value_id = module.result_id(else_value).unwrap();
    let else_ret = module.create_inst(Opcode::OpReturnValue, None, vec![Operand::Id(else_value_id)], None).unwrap();
    module.append_inst_to_block(else_block, else_ret).unwrap();

    spirv_passes::simplify_cfg::run(&mut module);

    assert!(!module.is_attached(merge));
    let remaining_blocks = module.function_basic_blocks(func);
    assert_eq!(remaining_blocks.len(), 1);
    let terminator = *module.block_insts(remaining_blocks[0]).last().unwrap();
    assert_eq!(module.opcode(terminator), Opcode::OpReturnValue);
    assert_eq!(module.operands(terminator)[0].as_id(), Some(then_value_id));
}

/// 2. Mem2reg of a single-assignment local: after `mem2reg` +
/// `dead_inst_elim` the function contains only the return of the stored
/// constant; the variable and its load/store are gone.
#[coverage_helper::test]
fn mem2reg_of_single_assignment_local() {
    let mut module = Module::new();
    let i32_id = common::int_type(&mut module, 32, true);
    let ptr_inst =
        module.get_global_inst(Opcode::OpTypePointer, None, vec![Operand::Enum("Function".into()), Operand::Id(i32_id)]).unwrap();
    let ptr_id = module.result_id(ptr_inst).unwrap();
    let void_id = common::void_type(&mut module);
    let fn_ty = common::fn_type(&mut module, void_id);
    let func = module.create_function(vec![], fn_ty, None).unwrap();
    let entry = module.create_block(None).unwrap();
    module.append_basic_block(func, entry);
    module.append_function(func);

    let var = module.create_inst(Opcode::OpVariable, Some(ptr_id), vec![Operand::Enum("Function".into())], None).unwrap();
    module.append_inst_to_block(entry, var).unwrap();
    let var_id = module.result_id(var).unwrap();

    let c1 = module.get_constant(i32_id, ConstValue::Int(1)).unwrap();
    let c1_id = module.result_id(c1).unwrap();
    let store = module.create_inst(Opcode::OpStore, None, vec![Operand::Id(var_id), Operand::Id(c1_id)], None).unwrap();
    module.append_inst_to_block(entry, store).unwrap();
    let load = module.create_inst(Opcode::OpLoad, Some(i32_id), vec![Operand::Id(var_id)], None).unwrap();
    module.append_inst_to_block(entry, load).unwrap();
    let load_id = module.result_id(load).unwrap();
    let ret = module.create_inst(Opcode::OpReturnValue, None, vec![Operand::Id(load_id)], None).unwrap();
    module.append_inst_to_block(entry, ret).unwrap();

    spirv_passes::mem2reg::run(&mut module);
    spirv_passes::dead_inst_elim::run(&mut module);

    let insts = module.block_insts(entry);
    assert_eq!(insts.len(), 1);
    assert_eq!(module.opcode(insts[0]), Opcode::OpReturnValue);
    assert_eq!(module.operands(insts[0])[0].as_id(), Some(c1_id));
    assert!(!module.is_attached(var));
    assert!(!module.is_attached(load));
    assert!(!module.is_attached(store));
}

/// 3. Vector shuffle identity removal: `OpVectorShuffle v4f32 %v %v 0 1 2 3`
/// where `type(%v) = v4f32` is rewritten to `%v` and the shuffle dies.
#[coverage_helper::test]
fn vector_shuffle_identity_removal() {
    let mut module = Module::new();
    let f32_id = common::float_type(&mut module, 32);
    let v4f32_id = common::vector_type(&mut module, f32_id, 4);
    let (func, block) = common::simple_void_function(&mut module);
    let _ = func;

    let v = module.create_inst(Opcode::OpUndef, Some(v4f32_id), vec![], None).unwrap();
    let v_id = module.result_id(v).unwrap();
    let shuffle = module
        .create_inst(
            Opcode::OpVectorShuffle,
            Some(v4f32_id),
            vec![
                Operand::Id(v_id),
                Operand::Id(v_id),
                Operand::LiteralNumber(0),
                Operand::LiteralNumber(1),
                Operand::LiteralNumber(2),
                Operand::LiteralNumber(3),
            ],
            None,
        )
        .unwrap();
    let shuffle_id = module.result_id(shuffle).unwrap();
    let user = module.create_inst(Opcode::OpCopyObject, Some(v4f32_id), vec![Operand::Id(shuffle_id)], None).unwrap();

    let ret = *module.block_insts(block).first().unwrap();
    module.insert_inst_before(v, ret).unwrap();
    module.insert_inst_before(shuffle, ret).unwrap();
    module.insert_inst_before(user, ret).unwrap();

    spirv_passes::instcombine::run(&mut module);
    spirv_passes::dead_inst_elim::run(&mut module);

    assert_eq!(module.operands(user)[0].as_id(), Some(v_id));
    assert!(!module.is_attached(shuffle));
}

/// 4. Composite construct -> shuffle: extracting components 0, 1, 2 from a
/// `v4f32` then `OpCompositeConstruct`ing a `v3f32` is replaced by a single
/// `OpVectorShuffle v3f32 %v %v 0 1 2`.
#[coverage_helper::test]
fn composite_construct_becomes_shuffle() {
    let mut module = Module::new();
    let f32_id = common::float_type(&mut module, 32);
    let v4f32_id = common::vector_type(&mut module, f32_id, 4);
    let v3f32_id = common::vector_type(&mut module, f32_id, 3);
    let (func, block) = common::simple_void_function(&mut module);
    let _ = func;

    let v = module.create_inst(Opcode::OpUndef, Some(v4f32_id), vec![], None).unwrap();
    let v_id = module.result_id(v).unwrap();
    let ret = *module.block_insts(block).first().unwrap();
    module.insert_inst_before(v, ret).unwrap();

    let mut extract_ids = Vec::new();
    for idx in 0..3u32 {
        let extract =
            module.create_inst(Opcode::OpCompositeExtract, Some(f32_id), vec![Operand::Id(v_id), Operand::LiteralNumber(idx)], None).unwrap();
        module.insert_inst_before(extract, ret).unwrap();
        extract_ids.push(Operand::Id(module.result_id(extract).unwrap()));
    }
    let construct = module.create_inst(Opcode::OpCompositeConstruct, Some(v3f32_id), extract_ids, None).unwrap();
    module.insert_inst_before(construct, ret).unwrap();

    spirv_passes::instcombine::run(&mut module);

    let remaining = module.block_insts(block);
    let shuffle = remaining
        .iter()
        .copied()
        .find(|&i| module.opcode(i) == Opcode::OpVectorShuffle)
        .expect("instcombine should have introduced a shuffle");
    assert_eq!(module.type_id(shuffle), Some(v3f32_id));
    let ops = module.operands(shuffle);
    assert_eq!(ops[0].as_id(), Some(v_id));
    assert_eq!(ops[1].as_id(), Some(v_id));
    assert_eq!(ops[2..], [Operand::LiteralNumber(0), Operand::LiteralNumber(1), Operand::LiteralNumber(2)]);
}

/// 5. Dead function removal: an entry point references `@main`, which
/// never calls `@helper`; `@helper` is destroyed, `@main` remains.
#[coverage_helper::test]
fn dead_function_removal() {
    let mut module = Module::new();
    let (main, _) = common::simple_void_function(&mut module);
    let (helper, _) = common::simple_void_function(&mut module);
    let _ = helper;

    let main_id = module.result_id(module.function_header(main)).unwrap();
    let entry = module
        .create_inst(
            Opcode::OpEntryPoint,
            None,
            vec![Operand::Enum("Fragment".into()), Operand::Id(main_id), Operand::LiteralString("main".into())],
            None,
        )
        .unwrap();
    module.insert_global_inst(entry).unwrap();

    assert_eq!(module.functions().len(), 2);
    spirv_passes::dead_func_elim::run(&mut module);

    assert_eq!(module.functions().len(), 1);
    assert_eq!(module.functions()[0], main);
}

/// 6. Logical De Morgan: `OpLogicalAnd bool (OpLogicalNot bool %a)
/// (OpLogicalNot bool %b)` is rewritten to
/// `OpLogicalNot bool (OpLogicalOr bool %a %b)`.
#[coverage_helper::test]
fn logical_and_of_nots_becomes_not_of_or() {
    let mut module = Module::new();
    let bool_id = common::bool_type(&mut module);
    let (func, block) = common::simple_void_function(&mut module);
    let _ = func;

    let a = module.create_inst(Opcode::OpUndef, Some(bool_id), vec![], None).unwrap();
    let b = module.create_inst(Opcode::OpUndef, Some(bool_id), vec![], None).unwrap();
    let a_id = module.result_id(a).unwrap();
    let b_id = module.result_id(b).unwrap();
    let not_a = module.create_inst(Opcode::OpLogicalNot, Some(bool_id), vec![Operand::Id(a_id)], None).unwrap();
    let not_b = module.create_inst(Opcode::OpLogicalNot, Some(bool_id), vec![Operand::Id(b_id)], None).unwrap();
    let not_a_id = module.result_id(not_a).unwrap();
    let not_b_id = module.result_id(not_b).unwrap();
    let and = module
        .create_inst(Opcode::OpLogicalAnd, Some(bool_id), vec![Operand::Id(not_a_id), Operand::Id(not_b_id)], None)
        .unwrap();
    let and_id = module.result_id(and).unwrap();
    let user = module.create_inst(Opcode::OpCopyObject, Some(bool_id), vec![Operand::Id(and_id)], None).unwrap();

    let ret = *module.block_insts(block).first().unwrap();
    for inst in [a, b, not_a, not_b, and, user] {
        module.insert_inst_before(inst, ret).unwrap();
    }

    spirv_passes::instcombine::run(&mut module);
    spirv_passes::dead_inst_elim::run(&mut module);

    let rewritten_id = module.operands(user)[0].as_id().expect("user still references an id");
    let rewritten = module.defining_inst(rewritten_id).expect("rewritten value is defined");
    assert_eq!(module.opcode(rewritten), Opcode::OpLogicalNot);
    let inner_id = module.operands(rewritten)[0].as_id().expect("OpLogicalNot operand is an id");
    let inner = module.defining_inst(inner_id).expect("inner value is defined");
    assert_eq!(module.opcode(inner), Opcode::OpLogicalOr);
    let inner_ops: Vec<_> = module.operands(inner).iter().filter_map(Operand::as_id).collect();
    assert_eq!(inner_ops, vec![a_id, b_id]);
}

/// `optimize(optimize(m))` produces a module graph-isomorphic to
/// `optimize(m)` (approximated via raw-mode disassembly text equality).
#[coverage_helper::test]
fn optimize_is_idempotent() {
    let mut once = Module::new();
    let (main, block) = common::simple_void_function(&mut once);
    let main_id = once.result_id(once.function_header(main)).unwrap();
    let entry = once
        .create_inst(
            Opcode::OpEntryPoint,
            None,
            vec![Operand::Enum("Fragment".into()), Operand::Id(main_id), Operand::LiteralString("main".into())],
            None,
        )
        .unwrap();
    once.insert_global_inst(entry).unwrap();
    let bool_id = common::bool_type(&mut once);
    let t = once.get_global_inst(Opcode::OpConstantTrue, Some(bool_id), vec![]).unwrap();
    let t_id = once.result_id(t).unwrap();
    let not_t = once.create_inst(Opcode::OpLogicalNot, Some(bool_id), vec![Operand::Id(t_id)], None).unwrap();
    let ret = *once.block_insts(block).first().unwrap();
    once.insert_inst_before(not_t, ret).unwrap();

    let mut twice = clone_via_round_trip(&mut once);

    spirv_passes::optimize(&mut once);
    spirv_passes::optimize(&mut twice);
    spirv_passes::optimize(&mut twice);

    let once_text = spirv_text::disassemble(&mut once, AssembleOptions::RAW_OPTIONS);
    let twice_text = spirv_text::disassemble(&mut twice, AssembleOptions::RAW_OPTIONS);
    assert_eq!(once_text, twice_text);
}

fn clone_via_round_trip(module: &mut Module) -> Module {
    let bytes = spirv_binary::write_module(module);
    spirv_binary::read_module(&bytes).unwrap()
}
