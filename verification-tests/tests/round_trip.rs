//! Round-trip checks from spec.md §8: `write_binary(read_binary(b)) == b`
//! and `read_text(write_text(m))` is graph-isomorphic to `m` (approximated
//! here, as the unit tests inside `spirv-text` already do, by comparing
//! raw-mode disassembly text — the one surface the grammar guarantees
//! round-trips losslessly).

mod common;

use spirv_ir::{ConstValue, Module, Opcode, Operand};
use spirv_text::AssembleOptions;

fn sample_module() -> Module {
    let mut module = Module::new();
    let i32_ty = common::int_type(&mut module, 32, true);
    let c = module.get_constant(i32_ty, ConstValue::Int(42)).unwrap();
    let c_id = module.result_id(c).unwrap();

    let (func, block) = common::simple_void_function(&mut module);
    let _ = func;
    let copy = module.create_inst(Opcode::OpCopyObject, Some(i32_ty), vec![Operand::Id(c_id)], None).unwrap();
    let ret = *module.block_insts(block).first().unwrap();
    module.insert_inst_before(copy, ret).unwrap();

    let void_id = module.result_id(module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap()).unwrap();
    let _ = void_id;
    module
}

#[coverage_helper::test]
fn binary_round_trip_preserves_byte_stream() {
    let mut module = sample_module();
    let first_bytes = spirv_binary::write_module(&mut module);

    let mut read_back = spirv_binary::read_module(&first_bytes).unwrap();
    let second_bytes = spirv_binary::write_module(&mut read_back);

    assert_eq!(first_bytes, second_bytes);
}

#[coverage_helper::test]
fn binary_round_trip_preserves_instruction_shape() {
    let mut module = sample_module();
    let bytes = spirv_binary::write_module(&mut module);
    let read_back = spirv_binary::read_module(&bytes).unwrap();

    assert_eq!(read_back.functions().len(), module.functions().len());
    let original_ops: Vec<_> = module.instructions().iter().map(|&i| module.opcode(i)).collect();
    let read_ops: Vec<_> = read_back.instructions().iter().map(|&i| read_back.opcode(i)).collect();
    assert_eq!(original_ops, read_ops);
}

#[coverage_helper::test]
fn raw_text_round_trips_losslessly() {
    let mut module = sample_module();
    let text = spirv_text::disassemble(&mut module, AssembleOptions::RAW_OPTIONS);

    let mut reparsed = spirv_text::assemble(&text, AssembleOptions::RAW_OPTIONS).unwrap();
    let text_again = spirv_text::disassemble(&mut reparsed, AssembleOptions::RAW_OPTIONS);

    assert_eq!(text, text_again);
}

#[coverage_helper::test]
fn text_form_round_trips_through_binary() {
    let mut module = sample_module();
    let raw_before = spirv_text::disassemble(&mut module, AssembleOptions::RAW_OPTIONS);

    let bytes = spirv_binary::write_module(&mut module);
    let mut read_back = spirv_binary::read_module(&bytes).unwrap();
    let raw_after = spirv_text::disassemble(&mut read_back, AssembleOptions::RAW_OPTIONS);

    assert_eq!(raw_before, raw_after);
}

#[coverage_helper::test]
fn pretty_disassembly_reassembles_to_the_same_raw_shape() {
    let mut module = sample_module();
    let raw_reference = spirv_text::disassemble(&mut module, AssembleOptions::RAW_OPTIONS);

    let mut module_for_pretty = sample_module();
    let pretty = spirv_text::disassemble(&mut module_for_pretty, AssembleOptions::DEFAULT_OPTIONS);
    let mut reparsed = spirv_text::assemble(&pretty, AssembleOptions::DEFAULT_OPTIONS).unwrap();
    let raw_from_pretty = spirv_text::disassemble(&mut reparsed, AssembleOptions::RAW_OPTIONS);

    assert_eq!(raw_reference, raw_from_pretty);
}
