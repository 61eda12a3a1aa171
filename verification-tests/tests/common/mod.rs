//! Shared module-building helpers for the cross-crate property and
//! round-trip tests in this crate.

use spirv_ir::{FunctionId, Id, Module, Opcode, Operand};

pub fn void_type(module: &mut Module) -> Id {
    let inst = module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
    module.result_id(inst).unwrap()
}

pub fn bool_type(module: &mut Module) -> Id {
    let inst = module.get_global_inst(Opcode::OpTypeBool, None, vec![]).unwrap();
    module.result_id(inst).unwrap()
}

pub fn int_type(module: &mut Module, bitwidth: u32, signed: bool) -> Id {
    let inst = module
        .get_global_inst(
            Opcode::OpTypeInt,
            None,
            vec![Operand::LiteralNumber(bitwidth), Operand::LiteralNumber(u32::from(signed))],
        )
        .unwrap();
    module.result_id(inst).unwrap()
}

pub fn float_type(module: &mut Module, bitwidth: u32) -> Id {
    let inst = module.get_global_inst(Opcode::OpTypeFloat, None, vec![Operand::LiteralNumber(bitwidth)]).unwrap();
    module.result_id(inst).unwrap()
}

pub fn vector_type(module: &mut Module, elem: Id, count: u32) -> Id {
    let inst = module
        .get_global_inst(Opcode::OpTypeVector, None, vec![Operand::Id(elem), Operand::LiteralNumber(count)])
        .unwrap();
    module.result_id(inst).unwrap()
}

/// A no-argument function type returning `ret`.
pub fn fn_type(module: &mut Module, ret: Id) -> Id {
    let inst = module.get_global_inst(Opcode::OpTypeFunction, None, vec![Operand::Id(ret)]).unwrap();
    module.result_id(inst).unwrap()
}

/// A detached, appended void() function with a single entry block
/// terminated by `OpReturn`. Returns the function and its entry block.
pub fn simple_void_function(module: &mut Module) -> (FunctionId, spirv_ir::BlockId) {
    let void_id = void_type(module);
    let fn_ty = fn_type(module, void_id);
    let func = module.create_function(vec![], fn_ty, None).unwrap();
    let block = module.create_block(None).unwrap();
    let ret = module.create_inst(Opcode::OpReturn, None, vec![], None).unwrap();
    module.append_inst_to_block(block, ret).unwrap();
    module.append_basic_block(func, block);
    module.append_function(func);
    (func, block)
}
