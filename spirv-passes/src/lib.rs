//! # spirv-passes
//!
//! A small suite of optimization passes over [`spirv_ir::Module`], plus
//! the fixed-order [`optimize`] driver that runs them.
//!
//! Each pass is a plain function taking `&mut Module`; passes communicate
//! only through the module's own state (its use-def web and instruction
//! lists), never through any side channel, so they can be run standalone
//! (each module here exposes its own `run`) or as part of the driver
//! sequence below.
//!
//! ```rust
//! use spirv_ir::{Module, Opcode};
//!
//! let mut module = Module::new();
//! spirv_passes::optimize(&mut module);
//! ```
//!
//! - [`dead_inst_elim`]: remove instructions with no side effects and no
//!   uses, plus debug/decoration instructions whose target is already gone.
//! - [`dead_func_elim`]: remove functions unreachable from any entry point.
//! - [`mem2reg`]: promote function-local `OpVariable`s to SSA values.
//! - [`simplify_cfg`]: fold constant branches, drop unreachable blocks,
//!   merge blocks, collapse phis.
//! - [`instcombine`]: peephole rewrites, fused with [`constprop`] in a
//!   single loop.
//! - [`constprop`]: fold instructions whose operands are all constants.

// Make clippy as annoying as possible
#![deny(
    // All typically enabled warnings are converted into errors
    // includes correctness, suspicious, style, complexity, and perf
    clippy::all,
    // Error on cargo lints
    clippy::cargo,
)]
#![warn(
    // Warn on pedantic and in-development nursery lints
    clippy::pedantic,
    clippy::nursery,
    // Lints from "restriction" group - enforce a consistent if arbitrary style
    clippy::alloc_instead_of_core,
    clippy::arithmetic_side_effects,
    clippy::unnecessary_cast,
    clippy::as_underscore,
    clippy::assertions_on_result_states,
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::decimal_literal_representation,
    clippy::default_numeric_fallback,
    clippy::deref_by_slicing,
    clippy::empty_drop,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::expect_used,
    clippy::filetype_is_file,
    clippy::float_arithmetic,
    clippy::fn_to_numeric_cast_any,
    clippy::format_push_string,
    clippy::get_unwrap,
    clippy::if_then_some_else_none,
    clippy::indexing_slicing,
    clippy::large_include_file,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::map_err_ignore,
    clippy::mem_forget,
    clippy::missing_enforced_import_renames,
    clippy::mixed_read_write_in_expression,
    clippy::mod_module_files,
    clippy::multiple_inherent_impl,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::partial_pub_fields,
    clippy::pattern_type_mismatch,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_name_method,
    clippy::unseparated_literal_suffix,
    clippy::shadow_unrelated,
    clippy::std_instead_of_alloc,
    clippy::str_to_string,
    clippy::string_slice,
    clippy::string_to_string,
    clippy::suspicious_xor_used_as_pow,
    clippy::todo,
    clippy::try_err,
    clippy::undocumented_unsafe_blocks,
    clippy::unimplemented,
    clippy::unnecessary_safety_comment,
    clippy::unnecessary_safety_doc,
    clippy::unnecessary_self_imports,
    clippy::unneeded_field_pattern,
    clippy::unreachable,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::use_debug,
    clippy::verbose_file_reads,
)]
#![allow(
    clippy::needless_pass_by_value,
    reason = "Internal Compiler Error bug workaround: https://github.com/rust-lang/rust-clippy/issues/10344"
)]

use spirv_ir::Module;

pub mod constprop;
pub mod dead_func_elim;
pub mod dead_inst_elim;
pub mod instcombine;
pub mod mem2reg;
pub mod simplify_cfg;

/// Run the fixed optimization pipeline (spec.md §4.12).
///
/// `instcombine, simplify_cfg, dead_inst_elim, dead_func_elim` runs twice:
/// the first pass cleans up the module enough for `mem2reg` to promote
/// variables it otherwise couldn't see past, and the second cleans up
/// `mem2reg`'s output in turn. No fixed-point loop is required; the
/// sequence is hard-coded, not owned by a pass manager.
pub fn optimize(module: &mut Module) {
    run_cleanup_round(module);
    mem2reg::run(module);
    run_cleanup_round(module);
}

fn run_cleanup_round(module: &mut Module) {
    instcombine::run(module);
    simplify_cfg::run(module);
    dead_inst_elim::run(module);
    dead_func_elim::run(module);
    log::debug!(
        "cleanup round done: {} functions, {} global instructions",
        module.functions().len(),
        module.global_instructions().len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_ir::{ConstValue, Opcode, Operand};

    #[coverage_helper::test]
    fn optimize_is_idempotent_on_an_empty_module() {
        let mut module = Module::new();
        optimize(&mut module);
        let before = module.global_instructions().len();
        optimize(&mut module);
        assert_eq!(before, module.global_instructions().len());
    }

    #[coverage_helper::test]
    fn optimize_removes_a_trivially_dead_function() {
        let mut module = Module::new();
        let void_ty = module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
        let void_id = module.result_id(void_ty).unwrap();
        let fn_ty = module.get_global_inst(Opcode::OpTypeFunction, None, vec![Operand::Id(void_id)]).unwrap();
        let fn_ty_id = module.result_id(fn_ty).unwrap();

        let main = module.create_function(vec![], fn_ty_id, None).unwrap();
        let main_header = module.function_header(main);
        let main_id = module.result_id(main_header).unwrap();
        let block = module.create_block(None).unwrap();
        let ret = module.create_inst(Opcode::OpReturn, None, vec![], None).unwrap();
        module.append_inst_to_block(block, ret).unwrap();
        module.append_basic_block(main, block);
        module.append_function(main);

        let helper = module.create_function(vec![], fn_ty_id, None).unwrap();
        let hblock = module.create_block(None).unwrap();
        let hret = module.create_inst(Opcode::OpReturn, None, vec![], None).unwrap();
        module.append_inst_to_block(hblock, hret).unwrap();
        module.append_basic_block(helper, hblock);
        module.append_function(helper);

        let entry = module
            .create_inst(Opcode::OpEntryPoint, None, vec![Operand::Enum("Fragment".into()), Operand::Id(main_id), Operand::LiteralString("main".into())], None)
            .unwrap();
        module.insert_global_inst(entry).unwrap();

        optimize(&mut module);

        assert_eq!(module.functions().len(), 1);
        let _ = ConstValue::Bool(true);
    }
}
