//! # spirv-ir
//!
//! An arena-based intermediate representation for SPIR-V shader binaries.
//!
//! `spirv-ir` models a SPIR-V module as a graph of [`Instruction`]s tied
//! together by a bidirectional use-def web: every [`Id`] knows the
//! instruction that defines it and the set of instructions that use it,
//! and every mutation that touches operands keeps both sides in sync
//! before returning. Clients build a module by hand (as the binary/text
//! readers in `spirv-binary`/`spirv-text` do), mutate it instruction by
//! instruction, and read it back out for optimization or emission.
//!
//! ```rust
//! use spirv_ir::{Module, Opcode, Operand};
//!
//! let mut module = Module::new();
//! let void_ty = module.get_global_inst(Opcode::OpTypeVoid, None, vec![]).unwrap();
//! let void_id = module.result_id(void_ty).unwrap();
//! let fn_ty = module
//!     .get_global_inst(Opcode::OpTypeFunction, None, vec![Operand::Id(void_id)])
//!     .unwrap();
//! let fn_ty_id = module.result_id(fn_ty).unwrap();
//! let func = module.create_function(vec![], fn_ty_id, None).unwrap();
//! module.append_function(func);
//! ```
//!
//! The crate is organized leaves-first: [`opcode`] is static metadata with
//! no dependency on the rest of the crate; [`id`] and [`operand`] are the
//! small value types instructions are built from; [`instruction`],
//! [`block`], and [`function`] layer the container hierarchy; [`module`]
//! ties everything together and owns the arenas. `spirv-passes` is the
//! only other crate that depends on the mutation API here; `spirv-binary`
//! and `spirv-text` depend on it to build and walk modules for their own
//! wire formats.

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
#![allow(clippy::module_name_repetitions, reason = "InstId/BlockId/FunctionId naming mirrors their owning module")]

mod block;
mod error;
mod function;
mod id;
mod instruction;
mod module;
mod opcode;
mod operand;

pub use block::BlockId;
pub use error::{IrError, IrResult};
pub use function::FunctionId;
pub use id::Id;
pub use instruction::{bits_to_float, float_to_bits, ConstValue, InstId};
pub use module::Module;
pub use opcode::{
    ext_inst_info, is_global_opcode, ExtInstInfo, Opcode, OpcodeInfo, OperandKind, BRANCH_INSTRUCTIONS,
    CONSTANT_INSTRUCTIONS, DEBUG_INSTRUCTIONS, DECORATION_INSTRUCTIONS, GLOBAL_VARIABLE_INSTRUCTIONS,
    INITIAL_INSTRUCTIONS, SPECCONSTANT_INSTRUCTIONS, TYPE_DECLARATION_INSTRUCTIONS,
};
pub use operand::Operand;
