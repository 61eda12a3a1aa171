//! # spirv-text
//!
//! A textual assembly syntax for [`spirv_ir::Module`]: [`assemble`] reads
//! source text into a module, [`disassemble`] prints one back out.
//!
//! The grammar supports two families of surface syntax that can be freely
//! mixed within one source file:
//!
//! - a fully explicit, raw instruction stream (`%1 = OpTypeVoid`, `%2 =
//!   OpLabel`, ...), the only form [`disassemble`] guarantees round-trips
//!   losslessly back through [`assemble`];
//! - a pretty surface (`s32`/`f32`/`<4 x f32>` type shorthand, a `define
//!   <ret> %name(<ty> %p, ...) { %label: ... }` function form, and inline
//!   `Decoration(arg, ...)` syntax) that trades losslessness for
//!   readability.
//!
//! ```rust
//! use spirv_text::{assemble, disassemble, AssembleOptions};
//!
//! let mut module = assemble("%1 = OpTypeVoid", AssembleOptions::DEFAULT_OPTIONS).unwrap();
//! let text = disassemble(&mut module, AssembleOptions::DEFAULT_OPTIONS);
//! assert!(text.contains("OpTypeVoid"));
//! ```

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

mod error;
mod lexer;
mod parser;
mod printer;

pub use error::{TextError, TextResult};
pub use parser::assemble;
pub use printer::disassemble;

/// Knobs controlling assembly/disassembly surface syntax, following a
/// builder-plus-presets shape: a handful of `const` option bundles for
/// the common cases, plus chainable setters for anything custom.
///
/// `raw_mode` selects [`disassemble`]'s fully explicit output (no
/// symbolic names, no type shorthand, no inline decorations); parsing
/// accepts both surfaces unconditionally, since the raw grammar is a
/// strict subset of the pretty one. `strict_eol` rejects any trailing
/// tokens left on a line after its last expected operand, rather than
/// silently ignoring them.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AssembleOptions {
    pub(crate) raw_mode: bool,
    pub(crate) strict_eol: bool,
}

impl AssembleOptions {
    /// Pretty output, lenient about trailing tokens.
    pub const DEFAULT_OPTIONS: Self = Self { raw_mode: false, strict_eol: false };
    /// Fully explicit output: no symbolic names, no type shorthand, no
    /// inline decorations. The only mode [`disassemble`] guarantees
    /// round-trips losslessly back through [`assemble`].
    pub const RAW_OPTIONS: Self = Self { raw_mode: true, strict_eol: false };
    /// Pretty output, rejecting any spurious trailing tokens.
    pub const STRICT_OPTIONS: Self = Self { raw_mode: false, strict_eol: true };

    #[must_use]
    pub const fn require_raw_mode(mut self) -> Self {
        self.raw_mode = true;
        self
    }

    #[must_use]
    pub const fn require_strict_eol(mut self) -> Self {
        self.strict_eol = true;
        self
    }
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self::DEFAULT_OPTIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[coverage_helper::test]
    fn default_options_are_neither_raw_nor_strict() {
        let opts = AssembleOptions::default();
        assert!(!opts.raw_mode);
        assert!(!opts.strict_eol);
    }

    #[coverage_helper::test]
    fn builder_setters_compose() {
        let opts = AssembleOptions::DEFAULT_OPTIONS.require_raw_mode().require_strict_eol();
        assert!(opts.raw_mode);
        assert!(opts.strict_eol);
    }
}
