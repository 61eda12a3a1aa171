use std::fmt;

/// An error raised when the IR API is misused, e.g. a caller tries to
/// insert a global instruction into a basic block, or double-defines
/// a result id.
///
/// `IrError` covers only API misuse. Problems with externally supplied
/// data (a malformed binary, an unparsable assembly line, a dangling
/// reference discovered after parsing) are reported by the crates that
/// own that boundary (`spirv-binary`, `spirv-text`) with their own error
/// types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    /// Tried to insert a global instruction into a basic block, or a
    /// body instruction into the global bucket, or insert relative to
    /// a detached instruction/basic block.
    MisplacedInstruction(String),
    /// A result id already has a defining instruction.
    AlreadyDefined(String),
    /// A function parameter's type or count does not match the
    /// function's `OpTypeFunction` signature.
    ParameterMismatch(String),
    /// A constant value does not fit in the target type.
    ConstantOutOfRange(String),
    /// An opcode name has no entry in the opcode metadata table.
    UnknownOpcode(String),
    /// A generic invalid-operation error, covering the few remaining
    /// API misuses (e.g. `OpFunction`'s second operand was not an
    /// `OpTypeFunction`, or an operation was attempted on a destroyed
    /// handle).
    Invalid(String),
}

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MisplacedInstruction(msg) => write!(f, "misplaced instruction: {msg}"),
            Self::AlreadyDefined(msg) => write!(f, "already defined: {msg}"),
            Self::ParameterMismatch(msg) => write!(f, "parameter mismatch: {msg}"),
            Self::ConstantOutOfRange(msg) => write!(f, "constant out of range: {msg}"),
            Self::UnknownOpcode(msg) => write!(f, "unknown opcode: {msg}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IrError {}

pub type IrResult<T> = Result<T, IrError>;
