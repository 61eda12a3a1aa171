use std::fmt;

/// An error raised while decoding a SPIR-V binary word stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The byte length was not a multiple of 4.
    Misaligned,
    /// Fewer than 5 words, so no header could be read.
    TooShort,
    /// The first word was neither the magic number nor its byteswap.
    BadMagic(u32),
    /// The version word did not match the one supported version.
    UnknownVersion(u32),
    /// Ran past the end of the word stream.
    UnexpectedEof,
    /// An instruction's declared word count did not match what was consumed.
    SpuriousWords,
    /// A 16-bit opcode number has no entry in the opcode table.
    UnknownOpcode(u32),
    /// An `OpFunction` or other opcode appeared somewhere structurally
    /// invalid (e.g. a second `OpLabel` inside a basic block's body, or
    /// an instruction other than `OpFunctionParameter`/`OpLabel` right
    /// after `OpFunction`).
    UnexpectedOpcode { expected: &'static str, found: String },
    /// A result id was given a second defining instruction.
    AlreadyDefined(u32),
    /// An `Enum`/`Mask` operand's wire value has no matching token.
    UnknownEnumerant { kind: &'static str, value: u32 },
    /// A `LiteralString` operand was not NUL-terminated within its words.
    BadStringEncoding,
    /// The IR layer rejected an otherwise well-formed sequence of calls
    /// (e.g. a malformed `OpFunction` whose type operand is not an
    /// `OpTypeFunction`).
    Ir(spirv_ir::IrError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misaligned => write!(f, "file length is not a multiple of 4 bytes"),
            Self::TooShort => write!(f, "file is shorter than the 5-word header"),
            Self::BadMagic(word) => write!(f, "incorrect magic number: {word:#010x}"),
            Self::UnknownVersion(word) => write!(f, "unsupported version word: {word:#010x}"),
            Self::UnexpectedEof => write!(f, "unexpected end of file"),
            Self::SpuriousWords => write!(f, "instruction word count did not match its contents"),
            Self::UnknownOpcode(n) => write!(f, "unknown opcode number {n}"),
            Self::UnexpectedOpcode { expected, found } => write!(f, "expected {expected}, found {found}"),
            Self::AlreadyDefined(value) => write!(f, "id %{value} is already defined"),
            Self::UnknownEnumerant { kind, value } => write!(f, "unknown {kind} value {value}"),
            Self::BadStringEncoding => write!(f, "literal string was not NUL-terminated"),
            Self::Ir(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<spirv_ir::IrError> for ParseError {
    fn from(e: spirv_ir::IrError) -> Self {
        ParseError::Ir(e)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
