//! Decode a SPIR-V binary word stream into a [`Module`].
//!
//! Grounded on the reference implementation's `SpirvBinary` cursor and its
//! `parse_*` functions: a single forward pass over the word stream, with
//! no backtracking. Globals come first, then each function's header,
//! parameters, basic blocks, and `OpFunctionEnd` in turn.

use spirv_ir::{Id, Module, Opcode, OperandKind, Operand, BRANCH_INSTRUCTIONS};

use crate::enumerant;
use crate::error::{ParseError, ParseResult};

const MAGIC: u32 = 0x0723_0203;
const VERSION: u32 = 0x0001_0000;

struct Cursor {
    words: Vec<u32>,
    idx: usize,
    /// Words remaining in the instruction currently being read.
    length: usize,
}

impl Cursor {
    /// Read the opcode word starting the next instruction. Always updates
    /// `length` to that instruction's remaining word count, whether or
    /// not `peek` leaves `idx` where it was; a later non-peeking call
    /// re-reads the same word and sets the same length again.
    fn next_opcode(&mut self, peek: bool, accept_eol: bool) -> ParseResult<Option<Opcode>> {
        if self.idx == self.words.len() {
            return if accept_eol { Ok(None) } else { Err(ParseError::UnexpectedEof) };
        }
        let word = self.words[self.idx];
        let number = word & 0xFFFF;
        self.length = ((word >> 16) as usize).saturating_sub(1);
        if !peek {
            self.idx += 1;
        }
        let opcode = Opcode::from_number(number).ok_or(ParseError::UnknownOpcode(number))?;
        Ok(Some(opcode))
    }

    fn next_word(&mut self, peek: bool, accept_eol: bool) -> ParseResult<Option<u32>> {
        if self.idx == self.words.len() {
            return if accept_eol { Ok(None) } else { Err(ParseError::UnexpectedEof) };
        }
        if self.length == 0 {
            return if accept_eol { Ok(None) } else { Err(ParseError::UnexpectedEof) };
        }
        let word = self.words[self.idx];
        if !peek {
            self.idx += 1;
            self.length -= 1;
        }
        Ok(Some(word))
    }

    fn expect_eol(&self) -> ParseResult<()> {
        if self.length != 0 { Err(ParseError::SpuriousWords) } else { Ok(()) }
    }
}

fn parse_literal_string(cursor: &mut Cursor) -> ParseResult<String> {
    let mut bytes = Vec::new();
    'words: loop {
        let word = cursor.next_word(false, false)?.expect("accept_eol=false guarantees Some");
        for i in 0..4 {
            let byte = ((word >> (8 * i)) & 0xFF) as u8;
            if byte == 0 {
                break 'words;
            }
            bytes.push(byte);
        }
    }
    String::from_utf8(bytes).map_err(|_| ParseError::BadStringEncoding)
}

fn parse_id(cursor: &mut Cursor, module: &mut Module, accept_eol: bool) -> ParseResult<Option<(Id, u32)>> {
    match cursor.next_word(false, accept_eol)? {
        Some(word) => Ok(Some((module.id_for_value(word), word))),
        None => Ok(None),
    }
}

fn parse_operand(cursor: &mut Cursor, module: &mut Module, kind: OperandKind) -> ParseResult<Vec<Operand>> {
    Ok(match kind {
        OperandKind::Id => {
            let (id, _) = parse_id(cursor, module, false)?.expect("accept_eol=false guarantees Some");
            vec![Operand::Id(id)]
        }
        OperandKind::OptionalId => match parse_id(cursor, module, true)? {
            Some((id, _)) => vec![Operand::Id(id)],
            None => vec![],
        },
        OperandKind::LiteralNumber => {
            let word = cursor.next_word(false, false)?.expect("accept_eol=false guarantees Some");
            vec![Operand::LiteralNumber(word)]
        }
        OperandKind::OptionalLiteralNumber => match cursor.next_word(false, true)? {
            Some(word) => vec![Operand::LiteralNumber(word)],
            None => vec![],
        },
        OperandKind::LiteralString => vec![Operand::LiteralString(parse_literal_string(cursor)?)],
        OperandKind::OptionalLiteralString => {
            if cursor.next_word(true, true)?.is_none() {
                vec![]
            } else {
                vec![Operand::LiteralString(parse_literal_string(cursor)?)]
            }
        }
        OperandKind::VariableId => {
            let mut out = Vec::new();
            while let Some((id, _)) = parse_id(cursor, module, true)? {
                out.push(Operand::Id(id));
            }
            out
        }
        OperandKind::VariableLiteralNumber => {
            let mut out = Vec::new();
            while let Some(word) = cursor.next_word(false, true)? {
                out.push(Operand::LiteralNumber(word));
            }
            out
        }
        OperandKind::VariableIdLiteralPair => {
            let mut out = Vec::new();
            loop {
                let Some((id, _)) = parse_id(cursor, module, true)? else { break };
                out.push(Operand::Id(id));
                let word = cursor.next_word(false, false)?.expect("accept_eol=false guarantees Some");
                out.push(Operand::LiteralNumber(word));
            }
            out
        }
        OperandKind::VariableLiteralIdPair => {
            let mut out = Vec::new();
            loop {
                let Some(word) = cursor.next_word(false, true)? else { break };
                out.push(Operand::LiteralNumber(word));
                let (id, _) = parse_id(cursor, module, false)?.expect("accept_eol=false guarantees Some");
                out.push(Operand::Id(id));
            }
            out
        }
        OperandKind::Enum(kind) => {
            let word = cursor.next_word(false, false)?.expect("accept_eol=false guarantees Some");
            let name = enumerant::enum_name(kind, word).ok_or(ParseError::UnknownEnumerant { kind, value: word })?;
            vec![Operand::Enum(name.to_string())]
        }
        OperandKind::Mask(kind) => {
            // Every mask kind in this table is mandatory except the
            // trailing memory-access mask on load/store-family ops,
            // which the SPIR-V spec permits omitting entirely.
            let accept_eol = kind == "MemoryAccess";
            match cursor.next_word(false, accept_eol)? {
                Some(word) => {
                    let names =
                        enumerant::mask_names(kind, word).ok_or(ParseError::UnknownEnumerant { kind, value: word })?;
                    vec![Operand::Mask(names.into_iter().map(String::from).collect())]
                }
                None => vec![Operand::Mask(Vec::new())],
            }
        }
    })
}

/// One decoded instruction: its type/result ids (if any) and operands,
/// not yet attached to any container.
struct ParsedInst {
    opcode: Opcode,
    type_id: Option<Id>,
    result_id: Option<Id>,
    operands: Vec<Operand>,
}

fn parse_instruction(cursor: &mut Cursor, module: &mut Module) -> ParseResult<ParsedInst> {
    let opcode = cursor.next_opcode(false, false)?.expect("accept_eol=false guarantees Some");
    let info = opcode.info();

    let type_id = if info.has_type {
        let (id, _) = parse_id(cursor, module, false)?.expect("accept_eol=false guarantees Some");
        Some(id)
    } else {
        None
    };

    let result_id = if info.has_result {
        let (id, word) = parse_id(cursor, module, false)?.expect("accept_eol=false guarantees Some");
        if module.defining_inst(id).is_some() {
            return Err(ParseError::AlreadyDefined(word));
        }
        Some(id)
    } else {
        None
    };

    let mut operands = Vec::new();
    for &kind in info.operands {
        operands.extend(parse_operand(cursor, module, kind)?);
    }
    cursor.expect_eol()?;

    Ok(ParsedInst { opcode, type_id, result_id, operands })
}

fn parse_global_instructions(cursor: &mut Cursor, module: &mut Module) -> ParseResult<()> {
    loop {
        match cursor.next_opcode(true, true)? {
            None | Some(Opcode::OpFunction) => return Ok(()),
            Some(_) => {
                let parsed = parse_instruction(cursor, module)?;
                let inst = module.create_inst(parsed.opcode, parsed.type_id, parsed.operands, parsed.result_id)?;
                module.insert_global_inst(inst)?;
            }
        }
    }
}

fn parse_basic_block(cursor: &mut Cursor, module: &mut Module, function: spirv_ir::FunctionId) -> ParseResult<()> {
    cursor.next_opcode(false, false)?;
    let (label_id, _) = parse_id(cursor, module, false)?.expect("accept_eol=false guarantees Some");
    cursor.expect_eol()?;
    if module.defining_inst(label_id).is_some() {
        return Err(ParseError::AlreadyDefined(module.id_value(label_id)));
    }
    let block = module.create_block(Some(label_id))?;

    loop {
        let parsed = parse_instruction(cursor, module)?;
        if parsed.opcode == Opcode::OpLabel {
            return Err(ParseError::UnexpectedOpcode { expected: "a basic block body instruction", found: "OpLabel".into() });
        }
        let inst = module.create_inst(parsed.opcode, parsed.type_id, parsed.operands, parsed.result_id)?;
        module.append_inst_to_block(block, inst)?;
        if BRANCH_INSTRUCTIONS.contains(&parsed.opcode) {
            module.append_basic_block(function, block);
            return Ok(());
        }
    }
}

fn parse_function(cursor: &mut Cursor, module: &mut Module) -> ParseResult<spirv_ir::FunctionId> {
    let header = parse_instruction(cursor, module)?;
    let Operand::Mask(function_control) = header.operands.first().cloned().unwrap_or(Operand::Mask(Vec::new())) else {
        return Err(ParseError::UnexpectedOpcode { expected: "OpFunction's control mask", found: "something else".into() });
    };
    let Some(function_type) = header.operands.get(1).and_then(Operand::as_id) else {
        return Err(ParseError::UnexpectedOpcode { expected: "OpFunction's type id", found: "something else".into() });
    };
    let function = module.create_function(function_control, function_type, header.result_id)?;

    loop {
        match cursor.next_opcode(true, false)?.expect("accept_eol=false guarantees Some") {
            Opcode::OpLabel => parse_basic_block(cursor, module, function)?,
            Opcode::OpFunctionEnd => {
                cursor.next_opcode(false, false)?;
                cursor.expect_eol()?;
                return Ok(function);
            }
            Opcode::OpFunctionParameter => {
                let parsed = parse_instruction(cursor, module)?;
                let inst = module.create_inst(parsed.opcode, parsed.type_id, parsed.operands, parsed.result_id)?;
                module.append_parameter(function, inst)?;
            }
            other => {
                return Err(ParseError::UnexpectedOpcode {
                    expected: "OpLabel, OpFunctionParameter, or OpFunctionEnd",
                    found: other.name().to_string(),
                });
            }
        }
    }
}

fn parse_functions(cursor: &mut Cursor, module: &mut Module) -> ParseResult<()> {
    loop {
        match cursor.next_opcode(true, true)? {
            None => return Ok(()),
            Some(Opcode::OpFunction) => {
                let function = parse_function(cursor, module)?;
                module.append_function(function);
            }
            Some(other) => {
                return Err(ParseError::UnexpectedOpcode { expected: "OpFunction", found: other.name().to_string() });
            }
        }
    }
}

fn words_from_bytes(bytes: &[u8]) -> ParseResult<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(ParseError::Misaligned);
    }
    Ok(bytes.chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
}

/// Decode a complete SPIR-V binary module from its byte stream.
///
/// Endianness is auto-detected: words are first interpreted little-endian,
/// and if the magic number doesn't match, every word is byte-swapped once
/// and re-checked before giving up.
pub fn read_module(bytes: &[u8]) -> ParseResult<Module> {
    let mut words = words_from_bytes(bytes)?;
    if words.len() < 5 {
        return Err(ParseError::TooShort);
    }
    if words[0] != MAGIC {
        for word in &mut words {
            *word = word.swap_bytes();
        }
        if words[0] != MAGIC {
            return Err(ParseError::BadMagic(words[0]));
        }
    }
    if words[1] != VERSION {
        return Err(ParseError::UnknownVersion(words[1]));
    }

    let mut cursor = Cursor { words, idx: 5, length: 0 };
    let mut module = Module::new();
    parse_global_instructions(&mut cursor, &mut module)?;
    parse_functions(&mut cursor, &mut module)?;
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[coverage_helper::test]
    fn rejects_a_misaligned_byte_length() {
        let bytes = [0u8; 6];
        assert_eq!(read_module(&bytes), Err(ParseError::Misaligned));
    }

    #[coverage_helper::test]
    fn rejects_a_file_shorter_than_the_header() {
        let bytes = [0u8; 12];
        assert_eq!(read_module(&bytes), Err(ParseError::TooShort));
    }

    #[coverage_helper::test]
    fn rejects_an_unrecognized_magic_number() {
        let mut words = vec![0xDEAD_BEEFu32, VERSION, 0, 1, 0];
        words[0] = 0xDEAD_BEEF;
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert!(matches!(read_module(&bytes), Err(ParseError::BadMagic(_))));
    }

    #[coverage_helper::test]
    fn reads_a_module_with_a_single_void_type() {
        let words: Vec<u32> = vec![
            MAGIC, VERSION, 0, 2, 0, // header, bound=2
            (2u32 << 16) | Opcode::OpTypeVoid.number(), 1, // %1 = OpTypeVoid
        ];
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let module = read_module(&bytes).unwrap();
        assert_eq!(module.global_instructions().len(), 1);
        assert_eq!(module.opcode(module.global_instructions()[0]), Opcode::OpTypeVoid);
    }
}
