//! Textual assembler: turns source text into a [`Module`].
//!
//! Two surface grammars share one parser: a fully explicit raw
//! instruction stream, and a pretty surface with type shorthand, a
//! `define` function form, and inline decorations. Both are accepted
//! unconditionally, since the raw grammar is a strict subset of the
//! pretty one.

use std::collections::HashMap;

use spirv_ir::{BlockId, ConstValue, FunctionId, Id, InstId, IrError, Module, Opcode, OperandKind, Operand};

use crate::error::TextError;
use crate::lexer::{Lexer, NextToken, TokenTag};
use crate::{AssembleOptions, TextResult};

/// `(extended instruction set name, mnemonic, instruction number)`,
/// the inverse of [`spirv_ir::ext_inst_info`]'s `(set, number) -> name`
/// table, needed so `%r = OpExtInst %f32 %glsl Sqrt %x` can resolve
/// `Sqrt` back to its wire number.
const EXT_INST_NAMES: &[(&str, &str, u32)] = &[
    ("GLSL.std.450", "FMin", 26),
    ("GLSL.std.450", "FMax", 40),
    ("GLSL.std.450", "FAbs", 37),
    ("GLSL.std.450", "Sqrt", 66),
    ("GLSL.std.450", "NClamp", 69),
    ("OpenCL.std", "fmin", 160),
    ("OpenCL.std", "fmax", 165),
];

enum Scalar {
    Signed,
    Unsigned,
    Float,
}

/// Where a freshly parsed instruction is attached.
enum Sink {
    Global,
    Block(BlockId),
}

/// Assemble `input` into a fresh [`Module`].
///
/// # Errors
///
/// Returns [`TextError::Syntax`] for a lexical or grammatical problem,
/// or [`TextError::Verify`] if a user-written instruction references
/// an id that is never defined anywhere in the source.
pub fn assemble(input: &str, options: AssembleOptions) -> TextResult<Module> {
    let mut parser = Parser {
        lexer: Lexer::new(input),
        module: Module::new(),
        options,
        symbols: HashMap::new(),
        inst_lines: HashMap::new(),
    };
    while parser.parse_line()? {}
    parser.verify()?;
    Ok(parser.module)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    module: Module,
    options: AssembleOptions,
    /// Symbolic (non-numeric) id names, materialized to a fresh id the
    /// first time they're seen, with a synthesized `OpName` attached.
    symbols: HashMap<String, Id>,
    /// The source line each user-written instruction came from, used
    /// by [`Parser::verify`]; synthesized instructions (`OpName` for a
    /// symbol, `OpDecorate` for an inline decoration) are deliberately
    /// excluded so they never get blamed for a forward reference.
    inst_lines: HashMap<InstId, usize>,
}

impl Parser<'_> {
    fn ir_err(&self, e: IrError) -> TextError {
        TextError::syntax(self.lexer.line_no, e.to_string())
    }

    fn symbol_id(&mut self, name: &str) -> Id {
        if let Some(&id) = self.symbols.get(name) {
            return id;
        }
        let id = self.module.new_temporary_id();
        self.symbols.insert(name.to_owned(), id);
        if let Ok(inst) =
            self.module.create_inst(Opcode::OpName, None, vec![Operand::Id(id), Operand::LiteralString(name.to_owned())], None)
        {
            let _ = self.module.insert_global_inst(inst);
        }
        id
    }

    /// A numeric `%`-token resolves to its concrete id, a symbolic one
    /// to (or through) [`Self::symbol_id`].
    fn id_for_id_token(&mut self, text: &str) -> TextResult<Id> {
        if let Ok(value) = text.parse::<u32>() {
            Ok(self.module.id_for_value(value))
        } else {
            Ok(self.symbol_id(text))
        }
    }

    fn scalar_type(&mut self, text: &str) -> TextResult<Option<Id>> {
        let inst = match text {
            "void" => self.module.get_global_inst(Opcode::OpTypeVoid, None, Vec::new()),
            "bool" => self.module.get_global_inst(Opcode::OpTypeBool, None, Vec::new()),
            _ => {
                let Some((scalar, width)) = parse_numeric_type_name(text) else { return Ok(None) };
                match scalar {
                    Scalar::Float => self.module.get_global_inst(Opcode::OpTypeFloat, None, vec![Operand::LiteralNumber(width)]),
                    Scalar::Signed => self.module.get_global_inst(
                        Opcode::OpTypeInt,
                        None,
                        vec![Operand::LiteralNumber(width), Operand::LiteralNumber(1)],
                    ),
                    Scalar::Unsigned => self.module.get_global_inst(
                        Opcode::OpTypeInt,
                        None,
                        vec![Operand::LiteralNumber(width), Operand::LiteralNumber(0)],
                    ),
                }
            }
        };
        let inst = inst.map_err(|e| self.ir_err(e))?;
        Ok(Some(self.module.result_id(inst).expect("a type declaration always has a result id")))
    }

    /// Recognizes the scalar shorthand names and `<N x BASE>` vector
    /// shorthand, falling back to treating the token as an ordinary
    /// symbolic id (covers a forward reference to a struct or other
    /// named type).
    fn get_or_create_type(&mut self, text: &str) -> TextResult<Id> {
        if let Some(id) = self.scalar_type(text)? {
            return Ok(id);
        }
        if let Some((count, base)) = parse_vec_type_shorthand(text) {
            let base_id = self.get_or_create_type(base)?;
            let inst = self
                .module
                .get_global_inst(Opcode::OpTypeVector, None, vec![Operand::Id(base_id), Operand::LiteralNumber(count)])
                .map_err(|e| self.ir_err(e))?;
            return Ok(self.module.result_id(inst).expect("OpTypeVector always has a result id"));
        }
        Ok(self.symbol_id(text))
    }

    fn get_or_create_type_tagged(&mut self, text: &str, tag: Option<TokenTag>) -> TextResult<Id> {
        match tag {
            Some(TokenTag::Id) => self.id_for_id_token(text),
            _ => self.get_or_create_type(text),
        }
    }

    /// Validates the literal against the expected type's kind
    /// (`OpTypeBool`/`OpTypeInt`) and returns its [`ConstValue`].
    fn scalar_value(&self, text: &str, tag: Option<TokenTag>, type_id: Id) -> TextResult<ConstValue> {
        let Some(type_inst) = self.module.defining_inst(type_id) else {
            return Err(TextError::syntax(self.lexer.line_no, "constant's type is undefined"));
        };
        match self.module.opcode(type_inst) {
            spirv_ir::Opcode::OpTypeBool => match text {
                "true" => Ok(ConstValue::Bool(true)),
                "false" => Ok(ConstValue::Bool(false)),
                _ => Err(TextError::syntax(self.lexer.line_no, "expected true or false for a bool constant")),
            },
            spirv_ir::Opcode::OpTypeInt => {
                if tag == Some(TokenTag::Int) {
                    Ok(ConstValue::Int(parse_int_literal(text)))
                } else {
                    Err(TextError::syntax(self.lexer.line_no, "expected an integer literal"))
                }
            }
            _ => Err(TextError::syntax(
                self.lexer.line_no,
                "a literal constant can only be written inline for bool or integer types",
            )),
        }
    }

    /// Track whether a separator (`,` for a fixed operand, `,` or
    /// nothing for the first element of a variable-arity one) is
    /// required before the next value: comma-separated, with no
    /// leading comma.
    fn require_separator(&mut self, any: &mut bool) -> TextResult<()> {
        if *any {
            self.lexer.get_next_token(Some(","), false, false)?;
        }
        *any = true;
        Ok(())
    }

    /// For a variable-arity (or optional) operand: is there another
    /// value to parse? Consumes the separating comma if so. Anything
    /// other than a comma (including end of line) ends the run without
    /// raising an error, so trailing inline decorations can follow a
    /// variable-arity operand list without a dedicated terminator.
    fn has_next_operand(&mut self, any: &mut bool) -> TextResult<bool> {
        if *any {
            let tok = self.lexer.get_next_token(None, true, true)?;
            match tok {
                NextToken::Tok(ref t, None) if t == "," => {
                    self.lexer.get_next_token(Some(","), false, true)?;
                    Ok(true)
                }
                _ => Ok(false),
            }
        } else {
            let tok = self.lexer.get_next_token(None, true, true)?;
            match tok {
                NextToken::Empty | NextToken::Eof => Ok(false),
                _ => {
                    *any = true;
                    Ok(true)
                }
            }
        }
    }

    fn has_optional_value(&mut self) -> TextResult<bool> {
        let mut any = true;
        self.has_next_operand(&mut any)
    }

    fn parse_literal_number(&mut self) -> TextResult<u32> {
        let tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(text, Some(TokenTag::Int)) = tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected an integer literal"));
        };
        let value = parse_int_literal(&text);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "literal numbers are raw 32-bit wire words")]
        let word = value as u32;
        Ok(word)
    }

    fn parse_literal_string(&mut self) -> TextResult<String> {
        let tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(text, Some(TokenTag::Str)) = tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected a string literal"));
        };
        let inner = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(text.as_str());
        Ok(inner.to_owned())
    }

    fn parse_enum(&mut self, kind: &'static str) -> TextResult<String> {
        let tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(text, _) = tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected an enumerant"));
        };
        if spirv_binary::enumerant::enum_value(kind, &text).is_none() {
            return Err(TextError::syntax(self.lexer.line_no, format!("unknown {kind} enumerant {text}")));
        }
        Ok(text)
    }

    fn parse_mask(&mut self, kind: &'static str) -> TextResult<Vec<String>> {
        let peeked = self.lexer.get_next_token(None, true, false)?;
        if let NextToken::Tok(text, Some(TokenTag::Int)) = peeked {
            self.lexer.get_next_token(None, false, false)?;
            let value = parse_int_literal(&text);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "a mask literal is a raw 32-bit wire word")]
            let word = value as u32;
            return spirv_binary::enumerant::mask_names(kind, word)
                .map(|names| names.into_iter().map(str::to_owned).collect())
                .ok_or_else(|| TextError::syntax(self.lexer.line_no, format!("unknown bits set in {kind} mask")));
        }
        let mut tokens = Vec::new();
        loop {
            let tok = self.lexer.get_next_token(None, false, false)?;
            let NextToken::Tok(text, _) = tok else {
                return Err(TextError::syntax(self.lexer.line_no, "expected a mask token"));
            };
            if spirv_binary::enumerant::mask_value(kind, std::slice::from_ref(&text)).is_none() {
                return Err(TextError::syntax(self.lexer.line_no, format!("unknown {kind} mask token {text}")));
            }
            tokens.push(text);
            let peek = self.lexer.get_next_token(None, true, true)?;
            match peek {
                NextToken::Tok(ref t, None) if t == "|" => {
                    self.lexer.get_next_token(Some("|"), false, true)?;
                }
                _ => break,
            }
        }
        Ok(tokens)
    }

    /// An `Id`-kind operand: a `%`-reference, a type shorthand, or (when
    /// `inferred_type` names an int/bool type) an inline literal that
    /// materializes a constant.
    fn parse_operand_id(&mut self, inferred_type: Option<Id>) -> TextResult<Id> {
        let tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(text, tag) = tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected an operand"));
        };
        if tag == Some(TokenTag::Int) || text == "true" || text == "false" {
            let Some(type_id) = inferred_type else {
                return Err(TextError::syntax(self.lexer.line_no, "a literal constant needs a typed context"));
            };
            let value = self.scalar_value(&text, tag, type_id)?;
            let inst = self.module.get_constant(type_id, value).map_err(|e| self.ir_err(e))?;
            return Ok(self.module.result_id(inst).expect("a constant always has a result id"));
        }
        self.get_or_create_type_tagged(&text, tag)
    }

    fn parse_operands(&mut self, kinds: &[OperandKind], type_id: Option<Id>) -> TextResult<Vec<Operand>> {
        let mut out = Vec::new();
        let mut any = false;
        for &kind in kinds {
            match kind {
                OperandKind::VariableId => {
                    while self.has_next_operand(&mut any)? {
                        out.push(Operand::Id(self.parse_operand_id(type_id)?));
                    }
                }
                OperandKind::VariableLiteralNumber => {
                    while self.has_next_operand(&mut any)? {
                        out.push(Operand::LiteralNumber(self.parse_literal_number()?));
                    }
                }
                OperandKind::VariableIdLiteralPair => {
                    while self.has_next_operand(&mut any)? {
                        out.push(Operand::Id(self.parse_operand_id(type_id)?));
                        self.lexer.get_next_token(Some(","), false, false)?;
                        out.push(Operand::LiteralNumber(self.parse_literal_number()?));
                    }
                }
                OperandKind::VariableLiteralIdPair => {
                    while self.has_next_operand(&mut any)? {
                        out.push(Operand::LiteralNumber(self.parse_literal_number()?));
                        self.lexer.get_next_token(Some(","), false, false)?;
                        out.push(Operand::Id(self.parse_operand_id(type_id)?));
                    }
                }
                OperandKind::OptionalId => {
                    if self.has_optional_value()? {
                        out.push(Operand::Id(self.parse_operand_id(type_id)?));
                    }
                }
                OperandKind::OptionalLiteralNumber => {
                    if self.has_optional_value()? {
                        out.push(Operand::LiteralNumber(self.parse_literal_number()?));
                    }
                }
                OperandKind::OptionalLiteralString => {
                    if self.has_optional_value()? {
                        out.push(Operand::LiteralString(self.parse_literal_string()?));
                    }
                }
                OperandKind::Id => {
                    self.require_separator(&mut any)?;
                    out.push(Operand::Id(self.parse_operand_id(type_id)?));
                }
                OperandKind::LiteralNumber => {
                    self.require_separator(&mut any)?;
                    out.push(Operand::LiteralNumber(self.parse_literal_number()?));
                }
                OperandKind::LiteralString => {
                    self.require_separator(&mut any)?;
                    out.push(Operand::LiteralString(self.parse_literal_string()?));
                }
                OperandKind::Enum(kind_name) => {
                    self.require_separator(&mut any)?;
                    out.push(Operand::Enum(self.parse_enum(kind_name)?));
                }
                OperandKind::Mask(kind_name) => {
                    self.require_separator(&mut any)?;
                    out.push(Operand::Mask(self.parse_mask(kind_name)?));
                }
            }
        }
        Ok(out)
    }

    /// Inline `Decoration` / `Decoration(arg, ...)` clauses trailing a
    /// result-producing instruction line. Stops (without error) at the
    /// first token that isn't a recognized decoration name, leaving it
    /// for [`crate::lexer::Lexer::done_with_line`] to flag.
    fn parse_inline_decorations(&mut self, target: Id) -> TextResult<()> {
        loop {
            let tok = self.lexer.get_next_token(None, true, true)?;
            match tok {
                NextToken::Empty | NextToken::Eof => return Ok(()),
                NextToken::Tok(ref t, None) if t == "," => {
                    self.lexer.get_next_token(Some(","), false, true)?;
                }
                NextToken::Tok(ref name, Some(TokenTag::Name))
                    if spirv_binary::enumerant::enum_value("Decoration", name).is_some() =>
                {
                    let name = name.clone();
                    self.lexer.get_next_token(None, false, true)?;
                    let mut operands = vec![Operand::Id(target), Operand::Enum(name)];
                    let peek = self.lexer.get_next_token(None, true, true)?;
                    if let NextToken::Tok(ref t, None) = peek {
                        if t == "(" {
                            self.lexer.get_next_token(Some("("), false, false)?;
                            loop {
                                operands.push(Operand::LiteralNumber(self.parse_literal_number()?));
                                let sep = self.lexer.get_next_token(None, true, false)?;
                                match sep {
                                    NextToken::Tok(ref s, None) if s == "," => {
                                        self.lexer.get_next_token(Some(","), false, false)?;
                                    }
                                    _ => break,
                                }
                            }
                            self.lexer.get_next_token(Some(")"), false, false)?;
                        }
                    }
                    let inst = self.module.create_inst(Opcode::OpDecorate, None, operands, None).map_err(|e| self.ir_err(e))?;
                    self.module.insert_global_inst(inst).map_err(|e| self.ir_err(e))?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn ext_inst_set_name(&self, set_id: Id) -> Option<String> {
        let inst = self.module.defining_inst(set_id)?;
        if self.module.opcode(inst) != Opcode::OpExtInstImport {
            return None;
        }
        self.module.operands(inst).first().and_then(Operand::as_literal_string).map(str::to_owned)
    }

    fn parse_ext_inst(&mut self, result_id: Option<Id>, sink: Sink, line_no: usize) -> TextResult<()> {
        let tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(text, tag) = tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected a result type"));
        };
        let type_id = self.get_or_create_type_tagged(&text, tag)?;

        let set_tok = self.lexer.get_next_token(None, false, false)?;
        let set_id = match set_tok {
            NextToken::Tok(s, Some(TokenTag::Str)) => {
                let name = s.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(&s).to_owned();
                let inst = self
                    .module
                    .get_global_inst(Opcode::OpExtInstImport, None, vec![Operand::LiteralString(name)])
                    .map_err(|e| self.ir_err(e))?;
                self.module.result_id(inst).expect("OpExtInstImport always has a result id")
            }
            NextToken::Tok(s, Some(TokenTag::Id)) => self.id_for_id_token(&s)?,
            _ => return Err(TextError::syntax(self.lexer.line_no, "expected an extended instruction set")),
        };
        self.lexer.get_next_token(Some(","), false, false)?;
        let num_tok = self.lexer.get_next_token(None, false, false)?;
        let number = match num_tok {
            NextToken::Tok(n, Some(TokenTag::Int)) => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "instruction numbers are small")]
                let n = parse_int_literal(&n) as u32;
                n
            }
            NextToken::Tok(name, Some(TokenTag::Name)) => {
                let set_name = self.ext_inst_set_name(set_id);
                lookup_ext_inst_number(set_name.as_deref(), &name)
                    .ok_or_else(|| TextError::syntax(self.lexer.line_no, format!("unknown extended instruction {name}")))?
            }
            _ => return Err(TextError::syntax(self.lexer.line_no, "expected an instruction number or name")),
        };

        let mut operands = vec![Operand::Id(set_id), Operand::LiteralNumber(number)];
        let mut any = true;
        while self.has_next_operand(&mut any)? {
            operands.push(Operand::Id(self.parse_operand_id(Some(type_id))?));
        }

        let inst = self.module.create_inst(Opcode::OpExtInst, Some(type_id), operands, result_id).map_err(|e| self.ir_err(e))?;
        self.inst_lines.insert(inst, line_no);
        match sink {
            Sink::Global => self.module.insert_global_inst(inst).map_err(|e| self.ir_err(e))?,
            Sink::Block(block) => self.module.append_inst_to_block(block, inst).map_err(|e| self.ir_err(e))?,
        }
        if let Some(id) = self.module.result_id(inst) {
            if !self.options.strict_eol {
                self.parse_inline_decorations(id)?;
            }
        }
        self.lexer.done_with_line()?;
        Ok(())
    }

    fn parse_instruction_body(&mut self, result_id: Option<Id>, sink: Sink) -> TextResult<()> {
        let line_no = self.lexer.line_no;
        let name_tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(name, _) = name_tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected an opcode"));
        };
        let Some(opcode) = Opcode::from_name(&name) else {
            return Err(TextError::syntax(self.lexer.line_no, format!("unknown opcode {name}")));
        };
        if opcode == Opcode::OpExtInst {
            return self.parse_ext_inst(result_id, sink, line_no);
        }

        let info = opcode.info();
        let type_id = if info.has_type {
            let tok = self.lexer.get_next_token(None, false, false)?;
            let NextToken::Tok(text, tag) = tok else {
                return Err(TextError::syntax(self.lexer.line_no, "expected a type"));
            };
            Some(self.get_or_create_type_tagged(&text, tag)?)
        } else {
            None
        };
        let operands = self.parse_operands(info.operands, type_id)?;
        let inst = self.module.create_inst(opcode, type_id, operands, result_id).map_err(|e| self.ir_err(e))?;
        self.inst_lines.insert(inst, line_no);
        match sink {
            Sink::Global => self.module.insert_global_inst(inst).map_err(|e| self.ir_err(e))?,
            Sink::Block(block) => self.module.append_inst_to_block(block, inst).map_err(|e| self.ir_err(e))?,
        }
        if let Some(id) = self.module.result_id(inst) {
            if !self.options.strict_eol {
                self.parse_inline_decorations(id)?;
            }
        }
        self.lexer.done_with_line()?;
        Ok(())
    }

    fn parse_result_prefix(&mut self) -> TextResult<Option<Id>> {
        let first = self.lexer.get_next_token(None, true, false)?;
        if !matches!(first, NextToken::Tok(_, Some(TokenTag::Id))) {
            return Ok(None);
        }
        let tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(text, Some(TokenTag::Id)) = tok else {
            unreachable!("just peeked an Id token")
        };
        self.lexer.get_next_token(Some("="), false, false)?;
        Ok(Some(self.id_for_id_token(&text)?))
    }

    fn parse_body_instruction(&mut self, block: BlockId) -> TextResult<()> {
        let result_id = self.parse_result_prefix()?;
        self.parse_instruction_body(result_id, Sink::Block(block))
    }

    fn parse_basic_block(&mut self, function: FunctionId) -> TextResult<()> {
        let label_tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(label_name, Some(TokenTag::Label)) = label_tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected a block label"));
        };
        let label_id = self.symbol_id(&label_name);
        let block = self.module.create_block(Some(label_id)).map_err(|e| self.ir_err(e))?;
        self.module.append_basic_block(function, block);
        self.lexer.done_with_line()?;
        loop {
            let tok = self.lexer.get_next_token(None, true, true)?;
            match tok {
                NextToken::Empty => {
                    self.lexer.done_with_line()?;
                }
                NextToken::Eof => return Ok(()),
                NextToken::Tok(_, Some(TokenTag::Label)) => return Ok(()),
                NextToken::Tok(ref t, None) if t == "}" => return Ok(()),
                NextToken::Tok(..) => self.parse_body_instruction(block)?,
            }
        }
    }

    fn parse_function_definition(&mut self) -> TextResult<()> {
        let ret_tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(ret_text, ret_tag) = ret_tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected a return type"));
        };
        let ret_type = self.get_or_create_type_tagged(&ret_text, ret_tag)?;

        let name_tok = self.lexer.get_next_token(None, false, false)?;
        let NextToken::Tok(fname, Some(TokenTag::Id)) = name_tok else {
            return Err(TextError::syntax(self.lexer.line_no, "expected a function name"));
        };
        let func_id = self.symbol_id(&fname);

        self.lexer.get_next_token(Some("("), false, false)?;
        let mut params = Vec::new();
        loop {
            let peek = self.lexer.get_next_token(None, true, false)?;
            if let NextToken::Tok(ref t, None) = peek {
                if t == ")" {
                    self.lexer.get_next_token(Some(")"), false, false)?;
                    break;
                }
            }
            let ty_tok = self.lexer.get_next_token(None, false, false)?;
            let NextToken::Tok(ty_text, ty_tag) = ty_tok else {
                return Err(TextError::syntax(self.lexer.line_no, "expected a parameter type"));
            };
            let ty = self.get_or_create_type_tagged(&ty_text, ty_tag)?;
            let p_tok = self.lexer.get_next_token(None, false, false)?;
            let NextToken::Tok(p_text, Some(TokenTag::Id)) = p_tok else {
                return Err(TextError::syntax(self.lexer.line_no, "expected a parameter name"));
            };
            let p_id = self.id_for_id_token(&p_text)?;
            params.push((ty, p_id));
            let sep = self.lexer.get_next_token(None, true, false)?;
            if let NextToken::Tok(ref t, None) = sep {
                if t == "," {
                    self.lexer.get_next_token(Some(","), false, false)?;
                }
            }
        }
        self.lexer.get_next_token(Some("{"), false, true)?;
        self.lexer.done_with_line()?;

        let mut fn_type_operands = vec![Operand::Id(ret_type)];
        fn_type_operands.extend(params.iter().map(|&(ty, _)| Operand::Id(ty)));
        let fn_type_inst =
            self.module.get_global_inst(Opcode::OpTypeFunction, None, fn_type_operands).map_err(|e| self.ir_err(e))?;
        let fn_type_id = self.module.result_id(fn_type_inst).expect("OpTypeFunction always has a result id");

        let function =
            self.module.create_function(vec!["None".to_owned()], fn_type_id, Some(func_id)).map_err(|e| self.ir_err(e))?;
        for (ty, p_id) in params {
            let p_inst =
                self.module.create_inst(Opcode::OpFunctionParameter, Some(ty), Vec::new(), Some(p_id)).map_err(|e| self.ir_err(e))?;
            self.module.append_parameter(function, p_inst).map_err(|e| self.ir_err(e))?;
        }
        self.module.append_function(function);

        loop {
            let tok = self.lexer.get_next_token(None, true, true)?;
            match tok {
                NextToken::Empty => self.lexer.done_with_line()?,
                NextToken::Tok(ref t, None) if t == "}" => {
                    self.lexer.get_next_token(Some("}"), false, true)?;
                    self.lexer.done_with_line()?;
                    return Ok(());
                }
                NextToken::Eof => {
                    return Err(TextError::syntax(self.lexer.line_no, "unterminated function definition"));
                }
                NextToken::Tok(..) => self.parse_basic_block(function)?,
            }
        }
    }

    /// Returns `false` once the input is exhausted.
    fn parse_line(&mut self) -> TextResult<bool> {
        let first = self.lexer.get_next_token(None, true, true)?;
        match first {
            NextToken::Eof => return Ok(false),
            NextToken::Empty => {
                self.lexer.done_with_line()?;
                return Ok(true);
            }
            NextToken::Tok(ref text, Some(TokenTag::Name)) if text == "define" => {
                self.lexer.get_next_token(Some("define"), false, false)?;
                self.parse_function_definition()?;
                return Ok(true);
            }
            NextToken::Tok(..) => {}
        }
        let result_id = self.parse_result_prefix()?;
        self.parse_instruction_body(result_id, Sink::Global)?;
        Ok(true)
    }

    /// Every id a user-written instruction references must be defined
    /// by the time parsing finishes. Synthesized instructions (symbol
    /// `OpName`s, inline-decoration `OpDecorate`s) are not in `inst_lines` and so
    /// are never blamed for a forward reference that never resolved.
    fn verify(&self) -> TextResult<()> {
        let mut entries: Vec<(InstId, usize)> = self.inst_lines.iter().map(|(&inst, &line)| (inst, line)).collect();
        entries.sort_by_key(|&(_, line)| line);
        for (inst, line) in entries {
            let mut ids: Vec<Id> = self.module.type_id(inst).into_iter().collect();
            ids.extend(self.module.operands(inst).iter().filter_map(Operand::as_id));
            for id in ids {
                if self.module.defining_inst(id).is_none() {
                    return Err(TextError::verify(line, format!("{} used but not defined", self.name_for_undefined(id))));
                }
            }
        }
        Ok(())
    }

    fn name_for_undefined(&self, id: Id) -> String {
        if let Some((name, _)) = self.symbols.iter().find(|&(_, &v)| v == id) {
            format!("%{name}")
        } else if self.module.is_temporary(id) {
            format!("{id}")
        } else {
            format!("%{}", self.module.id_value(id))
        }
    }
}

fn parse_int_literal(text: &str) -> i128 {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if let Some(hex) = rest.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).unwrap_or(0)
    } else if let Some(bin) = rest.strip_prefix("0b") {
        i128::from_str_radix(bin, 2).unwrap_or(0)
    } else {
        rest.parse().unwrap_or(0)
    };
    if negative { -value } else { value }
}

fn parse_numeric_type_name(text: &str) -> Option<(Scalar, u32)> {
    let (scalar, rest) = if let Some(rest) = text.strip_prefix('s') {
        (Scalar::Signed, rest)
    } else if let Some(rest) = text.strip_prefix('u') {
        (Scalar::Unsigned, rest)
    } else if let Some(rest) = text.strip_prefix('f') {
        (Scalar::Float, rest)
    } else {
        return None;
    };
    let width: u32 = rest.parse().ok()?;
    Some((scalar, width))
}

fn parse_vec_type_shorthand(text: &str) -> Option<(u32, &str)> {
    let inner = text.strip_prefix('<')?.strip_suffix('>')?;
    let (count, base) = inner.split_once(" x ")?;
    let count: u32 = count.trim().parse().ok()?;
    Some((count, base.trim()))
}

fn lookup_ext_inst_number(set_name: Option<&str>, op_name: &str) -> Option<u32> {
    let set_name = set_name?;
    EXT_INST_NAMES.iter().find(|&&(s, n, _)| s == set_name && n == op_name).map(|&(_, _, number)| number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[coverage_helper::test]
    fn assembles_a_bare_type_declaration() {
        let module = assemble("%1 = OpTypeVoid", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        assert_eq!(module.global_instructions().len(), 1);
    }

    #[coverage_helper::test]
    fn assembles_pretty_scalar_shorthand() {
        let module = assemble("%v = OpUndef f32", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        assert_eq!(module.global_instructions().len(), 1);
        assert_eq!(module.opcode(module.global_instructions()[0]), Opcode::OpTypeFloat);
    }

    #[coverage_helper::test]
    fn inline_literal_materializes_a_constant() {
        let module = assemble("%r = OpIAdd s32 %a, 1", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        let constants: Vec<InstId> =
            module.global_instructions().into_iter().filter(|&i| module.opcode(i) == Opcode::OpConstant).collect();
        assert_eq!(constants.len(), 1);
    }

    #[coverage_helper::test]
    fn inline_decoration_synthesizes_op_decorate() {
        let module = assemble("%s = OpTypeBool Block", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        let decorates: Vec<InstId> =
            module.global_instructions().into_iter().filter(|&i| module.opcode(i) == Opcode::OpDecorate).collect();
        assert_eq!(decorates.len(), 1);
    }

    #[coverage_helper::test]
    fn undefined_reference_is_a_verify_error() {
        let err = assemble("%1 = OpLoad s32 %missing", AssembleOptions::DEFAULT_OPTIONS).unwrap_err();
        assert!(matches!(err, TextError::Verify { .. }));
    }

    #[coverage_helper::test]
    fn parses_a_function_definition() {
        let src = "define void %main() {\n%entry:\nOpReturn\n}";
        let module = assemble(src, AssembleOptions::DEFAULT_OPTIONS).unwrap();
        assert_eq!(module.functions().len(), 1);
    }

    #[coverage_helper::test]
    fn vector_shorthand_round_trips_to_the_same_type() {
        let module = assemble("%a = OpUndef <4 x f32>\n%b = OpUndef <4 x f32>", AssembleOptions::DEFAULT_OPTIONS).unwrap();
        assert_eq!(module.type_id(module.global_instructions()[1]), module.type_id(module.global_instructions()[2]));
    }
}
