//! Tokenizer for the textual assembly grammar.
//!
//! Tokens are produced one line at a time (a new line is only read once
//! the previous one is fully consumed via [`Lexer::done_with_line`]),
//! and a blank or `;`-comment line behaves as an empty, immediately-
//! exhausted line rather than being skipped outright.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_until};
use nom::character::complete::{alpha1, alphanumeric0, alphanumeric1, char as nchar, digit0, digit1, hex_digit1, one_of};
use nom::combinator::{map, opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair, tuple};
use nom::IResult;

use crate::error::TextError;

/// The lexical category of a token; punctuation tokens carry no tag
/// (there is no `TokenTag` variant for them — `None` is what
/// non-identifier punctuation resolves to).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTag {
    Label,
    Id,
    Name,
    VecType,
    Int,
    Str,
}

/// The result of asking the lexer for the next token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextToken {
    /// No more input remains anywhere in the stream.
    Eof,
    /// The current line is exhausted (or was blank/a comment) and
    /// `accept_eol` was set.
    Empty,
    /// A real token, with its text (quotes/`%`/`:` stripped) and tag.
    Tok(String, Option<TokenTag>),
}

fn p_id_tail(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(one_of("123456789"), digit0)),
        recognize(pair(alt((alpha1, tag("_"))), many0(alt((alphanumeric1, tag("_")))))),
    ))(input)
}

fn p_label(input: &str) -> IResult<&str, (String, Option<TokenTag>)> {
    map(delimited(nchar('%'), p_id_tail, nchar(':')), |s: &str| (s.to_owned(), Some(TokenTag::Label)))(input)
}

fn p_id(input: &str) -> IResult<&str, (String, Option<TokenTag>)> {
    map(pair(nchar('%'), p_id_tail), |(_, s)| (s.to_owned(), Some(TokenTag::Id)))(input)
}

fn p_name(input: &str) -> IResult<&str, (String, Option<TokenTag>)> {
    map(recognize(pair(alpha1, many0(alt((alphanumeric1, tag(".")))))), |s: &str| {
        (s.to_owned(), Some(TokenTag::Name))
    })(input)
}

fn p_punct(input: &str) -> IResult<&str, (String, Option<TokenTag>)> {
    map(one_of(",={}()|"), |c: char| (c.to_string(), None))(input)
}

fn p_vec_type(input: &str) -> IResult<&str, (String, Option<TokenTag>)> {
    map(recognize(tuple((nchar('<'), digit1, tag(" x "), alphanumeric0, nchar('>')))), |s: &str| {
        (s.to_owned(), Some(TokenTag::VecType))
    })(input)
}

fn p_int(input: &str) -> IResult<&str, (String, Option<TokenTag>)> {
    let body = alt((
        recognize(pair(tag("0b"), nom::multi::many1(one_of("01")))),
        recognize(pair(tag("0x"), hex_digit1)),
        recognize(pair(one_of("123456789"), digit0)),
        tag("0"),
    ));
    map(recognize(pair(opt(nchar('-')), body)), |s: &str| (s.to_owned(), Some(TokenTag::Int)))(input)
}

fn p_string(input: &str) -> IResult<&str, (String, Option<TokenTag>)> {
    map(recognize(delimited(nchar('"'), take_until("\""), nchar('"'))), |s: &str| {
        (s.to_owned(), Some(TokenTag::Str))
    })(input)
}

fn lex_one(input: &str) -> Option<(String, Option<TokenTag>, &str)> {
    let mut parser = alt((p_label, p_id, p_name, p_punct, p_vec_type, p_int, p_string));
    match parser(input) {
        Ok((rest, (text, tag))) => Some((text, tag, rest)),
        Err(_) => None,
    }
}

/// A stateful cursor over the source, yielding tokens one line at a
/// time. See the module doc for the line-buffering discipline.
pub struct Lexer<'a> {
    lines: std::str::Lines<'a>,
    line: Option<String>,
    pub line_no: usize,
    peeked: Option<NextToken>,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { lines: input.lines(), line: None, line_no: 0, peeked: None }
    }

    fn check_expect(&self, tok: &NextToken, expect: Option<&str>) -> Result<(), TextError> {
        let Some(expect) = expect else { return Ok(()) };
        match tok {
            NextToken::Tok(text, _) if text == expect => Ok(()),
            _ => Err(TextError::syntax(self.line_no, format!("expected {expect}"))),
        }
    }

    /// Return the next token.
    ///
    /// `expect`, when set, is a literal the token's text must match (a
    /// punctuation mark or keyword); `peek` re-reads the same token on
    /// the following call instead of consuming it; `accept_eol` turns a
    /// would-be "expected more tokens" error at end of line into
    /// [`NextToken::Empty`] instead.
    pub fn get_next_token(
        &mut self,
        expect: Option<&str>,
        peek: bool,
        accept_eol: bool,
    ) -> Result<NextToken, TextError> {
        if let Some(tok) = self.peeked.clone() {
            if !peek {
                self.peeked = None;
            }
            self.check_expect(&tok, expect)?;
            return Ok(tok);
        }

        if self.line.is_none() {
            match self.lines.next() {
                Some(l) => {
                    self.line = Some(l.to_owned());
                    self.line_no += 1;
                }
                None => return Ok(NextToken::Eof),
            }
        }

        let trimmed = self.line.as_deref().unwrap_or("").trim_start().to_owned();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            self.line = Some(trimmed);
            return if accept_eol {
                Ok(NextToken::Empty)
            } else {
                Err(TextError::syntax(self.line_no, "expected more tokens"))
            };
        }

        let Some((text, tag, rest)) = lex_one(&trimmed) else {
            return Err(TextError::syntax(self.line_no, "syntax error"));
        };
        self.line = Some(rest.to_owned());
        let result = NextToken::Tok(text, tag);
        if peek {
            self.peeked = Some(result.clone());
        }
        self.check_expect(&result, expect)?;
        Ok(result)
    }

    /// Check that nothing but whitespace/comment remains on the
    /// current line, then mark it consumed so the next token read
    /// pulls a fresh line.
    pub fn done_with_line(&mut self) -> Result<(), TextError> {
        match self.get_next_token(None, false, true)? {
            NextToken::Empty | NextToken::Eof => {}
            NextToken::Tok(..) => {
                return Err(TextError::syntax(self.line_no, "spurious tokens after expected end of line"))
            }
        }
        self.line = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[coverage_helper::test]
    fn lexes_an_instruction_line() {
        let mut lexer = Lexer::new("%1 = OpTypeVoid");
        assert_eq!(lexer.get_next_token(None, false, false).unwrap(), NextToken::Tok("1".into(), Some(TokenTag::Id)));
        assert_eq!(lexer.get_next_token(Some("="), false, false).unwrap(), NextToken::Tok("=".into(), None));
        assert_eq!(
            lexer.get_next_token(None, false, false).unwrap(),
            NextToken::Tok("OpTypeVoid".into(), Some(TokenTag::Name))
        );
        assert!(lexer.done_with_line().is_ok());
    }

    #[coverage_helper::test]
    fn distinguishes_labels_from_ids() {
        let mut lexer = Lexer::new("%entry:");
        assert_eq!(
            lexer.get_next_token(None, false, false).unwrap(),
            NextToken::Tok("entry".into(), Some(TokenTag::Label))
        );
    }

    #[coverage_helper::test]
    fn lexes_vector_types_and_strings() {
        let mut lexer = Lexer::new(r#"<4 x f32> "hello""#);
        assert_eq!(
            lexer.get_next_token(None, false, false).unwrap(),
            NextToken::Tok("<4 x f32>".into(), Some(TokenTag::VecType))
        );
        assert_eq!(
            lexer.get_next_token(None, false, false).unwrap(),
            NextToken::Tok("\"hello\"".into(), Some(TokenTag::Str))
        );
    }

    #[coverage_helper::test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("foo");
        let peeked = lexer.get_next_token(None, true, false).unwrap();
        let taken = lexer.get_next_token(None, false, false).unwrap();
        assert_eq!(peeked, taken);
    }

    #[coverage_helper::test]
    fn blank_and_comment_lines_are_empty() {
        let mut lexer = Lexer::new("; a comment\n\nfoo");
        assert_eq!(lexer.get_next_token(None, false, true).unwrap(), NextToken::Empty);
        lexer.done_with_line().unwrap();
        assert_eq!(lexer.get_next_token(None, false, true).unwrap(), NextToken::Empty);
        lexer.done_with_line().unwrap();
        assert_eq!(
            lexer.get_next_token(None, false, true).unwrap(),
            NextToken::Tok("foo".into(), Some(TokenTag::Name))
        );
    }
}
