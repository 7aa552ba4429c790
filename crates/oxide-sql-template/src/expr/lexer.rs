//! Expression tokenizer implementation.

use std::sync::Arc;

use super::{ExprToken, ExprTokenKind};
use crate::error::ExprError;
use crate::location::{Location, Span};

/// Number of characters inspected before committing to a token.
const LOOKAHEAD: usize = 5;

/// A lexer that tokenizes directive expressions.
///
/// Operators such as `>` or `&&` are only recognized directly after a token
/// that produced a value; elsewhere they lex as [`ExprTokenKind::Other`].
pub struct ExprLexer<'a> {
    /// The expression text.
    input: &'a str,
    /// Shared copy of the expression for locations.
    source: Arc<str>,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
    /// Whether the previous token allows a binary operator to follow.
    binary_op_available: bool,
}

impl<'a> ExprLexer<'a> {
    /// Creates a new lexer for the given expression.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            source: Arc::from(input),
            pos: 0,
            start: 0,
            binary_op_available: false,
        }
    }

    /// Returns the expression text.
    #[must_use]
    pub const fn input(&self) -> &'a str {
        self.input
    }

    /// Resolves a byte offset into a location inside the expression.
    #[must_use]
    pub fn location(&self, offset: usize) -> Location {
        Location::at(&self.source, offset)
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the `n`-th upcoming character without advancing.
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    /// Fills the fixed lookahead window.
    fn lookahead(&self) -> [Option<char>; LOOKAHEAD] {
        let mut window = [None; LOOKAHEAD];
        for (slot, c) in window.iter_mut().zip(self.input[self.pos..].chars()) {
            *slot = Some(c);
        }
        window
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Returns true if the `n`-th upcoming character cannot continue a word.
    fn is_word_terminated(&self, n: usize) -> bool {
        !self.peek_nth(n).is_some_and(is_identifier_part)
    }

    /// Creates a token spanning from start to the current position.
    fn make_token(&self, kind: ExprTokenKind) -> ExprToken<'a> {
        ExprToken::new(
            kind,
            &self.input[self.start..self.pos],
            Span::new(self.start, self.pos),
        )
    }

    fn error(&self, message: impl Into<String>) -> ExprError {
        ExprError::lexical(message, self.location(self.start))
    }

    /// Scans the next token.
    ///
    /// # Errors
    ///
    /// Returns a lexical error for unterminated quotes, illegal number
    /// literals, and malformed property or function access.
    pub fn next_token(&mut self) -> Result<ExprToken<'a>, ExprError> {
        self.start = self.pos;
        let window = self.lookahead();

        if let Some((kind, len)) = self.keyword_literal(&window) {
            self.advance_by(len);
            self.binary_op_available = true;
            return Ok(self.make_token(kind));
        }

        if self.binary_op_available {
            if let Some((kind, len)) = binary_operator(&window) {
                self.advance_by(len);
                self.binary_op_available = false;
                return Ok(self.make_token(kind));
            }
        }

        let Some(c) = self.advance() else {
            return Ok(self.make_token(ExprTokenKind::Eoe));
        };

        let kind = match c {
            c if c.is_whitespace() => {
                while self.peek().is_some_and(char::is_whitespace) {
                    self.advance();
                }
                ExprTokenKind::Whitespace
            }
            ',' => {
                self.binary_op_available = false;
                ExprTokenKind::Comma
            }
            '(' => {
                self.binary_op_available = false;
                ExprTokenKind::OpenBracket
            }
            ')' => {
                self.binary_op_available = true;
                ExprTokenKind::CloseBracket
            }
            '!' => {
                self.binary_op_available = false;
                ExprTokenKind::Not
            }
            '\'' => self.scan_char()?,
            '"' => self.scan_string()?,
            '+' | '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.scan_number()?,
            c if c.is_ascii_digit() => self.scan_number()?,
            c if is_identifier_start(c) => {
                while self.peek().is_some_and(is_identifier_part) {
                    self.advance();
                }
                self.binary_op_available = true;
                ExprTokenKind::Value
            }
            '.' => self.scan_member()?,
            _ => {
                self.binary_op_available = false;
                ExprTokenKind::Other
            }
        };

        Ok(self.make_token(kind))
    }

    /// Matches `true`, `false`, and `null` as whole words.
    fn keyword_literal(&self, window: &[Option<char>; LOOKAHEAD]) -> Option<(ExprTokenKind, usize)> {
        match window {
            [Some('f'), Some('a'), Some('l'), Some('s'), Some('e')] if self.is_word_terminated(5) => {
                Some((ExprTokenKind::False, 5))
            }
            [Some('n'), Some('u'), Some('l'), Some('l'), _] if self.is_word_terminated(4) => {
                Some((ExprTokenKind::Null, 4))
            }
            [Some('t'), Some('r'), Some('u'), Some('e'), _] if self.is_word_terminated(4) => {
                Some((ExprTokenKind::True, 4))
            }
            _ => None,
        }
    }

    /// Scans a char literal; the opening quote is already consumed.
    fn scan_char(&mut self) -> Result<ExprTokenKind, ExprError> {
        if self.advance().is_some() && self.advance() == Some('\'') {
            self.binary_op_available = true;
            Ok(ExprTokenKind::Char)
        } else {
            Err(self.error("The end of single quotation mark is not found"))
        }
    }

    /// Scans a string literal; the opening quote is already consumed.
    ///
    /// A doubled quote inside the literal stands for one quote.
    fn scan_string(&mut self) -> Result<ExprTokenKind, ExprError> {
        loop {
            match self.advance() {
                Some('"') if self.peek() == Some('"') => {
                    self.advance();
                }
                Some('"') => {
                    self.binary_op_available = true;
                    return Ok(ExprTokenKind::String);
                }
                Some(_) => {}
                None => return Err(self.error("The end of double quotation mark is not found")),
            }
        }
    }

    /// Scans a number; the sign or first digit is already consumed.
    fn scan_number(&mut self) -> Result<ExprTokenKind, ExprError> {
        let mut decimal = false;
        let mut suffix = None;

        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    self.advance();
                }
                Some('.') => {
                    self.advance();
                    if decimal || !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        return Err(self.illegal_number());
                    }
                    decimal = true;
                }
                Some(c @ ('F' | 'D' | 'L' | 'B')) => {
                    self.advance();
                    suffix = Some(c);
                    break;
                }
                _ => break,
            }
        }

        if !self.is_word_terminated(0) {
            while self.peek().is_some_and(is_identifier_part) {
                self.advance();
            }
            return Err(self.illegal_number());
        }

        let kind = match (suffix, decimal) {
            (None, false) => ExprTokenKind::Int,
            (Some('L'), false) => ExprTokenKind::Long,
            (Some('F'), _) => ExprTokenKind::Float,
            (Some('D'), _) => ExprTokenKind::Double,
            (Some('B'), _) => ExprTokenKind::BigDecimal,
            _ => return Err(self.illegal_number()),
        };
        self.binary_op_available = true;
        Ok(kind)
    }

    fn illegal_number(&self) -> ExprError {
        self.error(format!(
            "The illegal number literal \"{}\" is found",
            &self.input[self.start..self.pos]
        ))
    }

    /// Scans `.name` or `.name(`; the dot is already consumed.
    fn scan_member(&mut self) -> Result<ExprTokenKind, ExprError> {
        match self.peek() {
            None => {
                return Err(self.error("Either property or function name must follow the dot"));
            }
            Some(c) if !is_identifier_start(c) => {
                return Err(self.error(format!(
                    "The character \"{c}\" is illegal as an identifier start"
                )));
            }
            Some(_) => {}
        }
        if !self.binary_op_available {
            return Err(self.error("A property or function access must follow a value"));
        }

        while self.peek().is_some_and(is_identifier_part) {
            self.advance();
        }
        if self.peek() == Some('(') {
            self.binary_op_available = false;
            Ok(ExprTokenKind::Function)
        } else {
            self.binary_op_available = true;
            Ok(ExprTokenKind::Property)
        }
    }

    /// Tokenizes the entire expression, including the final `Eoe` token.
    ///
    /// # Errors
    ///
    /// Returns the first lexical error encountered.
    pub fn tokenize(&mut self) -> Result<Vec<ExprToken<'a>>, ExprError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eoe = token.is_eoe();
            tokens.push(token);
            if is_eoe {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Matches an operator that is only legal after a value.
fn binary_operator(window: &[Option<char>; LOOKAHEAD]) -> Option<(ExprTokenKind, usize)> {
    match window {
        [Some('&'), Some('&'), ..] => Some((ExprTokenKind::And, 2)),
        [Some('|'), Some('|'), ..] => Some((ExprTokenKind::Or, 2)),
        [Some('='), Some('='), ..] => Some((ExprTokenKind::Eq, 2)),
        [Some('!'), Some('='), ..] => Some((ExprTokenKind::Ne, 2)),
        [Some('>'), Some('='), ..] => Some((ExprTokenKind::Ge, 2)),
        [Some('<'), Some('='), ..] => Some((ExprTokenKind::Le, 2)),
        [Some('>'), ..] => Some((ExprTokenKind::Gt, 1)),
        [Some('<'), ..] => Some((ExprTokenKind::Lt, 1)),
        _ => None,
    }
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<ExprTokenKind> {
        ExprLexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn single(input: &str) -> ExprToken<'_> {
        let tokens = ExprLexer::new(input).tokenize().unwrap();
        assert_eq!(tokens.len(), 2, "expected one token for {input}: {tokens:?}");
        tokens[0]
    }

    fn lex_err(input: &str) -> ExprError {
        ExprLexer::new(input)
            .tokenize()
            .expect_err(&format!("Expected lexical error for: {input}"))
    }

    #[test]
    fn test_value() {
        let token = single("name");
        assert_eq!(token.kind, ExprTokenKind::Value);
        assert_eq!(token.text, "name");
    }

    #[test]
    fn test_string_literal() {
        let token = single("\"aaa bbb\"");
        assert_eq!(token.kind, ExprTokenKind::String);
        assert_eq!(token.text, "\"aaa bbb\"");
    }

    #[test]
    fn test_string_literal_with_doubled_quote() {
        let token = single("\"say \"\"hi\"\"\"");
        assert_eq!(token.kind, ExprTokenKind::String);
        assert_eq!(token.text, "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_char_literal() {
        let token = single("'a'");
        assert_eq!(token.kind, ExprTokenKind::Char);
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(single("+13").kind, ExprTokenKind::Int);
        assert_eq!(single("+13L").kind, ExprTokenKind::Long);
        assert_eq!(single("+13F").kind, ExprTokenKind::Float);
        assert_eq!(single("1.5D").kind, ExprTokenKind::Double);
        assert_eq!(single("-13.25B").kind, ExprTokenKind::BigDecimal);
        assert_eq!(single("+13L").text, "+13L");
    }

    #[test]
    fn test_keyword_literals() {
        assert_eq!(single("null").kind, ExprTokenKind::Null);
        assert_eq!(single("true").kind, ExprTokenKind::True);
        assert_eq!(single("false").kind, ExprTokenKind::False);
    }

    #[test]
    fn test_keyword_prefix_is_a_value() {
        assert_eq!(single("nullable").kind, ExprTokenKind::Value);
        assert_eq!(single("trueish").kind, ExprTokenKind::Value);
        assert_eq!(single("falsey").kind, ExprTokenKind::Value);
    }

    #[test]
    fn test_expressions() {
        let tokens = ExprLexer::new("manager.aaa && name.bbb").tokenize().unwrap();
        let pairs: Vec<_> = tokens.iter().map(|t| (t.kind, t.text)).collect();
        assert_eq!(
            pairs,
            vec![
                (ExprTokenKind::Value, "manager"),
                (ExprTokenKind::Property, ".aaa"),
                (ExprTokenKind::Whitespace, " "),
                (ExprTokenKind::And, "&&"),
                (ExprTokenKind::Whitespace, " "),
                (ExprTokenKind::Value, "name"),
                (ExprTokenKind::Property, ".bbb"),
                (ExprTokenKind::Eoe, ""),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = ExprLexer::new("aaa bbb ccc").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(3, 4));
        assert_eq!(tokens[2].span, Span::new(4, 7));
        assert_eq!(tokens[4].span, Span::new(8, 11));
    }

    #[test]
    fn test_function() {
        assert_eq!(
            kinds("name.startsWith(\"a\")"),
            vec![
                ExprTokenKind::Value,
                ExprTokenKind::Function,
                ExprTokenKind::OpenBracket,
                ExprTokenKind::String,
                ExprTokenKind::CloseBracket,
                ExprTokenKind::Eoe,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("a>=1 b<=2 c>3 d<4 e==5 f!=6"),
            vec![
                ExprTokenKind::Value,
                ExprTokenKind::Ge,
                ExprTokenKind::Int,
                ExprTokenKind::Whitespace,
                ExprTokenKind::Value,
                ExprTokenKind::Le,
                ExprTokenKind::Int,
                ExprTokenKind::Whitespace,
                ExprTokenKind::Value,
                ExprTokenKind::Gt,
                ExprTokenKind::Int,
                ExprTokenKind::Whitespace,
                ExprTokenKind::Value,
                ExprTokenKind::Lt,
                ExprTokenKind::Int,
                ExprTokenKind::Whitespace,
                ExprTokenKind::Value,
                ExprTokenKind::Eq,
                ExprTokenKind::Int,
                ExprTokenKind::Whitespace,
                ExprTokenKind::Value,
                ExprTokenKind::Ne,
                ExprTokenKind::Int,
                ExprTokenKind::Eoe,
            ]
        );
    }

    #[test]
    fn test_operator_without_left_operand_is_other() {
        assert_eq!(
            kinds("> a"),
            vec![
                ExprTokenKind::Other,
                ExprTokenKind::Whitespace,
                ExprTokenKind::Value,
                ExprTokenKind::Eoe,
            ]
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(
            kinds("!flag"),
            vec![ExprTokenKind::Not, ExprTokenKind::Value, ExprTokenKind::Eoe]
        );
    }

    #[test]
    fn test_unterminated_single_quote() {
        let error = lex_err("'aaa");
        assert_eq!(error.message(), "The end of single quotation mark is not found");
    }

    #[test]
    fn test_unterminated_double_quote() {
        let error = lex_err("\"aaa");
        assert_eq!(error.message(), "The end of double quotation mark is not found");
    }

    #[test]
    fn test_dangling_dot() {
        let error = lex_err("a.");
        assert_eq!(
            error.message(),
            "Either property or function name must follow the dot"
        );
    }

    #[test]
    fn test_illegal_identifier_start() {
        let error = lex_err("a.!");
        assert_eq!(error.message(), "The character \"!\" is illegal as an identifier start");
    }

    #[test]
    fn test_dot_without_receiver() {
        let error = lex_err(".name");
        assert!(matches!(error, ExprError::Lexical { .. }));
    }

    #[test]
    fn test_illegal_numbers() {
        for input in ["1.", "1.2.3", "1.5", "1.5L", "12abc", "1.x"] {
            let error = lex_err(input);
            assert!(
                error.message().starts_with("The illegal number literal"),
                "{input}: {error}"
            );
        }
    }

    #[test]
    fn test_error_location() {
        let error = lex_err("a == \"open");
        assert_eq!(error.location().position, 6);
    }
}
