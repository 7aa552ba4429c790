//! Template tokenizer implementation.

use std::sync::Arc;

use super::{ClauseKind, LogicalOperator, SetOperator, SqlToken, SqlTokenKind};
use crate::error::{Result, TemplateError};
use crate::expr::{is_identifier_part, is_identifier_start};
use crate::location::{Location, Span};

/// A lexer that tokenizes SQL templates.
///
/// Directive bodies are validated here so that an empty `/*%if*/` or a
/// malformed `/*%for*/` fails before parsing starts.
pub struct SqlLexer<'a> {
    /// The template text.
    input: &'a str,
    /// Shared copy of the template for locations.
    source: Arc<str>,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> SqlLexer<'a> {
    /// Creates a new lexer for the given template.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            source: Arc::from(input),
            pos: 0,
            start: 0,
        }
    }

    /// Resolves a byte offset into a location inside the template.
    #[must_use]
    pub fn location(&self, offset: usize) -> Location {
        Location::at(&self.source, offset)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn make_token(&self, kind: SqlTokenKind) -> SqlToken<'a> {
        SqlToken::new(
            kind,
            &self.input[self.start..self.pos],
            Span::new(self.start, self.pos),
        )
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::lexical(message, self.location(self.start))
    }

    /// Scans the next token.
    ///
    /// # Errors
    ///
    /// Returns a lexical error for unterminated quotes and comments, unknown
    /// `/*%` directives, and directives with an empty or malformed body.
    pub fn next_token(&mut self) -> Result<SqlToken<'a>> {
        self.start = self.pos;

        let Some(c) = self.advance() else {
            return Ok(self.make_token(SqlTokenKind::Eof));
        };

        let kind = match c {
            c if c.is_whitespace() => {
                while self.peek().is_some_and(char::is_whitespace) {
                    self.advance();
                }
                SqlTokenKind::Whitespace
            }
            '(' => SqlTokenKind::OpenBracket,
            ')' => SqlTokenKind::CloseBracket,
            ';' => SqlTokenKind::Delimiter,
            '\'' => self.scan_quote()?,
            '"' => self.scan_quoted_identifier()?,
            '-' if self.peek() == Some('-') => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                SqlTokenKind::Comment
            }
            '/' if self.peek() == Some('*') => self.scan_block_comment()?,
            '+' | '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_word();
                SqlTokenKind::Word
            }
            c if is_word_part(c) => {
                self.scan_word();
                self.keyword()
            }
            _ => SqlTokenKind::Other,
        };

        Ok(self.make_token(kind))
    }

    /// Scans `'...'`; the opening quote is already consumed.
    fn scan_quote(&mut self) -> Result<SqlTokenKind> {
        loop {
            match self.advance() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.advance();
                }
                Some('\'') => return Ok(SqlTokenKind::Quote),
                Some(_) => {}
                None => return Err(self.error("The end of single quotation mark is not found")),
            }
        }
    }

    /// Scans `"..."`; the opening quote is already consumed.
    fn scan_quoted_identifier(&mut self) -> Result<SqlTokenKind> {
        loop {
            match self.advance() {
                Some('"') if self.peek() == Some('"') => {
                    self.advance();
                }
                Some('"') => return Ok(SqlTokenKind::Word),
                Some(_) => {}
                None => return Err(self.error("The end of double quotation mark is not found")),
            }
        }
    }

    fn scan_word(&mut self) {
        while self.peek().is_some_and(is_word_part) {
            self.advance();
        }
    }

    /// Classifies the word just scanned, extending it over `by` or `update`
    /// for the two-word clause keywords.
    fn keyword(&mut self) -> SqlTokenKind {
        let input = self.input;
        let word = &input[self.start..self.pos];
        match word.to_ascii_lowercase().as_str() {
            "select" => SqlTokenKind::Clause(ClauseKind::Select),
            "from" => SqlTokenKind::Clause(ClauseKind::From),
            "where" => SqlTokenKind::Clause(ClauseKind::Where),
            "having" => SqlTokenKind::Clause(ClauseKind::Having),
            "option" => SqlTokenKind::Clause(ClauseKind::Option),
            "union" => SqlTokenKind::Set(SetOperator::Union),
            "except" => SqlTokenKind::Set(SetOperator::Except),
            "minus" => SqlTokenKind::Set(SetOperator::Minus),
            "intersect" => SqlTokenKind::Set(SetOperator::Intersect),
            "and" => SqlTokenKind::Logical(LogicalOperator::And),
            "or" => SqlTokenKind::Logical(LogicalOperator::Or),
            "group" if self.extend_with("by") => SqlTokenKind::Clause(ClauseKind::GroupBy),
            "order" if self.extend_with("by") => SqlTokenKind::Clause(ClauseKind::OrderBy),
            "for" if self.extend_with("update") => SqlTokenKind::Clause(ClauseKind::ForUpdate),
            _ => SqlTokenKind::Word,
        }
    }

    /// Consumes whitespace followed by `word` as a whole word, or nothing.
    fn extend_with(&mut self, word: &str) -> bool {
        let input = self.input;
        let rest = &input[self.pos..];
        let after_space = rest.trim_start();
        if after_space.len() == rest.len() {
            return false;
        }
        let Some(candidate) = after_space.get(..word.len()) else {
            return false;
        };
        if !candidate.eq_ignore_ascii_case(word) {
            return false;
        }
        let tail = &after_space[word.len()..];
        if tail.chars().next().is_some_and(is_word_part) {
            return false;
        }
        self.pos = input.len() - tail.len();
        true
    }

    /// Scans `/*...*/`; the slash is already consumed.
    fn scan_block_comment(&mut self) -> Result<SqlTokenKind> {
        self.advance();
        let Some(close) = self.input[self.pos..].find("*/") else {
            return Err(self.error("The end of comment is not found"));
        };
        self.pos += close + 2;

        let input = self.input;
        let inner = &input[self.start + 2..self.pos - 2];
        let kind = match inner.chars().next() {
            Some('%') => self.control_directive(&inner[1..])?,
            Some('^') => SqlTokenKind::LiteralValueDirective,
            Some('#') => SqlTokenKind::EmbeddedValueDirective,
            Some(c) if is_identifier_start(c) => SqlTokenKind::BindValueDirective,
            _ => return Ok(SqlTokenKind::Comment),
        };
        self.validate_directive(kind)?;
        Ok(kind)
    }

    /// Identifies a `/*%` directive from the text after the `%`.
    fn control_directive(&self, text: &str) -> Result<SqlTokenKind> {
        const DIRECTIVES: [(&str, SqlTokenKind); 6] = [
            ("elseif", SqlTokenKind::ElseifDirective),
            ("else", SqlTokenKind::ElseDirective),
            ("end", SqlTokenKind::EndDirective),
            ("if", SqlTokenKind::IfDirective),
            ("for", SqlTokenKind::ForDirective),
            ("expand", SqlTokenKind::ExpandDirective),
        ];
        DIRECTIVES
            .iter()
            .find(|(name, _)| {
                text.strip_prefix(name)
                    .is_some_and(|rest| !rest.chars().next().is_some_and(is_identifier_part))
            })
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                self.error(format!(
                    "The directive \"/*%{text}*/\" is not supported"
                ))
            })
    }

    /// Checks the body of the directive just scanned.
    fn validate_directive(&self, kind: SqlTokenKind) -> Result<()> {
        let body = self.make_token(kind).directive_body().unwrap_or_default();
        match kind {
            SqlTokenKind::ElseDirective | SqlTokenKind::EndDirective => {
                if body.is_empty() {
                    Ok(())
                } else {
                    Err(self.error(format!(
                        "The {} directive does not take an expression",
                        kind.directive_name()
                    )))
                }
            }
            _ if body.is_empty() => Err(self.error(format!(
                "The expression is not found in the {} directive",
                kind.directive_name()
            ))),
            SqlTokenKind::ForDirective => {
                if for_parts(body).is_some() {
                    Ok(())
                } else {
                    Err(self.error(
                        "The for directive must have the form \"<identifier> in <expression>\"",
                    ))
                }
            }
            _ => Ok(()),
        }
    }

    /// Tokenizes the whole template, including the final `Eof` token.
    ///
    /// # Errors
    ///
    /// Returns the first lexical error encountered.
    pub fn tokenize(&mut self) -> Result<Vec<SqlToken<'a>>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == SqlTokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Splits a `for` directive body into the loop identifier and the iterable
/// expression.
pub(crate) fn for_parts(body: &str) -> Option<(&str, &str)> {
    let body = body.trim();
    let split = body.find(char::is_whitespace)?;
    let (identifier, rest) = body.split_at(split);
    let rest = rest.trim_start().strip_prefix("in")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let expression = rest.trim();
    let mut chars = identifier.chars();
    let valid_identifier = chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_part);
    (valid_identifier && !expression.is_empty()).then_some((identifier, expression))
}

fn is_word_part(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '@')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<SqlToken<'_>> {
        SqlLexer::new(input).tokenize().unwrap()
    }

    fn token_kinds(input: &str) -> Vec<SqlTokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(input: &str) -> TemplateError {
        SqlLexer::new(input)
            .tokenize()
            .expect_err(&format!("Expected lexical error for: {input}"))
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(token_kinds(""), vec![SqlTokenKind::Eof]);
    }

    #[test]
    fn test_simple_select() {
        assert_eq!(
            token_kinds("select * from emp where id = 1"),
            vec![
                SqlTokenKind::Clause(ClauseKind::Select),
                SqlTokenKind::Whitespace,
                SqlTokenKind::Other,
                SqlTokenKind::Whitespace,
                SqlTokenKind::Clause(ClauseKind::From),
                SqlTokenKind::Whitespace,
                SqlTokenKind::Word,
                SqlTokenKind::Whitespace,
                SqlTokenKind::Clause(ClauseKind::Where),
                SqlTokenKind::Whitespace,
                SqlTokenKind::Word,
                SqlTokenKind::Whitespace,
                SqlTokenKind::Other,
                SqlTokenKind::Whitespace,
                SqlTokenKind::Word,
                SqlTokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            token_kinds("SELECT Where AND oR"),
            vec![
                SqlTokenKind::Clause(ClauseKind::Select),
                SqlTokenKind::Whitespace,
                SqlTokenKind::Clause(ClauseKind::Where),
                SqlTokenKind::Whitespace,
                SqlTokenKind::Logical(LogicalOperator::And),
                SqlTokenKind::Whitespace,
                SqlTokenKind::Logical(LogicalOperator::Or),
                SqlTokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_compound_keywords() {
        let tokens = tokenize("order  by x group\nby y for update");
        assert_eq!(tokens[0].kind, SqlTokenKind::Clause(ClauseKind::OrderBy));
        assert_eq!(tokens[0].text, "order  by");
        assert_eq!(tokens[4].kind, SqlTokenKind::Clause(ClauseKind::GroupBy));
        assert_eq!(tokens[4].text, "group\nby");
        assert_eq!(tokens[8].kind, SqlTokenKind::Clause(ClauseKind::ForUpdate));
    }

    #[test]
    fn test_keyword_prefix_is_a_word() {
        assert_eq!(
            token_kinds("selection order_no orders by"),
            vec![
                SqlTokenKind::Word,
                SqlTokenKind::Whitespace,
                SqlTokenKind::Word,
                SqlTokenKind::Whitespace,
                SqlTokenKind::Word,
                SqlTokenKind::Whitespace,
                SqlTokenKind::Word,
                SqlTokenKind::Eof,
            ]
        );
        assert_eq!(token_kinds("order bystander")[0], SqlTokenKind::Word);
        assert_eq!(token_kinds("for x")[0], SqlTokenKind::Word);
    }

    #[test]
    fn test_set_operators() {
        assert_eq!(token_kinds("union")[0], SqlTokenKind::Set(SetOperator::Union));
        assert_eq!(token_kinds("EXCEPT")[0], SqlTokenKind::Set(SetOperator::Except));
        assert_eq!(token_kinds("minus")[0], SqlTokenKind::Set(SetOperator::Minus));
        assert_eq!(token_kinds("intersect")[0], SqlTokenKind::Set(SetOperator::Intersect));
    }

    #[test]
    fn test_quotes() {
        let tokens = tokenize("'it''s' \"col name\"");
        assert_eq!(tokens[0].kind, SqlTokenKind::Quote);
        assert_eq!(tokens[0].text, "'it''s'");
        assert_eq!(tokens[2].kind, SqlTokenKind::Word);
        assert_eq!(tokens[2].text, "\"col name\"");
    }

    #[test]
    fn test_signed_number_is_a_word() {
        let tokens = tokenize("-10 - 2");
        assert_eq!(tokens[0].kind, SqlTokenKind::Word);
        assert_eq!(tokens[0].text, "-10");
        assert_eq!(tokens[2].kind, SqlTokenKind::Other);
    }

    #[test]
    fn test_comments() {
        let tokens = tokenize("-- line\n/* block */ /**/");
        assert_eq!(tokens[0].kind, SqlTokenKind::Comment);
        assert_eq!(tokens[0].text, "-- line");
        assert_eq!(tokens[2].kind, SqlTokenKind::Comment);
        assert_eq!(tokens[4].kind, SqlTokenKind::Comment);
    }

    #[test]
    fn test_directives() {
        assert_eq!(
            token_kinds("/*name*//*^name*//*#name*//*%expand e*//*%if a*//*%elseif b*//*%else*//*%end*//*%for i in list*/"),
            vec![
                SqlTokenKind::BindValueDirective,
                SqlTokenKind::LiteralValueDirective,
                SqlTokenKind::EmbeddedValueDirective,
                SqlTokenKind::ExpandDirective,
                SqlTokenKind::IfDirective,
                SqlTokenKind::ElseifDirective,
                SqlTokenKind::ElseDirective,
                SqlTokenKind::EndDirective,
                SqlTokenKind::ForDirective,
                SqlTokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hint_is_a_comment() {
        assert_eq!(token_kinds("/*+ INDEX(a) */")[0], SqlTokenKind::Comment);
        assert_eq!(token_kinds("/* name */")[0], SqlTokenKind::Comment);
    }

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("select /*id*/1");
        assert_eq!(tokens[2].span, Span::new(7, 13));
        assert_eq!(tokens[3].span, Span::new(13, 14));
    }

    #[test]
    fn test_unterminated_quote() {
        let error = lex_err("where name = 'abc");
        assert_eq!(
            error.to_string(),
            "The end of single quotation mark is not found at <where name = 'abc>:1:14"
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let error = lex_err("select /* abc");
        assert!(matches!(error, TemplateError::Lexical { .. }));
    }

    #[test]
    fn test_empty_directive_bodies() {
        for input in ["/*%if*/", "/*%if  */", "/*%elseif*/", "/*^ */", "/*# */", "/*%for */", "/*%expand*/"] {
            let error = lex_err(input);
            assert!(
                error.to_string().starts_with("The expression is not found"),
                "{input}: {error}"
            );
        }
    }

    #[test]
    fn test_malformed_for_directive() {
        for input in ["/*%for list*/", "/*%for i list*/", "/*%for 1i in list*/", "/*%for i in */", "/*%for i inlist*/"] {
            let error = lex_err(input);
            assert!(matches!(error, TemplateError::Lexical { .. }), "{input}");
        }
    }

    #[test]
    fn test_unknown_directive() {
        let error = lex_err("/*%iff a*/");
        assert!(error.to_string().contains("is not supported"));
        assert!(lex_err("/*%while a*/").to_string().contains("is not supported"));
    }

    #[test]
    fn test_else_with_expression() {
        assert!(matches!(lex_err("/*%else a*/"), TemplateError::Lexical { .. }));
    }

    #[test]
    fn test_for_parts() {
        assert_eq!(for_parts("i in list"), Some(("i", "list")));
        assert_eq!(for_parts(" item  in  a.b.c "), Some(("item", "a.b.c")));
        assert_eq!(for_parts("index in list"), Some(("index", "list")));
        assert_eq!(for_parts("i in"), None);
        assert_eq!(for_parts("in in list"), Some(("in", "list")));
    }

    #[test]
    fn test_location_line_and_position() {
        let error = lex_err("select *\nfrom t\nwhere a = /*%if*/");
        let location = error.location();
        assert_eq!(location.line, 3);
        assert_eq!(location.position, 11);
    }
}
