//! Operator-precedence parser for directive expressions.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::trace;

use super::precedence::Operator;
use super::{BinaryOp, ExprLexer, ExprNode, ExprToken, ExprTokenKind};
use crate::error::ExprError;
use crate::location::Location;
use crate::value::{Value, ValueType};

/// An operator on the stack together with where it was written.
#[derive(Debug, Clone)]
struct Pending {
    op: Operator,
    location: Location,
}

/// A parsed operand and the height of its tree.
struct Operand {
    node: ExprNode,
    height: usize,
}

impl Operand {
    const fn leaf(node: ExprNode) -> Self {
        Self { node, height: 1 }
    }
}

/// Parser for the expression language.
///
/// Operators are pushed onto a stack and reduced against the operand stack
/// once an operator of lower or equal priority arrives. Parenthesized groups
/// are parsed by a nested call sharing the same lexer.
pub struct ExprParser<'a> {
    lexer: ExprLexer<'a>,
    max_depth: usize,
}

impl<'a> ExprParser<'a> {
    /// Creates a new parser with the default nesting limit.
    #[must_use]
    pub fn new(expression: &'a str) -> Self {
        Self::with_max_depth(expression, crate::DEFAULT_MAX_DEPTH)
    }

    /// Creates a new parser with an explicit nesting limit.
    #[must_use]
    pub fn with_max_depth(expression: &'a str, max_depth: usize) -> Self {
        Self {
            lexer: ExprLexer::new(expression),
            max_depth,
        }
    }

    /// Parses the whole expression.
    ///
    /// An expression without any operand parses to [`ExprNode::Empty`].
    ///
    /// # Errors
    ///
    /// Returns a lexical error from the lexer, or a parse error for
    /// unmatched brackets, missing operands, and trailing tokens.
    pub fn parse(mut self) -> Result<ExprNode, ExprError> {
        let operand = self.parse_group(0, None)?;
        trace!(
            expression = self.lexer.input(),
            height = operand.height,
            "Parsed expression"
        );
        Ok(operand.node)
    }

    /// Parses operands and operators until the end of the expression, or
    /// until the close bracket matching `open` when one is given.
    ///
    /// Both the bracket nesting and the height of every reduced tree are
    /// bounded by `max_depth`, so evaluation never recurses deeper than that.
    fn parse_group(&mut self, depth: usize, open: Option<Location>) -> Result<Operand, ExprError> {
        let start = open
            .clone()
            .unwrap_or_else(|| self.lexer.location(0));
        if depth > self.max_depth {
            return Err(ExprError::parse(
                format!("The expression is nested deeper than {} levels", self.max_depth),
                start,
            ));
        }

        let mut operands: Vec<Operand> = Vec::new();
        let mut operators: Vec<Pending> = Vec::new();
        let mut expect_operand = true;

        loop {
            let token = self.lexer.next_token()?;
            let location = self.lexer.location(token.span.start);

            match token.kind {
                ExprTokenKind::Whitespace => {}
                ExprTokenKind::Eoe => {
                    if let Some(open) = &open {
                        return Err(ExprError::parse("The close bracket is not found", open.clone()));
                    }
                    break;
                }
                ExprTokenKind::CloseBracket => {
                    if open.is_none() {
                        return Err(ExprError::parse("The open bracket is not found", location));
                    }
                    break;
                }
                ExprTokenKind::OpenBracket => {
                    Self::check_operand_position(expect_operand, &token, &location)?;
                    let group = self.parse_group(depth + 1, Some(location))?;
                    operands.push(group);
                    expect_operand = false;
                }
                ExprTokenKind::Value => {
                    Self::check_operand_position(expect_operand, &token, &location)?;
                    operands.push(Operand::leaf(ExprNode::Value {
                        name: token.text.to_string(),
                        location,
                    }));
                    expect_operand = false;
                }
                ExprTokenKind::Property => {
                    let receiver = operands.pop().ok_or_else(|| missing_receiver(&token, &location))?;
                    let height = self.check_height(receiver.height + 1, &location)?;
                    operands.push(Operand {
                        node: ExprNode::Property {
                            receiver: Box::new(receiver.node),
                            name: token.text[1..].to_string(),
                            location,
                        },
                        height,
                    });
                }
                ExprTokenKind::Function => {
                    let receiver = operands.pop().ok_or_else(|| missing_receiver(&token, &location))?;
                    let open_bracket = self.lexer.next_token()?;
                    let args_location = self.lexer.location(open_bracket.span.start);
                    if open_bracket.kind != ExprTokenKind::OpenBracket {
                        return Err(ExprError::parse(
                            "The open bracket of the function arguments is not found",
                            args_location,
                        ));
                    }
                    let args = self.parse_group(depth + 1, Some(args_location))?;
                    let height =
                        self.check_height(receiver.height.max(args.height) + 1, &location)?;
                    operands.push(Operand {
                        node: ExprNode::Function {
                            receiver: Box::new(receiver.node),
                            name: token.text[1..].to_string(),
                            args: Box::new(args.node),
                            location,
                        },
                        height,
                    });
                }
                ExprTokenKind::Other => {
                    return Err(ExprError::parse(
                        format!("The token \"{}\" is not supported", token.text),
                        location,
                    ));
                }
                kind => {
                    if let Some(op) = Operator::from_token(kind) {
                        if op.is_prefix() {
                            Self::check_operand_position(expect_operand, &token, &location)?;
                        } else if expect_operand {
                            return Err(missing_operand(op, &location));
                        }
                        while operators.last().is_some_and(|top| top.op.reduces_before(op)) {
                            if let Some(top) = operators.pop() {
                                self.reduce(top, &mut operands)?;
                            }
                        }
                        if operators.len() >= self.max_depth {
                            return Err(ExprError::parse(
                                format!("The expression is nested deeper than {} levels", self.max_depth),
                                location,
                            ));
                        }
                        operators.push(Pending { op, location });
                        expect_operand = true;
                    } else {
                        Self::check_operand_position(expect_operand, &token, &location)?;
                        operands.push(Operand::leaf(literal(&token, location)?));
                        expect_operand = false;
                    }
                }
            }
        }

        while let Some(top) = operators.pop() {
            self.reduce(top, &mut operands)?;
        }

        match operands.len() {
            0 => Ok(Operand::leaf(ExprNode::Empty { location: start })),
            1 => operands
                .pop()
                .ok_or_else(|| ExprError::parse("The expression is empty", start)),
            _ => Err(ExprError::parse(
                "The expression has tokens that follow a complete expression",
                operands[1].node.location().clone(),
            )),
        }
    }

    /// Rejects an operand that directly follows another operand.
    fn check_operand_position(
        expect_operand: bool,
        token: &ExprToken<'_>,
        location: &Location,
    ) -> Result<(), ExprError> {
        if expect_operand {
            Ok(())
        } else {
            Err(ExprError::parse(
                format!("The token \"{}\" must follow an operator", token.text),
                location.clone(),
            ))
        }
    }

    /// Pops the operands of `pending` and pushes the reduced node.
    fn reduce(&self, pending: Pending, operands: &mut Vec<Operand>) -> Result<(), ExprError> {
        let Pending { op, location } = pending;
        let right = operands
            .pop()
            .ok_or_else(|| missing_operand(op, &location))?;

        let (node, height) = match binary_op(op) {
            Some(binary) => {
                let left = operands
                    .pop()
                    .ok_or_else(|| missing_operand(op, &location))?;
                let height = left.height.max(right.height) + 1;
                let node = ExprNode::Binary {
                    op: binary,
                    left: Box::new(left.node),
                    right: Box::new(right.node),
                    location: location.clone(),
                };
                (node, height)
            }
            None if op.is_prefix() => {
                let node = ExprNode::Not {
                    operand: Box::new(right.node),
                    location: location.clone(),
                };
                (node, right.height + 1)
            }
            None => {
                let left = operands
                    .pop()
                    .ok_or_else(|| missing_operand(op, &location))?;
                // Comma lists stay flat, so appending does not add a level.
                let (mut items, height) = match left.node {
                    ExprNode::Comma { items, .. } => (items, left.height.max(right.height + 1)),
                    other => (vec![other], left.height.max(right.height) + 1),
                };
                items.push(right.node);
                let node = ExprNode::Comma {
                    items,
                    location: location.clone(),
                };
                (node, height)
            }
        };
        let height = self.check_height(height, &location)?;
        operands.push(Operand { node, height });
        Ok(())
    }

    /// Rejects a tree taller than the nesting limit.
    fn check_height(&self, height: usize, location: &Location) -> Result<usize, ExprError> {
        if height > self.max_depth {
            return Err(ExprError::parse(
                format!("The expression is nested deeper than {} levels", self.max_depth),
                location.clone(),
            ));
        }
        Ok(height)
    }
}

const fn binary_op(op: Operator) -> Option<BinaryOp> {
    match op {
        Operator::And => Some(BinaryOp::And),
        Operator::Or => Some(BinaryOp::Or),
        Operator::Eq => Some(BinaryOp::Eq),
        Operator::Ne => Some(BinaryOp::Ne),
        Operator::Ge => Some(BinaryOp::Ge),
        Operator::Le => Some(BinaryOp::Le),
        Operator::Gt => Some(BinaryOp::Gt),
        Operator::Lt => Some(BinaryOp::Lt),
        Operator::Comma | Operator::Not => None,
    }
}

fn missing_operand(op: Operator, location: &Location) -> ExprError {
    ExprError::parse(
        format!("The operand of \"{}\" is not found", op.symbol()),
        location.clone(),
    )
}

fn missing_receiver(token: &ExprToken<'_>, location: &Location) -> ExprError {
    ExprError::parse(
        format!("The receiver of \"{}\" is not found", token.text),
        location.clone(),
    )
}

/// Converts a literal token into a node.
fn literal(token: &ExprToken<'_>, location: Location) -> Result<ExprNode, ExprError> {
    let text = token.text;
    let (value, ty) = match token.kind {
        ExprTokenKind::Int => (Value::Int(number(text, "", &location)?), ValueType::Int),
        ExprTokenKind::Long => (Value::Long(number(text, "L", &location)?), ValueType::Long),
        ExprTokenKind::Float => (Value::Float(number(text, "F", &location)?), ValueType::Float),
        ExprTokenKind::Double => (Value::Double(number(text, "D", &location)?), ValueType::Double),
        ExprTokenKind::BigDecimal => (
            Value::Decimal(number::<Decimal>(text, "B", &location)?),
            ValueType::BigDecimal,
        ),
        ExprTokenKind::Char => {
            let c = text.chars().nth(1).ok_or_else(|| {
                ExprError::parse(format!("The illegal char literal {text} is found"), location.clone())
            })?;
            (Value::Char(c), ValueType::Char)
        }
        ExprTokenKind::String => {
            let inner = &text[1..text.len() - 1];
            (Value::String(inner.replace("\"\"", "\"")), ValueType::String)
        }
        ExprTokenKind::True => (Value::Bool(true), ValueType::Boolean),
        ExprTokenKind::False => (Value::Bool(false), ValueType::Boolean),
        ExprTokenKind::Null => (Value::Null, ValueType::Any),
        _ => {
            return Err(ExprError::parse(
                format!("The token \"{text}\" is not supported"),
                location,
            ))
        }
    };
    Ok(ExprNode::Literal {
        value,
        ty,
        location,
    })
}

/// Parses a numeric literal after removing its sign and type suffix.
fn number<T: FromStr>(text: &str, suffix: &str, location: &Location) -> Result<T, ExprError> {
    let digits = text.strip_suffix(suffix).unwrap_or(text);
    let (negative, digits) = match digits.as_bytes().first() {
        Some(b'-') => (true, &digits[1..]),
        Some(b'+') => (false, &digits[1..]),
        _ => (false, digits),
    };
    let unsigned = if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    };
    unsigned.parse().map_err(|_| {
        ExprError::parse(
            format!("The number literal \"{text}\" is out of range"),
            location.clone(),
        )
    })
}
