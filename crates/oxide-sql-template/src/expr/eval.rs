//! Expression evaluation against a parameter context.

use std::cmp::Ordering;

use super::{BinaryOp, ExprNode, Extensions};
use crate::context::ParamContext;
use crate::error::ExprError;
use crate::location::Location;
use crate::value::{BoundValue, Value, ValueType};

/// Evaluates expression trees against a parameter context.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    context: &'a ParamContext,
    extensions: &'a Extensions,
}

impl<'a> Evaluator<'a> {
    /// Creates a new evaluator.
    #[must_use]
    pub const fn new(context: &'a ParamContext, extensions: &'a Extensions) -> Self {
        Self {
            context,
            extensions,
        }
    }

    /// Evaluates a node into a value and its declared type.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error for unresolved names and members, null
    /// receivers, non-boolean logical operands, and comparisons between
    /// values of different types.
    pub fn eval(&self, node: &ExprNode) -> Result<BoundValue, ExprError> {
        match node {
            ExprNode::Literal { value, ty, .. } => Ok(BoundValue::new(value.clone(), *ty)),
            ExprNode::Value { name, location } => self.context.get(name).cloned().ok_or_else(|| {
                ExprError::evaluation(format!("The value \"{name}\" is not found"), location.clone())
            }),
            ExprNode::Property {
                receiver,
                name,
                location,
            } => {
                let receiver = self.eval(receiver)?;
                if receiver.value.is_null() {
                    return Err(ExprError::evaluation(
                        format!("The receiver of the property \"{name}\" is null"),
                        location.clone(),
                    ));
                }
                self.extensions
                    .property(&receiver.value, name)
                    .ok_or_else(|| {
                        ExprError::evaluation(
                            format!(
                                "The property \"{name}\" is not found in the type \"{}\"",
                                receiver.value.value_type()
                            ),
                            location.clone(),
                        )
                    })
            }
            ExprNode::Function {
                receiver,
                name,
                args,
                location,
            } => {
                let receiver = self.eval(receiver)?;
                if receiver.value.is_null() {
                    return Err(ExprError::evaluation(
                        format!("The receiver of the function \"{name}\" is null"),
                        location.clone(),
                    ));
                }
                let function = self.extensions.function(&receiver.value, name).ok_or_else(|| {
                    ExprError::evaluation(
                        format!(
                            "The function \"{name}\" is not found in the type \"{}\"",
                            receiver.value.value_type()
                        ),
                        location.clone(),
                    )
                })?;
                let args = self.eval_args(args)?;
                function(&receiver.value, &args).map_err(|message| {
                    ExprError::evaluation(
                        format!("The function \"{name}\" failed: {message}"),
                        location.clone(),
                    )
                })
            }
            ExprNode::Comma { items, .. } => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item).map(|bound| bound.value))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(BoundValue::new(Value::List(values), ValueType::List))
            }
            ExprNode::Not { operand, location } => {
                let operand = self.eval_bool(operand, "!", location)?;
                Ok(BoundValue::new(Value::Bool(!operand), ValueType::Boolean))
            }
            ExprNode::Binary {
                op,
                left,
                right,
                location,
            } => self.eval_binary(*op, left, right, location),
            ExprNode::Empty { .. } => Ok(BoundValue::null(ValueType::Any)),
        }
    }

    /// Evaluates a node that must produce a boolean.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the value is not a boolean.
    pub fn eval_condition(&self, node: &ExprNode) -> Result<bool, ExprError> {
        let bound = self.eval(node)?;
        bound.value.as_bool().ok_or_else(|| {
            ExprError::evaluation(
                format!(
                    "The condition must be a Boolean, but it is \"{}\"",
                    bound.value.value_type()
                ),
                node.location().clone(),
            )
        })
    }

    fn eval_args(&self, args: &ExprNode) -> Result<Vec<BoundValue>, ExprError> {
        match args {
            ExprNode::Empty { .. } => Ok(Vec::new()),
            ExprNode::Comma { items, .. } => items.iter().map(|item| self.eval(item)).collect(),
            single => Ok(vec![self.eval(single)?]),
        }
    }

    fn eval_bool(&self, node: &ExprNode, op: &str, location: &Location) -> Result<bool, ExprError> {
        let bound = self.eval(node)?;
        bound.value.as_bool().ok_or_else(|| {
            ExprError::evaluation(
                format!(
                    "The operand of \"{op}\" must be a Boolean, but it is \"{}\"",
                    bound.value.value_type()
                ),
                location.clone(),
            )
        })
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &ExprNode,
        right: &ExprNode,
        location: &Location,
    ) -> Result<BoundValue, ExprError> {
        let result = match op {
            BinaryOp::And => {
                self.eval_bool(left, op.as_str(), location)?
                    && self.eval_bool(right, op.as_str(), location)?
            }
            BinaryOp::Or => {
                self.eval_bool(left, op.as_str(), location)?
                    || self.eval_bool(right, op.as_str(), location)?
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let left = self.eval(left)?.value;
                let right = self.eval(right)?.value;
                let equal = equals(&left, &right).ok_or_else(|| incomparable(op, &left, &right, location))?;
                equal == (op == BinaryOp::Eq)
            }
            BinaryOp::Ge | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Lt => {
                let left = self.eval(left)?.value;
                let right = self.eval(right)?.value;
                let ordering = left
                    .compare(&right)
                    .ok_or_else(|| incomparable(op, &left, &right, location))?;
                match op {
                    BinaryOp::Ge => ordering != Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    _ => ordering == Ordering::Less,
                }
            }
        };
        Ok(BoundValue::new(Value::Bool(result), ValueType::Boolean))
    }
}

/// Tests equality. `NULL` equals only `NULL`; other values must share a
/// runtime type.
fn equals(left: &Value, right: &Value) -> Option<bool> {
    if left.is_null() || right.is_null() {
        return Some(left.is_null() && right.is_null());
    }
    if left.value_type() != right.value_type() {
        return None;
    }
    Some(
        left.compare(right)
            .map_or_else(|| left == right, |ordering| ordering == Ordering::Equal),
    )
}

fn incomparable(op: BinaryOp, left: &Value, right: &Value, location: &Location) -> ExprError {
    ExprError::evaluation(
        format!(
            "The operator \"{}\" cannot compare \"{}\" with \"{}\"",
            op.as_str(),
            left.value_type(),
            right.value_type()
        ),
        location.clone(),
    )
}
