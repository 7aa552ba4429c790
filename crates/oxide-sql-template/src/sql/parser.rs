//! Reducer-stack parser for SQL templates.
//!
//! The parser keeps an explicit stack of reducers, one per construct that
//! is still open. Ordinary tokens are appended to the reducer on top of the
//! stack. Clause keywords close the clause before them; `and`/`or` close the
//! connector before them; `elseif`, `else` and `end` close everything down to
//! the nearest block. Brackets are parsed by a nested call with a stack of
//! their own.

use tracing::trace;

use super::lexer::for_parts;
use super::{
    Branch, ClauseKind, Directive, LogicalOperator, Node, SetOperator, SqlLexer, SqlToken,
    SqlTokenKind,
};
use crate::error::{Result, TemplateError};
use crate::location::Location;

/// A construct that is still accumulating children.
#[derive(Debug)]
enum Reducer {
    Statement(Vec<Node>),
    Clause {
        kind: ClauseKind,
        keyword: String,
        children: Vec<Node>,
    },
    Logical {
        op: LogicalOperator,
        keyword: String,
        children: Vec<Node>,
    },
    /// The left operand is complete; the right operand is the `Statement`
    /// reducer pushed on top of this one.
    Set {
        left: Node,
        op: SetOperator,
        keyword: String,
        right: Option<Node>,
    },
    /// Branches in order; the last branch receives new nodes. A branch
    /// without a directive is the `else` branch.
    IfBlock {
        location: Location,
        branches: Vec<(Option<Directive>, Vec<Node>)>,
    },
    ForBlock {
        directive: Directive,
        identifier: String,
        expression: String,
        children: Vec<Node>,
    },
}

impl Reducer {
    const fn is_block(&self) -> bool {
        matches!(self, Self::IfBlock { .. } | Self::ForBlock { .. })
    }

    fn add_node(&mut self, node: Node) {
        match self {
            Self::Statement(children)
            | Self::Clause { children, .. }
            | Self::Logical { children, .. }
            | Self::ForBlock { children, .. } => children.push(node),
            Self::Set { right, .. } => *right = Some(node),
            Self::IfBlock { branches, .. } => {
                if let Some((_, children)) = branches.last_mut() {
                    children.push(node);
                }
            }
        }
    }

    fn reduce(self) -> Node {
        match self {
            Self::Statement(children) => Node::Statement(children),
            Self::Clause {
                kind,
                keyword,
                children,
            } => Node::Clause {
                kind,
                keyword,
                children,
            },
            Self::Logical {
                op,
                keyword,
                children,
            } => Node::Logical {
                op,
                keyword,
                children,
            },
            Self::Set {
                left,
                op,
                keyword,
                right,
            } => Node::SetOperation {
                left: Box::new(left),
                op,
                keyword,
                right: Box::new(right.unwrap_or(Node::Statement(Vec::new()))),
            },
            Self::IfBlock { branches, .. } => {
                let mut if_branch = None;
                let mut elseif_branches = Vec::new();
                let mut else_branch = None;
                for (directive, children) in branches {
                    match directive {
                        Some(directive) if if_branch.is_none() => {
                            if_branch = Some(Branch {
                                directive,
                                children,
                            });
                        }
                        Some(directive) => elseif_branches.push(Branch {
                            directive,
                            children,
                        }),
                        None => else_branch = Some(children),
                    }
                }
                match if_branch {
                    Some(if_branch) => Node::IfBlock {
                        if_branch,
                        elseif_branches,
                        else_branch,
                    },
                    None => Node::Statement(else_branch.unwrap_or_default()),
                }
            }
            Self::ForBlock {
                directive,
                identifier,
                expression,
                children,
            } => Node::ForBlock {
                directive,
                identifier,
                expression,
                children,
            },
        }
    }
}

/// Parser for SQL templates.
pub struct SqlParser<'a> {
    lexer: SqlLexer<'a>,
    peeked: Option<SqlToken<'a>>,
    max_depth: usize,
}

impl<'a> SqlParser<'a> {
    /// Creates a new parser with the default nesting limit.
    #[must_use]
    pub fn new(template: &'a str) -> Self {
        Self::with_max_depth(template, crate::DEFAULT_MAX_DEPTH)
    }

    /// Creates a new parser with an explicit nesting limit.
    #[must_use]
    pub fn with_max_depth(template: &'a str, max_depth: usize) -> Self {
        Self {
            lexer: SqlLexer::new(template),
            peeked: None,
            max_depth,
        }
    }

    /// Parses the template into a single tree.
    ///
    /// Parsing stops at the first `;`; anything after it is ignored.
    ///
    /// # Errors
    ///
    /// Returns a lexical error from the lexer, or a structural error for
    /// unmatched brackets, unmatched block directives, and nesting deeper
    /// than the configured limit.
    pub fn parse(mut self) -> Result<Node> {
        self.parse_statement(0, None)
    }

    fn next_token(&mut self) -> Result<SqlToken<'a>> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn peek_token(&mut self) -> Result<SqlToken<'a>> {
        let token = self.next_token()?;
        self.peeked = Some(token);
        Ok(token)
    }

    fn location(&self, token: &SqlToken<'_>) -> Location {
        self.lexer.location(token.span.start)
    }

    fn directive(&self, token: &SqlToken<'_>) -> Directive {
        Directive {
            expression: token.directive_body().unwrap_or_default().to_string(),
            text: token.text.to_string(),
            location: self.location(token),
        }
    }

    /// Parses until end of input, a `;`, or the close bracket matching
    /// `open`.
    fn parse_statement(&mut self, depth: usize, open: Option<&Location>) -> Result<Node> {
        let mut reducers = vec![Reducer::Statement(Vec::new())];

        loop {
            let token = self.next_token()?;
            if depth + reducers.len() > self.max_depth {
                return Err(TemplateError::structural(
                    format!("The template is nested deeper than {} levels", self.max_depth),
                    self.location(&token),
                ));
            }

            match token.kind {
                SqlTokenKind::Eof | SqlTokenKind::Delimiter => {
                    if let Some(open) = open {
                        return Err(TemplateError::structural(
                            "The close bracket is not found",
                            open.clone(),
                        ));
                    }
                    break;
                }
                SqlTokenKind::CloseBracket => {
                    if open.is_none() {
                        return Err(TemplateError::structural(
                            "The open bracket is not found",
                            self.location(&token),
                        ));
                    }
                    break;
                }
                SqlTokenKind::OpenBracket => {
                    let location = self.location(&token);
                    let node = self.parse_brackets(depth + reducers.len(), &location)?;
                    push_node(&mut reducers, node);
                }
                SqlTokenKind::Word | SqlTokenKind::Quote => {
                    push_node(&mut reducers, Node::Word(token.text.to_string()));
                }
                SqlTokenKind::Whitespace => {
                    push_node(&mut reducers, Node::Whitespace(token.text.to_string()));
                }
                SqlTokenKind::Comment => {
                    push_node(&mut reducers, Node::Comment(token.text.to_string()));
                }
                SqlTokenKind::Other => {
                    push_node(&mut reducers, Node::Other(token.text.to_string()));
                }
                SqlTokenKind::Clause(kind) => {
                    reduce_while(&mut reducers, |r| {
                        matches!(r, Reducer::Clause { .. } | Reducer::Logical { .. })
                    });
                    trace!(keyword = token.text, "Opening clause");
                    reducers.push(Reducer::Clause {
                        kind,
                        keyword: token.text.to_string(),
                        children: Vec::new(),
                    });
                }
                SqlTokenKind::Logical(op) => {
                    reduce_while(&mut reducers, |r| matches!(r, Reducer::Logical { .. }));
                    reducers.push(Reducer::Logical {
                        op,
                        keyword: token.text.to_string(),
                        children: Vec::new(),
                    });
                }
                SqlTokenKind::Set(op) => {
                    let left = reduce_all(reducers)?;
                    reducers = vec![
                        Reducer::Set {
                            left,
                            op,
                            keyword: token.text.to_string(),
                            right: None,
                        },
                        Reducer::Statement(Vec::new()),
                    ];
                }
                SqlTokenKind::BindValueDirective => {
                    let directive = self.directive(&token);
                    let test_literal = self.test_literal(depth + reducers.len())?;
                    push_node(
                        &mut reducers,
                        Node::BindValue {
                            directive,
                            test_literal,
                        },
                    );
                }
                SqlTokenKind::LiteralValueDirective => {
                    let directive = self.directive(&token);
                    let test_literal = self.test_literal(depth + reducers.len())?;
                    push_node(
                        &mut reducers,
                        Node::LiteralValue {
                            directive,
                            test_literal,
                        },
                    );
                }
                SqlTokenKind::EmbeddedValueDirective => {
                    let directive = self.directive(&token);
                    push_node(&mut reducers, Node::EmbeddedValue { directive });
                }
                SqlTokenKind::ExpandDirective => {
                    let directive = self.directive(&token);
                    let next = self.peek_token()?;
                    let test_literal = if next.kind == SqlTokenKind::Other && next.text == "*" {
                        self.peeked = None;
                        Some(Box::new(Node::Other(next.text.to_string())))
                    } else {
                        None
                    };
                    push_node(
                        &mut reducers,
                        Node::Expand {
                            directive,
                            test_literal,
                        },
                    );
                }
                SqlTokenKind::IfDirective => {
                    trace!(directive = token.text, "Opening if block");
                    reducers.push(Reducer::IfBlock {
                        location: self.location(&token),
                        branches: vec![(Some(self.directive(&token)), Vec::new())],
                    });
                }
                SqlTokenKind::ElseifDirective | SqlTokenKind::ElseDirective => {
                    let directive = (token.kind == SqlTokenKind::ElseifDirective)
                        .then(|| self.directive(&token));
                    reduce_while(&mut reducers, |r| !r.is_block() && !is_statement_base(r));
                    match reducers.last_mut() {
                        Some(Reducer::IfBlock { branches, .. }) => {
                            if branches.last().is_some_and(|(d, _)| d.is_none()) {
                                return Err(TemplateError::structural(
                                    format!(
                                        "The {} directive follows the else directive",
                                        token.kind.directive_name()
                                    ),
                                    self.location(&token),
                                ));
                            }
                            branches.push((directive, Vec::new()));
                        }
                        _ => {
                            return Err(TemplateError::structural(
                                "The corresponding if directive is not found",
                                self.location(&token),
                            ));
                        }
                    }
                }
                SqlTokenKind::EndDirective => {
                    reduce_while(&mut reducers, |r| !r.is_block() && !is_statement_base(r));
                    if !reducers.last().is_some_and(Reducer::is_block) {
                        return Err(TemplateError::structural(
                            "The corresponding if or for directive is not found",
                            self.location(&token),
                        ));
                    }
                    if let Some(block) = reducers.pop() {
                        push_node(&mut reducers, block.reduce());
                    }
                }
                SqlTokenKind::ForDirective => {
                    let directive = self.directive(&token);
                    let (identifier, expression) =
                        for_parts(&directive.expression).ok_or_else(|| {
                            TemplateError::lexical(
                                "The for directive must have the form \"<identifier> in <expression>\"",
                                directive.location.clone(),
                            )
                        })?;
                    let identifier = identifier.to_string();
                    let expression = expression.to_string();
                    trace!(identifier = %identifier, expression = %expression, "Opening for block");
                    reducers.push(Reducer::ForBlock {
                        directive,
                        identifier,
                        expression,
                        children: Vec::new(),
                    });
                }
            }
        }

        reduce_all(reducers)
    }

    /// Parses a bracket group; the open bracket is already consumed.
    fn parse_brackets(&mut self, depth: usize, open: &Location) -> Result<Node> {
        if depth + 1 > self.max_depth {
            return Err(TemplateError::structural(
                format!("The template is nested deeper than {} levels", self.max_depth),
                open.clone(),
            ));
        }
        let inner = self.parse_statement(depth + 1, Some(open))?;
        Ok(Node::Brackets(Box::new(inner)))
    }

    /// Consumes the sample value written directly after a value directive.
    fn test_literal(&mut self, depth: usize) -> Result<Option<Box<Node>>> {
        let next = self.peek_token()?;
        let node = match next.kind {
            SqlTokenKind::Word | SqlTokenKind::Quote => {
                self.peeked = None;
                Node::Word(next.text.to_string())
            }
            SqlTokenKind::OpenBracket => {
                self.peeked = None;
                let location = self.location(&next);
                self.parse_brackets(depth, &location)?
            }
            _ => return Ok(None),
        };
        Ok(Some(Box::new(node)))
    }
}

/// The outermost `Statement` reducer, or the right operand of a set
/// operation.
const fn is_statement_base(reducer: &Reducer) -> bool {
    matches!(reducer, Reducer::Statement(_))
}

fn push_node(reducers: &mut [Reducer], node: Node) {
    if let Some(top) = reducers.last_mut() {
        top.add_node(node);
    }
}

/// Reduces reducers from the top of the stack while `predicate` holds.
fn reduce_while(reducers: &mut Vec<Reducer>, predicate: impl Fn(&Reducer) -> bool) {
    while reducers.last().is_some_and(&predicate) {
        if let Some(top) = reducers.pop() {
            push_node(reducers, top.reduce());
        }
    }
}

/// Reduces the whole stack into one node.
fn reduce_all(mut reducers: Vec<Reducer>) -> Result<Node> {
    while let Some(top) = reducers.pop() {
        if let Reducer::IfBlock { location, .. }
        | Reducer::ForBlock {
            directive: Directive { location, .. },
            ..
        } = &top
        {
            return Err(TemplateError::structural(
                "The corresponding end directive is not found",
                location.clone(),
            ));
        }
        let node = top.reduce();
        match reducers.last_mut() {
            Some(next) => next.add_node(node),
            None => return Ok(node),
        }
    }
    Ok(Node::Statement(Vec::new()))
}
