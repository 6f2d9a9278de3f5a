use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    rc::Rc,
};

use tern_evaluator::{Name, NearestLoc, SourceLoc, Span};

use crate::source::SourceFileRef;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOperator {
    /// `-`
    Negative,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Negative => write!(f, "-"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExpressionKind {
    Integer(i64),
    Identifier(Name),
    UnaryOperation(UnaryOperator, Box<Expression>),
    BinaryOperation(Box<Expression>, BinaryOperator, Box<Expression>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Integer(value) => write!(f, "{}", value),
            ExpressionKind::Identifier(name) => write!(f, "{}", name),
            ExpressionKind::UnaryOperation(op, expr) => write!(f, "({}{})", op, expr),
            ExpressionKind::BinaryOperation(lhs, op, rhs) => {
                write!(f, "({} {} {})", lhs, op, rhs)
            },
        }
    }
}

/// `let name = value;`
#[derive(Debug)]
pub struct Declaration {
    pub source: SourceFileRef,
    pub name: Name,
    pub name_span: Span,
    pub value: Expression,
    pub span: Span,
}

/// A shared handle to a [`Declaration`], compared by address.
#[derive(Clone)]
pub struct DeclRef(Rc<Declaration>);

impl DeclRef {
    pub fn new(decl: Declaration) -> Self {
        Self(Rc::new(decl))
    }
}

impl PartialEq for DeclRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DeclRef {}

impl Hash for DeclRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl Deref for DeclRef {
    type Target = Declaration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for DeclRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Diagnostics about a declaration point at its name.
impl NearestLoc for DeclRef {
    fn nearest_loc(&self) -> Option<SourceLoc> {
        Some(SourceLoc::new(self.source.id(), self.name_span))
    }
}

#[derive(Debug)]
pub struct Module {
    pub declarations: Vec<DeclRef>,
}

impl Module {
    /// The first declaration of `name`, if any.
    pub fn find(&self, name: &str) -> Option<&DeclRef> {
        self.declarations.iter().find(|decl| &*decl.name == name)
    }
}
