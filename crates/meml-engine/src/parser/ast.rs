//! Abstract syntax tree for meml items and expressions.
//!
//! Expressions are already desugared: infix operators become calls, and
//! parenthesised tuples `(a b c)` become nested `Pair/New` calls. Bodies the
//! evaluator closes over are reference counted so that a closure can share
//! them without copying the tree.

use crate::parser::interner::Symbol;
use crate::parser::operators::{Associativity, OperatorTarget, Precedence};
use crate::parser::token::Span;
use std::rc::Rc;

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// What is declared
    pub kind: ItemKind,
    /// Optional `@Name(text)` directive written before the item
    pub directive: Option<Directive>,
    /// Location of the declaration keyword through the end of the item
    pub span: Span,
}

/// `@Fails(error: message)`
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Directive name
    pub name: Symbol,
    /// Raw directive text
    pub text: String,
    /// Location
    pub span: Span,
}

/// Declaration kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// `class Name 'A | Ctor(T ...) ... end`
    Class(ClassDecl),
    /// `let name: T = e`
    Let(LetDecl),
    /// `fun name('A x:T): R = e` or `fun .name(self:C ...): R = e`
    Fun(FunDecl),
    /// `infix left at 75. "+" = ".add"`
    Infix(InfixDecl),
}

/// Variant type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// Type name
    pub name: Symbol,
    /// Generic parameter names
    pub generics: Vec<Symbol>,
    /// Constructors in declaration order
    pub constructors: Vec<ConstructorDecl>,
}

/// One `| Ctor(T ...)` alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    /// Constructor name, unqualified
    pub name: Symbol,
    /// Field type expressions
    pub fields: Vec<Expr>,
    /// Location
    pub span: Span,
}

/// Annotated binding.
#[derive(Debug, Clone, PartialEq)]
pub struct LetDecl {
    /// Bound name
    pub name: Symbol,
    /// Type expression
    pub annotation: Expr,
    /// Initializer, evaluated on first use
    pub value: Rc<Expr>,
}

/// Function or method declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    /// Name as written, without the leading dot of a method
    pub name: Symbol,
    /// `fun .name(...)`: registered as `Class/name`
    pub is_method: bool,
    /// Generic parameter names
    pub generics: Vec<Symbol>,
    /// Parameters
    pub params: Vec<Param>,
    /// Return type expression
    pub return_type: Expr,
    /// Body
    pub body: Rc<Expr>,
}

/// `name:Type`
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name (`-` for an ignored parameter)
    pub name: Symbol,
    /// Type expression
    pub annotation: Expr,
    /// Location
    pub span: Span,
}

/// Operator declaration, already entered into the operator table by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct InfixDecl {
    /// Operator text
    pub symbol: Symbol,
    /// Binding strength
    pub precedence: Precedence,
    /// Grouping
    pub associativity: Associativity,
    /// Desugaring target
    pub target: OperatorTarget,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Expression kind
    pub kind: ExprKind,
    /// Location
    pub span: Span,
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `42`
    Int(i64),
    /// `"text"`
    Str(Symbol),
    /// `name`
    Var(Symbol),
    /// `@[a b c]`
    Array(Vec<Expr>),
    /// `@any`
    Any,
    /// `[A B]C`
    Arrow {
        /// Parameter types
        domain: Vec<Expr>,
        /// Result type
        codomain: Box<Expr>,
    },
    /// `native "name"(args)`
    Native {
        /// Primitive name
        name: Symbol,
        /// Arguments
        args: Vec<Expr>,
    },
    /// `f(a b) λ x. e` or `recv.m(a) { x. e }`
    Call {
        /// Function or method being called
        callee: Callee,
        /// Positional arguments
        args: Vec<Expr>,
        /// Trailing lambdas, after the positional arguments
        lambdas: Vec<Lambda>,
    },
}

/// The called thing of a [`ExprKind::Call`].
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// Any expression of arrow type
    Function(Box<Expr>),
    /// `receiver.name`, resolved by the checker on the receiver's class
    Method {
        /// Receiver, passed as first argument
        receiver: Box<Expr>,
        /// Unqualified method name
        name: Symbol,
    },
}

/// `λ x y. body` or `{ x y. body }`
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    /// Parameter names
    pub params: Vec<Symbol>,
    /// Body
    pub body: Rc<Expr>,
    /// Location
    pub span: Span,
}

impl Expr {
    /// Create an expression node.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Plain call `function(args)`.
    pub fn call(function: Expr, args: Vec<Expr>, span: Span) -> Self {
        Expr::new(
            ExprKind::Call {
                callee: Callee::Function(Box::new(function)),
                args,
                lambdas: Vec::new(),
            },
            span,
        )
    }

    /// Method call `receiver.name(args)`.
    pub fn method_call(receiver: Expr, name: Symbol, args: Vec<Expr>, span: Span) -> Self {
        Expr::new(
            ExprKind::Call {
                callee: Callee::Method {
                    receiver: Box::new(receiver),
                    name,
                },
                args,
                lambdas: Vec::new(),
            },
            span,
        )
    }

    /// Name of the variable, if this is one.
    pub fn as_var(&self) -> Option<Symbol> {
        match self.kind {
            ExprKind::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Head class of a type expression: `C` for `C` and `C(args)`.
    pub fn head_name(&self) -> Option<Symbol> {
        match &self.kind {
            ExprKind::Var(name) => Some(*name),
            ExprKind::Call {
                callee: Callee::Function(function),
                ..
            } => function.as_var(),
            _ => None,
        }
    }
}

impl Item {
    /// The name this item introduces, before method qualification.
    pub fn declared_name(&self) -> Option<Symbol> {
        match &self.kind {
            ItemKind::Class(class) => Some(class.name),
            ItemKind::Let(decl) => Some(decl.name),
            ItemKind::Fun(decl) => Some(decl.name),
            ItemKind::Infix(_) => None,
        }
    }
}
