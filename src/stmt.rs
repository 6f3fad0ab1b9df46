use std::rc::Rc;

use serde::Serialize;

use crate::expr::{BinOp, Expr, Loc};

/// An assignable location: a bare name in the current scope, an attribute
/// slot on an object, or a container element.
#[derive(Debug, Clone, Serialize)]
pub enum Target {
    Name(String),

    Attribute { object: Expr, name: String },

    Index { object: Expr, index: Expr },
}

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    /// Stand-alone expression evaluated for its side effects.
    Expression { expr: Expr, loc: Loc },

    /// target = value
    Assign {
        target: Target,
        value: Expr,
        loc: Loc,
    },

    /// target += value  (and -=, *=, /=)
    AugAssign {
        target: Target,
        op: BinOp,
        value: Expr,
        loc: Loc,
    },

    /// if/elif/else chain: conditions in source order, body of the first
    /// truthy condition runs; `else_body` runs when all are falsy.
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_body: Option<Vec<Stmt>>,
        loc: Loc,
    },

    /// while loop; the body executes in the same environment as the loop.
    While {
        condition: Expr,
        body: Vec<Stmt>,
        loc: Loc,
    },

    /// def name(params): body — captures the defining environment.
    /// The body is shared with the constructed function object.
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Rc<Vec<Stmt>>,
        loc: Loc,
    },

    /// class name(base): body — the body runs in a scratch scope whose
    /// bindings become the class namespace.
    ClassDef {
        name: String,
        base: Option<Expr>,
        body: Vec<Stmt>,
        loc: Loc,
    },

    /// return inside a function body; absent expression returns None.
    Return { value: Option<Expr>, loc: Loc },
}

impl Stmt {
    pub fn loc(&self) -> &Loc {
        match self {
            Stmt::Expression { loc, .. }
            | Stmt::Assign { loc, .. }
            | Stmt::AugAssign { loc, .. }
            | Stmt::If { loc, .. }
            | Stmt::While { loc, .. }
            | Stmt::FunctionDef { loc, .. }
            | Stmt::ClassDef { loc, .. }
            | Stmt::Return { loc, .. } => loc,
        }
    }
}
