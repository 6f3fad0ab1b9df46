use serde::Serialize;

/// Source position attached to nodes that can populate a diagnostic
/// frame when an exception unwinds: the 1-based line number plus the raw
/// text of that source line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Loc {
    pub line: usize,
    pub text: String,
}

/// Binary operators dispatched at runtime on the kinds of both operands.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Eq,
    And,
    Or,
}

impl BinOp {
    /// The source-level spelling, used in error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Eq => "==",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    // Integer literal
    Int(i64),

    // String literal (escapes already decoded by the scanner)
    Str(String),

    // Name lookup in the enclosing environment chain
    Identifier { name: String, line: usize },

    // [e1, e2, ...]
    List(Vec<Expr>),

    // {k1: v1, k2: v2, ...}
    Dict(Vec<(Expr, Expr)>),

    // left <op> right
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        line: usize,
    },

    // 'not' operand — the only unary operator in the tree
    Not { operand: Box<Expr>, line: usize },

    // callee(arg1, arg2, ...)
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        loc: Loc,
    },

    // object.name
    AttributeGet {
        object: Box<Expr>,
        name: String,
        line: usize,
    },

    // object[index]
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        line: usize,
    },
}
