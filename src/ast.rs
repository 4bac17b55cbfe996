/// A whole source text: constant declarations and top-level values in source order.
#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub items: Vec<Item>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Item {
    Constant(ConstantDecl),
    Value(Expr),
}

/// `name <- value;`
#[derive(Debug, PartialEq, Clone)]
pub struct ConstantDecl {
    pub name: String,
    pub value: Expr,
    pub pos_start: usize,
    pub pos_end: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, pos_start: usize, pos_end: usize) -> Self {
        Self {
            kind,
            pos_start,
            pos_end,
        }
    }

    /// (offset, length) pair, ready to be turned into a `SourceSpan`.
    #[must_use]
    pub fn span(&self) -> (usize, usize) {
        (self.pos_start, self.pos_end - self.pos_start)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExprKind {
    Number(i64),
    /// Raw literal, still wrapped in `@"` and `"`.
    String(String),
    Name(String),
    Array(Vec<Expr>),
    Dict(Vec<Assignment>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Len(Box<Expr>),
}

/// `key := value` inside a dict block.
#[derive(Debug, PartialEq, Clone)]
pub struct Assignment {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}
