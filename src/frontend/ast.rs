use crate::frontend::lexer::Span;

/// Identifies an AST node for the lifetime of a run. Unique across all units
/// of a package.
pub type NodeId = u32;

/// Id carried by nodes that the rewriter synthesizes.
pub const SYNTHETIC_ID: NodeId = NodeId::MAX;

/// An identifier occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self {
            id: SYNTHETIC_ID,
            name: name.into(),
            span: Span::default(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

/// A parsed source file (one compilation unit).
#[derive(Debug, Clone)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// How an import binds its package in the file scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import "fmt"`
    Default,
    /// `import f "fmt"`
    Alias(String),
    /// `import . "fmt"`
    Dot,
    /// `import _ "fmt"`
    Blank,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub name: ImportName,
    pub path: String,
    pub span: Span,
}

/// Top-level or local declarations.
#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Var(Vec<ValueSpec>),
    Const(Vec<ValueSpec>),
    Type(Vec<TypeSpec>),
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// Receiver for methods: `func (p *T) Name(...)`
    pub recv: Option<Field>,
    pub name: Ident,
    pub sig: FuncType,
    /// Missing for functions implemented outside Go (assembly, linkname).
    pub body: Option<Block>,
    pub span: Span,
}

/// One line of a `var` or `const` declaration.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    /// Position within a const group, the value of `iota`.
    pub iota: i64,
    /// Const spec whose type and values were repeated from the previous spec.
    pub implicit: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    /// `type A = B`
    pub alias: bool,
    pub ty: Expr,
    pub span: Span,
}

/// A parameter, result, receiver, or struct field group.
#[derive(Debug, Clone)]
pub struct Field {
    /// Empty for unnamed parameters and embedded struct fields.
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub tag: Option<String>,
    pub span: Span,
}

/// A function signature as written: `func(a, b int) (int, error)`
#[derive(Debug, Clone)]
pub struct FuncType {
    pub id: NodeId,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub span: Span,
}

/// A block of statements.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method { name: Ident, sig: FuncType },
    /// Embedded interface or type-set term.
    Embedded(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    Xor,
    Addr,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    BitOr,
    BitXor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    AndNot,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Length part of an array type.
#[derive(Debug, Clone)]
pub enum ArrayLen {
    /// `[]T`
    Slice,
    /// `[...]T`
    Ellipsis,
    /// `[N]T`
    Expr(Box<Expr>),
}

/// A call expression.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub id: NodeId,
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    /// The last argument is spread with `...`.
    pub ellipsis: bool,
    /// Set on calls the rewriter routed through a profiling wrapper.
    pub instrumented: bool,
    pub span: Span,
}

impl CallExpr {
    /// Turns `f(args...)` into `wrapper(f, args...)`. The spread flag, the
    /// node id and the span are kept.
    pub fn wrap(&mut self, wrapper: &str) {
        let wrapper = Box::new(Expr::Ident(Ident::synthetic(wrapper)));
        let callee = std::mem::replace(&mut self.callee, wrapper);
        self.args.insert(0, *callee);
        self.instrumented = true;
    }
}

/// Expressions, including type expressions.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Expr {
    Ident(Ident),
    BasicLit {
        id: NodeId,
        kind: LitKind,
        value: String,
        span: Span,
    },
    CompositeLit {
        id: NodeId,
        /// Elided inside another composite literal: `[]Point{{1, 2}}`
        ty: Option<Box<Expr>>,
        elts: Vec<Expr>,
        span: Span,
    },
    FuncLit {
        id: NodeId,
        sig: FuncType,
        body: Block,
        span: Span,
    },
    Paren {
        id: NodeId,
        x: Box<Expr>,
        span: Span,
    },
    Selector {
        id: NodeId,
        x: Box<Expr>,
        sel: Ident,
        span: Span,
    },
    Index {
        id: NodeId,
        x: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Slice {
        id: NodeId,
        x: Box<Expr>,
        lo: Option<Box<Expr>>,
        hi: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
        span: Span,
    },
    /// `x.(T)`, or `x.(type)` in a type switch when `ty` is `None`.
    TypeAssert {
        id: NodeId,
        x: Box<Expr>,
        ty: Option<Box<Expr>>,
        span: Span,
    },
    Call(CallExpr),
    /// Pointer indirection or pointer type: `*x`
    Star {
        id: NodeId,
        x: Box<Expr>,
        span: Span,
    },
    Unary {
        id: NodeId,
        op: UnaryOp,
        x: Box<Expr>,
        span: Span,
    },
    Binary {
        id: NodeId,
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    KeyValue {
        id: NodeId,
        key: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    ArrayType {
        id: NodeId,
        len: ArrayLen,
        elem: Box<Expr>,
        span: Span,
    },
    MapType {
        id: NodeId,
        key: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    ChanType {
        id: NodeId,
        dir: ChanDir,
        elem: Box<Expr>,
        span: Span,
    },
    FuncType(FuncType),
    StructType {
        id: NodeId,
        fields: Vec<Field>,
        span: Span,
    },
    InterfaceType {
        id: NodeId,
        elems: Vec<InterfaceElem>,
        span: Span,
    },
    /// Variadic parameter type: `...T`
    Ellipsis {
        id: NodeId,
        elem: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Ident(ident) => ident.id,
            Expr::Call(call) => call.id,
            Expr::FuncType(sig) => sig.id,
            Expr::BasicLit { id, .. }
            | Expr::CompositeLit { id, .. }
            | Expr::FuncLit { id, .. }
            | Expr::Paren { id, .. }
            | Expr::Selector { id, .. }
            | Expr::Index { id, .. }
            | Expr::Slice { id, .. }
            | Expr::TypeAssert { id, .. }
            | Expr::Star { id, .. }
            | Expr::Unary { id, .. }
            | Expr::Binary { id, .. }
            | Expr::KeyValue { id, .. }
            | Expr::ArrayType { id, .. }
            | Expr::MapType { id, .. }
            | Expr::ChanType { id, .. }
            | Expr::StructType { id, .. }
            | Expr::InterfaceType { id, .. }
            | Expr::Ellipsis { id, .. } => *id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(ident) => ident.span,
            Expr::Call(call) => call.span,
            Expr::FuncType(sig) => sig.span,
            Expr::BasicLit { span, .. }
            | Expr::CompositeLit { span, .. }
            | Expr::FuncLit { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Selector { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. }
            | Expr::TypeAssert { span, .. }
            | Expr::Star { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::KeyValue { span, .. }
            | Expr::ArrayType { span, .. }
            | Expr::MapType { span, .. }
            | Expr::ChanType { span, .. }
            | Expr::StructType { span, .. }
            | Expr::InterfaceType { span, .. }
            | Expr::Ellipsis { span, .. } => *span,
        }
    }

    /// Strips any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        match self {
            Expr::Paren { x, .. } => x.unparen(),
            other => other,
        }
    }

    /// Whether this expression is syntactically a type literal (never a value).
    pub fn is_type_literal(&self) -> bool {
        matches!(
            self,
            Expr::ArrayType { .. }
                | Expr::MapType { .. }
                | Expr::ChanType { .. }
                | Expr::FuncType(_)
                | Expr::StructType { .. }
                | Expr::InterfaceType { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `:=`
    Define,
    /// `+=`, `<<=`, ...
    Compound(BinaryOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

/// A `case`/`default` clause of an expression or type switch.
#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Case expressions (types, in a type switch). Empty for `default`.
    pub exprs: Vec<Expr>,
    pub is_default: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A clause of a `select` statement.
#[derive(Debug, Clone)]
pub struct CommClause {
    /// Send or receive statement; `None` for `default`.
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Statements.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Stmt {
    Expr {
        expr: Expr,
        span: Span,
    },
    Send {
        chan: Expr,
        value: Expr,
        span: Span,
    },
    IncDec {
        x: Expr,
        inc: bool,
        span: Span,
    },
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
        span: Span,
    },
    Go {
        call: Expr,
        span: Span,
    },
    Defer {
        call: Expr,
        span: Span,
    },
    Return {
        results: Vec<Expr>,
        span: Span,
    },
    Branch {
        kind: BranchKind,
        label: Option<Ident>,
        span: Span,
    },
    Block(Block),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then_block: Block,
        /// Either a block or another `if`.
        else_stmt: Option<Box<Stmt>>,
        span: Span,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        clauses: Vec<CaseClause>,
        span: Span,
    },
    TypeSwitch {
        init: Option<Box<Stmt>>,
        /// `v` in `switch v := x.(type)`
        binding: Option<Ident>,
        /// The `x.(type)` expression.
        subject: Expr,
        clauses: Vec<CaseClause>,
        span: Span,
    },
    Select {
        clauses: Vec<CommClause>,
        span: Span,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
        span: Span,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        x: Expr,
        body: Block,
        span: Span,
    },
    Labeled {
        label: Ident,
        stmt: Box<Stmt>,
        span: Span,
    },
    Decl(Decl),
    Empty {
        span: Span,
    },
}
