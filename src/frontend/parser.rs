use crate::frontend::ast::*;
use crate::frontend::lexer::{Span, Token, TokenKind, unquote};

/// What a simple statement turned out to be. A range clause is only legal
/// as the header of a `for` statement.
enum Simple {
    Stmt(Stmt),
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        x: Expr,
        span: Span,
    },
}

/// A recursive descent parser for Go source files.
pub struct Parser<'a> {
    filename: &'a str,
    tokens: Vec<Token>,
    current: usize,
    next_node: NodeId,
    /// Negative while parsing a control clause header, where `T {` opens the
    /// statement body rather than a composite literal.
    expr_lev: i32,
}

impl<'a> Parser<'a> {
    /// Creates a parser whose node ids start at `base_id`.
    pub fn new(filename: &'a str, tokens: Vec<Token>, base_id: NodeId) -> Self {
        Self {
            filename,
            tokens,
            current: 0,
            next_node: base_id,
            expr_lev: 0,
        }
    }

    /// The first node id not handed out by this parser.
    pub fn next_node_id(&self) -> NodeId {
        self.next_node
    }

    pub fn parse_file(&mut self) -> Result<File, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Package)?;
        let package = self.expect_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.match_token(&TokenKind::Import) {
            if self.match_token(&TokenKind::LParen) {
                while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                    imports.push(self.import_spec()?);
                    self.expect_semi()?;
                }
                self.expect(&TokenKind::RParen)?;
            } else {
                imports.push(self.import_spec()?);
            }
            self.expect_semi()?;
        }

        let mut decls = Vec::new();
        while !self.is_at_end() {
            decls.push(self.top_decl()?);
            self.expect_semi()?;
        }

        Ok(File {
            package,
            imports,
            decls,
            span: span.to(self.previous_span()),
        })
    }

    /// Parses a source consisting of a single type expression.
    pub fn parse_standalone_type(&mut self) -> Result<Expr, String> {
        let ty = self.parse_type()?;
        self.match_token(&TokenKind::Semi);
        if !self.is_at_end() {
            return Err(self.error("unexpected token after type"));
        }
        Ok(ty)
    }

    fn import_spec(&mut self) -> Result<ImportSpec, String> {
        let span = self.current_span();
        let name = match self.peek_kind() {
            Some(TokenKind::Ident(n)) => {
                let name = if n == "_" {
                    ImportName::Blank
                } else {
                    ImportName::Alias(n.clone())
                };
                self.advance();
                name
            }
            Some(TokenKind::Dot) => {
                self.advance();
                ImportName::Dot
            }
            _ => ImportName::Default,
        };
        let path = match self.peek_kind() {
            Some(TokenKind::Str(raw)) => {
                let raw = raw.clone();
                unquote(&raw).ok_or_else(|| self.error("invalid import path"))?
            }
            _ => return Err(self.error("expected import path")),
        };
        self.advance();
        Ok(ImportSpec {
            name,
            path,
            span: span.to(self.previous_span()),
        })
    }

    fn top_decl(&mut self) -> Result<Decl, String> {
        match self.peek_kind() {
            Some(TokenKind::Func) => Ok(Decl::Func(self.func_decl()?)),
            Some(TokenKind::Var) | Some(TokenKind::Const) | Some(TokenKind::Type) => {
                self.gen_decl()
            }
            Some(TokenKind::Import) => Err(self.error("imports must appear before other declarations")),
            _ => Err(self.error("expected declaration")),
        }
    }

    fn func_decl(&mut self) -> Result<FuncDecl, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Func)?;

        let recv = if self.check(&TokenKind::LParen) {
            let mut fields = self.parameters()?;
            if fields.len() != 1 || fields[0].names.len() > 1 {
                return Err(self.error("method has multiple receivers"));
            }
            fields.pop()
        } else {
            None
        };

        let name = self.expect_ident()?;
        if self.check(&TokenKind::LBracket) {
            return Err(self.error("type parameters are not supported"));
        }
        let sig = self.signature(name.span)?;

        let body = if self.check(&TokenKind::LBrace) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(FuncDecl {
            recv,
            name,
            sig,
            body,
            span: span.to(self.previous_span()),
        })
    }

    /// `var`, `const` or `type` declaration, single or grouped.
    fn gen_decl(&mut self) -> Result<Decl, String> {
        let keyword = self.peek_kind().cloned();
        self.advance();

        let grouped = self.match_token(&TokenKind::LParen);
        let mut values = Vec::new();
        let mut types = Vec::new();
        let mut previous: Option<(Option<Expr>, Vec<Expr>)> = None;
        let mut iota = 0;

        loop {
            if grouped && (self.check(&TokenKind::RParen) || self.is_at_end()) {
                break;
            }
            match keyword {
                Some(TokenKind::Type) => types.push(self.type_spec()?),
                Some(TokenKind::Const) => {
                    values.push(self.value_spec(true, iota, &mut previous)?);
                    iota += 1;
                }
                _ => values.push(self.value_spec(false, 0, &mut previous)?),
            }
            if !grouped {
                break;
            }
            self.expect_semi()?;
        }
        if grouped {
            self.expect(&TokenKind::RParen)?;
        }

        Ok(match keyword {
            Some(TokenKind::Type) => Decl::Type(types),
            Some(TokenKind::Const) => Decl::Const(values),
            _ => Decl::Var(values),
        })
    }

    fn value_spec(
        &mut self,
        is_const: bool,
        iota: i64,
        previous: &mut Option<(Option<Expr>, Vec<Expr>)>,
    ) -> Result<ValueSpec, String> {
        let span = self.current_span();
        let names = self.ident_list()?;

        let mut ty = if !self.check(&TokenKind::Eq)
            && !self.check(&TokenKind::Semi)
            && !self.check(&TokenKind::RParen)
        {
            Some(self.parse_type()?)
        } else {
            None
        };
        let mut values = if self.match_token(&TokenKind::Eq) {
            self.expr_list()?
        } else {
            Vec::new()
        };

        let mut implicit = false;
        if is_const {
            if ty.is_none() && values.is_empty() {
                let Some((prev_ty, prev_values)) = previous.clone() else {
                    return Err(self.error("missing init expr for const declaration"));
                };
                ty = prev_ty;
                values = prev_values;
                implicit = true;
            } else {
                *previous = Some((ty.clone(), values.clone()));
            }
        }

        Ok(ValueSpec {
            names,
            ty,
            values,
            iota,
            implicit,
            span: span.to(self.previous_span()),
        })
    }

    fn type_spec(&mut self) -> Result<TypeSpec, String> {
        let span = self.current_span();
        let name = self.expect_ident()?;
        if self.check(&TokenKind::LBracket) && self.looks_like_type_params() {
            return Err(self.error("type parameters are not supported"));
        }
        let alias = self.match_token(&TokenKind::Eq);
        let ty = self.parse_type()?;
        Ok(TypeSpec {
            name,
            alias,
            ty,
            span: span.to(self.previous_span()),
        })
    }

    /// Distinguishes `type T[P any] ...` from the array type `type T [N]E`.
    fn looks_like_type_params(&self) -> bool {
        matches!(self.peek_ahead(1), Some(TokenKind::Ident(_)))
            && matches!(
                self.peek_ahead(2),
                Some(TokenKind::Ident(_))
                    | Some(TokenKind::Comma)
                    | Some(TokenKind::Interface)
                    | Some(TokenKind::Tilde)
                    | Some(TokenKind::LBracket)
            )
    }

    // Types

    fn parse_type(&mut self) -> Result<Expr, String> {
        let span = self.current_span();
        match self.peek_kind().cloned() {
            Some(TokenKind::Ident(_)) => {
                let ident = self.expect_ident()?;
                if self.match_token(&TokenKind::Dot) {
                    let sel = self.expect_ident()?;
                    Ok(Expr::Selector {
                        id: self.next_id(),
                        x: Box::new(Expr::Ident(ident)),
                        sel,
                        span: span.to(self.previous_span()),
                    })
                } else {
                    Ok(Expr::Ident(ident))
                }
            }
            Some(TokenKind::Star) => {
                self.advance();
                let x = self.parse_type()?;
                Ok(Expr::Star {
                    id: self.next_id(),
                    x: Box::new(x),
                    span: span.to(self.previous_span()),
                })
            }
            Some(TokenKind::LBracket) => {
                self.advance();
                let len = if self.match_token(&TokenKind::RBracket) {
                    ArrayLen::Slice
                } else if self.match_token(&TokenKind::Ellipsis) {
                    self.expect(&TokenKind::RBracket)?;
                    ArrayLen::Ellipsis
                } else {
                    self.expr_lev += 1;
                    let len = self.parse_expr()?;
                    self.expr_lev -= 1;
                    self.expect(&TokenKind::RBracket)?;
                    ArrayLen::Expr(Box::new(len))
                };
                let elem = self.parse_type()?;
                Ok(Expr::ArrayType {
                    id: self.next_id(),
                    len,
                    elem: Box::new(elem),
                    span: span.to(self.previous_span()),
                })
            }
            Some(TokenKind::Map) => {
                self.advance();
                self.expect(&TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                let value = self.parse_type()?;
                Ok(Expr::MapType {
                    id: self.next_id(),
                    key: Box::new(key),
                    value: Box::new(value),
                    span: span.to(self.previous_span()),
                })
            }
            Some(TokenKind::Chan) => {
                self.advance();
                let dir = if self.match_token(&TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Ok(Expr::ChanType {
                    id: self.next_id(),
                    dir,
                    elem: Box::new(elem),
                    span: span.to(self.previous_span()),
                })
            }
            Some(TokenKind::Arrow) => {
                self.advance();
                self.expect(&TokenKind::Chan)?;
                let elem = self.parse_type()?;
                Ok(Expr::ChanType {
                    id: self.next_id(),
                    dir: ChanDir::Recv,
                    elem: Box::new(elem),
                    span: span.to(self.previous_span()),
                })
            }
            Some(TokenKind::Func) => {
                self.advance();
                Ok(Expr::FuncType(self.signature(span)?))
            }
            Some(TokenKind::Struct) => self.struct_type(),
            Some(TokenKind::Interface) => self.interface_type(),
            Some(TokenKind::LParen) => {
                self.advance();
                let x = self.parse_type()?;
                self.expect(&TokenKind::RParen)?;
                Ok(Expr::Paren {
                    id: self.next_id(),
                    x: Box::new(x),
                    span: span.to(self.previous_span()),
                })
            }
            _ => Err(self.error("expected type")),
        }
    }

    fn can_start_type(&self) -> bool {
        match self.peek_kind() {
            Some(TokenKind::Ident(_))
            | Some(TokenKind::Star)
            | Some(TokenKind::LBracket)
            | Some(TokenKind::Map)
            | Some(TokenKind::Chan)
            | Some(TokenKind::Func)
            | Some(TokenKind::Struct)
            | Some(TokenKind::Interface) => true,
            Some(TokenKind::Arrow) => self.check_ahead(&TokenKind::Chan, 1),
            _ => false,
        }
    }

    /// Parameters and results following `func` or a function name.
    fn signature(&mut self, span: Span) -> Result<FuncType, String> {
        let params = self.parameters()?;
        let results = if self.check(&TokenKind::LParen) {
            self.parameters()?
        } else if self.can_start_type() {
            let ty_span = self.current_span();
            let ty = self.parse_type()?;
            vec![Field {
                names: Vec::new(),
                ty,
                tag: None,
                span: ty_span.to(self.previous_span()),
            }]
        } else {
            Vec::new()
        };
        Ok(FuncType {
            id: self.next_id(),
            params,
            results,
            span: span.to(self.previous_span()),
        })
    }

    /// A parenthesized parameter list. Entries are either all types or all
    /// `names type` groups, where a name list shares the type that follows.
    fn parameters(&mut self) -> Result<Vec<Field>, String> {
        self.expect(&TokenKind::LParen)?;

        let mut entries: Vec<(Option<Ident>, Expr, Span)> = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            let span = self.current_span();
            let first = self.param_type()?;
            if self.check(&TokenKind::Comma) || self.check(&TokenKind::RParen) {
                entries.push((None, first, span.to(self.previous_span())));
            } else {
                let Expr::Ident(name) = first else {
                    return Err(self.error("expected ',' or ')' in parameter list"));
                };
                let ty = self.param_type()?;
                entries.push((Some(name), ty, span.to(self.previous_span())));
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;

        let named = entries.iter().any(|(name, _, _)| name.is_some());
        if !named {
            return Ok(entries
                .into_iter()
                .map(|(_, ty, span)| Field {
                    names: Vec::new(),
                    ty,
                    tag: None,
                    span,
                })
                .collect());
        }

        let mut fields = Vec::new();
        let mut pending: Vec<(Ident, Span)> = Vec::new();
        for (name, ty, span) in entries {
            match name {
                Some(name) => {
                    let start = pending.first().map(|(_, s)| *s).unwrap_or(span);
                    let mut names: Vec<Ident> = pending.drain(..).map(|(n, _)| n).collect();
                    names.push(name);
                    fields.push(Field {
                        names,
                        ty,
                        tag: None,
                        span: start.to(span),
                    });
                }
                None => match ty {
                    Expr::Ident(ident) => pending.push((ident, span)),
                    _ => return Err(self.error("mixed named and unnamed parameters")),
                },
            }
        }
        if !pending.is_empty() {
            return Err(self.error("mixed named and unnamed parameters"));
        }
        Ok(fields)
    }

    fn param_type(&mut self) -> Result<Expr, String> {
        let span = self.current_span();
        if self.match_token(&TokenKind::Ellipsis) {
            let elem = self.parse_type()?;
            return Ok(Expr::Ellipsis {
                id: self.next_id(),
                elem: Box::new(elem),
                span: span.to(self.previous_span()),
            });
        }
        self.parse_type()
    }

    fn struct_type(&mut self) -> Result<Expr, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Struct)?;
        self.expect(&TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let field_span = self.current_span();
            let (names, ty) = if self.check(&TokenKind::Star) {
                (Vec::new(), self.parse_type()?)
            } else {
                let first = self.expect_ident()?;
                if self.check(&TokenKind::Dot) {
                    self.advance();
                    let sel = self.expect_ident()?;
                    let ty = Expr::Selector {
                        id: self.next_id(),
                        x: Box::new(Expr::Ident(first)),
                        sel,
                        span: field_span.to(self.previous_span()),
                    };
                    (Vec::new(), ty)
                } else if matches!(
                    self.peek_kind(),
                    Some(TokenKind::Semi) | Some(TokenKind::RBrace) | Some(TokenKind::Str(_))
                ) {
                    (Vec::new(), Expr::Ident(first))
                } else {
                    let mut names = vec![first];
                    while self.match_token(&TokenKind::Comma) {
                        names.push(self.expect_ident()?);
                    }
                    (names, self.parse_type()?)
                }
            };
            let tag = match self.peek_kind() {
                Some(TokenKind::Str(raw)) => {
                    let raw = raw.clone();
                    self.advance();
                    Some(raw)
                }
                _ => None,
            };
            fields.push(Field {
                names,
                ty,
                tag,
                span: field_span.to(self.previous_span()),
            });
            self.expect_semi()?;
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(Expr::StructType {
            id: self.next_id(),
            fields,
            span: span.to(self.previous_span()),
        })
    }

    fn interface_type(&mut self) -> Result<Expr, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Interface)?;
        self.expect(&TokenKind::LBrace)?;

        let mut elems = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.check(&TokenKind::Tilde) {
                return Err(self.error("type constraints are not supported"));
            }
            if self.check_ident() && self.check_ahead(&TokenKind::LParen, 1) {
                let name = self.expect_ident()?;
                let sig = self.signature(name.span)?;
                elems.push(InterfaceElem::Method { name, sig });
            } else {
                elems.push(InterfaceElem::Embedded(self.parse_type()?));
                if self.check(&TokenKind::Pipe) {
                    return Err(self.error("type constraints are not supported"));
                }
            }
            self.expect_semi()?;
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(Expr::InterfaceType {
            id: self.next_id(),
            elems,
            span: span.to(self.previous_span()),
        })
    }

    // Statements

    fn block(&mut self) -> Result<Block, String> {
        let span = self.current_span();
        self.expect(&TokenKind::LBrace)?;
        let saved = self.expr_lev;
        self.expr_lev = 0;
        let stmts = self.stmt_list()?;
        self.expr_lev = saved;
        self.expect(&TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: span.to(self.previous_span()),
        })
    }

    fn stmt_list(&mut self) -> Result<Vec<Stmt>, String> {
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::RBrace)
                | Some(TokenKind::Case)
                | Some(TokenKind::Default)
                | Some(TokenKind::Eof)
                | None => break,
                Some(TokenKind::Semi) => {
                    self.advance();
                }
                _ => {
                    stmts.push(self.statement()?);
                    self.expect_semi()?;
                }
            }
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt, String> {
        let span = self.current_span();
        match self.peek_kind() {
            Some(TokenKind::Var) | Some(TokenKind::Const) | Some(TokenKind::Type) => {
                Ok(Stmt::Decl(self.gen_decl()?))
            }
            Some(TokenKind::LBrace) => Ok(Stmt::Block(self.block()?)),
            Some(TokenKind::If) => self.if_stmt(),
            Some(TokenKind::For) => self.for_stmt(),
            Some(TokenKind::Switch) => self.switch_stmt(),
            Some(TokenKind::Select) => self.select_stmt(),
            Some(TokenKind::Return) => {
                self.advance();
                let results = if self.check(&TokenKind::Semi) || self.check(&TokenKind::RBrace) {
                    Vec::new()
                } else {
                    self.expr_list()?
                };
                Ok(Stmt::Return {
                    results,
                    span: span.to(self.previous_span()),
                })
            }
            Some(TokenKind::Go) | Some(TokenKind::Defer) => {
                let is_go = self.check(&TokenKind::Go);
                self.advance();
                let call = self.parse_expr()?;
                if !matches!(call.unparen(), Expr::Call(_)) {
                    return Err(self.error("expression in go or defer must be function call"));
                }
                let span = span.to(self.previous_span());
                Ok(if is_go {
                    Stmt::Go { call, span }
                } else {
                    Stmt::Defer { call, span }
                })
            }
            Some(TokenKind::Break)
            | Some(TokenKind::Continue)
            | Some(TokenKind::Goto)
            | Some(TokenKind::Fallthrough) => {
                let kind = match self.peek_kind() {
                    Some(TokenKind::Break) => BranchKind::Break,
                    Some(TokenKind::Continue) => BranchKind::Continue,
                    Some(TokenKind::Goto) => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                self.advance();
                let label = if kind != BranchKind::Fallthrough && self.check_ident() {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                Ok(Stmt::Branch {
                    kind,
                    label,
                    span: span.to(self.previous_span()),
                })
            }
            _ => match self.simple_stmt(false, true)? {
                Simple::Stmt(stmt) => Ok(stmt),
                Simple::Range { .. } => Err(self.error("unexpected range clause")),
            },
        }
    }

    fn simple_stmt(&mut self, allow_range: bool, allow_label: bool) -> Result<Simple, String> {
        let span = self.current_span();

        if allow_range && self.match_token(&TokenKind::Range) {
            let x = self.parse_expr()?;
            return Ok(Simple::Range {
                key: None,
                value: None,
                define: false,
                x,
                span: span.to(self.previous_span()),
            });
        }

        let mut lhs = self.expr_list()?;

        if let Some(op) = self.peek_kind().and_then(assign_op) {
            self.advance();
            let plain = matches!(op, AssignOp::Assign | AssignOp::Define);
            if allow_range && plain && self.match_token(&TokenKind::Range) {
                if lhs.len() > 2 {
                    return Err(self.error("range clause permits at most two iteration variables"));
                }
                let x = self.parse_expr()?;
                let mut vars = lhs.into_iter();
                return Ok(Simple::Range {
                    key: vars.next(),
                    value: vars.next(),
                    define: op == AssignOp::Define,
                    x,
                    span: span.to(self.previous_span()),
                });
            }
            let rhs = self.expr_list()?;
            return Ok(Simple::Stmt(Stmt::Assign {
                lhs,
                op,
                rhs,
                span: span.to(self.previous_span()),
            }));
        }

        if lhs.len() > 1 {
            return Err(self.error("expected assignment after expression list"));
        }
        let Some(x) = lhs.pop() else {
            return Err(self.error("expected expression"));
        };

        match self.peek_kind() {
            Some(TokenKind::Colon) if allow_label && matches!(x, Expr::Ident(_)) => {
                self.advance();
                let Expr::Ident(label) = x else {
                    return Err(self.error("expected label"));
                };
                let stmt = if self.check(&TokenKind::RBrace) {
                    Stmt::Empty {
                        span: self.current_span(),
                    }
                } else {
                    self.statement()?
                };
                Ok(Simple::Stmt(Stmt::Labeled {
                    label,
                    stmt: Box::new(stmt),
                    span: span.to(self.previous_span()),
                }))
            }
            Some(TokenKind::Arrow) => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(Simple::Stmt(Stmt::Send {
                    chan: x,
                    value,
                    span: span.to(self.previous_span()),
                }))
            }
            Some(TokenKind::Inc) | Some(TokenKind::Dec) => {
                let inc = self.check(&TokenKind::Inc);
                self.advance();
                Ok(Simple::Stmt(Stmt::IncDec {
                    x,
                    inc,
                    span: span.to(self.previous_span()),
                }))
            }
            _ => Ok(Simple::Stmt(Stmt::Expr {
                expr: x,
                span: span.to(self.previous_span()),
            })),
        }
    }

    fn if_stmt(&mut self) -> Result<Stmt, String> {
        let span = self.current_span();
        self.expect(&TokenKind::If)?;

        let saved = self.expr_lev;
        self.expr_lev = -1;
        let mut init = None;
        let cond_stmt = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.plain_simple_stmt()?)
        };
        let cond_stmt = if self.match_token(&TokenKind::Semi) {
            init = cond_stmt.map(Box::new);
            if self.check(&TokenKind::LBrace) {
                return Err(self.error("missing condition in if statement"));
            }
            self.plain_simple_stmt()?
        } else {
            match cond_stmt {
                Some(stmt) => stmt,
                None => return Err(self.error("missing condition in if statement")),
            }
        };
        let Stmt::Expr { expr: cond, .. } = cond_stmt else {
            return Err(self.error("expected boolean expression as if condition"));
        };
        self.expr_lev = saved;

        let then_block = self.block()?;
        let else_stmt = if self.match_token(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(Box::new(self.if_stmt()?))
            } else if self.check(&TokenKind::LBrace) {
                Some(Box::new(Stmt::Block(self.block()?)))
            } else {
                return Err(self.error("expected if statement or block after else"));
            }
        } else {
            None
        };

        Ok(Stmt::If {
            init,
            cond,
            then_block,
            else_stmt,
            span: span.to(self.previous_span()),
        })
    }

    fn for_stmt(&mut self) -> Result<Stmt, String> {
        let span = self.current_span();
        self.expect(&TokenKind::For)?;

        let saved = self.expr_lev;
        self.expr_lev = -1;

        let mut init = None;
        let mut cond = None;
        let mut post = None;
        if !self.check(&TokenKind::LBrace) {
            let first = if self.check(&TokenKind::Semi) {
                None
            } else {
                Some(self.simple_stmt(true, false)?)
            };
            let first = match first {
                Some(Simple::Range {
                    key,
                    value,
                    define,
                    x,
                    ..
                }) => {
                    self.expr_lev = saved;
                    let body = self.block()?;
                    return Ok(Stmt::Range {
                        key,
                        value,
                        define,
                        x,
                        body,
                        span: span.to(self.previous_span()),
                    });
                }
                Some(Simple::Stmt(stmt)) => Some(stmt),
                None => None,
            };

            if self.match_token(&TokenKind::Semi) {
                init = first.map(Box::new);
                if !self.check(&TokenKind::Semi) {
                    cond = Some(self.parse_expr()?);
                }
                self.expect(&TokenKind::Semi)?;
                if !self.check(&TokenKind::LBrace) {
                    post = Some(Box::new(self.plain_simple_stmt()?));
                }
            } else {
                match first {
                    Some(Stmt::Expr { expr, .. }) => cond = Some(expr),
                    _ => return Err(self.error("expected for loop condition")),
                }
            }
        }
        self.expr_lev = saved;

        let body = self.block()?;
        Ok(Stmt::For {
            init,
            cond,
            post,
            body,
            span: span.to(self.previous_span()),
        })
    }

    fn switch_stmt(&mut self) -> Result<Stmt, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Switch)?;

        let saved = self.expr_lev;
        self.expr_lev = -1;
        let mut init = None;
        let mut header = None;
        if !self.check(&TokenKind::LBrace) {
            let first = if self.check(&TokenKind::Semi) {
                None
            } else {
                Some(self.plain_simple_stmt()?)
            };
            if self.match_token(&TokenKind::Semi) {
                init = first.map(Box::new);
                if !self.check(&TokenKind::LBrace) {
                    header = Some(self.plain_simple_stmt()?);
                }
            } else {
                header = first;
            }
        }
        self.expr_lev = saved;

        // `switch x.(type)` or `switch v := x.(type)`
        let type_switch = match header.take() {
            Some(Stmt::Expr { expr, .. }) if is_type_switch_guard(&expr) => Some((None, expr)),
            Some(Stmt::Assign {
                mut lhs,
                op: AssignOp::Define,
                mut rhs,
                span: assign_span,
            }) if lhs.len() == 1 && rhs.len() == 1 && is_type_switch_guard(&rhs[0]) => {
                match (lhs.pop(), rhs.pop()) {
                    (Some(Expr::Ident(binding)), Some(subject)) => Some((Some(binding), subject)),
                    _ => {
                        return Err(format!(
                            "error: invalid variable in type switch\n  --> {}:{}:{}",
                            self.filename, assign_span.line, assign_span.column
                        ));
                    }
                }
            }
            other => {
                header = other;
                None
            }
        };

        self.expect(&TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            clauses.push(self.case_clause(type_switch.is_some())?);
        }
        self.expect(&TokenKind::RBrace)?;
        let span = span.to(self.previous_span());

        if let Some((binding, subject)) = type_switch {
            return Ok(Stmt::TypeSwitch {
                init,
                binding,
                subject,
                clauses,
                span,
            });
        }
        let tag = match header {
            Some(Stmt::Expr { expr, .. }) => Some(expr),
            None => None,
            Some(_) => return Err(self.error("switch expression must be an expression")),
        };
        Ok(Stmt::Switch {
            init,
            tag,
            clauses,
            span,
        })
    }

    fn case_clause(&mut self, type_switch: bool) -> Result<CaseClause, String> {
        let span = self.current_span();
        let (exprs, is_default) = if self.match_token(&TokenKind::Default) {
            (Vec::new(), true)
        } else {
            self.expect(&TokenKind::Case)?;
            let exprs = if type_switch {
                let mut types = vec![self.parse_type()?];
                while self.match_token(&TokenKind::Comma) {
                    types.push(self.parse_type()?);
                }
                types
            } else {
                self.expr_list()?
            };
            (exprs, false)
        };
        self.expect(&TokenKind::Colon)?;
        let body = self.stmt_list()?;
        Ok(CaseClause {
            exprs,
            is_default,
            body,
            span: span.to(self.previous_span()),
        })
    }

    fn select_stmt(&mut self) -> Result<Stmt, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Select)?;
        self.expect(&TokenKind::LBrace)?;

        let mut clauses = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let clause_span = self.current_span();
            let comm = if self.match_token(&TokenKind::Default) {
                None
            } else {
                self.expect(&TokenKind::Case)?;
                Some(Box::new(self.plain_simple_stmt()?))
            };
            self.expect(&TokenKind::Colon)?;
            let body = self.stmt_list()?;
            clauses.push(CommClause {
                comm,
                body,
                span: clause_span.to(self.previous_span()),
            });
        }
        self.expect(&TokenKind::RBrace)?;

        Ok(Stmt::Select {
            clauses,
            span: span.to(self.previous_span()),
        })
    }

    /// A simple statement where neither a range clause nor a label may occur.
    fn plain_simple_stmt(&mut self) -> Result<Stmt, String> {
        match self.simple_stmt(false, false)? {
            Simple::Stmt(stmt) => Ok(stmt),
            Simple::Range { .. } => Err(self.error("unexpected range clause")),
        }
    }

    // Expressions

    fn expr_list(&mut self) -> Result<Vec<Expr>, String> {
        let mut exprs = vec![self.parse_expr()?];
        while self.match_token(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn ident_list(&mut self) -> Result<Vec<Ident>, String> {
        let mut idents = vec![self.expect_ident()?];
        while self.match_token(&TokenKind::Comma) {
            idents.push(self.expect_ident()?);
        }
        Ok(idents)
    }

    pub fn parse_expr(&mut self) -> Result<Expr, String> {
        self.binary_expr(1)
    }

    fn binary_expr(&mut self, min_prec: u8) -> Result<Expr, String> {
        let span = self.current_span();
        let mut left = self.unary_expr()?;
        loop {
            let Some((op, prec)) = self.peek_kind().and_then(binary_op) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.binary_expr(prec + 1)?;
            left = Expr::Binary {
                id: self.next_id(),
                op,
                left: Box::new(left),
                right: Box::new(right),
                span: span.to(self.previous_span()),
            };
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> Result<Expr, String> {
        let span = self.current_span();
        let op = match self.peek_kind() {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Caret) => UnaryOp::Xor,
            Some(TokenKind::Amp) => UnaryOp::Addr,
            Some(TokenKind::Arrow) => {
                if self.check_ahead(&TokenKind::Chan, 1) {
                    let ty = self.parse_type()?;
                    return self.primary_suffixes(ty, span);
                }
                UnaryOp::Recv
            }
            Some(TokenKind::Star) => {
                self.advance();
                let x = self.unary_expr()?;
                return Ok(Expr::Star {
                    id: self.next_id(),
                    x: Box::new(x),
                    span: span.to(self.previous_span()),
                });
            }
            _ => return self.primary_expr(),
        };
        self.advance();
        let x = self.unary_expr()?;
        Ok(Expr::Unary {
            id: self.next_id(),
            op,
            x: Box::new(x),
            span: span.to(self.previous_span()),
        })
    }

    fn primary_expr(&mut self) -> Result<Expr, String> {
        let span = self.current_span();
        let operand = self.operand()?;
        self.primary_suffixes(operand, span)
    }

    fn operand(&mut self) -> Result<Expr, String> {
        let span = self.current_span();
        let lit = match self.peek_kind() {
            Some(TokenKind::Int(v)) => Some((LitKind::Int, v.clone())),
            Some(TokenKind::Float(v)) => Some((LitKind::Float, v.clone())),
            Some(TokenKind::Imag(v)) => Some((LitKind::Imag, v.clone())),
            Some(TokenKind::Char(v)) => Some((LitKind::Char, v.clone())),
            Some(TokenKind::Str(v)) => Some((LitKind::String, v.clone())),
            _ => None,
        };
        if let Some((kind, value)) = lit {
            self.advance();
            return Ok(Expr::BasicLit {
                id: self.next_id(),
                kind,
                value,
                span,
            });
        }

        match self.peek_kind() {
            Some(TokenKind::Ident(_)) => Ok(Expr::Ident(self.expect_ident()?)),
            Some(TokenKind::LParen) => {
                self.advance();
                self.expr_lev += 1;
                let x = if self.check(&TokenKind::Arrow) && self.check_ahead(&TokenKind::Chan, 1) {
                    self.parse_type()?
                } else {
                    self.parse_expr()?
                };
                self.expr_lev -= 1;
                self.expect(&TokenKind::RParen)?;
                Ok(Expr::Paren {
                    id: self.next_id(),
                    x: Box::new(x),
                    span: span.to(self.previous_span()),
                })
            }
            Some(TokenKind::Func) => {
                self.advance();
                let sig = self.signature(span)?;
                if self.check(&TokenKind::LBrace) {
                    let saved = self.expr_lev;
                    self.expr_lev = 0;
                    let body = self.block()?;
                    self.expr_lev = saved;
                    Ok(Expr::FuncLit {
                        id: self.next_id(),
                        sig,
                        body,
                        span: span.to(self.previous_span()),
                    })
                } else {
                    Ok(Expr::FuncType(sig))
                }
            }
            Some(TokenKind::LBracket)
            | Some(TokenKind::Map)
            | Some(TokenKind::Chan)
            | Some(TokenKind::Struct)
            | Some(TokenKind::Interface) => self.parse_type(),
            _ => Err(self.error("expected expression")),
        }
    }

    fn primary_suffixes(&mut self, mut x: Expr, span: Span) -> Result<Expr, String> {
        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.advance();
                    if self.match_token(&TokenKind::LParen) {
                        let ty = if self.match_token(&TokenKind::Type) {
                            None
                        } else {
                            Some(Box::new(self.parse_type()?))
                        };
                        self.expect(&TokenKind::RParen)?;
                        x = Expr::TypeAssert {
                            id: self.next_id(),
                            x: Box::new(x),
                            ty,
                            span: span.to(self.previous_span()),
                        };
                    } else {
                        let sel = self.expect_ident()?;
                        x = Expr::Selector {
                            id: self.next_id(),
                            x: Box::new(x),
                            sel,
                            span: span.to(self.previous_span()),
                        };
                    }
                }
                Some(TokenKind::LBracket) => {
                    self.advance();
                    x = self.index_or_slice(x, span)?;
                }
                Some(TokenKind::LParen) => {
                    self.advance();
                    x = self.call(x, span)?;
                }
                Some(TokenKind::LBrace)
                    if is_literal_type(&x) && (self.expr_lev >= 0 || !is_type_name(&x)) =>
                {
                    x = self.composite_lit(Some(x), span)?;
                }
                _ => return Ok(x),
            }
        }
    }

    fn index_or_slice(&mut self, x: Expr, span: Span) -> Result<Expr, String> {
        self.expr_lev += 1;
        let lo = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        let result = if self.match_token(&TokenKind::Colon) {
            let hi = if self.check(&TokenKind::Colon) || self.check(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expr()?))
            };
            let max = if self.match_token(&TokenKind::Colon) {
                if hi.is_none() {
                    return Err(self.error("middle index required in 3-index slice"));
                }
                Some(Box::new(self.parse_expr()?))
            } else {
                None
            };
            self.expect(&TokenKind::RBracket)?;
            Expr::Slice {
                id: self.next_id(),
                x: Box::new(x),
                lo,
                hi,
                max,
                span: span.to(self.previous_span()),
            }
        } else {
            self.expect(&TokenKind::RBracket)?;
            let Some(index) = lo else {
                return Err(self.error("expected operand"));
            };
            Expr::Index {
                id: self.next_id(),
                x: Box::new(x),
                index,
                span: span.to(self.previous_span()),
            }
        };
        self.expr_lev -= 1;
        Ok(result)
    }

    fn call(&mut self, callee: Expr, span: Span) -> Result<Expr, String> {
        self.expr_lev += 1;
        let mut args = Vec::new();
        let mut ellipsis = false;
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            // `make([]int, n)` and `new(T)` take types as arguments
            let arg = if self.check(&TokenKind::Arrow) && self.check_ahead(&TokenKind::Chan, 1) {
                self.parse_type()?
            } else {
                self.parse_expr()?
            };
            args.push(arg);
            if self.match_token(&TokenKind::Ellipsis) {
                ellipsis = true;
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expr_lev -= 1;
        self.expect(&TokenKind::RParen)?;

        Ok(Expr::Call(CallExpr {
            id: self.next_id(),
            callee: Box::new(callee),
            args,
            ellipsis,
            instrumented: false,
            span: span.to(self.previous_span()),
        }))
    }

    fn composite_lit(&mut self, ty: Option<Expr>, span: Span) -> Result<Expr, String> {
        self.expect(&TokenKind::LBrace)?;
        self.expr_lev += 1;
        let mut elts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let elt_span = self.current_span();
            let key = self.element()?;
            let elt = if self.match_token(&TokenKind::Colon) {
                let value = self.element()?;
                Expr::KeyValue {
                    id: self.next_id(),
                    key: Box::new(key),
                    value: Box::new(value),
                    span: elt_span.to(self.previous_span()),
                }
            } else {
                key
            };
            elts.push(elt);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expr_lev -= 1;
        self.expect(&TokenKind::RBrace)?;

        Ok(Expr::CompositeLit {
            id: self.next_id(),
            ty: ty.map(Box::new),
            elts,
            span: span.to(self.previous_span()),
        })
    }

    /// A composite literal element, which may itself be a literal with its
    /// type elided.
    fn element(&mut self) -> Result<Expr, String> {
        if self.check(&TokenKind::LBrace) {
            let span = self.current_span();
            self.composite_lit(None, span)
        } else {
            self.parse_expr()
        }
    }

    // Helper methods

    fn next_id(&mut self) -> NodeId {
        let id = self.next_node;
        self.next_node += 1;
        id
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_ahead(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.current + offset).map(|t| &t.kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Eof) | None)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn check_ident(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Ident(_)))
    }

    fn check_ahead(&self, kind: &TokenKind, offset: usize) -> bool {
        self.peek_ahead(offset) == Some(kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens.get(self.current - 1)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), String> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", kind)))
        }
    }

    /// Statement terminator. It may be omitted before a closing `)` or `}`.
    fn expect_semi(&mut self) -> Result<(), String> {
        if self.match_token(&TokenKind::Semi)
            || self.check(&TokenKind::RParen)
            || self.check(&TokenKind::RBrace)
            || self.is_at_end()
        {
            Ok(())
        } else {
            Err(self.error("expected ';' or newline"))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, String> {
        if let Some(TokenKind::Ident(name)) = self.peek_kind() {
            let name = name.clone();
            let span = self.current_span();
            self.advance();
            Ok(Ident {
                id: self.next_id(),
                name,
                span,
            })
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_default()
    }

    fn previous_span(&self) -> Span {
        self.tokens
            .get(self.current.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn error(&self, message: &str) -> String {
        let span = self.current_span();
        format!(
            "error: {}\n  --> {}:{}:{}",
            message, self.filename, span.line, span.column
        )
    }
}

fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    let op = match kind {
        TokenKind::OrOr => (BinaryOp::Or, 1),
        TokenKind::AndAnd => (BinaryOp::And, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::NotEq => (BinaryOp::Ne, 3),
        TokenKind::Lt => (BinaryOp::Lt, 3),
        TokenKind::Le => (BinaryOp::Le, 3),
        TokenKind::Gt => (BinaryOp::Gt, 3),
        TokenKind::Ge => (BinaryOp::Ge, 3),
        TokenKind::Plus => (BinaryOp::Add, 4),
        TokenKind::Minus => (BinaryOp::Sub, 4),
        TokenKind::Pipe => (BinaryOp::BitOr, 4),
        TokenKind::Caret => (BinaryOp::BitXor, 4),
        TokenKind::Star => (BinaryOp::Mul, 5),
        TokenKind::Slash => (BinaryOp::Div, 5),
        TokenKind::Percent => (BinaryOp::Rem, 5),
        TokenKind::Shl => (BinaryOp::Shl, 5),
        TokenKind::Shr => (BinaryOp::Shr, 5),
        TokenKind::Amp => (BinaryOp::BitAnd, 5),
        TokenKind::AndNot => (BinaryOp::AndNot, 5),
        _ => return None,
    };
    Some(op)
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::Define => AssignOp::Define,
        TokenKind::PlusEq => AssignOp::Compound(BinaryOp::Add),
        TokenKind::MinusEq => AssignOp::Compound(BinaryOp::Sub),
        TokenKind::StarEq => AssignOp::Compound(BinaryOp::Mul),
        TokenKind::SlashEq => AssignOp::Compound(BinaryOp::Div),
        TokenKind::PercentEq => AssignOp::Compound(BinaryOp::Rem),
        TokenKind::AmpEq => AssignOp::Compound(BinaryOp::BitAnd),
        TokenKind::PipeEq => AssignOp::Compound(BinaryOp::BitOr),
        TokenKind::CaretEq => AssignOp::Compound(BinaryOp::BitXor),
        TokenKind::ShlEq => AssignOp::Compound(BinaryOp::Shl),
        TokenKind::ShrEq => AssignOp::Compound(BinaryOp::Shr),
        TokenKind::AndNotEq => AssignOp::Compound(BinaryOp::AndNot),
        _ => return None,
    };
    Some(op)
}

fn is_type_switch_guard(expr: &Expr) -> bool {
    matches!(expr, Expr::TypeAssert { ty: None, .. })
}

/// Expressions that may be followed by a composite literal body.
fn is_literal_type(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) | Expr::ArrayType { .. } | Expr::MapType { .. } | Expr::StructType { .. } => {
            true
        }
        Expr::Selector { x, .. } => matches!(**x, Expr::Ident(_)),
        _ => false,
    }
}

fn is_type_name(expr: &Expr) -> bool {
    matches!(expr, Expr::Ident(_) | Expr::Selector { .. })
}

/// Parses `source` as a single Go type expression. Node ids start at zero;
/// the result is never recorded in a package's type information.
pub fn parse_type_source(filename: &str, source: &str) -> Result<Expr, String> {
    let mut lexer = crate::frontend::lexer::Lexer::new(filename, source);
    let tokens = lexer.scan_tokens()?;
    let mut parser = Parser::new(filename, tokens, 0);
    parser.parse_standalone_type()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    fn parse(source: &str) -> Result<File, String> {
        let mut lexer = Lexer::new("test.go", source);
        let tokens = lexer.scan_tokens()?;
        let mut parser = Parser::new("test.go", tokens, 0);
        parser.parse_file()
    }

    fn body(file: &File, index: usize) -> &[Stmt] {
        match &file.decls[index] {
            Decl::Func(func) => &func.body.as_ref().unwrap().stmts,
            _ => panic!("expected function declaration"),
        }
    }

    #[test]
    fn test_package_and_imports() {
        let file = parse(
            "package main\n\nimport (\n\t\"fmt\"\n\tf \"os\"\n\t. \"strings\"\n\t_ \"embed\"\n)\nimport \"time\"\n",
        )
        .unwrap();
        assert_eq!(file.package.name, "main");
        let names: Vec<_> = file.imports.iter().map(|i| i.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                ImportName::Default,
                ImportName::Alias("f".to_string()),
                ImportName::Dot,
                ImportName::Blank,
                ImportName::Default,
            ]
        );
        assert_eq!(file.imports[4].path, "time");
    }

    #[test]
    fn test_function_with_grouped_params() {
        let file = parse("package p\nfunc add(a, b int, c ...string) (int, error) { return a + b, nil }\n")
            .unwrap();
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected func");
        };
        assert_eq!(func.name.name, "add");
        assert_eq!(func.sig.params.len(), 2);
        assert_eq!(func.sig.params[0].names.len(), 2);
        assert!(matches!(func.sig.params[1].ty, Expr::Ellipsis { .. }));
        assert_eq!(func.sig.results.len(), 2);
    }

    #[test]
    fn test_unnamed_params() {
        let file = parse("package p\nvar f func(int, string) bool\n").unwrap();
        let Decl::Var(specs) = &file.decls[0] else {
            panic!("expected var");
        };
        let Some(Expr::FuncType(sig)) = &specs[0].ty else {
            panic!("expected func type");
        };
        assert_eq!(sig.params.len(), 2);
        assert!(sig.params.iter().all(|p| p.names.is_empty()));
        assert_eq!(sig.results.len(), 1);
    }

    #[test]
    fn test_method_receiver() {
        let file = parse("package p\nfunc (s *Server) Run() {}\n").unwrap();
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected func");
        };
        let recv = func.recv.as_ref().unwrap();
        assert_eq!(recv.names[0].name, "s");
        assert!(matches!(recv.ty, Expr::Star { .. }));
    }

    #[test]
    fn test_const_iota_repetition() {
        let file = parse("package p\nconst (\n\tA = iota\n\tB\n\tC\n)\n").unwrap();
        let Decl::Const(specs) = &file.decls[0] else {
            panic!("expected const");
        };
        assert_eq!(specs.len(), 3);
        assert!(!specs[0].implicit);
        assert!(specs[1].implicit && specs[2].implicit);
        assert_eq!(specs[2].iota, 2);
        assert_eq!(specs[2].values.len(), 1);
    }

    #[test]
    fn test_composite_literal_in_if_header() {
        let file = parse(
            "package p\nfunc f(x T) {\n\tif x == (T{}) {\n\t}\n\tif x.ok {\n\t\t_ = []int{1, 2}\n\t}\n}\n",
        )
        .unwrap();
        let stmts = body(&file, 0);
        assert_eq!(stmts.len(), 2);
        let Stmt::If { cond, .. } = &stmts[1] else {
            panic!("expected if");
        };
        assert!(matches!(cond, Expr::Selector { .. }));
    }

    #[test]
    fn test_for_forms() {
        let file = parse(
            "package p\nfunc f() {\n\tfor {}\n\tfor i < 3 {}\n\tfor i := 0; i < 3; i++ {}\n\tfor k, v := range m {}\n\tfor range ch {}\n}\n",
        )
        .unwrap();
        let stmts = body(&file, 0);
        assert!(matches!(stmts[0], Stmt::For { cond: None, .. }));
        assert!(matches!(stmts[1], Stmt::For { cond: Some(_), init: None, .. }));
        assert!(matches!(stmts[2], Stmt::For { init: Some(_), post: Some(_), .. }));
        assert!(matches!(
            stmts[3],
            Stmt::Range {
                define: true,
                value: Some(_),
                ..
            }
        ));
        assert!(matches!(stmts[4], Stmt::Range { key: None, .. }));
    }

    #[test]
    fn test_type_switch() {
        let file = parse(
            "package p\nfunc f(x any) {\n\tswitch v := x.(type) {\n\tcase int, *T:\n\t\t_ = v\n\tdefault:\n\t}\n}\n",
        )
        .unwrap();
        let Stmt::TypeSwitch {
            binding, clauses, ..
        } = &body(&file, 0)[0]
        else {
            panic!("expected type switch");
        };
        assert_eq!(binding.as_ref().unwrap().name, "v");
        assert_eq!(clauses[0].exprs.len(), 2);
        assert!(clauses[1].is_default);
    }

    #[test]
    fn test_expression_switch_headers() {
        let file = parse(
            "package p\nfunc f(x int) {\n\tswitch x {\n\tcase 1:\n\t}\n\tswitch y := x * 2; y {\n\tdefault:\n\t}\n\tswitch {\n\t}\n}\n",
        )
        .unwrap();
        let stmts = body(&file, 0);
        assert!(matches!(&stmts[0], Stmt::Switch { init: None, tag: Some(Expr::Ident(_)), .. }));
        assert!(matches!(&stmts[1], Stmt::Switch { init: Some(_), tag: Some(Expr::Ident(_)), .. }));
        assert!(matches!(&stmts[2], Stmt::Switch { init: None, tag: None, .. }));
    }

    #[test]
    fn test_select_and_send() {
        let file = parse(
            "package p\nfunc f() {\n\tselect {\n\tcase v := <-in:\n\t\tout <- v\n\tcase <-done:\n\tdefault:\n\t}\n}\n",
        )
        .unwrap();
        let Stmt::Select { clauses, .. } = &body(&file, 0)[0] else {
            panic!("expected select");
        };
        assert_eq!(clauses.len(), 3);
        assert!(matches!(clauses[0].body[0], Stmt::Send { .. }));
        assert!(clauses[2].comm.is_none());
    }

    #[test]
    fn test_call_with_spread_and_func_literal() {
        let file = parse("package p\nfunc f() {\n\th(a, b, c...)\n\tgo func() { g() }()\n}\n").unwrap();
        let stmts = body(&file, 0);
        let Stmt::Expr {
            expr: Expr::Call(call),
            ..
        } = &stmts[0]
        else {
            panic!("expected call");
        };
        assert!(call.ellipsis);
        assert_eq!(call.args.len(), 3);
        assert!(matches!(stmts[1], Stmt::Go { .. }));
    }

    #[test]
    fn test_binary_precedence() {
        let file = parse("package p\nvar x = 1 + 2*3 == 7 && true\n").unwrap();
        let Decl::Var(specs) = &file.decls[0] else {
            panic!("expected var");
        };
        let Expr::Binary { op, left, .. } = &specs[0].values[0] else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::And);
        assert!(matches!(**left, Expr::Binary { op: BinaryOp::Eq, .. }));
    }

    #[test]
    fn test_labels_and_branches() {
        let file = parse("package p\nfunc f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n").unwrap();
        let Stmt::Labeled { label, stmt, .. } = &body(&file, 0)[0] else {
            panic!("expected labeled statement");
        };
        assert_eq!(label.name, "outer");
        assert!(matches!(**stmt, Stmt::For { .. }));
    }

    #[test]
    fn test_struct_and_interface_types() {
        let file = parse(
            "package p\ntype S struct {\n\tio.Reader\n\t*Base\n\tName string `json:\"name\"`\n\ta, b int\n}\ntype I interface {\n\tfmt.Stringer\n\tRead(p []byte) (int, error)\n}\n",
        )
        .unwrap();
        let Decl::Type(specs) = &file.decls[0] else {
            panic!("expected type decl");
        };
        let Expr::StructType { fields, .. } = &specs[0].ty else {
            panic!("expected struct");
        };
        assert_eq!(fields.len(), 4);
        assert!(fields[0].names.is_empty() && fields[1].names.is_empty());
        assert!(fields[2].tag.is_some());
        let Decl::Type(specs) = &file.decls[1] else {
            panic!("expected type decl");
        };
        let Expr::InterfaceType { elems, .. } = &specs[0].ty else {
            panic!("expected interface");
        };
        assert_eq!(elems.len(), 2);
    }

    #[test]
    fn test_generics_rejected() {
        let err = parse("package p\nfunc Map[T any](x T) T { return x }\n").unwrap_err();
        assert!(err.contains("type parameters are not supported"));
        assert!(err.contains("test.go:2:"));
        assert!(parse("package p\ntype List[T any] []T\n").is_err());
        assert!(parse("package p\ntype Buf [N]byte\n").is_ok());
    }

    #[test]
    fn test_node_ids_are_unique() {
        let mut lexer = Lexer::new("a.go", "package p\nvar x = f(1, g(2))\n");
        let tokens = lexer.scan_tokens().unwrap();
        let mut parser = Parser::new("a.go", tokens, 100);
        let file = parser.parse_file().unwrap();
        assert!(parser.next_node_id() > 100);
        let Decl::Var(specs) = &file.decls[0] else {
            panic!("expected var");
        };
        let Expr::Call(outer) = &specs[0].values[0] else {
            panic!("expected call");
        };
        let Expr::Call(inner) = &outer.args[1] else {
            panic!("expected call");
        };
        assert_ne!(outer.id, inner.id);
        assert!(outer.id >= 100);
    }

    #[test]
    fn test_parse_type_source() {
        let ty = parse_type_source("stub", "func(format string, a ...any) (n int, err error)").unwrap();
        let Expr::FuncType(sig) = ty else {
            panic!("expected func type");
        };
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.results.len(), 2);
        assert!(parse_type_source("stub", "map[string][]*os.File").is_ok());
    }
}
