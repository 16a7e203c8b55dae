//! Tree traversal over value expressions.
//!
//! [`VisitMut`] is the rewrite contract: a `visit_*` override may replace the
//! node it is handed and then call the matching `walk_*` function to descend
//! into the children of whatever node now occupies that position.
//!
//! The read-only helpers ([`file_roots`], [`expr_children`]) enumerate the
//! same value expressions in source order. Type expressions are never
//! descended into: they contain no calls that could be instrumented.

use crate::frontend::ast::*;

pub trait VisitMut {
    fn visit_file_mut(&mut self, file: &mut File) {
        walk_file_mut(self, file);
    }

    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        walk_decl_mut(self, decl);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_file_mut<V: VisitMut + ?Sized>(v: &mut V, file: &mut File) {
    for decl in &mut file.decls {
        v.visit_decl_mut(decl);
    }
}

pub fn walk_decl_mut<V: VisitMut + ?Sized>(v: &mut V, decl: &mut Decl) {
    match decl {
        Decl::Func(func) => {
            if let Some(body) = &mut func.body {
                v.visit_block_mut(body);
            }
        }
        Decl::Var(specs) | Decl::Const(specs) => {
            for spec in specs.iter_mut().filter(|s| !s.implicit) {
                for value in &mut spec.values {
                    v.visit_expr_mut(value);
                }
            }
        }
        Decl::Type(_) => {}
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Expr { expr, .. } => v.visit_expr_mut(expr),
        Stmt::Send { chan, value, .. } => {
            v.visit_expr_mut(chan);
            v.visit_expr_mut(value);
        }
        Stmt::IncDec { x, .. } => v.visit_expr_mut(x),
        Stmt::Assign { lhs, rhs, .. } => {
            for e in lhs.iter_mut().chain(rhs.iter_mut()) {
                v.visit_expr_mut(e);
            }
        }
        Stmt::Go { call, .. } | Stmt::Defer { call, .. } => v.visit_expr_mut(call),
        Stmt::Return { results, .. } => {
            for e in results {
                v.visit_expr_mut(e);
            }
        }
        Stmt::Branch { .. } | Stmt::Empty { .. } => {}
        Stmt::Block(block) => v.visit_block_mut(block),
        Stmt::If {
            init,
            cond,
            then_block,
            else_stmt,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(cond);
            v.visit_block_mut(then_block);
            if let Some(else_stmt) = else_stmt {
                v.visit_stmt_mut(else_stmt);
            }
        }
        Stmt::Switch {
            init, tag, clauses, ..
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(tag) = tag {
                v.visit_expr_mut(tag);
            }
            for clause in clauses {
                for e in &mut clause.exprs {
                    v.visit_expr_mut(e);
                }
                for s in &mut clause.body {
                    v.visit_stmt_mut(s);
                }
            }
        }
        Stmt::TypeSwitch {
            init,
            subject,
            clauses,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            v.visit_expr_mut(subject);
            for clause in clauses {
                for s in &mut clause.body {
                    v.visit_stmt_mut(s);
                }
            }
        }
        Stmt::Select { clauses, .. } => {
            for clause in clauses {
                if let Some(comm) = &mut clause.comm {
                    v.visit_stmt_mut(comm);
                }
                for s in &mut clause.body {
                    v.visit_stmt_mut(s);
                }
            }
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
            ..
        } => {
            if let Some(init) = init {
                v.visit_stmt_mut(init);
            }
            if let Some(cond) = cond {
                v.visit_expr_mut(cond);
            }
            if let Some(post) = post {
                v.visit_stmt_mut(post);
            }
            v.visit_block_mut(body);
        }
        Stmt::Range {
            key,
            value,
            x,
            body,
            ..
        } => {
            if let Some(key) = key {
                v.visit_expr_mut(key);
            }
            if let Some(value) = value {
                v.visit_expr_mut(value);
            }
            v.visit_expr_mut(x);
            v.visit_block_mut(body);
        }
        Stmt::Labeled { stmt, .. } => v.visit_stmt_mut(stmt),
        Stmt::Decl(decl) => v.visit_decl_mut(decl),
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Ident(_) | Expr::BasicLit { .. } => {}
        Expr::CompositeLit { elts, .. } => {
            for e in elts {
                v.visit_expr_mut(e);
            }
        }
        Expr::FuncLit { body, .. } => v.visit_block_mut(body),
        Expr::Paren { x, .. }
        | Expr::Selector { x, .. }
        | Expr::TypeAssert { x, .. }
        | Expr::Star { x, .. }
        | Expr::Unary { x, .. } => v.visit_expr_mut(x),
        Expr::Index { x, index, .. } => {
            v.visit_expr_mut(x);
            v.visit_expr_mut(index);
        }
        Expr::Slice { x, lo, hi, max, .. } => {
            v.visit_expr_mut(x);
            for e in [lo, hi, max].into_iter().flatten() {
                v.visit_expr_mut(e);
            }
        }
        Expr::Call(call) => {
            v.visit_expr_mut(&mut call.callee);
            for arg in &mut call.args {
                v.visit_expr_mut(arg);
            }
        }
        Expr::Binary { left, right, .. } => {
            v.visit_expr_mut(left);
            v.visit_expr_mut(right);
        }
        Expr::KeyValue { key, value, .. } => {
            v.visit_expr_mut(key);
            v.visit_expr_mut(value);
        }
        Expr::ArrayType { .. }
        | Expr::MapType { .. }
        | Expr::ChanType { .. }
        | Expr::FuncType(_)
        | Expr::StructType { .. }
        | Expr::InterfaceType { .. }
        | Expr::Ellipsis { .. } => {}
    }
}

/// Calls `f` with every root value expression of `file`, in source order.
pub fn file_roots<'a, F: FnMut(&'a Expr)>(file: &'a File, f: &mut F) {
    for decl in &file.decls {
        decl_roots(decl, f);
    }
}

fn decl_roots<'a, F: FnMut(&'a Expr)>(decl: &'a Decl, f: &mut F) {
    match decl {
        Decl::Func(func) => {
            if let Some(body) = &func.body {
                block_roots(&body.stmts, f);
            }
        }
        Decl::Var(specs) | Decl::Const(specs) => {
            for spec in specs.iter().filter(|s| !s.implicit) {
                spec.values.iter().for_each(&mut *f);
            }
        }
        Decl::Type(_) => {}
    }
}

fn block_roots<'a, F: FnMut(&'a Expr)>(stmts: &'a [Stmt], f: &mut F) {
    for stmt in stmts {
        stmt_roots(stmt, f);
    }
}

/// Calls `f` with the outermost value expressions of `stmt`, recursing into
/// nested statements but not into expressions.
pub fn stmt_roots<'a, F: FnMut(&'a Expr)>(stmt: &'a Stmt, f: &mut F) {
    match stmt {
        Stmt::Expr { expr, .. } => f(expr),
        Stmt::Send { chan, value, .. } => {
            f(chan);
            f(value);
        }
        Stmt::IncDec { x, .. } => f(x),
        Stmt::Assign { lhs, rhs, .. } => lhs.iter().chain(rhs.iter()).for_each(&mut *f),
        Stmt::Go { call, .. } | Stmt::Defer { call, .. } => f(call),
        Stmt::Return { results, .. } => results.iter().for_each(&mut *f),
        Stmt::Branch { .. } | Stmt::Empty { .. } => {}
        Stmt::Block(block) => block_roots(&block.stmts, f),
        Stmt::If {
            init,
            cond,
            then_block,
            else_stmt,
            ..
        } => {
            if let Some(init) = init {
                stmt_roots(init, f);
            }
            f(cond);
            block_roots(&then_block.stmts, f);
            if let Some(else_stmt) = else_stmt {
                stmt_roots(else_stmt, f);
            }
        }
        Stmt::Switch {
            init, tag, clauses, ..
        } => {
            if let Some(init) = init {
                stmt_roots(init, f);
            }
            if let Some(tag) = tag {
                f(tag);
            }
            for clause in clauses {
                clause.exprs.iter().for_each(&mut *f);
                block_roots(&clause.body, f);
            }
        }
        Stmt::TypeSwitch {
            init,
            subject,
            clauses,
            ..
        } => {
            if let Some(init) = init {
                stmt_roots(init, f);
            }
            f(subject);
            for clause in clauses {
                block_roots(&clause.body, f);
            }
        }
        Stmt::Select { clauses, .. } => {
            for clause in clauses {
                if let Some(comm) = &clause.comm {
                    stmt_roots(comm, f);
                }
                block_roots(&clause.body, f);
            }
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
            ..
        } => {
            if let Some(init) = init {
                stmt_roots(init, f);
            }
            if let Some(cond) = cond {
                f(cond);
            }
            if let Some(post) = post {
                stmt_roots(post, f);
            }
            block_roots(&body.stmts, f);
        }
        Stmt::Range {
            key,
            value,
            x,
            body,
            ..
        } => {
            if let Some(key) = key {
                f(key);
            }
            if let Some(value) = value {
                f(value);
            }
            f(x);
            block_roots(&body.stmts, f);
        }
        Stmt::Labeled { stmt, .. } => stmt_roots(stmt, f),
        Stmt::Decl(decl) => decl_roots(decl, f),
    }
}

/// Calls `f` with the direct value children of `expr`, in source order. For
/// a function literal these are the root expressions of its body.
pub fn expr_children<'a, F: FnMut(&'a Expr)>(expr: &'a Expr, f: &mut F) {
    match expr {
        Expr::Ident(_) | Expr::BasicLit { .. } => {}
        Expr::CompositeLit { elts, .. } => elts.iter().for_each(&mut *f),
        Expr::FuncLit { body, .. } => block_roots(&body.stmts, f),
        Expr::Paren { x, .. }
        | Expr::Selector { x, .. }
        | Expr::TypeAssert { x, .. }
        | Expr::Star { x, .. }
        | Expr::Unary { x, .. } => f(x),
        Expr::Index { x, index, .. } => {
            f(x);
            f(index);
        }
        Expr::Slice { x, lo, hi, max, .. } => {
            f(x);
            for e in [lo, hi, max].into_iter().flatten() {
                f(e);
            }
        }
        Expr::Call(call) => {
            f(&call.callee);
            call.args.iter().for_each(&mut *f);
        }
        Expr::Binary { left, right, .. } => {
            f(left);
            f(right);
        }
        Expr::KeyValue { key, value, .. } => {
            f(key);
            f(value);
        }
        Expr::ArrayType { .. }
        | Expr::MapType { .. }
        | Expr::ChanType { .. }
        | Expr::FuncType(_)
        | Expr::StructType { .. }
        | Expr::InterfaceType { .. }
        | Expr::Ellipsis { .. } => {}
    }
}
