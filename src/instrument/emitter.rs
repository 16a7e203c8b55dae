//! Serializes rewritten units and the generated wrapper unit.
//!
//! Rewritten units keep their original text except for the instrumented
//! calls, which are spliced in place. Nothing touches the disk until every
//! output of the run has been rendered.

use crate::error::{IsuprofError, Result};
use crate::frontend::Unit;
use crate::frontend::ast::{CallExpr, Expr};
use crate::frontend::lexer::Span;
use crate::frontend::visit::{expr_children, file_roots};
use crate::instrument::generator::WrapperTable;
use crate::instrument::names::NameResolver;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub path: PathBuf,
    pub contents: String,
}

/// Source of `unit` with instrumented calls spliced in.
pub fn rewrite_unit(unit: &Unit) -> String {
    let mut holes = Vec::new();
    file_roots(&unit.file, &mut |root| {
        if has_rewrite(root) {
            holes.push((root.span(), render_expr(root, &unit.source)));
        }
    });
    splice(&unit.source, 0, unit.source.len(), holes)
}

fn has_rewrite(expr: &Expr) -> bool {
    if let Expr::Call(call) = expr {
        if call.instrumented {
            return true;
        }
    }
    let mut found = false;
    expr_children(expr, &mut |child| found = found || has_rewrite(child));
    found
}

fn render_expr(expr: &Expr, source: &str) -> String {
    if let Expr::Call(call) = expr {
        if call.instrumented {
            return render_call(call, source);
        }
    }
    let span = expr.span();
    let mut holes = Vec::new();
    expr_children(expr, &mut |child| {
        if has_rewrite(child) {
            holes.push((child.span(), render_expr(child, source)));
        }
    });
    splice(source, span.start, span.end, holes)
}

/// `f(x, y...)` was wrapped into a call whose first argument is `f`; emit
/// `W(f, x, y...)` reusing the text between the parentheses.
fn render_call(call: &CallExpr, source: &str) -> String {
    let (wrapper, callee, args) = match (call.callee.as_ref(), call.args.split_first()) {
        (Expr::Ident(wrapper), Some((callee, args))) => (wrapper, callee, args),
        // Not produced by `CallExpr::wrap`.
        _ => return source[call.span.start..call.span.end].to_string(),
    };

    let open = open_paren(source, callee.span().end).unwrap_or(callee.span().end);
    let mut out = format!("{}({}", wrapper.name, render_expr(callee, source));
    if !args.is_empty() {
        out.push_str(", ");
    }
    let holes = args
        .iter()
        .filter(|arg| has_rewrite(arg))
        .map(|arg| (arg.span(), render_expr(arg, source)))
        .collect();
    out.push_str(&splice(source, open + 1, call.span.end, holes));
    out
}

/// Offset of the `(` following `pos`, skipping whitespace and comments.
fn open_paren(source: &str, mut pos: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    while pos < bytes.len() {
        match bytes[pos] {
            b'(' => return Some(pos),
            b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos = source[pos..].find('\n').map_or(bytes.len(), |n| pos + n);
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos = source[pos + 2..].find("*/").map(|n| pos + 2 + n + 2)?;
            }
            _ => return None,
        }
    }
    None
}

/// Text of `source[start..end]` with each hole's span replaced by its text.
/// Holes outside the range or overlapping an earlier hole are ignored.
fn splice(source: &str, start: usize, end: usize, mut holes: Vec<(Span, String)>) -> String {
    holes.sort_by_key(|(span, _)| span.start);
    let mut out = String::with_capacity(end.saturating_sub(start));
    let mut cursor = start;
    for (span, text) in holes {
        if span.start < cursor || span.end > end || span.start >= span.end {
            continue;
        }
        out.push_str(&source[cursor..span.start]);
        out.push_str(&text);
        cursor = span.end;
    }
    out.push_str(&source[cursor..end]);
    out
}

const PAYLOAD: &str = "type _isuprofProfiler struct {
	funcName        string
	startedAt       TIME.Time
	params, results []interface{}
}

func _isuprofStartProfiling(name string, params ...interface{}) *_isuprofProfiler {
	return &_isuprofProfiler{
		funcName:  name,
		startedAt: TIME.Now(),
		params:    params,
	}
}

func (p _isuprofProfiler) stopProfiling(results ...interface{}) {
	elapsed := TIME.Now().Sub(p.startedAt)
	LOG.Printf(\"{\\\"elapsed\\\": %d, \\\"name\\\": \\\"%s\\\"}\", elapsed, p.funcName)
}
";

/// Source of the unit holding every wrapper and the profiling payload.
pub fn generated_unit(
    package: &str,
    build_tag: &str,
    wrappers: &WrapperTable,
    names: &mut NameResolver<'_>,
) -> String {
    let payload = PAYLOAD
        .replace("TIME.", &format!("{}.", names.qualifier("time")))
        .replace("LOG.", &format!("{}.", names.qualifier("log")));

    let mut out = format!(
        "//go:build {tag}\n// +build {tag}\n\n// Code generated by isuprof. DO NOT EDIT.\n\npackage {package}\n\nimport (\n",
        tag = build_tag,
        package = package,
    );
    for (path, name) in names.imports() {
        if name == names.declared_name(path) {
            out.push_str(&format!("\t\"{}\"\n", path));
        } else {
            out.push_str(&format!("\t{} \"{}\"\n", name, path));
        }
    }
    out.push_str(")\n");

    for wrapper in wrappers.iter() {
        out.push('\n');
        out.push_str(&wrapper.text);
    }
    out.push('\n');
    out.push_str(&payload);
    out
}

/// Writes every output through a temporary file and a rename.
pub fn write_outputs(outputs: &[Output]) -> Result<()> {
    for output in outputs {
        if let Some(parent) = output.path.parent() {
            fs::create_dir_all(parent).map_err(|source| IsuprofError::Emit {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let tmp = temp_path(&output.path);
        fs::write(&tmp, &output.contents)
            .and_then(|()| fs::rename(&tmp, &output.path))
            .map_err(|source| {
                let _ = fs::remove_file(&tmp);
                IsuprofError::Emit {
                    path: output.path.clone(),
                    source,
                }
            })?;
        debug!(path = %output.path.display(), bytes = output.contents.len(), "wrote output");
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.isuprof-tmp", name))
}
