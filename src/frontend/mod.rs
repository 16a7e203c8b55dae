//! Go-subset front-end: lexer, parser, package stubs and type checker.
//!
//! The instrumentation core only sees [`Package`] units and the
//! [`TypeOracle`] seam; everything else here is an implementation detail.

pub mod ast;
pub mod lexer;
mod loader;
pub mod parser;
pub mod stubs;
pub mod typechecker;
pub mod types;
pub mod visit;

pub use loader::{LoadTimings, Unit, discover};
pub use typechecker::{TypeChecker, TypeInfo};

use crate::config::Config;
use crate::error::{IsuprofError, Result};
use ast::Expr;
use std::path::Path;
use stubs::StubRegistry;
use tracing::info;
use typechecker::{Mode, TypeError};
use types::{Origin, Signature, Type};

/// How a call's callee resolves.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A function value of this (underlying) signature.
    Callable(Signature),
    /// A conversion or a builtin; never instrumented.
    NotCallable,
    /// No type information was recorded for the callee.
    Unknown,
}

/// Static type information the rewriter consumes.
pub trait TypeOracle {
    fn resolve_callee(&self, callee: &Expr) -> Resolution;

    /// Whether `expr` yields more than one value.
    fn is_multi_value(&self, expr: &Expr) -> bool;
}

/// Type information of a checked package.
#[derive(Debug)]
pub struct PackageTypes {
    pub info: TypeInfo,
    pub stubs: StubRegistry,
}

impl PackageTypes {
    fn underlying(&self, ty: &Type) -> Option<Type> {
        match ty {
            Type::Named(named) => {
                let info = self.info.named.get(named).or_else(|| match &named.origin {
                    Origin::External(path) => self.stubs.named(path, &named.name),
                    _ => None,
                })?;
                Some(info.underlying.clone())
            }
            other => Some(other.clone()),
        }
    }
}

impl TypeOracle for PackageTypes {
    fn resolve_callee(&self, callee: &Expr) -> Resolution {
        let Some(tv) = self.info.type_of(callee.id()) else {
            return Resolution::Unknown;
        };
        match tv.mode {
            Mode::TypeExpr | Mode::Builtin => Resolution::NotCallable,
            Mode::Package | Mode::NoValue => Resolution::Unknown,
            Mode::Value | Mode::Constant => match self.underlying(&tv.ty) {
                Some(Type::Func(sig)) => Resolution::Callable(sig),
                _ => Resolution::Unknown,
            },
        }
    }

    fn is_multi_value(&self, expr: &Expr) -> bool {
        matches!(
            self.info.type_of(expr.id()).map(|tv| &tv.ty),
            Some(Type::Tuple(types)) if types.len() > 1
        )
    }
}

/// A parsed and type-checked package.
#[derive(Debug)]
pub struct Package {
    /// Name from the package clause.
    pub name: String,
    /// Units sorted by file name.
    pub units: Vec<Unit>,
    pub types: PackageTypes,
}

/// Loads, parses and type checks the Go package in `dir`.
pub fn load_package(dir: &Path, config: &Config) -> Result<Package> {
    let (name, units) = loader::load_units(dir, config.package.as_deref())?;
    let stubs = StubRegistry::new(&config.packages).map_err(IsuprofError::Config)?;

    let checked = {
        let mut checker = TypeChecker::new(&stubs);
        for unit in &units {
            checker.add_file(&unit.path, &unit.file);
        }
        checker.check()
    };
    let info = checked.map_err(|errors| IsuprofError::TypeCheck(format_type_errors(&errors)))?;

    info!(package = %name, files = units.len(), "loaded package");
    Ok(Package {
        name,
        units,
        types: PackageTypes { info, stubs },
    })
}

/// Format type errors for display.
pub fn format_type_errors(errors: &[TypeError]) -> String {
    let mut output = String::new();

    for error in errors {
        output.push_str(&format!(
            "error: type error: {}\n  --> {}:{}:{}\n",
            error.message, error.filename, error.span.line, error.span.column
        ));
    }

    output.truncate(output.trim_end().len());
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Span;
    use std::fs;

    fn package(source: &str) -> Package {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.go"), source).unwrap();
        load_package(dir.path(), &Config::default()).unwrap()
    }

    fn first_call(pkg: &Package) -> &ast::CallExpr {
        let mut found = None;
        visit::file_roots(&pkg.units[0].file, &mut |e| {
            if found.is_none() {
                if let Expr::Call(call) = e {
                    found = Some(call);
                }
            }
        });
        found.unwrap()
    }

    #[test]
    fn test_named_func_type_resolves_structurally() {
        let pkg = package(
            "package main\n\ntype Op func(a, b int) int\n\nfunc main() {\n\tvar op Op = func(a, b int) int { return a }\n\top(1, 2)\n}\n",
        );
        let call = first_call(&pkg);
        let Resolution::Callable(sig) = pkg.types.resolve_callee(&call.callee) else {
            panic!("expected callable");
        };
        assert_eq!(sig.to_string(), "(int, int) int");
    }

    #[test]
    fn test_conversion_is_not_callable() {
        let pkg = package("package main\n\nfunc main() {\n\t_ = float64(3)\n}\n");
        let call = first_call(&pkg);
        assert_eq!(pkg.types.resolve_callee(&call.callee), Resolution::NotCallable);
    }

    #[test]
    fn test_unrecorded_expression_is_unknown() {
        let pkg = package("package main\n\nfunc main() {}\n");
        let stray = Expr::Ident(ast::Ident::synthetic("ghost"));
        assert_eq!(pkg.types.resolve_callee(&stray), Resolution::Unknown);
    }

    #[test]
    fn test_multi_value_argument() {
        let pkg = package(
            "package main\n\nfunc two() (int, int) { return 1, 2 }\n\nfunc add(a, b int) int { return a + b }\n\nfunc main() {\n\tadd(two())\n}\n",
        );
        let call = first_call(&pkg);
        assert!(pkg.types.is_multi_value(&call.args[0]));
        assert!(!pkg.types.is_multi_value(&call.callee));
    }

    #[test]
    fn test_type_errors_fail_loading() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n\nfunc main() { nope() }\n").unwrap();
        let err = load_package(dir.path(), &Config::default()).unwrap_err();
        let IsuprofError::TypeCheck(message) = err else {
            panic!("expected type error");
        };
        assert!(message.starts_with("error: type error: undefined: nope"));
    }

    #[test]
    fn test_format_type_errors() {
        let errors = vec![
            TypeError::new("undefined: x", "a.go", Span::new(0, 1, 3, 5)),
            TypeError::new("undefined: y", "b.go", Span::new(0, 1, 7, 2)),
        ];
        assert_eq!(
            format_type_errors(&errors),
            "error: type error: undefined: x\n  --> a.go:3:5\nerror: type error: undefined: y\n  --> b.go:7:2"
        );
    }
}
