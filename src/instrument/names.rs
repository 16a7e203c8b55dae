//! Package qualifiers for types referenced from generated code.
//!
//! Generated wrappers live in a file of their own, so every package they
//! mention needs a name in that file's import block. A path keeps the first
//! name it gets for the whole run.

use crate::error::GenerationError;
use crate::frontend::Unit;
use crate::frontend::ast::{ChanDir, Decl, ImportName};
use crate::frontend::stubs::StubRegistry;
use crate::frontend::types::{BasicKind, NamedRef, Origin, Signature, Type};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use tracing::debug;

/// Packages the fixed payload and the wrapper template use.
pub const PAYLOAD_IMPORTS: [&str; 4] = ["log", "reflect", "runtime", "time"];

const ALIAS_PREFIX: &str = "_isuprof_";

pub struct NameResolver<'a> {
    stubs: &'a StubRegistry,
    /// Identifiers declared at package level.
    package_scope: BTreeSet<String>,
    by_path: BTreeMap<String, String>,
    by_name: BTreeMap<String, String>,
    /// Paths the generated file refers to.
    used: BTreeSet<String>,
    unit_imports: BTreeMap<String, ImportName>,
}

impl<'a> NameResolver<'a> {
    pub fn new(stubs: &'a StubRegistry, package_scope: BTreeSet<String>) -> Self {
        let mut resolver = Self {
            stubs,
            package_scope,
            by_path: BTreeMap::new(),
            by_name: BTreeMap::new(),
            used: BTreeSet::new(),
            unit_imports: BTreeMap::new(),
        };
        for path in PAYLOAD_IMPORTS {
            resolver.assign(path);
        }
        resolver
    }

    /// Switches to the imports of the unit being rewritten.
    pub fn enter_unit(&mut self, imports: &BTreeMap<String, ImportName>) {
        self.unit_imports = imports.clone();
    }

    /// Qualifier for `path`, recording that generated code refers to it.
    pub fn qualifier(&mut self, path: &str) -> String {
        let name = self.assign(path);
        self.used.insert(path.to_string());
        name
    }

    /// Paths referenced so far with their names, sorted by path.
    pub fn imports(&self) -> Vec<(&str, &str)> {
        self.used
            .iter()
            .filter_map(|path| self.by_path.get(path).map(|name| (path.as_str(), name.as_str())))
            .collect()
    }

    /// Whether the instrumented package declares `name` at package level.
    pub fn is_package_level(&self, name: &str) -> bool {
        self.package_scope.contains(name)
    }

    /// Name the package at `path` declares in its package clause.
    pub fn declared_name(&self, path: &str) -> String {
        self.stubs.package_name(path).to_string()
    }

    fn assign(&mut self, path: &str) -> String {
        if let Some(name) = self.by_path.get(path) {
            return name.clone();
        }

        let default = self.stubs.package_name(path).to_string();
        let preferred = match self.unit_imports.get(path) {
            Some(ImportName::Alias(alias)) => Some(alias.clone()),
            Some(ImportName::Dot) => None,
            Some(ImportName::Default) | Some(ImportName::Blank) | None => Some(default.clone()),
        };

        let name = match preferred {
            Some(name) if self.is_free(&name) => name,
            _ => self.synthesize(&default),
        };
        debug!(path, name = %name, "assigned package name");
        self.by_path.insert(path.to_string(), name.clone());
        self.by_name.insert(name.clone(), path.to_string());
        name
    }

    fn is_free(&self, name: &str) -> bool {
        !self.package_scope.contains(name) && !self.by_name.contains_key(name)
    }

    fn synthesize(&self, base: &str) -> String {
        let stem = format!("{}{}", ALIAS_PREFIX, base);
        if self.is_free(&stem) {
            return stem;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}{}", stem, n);
            if self.is_free(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Renders `ty` as Go source in the generated file. Call
    /// [`check_nameable`] first; this never fails for types that pass it.
    pub fn render(&mut self, ty: &Type) -> String {
        let mut out = String::new();
        self.render_into(ty, &mut out);
        out
    }

    /// Renders a function type without the `func` keyword, spelling the
    /// last parameter `...T` when variadic.
    pub fn render_signature(&mut self, sig: &Signature) -> String {
        let mut out = String::new();
        self.signature_into(sig, &mut out);
        out
    }

    fn render_into(&mut self, ty: &Type, out: &mut String) {
        match ty {
            Type::Basic(BasicKind::UnsafePointer) => {
                let qualifier = self.qualifier("unsafe");
                let _ = write!(out, "{}.Pointer", qualifier);
            }
            Type::Basic(kind) => out.push_str(kind.name()),
            Type::Named(named) => match &named.origin {
                Origin::External(path) => {
                    let qualifier = self.qualifier(path);
                    let _ = write!(out, "{}.{}", qualifier, named.name);
                }
                Origin::Universe | Origin::Current => out.push_str(&named.name),
            },
            Type::Pointer(elem) => {
                out.push('*');
                self.render_into(elem, out);
            }
            Type::Slice(elem) => {
                out.push_str("[]");
                self.render_into(elem, out);
            }
            Type::Array(len, elem) => {
                let _ = write!(out, "[{}]", len);
                self.render_into(elem, out);
            }
            Type::Map(key, value) => {
                out.push_str("map[");
                self.render_into(key, out);
                out.push(']');
                self.render_into(value, out);
            }
            Type::Chan(dir, elem) => {
                match dir {
                    ChanDir::Send => out.push_str("chan<- "),
                    ChanDir::Recv => out.push_str("<-chan "),
                    ChanDir::Both => out.push_str("chan "),
                }
                let parens = *dir == ChanDir::Both && matches!(**elem, Type::Chan(ChanDir::Recv, _));
                if parens {
                    out.push('(');
                }
                self.render_into(elem, out);
                if parens {
                    out.push(')');
                }
            }
            Type::Func(sig) => {
                out.push_str("func");
                self.signature_into(sig, out);
            }
            Type::Struct(fields) => {
                if fields.is_empty() {
                    out.push_str("struct{}");
                    return;
                }
                out.push_str("struct { ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !field.embedded {
                        out.push_str(&field.name);
                        out.push(' ');
                    }
                    self.render_into(&field.ty, out);
                    if let Some(tag) = &field.tag {
                        out.push(' ');
                        out.push_str(tag);
                    }
                }
                out.push_str(" }");
            }
            Type::Interface(iface) => {
                if iface.methods.is_empty() && iface.embeds.is_empty() {
                    out.push_str("interface{}");
                    return;
                }
                out.push_str("interface { ");
                let mut first = true;
                for embed in &iface.embeds {
                    if !first {
                        out.push_str("; ");
                    }
                    self.render_into(embed, out);
                    first = false;
                }
                for (name, sig) in &iface.methods {
                    if !first {
                        out.push_str("; ");
                    }
                    out.push_str(name);
                    self.signature_into(sig, out);
                    first = false;
                }
                out.push_str(" }");
            }
            // Rejected by check_nameable.
            Type::Untyped(_) | Type::Tuple(_) | Type::Invalid => out.push_str("invalid"),
        }
    }

    fn signature_into(&mut self, sig: &Signature, out: &mut String) {
        out.push('(');
        let last = sig.params.len().saturating_sub(1);
        for (i, param) in sig.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match param {
                Type::Slice(elem) if sig.variadic && i == last => {
                    out.push_str("...");
                    self.render_into(elem, out);
                }
                _ => self.render_into(param, out),
            }
        }
        out.push(')');
        match sig.results.as_slice() {
            [] => {}
            [single] if !matches!(single, Type::Func(_)) => {
                out.push(' ');
                self.render_into(single, out);
            }
            results => {
                out.push_str(" (");
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.render_into(result, out);
                }
                out.push(')');
            }
        }
    }
}

/// Checks that every type in `sig` can be spelled at package scope of the
/// generated file.
pub fn check_nameable(sig: &Signature) -> Result<(), GenerationError> {
    let mut result = Ok(());
    sig.walk(&mut |ty| {
        if result.is_err() {
            return;
        }
        result = match ty {
            Type::Named(NamedRef { scope: Some(_), .. }) => {
                Err(GenerationError::LocalType(ty.to_string()))
            }
            Type::Named(named @ NamedRef { origin: Origin::External(_), .. }) if !named.is_exported() => {
                Err(GenerationError::UnexportedType(ty.to_string()))
            }
            // Unexported names of another package cannot be written here.
            Type::Struct(fields) if fields.iter().any(|f| f.pkg.is_some()) => {
                Err(GenerationError::UnexportedType(ty.to_string()))
            }
            Type::Interface(iface) if iface.pkg.is_some() => {
                Err(GenerationError::UnexportedType(ty.to_string()))
            }
            Type::Untyped(_) | Type::Tuple(_) | Type::Invalid => {
                Err(GenerationError::Unrepresentable(ty.to_string()))
            }
            _ => Ok(()),
        };
    });
    result
}

/// Identifiers declared at package level across `units`.
pub fn package_scope(units: &[Unit]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for unit in units {
        for decl in &unit.file.decls {
            match decl {
                Decl::Func(func) => {
                    if func.recv.is_none() {
                        names.insert(func.name.name.clone());
                    }
                }
                Decl::Var(specs) | Decl::Const(specs) => {
                    for spec in specs {
                        names.extend(spec.names.iter().map(|n| n.name.clone()));
                    }
                }
                Decl::Type(specs) => {
                    names.extend(specs.iter().map(|s| s.name.name.clone()));
                }
            }
        }
    }
    names.remove("_");
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::types::{InterfaceType, StructField};

    fn stubs() -> StubRegistry {
        StubRegistry::new(&BTreeMap::new()).unwrap()
    }

    fn scope(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_payload_names_reserved_first() {
        let stubs = stubs();
        let mut names = NameResolver::new(&stubs, BTreeSet::new());
        assert_eq!(names.qualifier("time"), "time");
        assert_eq!(names.qualifier("log"), "log");
    }

    #[test]
    fn test_payload_clash_with_package_identifier() {
        let stubs = stubs();
        let mut names = NameResolver::new(&stubs, scope(&["log"]));
        assert_eq!(names.qualifier("log"), "_isuprof_log");
    }

    #[test]
    fn test_alias_and_default_names() {
        let stubs = stubs();
        let mut names = NameResolver::new(&stubs, BTreeSet::new());
        let mut imports = BTreeMap::new();
        imports.insert("strings".to_string(), ImportName::Alias("str".to_string()));
        imports.insert("math/rand".to_string(), ImportName::Default);
        names.enter_unit(&imports);
        assert_eq!(names.qualifier("strings"), "str");
        assert_eq!(names.qualifier("math/rand"), "rand");
        // Not imported by this unit.
        assert_eq!(names.qualifier("example.com/pkg/v2"), "pkg");
    }

    #[test]
    fn test_dot_import_gets_stable_alias() {
        let stubs = stubs();
        let mut names = NameResolver::new(&stubs, scope(&["_isuprof_strings"]));
        let mut imports = BTreeMap::new();
        imports.insert("strings".to_string(), ImportName::Dot);
        names.enter_unit(&imports);
        assert_eq!(names.qualifier("strings"), "_isuprof_strings2");

        // The first assignment sticks even where the next unit aliases it.
        imports.insert("strings".to_string(), ImportName::Alias("s".to_string()));
        names.enter_unit(&imports);
        assert_eq!(names.qualifier("strings"), "_isuprof_strings2");
    }

    #[test]
    fn test_clash_between_paths() {
        let stubs = stubs();
        let mut names = NameResolver::new(&stubs, BTreeSet::new());
        assert_eq!(names.qualifier("example.com/a/util"), "util");
        assert_eq!(names.qualifier("example.com/b/util"), "_isuprof_util");
        assert_eq!(names.qualifier("example.com/c/util"), "_isuprof_util2");
    }

    #[test]
    fn test_imports_only_used_paths() {
        let stubs = stubs();
        let mut names = NameResolver::new(&stubs, BTreeSet::new());
        names.qualifier("time");
        names.qualifier("net/http");
        assert_eq!(names.imports(), vec![("net/http", "http"), ("time", "time")]);
    }

    #[test]
    fn test_render_types() {
        let stubs = stubs();
        let mut names = NameResolver::new(&stubs, BTreeSet::new());
        let request = Type::pointer(Type::Named(NamedRef::external("net/http", "Request")));
        let handler = Type::Func(Signature::new(
            vec![Type::Named(NamedRef::external("net/http", "ResponseWriter")), request],
            vec![],
            false,
        ));
        assert_eq!(names.render(&handler), "func(http.ResponseWriter, *http.Request)");

        let sig = Signature::new(
            vec![Type::Basic(BasicKind::String), Type::slice(Type::empty_interface())],
            vec![Type::Basic(BasicKind::Int), Type::error()],
            true,
        );
        assert_eq!(names.render_signature(&sig), "(string, ...interface{}) (int, error)");

        let m = Type::map(Type::Basic(BasicKind::String), Type::Array(4, Box::new(Type::Basic(BasicKind::Uint8))));
        assert_eq!(names.render(&m), "map[string][4]uint8");
    }

    #[test]
    fn test_check_nameable() {
        let local = Type::Named(NamedRef {
            origin: Origin::Current,
            name: "point".to_string(),
            scope: Some(12),
        });
        let sig = Signature::new(vec![Type::slice(local)], vec![], false);
        assert!(matches!(check_nameable(&sig), Err(GenerationError::LocalType(_))));

        let hidden = Type::Named(NamedRef::external("example.com/x", "conn"));
        let sig = Signature::new(vec![], vec![hidden], false);
        assert!(matches!(check_nameable(&sig), Err(GenerationError::UnexportedType(_))));

        let own = Type::Named(NamedRef::current("config"));
        let sig = Signature::new(vec![own], vec![Type::error()], false);
        assert!(check_nameable(&sig).is_ok());
    }

    #[test]
    fn test_foreign_unexported_members_are_not_nameable() {
        let field = |pkg: Option<&str>| StructField {
            name: "count".to_string(),
            ty: Type::Basic(BasicKind::Int),
            embedded: false,
            tag: None,
            pkg: pkg.map(str::to_string),
        };
        let foreign = Type::Struct(vec![field(Some("example.com/stats"))]);
        let sig = Signature::new(vec![Type::pointer(foreign)], vec![], false);
        assert!(matches!(check_nameable(&sig), Err(GenerationError::UnexportedType(_))));

        let own = Type::Struct(vec![field(None)]);
        let sig = Signature::new(vec![own], vec![], false);
        assert!(check_nameable(&sig).is_ok());

        let sealed = Type::Interface(InterfaceType {
            methods: vec![("seal".to_string(), Signature::default())],
            embeds: Vec::new(),
            pkg: Some("example.com/stats".to_string()),
        });
        let sig = Signature::new(vec![], vec![sealed], false);
        assert!(matches!(check_nameable(&sig), Err(GenerationError::UnexportedType(_))));
    }

    #[test]
    fn test_unsafe_pointer_rendering() {
        let stubs = stubs();
        let mut names = NameResolver::new(&stubs, scope(&["unsafe"]));
        let ty = Type::slice(Type::Basic(BasicKind::UnsafePointer));
        assert_eq!(names.render(&ty), "[]_isuprof_unsafe.Pointer");
        assert_eq!(names.imports().last(), Some(&("unsafe", "_isuprof_unsafe")));
    }
}
