//! Declared API of packages that have no source in the processed directory.
//!
//! Stubs are TOML tables keyed by import path. The standard library subset
//! in `stdlib.toml` is embedded; a project adds or extends packages through
//! the `[packages]` table of its `isuprof.toml`.

use crate::frontend::ast::{ArrayLen, Expr, FuncType, InterfaceElem, LitKind};
use crate::frontend::parser::parse_type_source;
use crate::frontend::types::{
    BasicKind, InterfaceType, NamedInfo, NamedRef, Signature, StructField, Type, UntypedKind,
    is_exported,
};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const STDLIB: &str = include_str!("stdlib.toml");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StubFile {
    #[serde(default)]
    pub packages: BTreeMap<String, PackageStub>,
}

/// One package as written in TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageStub {
    /// Package name; defaults to the last import path element.
    pub name: Option<String>,
    #[serde(default)]
    pub funcs: BTreeMap<String, String>,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    #[serde(default)]
    pub consts: BTreeMap<String, String>,
    #[serde(default)]
    pub types: BTreeMap<String, TypeStub>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeStub {
    pub underlying: String,
    #[serde(default)]
    pub methods: BTreeMap<String, String>,
    #[serde(default)]
    pub pointer_methods: BTreeMap<String, String>,
}

/// An exported package member.
#[derive(Debug, Clone)]
pub enum Member {
    Func(Signature),
    Var(Type),
    Const(Type),
    Type(NamedRef),
}

/// Resolved API of one package.
#[derive(Debug, Clone)]
pub struct PackageApi {
    pub path: String,
    pub name: String,
    pub funcs: BTreeMap<String, Signature>,
    pub vars: BTreeMap<String, Type>,
    pub consts: BTreeMap<String, Type>,
    pub types: BTreeMap<String, NamedInfo>,
}

impl PackageApi {
    pub fn member(&self, name: &str) -> Option<Member> {
        if let Some(sig) = self.funcs.get(name) {
            return Some(Member::Func(sig.clone()));
        }
        if let Some(ty) = self.vars.get(name) {
            return Some(Member::Var(ty.clone()));
        }
        if let Some(ty) = self.consts.get(name) {
            return Some(Member::Const(ty.clone()));
        }
        if self.types.contains_key(name) {
            return Some(Member::Type(NamedRef::external(&self.path, name)));
        }
        None
    }
}

/// All known external packages, keyed by import path.
#[derive(Debug, Clone, Default)]
pub struct StubRegistry {
    packages: BTreeMap<String, PackageApi>,
}

impl StubRegistry {
    /// Builds the registry from the embedded standard library stubs merged
    /// with `extra`. Members in `extra` replace stdlib members of the same
    /// name.
    pub fn new(extra: &BTreeMap<String, PackageStub>) -> Result<Self, String> {
        let stdlib: StubFile =
            toml::from_str(STDLIB).map_err(|e| format!("invalid embedded stdlib stubs: {}", e))?;

        let mut merged = stdlib.packages;
        for (path, stub) in extra {
            let entry = merged.entry(path.clone()).or_default();
            if stub.name.is_some() {
                entry.name = stub.name.clone();
            }
            entry.funcs.extend(stub.funcs.clone());
            entry.vars.extend(stub.vars.clone());
            entry.consts.extend(stub.consts.clone());
            entry.types.extend(stub.types.clone());
        }

        let mut by_name: HashMap<String, String> = HashMap::new();
        for (path, stub) in &merged {
            let name = stub
                .name
                .clone()
                .unwrap_or_else(|| default_package_name(path).to_string());
            by_name.entry(name).or_insert_with(|| path.clone());
        }

        let mut packages = BTreeMap::new();
        for (path, stub) in &merged {
            let api = resolve_package(path, stub, &by_name)?;
            packages.insert(path.clone(), api);
        }
        Ok(Self { packages })
    }

    pub fn package(&self, path: &str) -> Option<&PackageApi> {
        self.packages.get(path)
    }

    pub fn named(&self, path: &str, name: &str) -> Option<&NamedInfo> {
        self.packages.get(path).and_then(|p| p.types.get(name))
    }

    /// The name a package declares, falling back to its import path.
    pub fn package_name<'a>(&'a self, path: &'a str) -> &'a str {
        self.packages
            .get(path)
            .map(|p| p.name.as_str())
            .unwrap_or_else(|| default_package_name(path))
    }
}

/// Last import path element, skipping a trailing major version (`/v2`).
pub fn default_package_name(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    let last = segments.next().unwrap_or(path);
    let is_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].chars().all(|c| c.is_ascii_digit());
    if is_version {
        segments.next().unwrap_or(last)
    } else {
        last
    }
}

fn resolve_package(
    path: &str,
    stub: &PackageStub,
    by_name: &HashMap<String, String>,
) -> Result<PackageApi, String> {
    let resolver = StubResolver {
        path,
        own_types: stub.types.keys().cloned().collect(),
        by_name,
    };

    let mut funcs = BTreeMap::new();
    for (name, text) in &stub.funcs {
        let sig = resolver.signature_text(text).map_err(|e| stub_error(path, name, e))?;
        funcs.insert(name.clone(), sig);
    }
    let mut vars = BTreeMap::new();
    for (name, text) in &stub.vars {
        let ty = resolver.type_text(text).map_err(|e| stub_error(path, name, e))?;
        vars.insert(name.clone(), ty);
    }
    let mut consts = BTreeMap::new();
    for (name, text) in &stub.consts {
        let ty = match untyped_kind(text) {
            Some(kind) => Type::Untyped(kind),
            None => resolver.type_text(text).map_err(|e| stub_error(path, name, e))?,
        };
        consts.insert(name.clone(), ty);
    }
    let mut types = BTreeMap::new();
    for (name, decl) in &stub.types {
        let underlying = resolver
            .type_text(&decl.underlying)
            .map_err(|e| stub_error(path, name, e))?;
        let mut info = NamedInfo::new(underlying);
        for (method, text) in &decl.methods {
            let sig = resolver
                .signature_text(text)
                .map_err(|e| stub_error(path, &format!("{}.{}", name, method), e))?;
            info.methods.insert(method.clone(), sig);
        }
        for (method, text) in &decl.pointer_methods {
            let sig = resolver
                .signature_text(text)
                .map_err(|e| stub_error(path, &format!("{}.{}", name, method), e))?;
            info.pointer_methods.insert(method.clone(), sig);
        }
        types.insert(name.clone(), info);
    }

    Ok(PackageApi {
        path: path.to_string(),
        name: stub
            .name
            .clone()
            .unwrap_or_else(|| default_package_name(path).to_string()),
        funcs,
        vars,
        consts,
        types,
    })
}

fn stub_error(path: &str, member: &str, e: String) -> String {
    format!("stub {}.{}: {}", path, member, e)
}

fn untyped_kind(text: &str) -> Option<UntypedKind> {
    let kind = match text.trim() {
        "untyped bool" => UntypedKind::Bool,
        "untyped int" => UntypedKind::Int,
        "untyped rune" => UntypedKind::Rune,
        "untyped float" => UntypedKind::Float,
        "untyped complex" => UntypedKind::Complex,
        "untyped string" => UntypedKind::String,
        _ => return None,
    };
    Some(kind)
}

/// Converts stub type expressions, resolving names relative to one package.
struct StubResolver<'a> {
    path: &'a str,
    own_types: BTreeSet<String>,
    by_name: &'a HashMap<String, String>,
}

impl StubResolver<'_> {
    fn type_text(&self, text: &str) -> Result<Type, String> {
        let expr = parse_type_source(self.path, text)?;
        self.to_type(&expr)
    }

    fn signature_text(&self, text: &str) -> Result<Signature, String> {
        match parse_type_source(self.path, text)? {
            Expr::FuncType(sig) => self.signature(&sig),
            _ => Err(format!("expected a func type, found `{}`", text)),
        }
    }

    fn signature(&self, sig: &FuncType) -> Result<Signature, String> {
        let mut params = Vec::new();
        let mut variadic = false;
        for field in &sig.params {
            let ty = match &field.ty {
                Expr::Ellipsis { elem, .. } => {
                    variadic = true;
                    Type::slice(self.to_type(elem)?)
                }
                other => self.to_type(other)?,
            };
            for _ in 0..field.names.len().max(1) {
                params.push(ty.clone());
            }
        }
        let mut results = Vec::new();
        for field in &sig.results {
            let ty = self.to_type(&field.ty)?;
            for _ in 0..field.names.len().max(1) {
                results.push(ty.clone());
            }
        }
        Ok(Signature::new(params, results, variadic))
    }

    fn to_type(&self, expr: &Expr) -> Result<Type, String> {
        match expr {
            Expr::Ident(ident) => {
                let name = ident.name.as_str();
                if self.own_types.contains(name) {
                    return Ok(Type::Named(NamedRef::external(self.path, name)));
                }
                match name {
                    "any" => Ok(Type::empty_interface()),
                    "error" => Ok(Type::error()),
                    _ => BasicKind::from_name(name)
                        .map(Type::Basic)
                        .ok_or_else(|| format!("unknown type `{}`", name)),
                }
            }
            Expr::Selector { x, sel, .. } => {
                let Expr::Ident(pkg) = x.as_ref() else {
                    return Err("invalid qualified type".to_string());
                };
                if pkg.name == "unsafe" && sel.name == "Pointer" {
                    return Ok(Type::Basic(BasicKind::UnsafePointer));
                }
                let path = self
                    .by_name
                    .get(&pkg.name)
                    .ok_or_else(|| format!("unknown package `{}`", pkg.name))?;
                Ok(Type::Named(NamedRef::external(path, &sel.name)))
            }
            Expr::Paren { x, .. } => self.to_type(x),
            Expr::Star { x, .. } => Ok(Type::pointer(self.to_type(x)?)),
            Expr::ArrayType { len, elem, .. } => {
                let elem = self.to_type(elem)?;
                match len {
                    ArrayLen::Slice => Ok(Type::slice(elem)),
                    ArrayLen::Expr(len) => match len.as_ref() {
                        Expr::BasicLit {
                            kind: LitKind::Int,
                            value,
                            ..
                        } => {
                            let n = value
                                .replace('_', "")
                                .parse::<u64>()
                                .map_err(|_| format!("invalid array length `{}`", value))?;
                            Ok(Type::Array(n, Box::new(elem)))
                        }
                        _ => Err("array length must be an integer literal".to_string()),
                    },
                    ArrayLen::Ellipsis => Err("invalid use of [...] array".to_string()),
                }
            }
            Expr::MapType { key, value, .. } => Ok(Type::map(self.to_type(key)?, self.to_type(value)?)),
            Expr::ChanType { dir, elem, .. } => Ok(Type::Chan(*dir, Box::new(self.to_type(elem)?))),
            Expr::FuncType(sig) => Ok(Type::Func(self.signature(sig)?)),
            Expr::StructType { fields, .. } => {
                let mut out = Vec::new();
                for field in fields {
                    let ty = self.to_type(&field.ty)?;
                    if field.names.is_empty() {
                        out.push(StructField {
                            pkg: self.hidden(&embedded_name(&field.ty)),
                            name: embedded_name(&field.ty),
                            ty,
                            embedded: true,
                            tag: field.tag.clone(),
                        });
                        continue;
                    }
                    for name in &field.names {
                        out.push(StructField {
                            name: name.name.clone(),
                            ty: ty.clone(),
                            embedded: false,
                            tag: field.tag.clone(),
                            pkg: self.hidden(&name.name),
                        });
                    }
                }
                Ok(Type::Struct(out))
            }
            Expr::InterfaceType { elems, .. } => {
                let mut iface = InterfaceType::default();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, sig } => {
                            if iface.pkg.is_none() {
                                iface.pkg = self.hidden(&name.name);
                            }
                            iface.methods.push((name.name.clone(), self.signature(sig)?))
                        }
                        InterfaceElem::Embedded(ty) => iface.embeds.push(self.to_type(ty)?),
                    }
                }
                iface.methods.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(Type::Interface(iface))
            }
            _ => Err("unsupported type expression".to_string()),
        }
    }

    /// This package's path when `name` is unexported.
    fn hidden(&self, name: &str) -> Option<String> {
        (!is_exported(name)).then(|| self.path.to_string())
    }
}

/// Field name of an embedded field: the type name without package or `*`.
pub fn embedded_name(ty: &Expr) -> String {
    match ty {
        Expr::Ident(ident) => ident.name.clone(),
        Expr::Selector { sel, .. } => sel.name.clone(),
        Expr::Star { x, .. } | Expr::Paren { x, .. } => embedded_name(x),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::types::Origin;

    #[test]
    fn test_default_package_name() {
        assert_eq!(default_package_name("fmt"), "fmt");
        assert_eq!(default_package_name("net/http"), "http");
        assert_eq!(default_package_name("github.com/foo/bar/v2"), "bar");
        assert_eq!(default_package_name("example.com/v"), "v");
    }

    #[test]
    fn test_stdlib_loads() {
        let registry = StubRegistry::new(&BTreeMap::new()).unwrap();
        let fmt = registry.package("fmt").unwrap();
        let Some(Member::Func(println)) = fmt.member("Println") else {
            panic!("expected fmt.Println");
        };
        assert!(println.variadic);
        assert_eq!(println.results, vec![Type::Basic(BasicKind::Int), Type::error()]);
        assert_eq!(registry.package_name("net/http"), "http");
        assert_eq!(registry.package_name("math/rand"), "rand");
    }

    #[test]
    fn test_cross_package_references() {
        let registry = StubRegistry::new(&BTreeMap::new()).unwrap();
        let bufio = registry.package("bufio").unwrap();
        let sig = &bufio.funcs["NewReader"];
        assert_eq!(
            sig.params[0],
            Type::Named(NamedRef {
                origin: Origin::External("io".to_string()),
                name: "Reader".to_string(),
                scope: None,
            })
        );
        assert_eq!(
            sig.results[0],
            Type::pointer(Type::Named(NamedRef::external("bufio", "Reader")))
        );
    }

    #[test]
    fn test_method_sets() {
        let registry = StubRegistry::new(&BTreeMap::new()).unwrap();
        let wg = registry.named("sync", "WaitGroup").unwrap();
        let (_, pointer) = wg.method("Done").unwrap();
        assert!(pointer);
        let duration = registry.named("time", "Duration").unwrap();
        assert_eq!(duration.underlying, Type::Basic(BasicKind::Int64));
        assert!(!duration.method("Seconds").unwrap().1);
    }

    #[test]
    fn test_project_stubs_extend_stdlib() {
        let extra: StubFile = toml::from_str(
            r#"
[packages."example.com/metrics"]
name = "metrics"
[packages."example.com/metrics".funcs]
Record = "func(name string, d time.Duration) error"
[packages."example.com/metrics".types.Counter]
underlying = "struct { n int64 }"
[packages."example.com/metrics".types.Counter.pointer_methods]
Inc = "func()"
[packages.fmt.funcs]
Custom = "func() Stringer"
"#,
        )
        .unwrap();
        let registry = StubRegistry::new(&extra.packages).unwrap();
        let metrics = registry.package("example.com/metrics").unwrap();
        assert_eq!(
            metrics.funcs["Record"].params[1],
            Type::Named(NamedRef::external("time", "Duration"))
        );
        assert!(registry.package("fmt").unwrap().funcs.contains_key("Custom"));
        assert!(registry.package("fmt").unwrap().funcs.contains_key("Println"));
    }

    #[test]
    fn test_unexported_members_remember_their_package() {
        let extra: StubFile = toml::from_str(
            r#"
[packages."example.com/stats".funcs]
Snapshot = "func() struct { Total int64; count int }"
Sealed = "func() interface { Name() string; seal() }"
Open = "func() interface { Name() string }"
"#,
        )
        .unwrap();
        let registry = StubRegistry::new(&extra.packages).unwrap();
        let stats = registry.package("example.com/stats").unwrap();
        let Type::Struct(fields) = &stats.funcs["Snapshot"].results[0] else {
            panic!("expected struct");
        };
        assert_eq!(fields[0].pkg, None);
        assert_eq!(fields[1].pkg.as_deref(), Some("example.com/stats"));
        let pkg_of = |name: &str| match &stats.funcs[name].results[0] {
            Type::Interface(iface) => iface.pkg.clone(),
            _ => panic!("expected interface"),
        };
        assert_eq!(pkg_of("Sealed").as_deref(), Some("example.com/stats"));
        assert_eq!(pkg_of("Open"), None);
    }

    #[test]
    fn test_embedded_stub_fields() {
        let extra: StubFile = toml::from_str(
            r#"
[packages."example.com/cache".funcs]
New = "func() *struct { sync.Mutex; hits, misses int }"
"#,
        )
        .unwrap();
        let registry = StubRegistry::new(&extra.packages).unwrap();
        let Type::Pointer(inner) = &registry.package("example.com/cache").unwrap().funcs["New"].results[0] else {
            panic!("expected pointer");
        };
        let Type::Struct(fields) = inner.as_ref() else {
            panic!("expected struct");
        };
        let names: Vec<(&str, bool)> = fields.iter().map(|f| (f.name.as_str(), f.embedded)).collect();
        assert_eq!(names, vec![("Mutex", true), ("hits", false), ("misses", false)]);
        assert_eq!(fields[0].ty, Type::Named(NamedRef::external("sync", "Mutex")));
    }

    #[test]
    fn test_invalid_stub_reports_member() {
        let extra: StubFile = toml::from_str(
            r#"
[packages.broken.funcs]
Bad = "func(x Unknown)"
"#,
        )
        .unwrap();
        let err = StubRegistry::new(&extra.packages).unwrap_err();
        assert!(err.contains("stub broken.Bad"));
        assert!(err.contains("unknown type `Unknown`"));
    }

    #[test]
    fn test_untyped_consts() {
        let registry = StubRegistry::new(&BTreeMap::new()).unwrap();
        let math = registry.package("math").unwrap();
        assert!(matches!(math.member("Pi"), Some(Member::Const(Type::Untyped(UntypedKind::Float)))));
        let time = registry.package("time").unwrap();
        assert!(matches!(time.member("Second"), Some(Member::Const(Type::Named(_)))));
    }
}
