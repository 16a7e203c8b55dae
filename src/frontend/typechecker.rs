//! Type checker for a single Go package.
//!
//! Package-level declarations of all files are collected first and resolved
//! lazily on first use, so declaration order across files does not matter.
//! Function bodies are then checked with nested scopes. Every expression
//! gets a [`TypeAndValue`] record keyed by its node id.
//!
//! Assignability is not verified: the checker only computes the types that
//! instrumentation depends on, and reports names that cannot be resolved.

// TypeError contains detailed error information, hence it's large
#![allow(clippy::result_large_err)]

use crate::frontend::ast::*;
use crate::frontend::lexer::Span;
use crate::frontend::stubs::{Member, StubRegistry, embedded_name};
use crate::frontend::types::{
    BasicKind, InterfaceType, NamedInfo, NamedRef, Origin, Signature, StructField, Type,
    UntypedKind,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::mem;

/// Maximum depth of embedded fields searched for a promoted field or method.
const MAX_EMBEDDING_DEPTH: usize = 16;

/// What kind of entity an expression denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A call of a function without results.
    NoValue,
    Value,
    Constant,
    /// The expression denotes a type.
    TypeExpr,
    /// A predeclared function such as `len`.
    Builtin,
    /// An imported package name.
    Package,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAndValue {
    pub mode: Mode,
    pub ty: Type,
}

impl TypeAndValue {
    pub fn new(mode: Mode, ty: Type) -> Self {
        Self { mode, ty }
    }

    fn invalid() -> Self {
        Self::new(Mode::Value, Type::Invalid)
    }
}

/// Results of checking a package.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    pub types: HashMap<NodeId, TypeAndValue>,
    /// Every named type the checker resolved, including external ones.
    pub named: HashMap<NamedRef, NamedInfo>,
}

impl TypeInfo {
    pub fn type_of(&self, id: NodeId) -> Option<&TypeAndValue> {
        self.types.get(&id)
    }
}

/// A type error with location information.
#[derive(Debug, Clone)]
pub struct TypeError {
    pub message: String,
    pub filename: String,
    pub span: Span,
}

impl TypeError {
    pub fn new(message: impl Into<String>, filename: &str, span: Span) -> Self {
        Self {
            message: message.into(),
            filename: filename.to_string(),
            span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
    // Functions of package `unsafe`.
    Sizeof,
    Alignof,
    Offsetof,
    Add,
    Slice,
    SliceData,
    UnsafeString,
    StringData,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "append" => Builtin::Append,
            "cap" => Builtin::Cap,
            "clear" => Builtin::Clear,
            "close" => Builtin::Close,
            "complex" => Builtin::Complex,
            "copy" => Builtin::Copy,
            "delete" => Builtin::Delete,
            "imag" => Builtin::Imag,
            "len" => Builtin::Len,
            "make" => Builtin::Make,
            "max" => Builtin::Max,
            "min" => Builtin::Min,
            "new" => Builtin::New,
            "panic" => Builtin::Panic,
            "print" => Builtin::Print,
            "println" => Builtin::Println,
            "real" => Builtin::Real,
            "recover" => Builtin::Recover,
            _ => return None,
        };
        Some(builtin)
    }

    fn from_unsafe(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "Sizeof" => Builtin::Sizeof,
            "Alignof" => Builtin::Alignof,
            "Offsetof" => Builtin::Offsetof,
            "Add" => Builtin::Add,
            "Slice" => Builtin::Slice,
            "SliceData" => Builtin::SliceData,
            "String" => Builtin::UnsafeString,
            "StringData" => Builtin::StringData,
            _ => return None,
        };
        Some(builtin)
    }
}

/// What an identifier denotes.
#[derive(Debug, Clone)]
enum Object {
    Var(Type),
    /// Constant with its integer value, when known.
    Const(Type, Option<i64>),
    TypeName(Type),
    Func(Signature),
    Builtin(Builtin),
    Package(String),
    Nil,
}

#[derive(Debug, Clone, Copy)]
enum PkgDecl<'a> {
    Func {
        unit: usize,
        decl: &'a FuncDecl,
    },
    Value {
        unit: usize,
        spec: &'a ValueSpec,
        is_const: bool,
    },
    Type {
        unit: usize,
        spec: &'a TypeSpec,
    },
}

impl PkgDecl<'_> {
    fn unit(&self) -> usize {
        match self {
            PkgDecl::Func { unit, .. } | PkgDecl::Value { unit, .. } | PkgDecl::Type { unit, .. } => {
                *unit
            }
        }
    }

    fn span(&self) -> Span {
        match self {
            PkgDecl::Func { decl, .. } => decl.name.span,
            PkgDecl::Value { spec, .. } => spec.span,
            PkgDecl::Type { spec, .. } => spec.name.span,
        }
    }
}

/// Names a file brings into scope through its imports.
struct FileScope<'a> {
    filename: &'a str,
    file: &'a File,
    imports: HashMap<String, String>,
    dots: Vec<String>,
}

/// Saved resolution context, restored after resolving a package-level
/// declaration from inside a function body.
struct Context {
    scopes: Vec<HashMap<String, Object>>,
    unit: usize,
    iota: Option<i64>,
}

pub struct TypeChecker<'a> {
    stubs: &'a StubRegistry,
    files: Vec<FileScope<'a>>,
    decls: HashMap<String, PkgDecl<'a>>,
    /// Method declarations by receiver base type name.
    methods: HashMap<String, Vec<(usize, &'a FuncDecl)>>,
    objects: HashMap<String, Object>,
    resolving: HashSet<String>,
    named_in_progress: HashSet<NamedRef>,
    checked_specs: HashSet<(usize, usize)>,
    scopes: Vec<HashMap<String, Object>>,
    unit: usize,
    iota: Option<i64>,
    info: TypeInfo,
    errors: Vec<TypeError>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(stubs: &'a StubRegistry) -> Self {
        Self {
            stubs,
            files: Vec::new(),
            decls: HashMap::new(),
            methods: HashMap::new(),
            objects: HashMap::new(),
            resolving: HashSet::new(),
            named_in_progress: HashSet::new(),
            checked_specs: HashSet::new(),
            scopes: Vec::new(),
            unit: 0,
            iota: None,
            info: TypeInfo::default(),
            errors: Vec::new(),
        }
    }

    /// Adds a file of the package. All files must be added before `check`.
    pub fn add_file(&mut self, filename: &'a str, file: &'a File) {
        let mut imports = HashMap::new();
        let mut dots = Vec::new();
        for import in &file.imports {
            match &import.name {
                ImportName::Default => {
                    let name = self.stubs.package_name(&import.path).to_string();
                    imports.insert(name, import.path.clone());
                }
                ImportName::Alias(alias) => {
                    imports.insert(alias.clone(), import.path.clone());
                }
                ImportName::Dot => dots.push(import.path.clone()),
                ImportName::Blank => {}
            }
        }
        self.files.push(FileScope {
            filename,
            file,
            imports,
            dots,
        });
    }

    /// Type check the package.
    pub fn check(mut self) -> Result<TypeInfo, Vec<TypeError>> {
        self.collect_decls();

        // Package-level values, in source order.
        for unit in 0..self.files.len() {
            self.unit = unit;
            let file = self.files[unit].file;
            for decl in &file.decls {
                match decl {
                    Decl::Var(specs) | Decl::Const(specs) => {
                        let is_const = matches!(decl, Decl::Const(_));
                        for spec in specs {
                            self.ensure_package_spec(unit, spec, is_const);
                        }
                    }
                    Decl::Type(specs) => {
                        for spec in specs {
                            if let Some(Object::TypeName(Type::Named(named))) =
                                self.package_object(&spec.name.name)
                            {
                                self.named_info(&named);
                            }
                        }
                    }
                    Decl::Func(_) => {}
                }
            }
        }

        // Function and method bodies.
        for unit in 0..self.files.len() {
            let file = self.files[unit].file;
            for decl in &file.decls {
                if let Decl::Func(func) = decl {
                    self.check_func(unit, func);
                }
            }
        }

        if self.errors.is_empty() {
            Ok(self.info)
        } else {
            Err(self.errors)
        }
    }

    fn collect_decls(&mut self) {
        for unit in 0..self.files.len() {
            self.unit = unit;
            let file = self.files[unit].file;
            for decl in &file.decls {
                match decl {
                    Decl::Func(func) => {
                        if let Some(recv) = &func.recv {
                            match receiver_base(&recv.ty) {
                                Some(base) => self
                                    .methods
                                    .entry(base.to_string())
                                    .or_default()
                                    .push((unit, func)),
                                None => self.error("invalid receiver type", recv.span),
                            }
                        } else if func.name.name != "init" && !func.name.is_blank() {
                            self.declare_package(&func.name, PkgDecl::Func { unit, decl: func });
                        }
                    }
                    Decl::Var(specs) | Decl::Const(specs) => {
                        let is_const = matches!(decl, Decl::Const(_));
                        for spec in specs {
                            for name in spec.names.iter().filter(|n| !n.is_blank()) {
                                self.declare_package(
                                    name,
                                    PkgDecl::Value {
                                        unit,
                                        spec,
                                        is_const,
                                    },
                                );
                            }
                        }
                    }
                    Decl::Type(specs) => {
                        for spec in specs {
                            self.declare_package(&spec.name, PkgDecl::Type { unit, spec });
                        }
                    }
                }
            }
        }
    }

    fn declare_package(&mut self, name: &Ident, decl: PkgDecl<'a>) {
        if self.decls.contains_key(&name.name) {
            self.error(format!("{} redeclared in this block", name.name), name.span);
            return;
        }
        self.decls.insert(name.name.clone(), decl);
    }

    fn ensure_package_spec(&mut self, unit: usize, spec: &'a ValueSpec, is_const: bool) {
        if self.checked_specs.contains(&(unit, spec.span.start)) {
            return;
        }
        match spec.names.iter().find(|n| !n.is_blank()) {
            Some(name) => {
                self.package_object(&name.name);
            }
            None => {
                let saved = self.enter_package_context(unit);
                self.checked_specs.insert((unit, spec.span.start));
                self.value_spec_objects(spec, is_const);
                self.restore_context(saved);
            }
        }
    }

    // Scopes and lookup

    fn enter_package_context(&mut self, unit: usize) -> Context {
        Context {
            scopes: mem::take(&mut self.scopes),
            unit: mem::replace(&mut self.unit, unit),
            iota: self.iota.take(),
        }
    }

    fn restore_context(&mut self, saved: Context) {
        self.scopes = saved.scopes;
        self.unit = saved.unit;
        self.iota = saved.iota;
    }

    fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, ident: &Ident, obj: Object) {
        if ident.is_blank() {
            return;
        }
        let tv = object_tv(&obj);
        self.info.types.insert(ident.id, tv);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(ident.name.clone(), obj);
        }
    }

    fn declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|s| s.contains_key(name))
    }

    fn lookup(&mut self, name: &str) -> Option<Object> {
        for scope in self.scopes.iter().rev() {
            if let Some(obj) = scope.get(name) {
                return Some(obj.clone());
            }
        }

        let file = &self.files[self.unit];
        if let Some(path) = file.imports.get(name) {
            return Some(Object::Package(path.clone()));
        }
        let dotted = file
            .dots
            .iter()
            .find_map(|path| self.stubs.package(path).and_then(|p| p.member(name)));
        if let Some(member) = dotted {
            return Some(member_object(self.flatten_member(member)));
        }

        if let Some(obj) = self.package_object(name) {
            return Some(obj);
        }

        if name == "iota" {
            if let Some(iota) = self.iota {
                return Some(Object::Const(Type::Untyped(UntypedKind::Int), Some(iota)));
            }
        }
        universe(name)
    }

    fn package_object(&mut self, name: &str) -> Option<Object> {
        if let Some(obj) = self.objects.get(name) {
            return Some(obj.clone());
        }
        let decl = self.decls.get(name).copied()?;

        if !self.resolving.insert(name.to_string()) {
            self.error(
                format!("initialization cycle or invalid recursive reference to {}", name),
                decl.span(),
            );
            return Some(Object::Var(Type::Invalid));
        }
        let saved = self.enter_package_context(decl.unit());

        match decl {
            PkgDecl::Func { decl, .. } => {
                let sig = self.signature(&decl.sig);
                self.objects.insert(name.to_string(), Object::Func(sig));
            }
            PkgDecl::Type { spec, .. } => {
                let ty = if spec.alias {
                    self.resolve_type(&spec.ty)
                } else {
                    Type::Named(NamedRef::current(name))
                };
                self.info
                    .types
                    .insert(spec.name.id, TypeAndValue::new(Mode::TypeExpr, ty.clone()));
                self.objects.insert(name.to_string(), Object::TypeName(ty));
            }
            PkgDecl::Value { unit, spec, is_const } => {
                self.checked_specs.insert((unit, spec.span.start));
                let objects = self.value_spec_objects(spec, is_const);
                for (ident, obj) in spec.names.iter().zip(objects) {
                    if ident.is_blank() {
                        continue;
                    }
                    self.info.types.insert(ident.id, object_tv(&obj));
                    self.objects.insert(ident.name.clone(), obj);
                }
            }
        }

        self.restore_context(saved);
        self.resolving.remove(name);
        self.objects.get(name).cloned()
    }

    /// Checks the values of a `var` or `const` spec and returns one object
    /// per declared name.
    fn value_spec_objects(&mut self, spec: &ValueSpec, is_const: bool) -> Vec<Object> {
        let saved_iota = self.iota;
        if is_const {
            self.iota = Some(spec.iota);
        }

        let declared = spec.ty.as_ref().map(|t| self.resolve_type(t));
        let values: Vec<(Type, Option<i64>)> = if spec.values.is_empty() {
            Vec::new()
        } else if is_const {
            spec.values
                .iter()
                .map(|v| {
                    let ty = self.expr(v).ty;
                    (ty, self.const_value(v))
                })
                .collect()
        } else {
            self.rhs_types(spec.names.len(), &spec.values)
                .into_iter()
                .map(|t| (t, None))
                .collect()
        };
        if !values.is_empty() && values.len() != spec.names.len() {
            self.error(
                format!(
                    "assignment mismatch: {} variables but {} values",
                    spec.names.len(),
                    values.len()
                ),
                spec.span,
            );
        }

        let objects = (0..spec.names.len())
            .map(|i| {
                let (value_ty, value) = values.get(i).cloned().unwrap_or((Type::Invalid, None));
                if is_const {
                    Object::Const(declared.clone().unwrap_or(value_ty), value)
                } else {
                    Object::Var(declared.clone().unwrap_or_else(|| value_ty.default_type()))
                }
            })
            .collect();

        self.iota = saved_iota;
        objects
    }

    // Named types

    fn named_info(&mut self, named: &NamedRef) -> Option<NamedInfo> {
        if let Some(info) = self.info.named.get(named) {
            return Some(info.clone());
        }
        let info = match &named.origin {
            Origin::Universe if named.name == "error" => {
                let error_method = Signature::new(vec![], vec![Type::Basic(BasicKind::String)], false);
                NamedInfo::new(Type::Interface(InterfaceType {
                    methods: vec![("Error".to_string(), error_method)],
                    ..InterfaceType::default()
                }))
            }
            Origin::Universe => return None,
            Origin::External(path) => {
                let mut info = self.stubs.named(path, &named.name)?.clone();
                // Placeholder so embedding cycles in stubs terminate.
                self.info.named.insert(named.clone(), info.clone());
                info.underlying = self.flatten_type(&info.underlying, 0);
                for methods in [&mut info.methods, &mut info.pointer_methods] {
                    for sig in methods.values_mut() {
                        *sig = self.flatten_signature(sig, 0);
                    }
                }
                info
            }
            Origin::Current if named.scope.is_some() => return None,
            Origin::Current => self.resolve_named(named)?,
        };
        self.info.named.insert(named.clone(), info.clone());
        Some(info)
    }

    fn resolve_named(&mut self, named: &NamedRef) -> Option<NamedInfo> {
        let Some(PkgDecl::Type { unit, spec }) = self.decls.get(&named.name).copied() else {
            return None;
        };
        if !self.named_in_progress.insert(named.clone()) {
            self.error(format!("invalid recursive type {}", named.name), spec.name.span);
            return Some(NamedInfo::new(Type::Invalid));
        }
        let saved = self.enter_package_context(unit);

        let declared = self.resolve_type(&spec.ty);
        let underlying = self.underlying(&declared);
        let mut info = NamedInfo::new(underlying);

        let methods = self.methods.get(&named.name).cloned().unwrap_or_default();
        for (method_unit, method) in methods {
            self.unit = method_unit;
            let sig = self.signature(&method.sig);
            let pointer = method
                .recv
                .as_ref()
                .is_some_and(|r| matches!(r.ty.unparen(), Expr::Star { .. }));
            if pointer {
                info.pointer_methods.insert(method.name.name.clone(), sig);
            } else {
                info.methods.insert(method.name.name.clone(), sig);
            }
        }

        self.restore_context(saved);
        self.named_in_progress.remove(named);
        Some(info)
    }

    fn underlying(&mut self, ty: &Type) -> Type {
        match ty {
            Type::Named(named) => self
                .named_info(named)
                .map(|info| info.underlying)
                .unwrap_or(Type::Invalid),
            other => other.clone(),
        }
    }

    /// Finds a field or method `name` of `ty`, searching embedded fields
    /// breadth-first and dereferencing pointers.
    fn lookup_member(&mut self, ty: &Type, name: &str) -> Option<Type> {
        let mut level = vec![ty.clone()];
        let mut seen: HashSet<NamedRef> = HashSet::new();

        for _ in 0..MAX_EMBEDDING_DEPTH {
            let mut next = Vec::new();
            for t in level {
                let base = match t {
                    Type::Pointer(elem) => *elem,
                    other => other,
                };
                if let Type::Named(named) = &base {
                    if !seen.insert(named.clone()) {
                        continue;
                    }
                    if let Some(info) = self.named_info(named) {
                        if let Some((sig, _)) = info.method(name) {
                            return Some(Type::Func(sig.clone()));
                        }
                    }
                }
                match self.underlying(&base) {
                    Type::Struct(fields) => {
                        if let Some(field) = fields.iter().find(|f| f.name == name) {
                            return Some(field.ty.clone());
                        }
                        next.extend(fields.into_iter().filter(|f| f.embedded).map(|f| f.ty));
                    }
                    Type::Interface(iface) => {
                        if let Some(sig) = self.interface_method(&iface, name, 0) {
                            return Some(Type::Func(sig));
                        }
                    }
                    _ => {}
                }
            }
            if next.is_empty() {
                break;
            }
            level = next;
        }
        None
    }

    fn interface_method(&mut self, iface: &InterfaceType, name: &str, depth: usize) -> Option<Signature> {
        if let Some((_, sig)) = iface.methods.iter().find(|(n, _)| n == name) {
            return Some(sig.clone());
        }
        if depth >= MAX_EMBEDDING_DEPTH {
            return None;
        }
        for embed in &iface.embeds {
            if let Type::Interface(inner) = self.underlying(embed) {
                if let Some(sig) = self.interface_method(&inner, name, depth + 1) {
                    return Some(sig);
                }
            }
        }
        None
    }

    /// Folds embedded interfaces into method sets throughout `ty`, so that
    /// interfaces with the same methods compare equal however they were
    /// written.
    fn flatten_type(&mut self, ty: &Type, depth: usize) -> Type {
        match ty {
            Type::Pointer(elem) => Type::pointer(self.flatten_type(elem, depth)),
            Type::Slice(elem) => Type::slice(self.flatten_type(elem, depth)),
            Type::Array(len, elem) => Type::Array(*len, Box::new(self.flatten_type(elem, depth))),
            Type::Chan(dir, elem) => Type::Chan(*dir, Box::new(self.flatten_type(elem, depth))),
            Type::Map(key, value) => {
                let key = self.flatten_type(key, depth);
                Type::map(key, self.flatten_type(value, depth))
            }
            Type::Func(sig) => Type::Func(self.flatten_signature(sig, depth)),
            Type::Struct(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for field in fields {
                    out.push(StructField {
                        ty: self.flatten_type(&field.ty, depth),
                        ..field.clone()
                    });
                }
                Type::Struct(out)
            }
            Type::Interface(iface) => Type::Interface(self.flatten_interface(iface, depth)),
            Type::Tuple(types) => {
                let mut out = Vec::with_capacity(types.len());
                for t in types {
                    out.push(self.flatten_type(t, depth));
                }
                Type::Tuple(out)
            }
            Type::Basic(_) | Type::Untyped(_) | Type::Named(_) | Type::Invalid => ty.clone(),
        }
    }

    fn flatten_signature(&mut self, sig: &Signature, depth: usize) -> Signature {
        let mut params = Vec::with_capacity(sig.params.len());
        for param in &sig.params {
            params.push(self.flatten_type(param, depth));
        }
        let mut results = Vec::with_capacity(sig.results.len());
        for result in &sig.results {
            results.push(self.flatten_type(result, depth));
        }
        Signature::new(params, results, sig.variadic)
    }

    fn flatten_interface(&mut self, iface: &InterfaceType, depth: usize) -> InterfaceType {
        if depth >= MAX_EMBEDDING_DEPTH {
            return iface.clone();
        }
        let mut methods = BTreeMap::new();
        let mut pkg = iface.pkg.clone();
        for embed in &iface.embeds {
            match self.underlying(embed) {
                Type::Interface(inner) => {
                    let inner = self.flatten_interface(&inner, depth + 1);
                    if pkg.is_none() {
                        pkg = inner.pkg;
                    }
                    for (name, sig) in inner.methods {
                        methods.entry(name).or_insert(sig);
                    }
                }
                // Unions and other constraint elements add no methods.
                _ => {}
            }
        }
        for (name, sig) in &iface.methods {
            let sig = self.flatten_signature(sig, depth);
            methods.insert(name.clone(), sig);
        }
        InterfaceType {
            methods: methods.into_iter().collect(),
            embeds: Vec::new(),
            pkg,
        }
    }

    // Types

    fn resolve_type(&mut self, e: &Expr) -> Type {
        let ty = match e {
            Expr::Ident(ident) => match self.lookup(&ident.name) {
                Some(Object::TypeName(ty)) => ty,
                Some(_) => {
                    self.error(format!("{} is not a type", ident.name), ident.span);
                    Type::Invalid
                }
                None => {
                    self.error(format!("undefined: {}", ident.name), ident.span);
                    Type::Invalid
                }
            },
            Expr::Selector { x, sel, span, .. } => {
                let pkg = match x.as_ref() {
                    Expr::Ident(pkg) => Some(pkg),
                    _ => None,
                };
                let object = match pkg {
                    Some(pkg) => self.lookup(&pkg.name),
                    None => None,
                };
                match (pkg, object) {
                    (Some(pkg), Some(Object::Package(path))) => {
                        self.info
                            .types
                            .insert(pkg.id, TypeAndValue::new(Mode::Package, Type::Invalid));
                        if path == "unsafe" && sel.name == "Pointer" {
                            Type::Basic(BasicKind::UnsafePointer)
                        } else {
                            match self.package_member(&path, &pkg.name, sel, *span) {
                                Some(Member::Type(named)) => Type::Named(named),
                                Some(_) => {
                                    self.error(format!("{}.{} is not a type", pkg.name, sel.name), *span);
                                    Type::Invalid
                                }
                                None => Type::Invalid,
                            }
                        }
                    }
                    _ => {
                        self.error(format!("{} is not a type", sel.name), *span);
                        Type::Invalid
                    }
                }
            }
            Expr::Paren { x, .. } => self.resolve_type(x),
            Expr::Star { x, .. } => Type::pointer(self.resolve_type(x)),
            Expr::ArrayType { len, elem, span, .. } => {
                let elem = self.resolve_type(elem);
                match len {
                    ArrayLen::Slice => Type::slice(elem),
                    ArrayLen::Expr(len) => {
                        self.expr(len);
                        match self.const_value(len) {
                            Some(n) if n >= 0 => Type::Array(n as u64, Box::new(elem)),
                            _ => {
                                self.error("array length must be a non-negative constant", *span);
                                Type::Invalid
                            }
                        }
                    }
                    ArrayLen::Ellipsis => {
                        self.error("invalid use of [...] array outside a composite literal", *span);
                        Type::Invalid
                    }
                }
            }
            Expr::MapType { key, value, .. } => {
                let key = self.resolve_type(key);
                Type::map(key, self.resolve_type(value))
            }
            Expr::ChanType { dir, elem, .. } => Type::Chan(*dir, Box::new(self.resolve_type(elem))),
            Expr::FuncType(sig) => Type::Func(self.signature(sig)),
            Expr::StructType { fields, .. } => {
                let mut out = Vec::new();
                for field in fields {
                    let ty = self.resolve_type(&field.ty);
                    if field.names.is_empty() {
                        out.push(StructField {
                            name: embedded_name(&field.ty),
                            ty,
                            embedded: true,
                            tag: field.tag.clone(),
                            pkg: None,
                        });
                        continue;
                    }
                    for name in &field.names {
                        out.push(StructField {
                            name: name.name.clone(),
                            ty: ty.clone(),
                            embedded: false,
                            tag: field.tag.clone(),
                            pkg: None,
                        });
                    }
                }
                Type::Struct(out)
            }
            Expr::InterfaceType { elems, .. } => {
                let mut iface = InterfaceType::default();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, sig } => {
                            let sig = self.signature(sig);
                            iface.methods.push((name.name.clone(), sig));
                        }
                        InterfaceElem::Embedded(ty) => {
                            let ty = self.resolve_type(ty);
                            iface.embeds.push(ty);
                        }
                    }
                }
                Type::Interface(self.flatten_interface(&iface, 0))
            }
            other => {
                self.error("expected type", other.span());
                Type::Invalid
            }
        };
        self.info
            .types
            .insert(e.id(), TypeAndValue::new(Mode::TypeExpr, ty.clone()));
        ty
    }

    fn param_type(&mut self, e: &Expr) -> Type {
        match e {
            Expr::Ellipsis { elem, .. } => Type::slice(self.resolve_type(elem)),
            other => self.resolve_type(other),
        }
    }

    fn signature(&mut self, sig: &FuncType) -> Signature {
        let mut params = Vec::new();
        let mut variadic = false;
        for (i, field) in sig.params.iter().enumerate() {
            if matches!(field.ty, Expr::Ellipsis { .. }) {
                if i + 1 != sig.params.len() || field.names.len() > 1 {
                    self.error("can only use ... with final parameter in list", field.span);
                }
                variadic = true;
            }
            let ty = self.param_type(&field.ty);
            for _ in 0..field.names.len().max(1) {
                params.push(ty.clone());
            }
        }
        let mut results = Vec::new();
        for field in &sig.results {
            let ty = self.resolve_type(&field.ty);
            for _ in 0..field.names.len().max(1) {
                results.push(ty.clone());
            }
        }
        Signature::new(params, results, variadic)
    }

    fn declare_params(&mut self, sig: &FuncType) {
        for field in sig.params.iter().chain(sig.results.iter()) {
            let ty = self.param_type(&field.ty);
            for name in &field.names {
                self.declare(name, Object::Var(ty.clone()));
            }
        }
    }

    fn package_member(&mut self, path: &str, pkg_name: &str, sel: &Ident, span: Span) -> Option<Member> {
        let Some(api) = self.stubs.package(path) else {
            self.error(
                format!("no stub for package \"{}\" (needed for {}.{})", path, pkg_name, sel.name),
                span,
            );
            return None;
        };
        let member = api.member(&sel.name);
        if member.is_none() {
            self.error(format!("undefined: {}.{}", pkg_name, sel.name), span);
        }
        member.map(|member| self.flatten_member(member))
    }

    fn flatten_member(&mut self, member: Member) -> Member {
        match member {
            Member::Func(sig) => Member::Func(self.flatten_signature(&sig, 0)),
            Member::Var(ty) => Member::Var(self.flatten_type(&ty, 0)),
            Member::Const(ty) => Member::Const(ty),
            Member::Type(named) => Member::Type(named),
        }
    }

    // Constant evaluation (integers only)

    fn const_value(&mut self, e: &Expr) -> Option<i64> {
        match e {
            Expr::BasicLit { kind, value, .. } => match kind {
                LitKind::Int => parse_int_literal(value),
                LitKind::Char => char_literal_value(value),
                _ => None,
            },
            Expr::Ident(ident) => match self.lookup(&ident.name) {
                Some(Object::Const(_, value)) => value,
                _ => None,
            },
            Expr::Paren { x, .. } => self.const_value(x),
            Expr::Unary { op, x, .. } => {
                let v = self.const_value(x)?;
                match op {
                    UnaryOp::Plus => Some(v),
                    UnaryOp::Neg => v.checked_neg(),
                    UnaryOp::Xor => Some(!v),
                    _ => None,
                }
            }
            Expr::Binary { op, left, right, .. } => {
                let l = self.const_value(left)?;
                let r = self.const_value(right)?;
                match op {
                    BinaryOp::Add => l.checked_add(r),
                    BinaryOp::Sub => l.checked_sub(r),
                    BinaryOp::Mul => l.checked_mul(r),
                    BinaryOp::Div => l.checked_div(r),
                    BinaryOp::Rem => l.checked_rem(r),
                    BinaryOp::Shl => u32::try_from(r).ok().and_then(|r| l.checked_shl(r)),
                    BinaryOp::Shr => u32::try_from(r).ok().and_then(|r| l.checked_shr(r)),
                    BinaryOp::BitAnd => Some(l & r),
                    BinaryOp::BitOr => Some(l | r),
                    BinaryOp::BitXor => Some(l ^ r),
                    BinaryOp::AndNot => Some(l & !r),
                    _ => None,
                }
            }
            // Conversions such as `Weekday(3)` keep the value.
            Expr::Call(call) if call.args.len() == 1 => {
                match self.info.types.get(&call.callee.id()).map(|tv| tv.mode) {
                    Some(Mode::TypeExpr) => self.const_value(&call.args[0]),
                    Some(Mode::Builtin) => self.array_length(call),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Value of `len(a)` or `cap(a)` when `a` is an array or a pointer to one.
    fn array_length(&mut self, call: &CallExpr) -> Option<i64> {
        let Expr::Ident(ident) = call.callee.unparen() else {
            return None;
        };
        if !matches!(
            self.lookup(&ident.name),
            Some(Object::Builtin(Builtin::Len | Builtin::Cap))
        ) {
            return None;
        }
        let ty = self.info.types.get(&call.args[0].id()).map(|tv| tv.ty.clone())?;
        let ty = match self.underlying(&ty) {
            Type::Pointer(elem) => self.underlying(&elem),
            other => other,
        };
        match ty {
            Type::Array(n, _) => i64::try_from(n).ok(),
            _ => None,
        }
    }

    // Functions and statements

    fn check_func(&mut self, unit: usize, func: &FuncDecl) {
        let Some(body) = &func.body else {
            return;
        };
        self.unit = unit;
        self.scopes = vec![HashMap::new()];
        if let Some(recv) = &func.recv {
            let ty = self.resolve_type(&recv.ty);
            for name in &recv.names {
                self.declare(name, Object::Var(ty.clone()));
            }
        }
        self.declare_params(&func.sig);
        self.stmts(&body.stmts);
        self.scopes.clear();
    }

    fn block(&mut self, block: &Block) {
        self.enter_scope();
        self.stmts(&block.stmts);
        self.exit_scope();
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr { expr, .. } => {
                self.expr(expr);
            }
            Stmt::Send { chan, value, .. } => {
                self.expr(chan);
                self.expr(value);
            }
            Stmt::IncDec { x, .. } => {
                self.expr(x);
            }
            Stmt::Assign { lhs, op, rhs, span } => self.assign(lhs, *op, rhs, *span),
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => {
                self.expr(call);
            }
            Stmt::Return { results, .. } => {
                for result in results {
                    self.expr(result);
                }
            }
            Stmt::Branch { .. } | Stmt::Empty { .. } => {}
            Stmt::Block(block) => self.block(block),
            Stmt::If {
                init,
                cond,
                then_block,
                else_stmt,
                ..
            } => {
                self.enter_scope();
                if let Some(init) = init {
                    self.stmt(init);
                }
                self.expr(cond);
                self.block(then_block);
                if let Some(else_stmt) = else_stmt {
                    self.stmt(else_stmt);
                }
                self.exit_scope();
            }
            Stmt::Switch {
                init, tag, clauses, ..
            } => {
                self.enter_scope();
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(tag) = tag {
                    self.expr(tag);
                }
                for clause in clauses {
                    for e in &clause.exprs {
                        self.expr(e);
                    }
                    self.enter_scope();
                    self.stmts(&clause.body);
                    self.exit_scope();
                }
                self.exit_scope();
            }
            Stmt::TypeSwitch {
                init,
                binding,
                subject,
                clauses,
                ..
            } => self.type_switch(init.as_deref(), binding.as_ref(), subject, clauses),
            Stmt::Select { clauses, .. } => {
                for clause in clauses {
                    self.enter_scope();
                    if let Some(comm) = &clause.comm {
                        self.stmt(comm);
                    }
                    self.stmts(&clause.body);
                    self.exit_scope();
                }
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
                ..
            } => {
                self.enter_scope();
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(cond) = cond {
                    self.expr(cond);
                }
                if let Some(post) = post {
                    self.stmt(post);
                }
                self.block(body);
                self.exit_scope();
            }
            Stmt::Range {
                key,
                value,
                define,
                x,
                body,
                span,
            } => {
                let xt = self.expr(x);
                let (key_ty, value_ty) = self.range_types(&xt.ty, *span);
                self.enter_scope();
                for (var, ty) in [(key, key_ty), (value, value_ty)] {
                    let Some(var) = var else {
                        continue;
                    };
                    match (*define, var) {
                        (true, Expr::Ident(ident)) => self.declare(ident, Object::Var(ty.default_type())),
                        (true, other) => self.error("non-name on left side of :=", other.span()),
                        (false, Expr::Ident(ident)) if ident.is_blank() => {}
                        (false, other) => {
                            self.expr(other);
                        }
                    }
                }
                self.block(body);
                self.exit_scope();
            }
            Stmt::Labeled { stmt, .. } => self.stmt(stmt),
            Stmt::Decl(decl) => self.local_decl(decl),
        }
    }

    fn assign(&mut self, lhs: &[Expr], op: AssignOp, rhs: &[Expr], span: Span) {
        if op != AssignOp::Define {
            for l in lhs {
                match l {
                    Expr::Ident(ident) if ident.is_blank() => {
                        self.info.types.insert(ident.id, TypeAndValue::invalid());
                    }
                    other => {
                        self.expr(other);
                    }
                }
            }
            for r in rhs {
                self.expr(r);
            }
            return;
        }

        let types = self.rhs_types(lhs.len(), rhs);
        if types.len() != lhs.len() {
            self.error(
                format!(
                    "assignment mismatch: {} variables but {} values",
                    lhs.len(),
                    types.len()
                ),
                span,
            );
        }
        for (i, l) in lhs.iter().enumerate() {
            let Expr::Ident(ident) = l else {
                self.error("non-name on left side of :=", l.span());
                continue;
            };
            if ident.is_blank() {
                continue;
            }
            if self.declared_in_current_scope(&ident.name) {
                self.expr(l);
            } else {
                let ty = types.get(i).cloned().unwrap_or(Type::Invalid);
                self.declare(ident, Object::Var(ty.default_type()));
            }
        }
    }

    /// Types produced by the right-hand side of an assignment to `count`
    /// variables, unpacking multi-value calls and comma-ok forms.
    fn rhs_types(&mut self, count: usize, rhs: &[Expr]) -> Vec<Type> {
        if rhs.len() == 1 && count > 1 {
            let e = &rhs[0];
            let tv = self.expr(e);
            return match tv.ty {
                Type::Tuple(types) => types,
                ty if count == 2 && is_comma_ok_form(e) => vec![ty, Type::Untyped(UntypedKind::Bool)],
                ty => vec![ty],
            };
        }
        rhs.iter().map(|e| self.expr(e).ty).collect()
    }

    fn range_types(&mut self, ty: &Type, span: Span) -> (Type, Type) {
        let int = Type::Basic(BasicKind::Int);
        match self.underlying(ty) {
            Type::Basic(BasicKind::String) | Type::Untyped(UntypedKind::String) => {
                (int, Type::Basic(BasicKind::Int32))
            }
            Type::Slice(elem) | Type::Array(_, elem) => (int, *elem),
            Type::Pointer(inner) => match self.underlying(&inner) {
                Type::Array(_, elem) => (int, *elem),
                other => {
                    self.error(format!("cannot range over {}", Type::pointer(other)), span);
                    (Type::Invalid, Type::Invalid)
                }
            },
            Type::Map(key, value) => (*key, *value),
            Type::Chan(_, elem) => (*elem, Type::Invalid),
            Type::Basic(kind) if kind.is_integer() => (ty.clone(), Type::Invalid),
            Type::Untyped(UntypedKind::Int) | Type::Untyped(UntypedKind::Rune) => (int, Type::Invalid),
            Type::Func(sig) => match sig.params.first().map(|p| self.underlying(p)) {
                Some(Type::Func(yield_sig)) => {
                    let mut params = yield_sig.params.into_iter();
                    (
                        params.next().unwrap_or(Type::Invalid),
                        params.next().unwrap_or(Type::Invalid),
                    )
                }
                _ => {
                    self.error(format!("cannot range over {}", ty), span);
                    (Type::Invalid, Type::Invalid)
                }
            },
            Type::Invalid => (Type::Invalid, Type::Invalid),
            _ => {
                self.error(format!("cannot range over {}", ty), span);
                (Type::Invalid, Type::Invalid)
            }
        }
    }

    fn type_switch(
        &mut self,
        init: Option<&Stmt>,
        binding: Option<&Ident>,
        subject: &Expr,
        clauses: &[CaseClause],
    ) {
        self.enter_scope();
        if let Some(init) = init {
            self.stmt(init);
        }
        let subject_ty = match subject {
            Expr::TypeAssert { id, x, .. } => {
                let ty = self.expr(x).ty;
                self.info
                    .types
                    .insert(*id, TypeAndValue::new(Mode::Value, ty.clone()));
                ty
            }
            other => self.expr(other).ty,
        };

        for clause in clauses {
            let mut case_types = Vec::new();
            for e in &clause.exprs {
                match e {
                    Expr::Ident(ident) if ident.name == "nil" => {
                        let nil = Type::Untyped(UntypedKind::Nil);
                        self.info
                            .types
                            .insert(ident.id, TypeAndValue::new(Mode::Value, nil.clone()));
                        case_types.push(nil);
                    }
                    other => {
                        let ty = self.resolve_type(other);
                        case_types.push(ty);
                    }
                }
            }
            self.enter_scope();
            if let Some(binding) = binding {
                let ty = match case_types.as_slice() {
                    [single] if !single.is_untyped() => single.clone(),
                    _ => subject_ty.clone(),
                };
                self.declare(binding, Object::Var(ty));
            }
            self.stmts(&clause.body);
            self.exit_scope();
        }
        self.exit_scope();
    }

    fn local_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(specs) | Decl::Const(specs) => {
                let is_const = matches!(decl, Decl::Const(_));
                for spec in specs {
                    let objects = self.value_spec_objects(spec, is_const);
                    for (ident, obj) in spec.names.iter().zip(objects) {
                        self.declare(ident, obj);
                    }
                }
            }
            Decl::Type(specs) => {
                for spec in specs {
                    if spec.alias {
                        let ty = self.resolve_type(&spec.ty);
                        self.declare(&spec.name, Object::TypeName(ty));
                        continue;
                    }
                    let named = NamedRef {
                        origin: Origin::Current,
                        name: spec.name.name.clone(),
                        scope: Some(spec.name.id),
                    };
                    self.declare(&spec.name, Object::TypeName(Type::Named(named.clone())));
                    let declared = self.resolve_type(&spec.ty);
                    let underlying = self.underlying(&declared);
                    self.info.named.insert(named, NamedInfo::new(underlying));
                }
            }
            Decl::Func(func) => self.error("function declaration inside function", func.span),
        }
    }

    // Expressions

    fn expr(&mut self, e: &Expr) -> TypeAndValue {
        self.expr_hint(e, None)
    }

    /// Checks `e`; `hint` is the type an elided composite literal takes.
    fn expr_hint(&mut self, e: &Expr, hint: Option<&Type>) -> TypeAndValue {
        let tv = match e {
            Expr::Ident(ident) => self.ident(ident),
            Expr::BasicLit { kind, .. } => {
                let kind = match kind {
                    LitKind::Int => UntypedKind::Int,
                    LitKind::Float => UntypedKind::Float,
                    LitKind::Imag => UntypedKind::Complex,
                    LitKind::Char => UntypedKind::Rune,
                    LitKind::String => UntypedKind::String,
                };
                TypeAndValue::new(Mode::Constant, Type::Untyped(kind))
            }
            Expr::CompositeLit { ty, elts, span, .. } => {
                self.composite_lit(ty.as_deref(), elts, hint, *span)
            }
            Expr::FuncLit { sig, body, .. } => {
                let signature = self.signature(sig);
                self.enter_scope();
                self.declare_params(sig);
                self.stmts(&body.stmts);
                self.exit_scope();
                TypeAndValue::new(Mode::Value, Type::Func(signature))
            }
            Expr::Paren { x, .. } => self.expr_hint(x, hint),
            Expr::Selector { x, sel, span, .. } => self.selector(x, sel, *span),
            Expr::Index { x, index, span, .. } => {
                let xt = self.expr(x);
                self.expr(index);
                if xt.mode == Mode::TypeExpr {
                    self.error("generic type instantiation is not supported", *span);
                    return self.record(e, TypeAndValue::invalid());
                }
                let ty = match self.underlying(&xt.ty) {
                    Type::Basic(BasicKind::String) | Type::Untyped(UntypedKind::String) => {
                        Type::Basic(BasicKind::Uint8)
                    }
                    Type::Slice(elem) | Type::Array(_, elem) => *elem,
                    Type::Pointer(inner) => match self.underlying(&inner) {
                        Type::Array(_, elem) => *elem,
                        _ => self.invalid_op(format!("cannot index {}", xt.ty), *span),
                    },
                    Type::Map(_, value) => *value,
                    Type::Invalid => Type::Invalid,
                    _ => self.invalid_op(format!("cannot index {}", xt.ty), *span),
                };
                TypeAndValue::new(Mode::Value, ty)
            }
            Expr::Slice {
                x, lo, hi, max, span, ..
            } => {
                let xt = self.expr(x);
                for bound in [lo, hi, max].into_iter().flatten() {
                    self.expr(bound);
                }
                let ty = match self.underlying(&xt.ty) {
                    Type::Untyped(UntypedKind::String) => Type::Basic(BasicKind::String),
                    Type::Basic(BasicKind::String) | Type::Slice(_) => xt.ty.clone(),
                    Type::Array(_, elem) => Type::Slice(elem),
                    Type::Pointer(inner) => match self.underlying(&inner) {
                        Type::Array(_, elem) => Type::Slice(elem),
                        _ => self.invalid_op(format!("cannot slice {}", xt.ty), *span),
                    },
                    Type::Invalid => Type::Invalid,
                    _ => self.invalid_op(format!("cannot slice {}", xt.ty), *span),
                };
                TypeAndValue::new(Mode::Value, ty)
            }
            Expr::TypeAssert { x, ty, .. } => {
                let xt = self.expr(x);
                match ty {
                    Some(ty) => TypeAndValue::new(Mode::Value, self.resolve_type(ty)),
                    None => TypeAndValue::new(Mode::Value, xt.ty),
                }
            }
            Expr::Call(call) => self.call(call),
            Expr::Star { x, span, .. } => {
                let xt = self.expr(x);
                if xt.mode == Mode::TypeExpr {
                    TypeAndValue::new(Mode::TypeExpr, Type::pointer(xt.ty))
                } else {
                    let ty = match self.underlying(&xt.ty) {
                        Type::Pointer(elem) => *elem,
                        Type::Invalid => Type::Invalid,
                        _ => self.invalid_op(format!("invalid indirect of {}", xt.ty), *span),
                    };
                    TypeAndValue::new(Mode::Value, ty)
                }
            }
            Expr::Unary { op, x, span, .. } => {
                let xt = self.expr(x);
                match op {
                    UnaryOp::Addr => TypeAndValue::new(Mode::Value, Type::pointer(xt.ty)),
                    UnaryOp::Recv => {
                        let ty = match self.underlying(&xt.ty) {
                            Type::Chan(_, elem) => *elem,
                            Type::Invalid => Type::Invalid,
                            _ => self.invalid_op(format!("cannot receive from {}", xt.ty), *span),
                        };
                        TypeAndValue::new(Mode::Value, ty)
                    }
                    _ => xt,
                }
            }
            Expr::Binary { op, left, right, .. } => {
                let l = self.expr(left);
                let r = self.expr(right);
                let mode = if l.mode == Mode::Constant && r.mode == Mode::Constant {
                    Mode::Constant
                } else {
                    Mode::Value
                };
                let ty = if op.is_comparison() {
                    Type::Untyped(UntypedKind::Bool)
                } else if op.is_shift() {
                    l.ty
                } else {
                    match (l.ty, r.ty) {
                        (Type::Untyped(a), Type::Untyped(b)) => {
                            Type::Untyped(if b.rank() > a.rank() { b } else { a })
                        }
                        (Type::Untyped(_), typed) => typed,
                        (typed, _) => typed,
                    }
                };
                TypeAndValue::new(mode, ty)
            }
            Expr::KeyValue { span, .. } => {
                self.error("unexpected key:value expression", *span);
                TypeAndValue::invalid()
            }
            Expr::Ellipsis { span, .. } => {
                self.error("invalid use of ...", *span);
                TypeAndValue::invalid()
            }
            Expr::ArrayType { .. }
            | Expr::MapType { .. }
            | Expr::ChanType { .. }
            | Expr::FuncType(_)
            | Expr::StructType { .. }
            | Expr::InterfaceType { .. } => TypeAndValue::new(Mode::TypeExpr, self.resolve_type(e)),
        };
        self.record(e, tv)
    }

    fn record(&mut self, e: &Expr, tv: TypeAndValue) -> TypeAndValue {
        self.info.types.insert(e.id(), tv.clone());
        tv
    }

    fn invalid_op(&mut self, message: String, span: Span) -> Type {
        self.error(message, span);
        Type::Invalid
    }

    fn ident(&mut self, ident: &Ident) -> TypeAndValue {
        if ident.is_blank() {
            self.error("cannot use _ as value", ident.span);
            return TypeAndValue::invalid();
        }
        match self.lookup(&ident.name) {
            Some(obj) => object_tv(&obj),
            None => {
                self.error(format!("undefined: {}", ident.name), ident.span);
                TypeAndValue::invalid()
            }
        }
    }

    fn selector(&mut self, x: &Expr, sel: &Ident, span: Span) -> TypeAndValue {
        if let Expr::Ident(pkg) = x {
            if let Some(Object::Package(path)) = self.lookup(&pkg.name) {
                self.info
                    .types
                    .insert(pkg.id, TypeAndValue::new(Mode::Package, Type::Invalid));
                if path == "unsafe" && sel.name == "Pointer" {
                    return TypeAndValue::new(Mode::TypeExpr, Type::Basic(BasicKind::UnsafePointer));
                }
                if path == "unsafe" && Builtin::from_unsafe(&sel.name).is_some() {
                    return TypeAndValue::new(Mode::Builtin, Type::Invalid);
                }
                return match self.package_member(&path, &pkg.name, sel, span) {
                    Some(member) => object_tv(&member_object(member)),
                    None => TypeAndValue::invalid(),
                };
            }
        }

        let xt = self.expr(x);
        match xt.mode {
            Mode::Package | Mode::Builtin => {
                self.error(format!("invalid selector {}", sel.name), span);
                TypeAndValue::invalid()
            }
            // Method expression: `T.Method` takes the receiver first.
            Mode::TypeExpr => match self.lookup_member(&xt.ty, &sel.name) {
                Some(Type::Func(sig)) => {
                    let mut params = vec![xt.ty.clone()];
                    params.extend(sig.params);
                    TypeAndValue::new(
                        Mode::Value,
                        Type::Func(Signature::new(params, sig.results, sig.variadic)),
                    )
                }
                _ => {
                    self.error(format!("{}.{} undefined (type has no method {})", xt.ty, sel.name, sel.name), span);
                    TypeAndValue::invalid()
                }
            },
            _ if xt.ty.is_invalid() => TypeAndValue::invalid(),
            _ => match self.lookup_member(&xt.ty, &sel.name) {
                Some(ty) => TypeAndValue::new(Mode::Value, ty),
                None => {
                    self.error(
                        format!(
                            "{} undefined (type {} has no field or method {})",
                            sel.name, xt.ty, sel.name
                        ),
                        span,
                    );
                    TypeAndValue::invalid()
                }
            },
        }
    }

    fn composite_lit(
        &mut self,
        ty: Option<&Expr>,
        elts: &[Expr],
        hint: Option<&Type>,
        span: Span,
    ) -> TypeAndValue {
        let lit_ty = match ty {
            Some(Expr::ArrayType {
                id,
                len: ArrayLen::Ellipsis,
                elem,
                ..
            }) => {
                let elem = self.resolve_type(elem);
                let ty = Type::Array(elts.len() as u64, Box::new(elem));
                self.info
                    .types
                    .insert(*id, TypeAndValue::new(Mode::TypeExpr, ty.clone()));
                ty
            }
            Some(ty) => self.resolve_type(ty),
            None => match hint {
                Some(hint) => hint.clone(),
                None => {
                    self.error("invalid composite literal type: missing type", span);
                    Type::Invalid
                }
            },
        };

        // An elided `&T{...}` inside a literal of pointers.
        let base = match (&lit_ty, ty) {
            (Type::Pointer(inner), None) => (**inner).clone(),
            _ => lit_ty.clone(),
        };

        match self.underlying(&base) {
            Type::Struct(fields) => {
                for (i, elt) in elts.iter().enumerate() {
                    match elt {
                        Expr::KeyValue { key, value, .. } => {
                            let field_ty = match key.as_ref() {
                                Expr::Ident(name) => fields.iter().find(|f| f.name == name.name).map(|f| f.ty.clone()),
                                _ => None,
                            };
                            if field_ty.is_none() {
                                self.error("unknown field in struct literal", key.span());
                            }
                            self.expr_hint(value, field_ty.as_ref());
                        }
                        other => {
                            let field_ty = fields.get(i).map(|f| f.ty.clone());
                            self.expr_hint(other, field_ty.as_ref());
                        }
                    }
                }
            }
            Type::Array(_, elem) | Type::Slice(elem) => {
                for elt in elts {
                    match elt {
                        Expr::KeyValue { key, value, .. } => {
                            self.expr(key);
                            self.expr_hint(value, Some(elem.as_ref()));
                        }
                        other => {
                            self.expr_hint(other, Some(elem.as_ref()));
                        }
                    }
                }
            }
            Type::Map(key_ty, value_ty) => {
                for elt in elts {
                    match elt {
                        Expr::KeyValue { key, value, .. } => {
                            self.expr_hint(key, Some(key_ty.as_ref()));
                            self.expr_hint(value, Some(value_ty.as_ref()));
                        }
                        other => {
                            self.error("missing key in map literal", other.span());
                        }
                    }
                }
            }
            Type::Invalid => {}
            other => {
                self.error(format!("invalid composite literal type {}", other), span);
            }
        }
        TypeAndValue::new(Mode::Value, lit_ty)
    }

    fn call(&mut self, call: &CallExpr) -> TypeAndValue {
        let callee = self.expr(&call.callee);
        match callee.mode {
            Mode::TypeExpr => {
                if call.args.len() != 1 {
                    self.error(format!("wrong argument count in conversion to {}", callee.ty), call.span);
                }
                for arg in &call.args {
                    self.expr(arg);
                }
                TypeAndValue::new(Mode::Value, callee.ty)
            }
            Mode::Builtin => self.builtin_call(call),
            Mode::Package => {
                self.error("use of package without selector", call.callee.span());
                TypeAndValue::invalid()
            }
            _ => {
                for arg in &call.args {
                    self.expr(arg);
                }
                match self.underlying(&callee.ty) {
                    Type::Func(sig) if sig.results.is_empty() => {
                        TypeAndValue::new(Mode::NoValue, Type::Tuple(Vec::new()))
                    }
                    Type::Func(sig) => TypeAndValue::new(Mode::Value, sig.result_type()),
                    Type::Invalid => TypeAndValue::invalid(),
                    other => {
                        self.error(
                            format!("invalid operation: cannot call non-function (type {})", other),
                            call.span,
                        );
                        TypeAndValue::invalid()
                    }
                }
            }
        }
    }

    fn builtin_call(&mut self, call: &CallExpr) -> TypeAndValue {
        let builtin = match call.callee.unparen() {
            Expr::Ident(ident) => match self.lookup(&ident.name) {
                Some(Object::Builtin(builtin)) => Some(builtin),
                _ => None,
            },
            Expr::Selector { x, sel, .. } => match x.as_ref() {
                Expr::Ident(pkg) => match self.lookup(&pkg.name) {
                    Some(Object::Package(path)) if path == "unsafe" => Builtin::from_unsafe(&sel.name),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };
        let args: Vec<TypeAndValue> = call.args.iter().map(|arg| self.expr(arg)).collect();
        let first = args.first().map(|a| a.ty.clone()).unwrap_or(Type::Invalid);
        let no_value = TypeAndValue::new(Mode::NoValue, Type::Tuple(Vec::new()));

        let Some(builtin) = builtin else {
            return TypeAndValue::invalid();
        };
        match builtin {
            Builtin::Append | Builtin::Make => TypeAndValue::new(Mode::Value, first),
            Builtin::Cap | Builtin::Len | Builtin::Copy => {
                TypeAndValue::new(Mode::Value, Type::Basic(BasicKind::Int))
            }
            Builtin::Clear
            | Builtin::Close
            | Builtin::Delete
            | Builtin::Panic
            | Builtin::Print
            | Builtin::Println => no_value,
            Builtin::Complex => TypeAndValue::new(Mode::Value, Type::Basic(BasicKind::Complex128)),
            Builtin::Real | Builtin::Imag => TypeAndValue::new(Mode::Value, Type::Basic(BasicKind::Float64)),
            Builtin::New => TypeAndValue::new(Mode::Value, Type::pointer(first)),
            Builtin::Max | Builtin::Min => {
                let typed = args.iter().find(|a| !a.ty.is_untyped()).map(|a| a.ty.clone());
                let mode = if args.iter().all(|a| a.mode == Mode::Constant) {
                    Mode::Constant
                } else {
                    Mode::Value
                };
                TypeAndValue::new(mode, typed.unwrap_or(first))
            }
            Builtin::Recover => TypeAndValue::new(Mode::Value, Type::empty_interface()),
            Builtin::Sizeof | Builtin::Alignof | Builtin::Offsetof => {
                TypeAndValue::new(Mode::Constant, Type::Basic(BasicKind::Uintptr))
            }
            Builtin::Add => TypeAndValue::new(Mode::Value, Type::Basic(BasicKind::UnsafePointer)),
            Builtin::Slice => match first {
                Type::Pointer(elem) => TypeAndValue::new(Mode::Value, Type::Slice(elem)),
                _ => TypeAndValue::invalid(),
            },
            Builtin::SliceData => match self.underlying(&first) {
                Type::Slice(elem) => TypeAndValue::new(Mode::Value, Type::Pointer(elem)),
                _ => TypeAndValue::invalid(),
            },
            Builtin::UnsafeString => TypeAndValue::new(Mode::Value, Type::Basic(BasicKind::String)),
            Builtin::StringData => {
                TypeAndValue::new(Mode::Value, Type::pointer(Type::Basic(BasicKind::Uint8)))
            }
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        let filename = self.files.get(self.unit).map(|f| f.filename).unwrap_or("");
        self.errors.push(TypeError::new(message, filename, span));
    }
}

fn object_tv(obj: &Object) -> TypeAndValue {
    match obj {
        Object::Var(ty) => TypeAndValue::new(Mode::Value, ty.clone()),
        Object::Const(ty, _) => TypeAndValue::new(Mode::Constant, ty.clone()),
        Object::TypeName(ty) => TypeAndValue::new(Mode::TypeExpr, ty.clone()),
        Object::Func(sig) => TypeAndValue::new(Mode::Value, Type::Func(sig.clone())),
        Object::Builtin(_) => TypeAndValue::new(Mode::Builtin, Type::Invalid),
        Object::Package(_) => TypeAndValue::new(Mode::Package, Type::Invalid),
        Object::Nil => TypeAndValue::new(Mode::Value, Type::Untyped(UntypedKind::Nil)),
    }
}

fn member_object(member: Member) -> Object {
    match member {
        Member::Func(sig) => Object::Func(sig),
        Member::Var(ty) => Object::Var(ty),
        Member::Const(ty) => Object::Const(ty, None),
        Member::Type(named) => Object::TypeName(Type::Named(named)),
    }
}

fn universe(name: &str) -> Option<Object> {
    if let Some(kind) = BasicKind::from_name(name) {
        return Some(Object::TypeName(Type::Basic(kind)));
    }
    if let Some(builtin) = Builtin::from_name(name) {
        return Some(Object::Builtin(builtin));
    }
    let obj = match name {
        "error" => Object::TypeName(Type::error()),
        "any" | "comparable" => Object::TypeName(Type::empty_interface()),
        "true" | "false" => Object::Const(Type::Untyped(UntypedKind::Bool), None),
        "nil" => Object::Nil,
        _ => return None,
    };
    Some(obj)
}

/// Base type name of a method receiver: `T` in `t T` or `t *T`.
fn receiver_base(ty: &Expr) -> Option<&str> {
    match ty.unparen() {
        Expr::Ident(ident) => Some(&ident.name),
        Expr::Star { x, .. } => match x.unparen() {
            Expr::Ident(ident) => Some(&ident.name),
            _ => None,
        },
        _ => None,
    }
}

fn is_comma_ok_form(e: &Expr) -> bool {
    matches!(
        e.unparen(),
        Expr::Index { .. }
            | Expr::TypeAssert { ty: Some(_), .. }
            | Expr::Unary {
                op: UnaryOp::Recv,
                ..
            }
    )
}

/// Value of a rune literal such as `'a'`, `'\n'` or `'\u00e9'`.
fn char_literal_value(literal: &str) -> Option<i64> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let Some(escape) = inner.strip_prefix('\\') else {
        return inner.chars().next().map(|c| c as i64);
    };
    let mut chars = escape.chars();
    let value = match chars.next()? {
        'a' => 7,
        'b' => 8,
        'f' => 12,
        'n' => 10,
        'r' => 13,
        't' => 9,
        'v' => 11,
        '\\' => 92,
        '\'' => 39,
        '"' => 34,
        'x' | 'u' | 'U' => i64::from_str_radix(chars.as_str(), 16).ok()?,
        digit if digit.is_digit(8) => i64::from_str_radix(escape, 8).ok()?,
        _ => return None,
    };
    Some(value)
}

fn parse_int_literal(text: &str) -> Option<i64> {
    let text = text.replace('_', "");
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        i64::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use crate::frontend::visit::{expr_children, file_roots};
    use std::collections::BTreeMap;

    fn parse(source: &str) -> File {
        let mut lexer = Lexer::new("main.go", source);
        let tokens = lexer.scan_tokens().unwrap();
        let mut parser = Parser::new("main.go", tokens, 0);
        parser.parse_file().unwrap()
    }

    fn check(file: &File) -> Result<TypeInfo, Vec<TypeError>> {
        let stubs = StubRegistry::new(&BTreeMap::new()).unwrap();
        let mut checker = TypeChecker::new(&stubs);
        checker.add_file("main.go", file);
        checker.check()
    }

    /// All call expressions of `file` in source order, outermost first.
    fn calls(file: &File) -> Vec<&CallExpr> {
        fn collect<'a>(e: &'a Expr, out: &mut Vec<&'a CallExpr>) {
            if let Expr::Call(call) = e {
                out.push(call);
            }
            expr_children(e, &mut |child| collect(child, out));
        }
        let mut out = Vec::new();
        file_roots(file, &mut |e| collect(e, &mut out));
        out
    }

    fn callee_tv<'a>(info: &'a TypeInfo, call: &CallExpr) -> &'a TypeAndValue {
        info.type_of(call.callee.id()).unwrap()
    }

    #[test]
    fn test_function_call_records_signature() {
        let file = parse(
            "package main\n\nfunc add(a, b int) int { return a + b }\n\nfunc main() {\n\tx := add(1, 2)\n\t_ = x\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        let tv = callee_tv(&info, calls[0]);
        assert_eq!(tv.mode, Mode::Value);
        let int = Type::Basic(BasicKind::Int);
        assert_eq!(tv.ty, Type::Func(Signature::new(vec![int.clone(), int.clone()], vec![int], false)));
    }

    #[test]
    fn test_conversion_and_builtin_modes() {
        let file = parse(
            "package main\n\ntype MyInt int\n\nfunc main() {\n\ts := []int{1}\n\t_ = len(s)\n\t_ = MyInt(3)\n\t_ = []byte(\"x\")\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        assert_eq!(callee_tv(&info, calls[0]).mode, Mode::Builtin);
        assert_eq!(callee_tv(&info, calls[1]).mode, Mode::TypeExpr);
        assert_eq!(callee_tv(&info, calls[2]).mode, Mode::TypeExpr);
        assert_eq!(
            info.type_of(calls[1].id).unwrap().ty,
            Type::Named(NamedRef::current("MyInt"))
        );
    }

    #[test]
    fn test_methods_and_embedding() {
        let file = parse(
            "package main\n\ntype Base struct{ n int }\n\nfunc (b *Base) Inc(d int) { b.n += d }\n\ntype Wrapper struct {\n\tBase\n\tname string\n}\n\nfunc main() {\n\tw := Wrapper{}\n\tw.Inc(2)\n\tf := (*Base).Inc\n\tf(&w.Base, 1)\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        let int = Type::Basic(BasicKind::Int);
        assert_eq!(
            callee_tv(&info, calls[0]).ty,
            Type::Func(Signature::new(vec![int.clone()], vec![], false))
        );
        let base_ptr = Type::pointer(Type::Named(NamedRef::current("Base")));
        assert_eq!(
            callee_tv(&info, calls[1]).ty,
            Type::Func(Signature::new(vec![base_ptr, int], vec![], false))
        );
    }

    #[test]
    fn test_multi_value_and_comma_ok() {
        let file = parse(
            "package main\n\nfunc pair() (int, string) { return 1, \"a\" }\n\nfunc main() {\n\ta, b := pair()\n\tm := map[string]int{}\n\tv, ok := m[b]\n\t_, _, _ = a, v, ok\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        assert_eq!(
            info.type_of(calls[0].id).unwrap().ty,
            Type::Tuple(vec![Type::Basic(BasicKind::Int), Type::Basic(BasicKind::String)])
        );
    }

    #[test]
    fn test_stub_package_calls() {
        let file = parse(
            "package main\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n\nfunc main() {\n\tvar sb strings.Builder\n\tsb.WriteString(\"x\")\n\tfmt.Println(sb.String())\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        let Type::Func(write) = &callee_tv(&info, calls[0]).ty else {
            panic!("expected func");
        };
        assert_eq!(write.params, vec![Type::Basic(BasicKind::String)]);
        let Type::Func(println) = &callee_tv(&info, calls[1]).ty else {
            panic!("expected func");
        };
        assert!(println.variadic);
    }

    #[test]
    fn test_dot_import() {
        let file = parse("package main\n\nimport . \"strings\"\n\nfunc main() {\n\t_ = ToUpper(\"x\")\n}\n");
        let info = check(&file).unwrap();
        let calls = calls(&file);
        assert!(matches!(callee_tv(&info, calls[0]).ty, Type::Func(_)));
    }

    #[test]
    fn test_iota_array_length() {
        let file = parse(
            "package main\n\nconst (\n\tA = iota\n\tB\n\tN\n)\n\nvar table [N * 2]int\n\nfunc main() { _ = table }\n",
        );
        let info = check(&file).unwrap();
        let Decl::Var(specs) = &file.decls[1] else {
            panic!("expected var");
        };
        let ty = &info.type_of(specs[0].names[0].id).unwrap().ty;
        assert_eq!(*ty, Type::Array(4, Box::new(Type::Basic(BasicKind::Int))));
    }

    #[test]
    fn test_array_length_from_len_of_array() {
        let file = parse(
            "package main\n\nvar x [3]string\n\nvar y [len(x)]int\n\nvar p = &x\n\nvar z [cap(p) + 1]bool\n\nfunc main() {}\n",
        );
        let info = check(&file).unwrap();
        let var_type = |decl: usize| {
            let Decl::Var(specs) = &file.decls[decl] else {
                panic!("expected var");
            };
            info.type_of(specs[0].names[0].id).unwrap().ty.clone()
        };
        assert_eq!(var_type(1), Type::Array(3, Box::new(Type::Basic(BasicKind::Int))));
        assert_eq!(var_type(3), Type::Array(4, Box::new(Type::Basic(BasicKind::Bool))));
    }

    #[test]
    fn test_embedded_interfaces_compare_by_method_set() {
        let file = parse(
            "package main\n\nimport \"io\"\n\nfunc embedded(r interface{ io.Reader }) {}\n\nfunc spelled(r interface{ Read(p []byte) (n int, err error) }) {}\n\nfunc both(rw interface {\n\tio.Writer\n\tRead(p []byte) (int, error)\n}) {}\n\nfunc main() {\n\tembedded(nil)\n\tspelled(nil)\n\tboth(nil)\n\tio.ReadAll(nil)\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        let embedded = callee_tv(&info, calls[0]).ty.clone();
        assert_eq!(embedded, callee_tv(&info, calls[1]).ty);

        let Type::Func(sig) = &callee_tv(&info, calls[2]).ty else {
            panic!("expected func");
        };
        let Type::Interface(iface) = &sig.params[0] else {
            panic!("expected interface param");
        };
        let names: Vec<&str> = iface.methods.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Read", "Write"]);
        assert!(iface.embeds.is_empty());

        let read_closer = NamedRef::external("io", "ReadCloser");
        let file = parse("package main\n\nimport \"io\"\n\nfunc main() {\n\tvar rc io.ReadCloser\n\trc.Close()\n}\n");
        let info = check(&file).unwrap();
        let Type::Interface(iface) = &info.named[&read_closer].underlying else {
            panic!("expected interface");
        };
        assert_eq!(iface.methods.len(), 2);
    }

    #[test]
    fn test_len_of_slice_is_not_an_array_length() {
        let file = parse("package main\n\nvar s = []int{1}\n\nvar y [len(s)]int\n\nfunc main() {}\n");
        let errors = check(&file).unwrap_err();
        assert_eq!(errors[0].message, "array length must be a non-negative constant");
    }

    #[test]
    fn test_unsafe_functions_are_builtins() {
        let file = parse(
            "package main\n\nimport \"unsafe\"\n\ntype pair struct{ a, b int64 }\n\nfunc main() {\n\tvar p pair\n\t_ = unsafe.Sizeof(p)\n\t_ = unsafe.Offsetof(p.b)\n\tq := unsafe.Add(unsafe.Pointer(&p), 8)\n\ts := unsafe.Slice(&p.a, 2)\n\t_, _ = q, s\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        assert_eq!(callee_tv(&info, calls[0]).mode, Mode::Builtin);
        assert_eq!(callee_tv(&info, calls[1]).mode, Mode::Builtin);
        assert_eq!(callee_tv(&info, calls[2]).mode, Mode::Builtin);
        assert_eq!(callee_tv(&info, calls[3]).mode, Mode::TypeExpr);
        assert_eq!(
            info.type_of(calls[0].id).unwrap().ty,
            Type::Basic(BasicKind::Uintptr)
        );
        assert_eq!(
            info.type_of(calls[2].id).unwrap().ty,
            Type::Basic(BasicKind::UnsafePointer)
        );
        assert_eq!(
            info.type_of(calls[4].id).unwrap().ty,
            Type::slice(Type::Basic(BasicKind::Int64))
        );
    }

    #[test]
    fn test_range_and_type_switch() {
        let file = parse(
            "package main\n\nfunc use(x any) {}\n\nfunc main() {\n\tfor i, r := range \"héllo\" {\n\t\tuse(i)\n\t\tuse(r)\n\t}\n\tfor n := range 3 {\n\t\tuse(n)\n\t}\n\tvar x any = 1\n\tswitch v := x.(type) {\n\tcase int:\n\t\tuse(v + 1)\n\t}\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        let arg_ty = |i: usize| info.type_of(calls[i].args[0].id()).unwrap().ty.clone();
        assert_eq!(arg_ty(0), Type::Basic(BasicKind::Int));
        assert_eq!(arg_ty(1), Type::Basic(BasicKind::Int32));
        assert_eq!(arg_ty(2), Type::Basic(BasicKind::Int));
        assert_eq!(arg_ty(3), Type::Basic(BasicKind::Int));
    }

    #[test]
    fn test_local_named_type_has_scope() {
        let file = parse(
            "package main\n\nfunc main() {\n\ttype point struct{ x int }\n\tf := func(p point) {}\n\tf(point{})\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        let Type::Func(sig) = &callee_tv(&info, calls[0]).ty else {
            panic!("expected func");
        };
        let Type::Named(named) = &sig.params[0] else {
            panic!("expected named param");
        };
        assert!(named.scope.is_some());
    }

    #[test]
    fn test_undefined_names_are_reported() {
        let file = parse("package main\n\nfunc main() {\n\tmissing()\n\tfmt.Println()\n}\n");
        let errors = check(&file).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "undefined: missing");
        assert_eq!(errors[0].span.line, 4);
        assert_eq!(errors[0].filename, "main.go");
    }

    #[test]
    fn test_call_of_non_function() {
        let file = parse("package main\n\nfunc main() {\n\tx := 1\n\tx()\n}\n");
        let errors = check(&file).unwrap_err();
        assert!(errors[0].message.contains("cannot call non-function"));
    }

    #[test]
    fn test_initialization_cycle() {
        let file = parse("package main\n\nvar a = b\nvar b = a\n\nfunc main() {}\n");
        let errors = check(&file).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("initialization cycle")));
    }

    #[test]
    fn test_package_order_does_not_matter() {
        let file = parse(
            "package main\n\nfunc main() { run(defaultConfig) }\n\nvar defaultConfig = Config{Workers: 4}\n\ntype Config struct{ Workers int }\n\nfunc run(c Config) {}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        assert!(matches!(callee_tv(&info, calls[0]).ty, Type::Func(_)));
    }

    #[test]
    fn test_named_func_type_value() {
        let file = parse(
            "package main\n\nimport \"net/http\"\n\nfunc main() {\n\th := http.HandlerFunc(func(w http.ResponseWriter, r *http.Request) {})\n\th(nil, nil)\n}\n",
        );
        let info = check(&file).unwrap();
        let calls = calls(&file);
        assert_eq!(
            callee_tv(&info, calls[1]).ty,
            Type::Named(NamedRef::external("net/http", "HandlerFunc"))
        );
        assert!(info
            .named
            .contains_key(&NamedRef::external("net/http", "HandlerFunc")));
    }

    #[test]
    fn test_parse_int_literal() {
        assert_eq!(parse_int_literal("1_000"), Some(1000));
        assert_eq!(parse_int_literal("0x1F"), Some(31));
        assert_eq!(parse_int_literal("0o17"), Some(15));
        assert_eq!(parse_int_literal("017"), Some(15));
        assert_eq!(parse_int_literal("0b101"), Some(5));
        assert_eq!(parse_int_literal("0"), Some(0));
    }

    #[test]
    fn test_char_literal_value() {
        assert_eq!(char_literal_value("'a'"), Some(97));
        assert_eq!(char_literal_value("'\\n'"), Some(10));
        assert_eq!(char_literal_value("'\\x41'"), Some(65));
        assert_eq!(char_literal_value("'\\u00e9'"), Some(0xe9));
        assert_eq!(char_literal_value("'\\101'"), Some(65));
        assert_eq!(char_literal_value("'é'"), Some(0xe9));
    }
}
