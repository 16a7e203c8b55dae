//! Go type representations.
//!
//! Equality of [`Type`] is Go type identity: named types are identical when
//! they come from the same declaration, everything else compares
//! structurally. Aliases never appear here; they are resolved to the type
//! they denote.

use crate::frontend::ast::{ChanDir, NodeId};
use std::collections::BTreeMap;
use std::fmt;

/// Predeclared basic types. `byte` and `rune` are aliases of `Uint8` and
/// `Int32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
}

impl BasicKind {
    pub fn from_name(name: &str) -> Option<BasicKind> {
        let kind = match name {
            "bool" => BasicKind::Bool,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" | "rune" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" | "byte" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "complex64" => BasicKind::Complex64,
            "complex128" => BasicKind::Complex128,
            "string" => BasicKind::String,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, BasicKind::Complex64 | BasicKind::Complex128)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }
}

/// Kinds of untyped constants and `nil`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UntypedKind {
    Bool,
    Int,
    Rune,
    Float,
    Complex,
    String,
    Nil,
}

impl UntypedKind {
    /// Numeric untyped kinds are ordered: a binary operation takes the
    /// larger of its operands' kinds.
    pub fn rank(self) -> u8 {
        match self {
            UntypedKind::Int => 1,
            UntypedKind::Rune => 2,
            UntypedKind::Float => 3,
            UntypedKind::Complex => 4,
            _ => 0,
        }
    }
}

/// Where a named type is declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    /// Predeclared (`error`).
    Universe,
    /// The package being instrumented.
    Current,
    /// Another package, by import path.
    External(String),
}

/// Reference to a declared (defined) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedRef {
    pub origin: Origin,
    pub name: String,
    /// Declaring node for types declared inside a function body. Such types
    /// are distinct from any package-level type of the same name.
    pub scope: Option<NodeId>,
}

impl NamedRef {
    pub fn universe(name: &str) -> Self {
        Self {
            origin: Origin::Universe,
            name: name.to_string(),
            scope: None,
        }
    }

    pub fn current(name: &str) -> Self {
        Self {
            origin: Origin::Current,
            name: name.to_string(),
            scope: None,
        }
    }

    pub fn external(path: &str, name: &str) -> Self {
        Self {
            origin: Origin::External(path.to_string()),
            name: name.to_string(),
            scope: None,
        }
    }

    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

/// A function type: `func(params) results`. When `variadic` is set the last
/// parameter is a slice whose elements form the variable-length tail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    pub variadic: bool,
}

impl Signature {
    pub fn new(params: Vec<Type>, results: Vec<Type>, variadic: bool) -> Self {
        Self {
            params,
            results,
            variadic,
        }
    }

    /// The type of a call expression of this signature.
    pub fn result_type(&self) -> Type {
        match self.results.len() {
            1 => self.results[0].clone(),
            _ => Type::Tuple(self.results.clone()),
        }
    }

    /// Type of the `i`th argument, expanding the variadic tail.
    pub fn param_for_arg(&self, i: usize) -> Option<Type> {
        if self.variadic && i + 1 >= self.params.len() {
            match self.params.last() {
                Some(Type::Slice(elem)) => Some((**elem).clone()),
                other => other.cloned(),
            }
        } else {
            self.params.get(i).cloned()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
    pub tag: Option<String>,
    /// Import path of the package that declared this field, set only for
    /// unexported fields declared outside the instrumented package.
    pub pkg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InterfaceType {
    /// Method set sorted by name.
    pub methods: Vec<(String, Signature)>,
    /// Embedded interfaces not yet folded into `methods`. Always empty in
    /// types produced by the checker.
    pub embeds: Vec<Type>,
    /// Import path of the package that declared the unexported methods, when
    /// that is not the instrumented package.
    pub pkg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicKind),
    Untyped(UntypedKind),
    Named(NamedRef),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(u64, Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(ChanDir, Box<Type>),
    Func(Signature),
    Struct(Vec<StructField>),
    Interface(InterfaceType),
    /// Result of a call returning zero or several values.
    Tuple(Vec<Type>),
    /// Placeholder after an error has been reported.
    Invalid,
}

impl Type {
    pub fn pointer(elem: Type) -> Type {
        Type::Pointer(Box::new(elem))
    }

    pub fn slice(elem: Type) -> Type {
        Type::Slice(Box::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn empty_interface() -> Type {
        Type::Interface(InterfaceType::default())
    }

    pub fn error() -> Type {
        Type::Named(NamedRef::universe("error"))
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Untyped(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    /// The type an untyped constant takes when no other type is implied.
    pub fn default_type(&self) -> Type {
        match self {
            Type::Untyped(kind) => match kind {
                UntypedKind::Bool => Type::Basic(BasicKind::Bool),
                UntypedKind::Int => Type::Basic(BasicKind::Int),
                UntypedKind::Rune => Type::Basic(BasicKind::Int32),
                UntypedKind::Float => Type::Basic(BasicKind::Float64),
                UntypedKind::Complex => Type::Basic(BasicKind::Complex128),
                UntypedKind::String => Type::Basic(BasicKind::String),
                UntypedKind::Nil => self.clone(),
            },
            other => other.clone(),
        }
    }

    /// Calls `f` with every type nested in this one, depth-first, including
    /// `self`.
    pub fn walk(&self, f: &mut impl FnMut(&Type)) {
        f(self);
        match self {
            Type::Basic(_) | Type::Untyped(_) | Type::Named(_) | Type::Invalid => {}
            Type::Pointer(elem) | Type::Slice(elem) | Type::Array(_, elem) | Type::Chan(_, elem) => {
                elem.walk(f)
            }
            Type::Map(key, value) => {
                key.walk(f);
                value.walk(f);
            }
            Type::Func(sig) => sig.walk(f),
            Type::Struct(fields) => fields.iter().for_each(|field| field.ty.walk(f)),
            Type::Interface(iface) => {
                for (_, sig) in &iface.methods {
                    sig.walk(f);
                }
                iface.embeds.iter().for_each(|t| t.walk(f));
            }
            Type::Tuple(types) => types.iter().for_each(|t| t.walk(f)),
        }
    }
}

impl Signature {
    pub fn walk(&self, f: &mut impl FnMut(&Type)) {
        self.params.iter().for_each(|t| t.walk(f));
        self.results.iter().for_each(|t| t.walk(f));
    }
}

/// Declaration of a named type: its underlying type and method sets.
#[derive(Debug, Clone)]
pub struct NamedInfo {
    pub underlying: Type,
    /// Methods with a value receiver.
    pub methods: BTreeMap<String, Signature>,
    /// Methods with a pointer receiver.
    pub pointer_methods: BTreeMap<String, Signature>,
}

impl NamedInfo {
    pub fn new(underlying: Type) -> Self {
        Self {
            underlying,
            methods: BTreeMap::new(),
            pointer_methods: BTreeMap::new(),
        }
    }

    /// Looks up a method, reporting whether it needs a pointer receiver.
    pub fn method(&self, name: &str) -> Option<(&Signature, bool)> {
        self.methods
            .get(name)
            .map(|sig| (sig, false))
            .or_else(|| self.pointer_methods.get(name).map(|sig| (sig, true)))
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(kind) => write!(f, "{}", kind.name()),
            Type::Untyped(UntypedKind::Nil) => write!(f, "untyped nil"),
            Type::Untyped(kind) => {
                let name = match kind {
                    UntypedKind::Bool => "bool",
                    UntypedKind::Int => "int",
                    UntypedKind::Rune => "rune",
                    UntypedKind::Float => "float",
                    UntypedKind::Complex => "complex",
                    _ => "string",
                };
                write!(f, "untyped {}", name)
            }
            Type::Named(named) => match &named.origin {
                Origin::External(path) => write!(f, "{}.{}", path, named.name),
                Origin::Universe | Origin::Current => write!(f, "{}", named.name),
            },
            Type::Pointer(elem) => write!(f, "*{}", elem),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Array(len, elem) => write!(f, "[{}]{}", len, elem),
            Type::Map(key, value) => write!(f, "map[{}]{}", key, value),
            Type::Chan(dir, elem) => match dir {
                ChanDir::Send => write!(f, "chan<- {}", elem),
                ChanDir::Recv => write!(f, "<-chan {}", elem),
                ChanDir::Both => match **elem {
                    Type::Chan(ChanDir::Recv, _) => write!(f, "chan ({})", elem),
                    _ => write!(f, "chan {}", elem),
                },
            },
            Type::Func(sig) => write!(f, "func{}", sig),
            Type::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                    if let Some(tag) = &field.tag {
                        write!(f, " {}", tag)?;
                    }
                }
                write!(f, "}}")
            }
            Type::Interface(iface) => {
                write!(f, "interface{{")?;
                let mut first = true;
                for embed in &iface.embeds {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", embed)?;
                    first = false;
                }
                for (name, sig) in &iface.methods {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}{}", name, sig)?;
                    first = false;
                }
                write!(f, "}}")
            }
            Type::Tuple(types) => {
                write!(f, "(")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, ")")
            }
            Type::Invalid => write!(f, "invalid type"),
        }
    }
}

/// Formats the part after `func`: `(int, ...string) (bool, error)`.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match param {
                Type::Slice(elem) if self.variadic && i == last => write!(f, "...{}", elem)?,
                _ => write!(f, "{}", param)?,
            }
        }
        write!(f, ")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] if !matches!(single, Type::Func(_)) => write!(f, " {}", single),
            results => {
                write!(f, " (")?;
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", result)?;
                }
                write!(f, ")")
            }
        }
    }
}
