//! Wrapper function source generation.

use crate::error::GenerationError;
use crate::instrument::names::{NameResolver, check_nameable};
use crate::instrument::signature::{CallableType, SignatureId, wrapper_name};
use crate::frontend::types::Type;
use std::collections::BTreeMap;
use std::fmt::Write;

/// A generated wrapper and the callable type it was generated for.
#[derive(Debug, Clone)]
pub struct WrapperDefinition {
    pub id: SignatureId,
    pub text: String,
    pub callable: CallableType,
}

/// Wrapper definitions of one run, plus the ids whose generation failed.
#[derive(Debug, Default)]
pub struct WrapperTable {
    defs: BTreeMap<SignatureId, WrapperDefinition>,
    failed: BTreeMap<SignatureId, GenerationError>,
}

impl WrapperTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the definition for `id`. A second definition for the same id
    /// is ignored; returns whether this one was kept.
    pub fn define(&mut self, id: SignatureId, text: String, callable: CallableType) -> bool {
        if self.defs.contains_key(&id) {
            return false;
        }
        self.defs.insert(id, WrapperDefinition { id, text, callable });
        true
    }

    /// Remembers that no wrapper exists for `id`.
    pub fn mark_failed(&mut self, id: SignatureId, error: GenerationError) {
        self.failed.insert(id, error);
    }

    pub fn failure(&self, id: SignatureId) -> Option<&GenerationError> {
        self.failed.get(&id)
    }

    pub fn get(&self, id: SignatureId) -> Option<&WrapperDefinition> {
        self.defs.get(&id)
    }

    /// Definitions ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &WrapperDefinition> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Builtins the variadic tail loop calls unqualified.
const TAIL_BUILTINS: [&str; 2] = ["append", "len"];

/// Generates the wrapper for `callable`.
///
/// The wrapper takes the original function value as `a`, then one
/// parameter `p<i>` per parameter of `callable`, and returns named results
/// `r<i>`. It looks up the runtime name of `a`, starts profiling with the
/// arguments, forwards the call unchanged and stops profiling with the
/// results. Nothing is registered with `names` when generation fails.
pub fn generate(
    callable: &CallableType,
    id: SignatureId,
    names: &mut NameResolver<'_>,
) -> Result<String, GenerationError> {
    check_nameable(callable)?;
    if callable.variadic {
        for builtin in TAIL_BUILTINS {
            if names.is_package_level(builtin) {
                return Err(GenerationError::ShadowedBuiltin(builtin.to_string()));
            }
        }
    }

    let reflect = names.qualifier("reflect");
    let runtime = names.qualifier("runtime");
    let last = callable.params.len().saturating_sub(1);

    let mut params = vec![format!("a func{}", names.render_signature(callable))];
    let mut fixed = Vec::new();
    let mut tail = None;
    for (i, param) in callable.params.iter().enumerate() {
        let name = format!("p{}", i);
        match param {
            Type::Slice(elem) if callable.variadic && i == last => {
                params.push(format!("{} ...{}", name, names.render(elem)));
                tail = Some(name);
            }
            _ => {
                params.push(format!("{} {}", name, names.render(param)));
                fixed.push(name);
            }
        }
    }

    let results: Vec<String> = (0..callable.results.len()).map(|i| format!("r{}", i)).collect();
    let mut result_decls = Vec::new();
    for (name, ty) in results.iter().zip(&callable.results) {
        result_decls.push(format!("{} {}", name, names.render(ty)));
    }

    let mut forwarded = fixed.clone();
    if let Some(tail) = &tail {
        forwarded.push(format!("{}...", tail));
    }

    let mut out = String::new();
    let _ = write!(out, "func {}({})", wrapper_name(id), params.join(", "));
    if !result_decls.is_empty() {
        let _ = write!(out, " ({})", result_decls.join(", "));
    }
    out.push_str(" {\n");
    let _ = writeln!(out, "\tpc := {}.ValueOf(a).Pointer()", reflect);
    let _ = writeln!(out, "\tname := {}.FuncForPC(pc).Name()", runtime);
    let _ = writeln!(out, "\tps := []interface{{}}{{{}}}", fixed.join(", "));
    if let Some(tail) = &tail {
        let _ = writeln!(out, "\tfor i := 0; i < len({}); i++ {{", tail);
        let _ = writeln!(out, "\t\tps = append(ps, {}[i])", tail);
        out.push_str("\t}\n");
    }
    out.push_str("\tp := _isuprofStartProfiling(name, ps...)\n");
    if results.is_empty() {
        let _ = writeln!(out, "\ta({})", forwarded.join(", "));
    } else {
        let _ = writeln!(out, "\t{} = a({})", results.join(", "), forwarded.join(", "));
    }
    let _ = writeln!(out, "\tp.stopProfiling({})", results.join(", "));
    out.push_str("\treturn\n}\n");
    Ok(out)
}
