//! Structural callable types and their identities.

use crate::frontend::types::Signature;
use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

/// Parameter types, result types and the variadic flag of a function value.
/// Declared names of the callee's type play no part in equality.
pub type CallableType = Signature;

/// Identity of a distinct [`CallableType`] within one run.
pub type SignatureId = u32;

/// Hash function used to pick the first candidate id of a callable type.
pub type HashFn = fn(&CallableType) -> u32;

/// FNV-1a over the structural form of `ty`, truncated to 32 bits.
pub fn structural_hash(ty: &CallableType) -> u32 {
    let mut hasher = FnvHasher::default();
    ty.hash(&mut hasher);
    hasher.finish() as u32
}

/// Name of the wrapper function generated for `id`.
pub fn wrapper_name(id: SignatureId) -> String {
    format!("_isuprofWrapper{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::types::{BasicKind, NamedRef, Type};

    fn int() -> Type {
        Type::Basic(BasicKind::Int)
    }

    #[test]
    fn test_hash_is_structural() {
        let a = Signature::new(vec![int(), int()], vec![int()], false);
        let b = Signature::new(vec![int(), int()], vec![int()], false);
        assert_eq!(structural_hash(&a), structural_hash(&b));
    }

    #[test]
    fn test_variadic_flag_changes_identity() {
        let plain = Signature::new(vec![int(), Type::slice(int())], vec![], false);
        let variadic = Signature::new(vec![int(), Type::slice(int())], vec![], true);
        assert_ne!(plain, variadic);
        assert_ne!(structural_hash(&plain), structural_hash(&variadic));
    }

    #[test]
    fn test_named_types_compare_by_path() {
        let a = Signature::new(vec![Type::Named(NamedRef::external("example.com/a", "T"))], vec![], false);
        let b = Signature::new(vec![Type::Named(NamedRef::external("example.com/b", "T"))], vec![], false);
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrapper_name() {
        assert_eq!(wrapper_name(42), "_isuprofWrapper42");
    }
}
