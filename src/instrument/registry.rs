use crate::error::{IsuprofError, Result};
use crate::instrument::signature::{CallableType, HashFn, SignatureId, structural_hash};
use std::collections::HashMap;
use tracing::trace;

/// Maximum number of occupied slots probed past the hashed one.
pub const MAX_PROBES: u32 = 10_000;

/// Assigns one [`SignatureId`] per distinct callable type.
///
/// Ids come from the structural hash with linear probing: a slot taken by
/// a different type moves the candidate to the next id. Identical types
/// always get the same id and distinct types never share one.
pub struct SignatureRegistry {
    hasher: HashFn,
    max_probes: u32,
    forward: HashMap<CallableType, SignatureId>,
    backward: HashMap<SignatureId, CallableType>,
}

impl Default for SignatureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::with_hasher(structural_hash)
    }

    /// Registry with a custom hash function, for exercising collisions.
    pub fn with_hasher(hasher: HashFn) -> Self {
        Self {
            hasher,
            max_probes: MAX_PROBES,
            forward: HashMap::new(),
            backward: HashMap::new(),
        }
    }

    /// Lowers the probe bound.
    pub fn with_probe_limit(mut self, max_probes: u32) -> Self {
        self.max_probes = max_probes;
        self
    }

    /// Returns the id of `ty` and whether it was created by this call.
    pub fn get_or_create(&mut self, ty: &CallableType) -> Result<(SignatureId, bool)> {
        if let Some(&id) = self.forward.get(ty) {
            return Ok((id, false));
        }

        let mut candidate = (self.hasher)(ty);
        for probe in 0..=self.max_probes {
            match self.backward.get(&candidate) {
                None => {
                    if probe > 0 {
                        trace!(id = candidate, probes = probe, "resolved hash collision");
                    }
                    self.forward.insert(ty.clone(), candidate);
                    self.backward.insert(candidate, ty.clone());
                    return Ok((candidate, true));
                }
                Some(existing) if existing == ty => {
                    self.forward.insert(ty.clone(), candidate);
                    return Ok((candidate, false));
                }
                Some(_) => candidate = candidate.wrapping_add(1),
            }
        }

        Err(IsuprofError::HashCollisionExhausted {
            signature: format!("func{}", ty),
            probes: self.max_probes,
        })
    }

    pub fn get(&self, id: SignatureId) -> Option<&CallableType> {
        self.backward.get(&id)
    }

    pub fn len(&self) -> usize {
        self.backward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backward.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::types::{BasicKind, Signature, Type};
    use proptest::prelude::*;

    fn basic(kind: BasicKind) -> Type {
        Type::Basic(kind)
    }

    fn sig(params: Vec<Type>, results: Vec<Type>) -> CallableType {
        Signature::new(params, results, false)
    }

    fn constant_hash(_: &CallableType) -> u32 {
        7
    }

    fn max_hash(_: &CallableType) -> u32 {
        u32::MAX
    }

    #[test]
    fn test_same_type_same_id() {
        let mut registry = SignatureRegistry::new();
        let ty = sig(vec![basic(BasicKind::Int), basic(BasicKind::Int)], vec![basic(BasicKind::Int)]);
        let (first, created) = registry.get_or_create(&ty).unwrap();
        assert!(created);
        let (second, created) = registry.get_or_create(&ty.clone()).unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_collisions_probe_linearly() {
        let mut registry = SignatureRegistry::with_hasher(constant_hash);
        let a = sig(vec![basic(BasicKind::Int)], vec![]);
        let b = sig(vec![basic(BasicKind::String)], vec![]);
        let c = sig(vec![], vec![basic(BasicKind::Bool)]);

        assert_eq!(registry.get_or_create(&a).unwrap(), (7, true));
        assert_eq!(registry.get_or_create(&b).unwrap(), (8, true));
        assert_eq!(registry.get_or_create(&c).unwrap(), (9, true));
        assert_eq!(registry.get_or_create(&b).unwrap(), (8, false));
        assert_eq!(registry.get(9), Some(&c));
    }

    #[test]
    fn test_probe_wraps_around() {
        let mut registry = SignatureRegistry::with_hasher(max_hash);
        let a = sig(vec![basic(BasicKind::Int)], vec![]);
        let b = sig(vec![basic(BasicKind::Int8)], vec![]);
        assert_eq!(registry.get_or_create(&a).unwrap().0, u32::MAX);
        assert_eq!(registry.get_or_create(&b).unwrap().0, 0);
    }

    #[test]
    fn test_exhausted_probes_fail() {
        let mut registry = SignatureRegistry::with_hasher(constant_hash).with_probe_limit(2);
        let kinds = [BasicKind::Int, BasicKind::Int8, BasicKind::Int16];
        for kind in kinds {
            registry.get_or_create(&sig(vec![basic(kind)], vec![])).unwrap();
        }
        let err = registry
            .get_or_create(&sig(vec![basic(BasicKind::Int32)], vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            IsuprofError::HashCollisionExhausted { probes: 2, .. }
        ));
        assert_eq!(registry.len(), 3);
    }

    fn arb_type() -> impl Strategy<Value = Type> {
        let leaf = prop_oneof![
            Just(basic(BasicKind::Int)),
            Just(basic(BasicKind::String)),
            Just(basic(BasicKind::Bool)),
            Just(basic(BasicKind::Float64)),
            Just(Type::error()),
        ];
        leaf.prop_recursive(3, 16, 3, |inner| {
            prop_oneof![
                inner.clone().prop_map(Type::pointer),
                inner.clone().prop_map(Type::slice),
                (inner.clone(), inner).prop_map(|(k, v)| Type::map(k, v)),
            ]
        })
    }

    fn arb_callable() -> impl Strategy<Value = CallableType> {
        (
            prop::collection::vec(arb_type(), 0..4),
            prop::collection::vec(arb_type(), 0..3),
            any::<bool>(),
        )
            .prop_map(|(mut params, results, variadic)| {
                let variadic = variadic && !params.is_empty();
                if variadic {
                    if let Some(last) = params.pop() {
                        params.push(Type::slice(last));
                    }
                }
                Signature::new(params, results, variadic)
            })
    }

    proptest! {
        #[test]
        fn prop_ids_are_a_bijection(types in prop::collection::vec(arb_callable(), 1..40)) {
            for hasher in [structural_hash as HashFn, constant_hash] {
                let mut registry = SignatureRegistry::with_hasher(hasher);
                let ids: Vec<SignatureId> = types
                    .iter()
                    .map(|t| registry.get_or_create(t).unwrap().0)
                    .collect();
                for (i, a) in types.iter().enumerate() {
                    for (j, b) in types.iter().enumerate() {
                        prop_assert_eq!(a == b, ids[i] == ids[j]);
                    }
                }
            }
        }

        #[test]
        fn prop_lookup_is_stable(types in prop::collection::vec(arb_callable(), 1..20)) {
            let mut registry = SignatureRegistry::new();
            let first: Vec<_> = types.iter().map(|t| registry.get_or_create(t).unwrap().0).collect();
            let again: Vec<_> = types.iter().map(|t| registry.get_or_create(t).unwrap()).collect();
            for (id, (again_id, created)) in first.iter().zip(again) {
                prop_assert_eq!(*id, again_id);
                prop_assert!(!created);
            }
        }
    }
}
