use super::{StringTransformer, TypeTransformer};
use fb_core::{config_bail, Result, TypeKey, TypeRef};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Transformers keyed by the exact complex type they handle.
///
/// Populated before generation, then shared read-only by every binding type
/// generated from it.
#[derive(Default, Clone)]
pub struct TransformerRegistry {
    transformers: HashMap<TypeKey, Arc<dyn TypeTransformer>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `string` transformer.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .transformers
            .insert(TypeKey::from_static("string"), Arc::new(StringTransformer));
        registry
    }

    pub fn register(
        &mut self,
        key: impl Into<TypeKey>,
        transformer: impl TypeTransformer + 'static,
    ) -> Result<()> {
        self.register_arc(key, Arc::new(transformer))
    }

    pub fn register_arc(
        &mut self,
        key: impl Into<TypeKey>,
        transformer: Arc<dyn TypeTransformer>,
    ) -> Result<()> {
        let key = key.into();
        if self.transformers.contains_key(&key) {
            config_bail!(
                key.as_str(),
                "a transformer for `{key}` is already registered; lookup would be ambiguous"
            );
        }
        if let TypeRef::Named(lowered) = transformer.lowered_type() {
            config_bail!(
                key.as_str(),
                "transformer for `{key}` lowers to `{lowered}`, which is not a native or nullable type"
            );
        }
        self.transformers.insert(key, transformer);
        Ok(())
    }

    pub fn with(
        mut self,
        key: impl Into<TypeKey>,
        transformer: impl TypeTransformer + 'static,
    ) -> Result<Self> {
        self.register(key, transformer)?;
        Ok(self)
    }

    pub fn get(&self, key: &TypeKey) -> Option<Arc<dyn TypeTransformer>> {
        self.transformers.get(key).cloned()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.transformers.contains_key(key)
    }

    /// Whether `ty` has a transformer, or needs none.
    pub fn can_lower(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Named(key) => self.contains(key),
            _ => true,
        }
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.transformers.keys().map(TypeKey::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("TransformerRegistry")
            .field("types", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::FnTransformer;
    use fb_core::{Error, NativeType};

    fn identity(lowered: TypeRef) -> impl TypeTransformer {
        FnTransformer::new(lowered, |value, _| Ok(value), |value, _| Ok(value))
    }

    #[test]
    fn duplicate_registration_is_ambiguous() {
        let mut registry = TransformerRegistry::with_defaults();
        let err = registry
            .register("string", identity(NativeType::Pointer.into()))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { ref member, .. } if member == "string"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lowered_type_must_not_be_complex() {
        let err = TransformerRegistry::new()
            .with("wrapper", identity(TypeRef::named("string")))
            .unwrap_err();
        assert!(err.to_string().contains("not a native or nullable type"));
    }

    #[test]
    fn lookups_are_exact() -> Result<()> {
        let registry = TransformerRegistry::new()
            .with("point", identity(TypeRef::Nullable(NativeType::I64)))?;
        assert!(registry.contains(&TypeKey::from_static("point")));
        assert!(!registry.contains(&TypeKey::from_static("Point")));
        assert!(registry.can_lower(&NativeType::I32.into()));
        assert!(!registry.can_lower(&TypeRef::named("string")));
        assert_eq!(
            registry
                .get(&TypeKey::from_static("point"))
                .map(|t| t.lowered_type()),
            Some(TypeRef::Nullable(NativeType::I64))
        );
        Ok(())
    }
}
