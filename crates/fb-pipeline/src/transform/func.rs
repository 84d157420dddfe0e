use super::{MarshalContext, TypeTransformer};
use fb_core::{Result, TypeRef, Value};

/// A transformer assembled from a pair of closures.
pub struct FnTransformer<L, R> {
    lowered: TypeRef,
    lower: L,
    raise: R,
}

impl<L, R> FnTransformer<L, R>
where
    L: Fn(Value, &mut MarshalContext<'_, '_>) -> Result<Value> + Send + Sync,
    R: Fn(Value, &mut MarshalContext<'_, '_>) -> Result<Value> + Send + Sync,
{
    pub fn new(lowered: impl Into<TypeRef>, lower: L, raise: R) -> Self {
        Self {
            lowered: lowered.into(),
            lower,
            raise,
        }
    }
}

impl<L, R> TypeTransformer for FnTransformer<L, R>
where
    L: Fn(Value, &mut MarshalContext<'_, '_>) -> Result<Value> + Send + Sync,
    R: Fn(Value, &mut MarshalContext<'_, '_>) -> Result<Value> + Send + Sync,
{
    fn lowered_type(&self) -> TypeRef {
        self.lowered.clone()
    }

    fn lower(&self, value: Value, ctx: &mut MarshalContext<'_, '_>) -> Result<Value> {
        (self.lower)(value, ctx)
    }

    fn raise(&self, value: Value, ctx: &mut MarshalContext<'_, '_>) -> Result<Value> {
        (self.raise)(value, ctx)
    }
}
