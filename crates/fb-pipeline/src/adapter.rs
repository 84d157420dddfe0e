//! The generated adapter type: methods with fixed body shapes, plus the
//! native symbol slots they call through.

use crate::transform::TypeTransformer;
use fb_core::{Error, MemberDecl, NativeType, Ownership, Result};
use fb_native::NativeSignature;
use itertools::Itertools;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

/// A nullable value crossing the boundary behind a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullableMarshal {
    pub underlying: NativeType,
    pub ownership: Ownership,
}

pub enum AdapterBody {
    /// Fails with `DisposedAccess` once the instance is disposed, then calls `inner`.
    DisposalGuard { inner: MethodId },
    /// Lowers the marked parameters, calls `target`, raises the result.
    Lowered {
        target: MethodId,
        params: Vec<Option<Arc<dyn TypeTransformer>>>,
        ret: Option<Arc<dyn TypeTransformer>>,
    },
    /// Moves nullable values through scratch buffers around a call to `target`.
    Nullable {
        target: MethodId,
        params: Vec<Option<NullableMarshal>>,
        ret: Option<NullableMarshal>,
    },
    /// Calls the native entry point held in `slot`.
    Native {
        slot: SlotId,
        signature: NativeSignature,
    },
}

impl AdapterBody {
    pub fn shape(&self) -> &'static str {
        match self {
            AdapterBody::DisposalGuard { .. } => "disposal-guard",
            AdapterBody::Lowered { .. } => "lowered",
            AdapterBody::Nullable { .. } => "nullable-marshal",
            AdapterBody::Native { .. } => "native",
        }
    }

    /// The generated method this body forwards to, if any.
    pub fn target(&self) -> Option<MethodId> {
        match self {
            AdapterBody::DisposalGuard { inner } => Some(*inner),
            AdapterBody::Lowered { target, .. } | AdapterBody::Nullable { target, .. } => {
                Some(*target)
            }
            AdapterBody::Native { .. } => None,
        }
    }
}

impl fmt::Debug for AdapterBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterBody::DisposalGuard { inner } => {
                f.debug_struct("DisposalGuard").field("inner", inner).finish()
            }
            AdapterBody::Lowered { target, params, ret } => f
                .debug_struct("Lowered")
                .field("target", target)
                .field(
                    "lowered_params",
                    &params.iter().positions(Option::is_some).collect::<Vec<_>>(),
                )
                .field("lowered_return", &ret.is_some())
                .finish(),
            AdapterBody::Nullable { target, params, ret } => f
                .debug_struct("Nullable")
                .field("target", target)
                .field("params", params)
                .field("ret", ret)
                .finish(),
            AdapterBody::Native { slot, signature } => f
                .debug_struct("Native")
                .field("slot", slot)
                .field("signature", &signature.to_string())
                .finish(),
        }
    }
}

/// One generated method.
#[derive(Debug)]
pub struct MethodDef {
    pub name: String,
    /// Index of the interface member this method serves.
    pub member: usize,
    /// The method's own shape; lowered methods differ from the interface member.
    pub decl: MemberDecl,
    pub body: AdapterBody,
}

/// A native function reference resolved once per binding instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDef {
    pub symbol: String,
    pub member: String,
    pub signature: NativeSignature,
    pub lazy: bool,
}

struct PendingMethod {
    name: String,
    member: usize,
    definition: Option<(MemberDecl, AdapterBody)>,
}

/// The type under construction. Methods are declared before their bodies so
/// a stage can forward to a method a later stage has yet to emit.
#[derive(Default)]
pub struct TypeBuilder {
    methods: Vec<PendingMethod>,
    names: HashSet<String>,
    slots: Vec<SlotDef>,
}

impl TypeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, member: usize) -> Result<MethodId> {
        let name = name.into();
        if !self.names.insert(name.clone()) {
            return Err(Error::configuration(
                &name,
                "generated method name collides with an existing method",
            ));
        }
        self.methods.push(PendingMethod {
            name,
            member,
            definition: None,
        });
        Ok(MethodId(self.methods.len() - 1))
    }

    pub fn define(&mut self, id: MethodId, decl: MemberDecl, body: AdapterBody) -> Result<()> {
        let pending = self
            .methods
            .get_mut(id.0)
            .ok_or_else(|| Error::Generic(format!("method {id:?} was never declared")))?;
        if pending.definition.is_some() {
            return Err(Error::configuration(
                &pending.name,
                "method body emitted twice",
            ));
        }
        pending.definition = Some((decl, body));
        Ok(())
    }

    pub fn add_slot(&mut self, slot: SlotDef) -> SlotId {
        self.slots.push(slot);
        SlotId(self.slots.len() - 1)
    }

    pub fn finish(self) -> Result<(Vec<MethodDef>, Vec<SlotDef>)> {
        let methods = self
            .methods
            .into_iter()
            .map(|pending| match pending.definition {
                Some((decl, body)) => Ok(MethodDef {
                    name: pending.name,
                    member: pending.member,
                    decl,
                    body,
                }),
                None => Err(Error::configuration(
                    &pending.name,
                    "method was declared but no stage emitted its body",
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((methods, self.slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_bodies_required() {
        let mut builder = TypeBuilder::new();
        let id = builder.declare("Multiply", 0).unwrap();
        assert!(builder.declare("Multiply", 0).is_err());
        let err = TypeBuilder::finish(std::mem::take(&mut builder)).unwrap_err();
        assert!(err.to_string().contains("no stage emitted"));

        let mut builder = TypeBuilder::new();
        let id2 = builder.declare("Multiply", 0).unwrap();
        assert_eq!(id, id2);
        let body = AdapterBody::DisposalGuard { inner: id2 };
        builder
            .define(id2, MemberDecl::new("Multiply"), body)
            .unwrap();
        let again = builder.define(
            id2,
            MemberDecl::new("Multiply"),
            AdapterBody::DisposalGuard { inner: id2 },
        );
        assert!(again.is_err());
        let (methods, slots) = builder.finish().unwrap();
        assert_eq!(methods.len(), 1);
        assert!(slots.is_empty());
        assert_eq!(methods[0].body.shape(), "disposal-guard");
    }
}
