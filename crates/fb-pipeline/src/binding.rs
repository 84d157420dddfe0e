//! Generated binding types and their instances.

use crate::adapter::{AdapterBody, MethodDef, MethodId, NullableMarshal, SlotDef};
use crate::error::GenerationNote;
use crate::transform::{MarshalContext, Position, TransformerRegistry, TypeTransformer};
use fb_core::{BindingConfig, Error, InterfaceDecl, MemberDecl, NativeValue, Result, Value};
use fb_native::{
    call_native, read_value, write_value, NativeAllocator, ScratchBuffers, SymbolResolver,
    SymbolSlot,
};
use std::collections::HashMap;
use std::fmt::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The adapter generated for one interface under one configuration.
///
/// Immutable once built and shared by every instance activated from it.
pub struct BindingType {
    interface: InterfaceDecl,
    config: BindingConfig,
    methods: Vec<MethodDef>,
    entries: Vec<MethodId>,
    by_name: HashMap<String, usize>,
    slots: Vec<SlotDef>,
    registry: Arc<TransformerRegistry>,
    allocator: Arc<dyn NativeAllocator>,
    notes: Vec<GenerationNote>,
}

impl BindingType {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        interface: InterfaceDecl,
        config: BindingConfig,
        methods: Vec<MethodDef>,
        entries: Vec<MethodId>,
        slots: Vec<SlotDef>,
        registry: Arc<TransformerRegistry>,
        allocator: Arc<dyn NativeAllocator>,
        notes: Vec<GenerationNote>,
    ) -> Self {
        let by_name = interface
            .members
            .iter()
            .enumerate()
            .map(|(index, member)| (member.name.clone(), index))
            .collect();
        Self {
            interface,
            config,
            methods,
            entries,
            by_name,
            slots,
            registry,
            allocator,
            notes,
        }
    }

    /// Create an instance with its own symbol slots and disposed flag.
    ///
    /// Eager slots resolve here, so a missing export fails activation.
    pub fn instantiate(self: &Arc<Self>, resolver: Arc<dyn SymbolResolver>) -> Result<Binding> {
        let slots = self
            .slots
            .iter()
            .map(|slot| {
                if slot.lazy {
                    Ok(SymbolSlot::lazy(resolver.clone(), &slot.symbol, &slot.member))
                } else {
                    SymbolSlot::eager(resolver.as_ref(), &slot.symbol, &slot.member)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Binding {
            ty: Arc::clone(self),
            slots,
            resolver,
            disposed: AtomicBool::new(false),
        })
    }

    pub fn interface(&self) -> &InterfaceDecl {
        &self.interface
    }

    pub fn config(&self) -> BindingConfig {
        self.config
    }

    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// The method implementing interface member `member`.
    pub fn entry(&self, member: &str) -> Option<&MethodDef> {
        let index = *self.by_name.get(member)?;
        Some(&self.methods[self.entries[index].0])
    }

    pub fn slots(&self) -> &[SlotDef] {
        &self.slots
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    pub fn notes(&self) -> &[GenerationNote] {
        &self.notes
    }

    /// One line per generated method: its shape and what it forwards to.
    pub fn describe(&self) -> String {
        let mut out = format!("interface {} {:?}\n", self.interface.name, self.config);
        for method in &self.methods {
            let detail = match &method.body {
                AdapterBody::Native { slot, signature } => {
                    let slot = &self.slots[slot.0];
                    let mode = if slot.lazy { "lazy" } else { "eager" };
                    format!("native `{}` ({mode}) {signature}", slot.symbol)
                }
                body => match body.target() {
                    Some(target) => {
                        format!("{} -> {}", body.shape(), self.methods[target.0].name)
                    }
                    None => body.shape().to_string(),
                },
            };
            let _ = writeln!(out, "  {} => {}", method.decl.signature(), detail);
        }
        out
    }
}

impl fmt::Debug for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingType")
            .field("interface", &self.interface.name)
            .field("config", &self.config)
            .field("methods", &self.methods.len())
            .field("slots", &self.slots.len())
            .finish()
    }
}

/// An activated binding: the generated type plus per-instance state.
///
/// Safe to call from several threads. Disposal is a best-effort flag checked
/// once at the start of each call.
pub struct Binding {
    ty: Arc<BindingType>,
    slots: Vec<SymbolSlot>,
    resolver: Arc<dyn SymbolResolver>,
    disposed: AtomicBool,
}

impl Binding {
    pub fn binding_type(&self) -> &Arc<BindingType> {
        &self.ty
    }

    /// Mark the instance disposed. Returns false if it already was.
    pub fn dispose(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Whether every native symbol of this instance has been resolved.
    pub fn is_fully_resolved(&self) -> bool {
        self.slots.iter().all(SymbolSlot::is_resolved)
    }

    /// Call interface member `member` with `args`.
    pub fn invoke(&self, member: &str, args: Vec<Value>) -> Result<Value> {
        let index = *self
            .ty
            .by_name
            .get(member)
            .ok_or_else(|| Error::UnknownMember {
                interface: self.ty.interface.name.clone(),
                member: member.to_string(),
            })?;
        self.invoke_index(index, args)
    }

    /// Call the interface member at `index` in declaration order.
    pub fn invoke_index(&self, index: usize, args: Vec<Value>) -> Result<Value> {
        let decl = self
            .ty
            .interface
            .members
            .get(index)
            .ok_or_else(|| Error::UnknownMember {
                interface: self.ty.interface.name.clone(),
                member: format!("#{index}"),
            })?;
        let entry = self.ty.entries[index];
        match &self.ty.methods[entry.0].body {
            AdapterBody::DisposalGuard { inner } => {
                self.check_disposed(&decl.name)?;
                check_arguments(decl, &args)?;
                self.execute(*inner, args)
            }
            _ => {
                check_arguments(decl, &args)?;
                self.execute(entry, args)
            }
        }
    }

    /// `invoke`, converting the result to `T`.
    pub fn call<T: NativeValue>(&self, member: &str, args: Vec<Value>) -> Result<T> {
        T::from_value(self.invoke(member, args)?)
    }

    fn execute(&self, id: MethodId, args: Vec<Value>) -> Result<Value> {
        let method = &self.ty.methods[id.0];
        let member = self.ty.interface.members[method.member].name.as_str();
        match &method.body {
            AdapterBody::DisposalGuard { inner } => {
                self.check_disposed(member)?;
                self.execute(*inner, args)
            }
            AdapterBody::Lowered {
                target,
                params,
                ret,
            } => self.execute_lowered(method, member, *target, params, ret.as_ref(), args),
            AdapterBody::Nullable {
                target,
                params,
                ret,
            } => self.execute_nullable(method, member, *target, params, ret.as_ref(), args),
            AdapterBody::Native { slot, signature } => {
                let address = self.slots[slot.0].address()?;
                unsafe { call_native(member, address, signature, &args) }
            }
        }
    }

    fn check_disposed(&self, member: &str) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::DisposedAccess {
                interface: self.ty.interface.name.clone(),
                member: member.to_string(),
            });
        }
        Ok(())
    }

    fn execute_lowered(
        &self,
        method: &MethodDef,
        member: &str,
        target: MethodId,
        params: &[Option<Arc<dyn TypeTransformer>>],
        ret: Option<&Arc<dyn TypeTransformer>>,
        args: Vec<Value>,
    ) -> Result<Value> {
        let mut scratch = ScratchBuffers::new(self.ty.allocator.as_ref());
        let mut lowered = Vec::with_capacity(args.len());
        for (index, (value, transformer)) in args.into_iter().zip(params).enumerate() {
            let Some(transformer) = transformer else {
                lowered.push(value);
                continue;
            };
            let param = &method.decl.params[index];
            let position = Position::Param {
                index,
                name: &param.name,
            };
            let mut ctx = MarshalContext::new(member, position, param.ownership, &mut scratch);
            lowered.push(transformer.lower(value, &mut ctx)?);
        }

        let result = self.execute(target, lowered)?;
        scratch.commit_transfers();

        match ret {
            Some(transformer) => {
                let mut ctx = MarshalContext::new(
                    member,
                    Position::Return,
                    method.decl.ret.ownership,
                    &mut scratch,
                );
                transformer.raise(result, &mut ctx)
            }
            None => Ok(result),
        }
    }

    fn execute_nullable(
        &self,
        method: &MethodDef,
        member: &str,
        target: MethodId,
        params: &[Option<NullableMarshal>],
        ret: Option<&NullableMarshal>,
        args: Vec<Value>,
    ) -> Result<Value> {
        let mut scratch = ScratchBuffers::new(self.ty.allocator.as_ref());
        let mut marshalled = Vec::with_capacity(args.len());
        for (index, (value, marshal)) in args.into_iter().zip(params).enumerate() {
            match marshal {
                Some(marshal) => {
                    let name = &method.decl.params[index].name;
                    marshalled.push(marshal_in(member, name, value, marshal, &mut scratch)?);
                }
                None => marshalled.push(value),
            }
        }

        let result = self.execute(target, marshalled)?;
        scratch.commit_transfers();

        match ret {
            Some(marshal) => marshal_out(member, result, marshal, scratch.allocator()),
            None => Ok(result),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("interface", &self.ty.interface.name)
            .field("resolver", &self.resolver.describe())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

fn check_arguments(decl: &MemberDecl, args: &[Value]) -> Result<()> {
    if args.len() != decl.params.len() {
        return Err(Error::argument_mismatch(
            &decl.name,
            format!("expected {} arguments, got {}", decl.params.len(), args.len()),
        ));
    }
    for (param, value) in decl.params.iter().zip(args) {
        if !value.conforms_to(&param.ty) {
            return Err(Error::argument_mismatch(
                &decl.name,
                format!(
                    "parameter `{}` expects {}, got {}",
                    param.name,
                    param.ty,
                    value.kind()
                ),
            ));
        }
    }
    Ok(())
}

/// Absent becomes a null pointer; present is copied into a fresh buffer.
fn marshal_in(
    member: &str,
    name: &str,
    value: Value,
    marshal: &NullableMarshal,
    scratch: &mut ScratchBuffers<'_>,
) -> Result<Value> {
    let inner = match value {
        Value::Optional(None) => return Ok(Value::null()),
        Value::Optional(Some(inner)) => *inner,
        other => {
            return Err(Error::marshalling(
                member,
                format!(
                    "parameter `{name}` expects an optional {}, got {}",
                    marshal.underlying,
                    other.kind()
                ),
            ))
        }
    };
    let size = marshal.underlying.size();
    let buf = scratch.allocate(size);
    if buf.is_null() {
        return Err(Error::marshalling(
            member,
            format!("failed to allocate {size} bytes for parameter `{name}`"),
        ));
    }
    if marshal.ownership.caller_frees() {
        scratch.track(buf);
    } else {
        scratch.transfer(buf);
    }
    if !unsafe { write_value(buf, marshal.underlying, &inner) } {
        return Err(Error::marshalling(
            member,
            format!(
                "parameter `{name}` expects {}, got {}",
                marshal.underlying,
                inner.kind()
            ),
        ));
    }
    Ok(Value::Pointer(buf))
}

/// Null becomes absent; otherwise the value is copied out of the buffer.
fn marshal_out(
    member: &str,
    value: Value,
    marshal: &NullableMarshal,
    allocator: &dyn NativeAllocator,
) -> Result<Value> {
    let ptr = value.as_pointer().ok_or_else(|| {
        Error::marshalling(
            member,
            format!("expected a pointer result, got {}", value.kind()),
        )
    })?;
    if ptr.is_null() {
        return Ok(Value::none());
    }
    let inner = unsafe { read_value(ptr, marshal.underlying) };
    if marshal.ownership.caller_frees() {
        unsafe { allocator.free(ptr) };
    }
    Ok(Value::some(inner))
}
