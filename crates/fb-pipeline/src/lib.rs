//! Generation of adapter types that forward interface calls to native
//! shared-library functions.
//!
//! A [`BindingFactory`] runs an interface declaration through the generator
//! stages, caches the resulting [`BindingType`], and activates independent
//! [`Binding`] instances against a symbol resolver.

pub mod adapter;
pub mod binding;
pub mod error;
pub mod factory;
pub mod interface;
pub mod pipeline;
pub mod stage;
pub mod stages;
pub mod transform;
pub mod work_unit;

pub use adapter::{AdapterBody, MethodDef, MethodId, NullableMarshal, SlotDef, SlotId};
pub use binding::{Binding, BindingType};
pub use error::{GenerationDiagnostics, GenerationNote};
pub use factory::BindingFactory;
pub use interface::NativeInterface;
pub use pipeline::BindingPipeline;
pub use stage::{GenerationContext, GeneratorStage, StageComplexity};
pub use transform::{
    FnTransformer, MarshalContext, Position, StringTransformer, TransformerRegistry,
    TypeTransformer,
};
pub use work_unit::WorkUnit;

pub use fb_core::{
    BindingConfig, CallingConvention, Error, InterfaceDecl, MemberDecl, NativeType, NativeValue,
    OptionalStage, Ownership, Record, Result, StageSet, TypeKey, TypeRef, Value,
};
pub use fb_native::{
    DynamicLibrary, LibcAllocator, NativeAllocator, ScratchBuffers, SymbolResolver, SymbolTable,
};
