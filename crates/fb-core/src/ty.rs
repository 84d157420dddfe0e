use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A type whose in-memory representation crosses the native boundary as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeType {
    Void,
    /// Crosses as a one-byte integer, zero is false.
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Isize,
    Usize,
    F32,
    F64,
    Pointer,
}

impl NativeType {
    /// Size in bytes of the native representation.
    pub fn size(&self) -> usize {
        match self {
            NativeType::Void => 0,
            NativeType::Bool | NativeType::I8 | NativeType::U8 => 1,
            NativeType::I16 | NativeType::U16 => 2,
            NativeType::I32 | NativeType::U32 | NativeType::F32 => 4,
            NativeType::I64 | NativeType::U64 | NativeType::F64 => 8,
            NativeType::Isize | NativeType::Usize | NativeType::Pointer => {
                std::mem::size_of::<usize>()
            }
        }
    }

    pub fn alignment(&self) -> usize {
        self.size().max(1)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, NativeType::Void)
    }

    pub fn name(&self) -> &'static str {
        match self {
            NativeType::Void => "void",
            NativeType::Bool => "bool",
            NativeType::I8 => "i8",
            NativeType::I16 => "i16",
            NativeType::I32 => "i32",
            NativeType::I64 => "i64",
            NativeType::U8 => "u8",
            NativeType::U16 => "u16",
            NativeType::U32 => "u32",
            NativeType::U64 => "u64",
            NativeType::Isize => "isize",
            NativeType::Usize => "usize",
            NativeType::F32 => "f32",
            NativeType::F64 => "f64",
            NativeType::Pointer => "ptr",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a complex type handled by a registered transformer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    pub const fn from_static(name: &'static str) -> Self {
        TypeKey(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        TypeKey(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        TypeKey::from_static(name)
    }
}

/// The declared shape of a parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    Native(NativeType),
    /// An optional value type, marshalled through a scratch buffer.
    Nullable(NativeType),
    /// A complex type that must be lowered by a registered transformer.
    Named(TypeKey),
}

impl TypeRef {
    pub fn named(key: impl Into<TypeKey>) -> Self {
        TypeRef::Named(key.into())
    }

    pub fn is_directly_passable(&self) -> bool {
        matches!(self, TypeRef::Native(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Native(NativeType::Void))
    }

    pub fn as_native(&self) -> Option<NativeType> {
        match self {
            TypeRef::Native(ty) => Some(*ty),
            _ => None,
        }
    }

    /// Whether a buffer lives behind this shape, making ownership annotations meaningful.
    pub fn is_buffer_shaped(&self) -> bool {
        match self {
            TypeRef::Native(ty) => matches!(ty, NativeType::Pointer),
            TypeRef::Nullable(_) | TypeRef::Named(_) => true,
        }
    }
}

impl From<NativeType> for TypeRef {
    fn from(ty: NativeType) -> Self {
        TypeRef::Native(ty)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Native(ty) => write!(f, "{ty}"),
            TypeRef::Nullable(ty) => write!(f, "{ty}?"),
            TypeRef::Named(key) => write!(f, "{key}"),
        }
    }
}

/// Who releases the buffer behind a parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    #[default]
    NativeFrees,
    CallerFrees,
}

impl Ownership {
    pub fn caller_frees(&self) -> bool {
        matches!(self, Ownership::CallerFrees)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallingConvention {
    #[default]
    C,
    System,
    Cdecl,
    Stdcall,
    FastCall,
    ThisCall,
}

impl CallingConvention {
    /// Conventions that map onto the platform default ABI.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            CallingConvention::C | CallingConvention::System | CallingConvention::Cdecl
        )
    }
}
