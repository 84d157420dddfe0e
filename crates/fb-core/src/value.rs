use crate::error::{Error, Result};
use crate::ty::{NativeType, TypeKey, TypeRef};
use std::ffi::c_void;

/// A value flowing through a binding, on either side of the native boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Isize(isize),
    Usize(usize),
    F32(f32),
    F64(f64),
    Pointer(*mut c_void),
    Optional(Option<Box<Value>>),
    Str(String),
    Record(Record),
}

// Safety: pointers carried by a `Value` are plain addresses; dereferencing
// them is confined to the marshalling code that owns the buffer.
unsafe impl Send for Value {}
unsafe impl Sync for Value {}

/// A structured complex value, tagged with the transformer key that handles it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub ty: TypeKey,
    pub fields: Vec<Value>,
}

impl Record {
    pub fn new(ty: impl Into<TypeKey>, fields: Vec<Value>) -> Self {
        Self {
            ty: ty.into(),
            fields,
        }
    }
}

impl Value {
    pub fn null() -> Self {
        Value::Pointer(std::ptr::null_mut())
    }

    pub fn some(value: Value) -> Self {
        Value::Optional(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Value::Optional(None)
    }

    /// The native type of a directly passable value.
    pub fn native_type(&self) -> Option<NativeType> {
        Some(match self {
            Value::Void => NativeType::Void,
            Value::Bool(_) => NativeType::Bool,
            Value::I8(_) => NativeType::I8,
            Value::I16(_) => NativeType::I16,
            Value::I32(_) => NativeType::I32,
            Value::I64(_) => NativeType::I64,
            Value::U8(_) => NativeType::U8,
            Value::U16(_) => NativeType::U16,
            Value::U32(_) => NativeType::U32,
            Value::U64(_) => NativeType::U64,
            Value::Isize(_) => NativeType::Isize,
            Value::Usize(_) => NativeType::Usize,
            Value::F32(_) => NativeType::F32,
            Value::F64(_) => NativeType::F64,
            Value::Pointer(_) => NativeType::Pointer,
            Value::Optional(_) | Value::Str(_) | Value::Record(_) => return None,
        })
    }

    /// Whether this value may be passed where `ty` is declared.
    ///
    /// Named types accept any value; the transformer validates the payload.
    pub fn conforms_to(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Native(native) => self.native_type() == Some(*native),
            TypeRef::Nullable(native) => match self {
                Value::Optional(None) => true,
                Value::Optional(Some(inner)) => inner.native_type() == Some(*native),
                _ => false,
            },
            TypeRef::Named(_) => true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Optional(_) => "optional",
            Value::Str(_) => "string",
            Value::Record(_) => "record",
            other => other.native_type().map(|ty| ty.name()).unwrap_or("value"),
        }
    }

    pub fn as_pointer(&self) -> Option<*mut c_void> {
        match self {
            Value::Pointer(ptr) => Some(*ptr),
            _ => None,
        }
    }

    pub fn into_optional(self) -> Option<Option<Value>> {
        match self {
            Value::Optional(inner) => Some(inner.map(|boxed| *boxed)),
            _ => None,
        }
    }
}

/// Conversion between Rust types and binding values.
pub trait NativeValue: Sized {
    fn type_ref() -> TypeRef;
    fn into_value(self) -> Value;
    fn from_value(value: Value) -> Result<Self>;
}

/// Rust types that map one-to-one onto a [`NativeType`].
pub trait NativePrimitive: NativeValue {
    const NATIVE: NativeType;
}

fn unexpected<T>(expected: &str, found: &Value) -> Result<T> {
    Err(Error::Generic(format!(
        "expected a {expected} value, found {}",
        found.kind()
    )))
}

macro_rules! native_primitive {
    ($($rust:ty => $variant:ident),* $(,)?) => {
        $(
            impl NativeValue for $rust {
                fn type_ref() -> TypeRef {
                    TypeRef::Native(NativeType::$variant)
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => unexpected(NativeType::$variant.name(), &other),
                    }
                }
            }

            impl NativePrimitive for $rust {
                const NATIVE: NativeType = NativeType::$variant;
            }
        )*
    };
}

native_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    isize => Isize,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

impl NativeValue for *mut c_void {
    fn type_ref() -> TypeRef {
        TypeRef::Native(NativeType::Pointer)
    }

    fn into_value(self) -> Value {
        Value::Pointer(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Pointer(ptr) => Ok(ptr),
            other => unexpected("pointer", &other),
        }
    }
}

impl NativeValue for () {
    fn type_ref() -> TypeRef {
        TypeRef::Native(NativeType::Void)
    }

    fn into_value(self) -> Value {
        Value::Void
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Void => Ok(()),
            other => unexpected("void", &other),
        }
    }
}

impl<T: NativePrimitive> NativeValue for Option<T> {
    fn type_ref() -> TypeRef {
        TypeRef::Nullable(T::NATIVE)
    }

    fn into_value(self) -> Value {
        Value::Optional(self.map(|v| Box::new(v.into_value())))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Optional(None) => Ok(None),
            Value::Optional(Some(inner)) => T::from_value(*inner).map(Some),
            other => unexpected("optional", &other),
        }
    }
}

impl NativeValue for String {
    fn type_ref() -> TypeRef {
        TypeRef::Named(TypeKey::from_static("string"))
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => unexpected("string", &other),
        }
    }
}
