use crate::resolver::NativeAddress;
use fb_core::{CallingConvention, Error, NativeType, Result, Value};
use itertools::Itertools;
use libffi::middle::{Arg, Cif, CodePtr, Type};
use std::ffi::c_void;
use std::fmt;

/// The exact native shape of a bound entry point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativeSignature {
    pub params: Vec<NativeType>,
    pub ret: NativeType,
    pub convention: CallingConvention,
}

impl NativeSignature {
    pub fn new(params: Vec<NativeType>, ret: NativeType) -> Self {
        Self {
            params,
            ret,
            convention: CallingConvention::default(),
        }
    }

    pub fn with_convention(mut self, convention: CallingConvention) -> Self {
        self.convention = convention;
        self
    }

    fn cif(&self) -> Cif {
        Cif::new(self.params.iter().map(|ty| ffi_type(*ty)), ffi_type(self.ret))
    }
}

impl fmt::Display for NativeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "extern \"{}\" fn({}) -> {}",
            self.convention,
            self.params.iter().join(", "),
            self.ret
        )
    }
}

#[derive(Debug)]
enum FfiArgValue {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Isize(isize),
    Usize(usize),
    F32(f32),
    F64(f64),
    Ptr(*mut c_void),
}

fn ffi_type(ty: NativeType) -> Type {
    match ty {
        NativeType::Void => Type::void(),
        NativeType::Bool | NativeType::U8 => Type::u8(),
        NativeType::I8 => Type::i8(),
        NativeType::I16 => Type::i16(),
        NativeType::U16 => Type::u16(),
        NativeType::I32 => Type::i32(),
        NativeType::U32 => Type::u32(),
        NativeType::I64 => Type::i64(),
        NativeType::U64 => Type::u64(),
        NativeType::Isize => Type::isize(),
        NativeType::Usize => Type::usize(),
        NativeType::F32 => Type::f32(),
        NativeType::F64 => Type::f64(),
        NativeType::Pointer => Type::pointer(),
    }
}

fn arg_value(member: &str, index: usize, ty: NativeType, value: &Value) -> Result<FfiArgValue> {
    Ok(match (ty, value) {
        (NativeType::Bool, Value::Bool(v)) => FfiArgValue::U8(*v as u8),
        (NativeType::I8, Value::I8(v)) => FfiArgValue::I8(*v),
        (NativeType::U8, Value::U8(v)) => FfiArgValue::U8(*v),
        (NativeType::I16, Value::I16(v)) => FfiArgValue::I16(*v),
        (NativeType::U16, Value::U16(v)) => FfiArgValue::U16(*v),
        (NativeType::I32, Value::I32(v)) => FfiArgValue::I32(*v),
        (NativeType::U32, Value::U32(v)) => FfiArgValue::U32(*v),
        (NativeType::I64, Value::I64(v)) => FfiArgValue::I64(*v),
        (NativeType::U64, Value::U64(v)) => FfiArgValue::U64(*v),
        (NativeType::Isize, Value::Isize(v)) => FfiArgValue::Isize(*v),
        (NativeType::Usize, Value::Usize(v)) => FfiArgValue::Usize(*v),
        (NativeType::F32, Value::F32(v)) => FfiArgValue::F32(*v),
        (NativeType::F64, Value::F64(v)) => FfiArgValue::F64(*v),
        (NativeType::Pointer, Value::Pointer(v)) => FfiArgValue::Ptr(*v),
        (ty, value) => {
            return Err(Error::argument_mismatch(
                member,
                format!(
                    "native argument {index} expects {ty}, got {}",
                    value.kind()
                ),
            ))
        }
    })
}

/// Call the entry point at `address` with `args`, exactly as `sig` declares.
///
/// # Safety
///
/// `address` must point to a function whose native signature is `sig`, and
/// pointer arguments must satisfy whatever that function expects of them.
pub unsafe fn call_native(
    member: &str,
    address: NativeAddress,
    sig: &NativeSignature,
    args: &[Value],
) -> Result<Value> {
    if sig.params.len() != args.len() {
        return Err(Error::argument_mismatch(
            member,
            format!(
                "native call expects {} arguments, got {}",
                sig.params.len(),
                args.len()
            ),
        ));
    }
    let arg_values = sig
        .params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(index, (ty, value))| arg_value(member, index, *ty, value))
        .collect::<Result<Vec<_>>>()?;
    let ffi_args: Vec<Arg<'_>> = arg_values
        .iter()
        .map(|value| match value {
            FfiArgValue::I8(v) => Arg::new(v),
            FfiArgValue::U8(v) => Arg::new(v),
            FfiArgValue::I16(v) => Arg::new(v),
            FfiArgValue::U16(v) => Arg::new(v),
            FfiArgValue::I32(v) => Arg::new(v),
            FfiArgValue::U32(v) => Arg::new(v),
            FfiArgValue::I64(v) => Arg::new(v),
            FfiArgValue::U64(v) => Arg::new(v),
            FfiArgValue::Isize(v) => Arg::new(v),
            FfiArgValue::Usize(v) => Arg::new(v),
            FfiArgValue::F32(v) => Arg::new(v),
            FfiArgValue::F64(v) => Arg::new(v),
            FfiArgValue::Ptr(v) => Arg::new(v),
        })
        .collect();

    let cif = sig.cif();
    let code = CodePtr::from_ptr(address.as_ptr());
    Ok(unsafe { invoke(&cif, code, sig.ret, &ffi_args) })
}

unsafe fn invoke(cif: &Cif, code: CodePtr, ret: NativeType, args: &[Arg<'_>]) -> Value {
    unsafe {
        match ret {
            NativeType::Void => {
                let _: () = cif.call(code, args);
                Value::Void
            }
            NativeType::Bool => Value::Bool(cif.call::<u8>(code, args) != 0),
            NativeType::I8 => Value::I8(cif.call::<i8>(code, args)),
            NativeType::U8 => Value::U8(cif.call::<u8>(code, args)),
            NativeType::I16 => Value::I16(cif.call::<i16>(code, args)),
            NativeType::U16 => Value::U16(cif.call::<u16>(code, args)),
            NativeType::I32 => Value::I32(cif.call::<i32>(code, args)),
            NativeType::U32 => Value::U32(cif.call::<u32>(code, args)),
            NativeType::I64 => Value::I64(cif.call::<i64>(code, args)),
            NativeType::U64 => Value::U64(cif.call::<u64>(code, args)),
            NativeType::Isize => Value::Isize(cif.call::<isize>(code, args)),
            NativeType::Usize => Value::Usize(cif.call::<usize>(code, args)),
            NativeType::F32 => Value::F32(cif.call::<f32>(code, args)),
            NativeType::F64 => Value::F64(cif.call::<f64>(code, args)),
            NativeType::Pointer => Value::Pointer(cif.call::<*mut c_void>(code, args)),
        }
    }
}
