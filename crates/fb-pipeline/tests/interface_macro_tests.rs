use fb_pipeline::{
    native_interface, BindingConfig, BindingFactory, Error, NativeInterface, NativeType, Result,
    SymbolTable, TypeRef,
};
use pretty_assertions::assert_eq;
use std::ffi::c_void;
use std::sync::Arc;

native_interface! {
    /// A calculator exported by a native library.
    pub trait Calculator for CalculatorBinding {
        #[symbol = "calc_multiply"]
        fn multiply(a: i32, b: i32) -> i32;
        fn halve(value: Option<f64>) -> Option<f64>;
        fn describe(code: u8) -> String;
        fn reset() -> ();
    }
}

extern "C" fn calc_multiply(a: i32, b: i32) -> i32 {
    a * b
}

/// Takes ownership of `value`; the result is static.
extern "C" fn halve(value: *mut f64) -> *const f64 {
    static HALF: f64 = 0.5;
    if value.is_null() {
        return std::ptr::null();
    }
    unsafe { libc::free(value as *mut c_void) };
    &HALF
}

extern "C" fn describe(code: u8) -> *const std::ffi::c_char {
    let text: &'static [u8] = if code == 0 { b"ok\0" } else { b"failed\0" };
    text.as_ptr() as *const std::ffi::c_char
}

extern "C" fn reset() {}

fn symbols() -> Arc<SymbolTable> {
    Arc::new(
        SymbolTable::new()
            .with_fn("calc_multiply", calc_multiply as *const c_void)
            .with_fn("halve", halve as *const c_void)
            .with_fn("describe", describe as *const c_void)
            .with_fn("reset", reset as *const c_void),
    )
}

#[test]
fn declaration_follows_the_trait() {
    let decl = CalculatorBinding::declaration();
    assert_eq!(decl.name, "Calculator");
    let names: Vec<_> = decl.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["multiply", "halve", "describe", "reset"]);

    let (_, multiply) = decl.find("multiply").unwrap();
    assert_eq!(multiply.symbol_name(), "calc_multiply");
    assert_eq!(multiply.ret.ty, TypeRef::Native(NativeType::I32));

    let (_, halve) = decl.find("halve").unwrap();
    assert_eq!(halve.params[0].ty, TypeRef::Nullable(NativeType::F64));
    assert_eq!(halve.symbol_name(), "halve");

    let (_, describe) = decl.find("describe").unwrap();
    assert_eq!(describe.ret.ty, TypeRef::named("string"));
}

#[test]
fn typed_calls_forward_to_native_code() -> Result<()> {
    let calc: CalculatorBinding =
        BindingFactory::default().activate_as(BindingConfig::new(), symbols())?;
    assert_eq!(calc.multiply(6, 7)?, 42);
    assert_eq!(calc.halve(Some(1.0))?, Some(0.5));
    assert_eq!(calc.halve(None)?, None);
    assert_eq!(calc.describe(0)?, "ok");
    assert_eq!(calc.describe(3)?, "failed");
    calc.reset()?;

    assert!(calc.dispose());
    assert!(calc.binding().is_disposed());
    assert!(matches!(
        calc.multiply(1, 1),
        Err(Error::DisposedAccess { ref member, .. }) if member == "multiply"
    ));
    Ok(())
}

#[test]
fn typed_bindings_share_the_cached_type() -> Result<()> {
    let factory = BindingFactory::default();
    let config = BindingConfig::new().with_lazy_binding(true);
    let a: CalculatorBinding = factory.activate_as(config, symbols())?;
    let b: CalculatorBinding = factory.activate_as(config, symbols())?;
    assert!(Arc::ptr_eq(a.binding().binding_type(), b.binding().binding_type()));
    assert_eq!(factory.cached_types(), 1);
    Ok(())
}
