mod common;

use common::CountingAllocator;
use fb_pipeline::{
    BindingConfig, BindingFactory, Error, FnTransformer, InterfaceDecl, MarshalContext,
    LibcAllocator, MemberDecl, NativeType, OptionalStage, Ownership, Position, Record, Result,
    ScratchBuffers, StageSet, StringTransformer, SymbolTable, TransformerRegistry, TypeRef,
    TypeTransformer, Value,
};
use pretty_assertions::assert_eq;
use std::ffi::{c_char, c_void, CStr};
use std::sync::{Arc, Mutex};

extern "C" fn add_degrees(base: f64, delta: f64) -> f64 {
    base + delta
}

extern "C" fn greeting_len(s: *const c_char) -> usize {
    unsafe { CStr::from_ptr(s) }.to_bytes().len()
}

extern "C" fn library_name() -> *const c_char {
    b"ferrobind\0".as_ptr() as *const c_char
}

extern "C" fn shout(s: *const c_char) -> *mut c_char {
    let text = unsafe { CStr::from_ptr(s) }.to_string_lossy().to_uppercase();
    unsafe {
        let buf = libc::malloc(text.len() + 1) as *mut u8;
        std::ptr::copy_nonoverlapping(text.as_ptr(), buf, text.len());
        *buf.add(text.len()) = 0;
        buf as *mut c_char
    }
}

extern "C" fn lookup_id(id: *const i32) -> *const i32 {
    static FOUND: i32 = 7;
    if id.is_null() || unsafe { *id } != 7 {
        std::ptr::null()
    } else {
        &FOUND
    }
}

/// `celsius` values are records carrying one f64 field.
fn celsius_transformer(log: Arc<Mutex<Vec<String>>>) -> impl TypeTransformer {
    let lower_log = log.clone();
    FnTransformer::new(
        NativeType::F64,
        move |value, ctx| {
            lower_log.lock().unwrap().push(format!("lower {}", ctx.position()));
            match value {
                Value::Record(record) if record.fields.len() == 1 => Ok(record.fields[0].clone()),
                other => Err(ctx.error(format!("expected a celsius record, got {}", other.kind()))),
            }
        },
        move |value, ctx| {
            log.lock().unwrap().push(format!("raise {}", ctx.position()));
            Ok(Value::Record(Record::new("celsius", vec![value])))
        },
    )
}

fn celsius(v: f64) -> Value {
    Value::Record(Record::new("celsius", vec![Value::F64(v)]))
}

#[test]
fn complex_types_are_lowered_and_raised_in_order() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry =
        TransformerRegistry::new().with("celsius", celsius_transformer(log.clone()))?;
    let decl = InterfaceDecl::new("Thermostat").member(
        MemberDecl::new("add_degrees")
            .param("base", TypeRef::named("celsius"))
            .param("delta", NativeType::F64)
            .returns(TypeRef::named("celsius")),
    );
    let symbols =
        Arc::new(SymbolTable::new().with_fn("add_degrees", add_degrees as *const c_void));
    let binding = BindingFactory::new(registry).activate(&decl, BindingConfig::new(), symbols)?;

    let out = binding.invoke("add_degrees", vec![celsius(20.5), Value::F64(1.5)])?;
    assert_eq!(out, celsius(22.0));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["lower parameter `base`".to_string(), "raise return value".to_string()]
    );

    let err = binding
        .invoke("add_degrees", vec![Value::Str("hot".into()), Value::F64(0.0)])
        .unwrap_err();
    assert!(matches!(err, Error::Marshalling { .. }));
    Ok(())
}

extern "C" fn echo_ptr(v: *mut c_void) -> *mut c_void {
    v
}

#[test]
fn every_builtin_transformer_survives_an_echo_call() -> Result<()> {
    let samples = [("string", Value::Str("native ✓".into()))];
    let factory = BindingFactory::default();
    for (key, sample) in samples {
        let lowered = factory
            .registry()
            .get(&key.into())
            .map(|transformer| transformer.lowered_type())
            .ok_or_else(|| Error::Generic(format!("missing transformer {key}")))?;
        assert_eq!(lowered, TypeRef::Native(NativeType::Pointer));

        let decl = InterfaceDecl::new("Echo").member(
            MemberDecl::new("echo")
                .with_symbol("echo_ptr")
                .param_owned("v", TypeRef::named(key), Ownership::CallerFrees)
                .returns(TypeRef::named(key)),
        );
        let symbols = Arc::new(SymbolTable::new().with_fn("echo_ptr", echo_ptr as *const c_void));
        let binding = factory.activate(&decl, BindingConfig::new(), symbols)?;
        assert_eq!(binding.invoke("echo", vec![sample.clone()])?, sample);
    }
    Ok(())
}

#[test]
fn transformers_can_be_driven_by_hand() -> Result<()> {
    let alloc = LibcAllocator;
    let mut scratch = ScratchBuffers::new(&alloc);
    let position = Position::Param { index: 0, name: "v" };
    let lowered = {
        let mut ctx =
            MarshalContext::new("RoundTrip", position, Ownership::CallerFrees, &mut scratch);
        StringTransformer.lower(Value::Str("by hand".into()), &mut ctx)?
    };
    assert!(lowered.conforms_to(&StringTransformer.lowered_type()));
    let mut ctx =
        MarshalContext::new("RoundTrip", Position::Return, Ownership::NativeFrees, &mut scratch);
    assert_eq!(
        StringTransformer.raise(lowered, &mut ctx)?,
        Value::Str("by hand".into())
    );
    Ok(())
}

#[test]
fn strings_cross_the_boundary() -> Result<()> {
    let allocator = Arc::new(CountingAllocator::default());
    let factory = BindingFactory::default().with_allocator(allocator.clone());
    let decl = InterfaceDecl::new("Strings")
        .member(
            MemberDecl::new("greeting_len")
                .param_owned("s", TypeRef::named("string"), Ownership::CallerFrees)
                .returns(NativeType::Usize),
        )
        .member(MemberDecl::new("library_name").returns(TypeRef::named("string")))
        .member(
            MemberDecl::new("shout")
                .param_owned("s", TypeRef::named("string"), Ownership::CallerFrees)
                .returns_owned(TypeRef::named("string"), Ownership::CallerFrees),
        );
    let symbols = SymbolTable::new()
        .with_fn("greeting_len", greeting_len as *const c_void)
        .with_fn("library_name", library_name as *const c_void)
        .with_fn("shout", shout as *const c_void);
    let binding = factory.activate(&decl, BindingConfig::new(), Arc::new(symbols))?;

    assert_eq!(binding.call::<usize>("greeting_len", vec![Value::Str("hello".into())])?, 5);
    assert_eq!((allocator.allocations(), allocator.frees()), (1, 1));

    assert_eq!(binding.call::<String>("library_name", vec![])?, "ferrobind");
    assert_eq!((allocator.allocations(), allocator.frees()), (1, 1));

    assert_eq!(binding.call::<String>("shout", vec![Value::Str("quiet".into())])?, "QUIET");
    assert_eq!((allocator.allocations(), allocator.frees()), (2, 3));
    Ok(())
}

#[test]
fn lowering_composes_with_nullable_marshalling() -> Result<()> {
    let maybe_id = FnTransformer::new(
        TypeRef::Nullable(NativeType::I32),
        |value, _ctx| {
            Ok(match value {
                Value::Str(text) => match text.parse::<i32>() {
                    Ok(id) => Value::some(Value::I32(id)),
                    Err(_) => Value::none(),
                },
                other => other,
            })
        },
        |value, _ctx| {
            Ok(match value.into_optional() {
                Some(Some(Value::I32(id))) => Value::Str(id.to_string()),
                _ => Value::Str(String::new()),
            })
        },
    );
    let registry = TransformerRegistry::new().with("user_id", maybe_id)?;
    let decl = InterfaceDecl::new("Users").member(
        MemberDecl::new("lookup_id")
            .param_owned("id", TypeRef::named("user_id"), Ownership::CallerFrees)
            .returns(TypeRef::named("user_id")),
    );
    let factory = BindingFactory::new(registry);
    let ty = factory.generate(&decl, BindingConfig::new())?;
    let stages: Vec<_> = ty.notes().iter().map(|note| note.stage).collect();
    assert_eq!(stages, vec!["disposal-guard", "lowered", "nullable", "direct-call"]);
    assert!(ty.method("lookup_id_lowered_0").is_some());
    assert!(ty.method("lookup_id_marshalled_0").is_some());

    let symbols = Arc::new(SymbolTable::new().with_fn("lookup_id", lookup_id as *const c_void));
    let binding = ty.instantiate(symbols)?;
    assert_eq!(
        binding.invoke("lookup_id", vec![Value::Str("7".into())])?,
        Value::Str("7".into())
    );
    assert_eq!(
        binding.invoke("lookup_id", vec![Value::Str("8".into())])?,
        Value::Str(String::new())
    );
    assert_eq!(
        binding.invoke("lookup_id", vec![Value::Str("not a number".into())])?,
        Value::Str(String::new())
    );
    Ok(())
}

#[test]
fn missing_transformers_fail_generation() {
    let decl = InterfaceDecl::new("Shapes").member(
        MemberDecl::new("area")
            .param("shape", TypeRef::named("polygon"))
            .returns(NativeType::F64),
    );
    let err = BindingFactory::default()
        .generate(&decl, BindingConfig::new())
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { ref member, .. } if member == "area"));
    assert!(err.to_string().contains("`polygon` has no registered transformer"));
}

#[test]
fn disabled_lowering_rejects_complex_members() {
    let decl = InterfaceDecl::new("Strings").member(
        MemberDecl::new("library_name").returns(TypeRef::named("string")),
    );
    let config =
        BindingConfig::new().with_stages(StageSet::all().without(OptionalStage::Lowering));
    let err = BindingFactory::default().generate(&decl, config).unwrap_err();
    assert!(err.is_generation_time());
    assert!(err.to_string().contains("lowering stage is disabled"));
}

#[test]
fn duplicate_transformers_are_ambiguous() {
    let err = TransformerRegistry::with_defaults()
        .with("string", StringTransformer)
        .unwrap_err();
    assert!(err.is_generation_time());
}

#[cfg(unix)]
#[test]
fn binds_libc_strlen() -> Result<()> {
    let libc = Arc::new(fb_pipeline::DynamicLibrary::open_default()?);
    let decl = InterfaceDecl::new("LibC").member(
        MemberDecl::new("strlen")
            .param_owned("s", TypeRef::named("string"), Ownership::CallerFrees)
            .returns(NativeType::Usize),
    );
    let binding = BindingFactory::default().activate(&decl, BindingConfig::new(), libc)?;
    assert_eq!(binding.invoke("strlen", vec![Value::Str("hello".into())])?, Value::Usize(5));
    Ok(())
}
