use crate::binding::Binding;
use fb_core::InterfaceDecl;

/// A Rust interface whose methods forward to a [`Binding`].
///
/// Implemented by [`native_interface!`](crate::native_interface).
pub trait NativeInterface: Sized {
    fn declaration() -> InterfaceDecl;

    fn from_binding(binding: Binding) -> Self;
}

/// Declare a trait together with a binding struct implementing it.
///
/// ```ignore
/// native_interface! {
///     pub trait Calculator for CalculatorBinding {
///         #[symbol = "calc_multiply"]
///         fn multiply(a: i32, b: i32) -> i32;
///         fn reset() -> ();
///     }
/// }
/// ```
///
/// Each method returns `fb_core::Result<T>`; parameter and return types must
/// implement `NativeValue`.
#[macro_export]
macro_rules! native_interface {
    (
        $(#[$meta:meta])*
        $vis:vis trait $name:ident for $binding:ident {
            $(
                $(#[symbol = $symbol:literal])?
                fn $method:ident($($arg:ident : $arg_ty:ty),* $(,)?) -> $ret:ty;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis trait $name {
            $(
                fn $method(&self, $($arg: $arg_ty),*) -> $crate::Result<$ret>;
            )*
        }

        $vis struct $binding {
            inner: $crate::Binding,
        }

        impl $binding {
            pub fn binding(&self) -> &$crate::Binding {
                &self.inner
            }

            pub fn dispose(&self) -> bool {
                self.inner.dispose()
            }
        }

        impl $crate::NativeInterface for $binding {
            fn declaration() -> $crate::InterfaceDecl {
                let mut decl = $crate::InterfaceDecl::new(stringify!($name));
                $(
                    decl.push(
                        $crate::MemberDecl::new(stringify!($method))
                            $(.param(stringify!($arg), <$arg_ty as $crate::NativeValue>::type_ref()))*
                            .returns(<$ret as $crate::NativeValue>::type_ref())
                            $(.with_symbol($symbol))?
                    );
                )*
                decl
            }

            fn from_binding(inner: $crate::Binding) -> Self {
                Self { inner }
            }
        }

        impl $name for $binding {
            $(
                fn $method(&self, $($arg: $arg_ty),*) -> $crate::Result<$ret> {
                    let value = self.inner.invoke(
                        stringify!($method),
                        vec![$($crate::NativeValue::into_value($arg)),*],
                    )?;
                    <$ret as $crate::NativeValue>::from_value(value)
                }
            )*
        }
    };
}
