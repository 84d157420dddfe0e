use crate::resolver::{NativeAddress, SymbolLookupError, SymbolResolver};
use eyre::WrapErr;
use fb_core::Result;
use libloading::Library;
use std::ffi::{c_void, OsStr};
use std::fmt;

/// A shared library whose exports back a binding.
///
/// The library stays loaded for as long as this value (or an `Arc` of it
/// held by a binding) is alive.
pub struct DynamicLibrary {
    name: String,
    library: Library,
}

impl DynamicLibrary {
    /// Load the shared library at `path`.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers; the caller must trust it.
    pub unsafe fn open(path: impl AsRef<OsStr>) -> Result<Self> {
        let path = path.as_ref();
        let library = unsafe { Library::new(path) }
            .wrap_err_with(|| format!("failed to load library '{}'", path.to_string_lossy()))?;
        fb_core::debug!("loaded native library {}", path.to_string_lossy());
        Ok(Self {
            name: path.to_string_lossy().into_owned(),
            library,
        })
    }

    /// The platform C runtime, tried under its usual names.
    pub fn open_default() -> Result<Self> {
        let mut errors = Vec::new();
        for lib in default_libs() {
            match unsafe { Self::open(lib) } {
                Ok(lib) => return Ok(lib),
                Err(err) => errors.push(err.to_string()),
            }
        }
        Self::open_self().map_err(|err| {
            let mut message = String::from("failed to open default native library");
            for detail in errors {
                message.push_str(&format!("; {detail}"));
            }
            fb_core::Error::Generic(format!("{message}; {err}"))
        })
    }

    /// The running executable and everything it already links against.
    pub fn open_self() -> Result<Self> {
        let library = this_library().wrap_err("failed to open the running process")?;
        Ok(Self {
            name: "<self>".to_string(),
            library,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }
}

impl SymbolResolver for DynamicLibrary {
    fn resolve(&self, symbol: &str) -> std::result::Result<NativeAddress, SymbolLookupError> {
        let entry = unsafe { self.library.get::<unsafe extern "C" fn()>(symbol.as_bytes()) }
            .map_err(|err| SymbolLookupError::new(symbol, err.to_string()))?;
        NativeAddress::new(*entry as *const c_void)
            .ok_or_else(|| SymbolLookupError::new(symbol, "symbol resolved to a null address"))
    }

    fn describe(&self) -> String {
        format!("library '{}'", self.name)
    }
}

impl fmt::Debug for DynamicLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLibrary")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(unix)]
fn this_library() -> std::result::Result<Library, libloading::Error> {
    Ok(libloading::os::unix::Library::this().into())
}

#[cfg(windows)]
fn this_library() -> std::result::Result<Library, libloading::Error> {
    libloading::os::windows::Library::this().map(Into::into)
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn default_libs() -> &'static [&'static str] {
    &["libc.so.6", "libc.so"]
}

#[cfg(target_os = "macos")]
fn default_libs() -> &'static [&'static str] {
    &["libSystem.B.dylib"]
}

#[cfg(target_os = "windows")]
fn default_libs() -> &'static [&'static str] {
    &["msvcrt.dll", "ucrtbase.dll"]
}

// Other targets only try the running executable.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "macos",
    target_os = "windows"
)))]
fn default_libs() -> &'static [&'static str] {
    &[]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_the_path() {
        let err = unsafe { DynamicLibrary::open("/definitely/not/here/libnothing.so") }
            .unwrap_err();
        assert!(err.to_string().contains("libnothing.so"));
    }

    #[cfg(unix)]
    #[test]
    fn default_library_exports_strlen() -> Result<()> {
        let lib = DynamicLibrary::open_default()?;
        assert!(lib.has_symbol("strlen"));
        let err = lib.resolve("fb_no_such_symbol_anywhere").unwrap_err();
        assert_eq!(err.symbol, "fb_no_such_symbol_anywhere");
        Ok(())
    }

    #[test]
    fn default_candidates_are_plain_file_names() {
        for name in default_libs() {
            assert!(!name.is_empty());
            assert!(!name.contains('/'));
        }
    }
}
