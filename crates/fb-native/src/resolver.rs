use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

/// The address of a resolved native entry point.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeAddress(NonNull<c_void>);

// Safety: an entry point address is immutable and valid for as long as the
// library that exported it stays loaded.
unsafe impl Send for NativeAddress {}
unsafe impl Sync for NativeAddress {}

impl NativeAddress {
    pub fn new(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(NativeAddress)
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.0.as_ptr()
    }
}

impl fmt::Debug for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeAddress({:p})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLookupError {
    pub symbol: String,
    pub reason: String,
}

impl SymbolLookupError {
    pub fn new(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SymbolLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "symbol '{}' not found: {}", self.symbol, self.reason)
    }
}

impl std::error::Error for SymbolLookupError {}

/// Resolves an exported symbol name to a callable address.
///
/// Implementations must be callable from several threads at once; lazy
/// bindings resolve from whichever thread first calls a member.
pub trait SymbolResolver: Send + Sync {
    fn resolve(&self, symbol: &str) -> Result<NativeAddress, SymbolLookupError>;

    fn describe(&self) -> String {
        "native resolver".to_string()
    }
}

/// An explicit name to address map, for statically linked entry points.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, NativeAddress>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, address: NativeAddress) {
        self.symbols.insert(name.into(), address);
    }

    pub fn with(mut self, name: impl Into<String>, address: NativeAddress) -> Self {
        self.insert(name, address);
        self
    }

    /// Register a function pointer, e.g. `multiply as *const c_void`.
    ///
    /// A null pointer is not registered and the name stays unresolvable.
    pub fn with_fn(mut self, name: impl Into<String>, ptr: *const c_void) -> Self {
        if let Some(address) = NativeAddress::new(ptr) {
            self.insert(name, address);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve(&self, symbol: &str) -> Result<NativeAddress, SymbolLookupError> {
        self.symbols
            .get(symbol)
            .copied()
            .ok_or_else(|| SymbolLookupError::new(symbol, "not present in symbol table"))
    }

    fn describe(&self) -> String {
        format!("symbol table ({} entries)", self.symbols.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn answer() -> i32 {
        42
    }

    #[test]
    fn table_resolves_registered_symbols_only() {
        let table = SymbolTable::new()
            .with_fn("answer", answer as *const c_void)
            .with_fn("null", std::ptr::null());
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.resolve("answer").unwrap().as_ptr(),
            answer as *const c_void
        );
        assert!(table.resolve("null").is_err());
        let err = table.resolve("missing").unwrap_err();
        assert_eq!(err.symbol, "missing");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn null_is_not_an_address() {
        assert!(NativeAddress::new(std::ptr::null()).is_none());
    }
}
