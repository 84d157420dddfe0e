//! Native side of a binding: where entry points come from, how they are
//! called, and the unmanaged memory that crosses the boundary with them.

pub mod alloc;
pub mod invoke;
pub mod library;
pub mod resolver;
pub mod slot;

pub use alloc::{read_value, write_value, LibcAllocator, NativeAllocator, ScratchBuffers};
pub use invoke::{call_native, NativeSignature};
pub use library::DynamicLibrary;
pub use resolver::{NativeAddress, SymbolLookupError, SymbolResolver, SymbolTable};
pub use slot::SymbolSlot;
