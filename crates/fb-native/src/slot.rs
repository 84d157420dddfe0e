//! Native function references owned by a binding instance.
//!
//! An eager slot is resolved while the instance is constructed. A lazy slot
//! resolves on first use and memoizes the first success. Failures are not
//! memoized: the next call asks the resolver again, so a library that gains
//! the export later (or a resolver with transient failures) recovers without
//! rebuilding the binding. Concurrent first uses wait on the same cell.

use crate::resolver::{NativeAddress, SymbolResolver};
use fb_core::{Error, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

pub enum SymbolSlot {
    Eager(NativeAddress),
    Lazy(LazySymbol),
}

impl SymbolSlot {
    /// Resolve now, failing with `SymbolNotFound` if the export is missing.
    pub fn eager(resolver: &dyn SymbolResolver, symbol: &str, member: &str) -> Result<Self> {
        let address = resolve(resolver, symbol, member)?;
        fb_core::debug!("bound {member} to {symbol} at {address:?}");
        Ok(SymbolSlot::Eager(address))
    }

    pub fn lazy(
        resolver: Arc<dyn SymbolResolver>,
        symbol: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        SymbolSlot::Lazy(LazySymbol {
            symbol: symbol.into(),
            member: member.into(),
            resolver,
            cell: OnceCell::new(),
        })
    }

    pub fn address(&self) -> Result<NativeAddress> {
        match self {
            SymbolSlot::Eager(address) => Ok(*address),
            SymbolSlot::Lazy(lazy) => lazy.get(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            SymbolSlot::Eager(_) => true,
            SymbolSlot::Lazy(lazy) => lazy.cell.get().is_some(),
        }
    }
}

pub struct LazySymbol {
    symbol: String,
    member: String,
    resolver: Arc<dyn SymbolResolver>,
    cell: OnceCell<NativeAddress>,
}

impl LazySymbol {
    fn get(&self) -> Result<NativeAddress> {
        self.cell
            .get_or_try_init(|| resolve(self.resolver.as_ref(), &self.symbol, &self.member))
            .copied()
    }
}

fn resolve(resolver: &dyn SymbolResolver, symbol: &str, member: &str) -> Result<NativeAddress> {
    resolver
        .resolve(symbol)
        .map_err(|err| Error::SymbolNotFound {
            symbol: symbol.to_string(),
            member: member.to_string(),
            reason: err.reason,
        })
}
