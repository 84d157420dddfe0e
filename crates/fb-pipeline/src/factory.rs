use crate::binding::{Binding, BindingType};
use crate::interface::NativeInterface;
use crate::pipeline::BindingPipeline;
use crate::transform::TransformerRegistry;
use dashmap::DashMap;
use fb_core::{BindingConfig, InterfaceDecl, Result};
use fb_native::{LibcAllocator, NativeAllocator, SymbolResolver};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BindingKey {
    interface: InterfaceDecl,
    config: BindingConfig,
}

/// Generates binding types on demand and caches them per interface and
/// configuration.
///
/// Concurrent first requests for the same key may both generate; the first
/// type inserted wins and every caller receives it.
pub struct BindingFactory {
    pipeline: BindingPipeline,
    registry: Arc<TransformerRegistry>,
    allocator: Arc<dyn NativeAllocator>,
    cache: DashMap<BindingKey, Arc<BindingType>>,
}

impl Default for BindingFactory {
    fn default() -> Self {
        Self::new(TransformerRegistry::with_defaults())
    }
}

impl BindingFactory {
    pub fn new(registry: TransformerRegistry) -> Self {
        Self {
            pipeline: BindingPipeline::new(),
            registry: Arc::new(registry),
            allocator: Arc::new(LibcAllocator),
            cache: DashMap::new(),
        }
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn NativeAllocator>) -> Self {
        self.allocator = allocator;
        self.cache.clear();
        self
    }

    pub fn with_pipeline(mut self, pipeline: BindingPipeline) -> Self {
        self.pipeline = pipeline;
        self.cache.clear();
        self
    }

    pub fn registry(&self) -> &Arc<TransformerRegistry> {
        &self.registry
    }

    /// The binding type for `interface` under `config`, generated at most once
    /// per key unless two threads race on the first request.
    pub fn generate(
        &self,
        interface: &InterfaceDecl,
        config: BindingConfig,
    ) -> Result<Arc<BindingType>> {
        let key = BindingKey {
            interface: interface.clone(),
            config,
        };
        let cached = self.cache.get(&key).map(|entry| Arc::clone(entry.value()));
        if let Some(ty) = cached {
            fb_core::debug!("binding type cache hit for {}", interface.name);
            return Ok(ty);
        }

        let generated = Arc::new(self.pipeline.generate(
            interface,
            config,
            self.registry.clone(),
            self.allocator.clone(),
        )?);
        let ty = Arc::clone(self.cache.entry(key).or_insert(generated).value());
        Ok(ty)
    }

    /// Generate (or reuse) the type and create an independent instance of it.
    pub fn activate(
        &self,
        interface: &InterfaceDecl,
        config: BindingConfig,
        resolver: Arc<dyn SymbolResolver>,
    ) -> Result<Binding> {
        self.generate(interface, config)?.instantiate(resolver)
    }

    /// `activate` for an interface declared with `native_interface!`.
    pub fn activate_as<T: NativeInterface>(
        &self,
        config: BindingConfig,
        resolver: Arc<dyn SymbolResolver>,
    ) -> Result<T> {
        self.activate(&T::declaration(), config, resolver)
            .map(T::from_binding)
    }

    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
