use crate::binding::BindingType;
use crate::error::{attribute_to_stage, GenerationDiagnostics, GenerationNote};
use crate::stage::{GenerationContext, GeneratorStage};
use crate::stages::standard_stages;
use crate::transform::TransformerRegistry;
use crate::work_unit::WorkUnit;
use fb_core::{BindingConfig, Error, InterfaceDecl, OptionalStage, Result, TypeRef};
use fb_native::NativeAllocator;
use std::collections::VecDeque;
use std::sync::Arc;

/// Drives every interface member through the generator stages.
///
/// For each work unit the first applicable stage at or after the unit's
/// cursor emits the unit's method; units it yields resume at the next stage.
/// A unit no stage accepts fails the whole generation.
pub struct BindingPipeline {
    stages: Vec<Box<dyn GeneratorStage>>,
}

impl Default for BindingPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingPipeline {
    pub fn new() -> Self {
        Self::with_stages(standard_stages())
    }

    /// Stages are consulted in the given order.
    pub fn with_stages(stages: Vec<Box<dyn GeneratorStage>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn generate(
        &self,
        interface: &InterfaceDecl,
        config: BindingConfig,
        registry: Arc<TransformerRegistry>,
        allocator: Arc<dyn NativeAllocator>,
    ) -> Result<BindingType> {
        interface.validate()?;

        let mut ctx = GenerationContext::new(&interface.name, config, registry.clone());
        let mut diagnostics = GenerationDiagnostics::default();
        let mut entries = Vec::with_capacity(interface.members.len());
        for (index, member) in interface.members.iter().enumerate() {
            let unit = ctx.begin_member(index, member)?;
            entries.push(unit.method);
            self.generate_member(unit, &mut ctx, &mut diagnostics)?;
        }

        let (methods, slots) = ctx.into_builder().finish()?;
        diagnostics.emit(&interface.name);
        fb_core::info!(
            "generated binding type for {} ({} methods, {} native slots)",
            interface.name,
            methods.len(),
            slots.len()
        );
        Ok(BindingType::new(
            interface.clone(),
            config,
            methods,
            entries,
            slots,
            registry,
            allocator,
            diagnostics.into_notes(),
        ))
    }

    fn generate_member(
        &self,
        unit: WorkUnit,
        ctx: &mut GenerationContext,
        diagnostics: &mut GenerationDiagnostics,
    ) -> Result<()> {
        let mut queue = VecDeque::from([unit]);
        while let Some(unit) = queue.pop_front() {
            let Some((index, stage)) = self
                .stages
                .iter()
                .enumerate()
                .skip(unit.stage_cursor)
                .find(|(_, stage)| stage.is_applicable(&unit, &*ctx))
            else {
                return Err(unbindable(&unit, ctx));
            };

            let derived = stage
                .generate(&unit, ctx)
                .map_err(|err| attribute_to_stage(stage.name(), err))?;
            diagnostics.push(GenerationNote {
                member: unit.base_name.clone(),
                method: unit.decl.name.clone(),
                stage: stage.name(),
                complexity: stage.complexity(),
            });
            for mut next in derived {
                next.stage_cursor = index + 1;
                queue.push_back(next);
            }
        }
        Ok(())
    }
}

/// Explain why no stage accepted `unit`.
fn unbindable(unit: &WorkUnit, ctx: &GenerationContext) -> Error {
    let member = unit.base_name.as_str();
    let stages = ctx.config().stages;
    for ty in unit.decl.types() {
        match ty {
            TypeRef::Named(key) if !ctx.registry().contains(key) => {
                return Error::configuration(
                    member,
                    format!("type `{key}` has no registered transformer"),
                );
            }
            TypeRef::Named(key) if !stages.contains(OptionalStage::Lowering) => {
                return Error::configuration(
                    member,
                    format!("type `{key}` needs lowering but the lowering stage is disabled"),
                );
            }
            TypeRef::Nullable(_) if !stages.contains(OptionalStage::Nullable) => {
                return Error::configuration(
                    member,
                    format!("type `{ty}` needs marshalling but the nullable stage is disabled"),
                );
            }
            _ => {}
        }
    }
    Error::configuration(
        member,
        format!("no generator stage can bind `{}`", unit.decl.signature()),
    )
}
