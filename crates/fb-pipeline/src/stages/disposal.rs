use crate::adapter::AdapterBody;
use crate::stage::{GenerationContext, GeneratorStage, StageComplexity};
use crate::work_unit::WorkUnit;
use fb_core::Result;

/// Wraps each interface entry point in a check of the instance's disposed flag.
pub struct DisposalGuardStage;

impl GeneratorStage for DisposalGuardStage {
    fn name(&self) -> &'static str {
        "disposal-guard"
    }

    fn complexity(&self) -> StageComplexity {
        StageComplexity {
            emits_helper_method: true,
            ..StageComplexity::default()
        }
    }

    fn is_applicable(&self, unit: &WorkUnit, ctx: &GenerationContext) -> bool {
        ctx.config().disposal_checks && unit.is_entry()
    }

    fn generate(&self, unit: &WorkUnit, ctx: &mut GenerationContext) -> Result<Vec<WorkUnit>> {
        let inner = ctx.derive_unit(unit, unit.decl.clone(), "guarded")?;
        ctx.define(
            unit,
            AdapterBody::DisposalGuard {
                inner: inner.method,
            },
        )?;
        Ok(vec![inner])
    }
}
