use crate::adapter::AdapterBody;
use crate::stage::{GenerationContext, GeneratorStage, StageComplexity};
use crate::transform::{TransformerRegistry, TypeTransformer};
use crate::work_unit::WorkUnit;
use fb_core::{Error, OptionalStage, Result, TypeRef};
use std::sync::Arc;

/// Replaces complex types with their transformers' lowered types and emits a
/// forwarding method that converts values on the way in and out.
pub struct LoweredStage;

impl GeneratorStage for LoweredStage {
    fn name(&self) -> &'static str {
        "lowered"
    }

    fn complexity(&self) -> StageComplexity {
        StageComplexity {
            depends_on_member_type: true,
            transforms_parameters: true,
            transforms_return: true,
            emits_helper_method: true,
        }
    }

    fn is_applicable(&self, unit: &WorkUnit, ctx: &GenerationContext) -> bool {
        ctx.config().stages.contains(OptionalStage::Lowering)
            && unit.decl.types().any(|ty| matches!(ty, TypeRef::Named(_)))
            && unit.decl.types().all(|ty| ctx.registry().can_lower(ty))
    }

    fn generate(&self, unit: &WorkUnit, ctx: &mut GenerationContext) -> Result<Vec<WorkUnit>> {
        let mut lowered = unit.decl.clone();
        let registry = ctx.registry();
        let params = lowered
            .params
            .iter_mut()
            .map(|param| lower_type(registry, &unit.base_name, &mut param.ty))
            .collect::<Result<Vec<_>>>()?;
        let ret = lower_type(registry, &unit.base_name, &mut lowered.ret.ty)?;

        let target = ctx.derive_unit(unit, lowered, "lowered")?;
        ctx.define(
            unit,
            AdapterBody::Lowered {
                target: target.method,
                params,
                ret,
            },
        )?;
        Ok(vec![target])
    }
}

fn lower_type(
    registry: &TransformerRegistry,
    member: &str,
    ty: &mut TypeRef,
) -> Result<Option<Arc<dyn TypeTransformer>>> {
    let key = match ty {
        TypeRef::Named(key) => key.clone(),
        _ => return Ok(None),
    };
    let transformer = registry.get(&key).ok_or_else(|| {
        Error::configuration(member, format!("no transformer registered for `{key}`"))
    })?;
    *ty = transformer.lowered_type();
    Ok(Some(transformer))
}
