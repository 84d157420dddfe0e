use crate::adapter::{AdapterBody, SlotDef};
use crate::stage::{GenerationContext, GeneratorStage, StageComplexity};
use crate::work_unit::WorkUnit;
use fb_core::{config_bail, config_ensure, Result};
use fb_native::NativeSignature;

/// Terminal stage: binds a directly passable shape to a native symbol slot.
///
/// The slot resolves eagerly at activation or lazily on first call,
/// following the configuration the type is generated for.
pub struct DirectCallStage;

impl GeneratorStage for DirectCallStage {
    fn name(&self) -> &'static str {
        "direct-call"
    }

    fn complexity(&self) -> StageComplexity {
        StageComplexity::TERMINAL
    }

    fn is_applicable(&self, unit: &WorkUnit, _ctx: &GenerationContext) -> bool {
        unit.decl.is_directly_passable()
    }

    fn generate(&self, unit: &WorkUnit, ctx: &mut GenerationContext) -> Result<Vec<WorkUnit>> {
        let member = unit.base_name.as_str();
        let convention = unit.decl.calling_convention();
        config_ensure!(
            convention.is_supported(),
            member,
            "calling convention {convention} is not supported on this target"
        );
        let Some(params) = unit
            .decl
            .params
            .iter()
            .map(|param| param.ty.as_native())
            .collect::<Option<Vec<_>>>()
        else {
            config_bail!(member, "`{}` is not directly passable", unit.decl.signature());
        };
        let Some(ret) = unit.decl.ret.ty.as_native() else {
            config_bail!(member, "return type {} is not directly passable", unit.decl.ret.ty);
        };

        let signature = NativeSignature::new(params, ret).with_convention(convention);
        let lazy = ctx.config().lazy_binding;
        let slot = ctx.add_slot(SlotDef {
            symbol: unit.symbol_name.clone(),
            member: unit.base_name.clone(),
            signature: signature.clone(),
            lazy,
        });
        ctx.define(unit, AdapterBody::Native { slot, signature })?;
        Ok(Vec::new())
    }
}
