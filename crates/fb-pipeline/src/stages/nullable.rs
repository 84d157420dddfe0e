use crate::adapter::{AdapterBody, NullableMarshal};
use crate::stage::{GenerationContext, GeneratorStage, StageComplexity};
use crate::work_unit::WorkUnit;
use fb_core::{NativeType, OptionalStage, Ownership, Result, TypeRef};

/// Passes nullable values as pointers to scratch buffers.
///
/// Runs after lowering, so the shapes it sees contain no complex types.
pub struct NullableStage;

impl GeneratorStage for NullableStage {
    fn name(&self) -> &'static str {
        "nullable"
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
        ctx.config().stages.contains(OptionalStage::Nullable)
            && unit.decl.types().any(|ty| matches!(ty, TypeRef::Nullable(_)))
            && !unit.decl.types().any(|ty| matches!(ty, TypeRef::Named(_)))
    }

    fn generate(&self, unit: &WorkUnit, ctx: &mut GenerationContext) -> Result<Vec<WorkUnit>> {
        let mut marshalled = unit.decl.clone();
        let params = marshalled
            .params
            .iter_mut()
            .map(|param| as_pointer(&mut param.ty, param.ownership))
            .collect();
        let ret = as_pointer(&mut marshalled.ret.ty, marshalled.ret.ownership);

        let target = ctx.derive_unit(unit, marshalled, "marshalled")?;
        ctx.define(
            unit,
            AdapterBody::Nullable {
                target: target.method,
                params,
                ret,
            },
        )?;
        Ok(vec![target])
    }
}

fn as_pointer(ty: &mut TypeRef, ownership: Ownership) -> Option<NullableMarshal> {
    match *ty {
        TypeRef::Nullable(underlying) => {
            *ty = TypeRef::Native(NativeType::Pointer);
            Some(NullableMarshal {
                underlying,
                ownership,
            })
        }
        _ => None,
    }
}
