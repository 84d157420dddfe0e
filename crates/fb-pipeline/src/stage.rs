use crate::adapter::{AdapterBody, SlotDef, SlotId, TypeBuilder};
use crate::transform::TransformerRegistry;
use crate::work_unit::WorkUnit;
use fb_core::{BindingConfig, MemberDecl, Result};
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

/// What a stage needs to know about, and does to, the members it handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageComplexity {
    pub depends_on_member_type: bool,
    pub transforms_parameters: bool,
    pub transforms_return: bool,
    pub emits_helper_method: bool,
}

impl StageComplexity {
    pub const TERMINAL: StageComplexity = StageComplexity {
        depends_on_member_type: true,
        transforms_parameters: false,
        transforms_return: false,
        emits_helper_method: false,
    };
}

impl fmt::Display for StageComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.depends_on_member_type, "member-type"),
            (self.transforms_parameters, "parameters"),
            (self.transforms_return, "return"),
            (self.emits_helper_method, "helper"),
        ];
        let names = flags.iter().filter(|(set, _)| *set).map(|(_, name)| name).join("+");
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names)
        }
    }
}

/// A rule that emits the body of one method for a work unit.
pub trait GeneratorStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn complexity(&self) -> StageComplexity;

    fn is_applicable(&self, unit: &WorkUnit, ctx: &GenerationContext) -> bool;

    /// Emit the body for `unit.method`, returning units for any methods the
    /// body forwards to. Their stage cursors are set by the orchestrator.
    fn generate(&self, unit: &WorkUnit, ctx: &mut GenerationContext) -> Result<Vec<WorkUnit>>;
}

/// State shared by the stages while one binding type is generated.
pub struct GenerationContext {
    interface: String,
    config: BindingConfig,
    registry: Arc<TransformerRegistry>,
    builder: TypeBuilder,
    next_id: u64,
}

impl GenerationContext {
    pub fn new(
        interface: impl Into<String>,
        config: BindingConfig,
        registry: Arc<TransformerRegistry>,
    ) -> Self {
        Self {
            interface: interface.into(),
            config,
            registry,
            builder: TypeBuilder::new(),
            next_id: 0,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn registry(&self) -> &TransformerRegistry {
        &self.registry
    }

    /// Declare the entry method for an interface member.
    pub fn begin_member(&mut self, member_index: usize, decl: &MemberDecl) -> Result<WorkUnit> {
        let method = self.builder.declare(decl.name.clone(), member_index)?;
        let unique_id = self.next_id;
        self.next_id += 1;
        Ok(WorkUnit::new(member_index, decl.clone(), unique_id, method))
    }

    /// Declare a helper method with shape `decl` and return the unit for it.
    pub fn derive_unit(
        &mut self,
        unit: &WorkUnit,
        mut decl: MemberDecl,
        suffix: &str,
    ) -> Result<WorkUnit> {
        decl.name = unit.generated_name(suffix);
        let method = self.builder.declare(decl.name.clone(), unit.member_index)?;
        Ok(unit.derive(decl, method))
    }

    /// Emit the body of `unit.method`.
    pub fn define(&mut self, unit: &WorkUnit, body: AdapterBody) -> Result<()> {
        self.builder.define(unit.method, unit.decl.clone(), body)
    }

    pub fn add_slot(&mut self, slot: SlotDef) -> SlotId {
        self.builder.add_slot(slot)
    }

    pub(crate) fn into_builder(self) -> TypeBuilder {
        self.builder
    }
}
