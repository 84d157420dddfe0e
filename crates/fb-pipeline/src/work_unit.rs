use crate::adapter::MethodId;
use fb_core::MemberDecl;

/// One interface member moving through the generator stages.
///
/// Units derived by a stage keep the original symbol, base name and unique
/// id; only the current shape, target method and stage cursor change.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    /// The shape the current method must implement.
    pub decl: MemberDecl,
    /// Index of the interface member this unit serves.
    pub member_index: usize,
    pub symbol_name: String,
    pub base_name: String,
    pub unique_id: u64,
    /// The declared method whose body the next stage emits.
    pub method: MethodId,
    /// Stages before this index have already run for the member.
    pub stage_cursor: usize,
}

impl WorkUnit {
    pub fn new(member_index: usize, decl: MemberDecl, unique_id: u64, method: MethodId) -> Self {
        Self {
            symbol_name: decl.symbol_name().to_string(),
            base_name: decl.name.clone(),
            decl,
            member_index,
            unique_id,
            method,
            stage_cursor: 0,
        }
    }

    /// `{base}_{suffix}_{id}`, unique within one generated type.
    pub fn generated_name(&self, suffix: &str) -> String {
        format!("{}_{}_{}", self.base_name, suffix, self.unique_id)
    }

    pub fn derive(&self, decl: MemberDecl, method: MethodId) -> Self {
        Self {
            decl,
            member_index: self.member_index,
            symbol_name: self.symbol_name.clone(),
            base_name: self.base_name.clone(),
            unique_id: self.unique_id,
            method,
            stage_cursor: self.stage_cursor,
        }
    }

    /// The unit serves the interface member directly rather than a helper.
    pub fn is_entry(&self) -> bool {
        self.decl.name == self.base_name
    }
}
