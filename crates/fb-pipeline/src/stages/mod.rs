//! The generator stages, in the order the orchestrator consults them.

mod direct;
mod disposal;
mod lowered;
mod nullable;

pub use direct::DirectCallStage;
pub use disposal::DisposalGuardStage;
pub use lowered::LoweredStage;
pub use nullable::NullableStage;

use crate::stage::GeneratorStage;

/// Disposal guard, lowering, nullable marshalling, then the terminal direct call.
pub fn standard_stages() -> Vec<Box<dyn GeneratorStage>> {
    vec![
        Box::new(DisposalGuardStage),
        Box::new(LoweredStage),
        Box::new(NullableStage),
        Box::new(DirectCallStage),
    ]
}
