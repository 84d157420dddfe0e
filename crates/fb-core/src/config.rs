use derive_more::Display;
use std::fmt;

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str, default: bool) -> bool {
    env_true(key).unwrap_or(default)
}

/// Generator stages that can be switched off per configuration.
///
/// The direct-call stage is always present and the disposal guard follows
/// [`BindingConfig::disposal_checks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OptionalStage {
    Lowering,
    Nullable,
}

impl OptionalStage {
    const fn bit(self) -> u8 {
        match self {
            OptionalStage::Lowering => 1,
            OptionalStage::Nullable => 1 << 1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageSet(u8);

impl StageSet {
    pub const fn empty() -> Self {
        StageSet(0)
    }

    pub const fn all() -> Self {
        StageSet(OptionalStage::Lowering.bit() | OptionalStage::Nullable.bit())
    }

    pub const fn with(self, stage: OptionalStage) -> Self {
        StageSet(self.0 | stage.bit())
    }

    pub const fn without(self, stage: OptionalStage) -> Self {
        StageSet(self.0 & !stage.bit())
    }

    pub const fn contains(&self, stage: OptionalStage) -> bool {
        self.0 & stage.bit() != 0
    }
}

impl Default for StageSet {
    fn default() -> Self {
        StageSet::all()
    }
}

impl fmt::Debug for StageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages = [OptionalStage::Lowering, OptionalStage::Nullable];
        f.debug_set()
            .entries(stages.iter().filter(|s| self.contains(**s)))
            .finish()
    }
}

/// Options that change the shape of a generated binding type.
///
/// Two requests with equal configurations for the same interface may share
/// one generated type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingConfig {
    /// Defer symbol resolution to the first call of each member.
    pub lazy_binding: bool,
    /// Guard every member against use after disposal.
    pub disposal_checks: bool,
    pub stages: StageSet,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            lazy_binding: false,
            disposal_checks: true,
            stages: StageSet::all(),
        }
    }
}

impl BindingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lazy_binding(mut self, lazy: bool) -> Self {
        self.lazy_binding = lazy;
        self
    }

    pub fn with_disposal_checks(mut self, enabled: bool) -> Self {
        self.disposal_checks = enabled;
        self
    }

    pub fn with_stages(mut self, stages: StageSet) -> Self {
        self.stages = stages;
        self
    }

    /// Read the configuration from `FERROBIND_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut stages = StageSet::all();
        if bool_from_env("FERROBIND_DISABLE_LOWERING", false) {
            stages = stages.without(OptionalStage::Lowering);
        }
        if bool_from_env("FERROBIND_DISABLE_NULLABLE", false) {
            stages = stages.without(OptionalStage::Nullable);
        }
        Self {
            lazy_binding: bool_from_env("FERROBIND_LAZY", defaults.lazy_binding),
            disposal_checks: bool_from_env(
                "FERROBIND_DISPOSAL_CHECKS",
                defaults.disposal_checks,
            ),
            stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_set_toggles() {
        let set = StageSet::all().without(OptionalStage::Nullable);
        assert!(set.contains(OptionalStage::Lowering));
        assert!(!set.contains(OptionalStage::Nullable));
        assert_eq!(set.with(OptionalStage::Nullable), StageSet::all());
        assert!(!StageSet::empty().contains(OptionalStage::Lowering));
        assert_eq!(format!("{set:?}"), "{Lowering}");
    }

    #[test]
    fn env_overrides_defaults() {
        std::env::set_var("FERROBIND_LAZY", "1");
        std::env::set_var("FERROBIND_DISPOSAL_CHECKS", "false");
        std::env::set_var("FERROBIND_DISABLE_LOWERING", "true");
        let config = BindingConfig::from_env();
        std::env::remove_var("FERROBIND_LAZY");
        std::env::remove_var("FERROBIND_DISPOSAL_CHECKS");
        std::env::remove_var("FERROBIND_DISABLE_LOWERING");

        assert!(config.lazy_binding);
        assert!(!config.disposal_checks);
        assert!(!config.stages.contains(OptionalStage::Lowering));
        assert!(config.stages.contains(OptionalStage::Nullable));
    }
}
