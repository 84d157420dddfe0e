use crate::stage::StageComplexity;
use fb_core::Error;
use std::fmt;

/// One stage applied to one member during generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationNote {
    pub member: String,
    pub method: String,
    pub stage: &'static str,
    pub complexity: StageComplexity,
}

impl fmt::Display for GenerationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} emitted `{}` ({})",
            self.member, self.stage, self.method, self.complexity
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct GenerationDiagnostics {
    pub items: Vec<GenerationNote>,
}

impl GenerationDiagnostics {
    pub fn push(&mut self, note: GenerationNote) {
        self.items.push(note);
    }

    pub fn emit(&self, interface: &str) {
        for note in &self.items {
            fb_core::debug!(
                interface = interface,
                member = %note.member,
                stage = note.stage,
                method = %note.method,
                complexity = %note.complexity,
                "applied generator stage"
            );
        }
    }

    pub fn into_notes(self) -> Vec<GenerationNote> {
        self.items
    }
}

/// Prefix a configuration error with the stage that raised it.
pub fn attribute_to_stage(stage: &'static str, err: Error) -> Error {
    match err {
        Error::Configuration { member, message } if !message.starts_with('[') => {
            Error::Configuration {
                member,
                message: format!("[{stage}] {message}"),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_prefix_applies_once() {
        let err = Error::configuration("GetName", "no transformer registered for `name`");
        let err = attribute_to_stage("lowered", err);
        let err = attribute_to_stage("lowered", err);
        assert_eq!(
            err.to_string(),
            "configuration error in `GetName`: [lowered] no transformer registered for `name`"
        );
        let other = attribute_to_stage("lowered", Error::Generic("x".into()));
        assert_eq!(other, Error::Generic("x".into()));
    }
}
