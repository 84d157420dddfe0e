//! Declarations of the interfaces a binding implements.
//!
//! These are produced by whatever reads the user's interface (attributes,
//! a macro, a JSON description) and are immutable once built.

use crate::error::Result;
use crate::ty::{CallingConvention, NativeType, Ownership, TypeRef};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub ownership: Ownership,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ownership: Ownership::default(),
        }
    }

    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnDecl {
    pub ty: TypeRef,
    #[serde(default)]
    pub ownership: Ownership,
}

impl Default for ReturnDecl {
    fn default() -> Self {
        Self {
            ty: TypeRef::Native(NativeType::Void),
            ownership: Ownership::default(),
        }
    }
}

/// One interface method together with its native-call metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub ret: ReturnDecl,
    /// Overrides the exported symbol name, which defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convention: Option<CallingConvention>,
}

impl MemberDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret: ReturnDecl::default(),
            symbol: None,
            convention: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    pub fn param_owned(
        mut self,
        name: impl Into<String>,
        ty: impl Into<TypeRef>,
        ownership: Ownership,
    ) -> Self {
        self.params
            .push(ParamDecl::new(name, ty).with_ownership(ownership));
        self
    }

    pub fn returns(mut self, ty: impl Into<TypeRef>) -> Self {
        self.ret.ty = ty.into();
        self
    }

    pub fn returns_owned(mut self, ty: impl Into<TypeRef>, ownership: Ownership) -> Self {
        self.ret = ReturnDecl {
            ty: ty.into(),
            ownership,
        };
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_convention(mut self, convention: CallingConvention) -> Self {
        self.convention = Some(convention);
        self
    }

    pub fn symbol_name(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.name)
    }

    pub fn calling_convention(&self) -> CallingConvention {
        self.convention.unwrap_or_default()
    }

    /// All declared types, parameters first, then the return type.
    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        self.params.iter().map(|p| &p.ty).chain(std::iter::once(&self.ret.ty))
    }

    pub fn is_directly_passable(&self) -> bool {
        self.types().all(TypeRef::is_directly_passable)
    }

    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .join(", ");
        format!("{}({}) -> {}", self.name, params, self.ret.ty)
    }

    /// Reject declarations no adapter shape can honour.
    pub fn validate(&self) -> Result<()> {
        config_ensure!(!self.name.is_empty(), "<unnamed>", "member name is empty");
        config_ensure!(
            !self.symbol_name().is_empty(),
            &self.name,
            "native symbol name is empty"
        );
        let convention = self.calling_convention();
        config_ensure!(
            convention.is_supported(),
            &self.name,
            "calling convention {convention} is not supported on this target"
        );

        let mut seen = HashSet::new();
        for param in &self.params {
            config_ensure!(
                seen.insert(param.name.as_str()),
                &self.name,
                "parameter `{}` is declared twice",
                param.name
            );
            if param.ty.is_void() {
                config_bail!(&self.name, "parameter `{}` has type void", param.name);
            }
            if param.ownership.caller_frees() && !param.ty.is_buffer_shaped() {
                config_bail!(
                    &self.name,
                    "parameter `{}` of type {} cannot be annotated caller-frees",
                    param.name,
                    param.ty
                );
            }
        }
        if self.ret.ownership.caller_frees() && !self.ret.ty.is_buffer_shaped() {
            config_bail!(
                &self.name,
                "return type {} cannot be annotated caller-frees",
                self.ret.ty
            );
        }
        for ty in self.types() {
            if let TypeRef::Nullable(inner) = ty {
                config_ensure!(
                    !inner.is_void(),
                    &self.name,
                    "nullable void is not a value type"
                );
            }
        }
        Ok(())
    }
}

impl fmt::Display for MemberDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// An ordered set of members forming one user interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn push(&mut self, member: MemberDecl) {
        self.members.push(member);
    }

    pub fn find(&self, name: &str) -> Option<(usize, &MemberDecl)> {
        self.members.iter().enumerate().find(|(_, m)| m.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for member in &self.members {
            config_ensure!(
                seen.insert(member.name.as_str()),
                &member.name,
                "member is declared twice in interface `{}`",
                self.name
            );
            member.validate()?;
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ty::TypeRef;
    use pretty_assertions::assert_eq;

    fn multiply() -> MemberDecl {
        MemberDecl::new("Multiply")
            .param("a", NativeType::I32)
            .param("b", NativeType::I32)
            .returns(NativeType::I32)
    }

    #[test]
    fn symbol_defaults_to_member_name() {
        let member = multiply();
        assert_eq!(member.symbol_name(), "Multiply");
        assert_eq!(member.with_symbol("mul").symbol_name(), "mul");
    }

    #[test]
    fn signature_lists_parameters() {
        assert_eq!(multiply().signature(), "Multiply(a: i32, b: i32) -> i32");
        assert!(multiply().is_directly_passable());
    }

    #[test]
    fn caller_frees_needs_a_buffer() {
        let member =
            MemberDecl::new("Bad").param_owned("x", NativeType::I32, Ownership::CallerFrees);
        assert!(matches!(member.validate(), Err(Error::Configuration { .. })));

        let member = MemberDecl::new("Good").param_owned(
            "x",
            TypeRef::Nullable(NativeType::I32),
            Ownership::CallerFrees,
        );
        assert!(member.validate().is_ok());
    }

    #[test]
    fn unsupported_convention_is_a_configuration_error() {
        let member = multiply().with_convention(CallingConvention::ThisCall);
        let err = member.validate().unwrap_err();
        assert!(err.is_generation_time());
        assert!(err.to_string().contains("ThisCall"));
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let decl = InterfaceDecl::new("Calc").member(multiply()).member(multiply());
        assert!(decl.validate().is_err());
    }

    #[test]
    fn declarations_travel_as_json() -> Result<()> {
        let decl = InterfaceDecl::new("Calc").member(
            multiply().with_symbol("mul").returns_owned(
                TypeRef::named("string"),
                Ownership::CallerFrees,
            ),
        );
        let text = decl.to_json()?;
        assert_eq!(InterfaceDecl::from_json(&text)?, decl);

        let parsed = InterfaceDecl::from_json(
            r#"{"name":"Opt","members":[{"name":"GetOptional",
                "params":[{"name":"present","ty":{"native":"bool"}}],
                "ret":{"ty":{"nullable":"i32"}}}]}"#,
        )?;
        let (_, member) = parsed.find("GetOptional").expect("member parsed");
        assert_eq!(member.ret.ty, TypeRef::Nullable(NativeType::I32));
        assert_eq!(member.params[0].ownership, Ownership::NativeFrees);
        Ok(())
    }
}
