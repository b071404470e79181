//! Builtin profiles: the global bindings a compile starts from.
//!
//! A compiler is configured with exactly one profile. Seeding interns the
//! profile's types into the compile's own [`MetaRegistry`], so builtin
//! types compare equal to the types the checker derives for the same
//! program and to nothing from any other compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::env::{Binding, Origin, StaticContext};
use crate::registry::{Member, MetaRegistry, ObjectKind, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinProfile {
    /// Primitive types, `print` and `numberToString`.
    #[default]
    Default,
    /// The default set plus browser host globals.
    Browser,
}

impl BuiltinProfile {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinProfile::Default => "default",
            BuiltinProfile::Browser => "browser",
        }
    }

    /// A global context holding this profile's bindings.
    pub fn seed(self, registry: &mut MetaRegistry) -> StaticContext {
        let mut context = StaticContext::new();

        for (name, ty) in [
            ("Number", TypeId::NUMBER),
            ("String", TypeId::STRING),
            ("Boolean", TypeId::BOOLEAN),
            ("Unit", TypeId::UNIT),
        ] {
            let meta = registry.meta_of(ty);
            builtin(&mut context, name, meta, name);
        }

        let print = registry.function(vec![TypeId::STRING], TypeId::UNIT);
        builtin(&mut context, "print", print, "console.log");
        let number_to_string = registry.function(vec![TypeId::NUMBER], TypeId::STRING);
        builtin(&mut context, "numberToString", number_to_string, "String");

        if self == BuiltinProfile::Browser {
            builtin(&mut context, "alert", print, "window.alert");

            let console = registry.declare_object("Console", ObjectKind::Host);
            registry.add_member(
                console,
                Member {
                    name: "log".into(),
                    ty: Some(print),
                    mutable: false,
                },
            );
            builtin(&mut context, "console", console, "console");
        }

        tracing::debug!(profile = self.name(), bindings = context.local_names().len(), "seeded builtins");
        context
    }
}

fn builtin(context: &mut StaticContext, name: &str, ty: TypeId, js: &str) {
    context.define(
        name,
        Binding::new(Some(ty), Origin::Builtin { js: js.to_string() }),
    );
}

impl fmt::Display for BuiltinProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An unrecognised profile name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown builtin profile '{0}' (expected default or browser)")]
pub struct ParseProfileError(pub String);

impl FromStr for BuiltinProfile {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(BuiltinProfile::Default),
            "browser" => Ok(BuiltinProfile::Browser),
            _ => Err(ParseProfileError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeKind;

    #[test]
    fn test_default_profile_bindings() {
        let mut registry = MetaRegistry::new();
        let context = BuiltinProfile::Default.seed(&mut registry);
        assert_eq!(
            context.local_names(),
            vec!["Boolean", "Number", "String", "Unit", "numberToString", "print"]
        );
        let number = context.lookup("Number").and_then(|b| b.ty).unwrap();
        assert_eq!(registry.denoted(number), Some(TypeId::NUMBER));
        assert!(context.lookup("alert").is_none());
    }

    #[test]
    fn test_browser_profile_adds_host_globals() {
        let mut registry = MetaRegistry::new();
        let context = BuiltinProfile::Browser.seed(&mut registry);
        let alert = context.lookup("alert").unwrap();
        assert_eq!(
            alert.origin,
            Origin::Builtin {
                js: "window.alert".into()
            }
        );
        let console = context.lookup("console").and_then(|b| b.ty).unwrap();
        let log = registry.member(console, "log").and_then(|m| m.ty).unwrap();
        assert!(matches!(registry.kind(log), TypeKind::Function { .. }));
    }

    #[test]
    fn test_seeded_types_share_registry_identity() {
        let mut registry = MetaRegistry::new();
        let context = BuiltinProfile::Default.seed(&mut registry);
        let print = context.lookup("print").and_then(|b| b.ty).unwrap();
        assert_eq!(registry.function(vec![TypeId::STRING], TypeId::UNIT), print);
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!("Browser".parse(), Ok(BuiltinProfile::Browser));
        assert_eq!(" default ".parse(), Ok(BuiltinProfile::Default));
        assert!("node".parse::<BuiltinProfile>().is_err());
    }
}
