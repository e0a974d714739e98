//! Role-based gate in front of every translation-triggering operation
//!
//! Decisions are pure: nothing is logged or written here, callers decide how
//! a denial surfaces.

use crate::config::PluginConfig;
use crate::error::{Result, TranslateError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role that may trigger translations
pub const ADMIN_ROLE: &str = "admin";

/// An authenticated caller
///
/// Roles come in two forms depending on the user schema: a single `role`
/// attribute or a `roles` set. Both are honoured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role) || self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    CollectionNotConfigured,
    TranslationDisabled,
    Unauthenticated,
    MissingRole,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DenyReason::CollectionNotConfigured => "collection is not configured for translation",
            DenyReason::TranslationDisabled => "translation is disabled for this collection",
            DenyReason::Unauthenticated => "authentication required",
            DenyReason::MissingRole => "administrator role required",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }

    /// Turn a denial for `collection` into the error surfaced to callers
    pub fn into_result(self, collection: &str) -> Result<()> {
        match self {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(DenyReason::CollectionNotConfigured) => Err(
                TranslateError::CollectionNotConfigured(collection.to_string()),
            ),
            AccessDecision::Deny(reason) => Err(TranslateError::AccessDenied(reason.to_string())),
        }
    }
}

/// Decide whether `principal` may translate documents of `collection`
///
/// Checks run in order: collection configured, collection access switch,
/// authentication, role.
pub fn authorize(
    principal: Option<&Principal>,
    config: &PluginConfig,
    collection: &str,
) -> AccessDecision {
    let Some(options) = config.collection(collection) else {
        return AccessDecision::Deny(DenyReason::CollectionNotConfigured);
    };
    if !options.access.translate {
        return AccessDecision::Deny(DenyReason::TranslationDisabled);
    }
    authorize_system(principal)
}

/// Role check for operations that are not tied to a collection
pub fn authorize_system(principal: Option<&Principal>) -> AccessDecision {
    match principal {
        None => AccessDecision::Deny(DenyReason::Unauthenticated),
        Some(p) if !p.has_role(ADMIN_ROLE) => AccessDecision::Deny(DenyReason::MissingRole),
        Some(_) => AccessDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollectionOptions, Localization};
    use crate::document::FieldDescriptor;

    fn config() -> PluginConfig {
        let mut locked = CollectionOptions::new(vec![FieldDescriptor::plain_text("title")]);
        locked.access.translate = false;
        PluginConfig::new(Localization::new("en", &["en", "fr"]))
            .with_collection(
                "posts",
                CollectionOptions::new(vec![FieldDescriptor::plain_text("title")]),
            )
            .with_collection("locked", locked)
    }

    #[test]
    fn test_admin_by_single_role() {
        let admin = Principal::new("1").with_role("admin");
        assert_eq!(authorize(Some(&admin), &config(), "posts"), AccessDecision::Allow);
    }

    #[test]
    fn test_admin_by_role_set() {
        let admin = Principal::new("1").with_roles(["editor", "admin"]);
        assert!(authorize(Some(&admin), &config(), "posts").is_allowed());
    }

    #[test]
    fn test_non_admin_denied() {
        let editor = Principal::new("2").with_role("editor").with_roles(["author"]);
        assert_eq!(
            authorize(Some(&editor), &config(), "posts"),
            AccessDecision::Deny(DenyReason::MissingRole)
        );
    }

    #[test]
    fn test_anonymous_denied() {
        assert_eq!(
            authorize(None, &config(), "posts"),
            AccessDecision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_unconfigured_collection_checked_first() {
        assert_eq!(
            authorize(None, &config(), "media"),
            AccessDecision::Deny(DenyReason::CollectionNotConfigured)
        );
    }

    #[test]
    fn test_disabled_collection_denied_even_for_admin() {
        let admin = Principal::new("1").with_role("admin");
        assert_eq!(
            authorize(Some(&admin), &config(), "locked"),
            AccessDecision::Deny(DenyReason::TranslationDisabled)
        );
    }

    #[test]
    fn test_denials_become_errors() {
        let admin = Principal::new("1").with_role("admin");
        assert!(authorize(Some(&admin), &config(), "posts").into_result("posts").is_ok());

        match authorize(Some(&admin), &config(), "media").into_result("media") {
            Err(TranslateError::CollectionNotConfigured(slug)) => assert_eq!(slug, "media"),
            other => panic!("expected CollectionNotConfigured, got {:?}", other),
        }
        match authorize(None, &config(), "posts").into_result("posts") {
            Err(TranslateError::AccessDenied(reason)) => {
                assert_eq!(reason, "authentication required")
            }
            other => panic!("expected AccessDenied, got {:?}", other),
        }
    }

    #[test]
    fn test_system_check_ignores_collections() {
        let admin = Principal::new("1").with_role("admin");
        assert!(authorize_system(Some(&admin)).is_allowed());
        assert!(!authorize_system(None).is_allowed());
    }
}
