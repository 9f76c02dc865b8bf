use serde::{Deserialize, Serialize};

/// Platform-level registration settings. The upstream platform kept these in
/// a mutable plugin store reachable from anywhere; here they are built once
/// and injected into the components that consume them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdvancedSettings {
    /// Whether self-registration is open at all.
    pub allow_register: bool,
    /// Whether a user email must be unique across providers.
    pub unique_email: bool,
    /// Role type assigned when an invitation does not pin a role.
    pub default_role_type: String,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            allow_register: true,
            unique_email: true,
            default_role_type: "trainee".to_string(),
        }
    }
}
