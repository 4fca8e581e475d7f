//! Per-route access policies.

use chemstore_core::Role;

pub const ALLOW_ALL: &[Role] = &[Role::Admin, Role::Lecturer, Role::Assistant, Role::Unconfirmed];
pub const LECTURER_ASSISTANT: &[Role] = &[Role::Lecturer, Role::Assistant];
pub const ASSISTANT_ONLY: &[Role] = &[Role::Assistant];
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Access policy bound to a route at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Reject callers without a resolved identity.
    pub auth_required: bool,
    /// Skip identity resolution entirely.
    pub auth_exempt: bool,
    /// Roles admitted when authentication is required.
    pub allowed_roles: &'static [Role],
    /// Skip the anti-forgery check on unsafe methods.
    pub xsrf_exempt: bool,
}

impl Settings {
    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

pub const UNRESTRICTED: Settings = Settings {
    auth_required: false,
    auth_exempt: false,
    allowed_roles: ALLOW_ALL,
    xsrf_exempt: true,
};

pub const ANY_ROLE_VIEW: Settings = Settings {
    auth_required: true,
    auth_exempt: false,
    allowed_roles: ALLOW_ALL,
    xsrf_exempt: true,
};

pub const LECTURER_ASSISTANT_VIEW: Settings = Settings {
    auth_required: true,
    auth_exempt: false,
    allowed_roles: LECTURER_ASSISTANT,
    xsrf_exempt: true,
};

pub const ASSISTANT_ONLY_VIEW: Settings = Settings {
    auth_required: true,
    auth_exempt: false,
    allowed_roles: ASSISTANT_ONLY,
    xsrf_exempt: true,
};

pub const ADMIN_ONLY_VIEW: Settings = Settings {
    auth_required: true,
    auth_exempt: false,
    allowed_roles: ADMIN_ONLY,
    xsrf_exempt: true,
};

pub const ASSISTANT_ONLY_API: Settings = Settings {
    auth_required: true,
    auth_exempt: false,
    allowed_roles: ASSISTANT_ONLY,
    xsrf_exempt: false,
};

pub const ASSISTANT_ONLY_NO_XSRF: Settings = Settings {
    auth_required: true,
    auth_exempt: false,
    allowed_roles: ASSISTANT_ONLY,
    xsrf_exempt: true,
};

pub const ADMIN_ONLY_API: Settings = Settings {
    auth_required: true,
    auth_exempt: false,
    allowed_roles: ADMIN_ONLY,
    xsrf_exempt: false,
};
