use serde::{Deserialize, Serialize};

/// Application-level permission class. Derived, never stored: the profile
/// row holds `user_type`, and the configured allow-list can override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Photographer,
    Client,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Photographer => "photographer",
            Role::Client => "client",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "photographer" => Some(Role::Photographer),
            "client" => Some(Role::Client),
            _ => None,
        }
    }
}

/// Canonical dashboard path per role. Server redirects and clients both
/// consume this; it is the single source of truth for role routing.
pub fn route_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Photographer => "/studio",
        Role::Client => "/gallery",
    }
}

pub fn is_admin_email(admin_emails: &[String], email: &str) -> bool {
    let email = email.to_lowercase();
    admin_emails.iter().any(|e| *e == email)
}
