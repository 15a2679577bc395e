//! Path-prefix access guard for admin pages and write APIs.
//!
//! Token verification happens elsewhere; the guard only sees its outcome as
//! [`Credentials`] and decides what the request is allowed to do.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub const ADMIN_ROLE: &str = "admin";
pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

const API_PREFIX: &str = "/api/";
const PUBLIC_BLOGS_PATH: &str = "/api/blogs";
const PUBLIC_BLOG_SLUG_PREFIX: &str = "/api/blogs/slug/";

pub const DEFAULT_PROTECTED_PREFIXES: &[&str] = &[
    "/admin",
    "/api/profile",
    "/api/experiences",
    "/api/education",
    "/api/projects",
    "/api/certificates",
    "/api/blogs",
    "/api/analytics",
];

pub const DEFAULT_ADMIN_PREFIXES: &[&str] = &[
    "/admin",
    "/api/blogs/create",
    "/api/blogs/update",
    "/api/blogs/delete",
    "/api/experiences/create",
    "/api/experiences/update",
    "/api/experiences/delete",
    "/api/education/create",
    "/api/education/update",
    "/api/education/delete",
    "/api/projects/create",
    "/api/projects/update",
    "/api/projects/delete",
    "/api/certificates/create",
    "/api/certificates/update",
    "/api/certificates/delete",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Outcome of reading and verifying the session token.
#[derive(Debug, Clone, Copy)]
pub enum Credentials<'a> {
    Missing,
    Invalid,
    Valid(&'a Principal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Api,
    Page,
}

impl Surface {
    pub fn for_path(path: &str) -> Self {
        if path.starts_with(API_PREFIX) {
            Surface::Api
        } else {
            Surface::Page
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    /// No usable session. `expired` is set when a token was present but failed verification.
    Unauthenticated { surface: Surface, expired: bool },
    Forbidden { surface: Surface },
}

impl AccessDecision {
    /// HTTP status an API surface should answer with; `None` for allowed or page requests.
    pub fn api_status(&self) -> Option<u16> {
        match self {
            AccessDecision::Unauthenticated {
                surface: Surface::Api,
                ..
            } => Some(401),
            AccessDecision::Forbidden {
                surface: Surface::Api,
            } => Some(403),
            _ => None,
        }
    }

    pub fn api_message(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Unauthenticated {
                surface: Surface::Api,
                expired: false,
            } => Some("Authentication required"),
            AccessDecision::Unauthenticated {
                surface: Surface::Api,
                expired: true,
            } => Some("Invalid or expired token"),
            AccessDecision::Forbidden {
                surface: Surface::Api,
            } => Some("Admin privileges required"),
            _ => None,
        }
    }

    /// Redirect location for page requests; `callback` is the URL to return to after login.
    pub fn page_redirect(&self, callback: &str) -> Option<String> {
        match self {
            AccessDecision::Unauthenticated {
                surface: Surface::Page,
                expired,
            } => {
                let mut query = form_urlencoded::Serializer::new(String::new());
                query.append_pair("callbackUrl", callback);
                if *expired {
                    query.append_pair("error", "Session expired");
                }
                Some(format!("{LOGIN_PATH}?{}", query.finish()))
            }
            AccessDecision::Forbidden {
                surface: Surface::Page,
            } => Some(UNAUTHORIZED_PATH.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    protected_prefixes: Vec<String>,
    admin_prefixes: Vec<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROTECTED_PREFIXES.iter().map(|p| p.to_string()),
            DEFAULT_ADMIN_PREFIXES.iter().map(|p| p.to_string()),
        )
    }
}

impl AccessPolicy {
    pub fn new(
        protected_prefixes: impl IntoIterator<Item = String>,
        admin_prefixes: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            protected_prefixes: protected_prefixes.into_iter().collect(),
            admin_prefixes: admin_prefixes.into_iter().collect(),
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn is_admin_only(&self, path: &str) -> bool {
        self.admin_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn decide(&self, method: &str, path: &str, credentials: Credentials<'_>) -> AccessDecision {
        if method.eq_ignore_ascii_case("GET") && is_public_blog_read(path) {
            return AccessDecision::Allow;
        }

        if !self.is_protected(path) {
            return AccessDecision::Allow;
        }

        let surface = Surface::for_path(path);
        let principal = match credentials {
            Credentials::Missing => {
                return AccessDecision::Unauthenticated {
                    surface,
                    expired: false,
                };
            }
            Credentials::Invalid => {
                return AccessDecision::Unauthenticated {
                    surface,
                    expired: true,
                };
            }
            Credentials::Valid(principal) => principal,
        };

        if self.is_admin_only(path) && !principal.is_admin() {
            return AccessDecision::Forbidden { surface };
        }

        AccessDecision::Allow
    }
}

/// Blog listings, slug lookups and single-post reads stay public for GET.
fn is_public_blog_read(path: &str) -> bool {
    if path == PUBLIC_BLOGS_PATH || path.starts_with(PUBLIC_BLOG_SLUG_PREFIX) {
        return true;
    }

    path.strip_prefix(PUBLIC_BLOGS_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|id| !id.is_empty() && !id.contains('/'))
}
