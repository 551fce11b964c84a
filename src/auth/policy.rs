use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role. Variants are declared lowest first so `Ord` follows privilege.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Client => "CLIENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == s)
    }

    pub fn satisfies(&self, minimum: Role) -> bool {
        *self >= minimum
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the access table: routes not listed only need a valid session
#[derive(Debug, Clone, Copy)]
pub struct RoutePolicy {
    pub method: &'static str,
    pub route: &'static str,
    pub minimum: Role,
}

pub const ROUTE_POLICIES: &[RoutePolicy] = &[
    RoutePolicy { method: "GET", route: "/api/users", minimum: Role::Admin },
    RoutePolicy { method: "POST", route: "/api/register", minimum: Role::SuperAdmin },
    RoutePolicy { method: "PUT", route: "/api/users/:id", minimum: Role::SuperAdmin },
    RoutePolicy { method: "DELETE", route: "/api/users/:id", minimum: Role::SuperAdmin },
    RoutePolicy { method: "PUT", route: "/api/updateRole", minimum: Role::SuperAdmin },
    RoutePolicy { method: "PUT", route: "/api/company/:id", minimum: Role::SuperAdmin },
    RoutePolicy { method: "DELETE", route: "/api/company/:id", minimum: Role::SuperAdmin },
];

/// Minimum role for a matched route template, if the route is restricted
pub fn required_role(method: &Method, route: &str) -> Option<Role> {
    ROUTE_POLICIES
        .iter()
        .find(|policy| policy.method == method.as_str() && policy.route == route)
        .map(|policy| policy.minimum)
}
