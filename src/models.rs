use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity & Roles ---

/// Role
///
/// The closed set of roles a portal user can hold. Every user holds exactly one.
/// `User` is the generic authenticated role: it can enter the shared pages but
/// none of the role-gated dashboard subtrees.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    BusinessOwner,
    ProjectManager,
    Member,
    User,
}

impl Role {
    /// Every variant, in declaration order.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::BusinessOwner,
        Role::ProjectManager,
        Role::Member,
        Role::User,
    ];

    /// Canonical wire spelling, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::BusinessOwner => "business_owner",
            Role::ProjectManager => "project_manager",
            Role::Member => "member",
            Role::User => "user",
        }
    }

    /// The role-gated dashboard subtree owned by this role, if it has one.
    pub fn dashboard_path(&self) -> Option<&'static str> {
        match self {
            Role::Admin => Some("/dashboard/admin"),
            Role::BusinessOwner => Some("/dashboard/business"),
            Role::ProjectManager => Some("/dashboard/pm"),
            Role::Member => Some("/dashboard/member"),
            Role::User => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted role string is not one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0:?}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    /// Accepts the snake_case wire form plus the kebab and PascalCase spellings
    /// the frontend has used historically, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "admin" => Ok(Role::Admin),
            "businessowner" | "business" => Ok(Role::BusinessOwner),
            "projectmanager" | "pm" => Ok(Role::ProjectManager),
            "member" => Ok(Role::Member),
            "user" => Ok(Role::User),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// UserIdentity
///
/// The resolved identity of a signed-in user, as exposed by the identity
/// provider on the client and by the `AuthUser` extractor on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// ProfileRow
///
/// Raw row of the `profiles` table. The role column is free text in the
/// database, so it is only turned into a `Role` once it has been validated.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl TryFrom<ProfileRow> for UserIdentity {
    type Error = RoleParseError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(UserIdentity {
            user_id: row.id,
            email: row.email,
            role: row.role.parse()?,
        })
    }
}

// --- Allow-lists ---

/// AllowList
///
/// The set of roles admitted by one guard instance. An empty list admits nobody.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AllowList(BTreeSet<Role>);

impl AllowList {
    /// The default allow-list of a named guard: only that guard's role.
    pub fn only(role: Role) -> Self {
        Self(BTreeSet::from([role]))
    }

    pub fn of<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self(roles.into_iter().collect())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for AllowList {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self::of(iter)
    }
}

// --- Page Shell Schemas (Output) ---

/// PageView
///
/// What the page shell receives for a portal page: the page key and, when the
/// request carried a resolvable session, the viewer's identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageView {
    pub page: String,
    pub viewer: Option<UserIdentity>,
}

/// SessionView
///
/// Output schema for `GET /api/session`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub user: UserIdentity,
    /// The role-specific dashboard the client should offer, if any.
    pub dashboard: Option<String>,
    #[ts(type = "string | null")]
    pub expires_at: Option<DateTime<Utc>>,
}
