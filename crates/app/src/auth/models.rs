//! Auth data models.

use jiff::Timestamp;
use storefront::orders::Role;

use crate::uuids::TypedUuid;

/// Storefront user, owned by the identity service.
#[derive(Debug)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user: UserUuid,
    pub name: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Session row resolved from a token hash.
#[derive(Debug, Clone)]
pub(crate) struct SessionRecord {
    pub user_uuid: UserUuid,
    pub name: String,
    pub role: String,
    pub expires_at: Option<Timestamp>,
}
