//! Order status rules

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, awaiting processing.
    Pending,

    /// Being prepared.
    Processing,

    /// Handed to the carrier.
    Shipped,

    /// Received by the buyer.
    Delivered,

    /// Cancelled before delivery.
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Lowercase name used in storage and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether `next` directly follows this status.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (
                    Self::Pending | Self::Processing | Self::Shipped,
                    Self::Cancelled
                )
        )
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `next` does not directly follow this status.
    pub const fn transition(self, next: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Raised when parsing an unrecognised status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown order status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// A status change that the lifecycle does not allow.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot move an order from {from} to {to}")]
pub struct InvalidTransition {
    /// Current status.
    pub from: OrderStatus,

    /// Requested status.
    pub to: OrderStatus,
}

/// What an authenticated actor may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A shopper.
    Customer,

    /// Store staff.
    Admin,
}

impl Role {
    /// Lowercase name used in storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may manage every order.
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Raised when parsing an unrecognised role.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    use super::OrderStatus::{Cancelled, Delivered, Pending, Processing, Shipped};

    #[test]
    fn happy_path_walks_forward() -> TestResult {
        let status = Pending
            .transition(Processing)?
            .transition(Shipped)?
            .transition(Delivered)?;

        assert_eq!(status, Delivered);

        Ok(())
    }

    #[test]
    fn cancel_is_allowed_until_delivery() {
        for from in [Pending, Processing, Shipped] {
            assert!(
                from.can_transition_to(Cancelled),
                "{from} should be cancellable"
            );
        }

        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_reject_everything() {
        for from in [Delivered, Cancelled] {
            assert!(from.is_terminal());

            for to in OrderStatus::ALL {
                assert!(
                    !from.can_transition_to(to),
                    "{from} -> {to} should be rejected"
                );
            }
        }
    }

    #[test]
    fn skipping_and_reversing_are_rejected() {
        assert_eq!(
            Delivered.transition(Pending),
            Err(InvalidTransition {
                from: Delivered,
                to: Pending
            })
        );
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Processing));
    }

    #[test]
    fn same_state_is_not_a_transition() {
        for status in OrderStatus::ALL {
            assert!(
                !status.can_transition_to(status),
                "{status} -> {status} should be rejected"
            );
        }
    }

    #[test]
    fn status_names_round_trip() -> TestResult {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>()?, status);
        }

        assert_eq!(
            "lost".parse::<OrderStatus>(),
            Err(UnknownStatus("lost".to_string()))
        );

        Ok(())
    }

    #[test]
    fn roles_parse_from_storage_names() -> TestResult {
        assert_eq!("admin".parse::<Role>()?, Role::Admin);
        assert!(Role::Admin.is_admin());
        assert!(!"customer".parse::<Role>()?.is_admin());

        Ok(())
    }
}
