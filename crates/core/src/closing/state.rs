//! Day state machine and closing preconditions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cashdesk_shared::AppError;
use cashdesk_shared::types::{PointId, UserId};

/// State of a (point, business day) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayState {
    /// No closure row exists yet.
    NoClosure,
    /// A closure row exists but the day is still open.
    Open,
    /// The day has been closed. Terminal.
    Closed,
}

impl DayState {
    /// Returns true if the day may still be closed.
    #[must_use]
    pub const fn can_close(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// What the closing check needs to know about the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointAccess {
    /// Whether the point is active.
    pub is_active: bool,
}

/// What the closing check needs to know about the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAccess {
    /// Whether the user account is active.
    pub is_active: bool,
    /// Whether the user's role restricts them to their assigned point.
    pub point_bound: bool,
    /// The point the user is assigned to, if any.
    pub assigned_point: Option<PointId>,
}

/// Why a closing cannot proceed. These are returned, never thrown, so the
/// caller can show the code to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosingRejection {
    /// The day already has a closed closure row.
    #[error("Day {day} is already closed for point {point_id}")]
    AlreadyClosed {
        /// Point.
        point_id: PointId,
        /// Business day.
        day: NaiveDate,
    },

    /// The point does not exist.
    #[error("Point {point_id} not found")]
    PointNotFound {
        /// Point.
        point_id: PointId,
    },

    /// The point is inactive.
    #[error("Point {point_id} is inactive")]
    PointInactive {
        /// Point.
        point_id: PointId,
    },

    /// The user does not exist or is inactive.
    #[error("User {user_id} not found")]
    UserNotFound {
        /// User.
        user_id: UserId,
    },

    /// The user is bound to a different point, or to none.
    #[error("User {user_id} has no permission to close point {point_id}")]
    NoPermission {
        /// User.
        user_id: UserId,
        /// Point.
        point_id: PointId,
    },
}

impl ClosingRejection {
    /// Stable code callers branch on.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AlreadyClosed { .. } => "ALREADY_CLOSED",
            Self::PointNotFound { .. } => "POINT_NOT_FOUND",
            Self::PointInactive { .. } => "POINT_INACTIVE",
            Self::UserNotFound { .. } => "USER_NOT_FOUND",
            Self::NoPermission { .. } => "NO_PERMISSION",
        }
    }
}

impl From<ClosingRejection> for AppError {
    fn from(rejection: ClosingRejection) -> Self {
        let message = rejection.to_string();
        match rejection {
            ClosingRejection::PointNotFound { .. } | ClosingRejection::UserNotFound { .. } => {
                Self::NotFound(message)
            }
            ClosingRejection::NoPermission { .. } => Self::Forbidden(message),
            ClosingRejection::AlreadyClosed { .. } | ClosingRejection::PointInactive { .. } => {
                Self::BusinessRule {
                    code: rejection.code(),
                    message,
                }
            }
        }
    }
}

/// Decides whether `user_id` may close `day` at `point_id`.
///
/// Checks run in order: already closed, point, user, permission.
///
/// # Errors
///
/// Returns the first [`ClosingRejection`] that applies.
pub fn evaluate_closure(
    point_id: PointId,
    day: NaiveDate,
    user_id: UserId,
    state: DayState,
    point: Option<PointAccess>,
    user: Option<UserAccess>,
) -> Result<(), ClosingRejection> {
    if !state.can_close() {
        return Err(ClosingRejection::AlreadyClosed { point_id, day });
    }

    let point = point.ok_or(ClosingRejection::PointNotFound { point_id })?;
    if !point.is_active {
        return Err(ClosingRejection::PointInactive { point_id });
    }

    let user = user
        .filter(|u| u.is_active)
        .ok_or(ClosingRejection::UserNotFound { user_id })?;

    if user.point_bound && user.assigned_point != Some(point_id) {
        return Err(ClosingRejection::NoPermission { user_id, point_id });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn active_point() -> Option<PointAccess> {
        Some(PointAccess { is_active: true })
    }

    fn operator_at(point: PointId) -> Option<UserAccess> {
        Some(UserAccess {
            is_active: true,
            point_bound: true,
            assigned_point: Some(point),
        })
    }

    #[test]
    fn test_open_day_can_be_closed() {
        let point = PointId::new();
        let user = UserId::new();
        assert!(evaluate_closure(point, day(), user, DayState::Open, active_point(), operator_at(point)).is_ok());
        assert!(
            evaluate_closure(point, day(), user, DayState::NoClosure, active_point(), operator_at(point)).is_ok()
        );
    }

    #[test]
    fn test_closed_day_is_rejected_first() {
        let point = PointId::new();
        let user = UserId::new();
        let result = evaluate_closure(point, day(), user, DayState::Closed, None, None);
        assert_eq!(result.unwrap_err().code(), "ALREADY_CLOSED");
    }

    #[test]
    fn test_point_checks() {
        let point = PointId::new();
        let user = UserId::new();
        let missing = evaluate_closure(point, day(), user, DayState::Open, None, operator_at(point));
        assert_eq!(missing.unwrap_err().code(), "POINT_NOT_FOUND");

        let inactive = evaluate_closure(
            point,
            day(),
            user,
            DayState::Open,
            Some(PointAccess { is_active: false }),
            operator_at(point),
        );
        assert_eq!(inactive.unwrap_err().code(), "POINT_INACTIVE");
    }

    #[test]
    fn test_missing_or_inactive_user() {
        let point = PointId::new();
        let user = UserId::new();
        let missing = evaluate_closure(point, day(), user, DayState::Open, active_point(), None);
        assert_eq!(missing.unwrap_err().code(), "USER_NOT_FOUND");

        let inactive = evaluate_closure(
            point,
            day(),
            user,
            DayState::Open,
            active_point(),
            Some(UserAccess {
                is_active: false,
                point_bound: false,
                assigned_point: None,
            }),
        );
        assert_eq!(inactive.unwrap_err().code(), "USER_NOT_FOUND");
    }

    #[test]
    fn test_point_bound_user_at_other_point() {
        let point = PointId::new();
        let user = UserId::new();
        let result = evaluate_closure(point, day(), user, DayState::Open, active_point(), operator_at(PointId::new()));
        assert_eq!(
            result.unwrap_err(),
            ClosingRejection::NoPermission {
                user_id: user,
                point_id: point
            }
        );
    }

    #[test]
    fn test_point_bound_user_without_assignment() {
        let point = PointId::new();
        let unassigned = Some(UserAccess {
            is_active: true,
            point_bound: true,
            assigned_point: None,
        });
        let result = evaluate_closure(point, day(), UserId::new(), DayState::Open, active_point(), unassigned);
        assert_eq!(result.unwrap_err().code(), "NO_PERMISSION");
    }

    #[test]
    fn test_unbound_roles_close_anywhere() {
        let point = PointId::new();
        let admin = Some(UserAccess {
            is_active: true,
            point_bound: false,
            assigned_point: Some(PointId::new()),
        });
        assert!(evaluate_closure(point, day(), UserId::new(), DayState::Open, active_point(), admin).is_ok());
    }

    #[test]
    fn test_rejection_serializes_with_code() {
        let point_id = PointId::new();
        let json = serde_json::to_value(ClosingRejection::PointInactive { point_id }).unwrap();
        assert_eq!(json["code"], "POINT_INACTIVE");
    }

    #[test]
    fn test_rejection_maps_to_app_error() {
        let point_id = PointId::new();
        let already: AppError = ClosingRejection::AlreadyClosed { point_id, day: day() }.into();
        assert_eq!(already.error_code(), "ALREADY_CLOSED");
        assert_eq!(already.status_code(), 422);

        let forbidden: AppError = ClosingRejection::NoPermission {
            user_id: UserId::new(),
            point_id,
        }
        .into();
        assert_eq!(forbidden.status_code(), 403);

        let missing: AppError = ClosingRejection::PointNotFound { point_id }.into();
        assert_eq!(missing.status_code(), 404);
    }
}
