//! Acting principal for lifecycle operations.
//!
//! Authentication happens upstream; the gateway forwards the resolved user id
//! and role in `x-user-id` / `x-user-role`. The role is parsed once into a
//! typed enum here and the principal is passed explicitly into every booking
//! operation.

use std::str::FromStr;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i32,
    pub role: Role,
}

impl Principal {
    pub fn customer(user_id: i32) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    pub fn admin(user_id: i32) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("admin role required".to_string()))
        }
    }

    /// Owners act on their own records; admins act on any
    pub fn require_owner_or_admin(&self, owner_id: i32) -> Result<()> {
        if self.is_admin() || self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "user {} does not own this booking",
                self.user_id
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i32>().ok())
            .ok_or(AppError::Unauthorized)?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.parse::<Role>().ok())
                .ok_or(AppError::Unauthorized)?,
            None => Role::Customer,
        };

        Ok(Principal { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_owner_or_admin() {
        assert!(Principal::customer(1).require_owner_or_admin(1).is_ok());
        assert!(Principal::customer(2).require_owner_or_admin(1).is_err());
        assert!(Principal::admin(9).require_owner_or_admin(1).is_ok());
    }

    async fn extract(headers: &[(&str, &str)]) -> Result<Principal> {
        let mut request = axum::http::Request::builder();
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let (mut parts, _) = request.body(()).unwrap().into_parts();
        Principal::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extract_principal_from_headers() {
        let admin = extract(&[(USER_ID_HEADER, "7"), (USER_ROLE_HEADER, "admin")])
            .await
            .unwrap();
        assert_eq!(admin.user_id, 7);
        assert_eq!(admin.role, Role::Admin);

        let customer = extract(&[(USER_ID_HEADER, " 8 ")]).await.unwrap();
        assert_eq!(customer.role, Role::Customer);

        assert!(matches!(extract(&[]).await, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthorized() {
        let result = extract(&[(USER_ID_HEADER, "7"), (USER_ROLE_HEADER, "manager")]).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_require_admin() {
        assert!(Principal::admin(1).require_admin().is_ok());
        assert!(matches!(
            Principal::customer(1).require_admin(),
            Err(AppError::Forbidden(_))
        ));
    }
}
