use crate::domain::requests::auth::AuthUser;
use shared::{errors::HttpError, model::UserRole};

/// Fails with 403 unless the caller holds one of `allowed`.
pub fn require_role(user: &AuthUser, allowed: &[UserRole]) -> Result<(), HttpError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }

    let names: Vec<&str> = allowed.iter().map(UserRole::as_str).collect();
    Err(HttpError::Forbidden(format!(
        "Access denied. Required role: {}",
        names.join(" or ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "u@example.com".into(),
            role,
        }
    }

    #[test]
    fn allows_listed_roles_only() {
        let allowed = [UserRole::Distributor, UserRole::Admin];

        assert!(require_role(&user(UserRole::Admin), &allowed).is_ok());
        assert!(matches!(
            require_role(&user(UserRole::Customer), &allowed),
            Err(HttpError::Forbidden(_))
        ));
    }
}
