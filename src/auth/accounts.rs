use rusqlite::Connection;

use crate::db::models::User;
use crate::db::users;
use crate::error::{AppError, AppResult};

/// Create an account. The username is trimmed; the password is taken as-is.
pub fn register(conn: &Connection, username: &str, password: &str, cost: u32) -> AppResult<i64> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required.".into(),
        ));
    }

    if users::username_exists(conn, username)? {
        return Err(taken());
    }

    let password_hash = bcrypt::hash(password, cost)?;
    match users::create_user(conn, username, &password_hash) {
        Ok(id) => {
            tracing::info!(user_id = id, "Registered user {}", username);
            Ok(id)
        }
        // Lost a race with a concurrent registration of the same name
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(taken())
        }
        Err(e) => Err(e.into()),
    }
}

/// Check a username/password pair. Unknown users and wrong passwords are
/// indistinguishable to the caller.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> AppResult<User> {
    let user = users::find_by_username(conn, username.trim())?;
    match user {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        _ => {
            tracing::info!("Failed login for {}", username.trim());
            Err(AppError::Unauthorized)
        }
    }
}

fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

fn taken() -> AppError {
    AppError::Conflict("That username is already taken.".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::migrated_pool;

    const COST: u32 = 4;

    #[test]
    fn register_hashes_password() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        let id = register(&conn, "  ana ", "pw1", COST).unwrap();
        let user = users::find_by_username(&conn, "ana").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_ne!(user.password_hash, "pw1");
        assert!(verify_password("pw1", &user.password_hash));
    }

    #[test]
    fn register_requires_both_fields() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        for (username, password) in [("", "pw"), ("   ", "pw"), ("ana", "")] {
            let err = register(&conn, username, password, COST).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(users::count_users(&conn).unwrap(), 0);
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();

        register(&conn, "ana", "pw1", COST).unwrap();
        let err = register(&conn, "ana", "other", COST).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(users::count_users(&conn).unwrap(), 1);
    }

    #[test]
    fn authenticate_accepts_correct_password() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        register(&conn, "ana", "pw1", COST).unwrap();

        let user = authenticate(&conn, "ana", "pw1").unwrap();
        assert_eq!(user.username, "ana");
    }

    #[test]
    fn authenticate_rejects_wrong_password_and_unknown_user() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        register(&conn, "ana", "pw1", COST).unwrap();

        assert!(matches!(
            authenticate(&conn, "ana", "wrong"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&conn, "bob", "pw1"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn verify_password_handles_garbage_hash() {
        assert!(!verify_password("pw", "not-a-bcrypt-hash"));
    }
}
