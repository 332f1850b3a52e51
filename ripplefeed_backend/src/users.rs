use crate::database::models::UserRecord;
use crate::database::repositories::{SqliteRepositories, UserRepository};
use crate::database::{self, Database};
use crate::error::{FeedError, FeedResult};
use crate::identity::Role;
use crate::utils::now_utc_iso;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    database: Database,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserView {
    fn from_record(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            role: record.role,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl UserService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Registers an account record. Credentials never touch this service;
    /// the upstream gateway owns password handling and token issuance.
    pub fn create_user(&self, input: CreateUserInput) -> FeedResult<UserView> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(FeedError::Validation("email may not be empty".into()));
        }
        if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
            return Err(FeedError::Validation("name may not be empty".into()));
        }

        let now = now_utc_iso();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role.unwrap_or_default().as_str().into(),
            status: "active".into(),
            created_at: now.clone(),
            updated_at: now,
        };

        self.database.with_repositories(|repos| {
            if repos.users().get_by_email(&record.email)?.is_some() {
                return Err(FeedError::Conflict("email already registered".into()));
            }
            match repos.users().create(&record) {
                Ok(()) => {}
                // unique index may still trip under a concurrent registration
                Err(err) if database::is_constraint_violation(&err) => {
                    return Err(FeedError::Conflict("email already registered".into()));
                }
                Err(err) => return Err(err.into()),
            }
            tracing::info!(user_id = %record.id, "user registered");
            Ok(UserView::from_record(record.clone()))
        })
    }

    pub fn get_user(&self, id: &str) -> FeedResult<UserView> {
        self.database.with_repositories(|repos| {
            let record = repos
                .users()
                .get(id)?
                .ok_or_else(|| FeedError::NotFound("user not found".into()))?;
            Ok(UserView::from_record(record))
        })
    }
}

/// Mutations record the acting identity as a foreign user reference, so the
/// reference must resolve before anything is written.
pub(crate) fn ensure_registered(
    repos: &SqliteRepositories<'_>,
    user_id: &str,
) -> FeedResult<()> {
    if repos.users().get(user_id)?.is_none() {
        return Err(FeedError::Validation(format!(
            "identity {user_id} is not a registered user"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_service() -> UserService {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        UserService::new(db)
    }

    fn input(email: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            role: None,
        }
    }

    #[test]
    fn registration_normalizes_email_and_defaults_role() {
        let service = setup_service();
        let user = service
            .create_user(input("Ada@Example.COM"))
            .expect("create user");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, "user");
        assert_eq!(user.status, "active");

        let fetched = service.get_user(&user.id).expect("fetch user");
        assert_eq!(fetched.email, "ada@example.com");
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let service = setup_service();
        service.create_user(input("ada@example.com")).unwrap();
        let result = service.create_user(input("ADA@example.com"));
        assert!(matches!(result, Err(FeedError::Conflict(_))));
    }

    #[test]
    fn unknown_user_is_not_found() {
        let service = setup_service();
        assert!(matches!(
            service.get_user("missing"),
            Err(FeedError::NotFound(_))
        ));
    }
}
