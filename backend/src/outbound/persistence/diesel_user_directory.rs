//! PostgreSQL-backed `UserDirectory` reading the mirrored `users` table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{EmailAddress, UserId};

use super::diesel_helpers::{map_basic_diesel_error, pool_error_message};
use super::pool::{DbPool, PoolError};
use super::schema::users;

#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserDirectoryError {
    UserDirectoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> UserDirectoryError {
    map_basic_diesel_error(
        error,
        |message| UserDirectoryError::query(message),
        |message| UserDirectoryError::connection(message),
    )
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn email_for(&self, user: &UserId) -> Result<Option<EmailAddress>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let email: Option<Option<String>> = users::table
            .filter(users::id.eq(user.as_str()))
            .select(users::email)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        email
            .flatten()
            .map(|raw| {
                EmailAddress::new(raw).map_err(|err| {
                    UserDirectoryError::query(format!("invalid email in database: {err}"))
                })
            })
            .transpose()
    }
}
