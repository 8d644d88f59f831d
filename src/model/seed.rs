use tracing::info;

use crate::{
    auth::hash_password,
    error::AppResult,
    model::{
        CrudRepository, ModelManager,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    web::{AuthenticatedUser, UserRole},
};

/// Creates the administrator account if no user with `username` exists yet.
/// An existing account is left untouched, whatever its role or password.
pub async fn seed_admin(mm: &ModelManager, username: &str, password: &str) -> AppResult<()> {
    let system = AuthenticatedUser::admin();
    if UserEntity::find_by_username(mm, &system, username)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let admin = UserEntity::create(
        mm,
        &system,
        UserEntityCreateUpdate {
            username: username.to_string(),
            email: None,
            password_hash: hash_password(password)?,
            role: Some(UserRole::Admin),
        },
    )
    .await?;

    info!("Seeded administrator account `{}`", admin.username());
    Ok(())
}
