use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserType;
use crate::repositories;
use crate::repositories::users::{CreateUser, UpdateUser};

/// Makes sure the configured superuser exists, is an active admin and has the configured password.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_phone.is_empty() || admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PHONE/PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let phone = admin.first_superuser_phone.as_str();
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_phone(state.db(), phone).await? {
        let verified =
            security::verify_password(&admin.first_superuser_password, &user.hashed_password)
                .unwrap_or(false);

        let mut changes = UpdateUser::default();
        if !verified {
            changes.hashed_password = Some(security::hash_password(&admin.first_superuser_password)?);
        }
        if user.user_type != UserType::Admin {
            changes.user_type = Some(UserType::Admin);
        }
        if !user.is_active {
            changes.is_active = Some(true);
        }

        let needs_update = changes.hashed_password.is_some()
            || changes.user_type.is_some()
            || changes.is_active.is_some();
        if needs_update {
            repositories::users::update(state.db(), &user.id, changes, now).await?;
            tracing::info!(phone, "Updated default superuser");
        } else {
            tracing::info!("Default superuser already up to date");
        }

        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;
    repositories::users::create(
        state.db(),
        CreateUser {
            id: &Uuid::new_v4().to_string(),
            phone_number: phone,
            username: phone,
            first_name: "Super",
            last_name: "Admin",
            hashed_password,
            user_type: UserType::Admin,
            tg_id: None,
            has_registered_bot: false,
            is_active: true,
            created_at: now,
        },
    )
    .await?;

    tracing::info!(phone, "Created default superuser");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_superuser;
    use crate::core::config::Settings;
    use crate::core::security;
    use crate::core::state::AppState;
    use crate::db::types::UserType;
    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn superuser_is_created_then_repaired() {
        let ctx = test_support::setup_test_context().await;
        std::env::set_var("FIRST_SUPERUSER_PHONE", "900000009");
        std::env::set_var("FIRST_SUPERUSER_PASSWORD", "root-pass-1");
        let settings = Settings::load().expect("settings");
        let state = AppState::new(settings, ctx.state.db().clone(), ctx.state.redis().clone(), None);

        ensure_superuser(&state).await.expect("create");
        let user = repositories::users::find_by_phone(state.db(), "900000009")
            .await
            .expect("find")
            .expect("superuser");
        assert_eq!(user.user_type, UserType::Admin);

        sqlx::query("UPDATE users SET user_type = 'student', is_active = FALSE WHERE id = $1")
            .bind(&user.id)
            .execute(state.db())
            .await
            .expect("demote");

        ensure_superuser(&state).await.expect("repair");
        let user = repositories::users::find_by_phone(state.db(), "900000009")
            .await
            .expect("find")
            .expect("superuser");
        assert_eq!(user.user_type, UserType::Admin);
        assert!(user.is_active);
        assert!(security::verify_password("root-pass-1", &user.hashed_password).unwrap());

        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE user_type = 'admin'")
            .fetch_one(state.db())
            .await
            .expect("count");
        assert_eq!(admins, 1);

        std::env::remove_var("FIRST_SUPERUSER_PHONE");
        std::env::remove_var("FIRST_SUPERUSER_PASSWORD");
    }
}
