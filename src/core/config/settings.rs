use std::path::PathBuf;

use super::parsing::{
    env_optional, env_or_default, is_supported_image_extension, normalize_site_url, parse_bool,
    parse_cors_origins, parse_environment, parse_i64, parse_string_list, parse_u16, parse_u32,
    parse_u64,
};
use super::secret::{default_secret_file_path, load_or_create_secret_key};
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, LearningSettings,
    RedisSettings, RuntimeSettings, S3Settings, SecuritySettings, ServerHost, ServerPort,
    ServerSettings, Settings, StorageSettings, TelegramSettings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("LMS_HOST", "0.0.0.0");
        let port = env_or_default("LMS_PORT", "8000");

        let environment =
            parse_environment(env_optional("LMS_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("LMS_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "PDP LMS API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");
        let site_url = normalize_site_url(env_or_default("SITE_URL", "http://127.0.0.1:8000/"));

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(
                env_optional("SECRET_KEY_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_secret_file_path),
            ),
        };

        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "1440"),
        )?;
        let refresh_token_expire_minutes = parse_u64(
            "REFRESH_TOKEN_EXPIRE_MINUTES",
            env_or_default("REFRESH_TOKEN_EXPIRE_MINUTES", "43200"),
        )?;
        let device_token_expire_minutes = parse_u64(
            "DEVICE_TOKEN_EXPIRE_MINUTES",
            env_or_default("DEVICE_TOKEN_EXPIRE_MINUTES", "10080"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "lms");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "lms_db");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DB_MAX_CONNECTIONS", env_or_default("DB_MAX_CONNECTIONS", "30"))?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "10"))?;
        let allowed_image_extensions = parse_string_list(
            env_optional("ALLOWED_IMAGE_EXTENSIONS"),
            &["jpg", "jpeg", "png", "webp"],
        );
        let presigned_url_expire_minutes = parse_u64(
            "PRESIGNED_URL_EXPIRE_MINUTES",
            env_or_default("PRESIGNED_URL_EXPIRE_MINUTES", "30"),
        )?;

        let s3_endpoint = env_or_default("S3_ENDPOINT", "");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "lms-media");
        let s3_region = env_or_default("S3_REGION", "us-east-1");

        let support_period_days =
            parse_i64("SUPPORT_PERIOD_DAYS", env_or_default("SUPPORT_PERIOD_DAYS", "45"))?;

        let first_superuser_phone = env_or_default("FIRST_SUPERUSER_PHONE", "");
        let first_superuser_password = env_or_default("FIRST_SUPERUSER_PASSWORD", "");

        let telegram_enabled =
            env_optional("TELEGRAM_BOT_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);
        let telegram_token = env_or_default("TG_TOKEN", "");
        let telegram_poll_timeout_seconds = parse_u64(
            "TELEGRAM_POLL_TIMEOUT_SECONDS",
            env_or_default("TELEGRAM_POLL_TIMEOUT_SECONDS", "30"),
        )?;

        let log_level = env_or_default("LMS_LOG_LEVEL", "info");
        let json = env_optional("LMS_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str, site_url },
            security: SecuritySettings {
                secret_key,
                access_token_expire_minutes,
                refresh_token_expire_minutes,
                device_token_expire_minutes,
                algorithm,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            storage: StorageSettings {
                max_upload_size_mb,
                allowed_image_extensions,
                presigned_url_expire_minutes,
            },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            learning: LearningSettings { support_period_days },
            admin: AdminSettings { first_superuser_phone, first_superuser_password },
            telegram: TelegramSettings {
                enabled: telegram_enabled,
                token: telegram_token,
                poll_timeout_seconds: telegram_poll_timeout_seconds,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn learning(&self) -> &LearningSettings {
        &self.learning
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telegram(&self) -> &TelegramSettings {
        &self.telegram
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.allowed_image_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_IMAGE_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        for extension in &self.storage.allowed_image_extensions {
            if !is_supported_image_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_IMAGE_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if self.learning.support_period_days < 0 {
            return Err(ConfigError::InvalidValue {
                field: "SUPPORT_PERIOD_DAYS",
                value: self.learning.support_period_days.to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if self.telegram.enabled && self.telegram.token.is_empty() {
            return Err(ConfigError::MissingSecret("TG_TOKEN"));
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.s3.access_key.is_empty() || self.s3.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }
        if self.admin.first_superuser_phone.is_empty()
            || self.admin.first_superuser_password.is_empty()
        {
            return Err(ConfigError::MissingSecret("FIRST_SUPERUSER_PHONE/FIRST_SUPERUSER_PASSWORD"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn load_uses_lms_defaults() {
        let _guard = test_support::env_lock().await;
        test_support::clear_settings_env();
        std::env::set_var("SECRET_KEY", "unit-secret");

        let settings = Settings::load().expect("settings");

        assert_eq!(settings.server_addr(), "0.0.0.0:8000");
        assert_eq!(settings.api().api_v1_str, "/api/v1");
        assert_eq!(settings.api().site_url, "http://127.0.0.1:8000/");
        assert_eq!(settings.learning().support_period_days, 45);
        assert_eq!(settings.security().secret_key, "unit-secret");
        assert!(!settings.telegram().enabled);
    }

    #[tokio::test]
    async fn enabled_bot_requires_token() {
        let _guard = test_support::env_lock().await;
        test_support::clear_settings_env();
        std::env::set_var("SECRET_KEY", "unit-secret");
        std::env::set_var("TELEGRAM_BOT_ENABLED", "1");

        let err = Settings::load().expect_err("missing token");
        assert!(matches!(err, ConfigError::MissingSecret("TG_TOKEN")));

        std::env::remove_var("TELEGRAM_BOT_ENABLED");
    }

    #[tokio::test]
    async fn strict_config_requires_superuser_credentials() {
        let _guard = test_support::env_lock().await;
        test_support::clear_settings_env();
        std::env::set_var("SECRET_KEY", "unit-secret");
        std::env::set_var("LMS_STRICT_CONFIG", "1");
        std::env::set_var("DATABASE_URL", "postgresql://lms:pw@localhost/lms");
        std::env::set_var("S3_ACCESS_KEY", "key");
        std::env::set_var("S3_SECRET_KEY", "secret");

        let err = Settings::load().expect_err("missing superuser");
        assert!(matches!(err, ConfigError::MissingSecret(_)));

        for key in ["LMS_STRICT_CONFIG", "DATABASE_URL", "S3_ACCESS_KEY", "S3_SECRET_KEY"] {
            std::env::remove_var(key);
        }
    }
}
