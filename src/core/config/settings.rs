use std::path::PathBuf;

use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment,
    parse_route_path, parse_u16, parse_u32, parse_u64,
};
use super::secret::{default_secret_path, load_or_create_secret_key};
use super::types::{
    ApiSettings, ConfigError, CorsSettings, DatabaseSettings, QuestionSettings, RealtimeSettings,
    RuntimeSettings, SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings,
    TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("EXAMSECURE_HOST", "0.0.0.0");
        let port = env_or_default("EXAMSECURE_PORT", "5000");

        let environment = parse_environment(
            env_optional("EXAMSECURE_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("EXAMSECURE_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "ExamSecure API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = parse_route_path("API_V1_STR", env_or_default("API_V1_STR", "/api/v1"))?;

        let (secret_key, secret_key_from_env) = match env_optional("SECRET_KEY") {
            Some(value) => (value, true),
            None => {
                let path = env_optional("SECRET_KEY_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_secret_path);
                (load_or_create_secret_key(&path), false)
            }
        };
        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "10080"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "examsecure");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "examsecure");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DATABASE_MAX_CONNECTIONS", env_or_default("DATABASE_MAX_CONNECTIONS", "20"))?;

        let ws_path = parse_route_path("WS_PATH", env_or_default("WS_PATH", "/ws"))?;
        let ping_interval_seconds = parse_u64(
            "WS_PING_INTERVAL_SECONDS",
            env_or_default("WS_PING_INTERVAL_SECONDS", "30"),
        )?;

        let max_attempts =
            parse_u32("QUESTION_MAX_ATTEMPTS", env_or_default("QUESTION_MAX_ATTEMPTS", "50"))?;

        let log_level = env_or_default("EXAMSECURE_LOG_LEVEL", "info");
        let json = env_optional("EXAMSECURE_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings {
                secret_key,
                secret_key_from_env,
                access_token_expire_minutes,
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
            realtime: RealtimeSettings { ws_path, ping_interval_seconds },
            questions: QuestionSettings { max_attempts },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
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

    pub(crate) fn realtime(&self) -> &RealtimeSettings {
        &self.realtime
    }

    pub(crate) fn questions(&self) -> &QuestionSettings {
        &self.questions
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.realtime.ping_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "WS_PING_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.questions.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "QUESTION_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DATABASE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if !self.security.secret_key_from_env {
            return Err(ConfigError::MissingSecret("SECRET_KEY"));
        }
        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        Ok(())
    }
}
