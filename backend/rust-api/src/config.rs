use serde::Deserialize;
use std::env;

/// Which persistence gateway backs the application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Mongo,
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(StorageBackend::Mongo),
            "memory" | "in-memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server_port: u16,
    pub storage_backend: StorageBackend,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub signing_key: String,
    pub token_ttl_minutes: i64,
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let server_port = settings
            .get_int("server.port")
            .ok()
            .map(|v| v.to_string())
            .or_else(|| env::var("SERVER_PORT").ok())
            .map(|v| {
                v.parse::<u16>().map_err(|_| {
                    config::ConfigError::Message(format!("Invalid server port: {}", v))
                })
            })
            .transpose()?
            .unwrap_or(8080);

        let backend_raw = settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STORAGE_BACKEND"))
            .unwrap_or_else(|_| "mongo".to_string());
        let storage_backend = StorageBackend::parse(&backend_raw).ok_or_else(|| {
            config::ConfigError::Message(format!("Unknown storage backend: {}", backend_raw))
        })?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGODB_URI"))
            .unwrap_or_default();
        if storage_backend == StorageBackend::Mongo && mongo_uri.is_empty() {
            return Err(config::ConfigError::Message(
                "MongoDB URI not found (set MONGODB_URI)".to_string(),
            ));
        }

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "quiz".to_string());

        let signing_key = match settings
            .get_string("auth.signing_key")
            .or_else(|_| env::var("SIGNING_KEY"))
        {
            Ok(key) if !key.is_empty() => key,
            _ if env == "prod" => {
                return Err(config::ConfigError::Message(
                    "SIGNING_KEY must be set in production".to_string(),
                ));
            }
            _ => {
                eprintln!("WARNING: Using default SIGNING_KEY (dev mode only!)");
                "dev-signing-key-only-for-local-testing".to_string()
            }
        };

        let token_ttl_minutes = settings
            .get_int("auth.token_ttl_minutes")
            .ok()
            .or_else(|| {
                env::var("TOKEN_TTL_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
            })
            .filter(|v| *v > 0)
            .unwrap_or(45);

        let admin_username = settings
            .get_string("admin.username")
            .or_else(|_| env::var("ADMIN_USERNAME"))
            .ok();
        let admin_password = settings
            .get_string("admin.password")
            .or_else(|_| env::var("ADMIN_PASSWORD"))
            .ok();
        let admin_seed = match (admin_username, admin_password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminSeed { username, password })
            }
            _ => None,
        };

        Ok(Config {
            server_port,
            storage_backend,
            mongo_uri,
            mongo_database,
            signing_key,
            token_ttl_minutes,
            admin_seed,
        })
    }

    /// Configuration for an in-memory instance, used by tests and local demos.
    pub fn in_memory(signing_key: &str) -> Self {
        Config {
            server_port: 0,
            storage_backend: StorageBackend::Memory,
            mongo_uri: String::new(),
            mongo_database: "quiz".to_string(),
            signing_key: signing_key.to_string(),
            token_ttl_minutes: 45,
            admin_seed: None,
        }
    }
}
