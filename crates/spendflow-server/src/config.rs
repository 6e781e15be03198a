use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub openrouter_api_key: String,
    pub model: String,
    pub site_url: String,
    pub auth_username: String,
    pub auth_password: String,
    pub session_secret: String,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    storage: StorageSection,
    #[serde(default)]
    llm: LlmSection,
    #[serde(default)]
    auth: AuthSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StorageSection {
    #[serde(default = "default_db_path")]
    db_path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LlmSection {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_site_url")]
    site_url: String,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            site_url: default_site_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthSection {
    #[serde(default = "default_auth_username")]
    username: String,
    #[serde(default = "default_auth_password")]
    password: String,
    #[serde(default)]
    session_secret: Option<String>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            username: default_auth_username(),
            password: default_auth_password(),
            session_secret: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "spendflow.redb".to_string()
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_auth_username() -> String {
    "admin".to_string()
}

fn default_auth_password() -> String {
    "password".to_string()
}

fn default_session_secret() -> String {
    "change-this-secret-in-env".to_string()
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            // The API key and session secret still fall back to env so the
            // config file can be committed without them.
            return Ok(Self {
                host: file_config.server.host,
                port: file_config.server.port,
                db_path: file_config.storage.db_path,
                openrouter_api_key: file_config
                    .llm
                    .api_key
                    .or_else(|| env::var("OPENROUTER_API_KEY").ok())
                    .unwrap_or_default(),
                model: file_config.llm.model,
                site_url: file_config.llm.site_url,
                auth_username: file_config.auth.username,
                auth_password: file_config.auth.password,
                session_secret: file_config
                    .auth
                    .session_secret
                    .or_else(|| env::var("SPENDFLOW_SESSION_SECRET").ok())
                    .unwrap_or_else(default_session_secret),
            });
        }

        Ok(Self::from_env())
    }

    fn from_env() -> Self {
        let host = env::var("SPENDFLOW_SERVER_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("SPENDFLOW_SERVER_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let db_path = env::var("SPENDFLOW_DB_PATH").unwrap_or_else(|_| default_db_path());
        let openrouter_api_key = env::var("OPENROUTER_API_KEY").unwrap_or_default();
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| default_model());
        let site_url = env::var("SITE_URL").unwrap_or_else(|_| default_site_url());
        let auth_username =
            env::var("BASIC_AUTH_USER").unwrap_or_else(|_| default_auth_username());
        let auth_password =
            env::var("BASIC_AUTH_PASSWORD").unwrap_or_else(|_| default_auth_password());
        let session_secret =
            env::var("SPENDFLOW_SESSION_SECRET").unwrap_or_else(|_| default_session_secret());

        Self {
            host,
            port,
            db_path,
            openrouter_api_key,
            model,
            site_url,
            auth_username,
            auth_password,
            session_secret,
        }
    }
}

#[cfg(test)]
impl ServerConfig {
    /// Deterministic config for handler tests; never reads env or disk.
    pub fn test_defaults() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            openrouter_api_key: "test-key".to_string(),
            model: "mock-model".to_string(),
            site_url: default_site_url(),
            auth_username: default_auth_username(),
            auth_password: default_auth_password(),
            session_secret: "test-secret".to_string(),
        }
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("SPENDFLOW_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("spendflow.toml").exists() {
        Some("spendflow.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))?;
    Ok(Some(parsed))
}
