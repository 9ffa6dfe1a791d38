use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub admin_port: u16,
    pub database_path: String,
    pub log_database_path: String,
    pub key_prefix: String,
    /// Static operator allow-list; empty means the admin surface rejects everyone
    pub admin_tokens: Vec<String>,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("KEYGATE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);
        let admin_port: u16 = env::var("ADMIN_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5001);

        let admin_tokens = env::var("ADMIN_TOKENS")
            .map(|v| {
                v.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            admin_port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "keygate.db".to_string()),
            log_database_path: env::var("LOG_DATABASE_PATH")
                .unwrap_or_else(|_| "keygate_log.db".to_string()),
            key_prefix: env::var("KEY_PREFIX").unwrap_or_else(|_| "GNP".to_string()),
            admin_tokens,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn admin_addr(&self) -> String {
        format!("{}:{}", self.host, self.admin_port)
    }
}
