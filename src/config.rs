use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    // Blob storage
    pub blob_token: Option<String>,
    pub blob_api_url: String,
    pub blob_prefix: String,
    pub archive_dir: String,

    // Outcome spin
    pub spin_duration_ms: u64,
    pub spin_tick_ms: u64,
    pub spin_answers_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            blob_token: env::var("BLOB_READ_WRITE_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            blob_api_url: env::var("BLOB_API_URL")
                .unwrap_or_else(|_| "https://blob.vercel-storage.com".into()),
            blob_prefix: env::var("BLOB_PREFIX").unwrap_or_else(|_| "deer".into()),
            archive_dir: env::var("ARCHIVE_DIR").unwrap_or_else(|_| "./archive".into()),

            spin_duration_ms: env::var("SPIN_DURATION_MS")
                .unwrap_or_else(|_| "2000".into())
                .parse()
                .unwrap_or(2000),
            spin_tick_ms: env::var("SPIN_TICK_MS")
                .unwrap_or_else(|_| "16".into()) // one animation frame
                .parse()
                .unwrap_or(16),
            spin_answers_timeout_ms: env::var("SPIN_ANSWERS_TIMEOUT_MS")
                .unwrap_or_else(|_| "10000".into())
                .parse()
                .unwrap_or(10_000),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn spin_duration(&self) -> Duration {
        Duration::from_millis(self.spin_duration_ms)
    }

    pub fn spin_tick(&self) -> Duration {
        Duration::from_millis(self.spin_tick_ms.max(1))
    }

    pub fn spin_answers_timeout(&self) -> Duration {
        Duration::from_millis(self.spin_answers_timeout_ms)
    }
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for router tests; never touches the environment.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            blob_token: None,
            blob_api_url: "http://blob.invalid".into(),
            blob_prefix: "deer".into(),
            archive_dir: "./archive".into(),
            spin_duration_ms: 40,
            spin_tick_ms: 5,
            spin_answers_timeout_ms: 200,
        }
    }
}
