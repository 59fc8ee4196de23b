pub mod config {
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
    pub struct Config {
        #[serde(default = "default_app_name")]
        pub app_name: String,
        #[serde(default = "default_environment")]
        pub environment: String,
        #[serde(default = "default_host")]
        pub host: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_web_concurrency")]
        pub web_concurrency: usize,
        #[serde(default = "default_log_level")]
        pub log_level: String,
        #[serde(default = "default_database_url")]
        pub database_url: String,
    }

    impl Default for Config {
        fn default() -> Self {
            Self {
                app_name: default_app_name(),
                environment: default_environment(),
                host: default_host(),
                port: default_port(),
                web_concurrency: default_web_concurrency(),
                log_level: default_log_level(),
                database_url: default_database_url(),
            }
        }
    }

    impl Config {
        /// Loads configuration from environment variables, after reading a
        /// `.env` file from the working directory if there is one.
        pub fn from_env() -> anyhow::Result<Self> {
            dotenvy::dotenv().ok();
            Self::from_source(config::Environment::default())
        }

        /// Loads configuration from the given environment source.
        pub fn from_source(environment: config::Environment) -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(environment)
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        /// Returns the value of a single setting by case-insensitive name.
        pub fn get(&self, key: &str) -> Option<String> {
            let settings = serde_json::to_value(self).ok()?;
            match settings.get(key.to_lowercase())? {
                serde_json::Value::String(value) => Some(value.clone()),
                other => Some(other.to_string()),
            }
        }

        /// The `host:port` pair the server listens on.
        pub fn bind_address(&self) -> String {
            format!("{}:{}", self.host, self.port)
        }

        /// Whether SQL statements are logged.
        pub fn sql_logging(&self) -> bool {
            self.environment == "dev"
        }
    }

    /// Writes the value of setting `key` followed by a newline. An unknown key
    /// writes nothing and is only logged, so the command still succeeds.
    pub fn print_setting(
        config: &Config,
        key: &str,
        out: &mut impl std::io::Write,
    ) -> std::io::Result<()> {
        match config.get(key) {
            Some(value) => {
                tracing::debug!("settings: {} = {}", key, value);
                writeln!(out, "{}", value)
            }
            None => {
                tracing::warn!("invalid settings key: {}", key);
                Ok(())
            }
        }
    }

    fn default_app_name() -> String {
        "task_server".to_string()
    }

    fn default_environment() -> String {
        "dev".to_string()
    }

    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        8000
    }

    fn default_web_concurrency() -> usize {
        let cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
        2 * cpus + 1
    }

    fn default_log_level() -> String {
        "info".to_string()
    }

    fn default_database_url() -> String {
        "sqlite://data/tasks.db?mode=rwc".to_string()
    }

}
pub mod entities;
pub mod task;
pub mod web;
