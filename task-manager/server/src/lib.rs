pub mod config {
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        #[serde(default = "default_db_url")]
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        /// When set, every request is also appended to this file.
        #[serde(default)]
        pub request_log_path: Option<String>,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_db_url() -> String {
        "sqlite://task_manager.db?mode=rwc".to_string()
    }

    fn default_port() -> u16 {
        3001
    }

}
pub mod entities;
pub mod request_log;
pub mod task;
pub mod web;
