use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Targets held at warn unless RUST_LOG names them.
const QUIET_TARGETS: &[&str] = &["sqlx::query=warn", "hyper=warn", "reqwest=warn"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
        Self {
            loki_enabled: std::env::var("LOKI_ENABLED").map(|v| parse_flag(&v)).unwrap_or(false),
            loki_url: std::env::var("LOKI_URL").ok().filter(|u| !u.trim().is_empty()),
            service_name: var("SERVICE_NAME", "wealthwise"),
            environment: var("ENVIRONMENT", "development"),
            log_level: var("RUST_LOG", "info"),
        }
    }

    /// Admin CLI runs log at warn unless RUST_LOG says otherwise, so command output stays readable.
    pub fn for_cli() -> Self {
        let mut config = Self::from_env();
        if std::env::var("RUST_LOG").is_err() {
            config.log_level = "warn".to_string();
        }
        config.service_name = format!("{}-admin", config.service_name);
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        if self.log_level.trim().is_empty() {
            return Err("RUST_LOG must not be empty".to_string());
        }
        Ok(())
    }

    /// The configured level plus every quiet target RUST_LOG does not already name.
    pub fn filter_directives(&self) -> String {
        let mut directives: Vec<&str> = QUIET_TARGETS
            .iter()
            .copied()
            .filter(|quiet| {
                let target = quiet.split('=').next().unwrap_or(*quiet);
                !self.log_level.contains(target)
            })
            .collect();
        directives.insert(0, self.log_level.trim());
        directives.join(",")
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(config.filter_directives())?)
        .with(tracing_subscriber::fmt::layer());

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.as_deref() {
                let (loki_layer, task) = tracing_loki::builder()
                    .label("service", &config.service_name)?
                    .label("environment", &config.environment)?
                    .build_url(url::Url::parse(loki_url)?)?;
                tokio::spawn(task);

                registry.with(loki_layer).init();
                tracing::info!("{} logging to console and Loki at {}", config.service_name, loki_url);
                return Ok(());
            }
        }
    }

    registry.init();
    tracing::info!("{} logging to console ({})", config.service_name, config.environment);
    Ok(())
}
