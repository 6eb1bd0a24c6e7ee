use doppler_secrets::SecretsClient;

pub const TOKEN_ENV_VAR: &str = "DOPPLER_TOKEN";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub project: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub environment: String,
    pub base_url: Option<String>,
}

impl Config {
    pub fn build_client(&self) -> doppler_secrets::Result<SecretsClient> {
        let client = SecretsClient::new(&self.project, &self.secret_key, &self.environment)?;

        match &self.base_url {
            Some(base_url) => client.with_base_url(base_url),
            None => Ok(client),
        }
    }
}

pub fn read_config(config_file: &str) -> doppler_secrets::Result<Config> {
    let data = std::fs::read_to_string(config_file)
        .map_err(|e| format!("Failed to read config file {}: {}", config_file, e))?;

    let mut config = parse_config(&data)
        .map_err(|e| format!("Failed to parse config file {}: {}", config_file, e))?;

    apply_token_fallback(&mut config, std::env::var(TOKEN_ENV_VAR).ok());

    validate_config(&config)?;

    Ok(config)
}

/// Uses `token` as the secret key when the config file leaves it empty.
pub fn apply_token_fallback(config: &mut Config, token: Option<String>) {
    if !config.secret_key.is_empty() {
        return;
    }

    if let Some(token) = token {
        config.secret_key = token;
    }
}

pub fn parse_config(data: &str) -> Result<Config, serde_json::Error> {
    serde_json::from_str(data)
}

pub fn validate_config(config: &Config) -> doppler_secrets::Result<()> {
    if config.project.is_empty() {
        return Err("Configuration error: project cannot be empty".into());
    }

    if let Some(base_url) = &config.base_url {
        if base_url.is_empty() {
            return Err("Configuration error: base url cannot be empty".into());
        }
    }

    Ok(())
}
