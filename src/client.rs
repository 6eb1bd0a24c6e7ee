use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::Deserialize;

use crate::error::Error;
use crate::transport::{ReqwestTransport, Request, Transport};

pub const DEFAULT_BASE_URL: &str = "https://api.doppler.com/v3/configs/config";
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Secret name to computed value.
pub type SecretMap = HashMap<String, String>;

// Missing and null fields decode as empty; restricted secrets come back with a null `computed`.
#[derive(Debug, Deserialize)]
struct SecretsResponse {
    #[serde(default)]
    secrets: Option<HashMap<String, RawSecret>>,
}

#[derive(Debug, Deserialize)]
struct RawSecret {
    #[serde(default)]
    computed: Option<String>,
}

/// Client for the secrets of one project config.
///
/// Every call fetches the full secret set; nothing is cached between calls.
#[derive(Clone)]
pub struct SecretsClient {
    project: String,
    environment: String,
    base_url: String,
    auth_token: String,
    transport: Option<Arc<dyn Transport>>,
}

impl SecretsClient {
    /// Creates a client using the default reqwest transport.
    ///
    /// An empty `environment` selects `production`. The secret key may be empty.
    pub fn new(project: &str, secret_key: &str, environment: &str) -> crate::result::Result<Self> {
        if project.is_empty() {
            return Err("project name is mandatory".into());
        }

        let environment = if environment.is_empty() {
            DEFAULT_ENVIRONMENT
        } else {
            environment
        };

        let auth_token =
            base64::engine::general_purpose::STANDARD.encode(format!("{secret_key}:"));

        Ok(Self {
            project: project.to_owned(),
            environment: environment.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            auth_token,
            transport: Some(Arc::new(ReqwestTransport::new())),
        })
    }

    /// Points the client at another API root. Only absolute http(s) URLs are accepted.
    pub fn with_base_url(mut self, base_url: &str) -> crate::result::Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| format!("invalid base url {}: {}", base_url, e))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("invalid base url {}: scheme must be http or https", base_url).into());
        }

        if parsed.query().is_some() {
            return Err(format!("invalid base url {}: query is not allowed", base_url).into());
        }

        if parsed.fragment().is_some() {
            return Err(format!("invalid base url {}: fragment is not allowed", base_url).into());
        }

        self.base_url = base_url.trim_end_matches('/').to_owned();
        Ok(self)
    }

    /// Replaces the transport used by later calls.
    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Some(Arc::new(transport));
    }

    /// Removes the transport. Calls fail until a new one is set.
    pub fn take_transport(&mut self) -> Option<Arc<dyn Transport>> {
        self.transport.take()
    }

    /// Project the secrets are read from.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Config name sent as the `config` query parameter.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_secrets(&self) -> crate::result::Result<SecretMap> {
        let transport = self.transport.as_ref().ok_or("transport not set")?;
        let request = self.secrets_request()?;

        log::debug!(
            "[{}/{}] Fetching secrets from {}",
            &self.project,
            &self.environment,
            &self.base_url
        );

        let response = transport.send(request).await.map_err(Error::Transport)?;

        if response.status != 200 {
            log::warn!(
                "[{}/{}] Secrets request failed with status {}",
                &self.project,
                &self.environment,
                response.status
            );
            return Err(Error::Api {
                status: response.status,
            });
        }

        let body = response.read_body().await.map_err(Error::Transport)?;
        let decoded: SecretsResponse = serde_json::from_slice(&body)?;

        let secrets: SecretMap = decoded
            .secrets
            .unwrap_or_default()
            .into_iter()
            .map(|(name, secret)| (name, secret.computed.unwrap_or_default()))
            .collect();

        log::debug!(
            "[{}/{}] Fetched {} secrets",
            &self.project,
            &self.environment,
            secrets.len()
        );

        Ok(secrets)
    }

    /// Fetches the full secret set and returns a single value from it.
    pub async fn get_one(&self, key: &str) -> crate::result::Result<String> {
        let mut secrets = self.get_secrets().await?;

        secrets.remove(key).ok_or_else(|| Error::NotFound {
            key: key.to_owned(),
        })
    }

    fn secrets_request(&self) -> crate::result::Result<Request> {
        let url = Url::parse_with_params(
            &format!("{}/secrets", &self.base_url),
            &[
                ("project", self.project.as_str()),
                ("config", self.environment.as_str()),
            ],
        )
        .map_err(|e| format!("failed to build secrets url: {e}"))?;

        let mut authorization = HeaderValue::from_str(&format!("Basic {}", &self.auth_token))
            .map_err(|e| format!("invalid authorization header: {e}"))?;
        authorization.set_sensitive(true);

        let json = HeaderValue::from_static("application/json");
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(HeaderName::from_static("accepts"), json.clone());
        headers.insert(CONTENT_TYPE, json);

        Ok(Request {
            method: Method::GET,
            url,
            headers,
        })
    }
}

impl std::fmt::Debug for SecretsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsClient")
            .field("project", &self.project)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("auth_token", &"<redacted>")
            .field("transport", &self.transport.is_some())
            .finish()
    }
}
