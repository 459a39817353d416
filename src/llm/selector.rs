use crate::config::CitetraceConfig;
use crate::error::BackendError;
use crate::llm::{GenAIClient, LLMClient};
use genai::adapter::AdapterKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct SelectedClient {
    pub client: Arc<dyn LLMClient>,
    pub provider: AdapterKind,
    pub description: String,
}

/// Builds the analysis service client for the configured provider
///
/// Cloud providers need their API key variable to be present; failing early here
/// keeps a run from fanning out hundreds of requests that are all rejected.
pub fn select_llm_client(config: &CitetraceConfig) -> Result<SelectedClient, BackendError> {
    let provider = config.provider;

    if !provider_has_credentials(provider) {
        let var = provider.default_key_env_name().unwrap_or("API key");
        return Err(BackendError::ConfigurationError {
            message: format!(
                "{} selected but {} is not set (add it to the environment or a .env file)",
                provider.as_str(),
                var
            ),
        });
    }

    debug!(
        provider = provider.as_str(),
        model = %config.model,
        "Selecting analysis service client"
    );

    let client = GenAIClient::new(
        provider,
        config.model.clone(),
        Duration::from_secs(config.request_timeout_secs),
        config.api_base_url.clone(),
    )?;

    info!("Using provider: {} ({})", provider.as_str(), config.model);

    Ok(SelectedClient {
        client: Arc::new(client),
        provider,
        description: format!("{} ({})", provider.as_str(), config.model),
    })
}

/// Check if provider has available credentials
fn provider_has_credentials(provider: AdapterKind) -> bool {
    match provider.default_key_env_name() {
        None => true,
        Some(env_var) => std::env::var(env_var).is_ok(),
    }
}
