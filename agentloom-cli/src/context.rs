use agentloom_core::{
    AgentloomConfig, AgentloomError, ApiClient, PermissionGate, TokenPersistence, TokenStore,
};
use anyhow::{Context, Result};
use tracing::debug;

/// Session-only logins hand their token to the shell through this variable.
pub const TOKEN_ENV: &str = "AGENTLOOM_TOKEN";

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub api_url: Option<String>,
}

/// Everything a command needs: resolved config, API client and token store.
pub struct CliContext {
    pub config: AgentloomConfig,
    pub client: ApiClient,
    pub tokens: TokenStore,
}

impl CliContext {
    pub fn load(opts: &GlobalOptions) -> Result<Self> {
        let mut config = AgentloomConfig::load().context("Failed to load configuration")?;
        if let Some(url) = &opts.api_url {
            config.api.base_url = url.clone();
        }
        if !config.display.color {
            colored::control::set_override(false);
        }

        let tokens = TokenStore::from_config(&config);
        let mut client = ApiClient::from_config(&config)?;
        if let Some(token) = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
            debug!("Using token from {}", TOKEN_ENV);
            client = client.with_token(token);
        } else if let Some(token) = tokens.load()? {
            debug!("Using stored token");
            client = client.with_token(token);
        }

        Ok(Self {
            config,
            client,
            tokens,
        })
    }

    /// Like [`CliContext::load`] but fails early when nobody is signed in.
    pub async fn authenticated(opts: &GlobalOptions) -> Result<Self> {
        let ctx = Self::load(opts)?;
        if !ctx.client.is_authenticated().await {
            return Err(AgentloomError::NotAuthenticated.into());
        }
        Ok(ctx)
    }

    pub fn remember_token(&mut self, token: &str, remember: bool) -> Result<()> {
        let persistence = if remember {
            TokenPersistence::Remembered
        } else {
            TokenPersistence::SessionOnly
        };
        self.tokens.save(token, persistence)?;
        Ok(())
    }

    pub fn forget_token(&mut self) -> Result<()> {
        self.tokens.clear()?;
        Ok(())
    }

    /// Build the gate from the current user's server-granted permissions.
    pub async fn permission_gate(&self) -> Result<PermissionGate> {
        let me = self.client.auth().me().await?;
        Ok(PermissionGate::for_user(&me))
    }

    pub fn datetime_format(&self) -> &str {
        &self.config.display.datetime_format
    }
}
