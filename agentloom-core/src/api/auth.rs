use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AgentloomError, AgentloomResult};
use crate::http::{unwrap_object, ApiClient};
use crate::models::{CurrentUser, LoginResponse};

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated {
        token: String,
        user: Option<CurrentUser>,
    },
    MfaRequired {
        challenge_token: String,
    },
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct MfaVerification<'a> {
    mfa_token: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct Registration<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

/// Login, MFA, OAuth and registration. A successful flow installs the token
/// on the client so the calls that follow are authenticated.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, email: &str, password: &str) -> AgentloomResult<LoginOutcome> {
        let response: LoginResponse = self
            .client
            .post_public("/api/security/auth/login", &Credentials { email, password })
            .await?;
        self.finish(response).await
    }

    pub async fn verify_mfa(
        &self,
        challenge_token: &str,
        code: &str,
    ) -> AgentloomResult<LoginOutcome> {
        let code = code.trim();
        if code.len() < 6 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AgentloomError::validation(
                "code",
                "Enter the 6-digit code or a backup code",
            ));
        }
        let response: LoginResponse = self
            .client
            .post_public(
                "/api/security/auth/mfa/verify",
                &MfaVerification {
                    mfa_token: challenge_token,
                    code,
                },
            )
            .await?;
        self.finish(response).await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> AgentloomResult<LoginOutcome> {
        if !email.contains('@') {
            return Err(AgentloomError::validation("email", "Enter a valid email"));
        }
        if password.len() < 8 {
            return Err(AgentloomError::validation(
                "password",
                "Password must be at least 8 characters",
            ));
        }
        let response: LoginResponse = self
            .client
            .post_public(
                "/api/security/auth/register",
                &Registration {
                    email,
                    password,
                    name,
                },
            )
            .await?;
        self.finish(response).await
    }

    /// URL the user opens in a browser to sign in with an identity provider.
    pub async fn oauth_url(&self, provider: &str) -> AgentloomResult<String> {
        let value: Value = self
            .client
            .get_public(&format!("/api/security/auth/oauth/{}/url", provider))
            .await?;
        value
            .get("url")
            .or_else(|| value.get("authorization_url"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| AgentloomError::ApiParseError("OAuth response had no url".into()))
    }

    pub async fn logout(&self) -> AgentloomResult<()> {
        if self.client.is_authenticated().await {
            let result: AgentloomResult<Value> =
                self.client.post_empty("/api/security/auth/logout").await;
            if let Err(e) = result {
                // The local token is dropped either way.
                debug!("Server-side logout failed: {}", e);
            }
        }
        self.client.set_token(None).await;
        info!("Logged out");
        Ok(())
    }

    pub async fn me(&self) -> AgentloomResult<CurrentUser> {
        let value: Value = self.client.get("/api/security/auth/me").await?;
        unwrap_object(value, "user")
    }

    async fn finish(&self, response: LoginResponse) -> AgentloomResult<LoginOutcome> {
        if response.mfa_required {
            let challenge_token = response.challenge_token.ok_or_else(|| {
                AgentloomError::ApiParseError("MFA required but no challenge token".into())
            })?;
            return Ok(LoginOutcome::MfaRequired { challenge_token });
        }

        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AgentloomError::AuthenticationFailed("No token in response".into()))?;
        self.client.set_token(Some(token.clone())).await;
        info!("Authenticated");
        Ok(LoginOutcome::Authenticated {
            token,
            user: response.user,
        })
    }
}
