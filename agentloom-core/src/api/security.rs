use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{AgentloomError, AgentloomResult};
use crate::http::{created_id, unwrap_list, unwrap_object, ApiClient};
use crate::models::{AuditEntry, AuditQuery, Group, MfaSetup, OrgNode, RoleDef, User, UserDraft};

#[derive(Serialize)]
struct NewRole<'a> {
    name: &'a str,
    description: &'a str,
    permissions: &'a [String],
}

#[derive(Serialize)]
struct NewGroup<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct MemberRef<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct MfaCode<'a> {
    code: &'a str,
}

/// Admin security center: users, roles, groups, org chart, audit log, MFA.
pub struct SecurityApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SecurityApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn users(&self) -> AgentloomResult<Vec<User>> {
        let value: Value = self.client.get("/api/security/users").await?;
        unwrap_list(value, "users")
    }

    pub async fn user(&self, id: &str) -> AgentloomResult<User> {
        let value: Value = self
            .client
            .get(&format!("/api/security/users/{}", id))
            .await?;
        unwrap_object(value, "user")
    }

    pub async fn create_user(&self, draft: &UserDraft) -> AgentloomResult<String> {
        let email = draft.email.as_deref().unwrap_or_default();
        if !email.contains('@') {
            return Err(AgentloomError::validation("email", "Enter a valid email"));
        }
        let value: Value = self.client.post("/api/security/users", draft).await?;
        let id = created_id(&value, "user")?;
        info!(user_id = %id, "Created user");
        Ok(id)
    }

    pub async fn update_user(&self, id: &str, draft: &UserDraft) -> AgentloomResult<()> {
        let _: Value = self
            .client
            .put(&format!("/api/security/users/{}", id), draft)
            .await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: &str) -> AgentloomResult<()> {
        self.client
            .delete(&format!("/api/security/users/{}", id))
            .await
    }

    pub async fn roles(&self) -> AgentloomResult<Vec<RoleDef>> {
        let value: Value = self.client.get("/api/security/roles").await?;
        unwrap_list(value, "roles")
    }

    pub async fn create_role(
        &self,
        name: &str,
        description: &str,
        permissions: &[String],
    ) -> AgentloomResult<String> {
        if name.trim().is_empty() {
            return Err(AgentloomError::validation("name", "Role name is required"));
        }
        let value: Value = self
            .client
            .post(
                "/api/security/roles",
                &NewRole {
                    name,
                    description,
                    permissions,
                },
            )
            .await?;
        created_id(&value, "role")
    }

    pub async fn groups(&self) -> AgentloomResult<Vec<Group>> {
        let value: Value = self.client.get("/api/security/groups").await?;
        unwrap_list(value, "groups")
    }

    pub async fn create_group(&self, name: &str, description: &str) -> AgentloomResult<String> {
        if name.trim().is_empty() {
            return Err(AgentloomError::validation("name", "Group name is required"));
        }
        let value: Value = self
            .client
            .post("/api/security/groups", &NewGroup { name, description })
            .await?;
        created_id(&value, "group")
    }

    pub async fn add_group_member(&self, group_id: &str, user_id: &str) -> AgentloomResult<()> {
        let _: Value = self
            .client
            .post(
                &format!("/api/security/groups/{}/members", group_id),
                &MemberRef { user_id },
            )
            .await?;
        Ok(())
    }

    pub async fn remove_group_member(&self, group_id: &str, user_id: &str) -> AgentloomResult<()> {
        self.client
            .delete(&format!(
                "/api/security/groups/{}/members/{}",
                group_id, user_id
            ))
            .await
    }

    pub async fn org_chart(&self) -> AgentloomResult<Vec<OrgNode>> {
        let value: Value = self.client.get("/api/security/org-chart").await?;
        if value.get("user_id").is_some() {
            Ok(vec![unwrap_object(value, "root")?])
        } else {
            unwrap_list(value, "roots")
        }
    }

    pub async fn audit_log(&self, query: &AuditQuery) -> AgentloomResult<Vec<AuditEntry>> {
        let value: Value = self
            .client
            .get_query("/api/security/audit", &query.to_pairs())
            .await?;
        unwrap_list(value, "entries")
    }

    pub async fn mfa_setup(&self) -> AgentloomResult<MfaSetup> {
        self.client.post_empty("/api/security/mfa/setup").await
    }

    pub async fn mfa_enable(&self, code: &str) -> AgentloomResult<()> {
        let _: Value = self
            .client
            .post("/api/security/mfa/enable", &MfaCode { code })
            .await?;
        Ok(())
    }

    pub async fn mfa_disable(&self, code: &str) -> AgentloomResult<()> {
        let _: Value = self
            .client
            .post("/api/security/mfa/disable", &MfaCode { code })
            .await?;
        Ok(())
    }
}
