use agentloom_core::{
    navigate, AgentloomError, ApiClient, AuditQuery, LoginOutcome, Page, PageData,
    PermissionGate, PermissionSet, ToolType, UiState, UserDraft,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn authed_client(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri()).with_token("test-token")
}

async fn mount_me(server: &MockServer, roles: &[&str], permissions: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/api/security/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "id": "u-1",
                "email": "ada@example.com",
                "name": "Ada",
                "roles": roles,
                "permissions": permissions
            }
        })))
        .mount(server)
        .await;
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_with_mfa_challenge() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/security/auth/login"))
            .and(body_json(json!({"email": "ada@example.com", "password": "hunter22"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "mfa_required": true,
                "mfa_token": "challenge-1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/security/auth/mfa/verify"))
            .and(body_json(json!({"mfa_token": "challenge-1", "code": "123456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-abc"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/security/auth/me"))
            .and(header("authorization", "Bearer jwt-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u-1", "email": "ada@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let auth = client.auth();

        let challenge = match auth.login("ada@example.com", "hunter22").await.unwrap() {
            LoginOutcome::MfaRequired { challenge_token } => challenge_token,
            other => panic!("expected MFA challenge, got {:?}", other),
        };
        assert!(!client.is_authenticated().await);

        match auth.verify_mfa(&challenge, " 123456 ").await.unwrap() {
            LoginOutcome::Authenticated { token, .. } => assert_eq!(token, "jwt-abc"),
            other => panic!("expected token, got {:?}", other),
        }
        assert!(client.is_authenticated().await);
        assert_eq!(auth.me().await.unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_short_mfa_code_is_rejected_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let err = client.auth().verify_mfa("challenge-1", "12").await.unwrap_err();
        assert!(matches!(err, AgentloomError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_bad_credentials_surface_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/security/auth/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid email or password"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri());
        let err = client
            .auth()
            .login("ada@example.com", "wrong")
            .await
            .unwrap_err();

        assert!(err.is_auth_error());
        assert!(err.to_string().contains("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_logout_clears_token_even_if_server_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/security/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = authed_client(&server);
        client.auth().logout().await.unwrap();
        assert!(!client.is_authenticated().await);
    }
}

mod gate_tests {
    use super::*;

    #[tokio::test]
    async fn test_gate_from_current_user() {
        let server = MockServer::start().await;
        mount_me(&server, &["editor"], &["agents:create", "tools:*"]).await;

        let client = authed_client(&server);
        let me = client.auth().me().await.unwrap();
        let gate = PermissionGate::for_user(&me);

        assert!(gate.permissions().has_permission("tools:delete"));
        assert!(!gate.permissions().has_permission("agents:delete"));
        assert!(!gate.permissions().is_admin());
    }

    #[tokio::test]
    async fn test_restricted_page_never_hits_the_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/security/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let gate = PermissionGate::new(PermissionSet::new(["agents:read"]));
        let err = navigate(&authed_client(&server), &gate, Page::Users)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentloomError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_users_page_for_admin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/security/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [
                    {"id": "u-1", "email": "ada@example.com", "name": "Ada"},
                    {"id": "u-2", "email": "bob@example.com", "is_active": false}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_me(&server, &["admin"], &[]).await;

        let client = authed_client(&server);
        let gate = PermissionGate::for_user(&client.auth().me().await.unwrap());
        let snapshot = navigate(&client, &gate, Page::Users).await.unwrap();

        match &snapshot.data {
            PageData::Users(users) => {
                assert_eq!(users.len(), 2);
                assert!(!users[1].is_active);
            }
            other => panic!("unexpected page data: {:?}", other),
        }
        assert!(snapshot
            .actions
            .iter()
            .all(|(_, state)| *state == UiState::Enabled));
    }

    #[tokio::test]
    async fn test_dashboard_tolerates_missing_approvals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "a-1", "name": "Support", "status": "published",
                 "updated_at": "2026-10-01T09:00:00Z"},
                {"id": "a-2", "name": "Onboarding", "type": "process",
                 "updated_at": "2026-10-05T09:00:00Z"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tools": [
                {"id": "t-1", "name": "Handbook", "type": "knowledge"}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/process/approvals"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Forbidden"})))
            .mount(&server)
            .await;

        let gate = PermissionGate::new(PermissionSet::new(["agents:create"]));
        let snapshot = navigate(&authed_client(&server), &gate, Page::Dashboard)
            .await
            .unwrap();

        let PageData::Dashboard(summary) = &snapshot.data else {
            panic!("expected dashboard data");
        };
        assert_eq!(summary.agent_count, 2);
        assert_eq!(summary.published_agents, 1);
        assert_eq!(summary.tool_count, 1);
        assert_eq!(summary.pending_approvals, None);
        assert_eq!(summary.recent_agents[0].id, "a-2");

        let visible: Vec<&str> = snapshot.visible_actions().map(|(a, _)| a.id).collect();
        assert_eq!(visible, vec!["agents.create"]);
    }

    #[tokio::test]
    async fn test_unfamiliar_tool_type_does_not_break_listings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "t-1", "name": "Billing", "type": "api"},
                {"id": "t-2", "name": "Team calendar", "type": "calendar"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/process/approvals"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = authed_client(&server);
        let tools = client.tools().list().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].tool_type, ToolType::Api);
        assert_eq!(tools[1].tool_type, ToolType::Other("calendar".into()));

        let gate = PermissionGate::new(PermissionSet::new(["tools:read"]));
        let snapshot = navigate(&client, &gate, Page::Dashboard).await.unwrap();
        let PageData::Dashboard(summary) = &snapshot.data else {
            panic!("expected dashboard data");
        };
        assert_eq!(summary.tool_count, 2);
        assert_eq!(summary.pending_approvals, Some(0));
    }
}

mod admin_tests {
    use super::*;

    #[tokio::test]
    async fn test_audit_filters_become_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/security/audit"))
            .and(query_param("action", "login"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": [
                {"timestamp": "2026-10-10T08:00:00Z", "action": "login",
                 "user_email": "ada@example.com", "success": true}
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let query = AuditQuery {
            action: Some("login".into()),
            limit: Some(20),
            ..Default::default()
        };
        let entries = authed_client(&server)
            .security()
            .audit_log(&query)
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].success);
    }

    #[tokio::test]
    async fn test_create_user_sends_only_set_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/security/users"))
            .and(body_json(json!({
                "email": "cy@example.com",
                "name": "Cy",
                "role_ids": ["r-viewer"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"user_id": "u-3"})))
            .expect(1)
            .mount(&server)
            .await;

        let draft = UserDraft {
            email: Some("cy@example.com".into()),
            name: Some("Cy".into()),
            role_ids: Some(vec!["r-viewer".into()]),
            ..Default::default()
        };
        let id = authed_client(&server)
            .security()
            .create_user(&draft)
            .await
            .unwrap();
        assert_eq!(id, "u-3");
    }

    #[tokio::test]
    async fn test_server_forbidden_maps_to_permission_denied() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/security/users/u-9"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"detail": "Cannot delete yourself"})),
            )
            .mount(&server)
            .await;

        let err = authed_client(&server)
            .security()
            .delete_user("u-9")
            .await
            .unwrap_err();

        match err {
            AgentloomError::PermissionDenied(detail) => assert_eq!(detail, "Cannot delete yourself"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_org_chart_nests_reports() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/security/org-chart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"user_id": "ceo", "name": "Grace", "children": [
                    {"user_id": "cto", "name": "Linus", "children": [
                        {"user_id": "dev", "name": "Ken"}
                    ]}
                ]}
            ])))
            .mount(&server)
            .await;

        let roots = authed_client(&server).security().org_chart().await.unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].headcount(), 3);
    }
}
