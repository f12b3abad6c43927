use agentloom_core::{
    AgentType, AgentWizard, AgentloomError, ApiClient, ScrapeRequest, TableEntry, TextEntry, Tool,
    ToolType, ToolWizard, WizardFlow,
};
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri()).with_token("test-token")
}

fn knowledge_wizard() -> ToolWizard {
    let mut wizard = ToolWizard::new(ToolType::Knowledge);
    wizard.name = "HR knowledge".into();
    wizard
}

mod tool_wizard_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_follow_ups_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tools"))
            .and(body_partial_json(json!({"name": "HR knowledge", "type": "knowledge"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "tool-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/tools/tool-1/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/tools/tool-1/scrape"))
            .and(body_partial_json(json!({"url": "https://intra.example.com/hr"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pages": 1})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/tools/tool-1/entries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/tools/tool-1/tables"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Leave policy").unwrap();

        let mut wizard = knowledge_wizard();
        wizard.sources.files.push(file.path().to_path_buf());
        wizard
            .sources
            .urls
            .push(ScrapeRequest::single("https://intra.example.com/hr"));
        wizard.sources.texts.push(TextEntry {
            title: "FAQ".into(),
            content: "Ask HR".into(),
        });
        wizard
            .sources
            .tables
            .push(TableEntry::from_csv("holidays", "date,name\n2026-12-25,Christmas").unwrap());

        let report = wizard.submit(&client_for(&server)).await.unwrap();

        assert_eq!(report.tool_id, "tool-1");
        assert!(report.created);
        assert_eq!(report.completed, 4);
        assert!(report.is_clean());

        let paths: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/api/tools",
                "/api/tools/tool-1/documents",
                "/api/tools/tool-1/scrape",
                "/api/tools/tool-1/entries",
                "/api/tools/tool-1/tables",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_follow_up_keeps_tool_and_continues() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tools"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"tool": {"id": "tool-2"}})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/tools/tool-2/scrape"))
            .respond_with(
                ResponseTemplate::new(502).set_body_json(json!({"detail": "Crawler offline"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/tools/tool-2/entries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let mut wizard = knowledge_wizard();
        wizard
            .sources
            .urls
            .push(ScrapeRequest::single("https://intra.example.com/hr"));
        wizard.sources.texts.push(TextEntry {
            title: "FAQ".into(),
            content: "Ask HR".into(),
        });

        let report = wizard.submit(&client_for(&server)).await.unwrap();

        assert_eq!(report.tool_id, "tool-2");
        assert_eq!(report.completed, 1);
        assert_eq!(report.failures.len(), 1);
        match &report.failures[0] {
            AgentloomError::FollowUpFailed { step, message } => {
                assert_eq!(step, "scrape https://intra.example.com/hr");
                assert!(message.contains("Crawler offline"));
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tools"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).with_create_timeout(Duration::from_millis(100));
        let err = knowledge_wizard().submit(&client).await.unwrap_err();

        assert!(matches!(err, AgentloomError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_invalid_wizard_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
            .expect(0)
            .mount(&server)
            .await;

        let mut wizard = ToolWizard::new(ToolType::Api);
        wizard.name = "Payments".into();

        let err = wizard.submit(&client_for(&server)).await.unwrap_err();
        assert!(matches!(err, AgentloomError::Validation { ref field, .. } if field == "base_url"));
    }

    #[tokio::test]
    async fn test_edit_puts_existing_tool() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/tools/tool-9"))
            .and(body_partial_json(json!({
                "name": "Billing API",
                "config": {"base_url": "https://billing.example.com"},
                "can_execute_user_ids": ["u-2"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let tool: Tool = serde_json::from_value(json!({
            "id": "tool-9",
            "name": "Billing",
            "type": "api",
            "config": {"base_url": "https://billing.example.com"},
            "owner_id": "u-1"
        }))
        .unwrap();

        let mut wizard = ToolWizard::edit(&tool);
        wizard.name = "Billing API".into();
        wizard.permissions.can_execute_user_ids.push("u-2".into());
        assert!(wizard.set_tool_type(ToolType::Database).is_err());

        let report = wizard.submit(&client_for(&server)).await.unwrap();
        assert!(!report.created);
        assert_eq!(report.tool_id, "tool-9");
    }
}

mod agent_wizard_tests {
    use super::*;

    fn support_agent() -> AgentWizard {
        let mut wizard = AgentWizard::new(AgentType::Conversational);
        wizard.name = "Support".into();
        wizard.toggle_tool("tool-1");
        wizard
    }

    #[tokio::test]
    async fn test_create_and_publish() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agents"))
            .and(body_partial_json(json!({
                "name": "Support",
                "type": "conversational",
                "tool_ids": ["tool-1"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"agent_id": "ag-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/agents/ag-1/publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ag-1", "name": "Support", "status": "published"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let report = support_agent()
            .submit(&client_for(&server), true)
            .await
            .unwrap();

        assert_eq!(report.agent_id, "ag-1");
        assert!(report.created);
        assert!(report.published);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_publish_failure_is_reported_after_save() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ag-2"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/agents/ag-2/publish"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"detail": "Publishing needs approval"})),
            )
            .mount(&server)
            .await;

        let report = support_agent()
            .submit(&client_for(&server), true)
            .await
            .unwrap();

        assert_eq!(report.agent_id, "ag-2");
        assert!(report.created);
        assert!(!report.published);
        assert!(!report.is_clean());
        match report.publish_error {
            Some(AgentloomError::FollowUpFailed { step, message }) => {
                assert_eq!(step, "publish");
                assert!(message.contains("Publishing needs approval"));
            }
            other => panic!("unexpected publish outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wizard_state_survives_a_back_and_forth() {
        let mut wizard = support_agent();
        wizard.next().unwrap();
        wizard.next().unwrap();
        wizard.back().unwrap();
        wizard.name.clear();

        // Back never validates, but submit checks every step.
        let server = MockServer::start().await;
        let err = wizard.submit(&client_for(&server), false).await.unwrap_err();
        assert!(matches!(err, AgentloomError::Validation { .. }));
    }
}
