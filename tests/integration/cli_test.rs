use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn get_agentloom_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_agentloom"))
}

/// Run the binary with its config, token and working directory confined to `home`.
fn run_agentloom_in(home: &Path, args: &[&str], env_vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(get_agentloom_binary());
    cmd.args(args)
        .current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("AGENTLOOM_TOKEN")
        .env_remove("AGENTLOOM_API_URL")
        .env_remove("AGENTLOOM_PASSWORD")
        .env_remove("RUST_LOG");
    for (key, value) in env_vars {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute agentloom command")
}

fn run_agentloom(args: &[&str]) -> Output {
    let home = tempfile::tempdir().expect("temp dir");
    run_agentloom_in(home.path(), args, &[])
}

fn output_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

mod version_command_tests {
    use super::*;

    #[test]
    fn test_version_command_basic() {
        let output = run_agentloom(&["version"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout.contains("agentloom"), "output should contain 'agentloom'");
        assert!(stdout.contains("0.1.0"), "output should contain version number");
    }

    #[test]
    fn test_version_command_detailed() {
        let output = run_agentloom(&["version", "--detailed"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version --detailed should succeed");
        assert!(stdout.contains("Apache-2.0"), "output should contain license type");
        assert!(stdout.contains("Tool Types"), "output should list tool types");
        assert!(stdout.contains("spreadsheet"));
        assert!(stdout.contains("Knowledge Base"));
    }
}

mod help_command_tests {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let output = run_agentloom(&["--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "--help should succeed");
        for command in [
            "login", "logout", "agents", "tools", "chat", "knowledge", "approvals", "security",
            "open", "config",
        ] {
            assert!(stdout.contains(command), "help should mention {}", command);
        }
    }

    #[test]
    fn test_subcommand_help() {
        for command in ["agents", "tools", "security", "chat", "open"] {
            let output = run_agentloom(&[command, "--help"]);
            assert!(output.status.success(), "{} --help should succeed", command);
        }
    }

    #[test]
    fn test_tool_create_help_mentions_sources() {
        let output = run_agentloom(&["tools", "create", "--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("--url"));
        assert!(stdout.contains("--table"));
    }
}

mod invalid_command_tests {
    use super::*;

    #[test]
    fn test_invalid_command() {
        let output = run_agentloom(&["definitely-not-a-command"]);
        assert!(!output.status.success(), "invalid command should fail");
    }

    #[test]
    fn test_unknown_page_fails_before_any_request() {
        let output = run_agentloom(&["open", "nowhere"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("Unknown page"), "stderr was: {}", stderr);
    }
}

mod auth_state_tests {
    use super::*;

    #[test]
    fn test_commands_require_login() {
        let output = run_agentloom(&["agents", "list"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("Not logged in"), "stderr was: {}", stderr);
        assert!(stderr.contains("agentloom login"), "should suggest logging in");
    }

    #[test]
    fn test_invalid_api_url_is_a_config_error() {
        let home = tempfile::tempdir().unwrap();
        let output = run_agentloom_in(
            home.path(),
            &["agents", "list"],
            &[("AGENTLOOM_API_URL", "localhost:8000"), ("AGENTLOOM_TOKEN", "t")],
        );
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("api.base_url"), "stderr was: {}", stderr);
    }
}

mod config_command_tests {
    use super::*;

    #[test]
    fn test_config_init_writes_and_refuses_overwrite() {
        let home = tempfile::tempdir().unwrap();
        let target = home.path().join("agentloom.toml");
        let target_str = target.to_string_lossy().to_string();

        let output = run_agentloom_in(home.path(), &["config", "init", "--path", &target_str], &[]);
        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));
        let written = std::fs::read_to_string(&target).unwrap();
        assert!(written.contains("base_url"));

        let again = run_agentloom_in(home.path(), &["config", "init", "--path", &target_str], &[]);
        assert!(!again.status.success());
        assert!(stderr_to_string(&again).contains("--force"));

        let forced = run_agentloom_in(
            home.path(),
            &["config", "init", "--path", &target_str, "--force"],
            &[],
        );
        assert!(forced.status.success());
    }

    #[test]
    fn test_config_show_reflects_overrides() {
        let home = tempfile::tempdir().unwrap();
        let output = run_agentloom_in(
            home.path(),
            &["config", "show", "--format", "json"],
            &[("AGENTLOOM_API_URL", "https://agents.example.com")],
        );
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(json["api"]["base_url"], "https://agents.example.com");
    }
}

mod chat_command_tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test(flavor = "multi_thread")]
    async fn test_single_message_chat_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agents/agent-1/chat/stream"))
            .and(header("authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"type\":\"conversation_id\",\"content\":\"conv-5\"}\n\
                 data: {\"type\":\"content\",\"content\":\"Hello from the agent\"}\n\
                 data: {\"type\":\"done\"}\n",
                "text/event-stream",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let output = tokio::task::spawn_blocking(move || {
            let home = tempfile::tempdir().unwrap();
            run_agentloom_in(
                home.path(),
                &["chat", "agent-1", "hi there"],
                &[("AGENTLOOM_API_URL", uri.as_str()), ("AGENTLOOM_TOKEN", "session-token")],
            )
        })
        .await
        .unwrap();

        let stdout = output_to_string(&output);
        assert!(output.status.success(), "stderr: {}", stderr_to_string(&output));
        assert!(stdout.contains("agent> Hello from the agent"), "stdout was: {}", stdout);
        assert!(stdout.contains("--conversation conv-5"));
    }

    #[test]
    fn test_chat_rejects_conversation_in_test_mode() {
        let output = run_agentloom(&["chat", "agent-1", "hi", "--test", "--conversation", "c-1"]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("cannot be used with"), "stderr was: {}", stderr);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_frame_fails_the_command() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agents/agent-1/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"type\":\"error\",\"content\":\"Agent is not published\"}\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let uri = server.uri();
        let output = tokio::task::spawn_blocking(move || {
            let home = tempfile::tempdir().unwrap();
            run_agentloom_in(
                home.path(),
                &["chat", "agent-1", "hi"],
                &[("AGENTLOOM_API_URL", uri.as_str()), ("AGENTLOOM_TOKEN", "session-token")],
            )
        })
        .await
        .unwrap();

        assert!(!output.status.success());
        assert!(output_to_string(&output).contains("Agent is not published"));
    }
}

mod agent_command_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_publish_still_reports_saved_agent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "ag-7"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/agents/ag-7/publish"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"detail": "Publishing needs approval"})),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let output = tokio::task::spawn_blocking(move || {
            let home = tempfile::tempdir().unwrap();
            run_agentloom_in(
                home.path(),
                &["agents", "create", "--name", "Support", "--publish"],
                &[("AGENTLOOM_API_URL", uri.as_str()), ("AGENTLOOM_TOKEN", "session-token")],
            )
        })
        .await
        .unwrap();

        let stdout = output_to_string(&output);
        let stderr = stderr_to_string(&output);
        assert!(!output.status.success());
        assert!(stdout.contains("Agent ag-7 created"), "stdout was: {}", stdout);
        assert!(stderr.contains("ag-7"), "stderr was: {}", stderr);
        assert!(stderr.contains("Publishing needs approval"), "stderr was: {}", stderr);
    }
}
