use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use ev_supervisor::config::Config;
use ev_supervisor::exit_codes;
use ev_supervisor::supervisor::agents::AgentRoster;
use ev_supervisor::supervisor::invoker::{AgentError, AgentInvoker, AgentMessage, AgentSpec};
use ev_supervisor::supervisor::response::AgentResponse;
use ev_supervisor::{Stage, SupervisorWorkflow, execute};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// 记录收到的提示并返回固定文本
struct ScriptedAgent {
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl AgentInvoker for ScriptedAgent {
    async fn invoke(&self, messages: &[AgentMessage]) -> Result<AgentResponse, AgentError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.extend(messages.iter().map(|message| message.content.clone()));
        Ok(AgentResponse::from(self.reply.as_str()))
    }
}

struct BrokenAgent;

#[async_trait]
impl AgentInvoker for BrokenAgent {
    async fn invoke(&self, _messages: &[AgentMessage]) -> Result<AgentResponse, AgentError> {
        Err(AgentError::Unavailable("model returned no content".to_string()))
    }
}

fn scripted(reply: &str, prompts: &Arc<Mutex<Vec<String>>>) -> AgentSpec {
    AgentSpec::new(Arc::new(ScriptedAgent {
        reply: reply.to_string(),
        prompts: prompts.clone(),
    }))
}

/// 本地渲染服务：HTML正常返回，PDF接口报错
async fn spawn_render_service() -> String {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/render",
            post(|| async { "<html><body>EV Market Intelligence</body></html>" }),
        )
        .route(
            "/pdf",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "pdf engine crashed") }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn single_agent_workflow(prompts: &Arc<Mutex<Vec<String>>>) -> SupervisorWorkflow {
    SupervisorWorkflow::new(
        AgentRoster::new().with("market_agent", scripted("EV sales grew.", prompts)),
        AgentRoster::new(),
    )
}

fn config_for(dir: &TempDir) -> Config {
    Config {
        output_path: dir.path().to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_execute_writes_text_report_and_history() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir);
    let prompts = Arc::new(Mutex::new(Vec::new()));

    let analysis = AgentRoster::new()
        .with(
            "market_agent",
            scripted("- **Global EV sales** rose 25% in 2025.", &prompts)
                .with_focus("Global EV sales and regional trends"),
        )
        .with(
            "oem_agent",
            scripted(
                "BYD expanded in Europe. See https://example.com/byd-europe.",
                &prompts,
            )
            .with_citations(true),
        );
    let validation = AgentRoster::new().with(
        "cross_agent",
        scripted("Market and OEM findings agree.", &prompts),
    );
    let workflow = SupervisorWorkflow::new(analysis, validation);

    let outcome = execute(&workflow, &config, "Analyze EV industry").await.unwrap();

    assert_eq!(outcome.state.stage(), Stage::Done);
    assert_eq!(outcome.state.total_steps(), 3);

    let text = fs::read_to_string(&outcome.saved.report).unwrap();
    assert!(text.starts_with("EV Market Intelligence Report\nGenerated: "));
    assert!(text.contains("   - Global EV sales rose 25% in 2025."));
    assert!(text.contains("   - https://example.com/byd-europe"));
    assert!(text.contains("8. REFERENCES"));
    assert!(text.ends_with("Report auto-generated by EV Market Supervisor pipeline."));

    let history: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outcome.saved.history).unwrap()).unwrap();
    assert_eq!(history["total_steps"], 3);
    assert_eq!(history["history"].as_array().unwrap().len(), 3);
    assert!(outcome.saved.html.is_none());
    assert!(outcome.saved.pdf.is_none());

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("Focus on: Global EV sales and regional trends"));
    assert!(prompts[1].contains("Include at least two URLs"));
    assert!(!prompts[2].contains("Include at least two URLs"));
}

#[tokio::test]
async fn test_execute_stops_on_agent_failure_without_saving() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir);
    let prompts = Arc::new(Mutex::new(Vec::new()));

    let analysis = AgentRoster::new()
        .with("market_agent", scripted("EV sales grew.", &prompts))
        .with("finance_agent", AgentSpec::new(Arc::new(BrokenAgent)));
    let validation = AgentRoster::new().with("cross_agent", scripted("Consistent.", &prompts));
    let workflow = SupervisorWorkflow::new(analysis, validation);

    let err = execute(&workflow, &config, "Analyze EV industry")
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("finance_agent"));
    assert_eq!(exit_codes::for_error(&err), exit_codes::FAILURE);
    assert_eq!(prompts.lock().unwrap().len(), 1);
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_invalid_render_metadata_maps_to_exit_code_two() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config_for(&temp_dir);
    config.render.enabled = true;
    config.render.title = "T".repeat(500);
    let prompts = Arc::new(Mutex::new(Vec::new()));

    let err = execute(&single_agent_workflow(&prompts), &config, "Analyze EV industry")
        .await
        .unwrap_err();

    assert_eq!(exit_codes::for_error(&err), exit_codes::INVALID_METADATA);
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unreachable_render_service_still_saves_text_report() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config_for(&temp_dir);
    config.render.enabled = true;
    config.render.base_url = "http://127.0.0.1:9".to_string();
    config.render.timeout_seconds = 5;
    let prompts = Arc::new(Mutex::new(Vec::new()));

    let outcome = execute(&single_agent_workflow(&prompts), &config, "Analyze EV industry")
        .await
        .unwrap();

    assert!(outcome.saved.report.exists());
    assert!(outcome.saved.history.exists());
    assert!(outcome.saved.html.is_none());
    assert!(outcome.saved.pdf.is_none());
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 2);
}

#[tokio::test]
async fn test_pdf_failure_keeps_rendered_html() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config_for(&temp_dir);
    config.render.enabled = true;
    config.render.base_url = spawn_render_service().await;
    let prompts = Arc::new(Mutex::new(Vec::new()));

    let outcome = execute(&single_agent_workflow(&prompts), &config, "Analyze EV industry")
        .await
        .unwrap();

    let html = outcome.saved.html.as_ref().unwrap();
    assert_eq!(
        fs::read_to_string(html).unwrap(),
        "<html><body>EV Market Intelligence</body></html>"
    );
    assert!(outcome.saved.pdf.is_none());
    assert!(outcome.saved.report.exists());
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 3);
}
