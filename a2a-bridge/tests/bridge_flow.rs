#![cfg(feature = "adapters")]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use a2a_bridge::Bridge;
use a2a_bridge::adapters::{
    AdapterError, AdapterResult, AgentCardFetcher, AgentClient, AgentClientFactory,
    AgentResponse, AgentResponseStream, McpSession, McpTransport,
};
use a2a_bridge::config::{AppSelector, BridgeConfig, EndpointSettings, RegistryCredentials};
use a2a_bridge::kernel::{
    RegistryConnector, RegistryError, RegistryResult, RegistrySession, RegistryTarget,
};
use a2a_bridge::memory::VolatileStore;
use a2a_bridge::primitives::{
    AgentCard, AgentSkill, BackendEndpoint, McpProtocol, McpServerDetail, McpToolMeta,
    McpToolSpec, Message, ServerPage, ServerSummary, Task, TaskState, TaskStatus, ToolDescriptor,
};
use a2a_bridge::tools::{AppError, AppInvoker, ChatReply, Collaborators, ToolError};
use async_trait::async_trait;
use futures::stream;
use serde_json::{Map, Value, json};

fn card(name: &str) -> AgentCard {
    AgentCard::builder()
        .name(name)
        .unwrap()
        .description(format!("{name} agent"))
        .url(format!("http://{name}.internal/"))
        .unwrap()
        .version("2.0.0")
        .add_skill(AgentSkill {
            id: "plan".into(),
            name: "Plan".into(),
            description: "makes plans".into(),
            ..AgentSkill::default()
        })
        .build()
        .unwrap()
}

fn search_server() -> McpServerDetail {
    let mut tools_meta = HashMap::new();
    tools_meta.insert("debug".to_owned(), McpToolMeta { enabled: Some(false) });
    McpServerDetail {
        name: "search".into(),
        description: "web search".into(),
        version: Some("1.2.0".into()),
        protocol: McpProtocol::Sse,
        backend_endpoints: vec![BackendEndpoint {
            address: "10.2.0.7".into(),
            port: 9000,
        }],
        export_path: "/sse".into(),
        tool_spec: Some(McpToolSpec {
            tools: vec![ToolDescriptor::new(
                "query",
                Some("Search the web".into()),
                json!({ "properties": { "q": { "description": "search terms" } } }),
            )],
            tools_meta,
        }),
    }
}

#[derive(Default)]
struct FakeRegistry {
    cards: Mutex<HashMap<String, AgentCard>>,
    registrations: AtomicUsize,
    reject_logins: bool,
}

struct FakeConnector(Arc<FakeRegistry>);

#[async_trait]
impl RegistryConnector for FakeConnector {
    async fn connect(&self, _target: &RegistryTarget) -> RegistryResult<Arc<dyn RegistrySession>> {
        if self.0.reject_logins {
            return Err(RegistryError::backend("login rejected"));
        }
        Ok(Arc::clone(&self.0) as Arc<dyn RegistrySession>)
    }
}

#[async_trait]
impl RegistrySession for FakeRegistry {
    async fn get_agent_card(
        &self,
        _namespace_id: &str,
        agent_name: &str,
        _version: Option<&str>,
    ) -> RegistryResult<AgentCard> {
        self.cards
            .lock()
            .unwrap()
            .get(agent_name)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(format!("agent {agent_name}")))
    }

    async fn register_agent(&self, card: &AgentCard, _namespace_id: &str) -> RegistryResult<()> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        self.cards
            .lock()
            .unwrap()
            .insert(card.name.clone(), card.clone());
        Ok(())
    }

    async fn get_server_detail(
        &self,
        _namespace_id: &str,
        name: &str,
        _version: Option<&str>,
    ) -> RegistryResult<McpServerDetail> {
        match name {
            "search" => Ok(search_server()),
            other => Err(RegistryError::not_found(format!("mcp server {other}"))),
        }
    }

    async fn list_servers(
        &self,
        _namespace_id: &str,
        page_no: u32,
        _page_size: u32,
    ) -> RegistryResult<ServerPage> {
        Ok(ServerPage {
            total_count: 1,
            page_number: u64::from(page_no),
            pages_available: 1,
            servers: vec![ServerSummary {
                name: "search".into(),
                description: "web search".into(),
                protocol: McpProtocol::Sse,
            }],
        })
    }

    async fn get_config(&self, _namespace_id: &str, data_id: &str, _group: &str) -> RegistryResult<String> {
        Err(RegistryError::not_found(format!("config {data_id}")))
    }

    async fn publish_config(
        &self,
        _namespace_id: &str,
        _data_id: &str,
        _group: &str,
        _content: &str,
    ) -> RegistryResult<bool> {
        Ok(false)
    }
}

struct OfflineFetcher;

#[async_trait]
impl AgentCardFetcher for OfflineFetcher {
    async fn fetch_card(&self, url: &str) -> AdapterResult<AgentCard> {
        Err(AdapterError::transport(format!("{url} unreachable")))
    }
}

struct TaskClient;

#[async_trait]
impl AgentClient for TaskClient {
    async fn send_message(&self, message: Message) -> AdapterResult<AgentResponseStream> {
        let task = |state| Task {
            id: "task-1".into(),
            context_id: message.context_id.clone().unwrap_or_default(),
            status: TaskStatus {
                state,
                message: None,
                timestamp: None,
            },
            artifacts: Vec::new(),
            history: Vec::new(),
            metadata: None,
        };
        let items: Vec<AdapterResult<AgentResponse>> = vec![
            Ok(AgentResponse::TaskUpdate {
                task: task(TaskState::Working),
                update: None,
            }),
            Ok(AgentResponse::TaskUpdate {
                task: task(TaskState::Completed),
                update: None,
            }),
        ];
        Ok(Box::pin(stream::iter(items)))
    }
}

struct TaskClients;

impl AgentClientFactory for TaskClients {
    fn create_client(&self, _card: &AgentCard) -> AdapterResult<Arc<dyn AgentClient>> {
        Ok(Arc::new(TaskClient))
    }
}

struct SearchSession;

#[async_trait]
impl McpSession for SearchSession {
    async fn initialize(&self) -> AdapterResult<()> {
        Ok(())
    }

    async fn list_tools(&self) -> AdapterResult<Vec<ToolDescriptor>> {
        Ok(vec![
            ToolDescriptor::new(
                "query",
                Some("live description".into()),
                json!({ "type": "object", "properties": { "q": { "type": "string", "description": "live" } } }),
            ),
            ToolDescriptor::new("debug", None, json!({ "type": "object" })),
        ])
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> AdapterResult<Value> {
        Ok(json!({ "content": [{ "type": "text", "text": format!("{name}: {}", arguments["q"]) }] }))
    }
}

#[derive(Default)]
struct SearchTransport {
    urls: Mutex<Vec<String>>,
}

#[async_trait]
impl McpTransport for SearchTransport {
    async fn open(&self, _protocol: &McpProtocol, url: &str) -> AdapterResult<Box<dyn McpSession>> {
        self.urls.lock().unwrap().push(url.to_owned());
        Ok(Box::new(SearchSession))
    }
}

fn bridge_with(registry: Arc<FakeRegistry>, transport: Arc<SearchTransport>) -> Bridge {
    let collaborators = Collaborators {
        connector: Arc::new(FakeConnector(registry)),
        fetcher: Arc::new(OfflineFetcher),
        clients: Arc::new(TaskClients),
        transport,
    };
    Bridge::with_collaborators(
        BridgeConfig::default(),
        RegistryCredentials::new("registry.internal"),
        Arc::new(VolatileStore::new()),
        collaborators,
    )
    .unwrap()
}

fn bridge(registry: Arc<FakeRegistry>) -> Bridge {
    bridge_with(registry, Arc::new(SearchTransport::default()))
}

#[test]
fn registered_agent_is_looked_up_and_called() {
    let registry = Arc::new(FakeRegistry::default());
    registry.cards.lock().unwrap().insert("planner".into(), card("planner"));
    let bridge = bridge(registry);

    let info = bridge
        .invoke(
            "get_a2a_agent_information",
            json!({ "type": "registry", "a2a_agent_name": "planner" }),
        )
        .unwrap();
    assert_eq!(info["description"], "planner agent");
    assert_eq!(info["skills"][0]["id"], "plan");

    let called = bridge
        .invoke(
            "call_a2a_agent",
            json!({
                "type": "registry",
                "a2a_agent_name": "planner",
                "query": "plan my week",
                "conversation_id": "conv-7",
            }),
        )
        .unwrap();
    assert_eq!(called["result"]["status"]["state"], "completed");
    assert_eq!(called["result"]["contextId"], "conv-7");
}

#[test]
fn batch_lookup_isolates_failures() {
    let registry = Arc::new(FakeRegistry::default());
    registry.cards.lock().unwrap().insert("planner".into(), card("planner"));
    let bridge = bridge(registry);

    let output = bridge
        .invoke(
            "get_a2a_agents_information",
            json!({
                "type": "url",
                "available_agents": r#"{"planner": "http://planner.internal/card.json"}"#,
                "target_agents": "planner,writer",
            }),
        )
        .unwrap();
    let entries = output["result"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0]["error"].as_str().unwrap().contains("unreachable"));
    assert!(entries[1]["error"].is_string());
}

#[test]
fn server_tools_merge_registry_overrides() {
    let transport = Arc::new(SearchTransport::default());
    let bridge = bridge_with(Arc::new(FakeRegistry::default()), Arc::clone(&transport));

    let output = bridge
        .invoke("list_mcp_server_tools", json!({ "mcp_server_name": "search::1.2.0" }))
        .unwrap();
    let tools = output["result"][0]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "query");
    assert_eq!(tools[0]["description"], "Search the web");
    assert_eq!(tools[0]["inputSchema"]["properties"]["q"]["description"], "search terms");
    assert_eq!(tools[0]["inputSchema"]["properties"]["q"]["type"], "string");
    assert_eq!(transport.urls.lock().unwrap().as_slice(), ["http://10.2.0.7:9000/sse"]);

    let called = bridge
        .invoke(
            "call_mcp_tool",
            json!({ "mcp_server_name": "search", "tool_name": "query", "arguments": r#"{"q": "rust"}"# }),
        )
        .unwrap();
    assert_eq!(called["result"]["content"][0]["text"], r#"query: "rust""#);

    let err = bridge
        .invoke(
            "call_mcp_tool",
            json!({ "mcp_server_name": "absent", "tool_name": "query", "arguments": "{}" }),
        )
        .unwrap_err();
    assert!(matches!(err, ToolError::Execution { .. }));
}

#[test]
fn credentials_are_validated_against_the_registry() {
    let bridge_ok = bridge(Arc::new(FakeRegistry::default()));
    bridge_ok.validate_credentials().unwrap();

    let rejecting = Arc::new(FakeRegistry {
        reject_logins: true,
        ..FakeRegistry::default()
    });
    let err = bridge(rejecting).validate_credentials().unwrap_err();
    assert!(matches!(err, ToolError::Execution { .. }));
}

#[test]
fn missing_registry_address_is_a_parameter_error() {
    let err = Bridge::from_credentials(
        BridgeConfig::default(),
        json!({}),
        Arc::new(VolatileStore::new()),
    )
    .and_then(|bridge| bridge.validate_credentials())
    .unwrap_err();
    assert!(matches!(err, ToolError::InvalidParameters { .. }));
}

#[derive(Default)]
struct ChatApp {
    seen: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl AppInvoker for ChatApp {
    async fn chat(
        &self,
        _app_id: &str,
        query: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply, AppError> {
        self.seen.lock().unwrap().push(conversation_id.map(str::to_owned));
        Ok(ChatReply {
            answer: format!("answer to {query}"),
            conversation_id: Some("host-conv".into()),
        })
    }

    async fn workflow(&self, _app_id: &str, _query: &str) -> Result<Value, AppError> {
        Err(AppError::new("not a workflow app"))
    }
}

fn send(text: &str, context_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": "req-1",
        "method": "message/send",
        "params": {
            "message": {
                "messageId": "m-1",
                "role": "user",
                "parts": [{ "kind": "text", "text": text }],
                "contextId": context_id,
            }
        }
    }))
    .unwrap()
}

#[test]
fn endpoint_publishes_card_and_keeps_conversations() {
    let registry = Arc::new(FakeRegistry::default());
    let bridge = bridge(Arc::clone(&registry));
    let app = Arc::new(ChatApp::default());
    let settings = EndpointSettings {
        agent_name: "Helpdesk".into(),
        app: AppSelector {
            app_id: "app-42".into(),
        },
        ..EndpointSettings::default()
    };
    let endpoint = bridge.endpoint(settings, app.clone());

    for _ in 0..2 {
        let response = bridge
            .handle_request(&endpoint, "GET", "/hooks/x/.well-known/agent.json", Vec::new())
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body["name"], "Helpdesk");
    }
    assert_eq!(registry.registrations.load(Ordering::SeqCst), 1);

    let first = bridge
        .handle_request(&endpoint, "POST", "/hooks/x", send("hi", "ctx-1"))
        .unwrap();
    assert_eq!(first.body["id"], "req-1");
    assert_eq!(first.body["result"]["parts"][0]["text"], "answer to hi");
    bridge
        .handle_request(&endpoint, "POST", "/hooks/x", send("more", "ctx-1"))
        .unwrap();
    assert_eq!(
        app.seen.lock().unwrap().as_slice(),
        [None, Some("host-conv".to_owned())]
    );

    let missing = bridge
        .handle_request(&endpoint, "PUT", "/hooks/x", Vec::new())
        .unwrap();
    assert_eq!(missing.status, 404);
}
