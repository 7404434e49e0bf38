//! In-memory collaborators for tool and endpoint tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agent_adapters::{
    AdapterError, AdapterResult, AgentCardFetcher, AgentClient, AgentClientFactory,
    AgentResponse, AgentResponseStream, McpSession, McpTransport,
};
use agent_config::{BridgeConfig, RegistryCredentials};
use agent_kernel::{RegistryConnector, RegistryError, RegistryResult, RegistrySession, RegistryTarget};
use agent_memory::VolatileStore;
use agent_primitives::{
    AgentCard, AgentSkill, BackendEndpoint, McpProtocol, McpServerDetail, Message, ServerPage,
    ServerSummary, ToolDescriptor,
};
use async_trait::async_trait;
use futures::stream;
use serde_json::{Map, Value, json};

use crate::context::{BridgeContext, Collaborators};

pub(crate) fn remote_card(name: &str) -> AgentCard {
    AgentCard::builder()
        .name(name)
        .unwrap()
        .description(format!("{name} agent"))
        .url(format!("http://{name}/"))
        .unwrap()
        .version("1.0.0")
        .add_skill(AgentSkill {
            id: "main".into(),
            name: "Main".into(),
            description: "primary skill".into(),
            ..AgentSkill::default()
        })
        .build()
        .unwrap()
}

#[derive(Default)]
pub(crate) struct MemoryRegistry {
    pub cards: Mutex<HashMap<String, AgentCard>>,
    pub configs: Mutex<HashMap<String, String>>,
    pub registrations: AtomicUsize,
    pub card_lookups: AtomicUsize,
}

impl MemoryRegistry {
    pub(crate) fn insert_card(&self, card: AgentCard) {
        self.cards.lock().unwrap().insert(card.name.clone(), card);
    }
}

struct MemoryConnector(Arc<MemoryRegistry>);

#[async_trait]
impl RegistryConnector for MemoryConnector {
    async fn connect(&self, _target: &RegistryTarget) -> RegistryResult<Arc<dyn RegistrySession>> {
        Ok(Arc::clone(&self.0) as Arc<dyn RegistrySession>)
    }
}

fn weather_server() -> McpServerDetail {
    McpServerDetail {
        name: "weather".into(),
        description: "forecasts".into(),
        version: Some("1.0".into()),
        protocol: McpProtocol::Streamable,
        backend_endpoints: vec![BackendEndpoint {
            address: "10.1.1.1".into(),
            port: 8080,
        }],
        export_path: "/mcp".into(),
        tool_spec: None,
    }
}

#[async_trait]
impl RegistrySession for MemoryRegistry {
    async fn get_agent_card(
        &self,
        _namespace_id: &str,
        agent_name: &str,
        _version: Option<&str>,
    ) -> RegistryResult<AgentCard> {
        self.card_lookups.fetch_add(1, Ordering::SeqCst);
        self.cards
            .lock()
            .unwrap()
            .get(agent_name)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(format!("agent {agent_name}")))
    }

    async fn register_agent(&self, card: &AgentCard, _namespace_id: &str) -> RegistryResult<()> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        self.insert_card(card.clone());
        Ok(())
    }

    async fn get_server_detail(
        &self,
        _namespace_id: &str,
        name: &str,
        _version: Option<&str>,
    ) -> RegistryResult<McpServerDetail> {
        if name == "weather" {
            Ok(weather_server())
        } else {
            Err(RegistryError::not_found(format!("mcp server {name}")))
        }
    }

    async fn list_servers(
        &self,
        _namespace_id: &str,
        page_no: u32,
        _page_size: u32,
    ) -> RegistryResult<ServerPage> {
        Ok(ServerPage {
            total_count: 2,
            page_number: u64::from(page_no),
            pages_available: 1,
            servers: vec![
                ServerSummary {
                    name: "weather".into(),
                    description: "forecasts".into(),
                    protocol: McpProtocol::Streamable,
                },
                ServerSummary {
                    name: "shell".into(),
                    description: "local only".into(),
                    protocol: McpProtocol::from("stdio"),
                },
            ],
        })
    }

    async fn get_config(&self, namespace_id: &str, data_id: &str, group: &str) -> RegistryResult<String> {
        self.configs
            .lock()
            .unwrap()
            .get(&format!("{namespace_id}/{group}/{data_id}"))
            .cloned()
            .ok_or_else(|| RegistryError::not_found(format!("config {data_id}")))
    }

    async fn publish_config(
        &self,
        namespace_id: &str,
        data_id: &str,
        group: &str,
        content: &str,
    ) -> RegistryResult<bool> {
        self.configs
            .lock()
            .unwrap()
            .insert(format!("{namespace_id}/{group}/{data_id}"), content.to_owned());
        Ok(true)
    }
}

struct UrlFetcher;

#[async_trait]
impl AgentCardFetcher for UrlFetcher {
    async fn fetch_card(&self, url: &str) -> AdapterResult<AgentCard> {
        if url.contains("missing") {
            return Err(AdapterError::Http {
                status: 404,
                url: url.to_owned(),
                reason: "not found".into(),
            });
        }
        Ok(remote_card("remote"))
    }
}

struct EchoClient;

#[async_trait]
impl AgentClient for EchoClient {
    async fn send_message(&self, message: Message) -> AdapterResult<AgentResponseStream> {
        let reply = Message::agent_text(
            format!("echo: {}", message.text_content()),
            message.context_id.clone(),
        );
        let items: Vec<AdapterResult<AgentResponse>> = vec![Ok(AgentResponse::DirectMessage(reply))];
        Ok(Box::pin(stream::iter(items)))
    }
}

struct EchoFactory;

impl AgentClientFactory for EchoFactory {
    fn create_client(&self, _card: &AgentCard) -> AdapterResult<Arc<dyn AgentClient>> {
        Ok(Arc::new(EchoClient))
    }
}

struct ForecastSession;

#[async_trait]
impl McpSession for ForecastSession {
    async fn initialize(&self) -> AdapterResult<()> {
        Ok(())
    }

    async fn list_tools(&self) -> AdapterResult<Vec<ToolDescriptor>> {
        Ok(vec![ToolDescriptor::new(
            "forecast",
            Some("Weather forecast".into()),
            json!({ "type": "object", "properties": { "city": { "type": "string" } } }),
        )])
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> AdapterResult<Value> {
        Ok(json!({ "tool": name, "arguments": arguments }))
    }
}

struct ForecastTransport;

#[async_trait]
impl McpTransport for ForecastTransport {
    async fn open(&self, _protocol: &McpProtocol, _url: &str) -> AdapterResult<Box<dyn McpSession>> {
        Ok(Box::new(ForecastSession))
    }
}

pub(crate) fn collaborators(registry: Arc<MemoryRegistry>) -> Collaborators {
    Collaborators {
        connector: Arc::new(MemoryConnector(registry)),
        fetcher: Arc::new(UrlFetcher),
        clients: Arc::new(EchoFactory),
        transport: Arc::new(ForecastTransport),
    }
}

pub(crate) fn context() -> (Arc<BridgeContext>, Arc<MemoryRegistry>) {
    let registry = Arc::new(MemoryRegistry::default());
    let ctx = BridgeContext::new(
        BridgeConfig::default(),
        RegistryCredentials::new("10.0.0.1"),
        Arc::new(VolatileStore::new()),
        collaborators(Arc::clone(&registry)),
    );
    (Arc::new(ctx), registry)
}
