//! Registry client speaking the Nacos HTTP admin API.

use std::sync::Arc;
use std::time::Duration;

use agent_adapters::http_client::parse_uri;
use agent_adapters::{AdapterError, HttpClient, HttpResponse};
use agent_primitives::{AgentCard, McpServerDetail, ServerPage};
use async_trait::async_trait;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;
use url::form_urlencoded::Serializer;

use crate::registry::{
    RegistryConnector, RegistryError, RegistryResult, RegistrySession, RegistryTarget,
};
use crate::registry_wire::{
    Envelope, LoginResponse, McpServerDetailWire, SUCCESS_CODE, ServerPageWire,
};

const LOGIN_PATH: &str = "/nacos/v1/auth/login";
const AGENT_PATH: &str = "/nacos/v3/admin/ai/a2a";
const MCP_PATH: &str = "/nacos/v3/admin/ai/mcp";
const MCP_LIST_PATH: &str = "/nacos/v3/admin/ai/mcp/list";
const CONFIG_PATH: &str = "/nacos/v1/cs/configs";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Opens [`NacosSession`]s, logging in when the target carries credentials.
#[derive(Debug, Clone)]
pub struct NacosConnector {
    client: HttpClient,
    timeout: Duration,
}

impl NacosConnector {
    /// Creates a connector; `timeout` bounds every RPC including login.
    #[must_use]
    pub const fn new(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl RegistryConnector for NacosConnector {
    async fn connect(&self, target: &RegistryTarget) -> RegistryResult<Arc<dyn RegistrySession>> {
        let mut session = NacosSession {
            client: self.client.clone(),
            base: base_url(target.address())?,
            access_token: None,
            timeout: self.timeout,
        };
        if let Some((username, password)) = target.credentials().login() {
            session.access_token = Some(session.login(username, password).await?);
        }
        debug!(registry = %session.base, "registry session opened");
        Ok(Arc::new(session))
    }
}

fn base_url(address: &str) -> RegistryResult<Url> {
    let absolute = if address.contains("://") {
        address.to_owned()
    } else {
        format!("http://{address}")
    };
    Url::parse(&absolute).map_err(|err| {
        RegistryError::invalid_config(format!("invalid registry address `{address}`: {err}"))
    })
}

/// Authenticated session against one registry server.
#[derive(Debug)]
pub struct NacosSession {
    client: HttpClient,
    base: Url,
    access_token: Option<String>,
    timeout: Duration,
}

impl NacosSession {
    async fn login(&self, username: &str, password: &str) -> RegistryResult<String> {
        let url = self.url(LOGIN_PATH, &[], false)?;
        let form = [("username", username), ("password", password)];
        let response = self.send("login", Method::POST, &url, Some(&form[..])).await?;
        if !response.status.is_success() {
            return Err(RegistryError::backend(format!(
                "login failed with status {}: {}",
                response.status,
                response.text()
            )));
        }
        let login: LoginResponse = serde_json::from_slice(&response.body)
            .map_err(|err| RegistryError::backend(format!("invalid login response: {err}")))?;
        Ok(login.access_token)
    }

    fn url(&self, path: &str, query: &[(&str, &str)], with_token: bool) -> RegistryResult<Url> {
        let mut url = self.base.join(path).map_err(|err| {
            RegistryError::invalid_config(format!("invalid registry path `{path}`: {err}"))
        })?;
        let token = self.access_token.as_deref().filter(|_| with_token);
        if !query.is_empty() || token.is_some() {
            let mut pairs = url.query_pairs_mut();
            pairs.extend_pairs(query);
            if let Some(token) = token {
                pairs.append_pair("accessToken", token);
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        operation: &str,
        method: Method,
        url: &Url,
        form: Option<&[(&str, &str)]>,
    ) -> RegistryResult<HttpResponse> {
        let uri = parse_uri(url.as_str())
            .map_err(|err| RegistryError::invalid_config(err.to_string()))?;
        let builder = Request::builder().method(method).uri(uri);
        let request = match form {
            Some(pairs) => builder
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(Body::from(
                    Serializer::new(String::new()).extend_pairs(pairs).finish(),
                )),
            None => builder.body(Body::empty()),
        }
        .map_err(|err| RegistryError::Transport {
            reason: format!("failed to build {operation} request: {err}"),
        })?;

        self.client
            .send_buffered(request, self.timeout)
            .await
            .map_err(|err| match err {
                AdapterError::Timeout { .. } => RegistryError::Timeout {
                    operation: operation.to_owned(),
                },
                AdapterError::Configuration { reason } => RegistryError::InvalidConfig { reason },
                other => RegistryError::Transport {
                    reason: other.to_string(),
                },
            })
    }

    async fn admin_get<T: DeserializeOwned>(
        &self,
        operation: &str,
        resource: String,
        path: &str,
        query: &[(&str, &str)],
    ) -> RegistryResult<T> {
        let url = self.url(path, query, true)?;
        let response = self.send(operation, Method::GET, &url, None).await?;
        decode_envelope(operation, resource, &response)
    }
}

fn parse_envelope<T: DeserializeOwned>(
    operation: &str,
    response: &HttpResponse,
) -> RegistryResult<Envelope<T>> {
    let envelope: Envelope<T> = serde_json::from_slice(&response.body).map_err(|err| {
        if response.status.is_success() {
            RegistryError::backend(format!("invalid {operation} response: {err}"))
        } else {
            RegistryError::backend(format!(
                "{operation} failed with status {}: {}",
                response.status,
                response.text()
            ))
        }
    })?;
    if envelope.code != SUCCESS_CODE {
        return Err(RegistryError::backend(format!(
            "{operation} failed with code {}: {}",
            envelope.code,
            envelope.message.unwrap_or_default()
        )));
    }
    Ok(envelope)
}

fn decode_envelope<T: DeserializeOwned>(
    operation: &str,
    resource: String,
    response: &HttpResponse,
) -> RegistryResult<T> {
    if response.status == StatusCode::NOT_FOUND {
        return Err(RegistryError::not_found(resource));
    }
    parse_envelope(operation, response)?
        .data
        .ok_or_else(|| RegistryError::not_found(resource))
}

#[async_trait]
impl RegistrySession for NacosSession {
    async fn get_agent_card(
        &self,
        namespace_id: &str,
        agent_name: &str,
        version: Option<&str>,
    ) -> RegistryResult<AgentCard> {
        let mut query = vec![
            ("namespaceId", namespace_id),
            ("agentName", agent_name),
            ("registrationType", "URL"),
        ];
        if let Some(version) = version {
            query.push(("version", version));
        }
        let value: Value = self
            .admin_get("get agent card", format!("agent {agent_name}"), AGENT_PATH, &query)
            .await?;
        AgentCard::from_value(value)
            .map_err(|err| RegistryError::backend(format!("registry returned {err}")))
    }

    async fn register_agent(&self, card: &AgentCard, namespace_id: &str) -> RegistryResult<()> {
        let encoded = serde_json::to_string(card)
            .map_err(|err| RegistryError::backend(format!("failed to encode agent card: {err}")))?;
        let form = [
            ("namespaceId", namespace_id),
            ("agentName", card.name.as_str()),
            ("registrationType", "SERVICE"),
            ("agentCard", encoded.as_str()),
        ];
        let url = self.url(AGENT_PATH, &[], true)?;
        let response = self
            .send("register agent", Method::POST, &url, Some(&form[..]))
            .await?;
        parse_envelope::<Value>("register agent", &response).map(|_| ())
    }

    async fn get_server_detail(
        &self,
        namespace_id: &str,
        name: &str,
        version: Option<&str>,
    ) -> RegistryResult<McpServerDetail> {
        let mut query = vec![("namespaceId", namespace_id), ("mcpName", name)];
        if let Some(version) = version {
            query.push(("version", version));
        }
        let wire: McpServerDetailWire = self
            .admin_get("get mcp server", format!("mcp server {name}"), MCP_PATH, &query)
            .await?;
        Ok(wire.into())
    }

    async fn list_servers(
        &self,
        namespace_id: &str,
        page_no: u32,
        page_size: u32,
    ) -> RegistryResult<ServerPage> {
        let page_no = page_no.to_string();
        let page_size = page_size.to_string();
        let query = [
            ("namespaceId", namespace_id),
            ("mcpName", ""),
            ("search", "blur"),
            ("pageNo", page_no.as_str()),
            ("pageSize", page_size.as_str()),
        ];
        let wire: ServerPageWire = self
            .admin_get(
                "list mcp servers",
                format!("namespace {namespace_id}"),
                MCP_LIST_PATH,
                &query,
            )
            .await?;
        Ok(wire.into())
    }

    async fn get_config(
        &self,
        namespace_id: &str,
        data_id: &str,
        group: &str,
    ) -> RegistryResult<String> {
        let query = [("dataId", data_id), ("group", group), ("tenant", namespace_id)];
        let url = self.url(CONFIG_PATH, &query, true)?;
        let response = self.send("get config", Method::GET, &url, None).await?;
        match response.status {
            StatusCode::NOT_FOUND => Err(RegistryError::not_found(format!(
                "config {group}/{data_id}"
            ))),
            status if status.is_success() => Ok(response.text()),
            status => Err(RegistryError::backend(format!(
                "get config failed with status {status}: {}",
                response.text()
            ))),
        }
    }

    async fn publish_config(
        &self,
        namespace_id: &str,
        data_id: &str,
        group: &str,
        content: &str,
    ) -> RegistryResult<bool> {
        let form = [
            ("dataId", data_id),
            ("group", group),
            ("content", content),
            ("tenant", namespace_id),
        ];
        let url = self.url(CONFIG_PATH, &[], true)?;
        let response = self
            .send("publish config", Method::POST, &url, Some(&form[..]))
            .await?;
        if !response.status.is_success() {
            return Err(RegistryError::backend(format!(
                "publish config failed with status {}: {}",
                response.status,
                response.text()
            )));
        }
        Ok(response.text().trim() == "true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{response, serve};
    use agent_config::RegistryCredentials;
    use agent_primitives::McpProtocol;

    fn connector() -> NacosConnector {
        NacosConnector::new(HttpClient::new("test").unwrap(), Duration::from_secs(5))
    }

    fn json_ok(body: &str) -> String {
        response("200 OK", "application/json", body)
    }

    #[tokio::test]
    async fn logs_in_and_sends_token_with_lookups() {
        let card = r#"{"code":0,"message":"success","data":{"name":"weather","description":"forecasts","url":"http://weather/","version":"1.0.0","registrationType":"URL"}}"#;
        let (base, requests) = serve(vec![
            json_ok(r#"{"accessToken":"tok-1","tokenTtl":18000}"#),
            json_ok(card),
        ])
        .await;

        let credentials = RegistryCredentials::new(base).with_login("nacos", "secret");
        let target = RegistryTarget::new(credentials, "public").unwrap();
        let session = connector().connect(&target).await.unwrap();
        let card = session
            .get_agent_card("public", "weather", Some("1.0.0"))
            .await
            .unwrap();
        assert_eq!(card.name, "weather");

        let captured = requests.lock().await;
        assert!(captured[0].head.starts_with("POST /nacos/v1/auth/login"));
        assert!(captured[0].body.contains("username=nacos"));
        assert!(captured[1].head.starts_with("GET /nacos/v3/admin/ai/a2a?"));
        assert!(captured[1].head.contains("agentName=weather"));
        assert!(captured[1].head.contains("registrationType=URL"));
        assert!(captured[1].head.contains("accessToken=tok-1"));
    }

    #[tokio::test]
    async fn server_detail_is_flattened() {
        let detail = r#"{"code":0,"data":{"name":"weather","protocol":"mcp-sse","remoteServerConfig":{"exportPath":"/sse"},"backendEndpoints":[{"address":"10.0.0.5","port":8080}]}}"#;
        let (base, requests) = serve(vec![json_ok(detail)]).await;

        let target = RegistryTarget::new(RegistryCredentials::new(base), "public").unwrap();
        let session = connector().connect(&target).await.unwrap();
        let detail = session
            .get_server_detail("public", "weather", None)
            .await
            .unwrap();

        assert_eq!(detail.protocol, McpProtocol::Sse);
        assert_eq!(detail.export_path, "/sse");
        let captured = requests.lock().await;
        assert!(!captured[0].head.contains("accessToken"));
        assert!(!captured[0].head.contains("version="));
    }

    #[tokio::test]
    async fn non_zero_code_is_backend_error() {
        let (base, _) = serve(vec![json_ok(r#"{"code":21000,"message":"parameter missing"}"#)]).await;
        let target = RegistryTarget::new(RegistryCredentials::new(base), "public").unwrap();
        let session = connector().connect(&target).await.unwrap();

        let err = session.list_servers("public", 1, 10).await.unwrap_err();
        let RegistryError::Backend { reason } = err else {
            panic!("expected backend error, got {err:?}");
        };
        assert!(reason.contains("parameter missing"));
    }

    #[tokio::test]
    async fn config_round_trip() {
        let (base, requests) = serve(vec![
            response("404 Not Found", "text/plain", "config data not exist"),
            response("200 OK", "text/plain", "true"),
        ])
        .await;
        let target = RegistryTarget::new(RegistryCredentials::new(base), "dev").unwrap();
        let session = connector().connect(&target).await.unwrap();

        let err = session.get_config("dev", "app.yaml", "DEFAULT_GROUP").await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        assert!(
            session
                .publish_config("dev", "app.yaml", "DEFAULT_GROUP", "a: 1")
                .await
                .unwrap()
        );

        let captured = requests.lock().await;
        assert!(captured[1].head.starts_with("POST /nacos/v1/cs/configs"));
        assert!(captured[1].body.contains("content=a%3A+1"));
        assert!(captured[1].body.contains("tenant=dev"));
    }

    #[tokio::test]
    async fn unreachable_registry_is_transport_error() {
        let target =
            RegistryTarget::new(RegistryCredentials::new("http://127.0.0.1:9"), "public").unwrap();
        let session = connector().connect(&target).await.unwrap();
        let err = session.list_servers("public", 1, 10).await.unwrap_err();
        assert!(matches!(err, RegistryError::Transport { .. }));
    }
}
