//! Canned HTTP responder and Agent Card fixtures for kernel tests.

use std::sync::Arc;

use agent_primitives::{AgentCard, AgentSkill};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub(crate) struct Captured {
    pub head: String,
    pub body: String,
}

/// Answers one connection per canned response and records each request.
pub(crate) async fn serve(responses: Vec<String>) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&captured);

    tokio::spawn(async move {
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut socket).await;
            log.lock().await.push(request);
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}"), captured)
}

pub(crate) fn response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    while let Ok(read) = socket.read(&mut chunk).await {
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
        let text = String::from_utf8_lossy(&buffer).into_owned();
        let Some(split) = text.find("\r\n\r\n") else {
            continue;
        };
        let head = text[..split].to_owned();
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let body = &text[split + 4..];
        if body.len() >= length {
            return Captured {
                head,
                body: body.to_owned(),
            };
        }
    }
    Captured::default()
}

pub(crate) fn card(name: &str, description: &str, url: &str) -> AgentCard {
    AgentCard::builder()
        .name(name)
        .unwrap()
        .description(description)
        .url(url)
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
