use async_trait::async_trait;
use debatejudge::remote_agent::{AgentReply, AgentTransport, RemoteAgentClient, RemoteAgentError};
use debatejudge::{DebaterRole, RunId, SessionStore};
use reqwest::Url;
use std::sync::{Arc, Mutex};

/// Echoes the prompt back and hands out a new context id per fresh conversation.
#[derive(Default)]
struct EchoTransport {
    calls: Mutex<Vec<(String, Option<String>)>>,
    contexts_issued: Mutex<usize>,
}

#[async_trait]
impl AgentTransport for EchoTransport {
    async fn send_message(
        &self,
        _endpoint: &Url,
        text: &str,
        context_id: Option<&str>,
    ) -> Result<AgentReply, RemoteAgentError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), context_id.map(str::to_string)));
        let context = match context_id {
            Some(existing) => existing.to_string(),
            None => {
                let mut issued = self.contexts_issued.lock().unwrap();
                *issued += 1;
                format!("ctx-{}", *issued)
            }
        };
        Ok(AgentReply::new(format!("echo: {}", text), Some(context)))
    }
}

fn endpoint() -> Url {
    Url::parse("http://pro.test/").unwrap()
}

#[tokio::test]
async fn test_continuation_reuses_context() {
    let transport = Arc::new(EchoTransport::default());
    let client = RemoteAgentClient::for_run(transport.clone(), RunId::new(), Arc::new(SessionStore::new()));

    client.send(DebaterRole::Pro, &endpoint(), "first", true).await.unwrap();
    client.send(DebaterRole::Pro, &endpoint(), "second", false).await.unwrap();

    let calls = transport.calls.lock().unwrap().clone();
    assert_eq!(calls[0], ("first".to_string(), None));
    assert_eq!(calls[1], ("second".to_string(), Some("ctx-1".to_string())));

    let state = client.channel().state(DebaterRole::Pro).unwrap();
    assert!(state.started);
    assert_eq!(state.turns, 2);
}

#[tokio::test]
async fn test_reset_is_idempotent_and_next_send_is_fresh() {
    let transport = Arc::new(EchoTransport::default());
    let client = RemoteAgentClient::for_run(transport.clone(), RunId::new(), Arc::new(SessionStore::new()));

    client.send(DebaterRole::Pro, &endpoint(), "hello", true).await.unwrap();
    client.send(DebaterRole::Con, &endpoint(), "hello", true).await.unwrap();

    client.reset();
    client.reset();
    assert!(client.channel().is_empty());
    assert_eq!(client.channel().reset_count(), 2);

    client.send(DebaterRole::Pro, &endpoint(), "again", true).await.unwrap();
    let calls = transport.calls.lock().unwrap().clone();
    assert_eq!(calls.last().unwrap(), &("again".to_string(), None));
    assert_eq!(
        client.channel().state(DebaterRole::Pro).unwrap().context_id.as_deref(),
        Some("ctx-3")
    );
}

#[tokio::test]
async fn test_continuation_without_session_opens_one() {
    let transport = Arc::new(EchoTransport::default());
    let client = RemoteAgentClient::for_run(transport.clone(), RunId::new(), Arc::new(SessionStore::new()));

    client.send(DebaterRole::Con, &endpoint(), "orphan", false).await.unwrap();

    assert_eq!(
        transport.calls.lock().unwrap()[0],
        ("orphan".to_string(), None)
    );
    assert_eq!(client.channel().state(DebaterRole::Con).unwrap().turns, 1);
}

#[tokio::test]
async fn test_runs_sharing_a_store_are_isolated() {
    let transport = Arc::new(EchoTransport::default());
    let store = Arc::new(SessionStore::new());
    let first = RemoteAgentClient::for_run(transport.clone(), RunId::new(), store.clone());
    let second = RemoteAgentClient::for_run(transport.clone(), RunId::new(), store.clone());

    first.send(DebaterRole::Pro, &endpoint(), "a", true).await.unwrap();
    second.send(DebaterRole::Pro, &endpoint(), "b", true).await.unwrap();
    assert_eq!(store.len(), 2);

    first.reset();
    assert!(first.channel().is_empty());
    assert_eq!(store.len(), 1);
    assert_eq!(
        second.channel().state(DebaterRole::Pro).unwrap().context_id.as_deref(),
        Some("ctx-2")
    );
}

struct BlankTransport;

#[async_trait]
impl AgentTransport for BlankTransport {
    async fn send_message(
        &self,
        _endpoint: &Url,
        _text: &str,
        _context_id: Option<&str>,
    ) -> Result<AgentReply, RemoteAgentError> {
        Ok(AgentReply::new("  \n", Some("ctx".to_string())))
    }
}

#[tokio::test]
async fn test_blank_reply_is_an_error_and_opens_nothing() {
    let client = RemoteAgentClient::for_run(Arc::new(BlankTransport), RunId::new(), Arc::new(SessionStore::new()));

    let err = client
        .send(DebaterRole::Pro, &endpoint(), "speak", true)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RemoteAgentError::EmptyResponse {
            endpoint: "http://pro.test/".to_string()
        }
    );
    assert!(client.channel().state(DebaterRole::Pro).is_none());
}
