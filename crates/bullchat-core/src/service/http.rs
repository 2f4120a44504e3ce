//! JSON gateway client.
//!
//! Every operation is a `POST {host}/api/{canister_id}/{operation}` carrying
//! a JSON object of named arguments; the response body is the JSON result.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::RemoteChatService;
use crate::config::CoreConfig;
use crate::error::ServiceError;
use crate::models::{Identity, Message, MessageId, Room, RoomId};

/// Header carrying the caller principal to the gateway
const IDENTITY_HEADER: &str = "x-bullchat-identity";

pub struct HttpChatService {
    client: reqwest::Client,
    base_url: String,
    identity: Identity,
}

impl HttpChatService {
    pub fn new(config: &CoreConfig, identity: Identity) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url(&config.host, &config.canister_id),
            identity,
        })
    }

    pub fn endpoint(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }

    async fn call<A, R>(&self, operation: &str, args: &A) -> Result<R, ServiceError>
    where
        A: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(operation);
        debug!(%url, "remote call");

        let response = self
            .client
            .post(&url)
            .header(IDENTITY_HEADER, self.identity.to_text())
            .json(args)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(ServiceError::Rejected(reason));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

fn base_url(host: &str, canister_id: &str) -> String {
    format!("{}/api/{}", host.trim_end_matches('/'), canister_id)
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl RemoteChatService for HttpChatService {
    async fn whoami(&self) -> Result<Identity, ServiceError> {
        self.call("whoami", &json!({})).await
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, ServiceError> {
        self.call("list_rooms", &json!({})).await
    }

    async fn create_room(
        &self,
        name: &str,
        description: &str,
        is_private: bool,
    ) -> Result<Room, ServiceError> {
        let args = json!({
            "name": name,
            "description": description,
            "is_private": is_private,
        });
        self.call("create_room", &args).await
    }

    async fn send_message(
        &self,
        room_id: RoomId,
        content: &str,
        reply_to: Option<MessageId>,
    ) -> Result<Message, ServiceError> {
        let args = json!({
            "room_id": room_id,
            "content": content,
            "reply_to": reply_to,
        });
        self.call("send_message", &args).await
    }

    async fn edit_message(
        &self,
        message_id: MessageId,
        content: &str,
    ) -> Result<(), ServiceError> {
        let args = json!({ "message_id": message_id, "new_content": content });
        self.call("edit_message", &args).await
    }

    async fn list_messages(
        &self,
        room_id: RoomId,
        cursor: Option<u64>,
        limit: u32,
    ) -> Result<Vec<Message>, ServiceError> {
        let args = json!({
            "room_id": room_id,
            "from_timestamp_inclusive": cursor,
            "limit": limit,
        });
        self.call("list_messages", &args).await
    }

    async fn tip_message(&self, message_id: MessageId, amount: u64) -> Result<(), ServiceError> {
        let args = json!({ "message_id": message_id, "amount_e8s": amount });
        self.call("tip_message", &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    #[test]
    fn test_endpoint_layout() {
        let config = CoreConfig::for_network(Network::Local);
        let service = HttpChatService::new(&config, Identity::anonymous()).unwrap();
        assert_eq!(
            service.endpoint("list_rooms"),
            "http://127.0.0.1:4943/api/uxrrr-q7777-77774-qaaaq-cai/list_rooms"
        );
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        assert_eq!(base_url("https://ic0.app/", "abc"), "https://ic0.app/api/abc");
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transport_error() {
        let mut config = CoreConfig::for_network(Network::Local);
        // Port 9 (discard) is never served by the test environment.
        config.host = "http://127.0.0.1:9".to_string();
        config.request_timeout = std::time::Duration::from_millis(500);

        let service = HttpChatService::new(&config, Identity::anonymous()).unwrap();
        let err = service.list_rooms().await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)), "got {err:?}");
    }
}
