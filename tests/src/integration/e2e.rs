//! # End-to-End Flows
//!
//! Binds the gateway on an ephemeral port and drives it with real HTTP and
//! WebSocket clients.

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};
    use gp_01_group_repository::{GroupRepository, InMemoryGroupStore};
    use gp_02_capability_tokens::TokenManager;
    use gp_03_api_gateway::{ApiGatewayService, GatewayConfig};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_tungstenite::{
        connect_async, tungstenite::Error as WsError, tungstenite::Message, MaybeTlsStream,
        WebSocketStream,
    };

    type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct Server {
        addr: SocketAddr,
        service: Arc<ApiGatewayService>,
        shutdown: Option<oneshot::Sender<()>>,
        task: tokio::task::JoinHandle<()>,
    }

    impl Server {
        async fn start() -> Self {
            let service = Arc::new(
                ApiGatewayService::new(
                    GatewayConfig::default(),
                    Arc::new(GroupRepository::new(Arc::new(InMemoryGroupStore::new()))),
                    Arc::new(TokenManager::random()),
                )
                .unwrap(),
            );
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let (tx, rx) = oneshot::channel::<()>();

            let serving = Arc::clone(&service);
            let task = tokio::spawn(async move {
                serving
                    .serve(listener, async {
                        let _ = rx.await;
                    })
                    .await
                    .unwrap();
            });

            Self {
                addr,
                service,
                shutdown: Some(tx),
                task,
            }
        }

        fn url(&self, path: &str) -> String {
            format!("http://{}{}", self.addr, path)
        }

        async fn socket(&self, group_id: &str, token: &str) -> Result<Socket, WsError> {
            let url = format!("ws://{}/group/{}/ws?token={}", self.addr, group_id, token);
            connect_async(url).await.map(|(socket, _)| socket)
        }

        /// Upgrades register asynchronously; wait until the hub sees them.
        async fn await_connections(&self, group_id: &str, expected: usize) {
            let hub = self.service.hub();
            timeout(Duration::from_secs(5), async {
                while hub.connection_count(group_id) != expected {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .unwrap();
        }

        async fn stop(mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
            timeout(Duration::from_secs(5), self.task).await.unwrap().unwrap();
        }
    }

    async fn post_member(client: &reqwest::Client, url: String, device: &str) -> Value {
        let response = client
            .post(url)
            .json(&json!({"name": device, "deviceId": device, "lat": 1.0, "lng": 2.0}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.unwrap()
    }

    async fn next_json(socket: &mut Socket) -> Value {
        loop {
            let message = timeout(Duration::from_secs(5), socket.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Message::Text(text) = message {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    async fn assert_silent(socket: &mut Socket) {
        let received = timeout(Duration::from_millis(100), socket.next()).await;
        assert!(received.is_err(), "unexpected frame: {:?}", received);
    }

    /// Wait for the server's close frame or the end of the stream.
    async fn assert_closed(socket: &mut Socket) {
        let closed = timeout(Duration::from_secs(5), async {
            loop {
                match socket.next().await {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(closed.is_ok(), "socket stayed open");
    }

    #[tokio::test]
    async fn test_rest_and_websocket_round_trip() {
        let server = Server::start().await;
        let client = reqwest::Client::new();

        let created = post_member(&client, server.url("/group"), "d1").await;
        let group_id = created["group"]["id"].as_str().unwrap().to_string();
        let a_token = created["token"].as_str().unwrap().to_string();

        let joined = post_member(&client, server.url(&format!("/group/{}", group_id)), "d2").await;
        let b_id = joined["yourId"].as_str().unwrap().to_string();
        let b_token = joined["token"].as_str().unwrap().to_string();

        let mut a = server.socket(&group_id, &a_token).await.unwrap();
        let mut b = server.socket(&group_id, &b_token).await.unwrap();
        server.await_connections(&group_id, 2).await;

        let frame = json!({
            "action": "send_coordinates",
            "payload": {"memberId": b_id, "lat": 10.5, "lng": 20.5}
        });
        b.send(Message::text(frame.to_string())).await.unwrap();

        for socket in [&mut a, &mut b] {
            let update = next_json(socket).await;
            assert_eq!(update["type"], "update");
            assert_eq!(update["payload"]["members"][1]["coordsBit"]["lat"], 10.5);
        }

        a.send(Message::text(r#"{"action":"get"}"#)).await.unwrap();
        let reply = next_json(&mut a).await;
        assert_eq!(reply["type"], "update");
        assert_silent(&mut b).await;

        // The REST read sees the websocket write.
        let view: Value = client
            .get(server.url(&format!("/group/{}", group_id)))
            .bearer_auth(&a_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["members"][1]["coordsBit"]["lng"], 20.5);

        b.close(None).await.unwrap();
        server.await_connections(&group_id, 1).await;
        drop(a);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_upgrade_rejected_before_registration() {
        let server = Server::start().await;
        let client = reqwest::Client::new();

        let mine = post_member(&client, server.url("/group"), "d1").await;
        let theirs = post_member(&client, server.url("/group"), "d9").await;
        let group_id = mine["group"]["id"].as_str().unwrap();
        let stranger_token = theirs["token"].as_str().unwrap();

        match server.socket(group_id, stranger_token).await {
            Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 403),
            other => panic!("expected HTTP rejection, got {:?}", other.map(|_| ())),
        }
        match server.socket(group_id, "not-a-token").await {
            Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
            other => panic!("expected HTTP rejection, got {:?}", other.map(|_| ())),
        }

        assert_eq!(server.service.hub().connection_count(group_id), 0);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_rest_kick_revokes_socket_access() {
        let server = Server::start().await;
        let client = reqwest::Client::new();

        let created = post_member(&client, server.url("/group"), "d1").await;
        let group_id = created["group"]["id"].as_str().unwrap().to_string();
        let a_token = created["token"].as_str().unwrap().to_string();
        let joined = post_member(&client, server.url(&format!("/group/{}", group_id)), "d2").await;
        let b_id = joined["yourId"].as_str().unwrap().to_string();
        let b_token = joined["token"].as_str().unwrap().to_string();

        let mut b = server.socket(&group_id, &b_token).await.unwrap();
        server.await_connections(&group_id, 1).await;

        let response = client
            .delete(server.url(&format!("/member/{}", b_id)))
            .bearer_auth(&a_token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        // The removed member's socket is closed and unregistered.
        assert_closed(&mut b).await;
        server.await_connections(&group_id, 0).await;

        drop(b);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_oversize_frame_dropped_without_closing() {
        let server = Server::start().await;
        let client = reqwest::Client::new();

        let created = post_member(&client, server.url("/group"), "d1").await;
        let group_id = created["group"]["id"].as_str().unwrap().to_string();
        let token = created["token"].as_str().unwrap().to_string();

        let mut a = server.socket(&group_id, &token).await.unwrap();
        server.await_connections(&group_id, 1).await;

        // Above the 64 KiB frame limit, below the 1 MiB transport cap.
        let padding = "x".repeat(70 * 1024);
        let oversize = json!({"action": "get", "pad": padding});
        a.send(Message::text(oversize.to_string())).await.unwrap();
        a.send(Message::text(r#"{"action":"get"}"#)).await.unwrap();

        let reply = next_json(&mut a).await;
        assert_eq!(reply["type"], "update");
        assert_silent(&mut a).await;
        assert_eq!(server.service.hub().connection_count(&group_id), 1);

        a.close(None).await.unwrap();
        server.await_connections(&group_id, 0).await;
        server.stop().await;
    }
}
