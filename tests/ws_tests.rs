use bitstamp::core::kernel::{SessionState, WsConfig, WsSession};
use bitstamp::exchanges::bitstamp::{connect_websocket, BitstampCodec};
use bitstamp::BitstampError;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_test::assert_ok;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

/// Local WebSocket server that records inbound frames per connection and
/// lets the test push frames to any connection.
struct TestServer {
    url: String,
    frames: mpsc::UnboundedReceiver<(usize, Message)>,
    peers: Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let peers = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::clone(&peers);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(ws) = accept_async(stream).await else {
                    continue;
                };
                let (mut sink, mut source) = ws.split();
                let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
                let index = {
                    let mut peers = registry.lock().unwrap();
                    peers.push(out_tx);
                    peers.len() - 1
                };

                tokio::spawn(async move {
                    while let Some(message) = out_rx.recv().await {
                        if sink.send(message).await.is_err() {
                            break;
                        }
                    }
                });

                let frames_tx = frames_tx.clone();
                tokio::spawn(async move {
                    while let Some(Ok(message)) = source.next().await {
                        if matches!(message, Message::Text(_) | Message::Pong(_) | Message::Close(_)) {
                            let _ = frames_tx.send((index, message));
                        }
                    }
                });
            }
        });

        Self { url, frames, peers }
    }

    fn config(&self) -> WsConfig {
        WsConfig::default().with_url(self.url.clone())
    }

    async fn next_frame(&mut self) -> (usize, Message) {
        timeout(WAIT, self.frames.recv())
            .await
            .expect("frame should arrive in time")
            .expect("server should be running")
    }

    async fn next_json(&mut self) -> (usize, Value) {
        match self.next_frame().await {
            (index, Message::Text(text)) => (index, serde_json::from_str(&text).unwrap()),
            (_, other) => panic!("expected a text frame, got {:?}", other),
        }
    }

    async fn wait_for_peer(&self, index: usize) {
        timeout(WAIT, async {
            while self.peers.lock().unwrap().len() <= index {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("client should connect");
    }

    async fn send(&self, connection: usize, message: Message) {
        self.wait_for_peer(connection).await;
        self.peers.lock().unwrap()[connection]
            .send(message)
            .expect("connection writer alive");
    }

    async fn send_text(&self, connection: usize, text: &str) {
        self.send(connection, Message::Text(text.to_string())).await;
    }
}

fn subscribe_frame(channel: &str) -> Value {
    json!({"event": "bts:subscribe", "data": {"channel": channel}})
}

#[tokio::test]
async fn test_subscribe_and_unsubscribe_frames() {
    let mut server = TestServer::start().await;
    let session = assert_ok!(connect_websocket(server.config()).await);
    assert_eq!(session.state(), SessionState::Open);

    assert_ok!(
        session
            .subscribe(&["live_trades_btcusd", "order_book_btcusd"])
            .await
    );
    assert_eq!(server.next_json().await, (0, subscribe_frame("live_trades_btcusd")));
    assert_eq!(server.next_json().await, (0, subscribe_frame("order_book_btcusd")));
    assert_eq!(
        session.subscriptions(),
        vec!["live_trades_btcusd".to_string(), "order_book_btcusd".to_string()]
    );

    assert_ok!(session.unsubscribe(&["live_trades_btcusd"]).await);
    assert_eq!(
        server.next_json().await,
        (
            0,
            json!({"event": "bts:unsubscribe", "data": {"channel": "live_trades_btcusd"}})
        )
    );
    assert_eq!(session.subscriptions(), vec!["order_book_btcusd".to_string()]);

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_events_are_delivered_in_order() {
    let server = TestServer::start().await;
    let session = assert_ok!(WsSession::connect(server.config(), BitstampCodec).await);
    let mut streams = session.take_streams().expect("streams available once");
    assert!(session.take_streams().is_none());

    server
        .send_text(
            0,
            r#"{"event": "bts:subscription_succeeded", "channel": "live_trades_btcusd", "data": {}}"#,
        )
        .await;
    server
        .send_text(
            0,
            r#"{"event": "trade", "channel": "live_trades_btcusd", "data": {"id": 7, "price": 27000.5}}"#,
        )
        .await;

    let first = timeout(WAIT, streams.events.recv()).await.unwrap().unwrap();
    assert!(first.is_subscription_succeeded());
    let second = timeout(WAIT, streams.events.recv()).await.unwrap().unwrap();
    assert_eq!(second.event, "trade");
    assert_eq!(second.data["id"], json!(7));

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_bad_frame_goes_to_errors_and_reading_continues() {
    let server = TestServer::start().await;
    let session = assert_ok!(connect_websocket(server.config()).await);
    let mut streams = session.take_streams().unwrap();

    server.send_text(0, "definitely not json").await;
    server
        .send_text(0, r#"{"event": "data", "channel": "order_book_btcusd", "data": {"bids": []}}"#)
        .await;

    let error = timeout(WAIT, streams.errors.recv()).await.unwrap().unwrap();
    assert!(matches!(error, BitstampError::DeserializationError(_)));

    let event = timeout(WAIT, streams.events.recv()).await.unwrap().unwrap();
    assert_eq!(event.channel, "order_book_btcusd");
    assert!(session.is_open());

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_ping_is_answered() {
    let mut server = TestServer::start().await;
    let session = assert_ok!(connect_websocket(server.config()).await);

    server.send(0, Message::Ping(vec![1, 2, 3])).await;
    let (index, frame) = server.next_frame().await;
    assert_eq!(index, 0);
    assert_eq!(frame, Message::Pong(vec![1, 2, 3]));

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_reconnect_request_and_subscription_replay() {
    let mut server = TestServer::start().await;
    let session = assert_ok!(connect_websocket(server.config()).await);
    let mut streams = session.take_streams().unwrap();

    assert_ok!(session.subscribe(&["live_trades_btcusd", "live_orders_ethusd"]).await);
    server.next_json().await;
    server.next_json().await;

    server
        .send_text(0, r#"{"event": "bts:request_reconnect", "channel": "", "data": ""}"#)
        .await;
    let event = timeout(WAIT, streams.events.recv()).await.unwrap().unwrap();
    assert!(event.is_reconnect_request());

    let fresh = assert_ok!(session.reconnect().await);
    assert!(session.is_open());
    assert_eq!(server.next_json().await, (1, subscribe_frame("live_orders_ethusd")));
    assert_eq!(server.next_json().await, (1, subscribe_frame("live_trades_btcusd")));
    assert_eq!(fresh.subscriptions(), session.subscriptions());

    assert_ok!(session.close().await);
    assert_eq!(session.state(), SessionState::Closed);
    assert!(fresh.is_open());

    let mut fresh_streams = fresh.take_streams().unwrap();
    server
        .send_text(1, r#"{"event": "trade", "channel": "live_trades_btcusd", "data": {}}"#)
        .await;
    let event = timeout(WAIT, fresh_streams.events.recv()).await.unwrap().unwrap();
    assert_eq!(event.event, "trade");

    assert_ok!(fresh.close().await);
}

#[tokio::test]
async fn test_reconnect_request_with_null_data() {
    let server = TestServer::start().await;
    let session = assert_ok!(connect_websocket(server.config()).await);
    let mut streams = session.take_streams().unwrap();

    server
        .send_text(0, r#"{"event":"bts:request_reconnect","channel":"","data":null}"#)
        .await;
    let event = timeout(WAIT, streams.events.recv()).await.unwrap().unwrap();
    assert!(event.is_reconnect_request());
    assert_eq!(event.channel, "");
    assert_eq!(event.data, Value::Null);

    server
        .send_text(0, r#"{"event":"bts:request_reconnects","channel":"","data":null}"#)
        .await;
    let event = timeout(WAIT, streams.events.recv()).await.unwrap().unwrap();
    assert!(!event.is_reconnect_request());

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_concurrent_subscribes_do_not_interleave() {
    let mut server = TestServer::start().await;
    let session = Arc::new(assert_ok!(connect_websocket(server.config()).await));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let session = Arc::clone(&session);
        tasks.push(tokio::spawn(async move {
            let channel = format!("live_trades_pair{}", i);
            session.subscribe(&[channel.as_str()]).await?;
            if i % 2 == 0 {
                session.unsubscribe(&[channel.as_str()]).await?;
            }
            Ok::<(), BitstampError>(())
        }));
    }
    for task in tasks {
        assert_ok!(task.await.unwrap());
    }

    let mut subscribed = 0;
    let mut unsubscribed = 0;
    for _ in 0..12 {
        let (index, frame) = server.next_json().await;
        assert_eq!(index, 0);
        match frame["event"].as_str() {
            Some("bts:subscribe") => subscribed += 1,
            Some("bts:unsubscribe") => unsubscribed += 1,
            other => panic!("unexpected event {:?}", other),
        }
        assert!(frame["data"]["channel"]
            .as_str()
            .unwrap()
            .starts_with("live_trades_pair"));
    }
    assert_eq!((subscribed, unsubscribed), (8, 4));
    assert_eq!(
        session.subscriptions(),
        vec![
            "live_trades_pair1".to_string(),
            "live_trades_pair3".to_string(),
            "live_trades_pair5".to_string(),
            "live_trades_pair7".to_string(),
        ]
    );

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_subscription_set_follows_wire_order() {
    let mut server = TestServer::start().await;
    let session = Arc::new(assert_ok!(connect_websocket(server.config()).await));

    let mut tasks = Vec::new();
    for i in 0..10 {
        let session = Arc::clone(&session);
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                session.subscribe(&["live_trades_btcusd"]).await
            } else {
                session.unsubscribe(&["live_trades_btcusd"]).await
            }
        }));
    }
    for task in tasks {
        assert_ok!(task.await.unwrap());
    }

    let mut last_event = String::new();
    for _ in 0..10 {
        let (_, frame) = server.next_json().await;
        last_event = frame["event"].as_str().unwrap().to_string();
    }
    let tracked = session.subscriptions() == vec!["live_trades_btcusd".to_string()];
    assert_eq!(tracked, last_event == "bts:subscribe");

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_close_sends_close_frame() {
    let mut server = TestServer::start().await;
    let session = assert_ok!(connect_websocket(server.config()).await);
    server.wait_for_peer(0).await;

    assert_ok!(session.close().await);
    let (index, frame) = server.next_frame().await;
    assert_eq!(index, 0);
    assert!(matches!(frame, Message::Close(_)), "got {:?}", frame);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let server = TestServer::start().await;
    let session = assert_ok!(connect_websocket(server.config()).await);

    assert_ok!(session.close().await);
    assert_eq!(session.state(), SessionState::Closed);
    assert_ok!(session.close().await);
    assert_eq!(session.state(), SessionState::Closed);

    let err = session.subscribe(&["live_trades_btcusd"]).await.unwrap_err();
    assert!(err.is_connection_closed());
}

#[tokio::test]
async fn test_server_close_ends_session() {
    let server = TestServer::start().await;
    let session = assert_ok!(connect_websocket(server.config()).await);
    let mut streams = session.take_streams().unwrap();

    server.send(0, Message::Close(None)).await;

    let error = timeout(WAIT, streams.errors.recv()).await.unwrap().unwrap();
    assert!(error.is_connection_closed());
    timeout(WAIT, async {
        while session.state() != SessionState::Closed {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session should reach Closed");

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_read_timeout_is_reported() {
    let server = TestServer::start().await;
    let config = server.config().with_read_timeout(Duration::from_millis(100));
    let session = assert_ok!(connect_websocket(config).await);
    let mut streams = session.take_streams().unwrap();

    let error = timeout(WAIT, streams.errors.recv()).await.unwrap().unwrap();
    assert!(matches!(error, BitstampError::ReadTimeout(_)));
    assert!(session.is_open());

    server
        .send_text(0, r#"{"event": "trade", "channel": "live_trades_btcusd", "data": {}}"#)
        .await;
    let event = timeout(WAIT, streams.events.recv()).await.unwrap().unwrap();
    assert_eq!(event.event, "trade");

    assert_ok!(session.close().await);
}

#[tokio::test]
async fn test_connect_failure_is_returned() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let config = WsConfig::default()
        .with_url(format!("ws://{}", address))
        .with_connect_timeout(Duration::from_secs(2));
    let err = connect_websocket(config).await.unwrap_err();
    assert!(matches!(
        err,
        BitstampError::NetworkError(_) | BitstampError::ConnectionTimeout(_)
    ));
}
