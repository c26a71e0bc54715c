//! Bridge connector and transport

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use pl_core::config::ClientConfig;
use pl_core::traits::{Connector, Handshake, InboundEvent, Transport};
use pl_core::{ConnectError, CredentialStore, DeviceIdentity, TransportError};
use pl_protocol::{Frame, FrameCodec, Message, ParticipantAddress, RequestId, PROTOCOL_VERSION};

use super::reader::read_loop;

/// Channel capacity for events pushed by the bridge.
///
/// Holds pairing progress and chat messages between the read loop and the
/// dispatcher. A full channel stalls the read loop, replies included, until
/// the dispatcher catches up.
const BRIDGE_EVENT_CHANNEL_CAPACITY: usize = 256;

pub(super) type FramedStream = Framed<TcpStream, FrameCodec>;
pub(super) type FrameSink = Arc<Mutex<SplitSink<FramedStream, Frame>>>;
pub(super) type FrameSource = SplitStream<FramedStream>;
pub(super) type PendingRequests = Arc<Mutex<HashMap<RequestId, oneshot::Sender<Message>>>>;

/// Connection settings for the bridge
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub address: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Name announced in `Hello`, shown on the phone's linked-devices list
    pub device_name: String,
}

impl BridgeConfig {
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            address: config.bridge_address.clone(),
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
            device_name: config.device_name(),
        }
    }
}

/// Creates [`BridgeTransport`]s
#[derive(Debug, Clone)]
pub struct BridgeConnector {
    config: BridgeConfig,
}

impl BridgeConnector {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

impl Connector for BridgeConnector {
    type Transport = BridgeTransport;

    fn new_transport(&self, store: &CredentialStore) -> BridgeTransport {
        BridgeTransport::new(self.config.clone(), store.clone())
    }
}

/// One TCP session with the bridge
pub struct BridgeTransport {
    config: BridgeConfig,
    store: CredentialStore,
    writer: Option<FrameSink>,
    reader: Option<JoinHandle<()>>,
    events: Option<mpsc::Receiver<InboundEvent>>,
    pending: PendingRequests,
    last_request: u32,
}

impl BridgeTransport {
    pub fn new(config: BridgeConfig, store: CredentialStore) -> Self {
        Self {
            config,
            store,
            writer: None,
            reader: None,
            events: None,
            pending: Arc::new(Mutex::new(HashMap::new())),
            last_request: 0,
        }
    }

    async fn dial(&self) -> Result<FramedStream, ConnectError> {
        let address = &self.config.address;
        tracing::debug!("Connecting to bridge at {}", address);

        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| ConnectError::Transport(format!("connection to {} timed out", address)))?
            .map_err(|e| ConnectError::Transport(format!("{}: {}", address, e)))?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Failed to set TCP_NODELAY: {}", e);
        }

        Ok(Framed::new(stream, FrameCodec::new()))
    }

    /// Present stored material and wait for the verdict
    async fn resume(
        &self,
        framed: &mut FramedStream,
        identity: &DeviceIdentity,
    ) -> Result<Handshake, ConnectError> {
        let resume = Message::Resume {
            device_id: identity.id.as_str().to_string(),
            material: identity.material.to_bytes(),
        };
        framed
            .send(Frame::unsolicited(resume))
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        let (accepted, reason) = tokio::time::timeout(self.config.connect_timeout, await_resume_ack(framed))
            .await
            .map_err(|_| ConnectError::Transport("bridge did not answer the resume request".to_string()))??;

        if accepted {
            Ok(Handshake::Authenticated)
        } else {
            tracing::debug!(
                "Resume rejected: {}",
                reason.as_deref().unwrap_or("no reason given")
            );
            Err(ConnectError::SessionExpired)
        }
    }

    async fn request(&mut self, message: Message) -> Result<Message, TransportError> {
        let writer = self.writer.clone().ok_or(TransportError::NotConnected)?;
        if self.reader.as_ref().map_or(true, |reader| reader.is_finished()) {
            return Err(TransportError::ConnectionLost);
        }

        self.last_request = self.last_request.wrapping_add(1).max(1);
        let request_id = RequestId::new(self.last_request);

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id, reply_tx);

        let sent = writer.lock().await.send(Frame::new(request_id, message)).await;
        if let Err(e) = sent {
            self.pending.lock().await.remove(&request_id);
            return Err(TransportError::Io(e.to_string()));
        }

        match tokio::time::timeout(self.config.request_timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(TransportError::ConnectionLost),
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                Err(TransportError::Timeout)
            }
        }
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn open(&mut self, identity: Option<&DeviceIdentity>) -> Result<Handshake, ConnectError> {
        self.close().await;

        let mut framed = self.dial().await?;
        let handshake = match identity {
            Some(identity) => self.resume(&mut framed, identity).await?,
            None => {
                let hello = Message::Hello {
                    device_name: self.config.device_name.clone(),
                    os: std::env::consts::OS.to_string(),
                    version: Some(PROTOCOL_VERSION.to_string()),
                };
                framed
                    .send(Frame::unsolicited(hello))
                    .await
                    .map_err(|e| ConnectError::Transport(e.to_string()))?;
                Handshake::PairingRequired
            }
        };

        let (sink, source) = framed.split();
        let writer: FrameSink = Arc::new(Mutex::new(sink));
        let (event_tx, event_rx) = mpsc::channel(BRIDGE_EVENT_CHANNEL_CAPACITY);

        self.reader = Some(tokio::spawn(read_loop(
            source,
            Arc::clone(&writer),
            event_tx,
            self.store.clone(),
            Arc::clone(&self.pending),
        )));
        self.writer = Some(writer);
        self.events = Some(event_rx);

        tracing::info!("Connected to bridge at {}", self.config.address);
        Ok(handshake)
    }

    fn take_events(&mut self) -> Option<mpsc::Receiver<InboundEvent>> {
        self.events.take()
    }

    async fn send_text(&mut self, to: &ParticipantAddress, body: &str) -> Result<String, TransportError> {
        let request = Message::SendText {
            to: to.to_string(),
            body: body.to_string(),
        };
        match self.request(request).await? {
            Message::SendAck { message_id, .. } => Ok(message_id),
            Message::Error { code, message } => {
                Err(TransportError::Remote(format!("{:?}: {}", code, message)))
            }
            other => Err(unexpected_reply(&other)),
        }
    }

    async fn revoke(&mut self) -> Result<(), TransportError> {
        match self.request(Message::Revoke).await? {
            Message::RevokeAck => Ok(()),
            Message::Error { code, message } => {
                Err(TransportError::Remote(format!("{:?}: {}", code, message)))
            }
            other => Err(unexpected_reply(&other)),
        }
    }

    async fn close(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.lock().await.close().await {
                tracing::debug!("Error closing bridge connection: {}", e);
            }
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
            let _ = reader.await;
        }
        self.events = None;
        self.pending.lock().await.clear();
    }

    fn abort(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.writer = None;
        self.events = None;
    }
}

/// Read frames until the bridge answers a `Resume`.
///
/// Heartbeats are answered; anything else that arrives first is skipped.
async fn await_resume_ack(framed: &mut FramedStream) -> Result<(bool, Option<String>), ConnectError> {
    while let Some(frame) = framed.next().await {
        let frame = frame.map_err(|e| ConnectError::Transport(e.to_string()))?;
        match frame.message {
            Message::ResumeAck { accepted, reason } => return Ok((accepted, reason)),
            Message::Heartbeat { timestamp } => {
                framed
                    .send(Frame::unsolicited(Message::HeartbeatAck { timestamp }))
                    .await
                    .map_err(|e| ConnectError::Transport(e.to_string()))?;
            }
            Message::Error { message, .. } => return Err(ConnectError::Transport(message)),
            other => {
                tracing::debug!("Skipping {:?} before resume ack", other.message_type());
            }
        }
    }
    Err(ConnectError::Transport("bridge closed the connection during handshake".to_string()))
}

fn unexpected_reply(message: &Message) -> TransportError {
    TransportError::Io(format!("unexpected reply {:?}", message.message_type()))
}
