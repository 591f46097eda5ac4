// src/link/ws.rs
//! WebSocket links over tokio-tungstenite. One spawned task per link; the task
//! only reports through the events channel and owns the socket.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use super::types::{ConnectionId, Connector, LinkEvent, LinkEventKind, LinkEvents, LinkHandle};

#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        #[cfg(feature = "wss")]
        {
            // first caller wins; later installs report an error we don't care about
            let _ = rustls::crypto::ring::default_provider().install_default();
        }
        Self
    }
}

impl Connector for WsConnector {
    fn open(&self, id: ConnectionId, endpoint: &Url, events: LinkEvents) -> LinkHandle {
        let (handle, shutdown) = LinkHandle::new(id);
        tokio::spawn(run_link(id, endpoint.clone(), events, shutdown));
        handle
    }
}

fn report(events: &LinkEvents, id: ConnectionId, kind: LinkEventKind) {
    // owner gone: nobody left to tell
    let _ = events.send(LinkEvent::new(id, kind));
}

async fn run_link(
    id: ConnectionId,
    endpoint: Url,
    events: LinkEvents,
    mut shutdown: oneshot::Receiver<()>,
) {
    let ws = tokio::select! {
        _ = &mut shutdown => {
            tracing::debug!(link = id, "closed before handshake finished");
            report(&events, id, LinkEventKind::Closed(Some("closed before open".into())));
            return;
        }
        res = connect_async(endpoint.as_str()) => match res {
            Ok((ws, _resp)) => ws,
            Err(e) => {
                report(&events, id, LinkEventKind::Error(e.to_string()));
                report(&events, id, LinkEventKind::Closed(None));
                return;
            }
        }
    };

    report(&events, id, LinkEventKind::Opened);
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if let Err(e) = write.close().await {
                    tracing::debug!(link = id, error = %e, "close handshake failed");
                }
                report(&events, id, LinkEventKind::Closed(Some("closed by client".into())));
                return;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    report(&events, id, LinkEventKind::Payload(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(bin))) => {
                    tracing::debug!(link = id, len = bin.len(), "ignoring binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("{} {}", u16::from(f.code), f.reason.as_str()).trim().to_string());
                    report(&events, id, LinkEventKind::Closed(reason));
                    return;
                }
                // ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    report(&events, id, LinkEventKind::Error(e.to_string()));
                    report(&events, id, LinkEventKind::Closed(None));
                    return;
                }
                None => {
                    report(&events, id, LinkEventKind::Closed(None));
                    return;
                }
            }
        }
    }
}
