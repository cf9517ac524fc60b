use std::collections::HashMap;

use cacheview_core::transport::{TransferResult, Transport, TransportEvent};
use cacheview_core::RequestId;
use futures::StreamExt;
use reqwest::Client;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::error::FetchError;

pub type EventSender = mpsc::UnboundedSender<TransportEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// [`Transport`] that downloads over HTTP(S) with `reqwest`.
///
/// Each download is a Tokio task that reports every received chunk as a
/// `Progress` event and ends with exactly one `Finished` event. Cancelling
/// signals the task, which then reports `Cancelled` itself, so nothing is
/// ever sent for an id after its `Finished`.
///
/// `start` spawns onto the current Tokio runtime and panics outside one.
pub struct HttpTransport {
    http: Client,
    events: EventSender,
    in_flight: HashMap<RequestId, oneshot::Sender<()>>,
}

impl HttpTransport {
    pub fn new(http: Client, events: EventSender) -> Self {
        Self {
            http,
            events,
            in_flight: HashMap::new(),
        }
    }

    /// Transport plus the receiving end its events arrive on.
    pub fn channel(http: Client) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(http, tx), rx)
    }

    /// Downloads started and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.values().filter(|tx| !tx.is_closed()).count()
    }
}

impl Transport for HttpTransport {
    fn start(&mut self, id: RequestId, url: &Url) {
        // Finished tasks drop their receiver.
        self.in_flight.retain(|_, tx| !tx.is_closed());

        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.in_flight.insert(id, cancel_tx);

        let http = self.http.clone();
        let events = self.events.clone();
        let url = url.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                // Also fires when the transport is dropped.
                _ = cancel_rx => TransferResult::Cancelled,
                fetched = fetch(&http, url.clone(), id, &events) => match fetched {
                    Ok(bytes) => TransferResult::Success(bytes),
                    Err(e) => {
                        tracing::warn!(%id, url = %url, error = %e, "Download failed");
                        TransferResult::Failure(e.into())
                    }
                },
            };
            let _ = events.send(TransportEvent::finished(id, result));
        });
    }

    fn cancel(&mut self, id: RequestId) {
        if let Some(tx) = self.in_flight.remove(&id) {
            tracing::debug!(%id, "Cancelling download");
            let _ = tx.send(());
        }
    }
}

/// Download `url`, reporting cumulative progress per chunk.
async fn fetch(
    http: &Client,
    url: Url,
    id: RequestId,
    events: &EventSender,
) -> Result<Vec<u8>, FetchError> {
    let response = http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let expected = response
        .content_length()
        .and_then(|n| i64::try_from(n).ok())
        .unwrap_or(-1);

    let mut body = Vec::with_capacity(usize::try_from(expected).unwrap_or(0).min(16 << 20));
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        body.extend_from_slice(&chunk);
        let written = i64::try_from(body.len()).unwrap_or(i64::MAX);
        let _ = events.send(TransportEvent::progress(id, written, expected));
    }

    Ok(body)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use cacheview_core::transport::EventKind;
    use cacheview_core::LoadError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    pub(crate) fn png_1x1() -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgba8(1, 1)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    pub(crate) fn http_response(status: &str, body: &[u8], content_length: bool) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {status}\r\nContent-Type: image/png\r\nConnection: close\r\n");
        if content_length {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        head.push_str("\r\n");
        let mut out = head.into_bytes();
        out.extend_from_slice(body);
        out
    }

    /// Serve one canned response on a local port and return its URL.
    pub(crate) async fn serve_once(response: Vec<u8>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        });
        Url::parse(&format!("http://{addr}/image.png")).unwrap()
    }

    /// Accept a connection and never answer.
    pub(crate) async fn serve_stalled() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        Url::parse(&format!("http://{addr}/slow.png")).unwrap()
    }

    async fn collect_until_finished(rx: &mut EventReceiver, id: RequestId) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.id, id);
            let done = matches!(event.kind, EventKind::Finished(_));
            kinds.push(event.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[tokio::test]
    async fn test_downloads_with_progress() {
        let body = png_1x1();
        let url = serve_once(http_response("200 OK", &body, true)).await;
        let (mut transport, mut rx) = HttpTransport::channel(Client::new());

        transport.start(RequestId(1), &url);
        let kinds = collect_until_finished(&mut rx, RequestId(1)).await;

        let expected = i64::try_from(body.len()).unwrap();
        let (last, progress) = kinds.split_last().unwrap();
        assert!(!progress.is_empty());
        let mut previous = 0;
        for kind in progress {
            let EventKind::Progress { written, expected: total } = kind else {
                panic!("expected progress, got {kind:?}");
            };
            assert_eq!(*total, expected);
            assert!(*written >= previous);
            previous = *written;
        }
        assert_eq!(previous, expected);
        assert_eq!(last, &EventKind::Finished(TransferResult::Success(body)));
    }

    #[tokio::test]
    async fn test_unknown_length_reports_negative_total() {
        let body = png_1x1();
        let url = serve_once(http_response("200 OK", &body, false)).await;
        let (mut transport, mut rx) = HttpTransport::channel(Client::new());

        transport.start(RequestId(3), &url);
        let kinds = collect_until_finished(&mut rx, RequestId(3)).await;

        assert!(kinds
            .iter()
            .filter_map(|k| match k {
                EventKind::Progress { expected, .. } => Some(*expected),
                _ => None,
            })
            .all(|expected| expected == -1));
        assert!(matches!(
            kinds.last(),
            Some(EventKind::Finished(TransferResult::Success(_)))
        ));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_failure() {
        let url = serve_once(http_response("404 Not Found", b"missing", true)).await;
        let (mut transport, mut rx) = HttpTransport::channel(Client::new());

        transport.start(RequestId(2), &url);
        let kinds = collect_until_finished(&mut rx, RequestId(2)).await;

        match kinds.last() {
            Some(EventKind::Finished(TransferResult::Failure(LoadError::Transport(msg)))) => {
                assert!(msg.contains("404"), "unexpected message: {msg}");
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_reports_cancelled() {
        let url = serve_stalled().await;
        let (mut transport, mut rx) = HttpTransport::channel(Client::new());

        transport.start(RequestId(4), &url);
        assert_eq!(transport.in_flight(), 1);
        transport.cancel(RequestId(4));
        // Unknown and repeated cancels are no-ops.
        transport.cancel(RequestId(4));
        transport.cancel(RequestId(99));

        let kinds = collect_until_finished(&mut rx, RequestId(4)).await;
        assert_eq!(kinds, vec![EventKind::Finished(TransferResult::Cancelled)]);
        assert_eq!(transport.in_flight(), 0);
    }
}
