//! Owner-side delivery of transport events to a controller.

use cacheview_core::surface::Surface;
use cacheview_core::transport::Transport;
use cacheview_core::{Delivery, ImageLoadController};
use tokio::sync::mpsc::error::TryRecvError;

use crate::transport::EventReceiver;

/// Feed events into `controller` until its active load settles.
///
/// Returns the last delivery, or `None` if nothing was in flight.
pub async fn drive<T: Transport, S: Surface>(
    controller: &mut ImageLoadController<T, S>,
    events: &mut EventReceiver,
) -> Option<Delivery> {
    let mut last = None;
    while !controller.is_idle() {
        let Some(event) = events.recv().await else {
            tracing::warn!("Transport event channel closed with a load in flight");
            break;
        };
        last = Some(controller.handle(event));
    }
    last
}

/// Deliver whatever is already queued without waiting, e.g. once per UI frame.
///
/// Returns how many events were handled.
pub fn pump_pending<T: Transport, S: Surface>(
    controller: &mut ImageLoadController<T, S>,
    events: &mut EventReceiver,
) -> usize {
    let mut handled = 0;
    loop {
        match events.try_recv() {
            Ok(event) => {
                controller.handle(event);
                handled += 1;
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => return handled,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use cacheview_core::style::{BorderStyle, ProgressStyle};
    use cacheview_core::surface::{Animation, Transition};
    use cacheview_core::transport::{TransferResult, TransportEvent};
    use cacheview_core::{Image, LoadError, LoadRequest, RequestId};
    use reqwest::Client;

    use super::*;
    use crate::transport::tests::{http_response, png_1x1, serve_once, serve_stalled};
    use crate::transport::HttpTransport;

    #[derive(Default)]
    struct RingLog {
        fractions: Vec<f64>,
        images: usize,
    }

    impl Surface for RingLog {
        fn show_placeholder(&mut self, _image: &Image) {}

        fn show_image(&mut self, _image: &Image, _transition: Transition) {
            self.images += 1;
        }

        fn show_progress_ring(&mut self, fraction: f64, _style: &ProgressStyle, _animation: Animation) {
            self.fractions.push(fraction);
        }

        fn hide_progress_ring(&mut self) {}

        fn apply_border(&mut self, _style: &BorderStyle) {}
    }

    type Outcomes = Rc<RefCell<Vec<Result<Image, LoadError>>>>;

    fn request(url: &url::Url, outcomes: &Outcomes) -> LoadRequest {
        let sink = Rc::clone(outcomes);
        LoadRequest::new(url.as_str()).on_complete(move |r| sink.borrow_mut().push(r))
    }

    #[tokio::test]
    async fn test_drive_loads_image_end_to_end() {
        let url = serve_once(http_response("200 OK", &png_1x1(), true)).await;
        let (transport, mut rx) = HttpTransport::channel(Client::new());
        let mut controller = ImageLoadController::new(transport, RingLog::default());
        let outcomes = Outcomes::default();

        controller.load(request(&url, &outcomes)).unwrap();
        let last = drive(&mut controller, &mut rx).await;

        assert_eq!(last, Some(Delivery::Completed));
        assert_eq!(controller.state().progress(), 1.0);
        assert_eq!(controller.surface().images, 1);
        let fractions = &controller.surface().fractions;
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(fractions.last(), Some(&1.0));

        let reported = outcomes.borrow();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].as_ref().unwrap().width(), 1);
    }

    #[tokio::test]
    async fn test_superseded_download_never_completes() {
        let slow = serve_stalled().await;
        let fast = serve_once(http_response("200 OK", &png_1x1(), true)).await;
        let (transport, mut rx) = HttpTransport::channel(Client::new());
        let mut controller = ImageLoadController::new(transport, RingLog::default());
        let first = Outcomes::default();
        let second = Outcomes::default();

        let first_id = controller.load(request(&slow, &first)).unwrap();
        controller.load(request(&fast, &second)).unwrap();
        assert_eq!(drive(&mut controller, &mut rx).await, Some(Delivery::Completed));

        // Whenever the cancelled download's own event shows up, it is stale.
        assert_eq!(
            controller.on_finished(first_id, TransferResult::Cancelled),
            Delivery::Stale
        );
        assert_eq!(controller.transport().in_flight(), 0);

        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 1);
        assert!(second.borrow()[0].is_ok());
    }

    #[tokio::test]
    async fn test_drive_reports_http_failure() {
        let url = serve_once(http_response("500 Internal Server Error", b"", true)).await;
        let (transport, mut rx) = HttpTransport::channel(Client::new());
        let mut controller = ImageLoadController::new(transport, RingLog::default());
        let outcomes = Outcomes::default();

        controller.load(request(&url, &outcomes)).unwrap();
        assert_eq!(drive(&mut controller, &mut rx).await, Some(Delivery::Failed));
        assert!(matches!(outcomes.borrow()[0], Err(LoadError::Transport(_))));
    }

    #[tokio::test]
    async fn test_drive_idle_returns_none() {
        let (transport, mut rx) = HttpTransport::channel(Client::new());
        let mut controller = ImageLoadController::new(transport, RingLog::default());
        assert_eq!(drive(&mut controller, &mut rx).await, None);
    }

    #[tokio::test]
    async fn test_pump_pending_drains_queue() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let transport = HttpTransport::new(Client::new(), tx.clone());
        let mut controller = ImageLoadController::new(transport, RingLog::default());

        // Queue events by hand for an id that was never started.
        tx.send(TransportEvent::progress(RequestId(42), 1, 2)).unwrap();
        tx.send(TransportEvent::progress(RequestId(42), 2, 2)).unwrap();

        assert_eq!(pump_pending(&mut controller, &mut rx), 2);
        assert_eq!(pump_pending(&mut controller, &mut rx), 0);
        assert!(controller.surface().fractions.is_empty());
    }
}
