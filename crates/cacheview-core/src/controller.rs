//! Single-flight image load state machine.
//!
//! Each controller drives at most one download at a time. Every load gets a
//! fresh [`RequestId`]; callbacks carrying any other id are stale and are
//! dropped without touching state, which makes late events from a cancelled
//! download harmless no matter when they arrive.
//!
//! ```text
//!         load()              Success
//!  Idle ----------> Running ------------> Completed
//!                     |   \
//!                     |    \ Failure
//!                     |     `-----------> Failed
//!                     | load() / cancel()
//!                     v
//!                 discarded (no completion)
//! ```

use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::ViewConfig;
use crate::decode::{self, Image};
use crate::error::LoadError;
use crate::request::{Completion, LoadRequest, RequestId};
use crate::style::{BorderStyle, Color, Redisplay};
use crate::surface::{Animation, Surface, Transition};
use crate::transport::{EventKind, TransferResult, Transport, TransportEvent};

/// Shortest ring animation, so bursts of tiny updates don't jitter.
const MIN_PROGRESS_ANIMATION: Duration = Duration::from_millis(200);
/// Animation seconds per unit of progress delta.
const PROGRESS_ANIMATION_SCALE: f64 = 1.0;

/// What the controller did with a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Progress advanced.
    Progressed,
    /// Accepted but left state unchanged (unknown total, or a backwards step).
    Skipped,
    /// Image decoded and shown; completion ran with the image.
    Completed,
    /// Completion ran with an error.
    Failed,
    /// Transport gave up on its own; no completion.
    Discarded,
    /// Id does not match the active request.
    Stale,
}

struct ActiveRequest {
    id: RequestId,
    url: Url,
    completion: Option<Completion>,
}

/// Mutable per-view load state.
#[derive(Default)]
pub struct LoadState {
    active: Option<ActiveRequest>,
    progress: f64,
    current_image: Option<Image>,
    ring_visible: bool,
}

impl LoadState {
    pub fn active_id(&self) -> Option<RequestId> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn active_url(&self) -> Option<&Url> {
        self.active.as_ref().map(|a| &a.url)
    }

    /// Fraction in `0.0..=1.0`. Only meaningful while a request is active,
    /// or as the final value of the last one.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Placeholder or last fetched image.
    pub fn current_image(&self) -> Option<&Image> {
        self.current_image.as_ref()
    }

    pub fn is_ring_visible(&self) -> bool {
        self.ring_visible
    }
}

/// Drives one view's downloads through a [`Transport`] and reflects them on a [`Surface`].
pub struct ImageLoadController<T: Transport, S: Surface> {
    transport: T,
    surface: S,
    config: ViewConfig,
    state: LoadState,
    epoch: u64,
}

impl<T: Transport, S: Surface> ImageLoadController<T, S> {
    pub fn new(transport: T, surface: S) -> Self {
        Self::with_config(transport, surface, ViewConfig::default())
    }

    pub fn with_config(transport: T, surface: S, config: ViewConfig) -> Self {
        Self {
            transport,
            surface,
            config,
            state: LoadState::default(),
            epoch: 0,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// True when no download is in flight.
    pub fn is_idle(&self) -> bool {
        self.state.active.is_none()
    }

    /// Start loading `request`, superseding whatever is in flight.
    ///
    /// An invalid URL is reported to the request's completion before this
    /// returns `None`; the current download, if any, keeps running.
    pub fn load(&mut self, request: LoadRequest) -> Option<RequestId> {
        let LoadRequest {
            target_url,
            placeholder,
            progress,
            border,
            completion,
        } = request;

        let url = match parse_target(&target_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %target_url, error = %e, "Rejected load request");
                if let Some(completion) = completion {
                    completion(Err(e));
                }
                return None;
            }
        };

        self.supersede();

        progress.apply(&mut self.config.progress);
        if !border.is_empty() {
            border.apply(&mut self.config.border);
            self.surface.apply_border(&self.config.border);
        }

        if let Some(image) = placeholder {
            self.surface.show_placeholder(&image);
            self.state.current_image = Some(image);
        }

        self.state.progress = 0.0;
        if self.config.show_loading {
            self.show_ring(0.0, Animation::Immediate);
        } else {
            // Left over from the superseded request.
            self.hide_ring();
        }

        self.epoch += 1;
        let id = RequestId(self.epoch);
        debug!(%id, url = %url, "Starting download");
        self.transport.start(id, &url);
        self.state.active = Some(ActiveRequest {
            id,
            url,
            completion,
        });
        Some(id)
    }

    /// Cancel the in-flight download without starting another.
    ///
    /// The cancelled request's completion is never called. Returns whether
    /// anything was cancelled.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.supersede();
        self.hide_ring();
        cancelled
    }

    /// Route a marshalled transport callback.
    pub fn handle(&mut self, event: TransportEvent) -> Delivery {
        match event.kind {
            EventKind::Progress { written, expected } => {
                self.on_progress(event.id, written, expected)
            }
            EventKind::Finished(result) => self.on_finished(event.id, result),
        }
    }

    pub fn on_progress(&mut self, id: RequestId, written: i64, expected: i64) -> Delivery {
        if self.state.active_id() != Some(id) {
            debug!(%id, "Ignoring stale progress");
            return Delivery::Stale;
        }
        if expected <= 0 {
            return Delivery::Skipped;
        }

        // Lossy for multi-petabyte bodies, which is fine for a fraction.
        #[allow(clippy::cast_precision_loss)]
        let fraction = (written as f64 / expected as f64).clamp(0.0, 1.0);
        let previous = self.state.progress;
        if fraction < previous {
            return Delivery::Skipped;
        }

        self.state.progress = fraction;
        if self.config.show_loading {
            self.show_ring(fraction, progress_animation(fraction - previous));
        }
        debug!(%id, fraction, "Progress");
        Delivery::Progressed
    }

    pub fn on_finished(&mut self, id: RequestId, result: TransferResult) -> Delivery {
        let active = match self.state.active.take() {
            Some(active) if active.id == id => active,
            other => {
                self.state.active = other;
                debug!(%id, "Ignoring stale completion");
                return Delivery::Stale;
            }
        };

        match result {
            TransferResult::Success(bytes) => match decode::decode(&bytes) {
                Ok(image) => self.complete(active, image),
                Err(e) => self.fail(active, e),
            },
            TransferResult::Failure(e) => self.fail(active, e),
            TransferResult::Cancelled => {
                debug!(%id, url = %active.url, "Download cancelled by transport");
                self.hide_ring();
                Delivery::Discarded
            }
        }
    }

    // -- widget-facing entry points --

    pub fn set_image(&mut self, url: &str) -> Option<RequestId> {
        self.set_image_full(
            url,
            None,
            None,
            self.config.progress.line_width,
            None,
            self.config.border.width,
            None,
        )
    }

    pub fn set_image_with_placeholder(
        &mut self,
        url: &str,
        placeholder: Image,
    ) -> Option<RequestId> {
        self.set_image_full(
            url,
            Some(placeholder),
            None,
            self.config.progress.line_width,
            None,
            self.config.border.width,
            None,
        )
    }

    pub fn set_image_with_completion(
        &mut self,
        url: &str,
        placeholder: Image,
        completion: impl FnOnce(Result<Image, LoadError>) + 'static,
    ) -> Option<RequestId> {
        self.set_image_full(
            url,
            Some(placeholder),
            None,
            self.config.progress.line_width,
            None,
            self.config.border.width,
            Some(Box::new(completion)),
        )
    }

    pub fn set_image_with_progress(
        &mut self,
        url: &str,
        placeholder: Option<Image>,
        progress_color: Option<Color>,
        progress_line_width: f64,
        completion: Option<Completion>,
    ) -> Option<RequestId> {
        self.set_image_full(
            url,
            placeholder,
            progress_color,
            progress_line_width,
            None,
            self.config.border.width,
            completion,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_image_full(
        &mut self,
        url: &str,
        placeholder: Option<Image>,
        progress_color: Option<Color>,
        progress_line_width: f64,
        border_color: Option<Color>,
        border_width: f64,
        completion: Option<Completion>,
    ) -> Option<RequestId> {
        let mut request = LoadRequest::new(url)
            .progress_line_width(progress_line_width)
            .border(border_color, border_width);
        request.placeholder = placeholder;
        request.progress.color = progress_color;
        request.completion = completion;
        self.load(request)
    }

    // -- explicit setters; nothing is redrawn until `redisplay` --

    /// Replace the displayed image with a placeholder.
    pub fn set_placeholder(&mut self, image: Image) -> Redisplay {
        self.state.current_image = Some(image);
        Redisplay::IMAGE
    }

    pub fn set_progress_color(&mut self, color: Color) -> Redisplay {
        if self.config.progress.color == color {
            return Redisplay::empty();
        }
        self.config.progress.color = color;
        Redisplay::RING
    }

    pub fn set_progress_line_width(&mut self, width: f64) -> Redisplay {
        if self.config.progress.line_width == width {
            return Redisplay::empty();
        }
        self.config.progress.line_width = width;
        Redisplay::RING
    }

    /// Set the border. `None` keeps the current color.
    pub fn set_border(&mut self, color: Option<Color>, width: f64) -> Redisplay {
        let border = BorderStyle {
            color: color.unwrap_or(self.config.border.color),
            width,
        };
        if self.config.border == border {
            return Redisplay::empty();
        }
        let mut changed = Redisplay::BORDER;
        if self.config.border.width != width {
            // The ring is widened by the border.
            changed |= Redisplay::RING;
        }
        self.config.border = border;
        changed
    }

    pub fn set_show_loading(&mut self, show: bool) -> Redisplay {
        if self.config.show_loading == show {
            return Redisplay::empty();
        }
        self.config.show_loading = show;
        Redisplay::RING
    }

    /// Push the flagged parts of the view to the surface.
    pub fn redisplay(&mut self, parts: Redisplay) {
        if parts.contains(Redisplay::IMAGE) {
            if let Some(image) = &self.state.current_image {
                self.surface.show_image(image, Transition::None);
            }
        }
        if parts.contains(Redisplay::BORDER) {
            self.surface.apply_border(&self.config.border);
        }
        if parts.contains(Redisplay::RING) {
            if self.config.show_loading && !self.is_idle() {
                self.show_ring(self.state.progress, Animation::Immediate);
            } else {
                self.hide_ring();
            }
        }
    }

    // -- internals --

    /// Drop the active request, asking the transport to stop it.
    fn supersede(&mut self) -> bool {
        match self.state.active.take() {
            Some(old) => {
                debug!(id = %old.id, url = %old.url, "Cancelling superseded download");
                self.transport.cancel(old.id);
                true
            }
            None => false,
        }
    }

    fn complete(&mut self, active: ActiveRequest, image: Image) -> Delivery {
        self.state.progress = 1.0;
        if self.state.ring_visible {
            self.show_ring(1.0, Animation::Immediate);
        }
        self.hide_ring();

        self.state.current_image = Some(image.clone());
        self.surface
            .show_image(&image, Transition::CrossFade(self.config.cross_fade));

        info!(
            id = %active.id,
            url = %active.url,
            width = image.width(),
            height = image.height(),
            "Image loaded"
        );
        if let Some(completion) = active.completion {
            completion(Ok(image));
        }
        Delivery::Completed
    }

    fn fail(&mut self, active: ActiveRequest, error: LoadError) -> Delivery {
        self.hide_ring();
        warn!(id = %active.id, url = %active.url, error = %error, "Image load failed");
        if let Some(completion) = active.completion {
            completion(Err(error));
        }
        Delivery::Failed
    }

    fn show_ring(&mut self, fraction: f64, animation: Animation) {
        let style = self.config.effective_progress();
        self.surface.show_progress_ring(fraction, &style, animation);
        self.state.ring_visible = true;
    }

    fn hide_ring(&mut self) {
        if self.state.ring_visible {
            self.surface.hide_progress_ring();
            self.state.ring_visible = false;
        }
    }
}

impl<T: Transport, S: Surface> Drop for ImageLoadController<T, S> {
    fn drop(&mut self) {
        if let Some(active) = self.state.active.take() {
            self.transport.cancel(active.id);
        }
    }
}

/// Ring animation for a progress jump of `delta`.
fn progress_animation(delta: f64) -> Animation {
    let secs = (delta.abs() * PROGRESS_ANIMATION_SCALE).max(MIN_PROGRESS_ANIMATION.as_secs_f64());
    Animation::Animated(Duration::from_secs_f64(secs))
}

fn parse_target(raw: &str) -> Result<Url, LoadError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LoadError::InvalidRequest("empty URL".into()));
    }
    let url = Url::parse(raw).map_err(|e| LoadError::InvalidRequest(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(LoadError::InvalidRequest(format!(
            "{raw}: not a hierarchical URL"
        )));
    }
    Ok(url)
}
