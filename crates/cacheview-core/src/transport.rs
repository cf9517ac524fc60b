//! The download side of a load.
//!
//! A transport does I/O wherever it likes, but every callback it produces
//! must reach the controller on the controller's own context, typically by
//! sending [`TransportEvent`]s through a channel the owner drains.

use url::Url;

use crate::error::LoadError;
use crate::request::RequestId;

/// Terminal outcome of one download.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferResult {
    Success(Vec<u8>),
    Failure(LoadError),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Cumulative bytes received. `expected` is `-1` or `0` when the size is unknown.
    Progress { written: i64, expected: i64 },
    Finished(TransferResult),
}

/// A transport callback tagged with the request it belongs to.
///
/// For one id: any number of `Progress` events in non-decreasing `written`
/// order, then at most one `Finished`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEvent {
    pub id: RequestId,
    pub kind: EventKind,
}

impl TransportEvent {
    pub fn progress(id: RequestId, written: i64, expected: i64) -> Self {
        Self {
            id,
            kind: EventKind::Progress { written, expected },
        }
    }

    pub fn finished(id: RequestId, result: TransferResult) -> Self {
        Self {
            id,
            kind: EventKind::Finished(result),
        }
    }
}

/// Issues cancellable downloads.
pub trait Transport {
    /// Begin downloading `url`. Returns immediately.
    fn start(&mut self, id: RequestId, url: &Url);

    /// Best effort. Late events for `id` may still arrive and are ignored
    /// by the controller.
    fn cancel(&mut self, id: RequestId);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn start(&mut self, id: RequestId, url: &Url) {
        (**self).start(id, url);
    }

    fn cancel(&mut self, id: RequestId) {
        (**self).cancel(id);
    }
}
