//! Single-task host for a [`DictationSurface`].
//!
//! One tokio task owns the surface; everything else talks to it through a
//! cloneable [`SurfaceHandle`]. After an insertion the task yields once, then
//! absorbs whatever queued up in the meantime before settling:
//! - replacements are buffered (latest wins)
//! - selection changes are ignored
//! - any other request settles the insertion first

use dictum_core::error::{DictumError, Result};
use dictum_core::events::EditorEvent;
use dictum_core::types::FlatRange;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::document::StructuredContent;
use crate::engine::Insertion;
use crate::surface::DictationSurface;
use crate::tracker::TrackedSelection;

enum Request {
    Insert {
        fragment: String,
        reply: Option<oneshot::Sender<Insertion>>,
    },
    Replace(StructuredContent),
    Select(FlatRange),
    Blur,
    Capture(oneshot::Sender<Option<FlatRange>>),
    PlainText(oneshot::Sender<String>),
    Structured(oneshot::Sender<StructuredContent>),
    Tracked(oneshot::Sender<Option<TrackedSelection>>),
    Shutdown,
}

impl Request {
    /// Requests absorbed into an unsettled insertion rather than settling it.
    fn is_passive(&self) -> bool {
        matches!(self, Request::Replace(_) | Request::Select(_) | Request::Blur)
    }
}

/// Cloneable handle to a spawned surface.
#[derive(Clone)]
pub struct SurfaceHandle {
    tx: mpsc::UnboundedSender<Request>,
    events: broadcast::Sender<EditorEvent>,
}

/// Move `surface` into its own task.
///
/// The join handle yields the surface back once every handle is dropped or
/// [`SurfaceHandle::shutdown`] is called.
pub fn spawn_surface(mut surface: DictationSurface) -> (SurfaceHandle, JoinHandle<DictationSurface>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (events, _) = broadcast::channel(surface.event_capacity());
    surface.attach_events(events.clone());
    info!(document_id = %surface.id(), "Surface host started");
    let task = tokio::spawn(run(surface, rx));
    (SurfaceHandle { tx, events }, task)
}

async fn run(
    mut surface: DictationSurface,
    mut rx: mpsc::UnboundedReceiver<Request>,
) -> DictationSurface {
    while let Some(request) = rx.recv().await {
        let mut next = Some(request);
        while let Some(request) = next.take() {
            if !handle(&mut surface, request) {
                surface.settle();
                info!(document_id = %surface.id(), "Surface host stopped");
                return surface;
            }
            if !surface.is_mutating() {
                break;
            }

            tokio::task::yield_now().await;
            loop {
                match rx.try_recv() {
                    Ok(request) if request.is_passive() => {
                        handle(&mut surface, request);
                    }
                    Ok(request) => {
                        next = Some(request);
                        break;
                    }
                    Err(_) => break,
                }
            }
            surface.settle();
        }
    }
    surface.settle();
    debug!(document_id = %surface.id(), "All surface handles dropped");
    surface
}

/// Apply one request. Returns `false` on shutdown.
fn handle(surface: &mut DictationSurface, request: Request) -> bool {
    match request {
        Request::Insert { fragment, reply } => {
            let insertion = surface.begin_insert(&fragment);
            if let Some(reply) = reply {
                let _ = reply.send(insertion);
            }
        }
        Request::Replace(content) => {
            surface.replace_content(content);
        }
        Request::Select(range) => surface.select(range),
        Request::Blur => surface.blur(),
        Request::Capture(reply) => {
            let _ = reply.send(surface.focus_and_capture_position());
        }
        Request::PlainText(reply) => {
            let _ = reply.send(surface.get_plain_text());
        }
        Request::Structured(reply) => {
            let _ = reply.send(surface.get_structured_content());
        }
        Request::Tracked(reply) => {
            let _ = reply.send(surface.tracked_selection());
        }
        Request::Shutdown => return false,
    }
    true
}

impl SurfaceHandle {
    fn send(&self, request: Request) -> Result<()> {
        self.tx.send(request).map_err(|_| DictumError::SurfaceClosed)
    }

    async fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply))?;
        rx.await.map_err(|_| DictumError::SurfaceClosed)
    }

    /// Push one fragment without waiting for it to land.
    pub fn submit_fragment(&self, fragment: impl Into<String>) -> Result<()> {
        self.send(Request::Insert {
            fragment: fragment.into(),
            reply: None,
        })
    }

    /// Insert one fragment and wait for the outcome.
    pub async fn insert_fragment(&self, fragment: impl Into<String>) -> Result<Insertion> {
        let fragment = fragment.into();
        self.ask(|reply| Request::Insert {
            fragment,
            reply: Some(reply),
        })
        .await
    }

    pub fn replace_content(&self, content: impl Into<StructuredContent>) -> Result<()> {
        self.send(Request::Replace(content.into()))
    }

    pub fn select(&self, range: FlatRange) -> Result<()> {
        self.send(Request::Select(range))
    }

    pub fn blur(&self) -> Result<()> {
        self.send(Request::Blur)
    }

    pub async fn focus_and_capture_position(&self) -> Result<Option<FlatRange>> {
        self.ask(Request::Capture).await
    }

    pub async fn plain_text(&self) -> Result<String> {
        self.ask(Request::PlainText).await
    }

    pub async fn structured_content(&self) -> Result<StructuredContent> {
        self.ask(Request::Structured).await
    }

    pub async fn tracked_selection(&self) -> Result<Option<TrackedSelection>> {
        self.ask(Request::Tracked).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Stop the task after it settles any in-flight insertion.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Request::Shutdown)
    }
}
