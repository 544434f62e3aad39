use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::models::event::{StreamKey, TaggedEvent};
use crate::providers::base::FragmentStream;

/// Default bound on in-flight events for one fan-out
pub const EVENT_BUFFER: usize = 100;

/// Merges several per-agent fragment streams into one ordered event
/// stream.
///
/// Each spawned task forwards its fragments as `chunk` events tagged with
/// its key, followed by exactly one terminal (`end` on clean exhaustion,
/// `error` on the first failed fragment). Events for one key keep their
/// production order; events for different keys interleave arbitrarily.
/// The combined stream stays open until every task has delivered its
/// terminal and [`Multiplexer::join`] has been awaited.
pub struct Multiplexer {
    tx: mpsc::Sender<TaggedEvent>,
    handles: Vec<JoinHandle<()>>,
}

impl Multiplexer {
    /// Create a multiplexer together with the combined stream it feeds.
    ///
    /// Callers drain the stream and await [`Multiplexer::join`]
    /// concurrently; joining first would deadlock once the buffer fills.
    pub fn channel(buffer: usize) -> (Self, ReceiverStream<TaggedEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Multiplexer {
                tx,
                handles: Vec::new(),
            },
            ReceiverStream::new(rx),
        )
    }

    /// Forward `fragments` as events under `key`. A failed fragment turns
    /// into the task's terminal `error`; sibling tasks are unaffected. If
    /// the receiver is gone the task stops without completing its
    /// transcript.
    pub fn spawn(&mut self, key: StreamKey, mut fragments: FragmentStream) {
        let tx = self.tx.clone();
        self.handles.push(tokio::spawn(async move {
            while let Some(piece) = fragments.next().await {
                match piece {
                    Ok(content) => {
                        let event = TaggedEvent::chunk(key.clone(), content);
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(TaggedEvent::error(key.clone(), e.to_string())).await;
                        return;
                    }
                }
            }
            let _ = tx.send(TaggedEvent::end(key)).await;
        }));
    }

    /// Enqueue a task that is failed from the start: it emits its terminal
    /// `error` carrying `message` and nothing else.
    pub fn spawn_failed(&mut self, key: StreamKey, message: impl Into<String>) {
        let tx = self.tx.clone();
        let event = TaggedEvent::error(key, message);
        self.handles.push(tokio::spawn(async move {
            let _ = tx.send(event).await;
        }));
    }

    /// Wait for every task to finish. Dropping the internal sender here is
    /// what lets the combined stream end, so the stream closes only after
    /// all tasks have reached a terminal.
    pub async fn join(self) {
        drop(self.tx);
        futures::future::join_all(self.handles).await;
    }
}
