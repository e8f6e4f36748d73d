use std::future::Future;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::Instrument;

use super::{Content, ErrorKind, Task, TaskEvent, TaskFailure, TaskStatus};

pub type TaskStream = Pin<Box<dyn Stream<Item = TaskEvent> + Send>>;

/// Handle a task body uses to report progress.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl ProgressSink {
    pub fn progress(&self, message: impl Into<String>) {
        // receiver gone means the client disconnected
        let _ = self.tx.send(TaskEvent::Progress {
            message: message.into(),
        });
    }
}

/// Build a lazy task stream around `work`.
///
/// Nothing runs until the stream is first polled. Progress reported through
/// the sink is yielded in order, followed by exactly one terminal event
/// derived from the body's result: `Ok` completes, `Internal` failures become
/// `Error`, and every other failure kind completes with its message as text.
pub fn task_stream<F, Fut>(mut task: Task, work: F) -> TaskStream
where
    F: FnOnce(ProgressSink) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Content, TaskFailure>> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let span = tracing::info_span!("task", task_id = %task.id, session_id = %task.session_id);

    let producer = async move {
        task.status = TaskStatus::InProgress;
        tracing::debug!(query = %task.query, "task started");

        let sink = ProgressSink { tx: tx.clone() };
        let terminal = match work(sink).await {
            Ok(content) => {
                task.status = TaskStatus::Complete;
                TaskEvent::Complete { content }
            }
            Err(failure) if failure.kind == ErrorKind::Internal => {
                task.status = TaskStatus::Failed;
                tracing::error!(error = %failure.message, "task failed");
                TaskEvent::Error {
                    kind: failure.kind,
                    message: failure.message,
                }
            }
            Err(failure) => {
                task.status = TaskStatus::Complete;
                tracing::warn!(kind = %failure.kind, "task completed with diagnostic");
                TaskEvent::Complete {
                    content: Content::Text(failure.message),
                }
            }
        };
        let _ = tx.send(terminal);
        tracing::debug!(status = ?task.status, "task finished");
    }
    .instrument(span);

    // The producer contributes no items; it only drives the channel to completion.
    let driver =
        futures::stream::once(producer).filter_map(|()| std::future::ready(None::<TaskEvent>));
    let events = UnboundedReceiverStream::new(rx);

    Box::pin(futures::stream::select(events, driver))
}

/// Drain a stream and return its terminal event.
pub async fn final_event(mut stream: TaskStream) -> Option<TaskEvent> {
    let mut last = None;
    while let Some(event) = stream.next().await {
        if event.is_terminal() {
            last = Some(event);
        }
    }
    last
}
