//! Per-chat worker tasks.
//!
//! Each chat has one ordered queue served by one task. A worker that sees no
//! message for [`IDLE_TIMEOUT`] closes its queue, answers what is still buffered
//! and exits. The next message for that chat starts a fresh worker, which waits
//! for its predecessor first so replies keep their order.

use alloc::sync::Arc;
use core::time::Duration;
use std::collections::HashMap;

use futures::future::BoxFuture;
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender, error::SendError},
        oneshot,
    },
    task::JoinSet,
    time,
};
use tracing::{Instrument as _, debug, info_span, warn};

use super::{TelegramApi, TelegramError, outbound, types::ForceReply};
use crate::dispatcher::{Dispatcher, InboundMessage};

/// How long a chat worker waits for another message before exiting.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Where replies go. The Bot API in production.
pub trait Outbox: Send + Sync {
    /// Sends one message that already fits the Telegram length limit.
    fn send<'out>(
        &'out self,
        chat_id: i64,
        text: &'out str,
        reply_markup: Option<ForceReply>,
    ) -> BoxFuture<'out, Result<(), TelegramError>>;
}

impl Outbox for TelegramApi {
    fn send<'out>(
        &'out self,
        chat_id: i64,
        text: &'out str,
        reply_markup: Option<ForceReply>,
    ) -> BoxFuture<'out, Result<(), TelegramError>> {
        Box::pin(async move {
            self.send_message(chat_id, text, reply_markup)
                .await
                .map(drop)
        })
    }
}

struct Shared {
    outbox: Arc<dyn Outbox>,
    dispatcher: Arc<Dispatcher>,
    idle_timeout: Duration,
}

impl Shared {
    async fn handle(&self, chat_id: i64, message: &InboundMessage) {
        let reply = self.dispatcher.dispatch(message).await;
        self.deliver(chat_id, &reply.text, reply.force_reply).await;

        if let Some(invocation) = reply.deferred
            && let Err(failure) = self.dispatcher.run_deferred(&invocation).await
        {
            self.deliver(chat_id, &failure, false).await;
        }
    }

    /// Sends `text` in as many messages as needed. Failures are logged, not retried.
    async fn deliver(&self, chat_id: i64, text: &str, force_reply: bool) {
        let chunks = outbound::split_message(text);
        let last = chunks.len().saturating_sub(1);
        for (index, chunk) in chunks.iter().enumerate() {
            let markup = (force_reply && index == last).then(ForceReply::selective);
            if let Err(e) = self.outbox.send(chat_id, chunk, markup).await {
                warn!(error = %e, "Failed to send reply");
                return;
            }
        }
    }
}

struct ChatQueue {
    sender: UnboundedSender<InboundMessage>,
    /// Resolves once the worker behind `sender` has returned.
    finished: oneshot::Receiver<()>,
}

/// One ordered queue and task per active chat.
pub(crate) struct ChatWorkers {
    shared: Arc<Shared>,
    queues: HashMap<i64, ChatQueue>,
    tasks: JoinSet<i64>,
}

impl ChatWorkers {
    pub(crate) fn new(
        outbox: Arc<dyn Outbox>,
        dispatcher: Arc<Dispatcher>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                outbox,
                dispatcher,
                idle_timeout,
            }),
            queues: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    pub(crate) fn submit(&mut self, chat_id: i64, message: InboundMessage) {
        let message = match self.queues.get(&chat_id) {
            Some(queue) => match queue.sender.send(message) {
                Ok(()) => return,
                // worker went idle or died, start a new one below
                Err(SendError(message)) => message,
            },
            None => message,
        };

        let predecessor = self.queues.remove(&chat_id).map(|queue| queue.finished);
        let (sender, receiver) = mpsc::unbounded_channel();
        // the receiver is alive, so this cannot fail
        drop(sender.send(message));
        let (done, finished) = oneshot::channel();
        self.tasks.spawn(
            chat_worker(chat_id, receiver, predecessor, done, Arc::clone(&self.shared))
                .instrument(info_span!("chat", chat_id)),
        );
        self.queues.insert(chat_id, ChatQueue { sender, finished });

        self.reap();
    }

    /// Forgets the queues of workers that have exited.
    pub(crate) fn reap(&mut self) {
        while let Some(finished) = self.tasks.try_join_next() {
            match finished {
                Ok(chat_id) => {
                    if self
                        .queues
                        .get(&chat_id)
                        .is_some_and(|queue| queue.sender.is_closed())
                    {
                        self.queues.remove(&chat_id);
                    }
                }
                Err(e) => warn!(error = %e, "Chat worker ended abnormally"),
            }
        }
    }

    /// Closes all queues and waits for the workers to empty them.
    pub(crate) async fn drain(mut self) {
        self.queues.clear();
        while let Some(finished) = self.tasks.join_next().await {
            if let Err(e) = finished {
                warn!(error = %e, "Chat worker ended abnormally");
            }
        }
    }
}

async fn chat_worker(
    chat_id: i64,
    mut queue: UnboundedReceiver<InboundMessage>,
    predecessor: Option<oneshot::Receiver<()>>,
    done: oneshot::Sender<()>,
    shared: Arc<Shared>,
) -> i64 {
    if let Some(predecessor) = predecessor {
        // the sender is dropped when the previous worker returns or panics
        drop(predecessor.await);
    }

    loop {
        let next = match time::timeout(shared.idle_timeout, queue.recv()).await {
            Ok(next) => next,
            Err(_elapsed) => {
                debug!("Chat idle, stopping worker");
                queue.close();
                queue.recv().await
            }
        };
        let Some(message) = next else { break };
        shared.handle(chat_id, &message).await;
    }

    drop(done);
    chat_id
}

#[cfg(test)]
impl ChatWorkers {
    fn active_chats(&self) -> usize {
        self.queues.len()
    }
}
