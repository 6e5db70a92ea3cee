//! Per-user mailboxes
//!
//! Every user gets an unbounded channel drained by a dedicated task, so a
//! user's messages are handled one at a time in arrival order while different
//! users proceed in parallel. A mailbox that has been quiet for the idle
//! period and has nothing left to handle is closed, so at most one task ever
//! drains a user's messages.

use crate::bot::PortfolioBot;
use crate::error::{BotError, Result};
use crate::interface::{ChatTransport, IncomingMessage};
use folio_core::UserId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

struct Mailbox {
    sender: mpsc::UnboundedSender<IncomingMessage>,
    worker: JoinHandle<()>,
    last_used: Instant,
    /// Messages queued or in progress
    pending: Arc<AtomicUsize>,
}

impl Mailbox {
    fn send(&mut self, message: IncomingMessage) -> std::result::Result<(), IncomingMessage> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        match self.sender.send(message) {
            Ok(()) => {
                self.last_used = Instant::now();
                Ok(())
            }
            Err(mpsc::error::SendError(message)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Err(message)
            }
        }
    }

    fn is_idle(&self, idle_after: Duration) -> bool {
        self.pending.load(Ordering::SeqCst) == 0 && self.last_used.elapsed() > idle_after
    }
}

/// Routes incoming messages to per-user workers
pub struct Dispatcher {
    bot: Arc<PortfolioBot>,
    transport: Arc<dyn ChatTransport>,
    mailboxes: Mutex<HashMap<UserId, Mailbox>>,
    idle_after: Duration,
}

impl Dispatcher {
    /// Create a dispatcher that closes mailboxes quiet for `idle_after`
    pub fn new(bot: Arc<PortfolioBot>, transport: Arc<dyn ChatTransport>, idle_after: Duration) -> Self {
        Self {
            bot,
            transport,
            mailboxes: Mutex::new(HashMap::new()),
            idle_after,
        }
    }

    /// Queue a message for its user's worker
    pub fn dispatch(&self, message: IncomingMessage) -> Result<()> {
        let mut mailboxes = self.lock()?;
        self.close_idle(&mut mailboxes);

        let user = message.user;
        let message = match mailboxes.get_mut(&user) {
            Some(mailbox) => match mailbox.send(message) {
                Ok(()) => return Ok(()),
                // Worker is gone; start a fresh one with the same message
                Err(message) => {
                    warn!(%user, "mailbox worker stopped unexpectedly, restarting");
                    message
                }
            },
            None => message,
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = tokio::spawn(run_mailbox(
            user,
            receiver,
            Arc::clone(&pending),
            Arc::clone(&self.bot),
            Arc::clone(&self.transport),
        ));
        debug!(%user, "mailbox opened");

        let mut mailbox = Mailbox {
            sender,
            worker,
            last_used: Instant::now(),
            pending,
        };
        mailbox
            .send(message)
            .map_err(|_| BotError::Other("mailbox closed before first message".to_string()))?;
        mailboxes.insert(user, mailbox);
        Ok(())
    }

    /// Number of open mailboxes
    pub fn active(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or_default()
    }

    /// Close every mailbox and wait until all queued messages are handled
    pub async fn shutdown(&self) {
        let workers: Vec<JoinHandle<()>> = match self.lock() {
            Ok(mut mailboxes) => mailboxes.drain().map(|(_, mailbox)| mailbox.worker).collect(),
            Err(_) => return,
        };

        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "mailbox worker failed");
            }
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<UserId, Mailbox>>> {
        self.mailboxes
            .lock()
            .map_err(|e| BotError::Other(format!("dispatcher lock poisoned: {e}")))
    }

    fn close_idle(&self, mailboxes: &mut HashMap<UserId, Mailbox>) {
        let idle_after = self.idle_after;
        mailboxes.retain(|user, mailbox| {
            let keep = !mailbox.worker.is_finished() && !mailbox.is_idle(idle_after);
            if !keep {
                debug!(%user, "mailbox closed");
            }
            keep
        });
    }
}

async fn run_mailbox(
    user: UserId,
    mut receiver: mpsc::UnboundedReceiver<IncomingMessage>,
    pending: Arc<AtomicUsize>,
    bot: Arc<PortfolioBot>,
    transport: Arc<dyn ChatTransport>,
) {
    while let Some(message) = receiver.recv().await {
        for reply in bot.handle(user, &message.text).await {
            if let Err(e) = transport.send(message.chat, &reply).await {
                warn!(%user, chat = %message.chat, error = %e, "failed to deliver reply");
            }
        }
        pending.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(%user, "mailbox drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{ChatId, ConversationStore, MockChatTransport};
    use folio_core::{InMemoryLedger, MarketDataGateway, Quote, Ticker};

    struct NoMarket;

    #[async_trait::async_trait]
    impl MarketDataGateway for NoMarket {
        async fn exists(&self, _: &Ticker) -> folio_core::Result<bool> {
            Ok(false)
        }

        async fn quote(&self, _: &Ticker) -> folio_core::Result<Option<Quote>> {
            Ok(None)
        }
    }

    fn bot() -> Arc<PortfolioBot> {
        Arc::new(PortfolioBot::new(
            Arc::new(NoMarket),
            Arc::new(InMemoryLedger::new()),
            Arc::new(ConversationStore::default()),
        ))
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_worker() {
        let mut transport = MockChatTransport::new();
        let mut calls = 0;
        transport.expect_send().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(BotError::Other("chat not found".to_string()))
            } else {
                Ok(())
            }
        });

        let dispatcher = Dispatcher::new(bot(), Arc::new(transport), Duration::from_secs(60));
        dispatcher
            .dispatch(IncomingMessage::new(UserId(1), ChatId(1), "/help"))
            .unwrap();
        dispatcher
            .dispatch(IncomingMessage::new(UserId(1), ChatId(1), "/help"))
            .unwrap();
        assert_eq!(dispatcher.active(), 1);

        dispatcher.shutdown().await;
    }
}
