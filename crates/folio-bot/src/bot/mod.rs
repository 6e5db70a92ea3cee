//! Portfolio bot
//!
//! [`PortfolioBot`] routes each incoming message either to a one-shot command
//! or to the user's active dialogue, and renders the outcome as reply texts.
//!
//! # Routing
//!
//! - `/start`, `/help`, `/checkPortfolioSummary` and `/checkStock TICKER`
//!   answer immediately and leave any active dialogue untouched.
//! - `/addStock` starts (or restarts) a purchase; `/checkStock` without a
//!   ticker waits for the ticker in the next message.
//! - `/stop` cancels the active dialogue.
//! - Everything else is an answer to the active dialogue, if there is one.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio_bot::bot::PortfolioBot;
//! use folio_bot::interface::ConversationStore;
//!
//! let bot = PortfolioBot::new(gateway, ledger, Arc::new(ConversationStore::default()));
//! for reply in bot.handle(UserId(42), "/addStock").await {
//!     println!("{reply}");
//! }
//! ```

pub mod commands;

use crate::config::{BotConfig, Storage};
use crate::error::Result;
use crate::interface::{ConversationStore, Dialogue, ReplyFormatter, UserSlot};
use folio_core::{
    Advance, InMemoryLedger, Ledger, MarketDataGateway, PortfolioSummary, PurchaseConversation,
    UserId, check_stock,
};
use folio_ledger::SqliteLedger;
use folio_moex::MoexClient;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub use commands::Command;

/// Command router shared by every transport
pub struct PortfolioBot {
    gateway: Arc<dyn MarketDataGateway>,
    ledger: Arc<dyn Ledger>,
    store: Arc<ConversationStore>,
    formatter: ReplyFormatter,
}

impl PortfolioBot {
    /// Create a bot over explicit collaborators
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        ledger: Arc<dyn Ledger>,
        store: Arc<ConversationStore>,
    ) -> Self {
        Self {
            gateway,
            ledger,
            store,
            formatter: ReplyFormatter::default(),
        }
    }

    /// Wire the MOEX client, the configured ledger and a fresh conversation store
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        config.validate()?;

        let gateway: Arc<dyn MarketDataGateway> = Arc::new(MoexClient::new(&config.moex)?);
        let ledger: Arc<dyn Ledger> = match &config.storage {
            Storage::Sqlite(path) => Arc::new(SqliteLedger::open(path)?),
            Storage::Memory => {
                warn!("using in-memory ledger, holdings are lost on exit");
                Arc::new(InMemoryLedger::new())
            }
        };
        let store = Arc::new(ConversationStore::new(
            config.conversation_ttl,
            config.max_conversations,
        ));

        Ok(Self::new(gateway, ledger, store).with_formatter(ReplyFormatter::new(config.currency.clone())))
    }

    /// Use a different reply formatter (e.g. another currency label)
    pub fn with_formatter(mut self, formatter: ReplyFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Per-user dialogue store
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Reply formatter
    pub fn formatter(&self) -> &ReplyFormatter {
        &self.formatter
    }

    /// Handle one message of `user` and return the replies in sending order.
    ///
    /// Messages of the same user are serialised on the user's store slot.
    pub async fn handle(&self, user: UserId, text: &str) -> Vec<String> {
        let mut slot = match self.store.lock(user).await {
            Ok(slot) => slot,
            Err(e) => {
                error!(%user, error = %e, "conversation store unavailable");
                return vec![self.formatter.storage_unavailable()];
            }
        };

        let command = Command::parse(text);
        debug!(
            %user,
            command = command.description(),
            active = slot.is_active(),
            "routing message"
        );

        match command {
            Command::Start => self.start(user).await,
            Command::Help => vec![self.formatter.help()],
            Command::Summary => self.summary(user).await,
            Command::CheckStock {
                ticker: Some(ticker),
            } => self.lookup(&ticker).await,
            Command::CheckStock { ticker: None } => {
                slot.set(Dialogue::Lookup);
                vec![self.formatter.lookup_started()]
            }
            Command::AddStock => self.add_stock(&mut slot).await,
            Command::Stop => self.stop(&mut slot),
            Command::Unknown { name } => self.answer(&mut slot, text, Some(&name)).await,
            Command::Text(_) => self.answer(&mut slot, text, None).await,
        }
    }

    async fn start(&self, user: UserId) -> Vec<String> {
        match self.ledger.register_user(user).await {
            Ok(created) => {
                if created {
                    info!(%user, "new user");
                }
                vec![self.formatter.welcome(created)]
            }
            Err(e) => {
                warn!(%user, error = %e, "registration failed");
                vec![self.formatter.storage_unavailable()]
            }
        }
    }

    async fn summary(&self, user: UserId) -> Vec<String> {
        match self.ledger.list_holdings(user).await {
            Ok(holdings) => match PortfolioSummary::from_holdings(&holdings) {
                Ok(summary) => {
                    debug!(%user, count = summary.count, total = %summary.total_value, "portfolio summarised");
                    vec![self.formatter.summary(&summary)]
                }
                Err(e) => {
                    warn!(%user, error = %e, "portfolio cannot be valued");
                    vec![self.formatter.summary_out_of_range()]
                }
            },
            Err(e) => {
                warn!(%user, error = %e, "failed to list holdings");
                vec![self.formatter.storage_unavailable()]
            }
        }
    }

    async fn lookup(&self, input: &str) -> Vec<String> {
        let outcome = check_stock(self.gateway.as_ref(), input).await;
        vec![self.formatter.lookup(&outcome)]
    }

    async fn add_stock(&self, slot: &mut UserSlot) -> Vec<String> {
        let user = slot.user();
        if let Err(e) = self.ledger.register_user(user).await {
            warn!(%user, error = %e, "registration failed, purchase not started");
            return vec![self.formatter.storage_unavailable()];
        }

        let conversation = PurchaseConversation::start(user);
        let prompt = conversation.prompt();
        if slot.is_active() {
            debug!(%user, "replacing active dialogue with a new purchase");
        }
        slot.set(Dialogue::Purchase(conversation));

        vec![
            self.formatter.purchase_started(),
            self.formatter.purchase_prompt(&prompt),
        ]
    }

    fn stop(&self, slot: &mut UserSlot) -> Vec<String> {
        let reply = match slot.take() {
            Some(Dialogue::Purchase(_)) => self.formatter.purchase_cancelled(),
            Some(Dialogue::Lookup) => self.formatter.lookup_cancelled(),
            None => self.formatter.nothing_to_cancel(),
        };
        vec![reply]
    }

    async fn answer(&self, slot: &mut UserSlot, text: &str, unknown: Option<&str>) -> Vec<String> {
        match slot.take() {
            Some(Dialogue::Purchase(conversation)) => {
                match conversation
                    .advance(text, self.gateway.as_ref(), self.ledger.as_ref())
                    .await
                {
                    Advance::Continue {
                        conversation,
                        prompt,
                    } => {
                        slot.set(Dialogue::Purchase(conversation));
                        vec![self.formatter.purchase_prompt(&prompt)]
                    }
                    Advance::Committed(holding) => vec![self.formatter.purchase_committed(&holding)],
                    Advance::Cancelled => vec![self.formatter.purchase_cancelled()],
                }
            }
            Some(Dialogue::Lookup) => self.lookup(text).await,
            None => match unknown {
                Some(name) => vec![self.formatter.unknown_command(name)],
                None => vec![self.formatter.no_dialogue()],
            },
        }
    }
}
