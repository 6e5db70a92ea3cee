//! The "add a purchased security" conversation
//!
//! A purchase is collected in three steps, ticker → unit price → quantity.
//! Each step validates its answer; a rejected answer re-prompts in the same
//! step and keeps everything collected so far. The conversation ends either
//! by committing exactly one [`Holding`] to the ledger or by `/stop`.
//!
//! The state is a plain value: [`PurchaseConversation::advance`] consumes it
//! and hands back the next state (or a terminal outcome), so the caller owns
//! storage and serialisation of per-user state.

use crate::gateway::MarketDataGateway;
use crate::ledger::Ledger;
use crate::models::{Holding, Ticker, UserId};
use crate::validate::{is_stop, parse_price, parse_quantity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Step of the purchase flow together with the fields collected so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseStep {
    AwaitingTicker,
    AwaitingPrice { ticker: Ticker },
    AwaitingQuantity { ticker: Ticker, unit_price: Decimal },
}

/// What the user should be told after a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchasePrompt {
    /// Ask for the ticker of the purchased security
    AskTicker,
    /// Ticker accepted, ask for the unit price
    AskPrice { ticker: Ticker },
    /// Price accepted, ask for the quantity
    AskQuantity { ticker: Ticker, unit_price: Decimal },
    /// Ticker is malformed or not listed on the exchange
    TickerNotFound { input: String },
    /// The exchange could not be asked; the same ticker may be retried
    MarketDataUnavailable { ticker: Ticker },
    InvalidPrice,
    InvalidQuantity,
    /// The holding could not be saved; re-sending the quantity retries the commit
    CommitFailed,
}

/// Result of feeding one message into a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Flow continues in `conversation`
    Continue {
        conversation: PurchaseConversation,
        prompt: PurchasePrompt,
    },
    /// Holding written; the conversation is over
    Committed(Holding),
    /// `/stop` received; nothing was written
    Cancelled,
}

/// In-progress purchase of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseConversation {
    owner: UserId,
    step: PurchaseStep,
    started_at: DateTime<Utc>,
}

impl PurchaseConversation {
    /// Start a new purchase in [`PurchaseStep::AwaitingTicker`]
    pub fn start(owner: UserId) -> Self {
        Self {
            owner,
            step: PurchaseStep::AwaitingTicker,
            started_at: Utc::now(),
        }
    }

    /// User the purchase is recorded for
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Current step with the fields collected so far
    pub fn step(&self) -> &PurchaseStep {
        &self.step
    }

    /// When the conversation was started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Prompt that asks for the answer the current step expects
    pub fn prompt(&self) -> PurchasePrompt {
        match &self.step {
            PurchaseStep::AwaitingTicker => PurchasePrompt::AskTicker,
            PurchaseStep::AwaitingPrice { ticker } => PurchasePrompt::AskPrice {
                ticker: ticker.clone(),
            },
            PurchaseStep::AwaitingQuantity { ticker, unit_price } => PurchasePrompt::AskQuantity {
                ticker: ticker.clone(),
                unit_price: *unit_price,
            },
        }
    }

    /// Feed one message of the user into the conversation
    pub async fn advance(
        self,
        input: &str,
        gateway: &dyn MarketDataGateway,
        ledger: &dyn Ledger,
    ) -> Advance {
        if is_stop(input) {
            debug!(user = %self.owner, step = ?self.step, "purchase cancelled");
            return Advance::Cancelled;
        }

        match self.step.clone() {
            PurchaseStep::AwaitingTicker => self.accept_ticker(input, gateway).await,
            PurchaseStep::AwaitingPrice { ticker } => match parse_price(input) {
                Some(unit_price) => self.move_to(
                    PurchaseStep::AwaitingQuantity {
                        ticker: ticker.clone(),
                        unit_price,
                    },
                    PurchasePrompt::AskQuantity { ticker, unit_price },
                ),
                None => self.stay(PurchasePrompt::InvalidPrice),
            },
            PurchaseStep::AwaitingQuantity { ticker, unit_price } => match parse_quantity(input) {
                Some(quantity) => self.commit(ticker, unit_price, quantity, ledger).await,
                None => self.stay(PurchasePrompt::InvalidQuantity),
            },
        }
    }

    async fn accept_ticker(self, input: &str, gateway: &dyn MarketDataGateway) -> Advance {
        let Ok(ticker) = Ticker::parse(input) else {
            return self.stay(PurchasePrompt::TickerNotFound {
                input: input.trim().to_uppercase(),
            });
        };

        match gateway.exists(&ticker).await {
            Ok(true) => self.move_to(
                PurchaseStep::AwaitingPrice {
                    ticker: ticker.clone(),
                },
                PurchasePrompt::AskPrice { ticker },
            ),
            Ok(false) => self.stay(PurchasePrompt::TickerNotFound {
                input: ticker.to_string(),
            }),
            Err(e) => {
                warn!(user = %self.owner, %ticker, error = %e, "ticker lookup failed");
                self.stay(PurchasePrompt::MarketDataUnavailable { ticker })
            }
        }
    }

    async fn commit(
        self,
        ticker: Ticker,
        unit_price: Decimal,
        quantity: u32,
        ledger: &dyn Ledger,
    ) -> Advance {
        let purchased_at = Utc::now().max(self.started_at);
        let holding = Holding::new(self.owner, ticker, quantity, unit_price, purchased_at);
        if holding.cost().is_none() {
            debug!(user = %self.owner, quantity, %unit_price, "purchase cost out of range");
            return self.stay(PurchasePrompt::InvalidQuantity);
        }

        match ledger.add_holding(&holding).await {
            Ok(()) => {
                info!(
                    user = %holding.owner_id,
                    ticker = %holding.ticker,
                    quantity = holding.quantity,
                    unit_price = %holding.unit_price,
                    "holding recorded"
                );
                Advance::Committed(holding)
            }
            Err(e) => {
                warn!(user = %self.owner, error = %e, "failed to record holding, keeping conversation");
                self.stay(PurchasePrompt::CommitFailed)
            }
        }
    }

    fn move_to(mut self, step: PurchaseStep, prompt: PurchasePrompt) -> Advance {
        self.step = step;
        Advance::Continue {
            conversation: self,
            prompt,
        }
    }

    fn stay(self, prompt: PurchasePrompt) -> Advance {
        Advance::Continue {
            conversation: self,
            prompt,
        }
    }
}
