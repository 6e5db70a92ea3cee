//! User-facing reply texts
//!
//! Replies are plain text (no parse mode) so tickers and prices never need
//! escaping on any platform.

use crate::bot::Command;
use folio_core::{Decimal, Holding, LookupOutcome, PortfolioSummary, PurchasePrompt};
use std::fmt::Write;

/// Renders bot replies with a fixed currency label for portfolio values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFormatter {
    currency: String,
}

impl Default for ReplyFormatter {
    fn default() -> Self {
        Self::new("RUB")
    }
}

impl ReplyFormatter {
    /// Formatter labelling portfolio values with `currency`
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// Currency label used for portfolio values
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Reply to `/start`
    pub fn welcome(&self, newly_registered: bool) -> String {
        if newly_registered {
            "Добро пожаловать! Список команд: /help".to_string()
        } else {
            "С возвращением! Список команд: /help".to_string()
        }
    }

    /// Command list
    pub fn help(&self) -> String {
        Command::help_text().to_string()
    }

    pub fn purchase_started(&self) -> String {
        "Приступим к добавлению ценной бумаги".to_string()
    }

    /// Text for a step of the purchase conversation
    pub fn purchase_prompt(&self, prompt: &PurchasePrompt) -> String {
        match prompt {
            PurchasePrompt::AskTicker => "Введите идентификатор приобретенного инструмента".to_string(),
            PurchasePrompt::AskPrice { ticker } => {
                format!("Введите стоимость единицы ценной бумаги {ticker}")
            }
            PurchasePrompt::AskQuantity { .. } => {
                "Введите количество приобретенных единиц инструмента".to_string()
            }
            PurchasePrompt::TickerNotFound { input } => format!(
                "Указанный идентификатор ценной бумаги {input} не найден на Московской бирже.\n\
                 Введите корректный идентификатор приобретенного инструмента или введите /stop для отмены"
            ),
            PurchasePrompt::MarketDataUnavailable { ticker } => format!(
                "Не удалось получить данные Московской биржи для {ticker}.\n\
                 Повторите ввод идентификатора позже или введите /stop для отмены"
            ),
            PurchasePrompt::InvalidPrice => "Вы некорректно указали стоимость одной ценной бумаги.\n\
                 Введите стоимость приобретения в числовом формате или введите /stop для отмены"
                .to_string(),
            PurchasePrompt::InvalidQuantity => {
                "Вы некорректно указали количество приобретенных единиц ценной бумаги.\n\
                 Введите количество в виде целого положительного числа или введите /stop для отмены"
                    .to_string()
            }
            PurchasePrompt::CommitFailed => "Не удалось сохранить информацию о покупке.\n\
                 Отправьте количество ещё раз или введите /stop для отмены"
                .to_string(),
        }
    }

    /// Confirmation of a saved purchase
    pub fn purchase_committed(&self, holding: &Holding) -> String {
        let mut text = format!(
            "Информация о приобретенной ценной бумаге успешно сохранена!\n{}: {} × {}",
            holding.ticker,
            holding.quantity,
            holding.unit_price.normalize(),
        );
        if let Some(cost) = holding.cost() {
            let _ = write!(text, " = {}", amount(cost));
        }
        text
    }

    pub fn purchase_cancelled(&self) -> String {
        "Добавление информации о приобретенной ценной бумаге отменено".to_string()
    }

    pub fn lookup_started(&self) -> String {
        "Введите идентификатор ценной бумаги".to_string()
    }

    pub fn lookup_cancelled(&self) -> String {
        "Проверка ценной бумаги отменена".to_string()
    }

    pub fn nothing_to_cancel(&self) -> String {
        "Нет активного действия для отмены".to_string()
    }

    /// Result of a ticker lookup
    pub fn lookup(&self, outcome: &LookupOutcome) -> String {
        match outcome {
            LookupOutcome::Found(quote) => format!(
                "Ценная бумага с идентификатором {} существует на Московской бирже. Текущий курс: {quote}",
                quote.ticker
            ),
            LookupOutcome::ListedWithoutQuote(ticker) => format!(
                "Ценная бумага с идентификатором {ticker} существует на Московской бирже, но её курс сейчас недоступен."
            ),
            LookupOutcome::NotFound(ticker) => {
                format!("Ценная бумага с идентификатором {ticker} не найдена на Московской бирже.")
            }
            LookupOutcome::Unavailable(ticker) => format!(
                "Не удалось получить данные Московской биржи для {ticker}. Попробуйте позже."
            ),
            LookupOutcome::Invalid(input) => {
                format!("«{input}» не похоже на идентификатор ценной бумаги.")
            }
        }
    }

    /// Portfolio summary with a per-ticker breakdown
    pub fn summary(&self, summary: &PortfolioSummary) -> String {
        let mut text = format!(
            "Вы приобрели {} раз, на общую сумму {} {}",
            summary.count,
            amount(summary.total_value),
            self.currency
        );

        for (ticker, position) in &summary.positions {
            let _ = write!(
                text,
                "\n{ticker}: {} шт. на {} {} (покупок: {}",
                position.quantity,
                amount(position.cost),
                self.currency,
                position.purchases
            );
            if let Some(average) = position.average_price() {
                let _ = write!(text, ", средняя цена {} {}", amount(average), self.currency);
            }
            text.push(')');
        }

        text
    }

    /// Holdings whose total leaves the representable range
    pub fn summary_out_of_range(&self) -> String {
        "Стоимость портфеля слишком велика для подсчёта. Проверьте внесённые покупки.".to_string()
    }

    /// Ledger could not be reached
    pub fn storage_unavailable(&self) -> String {
        "Хранилище временно недоступно. Попробуйте позже.".to_string()
    }

    /// Reply to a command the bot does not know
    pub fn unknown_command(&self, name: &str) -> String {
        format!("Неизвестная команда /{name}. Список команд: /help")
    }

    /// Hint for free text outside a dialogue
    pub fn no_dialogue(&self) -> String {
        "Чтобы начать, выберите команду. Список команд: /help".to_string()
    }
}

fn amount(value: Decimal) -> Decimal {
    value.normalize()
}
