//! Command parsing for the portfolio bot
//!
//! Commands are case-insensitive and may carry a `@botname` suffix, as sent by
//! Telegram group chats (`/addStock@folio_bot`).

/// Parsed user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register and greet
    Start,
    /// Show help
    Help,
    /// Ticker lookup; without an argument the ticker is asked for
    CheckStock { ticker: Option<String> },
    /// Start recording a purchase
    AddStock,
    /// Portfolio count and value
    Summary,
    /// Cancel the active dialogue
    Stop,
    /// Slash command this bot does not know
    Unknown { name: String },
    /// Anything that is not a command
    Text(String),
}

impl Command {
    /// Parse a message. Never fails: unknown commands and plain text are
    /// variants, since an active dialogue may want them as answers.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        let Some(body) = input.strip_prefix('/') else {
            return Command::Text(input.to_string());
        };

        let mut parts = body.split_whitespace();
        let Some(head) = parts.next() else {
            return Command::Unknown {
                name: String::new(),
            };
        };
        let name = head
            .split_once('@')
            .map_or(head, |(name, _)| name)
            .to_lowercase();
        let arg = parts.next().map(str::to_string);
        let extra = parts.next().is_some();

        match name.as_str() {
            "start" => Command::Start,
            "help" | "h" | "?" => Command::Help,
            "checkstock" | "check" if !extra => Command::CheckStock { ticker: arg },
            "addstock" | "add" => Command::AddStock,
            "checkportfoliosummary" | "summary" | "portfolio" => Command::Summary,
            "stop" if arg.is_none() => Command::Stop,
            _ => Command::Unknown { name },
        }
    }

    /// Get help text for all commands
    pub fn help_text() -> &'static str {
        "\
Команды:
/start - регистрация
/checkStock [ТИКЕР] - проверить ценную бумагу на Московской бирже
/addStock - добавить приобретенную ценную бумагу
/checkPortfolioSummary - сводка по портфелю
/stop - отменить текущее действие
/help - эта справка

Сокращения: /check = /checkStock, /add = /addStock, /summary = /checkPortfolioSummary"
    }

    /// Get a short description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Command::Start => "Register",
            Command::Help => "Show help",
            Command::CheckStock { .. } => "Ticker lookup",
            Command::AddStock => "Record a purchase",
            Command::Summary => "Portfolio summary",
            Command::Stop => "Cancel dialogue",
            Command::Unknown { .. } => "Unknown command",
            Command::Text(_) => "Plain text",
        }
    }
}
