//! Console front-end
//!
//! A line-based REPL that talks to the bot as one fixed user. Handy for
//! trying the purchase flow without a Telegram token.

use crate::bot::PortfolioBot;
use crate::error::Result;
use folio_core::UserId;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

const EXIT_COMMANDS: [&str; 3] = ["/exit", "/quit", "/q"];

pub struct CliBot {
    bot: Arc<PortfolioBot>,
    user: UserId,
    prompt: String,
}

impl CliBot {
    /// Create a console session acting as `user`
    pub fn new(bot: Arc<PortfolioBot>, user: UserId) -> Self {
        Self {
            bot,
            user,
            prompt: ">>> ".to_string(),
        }
    }

    /// Replace the input prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// REPL on the process's stdin/stdout
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.run(stdin, tokio::io::stdout()).await
    }

    /// Read lines from `input` until EOF or an exit command, writing replies to `output`
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(user = %self.user, "console session started");
        output
            .write_all(format!("folio: /help для списка команд, /exit для выхода\n{}", self.prompt).as_bytes())
            .await?;
        output.flush().await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if EXIT_COMMANDS.iter().any(|c| line.eq_ignore_ascii_case(c)) {
                break;
            }

            if !line.is_empty() {
                for reply in self.bot.handle(self.user, line).await {
                    output.write_all(reply.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                }
            }

            output.write_all(self.prompt.as_bytes()).await?;
            output.flush().await?;
        }

        output.write_all("\nДо свидания!\n".as_bytes()).await?;
        output.flush().await?;
        info!(user = %self.user, "console session ended");
        Ok(())
    }
}
