//! Console session against an in-memory ledger

mod common;

use common::harness;
use folio_bot::platforms::CliBot;
use folio_core::{Ledger, UserId};

#[tokio::test]
async fn repl_records_a_purchase() {
    let h = harness();
    let cli = CliBot::new(h.bot.clone(), UserId(1)).with_prompt("> ");

    let input: &[u8] = "/addStock\nsber\n\n100\n5\n/summary\n/exit\n/addStock\n".as_bytes();
    let mut output = Vec::new();
    cli.run(input, &mut output).await.unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("Приступим к добавлению ценной бумаги"));
    assert!(output.contains("Вы приобрели 1 раз, на общую сумму 500 RUB"));
    assert!(output.trim_end().ends_with("До свидания!"));

    // Input after /exit is not processed
    assert_eq!(output.matches("Приступим").count(), 1);
    assert_eq!(h.ledger.list_holdings(UserId(1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn repl_stops_at_eof() {
    let h = harness();
    let cli = CliBot::new(h.bot.clone(), UserId(1));

    let mut output = Vec::new();
    cli.run(&b"/help\n"[..], &mut output).await.unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("/checkPortfolioSummary"));
    assert!(output.contains("До свидания!"));
}
