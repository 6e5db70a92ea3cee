//! Per-user ordering through the dispatcher

mod common;

use async_trait::async_trait;
use common::{StaticGateway, bot_with, harness};
use folio_bot::Dispatcher;
use folio_bot::interface::{ChatId, ChatTransport, IncomingMessage};
use folio_core::{InMemoryLedger, Ledger, MarketDataGateway, Quote, Ticker, UserId};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(ChatId, String)>>,
}

impl RecordingTransport {
    fn replies_to(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == chat)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, chat: ChatId, text: &str) -> folio_bot::Result<()> {
        self.sent.lock().unwrap().push((chat, text.to_string()));
        Ok(())
    }
}

/// Exchange that takes a while to answer
struct SlowGateway {
    inner: StaticGateway,
    delay: Duration,
}

#[async_trait]
impl MarketDataGateway for SlowGateway {
    async fn exists(&self, ticker: &Ticker) -> folio_core::Result<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner.exists(ticker).await
    }

    async fn quote(&self, ticker: &Ticker) -> folio_core::Result<Option<Quote>> {
        self.inner.quote(ticker).await
    }
}

#[tokio::test]
async fn messages_of_a_user_are_handled_in_order() {
    let h = harness();
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Dispatcher::new(h.bot.clone(), transport.clone(), Duration::from_secs(60));

    let alice = UserId(1);
    let bob = UserId(2);
    let script = [
        (alice, "/addStock"),
        (bob, "/addStock"),
        (alice, "SBER"),
        (bob, "GAZP"),
        (alice, "100"),
        (bob, "200"),
        (alice, "3"),
        (bob, "/stop"),
    ];
    for (user, text) in script {
        dispatcher.dispatch(IncomingMessage::private(user, text)).unwrap();
    }
    assert_eq!(dispatcher.active(), 2);

    dispatcher.shutdown().await;
    assert_eq!(dispatcher.active(), 0);

    let alice_replies = transport.replies_to(ChatId(1));
    assert_eq!(alice_replies.len(), 5);
    assert_eq!(alice_replies[2], "Введите стоимость единицы ценной бумаги SBER");
    assert!(alice_replies[4].starts_with("Информация о приобретенной ценной бумаге успешно сохранена!"));

    let bob_replies = transport.replies_to(ChatId(2));
    assert_eq!(
        bob_replies.last().map(String::as_str),
        Some("Добавление информации о приобретенной ценной бумаге отменено")
    );

    assert_eq!(h.ledger.list_holdings(alice).await.unwrap().len(), 1);
    assert!(h.ledger.list_holdings(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn idle_mailboxes_are_closed() {
    let h = harness();
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Dispatcher::new(h.bot.clone(), transport.clone(), Duration::from_millis(10));

    dispatcher
        .dispatch(IncomingMessage::private(UserId(1), "/help"))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    dispatcher
        .dispatch(IncomingMessage::private(UserId(2), "/help"))
        .unwrap();
    assert_eq!(dispatcher.active(), 1);

    dispatcher.shutdown().await;
    assert_eq!(transport.replies_to(ChatId(1)).len(), 1);
    assert_eq!(transport.replies_to(ChatId(2)).len(), 1);
}

#[tokio::test]
async fn replies_go_to_the_originating_chat() {
    let h = harness();
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Dispatcher::new(h.bot.clone(), transport.clone(), Duration::from_secs(60));

    dispatcher
        .dispatch(IncomingMessage::new(UserId(5), ChatId(-1001), "/checkStock SBER"))
        .unwrap();
    dispatcher.shutdown().await;

    let replies = transport.replies_to(ChatId(-1001));
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("285.5 RUB"));
    assert!(transport.replies_to(ChatId(5)).is_empty());
}

#[tokio::test]
async fn backlog_older_than_idle_period_keeps_its_order() {
    let gateway = Arc::new(SlowGateway {
        inner: StaticGateway::new(),
        delay: Duration::from_millis(300),
    });
    let bot = Arc::new(bot_with(gateway, Arc::new(InMemoryLedger::new())));
    let transport = Arc::new(RecordingTransport::default());
    let dispatcher = Dispatcher::new(bot, transport.clone(), Duration::from_millis(50));

    let user = UserId(9);
    dispatcher
        .dispatch(IncomingMessage::private(user, "/checkStock SBER"))
        .unwrap();
    dispatcher
        .dispatch(IncomingMessage::private(user, "/summary"))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    dispatcher.dispatch(IncomingMessage::private(user, "/stop")).unwrap();
    assert_eq!(dispatcher.active(), 1);

    dispatcher.shutdown().await;

    let replies = transport.replies_to(ChatId(9));
    assert_eq!(replies.len(), 3);
    assert!(replies[0].contains("285.5 RUB"));
    assert!(replies[1].starts_with("Вы приобрели 0 раз"));
    assert_eq!(replies[2], "Нет активного действия для отмены");
}
