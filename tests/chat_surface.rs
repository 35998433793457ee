mod common;

use ai_chat_store::chat::{ ChatSurface, MessageHandler, SendOutcome, SurfaceOptions };
use ai_chat_store::clipboard::{ ClipboardToast, MemoryClipboard };
use ai_chat_store::config::{ MessageLimits, StoreConfig };
use ai_chat_store::storage::MemoryBackend;
use ai_chat_store::{ ConversationStore, MessageKind };
use async_trait::async_trait;
use chrono::Duration;
use common::noon_clock;
use std::error::Error;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::Arc;

struct Scripted {
    calls: AtomicUsize,
}

#[async_trait]
impl MessageHandler for Scripted {
    async fn handle(&self, message: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match message {
            "fail" => Err("completion service unavailable".into()),
            "silence" => Ok(None),
            other => Ok(Some(format!("You said {}", other))),
        }
    }
}

fn handler() -> Arc<Scripted> {
    Arc::new(Scripted { calls: AtomicUsize::new(0) })
}

async fn store_with_limit(max_daily: u32) -> Arc<ConversationStore> {
    let config = StoreConfig::default().with_limits(MessageLimits {
        max_daily_messages: max_daily,
        max_history_items: 10,
    });
    Arc::new(ConversationStore::open_with_clock(config, Arc::new(MemoryBackend::new()), noon_clock()).await)
}

#[tokio::test]
async fn handler_error_shows_apology_and_reports_it() {
    let reported = Arc::new(AtomicUsize::new(0));
    let seen = reported.clone();
    let options = SurfaceOptions {
        on_error: Some(
            Arc::new(move |_e: &(dyn Error + Send + Sync)| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
        ),
        ..SurfaceOptions::default()
    };
    let surface = ChatSurface::new(store_with_limit(5).await, handler(), options);

    assert_eq!(surface.send("fail").await, SendOutcome::Failed);
    assert_eq!(reported.load(Ordering::SeqCst), 1);

    let last = surface.bubbles().pop().unwrap();
    assert_eq!(last.kind, MessageKind::Bot);
    assert!(last.text.starts_with("Sorry, there was an error"));
    assert!(surface.store().messages().is_empty());
}

#[tokio::test]
async fn no_answer_records_nothing_but_spends_quota() {
    let surface = ChatSurface::new(store_with_limit(5).await, handler(), SurfaceOptions::default());

    assert_eq!(surface.send("silence").await, SendOutcome::NoAnswer);
    assert!(surface.store().messages().is_empty());
    assert_eq!(surface.store().quota_used(), 1);
    assert_eq!(surface.bubbles().last().unwrap().kind, MessageKind::User);
}

#[tokio::test]
async fn quota_exhaustion_stops_before_the_handler_runs() {
    let handler = handler();
    let surface = ChatSurface::new(store_with_limit(1).await, handler.clone(), SurfaceOptions::default());

    assert!(matches!(surface.send("one").await, SendOutcome::Answered(_)));
    let shown_before = surface.bubbles().len();

    assert_eq!(surface.send("two").await, SendOutcome::QuotaExceeded);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    assert_eq!(surface.bubbles().len(), shown_before);
}

#[tokio::test]
async fn restores_history_oldest_first_after_welcome() {
    let clock = noon_clock();
    let store = Arc::new(
        ConversationStore::open_with_clock(StoreConfig::default(), Arc::new(MemoryBackend::new()), clock.clone()).await
    );
    store.add_message("first", "1").await;
    clock.advance(Duration::seconds(5));
    store.add_message("second", "2").await;

    let options = SurfaceOptions { restore_history: true, ..SurfaceOptions::default() };
    let surface = ChatSurface::new(store, handler(), options);

    let texts: Vec<String> = surface
        .bubbles()
        .into_iter()
        .map(|b| b.text)
        .collect();
    assert_eq!(texts, vec!["Hello! How can I help you today?", "first", "1", "second", "2"]);
}

#[tokio::test]
async fn auto_copy_puts_answer_on_clipboard_and_marks_bubble() {
    let clipboard = Arc::new(MemoryClipboard::new());
    let toast = ClipboardToast::new(clipboard.clone());
    let surface = ChatSurface::new(store_with_limit(5).await, handler(), SurfaceOptions::default())
        .with_auto_copy(toast.clone());

    surface.send("ping").await;

    assert_eq!(clipboard.contents().as_deref(), Some("You said ping"));
    assert!(toast.is_visible());
    let answer = surface.bubbles().pop().unwrap();
    assert!(answer.copied);

    let welcome_id = surface.bubbles()[0].id.clone();
    assert!(surface.copy_bubble(&welcome_id).await);
    assert_eq!(clipboard.contents().as_deref(), Some("Hello! How can I help you today?"));

    let question_id = surface.bubbles()[1].id.clone();
    assert!(!surface.copy_bubble(&question_id).await);
}
