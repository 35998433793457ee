//! Non-rendering controller behind the chat widget.
//!
//! Keeps the transcript the widget draws, runs the caller's message
//! handler, and hands completed exchanges to the conversation store.

use async_trait::async_trait;
use log::{ error, info, warn };
use std::error::Error;
use std::sync::atomic::{ AtomicBool, AtomicU64, Ordering };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use std::time::Duration;

use crate::clipboard::ClipboardToast;
use crate::clock::{ Clock, SystemClock };
use crate::models::{ ChatBubble, MessageKind };
use crate::store::ConversationStore;

pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! How can I help you today?";
pub const DEFAULT_ERROR_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";
pub const DEFAULT_CLEAR_CONFIRM_TITLE: &str = "Clear Conversation";
pub const DEFAULT_CLEAR_CONFIRM_MESSAGE: &str =
    "Are you sure you want to clear the entire conversation?";

/// Produces an answer for a question, e.g. by calling a completion API.
///
/// `Ok(None)` means "no answer"; nothing is recorded.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;
}

/// Asks the user to confirm a destructive action.
pub trait ConfirmPrompt {
    fn confirm(&self, title: &str, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F where F: Fn(&str, &str) -> bool {
    fn confirm(&self, title: &str, message: &str) -> bool {
        self(title, message)
    }
}

pub type ErrorCallback = Arc<dyn Fn(&(dyn Error + Send + Sync)) + Send + Sync>;

#[derive(Clone)]
pub struct SurfaceOptions {
    pub welcome_message: String,
    pub error_message: String,
    pub clear_confirm_title: String,
    pub clear_confirm_message: String,
    /// Prepend stored history after the welcome line.
    pub restore_history: bool,
    pub on_error: Option<ErrorCallback>,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            clear_confirm_title: DEFAULT_CLEAR_CONFIRM_TITLE.to_string(),
            clear_confirm_message: DEFAULT_CLEAR_CONFIRM_MESSAGE.to_string(),
            restore_history: false,
            on_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input, or another send is still in flight.
    Ignored,
    QuotaExceeded,
    Answered(String),
    NoAnswer,
    Failed,
}

pub struct ChatSurface {
    store: Arc<ConversationStore>,
    handler: Arc<dyn MessageHandler>,
    options: SurfaceOptions,
    clock: Arc<dyn Clock>,
    toast: Option<ClipboardToast>,
    bubbles: Arc<Mutex<Vec<ChatBubble>>>,
    copy_generation: Arc<AtomicU64>,
    loading: AtomicBool,
}

impl ChatSurface {
    pub fn new(store: Arc<ConversationStore>, handler: Arc<dyn MessageHandler>, options: SurfaceOptions) -> Self {
        Self::with_clock(store, handler, options, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<ConversationStore>,
        handler: Arc<dyn MessageHandler>,
        options: SurfaceOptions,
        clock: Arc<dyn Clock>
    ) -> Self {
        let mut bubbles = vec![ChatBubble {
            id: "welcome".to_string(),
            kind: MessageKind::Bot,
            text: options.welcome_message.clone(),
            timestamp: clock.now().timestamp_millis(),
            copied: false,
        }];

        if options.restore_history {
            let mut history = store.get_display_messages();
            history.sort_by_key(|e| e.timestamp);
            bubbles.extend(history.iter().flat_map(|e| e.to_bubbles()));
        }

        Self {
            store,
            handler,
            options,
            clock,
            toast: None,
            bubbles: Arc::new(Mutex::new(bubbles)),
            copy_generation: Arc::new(AtomicU64::new(0)),
            loading: AtomicBool::new(false),
        }
    }

    /// Copy every answer to the clipboard as it arrives.
    pub fn with_auto_copy(mut self, toast: ClipboardToast) -> Self {
        self.toast = Some(toast);
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn bubbles(&self) -> Vec<ChatBubble> {
        self.lock_bubbles().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn send(&self, input: &str) -> SendOutcome {
        let question = input.trim();
        if question.is_empty() {
            return SendOutcome::Ignored;
        }
        if self.loading.swap(true, Ordering::SeqCst) {
            return SendOutcome::Ignored;
        }

        let outcome = self.send_inner(question).await;
        self.loading.store(false, Ordering::SeqCst);
        outcome
    }

    async fn send_inner(&self, question: &str) -> SendOutcome {
        if !self.store.can_send_message().await {
            info!("Send refused: daily message limit reached");
            return SendOutcome::QuotaExceeded;
        }

        self.push(ChatBubble::user(question, self.now()));

        match self.handler.handle(question).await {
            Ok(Some(answer)) if !answer.trim().is_empty() => {
                if !self.store.add_message(question, &answer).await {
                    warn!("Answer shown but not persisted");
                }
                let bubble = ChatBubble::bot(&answer, self.now());
                let bubble_id = bubble.id.clone();
                self.push(bubble);

                if let Some(toast) = &self.toast {
                    if toast.copy(&answer).await {
                        self.mark_copied(&bubble_id, toast.duration());
                    }
                }
                SendOutcome::Answered(answer)
            }
            Ok(_) => SendOutcome::NoAnswer,
            Err(e) => {
                error!("Error sending message: {}", e);
                if let Some(on_error) = &self.options.on_error {
                    on_error(&*e);
                }
                self.push(ChatBubble::bot(&self.options.error_message, self.now()));
                SendOutcome::Failed
            }
        }
    }

    /// Clears the transcript and stored history once the user confirms.
    pub async fn clear_conversation(&self, prompt: &dyn ConfirmPrompt) -> bool {
        if !prompt.confirm(&self.options.clear_confirm_title, &self.options.clear_confirm_message) {
            return false;
        }
        self.lock_bubbles().clear();
        if !self.store.clear_messages().await {
            warn!("Conversation cleared on screen but stored history could not be removed");
        }
        true
    }

    /// Copies a bot line through the clipboard notice.
    pub async fn copy_bubble(&self, id: &str) -> bool {
        let Some(toast) = &self.toast else {
            return false;
        };
        let text = {
            let bubbles = self.lock_bubbles();
            bubbles
                .iter()
                .find(|b| b.id == id && b.kind == MessageKind::Bot)
                .map(|b| b.text.clone())
        };
        let Some(text) = text else {
            return false;
        };
        if toast.copy(&text).await {
            self.mark_copied(id, toast.duration());
            return true;
        }
        false
    }

    fn push(&self, bubble: ChatBubble) {
        self.lock_bubbles().push(bubble);
    }

    /// Flags `id` as copied until `duration` passes or another line is copied.
    fn mark_copied(&self, id: &str, duration: Duration) {
        {
            let mut bubbles = self.lock_bubbles();
            for bubble in bubbles.iter_mut() {
                bubble.copied = bubble.id == id;
            }
        }

        let armed = self.copy_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = self.copy_generation.clone();
        let bubbles = self.bubbles.clone();
        let id = id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if generation.load(Ordering::SeqCst) != armed {
                return;
            }
            let mut bubbles = bubbles.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(bubble) = bubbles.iter_mut().find(|b| b.id == id) {
                bubble.copied = false;
            }
        });
    }

    fn now(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    fn lock_bubbles(&self) -> MutexGuard<'_, Vec<ChatBubble>> {
        self.bubbles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
