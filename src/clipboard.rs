use async_trait::async_trait;
use log::{ debug, error };
use std::error::Error;
use std::sync::atomic::{ AtomicBool, AtomicU64, Ordering };
use std::sync::{ Arc, Mutex };
use std::time::Duration;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(2000);

/// Where copied text goes. The platform integration lives behind this.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn set_text(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Keeps the last copied text in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn set_text(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut contents = self.contents.lock().map_err(|e| e.to_string())?;
        *contents = Some(text.to_string());
        Ok(())
    }
}

/// Copies text and raises a "copied" notice that hides itself after `duration`.
#[derive(Clone)]
pub struct ClipboardToast {
    clipboard: Arc<dyn Clipboard>,
    duration: Duration,
    visible: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl ClipboardToast {
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        Self::with_duration(clipboard, DEFAULT_TOAST_DURATION)
    }

    pub fn with_duration(clipboard: Arc<dyn Clipboard>, duration: Duration) -> Self {
        Self {
            clipboard,
            duration,
            visible: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }

    pub fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    /// Returns `false` if the clipboard refused the text; the notice stays hidden then.
    pub async fn copy(&self, text: &str) -> bool {
        if let Err(e) = self.clipboard.set_text(text).await {
            error!("Error copying to clipboard: {}", e);
            return false;
        }

        self.show();
        let armed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let visible = self.visible.clone();
        let generation = self.generation.clone();
        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // A newer copy owns the notice now.
            if generation.load(Ordering::SeqCst) == armed {
                visible.store(false, Ordering::SeqCst);
                debug!("Clipboard notice hidden");
            }
        });
        true
    }
}
