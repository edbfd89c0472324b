use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::TelegramClient;
use crate::models::{Appointment, TelegramConfig};

#[derive(Debug, Clone)]
pub enum Event {
    Booked(Appointment),
    Cancelled(Appointment),
}

impl Event {
    pub fn message(&self) -> String {
        match self {
            Event::Booked(a) => {
                let mut msg = format!(
                    "Nuova prenotazione: {} ({}) - {} il {} alle {}",
                    a.client, a.phone, a.service, a.date, a.time
                );
                if let Some(note) = a.note.as_deref().filter(|n| !n.is_empty()) {
                    msg.push_str(&format!("\nNote: {note}"));
                }
                msg
            }
            Event::Cancelled(a) => format!(
                "Appuntamento cancellato: {} - {} il {} alle {}",
                a.client, a.service, a.date, a.time
            ),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &Event) -> Result<()>;
}

/// Used when no Telegram bot is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &Event) -> Result<()> {
        info!("Notification: {}", event.message());
        Ok(())
    }
}

pub struct TelegramNotifier {
    client: TelegramClient,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, event: &Event) -> Result<()> {
        self.client.send_message(&event.message()).await
    }
}

pub fn from_config(cfg: Option<&TelegramConfig>) -> Result<Arc<dyn Notifier>> {
    match cfg {
        Some(t) => {
            info!("Notifications: Telegram chat {}", t.chat_id);
            Ok(Arc::new(TelegramNotifier::new(TelegramClient::new(
                &t.bot_token,
                &t.chat_id,
            )?)))
        }
        None => {
            info!("Notifications: Telegram not configured, logging only");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Fire-and-forget: the caller never waits for delivery, and a failure is
/// only logged.
pub fn dispatch(notifier: Arc<dyn Notifier>, event: Event) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&event).await {
            warn!("Notification failed: {:#}", e);
        }
    })
}
