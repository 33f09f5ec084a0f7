use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::config::BotConfig;
use crate::llm::FallbackResponder;
use crate::models::Session;
use crate::outbox::Outbox;

/// Хранилище сессий по chat id.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get(&self, chat_id: ChatId) -> Option<Session>;
    async fn put(&self, chat_id: ChatId, session: Session);
    async fn delete(&self, chat_id: ChatId) -> Option<Session>;
}

/// Сессии в памяти процесса, без вытеснения.
#[derive(Clone, Default)]
pub struct InMemorySessions {
    sessions: Arc<RwLock<HashMap<ChatId, Session>>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessions {
    async fn get(&self, chat_id: ChatId) -> Option<Session> {
        self.sessions.read().await.get(&chat_id).cloned()
    }

    async fn put(&self, chat_id: ChatId, session: Session) {
        self.sessions.write().await.insert(chat_id, session);
    }

    async fn delete(&self, chat_id: ChatId) -> Option<Session> {
        self.sessions.write().await.remove(&chat_id)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RelaySettings {
    pub operator_chat: ChatId,
    pub session_length: chrono::Duration,
    pub fallback_delay: Duration,
}

impl From<&BotConfig> for RelaySettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            operator_chat: config.operator_chat,
            session_length: config.session_length,
            fallback_delay: config.fallback_delay,
        }
    }
}

type UserLocks = Arc<Mutex<HashMap<ChatId, Arc<Mutex<()>>>>>;

#[derive(Clone)]
pub struct BotState {
    sessions: Arc<dyn SessionRepository>,
    outbox: Arc<dyn Outbox>,
    responder: Arc<dyn FallbackResponder>,
    settings: RelaySettings,
    user_locks: UserLocks,
    tickets: Arc<AtomicU64>,
}

impl BotState {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        outbox: Arc<dyn Outbox>,
        responder: Arc<dyn FallbackResponder>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            sessions,
            outbox,
            responder,
            settings,
            user_locks: Arc::new(Mutex::new(HashMap::new())),
            tickets: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn sessions(&self) -> &dyn SessionRepository {
        self.sessions.as_ref()
    }

    pub fn outbox(&self) -> &dyn Outbox {
        self.outbox.as_ref()
    }

    pub fn responder(&self) -> &dyn FallbackResponder {
        self.responder.as_ref()
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    pub fn is_operator(&self, chat_id: ChatId) -> bool {
        chat_id == self.settings.operator_chat
    }

    pub fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::Relaxed)
    }

    /// Все изменения сессии пользователя идут под этим замком.
    pub async fn lock_user(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.user_locks.lock().await;
            // Замки, которые никто не держит, больше не нужны
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(chat_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub async fn is_subscribed(&self, chat_id: ChatId) -> bool {
        self.sessions
            .get(chat_id)
            .await
            .is_some_and(|session| session.subscribed)
    }

    /// Успешная оплата: новая сессия поверх старой, старый таймер снимается.
    pub async fn activate_session(&self, chat_id: ChatId, now: DateTime<Utc>) {
        let _guard = self.lock_user(chat_id).await;

        let mut session = Session::paid(now);
        if let Some(mut previous) = self.sessions.get(chat_id).await {
            if previous.cancel_fallback() {
                log::info!("Cancelled pending fallback for {} on re-payment", chat_id);
            }
            // Уже запрошенный у модели ответ всё равно доставляется
            session.reply_in_flight = previous.reply_in_flight;
        }

        self.sessions.put(chat_id, session).await;
        log::info!("Session activated for {} at {}", chat_id, now);
    }
}
