use chrono::{DateTime, Duration, Utc};
use tokio::task::AbortHandle;

/// Отложенный автоответ, взведённый для пользователя.
#[derive(Debug, Clone)]
pub struct FallbackTimer {
    pub ticket: u64,
    handle: AbortHandle,
}

impl FallbackTimer {
    pub fn new(ticket: u64, handle: AbortHandle) -> Self {
        Self { ticket, handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub subscribed: bool,
    pub session_start: DateTime<Utc>,
    pub pending_message: Option<String>,
    pub fallback: Option<FallbackTimer>,
    /// Тикет автоответа, который сейчас ждёт модель.
    pub reply_in_flight: Option<u64>,
}

impl Session {
    /// Новая оплаченная сессия.
    pub fn paid(now: DateTime<Utc>) -> Self {
        Self {
            subscribed: true,
            session_start: now,
            pending_message: None,
            fallback: None,
            reply_in_flight: None,
        }
    }

    /// Сессия истекла строго после `session_start + length`.
    pub fn is_expired_at(&self, now: DateTime<Utc>, length: Duration) -> bool {
        now > self.session_start + length
    }

    /// Снимает взведённый таймер, если он есть.
    pub fn cancel_fallback(&mut self) -> bool {
        match self.fallback.take() {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_session_starts_subscribed_and_idle() {
        let now = Utc::now();
        let session = Session::paid(now);
        assert!(session.subscribed);
        assert_eq!(session.session_start, now);
        assert!(session.pending_message.is_none());
        assert!(session.fallback.is_none());
        assert!(session.reply_in_flight.is_none());
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let start = Utc::now();
        let session = Session::paid(start);
        let length = Duration::minutes(30);

        assert!(!session.is_expired_at(start + Duration::minutes(29), length));
        assert!(!session.is_expired_at(start + length, length));
        assert!(session.is_expired_at(start + length + Duration::milliseconds(1), length));
    }

    #[tokio::test]
    async fn cancel_fallback_aborts_task() {
        let task = tokio::spawn(std::future::pending::<()>());
        let mut session = Session::paid(Utc::now());
        session.fallback = Some(FallbackTimer::new(1, task.abort_handle()));

        assert!(session.cancel_fallback());
        assert!(session.fallback.is_none());
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!session.cancel_fallback());
    }
}
