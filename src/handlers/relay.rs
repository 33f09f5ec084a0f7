use anyhow::Result;
use chrono::{DateTime, Utc};
use teloxide::types::ChatId;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::bot_state::BotState;
use crate::handlers::utils::{format_relay_request, SESSION_EXPIRED_TEXT};
use crate::models::FallbackTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    NotSubscribed,
    Expired,
    Forwarded { ticket: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackOutcome {
    Replied,
    AlreadyAnswered,
    Superseded,
    UnknownUser,
}

/// Сообщение пользователя: проверка подписки и срока, пересылка оператору, таймер автоответа.
pub async fn relay_user_message(
    state: &BotState,
    chat_id: ChatId,
    text: &str,
    now: DateTime<Utc>,
) -> Result<RelayOutcome> {
    let _guard = state.lock_user(chat_id).await;

    let mut session = match state.sessions().get(chat_id).await {
        Some(session) if session.subscribed => session,
        _ => {
            // Неоплаченные сообщения молча отбрасываются
            log::debug!("Dropping message from unsubscribed user {}", chat_id);
            return Ok(RelayOutcome::NotSubscribed);
        }
    };

    if session.is_expired_at(now, state.settings().session_length) {
        session.subscribed = false;
        state.sessions().put(chat_id, session).await;
        log::info!("Session expired for user {}", chat_id);
        state.outbox().send_text(chat_id, SESSION_EXPIRED_TEXT.to_string()).await?;
        return Ok(RelayOutcome::Expired);
    }

    let operator = state.settings().operator_chat;
    state
        .outbox()
        .send_text(operator, format_relay_request(chat_id, text))
        .await?;

    if session.cancel_fallback() {
        log::info!("Replaced pending fallback for user {}", chat_id);
    }
    let ticket = state.next_ticket();
    let handle = arm_fallback(state.clone(), chat_id, ticket);
    session.pending_message = Some(text.to_string());
    session.fallback = Some(FallbackTimer::new(ticket, handle));
    state.sessions().put(chat_id, session).await;

    log::info!(
        "Forwarded message from {} to operator, fallback #{} in {:?}",
        chat_id,
        ticket,
        state.settings().fallback_delay
    );
    Ok(RelayOutcome::Forwarded { ticket })
}

fn arm_fallback(state: BotState, chat_id: ChatId, ticket: u64) -> AbortHandle {
    // Дедлайн считается от момента взвода, а не от первого poll задачи
    let deadline = Instant::now() + state.settings().fallback_delay;
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        match fire_fallback(&state, chat_id, ticket).await {
            Ok(outcome) => {
                log::debug!("Fallback #{} for {} finished: {:?}", ticket, chat_id, outcome)
            }
            Err(e) => log::error!("❌ Fallback reply for {} failed: {:#}", chat_id, e),
        }
    })
    .abort_handle()
}

/// Автоответ, если сообщение всё ещё ждёт оператора.
pub async fn fire_fallback(
    state: &BotState,
    chat_id: ChatId,
    ticket: u64,
) -> Result<FallbackOutcome> {
    let message = {
        let _guard = state.lock_user(chat_id).await;

        let Some(mut session) = state.sessions().get(chat_id).await else {
            log::warn!("Fallback #{} fired for unknown user {}", ticket, chat_id);
            return Ok(FallbackOutcome::UnknownUser);
        };
        if session.pending_message.is_none() {
            return Ok(FallbackOutcome::AlreadyAnswered);
        }
        if session.fallback.as_ref().map(|timer| timer.ticket) != Some(ticket) {
            return Ok(FallbackOutcome::Superseded);
        }

        session.fallback = None;
        session.reply_in_flight = Some(ticket);
        let message = session.pending_message.take();
        state.sessions().put(chat_id, session).await;
        message.unwrap_or_default()
    };

    let reply = state.responder().reply(&message).await;

    // Оператор мог ответить, пока модель думала
    let _guard = state.lock_user(chat_id).await;
    let Some(mut session) = state.sessions().get(chat_id).await else {
        return Ok(FallbackOutcome::UnknownUser);
    };
    if session.reply_in_flight != Some(ticket) {
        log::info!("Dropping fallback #{} for {}: operator answered first", ticket, chat_id);
        return Ok(FallbackOutcome::AlreadyAnswered);
    }
    session.reply_in_flight = None;
    state.sessions().put(chat_id, session).await;

    state.outbox().send_text(chat_id, reply?).await?;
    log::info!("🤖 Fallback reply sent to {}", chat_id);

    Ok(FallbackOutcome::Replied)
}

/// Ответ оператора пользователю. Возвращает true, если снят ожидающий автоответ.
pub async fn relay_operator_reply(
    state: &BotState,
    user_chat: ChatId,
    text: &str,
) -> Result<bool> {
    let _guard = state.lock_user(user_chat).await;
    state.outbox().send_text(user_chat, text.to_string()).await?;

    let Some(mut session) = state.sessions().get(user_chat).await else {
        return Ok(false);
    };

    let was_pending = session.pending_message.take().is_some();
    let was_in_flight = session.reply_in_flight.take().is_some();
    session.cancel_fallback();
    state.sessions().put(user_chat, session).await;

    let suppressed = was_pending || was_in_flight;
    if suppressed {
        log::info!("Operator answered {}, fallback cancelled", user_chat);
    }
    Ok(suppressed)
}
