use std::error::Error;

use chrono::Utc;
use teloxide::prelude::*;

use crate::bot_state::BotState;
use crate::handlers::relay::{relay_operator_reply, relay_user_message};
use crate::handlers::utils::{parse_relay_request, OPERATOR_HINT_TEXT};

pub async fn message_handler(
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    // Неизвестные команды сюда тоже доходят
    if text.starts_with('/') {
        return Ok(());
    }

    let outcome = relay_user_message(&state, msg.chat.id, text, Utc::now()).await?;
    log::debug!("Message from {} handled: {:?}", msg.chat.id, outcome);
    Ok(())
}

/// Оператор отвечает (reply) на пересланный запрос.
pub async fn operator_reply_handler(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let target = msg
        .reply_to_message()
        .and_then(|original| original.text())
        .and_then(parse_relay_request);

    let (Some(user_chat), Some(text)) = (target, msg.text()) else {
        bot.send_message(msg.chat.id, OPERATOR_HINT_TEXT).await?;
        return Ok(());
    };

    relay_operator_reply(&state, user_chat, text).await?;
    Ok(())
}

pub fn is_operator_reply(msg: Message, state: BotState) -> bool {
    state.is_operator(msg.chat.id) && msg.reply_to_message().is_some()
}
