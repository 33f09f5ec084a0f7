use std::error::Error;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot_state::BotState;
use crate::handlers::utils::{
    pay_keyboard, start_text, subscribe_text, ASK_QUESTION_TEXT, PAY_FIRST_TEXT,
};
use crate::models::PaymentConfig;
use crate::Command;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
    payment_config: PaymentConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match cmd {
        Command::Start => handle_start(bot, msg).await?,
        Command::Help => handle_help(bot, msg).await?,
        Command::Subscribe => handle_subscribe(bot, msg, state, payment_config).await?,
        Command::Consult => handle_consult(bot, msg, state).await?,
    }
    Ok(())
}

async fn handle_start(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(msg.chat.id, start_text(msg.chat.id)).await?;
    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

/// Повторная подписка посреди сессии разрешена, оплата просто перезапустит отсчёт.
async fn handle_subscribe(
    bot: Bot,
    msg: Message,
    state: BotState,
    payment_config: PaymentConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let minutes = state.settings().session_length.num_minutes();

    bot.send_message(msg.chat.id, subscribe_text(&payment_config, minutes))
        .reply_markup(pay_keyboard(&payment_config))
        .await?;
    Ok(())
}

/// Ответ на /consult, состояние не меняется.
pub async fn consult_reply(state: &BotState, chat_id: ChatId) -> &'static str {
    if state.is_subscribed(chat_id).await {
        ASK_QUESTION_TEXT
    } else {
        PAY_FIRST_TEXT
    }
}

async fn handle_consult(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let reply = consult_reply(&state, msg.chat.id).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
