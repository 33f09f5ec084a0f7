use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

mod bot_state;
mod config;
mod handlers;
mod llm;
mod models;
mod outbox;

use crate::bot_state::{BotState, InMemorySessions, RelaySettings};
use crate::config::BotConfig;
use crate::handlers::{
    callback_handler, command_handler, is_operator_reply, message_handler,
    operator_reply_handler, pre_checkout_handler, successful_payment_handler,
};
use crate::llm::LlmClient;
use crate::models::PaymentConfig;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать помощь")]
    Help,
    #[command(description = "оплатить консультацию")]
    Subscribe,
    #[command(description = "начать консультацию")]
    Consult,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting consultation bot...");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Configuration error: {}", e);
            return Err(e.into());
        }
    };
    if config.provider_token.is_none() {
        log::warn!("STRIPE_TOKEN is not set, invoices will be sent without a provider token");
    }

    let bot = Bot::new(&config.telegram_token);
    let llm = LlmClient::new(&config);
    log::info!(
        "Operator chat {}, session {} min, fallback after {:?}, model {}",
        config.operator_chat,
        config.session_length.num_minutes(),
        config.fallback_delay,
        llm.model()
    );

    let payment_config = PaymentConfig::consultation(
        config.provider_token.clone(),
        config.session_length.num_minutes(),
        config.strict_pre_checkout,
    );
    if !payment_config.strict_pre_checkout {
        log::warn!("Pre-checkout verification disabled, every query will be approved");
    }

    let state = BotState::new(
        Arc::new(InMemorySessions::new()),
        Arc::new(bot.clone()),
        Arc::new(llm),
        RelaySettings::from(&config),
    );

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("Could not register command list: {}", e);
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.successful_payment().is_some())
                .endpoint(successful_payment_handler),
        )
        .branch(Update::filter_pre_checkout_query().endpoint(pre_checkout_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(
            Update::filter_message()
                .filter(is_operator_reply)
                .endpoint(operator_reply_handler),
        )
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state, payment_config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
