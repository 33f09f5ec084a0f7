use std::error::Error;

use teloxide::prelude::*;

use crate::handlers::payments::send_consultation_invoice;
use crate::handlers::utils::PAY_CALLBACK;
use crate::models::PaymentConfig;

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    payment_config: PaymentConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    // Снимаем "часики" с кнопки в любом случае
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = &q.message else {
        return Ok(());
    };
    let chat_id = message.chat().id;

    match q.data.as_deref() {
        Some(PAY_CALLBACK) => {
            send_consultation_invoice(&bot, chat_id, &payment_config).await?;
        }
        other => {
            log::debug!("Ignoring callback data {:?} from chat {}", other, chat_id);
        }
    }

    Ok(())
}
