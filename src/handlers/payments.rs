use std::error::Error;

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::LabeledPrice;

use crate::bot_state::BotState;
use crate::handlers::utils::PAYMENT_DONE_TEXT;
use crate::models::PaymentConfig;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PreCheckoutRejection {
    #[error("Неизвестный счёт {got:?}, оформите оплату заново через /subscribe")]
    PayloadMismatch { got: String },

    #[error("Неверная валюта платежа: {got}")]
    CurrencyMismatch { got: String },

    #[error("Неверная сумма платежа: {got}")]
    AmountMismatch { got: u32 },
}

/// Проверка pre-checkout против выставленного счёта.
pub fn verify_pre_checkout(
    payment_config: &PaymentConfig,
    payload: &str,
    currency: &str,
    total_amount: u32,
) -> Result<(), PreCheckoutRejection> {
    if !payment_config.strict_pre_checkout {
        return Ok(());
    }
    if payload != payment_config.payload {
        return Err(PreCheckoutRejection::PayloadMismatch {
            got: payload.to_string(),
        });
    }
    if !currency.eq_ignore_ascii_case(&payment_config.currency) {
        return Err(PreCheckoutRejection::CurrencyMismatch {
            got: currency.to_string(),
        });
    }
    if total_amount != payment_config.amount {
        return Err(PreCheckoutRejection::AmountMismatch { got: total_amount });
    }
    Ok(())
}

pub fn invoice_prices(payment_config: &PaymentConfig) -> Vec<LabeledPrice> {
    vec![LabeledPrice {
        label: payment_config.price_label.clone(),
        amount: payment_config.amount,
    }]
}

pub async fn send_consultation_invoice(
    bot: &Bot,
    chat_id: ChatId,
    payment_config: &PaymentConfig,
) -> Result<Message, Box<dyn Error + Send + Sync>> {
    log::info!(
        "Sending invoice to chat {} ({} {})",
        chat_id,
        payment_config.amount,
        payment_config.currency
    );

    let mut request = bot
        .send_invoice(
            chat_id,
            payment_config.title.clone(),
            payment_config.description.clone(),
            payment_config.payload.clone(),
            payment_config.currency.clone(),
            invoice_prices(payment_config),
        )
        .need_name(false)
        .need_phone_number(false)
        .need_email(false)
        .need_shipping_address(false)
        .is_flexible(false);

    if let Some(token) = &payment_config.provider_token {
        request = request.provider_token(token.clone());
    }

    let invoice = request.send().await?;
    Ok(invoice)
}

pub async fn pre_checkout_handler(
    bot: Bot,
    q: PreCheckoutQuery,
    payment_config: PaymentConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let verdict =
        verify_pre_checkout(&payment_config, &q.invoice_payload, &q.currency, q.total_amount);
    match verdict {
        Ok(()) => {
            log::info!("✅ Pre-checkout approved for payload {:?}", q.invoice_payload);
            bot.answer_pre_checkout_query(q.id, true).await?;
        }
        Err(rejection) => {
            log::warn!("Pre-checkout rejected: {:?}", rejection);
            bot.answer_pre_checkout_query(q.id, false)
                .error_message(rejection.to_string())
                .await?;
        }
    }

    Ok(())
}

pub async fn successful_payment_handler(
    bot: Bot,
    msg: Message,
    state: BotState,
    payment_config: PaymentConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(payment) = msg.successful_payment() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    log::info!(
        "🎉 Payment received from {}: {} {}",
        chat_id,
        payment.total_amount,
        payment.currency
    );
    if payment.invoice_payload != payment_config.payload {
        // Деньги уже списаны, поэтому сессию всё равно открываем
        log::warn!("Unexpected invoice payload {:?} from {}", payment.invoice_payload, chat_id);
    }

    state.activate_session(chat_id, Utc::now()).await;
    bot.send_message(chat_id, PAYMENT_DONE_TEXT).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> PaymentConfig {
        PaymentConfig::consultation(None, 30, true)
    }

    fn legacy() -> PaymentConfig {
        PaymentConfig::consultation(None, 30, false)
    }

    #[test]
    fn legacy_mode_approves_anything() {
        assert_eq!(verify_pre_checkout(&legacy(), "anything", "USD", 1), Ok(()));
        assert_eq!(verify_pre_checkout(&legacy(), "consultation", "EUR", 1000), Ok(()));
    }

    #[test]
    fn strict_mode_accepts_issued_invoice() {
        assert_eq!(verify_pre_checkout(&strict(), "consultation", "EUR", 1000), Ok(()));
        assert_eq!(verify_pre_checkout(&strict(), "consultation", "eur", 1000), Ok(()));
    }

    #[test]
    fn strict_mode_rejects_mismatches() {
        assert_eq!(
            verify_pre_checkout(&strict(), "anything", "EUR", 1000),
            Err(PreCheckoutRejection::PayloadMismatch { got: "anything".to_string() })
        );
        assert_eq!(
            verify_pre_checkout(&strict(), "consultation", "USD", 1000),
            Err(PreCheckoutRejection::CurrencyMismatch { got: "USD".to_string() })
        );
        assert_eq!(
            verify_pre_checkout(&strict(), "consultation", "EUR", 1),
            Err(PreCheckoutRejection::AmountMismatch { got: 1 })
        );
    }

    #[test]
    fn rejection_text_is_user_facing() {
        let rejection = PreCheckoutRejection::AmountMismatch { got: 1 };
        assert_eq!(rejection.to_string(), "Неверная сумма платежа: 1");
    }

    #[test]
    fn invoice_has_single_price() {
        let prices = invoice_prices(&strict());
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].label, "Консультация");
        assert_eq!(prices[0].amount, 1000);
    }
}
