use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup};

use crate::models::PaymentConfig;

pub const PAY_CALLBACK: &str = "pay";

pub const SESSION_EXPIRED_TEXT: &str = "Сессия закончилась. Оплатите заново /subscribe.";
pub const PAY_FIRST_TEXT: &str = "Сначала оплатите /subscribe.";
pub const ASK_QUESTION_TEXT: &str = "Напишите ваш вопрос. Я перешлю психологу.";
pub const PAYMENT_DONE_TEXT: &str = "Оплата прошла! Начните консультацию /consult.";
pub const OPERATOR_HINT_TEXT: &str =
    "Чтобы ответить пользователю, ответьте (reply) на пересланный запрос.";

const RELAY_PREFIX: &str = "Запрос от ";

pub fn start_text(chat_id: ChatId) -> String {
    format!(
        "Привет! Я бот-психолог. Оплатите подписку /subscribe. Ваш ID: {} (для владельца).",
        chat_id.0
    )
}

pub fn subscribe_text(payment_config: &PaymentConfig, session_minutes: i64) -> String {
    format!(
        "Оплатите {} за {}-минутную консультацию.",
        payment_config.display_price(),
        session_minutes
    )
}

/// Кнопка оплаты
pub fn pay_keyboard(payment_config: &PaymentConfig) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        format!("Оплатить {}", payment_config.display_price()),
        PAY_CALLBACK,
    )]])
}

/// Текст, который уходит оператору.
pub fn format_relay_request(chat_id: ChatId, text: &str) -> String {
    format!("{}{}: {}", RELAY_PREFIX, chat_id.0, text)
}

/// Достаёт chat id пользователя из пересланного оператору запроса.
pub fn parse_relay_request(text: &str) -> Option<ChatId> {
    let (id, _) = text.strip_prefix(RELAY_PREFIX)?.split_once(':')?;
    id.trim().parse::<i64>().ok().map(ChatId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn relay_request_carries_user_id() {
        let text = format_relay_request(ChatId(123456789), "Мне тревожно: не сплю");
        assert_eq!(text, "Запрос от 123456789: Мне тревожно: не сплю");
        assert_eq!(parse_relay_request(&text), Some(ChatId(123456789)));
    }

    #[test]
    fn foreign_text_is_not_a_relay_request() {
        assert_eq!(parse_relay_request("Привет"), None);
        assert_eq!(parse_relay_request("Запрос от кого-то: текст"), None);
        assert_eq!(parse_relay_request("Запрос от 42"), None);
    }

    #[test]
    fn pay_keyboard_has_single_pay_button() {
        let config = PaymentConfig::consultation(None, 30, true);
        let keyboard = pay_keyboard(&config);
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 1);

        let button = &keyboard.inline_keyboard[0][0];
        assert_eq!(button.text, "Оплатить 10€");
        assert!(matches!(
            &button.kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == "pay"
        ));
    }

    #[test]
    fn start_text_shows_user_id() {
        assert!(start_text(ChatId(55)).contains("Ваш ID: 55"));
    }

    #[test]
    fn subscribe_text_mentions_price_and_length() {
        let config = PaymentConfig::consultation(None, 30, true);
        assert_eq!(subscribe_text(&config, 30), "Оплатите 10€ за 30-минутную консультацию.");
    }
}
