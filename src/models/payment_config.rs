pub const CONSULTATION_PAYLOAD: &str = "consultation";
pub const CONSULTATION_CURRENCY: &str = "EUR";
/// 10.00 EUR в минимальных единицах.
pub const CONSULTATION_PRICE: u32 = 1000;

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub provider_token: Option<String>,
    pub currency: String,
    pub amount: u32,
    pub payload: String,
    pub title: String,
    pub description: String,
    pub price_label: String,
    /// Сверять pre-checkout с выставленным счётом.
    pub strict_pre_checkout: bool,
}

impl PaymentConfig {
    pub fn consultation(
        provider_token: Option<String>,
        session_minutes: i64,
        strict_pre_checkout: bool,
    ) -> Self {
        Self {
            provider_token,
            currency: CONSULTATION_CURRENCY.to_string(),
            amount: CONSULTATION_PRICE,
            payload: CONSULTATION_PAYLOAD.to_string(),
            title: "Консультация психолога".to_string(),
            description: format!("{} минут консультации 24/7", session_minutes),
            price_label: "Консультация".to_string(),
            strict_pre_checkout,
        }
    }

    /// Цена для показа пользователю, например "10€".
    pub fn display_price(&self) -> String {
        let major = self.amount / 100;
        let minor = self.amount % 100;
        let amount = if minor == 0 {
            major.to_string()
        } else {
            format!("{}.{:02}", major, minor)
        };
        match self.currency.as_str() {
            "EUR" => format!("{}€", amount),
            other => format!("{} {}", amount, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consultation_invoice_is_fixed() {
        let config = PaymentConfig::consultation(None, 30, true);
        assert_eq!(config.payload, "consultation");
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.amount, 1000);
        assert_eq!(config.description, "30 минут консультации 24/7");
    }

    #[test]
    fn display_price_formats_minor_units() {
        let mut config = PaymentConfig::consultation(None, 30, true);
        assert_eq!(config.display_price(), "10€");

        config.amount = 1250;
        assert_eq!(config.display_price(), "12.50€");

        config.currency = "USD".to_string();
        assert_eq!(config.display_price(), "12.50 USD");
    }
}
