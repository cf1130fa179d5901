//! Localized user-facing billing messages

use chrono::{DateTime, NaiveDate, Utc};
use swiftbot_shared::{BillingPeriod, SubscriptionStatus};

/// Languages the account pages are offered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    PtBr,
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "pt" | "pt-br" => Ok(Self::PtBr),
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            _ => Err(format!("Unsupported locale: {}", s)),
        }
    }
}

/// Format an amount in BRL cents, e.g. `R$ 1.023,75` or `R$1,023.75`
pub fn format_currency(cents: i64, locale: Locale) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let (thousands_sep, decimal_sep, prefix) = match locale {
        Locale::PtBr => ('.', ',', "R$ "),
        Locale::En => (',', '.', "R$"),
    };

    let digits = (abs / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(thousands_sep);
        }
        grouped.push(ch);
    }

    format!("{sign}{prefix}{grouped}{decimal_sep}{:02}", abs % 100)
}

pub fn format_date(date: NaiveDate, locale: Locale) -> String {
    match locale {
        Locale::PtBr => date.format("%d/%m/%Y").to_string(),
        Locale::En => date.format("%m/%d/%Y").to_string(),
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates
pub fn parse_effective_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn upgrade_success(amount_charged_cents: Option<i64>, locale: Locale) -> String {
    match (amount_charged_cents, locale) {
        (Some(cents), Locale::PtBr) => format!(
            "Plano atualizado com sucesso! Foi cobrado {} referente à diferença proporcional do período atual.",
            format_currency(cents, locale)
        ),
        (Some(cents), Locale::En) => format!(
            "Plan upgraded successfully! You were charged {} for the prorated difference of the current period.",
            format_currency(cents, locale)
        ),
        (None, Locale::PtBr) => "Plano atualizado com sucesso!".to_string(),
        (None, Locale::En) => "Plan upgraded successfully!".to_string(),
    }
}

pub fn downgrade_success(effective_date: Option<DateTime<Utc>>, locale: Locale) -> String {
    match (effective_date, locale) {
        (Some(date), Locale::PtBr) => format!(
            "Downgrade agendado com sucesso! Seu novo plano entrará em vigor em {}.",
            format_date(date.date_naive(), locale)
        ),
        (Some(date), Locale::En) => format!(
            "Downgrade scheduled successfully! Your new plan takes effect on {}.",
            format_date(date.date_naive(), locale)
        ),
        (None, Locale::PtBr) => {
            "Downgrade agendado com sucesso! Seu novo plano entrará em vigor no próximo ciclo de cobrança."
                .to_string()
        }
        (None, Locale::En) => {
            "Downgrade scheduled successfully! Your new plan takes effect at the next billing cycle."
                .to_string()
        }
    }
}

pub fn downgrade_confirmation(effective_hint: Option<DateTime<Utc>>, locale: Locale) -> String {
    let when = effective_hint.map(|d| format_date(d.date_naive(), locale));
    match (when, locale) {
        (Some(when), Locale::PtBr) => format!(
            "O downgrade será aplicado apenas no próximo ciclo de cobrança ({}). Deseja confirmar?",
            when
        ),
        (None, Locale::PtBr) => {
            "O downgrade será aplicado apenas no próximo ciclo de cobrança. Deseja confirmar?"
                .to_string()
        }
        (Some(when), Locale::En) => format!(
            "The downgrade only applies at the next billing cycle ({}). Do you want to confirm?",
            when
        ),
        (None, Locale::En) => {
            "The downgrade only applies at the next billing cycle. Do you want to confirm?"
                .to_string()
        }
    }
}

pub fn payment_failure_prompt(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr => {
            "Não foi possível processar o pagamento. Deseja atualizar seu cartão de crédito?"
        }
        Locale::En => "We could not process the payment. Do you want to update your credit card?",
    }
}

pub fn generic_failure(message: &str, locale: Locale) -> String {
    match locale {
        Locale::PtBr => format!("Erro ao alterar o plano: {}", message),
        Locale::En => format!("Failed to change plan: {}", message),
    }
}

pub fn status_label(status: SubscriptionStatus, locale: Locale) -> &'static str {
    match (status, locale) {
        (SubscriptionStatus::Trial, Locale::PtBr) => "Período de teste",
        (SubscriptionStatus::Active, Locale::PtBr) => "Ativa",
        (SubscriptionStatus::Canceled, Locale::PtBr) => "Cancelada",
        (SubscriptionStatus::Expired, Locale::PtBr) => "Expirada",
        (SubscriptionStatus::PastDue, Locale::PtBr) => "Pagamento pendente",
        (SubscriptionStatus::Incomplete, Locale::PtBr) => "Incompleta",
        (SubscriptionStatus::Unknown, Locale::PtBr) => "Desconhecida",
        (SubscriptionStatus::Trial, Locale::En) => "Trial",
        (SubscriptionStatus::Active, Locale::En) => "Active",
        (SubscriptionStatus::Canceled, Locale::En) => "Canceled",
        (SubscriptionStatus::Expired, Locale::En) => "Expired",
        (SubscriptionStatus::PastDue, Locale::En) => "Past due",
        (SubscriptionStatus::Incomplete, Locale::En) => "Incomplete",
        (SubscriptionStatus::Unknown, Locale::En) => "Unknown",
    }
}

pub fn period_label(period: BillingPeriod, locale: Locale) -> &'static str {
    match (period, locale) {
        (BillingPeriod::Monthly, Locale::PtBr) => "mensal",
        (BillingPeriod::Annual, Locale::PtBr) => "anual",
        (BillingPeriod::Monthly, Locale::En) => "monthly",
        (BillingPeriod::Annual, Locale::En) => "annual",
    }
}
