//! SwiftBot account command line
//!
//! Runs the account-page workflows against a SwiftBot deployment.
//!
//! Usage:
//!   swiftbot-account status
//!   swiftbot-account plans [monthly|annual]
//!   swiftbot-account change-plan <connections> <monthly|annual> [--confirm]
//!   swiftbot-account cancel [reason]
//!   swiftbot-account cancel-change
//!   swiftbot-account update-card <payment_method_id>
//!   swiftbot-account team
//!   swiftbot-account permissions
//!   swiftbot-account deletion-status <code>
//!
//! Configuration is read from the environment (or `.env`): SWIFTBOT_API_URL,
//! SWIFTBOT_ACCESS_TOKEN, SWIFTBOT_USER_ID, SUPABASE_URL, SUPABASE_ANON_KEY,
//! SWIFTBOT_LOCALE, STRIPE_SECRET_KEY.

use std::env;

use anyhow::{bail, Context};
use swiftbot_billing::messages::{format_currency, format_date, period_label, status_label};
use swiftbot_billing::{
    project_now, CardUpdateFlow, Locale, PaymentMethodInput, PlanChangeSession,
    PlanChangeState, PriceTable, StripeClient, StripeSetupConfirmer, SubscriptionBackend,
};
use swiftbot_client::{AccountClient, ClientConfig};
use swiftbot_shared::{BillingPeriod, PlanSelection};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: swiftbot-account <status|plans|change-plan|cancel|cancel-change|update-card|team|permissions|deletion-status> [args]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };

    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    let client = AccountClient::new(&config)?;
    let locale = config.locale;

    match command.as_str() {
        "status" => status(&client, &config).await,
        "plans" => {
            let period = match args.get(1) {
                Some(raw) => raw.parse::<BillingPeriod>()?,
                None => BillingPeriod::Monthly,
            };
            plans(period, locale);
            Ok(())
        }
        "change-plan" => {
            let connections: i64 = args
                .get(1)
                .context("change-plan needs a number of connections")?
                .parse()
                .context("connections must be a number")?;
            let period: BillingPeriod = args
                .get(2)
                .context("change-plan needs a billing period (monthly|annual)")?
                .parse()?;
            let confirm = args.iter().any(|a| a == "--confirm");
            change_plan(client, &config, PlanSelection::new(connections, period)?, confirm).await
        }
        "cancel" => {
            let user_id = config.require_user_id()?;
            let reason = args.get(1).map(String::as_str);
            let response = client.cancel_subscription(user_id, reason).await?;
            match response.access_until {
                Some(until) => println!("Subscription canceled; access until {}", until),
                None => println!("Subscription canceled"),
            }
            Ok(())
        }
        "cancel-change" => {
            client
                .cancel_scheduled_change(config.require_user_id()?)
                .await?;
            println!("Scheduled plan change canceled");
            Ok(())
        }
        "update-card" => {
            let payment_method_id = args
                .get(1)
                .context("update-card needs a payment method id (pm_...)")?;
            update_card(client, &config, payment_method_id).await
        }
        "team" => {
            for member in client.team().list_members().await? {
                println!(
                    "{}  {:<8}  {}",
                    member.user_id,
                    member.role,
                    member.name.as_deref().unwrap_or(&member.email)
                );
            }
            Ok(())
        }
        "permissions" => {
            let role = client.member_role().await?;
            println!(
                "{} (can administer: {})",
                role,
                if role.can_administer() { "yes" } else { "no" }
            );
            Ok(())
        }
        "deletion-status" => {
            let code = args.get(1).context("deletion-status needs a confirmation code")?;
            let status = client.data_deletion_status(code).await?;
            println!("{}: {}", status.code, status.status);
            Ok(())
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

async fn status(client: &AccountClient, config: &ClientConfig) -> anyhow::Result<()> {
    let locale = config.locale;
    let subscription = client
        .fetch_subscription(config.require_user_id()?)
        .await?;
    let projected = project_now(&subscription);

    println!(
        "{}: {} connection(s), {}",
        status_label(projected.status, locale),
        subscription.connections_purchased,
        period_label(subscription.billing_period, locale)
    );
    println!("Remaining days: {}", projected.remaining_days);

    if let Some(date) = subscription.next_billing_date {
        println!("Next billing date: {}", format_date(date.date_naive(), locale));
    }

    if let Some(plan) = subscription.scheduled_plan() {
        let when = subscription
            .scheduled_change_date
            .map(|d| format_date(d.date_naive(), locale))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "Scheduled change: {} connection(s), {} on {}",
            plan.connections,
            period_label(plan.billing_period, locale),
            when
        );
    }

    Ok(())
}

fn plans(period: BillingPeriod, locale: Locale) {
    for row in PriceTable::standard().plans(period) {
        println!(
            "{} connection(s)  {}",
            row.plan.connections,
            format_currency(row.price_cents, locale)
        );
    }
}

async fn change_plan(
    client: AccountClient,
    config: &ClientConfig,
    proposed: PlanSelection,
    confirm: bool,
) -> anyhow::Result<()> {
    let user_id = config.require_user_id()?;
    let subscription = client.fetch_subscription(user_id).await?;

    let mut session = PlanChangeSession::new(client, user_id, config.locale);
    session.open_for(&subscription)?;
    session.select(proposed)?;
    session.proceed().await?;

    if matches!(session.state(), PlanChangeState::ConfirmingDowngrade { .. }) {
        if !confirm {
            println!("{}", session.downgrade_prompt());
            println!("Run again with --confirm to schedule the downgrade.");
            session.decline_downgrade()?;
            session.close()?;
            return Ok(());
        }
        session.confirm_downgrade().await?;
    }

    match session.state() {
        PlanChangeState::Success { outcome, .. } => {
            println!("{}", outcome.message);
            Ok(())
        }
        PlanChangeState::Failed { failure, .. } => {
            if let Some(message) = session.failure_message() {
                println!("{}", message);
            }
            if failure.offers_card_update() {
                println!("Run `swiftbot-account update-card <payment_method_id>` and try again.");
            }
            bail!("plan change failed: {}", failure.message)
        }
        other => bail!("plan change stopped in state {}", other.name()),
    }
}

async fn update_card(
    client: AccountClient,
    config: &ClientConfig,
    payment_method_id: &str,
) -> anyhow::Result<()> {
    let user_id = config.require_user_id()?;
    let stripe = StripeClient::from_env()?;
    let flow = CardUpdateFlow::new(client, StripeSetupConfirmer::new(stripe));

    let input = PaymentMethodInput {
        payment_method_id: payment_method_id.to_string(),
        return_url: None,
    };
    let result = flow.run(user_id, &input).await?;
    println!("Card updated (setup intent {})", result.setup_intent_id);
    Ok(())
}
