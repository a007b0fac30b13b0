use std::{env, net::IpAddr, str::FromStr, time::Duration};

use log::*;
use paystack_tools::{PaystackConfig, DEFAULT_PAYSTACK_BASE_URL, PAYSTACK_SIGNATURE_HEADER};
use rust_decimal::Decimal;
use spg_common::{parse_boolean_flag, MinorUnits, Secret, DEFAULT_CURRENCY_CODE};
use storefront_payment_engine::{
    helpers::FeeSchedule,
    payment_objects::{PaymentConfig, SplitPolicy, DEFAULT_MERCHANT_SHARE_PERCENT, DEFAULT_PROVIDER_TIMEOUT},
    DEFAULT_PUSH_TIMEOUT,
    DEFAULT_REFERENCE_PREFIX,
};

use crate::{errors::ServerError, integrations::fcm::DEFAULT_FCM_URL};

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8370;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub paystack: PaystackConfig,
    /// Key used to check the `x-paystack-signature` header on webhook deliveries.
    pub webhook_secret: Secret<String>,
    /// Name of the header carrying the webhook signature.
    pub webhook_signature_header: String,
    pub fcm_server_key: Secret<String>,
    pub fcm_url: String,
    /// Where Paystack sends the customer once the hosted checkout is done.
    pub callback_url: Option<String>,
    pub order_reference_prefix: String,
    /// Currency for checkouts that do not name one.
    pub currency: String,
    pub split_policy: SplitPolicy,
    pub fee_schedule: FeeSchedule,
    pub provider_timeout: Duration,
    pub push_timeout: Duration,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// If supplied, requests against /webhooks endpoints will be checked against a whitelist of Paystack IP
    /// addresses. To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub paystack_whitelist: Option<Vec<IpAddr>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            paystack: PaystackConfig::new(Secret::default()),
            webhook_secret: Secret::default(),
            webhook_signature_header: PAYSTACK_SIGNATURE_HEADER.to_string(),
            fcm_server_key: Secret::default(),
            fcm_url: DEFAULT_FCM_URL.to_string(),
            callback_url: None,
            order_reference_prefix: DEFAULT_REFERENCE_PREFIX.to_string(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            split_policy: SplitPolicy::default(),
            fee_schedule: FeeSchedule::default(),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            push_timeout: DEFAULT_PUSH_TIMEOUT,
            use_x_forwarded_for: false,
            use_forwarded: false,
            paystack_whitelist: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    /// Reads the configuration from `SPG_*` environment variables. The database URL and the three secrets have no
    /// sensible default, so a missing value is an error. Everything else falls back to its default with a log
    /// message.
    pub fn from_env() -> Result<Self, ServerError> {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = required_var("SPG_DATABASE_URL")?;
        let paystack_secret = Secret::new(required_var("SPG_PAYSTACK_SECRET_KEY")?);
        let webhook_secret = Secret::new(required_var("SPG_WEBHOOK_SECRET")?);
        let fcm_server_key = Secret::new(required_var("SPG_FCM_SERVER_KEY")?);
        let fcm_url = env::var("SPG_FCM_URL").ok().unwrap_or_else(|| DEFAULT_FCM_URL.into());
        let provider_timeout = duration_secs("SPG_PROVIDER_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT);
        let push_timeout = duration_secs("SPG_PUSH_TIMEOUT_SECS", DEFAULT_PUSH_TIMEOUT);
        let paystack_base_url = env::var("SPG_PAYSTACK_BASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ SPG_PAYSTACK_BASE_URL is not set. Using {DEFAULT_PAYSTACK_BASE_URL}");
            DEFAULT_PAYSTACK_BASE_URL.into()
        });
        let paystack =
            PaystackConfig::new(paystack_secret).with_base_url(paystack_base_url).with_timeout(provider_timeout);
        let webhook_signature_header =
            env::var("SPG_WEBHOOK_SIGNATURE_HEADER").ok().unwrap_or_else(|| PAYSTACK_SIGNATURE_HEADER.into());
        let callback_url = env::var("SPG_CALLBACK_URL").ok().filter(|s| !s.trim().is_empty());
        if callback_url.is_none() {
            warn!("🪛️ SPG_CALLBACK_URL is not set. Paystack will use the callback URL from your dashboard.");
        }
        let order_reference_prefix =
            env::var("SPG_ORDER_REFERENCE_PREFIX").ok().unwrap_or_else(|| DEFAULT_REFERENCE_PREFIX.into());
        let currency = env::var("SPG_CURRENCY")
            .map(|s| s.trim().to_ascii_uppercase())
            .ok()
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.into());
        let split_policy = configure_split_policy()?;
        let fee_schedule = configure_fee_schedule()?;
        let use_x_forwarded_for = parse_boolean_flag(env::var("SPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SPG_USE_FORWARDED").ok(), false);
        let paystack_whitelist = configure_whitelist(env::var("SPG_PAYSTACK_IP_WHITELIST").ok());
        Ok(Self {
            host,
            port,
            database_url,
            paystack,
            webhook_secret,
            webhook_signature_header,
            fcm_server_key,
            fcm_url,
            callback_url,
            order_reference_prefix,
            currency,
            split_policy,
            fee_schedule,
            provider_timeout,
            push_timeout,
            use_x_forwarded_for,
            use_forwarded,
            paystack_whitelist,
        })
    }

    pub fn payment_config(&self) -> PaymentConfig {
        PaymentConfig {
            callback_url: self.callback_url.clone(),
            split_policy: self.split_policy,
            provider_timeout: self.provider_timeout,
        }
    }
}

fn required_var(name: &str) -> Result<String, ServerError> {
    match env::var(name) {
        Ok(s) if !s.trim().is_empty() => Ok(s),
        _ => {
            error!("🪛️ {name} is not set. The server cannot start without it.");
            Err(ServerError::ConfigurationError(format!("{name} must be set")))
        },
    }
}

fn duration_secs(name: &str, default: Duration) -> Duration {
    env::var(name)
        .map_err(|_| info!("🪛️ {name} is not set. Using the default value of {}s.", default.as_secs()))
        .and_then(|s| {
            s.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| warn!("🪛️ Invalid value for {name}. {e}"))
        })
        .ok()
        .unwrap_or(default)
}

fn configure_split_policy() -> Result<SplitPolicy, ServerError> {
    let share = env::var("SPG_MERCHANT_SHARE_PERCENT")
        .ok()
        .and_then(|s| {
            s.trim()
                .parse::<u8>()
                .ok()
                .filter(|v| *v <= 100)
                .or_else(|| {
                    warn!("🪛️ SPG_MERCHANT_SHARE_PERCENT must be a whole number from 0 to 100, not '{s}'.");
                    None
                })
        })
        .unwrap_or(DEFAULT_MERCHANT_SHARE_PERCENT);
    let mode = env::var("SPG_SPLIT_MODE").ok().unwrap_or_else(|| "fee_charge".into());
    let policy = SplitPolicy::from_mode(&mode, share).map_err(ServerError::ConfigurationError)?;
    info!("🪛️ Payment split policy: {policy}");
    Ok(policy)
}

fn configure_fee_schedule() -> Result<FeeSchedule, ServerError> {
    let defaults = FeeSchedule::default();
    let schedule = FeeSchedule {
        processor_rate_bps: parse_var("SPG_PROCESSOR_RATE_BPS", defaults.processor_rate_bps)?,
        processor_fixed_fee: major_units_var("SPG_PROCESSOR_FIXED_FEE", defaults.processor_fixed_fee)?,
        fixed_fee_waiver_threshold: major_units_var(
            "SPG_FIXED_FEE_WAIVER_THRESHOLD",
            defaults.fixed_fee_waiver_threshold,
        )?,
        processor_fee_cap: major_units_var("SPG_PROCESSOR_FEE_CAP", defaults.processor_fee_cap)?,
        platform_rate_bps: parse_var("SPG_PLATFORM_RATE_BPS", defaults.platform_rate_bps)?,
    };
    if schedule != defaults {
        info!("🪛️ Using a custom fee schedule: {schedule:?}");
    }
    Ok(schedule)
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().map_err(|e| ServerError::ConfigurationError(format!("{name}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Fee amounts are configured in major units (e.g. `100` for NGN 100).
fn major_units_var(name: &str, default: MinorUnits) -> Result<MinorUnits, ServerError> {
    let Some(amount) = env::var(name).ok().map(|s| s.trim().to_string()) else {
        return Ok(default);
    };
    let amount = Decimal::from_str(&amount).map_err(|e| ServerError::ConfigurationError(format!("{name}: {e}")))?;
    MinorUnits::from_major(amount).map_err(|e| ServerError::ConfigurationError(format!("{name}: {e}")))
}

fn configure_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if ["none", "false", "0"].contains(&s.trim().to_lowercase().as_str()) {
            info!(
                "🪛️ Paystack IP whitelist is disabled. If this is not what you want, set SPG_PAYSTACK_IP_WHITELIST \
                 to a comma-separated list of IP addresses to enable it."
            );
            return None;
        }
        let ip_addrs = s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| {
                s.parse()
                    .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in SPG_PAYSTACK_IP_WHITELIST: {e}"))
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The Paystack IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 webhook deliveries."
            );
        },
        None => {
            info!("🪛️ No Paystack IP whitelist is set. Only signature validation will be used.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Paystack IP whitelist: {addrs}");
        },
    }
    whitelist
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub currency: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { use_x_forwarded_for: false, use_forwarded: false, currency: DEFAULT_CURRENCY_CODE.to_string() }
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            currency: config.currency.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn whitelist_parsing() {
        assert_eq!(configure_whitelist(None), None);
        assert_eq!(configure_whitelist(Some("None".into())), None);
        assert_eq!(configure_whitelist(Some("0".into())), None);
        let list = configure_whitelist(Some("52.31.139.75, 52.49.173.169,not-an-ip".into())).unwrap();
        assert_eq!(list, vec!["52.31.139.75".parse::<IpAddr>().unwrap(), "52.49.173.169".parse().unwrap()]);
        assert_eq!(configure_whitelist(Some("garbage".into())), Some(vec![]));
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.webhook_signature_header, "x-paystack-signature");
        assert_eq!(config.currency, "NGN");
        assert_eq!(config.provider_timeout, Duration::from_secs(15));
        assert_eq!(config.push_timeout, Duration::from_secs(5));
        assert!(config.webhook_secret.is_blank());
        let payment = config.payment_config();
        assert_eq!(payment.split_policy, SplitPolicy::FeeCharge { fallback_share: 95 });
        assert!(payment.callback_url.is_none());
    }
}
