use std::env;

pub const DEFAULT_STARTER_MONTHLY_REPORT_LIMIT: i64 = 5;
pub const DEFAULT_PROFESSIONAL_MONTHLY_REPORT_LIMIT: i64 = 50;

pub struct StripeSettings {
    pub secret_key: String,
    /// Price charged for a single report bought outside the plan allowance.
    pub report_price_id: String,
}

pub struct Config {
    pub database_url: String,
    pub frontend_origin: String,
    pub stripe: StripeSettings,
    pub starter_monthly_report_limit: i64,
    pub professional_monthly_report_limit: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok(); // Load .env file

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let frontend_origin = env::var("FRONTEND_ORIGIN").expect("FRONTEND_ORIGIN must be set");

        let stripe = StripeSettings {
            secret_key: env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY must be set"),
            report_price_id: env::var("STRIPE_REPORT_PRICE_ID")
                .expect("STRIPE_REPORT_PRICE_ID must be set"),
        };

        let starter_monthly_report_limit = env::var("STARTER_MONTHLY_REPORT_LIMIT")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_STARTER_MONTHLY_REPORT_LIMIT);
        let professional_monthly_report_limit = env::var("PROFESSIONAL_MONTHLY_REPORT_LIMIT")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_PROFESSIONAL_MONTHLY_REPORT_LIMIT);

        Config {
            database_url,
            frontend_origin,
            stripe,
            starter_monthly_report_limit,
            professional_monthly_report_limit,
        }
    }
}
