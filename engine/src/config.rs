use anyhow::anyhow;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    /// Business timezone used to derive "today" for capture-time checks.
    pub time_zone: Tz,
    /// Regular working hours per day before time counts as overtime.
    pub daily_regular_hours: Decimal,
    /// Maximum overtime hours per day before the compliance flag is raised.
    pub daily_overtime_limit: Decimal,
    /// Hour of day (0-23) from which overtime counts as night overtime.
    pub night_overtime_start_hour: u32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/worktally".to_string());

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "Asia/Dubai".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let daily_regular_hours = decimal_env("DAILY_REGULAR_HOURS", "8")?;
        let daily_overtime_limit = decimal_env("DAILY_OVERTIME_LIMIT", "2")?;

        let night_overtime_start_hour: u32 = env::var("NIGHT_OVERTIME_START_HOUR")
            .unwrap_or_else(|_| "22".to_string())
            .parse()
            .unwrap_or(22);
        if night_overtime_start_hour > 23 {
            return Err(anyhow!(
                "NIGHT_OVERTIME_START_HOUR must be 0-23, got {}",
                night_overtime_start_hour
            ));
        }

        Ok(Config {
            database_url,
            time_zone,
            daily_regular_hours,
            daily_overtime_limit,
            night_overtime_start_hour,
        })
    }
}

fn decimal_env(name: &str, default: &str) -> anyhow::Result<Decimal> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    Decimal::from_str(&raw).map_err(|_| anyhow!("Invalid {} value: {}", name, raw))
}
