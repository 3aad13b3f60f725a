use std::env;

use clap::Parser;
use tracing::warn;

use crate::push::VapidKeys;

// CLI argument structure. Credentials come only from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "renalplate")]
#[command(about = "Food safety and medication reminder API for kidney transplant recipients")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Base URL of the OpenAI-compatible model provider
    #[arg(long, default_value = "https://openrouter.ai/api/v1")]
    pub upstream_url: String,

    // Vision-capable model id to request
    #[arg(long, default_value = "openai/gpt-4o-mini")]
    pub model: String,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    // Seconds between sweeps of expired rate limit entries
    #[arg(long, default_value_t = 300)]
    pub sweep_interval: u64,
}

// Environment-sourced credentials. A missing credential disables its
// feature; it never stops the server from starting.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub api_key: Option<String>,
    pub vapid: Option<VapidKeys>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let api_key = non_empty_var("OPENROUTER_API_KEY");
        if api_key.is_none() {
            warn!("OPENROUTER_API_KEY not set, analysis and meal endpoints disabled");
        }

        let vapid = match (
            non_empty_var("VAPID_PUBLIC_KEY"),
            non_empty_var("VAPID_PRIVATE_KEY"),
        ) {
            (Some(public_key), Some(private_key)) => Some(VapidKeys {
                public_key,
                private_key,
                subject: non_empty_var("VAPID_SUBJECT")
                    .unwrap_or_else(|| "mailto:support@renalplate.app".to_string()),
            }),
            (None, None) => {
                warn!("VAPID keys not set, push notifications disabled");
                None
            }
            _ => {
                warn!("VAPID key pair incomplete, push notifications disabled");
                None
            }
        };

        Self { api_key, vapid }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
