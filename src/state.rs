use std::sync::Arc;
use std::time::Duration;

use crate::config::{Args, Secrets};
use crate::push::{PushSender, SubscriptionStore};
use crate::rate_limit::RateLimiter;
use crate::upstream::UpstreamClient;
// app's shared state

pub struct AppState {
    pub upstream: Option<UpstreamClient>, // None when no API key is configured
    pub rate_limiter: Arc<RateLimiter>,
    pub subscriptions: SubscriptionStore,
    pub push: Option<PushSender>, // None when no VAPID pair is configured
}

impl AppState {
    pub fn new(args: &Args, secrets: Secrets) -> Self {
        let upstream = secrets
            .api_key
            .map(|key| UpstreamClient::new(key, args.upstream_url.clone(), args.model.clone()));

        Self {
            upstream,
            rate_limiter: Arc::new(RateLimiter::new(
                args.rate_limit,
                Duration::from_secs(args.rate_window),
            )),
            subscriptions: SubscriptionStore::default(),
            push: secrets.vapid.map(PushSender::new),
        }
    }
}
