//! Push subscription registry and Web Push delivery.
//!
//! Subscriptions live in process memory only: a restart drops them, and a
//! second instance does not share them.

use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use web_push::{
    ContentEncoding, HyperWebPushClient, SubscriptionInfo, URL_SAFE_NO_PAD,
    VapidSignatureBuilder, WebPushClient as _, WebPushError, WebPushMessageBuilder,
};

use crate::models::PushSubscription;

// VAPID key material for signing outgoing pushes.
#[derive(Clone, Debug)]
pub struct VapidKeys {
    pub public_key: String,
    pub private_key: String,
    pub subject: String,
}

#[derive(Debug, Error)]
pub enum PushError {
    // the push service reported the endpoint gone; the caller should drop
    // the stored subscription
    #[error("subscription endpoint is gone")]
    Gone,

    #[error("invalid VAPID key material: {0}")]
    Vapid(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

// Long-lived delivery handle: the VAPID pair plus one push client reused
// across sends.
pub struct PushSender {
    vapid: VapidKeys,
    client: HyperWebPushClient,
}

impl PushSender {
    pub fn new(vapid: VapidKeys) -> Self {
        Self {
            vapid,
            client: HyperWebPushClient::new(),
        }
    }

    pub fn public_key(&self) -> &str {
        &self.vapid.public_key
    }

    // Signs with the VAPID pair, encrypts the JSON payload, and posts it
    // to the browser's push service.
    pub async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), PushError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );

        let mut signature =
            VapidSignatureBuilder::from_base64(&self.vapid.private_key, URL_SAFE_NO_PAD, &info)
                .map_err(|e| PushError::Vapid(e.to_string()))?;
        signature.add_claim("sub", self.vapid.subject.as_str());
        let signature = signature
            .build()
            .map_err(|e| PushError::Vapid(e.to_string()))?;

        let body = serde_json::to_vec(payload).map_err(|e| PushError::Delivery(e.to_string()))?;

        let mut message = WebPushMessageBuilder::new(&info);
        message.set_payload(ContentEncoding::Aes128Gcm, &body);
        message.set_vapid_signature(signature);
        let message = message
            .build()
            .map_err(|e| PushError::Delivery(e.to_string()))?;

        self.client.send(message).await.map_err(classify_send_error)
    }
}

fn classify_send_error(err: WebPushError) -> PushError {
    match err {
        WebPushError::EndpointNotFound | WebPushError::EndpointNotValid => PushError::Gone,
        other => PushError::Delivery(other.to_string()),
    }
}

// In-memory registry keyed by user id.
pub struct SubscriptionStore {
    inner: DashMap<String, PushSubscription>,
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn save(&self, id: String, subscription: PushSubscription) {
        self.inner.insert(id, subscription);
    }

    pub fn get(&self, id: &str) -> Option<PushSubscription> {
        self.inner.get(id).map(|entry| entry.clone())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.inner.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for SubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

// Deterministic id from the endpoint URL; re-subscribing the same browser
// reuses the id, and unsubscribe-by-endpoint re-derives it.
pub fn derive_user_id(endpoint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(endpoint);
    let digest = format!("{:x}", hasher.finalize());
    format!("user_{}", &digest[..16])
}

// Payload the service worker reads out of the push event.
#[derive(Serialize, Debug)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
