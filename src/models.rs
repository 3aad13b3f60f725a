use serde::{Deserialize, Serialize};

// Categorical outcome of a food-safety analysis.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Safe,
    Caution,
    Avoid,
}

// Reply body for POST /api/analyze, parsed out of the model's text reply.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct AnalysisResult {
    pub verdict: Verdict,
    pub summary: String,
    pub analysis: String,
}

// One meal idea as the model is instructed to emit it.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Meal {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub tips: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct MealsResponse {
    pub meals: Vec<Meal>,
}

// Meal category allow-list. Requests carry free text; only these four
// tokens may reach the prompt template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealType {
    // Trimmed, case-insensitive match against the allow-list.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Some(Self::Breakfast),
            "lunch" => Some(Self::Lunch),
            "dinner" => Some(Self::Dinner),
            "snacks" => Some(Self::Snacks),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snacks => "snacks",
        }
    }
}

// Browser push subscription as produced by PushSubscription.toJSON().
// Unknown fields (expirationTime) are ignored.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub subscription: Option<PushSubscription>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SendPushRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}
