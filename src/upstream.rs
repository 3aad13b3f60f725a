//! Client for the hosted vision-language model, speaking the
//! OpenAI-compatible chat completions protocol.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::metrics::UPSTREAM_LATENCY;
use crate::models::MealType;

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

const ANALYSIS_SYSTEM_PROMPT: &str = "\
You are a dietitian assistant for kidney transplant recipients on \
immunosuppressant therapy. Assess the food shown in the patient's photos.

Weigh, in order of importance:
1. Immunosuppressant interactions: grapefruit, pomelo, Seville orange, \
starfruit, and pomegranate interfere with tacrolimus and cyclosporine.
2. Food-safety risk under immunosuppression: raw or undercooked meat, fish, \
or eggs; unpasteurized dairy or juice; raw sprouts; deli meats and soft \
cheeses unless steaming hot.
3. Renal diet load: potassium, phosphorus, and sodium content.
4. General post-transplant guidance: hydration, portion size, added sugar.

Reply in EXACTLY this format:
VERDICT: <safe|caution|avoid>
SUMMARY: <one sentence the patient can act on>
ANALYSIS:
<detailed assessment using ### section headers, - bullet lists, and \
**bold** for key warnings>

Never give a definitive medical ruling; when unsure choose caution and \
advise checking with the transplant team.";

const ANALYSIS_USER_PROMPT: &str =
    "Is this food safe for me to eat? Assess every item you can identify in the photos.";

const MEALS_SYSTEM_PROMPT: &str = "\
You plan meals for kidney transplant recipients on immunosuppressant \
therapy. Suggest food-safe, low-sodium meals that avoid grapefruit, \
pomegranate, starfruit, and raw or unpasteurized ingredients.";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected by the model provider")]
    Auth,

    #[error("model provider rate limit hit")]
    RateLimited,

    #[error("model provider error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("reply contained no completion text")]
    EmptyReply,
}

pub struct UpstreamClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl UpstreamClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    // Food-safety analysis over 1-4 data URL images. Returns the raw reply
    // text for `parse::parse_analysis`.
    pub async fn analyze_images(&self, images: &[String]) -> Result<String, UpstreamError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": ANALYSIS_SYSTEM_PROMPT },
                { "role": "user", "content": analysis_content(images) },
            ],
            "temperature": 0.2,
            "max_tokens": 1024,
        });
        self.complete(body).await
    }

    // Meal ideas for one allow-listed category. Returns the raw reply text
    // for `parse::parse_meals`.
    pub async fn meal_ideas(&self, meal_type: MealType) -> Result<String, UpstreamError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": MEALS_SYSTEM_PROMPT },
                { "role": "user", "content": meal_prompt(meal_type) },
            ],
            "temperature": 0.6,
            "max_tokens": 1500,
        });
        self.complete(body).await
    }

    async fn complete(&self, body: Value) -> Result<String, UpstreamError> {
        debug!(model = %self.model, "requesting chat completion");
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(COMPLETION_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Auth,
                StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited,
                _ => UpstreamError::Api {
                    status: status.as_u16(),
                    body: text,
                },
            });
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        UPSTREAM_LATENCY.observe(started.elapsed().as_secs_f64());

        reply["choices"][0]["message"]["content"]
            .as_str()
            .map(|text| text.to_string())
            .ok_or(UpstreamError::EmptyReply)
    }
}

// One text part followed by one image_url part per data URL; the URLs are
// forwarded exactly as uploaded.
fn analysis_content(images: &[String]) -> Vec<Value> {
    let mut content = vec![json!({ "type": "text", "text": ANALYSIS_USER_PROMPT })];
    for image in images {
        content.push(json!({ "type": "image_url", "image_url": { "url": image } }));
    }
    content
}

fn meal_prompt(meal_type: MealType) -> String {
    format!(
        "Suggest 6 {} ideas suitable for a kidney transplant recipient. \
         Respond with ONLY a JSON array, no prose and no code fence. Each \
         element must be an object with exactly these fields: \"name\" \
         (string), \"description\" (string, one sentence), \"ingredients\" \
         (array of strings), \"tips\" (string with renal-diet pointers such \
         as sodium or potassium notes).",
        meal_type.as_str()
    )
}
