use crate::error::FundWarnCode;
use crate::fund::config::NudgeConfig;
use crate::fund::model::Person;
use crate::fund::warn::{self, WarnEvent};
use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

pub const EMPTY_RESPONSE_FALLBACK: &str = "Kahve hayattır, lütfen ödeme yapalım! ☕";
pub const ERROR_FALLBACK: &str = "Şu an yaratıcılığım tıkandı ama kahve lazım! ☕";

const NOBODY_PAID: &str = "Henüz kimse vermedi :(";
const EVERYBODY_PAID: &str = "Herkes ödedi! Harika!";

pub trait MessageGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

pub struct GeminiGenerator {
    api_key: String,
    model: String,
    temperature: f64,
    timeout: Duration,
}

impl GeminiGenerator {
    /// `None` when no API key is configured.
    pub fn from_config(config: &NudgeConfig) -> Option<Self> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return None;
        }
        Some(Self {
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }
}

impl MessageGenerator for GeminiGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let payload = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        {"text": prompt}
                    ]
                }
            ],
            "generationConfig": {
                "temperature": self.temperature
            }
        });

        let client = Client::builder().timeout(self.timeout).build()?;
        let response = client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .map_err(reqwest::Error::without_url)?;
        if !response.status().is_success() {
            bail!("gemini call failed with status {}", response.status());
        }
        let json: Value = response.json().map_err(reqwest::Error::without_url)?;
        let text = json
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(|v| v.get("content"))
            .and_then(|v| v.get("parts"))
            .and_then(Value::as_array)
            .and_then(|parts| parts.first())
            .and_then(|v| v.get("text"))
            .and_then(Value::as_str)
            .context("gemini response missing text content")?;

        Ok(text.to_string())
    }
}

fn names(people: &[&Person]) -> String {
    people
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_prompt(zero: &[&Person], top: &[&Person]) -> String {
    let paid = match names(top) {
        n if n.is_empty() => NOBODY_PAID.to_string(),
        n => n,
    };
    let unpaid = match names(zero) {
        n if n.is_empty() => EVERYBODY_PAID.to_string(),
        n => n,
    };
    format!(
        "Sen ofis kahve fonunu yöneten eğlenceli, biraz sarkastik ama sevilen bir yapay zekasın.\n\n\
         Durum Raporu:\n\
         Parayı veren harika insanlar: {paid}\n\
         Henüz pamuk elleri cebe atmayanlar: {unpaid}\n\n\
         Görev:\n\
         Ofis grubuna (Slack/WhatsApp) atılacak kısa, komik ve tatlı-sert bir mesaj yaz.\n\
         Parayı vermeyenleri (isim vermeden genel konuşarak ya da çok tatlı sitem ederek) ödemeye teşvik et.\n\
         Kahvenin önemini vurgula. Türk ofis kültürüne uygun olsun. Emojiler kullan.\n\
         Maksimum 3 cümle olsun.\n"
    )
}

/// A short reminder for the group chat. Never fails: a missing generator or
/// a failed call yields a fixed fallback line.
pub fn motivation_message(
    generator: Option<&dyn MessageGenerator>,
    zero: &[&Person],
    top: &[&Person],
) -> String {
    let Some(generator) = generator else {
        warn::emit(WarnEvent {
            code: FundWarnCode::GeneratorFailed,
            stage: "nudge",
            action: "generate",
            reason: "missing-api-key",
            err: "no gemini api key configured",
        });
        return ERROR_FALLBACK.to_string();
    };
    match generator.generate(&build_prompt(zero, top)) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => EMPTY_RESPONSE_FALLBACK.to_string(),
        Err(err) => {
            warn::emit(WarnEvent {
                code: FundWarnCode::GeneratorFailed,
                stage: "nudge",
                action: "generate",
                reason: "request-failed",
                err: &format!("{err:#}"),
            });
            ERROR_FALLBACK.to_string()
        }
    }
}
