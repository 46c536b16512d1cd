//! Optional question phrasing through an external language model.
//!
//! The adapter only rewrites the wording of the next question. It is a
//! pluggable strategy: the deterministic policy always has a question ready,
//! and any adapter failure silently selects it.

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use triage_core::config::PhrasingConfig;
use triage_core::types::{Entities, Topics};

use crate::error::PhrasingError;
use crate::slots::Slots;

const SYSTEM_PROMPT: &str = "당신은 한국어 의학 챗봇입니다. 공감 문장은 쓰지 말고, 다음 단계에 꼭 필요한 \
구체적인 질문을 단 한 문장으로 반환하세요. 이미 답한 항목은 반복하지 않습니다. \
가능하면 예/아니오로 답할 수 있는 질문을 선호하세요. \
반드시 JSON만 출력하세요: \
{\"followup\": \"질문?\", \"yesno_options\": [\"선택지1\",\"선택지2\"]}";

const STYLE_RULE: &str = "질문은 1개, 공감문 금지, 한국어 존댓말";

/// Everything the adapter may look at for one turn.
#[derive(Debug, Clone, Copy)]
pub struct PhrasingRequest<'a> {
    pub entities: &'a Entities,
    pub topics: &'a Topics,
    pub slots: &'a Slots,
    pub utterance: &'a str,
}

/// A question produced by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhrasedQuestion {
    pub question: String,
    pub choices: Vec<String>,
}

/// Strategy for producing the next question's wording.
pub trait PhrasingAdapter: Send + Sync {
    fn phrase(&self, request: &PhrasingRequest<'_>) -> Result<PhrasedQuestion, PhrasingError>;
}

/// Raw model output.
#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    followup: Option<String>,
    #[serde(default)]
    yesno_options: Option<Vec<String>>,
}

/// Parse the model's JSON content into a question.
///
/// A blank `followup` is an error. Missing `yesno_options` yield no choices.
pub fn parse_completion(content: &str) -> Result<PhrasedQuestion, PhrasingError> {
    let completion: Completion = serde_json::from_str(content.trim())
        .map_err(|e| PhrasingError::InvalidJson(format!("model output is not valid JSON: {}", e)))?;

    let question = completion
        .followup
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(PhrasingError::EmptyQuestion)?;

    let choices = completion
        .yesno_options
        .unwrap_or_default()
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    Ok(PhrasedQuestion { question, choices })
}

// =============================================================================
// RemotePhrasingAdapter
// =============================================================================

/// Adapter backed by an OpenAI-compatible chat-completions endpoint.
pub struct RemotePhrasingAdapter {
    config: PhrasingConfig,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl RemotePhrasingAdapter {
    pub fn new(config: PhrasingConfig) -> Result<Self, PhrasingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PhrasingError::Http(format!("failed to create HTTP client: {}", e)))?;
        let api_key = config.resolve_api_key();

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn request_body(&self, request: &PhrasingRequest<'_>) -> serde_json::Value {
        let context = serde_json::json!({
            "entities": request.entities,
            "context_topics": request.topics,
            "slots": request.slots,
            "rule": STYLE_RULE,
        });

        serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": format!("사용자 입력: {}", request.utterance)},
                {"role": "user", "content": format!("컨텍스트: {}", context)},
            ],
            "temperature": self.config.temperature,
            "response_format": {"type": "json_object"},
        })
    }
}

impl PhrasingAdapter for RemotePhrasingAdapter {
    fn phrase(&self, request: &PhrasingRequest<'_>) -> Result<PhrasedQuestion, PhrasingError> {
        if !self.config.enabled {
            return Err(PhrasingError::Disabled);
        }

        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let mut http = self.client.post(&url).json(&self.request_body(request));
        if let Some(api_key) = &self.api_key {
            http = http.bearer_auth(api_key);
        }

        let response = http.send().map_err(|e| {
            if e.is_timeout() {
                PhrasingError::Timeout(self.config.timeout_secs)
            } else {
                PhrasingError::Http(format!("request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(PhrasingError::Http(format!(
                "HTTP {} from phrasing endpoint",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| PhrasingError::InvalidJson(format!("failed to parse response: {}", e)))?;

        let content = body
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .ok_or(PhrasingError::EmptyQuestion)?;

        parse_completion(content)
    }
}

// =============================================================================
// FakePhrasingAdapter
// =============================================================================

/// Scripted adapter for tests and offline runs.
///
/// Replies are consumed in order; the last one repeats forever.
pub struct FakePhrasingAdapter {
    replies: Mutex<Vec<Result<PhrasedQuestion, PhrasingError>>>,
    calls: Mutex<usize>,
}

impl FakePhrasingAdapter {
    pub fn new(replies: Vec<Result<PhrasedQuestion, PhrasingError>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(0),
        }
    }

    pub fn always(question: &str, choices: &[&str]) -> Self {
        Self::new(vec![Ok(PhrasedQuestion {
            question: question.to_string(),
            choices: choices.iter().map(|c| (*c).to_string()).collect(),
        })])
    }

    pub fn always_error(error: PhrasingError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PhrasingAdapter for FakePhrasingAdapter {
    fn phrase(&self, _request: &PhrasingRequest<'_>) -> Result<PhrasedQuestion, PhrasingError> {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        match replies.len() {
            0 => Err(PhrasingError::EmptyQuestion),
            1 => replies[0].clone(),
            _ => replies.remove(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_parts() -> (Entities, Topics, Slots) {
        (Entities::default(), Topics::new(), Slots::default())
    }

    // ---- parse_completion ----

    #[test]
    fn test_parse_completion_with_choices() {
        let q = parse_completion(
            r#"{"followup": "통증이 팔로 퍼지나요?", "yesno_options": ["네. 퍼집니다.", "아니요."]}"#,
        )
        .unwrap();
        assert_eq!(q.question, "통증이 팔로 퍼지나요?");
        assert_eq!(q.choices, vec!["네. 퍼집니다.", "아니요."]);
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let q = parse_completion(r#"{"followup": "언제 처음 느끼셨나요?"}"#).unwrap();
        assert!(q.choices.is_empty());

        let q = parse_completion(r#"{"followup": " 구토를 하셨나요? ", "yesno_options": ["", " "]}"#)
            .unwrap();
        assert_eq!(q.question, "구토를 하셨나요?");
        assert!(q.choices.is_empty());
    }

    #[test]
    fn test_parse_completion_blank_followup_is_error() {
        assert!(matches!(
            parse_completion(r#"{"followup": "   "}"#),
            Err(PhrasingError::EmptyQuestion)
        ));
        assert!(matches!(
            parse_completion(r#"{"yesno_options": ["네"]}"#),
            Err(PhrasingError::EmptyQuestion)
        ));
    }

    #[test]
    fn test_parse_completion_invalid_json() {
        assert!(matches!(
            parse_completion("질문: 어디가 아프세요?"),
            Err(PhrasingError::InvalidJson(_))
        ));
    }

    // ---- RemotePhrasingAdapter ----

    #[test]
    fn test_remote_disabled_short_circuits() {
        let adapter = RemotePhrasingAdapter::new(PhrasingConfig::default()).unwrap();
        let (e, t, s) = request_parts();
        let req = PhrasingRequest {
            entities: &e,
            topics: &t,
            slots: &s,
            utterance: "가슴이 아파요",
        };
        assert!(matches!(adapter.phrase(&req), Err(PhrasingError::Disabled)));
    }

    #[test]
    fn test_remote_request_body_shape() {
        let config = PhrasingConfig {
            model: "test-model".to_string(),
            ..PhrasingConfig::default()
        };
        let adapter = RemotePhrasingAdapter::new(config).unwrap();
        let (e, t, s) = request_parts();
        let req = PhrasingRequest {
            entities: &e,
            topics: &t,
            slots: &s,
            utterance: "숨이 차요",
        };
        let body = adapter.request_body(&req);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "사용자 입력: 숨이 차요");
        assert!(body["messages"][2]["content"]
            .as_str()
            .unwrap()
            .starts_with("컨텍스트: "));
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_remote_unreachable_endpoint_is_error() {
        let config = PhrasingConfig {
            enabled: true,
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..PhrasingConfig::default()
        };
        let adapter = RemotePhrasingAdapter::new(config).unwrap();
        let (e, t, s) = request_parts();
        let req = PhrasingRequest {
            entities: &e,
            topics: &t,
            slots: &s,
            utterance: "배가 아파요",
        };
        assert!(adapter.phrase(&req).is_err());
    }

    // ---- FakePhrasingAdapter ----

    #[test]
    fn test_fake_adapter_sequence() {
        let fake = FakePhrasingAdapter::new(vec![
            Ok(PhrasedQuestion {
                question: "첫 질문?".to_string(),
                choices: vec![],
            }),
            Err(PhrasingError::Timeout(5)),
        ]);
        let (e, t, s) = request_parts();
        let req = PhrasingRequest {
            entities: &e,
            topics: &t,
            slots: &s,
            utterance: "",
        };
        assert_eq!(fake.phrase(&req).unwrap().question, "첫 질문?");
        assert!(fake.phrase(&req).is_err());
        assert!(fake.phrase(&req).is_err());
        assert_eq!(fake.call_count(), 3);
    }
}
