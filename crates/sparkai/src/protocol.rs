//! Wire format of the chat channel.
//!
//! Outbound: one request frame per session carrying the app id, sampling
//! parameters, message history and optional function definitions.
//! Inbound: a stream of response frames, each with a status header and the
//! next content delta; the last one also carries usage.

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::SparkConfig;
use crate::{ChatRequest, FunctionCall, FunctionDefinition, Message, Result, Usage};

/// `choices.status` / `header.status` value that marks the last frame.
pub const STATUS_FINAL: u8 = 2;

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RequestFrame {
    pub header: RequestHeader,
    pub parameter: RequestParameter,
    pub payload: RequestPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestHeader {
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestParameter {
    pub chat: ChatParameter,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatParameter {
    pub domain: String,
    pub temperature: f64,
    pub top_k: u32,
    pub max_tokens: u32,
    pub auditing: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestPayload {
    pub message: TextList<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<TextList<FunctionDefinition>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextList<T> {
    pub text: Vec<T>,
}

impl RequestFrame {
    /// Resolve `request` against `config`, filling every unset parameter
    /// with the configured default.
    pub fn build(config: &SparkConfig, request: ChatRequest) -> Self {
        let domain = request
            .domain
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| config.domain.clone());
        let functions = if request.functions.is_empty() {
            None
        } else {
            Some(TextList {
                text: request.functions,
            })
        };

        Self {
            header: RequestHeader {
                app_id: config.app_id.clone(),
            },
            parameter: RequestParameter {
                chat: ChatParameter {
                    domain,
                    temperature: request.temperature.unwrap_or(config.temperature),
                    top_k: request.top_k.unwrap_or(config.top_k),
                    max_tokens: request.max_tokens.unwrap_or(config.max_tokens),
                    auditing: config.auditing.clone(),
                },
            },
            payload: RequestPayload {
                message: TextList {
                    text: request.messages,
                },
                functions,
            },
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseFrame {
    pub header: ResponseHeader,
    #[serde(default)]
    pub payload: Option<ResponsePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseHeader {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sid: String,
    #[serde(default)]
    pub status: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePayload {
    pub choices: Choices,
    #[serde(default)]
    pub usage: Option<UsagePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choices {
    pub status: u8,
    #[serde(default)]
    pub seq: u32,
    #[serde(default)]
    pub text: Vec<ChoiceText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceText {
    #[serde(default)]
    pub index: u32,
    #[serde(default, deserialize_with = "wire_role")]
    pub role: Option<crate::Role>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

/// Usage arrives either flat or nested under `text`, depending on the API
/// version.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UsagePayload {
    Nested { text: Usage },
    Flat(Usage),
}

impl UsagePayload {
    pub fn into_usage(self) -> Usage {
        match self {
            UsagePayload::Nested { text } => text,
            UsagePayload::Flat(usage) => usage,
        }
    }
}

/// Roles arrive as free-form strings; see [`crate::Role::from_wire`].
fn wire_role<'de, D>(deserializer: D) -> std::result::Result<Option<crate::Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.map(|n| crate::Role::from_wire(&n)))
}

/// Keep function-call arguments verbatim: a JSON string is taken as-is, any
/// other JSON value is kept in its serialized form.
pub(crate) fn raw_arguments<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(raw) => raw,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn config() -> SparkConfig {
        SparkConfig::new("app-123", "key", "secret").with_domain("generalv3.5")
    }

    #[test]
    fn build_applies_configured_defaults() {
        let frame = RequestFrame::build(&config(), ChatRequest::new(vec![Message::user("hi")]));
        let json: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();

        assert_eq!(json["header"]["app_id"], "app-123");
        assert_eq!(json["parameter"]["chat"]["domain"], "generalv3.5");
        assert_eq!(json["parameter"]["chat"]["temperature"], 0.8);
        assert_eq!(json["parameter"]["chat"]["top_k"], 6);
        assert_eq!(json["parameter"]["chat"]["max_tokens"], 2048);
        assert_eq!(json["parameter"]["chat"]["auditing"], "default");
        assert_eq!(json["payload"]["message"]["text"][0]["role"], "user");
        assert_eq!(json["payload"]["message"]["text"][0]["content"], "hi");
        assert!(json["payload"].get("functions").is_none());
    }

    #[test]
    fn explicit_zero_temperature_is_sent() {
        let request = ChatRequest::new(vec![Message::user("hi")])
            .with_temperature(0.0)
            .with_top_k(1)
            .with_max_tokens(64)
            .with_domain("4.0Ultra");
        let frame = RequestFrame::build(&config(), request);

        assert_eq!(frame.parameter.chat.temperature, 0.0);
        assert_eq!(frame.parameter.chat.top_k, 1);
        assert_eq!(frame.parameter.chat.max_tokens, 64);
        assert_eq!(frame.parameter.chat.domain, "4.0Ultra");
    }

    #[test]
    fn empty_request_domain_falls_back_to_config() {
        let request = ChatRequest::new(vec![Message::user("hi")]).with_domain("");
        let frame = RequestFrame::build(&config(), request);
        assert_eq!(frame.parameter.chat.domain, "generalv3.5");
    }

    #[test]
    fn functions_are_encoded_under_text() {
        let request = ChatRequest::new(vec![Message::user("weather?")]).with_functions(vec![
            FunctionDefinition {
                name: "get_weather".into(),
                description: "look up the weather".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": { "city": { "type": "string" } },
                    "required": ["city"],
                }),
            },
        ]);
        let frame = RequestFrame::build(&config(), request);
        let json: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();

        let functions = &json["payload"]["functions"]["text"];
        assert_eq!(functions[0]["name"], "get_weather");
        assert_eq!(functions[0]["parameters"]["required"][0], "city");
    }

    #[test]
    fn function_turns_are_encoded() {
        let call = FunctionCall {
            name: "get_weather".into(),
            arguments: r#"{"city":"Hefei"}"#.into(),
        };
        let request = ChatRequest::new(vec![
            Message::user("weather?"),
            Message::assistant_function_call(call),
            Message::function("get_weather", "sunny"),
        ]);
        let frame = RequestFrame::build(&config(), request);
        let json: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();

        let text = &json["payload"]["message"]["text"];
        assert!(text[0].get("name").is_none());
        assert!(text[0].get("function_call").is_none());
        assert_eq!(text[1]["role"], "assistant");
        assert_eq!(text[1]["function_call"]["name"], "get_weather");
        assert_eq!(text[1]["function_call"]["arguments"], r#"{"city":"Hefei"}"#);
        assert_eq!(text[2]["role"], "function");
        assert_eq!(text[2]["name"], "get_weather");
        assert_eq!(text[2]["content"], "sunny");
    }

    #[test]
    fn response_frame_with_nested_usage() {
        let raw = r#"{
            "header": {"code": 0, "message": "Success", "sid": "cht000cb087", "status": 2},
            "payload": {
                "choices": {"status": 2, "seq": 3, "text": [{"content": "!", "role": "assistant", "index": 0}]},
                "usage": {"text": {"question_tokens": 4, "prompt_tokens": 5, "completion_tokens": 9, "total_tokens": 14}}
            }
        }"#;
        let frame: ResponseFrame = serde_json::from_str(raw).unwrap();
        let payload = frame.payload.unwrap();
        assert_eq!(payload.choices.status, STATUS_FINAL);
        assert_eq!(payload.choices.text[0].role, Some(Role::Assistant));

        let usage = payload.usage.unwrap().into_usage();
        assert_eq!(usage.prompt_tokens, 5);
        assert_eq!(usage.completion_tokens, 9);
        assert_eq!(usage.total_tokens, 14);
    }

    #[test]
    fn response_frame_with_flat_usage() {
        let raw = r#"{
            "header": {"code": 0, "sid": "s", "status": 2},
            "payload": {
                "choices": {"status": 2, "seq": 0, "text": []},
                "usage": {"prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3}
            }
        }"#;
        let frame: ResponseFrame = serde_json::from_str(raw).unwrap();
        let usage = frame.payload.unwrap().usage.unwrap().into_usage();
        assert_eq!(usage.total_tokens, 3);
    }

    #[test]
    fn function_call_arguments_kept_verbatim() {
        let raw = r#"{"name": "get_weather", "arguments": "{\"city\": \"Hefei\"}"}"#;
        let call: FunctionCall = serde_json::from_str(raw).unwrap();
        assert_eq!(call.arguments, "{\"city\": \"Hefei\"}");

        let raw = r#"{"name": "get_weather", "arguments": {"city": "Hefei"}}"#;
        let call: FunctionCall = serde_json::from_str(raw).unwrap();
        assert_eq!(call.arguments, "{\"city\":\"Hefei\"}");
    }

    #[test]
    fn error_frame_without_payload() {
        let raw = r#"{"header": {"code": 10105, "message": "illegal access", "sid": "x", "status": 2}}"#;
        let frame: ResponseFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.header.code, 10105);
        assert!(frame.payload.is_none());
    }
}
