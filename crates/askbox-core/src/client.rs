use std::iter::Peekable;
use std::str::Chars;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

use crate::error::AskError;

/// Shown when the endpoint answers without a usable `answer` field
pub const FALLBACK_ANSWER: &str = "Sorry, I could not find that information.";

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

/// What the endpoint said, already sanitized for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// True when `text` is the fallback rather than the endpoint's own words
    pub fallback: bool,
}

impl Answer {
    /// Pull the answer out of any JSON body. Anything other than a
    /// non-blank string under `answer` degrades to the fallback.
    pub fn from_json(body: &Value) -> Self {
        let text = body
            .get("answer")
            .and_then(Value::as_str)
            .map(sanitize_answer)
            .filter(|text| !text.trim().is_empty());

        match text {
            Some(text) => Self { text, fallback: false },
            None => Self {
                text: FALLBACK_ANSWER.to_string(),
                fallback: true,
            },
        }
    }
}

/// Strip terminal control sequences from endpoint text.
///
/// Keeps newlines and tabs and normalizes CRLF. Escape sequences are dropped
/// whole, in both the 7-bit (`ESC [`) and 8-bit (`U+009B`) forms, so no stray
/// `[31m` fragments or DCS/OSC payloads are left behind.
pub fn sanitize_answer(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' | '\t' => out.push(c),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    out.push('\n');
                }
            }
            '\u{1b}' => match chars.peek().copied() {
                Some('[') => {
                    chars.next();
                    skip_csi(&mut chars);
                }
                // OSC, DCS, SOS, PM, APC
                Some(']' | 'P' | 'X' | '^' | '_') => {
                    chars.next();
                    skip_control_string(&mut chars);
                }
                // Two-character escapes end in a final character
                Some('0'..='~') => {
                    chars.next();
                }
                _ => {}
            },
            '\u{9b}' => skip_csi(&mut chars),
            '\u{90}' | '\u{98}' | '\u{9d}' | '\u{9e}' | '\u{9f}' => {
                skip_control_string(&mut chars)
            }
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out
}

/// CSI parameters run until a final character in `@..~`
fn skip_csi(chars: &mut Peekable<Chars<'_>>) {
    for c in chars.by_ref() {
        if ('@'..='~').contains(&c) {
            break;
        }
    }
}

/// Control strings run until BEL or a string terminator (`ESC \` or U+009C)
fn skip_control_string(chars: &mut Peekable<Chars<'_>>) {
    while let Some(c) = chars.next() {
        match c {
            '\u{7}' | '\u{9c}' => break,
            '\u{1b}' if chars.peek() == Some(&'\\') => {
                chars.next();
                break;
            }
            _ => {}
        }
    }
}

/// Client for the single question-answering endpoint
#[derive(Clone)]
pub struct AskClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl AskClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("invalid endpoint URL: {}", endpoint))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn ask(&self, question: &str) -> Result<Answer, AskError> {
        let request = AskRequest { question };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(AskError::Status(response.status()));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let value: Value = serde_json::from_slice(&body).map_err(AskError::Decode)?;

        Ok(Answer::from_json(&value))
    }

    fn classify(&self, err: reqwest::Error) -> AskError {
        if err.is_timeout() {
            AskError::Timeout(self.timeout)
        } else {
            AskError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AskClient {
        AskClient::new(&format!("{}/ask", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_posts_question_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "question": "Who topped the table in 2018?" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "answer": "Sunrisers Hyderabad" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server).ask("Who topped the table in 2018?").await.unwrap();
        assert_eq!(answer.text, "Sunrisers Hyderabad");
        assert!(!answer.fallback);
    }

    #[tokio::test]
    async fn test_missing_answer_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let answer = client_for(&server).ask("anything").await.unwrap();
        assert_eq!(answer.text, FALLBACK_ANSWER);
        assert!(answer.fallback);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("anything").await.unwrap_err();
        assert!(matches!(err, AskError::Status(status) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("anything").await.unwrap_err();
        assert!(matches!(err, AskError::Decode(_)));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "answer": "late" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = AskClient::new(&server.uri(), Duration::from_millis(100)).unwrap();
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, AskError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = format!("http://{}/ask", addr);
        let client = AskClient::new(&endpoint, Duration::from_secs(5)).unwrap();
        let err = client.ask("anything").await.unwrap_err();
        assert!(matches!(err, AskError::Transport(_)));
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        assert!(AskClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_answer_shapes() {
        assert!(Answer::from_json(&json!({ "answer": null })).fallback);
        assert!(Answer::from_json(&json!({ "answer": 42 })).fallback);
        assert!(Answer::from_json(&json!({ "answer": "   " })).fallback);
        assert!(Answer::from_json(&json!(["answer"])).fallback);
        assert_eq!(
            Answer::from_json(&json!({ "answer": "Hello **world**" })).text,
            "Hello **world**"
        );
    }

    #[test]
    fn test_sanitize_strips_escape_sequences() {
        assert_eq!(sanitize_answer("\u{1b}[31mred\u{1b}[0m text"), "red text");
        assert_eq!(sanitize_answer("a\u{1b}]0;title\u{7}b"), "ab");
        assert_eq!(sanitize_answer("line1\r\nline2\rline3"), "line1\nline2\nline3");
        assert_eq!(sanitize_answer("bell\u{7}\ttab"), "bell\ttab");
        let markdown = "**bold** and [link](https://x.y)";
        assert_eq!(sanitize_answer(markdown), markdown);
    }

    #[test]
    fn test_sanitize_strips_control_strings_and_8bit_introducers() {
        assert_eq!(sanitize_answer("a\u{1b}Pq#0;2;0;0;0\u{1b}\\b"), "ab");
        assert_eq!(sanitize_answer("a\u{1b}_payload\u{7}b"), "ab");
        assert_eq!(sanitize_answer("a\u{1b}^private\u{9c}b"), "ab");
        assert_eq!(sanitize_answer("\u{9b}31mred\u{9b}0m"), "red");
        assert_eq!(sanitize_answer("a\u{90}dcs data\u{9c}b"), "ab");
        assert_eq!(sanitize_answer("x\u{1b}cy"), "xy");
    }
}
