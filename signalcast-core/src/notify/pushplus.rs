//! PushPlus (WeChat push) transport.
//!
//! One POST per payload with the `html` template. The service answers HTTP 200
//! even for refused messages, so the JSON `code` field is checked as well.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{NotificationPayload, Notifier, NotifyError};

pub const DEFAULT_ENDPOINT: &str = "http://www.pushplus.plus/send";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    token: &'a str,
    title: &'a str,
    content: &'a str,
    template: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    code: i64,
    #[serde(default)]
    msg: String,
}

pub struct PushPlusNotifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: String,
}

impl PushPlusNotifier {
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    fn check_response(status: u16, body: &str) -> Result<(), NotifyError> {
        if !(200..300).contains(&status) {
            return Err(NotifyError::Status {
                status,
                body: body.chars().take(200).collect(),
            });
        }
        // An unparseable 2xx body is treated as delivered.
        match serde_json::from_str::<SendResponse>(body) {
            Ok(resp) if resp.code != 200 => Err(NotifyError::Refused {
                code: resp.code,
                message: resp.msg,
            }),
            _ => Ok(()),
        }
    }
}

impl Notifier for PushPlusNotifier {
    fn name(&self) -> &str {
        "pushplus"
    }

    fn deliver(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let request = SendRequest {
            token: &self.token,
            title: &payload.title,
            content: &payload.body,
            template: "html",
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Self::check_response(status, &body)
    }
}
