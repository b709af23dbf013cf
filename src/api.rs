use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::time::Duration;
use ureq::Agent;

pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

pub const RECORDS_ENDPOINT: &str = "records";
pub const GOALS_ENDPOINT: &str = "goals";
pub const ACHIEVEMENTS_ENDPOINT: &str = "achievements";

/// Blocking client for the training backend (read-only).
pub struct ApiClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and return its JSON body, unwrapping a `{"data": ...}`
    /// envelope when present.
    pub fn get(&self, path: &str) -> Result<Value> {
        let url = self.endpoint(path);
        let mut req = self.agent.get(&url).set("Accept", "application/json");
        if let Some(token) = &self.token {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }

        tracing::debug!(url = %url, auth = self.token.is_some(), "GET");
        match req.call() {
            Ok(resp) => {
                let body: Value = resp
                    .into_json()
                    .with_context(|| format!("decoding JSON from {url}"))?;
                Ok(unwrap_data(body))
            }
            Err(ureq::Error::Status(code, resp)) => {
                let message = resp
                    .into_json::<Value>()
                    .ok()
                    .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| format!("HTTP error! status: {code}"));
                bail!("GET {url} failed ({code}): {message}")
            }
            Err(e) => Err(e).with_context(|| format!("GET {url}")),
        }
    }

    /// Records are required; goals and achievements are optional and fall
    /// back to empty lists with a warning.
    pub fn fetch_bundle(&self) -> Result<Value> {
        let records = self.get(RECORDS_ENDPOINT)?;
        let goals = self.get_or_empty(GOALS_ENDPOINT);
        let achievements = self.get_or_empty(ACHIEVEMENTS_ENDPOINT);

        tracing::info!(
            records = records.as_array().map_or(0, Vec::len),
            goals = goals.as_array().map_or(0, Vec::len),
            achievements = achievements.as_array().map_or(0, Vec::len),
            "fetched from backend"
        );

        Ok(json!({
            "records": records,
            "goals": goals,
            "achievements": achievements,
        }))
    }

    fn get_or_empty(&self, path: &str) -> Value {
        self.get(path).unwrap_or_else(|e| {
            tracing::warn!(endpoint = path, err = %format!("{e:#}"), "fetch failed, using empty list");
            Value::Array(Vec::new())
        })
    }
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut obj) if obj.get("data").is_some_and(|d| !d.is_null()) => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one canned response; the join handle yields the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}/api/"), handle)
    }

    #[test]
    fn test_endpoint_join() {
        let c = ApiClient::new("http://example.test/api/", None);
        assert_eq!(c.endpoint("/records"), "http://example.test/api/records");
        assert_eq!(c.endpoint("goals"), "http://example.test/api/goals");
    }

    #[test]
    fn test_unwrap_data_envelope() {
        assert_eq!(unwrap_data(json!({"data": [1, 2]})), json!([1, 2]));
        assert_eq!(unwrap_data(json!([1])), json!([1]));
        assert_eq!(unwrap_data(json!({"data": null, "x": 1})), json!({"data": null, "x": 1}));
    }

    #[test]
    fn test_get_sends_bearer_token() {
        let (base, server) = serve_once("200 OK", r#"[{"date":"2024-05-01","distance":100}]"#);
        let client = ApiClient::new(&base, Some("abc".to_string()));

        let body = client.get(RECORDS_ENDPOINT).unwrap();
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let request = server.join().unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /api/records "));
        assert!(request.contains("authorization: bearer abc"));
    }

    #[test]
    fn test_get_reports_backend_message() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"message":"token expired"}"#);
        let client = ApiClient::new(&base, None);

        let err = client.get(RECORDS_ENDPOINT).unwrap_err();
        assert!(format!("{err:#}").contains("token expired"));

        let request = server.join().unwrap().to_ascii_lowercase();
        assert!(!request.contains("authorization"));
    }
}
