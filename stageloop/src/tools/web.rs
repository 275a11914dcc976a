use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::r#trait::Tool;
use super::ToolError;

/// Tool name for the web fetcher operation.
pub const TOOL_WEB_FETCHER: &str = "web_fetcher";

/// HTTP fetch tool (GET or POST).
///
/// HTTP and transport failures come back as a `Failed to fetch the URL. Reason: ...`
/// result, not as an error, so the model can reflect on them and try something else.
/// Only a payload without a string `url` is reported the same way with a hint about
/// the expected shape.
///
/// With [`body_only`](WebFetcherTool::body_only) the result is cut down to the
/// contents of the `<body>` element.
pub struct WebFetcherTool {
    client: reqwest::Client,
    body_only: bool,
}

impl Default for WebFetcherTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebFetcherTool {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Uses a custom client (timeouts, proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            body_only: false,
        }
    }

    /// Return only the `<body>` contents of HTML responses (builder).
    pub fn body_only(mut self) -> Self {
        self.body_only = true;
        self
    }

    async fn fetch(&self, payload: &Value) -> Result<String, String> {
        let url = payload
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("payload must contain a string \"url\", got {}", payload))?;

        let method = payload
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("GET")
            .to_uppercase();
        let mut request = match method.as_str() {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            other => return Err(format!("unsupported method: {} (use GET or POST)", other)),
        };

        if let Some(h) = payload.get("headers").and_then(|v| v.as_object()) {
            for (k, v) in h {
                if let Some(v_str) = v.as_str() {
                    request = request.header(k.as_str(), v_str);
                }
            }
        }

        if method == "POST" {
            match payload.get("body") {
                Some(Value::String(s)) => {
                    request = request
                        .body(s.clone())
                        .header("Content-Type", "text/plain; charset=utf-8");
                }
                Some(Value::Null) | None => {}
                Some(body) => request = request.json(body),
            }
        }

        debug!(url = %url, method = %method, "web_fetcher request");
        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {}", status));
        }
        let text = response.text().await.map_err(|e| e.to_string())?;
        Ok(if self.body_only {
            extract_body(&text).to_string()
        } else {
            text
        })
    }
}

/// Contents of the first `<body ...>` element, or the whole document when there is none.
fn extract_body(html: &str) -> &str {
    let lower = html.to_ascii_lowercase();
    let Some(open) = lower.find("<body") else {
        return html;
    };
    let Some(open_end) = lower[open..].find('>').map(|i| open + i + 1) else {
        return html;
    };
    match lower[open_end..].rfind("</body>") {
        Some(close) => html[open_end..open_end + close].trim(),
        None => html[open_end..].trim(),
    }
}

#[async_trait]
impl Tool for WebFetcherTool {
    fn name(&self) -> &str {
        TOOL_WEB_FETCHER
    }

    fn description(&self) -> &str {
        "Fetch the content of a URL explicitly mentioned by the user (GET), or send data to it (POST). Returns the response body as text."
    }

    fn instruction(&self) -> &str {
        r#"Required payload: {"url": "URL to request"}. Optional: "method" ("GET" or "POST", default GET), "body" (string or JSON object, POST only), "headers" (object of string values)."#
    }

    fn input_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "url": { "type": "string" },
                "method": { "type": "string", "enum": ["GET", "POST"] },
                "body": {},
                "headers": { "type": "object", "additionalProperties": { "type": "string" } }
            },
            "required": ["url"]
        }))
    }

    async fn call(&self, payload: Value) -> Result<String, ToolError> {
        Ok(match self.fetch(&payload).await {
            Ok(text) => text,
            Err(reason) => format!("Failed to fetch the URL. Reason: {}", reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_body_returns_inner_html() {
        let html = "<html><head><title>t</title></head><BODY class=\"x\"> <p>hi</p> </BODY></html>";
        assert_eq!(extract_body(html), "<p>hi</p>");
    }

    #[test]
    fn extract_body_without_body_tag_returns_input() {
        assert_eq!(extract_body("plain text"), "plain text");
    }

    #[tokio::test]
    async fn missing_url_is_reported_as_result() {
        let tool = WebFetcherTool::new();
        let out = tool.call(json!({"link": "x"})).await.unwrap();
        assert!(out.starts_with("Failed to fetch the URL."), "{}", out);
        assert!(out.contains("\"url\""), "{}", out);
    }

    #[tokio::test]
    async fn unsupported_method_is_reported_as_result() {
        let tool = WebFetcherTool::new();
        let out = tool
            .call(json!({"url": "http://127.0.0.1:9", "method": "DELETE"}))
            .await
            .unwrap();
        assert!(out.contains("unsupported method: DELETE"), "{}", out);
    }
}
