//! Client for the local inference endpoint.
//!
//! The pipeline only depends on [`ModelClient`]; [`OllamaClient`] speaks the
//! Ollama `/api/generate` protocol with streaming disabled.

use crate::{
    config::ModelConfig,
    error::{Error, Result},
};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Turns a prompt into generated text.
pub trait ModelClient {
    /// Sends one prompt and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if generation fails for any reason.
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<F> ModelClient for F
where
    F: Fn(&str) -> Result<String>,
{
    fn generate(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Blocking client for an Ollama-compatible endpoint.
///
/// Makes exactly one attempt per prompt.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    url: String,
    model: String,
    temperature: Option<f32>,
}

impl OllamaClient {
    /// Creates a client from endpoint settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            url: format!("{}/api/generate", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Returns the model identifier sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ModelClient for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: self.temperature.map(|temperature| GenerateOptions { temperature }),
        };

        debug!("POST {} (model={}, {} prompt bytes)", self.url, self.model, prompt.len());
        let response = self.http.post(&self.url).json(&request).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(Error::model(format!(
                "endpoint returned {status}: {}",
                detail.trim()
            )));
        }

        let body: GenerateResponse = response.json()?;
        if let Some(tokens) = body.eval_count {
            trace!("Model generated {} tokens", tokens);
        }

        if body.response.is_empty() {
            return Err(Error::model("model returned an empty response"));
        }

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    /// Serves one canned HTTP response and returns the raw request it saw.
    fn one_shot_server(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut payload = vec![0; content_length];
            reader.read_exact(&mut payload).unwrap();
            request.push_str(&String::from_utf8(payload).unwrap());

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            request
        });

        (endpoint, handle)
    }

    fn client_for(endpoint: &str) -> OllamaClient {
        OllamaClient::new(&ModelConfig {
            endpoint: endpoint.to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(5),
            temperature: None,
        })
        .unwrap()
    }

    #[test]
    fn test_generate_success() {
        let (endpoint, server) = one_shot_server(
            "200 OK",
            r##"{"model":"test-model","response":"# Formatted","done":true,"eval_count":3}"##,
        );

        let text = client_for(&endpoint).generate("format me").unwrap();
        assert_eq!(text, "# Formatted");

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/generate"));
        assert!(request.contains(r#""model":"test-model""#));
        assert!(request.contains(r#""prompt":"format me""#));
        assert!(request.contains(r#""stream":false"#));
        assert!(!request.contains("options"));
    }

    #[test]
    fn test_generate_sends_temperature() {
        let (endpoint, server) = one_shot_server("200 OK", r#"{"response":"ok"}"#);

        let client = OllamaClient::new(&ModelConfig {
            endpoint: format!("{endpoint}/"),
            model: "m".to_string(),
            timeout: Duration::from_secs(5),
            temperature: Some(0.5),
        })
        .unwrap();
        client.generate("p").unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/generate "));
        assert!(request.contains(r#""options":{"temperature":0.5}"#));
    }

    #[test]
    fn test_generate_error_status_surfaces_message() {
        let (endpoint, server) =
            one_shot_server("404 Not Found", r#"{"error":"model 'test-model' not found"}"#);

        let err = client_for(&endpoint).generate("p").unwrap_err();
        server.join().unwrap();

        assert!(err.is_model());
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("model 'test-model' not found"));
    }

    #[test]
    fn test_generate_empty_response_fails() {
        let (endpoint, server) = one_shot_server("200 OK", r#"{"response":"","done":true}"#);

        let err = client_for(&endpoint).generate("p").unwrap_err();
        server.join().unwrap();

        assert!(err.is_model());
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_generate_invalid_body_fails() {
        let (endpoint, server) = one_shot_server("200 OK", r#"{"unexpected":true}"#);

        let err = client_for(&endpoint).generate("p").unwrap_err();
        server.join().unwrap();

        assert!(err.is_model());
    }

    #[test]
    fn test_generate_unreachable_endpoint() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = client_for(&format!("http://127.0.0.1:{port}"))
            .generate("p")
            .unwrap_err();

        assert!(err.is_model());
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn test_generate_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(800));
            drop(stream);
        });

        let client = OllamaClient::new(&ModelConfig {
            endpoint,
            model: "m".to_string(),
            timeout: Duration::from_millis(200),
            temperature: None,
        })
        .unwrap();

        let err = client.generate("p").unwrap_err();
        server.join().unwrap();

        assert!(err.is_model());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_closure_as_model_client() {
        let stub = |prompt: &str| -> Result<String> { Ok(prompt.to_uppercase()) };
        assert_eq!(stub.generate("abc").unwrap(), "ABC");
    }
}
