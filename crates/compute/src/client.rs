use formats::protocol::{Definition, EvaluationRequest, EvaluationResponse, Param};
use tracing::{debug, info, warn};

use crate::config::{API_KEY_HEADER, ComputeConfig};
use crate::error::EvaluationError;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct EvaluationClient<T> {
    config: ComputeConfig,
    transport: T,
}

impl<T: Transport> EvaluationClient<T> {
    pub fn new(config: ComputeConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Loads the definition bytes. Called once per trigger; nothing is cached.
    pub async fn fetch_definition(&self, location: &str) -> Result<Definition, EvaluationError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(EvaluationError::Configuration(
                "Grasshopper definition path required".to_string(),
            ));
        }
        let bytes = self.transport.get_bytes(location).await.map_err(|e| {
            EvaluationError::Configuration(format!(
                "Failed to load Grasshopper file: {location} ({e})"
            ))
        })?;
        if bytes.is_empty() {
            return Err(EvaluationError::Configuration(format!(
                "Grasshopper file is empty: {location}"
            )));
        }
        Ok(Definition::new(bytes))
    }

    /// Sends the definition and inputs to the evaluator.
    ///
    /// Configuration problems are reported before anything touches the
    /// network; every later failure is an [`EvaluationError::Transport`].
    pub async fn evaluate(
        &self,
        definition: &Definition,
        params: &[Param],
    ) -> Result<EvaluationResponse, EvaluationError> {
        let url = self.config.grasshopper_url()?;
        if definition.is_empty() {
            return Err(EvaluationError::Configuration(
                "Grasshopper definition is empty".to_string(),
            ));
        }

        let request = EvaluationRequest::new(definition, params);
        let body = serde_json::to_string(&request)
            .map_err(|e| EvaluationError::Transport(format!("request encoding: {e}")))?;

        let mut headers: Vec<(&str, &str)> = Vec::new();
        if let Some(key) = self.config.api_key.as_deref() {
            headers.push((API_KEY_HEADER, key));
        }

        info!(
            %url,
            definition = definition.content_hash(),
            params = params.len(),
            "evaluating definition"
        );
        let raw = self
            .transport
            .post_json(&url, &headers, body)
            .await
            .map_err(|e| {
                warn!(error = %e, "evaluation request failed");
                EvaluationError::from(e)
            })?;

        let response: EvaluationResponse = serde_json::from_str(&raw)
            .map_err(|e| EvaluationError::Transport(format!("malformed response: {e}")))?;

        for w in &response.warnings {
            warn!(warning = %w, "evaluator warning");
        }
        for e in &response.errors {
            warn!(error = %e, "evaluator error");
        }
        debug!(
            groups = response.values.len(),
            items = response.item_count(),
            "evaluation response received"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::EvaluationClient;
    use crate::config::ComputeConfig;
    use crate::error::{EvaluationError, TransportError};
    use crate::transport::Transport;
    use formats::protocol::{Definition, Param};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct RecordingTransport {
        reply: Option<Result<String, TransportError>>,
        posts: RefCell<Vec<(String, Vec<(String, String)>, String)>>,
        gets: RefCell<Vec<String>>,
        file: Option<Vec<u8>>,
    }

    impl RecordingTransport {
        fn replying(reply: Result<String, TransportError>) -> Self {
            Self {
                reply: Some(reply),
                ..Default::default()
            }
        }
    }

    impl Transport for RecordingTransport {
        async fn post_json(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: String,
        ) -> Result<String, TransportError> {
            self.posts.borrow_mut().push((
                url.to_string(),
                headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body,
            ));
            self.reply
                .clone()
                .unwrap_or_else(|| Err(TransportError::network("no reply configured")))
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            self.gets.borrow_mut().push(url.to_string());
            self.file
                .clone()
                .ok_or_else(|| TransportError::status(404, "not found"))
        }
    }

    fn definition() -> Definition {
        Definition::new(b"gh-bytes".to_vec())
    }

    #[test]
    fn empty_endpoint_fails_before_any_request() {
        let client = EvaluationClient::new(
            ComputeConfig::new(""),
            RecordingTransport::replying(Ok("{}".into())),
        );
        let err = pollster::block_on(client.evaluate(&definition(), &[])).unwrap_err();
        assert!(err.is_configuration());
        assert!(client.transport().posts.borrow().is_empty());
    }

    #[test]
    fn empty_definition_fails_before_any_request() {
        let client = EvaluationClient::new(
            ComputeConfig::new("http://localhost:6500"),
            RecordingTransport::replying(Ok("{}".into())),
        );
        let err = pollster::block_on(client.evaluate(&Definition::new(Vec::new()), &[]))
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(client.transport().posts.borrow().is_empty());
    }

    #[test]
    fn posts_request_to_grasshopper_route() {
        let client = EvaluationClient::new(
            ComputeConfig::new("http://localhost:6500/").with_api_key("secret"),
            RecordingTransport::replying(Ok(r#"{"values":[]}"#.into())),
        );
        let resp = pollster::block_on(client.evaluate(&definition(), &[Param::number("A", 50.0)]))
            .expect("evaluate");
        assert!(resp.values.is_empty());

        let posts = client.transport().posts.borrow();
        assert_eq!(posts.len(), 1);
        let (url, headers, body) = &posts[0];
        assert_eq!(url, "http://localhost:6500/grasshopper");
        assert_eq!(
            headers,
            &vec![("RhinoComputeKey".to_string(), "secret".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(body).expect("json body");
        assert_eq!(body["values"][0]["ParamName"], "A");
        assert_eq!(body["algo"], definition().to_base64());
    }

    #[test]
    fn http_failure_is_transport_error() {
        let client = EvaluationClient::new(
            ComputeConfig::new("http://localhost:6500"),
            RecordingTransport::replying(Err(TransportError::status(500, "boom"))),
        );
        let err = pollster::block_on(client.evaluate(&definition(), &[])).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::Transport("HTTP 500: boom".to_string())
        );
    }

    #[test]
    fn malformed_body_is_transport_error() {
        let client = EvaluationClient::new(
            ComputeConfig::new("http://localhost:6500"),
            RecordingTransport::replying(Ok("<html>".into())),
        );
        let err = pollster::block_on(client.evaluate(&definition(), &[])).unwrap_err();
        assert!(
            matches!(err, EvaluationError::Transport(msg) if msg.starts_with("malformed response"))
        );
    }

    #[test]
    fn definition_fetch_failure_is_configuration_error() {
        let client = EvaluationClient::new(
            ComputeConfig::new("http://localhost:6500"),
            RecordingTransport::default(),
        );
        let err = pollster::block_on(client.fetch_definition("./box.gh")).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(client.transport().gets.borrow().as_slice(), ["./box.gh"]);
    }

    #[test]
    fn definition_is_fetched_on_every_call() {
        let transport = RecordingTransport {
            file: Some(b"gh".to_vec()),
            ..Default::default()
        };
        let client = EvaluationClient::new(ComputeConfig::new("http://x"), transport);
        let a = pollster::block_on(client.fetch_definition("box.gh")).expect("first");
        let b = pollster::block_on(client.fetch_definition("box.gh")).expect("second");
        assert_eq!(a, b);
        assert_eq!(client.transport().gets.borrow().len(), 2);
    }
}
