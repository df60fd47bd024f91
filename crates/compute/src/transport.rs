use crate::error::TransportError;

/// HTTP seam of the client. The browser build talks through `gloo-net`, the
/// native build through `reqwest`; tests plug in an in-memory double.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// POSTs a JSON body and returns the response text of a 2xx reply.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<String, TransportError>;

    /// GETs a resource and returns its bytes of a 2xx reply.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::Transport;
    use crate::error::TransportError;
    use gloo_net::http::Request;

    #[derive(Debug, Default, Clone, Copy)]
    pub struct BrowserTransport;

    impl Transport for BrowserTransport {
        async fn post_json(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: String,
        ) -> Result<String, TransportError> {
            let mut builder = Request::post(url).header("Content-Type", "application/json");
            for (name, value) in headers {
                builder = builder.header(name, value);
            }
            let resp = builder
                .body(body)
                .map_err(|e| TransportError::network(e.to_string()))?
                .send()
                .await
                .map_err(|e| TransportError::network(e.to_string()))?;
            if !resp.ok() {
                let text = resp.text().await.unwrap_or_default();
                return Err(TransportError::status(resp.status(), text));
            }
            resp.text()
                .await
                .map_err(|e| TransportError::network(e.to_string()))
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            let resp = Request::get(url)
                .send()
                .await
                .map_err(|e| TransportError::network(e.to_string()))?;
            if !resp.ok() {
                return Err(TransportError::status(resp.status(), resp.status_text()));
            }
            resp.binary()
                .await
                .map_err(|e| TransportError::network(e.to_string()))
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserTransport;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::time::Duration;

    use super::Transport;
    use crate::error::TransportError;

    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        http: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            let http = builder
                .build()
                .map_err(|e| TransportError::network(e.to_string()))?;
            Ok(Self { http })
        }
    }

    impl Transport for ReqwestTransport {
        async fn post_json(
            &self,
            url: &str,
            headers: &[(&str, &str)],
            body: String,
        ) -> Result<String, TransportError> {
            let mut req = self
                .http
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
            for (name, value) in headers {
                req = req.header(*name, *value);
            }
            let resp = req
                .send()
                .await
                .map_err(|e| TransportError::network(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(TransportError::status(status.as_u16(), text));
            }
            resp.text()
                .await
                .map_err(|e| TransportError::network(e.to_string()))
        }

        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            let resp = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| TransportError::network(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(TransportError::status(status.as_u16(), ""));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| TransportError::network(e.to_string()))?;
            Ok(bytes.to_vec())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::ReqwestTransport;
