//! HTTP platform
//!
//! [`Platform`] backed by a blocking reqwest client. Requests run on the
//! smol blocking pool so the instance executor is never stalled.

use std::time::Duration;

use reqwest::blocking::Client;
use smol::future::BoxedLocal;
use url::Url;

use crate::{FetchRequest, LazyError, Method, Platform, ResourceKind, Result};

const TIMEOUT: Duration = Duration::from_secs(30);

/// Loads resources over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpPlatform {
    client: Client,
    base: Option<Url>,
}

impl HttpPlatform {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("fOS-Lazy/{}", crate::VERSION))
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| LazyError::Network(e.to_string()))?;
        Ok(Self { client, base: None })
    }

    /// Resolve relative sources against `base`, usually the document URL
    pub fn with_base(mut self, base: &str) -> Result<Self> {
        self.base = Some(Url::parse(base).map_err(|_| LazyError::InvalidUrl(base.to_string()))?);
        Ok(self)
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        let parsed = match &self.base {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        parsed.map_err(|_| LazyError::InvalidUrl(url.to_string()))
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
        Method::Patch => reqwest::Method::PATCH,
    }
}

impl Platform for HttpPlatform {
    fn load_resource(&self, kind: ResourceKind, url: &str) -> BoxedLocal<Result<()>> {
        // inline data needs no request
        if url.starts_with("data:") {
            return Box::pin(async { Ok(()) });
        }

        let client = self.client.clone();
        let target = self.resolve(url);
        Box::pin(async move {
            let target = target?;
            let shown = target.to_string();
            tracing::debug!(?kind, url = %shown, "loading resource");

            let status = smol::unblock(move || client.get(target).send().map(|r| r.status()))
                .await
                .map_err(|e| LazyError::Network(e.to_string()))?;

            if status.is_success() {
                Ok(())
            } else {
                tracing::debug!(url = %shown, status = status.as_u16(), "resource failed");
                Err(LazyError::Resource { url: shown })
            }
        })
    }

    fn fetch(&self, request: FetchRequest) -> BoxedLocal<Result<String>> {
        let client = self.client.clone();
        let target = self.resolve(&request.url);
        Box::pin(async move {
            let target = target?;
            let method = http_method(request.method);
            let accept = request.accept();

            smol::unblock(move || {
                let response = client
                    .request(method, target)
                    .header(reqwest::header::ACCEPT, accept)
                    .send()
                    .map_err(|e| LazyError::Network(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(LazyError::Http { status: status.as_u16() });
                }
                response.text().map_err(|e| LazyError::Network(e.to_string()))
            })
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_urls_need_base() {
        let platform = HttpPlatform::new().unwrap();
        assert!(matches!(platform.resolve("img/a.jpg"), Err(LazyError::InvalidUrl(_))));

        let platform = platform.with_base("https://example.com/gallery/").unwrap();
        assert_eq!(
            platform.resolve("img/a.jpg").unwrap().as_str(),
            "https://example.com/gallery/img/a.jpg"
        );
    }

    #[test]
    fn test_data_uri_loads_without_request() {
        let platform = HttpPlatform::new().unwrap();
        let result = smol::block_on(platform.load_resource(ResourceKind::Image, crate::DEFAULT_IMAGE));
        assert!(result.is_ok());
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(http_method(Method::Post), reqwest::Method::POST);
        assert_eq!(http_method(Method::default()), reqwest::Method::GET);
    }
}
