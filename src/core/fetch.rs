// src/core/fetch.rs
//! Fetcher: raw markup for an address. No retries, no caching.

use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::config::options::FetchOptions;
use crate::core::document;
use crate::error::{Error, Result};

/// Upper bound on a single response body.
const MAX_BODY: u64 = 64 * 1024 * 1024;

/// Injected collaborator; the pipeline never reaches for a global client.
pub trait Fetch: Send + Sync {
    fn fetch(&self, address: &str) -> Result<String>;
}

fn decode(address: &str, bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| {
        debug!(address, "Fetch: body is not UTF-8");
        document::decode(e.as_bytes()).into_owned()
    })
}

/* ---------------- HTTP ---------------- */

pub struct HttpFetcher {
    agent: ureq::Agent,
    headers: Vec<(String, String)>,
}

impl HttpFetcher {
    pub fn new(opts: &FetchOptions) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(opts.timeout())
            .user_agent(&opts.user_agent)
            .build();
        Self { agent, headers: opts.headers.clone() }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchOptions::default())
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, address: &str) -> Result<String> {
        let mut req = self.agent.get(address);
        for (k, v) in &self.headers {
            req = req.set(k, v);
        }

        let resp = match req.call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                return Err(Error::network(address, format!("HTTP {code} {}", resp.status_text())));
            }
            Err(ureq::Error::Transport(err)) => return Err(Error::network(address, err)),
        };

        let mut buf = Vec::new();
        resp.into_reader()
            .take(MAX_BODY)
            .read_to_end(&mut buf)
            .map_err(|e| Error::network(address, e))?;
        info!(address, bytes = buf.len(), "Fetch: HTTP ok");
        Ok(decode(address, buf))
    }
}

/* ---------------- Local files ---------------- */

/// `file://` addresses or plain paths. I/O failures surface as `Network`
/// so callers see one failure kind per fetch.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileFetcher;

impl Fetch for FileFetcher {
    fn fetch(&self, address: &str) -> Result<String> {
        let path = Path::new(address.strip_prefix("file://").unwrap_or(address));
        let bytes = std::fs::read(path).map_err(|e| Error::network(address, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Fetch: file ok");
        Ok(decode(address, bytes))
    }
}

/* ---------------- Scheme dispatch ---------------- */

pub struct AutoFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl AutoFetcher {
    pub fn new(opts: &FetchOptions) -> Self {
        Self { http: HttpFetcher::new(opts), file: FileFetcher }
    }
}

pub fn is_remote(address: &str) -> bool {
    let lower = address.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

impl Fetch for AutoFetcher {
    fn fetch(&self, address: &str) -> Result<String> {
        if is_remote(address) { self.http.fetch(address) } else { self.file.fetch(address) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_fetcher_reads_plain_and_file_urls() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "<p>hi</p>").unwrap();
        let path = f.path().to_str().unwrap().to_string();

        assert_eq!(FileFetcher.fetch(&path).unwrap(), "<p>hi</p>");
        assert_eq!(FileFetcher.fetch(&format!("file://{path}")).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn missing_file_is_a_network_error() {
        let err = FileFetcher.fetch("/definitely/not/here.html").unwrap_err();
        assert!(matches!(err, Error::Network { ref address, .. } if address == "/definitely/not/here.html"));
    }

    #[test]
    fn non_utf8_body_is_decoded_leniently() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"<td>S\xe3o Paulo</td>").unwrap();
        let body = FileFetcher.fetch(f.path().to_str().unwrap()).unwrap();
        assert_eq!(body, "<td>S\u{fffd}o Paulo</td>");
    }

    #[test]
    fn scheme_dispatch() {
        assert!(is_remote("https://example.org/x"));
        assert!(is_remote("HTTP://example.org"));
        assert!(!is_remote("file:///tmp/x.html"));
        assert!(!is_remote("fixtures/page.html"));
    }
}
