//! # Source Resolution
//!
//! Turns one `sourceData` element into the bytes that get written to the
//! store. Inline data passes through; URI sources are fetched.
//!
//! | Scheme          | Transport                                   |
//! |-----------------|---------------------------------------------|
//! | `http`, `https` | GET with the source-fetch timeout, 2xx only |
//! | `file`          | local filesystem                            |
//! | `ftp`           | passive-mode RETR, anonymous unless the URI |
//! |                 | carries credentials, same timeout as http   |
//! | anything else   | rejected as an invalid request              |

use crate::config::TimeoutConfig;
use graphgate_core::{GatewayError, InputType, SourceElement};
use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;
use suppaftp::FtpStream;
use suppaftp::types::FileType;
use url::Url;

const FTP_DEFAULT_PORT: u16 = 21;
const FTP_ANONYMOUS: &str = "anonymous";

/// Fetches the payload of URI-typed source elements.
#[derive(Clone)]
pub struct SourceResolver {
    http: reqwest::Client,
    fetch_timeout: Duration,
}

impl SourceResolver {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.source_fetch())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            fetch_timeout: timeouts.source_fetch(),
        })
    }

    /// Payload of `source`, fetched if it is URI-typed.
    pub async fn resolve(&self, source: &SourceElement) -> Result<String, GatewayError> {
        match source.input_type {
            InputType::Data => Ok(source.input.clone()),
            InputType::Uri => self.fetch(&source.input).await,
        }
    }

    async fn fetch(&self, location: &str) -> Result<String, GatewayError> {
        let url = Url::parse(location)
            .map_err(|e| GatewayError::InvalidRequest(format!("source URI '{location}': {e}")))?;

        match url.scheme() {
            "http" | "https" => self.fetch_http(url).await,
            "file" => fetch_file(&url).await,
            "ftp" => self.fetch_ftp(url).await,
            other => Err(GatewayError::InvalidRequest(format!(
                "unsupported source URI scheme '{other}'"
            ))),
        }
    }

    async fn fetch_http(&self, url: Url) -> Result<String, GatewayError> {
        let location = url.to_string();
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::SourceFetch(format!("{location}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::SourceFetch(format!(
                "{location}: server answered {status}"
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::SourceFetch(format!("{location}: {e}")))?;
        tracing::info!("Fetched source {} ({} bytes)", location, body.len());
        Ok(body)
    }

    /// The FTP client is blocking, so it runs on the blocking pool. The whole
    /// exchange is bounded by the source-fetch timeout.
    async fn fetch_ftp(&self, url: Url) -> Result<String, GatewayError> {
        let location = url.to_string();
        let timeout = self.fetch_timeout;
        let task = tokio::task::spawn_blocking(move || retrieve_ftp(&url, timeout));

        let bytes = tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| {
                GatewayError::SourceFetch(format!(
                    "{location}: timed out after {}s",
                    timeout.as_secs()
                ))
            })?
            .map_err(|e| GatewayError::SourceFetch(format!("{location}: {e}")))??;

        let body = String::from_utf8(bytes)
            .map_err(|e| GatewayError::SourceFetch(format!("{location}: not UTF-8: {e}")))?;
        tracing::info!("Fetched source {} ({} bytes)", location, body.len());
        Ok(body)
    }
}

fn ftp_error(url: &Url, err: impl fmt::Display) -> GatewayError {
    GatewayError::SourceFetch(format!("{url}: {err}"))
}

fn retrieve_ftp(url: &Url, timeout: Duration) -> Result<Vec<u8>, GatewayError> {
    let addr = url
        .socket_addrs(|| Some(FTP_DEFAULT_PORT))
        .map_err(|e| ftp_error(url, e))?
        .into_iter()
        .next()
        .ok_or_else(|| ftp_error(url, "host did not resolve"))?;

    let mut ftp = FtpStream::connect_timeout(addr, timeout).map_err(|e| ftp_error(url, e))?;
    ftp.get_ref()
        .set_read_timeout(Some(timeout))
        .map_err(|e| ftp_error(url, e))?;
    ftp.get_ref()
        .set_write_timeout(Some(timeout))
        .map_err(|e| ftp_error(url, e))?;

    let user = match url.username() {
        "" => FTP_ANONYMOUS,
        name => name,
    };
    ftp.login(user, url.password().unwrap_or(FTP_ANONYMOUS))
        .map_err(|e| ftp_error(url, e))?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|e| ftp_error(url, e))?;

    let path = url.path().trim_start_matches('/');
    let data = ftp
        .retr_as_buffer(path)
        .map_err(|e| ftp_error(url, e))?
        .into_inner();

    if let Err(e) = ftp.quit() {
        tracing::debug!("FTP session to {} did not close cleanly: {}", url, e);
    }
    Ok(data)
}

async fn fetch_file(url: &Url) -> Result<String, GatewayError> {
    let path = url
        .to_file_path()
        .map_err(|()| GatewayError::InvalidRequest(format!("not a local file URI: {url}")))?;

    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                GatewayError::SourceFetch(format!("{}: file does not exist", path.display()))
            }
            ErrorKind::PermissionDenied => {
                GatewayError::SourceFetch(format!("{}: access not permitted", path.display()))
            }
            _ => GatewayError::SourceFetch(format!("{}: {e}", path.display())),
        })
}
