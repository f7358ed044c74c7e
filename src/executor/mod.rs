use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::expander::{self, Job};
use crate::runner::Options;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("invalid header name: {name}")]
    InvalidHeaderName { name: String },

    #[error("invalid request for {target}: {message}")]
    InvalidRequest { target: String, message: String },

    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        target: String,
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },
}

impl ExecuteError {
    pub fn attempts(&self) -> usize {
        match self {
            Self::Transport { attempts, .. } => *attempts,
            _ => 0,
        }
    }
}

// what came back for one job, with the body fully read
#[derive(Clone, Debug)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
    pub attempts: usize,
}

pub fn parse_header_templates(
    headers: &[(String, String)],
) -> Result<Vec<(HeaderName, String)>, ExecuteError> {
    headers
        .iter()
        .map(|(k, v)| {
            HeaderName::from_str(k.trim())
                .map(|name| (name, v.clone()))
                .map_err(|_| ExecuteError::InvalidHeaderName {
                    name: k.to_string(),
                })
        })
        .collect()
}

pub type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub fn build_rate_limiter(rate: u32) -> Option<Arc<DirectLimiter>> {
    std::num::NonZeroU32::new(rate).map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))))
}

/// Sends one job at a time through the shared client, retrying transport
/// failures. Any HTTP response, whatever its status, ends the attempt loop.
#[derive(Clone)]
pub struct RequestExecutor {
    client: reqwest::Client,
    method: reqwest::Method,
    headers: Vec<(HeaderName, String)>,
    retries: usize,
    retry_delay: Duration,
    limiter: Option<Arc<DirectLimiter>>,
}

impl RequestExecutor {
    pub fn new(client: reqwest::Client, options: &Options) -> Result<Self, ExecuteError> {
        Ok(Self {
            client,
            method: options.method.clone(),
            headers: parse_header_templates(&options.headers)?,
            retries: options.retries,
            retry_delay: options.retry_delay,
            limiter: build_rate_limiter(options.rate),
        })
    }

    fn build_request(&self, job: &Job) -> Result<reqwest::Request, ExecuteError> {
        let mut builder = self.client.request(self.method.clone(), job.target.as_str());
        // a repeated header name keeps its last value
        let mut headers = HeaderMap::new();
        for (name, template) in self.headers.iter() {
            let value = expander::replace_placeholder(template, &job.target);
            let value =
                HeaderValue::from_str(&value).map_err(|e| ExecuteError::InvalidRequest {
                    target: job.target.clone(),
                    message: format!("header {name}: {e}"),
                })?;
            headers.insert(name.clone(), value);
        }
        builder = builder.headers(headers);
        if !job.body.is_empty() {
            builder = builder.body(job.body.clone());
        }
        builder.build().map_err(|e| ExecuteError::InvalidRequest {
            target: job.target.clone(),
            message: e.to_string(),
        })
    }

    pub async fn execute(&self, job: &Job) -> Result<Response, ExecuteError> {
        let mut attempt = 0usize;
        loop {
            let request = self.build_request(job)?;
            if let Some(lim) = self.limiter.as_ref() {
                lim.until_ready().await;
            }
            match self.client.execute(request).await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = read_body(resp, &job.target).await;
                    return Ok(Response {
                        status,
                        body,
                        attempts: attempt + 1,
                    });
                }
                Err(e) if attempt >= self.retries => {
                    return Err(ExecuteError::Transport {
                        target: job.target.clone(),
                        attempts: attempt + 1,
                        source: e,
                    });
                }
                Err(e) => {
                    log::warn!(
                        "attempt {} for {} failed, retrying: {e}",
                        attempt + 1,
                        job.target
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

// a body cut short mid-stream keeps what already arrived
async fn read_body(mut resp: reqwest::Response, target: &str) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        match resp.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => {
                log::debug!("body of {target} truncated after {} bytes: {e}", body.len());
                break;
            }
        }
    }
    body
}
