use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tokio::time::Instant;

use crate::executor::{self, ExecuteError, RequestExecutor};
use crate::expander::{self, Job, PLACEHOLDER};
use crate::filter::{self, ResponseFilters};
use crate::queue::WorkQueue;
use crate::visited::VisitedSet;
use crate::wordlist::{WordlistError, WordlistReader, WordlistSource};

pub const TOR_PROXY: &str = "socks5h://127.0.0.1:9050";
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct Options {
    pub url_template: String,
    pub wordlist: WordlistSource,
    pub method: reqwest::Method,
    pub headers: Vec<(String, String)>,
    pub body_template: String,
    pub extensions: Vec<String>,
    pub workers: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub status_filter: HashSet<u16>,
    pub body_regex: Option<String>,
    pub recursive: bool,
    pub max_depth: usize,
    pub retries: usize,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub skip_tls_verify: bool,
    pub proxy: Option<String>,
    pub use_tor: bool,
    pub rate: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            url_template: String::new(),
            wordlist: WordlistSource::Inline(Vec::new()),
            method: reqwest::Method::GET,
            headers: Vec::new(),
            body_template: String::new(),
            extensions: Vec::new(),
            workers: 10,
            min_length: 0,
            max_length: 0,
            status_filter: HashSet::new(),
            body_regex: None,
            recursive: false,
            max_depth: 2,
            retries: 1,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: Duration::from_secs(10),
            follow_redirects: true,
            skip_tls_verify: false,
            proxy: None,
            use_tor: false,
            rate: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("url template is empty")]
    MissingTemplate,

    #[error("neither the url template nor the body contains the FUZZ placeholder")]
    MissingPlaceholder,

    #[error("invalid worker count {value}, expected positive integer")]
    InvalidWorkers { value: usize },

    #[error("invalid length bounds: min {min} is greater than max {max}")]
    InvalidLengthBounds { min: usize, max: usize },

    #[error("invalid body regex: {source}")]
    InvalidRegex {
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Executor(#[from] ExecuteError),

    #[error(transparent)]
    Wordlist(#[from] WordlistError),

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("task join failed: {source}")]
    TaskJoin {
        #[source]
        source: tokio::task::JoinError,
    },
}

// one record of the result stream
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FuzzResult {
    #[serde(rename = "url")]
    pub target: String,
    #[serde(rename = "status_code", skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub depth: usize,
}

impl FuzzResult {
    fn matched(job: &Job, status: u16, length: usize) -> Self {
        Self {
            target: job.target.clone(),
            status: Some(status),
            length,
            error: None,
            depth: job.depth,
        }
    }

    fn failed(job: &Job, error: &ExecuteError) -> Self {
        Self {
            target: job.target.clone(),
            status: None,
            length: 0,
            error: Some(error.to_string()),
            depth: job.depth,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Default)]
struct ScanStats {
    dispatched: AtomicUsize,
    matched: AtomicUsize,
    filtered: AtomicUsize,
    duplicates: AtomicUsize,
    errors: AtomicUsize,
    recursive_jobs: AtomicUsize,
}

#[derive(Clone, Debug)]
pub struct ScanSummary {
    pub seeded: usize,
    pub dispatched: usize,
    pub matched: usize,
    pub filtered: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub recursive_jobs: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct ScanReport {
    pub results: Vec<FuzzResult>,
    pub summary: ScanSummary,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Arc<Options>,
    filters: ResponseFilters,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.url_template.trim().is_empty() {
            return Err(RunnerError::MissingTemplate);
        }
        if !options.url_template.contains(PLACEHOLDER)
            && !options.body_template.contains(PLACEHOLDER)
        {
            return Err(RunnerError::MissingPlaceholder);
        }
        if options.workers == 0 {
            return Err(RunnerError::InvalidWorkers {
                value: options.workers,
            });
        }
        if options.min_length > 0 && options.max_length > 0 && options.min_length > options.max_length
        {
            return Err(RunnerError::InvalidLengthBounds {
                min: options.min_length,
                max: options.max_length,
            });
        }
        executor::parse_header_templates(&options.headers)?;
        let regex = filter::compile_body_regex(options.body_regex.as_deref().unwrap_or_default())
            .map_err(|e| RunnerError::InvalidRegex { source: e })?;

        let filters = ResponseFilters {
            status: options.status_filter.clone(),
            min_length: options.min_length,
            max_length: options.max_length,
            regex,
        };
        Ok(Self {
            options: Arc::new(options),
            filters,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Opens the wordlist, builds the client and spawns the seeder and the
    /// worker pool. Nothing is sent before every fallible setup step passed.
    pub async fn start(&self) -> Result<Scan, RunnerError> {
        let started_at = Instant::now();
        let reader = WordlistReader::open(&self.options.wordlist).await?;
        let client = build_client(&self.options)?;
        let executor = RequestExecutor::new(client, &self.options)?;

        let worker_count = self.options.workers;
        let queue = Arc::new(WorkQueue::new(worker_count * 2));
        let (result_tx, result_rx) = mpsc::channel::<FuzzResult>(worker_count * 2);
        let stats = Arc::new(ScanStats::default());

        let seeder = task::spawn(seed_jobs(reader, self.options.clone(), queue.clone()));

        let ctx = Arc::new(WorkerContext {
            options: self.options.clone(),
            filters: self.filters.clone(),
            executor,
            queue,
            visited: VisitedSet::new(),
            stats: stats.clone(),
            result_tx,
        });
        let workers = (0..worker_count)
            .map(|id| task::spawn(run_worker(id, ctx.clone())))
            .collect();

        Ok(Scan {
            results: result_rx,
            seeder,
            workers,
            stats,
            started_at,
        })
    }

    pub async fn run(&self) -> Result<ScanReport, RunnerError> {
        let mut scan = self.start().await?;
        let mut results = Vec::new();
        while let Some(result) = scan.next().await {
            results.push(result);
        }
        let summary = scan.finish().await?;
        Ok(ScanReport { results, summary })
    }
}

/// A running scan. Results arrive in completion order; the stream ends once
/// every seeded and recursive job has been handled.
pub struct Scan {
    results: mpsc::Receiver<FuzzResult>,
    seeder: JoinHandle<Result<usize, WordlistError>>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<ScanStats>,
    started_at: Instant,
}

impl Scan {
    pub async fn next(&mut self) -> Option<FuzzResult> {
        self.results.recv().await
    }

    /// Waits for the pool to wind down. Results nobody consumed are dropped.
    pub async fn finish(mut self) -> Result<ScanSummary, RunnerError> {
        while self.results.recv().await.is_some() {}

        let seeded = self
            .seeder
            .await
            .map_err(|e| RunnerError::TaskJoin { source: e })??;
        for w in futures::future::join_all(self.workers).await {
            w.map_err(|e| RunnerError::TaskJoin { source: e })?;
        }

        let stats = &self.stats;
        Ok(ScanSummary {
            seeded,
            dispatched: stats.dispatched.load(Ordering::Relaxed),
            matched: stats.matched.load(Ordering::Relaxed),
            filtered: stats.filtered.load(Ordering::Relaxed),
            duplicates: stats.duplicates.load(Ordering::Relaxed),
            errors: stats.errors.load(Ordering::Relaxed),
            recursive_jobs: stats.recursive_jobs.load(Ordering::Relaxed),
            elapsed: self.started_at.elapsed(),
        })
    }
}

pub fn build_client(options: &Options) -> Result<reqwest::Client, RunnerError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:95.0) Gecko/20100101 Firefox/95.0",
        ),
    );

    let redirect_policy = if options.follow_redirects {
        reqwest::redirect::Policy::limited(10)
    } else {
        reqwest::redirect::Policy::none()
    };

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect_policy)
        .timeout(options.timeout)
        .danger_accept_invalid_hostnames(options.skip_tls_verify)
        .danger_accept_invalid_certs(options.skip_tls_verify);

    let proxy = if options.use_tor {
        Some(TOR_PROXY)
    } else {
        options.proxy.as_deref().filter(|p| !p.trim().is_empty())
    };
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| RunnerError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
}

async fn seed_jobs(
    mut reader: WordlistReader,
    options: Arc<Options>,
    queue: Arc<WorkQueue>,
) -> Result<usize, WordlistError> {
    let mut seeded = 0usize;
    let outcome = loop {
        match reader.next_word().await {
            Ok(Some(word)) => {
                for job in expander::expand_word(&word, &options) {
                    queue.push_seed(job).await;
                    seeded += 1;
                }
            }
            Ok(None) => break Ok(seeded),
            Err(e) => break Err(e),
        }
    };
    // workers only stop once this flag is set, even after a read failure
    queue.finish_seeding();
    log::debug!("seeding finished with {seeded} jobs");
    outcome
}

struct WorkerContext {
    options: Arc<Options>,
    filters: ResponseFilters,
    executor: RequestExecutor,
    queue: Arc<WorkQueue>,
    visited: VisitedSet,
    stats: Arc<ScanStats>,
    result_tx: mpsc::Sender<FuzzResult>,
}

async fn run_worker(id: usize, ctx: Arc<WorkerContext>) {
    while let Some(job) = ctx.queue.pop().await {
        process_job(&ctx, job).await;
        ctx.queue.complete();
    }
    log::trace!("worker {id} exiting");
}

async fn process_job(ctx: &WorkerContext, job: Job) {
    let options = ctx.options.as_ref();
    if options.recursive && !ctx.visited.try_mark(&job.target) {
        ctx.stats.duplicates.fetch_add(1, Ordering::Relaxed);
        log::debug!("skipping already visited {}", job.target);
        return;
    }

    ctx.stats.dispatched.fetch_add(1, Ordering::Relaxed);
    log::debug!("dispatching {} (depth {})", job.target, job.depth);
    let response = match ctx.executor.execute(&job).await {
        Ok(response) => response,
        Err(e) => {
            ctx.stats.errors.fetch_add(1, Ordering::Relaxed);
            log::warn!("giving up on {} after {} attempt(s): {e}", job.target, e.attempts());
            let _ = ctx.result_tx.send(FuzzResult::failed(&job, &e)).await;
            return;
        }
    };

    if let Err(rejection) = ctx.filters.check(response.status, &response.body) {
        ctx.stats.filtered.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "filtered {} ({:?}, status {}, {} bytes)",
            job.target,
            rejection,
            response.status,
            response.body.len()
        );
        return;
    }

    ctx.stats.matched.fetch_add(1, Ordering::Relaxed);
    let result = FuzzResult::matched(&job, response.status, response.body.len());
    if ctx.result_tx.send(result).await.is_err() {
        log::debug!("result stream closed, dropping {}", job.target);
    }

    if options.recursive && job.depth < options.max_depth {
        for next in expander::expand_recursive(&job, options) {
            ctx.stats.recursive_jobs.fetch_add(1, Ordering::Relaxed);
            ctx.queue.push_feedback(next);
        }
    }
}
