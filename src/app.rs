use std::collections::HashSet;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::output::{self, OutputFormat, ResultFile};
use crate::runner::{Options, Runner, ScanSummary, DEFAULT_RETRY_DELAY};
use crate::wordlist::WordlistSource;

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn summarize_filters(options: &Options) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if !options.status_filter.is_empty() {
        parts.push(format!(
            "status={}",
            options.status_filter.iter().sorted().join(",")
        ));
    }
    if options.min_length > 0 {
        parts.push(format!("min={}", options.min_length));
    }
    if options.max_length > 0 {
        parts.push(format!("max={}", options.max_length));
    }
    if let Some(re) = options.body_regex.as_deref() {
        parts.push(format!("regex={re}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[derive(Debug)]
struct RunConfig {
    options: Options,
    format: OutputFormat,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let url_template = args
        .url
        .or(cfg.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "a URL template is required (-u https://target.tld/FUZZ)".to_string())?;
    let wordlist_path = args
        .wordlist
        .or(cfg.wordlist)
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| "a wordlist is required (-w FILE)".to_string())?;

    let method_raw = args.method.or(cfg.method).unwrap_or_else(|| "GET".to_string());
    let method = crate::utils::parse_http_method(&method_raw)?;

    let header_lines = if args.header.is_empty() {
        cfg.headers.unwrap_or_default()
    } else {
        args.header
    };
    let headers = header_lines
        .iter()
        .map(|h| crate::utils::parse_header_line(h))
        .collect::<Result<Vec<_>, String>>()
        .map_err(|e| format!("invalid header: {e}"))?;

    let extensions = match args.extensions.or(cfg.extensions) {
        Some(raw) if !raw.trim().is_empty() => crate::utils::parse_extensions_csv(&raw)
            .map_err(|e| format!("invalid --extensions '{raw}': {e}"))?,
        _ => Vec::new(),
    };

    let status_filter = match args.status.or(cfg.status) {
        Some(raw) if !raw.trim().is_empty() => crate::utils::parse_u16_set_csv(&raw)
            .map_err(|e| format!("invalid --status '{raw}': {e}"))?,
        _ => HashSet::new(),
    };

    let body_regex = args.regex.or(cfg.regex).filter(|r| !r.is_empty());
    let json = args.json || cfg.json.unwrap_or(false);
    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let output = args.output.or(cfg.output).map(|p| config::expand_tilde_string(&p));
    let output_format = output
        .as_deref()
        .and_then(output::infer_format_from_path)
        .unwrap_or(format);

    let options = Options {
        url_template,
        wordlist: WordlistSource::FilePath(config::expand_tilde_string(&wordlist_path)),
        method,
        headers,
        body_template: args.data.or(cfg.data).unwrap_or_default(),
        extensions,
        workers: args.workers.or(cfg.workers).unwrap_or(10),
        min_length: args.min_length.or(cfg.min_length).unwrap_or(0),
        max_length: args.max_length.or(cfg.max_length).unwrap_or(0),
        status_filter,
        body_regex,
        recursive: args.recursive || cfg.recursive.unwrap_or(false),
        max_depth: args.max_depth.or(cfg.max_depth).unwrap_or(2),
        retries: args.retries.or(cfg.retries).unwrap_or(1),
        retry_delay: DEFAULT_RETRY_DELAY,
        timeout: Duration::from_secs(args.timeout.or(cfg.timeout).unwrap_or(10)),
        follow_redirects: args
            .follow_redirects
            .or(cfg.follow_redirects)
            .unwrap_or(true),
        skip_tls_verify: args.insecure || cfg.insecure.unwrap_or(false),
        proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        use_tor: args.tor || cfg.tor.unwrap_or(false),
        rate: args.rate.or(cfg.rate).unwrap_or(0),
    };

    Ok(RunConfig {
        options,
        format,
        output,
        output_format,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        verbose: args.verbose,
    })
}

fn print_settings(options: &Options) {
    format_kv_line("Target", &options.url_template);
    if let WordlistSource::FilePath(path) = &options.wordlist {
        format_kv_line("Wordlist", path);
    }
    format_kv_line("Method", options.method.as_str());
    if !options.extensions.is_empty() {
        format_kv_line("Extensions", &options.extensions.iter().join(","));
    }
    format_kv_line("Workers", &options.workers.to_string());
    format_kv_line(
        "Recursion",
        &if options.recursive {
            format!("true (depth {})", options.max_depth)
        } else {
            "false".to_string()
        },
    );
    format_kv_line("Redirects", format_bool(options.follow_redirects));
    if let Some(filters) = summarize_filters(options) {
        format_kv_line("Filters", &filters);
    }
    if options.use_tor {
        format_kv_line("Proxy", "tor");
    } else if let Some(proxy) = options.proxy.as_deref() {
        format_kv_line("Proxy", proxy);
    }
    println!();
}

fn print_summary(summary: &ScanSummary) {
    println!();
    println!(
        ":: Completed :: {} requests, {} matches, {} filtered, {} duplicates, {} errors in {}s ::",
        summary.dispatched,
        summary.matched,
        summary.filtered,
        summary.duplicates,
        summary.errors,
        summary.elapsed.as_secs()
    );
}

fn spinner(format: OutputFormat) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let runner = Runner::new(run.options).map_err(|e| e.to_string())?;

    let mut out_file = match run.output.as_deref() {
        Some(path) => Some(
            ResultFile::create(path, run.output_format)
                .await
                .map_err(|e| format!("failed to create output file {path}: {e}"))?,
        ),
        None => None,
    };

    if run.format == OutputFormat::Text {
        print_settings(runner.options());
    }

    let mut scan = runner.start().await.map_err(|e| e.to_string())?;
    let pb = spinner(run.format);
    let mut reported = 0usize;
    while let Some(result) = scan.next().await {
        let line = output::render_line(&result, run.format);
        pb.suspend(|| println!("{line}"));
        reported += 1;
        pb.set_message(format!("{reported} results"));
        if let Some(out) = out_file.as_mut() {
            if let Err(e) = out.write(&result).await {
                log::warn!("failed to write result for {}: {e}", result.target);
            }
        }
    }
    let summary = scan.finish().await.map_err(|e| e.to_string())?;
    pb.finish_and_clear();

    if let Some(out) = out_file.as_mut() {
        out.flush()
            .await
            .map_err(|e| format!("failed to flush output file: {e}"))?;
    }
    if run.format == OutputFormat::Text {
        print_summary(&summary);
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    if run.no_color {
        colored::control::set_override(false);
    }
    crate::logging::init(run.verbose, run.no_color)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}

pub fn report_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".bold().red(), message);
}
