use colored::Colorize;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::runner::FuzzResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" | "jsonl" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    std::path::Path::new(path.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::parse)
}

/// Renders one record as a single line, without the trailing newline.
pub fn render_line(result: &FuzzResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => render_json(result),
        OutputFormat::Text => render_text(result),
    }
}

pub fn render_json(result: &FuzzResult) -> String {
    serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string())
}

// colouring follows colored's global override, see `colored::control`
pub fn render_text(result: &FuzzResult) -> String {
    if let Some(error) = result.error.as_deref() {
        return format!("{} {} -> {}", "[ERROR]".magenta(), result.target, error);
    }
    let status = result.status.unwrap_or_default();
    let target = match status {
        200..=299 => result.target.green(),
        300..=399 => result.target.cyan(),
        400..=499 => result.target.yellow(),
        500..=u16::MAX => result.target.red(),
        _ => result.target.normal(),
    };
    format!("{}\t{}\t{}", target, status, result.length)
}

// line sink for the -o flag; always uncoloured
pub struct ResultFile {
    file: File,
    format: OutputFormat,
}

impl ResultFile {
    pub async fn create(path: &str, format: OutputFormat) -> std::io::Result<Self> {
        let file = File::create(path).await?;
        Ok(Self { file, format })
    }

    pub async fn write(&mut self, result: &FuzzResult) -> std::io::Result<()> {
        let line = match self.format {
            OutputFormat::Json => render_json(result),
            OutputFormat::Text => plain_text(result),
        };
        let mut outbuf = line.into_bytes();
        outbuf.extend_from_slice(b"\n");
        self.file.write_all(&outbuf).await
    }

    pub async fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush().await
    }
}

fn plain_text(result: &FuzzResult) -> String {
    match result.error.as_deref() {
        Some(error) => format!("[ERROR] {} -> {}", result.target, error),
        None => format!(
            "{}\t{}\t{}",
            result.target,
            result.status.unwrap_or_default(),
            result.length
        ),
    }
}
