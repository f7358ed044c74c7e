use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Clone, Debug)]
pub enum WordlistSource {
    FilePath(String),
    Inline(Vec<String>),
}

#[derive(Debug, Error)]
pub enum WordlistError {
    #[error("failed to open wordlist: {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read wordlist: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Streams candidate words one line at a time. Blank lines are skipped,
/// everything else is handed over verbatim. Bytes that are not UTF-8 are
/// replaced rather than ending the scan.
pub enum WordlistReader {
    File {
        path: String,
        reader: BufReader<File>,
        buf: Vec<u8>,
    },
    Inline(std::vec::IntoIter<String>),
}

impl WordlistReader {
    pub async fn open(source: &WordlistSource) -> Result<Self, WordlistError> {
        match source {
            WordlistSource::Inline(words) => Ok(Self::Inline(words.clone().into_iter())),
            WordlistSource::FilePath(path) => {
                let path = crate::config::expand_tilde_string(path);
                let handle = File::open(&path).await.map_err(|e| WordlistError::Open {
                    path: path.clone(),
                    source: e,
                })?;
                Ok(Self::File {
                    path,
                    reader: BufReader::new(handle),
                    buf: Vec::new(),
                })
            }
        }
    }

    pub async fn next_word(&mut self) -> Result<Option<String>, WordlistError> {
        match self {
            Self::Inline(words) => Ok(words.find(|w| !w.is_empty())),
            Self::File { path, reader, buf } => loop {
                buf.clear();
                let read = reader
                    .read_until(b'\n', buf)
                    .await
                    .map_err(|e| WordlistError::Read {
                        path: path.clone(),
                        source: e,
                    })?;
                if read == 0 {
                    return Ok(None);
                }
                let line = strip_line_ending(buf);
                if line.is_empty() {
                    continue;
                }
                if std::str::from_utf8(line).is_err() {
                    log::debug!("wordlist {path}: replacing invalid UTF-8 in a line");
                }
                return Ok(Some(String::from_utf8_lossy(line).into_owned()));
            },
        }
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
