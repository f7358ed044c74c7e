use std::collections::HashSet;
use std::sync::Arc;

use regex::bytes::Regex;

#[derive(Clone, Debug, Default)]
pub struct ResponseFilters {
    pub status: HashSet<u16>,
    pub min_length: usize,
    pub max_length: usize,
    pub regex: Option<Arc<Regex>>,
}

/// Which predicate turned a response away, for logging and statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Status,
    TooShort,
    TooLong,
    Regex,
}

impl ResponseFilters {
    pub fn accept(&self, status: u16, body: &[u8]) -> bool {
        self.check(status, body).is_ok()
    }

    // predicates are conjunctive; an unset predicate never rejects
    pub fn check(&self, status: u16, body: &[u8]) -> Result<(), Rejection> {
        if !self.status.is_empty() && !self.status.contains(&status) {
            return Err(Rejection::Status);
        }
        if self.min_length > 0 && body.len() < self.min_length {
            return Err(Rejection::TooShort);
        }
        if self.max_length > 0 && body.len() > self.max_length {
            return Err(Rejection::TooLong);
        }
        if let Some(re) = self.regex.as_ref() {
            if !re.is_match(body) {
                return Err(Rejection::Regex);
            }
        }
        Ok(())
    }
}

pub fn compile_body_regex(pattern: &str) -> Result<Option<Arc<Regex>>, regex::Error> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern).map(|re| Some(Arc::new(re)))
}
