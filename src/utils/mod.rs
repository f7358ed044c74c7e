use std::collections::HashSet;

pub fn parse_http_method(value: &str) -> Result<reqwest::Method, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("method is empty".to_string());
    }
    let canonical = raw.to_ascii_uppercase();
    reqwest::Method::from_bytes(canonical.as_bytes()).map_err(|_| format!("invalid method '{raw}'"))
}

/// Extensions are appended verbatim, so `.php` and `php` are different.
/// Repeated items are kept and each one yields its own job.
pub fn parse_extensions_csv(value: &str) -> Result<Vec<String>, String> {
    let out: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    if out.is_empty() {
        return Err("extensions list is empty".to_string());
    }
    Ok(out)
}

pub fn parse_u16_set_csv(value: &str) -> Result<HashSet<u16>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("list is empty".to_string());
    }
    let mut out = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let code: u16 = item
            .parse()
            .map_err(|_| format!("invalid status code '{item}'"))?;
        out.insert(code);
    }
    if out.is_empty() {
        return Err("list is empty".to_string());
    }
    Ok(out)
}

// "Name: value", the value may itself contain ':' and the FUZZ token
pub fn parse_header_line(line: &str) -> Result<(String, String), String> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{line}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing header name in '{line}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
