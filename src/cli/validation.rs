use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err("invalid workers, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.status.as_deref() {
        crate::utils::parse_u16_set_csv(raw).map_err(|e| format!("invalid --status '{raw}': {e}"))?;
    }
    if let Some(raw) = args.extensions.as_deref() {
        crate::utils::parse_extensions_csv(raw)
            .map_err(|e| format!("invalid --extensions '{raw}': {e}"))?;
    }
    if let Some(raw) = args.method.as_deref() {
        crate::utils::parse_http_method(raw).map_err(|e| format!("invalid --method: {e}"))?;
    }
    for raw in args.header.iter() {
        crate::utils::parse_header_line(raw).map_err(|e| format!("invalid --header: {e}"))?;
    }
    if let Some(raw) = args.regex.as_deref() {
        regex::bytes::Regex::new(raw).map_err(|e| format!("invalid --regex '{raw}': {e}"))?;
    }
    if let (Some(min), Some(max)) = (args.min_length, args.max_length) {
        if min > 0 && max > 0 && min > max {
            return Err(format!("invalid length bounds, --min {min} is above --max {max}"));
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    Ok(())
}
