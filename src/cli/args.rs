use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fuzzbuster",
    version,
    about = "concurrent content-discovery fuzzer",
    long_about = "Fuzzbuster replaces the FUZZ placeholder in a URL template (and optional request body) with every word of a wordlist and reports the responses that pass the configured filters.\n\nExamples:\n  fuzzbuster -u https://target.tld/FUZZ -w words.txt\n  fuzzbuster -u https://target.tld/FUZZ -w words.txt -e .php,.bak -s 200,301\n  fuzzbuster -u https://target.tld/FUZZ -w words.txt --rec --depth 2 --json\n  fuzzbuster -u https://target.tld/login -X POST -d 'user=FUZZ' -w users.txt -r welcome"
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        long = "json",
        help_heading = "Output",
        help = "Print one JSON object per result line."
    )]
    pub json: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Also write results to a file (format inferred from .json/.jsonl, otherwise follows --json)."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "URL template containing the FUZZ placeholder."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'w',
        long = "wl",
        visible_alias = "wordlist",
        value_name = "FILE",
        help_heading = "Input",
        help = "Wordlist file (one candidate per line, blank lines skipped)."
    )]
    pub wordlist: Option<String>,

    #[arg(
        short = 'e',
        long = "ext",
        visible_alias = "extensions",
        value_name = "LIST",
        help_heading = "Input",
        help = "Suffixes appended to every word, comma-separated (e.g. .php,.html)."
    )]
    pub extensions: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.fuzzbuster/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'X',
        long = "mth",
        visible_alias = "method",
        value_name = "METHOD",
        help_heading = "HTTP",
        help = "HTTP method (default GET)."
    )]
    pub method: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        action = ArgAction::Append,
        help_heading = "HTTP",
        help = "Add a header, repeatable (format: 'Key: Value'; FUZZ in the value becomes the request URL)."
    )]
    pub header: Vec<String>,

    #[arg(
        short = 'd',
        long = "data",
        value_name = "BODY",
        help_heading = "HTTP",
        help = "Request body template; FUZZ is replaced like in the URL."
    )]
    pub data: Option<String>,

    #[arg(
        short = 'f',
        long = "frd",
        visible_alias = "follow-redirects",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        help_heading = "HTTP",
        help = "Follow redirects (default true, '-f false' surfaces the first response)."
    )]
    pub follow_redirects: Option<bool>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'k',
        long = "insecure",
        help_heading = "HTTP",
        help = "Skip TLS certificate verification."
    )]
    pub insecure: bool,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Proxy URL (http://, https:// or socks5://)."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "tor",
        help_heading = "HTTP",
        help = "Route requests through Tor at 127.0.0.1:9050 (overrides --proxy)."
    )]
    pub tor: bool,

    #[arg(
        long = "retries",
        value_name = "N",
        help_heading = "HTTP",
        help = "Extra attempts after a transport failure (default 1)."
    )]
    pub retries: Option<usize>,

    #[arg(
        short = 's',
        long = "mst",
        visible_alias = "status",
        value_name = "CODES",
        help_heading = "Filters",
        help = "Only report these status codes (comma-separated)."
    )]
    pub status: Option<String>,

    #[arg(
        short = 'r',
        long = "rx",
        visible_alias = "regex",
        value_name = "REGEX",
        help_heading = "Filters",
        help = "Only report responses whose body matches this regex."
    )]
    pub regex: Option<String>,

    #[arg(
        long = "min",
        value_name = "BYTES",
        help_heading = "Filters",
        help = "Minimum body length (0 = no bound)."
    )]
    pub min_length: Option<usize>,

    #[arg(
        long = "max",
        value_name = "BYTES",
        help_heading = "Filters",
        help = "Maximum body length (0 = no bound)."
    )]
    pub max_length: Option<usize>,

    #[arg(
        long = "rec",
        visible_alias = "recursive",
        help_heading = "Scan",
        help = "Re-fuzz accepted results."
    )]
    pub recursive: bool,

    #[arg(
        long = "depth",
        value_name = "N",
        help_heading = "Scan",
        help = "Maximum recursion depth (default 2)."
    )]
    pub max_depth: Option<usize>,

    #[arg(
        short = 't',
        long = "wrk",
        visible_alias = "workers",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of concurrent workers (default 10)."
    )]
    pub workers: Option<usize>,

    #[arg(
        long = "rt",
        visible_alias = "rate",
        value_name = "RPS",
        help_heading = "Performance",
        help = "Request rate limit in requests per second (0 = unlimited)."
    )]
    pub rate: Option<u32>,
}
