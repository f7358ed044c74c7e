use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the stderr logger used by the binary. Results never go through
/// it, they are printed on stdout by the reporter.
pub fn init(verbose: u8, no_color: bool) -> Result<(), String> {
    let config = ConfigBuilder::new()
        .add_filter_allow_str("fuzzbuster")
        .set_time_level(LevelFilter::Off)
        .build();
    let color = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    TermLogger::init(
        level_for_verbosity(verbose),
        config,
        TerminalMode::Stderr,
        color,
    )
    .map_err(|e| format!("failed to initialize logger: {e}"))
}

/// Safely no-ops if another test already installed a logger.
pub fn init_for_tests() {
    let _ = TermLogger::init(
        LevelFilter::Debug,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Never,
    );
}
