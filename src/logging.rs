use crate::config::Options;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;

/// Installs the global logger described by `opts`.
///
/// Best-effort: a log file that cannot be opened, or a logger that is
/// already installed, is reported on stderr and otherwise ignored.
pub fn init(opts: &Options) {
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();

    let result = match &opts.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path);
            match file {
                Ok(file) => WriteLogger::init(opts.log_level, config, file),
                Err(err) => {
                    eprintln!("minish: cannot open log file {}: {err}", path.display());
                    return;
                }
            }
        }
        None => TermLogger::init(
            opts.log_level,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    };
    if let Err(err) = result {
        eprintln!("minish: logging disabled: {err}");
    }
}
