use minish::Interpreter;
use minish::config::Options;
use minish::logging;
use std::io::Write;
use std::process;

fn main() {
    let opts: Options = argh::from_env();
    logging::init(&opts);

    let mut shell = Interpreter::default();
    let result = match &opts.command {
        Some(script) => shell.run_source(script),
        None => {
            let history = opts.history_path(shell.env());
            shell.repl(history)
        }
    };

    let _ = std::io::stdout().flush();
    match result {
        Ok(status) => process::exit(status),
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("minish: {err:#}");
            process::exit(1);
        }
    }
}
