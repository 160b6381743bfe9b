use std::env;
use std::process;
use std::time::Instant;

mod builtins;
mod command;
mod config;
mod error;
mod input;
mod jobs;
mod launch;
mod logger;
mod redirects;
mod shell;
mod signal_handler;
mod status;

use config::{Action, LOG_ENV_VAR};
use logger::{dev_debug, dev_info, user_warn, SimpleLogger};

fn main() {
    let action = match config::parse_args(env::args().skip(1), env::var(LOG_ENV_VAR).ok()) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("minish: {e}");
            eprintln!("{}", config::usage());
            process::exit(2);
        }
    };

    // respond to common flags quickly so external tools don't hang
    let config = match action {
        Action::Help => {
            println!("{}", config::usage());
            process::exit(0);
        }
        Action::Version => {
            println!("{}", config::version());
            process::exit(0);
        }
        Action::Run(config) => config,
    };

    logger::configure_colors();
    SimpleLogger::to_stderr(config.log_level).into_global_logger();
    if let Some(value) = &config.rejected_log_env {
        user_warn!("ignoring invalid {LOG_ENV_VAR} value '{value}'");
    }

    let start = Instant::now();
    let mut shell = shell::Shell::new();
    dev_info!("{} running as pid {}", config::version(), process::id());
    dev_debug!("startup took {:?}", start.elapsed());

    let code = shell.run();
    process::exit(code);
}
