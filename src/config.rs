use log::LevelFilter;

pub const LOG_ENV_VAR: &str = "MINISH_LOG";

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Warn;

#[derive(Debug, PartialEq)]
pub enum Action {
    Help,
    Version,
    Run(Config),
}

#[derive(Debug, PartialEq)]
pub struct Config {
    pub log_level: LevelFilter,
    /// Set when `MINISH_LOG` held something we couldn't parse.
    pub rejected_log_env: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: DEFAULT_LEVEL,
            rejected_log_env: None,
        }
    }
}

/// Interprets the command line (without the program name) and the value of
/// `MINISH_LOG`.
pub fn parse_args<I, S>(args: I, log_env: Option<String>) -> Result<Action, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = Config::default();
    let mut debug = false;

    for arg in args {
        match arg.as_ref() {
            "-h" | "--help" => return Ok(Action::Help),
            "-v" | "-V" | "--version" => return Ok(Action::Version),
            "-d" | "--debug" => debug = true,
            other => return Err(format!("unrecognized option '{other}'")),
        }
    }

    if debug {
        config.log_level = LevelFilter::Debug;
    }

    // the environment wins over the flag
    if let Some(value) = log_env {
        match value.parse::<LevelFilter>() {
            Ok(level) => config.log_level = level,
            Err(_) => config.rejected_log_env = Some(value),
        }
    }

    Ok(Action::Run(config))
}

pub fn usage() -> String {
    format!(
        "minish - a small job-control shell\n\n\
         Usage: minish [OPTIONS]\n  \
         -d, --debug      Trace process launches and reaping on stderr\n  \
         -h, --help       Print this help\n  \
         -v, --version    Print version\n\n\
         Set {LOG_ENV_VAR}=off|error|warn|info|debug|trace to pick the trace level.\n\
         Errors about commands and redirections are always shown."
    )
}

pub fn version() -> String {
    format!("minish v {}", env!("CARGO_PKG_VERSION"))
}
