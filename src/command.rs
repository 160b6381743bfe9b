use crate::error::ParseError;

pub const MAX_LINE_LENGTH: usize = 2048;
pub const MAX_ARGS: usize = 512;

const PID_TOKEN: &str = "$$";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub argv: Vec<String>,
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    pub background: bool,
}

impl Command {
    /// Parses a line without its trailing newline.
    ///
    /// Blank lines and lines starting with `#` yield `Ok(None)`. Tokens are
    /// separated by runs of whitespace; there is no quoting. `<` and `>` take
    /// the following token as a file name, `&` anywhere marks the command as
    /// background, and a bare `$$` is replaced with `shell_pid`.
    pub fn parse(line: &str, shell_pid: u32) -> Result<Option<Self>, ParseError> {
        if line.len() > MAX_LINE_LENGTH {
            return Err(ParseError::LineTooLong(line.len()));
        }
        if line.starts_with('#') {
            return Ok(None);
        }

        let mut tokens = line.split_whitespace();
        let mut argv = Vec::new();
        let mut input_path = None;
        let mut output_path = None;
        let mut background = false;

        while let Some(token) = tokens.next() {
            match token {
                "<" => {
                    let path = tokens.next().ok_or(ParseError::MissingRedirectTarget("<"))?;
                    input_path = Some(path.to_string());
                }
                ">" => {
                    let path = tokens.next().ok_or(ParseError::MissingRedirectTarget(">"))?;
                    output_path = Some(path.to_string());
                }
                "&" => background = true,
                PID_TOKEN => argv.push(shell_pid.to_string()),
                _ => argv.push(token.to_string()),
            }
        }

        if argv.len() > MAX_ARGS {
            return Err(ParseError::TooManyArguments(argv.len()));
        }

        if argv.is_empty() {
            if input_path.is_none() && output_path.is_none() && !background {
                return Ok(None);
            }
            return Err(ParseError::MissingCommand);
        }

        Ok(Some(Command {
            argv,
            input_path,
            output_path,
            background,
        }))
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}
