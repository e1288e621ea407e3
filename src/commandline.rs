//! Construction of executable commands from declared command strings.
//!
//! A command string is an opaque, service-declared value. This module
//! tokenizes it (quote-aware), expands `$NAME` / `${NAME}` references
//! through a caller-supplied environment lookup, and turns the result
//! into a `std::process::Command` rooted in the service directory.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::{Error, Result};

static VAR_PATTERN: OnceLock<Regex> = OnceLock::new();

fn var_pattern() -> &'static Regex {
    VAR_PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("variable pattern is valid")
    })
}

/// Split a command string into words.
///
/// Supports single quotes (literal), double quotes (backslash escapes
/// `\"` and `\\`), and backslash escapes outside quotes. An unterminated
/// quote is an error.
pub fn split_words(input: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(Error::UnterminatedQuote(input.to_string())),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(Error::UnterminatedQuote(input.to_string())),
                        },
                        Some(c) => current.push(c),
                        None => return Err(Error::UnterminatedQuote(input.to_string())),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(c) = chars.next() {
                    current.push(c);
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Expand `$NAME` and `${NAME}` references through `getenv`.
///
/// Unset names expand to the empty string.
pub fn expand_vars<F>(input: &str, getenv: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    var_pattern()
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            getenv(name).unwrap_or_default()
        })
        .into_owned()
}

/// Build an executable command for a service.
///
/// The command string is tokenized and expanded, the program is resolved
/// (against the service directory when it contains a path separator,
/// otherwise on `PATH`), and the working directory of the returned
/// command is set to `working_dir` joined with `service_path`.
pub fn construct_command<F>(
    working_dir: &Path,
    service_path: &Path,
    command: &str,
    getenv: &F,
) -> Result<Command>
where
    F: Fn(&str) -> Option<String>,
{
    let words = split_words(command)?;
    let mut expanded = words
        .iter()
        .map(|w| expand_vars(w, getenv))
        .collect::<Vec<_>>()
        .into_iter();

    let program = match expanded.next() {
        Some(p) if !p.is_empty() => p,
        _ => return Err(Error::EmptyCommand),
    };

    let dir = working_dir.join(service_path);
    let program = resolve_program(&program, &dir)?;

    let mut cmd = Command::new(program);
    cmd.args(expanded).current_dir(dir);
    Ok(cmd)
}

fn resolve_program(program: &str, dir: &Path) -> Result<PathBuf> {
    if program.contains('/') {
        let path = if Path::new(program).is_absolute() {
            PathBuf::from(program)
        } else {
            dir.join(program)
        };
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::CommandNotFound(program.to_string()))
        }
    } else {
        which::which(program).map_err(|_| Error::CommandNotFound(program.to_string()))
    }
}
