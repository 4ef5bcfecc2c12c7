// Copyright 2020-2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! A bridge to an external template-generator process.
//!
//! A template generator is launched as a subprocess, given the current state and three message
//! blocks, and expected to print two bracketed decimal lists (a tag and a template) to stdout.
//! The process is invoked directly via argv, with no intervening shell, and its stdout is
//! tokenized with a small streaming scanner rather than a regex so that log lines interleaved
//! with the answer don't break parsing.

use crate::error::Error;
use crate::template::Template;
use crate::trit::{State, Trit, MESSAGE_LENGTH};

use std::process::{Command, Output};

const TAG_LENGTH: usize = MESSAGE_LENGTH;
const TEMPLATE_WIRE_LENGTH: usize = MESSAGE_LENGTH * 2;
const MAX_ATTEMPTS: u32 = 3;

/// Invokes the external template generator and returns its parsed tag trits and template.
///
/// `command` is the program and its leading arguments (e.g. `["python3",
/// "gen_template.py"]`); the state and three message blocks are appended as
/// `--state=[...] --1mb=[...] --2mb=[...] --3mb=[...]` arguments, each rendered as a
/// comma-separated decimal list, matching the wire format the generator expects.
///
/// Returns the 243-trit tag alongside the parsed [`Template`]; callers that need the tag (e.g. to
/// derive a tryte tag for a ledger transaction, as the original attack script does) can read it
/// without re-parsing the subprocess output themselves.
///
/// Retries up to [`MAX_ATTEMPTS`] times on a transient I/O error launching the process (the
/// process itself exiting non-zero, or producing unparseable output, is not considered
/// transient and is reported immediately).
pub fn run_template_generator(
    state: &State,
    mb1: &[Trit],
    mb2: &[Trit],
    mb3: &[Trit],
    command: &[String],
) -> Result<(Vec<Trit>, Template), Error> {
    let (program, leading_args) = command
        .split_first()
        .ok_or_else(|| Error::InvalidArgument("template generator command is empty".to_string()))?;

    let mut last_io_err = None;
    for attempt in 1..=MAX_ATTEMPTS {
        let mut cmd = Command::new(program);
        cmd.args(leading_args);
        cmd.arg(format!("--state=[{}]", render(state)));
        cmd.arg(format!("--1mb=[{}]", render(mb1)));
        cmd.arg(format!("--2mb=[{}]", render(mb2)));
        cmd.arg(format!("--3mb=[{}]", render(mb3)));

        match cmd.output() {
            Ok(output) => return parse_output(&output),
            Err(err) => {
                log::warn!("template generator launch attempt {attempt} failed: {err}");
                last_io_err = Some(err);
            }
        }
    }

    Err(Error::Io(last_io_err.expect(
        "loop runs at least once and only exits via return or by setting last_io_err",
    )))
}

fn render(trits: &[Trit]) -> String {
    trits
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_output(output: &Output) -> Result<(Vec<Trit>, Template), Error> {
    if !output.status.success() {
        return Err(Error::ExternalTool(format!(
            "template generator exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    parse_stdout(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the tag and template out of the generator's stdout, once the exit status has already
/// been checked. Split out from [`parse_output`] so the parsing logic can be exercised directly
/// in tests without constructing a [`std::process::Output`].
fn parse_stdout(stdout: &str) -> Result<(Vec<Trit>, Template), Error> {
    let lists = tokenize_bracketed_lists(stdout)?;

    let [tag, template_wire] = <[Vec<i64>; 2]>::try_from(lists).map_err(|lists| {
        Error::ExternalTool(format!(
            "expected exactly 2 bracketed lists, found {}",
            lists.len()
        ))
    })?;

    if tag.len() != TAG_LENGTH {
        return Err(Error::ExternalTool(format!(
            "tag list must have {TAG_LENGTH} entries, got {}",
            tag.len()
        )));
    }
    if template_wire.len() != TEMPLATE_WIRE_LENGTH {
        return Err(Error::ExternalTool(format!(
            "template list must have {TEMPLATE_WIRE_LENGTH} entries, got {}",
            template_wire.len()
        )));
    }

    let tag_trits: Vec<Trit> = tag
        .iter()
        .map(|&v| {
            Trit::try_from(v)
                .map_err(|_| Error::ExternalTool(format!("tag value {v} out of range for a trit")))
        })
        .collect::<Result<_, _>>()?;

    // The generator emits two templates back to back; only the second half is used, matching
    // the reference tool's contract.
    let wire: Vec<Trit> = template_wire[MESSAGE_LENGTH..]
        .iter()
        .map(|&v| {
            Trit::try_from(v).map_err(|_| {
                Error::ExternalTool(format!("template value {v} out of range for a trit"))
            })
        })
        .collect::<Result<_, _>>()?;

    let template = Template::from_wire(&wire)?;
    Ok((tag_trits, template))
}

/// Scans `text` for bracketed, comma-separated decimal lists (e.g. `[1, -1, 0]`) and returns
/// each as a parsed `Vec<i64>`, in the order they appear.
///
/// Unlike a regex scrape, this never backtracks and treats anything outside of a `[...]` span as
/// noise to be skipped, which tolerates log lines the generator may interleave with its answer.
fn tokenize_bracketed_lists(text: &str) -> Result<Vec<Vec<i64>>, Error> {
    let mut lists = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if ch != '[' {
            continue;
        }

        let mut numbers = Vec::new();
        let mut current = String::new();
        let mut closed = false;

        for (_, c) in chars.by_ref() {
            match c {
                ']' => {
                    closed = true;
                    break;
                }
                ',' => {
                    push_number(&mut numbers, &current)?;
                    current.clear();
                }
                c if c.is_whitespace() => {}
                c => current.push(c),
            }
        }

        if !closed {
            return Err(Error::ExternalTool(
                "unterminated bracketed list in template generator output".to_string(),
            ));
        }
        if !current.trim().is_empty() {
            push_number(&mut numbers, &current)?;
        }

        lists.push(numbers);
    }

    Ok(lists)
}

fn push_number(numbers: &mut Vec<i64>, token: &str) -> Result<(), Error> {
    let trimmed = token.trim();
    let value = trimmed.parse::<i64>().map_err(|_| {
        Error::ExternalTool(format!(
            "could not parse {trimmed:?} as a decimal integer in template generator output"
        ))
    })?;
    numbers.push(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_two_lists() {
        let text = "tag = [1, -1, 0]\ntemplate = [2, 2, 3]\n";
        let lists = tokenize_bracketed_lists(text).unwrap();
        assert_eq!(lists, vec![vec![1, -1, 0], vec![2, 2, 3]]);
    }

    #[test]
    fn tokenizes_with_no_whitespace() {
        let text = "[1,-1,0][2,2,3]";
        let lists = tokenize_bracketed_lists(text).unwrap();
        assert_eq!(lists, vec![vec![1, -1, 0], vec![2, 2, 3]]);
    }

    #[test]
    fn rejects_unterminated_list() {
        let text = "[1, -1, 0";
        assert!(tokenize_bracketed_lists(text).is_err());
    }

    #[test]
    fn rejects_non_numeric_token() {
        let text = "[1, foo, 0]";
        assert!(tokenize_bracketed_lists(text).is_err());
    }

    #[test]
    fn ignores_noise_outside_brackets() {
        let text = "INFO: starting\n[1, 2]\nINFO: done\n[3, 4]\n";
        let lists = tokenize_bracketed_lists(text).unwrap();
        assert_eq!(lists, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn rejects_empty_command() {
        let state: State = [0; crate::trit::STATE_LENGTH];
        let mb = [0i8; MESSAGE_LENGTH];
        let err = run_template_generator(&state, &mb, &mb, &mb, &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    fn wire_list(values: impl IntoIterator<Item = i64>) -> String {
        format!(
            "[{}]",
            values
                .into_iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        )
    }

    #[test]
    fn parse_stdout_returns_the_tag_alongside_the_second_half_template() {
        let tag: Vec<i64> = (0..TAG_LENGTH).map(|i| (i % 3) as i64 - 1).collect();
        let first_half: Vec<i64> = vec![2; MESSAGE_LENGTH];
        let mut second_half: Vec<i64> = vec![2; MESSAGE_LENGTH];
        second_half[0] = 3;
        let wire: Vec<i64> = first_half.into_iter().chain(second_half).collect();

        let stdout = format!(
            "anything {} junk {} tail",
            wire_list(tag.clone()),
            wire_list(wire)
        );

        let (parsed_tag, template) = parse_stdout(&stdout).unwrap();
        assert_eq!(parsed_tag, tag.iter().map(|&v| v as Trit).collect::<Vec<_>>());
        assert_eq!(template.diff_index(), 0);
    }

    #[test]
    fn rejects_stdout_with_only_one_bracketed_list() {
        let stdout = wire_list(0..MESSAGE_LENGTH as i64);
        assert!(matches!(
            parse_stdout(&stdout).unwrap_err(),
            Error::ExternalTool(_)
        ));
    }
}
