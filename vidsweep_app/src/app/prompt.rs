use std::{collections::HashMap, path::PathBuf, process::Command};

use bytesize::ByteSize;
use dialoguer::Input;

use crate::app::resolution::{Decision, DecisionSource, GroupEntry, GroupView};

// Each repeat preview of the same file starts this much further in, so the
// operator can sample different parts of a long video.
const PREVIEW_STEP_SECS: f64 = 60.0;

/// The interactive decision source: presents each group on the terminal
/// and reads commands until one of them resolves the group.
///
/// Previewing plays a file with ffplay and leaves the group unresolved,
/// so the operator can look as many times as they like before deciding.
pub struct ConsolePrompt {
    preview_counts: HashMap<PathBuf, u32>,
    group_no: usize,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self {
            preview_counts: HashMap::new(),
            group_no: 0,
        }
    }

    #[allow(clippy::print_stdout)]
    fn present(&self, group: &GroupView) {
        println!("\n=== group {} ===", self.group_no);
        for (idx, entry) in group.entries().iter().enumerate() {
            println!(
                "  [{idx}] {}  ({}, {}, {}x{})",
                entry.path.display(),
                ByteSize(entry.file_size),
                format_duration(entry.duration),
                entry.resolution.0,
                entry.resolution.1,
            );
        }
    }

    fn preview(&mut self, entry: &GroupEntry) {
        let views = self.preview_counts.entry(entry.path.clone()).or_insert(0);
        let offset = (f64::from(*views) * PREVIEW_STEP_SECS) % entry.duration.max(1.0);
        *views += 1;

        let status = Command::new("ffplay")
            .arg("-loglevel")
            .arg("error")
            .arg("-ss")
            .arg(format!("{offset:.1}"))
            .arg(&entry.path)
            .status();

        if let Err(e) = status {
            warn!("could not launch ffplay: {e}");
        }
    }
}

impl DecisionSource for ConsolePrompt {
    fn decide(&mut self, group: &GroupView) -> Decision {
        self.group_no += 1;
        self.present(group);

        loop {
            let raw: Result<String, _> = Input::new()
                .with_prompt("keep <n> | v <n> preview | s skip | i ignore | q quit")
                .interact_text();

            let Ok(raw) = raw else {
                // stdin gone; treat like an explicit quit.
                return Decision::Quit;
            };

            match parse_command(&raw, group.len()) {
                Some(PromptCommand::Resolve(decision)) => return decision,
                Some(PromptCommand::Preview(idx)) => {
                    self.preview(&group.entries()[idx]);
                    self.present(group);
                }
                None => {
                    #[allow(clippy::print_stdout)]
                    let () = println!("unrecognized command: {raw}");
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptCommand {
    Resolve(Decision),
    Preview(usize),
}

fn parse_command(raw: &str, group_len: usize) -> Option<PromptCommand> {
    let tokens = raw.split_whitespace().collect::<Vec<_>>();

    let parse_idx = |token: &str| token.parse::<usize>().ok().filter(|&i| i < group_len);

    match tokens.as_slice() {
        ["s"] => Some(PromptCommand::Resolve(Decision::Skip)),
        ["i"] => Some(PromptCommand::Resolve(Decision::Ignore)),
        ["q"] => Some(PromptCommand::Resolve(Decision::Quit)),
        ["v", idx] => parse_idx(idx).map(PromptCommand::Preview),
        ["keep", idx] | ["k", idx] | [idx] => {
            parse_idx(idx).map(|i| PromptCommand::Resolve(Decision::Keep(i)))
        }
        _ => None,
    }
}

fn format_duration(secs: f64) -> String {
    let total = secs.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod test {
    use super::{format_duration, parse_command, PromptCommand};
    use crate::app::resolution::Decision;

    #[test]
    fn test_commands_parse() {
        assert_eq!(
            parse_command("s", 3),
            Some(PromptCommand::Resolve(Decision::Skip))
        );
        assert_eq!(
            parse_command("i", 3),
            Some(PromptCommand::Resolve(Decision::Ignore))
        );
        assert_eq!(
            parse_command("q", 3),
            Some(PromptCommand::Resolve(Decision::Quit))
        );
        assert_eq!(
            parse_command("2", 3),
            Some(PromptCommand::Resolve(Decision::Keep(2)))
        );
        assert_eq!(
            parse_command("keep 0", 3),
            Some(PromptCommand::Resolve(Decision::Keep(0)))
        );
        assert_eq!(parse_command("v 1", 3), Some(PromptCommand::Preview(1)));
    }

    #[test]
    fn test_out_of_range_and_garbage_are_rejected() {
        assert_eq!(parse_command("3", 3), None);
        assert_eq!(parse_command("v 9", 3), None);
        assert_eq!(parse_command("frobnicate", 3), None);
        assert_eq!(parse_command("", 3), None);
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        assert_eq!(
            parse_command("  keep   1 ", 3),
            Some(PromptCommand::Resolve(Decision::Keep(1)))
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(61.4), "1:01");
        assert_eq!(format_duration(3599.9), "60:00");
    }
}
