use rustyline::{
    completion::Completer, highlight::Highlighter, hint::Hinter, validate::Validator, Context,
    Helper,
};

use crate::cli::command::{command_info, COMMANDS};

/// Completion candidates for the word under the cursor: `(start, candidates)`.
pub fn complete_line(line: &str, pos: usize, box_names: &[String]) -> (usize, Vec<String>) {
    let pos = pos.min(line.len());
    let Some(head) = line.get(..pos) else {
        return (pos, vec![]);
    };

    let leading = head.len() - head.trim_start().len();
    let head = &head[leading..];

    let Some((command, rest)) = head.split_once(char::is_whitespace) else {
        let candidates = COMMANDS
            .iter()
            .map(|c| c.name)
            .filter(|name| name.starts_with(head))
            .map(String::from)
            .collect();
        return (leading, candidates);
    };

    let takes_box = command_info(command).map(|c| c.takes_box).unwrap_or(false);
    let prefix = rest.trim_start();
    if !takes_box || prefix.contains(char::is_whitespace) {
        return (pos, vec![]);
    }

    let start = pos - prefix.len();
    let mut candidates: Vec<String> = box_names
        .iter()
        .filter(|name| name.starts_with(prefix))
        .cloned()
        .collect();
    candidates.sort();

    (start, candidates)
}

/// Line editor helper completing commands and box names.
#[derive(Debug, Default)]
pub struct ShellHelper {
    box_names: Vec<String>,
}

impl ShellHelper {
    pub fn new(box_names: Vec<String>) -> Self {
        Self { box_names }
    }

    pub fn set_box_names(&mut self, box_names: Vec<String>) {
        self.box_names = box_names;
    }
}

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok(complete_line(line, pos, &self.box_names))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}
