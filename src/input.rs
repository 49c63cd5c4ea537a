//! Console prompt abstraction with typed defaults.
//!
//! Every prompt degrades to its default when the input stream is exhausted or
//! unreadable, so unattended runs never block or fail on missing console
//! input. The [`InputSource`] seam lets tests drive the resolver with canned
//! line sequences instead of real console I/O.

use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::config::Bounds;

/// Line-oriented input source for interactive prompts.
pub trait InputSource {
    /// Reads one line of input, without the trailing newline.
    ///
    /// Returns `None` on end of input or read failure; callers substitute the
    /// prompt default in that case.
    fn read_line(&mut self) -> Option<String>;
}

/// Input source backed by the process's standard input.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleInput;

impl InputSource for ConsoleInput {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
            Err(err) => {
                warn!(error = %err, "failed to read from stdin");
                None
            }
        }
    }
}

/// Prompt operations available to configuration collectors.
///
/// The trait is object safe so strategies can take `&mut dyn Prompt` without
/// being generic over the input and output types.
pub trait Prompt {
    /// Prompts for a required value; empty or absent input yields `default`.
    fn required(&mut self, label: &str, default: &str) -> String;

    /// Prompts for an optional value; empty or absent input yields `default`.
    fn optional(&mut self, label: &str, default: &str) -> String;

    /// Prompts with a numbered choice list. Accepts either the option number
    /// or the option name (case-insensitive); anything else yields `default`.
    fn choice(&mut self, label: &str, options: &[&str], default: &str) -> String;

    /// Prompts for a yes/no answer; empty or absent input yields `default`.
    fn yes_no(&mut self, label: &str, default: bool) -> bool;

    /// Prompts for an integer within `bounds`, re-prompting on out-of-range
    /// or unparseable input; empty or absent input yields `default`.
    fn int_in_range(&mut self, label: &str, default: u32, bounds: Bounds) -> u32;

    /// Prompts until the answer matches one of `valid` (case-insensitive),
    /// re-prompting otherwise; empty or absent input yields `default`.
    fn choice_from_set(&mut self, label: &str, valid: &[&str], default: &str) -> String;

    /// Writes a line of informational text to the console.
    fn note(&mut self, text: &str);

    /// Writes `prompt_text` without a newline and reads one raw line.
    ///
    /// Returns `None` on end of input; used by menus that apply their own
    /// default handling.
    fn raw(&mut self, prompt_text: &str) -> Option<String>;
}

/// Console prompter pairing an input source with an output writer.
#[derive(Debug)]
pub struct Prompter<I, W> {
    input: I,
    output: W,
}

impl<I: InputSource, W: Write> Prompter<I, W> {
    /// Creates a prompter over the given input source and output writer.
    #[must_use]
    pub const fn new(input: I, output: W) -> Self {
        Self { input, output }
    }

    /// Consumes the prompter and returns its output writer.
    #[must_use]
    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, prompt_text: &str) -> Option<String> {
        write!(self.output, "{prompt_text}").ok();
        self.output.flush().ok();
        self.input.read_line().map(|line| line.trim().to_owned())
    }

    fn fallback(&mut self, label: &str, default: &str) {
        warn!(prompt = label, %default, "no input available, using default");
        writeln!(self.output, "No input available, using default: {default}").ok();
    }
}

impl<I: InputSource, W: Write> Prompt for Prompter<I, W> {
    fn required(&mut self, label: &str, default: &str) -> String {
        match self.ask(&format!("{label} [{default}]: ")) {
            Some(value) if !value.is_empty() => value,
            Some(_) => default.to_owned(),
            None => {
                self.fallback(label, default);
                default.to_owned()
            }
        }
    }

    fn optional(&mut self, label: &str, default: &str) -> String {
        match self.ask(&format!("{label} [{default}] (optional): ")) {
            Some(value) if !value.is_empty() => value,
            Some(_) => default.to_owned(),
            None => {
                self.fallback(label, default);
                default.to_owned()
            }
        }
    }

    fn choice(&mut self, label: &str, options: &[&str], default: &str) -> String {
        writeln!(self.output, "{label}:").ok();
        for (index, option) in options.iter().enumerate() {
            let marker = if *option == default { " (default)" } else { "" };
            writeln!(self.output, "  {}. {option}{marker}", index + 1).ok();
        }

        let Some(answer) = self.ask(&format!("Choose [{default}]: ")) else {
            self.fallback(label, default);
            return default.to_owned();
        };
        if answer.is_empty() {
            return default.to_owned();
        }

        if let Ok(number) = answer.parse::<usize>()
            && let Some(option) = number.checked_sub(1).and_then(|index| options.get(index))
        {
            return (*option).to_owned();
        }
        if let Some(option) = options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(&answer))
        {
            return (*option).to_owned();
        }

        writeln!(self.output, "Invalid choice, using default: {default}").ok();
        warn!(prompt = label, value = %answer, %default, "invalid choice, using default");
        default.to_owned()
    }

    fn yes_no(&mut self, label: &str, default: bool) -> bool {
        let hint = if default { "Y/n" } else { "y/N" };
        let Some(answer) = self.ask(&format!("{label} [{hint}]: ")) else {
            self.fallback(label, if default { "yes" } else { "no" });
            return default;
        };
        if answer.is_empty() {
            return default;
        }
        let lowered = answer.to_ascii_lowercase();
        lowered.starts_with('y') || lowered.starts_with('t') || lowered == "1"
    }

    fn int_in_range(&mut self, label: &str, default: u32, bounds: Bounds) -> u32 {
        loop {
            let prompt_text =
                format!("{label} [{default}] (range: {}-{}): ", bounds.min, bounds.max);
            let Some(answer) = self.ask(&prompt_text) else {
                self.fallback(label, &default.to_string());
                return default;
            };
            if answer.is_empty() {
                return default;
            }

            match answer.parse::<u32>() {
                Ok(value) if bounds.contains(value) => return value,
                Ok(value) => {
                    writeln!(
                        self.output,
                        "{value} is outside {}-{}, please try again",
                        bounds.min, bounds.max
                    )
                    .ok();
                }
                Err(_) => {
                    writeln!(self.output, "Invalid number, please enter an integer").ok();
                }
            }
        }
    }

    fn choice_from_set(&mut self, label: &str, valid: &[&str], default: &str) -> String {
        loop {
            let Some(answer) = self.ask(&format!("{label} [{default}]: ")) else {
                self.fallback(label, default);
                return default.to_owned();
            };
            if answer.is_empty() {
                return default.to_owned();
            }

            if let Some(option) = valid
                .iter()
                .find(|option| option.eq_ignore_ascii_case(&answer))
            {
                return (*option).to_owned();
            }
            writeln!(self.output, "Invalid option. Valid options: {}", valid.join(", ")).ok();
        }
    }

    fn note(&mut self, text: &str) {
        writeln!(self.output, "{text}").ok();
    }

    fn raw(&mut self, prompt_text: &str) -> Option<String> {
        self.ask(prompt_text)
    }
}
