//! Interactive prompting
//!
//! The driver asks for missing fields and confirmations through the
//! [`Prompter`] trait. [`TerminalPrompter`] reads answers from stdin, with
//! echo disabled for secret fields; [`NoPrompt`] is used with `--no-prompt` or when stdin is not a terminal
//! and declines every confirmation.

use crate::resource::{display_value, InputType, OptionType, SelectOption};
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};

/// One field the driver wants a value for
#[derive(Debug, Clone)]
pub struct Question<'a> {
    pub label: &'a str,
    pub required: bool,
    pub default: Option<String>,
    pub choices: &'a [SelectOption],
    pub help: Option<&'a str>,
    /// Read without echo
    pub secret: bool,
}

impl<'a> Question<'a> {
    /// Question for one option type; password fields are secret
    pub fn for_option(option: &'a OptionType, choices: &'a [SelectOption]) -> Self {
        let secret = option.input_type == InputType::Password;
        Question {
            label: option.label(),
            required: option.required,
            default: option.default().map(display_value),
            choices,
            help: option.help_block.as_deref(),
            secret,
        }
    }
}

pub trait Prompter: Send {
    /// Whether missing values may be asked for at all
    fn is_interactive(&self) -> bool;

    /// Ask a yes/no question; `false` unless the user answers yes
    fn confirm(&mut self, question: &str) -> io::Result<bool>;

    /// Ask for a field value; `None` when left blank
    fn ask(&mut self, question: &Question<'_>) -> io::Result<Option<String>>;
}

/// Prompter for non-interactive runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn is_interactive(&self) -> bool {
        false
    }

    fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        Ok(false)
    }

    fn ask(&mut self, _question: &Question<'_>) -> io::Result<Option<String>> {
        Ok(None)
    }
}

/// Prompter reading from stdin, writing prompts to stderr
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    /// Terminal prompter when stdin is a terminal, [`NoPrompt`] otherwise
    pub fn detect(no_prompt: bool) -> Box<dyn Prompter> {
        if no_prompt || !io::stdin().is_terminal() {
            Box::new(NoPrompt)
        } else {
            Box::new(TerminalPrompter)
        }
    }

    fn read_line(&self, prompt: &str) -> io::Result<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{} ", prompt.cyan())?;
        stderr.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim().to_string())
    }

    fn read_secret(&self, prompt: &str) -> io::Result<String> {
        let answer = rpassword::prompt_password(format!("{} ", prompt.cyan()))?;
        Ok(answer.trim().to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.read_line(&format!("{} (yes/no):", question))?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn ask(&mut self, question: &Question<'_>) -> io::Result<Option<String>> {
        if let Some(help) = question.help {
            eprintln!("  {}", help.dimmed());
        }
        if !question.choices.is_empty() {
            for (idx, choice) in question.choices.iter().enumerate() {
                eprintln!("  {}. {} ({})", idx + 1, choice.name, choice.value_str());
            }
        }

        let mut prompt = question.label.to_string();
        match &question.default {
            Some(_) if question.secret => prompt.push_str(" [********]"),
            Some(default) => prompt.push_str(&format!(" [{}]", default)),
            None => {}
        }
        if !question.required {
            prompt.push_str(" (optional)");
        }
        prompt.push(':');

        loop {
            let answer = if question.secret {
                self.read_secret(&prompt)?
            } else {
                self.read_line(&prompt)?
            };
            if answer.is_empty() {
                if question.required && question.default.is_none() {
                    eprintln!("{} is required", question.label);
                    continue;
                }
                return Ok(None);
            }
            if question.choices.is_empty() {
                return Ok(Some(answer));
            }
            match match_choice(question.choices, &answer) {
                Some(value) => return Ok(Some(value)),
                None => eprintln!("'{}' is not one of the listed choices", answer),
            }
        }
    }
}

/// Map an answer to a choice value: by 1-based position, value or name
pub fn match_choice(choices: &[SelectOption], answer: &str) -> Option<String> {
    if let Ok(position) = answer.parse::<usize>() {
        if let Some(choice) = position.checked_sub(1).and_then(|i| choices.get(i)) {
            return Some(choice.value_str());
        }
    }

    choices
        .iter()
        .find(|c| c.value_str() == answer)
        .or_else(|| choices.iter().find(|c| c.name.eq_ignore_ascii_case(answer)))
        .map(SelectOption::value_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn choices() -> Vec<SelectOption> {
        vec![
            SelectOption {
                name: "Username and Password".into(),
                value: json!("username-password"),
            },
            SelectOption {
                name: "API Key".into(),
                value: json!("api-key"),
            },
        ]
    }

    #[test]
    fn test_match_choice_by_position_value_and_name() {
        let choices = choices();
        assert_eq!(match_choice(&choices, "2").as_deref(), Some("api-key"));
        assert_eq!(match_choice(&choices, "username-password").as_deref(), Some("username-password"));
        assert_eq!(match_choice(&choices, "api key").as_deref(), Some("api-key"));
        assert_eq!(match_choice(&choices, "7"), None);
        assert_eq!(match_choice(&choices, "ssh"), None);
    }

    fn option(value: serde_json::Value) -> OptionType {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_password_option_is_secret() {
        let passphrase = option(json!({
            "fieldName": "passphrase",
            "fieldLabel": "Passphrase",
            "type": "password",
            "defaultValue": "changeme"
        }));
        let question = Question::for_option(&passphrase, &[]);
        assert!(question.secret);
        assert_eq!(question.label, "Passphrase");
        assert_eq!(question.default.as_deref(), Some("changeme"));
    }

    #[test]
    fn test_text_option_is_not_secret() {
        let name = option(json!({
            "fieldName": "name",
            "required": true,
            "defaultValue": "deploy",
            "helpBlock": "Unique name"
        }));
        let question = Question::for_option(&name, &[]);
        assert!(!question.secret);
        assert!(question.required);
        assert_eq!(question.default.as_deref(), Some("deploy"));
        assert_eq!(question.help, Some("Unique name"));
    }

    #[test]
    fn test_no_prompt_declines() {
        let mut prompter = NoPrompt;
        assert!(!prompter.is_interactive());
        assert!(!prompter.confirm("Delete?").unwrap());
    }
}
