// src/system/prompt.rs

//! The interactive seam. Menus and operations ask questions through `Prompter`, so the
//! production terminal UI and scripted test answers are interchangeable.

use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Could not read from the terminal: {0}")]
    Terminal(#[from] dialoguer::Error),
    #[error("No scripted answer left for prompt '{0}'")]
    Exhausted(String),
}

pub type PromptResult<T> = Result<T, PromptError>;

pub trait Prompter {
    /// Shows a list and returns the chosen index, or `None` when the user backs out.
    fn select(&self, prompt: &str, items: &[String], default: usize) -> PromptResult<Option<usize>>;

    /// Asks for a line of text. An empty answer yields `default` when one is given.
    fn input(&self, prompt: &str, default: Option<&str>) -> PromptResult<String>;

    fn confirm(&self, prompt: &str, default: bool) -> PromptResult<bool>;

    /// Waits for the user to acknowledge output before the menu redraws.
    fn pause(&self) -> PromptResult<()>;
}

/// Terminal prompts rendered with dialoguer's colorful theme.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn select(&self, prompt: &str, items: &[String], default: usize) -> PromptResult<Option<usize>> {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(default.min(items.len().saturating_sub(1)))
            .interact_opt()?;
        Ok(selection)
    }

    fn input(&self, prompt: &str, default: Option<&str>) -> PromptResult<String> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?.trim().to_string())
    }

    fn confirm(&self, prompt: &str, default: bool) -> PromptResult<bool> {
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn pause(&self) -> PromptResult<()> {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("prompt.pause"))
            .allow_empty(true)
            .interact_text()?;
        Ok(())
    }
}
