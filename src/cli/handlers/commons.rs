// src/cli/handlers/commons.rs

// Shared functions used by multiple handlers.

use anyhow::Result;
use serde_yaml::Value;

use crate::{
    constants::DEFAULT_VENV_NAME,
    core::{
        expression,
        project::ProjectContext,
        template_schema::{Answers, Question, QuestionType, TemplateSchema},
    },
    system::prompt::Prompter,
};

/// Project names become directory and package names: spaces turn into underscores.
pub fn sanitize_project_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}

fn ask_question(prompter: &dyn Prompter, question: &Question, answers: &Answers) -> Result<Value> {
    let default = question.resolved_default(answers);

    if !question.choices.is_empty() {
        let labels: Vec<String> = question.choices.iter().map(|c| c.label.clone()).collect();
        let shown = expression::to_display(&default);
        let initial = question
            .choices
            .iter()
            .position(|c| expression::to_display(&c.value) == shown)
            .unwrap_or(0);
        return Ok(prompter
            .select(question.prompt(), &labels, initial)?
            .and_then(|i| question.choices.get(i))
            .map(|c| c.value.clone())
            .unwrap_or(default));
    }

    if question.kind == QuestionType::Bool {
        let answer = prompter.confirm(question.prompt(), expression::is_truthy(&default))?;
        return Ok(Value::Bool(answer));
    }

    let shown = expression::to_display(&default);
    let raw = prompter.input(question.prompt(), Some(shown.as_str()))?;
    match question.coerce(&Value::String(raw.clone())) {
        Some(value) => Ok(value),
        None => {
            log::warn!(
                "Answer '{}' is not a valid {:?} for '{}'; using the default",
                raw,
                question.kind,
                question.name
            );
            Ok(default)
        }
    }
}

/// Asks every schema question that is not answered yet. Hidden questions (`when` is
/// false) take their default silently.
pub fn ask_template_questions(
    prompter: &dyn Prompter,
    schema: &TemplateSchema,
    mut answers: Answers,
) -> Result<Answers> {
    for question in &schema.questions {
        if answers.contains_key(&question.name) {
            continue;
        }
        let value = if question.is_visible(&answers) {
            ask_question(prompter, question, &answers)?
        } else {
            question.resolved_default(&answers)
        };
        answers.insert(question.name.clone(), value);
    }
    Ok(answers)
}

/// Asks whether the project runs in the host interpreter or in its own virtual
/// environment, and sets it up. `false` when the user backed out.
pub fn choose_environment(prompter: &dyn Prompter, context: &ProjectContext) -> Result<bool> {
    let items = vec![
        t!("env.choice.virtual").to_string(),
        t!("env.choice.host").to_string(),
    ];
    match prompter.select(t!("env.choice.prompt"), &items, 0)? {
        Some(0) => {
            let name = prompter.input(t!("env.ask_name"), Some(DEFAULT_VENV_NAME))?;
            let env = context.create_virtual_environment(&name)?;
            println!(
                "{}",
                format!(t!("env.created"), path = env.root().display())
            );
            Ok(true)
        }
        Some(_) => {
            let env = context.use_host_environment()?;
            println!(
                "{}",
                format!(t!("env.using_host"), python = env.python().display())
            );
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::prompt::scripted::{Answer, ScriptedPrompter};

    const SCHEMA: &str = r#"
_version: "1.0.0"
project_name:
  type: str
  help: Project name
license:
  type: str
  choices: [MIT, BSD, GPL]
  default: BSD
use_docs:
  type: bool
  default: false
docs_theme:
  type: str
  default: furo
  when: "{{ use_docs }}"
author:
  type: str
  default: "{{ project_name }} team"
"#;

    #[test]
    fn project_names_lose_their_spaces() {
        assert_eq!(sanitize_project_name("  my cool  app "), "my_cool_app");
        assert_eq!(sanitize_project_name("demo"), "demo");
    }

    #[test]
    fn questions_follow_choices_types_and_conditions() {
        let schema = TemplateSchema::parse(SCHEMA, "copier.yml").expect("schema");
        let mut answers = Answers::new();
        answers.insert("project_name".into(), Value::from("demo"));
        let prompter = ScriptedPrompter::new([
            Answer::Choose("MIT"),
            Answer::No,
            Answer::Text(""),
        ]);

        let answers = ask_template_questions(&prompter, &schema, answers).expect("answers");

        assert_eq!(answers["license"], Value::from("MIT"));
        assert_eq!(answers["use_docs"], Value::Bool(false));
        assert_eq!(answers["docs_theme"], Value::from("furo"));
        assert_eq!(answers["author"], Value::from("demo team"));
        assert_eq!(prompter.remaining(), 0);
    }
}
