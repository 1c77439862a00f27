use clap::Parser;
use std::path::PathBuf;

pub mod dispatcher;
pub mod handlers;
pub mod menu;

/// Builds the color-aware help text from the `cli.help.template` locale entry.
fn build_help_string() -> &'static str {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let template = t!("cli.help.template");

    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let hl = if use_colors { "\x1b[1;36m" } else { "" }; // Bold Cyan
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan
    let dim = if use_colors { "\x1b[2m" } else { "" };
    let reset = if use_colors { "\x1b[0m" } else { "" };

    let formatted_string = template
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset);

    Box::leak(formatted_string.into_boxed_str())
}

/// cicd: create Python projects from templates and run their development workflow.
#[derive(Parser, Debug)]
#[command(
    name = "cicd",
    author,
    version,
    about,
    help_template = { build_help_string() },
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
// `-v` is ours: it prints `cicd, version X.Y.Z`.
#[command(disable_version_flag = true, disable_help_subcommand = true)]
pub struct Cli {
    /// Create a new project from a template.
    #[arg(short = 'c', long, conflicts_with_all = ["restore", "manage_env"])]
    pub create: bool,

    /// Reset the project configuration to its defaults.
    #[arg(short = 'r', long, conflicts_with = "manage_env")]
    pub restore: bool,

    /// Manage the project environment before operating on it.
    #[arg(short = 'e', long = "env")]
    pub manage_env: bool,

    /// The project directory.
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    pub directory: PathBuf,

    /// Where templates are looked up.
    #[arg(long, value_name = "DIR", env = crate::constants::TEMPLATES_ENV_VAR)]
    pub templates: Option<PathBuf>,

    /// Print the version and exit.
    #[arg(short = 'v', long)]
    pub version: bool,
}

impl Cli {
    /// The name of the action to dispatch; `operate` when no action flag is given.
    pub fn action_name(&self) -> &'static str {
        if self.create {
            "create"
        } else if self.restore {
            "restore"
        } else if self.manage_env {
            "env"
        } else {
            "operate"
        }
    }
}
