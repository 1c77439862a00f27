// src/core/project/minimal.rs

use crate::core::project::{ProjectContext, ProjectResult, ProjectType, ensure_supported, operations};
use crate::models::{Operation, OperationDefinition, ProjectKind};
use crate::system::prompt::Prompter;

static MINIMAL_OPERATIONS: &[OperationDefinition] = &[
    OperationDefinition {
        operation: Operation::Install,
        name: "Install",
        description: "Install the project in editable mode",
        icon: "📦",
    },
    OperationDefinition {
        operation: Operation::Test,
        name: "Test",
        description: "Run the test suite with pytest",
        icon: "🧪",
    },
    OperationDefinition {
        operation: Operation::Build,
        name: "Build",
        description: "Build sdist and wheel into dist/",
        icon: "🔨",
    },
    OperationDefinition {
        operation: Operation::Clean,
        name: "Clean",
        description: "Remove build/, dist/ and *.egg-info",
        icon: "🧹",
    },
    OperationDefinition {
        operation: Operation::Help,
        name: "Help",
        description: "Describe the available operations",
        icon: "❓",
    },
];

/// A plain package: install, test, build and clean.
#[derive(Debug)]
pub struct MinimalProject {
    context: ProjectContext,
}

impl MinimalProject {
    pub fn new(context: ProjectContext) -> Self {
        Self { context }
    }
}

impl ProjectType for MinimalProject {
    fn kind(&self) -> ProjectKind {
        ProjectKind::Minimal
    }

    fn context(&self) -> &ProjectContext {
        &self.context
    }

    fn operations(&self) -> &'static [OperationDefinition] {
        MINIMAL_OPERATIONS
    }

    fn perform(&self, operation: Operation, _prompter: &dyn Prompter) -> ProjectResult<()> {
        ensure_supported(self, operation)?;
        match operation {
            Operation::Install => self.install(),
            Operation::Test => self.test(),
            Operation::Build => operations::build(&self.context),
            Operation::Clean => self.clean(),
            _ => self.help(),
        }
    }

    fn install(&self) -> ProjectResult<()> {
        operations::install_editable(&self.context, None)
    }
}
