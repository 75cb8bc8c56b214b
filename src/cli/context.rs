//! Shared command context for CLI commands
//!
//! Extracts the setup every repository command repeats.

use std::path::Path;
use tortilla::config::TortillaConfig;
use tortilla::editor::ScriptedEditor;
use tortilla::error::Result;
use tortilla::rebase::RebaseOptions;
use tortilla::repo::GitRepo;
use tortilla::step::rebase_options;

/// Shared context for commands that operate on a repository
///
/// This struct encapsulates:
/// - Opening the git working tree
/// - Loading the project configuration
/// - Locating the executable git calls back into as editor and hooks
pub struct CommandContext {
    /// The git working tree
    pub repo: GitRepo,
    /// Project configuration
    pub config: TortillaConfig,
    /// Scripted editors backed by this executable
    pub editor: ScriptedEditor,
}

impl CommandContext {
    /// Open the repository containing `path` and load its configuration
    pub fn new(path: &Path) -> Result<Self> {
        let repo = GitRepo::open(path)?;
        let config = TortillaConfig::load(repo.root())?;
        let editor = ScriptedEditor::current()?;
        Ok(Self {
            repo,
            config,
            editor,
        })
    }

    /// Options for rebase-backed commands
    pub fn rebase_options(&self) -> RebaseOptions {
        rebase_options(&self.config, self.editor.clone())
    }
}
