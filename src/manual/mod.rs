//! Manual markdown: block notation and format conversion
//!
//! Instruction files carry generated content inside `[{]:` / `[}]:` block
//! markers. `block` parses the notation, `registry` maps block types back to
//! template source and `format` converts whole manuals between development
//! and production formats.

mod block;
mod format;
mod registry;

pub use block::{Block, BlockKind, Blocks, CLOSE_MARKER, ParseDepth, open_marker, parse};
pub use format::{ManualContext, ManualRenderer, REGION, is_production_format};
pub use registry::{BlockBehavior, BlockRegistry, HELPER, PARTIAL, ToTemplate};

use crate::config::{ManualConfig, PROJECT_DIR, TortillaConfig};
use crate::error::{Error, Result};
use crate::repo::GitRepo;
use crate::step::find_step;
use crate::types::StepId;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Target format of a manual conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualFormat {
    /// Template source
    Development,
    /// Rendered output with regions
    Production,
}

/// Renderer for manuals in `repo`: configured templates, the `diffStep`
/// helper and the project's partials
pub fn repo_renderer(repo: &GitRepo, config: &ManualConfig) -> Result<ManualRenderer> {
    let mut renderer = ManualRenderer::new(config);

    let helper_repo = repo.clone();
    renderer.register_helper("diffStep", move |params| {
        let step: StepId = params
            .first()
            .ok_or(Error::MissingArgument("step"))?
            .parse()?;
        let commit = find_step(&helper_repo, step)?;
        let diff = helper_repo.show_diff(&commit.hash)?;
        Ok(format!("```diff\n{diff}\n```"))
    });

    renderer.register_partials_dir(
        &repo.root().join(PROJECT_DIR).join("manuals").join("partials"),
    )?;
    Ok(renderer)
}

/// Convert the instruction file of super step `number` in place; returns
/// its path, or `None` when the step has no instruction file
pub fn render_manual(
    repo: &GitRepo,
    config: &TortillaConfig,
    renderer: &ManualRenderer,
    number: u32,
    format: ManualFormat,
) -> Result<Option<PathBuf>> {
    let path = config.instruction_path(repo.root(), number);
    if !path.is_file() {
        return Ok(None);
    }
    let markdown = fs::read_to_string(&path)?;

    let converted = match format {
        ManualFormat::Development => renderer.to_development_format(&markdown)?,
        ManualFormat::Production => {
            let title = find_step(repo, StepId::super_step(number))
                .map(|c| c.descriptor.subject().to_string())
                .unwrap_or_default();
            renderer.to_production_format(&markdown, &ManualContext { step: number, title })?
        }
    };

    if converted != markdown {
        fs::write(&path, converted)?;
        info!(path = %path.display(), ?format, "Converted manual");
    }
    Ok(Some(path))
}
