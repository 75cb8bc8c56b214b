//! Development ⇄ production manual conversion
//!
//! Development manuals are handlebars source. Production manuals are the
//! rendered output split into `header`, `body` and `footer` regions, with
//! every helper and partial expansion wrapped in block markers so the
//! source can be recovered from the output.

use super::block::{Block, BlockKind, CLOSE_MARKER, ParseDepth, open_marker, parse};
use super::registry::{BlockRegistry, HELPER, PARTIAL};
use crate::config::ManualConfig;
use crate::error::{Error, Result};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Block type of the production regions
pub const REGION: &str = "region";

const HEADER: &str = "header";
const BODY: &str = "body";
const FOOTER: &str = "footer";

/// Values available to manual templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManualContext {
    /// Super step number the manual belongs to
    pub step: u32,
    /// Subject of the super step's commit
    pub title: String,
}

type HelperFn = dyn Fn(&[String]) -> Result<String> + Send + Sync;

/// Renders manuals between their two formats
pub struct ManualRenderer {
    handlebars: Handlebars<'static>,
    registry: BlockRegistry,
    header: String,
    footer: String,
}

impl ManualRenderer {
    /// Renderer with the configured header/footer and no helpers
    pub fn new(config: &ManualConfig) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        Self {
            handlebars,
            registry: BlockRegistry::with_builtins(),
            header: config.header.clone(),
            footer: config.footer.clone(),
        }
    }

    /// Register a helper whose output is wrapped in a `helper` block.
    ///
    /// Parameters reach `f` as strings; non-string JSON values are
    /// serialized.
    pub fn register_helper<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&[String]) -> Result<String> + Send + Sync + 'static,
    {
        let f: Arc<HelperFn> = Arc::new(f);
        let helper_name = name.to_string();
        self.handlebars.register_helper(
            name,
            Box::new(
                move |h: &Helper,
                      _: &Handlebars,
                      _: &Context,
                      _: &mut RenderContext,
                      out: &mut dyn Output|
                      -> HelperResult {
                    let params: Vec<String> = h
                        .params()
                        .iter()
                        .map(|p| match p.value().as_str() {
                            Some(s) => s.to_string(),
                            None => p.value().to_string(),
                        })
                        .collect();
                    let body = f(&params)
                        .map_err(|e| RenderErrorReason::Other(format!("{helper_name}: {e}")))?;
                    let args = std::iter::once(helper_name.as_str())
                        .chain(params.iter().map(String::as_str))
                        .collect::<Vec<_>>()
                        .join(" ");
                    out.write(&wrap(HELPER, &args, &body))?;
                    Ok(())
                },
            ),
        );
    }

    /// Register a partial whose expansion is wrapped in a `partial` block
    pub fn register_partial(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_partial(name, wrap(PARTIAL, name, template.trim_end()))
            .map_err(|e| Error::Template(format!("partial {name}: {e}")))
    }

    /// Register every `<name>.md` in `dir` as partial `name`; a missing
    /// directory registers nothing
    pub fn register_partials_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            self.register_partial(name, &fs::read_to_string(&path)?)?;
            count += 1;
        }
        debug!(count, dir = %dir.display(), "Registered partials");
        Ok(count)
    }

    fn render(&self, template: &str, context: &ManualContext) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| Error::Template(e.to_string()))
    }

    /// Expand a manual into production format. Production input is first
    /// brought back to development format, so the conversion is idempotent.
    pub fn to_production_format(&self, markdown: &str, context: &ManualContext) -> Result<String> {
        let source = self.to_development_format(markdown)?;
        let header = self.render(&self.header, context)?;
        let body = self.render(&source, context)?;
        let footer = self.render(&self.footer, context)?;
        Ok(format!(
            "{}\n{}\n{}\n",
            wrap(REGION, HEADER, &header),
            wrap(REGION, BODY, &body),
            wrap(REGION, FOOTER, &footer)
        ))
    }

    /// Recover development source from a production manual. Input without
    /// a body region is already in development format and comes back as is.
    pub fn to_development_format(&self, markdown: &str) -> Result<String> {
        let blocks = parse(markdown, ParseDepth::None)?;
        let Some(body) = blocks.iter().find(|b| is_body_region(b)) else {
            return Ok(markdown.to_string());
        };
        self.registry.template_str(unwrap_content(&body.content))
    }
}

/// Whether `markdown` is a production manual (it has a body region)
pub fn is_production_format(markdown: &str) -> Result<bool> {
    Ok(parse(markdown, ParseDepth::None)?
        .iter()
        .any(is_body_region))
}

fn is_body_region(block: &Block) -> bool {
    block.kind == BlockKind::Typed && block.is(REGION) && block.name.as_deref() == Some(BODY)
}

/// `content` between markers on their own lines
fn wrap(type_name: &str, args: &str, content: &str) -> String {
    format!("{}\n{content}\n{CLOSE_MARKER}", open_marker(type_name, args))
}

/// Inverse of the line breaks `wrap` adds
fn unwrap_content(content: &str) -> &str {
    let content = content.strip_prefix('\n').unwrap_or(content);
    content.strip_suffix('\n').unwrap_or(content)
}
