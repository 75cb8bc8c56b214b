//! Block notation parser
//!
//! Manuals embed generated regions between markers that markdown renders as
//! nothing (link reference definitions):
//!
//! ```text
//! [{]: <TYPE> (NAME PARAM...)
//! ...content...
//! [}]: #
//! ```
//!
//! A close marker may also repeat the open form (`[}]: <TYPE> (NAME)`).
//! Matching counts every open and close marker regardless of type, so
//! blocks of different types nest freely.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[\{\]: <(?P<type>[^>\n]*)> \((?P<args>[^)\n]*)\)|\[\}\]: (?:#|<[^>\n]*> \([^)\n]*\))",
    )
    .expect("valid regex")
});

/// How far `parse` descends into typed blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseDepth {
    /// Top level only; typed blocks get no children
    None,
    /// Descend this many levels below the top
    Finite(u32),
    /// Descend all the way
    Unbounded,
}

impl ParseDepth {
    /// Depth for the children of a top-level block, `None` when they are
    /// not parsed at all
    const fn descend(self) -> Option<Self> {
        match self {
            Self::None | Self::Finite(0) => None,
            Self::Finite(1) => Some(Self::None),
            Self::Finite(n) => Some(Self::Finite(n - 1)),
            Self::Unbounded => Some(Self::Unbounded),
        }
    }
}

/// Whether a block is plain text or delimited by markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Plain run between typed blocks
    Text,
    /// Region between a matched open and close marker
    Typed,
}

/// One parsed unit of a manual
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Text or typed
    pub kind: BlockKind,
    /// `TYPE` from the open marker
    pub type_name: Option<String>,
    /// First word inside the parentheses
    pub name: Option<String>,
    /// Remaining words inside the parentheses
    pub params: Vec<String>,
    /// Everything between the markers (the whole run for text)
    pub content: String,
    /// Typed blocks found inside `content`, whitespace-only runs omitted
    pub children: Blocks,
    /// Byte offset of the block in the parsed input
    pub start: usize,
    open_marker: String,
    close_marker: String,
}

impl Block {
    /// A text block
    pub fn text(content: impl Into<String>, start: usize) -> Self {
        Self {
            kind: BlockKind::Text,
            type_name: None,
            name: None,
            params: Vec::new(),
            content: content.into(),
            children: Blocks::default(),
            start,
            open_marker: String::new(),
            close_marker: String::new(),
        }
    }

    /// A typed block closed by the generic `[}]: #` marker
    pub fn typed(type_name: &str, name: &str, params: &[&str], content: impl Into<String>) -> Self {
        let args = std::iter::once(name)
            .chain(params.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            kind: BlockKind::Typed,
            type_name: Some(type_name.to_string()),
            name: Some(name.to_string()),
            params: params.iter().map(|p| (*p).to_string()).collect(),
            content: content.into(),
            children: Blocks::default(),
            start: 0,
            open_marker: open_marker(type_name, &args),
            close_marker: CLOSE_MARKER.to_string(),
        }
    }

    /// Whether this is a typed block of `type_name`
    pub fn is(&self, type_name: &str) -> bool {
        self.type_name.as_deref() == Some(type_name)
    }

    /// The open marker as it appeared in the input
    pub fn open_marker(&self) -> &str {
        &self.open_marker
    }

    /// The close marker as it appeared in the input
    pub fn close_marker(&self) -> &str {
        &self.close_marker
    }

    /// Byte offset just past the block, derived from its current content
    pub fn end(&self) -> usize {
        self.start + self.open_marker.len() + self.content.len() + self.close_marker.len()
    }

    /// The block's original markdown
    pub fn render(&self) -> String {
        format!("{}{}{}", self.open_marker, self.content, self.close_marker)
    }
}

/// Generic close marker
pub const CLOSE_MARKER: &str = "[}]: #";

/// Open marker for `type_name` with the space-separated `args`
pub fn open_marker(type_name: &str, args: &str) -> String {
    format!("[{{]: <{type_name}> ({args})")
}

/// Ordered sequence of blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocks(Vec<Block>);

impl Blocks {
    /// Append a block
    pub fn push(&mut self, block: Block) {
        self.0.push(block);
    }

    /// Blocks in order
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.0.iter()
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no blocks
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenate `f` over every block
    pub fn map_join<F>(&self, f: F) -> Result<String>
    where
        F: FnMut(&Block) -> Result<String>,
    {
        Ok(self.0.iter().map(f).collect::<Result<Vec<_>>>()?.concat())
    }

    /// Concatenated markdown of every block
    pub fn render(&self) -> String {
        self.0.iter().map(Block::render).collect()
    }
}

impl<'a> IntoIterator for &'a Blocks {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

struct Marker<'a> {
    start: usize,
    end: usize,
    open: Option<(&'a str, &'a str)>,
}

/// Split `input` into text runs and typed blocks.
///
/// Concatenating the rendered top-level blocks reproduces `input` exactly.
/// A close marker with no open counterpart is ordinary text; an open marker
/// that never closes fails the whole parse.
pub fn parse(input: &str, depth: ParseDepth) -> Result<Blocks> {
    parse_at(input, depth, 0)
}

fn parse_at(input: &str, depth: ParseDepth, base: usize) -> Result<Blocks> {
    let markers: Vec<Marker<'_>> = MARKER
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let open = match (caps.name("type"), caps.name("args")) {
                (Some(t), Some(a)) => Some((t.as_str(), a.as_str())),
                _ => None,
            };
            Some(Marker {
                start: whole.start(),
                end: whole.end(),
                open,
            })
        })
        .collect();

    let mut blocks = Blocks::default();
    let mut cursor = 0;
    let mut index = 0;

    while index < markers.len() {
        let marker = &markers[index];
        let Some((type_name, args)) = marker.open else {
            index += 1;
            continue;
        };

        let mut nesting = 1usize;
        let mut close = None;
        for (offset, candidate) in markers[index + 1..].iter().enumerate() {
            if candidate.open.is_some() {
                nesting += 1;
            } else {
                nesting -= 1;
                if nesting == 0 {
                    close = Some(index + 1 + offset);
                    break;
                }
            }
        }
        let Some(close_index) = close else {
            return Err(Error::UnbalancedBlock {
                offset: base + marker.start,
            });
        };
        let close_marker = &markers[close_index];

        if cursor < marker.start {
            blocks.push(Block::text(&input[cursor..marker.start], base + cursor));
        }

        let content = &input[marker.end..close_marker.start];
        let children = match depth.descend() {
            Some(inner) => {
                let mut children = Blocks::default();
                for child in &parse_at(content, inner, base + marker.end)? {
                    if child.kind == BlockKind::Typed || !child.content.trim().is_empty() {
                        children.push(child.clone());
                    }
                }
                children
            }
            None => Blocks::default(),
        };

        let mut words = args.split_whitespace();
        blocks.push(Block {
            kind: BlockKind::Typed,
            type_name: Some(type_name.to_string()),
            name: words.next().map(str::to_string),
            params: words.map(str::to_string).collect(),
            content: content.to_string(),
            children,
            start: base + marker.start,
            open_marker: input[marker.start..marker.end].to_string(),
            close_marker: input[close_marker.start..close_marker.end].to_string(),
        });

        cursor = close_marker.end;
        index = close_index + 1;
    }

    if cursor < input.len() {
        blocks.push(Block::text(&input[cursor..], base + cursor));
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks() {
        let input = "[{]: <a> (x) [{]: <b> (y) content [}]: # [}]: #";
        let blocks = parse(input, ParseDepth::Unbounded).unwrap();

        assert_eq!(blocks.len(), 1);
        let outer = blocks.iter().next().unwrap();
        assert!(outer.is("a"));
        assert_eq!(outer.name.as_deref(), Some("x"));
        assert_eq!(outer.children.len(), 1);

        let inner = outer.children.iter().next().unwrap();
        assert!(inner.is("b"));
        assert_eq!(inner.name.as_deref(), Some("y"));
        assert_eq!(inner.content, " content ");
        assert_eq!(&input[inner.start..inner.end()], inner.render());
    }

    #[test]
    fn test_round_trip_preserves_bytes() {
        let input = "# Title\n\n[{]: <helper> (diffStep 1.1)\n\n```diff\n+a\n```\n[}]: #\n\ntrailing  \n[}]: #\n";
        let blocks = parse(input, ParseDepth::Unbounded).unwrap();
        assert_eq!(blocks.render(), input);
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn test_typed_close_marker() {
        let input = "[{]: <region> (body)\nhi\n[}]: <region> (body)";
        let blocks = parse(input, ParseDepth::None).unwrap();
        assert_eq!(blocks.len(), 1);
        let block = blocks.iter().next().unwrap();
        assert_eq!(block.content, "\nhi\n");
        assert_eq!(block.close_marker(), "[}]: <region> (body)");
        assert_eq!(blocks.render(), input);
    }

    #[test]
    fn test_params_split() {
        let blocks = parse("[{]: <helper> (diffStep 2.1 module)x[}]: #", ParseDepth::None).unwrap();
        let block = blocks.iter().next().unwrap();
        assert_eq!(block.name.as_deref(), Some("diffStep"));
        assert_eq!(block.params, vec!["2.1".to_string(), "module".to_string()]);
    }

    #[test]
    fn test_unbalanced_open_fails() {
        let err = parse("text [{]: <a> (x) [{]: <b> (y) [}]: #", ParseDepth::Unbounded).unwrap_err();
        assert!(matches!(err, Error::UnbalancedBlock { offset: 5 }));
    }

    #[test]
    fn test_depth_none_has_no_children() {
        let input = "[{]: <a> (x) [{]: <b> (y) content [}]: # [}]: #";
        let blocks = parse(input, ParseDepth::None).unwrap();
        assert!(blocks.iter().next().unwrap().children.is_empty());
    }

    #[test]
    fn test_finite_depth_stops() {
        let input = "[{]: <a> (x)[{]: <b> (y)[{]: <c> (z)[}]: #[}]: #[}]: #";
        let blocks = parse(input, ParseDepth::Finite(1)).unwrap();
        let a = blocks.iter().next().unwrap();
        let b = a.children.iter().next().unwrap();
        assert!(b.is("b"));
        assert!(b.children.is_empty());
    }

    #[test]
    fn test_text_only() {
        let blocks = parse("just text", ParseDepth::Unbounded).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks.iter().next().unwrap().kind, BlockKind::Text);
        assert!(parse("", ParseDepth::Unbounded).unwrap().is_empty());
    }

    #[test]
    fn test_typed_constructor_renders_marker() {
        let block = Block::typed("helper", "diffStep", &["1.1"], "\nx\n");
        assert_eq!(block.render(), "[{]: <helper> (diffStep 1.1)\nx\n[}]: #");
        assert_eq!(block.end(), block.render().len());
    }
}
