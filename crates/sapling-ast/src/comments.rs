//! Source comments attached to nodes.

use std::fmt;

use sapling_core::SourceLocation;

/// Identity of a comment within one parsed file.
///
/// The same comment can be attached to several nodes (for example a
/// statement and the expression it starts with), so consumers that must
/// handle each comment once key on this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommentId(pub u32);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "comment_{}", self.0)
    }
}

/// A line (`// ...`) or block (`/* ... */`) comment, text without delimiters.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub block: bool,
    pub loc: Option<SourceLocation>,
}

impl Comment {
    pub fn line(id: u32, text: impl Into<String>) -> Self {
        Comment {
            id: CommentId(id),
            text: text.into(),
            block: false,
            loc: None,
        }
    }

    pub fn block(id: u32, text: impl Into<String>) -> Self {
        Comment {
            id: CommentId(id),
            text: text.into(),
            block: true,
            loc: None,
        }
    }

    pub fn with_location(mut self, loc: SourceLocation) -> Self {
        self.loc = Some(loc);
        self
    }

    /// The comment's lines with block-comment `*` gutters stripped.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        let block = self.block;
        self.text.lines().map(move |line| {
            let line = line.trim();
            if block {
                line.trim_start_matches('*').trim_start()
            } else {
                line
            }
        })
    }
}
