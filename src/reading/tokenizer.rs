// Tokenizer: marked-up text -> indexed word tokens.
//
// Markup and whitespace pass through untouched as segments; only text between
// tags is split into words. Output depends on nothing but the input and the
// emphasis flag.

use crate::engine::error::{FlowError, FlowResult};
use crate::reading::bionic::emphasis_ranges;
use crate::reading::token::{Document, Segment, WordToken};
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// Tags that end a visual line or block; the word before them is a boundary.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p",
    "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Elements whose body is not prose and is kept verbatim with the tag.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// How the source text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    /// Tags and comments are markup; only text between them is read.
    #[default]
    Html,
    /// Every character is text.
    Plain,
}

impl ContentKind {
    /// HTML when the file extension says so or the text opens with a tag.
    pub fn detect(path: &Path, content: &str) -> Self {
        let html_ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "html" | "htm" | "xhtml"));
        if html_ext || content.trim_start().starts_with('<') {
            ContentKind::Html
        } else {
            ContentKind::Plain
        }
    }
}

/// Tokenizes marked-up `content`, optionally computing bionic emphasis.
///
/// Returns [`FlowError::EmptyContent`] when no word survives, so callers can
/// report zero words instead of starting playback on nothing.
pub fn tokenize(content: &str, emphasize: bool) -> FlowResult<Document> {
    tokenize_as(content, ContentKind::Html, emphasize)
}

pub fn tokenize_as(content: &str, kind: ContentKind, emphasize: bool) -> FlowResult<Document> {
    let mut builder = DocumentBuilder::new(kind, emphasize);
    if kind == ContentKind::Plain {
        builder.text(content);
        return builder.finish();
    }

    let mut pos = 0;
    while pos < content.len() {
        let tail = &content[pos..];
        if let Some(len) = markup_len(tail) {
            builder.markup(&tail[..len]);
            pos += len;
            continue;
        }

        // Text runs to the next '<'; a '<' that does not open markup is text.
        let len = tail
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '<')
            .map_or(tail.len(), |(i, _)| i);
        builder.text(&tail[..len]);
        pos += len;
    }

    builder.finish()
}

struct DocumentBuilder {
    segments: Vec<Segment>,
    tokens: Vec<WordToken>,
    emphasize: bool,
    kind: ContentKind,
    /// Open `<pre>` elements; HTML whitespace only breaks lines inside one.
    pre_depth: usize,
}

impl DocumentBuilder {
    fn new(kind: ContentKind, emphasize: bool) -> Self {
        Self {
            segments: Vec::new(),
            tokens: Vec::new(),
            emphasize,
            kind,
            pre_depth: 0,
        }
    }

    fn markup(&mut self, markup: &str) {
        if is_block_markup(markup) {
            self.mark_boundary();
        }
        if tag_name(markup).as_deref() == Some("pre") {
            if markup.starts_with("</") {
                self.pre_depth = self.pre_depth.saturating_sub(1);
            } else if !markup.ends_with("/>") {
                self.pre_depth += 1;
            }
        }
        self.segments.push(Segment::Markup(markup.to_string()));
    }

    fn newlines_break(&self) -> bool {
        self.kind == ContentKind::Plain || self.pre_depth > 0
    }

    fn text(&mut self, text: &str) {
        let mut start = 0;
        let mut in_space: Option<bool> = None;

        for (i, c) in text.char_indices() {
            let space = c.is_whitespace();
            match in_space {
                Some(prev) if prev != space => {
                    self.run(&text[start..i], prev);
                    start = i;
                }
                _ => {}
            }
            in_space = Some(space);
        }
        if let Some(space) = in_space {
            self.run(&text[start..], space);
        }
    }

    fn run(&mut self, run: &str, is_space: bool) {
        if is_space {
            if run.contains('\n') && self.newlines_break() {
                self.mark_boundary();
                self.segments.push(Segment::LineBreak(run.to_string()));
            } else {
                self.segments.push(Segment::Whitespace(run.to_string()));
            }
            return;
        }

        for part in split_hyphenated(run) {
            let index = self.tokens.len();
            let mut token = WordToken::new(index, part);
            if self.emphasize {
                token.emphasis = emphasis_ranges(part);
            }
            self.segments.push(Segment::Word(index));
            self.tokens.push(token);
        }
    }

    fn mark_boundary(&mut self) {
        if let Some(last) = self.tokens.last_mut() {
            last.is_break_boundary = true;
        }
    }

    fn finish(mut self) -> FlowResult<Document> {
        if self.tokens.is_empty() {
            return Err(FlowError::EmptyContent(
                "no words outside markup".to_string(),
            ));
        }
        self.mark_boundary();

        debug!(
            words = self.tokens.len(),
            segments = self.segments.len(),
            emphasized = self.emphasize,
            "Tokenized content"
        );
        Ok(Document::from_parts(
            self.segments,
            self.tokens,
            self.emphasize,
        ))
    }
}

/// True for tags of elements that start or end a visual line.
pub fn is_block_markup(markup: &str) -> bool {
    tag_name(markup).is_some_and(|name| BLOCK_TAGS.contains(&name.as_str()))
}

/// Splits a non-whitespace run at hyphens, keeping each hyphen on the part
/// before it. Hyphen-only pieces attach to a neighbour so no token is empty
/// or a bare hyphen unless the whole run is.
fn split_hyphenated(run: &str) -> Vec<&str> {
    let mut parts: Vec<Range<usize>> = Vec::new();
    let mut start = 0;

    for piece in run.split_inclusive('-') {
        let end = start + piece.len();
        if piece.chars().all(|c| c == '-') {
            if let Some(prev) = parts.last_mut() {
                prev.end = end;
            }
        } else {
            // Leading hyphens stay with the first real part.
            let part_start = if parts.is_empty() { 0 } else { start };
            parts.push(part_start..end);
        }
        start = end;
    }

    if parts.is_empty() {
        return vec![run];
    }
    parts.into_iter().map(|range| &run[range]).collect()
}

/// Byte length of the tag or comment at the start of `s`, if any.
fn markup_len(s: &str) -> Option<usize> {
    if s.starts_with("<!--") {
        return s.find("-->").map(|end| end + 3);
    }

    let mut chars = s.chars();
    if chars.next() != Some('<') {
        return None;
    }
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?' => {}
        _ => return None,
    }

    let tag_end = s.find('>')? + 1;
    let tag = &s[..tag_end];

    if let Some(name) = tag_name(tag) {
        if RAW_TEXT_TAGS.contains(&name.as_str()) && !tag.starts_with("</") {
            // An unclosed raw-text element swallows the rest of the input.
            let closing = format!("</{}", name);
            let end = s[tag_end..]
                .to_ascii_lowercase()
                .find(&closing)
                .map(|i| tag_end + i)
                .and_then(|body_end| s[body_end..].find('>').map(|i| body_end + i + 1))
                .unwrap_or(s.len());
            return Some(end);
        }
    }

    Some(tag_end)
}

/// Lower-cased element name of a tag like `<p class="x">` or `</P>`.
fn tag_name(markup: &str) -> Option<String> {
    let inner = markup.strip_prefix('<')?;
    let inner = inner.strip_prefix('/').unwrap_or(inner);
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}
