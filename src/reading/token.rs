use std::ops::Range;

/// One indexed word produced by a tokenization pass.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct WordToken {
    /// Position in the document's word sequence, 0-based.
    pub index: usize,
    pub text: String,
    /// Last word before a line break, block boundary or end of content.
    pub is_break_boundary: bool,
    /// Byte ranges of `text` rendered with bionic emphasis.
    pub emphasis: Vec<Range<usize>>,
}

impl WordToken {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            is_break_boundary: false,
            emphasis: Vec::new(),
        }
    }

    pub fn is_emphasized(&self) -> bool {
        !self.emphasis.is_empty()
    }

    /// Splits the text into `(fragment, emphasized)` pieces in order.
    pub fn pieces(&self) -> Vec<(&str, bool)> {
        let mut pieces = Vec::with_capacity(self.emphasis.len() * 2 + 1);
        let mut cursor = 0;
        for range in &self.emphasis {
            if range.start > cursor {
                pieces.push((&self.text[cursor..range.start], false));
            }
            pieces.push((&self.text[range.clone()], true));
            cursor = range.end;
        }
        if cursor < self.text.len() {
            pieces.push((&self.text[cursor..], false));
        }
        pieces
    }
}

/// A slice of the source content, kept in source order.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Segment {
    /// Tags, comments and raw-text elements, reproduced verbatim.
    Markup(String),
    Whitespace(String),
    /// Whitespace whose newlines end a visual line: plain text, or inside
    /// `<pre>`.
    LineBreak(String),
    /// Index into [`Document::tokens`].
    Word(usize),
}

/// Result of one tokenization pass. Replaced wholesale on reload.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Document {
    segments: Vec<Segment>,
    tokens: Vec<WordToken>,
    emphasized: bool,
}

impl Document {
    pub(crate) fn from_parts(
        segments: Vec<Segment>,
        tokens: Vec<WordToken>,
        emphasized: bool,
    ) -> Self {
        Self {
            segments,
            tokens,
            emphasized,
        }
    }

    pub fn tokens(&self) -> &[WordToken] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&WordToken> {
        self.tokens.get(index)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn total_words(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_emphasized(&self) -> bool {
        self.emphasized
    }

    /// Text with markup dropped; whitespace kept as written.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Markup(_) => {}
                Segment::Whitespace(ws) | Segment::LineBreak(ws) => out.push_str(ws),
                Segment::Word(i) => out.push_str(&self.tokens[*i].text),
            }
        }
        out
    }

    /// Re-emits the content with words wrapped for an HTML surface.
    ///
    /// With `flow` each word becomes a `flow-word` span carrying its index;
    /// emphasized fragments are wrapped in `<b class="bionic">` either way.
    pub fn to_html(&self, flow: bool) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Markup(markup) => out.push_str(markup),
                Segment::Whitespace(ws) | Segment::LineBreak(ws) => out.push_str(ws),
                Segment::Word(i) => {
                    let token = &self.tokens[*i];
                    if flow {
                        out.push_str(&format!(
                            "<span class=\"flow-word\" data-word-index=\"{}\">",
                            token.index
                        ));
                    }
                    for (piece, emphasized) in token.pieces() {
                        if emphasized {
                            out.push_str("<b class=\"bionic\">");
                            out.push_str(piece);
                            out.push_str("</b>");
                        } else {
                            out.push_str(piece);
                        }
                    }
                    if flow {
                        out.push_str("</span>");
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pieces_without_emphasis() {
        let token = WordToken::new(0, "hello");
        assert_eq!(token.pieces(), vec![("hello", false)]);
        assert!(!token.is_emphasized());
    }

    #[test]
    fn test_pieces_split_emphasis() {
        let mut token = WordToken::new(0, "about,");
        token.emphasis = vec![0..3];
        assert_eq!(token.pieces(), vec![("abo", true), ("ut,", false)]);
    }

    #[test]
    fn test_pieces_multiple_runs() {
        let mut token = WordToken::new(0, "don't");
        token.emphasis = vec![0..2];
        assert_eq!(token.pieces(), vec![("do", true), ("n't", false)]);
    }

    #[test]
    fn test_to_html_wraps_words() {
        let mut word = WordToken::new(0, "about");
        word.emphasis = vec![0..3];
        let doc = Document::from_parts(
            vec![
                Segment::Markup("<p>".to_string()),
                Segment::Word(0),
                Segment::Markup("</p>".to_string()),
            ],
            vec![word],
            true,
        );

        assert_eq!(
            doc.to_html(true),
            "<p><span class=\"flow-word\" data-word-index=\"0\"><b class=\"bionic\">abo</b>ut</span></p>"
        );
        assert_eq!(doc.to_html(false), "<p><b class=\"bionic\">abo</b>ut</p>");
        assert_eq!(doc.plain_text(), "about");
    }
}
