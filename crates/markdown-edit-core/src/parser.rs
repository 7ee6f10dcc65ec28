//! C2 MarkdownParser: turns document bytes into a normalized text buffer, a
//! full AST, and the line/UTF-16 index tables the rest of the engine needs
//! to translate offsets at its boundaries.
//!
//! The AST build is a direct generalization of the Start/End-event folding
//! pulldown-cmark encourages: `into_offset_iter()` hands back `(Event,
//! Range<usize>)` pairs where a Start and its matching End carry the same
//! full-span byte range, so a stack of "children accumulated so far" per
//! open tag is enough to reconstruct the tree in one linear pass.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag};

use crate::ast::{AstNode, AstNodeKind, ByteSpan, Utf16Span};

pub struct ParsedDocument {
    /// Normalized text (CRLF collapsed to LF) that all offsets are relative to.
    pub text: String,
    pub root: AstNode,
    pub line_index: LineIndex,
    pub utf16_index: Utf16Index,
    pub warnings: Vec<String>,
}

/// Byte-offset line-start table, built once per parse.
pub struct LineIndex {
    line_starts: Vec<usize>,
    doc_len: usize,
}

impl LineIndex {
    pub fn build(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            line_starts,
            doc_len: text.len(),
        }
    }

    /// 1-based line number containing `byte_offset`.
    pub fn line_for_byte_offset(&self, byte_offset: usize) -> usize {
        match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    /// Byte offset of the start of `line` (1-based). Returns `doc_len` if
    /// `line` is past the end of the document.
    pub fn line_start_byte(&self, line: usize) -> usize {
        if line == 0 {
            return 0;
        }
        self.line_starts
            .get(line - 1)
            .copied()
            .unwrap_or(self.doc_len)
    }

    pub fn total_lines(&self) -> usize {
        self.line_starts.len()
    }

    pub fn doc_len(&self) -> usize {
        self.doc_len
    }
}

/// Sorted `(byte_offset, utf16_offset)` checkpoints at char boundaries,
/// supporting O(log n) byte -> UTF-16 translation.
pub struct Utf16Index {
    checkpoints: Vec<(usize, usize)>,
}

impl Utf16Index {
    pub fn build(text: &str) -> Self {
        let mut checkpoints = Vec::with_capacity(text.len() / 2 + 1);
        let mut utf16_offset = 0usize;
        checkpoints.push((0, 0));
        for (byte_offset, ch) in text.char_indices() {
            if byte_offset != 0 {
                checkpoints.push((byte_offset, utf16_offset));
            }
            utf16_offset += ch.len_utf16();
        }
        checkpoints.push((text.len(), utf16_offset));
        Self { checkpoints }
    }

    pub fn byte_to_utf16(&self, byte_offset: usize) -> usize {
        match self
            .checkpoints
            .binary_search_by_key(&byte_offset, |(b, _)| *b)
        {
            Ok(idx) => self.checkpoints[idx].1,
            Err(idx) => {
                // byte_offset falls strictly between two checkpoints; since
                // checkpoints are recorded at every char boundary this only
                // happens at the tail sentinel, so fall back to it.
                self.checkpoints[idx.min(self.checkpoints.len() - 1)].1
            }
        }
    }

    pub fn span(&self, span: ByteSpan) -> Utf16Span {
        Utf16Span {
            start: self.byte_to_utf16(span.start),
            end: self.byte_to_utf16(span.end),
        }
    }
}

fn default_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// Decode `bytes` as UTF-8, replacing invalid sequences with U+FFFD. Returns
/// the decoded text plus whether any replacement actually happened.
fn decode_lossy(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), false),
        Err(_) => (String::from_utf8_lossy(bytes).into_owned(), true),
    }
}

fn normalize_line_endings(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

/// Detects a `---`/`...`-delimited frontmatter block at the start of the
/// document. Returns the byte offset one past the block (including its
/// closing delimiter line), or 0 if there is no frontmatter.
fn detect_frontmatter_end(text: &str) -> usize {
    let mut lines = text.split_inclusive('\n');
    let first = match lines.next() {
        Some(l) => l,
        None => return 0,
    };
    if first.trim_end_matches('\n').trim_end_matches('\r') != "---" {
        return 0;
    }
    let mut offset = first.len();
    for line in lines {
        let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');
        offset += line.len();
        if trimmed == "---" || trimmed == "..." {
            return offset;
        }
    }
    // unterminated frontmatter marker: treat as ordinary content.
    0
}

pub fn parse_document(bytes: &[u8]) -> ParsedDocument {
    let mut warnings = Vec::new();
    let (decoded, had_lossy) = decode_lossy(bytes);
    if had_lossy {
        warnings.push(
            "PARSE_WARNING: document was not valid UTF-8; invalid sequences replaced with U+FFFD"
                .to_string(),
        );
    }
    let text = normalize_line_endings(&decoded);

    let frontmatter_end = detect_frontmatter_end(&text);
    let utf16_index = Utf16Index::build(&text);

    let body = &text[frontmatter_end..];
    let options = default_options();
    let cmark_parser = CmarkParser::new_ext(body, options);
    let events: Vec<(Event, Range<usize>)> = cmark_parser
        .into_offset_iter()
        .map(|(event, range)| {
            (
                event,
                (range.start + frontmatter_end)..(range.end + frontmatter_end),
            )
        })
        .collect();

    let root = build_ast(&text, events, frontmatter_end, &utf16_index);
    let line_index = LineIndex::build(&text);

    ParsedDocument {
        text,
        root,
        line_index,
        utf16_index,
        warnings,
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn tag_to_kind(tag: &Tag) -> AstNodeKind {
    match tag {
        Tag::Paragraph => AstNodeKind::Paragraph,
        Tag::Heading(level, _, _) => AstNodeKind::Heading {
            level: heading_level_to_u8(*level),
        },
        Tag::BlockQuote => AstNodeKind::Blockquote,
        Tag::CodeBlock(kind) => AstNodeKind::CodeBlock {
            fenced: matches!(kind, CodeBlockKind::Fenced(_)),
        },
        Tag::List(start) => AstNodeKind::List {
            ordered: start.is_some(),
        },
        Tag::Item => AstNodeKind::ListItem,
        Tag::Table(_) => AstNodeKind::Table,
        Tag::Emphasis => AstNodeKind::Emphasis,
        Tag::Strong => AstNodeKind::Strong,
        Tag::Link(..) => AstNodeKind::Link,
        Tag::Image(..) => AstNodeKind::Image,
        Tag::Strikethrough
        | Tag::FootnoteDefinition(_)
        | Tag::TableHead
        | Tag::TableRow
        | Tag::TableCell => AstNodeKind::Other,
    }
}

fn leaf_event_to_node(event: Event, range: Range<usize>, utf16_index: &Utf16Index) -> AstNode {
    let byte_span = ByteSpan::new(range.start, range.end);
    let utf16_span = utf16_index.span(byte_span);
    let (kind, text) = match event {
        Event::Text(s) => (AstNodeKind::Text, Some(s.into_string())),
        Event::Code(s) => (AstNodeKind::InlineCode, Some(s.into_string())),
        Event::Html(s) => (AstNodeKind::Html, Some(s.into_string())),
        Event::FootnoteReference(_)
        | Event::SoftBreak
        | Event::HardBreak
        | Event::TaskListMarker(_) => (AstNodeKind::Other, None),
        Event::Rule => (AstNodeKind::ThematicBreak, None),
        Event::Start(_) | Event::End(_) => unreachable!("leaf_event_to_node called on a container event"),
    };
    AstNode {
        kind,
        byte_span,
        utf16_span,
        text,
        children: Vec::new(),
    }
}

fn build_ast(
    text: &str,
    events: Vec<(Event, Range<usize>)>,
    frontmatter_end: usize,
    utf16_index: &Utf16Index,
) -> AstNode {
    let mut stack: Vec<(AstNodeKind, ByteSpan, Vec<AstNode>)> = Vec::new();
    let mut curr_children: Vec<AstNode> = Vec::new();

    if frontmatter_end > 0 {
        let span = ByteSpan::new(0, frontmatter_end);
        curr_children.push(AstNode {
            kind: AstNodeKind::Frontmatter,
            byte_span: span,
            utf16_span: utf16_index.span(span),
            text: None,
            children: Vec::new(),
        });
    }

    for (event, range) in events {
        match event {
            Event::Start(tag) => {
                let kind = tag_to_kind(&tag);
                let span = ByteSpan::new(range.start, range.end);
                stack.push((kind, span, curr_children));
                curr_children = Vec::new();
            }
            Event::End(_tag) => {
                let (kind, byte_span, siblings) =
                    stack.pop().expect("unbalanced markdown container tags");
                let node = AstNode {
                    kind,
                    byte_span,
                    utf16_span: utf16_index.span(byte_span),
                    text: None,
                    children: curr_children,
                };
                curr_children = siblings;
                curr_children.push(node);
            }
            leaf => {
                curr_children.push(leaf_event_to_node(leaf, range, utf16_index));
            }
        }
    }

    let doc_span = ByteSpan::new(0, text.len());
    AstNode {
        kind: AstNodeKind::Document,
        byte_span: doc_span,
        utf16_span: utf16_index.span(doc_span),
        text: None,
        children: curr_children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNodeKind;

    #[test]
    fn parses_headings_in_document_order() {
        let doc = parse_document(b"# Intro\n\nhello\n\n## Details\n\nworld\n");
        let mut levels = Vec::new();
        doc.root.walk_preorder(&mut |node| {
            if let AstNodeKind::Heading { level } = node.kind {
                levels.push(level);
            }
        });
        assert_eq!(levels, vec![1, 2]);
    }

    #[test]
    fn detects_frontmatter_block() {
        let doc = parse_document(b"---\ntitle: x\n---\n\n# Intro\n");
        assert!(matches!(
            doc.root.children.first().map(|n| &n.kind),
            Some(AstNodeKind::Frontmatter)
        ));
    }

    #[test]
    fn replaces_invalid_utf8_and_warns() {
        let bytes = [b'#', b' ', 0xff, 0xfe, b'\n'];
        let doc = parse_document(&bytes);
        assert!(doc.text.contains('\u{FFFD}'));
        assert!(doc.warnings.iter().any(|w| w.starts_with("PARSE_WARNING")));
    }

    #[test]
    fn line_index_tracks_line_starts() {
        let idx = LineIndex::build("a\nbb\nccc");
        assert_eq!(idx.line_for_byte_offset(0), 1);
        assert_eq!(idx.line_for_byte_offset(2), 2);
        assert_eq!(idx.line_for_byte_offset(5), 3);
        assert_eq!(idx.line_start_byte(3), 5);
    }

    #[test]
    fn utf16_index_accounts_for_surrogate_pairs() {
        let text = "a\u{1F600}b";
        let idx = Utf16Index::build(text);
        // emoji is 4 bytes in utf-8, 2 code units in utf-16
        assert_eq!(idx.byte_to_utf16(1), 1);
        assert_eq!(idx.byte_to_utf16(5), 3);
    }
}
