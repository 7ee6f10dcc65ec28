//! C3 StructureAnalyzer: heading scan -> section tree -> SID/displayId
//! assignment. The stack-based section builder is the same shape as the
//! teacher's own `build_document_headings` (pop every open section whose
//! level is >= the incoming heading's level, then push), generalized from a
//! flat depth counter to a full parent/children tree carrying byte spans.

use std::collections::HashMap;

use crate::ast::{AstNode, AstNodeKind, ByteSpan};
use crate::parser::{LineIndex, ParsedDocument};
use crate::slug::{collision_suffix, slugify};

/// SID denoting the document's preamble (the span before the first heading,
/// or the whole document when there is no heading at all). Never appears in
/// `SectionTree::sections`; resolved lazily by `SectionTree::resolve`.
pub const ROOT_SID: &str = "/";

#[derive(Debug, Clone)]
pub struct Section {
    pub sid: String,
    pub display_id: String,
    pub level: u8,
    pub title: String,
    pub normalized_title: String,
    pub heading_byte_span: ByteSpan,
    pub body_byte_span: ByteSpan,
    pub heading_line: usize,
    pub body_end_line: usize,
    pub contains_code: bool,
    pub contains_tables: bool,
    pub contains_lists: bool,
    pub character_count: usize,
    pub word_count: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// A unified view over either a real `Section` or the synthetic root,
/// letting the planner resolve `"/"` the same way it resolves any other SID.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    pub sid: &'a str,
    pub level: u8,
    pub heading_byte_span: ByteSpan,
    pub body_byte_span: ByteSpan,
    pub heading_line: usize,
    pub body_end_line: usize,
}

pub struct SectionTree {
    pub sections: Vec<Section>,
    pub root_children: Vec<usize>,
    by_sid: HashMap<String, usize>,
    doc_len: usize,
    first_heading_start: usize,
}

struct RawHeading {
    level: u8,
    title: String,
    heading_start: usize,
    heading_end: usize,
}

fn collect_headings(root: &AstNode) -> Vec<RawHeading> {
    let mut headings = Vec::new();
    root.walk_preorder(&mut |node| {
        if let AstNodeKind::Heading { level } = node.kind {
            headings.push(RawHeading {
                level,
                title: node.plain_text(),
                heading_start: node.byte_span.start,
                heading_end: node.byte_span.end,
            });
        }
    });
    headings
}

fn normalize_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim().to_string()
}

fn line_aligned_span(line_index: &LineIndex, byte_start: usize, byte_end_hint: usize) -> ByteSpan {
    let start_line = line_index.line_for_byte_offset(byte_start);
    let end_line = if byte_end_hint > byte_start {
        line_index.line_for_byte_offset(byte_end_hint.saturating_sub(1))
    } else {
        start_line
    };
    let aligned_start = line_index.line_start_byte(start_line);
    let aligned_end = line_index.line_start_byte(end_line + 1);
    ByteSpan::new(aligned_start, aligned_end)
}

impl SectionTree {
    pub fn build(parsed: &ParsedDocument) -> Self {
        let headings = collect_headings(&parsed.root);
        let doc_len = parsed.text.len();

        let mut sections: Vec<Section> = Vec::with_capacity(headings.len());
        let mut root_children: Vec<usize> = Vec::new();
        // open section stack, most-recently-opened last
        let mut stack: Vec<usize> = Vec::new();

        let first_heading_start = headings.first().map(|h| h.heading_start).unwrap_or(doc_len);

        for heading in &headings {
            let heading_span =
                line_aligned_span(&parsed.line_index, heading.heading_start, heading.heading_end);
            while let Some(&top) = stack.last() {
                if sections[top].level >= heading.level {
                    sections[top].body_byte_span.end = heading_span.start;
                    sections[top].body_end_line = parsed
                        .line_index
                        .line_for_byte_offset(heading_span.start.saturating_sub(1));
                    stack.pop();
                } else {
                    break;
                }
            }

            let parent = stack.last().copied();
            let idx = sections.len();
            let normalized = normalize_title(&heading.title);
            sections.push(Section {
                sid: String::new(),
                display_id: String::new(),
                level: heading.level,
                title: heading.title.clone(),
                normalized_title: normalized,
                heading_byte_span: heading_span,
                body_byte_span: ByteSpan::new(heading_span.end, heading_span.end),
                heading_line: parsed.line_index.line_for_byte_offset(heading_span.start),
                body_end_line: parsed.line_index.line_for_byte_offset(heading_span.end),
                contains_code: false,
                contains_tables: false,
                contains_lists: false,
                character_count: 0,
                word_count: 0,
                parent,
                children: Vec::new(),
            });

            match parent {
                Some(p) => sections[p].children.push(idx),
                None => root_children.push(idx),
            }
            stack.push(idx);
        }

        // close remaining open sections at document end
        while let Some(top) = stack.pop() {
            sections[top].body_byte_span.end = doc_len;
            sections[top].body_end_line = parsed.line_index.total_lines();
        }

        let mut tree = SectionTree {
            sections,
            root_children,
            by_sid: HashMap::new(),
            doc_len,
            first_heading_start,
        };
        tree.fill_content_stats(parsed);
        tree.assign_sids();
        tree.assign_display_ids();
        tree.index_by_sid();
        tree
    }

    fn fill_content_stats(&mut self, parsed: &ParsedDocument) {
        // Map each body span onto the subtree of AST nodes that fall inside
        // it by walking the AST once and bucketing by byte offset.
        let mut per_section_nodes: Vec<Vec<&AstNode>> = vec![Vec::new(); self.sections.len()];
        for top in &parsed.root.children {
            self.bucket_node(top, &mut per_section_nodes);
        }
        for (idx, nodes) in per_section_nodes.into_iter().enumerate() {
            let mut contains_code = false;
            let mut contains_tables = false;
            let mut contains_lists = false;
            let mut word_count = 0;
            for node in &nodes {
                contains_code |= node.contains(|k| matches!(k, AstNodeKind::CodeBlock { .. }));
                contains_tables |= node.contains(|k| matches!(k, AstNodeKind::Table));
                contains_lists |= node.contains(|k| matches!(k, AstNodeKind::List { .. }));
                word_count += node.word_count();
            }
            let section = &mut self.sections[idx];
            section.contains_code = contains_code;
            section.contains_tables = contains_tables;
            section.contains_lists = contains_lists;
            section.word_count = word_count;
            section.character_count = parsed.utf16_index.span(section.body_byte_span).end
                - parsed.utf16_index.span(section.body_byte_span).start;
        }
    }

    /// Assigns each top-level AST node (skipping headings themselves, which
    /// aren't "body" content) to the innermost section whose body span
    /// contains it.
    fn bucket_node<'a>(&self, node: &'a AstNode, buckets: &mut Vec<Vec<&'a AstNode>>) {
        if matches!(node.kind, AstNodeKind::Heading { .. } | AstNodeKind::Frontmatter) {
            return;
        }
        if let Some(idx) = self.sections.iter().position(|s| {
            node.byte_span.start >= s.body_byte_span.start && node.byte_span.end <= s.body_byte_span.end
        }) {
            // pick the deepest (most specific) matching section
            let deepest = self
                .sections
                .iter()
                .enumerate()
                .filter(|(_, s)| {
                    node.byte_span.start >= s.body_byte_span.start
                        && node.byte_span.end <= s.body_byte_span.end
                })
                .max_by_key(|(_, s)| s.body_byte_span.start)
                .map(|(i, _)| i)
                .unwrap_or(idx);
            buckets[deepest].push(node);
        }
    }

    fn assign_sids(&mut self) {
        let mut child_slug_count: HashMap<(String, String), usize> = HashMap::new();
        for idx in 0..self.sections.len() {
            let parent_sid = match self.sections[idx].parent {
                Some(p) => self.sections[p].sid.clone(),
                None => ROOT_SID.to_string(),
            };
            let raw_slug = slugify(&self.sections[idx].normalized_title);
            let key = (parent_sid.clone(), raw_slug.clone());
            let occurrence = *child_slug_count.get(&key).unwrap_or(&0);
            let sid = if occurrence == 0 {
                join_sid(&parent_sid, &raw_slug)
            } else {
                let suffix = collision_suffix(&parent_sid, &raw_slug, occurrence);
                join_sid(&parent_sid, &format!("{raw_slug}-{suffix}"))
            };
            child_slug_count.insert(key, occurrence + 1);
            self.sections[idx].sid = sid;
        }
    }

    fn assign_display_ids(&mut self) {
        fn walk(tree: &mut SectionTree, indices: &[usize], prefix: &str) {
            for (i, &idx) in indices.iter().enumerate() {
                let display_id = if prefix.is_empty() {
                    format!("{}", i + 1)
                } else {
                    format!("{prefix}.{}", i + 1)
                };
                tree.sections[idx].display_id = display_id.clone();
                let children = tree.sections[idx].children.clone();
                walk(tree, &children, &display_id);
            }
        }
        let roots = self.root_children.clone();
        walk(self, &roots, "");
    }

    fn index_by_sid(&mut self) {
        for (idx, section) in self.sections.iter().enumerate() {
            self.by_sid.insert(section.sid.clone(), idx);
        }
    }

    pub fn section_by_sid(&self, sid: &str) -> Option<&Section> {
        self.by_sid.get(sid).map(|&idx| &self.sections[idx])
    }

    pub fn index_of(&self, sid: &str) -> Option<usize> {
        self.by_sid.get(sid).copied()
    }

    /// Resolves any SID, including the synthetic root `"/"`, to a view the
    /// planner can use uniformly.
    pub fn resolve<'a>(&'a self, sid: &str) -> Option<SectionView<'a>> {
        if sid == ROOT_SID {
            return Some(SectionView {
                sid: ROOT_SID,
                level: 0,
                heading_byte_span: ByteSpan::new(0, 0),
                body_byte_span: ByteSpan::new(0, self.first_heading_start),
                heading_line: 1,
                body_end_line: 1,
            });
        }
        self.section_by_sid(sid).map(|s| SectionView {
            sid: &s.sid,
            level: s.level,
            heading_byte_span: s.heading_byte_span,
            body_byte_span: s.body_byte_span,
            heading_line: s.heading_line,
            body_end_line: s.body_end_line,
        })
    }

    pub fn all_sids(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.sid.as_str()).collect()
    }

    pub fn first_heading_start(&self) -> usize {
        self.first_heading_start
    }
}

fn join_sid(parent_sid: &str, slug: &str) -> String {
    format!("{}/{}", parent_sid.trim_end_matches('/'), slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn build(markdown: &str) -> SectionTree {
        let parsed = parse_document(markdown.as_bytes());
        SectionTree::build(&parsed)
    }

    #[test]
    fn assigns_nested_sids() {
        let tree = build("# Intro\n\nhello\n\n## Details\n\nworld\n");
        assert_eq!(tree.sections[0].sid, "/intro");
        assert_eq!(tree.sections[1].sid, "/intro/details");
        assert_eq!(tree.sections[1].parent, Some(0));
    }

    #[test]
    fn suffixes_only_colliding_siblings() {
        let tree = build("# Intro\n\n## Details\n\nfirst\n\n## Details\n\nsecond\n");
        assert_eq!(tree.sections[1].sid, "/intro/details");
        assert!(tree.sections[2].sid.starts_with("/intro/details-"));
        assert_eq!(tree.sections[2].sid.len(), "/intro/details-".len() + 6);
    }

    #[test]
    fn assigns_hierarchical_display_ids() {
        let tree = build("# A\n\n## B\n\n## C\n\n# D\n");
        assert_eq!(tree.sections[0].display_id, "1");
        assert_eq!(tree.sections[1].display_id, "1.1");
        assert_eq!(tree.sections[2].display_id, "1.2");
        assert_eq!(tree.sections[3].display_id, "2");
    }

    #[test]
    fn root_resolves_to_whole_document_when_no_headings() {
        let tree = build("just a paragraph, no headings\n");
        assert!(tree.sections.is_empty());
        let view = tree.resolve(ROOT_SID).unwrap();
        assert_eq!(view.body_byte_span.start, 0);
        assert_eq!(view.body_byte_span.end, tree.doc_len);
    }

    #[test]
    fn root_resolves_to_preamble_only_when_headings_are_present() {
        let text = "preamble text\n\n# A\n\nbody\n";
        let tree = build(text);
        let view = tree.resolve(ROOT_SID).unwrap();
        assert_eq!(view.body_byte_span.start, 0);
        assert_eq!(view.body_byte_span.end, tree.first_heading_start());
        assert!(view.body_byte_span.end < text.len());
        assert_eq!(&text[view.body_byte_span.start..view.body_byte_span.end], "preamble text\n\n");
    }
}
