//! ToC rendering (part of C3): the section tree exposed as a serializable
//! forest, in full and trimmed flavors. Shape modeled on the `TocEntry`
//! family seen across the retrieved pack (heading path, line range,
//! children) and the teacher's own `markdown-doc-ops/src/toc.rs` rendering
//! split between a rich internal representation and a slim external one.

use serde::Serialize;

use crate::parser::Utf16Index;
use crate::structure::{Section, SectionTree};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToCNode {
    pub sid: String,
    pub display_id: String,
    pub title: String,
    pub level: u8,
    pub utf16_start: usize,
    pub utf16_end: usize,
    pub heading_line: usize,
    pub body_end_line: usize,
    pub character_count: usize,
    pub word_count: usize,
    pub contains_code: bool,
    pub contains_tables: bool,
    pub contains_lists: bool,
    pub parent_sid: Option<String>,
    pub children: Vec<ToCNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToCNodeTrimmed {
    pub sid: String,
    pub display_id: String,
    pub title: String,
    pub level: u8,
    pub character_count: usize,
    pub parent_sid: Option<String>,
    pub children: Vec<ToCNodeTrimmed>,
}

fn to_node(tree: &SectionTree, utf16_index: &Utf16Index, idx: usize) -> ToCNode {
    let section: &Section = &tree.sections[idx];
    let utf16_span = utf16_index.span(section.body_byte_span);
    ToCNode {
        sid: section.sid.clone(),
        display_id: section.display_id.clone(),
        title: section.normalized_title.clone(),
        level: section.level,
        utf16_start: utf16_span.start,
        utf16_end: utf16_span.end,
        heading_line: section.heading_line,
        body_end_line: section.body_end_line,
        character_count: section.character_count,
        word_count: section.word_count,
        contains_code: section.contains_code,
        contains_tables: section.contains_tables,
        contains_lists: section.contains_lists,
        parent_sid: section.parent.map(|p| tree.sections[p].sid.clone()),
        children: section
            .children
            .iter()
            .map(|&c| to_node(tree, utf16_index, c))
            .collect(),
    }
}

pub fn build_toc(tree: &SectionTree, utf16_index: &Utf16Index) -> Vec<ToCNode> {
    tree.root_children
        .iter()
        .map(|&idx| to_node(tree, utf16_index, idx))
        .collect()
}

fn trim(node: &ToCNode) -> ToCNodeTrimmed {
    ToCNodeTrimmed {
        sid: node.sid.clone(),
        display_id: node.display_id.clone(),
        title: node.title.clone(),
        level: node.level,
        character_count: node.character_count,
        parent_sid: node.parent_sid.clone(),
        children: node.children.iter().map(trim).collect(),
    }
}

pub fn trim_toc(full: &[ToCNode]) -> Vec<ToCNodeTrimmed> {
    full.iter().map(trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    #[test]
    fn builds_nested_toc() {
        let parsed = parse_document(b"# Intro\n\nhello\n\n## Details\n\nworld\n");
        let tree = SectionTree::build(&parsed);
        let toc = build_toc(&tree, &parsed.utf16_index);
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].sid, "/intro");
        assert_eq!(toc[0].children.len(), 1);
        assert_eq!(toc[0].children[0].sid, "/intro/details");

        let trimmed = trim_toc(&toc);
        assert_eq!(trimmed[0].sid, toc[0].sid);
        assert_eq!(trimmed[0].children[0].sid, toc[0].children[0].sid);
    }
}
