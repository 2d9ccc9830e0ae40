//! 把纯文本报告切分为章节
//!
//! 按行分类后由一个小状态机累积列表与段落，第一个编号标题之前的行全部忽略。

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<index>\d+)\.\s+(?P<title>.+)$").unwrap());

/// 章节内的内容块
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    List { items: Vec<String> },
    Paragraph { text: String },
}

/// 编号章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub index: u32,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl ReportSection {
    /// 章节内全部列表项，按出现顺序
    pub fn list_items(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::List { items } => Some(items),
                Block::Paragraph { .. } => None,
            })
            .flatten()
            .map(String::as_str)
    }
}

/// 单行的分类结果
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Rule,
    Header { index: u32, title: &'a str },
    ListItem(&'a str),
    Text(&'a str),
}

fn classify(raw: &str) -> Line<'_> {
    let stripped = raw.trim();
    if stripped.is_empty() {
        return Line::Blank;
    }
    if stripped.starts_with("===") {
        return Line::Rule;
    }
    if let Some(caps) = HEADER.captures(stripped)
        && let Ok(index) = caps["index"].parse()
        && let Some(title) = caps.name("title")
    {
        return Line::Header {
            index,
            title: title.as_str(),
        };
    }
    if let Some(item) = stripped.strip_prefix("- ") {
        return Line::ListItem(item.trim());
    }
    Line::Text(stripped)
}

/// 正在构建的章节与未落地的列表缓冲
struct SectionBuilder {
    section: ReportSection,
    list: Vec<String>,
}

impl SectionBuilder {
    fn new(index: u32, title: &str) -> Self {
        Self {
            section: ReportSection {
                index,
                title: title.to_string(),
                blocks: Vec::new(),
            },
            list: Vec::new(),
        }
    }

    fn flush_list(&mut self) {
        if self.list.is_empty() {
            return;
        }
        let items = std::mem::take(&mut self.list);
        self.section.blocks.push(Block::List { items });
    }

    fn finish(mut self) -> ReportSection {
        self.flush_list();
        self.section
    }
}

/// 解析报告文本
pub fn parse_sections(text: &str) -> Vec<ReportSection> {
    let mut sections = Vec::new();
    let mut current: Option<SectionBuilder> = None;

    for raw in text.lines() {
        match classify(raw) {
            Line::Rule => {}
            Line::Header { index, title } => {
                if let Some(builder) = current.take() {
                    sections.push(builder.finish());
                }
                current = Some(SectionBuilder::new(index, title));
            }
            line => {
                let Some(builder) = current.as_mut() else {
                    continue;
                };
                match line {
                    Line::Blank => builder.flush_list(),
                    Line::ListItem(item) => {
                        if !item.is_empty() {
                            builder.list.push(item.to_string());
                        }
                    }
                    Line::Text(text) => {
                        builder.flush_list();
                        builder.section.blocks.push(Block::Paragraph {
                            text: text.to_string(),
                        });
                    }
                    Line::Rule | Line::Header { .. } => {}
                }
            }
        }
    }

    if let Some(builder) = current {
        sections.push(builder.finish());
    }
    sections
}
