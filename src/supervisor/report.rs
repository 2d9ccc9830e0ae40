//! 最终报告编译
//!
//! 纯函数：相同的状态总是得到相同的八章节报告，缺失的数据以占位文本代替。

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::i18n::TargetLanguage;
use crate::supervisor::agents::AgentRole;
use crate::supervisor::state::SupervisorState;

/// 报告结尾的署名行
pub const ATTRIBUTION: &str = "Report auto-generated by EV Market Supervisor pipeline.";

/// 没有任何引用链接时的占位文本
pub const NO_REFERENCES: &str =
    "No external sources cited. Review agent notes for additional information.";

const RECOMMENDATION: &str =
    "Action: Review policy and supply chain risks to establish execution plan.";

const INDENT: &str = "   - ";

static BACKTICKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`+").unwrap());
static HEADINGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*#+.*$").unwrap());
static LEADING_BULLETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[^\S\n]*(?:[-*•][^\S\n]*)+").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*•]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[\w\-._~:/?#\[\]@!$&'()*+,;=%]+").unwrap()
});

/// 报告编译器
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCompiler {
    sentence_limit: usize,
    placeholder: String,
}

impl Default for ReportCompiler {
    fn default() -> Self {
        Self::new(4, TargetLanguage::default())
    }
}

impl ReportCompiler {
    pub fn new(sentence_limit: usize, language: TargetLanguage) -> Self {
        Self {
            sentence_limit,
            placeholder: language.insufficient_data().to_string(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// 去掉markdown噪声、合并空白并截取前若干句
    ///
    /// 对已清理过的文本再次调用结果不变。
    pub fn clean_text(&self, value: &str, sentence_limit: usize) -> String {
        let text = BACKTICKS.replace_all(value, "");
        let text = LEADING_BULLETS.replace_all(&text, "");
        let text = EMPHASIS.replace_all(&text, "");
        let text = HEADINGS.replace_all(&text, "");
        let text = WHITESPACE.replace_all(&text, " ");
        let text = text.trim();
        if text.is_empty() {
            return self.placeholder.clone();
        }

        let trimmed = split_sentences(text)
            .into_iter()
            .take(sentence_limit)
            .collect::<Vec<_>>()
            .join(" ");
        let trimmed = trimmed.trim();
        if trimmed.is_empty() {
            self.placeholder.clone()
        } else {
            trimmed.to_string()
        }
    }

    /// 某个智能体最近一条笔记的清理结果
    fn latest(&self, state: &SupervisorState, agent: &str) -> String {
        match state.latest_note(agent) {
            Some(note) => self.clean_text(note, self.sentence_limit),
            None => self.placeholder.clone(),
        }
    }

    /// 合并多个智能体的最新笔记，跳过没有笔记的智能体并去重
    fn combine<'a>(&self, state: &SupervisorState, agents: impl IntoIterator<Item = &'a str>) -> String {
        let mut unique: Vec<String> = Vec::new();
        for agent in agents {
            if state.notes_for(agent).is_empty() {
                continue;
            }
            let snippet = self.latest(state, agent);
            if !unique.contains(&snippet) {
                unique.push(snippet);
            }
        }
        if unique.is_empty() {
            self.placeholder.clone()
        } else {
            unique.join(" ")
        }
    }

    /// 编译八章节报告
    pub fn compile<S: AsRef<str>>(&self, state: &SupervisorState, validation_ids: &[S]) -> String {
        let market = AgentRole::Market.id();
        let finance = AgentRole::Finance.id();
        let policy = AgentRole::Policy.id();

        let exec_summary = vec![
            format!("User Query: {}", self.clean_text(state.task_input(), 1)),
            format!("Key Finding: {}", self.latest(state, market)),
            format!("Finance Metrics: {}", self.latest(state, finance)),
            RECOMMENDATION.to_string(),
        ];
        let market_section = vec![
            "Global and Regional Trends:".to_string(),
            self.combine(state, [market, policy]),
        ];
        let cross_section = self.combine(state, validation_ids.iter().map(|id| id.as_ref()));

        let mut references = extract_references(state);
        if references.is_empty() {
            references.push(NO_REFERENCES.to_string());
        }

        let sections: [(&str, Vec<String>); 8] = [
            ("1. EXECUTIVE SUMMARY", exec_summary),
            ("2. MARKET OVERVIEW", market_section),
            ("3. POLICY/REGULATION", vec![self.latest(state, policy)]),
            ("4. OEM ANALYSIS", vec![self.latest(state, AgentRole::Oem.id())]),
            ("5. SUPPLY CHAIN ANALYSIS", vec![self.latest(state, AgentRole::Supply.id())]),
            ("6. FINANCIAL OUTLOOK", vec![self.latest(state, finance)]),
            ("7. CROSS-LAYER INSIGHTS", vec![cross_section]),
            ("8. REFERENCES", references),
        ];

        let mut lines: Vec<String> = Vec::new();
        for (title, items) in sections {
            lines.push(title.to_string());
            lines.extend(
                items
                    .into_iter()
                    .filter(|item| !item.is_empty())
                    .map(|item| format!("{INDENT}{item}")),
            );
            lines.push(String::new());
        }
        lines.push(ATTRIBUTION.to_string());

        lines.join("\n").trim().to_string()
    }
}

/// 在句末标点后的空白处切分
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let Some(&(end, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }
        sentences.push(&text[start..end]);
        while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
        start = chars.peek().map_or(text.len(), |&(i, _)| i);
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// 从所有笔记与原始返回中提取去重排序后的链接
pub fn extract_references(state: &SupervisorState) -> Vec<String> {
    let mut refs = BTreeSet::new();

    for notes in state.notes().values() {
        for note in notes {
            collect_urls(note, &mut refs);
        }
    }
    for record in state.history() {
        if let Some(raw) = record.result.get("raw") {
            visit(raw, &mut refs);
        }
    }

    refs.into_iter().collect()
}

fn visit(value: &Value, refs: &mut BTreeSet<String>) {
    match value {
        Value::String(text) => collect_urls(text, refs),
        Value::Array(items) => items.iter().for_each(|item| visit(item, refs)),
        Value::Object(map) => map.values().for_each(|item| visit(item, refs)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn collect_urls(text: &str, refs: &mut BTreeSet<String>) {
    for found in URL.find_iter(text) {
        let url = trim_url(found.as_str());
        if url.split_once("://").is_some_and(|(_, rest)| !rest.is_empty()) {
            refs.insert(url.to_string());
        }
    }
}

/// 去掉句末标点与不成对的右括号
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let stripped = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        if stripped.ends_with(')') && stripped.matches('(').count() < stripped.matches(')').count()
        {
            url = &stripped[..stripped.len() - 1];
            continue;
        }
        if stripped.len() == url.len() {
            return url;
        }
        url = stripped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLACEHOLDER: &str = "데이터가 충분하지 않습니다.";

    fn section_titles(report: &str) -> Vec<&str> {
        report
            .lines()
            .filter(|line| {
                let mut chars = line.chars();
                matches!((chars.next(), chars.next()), (Some(d), Some('.')) if d.is_ascii_digit())
            })
            .collect()
    }

    /// 标题下方紧跟的第一条缩进内容
    fn first_item<'a>(report: &'a str, title: &str) -> &'a str {
        let mut lines = report.lines().skip_while(|line| *line != title);
        lines.next();
        lines.next().unwrap_or_default()
    }

    #[test]
    fn test_empty_state_has_eight_sections_with_placeholders() {
        let state = SupervisorState::new("Analyze EV industry");
        let report = ReportCompiler::default().compile::<&str>(&state, &[]);

        assert_eq!(
            section_titles(&report),
            [
                "1. EXECUTIVE SUMMARY",
                "2. MARKET OVERVIEW",
                "3. POLICY/REGULATION",
                "4. OEM ANALYSIS",
                "5. SUPPLY CHAIN ANALYSIS",
                "6. FINANCIAL OUTLOOK",
                "7. CROSS-LAYER INSIGHTS",
                "8. REFERENCES",
            ]
        );
        assert_eq!(first_item(&report, "4. OEM ANALYSIS"), format!("   - {PLACEHOLDER}"));
        assert_eq!(first_item(&report, "7. CROSS-LAYER INSIGHTS"), format!("   - {PLACEHOLDER}"));
        assert_eq!(first_item(&report, "8. REFERENCES"), format!("   - {NO_REFERENCES}"));
        assert_eq!(first_item(&report, "1. EXECUTIVE SUMMARY"), "   - User Query: Analyze EV industry");
        assert!(report.ends_with(ATTRIBUTION));
        assert!(report.contains(&format!("   - {RECOMMENDATION}")));
    }

    #[test]
    fn test_sections_use_latest_note() {
        let mut state = SupervisorState::new("task");
        state.log("oem_agent", "Old view.");
        state.log("oem_agent", "BYD expands in Europe.");
        state.log("finance_agent", "Margins recover.");

        let report = ReportCompiler::default().compile::<&str>(&state, &[]);

        assert_eq!(first_item(&report, "4. OEM ANALYSIS"), "   - BYD expands in Europe.");
        assert_eq!(first_item(&report, "6. FINANCIAL OUTLOOK"), "   - Margins recover.");
        assert!(report.contains("   - Finance Metrics: Margins recover."));
    }

    #[test]
    fn test_market_overview_combines_market_and_policy_without_duplicates() {
        let mut state = SupervisorState::new("task");
        state.log("market_agent", "Demand is rising.");
        state.log("policy_agent", "Demand is rising.");

        let report = ReportCompiler::default().compile::<&str>(&state, &[]);
        let mut lines = report.lines().skip_while(|l| *l != "2. MARKET OVERVIEW").skip(1);
        assert_eq!(lines.next(), Some("   - Global and Regional Trends:"));
        assert_eq!(lines.next(), Some("   - Demand is rising."));
    }

    #[test]
    fn test_cross_layer_joins_validation_notes_in_order() {
        let mut state = SupervisorState::new("task");
        state.log("hallu_agent", "No unsupported claims.");
        state.log("cross_agent", "Layers agree.");
        state.log("report_agent", "Layers agree.");

        let report = ReportCompiler::default()
            .compile(&state, &["cross_agent", "hallu_agent", "report_agent"]);
        assert_eq!(
            first_item(&report, "7. CROSS-LAYER INSIGHTS"),
            "   - Layers agree. No unsupported claims."
        );
    }

    #[test]
    fn test_references_are_deduplicated_and_stripped() {
        let mut state = SupervisorState::new("task");
        state.log("oem_agent", "See https://example.com/a and https://example.com/b.");
        state.log("policy_agent", "Again https://example.com/a, plus (https://en.wikipedia.org/wiki/Tesla_(company)).");
        state.snapshot(
            "oem_agent",
            &json!({"summary": "x", "raw": {"messages": [{"content": ["https://raw.example/news?id=1;"]}]}}),
        );

        assert_eq!(
            extract_references(&state),
            [
                "https://en.wikipedia.org/wiki/Tesla_(company)",
                "https://example.com/a",
                "https://example.com/b",
                "https://raw.example/news?id=1",
            ]
        );

        let report = ReportCompiler::default().compile::<&str>(&state, &[]);
        assert!(report.contains("   - https://example.com/a\n   - https://example.com/b"));
    }

    #[test]
    fn test_summary_field_is_not_scanned() {
        let mut state = SupervisorState::new("task");
        state.snapshot("x", &json!({"summary": "https://only-summary.example", "raw": null}));
        assert!(extract_references(&state).is_empty());
    }

    #[test]
    fn test_clean_text_strips_markdown_noise() {
        let compiler = ReportCompiler::default();
        let text = "## Heading\n- **EV sales** rose `12%`.\n* • Battery-grade lithium fell.\n\nThird one! Fourth? Fifth.";

        assert_eq!(
            compiler.clean_text(text, 2),
            "EV sales rose 12%. Battery-grade lithium fell."
        );
        assert_eq!(
            compiler.clean_text(text, 10),
            "EV sales rose 12%. Battery-grade lithium fell. Third one! Fourth? Fifth."
        );
    }

    #[test]
    fn test_clean_text_placeholder_for_noise_only() {
        let compiler = ReportCompiler::new(4, TargetLanguage::English);
        assert_eq!(compiler.clean_text("# only a heading\n  - ", 4), "Insufficient data.");
        assert_eq!(compiler.clean_text("", 4), "Insufficient data.");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let compiler = ReportCompiler::default();
        let inputs = [
            "- One. Two!  Three?\n# H\n`Four.` Five.",
            "* # Title\nBody text without end",
            "Prices rose 3.5% in Q2. Sales slowed.",
            "",
        ];
        for input in inputs {
            let once = compiler.clean_text(input, 3);
            assert_eq!(compiler.clean_text(&once, 3), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_split_sentences_keeps_decimals() {
        assert_eq!(
            split_sentences("Prices rose 3.5% in Q2. Sales slowed.  Done"),
            ["Prices rose 3.5% in Q2.", "Sales slowed.", "Done"]
        );
    }
}
