//! Report export as Markdown, clipboard-friendly plain text, or an HTML fragment.
//!
//! Reports are LLM-written Markdown with a small vocabulary (headings, lists,
//! emphasis, the odd rule or quote), so this is a line-based converter rather
//! than a full CommonMark implementation.

use lazy_static::lazy_static;
use regex::Regex;

use crate::features::reports::dtos::ExportFormat;
use crate::features::reports::models::Report;

lazy_static! {
    static ref HEADING: Regex = Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").unwrap();
    static ref UNORDERED_ITEM: Regex = Regex::new(r"^\s*[-*+]\s+(.*)$").unwrap();
    static ref ORDERED_ITEM: Regex = Regex::new(r"^\s*(\d+)[.)]\s+(.*)$").unwrap();
    static ref RULE: Regex = Regex::new(r"^\s*([-*_])(\s*([-*_])){2,}\s*$").unwrap();
    static ref QUOTE: Regex = Regex::new(r"^\s*>\s?(.*)$").unwrap();
    static ref FENCE: Regex = Regex::new(r"^\s*(```|~~~)").unwrap();
    static ref BOLD_STARS: Regex = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    static ref BOLD_UNDERSCORES: Regex = Regex::new(r"__(.+?)__").unwrap();
    static ref ITALIC_STAR: Regex = Regex::new(r"\*([^*\s][^*]*?)\*").unwrap();
    static ref ITALIC_UNDERSCORE: Regex = Regex::new(r"(^|[^\w])_([^_\s][^_]*?)_($|[^\w])").unwrap();
    static ref CODE: Regex = Regex::new(r"`([^`]+)`").unwrap();
    static ref LINK: Regex = Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap();
}

pub fn render(report: &Report, format: ExportFormat) -> String {
    match format {
        ExportFormat::Markdown => to_markdown(&report.title, &report.content),
        ExportFormat::Text => to_plain_text(&report.title, &report.content),
        ExportFormat::Html => to_html(&report.title, &report.content),
    }
}

/// Generated reports usually open with their own `# ...` heading
fn starts_with_h1(content: &str) -> bool {
    content
        .lines()
        .find(|l| !l.trim().is_empty())
        .and_then(|l| HEADING.captures(l.trim()))
        .is_some_and(|c| c[1].len() == 1)
}

pub fn to_markdown(title: &str, content: &str) -> String {
    let content = content.trim();
    if starts_with_h1(content) {
        format!("{}\n", content)
    } else {
        format!("# {}\n\n{}\n", title.trim(), content)
    }
}

fn strip_inline(line: &str) -> String {
    let line = LINK.replace_all(line, "$1");
    let line = BOLD_STARS.replace_all(&line, "$1");
    let line = BOLD_UNDERSCORES.replace_all(&line, "$1");
    let line = ITALIC_STAR.replace_all(&line, "$1");
    let line = ITALIC_UNDERSCORE.replace_all(&line, "$1$2$3");
    CODE.replace_all(&line, "$1").into_owned()
}

pub fn to_plain_text(title: &str, content: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    if !starts_with_h1(content) {
        out.push(title.trim().to_string());
        out.push(String::new());
    }

    for raw in content.trim().lines() {
        let line = raw.trim_end();
        if FENCE.is_match(line) || RULE.is_match(line) {
            continue;
        }
        let text = if let Some(c) = HEADING.captures(line) {
            strip_inline(&c[2])
        } else if let Some(c) = UNORDERED_ITEM.captures(line) {
            format!("• {}", strip_inline(&c[1]))
        } else if let Some(c) = ORDERED_ITEM.captures(line) {
            format!("{}. {}", &c[1], strip_inline(&c[2]))
        } else if let Some(c) = QUOTE.captures(line) {
            strip_inline(&c[1])
        } else {
            strip_inline(line.trim_start())
        };
        out.push(text);
    }

    collapse_blank_lines(out).join("\n") + "\n"
}

fn collapse_blank_lines(lines: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.is_empty() && result.last().is_some_and(|l| l.is_empty()) {
            continue;
        }
        result.push(line);
    }
    while result.last().is_some_and(|l| l.is_empty()) {
        result.pop();
    }
    result
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape first, then add markup; `*`, `_` and backticks survive escaping
fn inline_html(text: &str) -> String {
    let text = escape_html(text);
    let text = CODE.replace_all(&text, "<code>$1</code>");
    let text = LINK.replace_all(&text, "$1");
    let text = BOLD_STARS.replace_all(&text, "<strong>$1</strong>");
    let text = BOLD_UNDERSCORES.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC_STAR.replace_all(&text, "<em>$1</em>");
    ITALIC_UNDERSCORE
        .replace_all(&text, "$1<em>$2</em>$3")
        .into_owned()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(&self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

#[derive(Default)]
struct HtmlWriter {
    out: Vec<String>,
    paragraph: Vec<String>,
    list: Option<ListKind>,
    quote: Vec<String>,
}

impl HtmlWriter {
    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            self.out
                .push(format!("<p>{}</p>", self.paragraph.join("<br>\n")));
            self.paragraph.clear();
        }
    }

    fn flush_quote(&mut self) {
        if !self.quote.is_empty() {
            self.out.push(format!(
                "<blockquote><p>{}</p></blockquote>",
                self.quote.join("<br>\n")
            ));
            self.quote.clear();
        }
    }

    fn close_list(&mut self) {
        if let Some(kind) = self.list.take() {
            self.out.push(format!("</{}>", kind.tag()));
        }
    }

    fn flush_all(&mut self) {
        self.flush_paragraph();
        self.flush_quote();
        self.close_list();
    }

    fn list_item(&mut self, kind: ListKind, text: &str) {
        self.flush_paragraph();
        self.flush_quote();
        if self.list != Some(kind) {
            self.close_list();
            self.out.push(format!("<{}>", kind.tag()));
            self.list = Some(kind);
        }
        self.out.push(format!("<li>{}</li>", inline_html(text)));
    }
}

pub fn to_html(title: &str, content: &str) -> String {
    let mut w = HtmlWriter::default();
    if !starts_with_h1(content) {
        w.out.push(format!("<h1>{}</h1>", escape_html(title.trim())));
    }

    let mut in_code = false;
    let mut code: Vec<String> = Vec::new();

    for raw in content.trim().lines() {
        let line = raw.trim_end();

        if FENCE.is_match(line) {
            if in_code {
                w.out
                    .push(format!("<pre><code>{}</code></pre>", code.join("\n")));
                code.clear();
            } else {
                w.flush_all();
            }
            in_code = !in_code;
            continue;
        }
        if in_code {
            code.push(escape_html(raw));
            continue;
        }

        if line.trim().is_empty() {
            w.flush_all();
        } else if let Some(c) = HEADING.captures(line) {
            w.flush_all();
            let level = c[1].len();
            w.out
                .push(format!("<h{0}>{1}</h{0}>", level, inline_html(&c[2])));
        } else if RULE.is_match(line) {
            w.flush_all();
            w.out.push("<hr>".to_string());
        } else if let Some(c) = UNORDERED_ITEM.captures(line) {
            w.list_item(ListKind::Unordered, &c[1]);
        } else if let Some(c) = ORDERED_ITEM.captures(line) {
            w.list_item(ListKind::Ordered, &c[2]);
        } else if let Some(c) = QUOTE.captures(line) {
            w.flush_paragraph();
            w.close_list();
            w.quote.push(inline_html(&c[1]));
        } else {
            w.flush_quote();
            w.close_list();
            w.paragraph.push(inline_html(line.trim_start()));
        }
    }

    if in_code {
        w.out
            .push(format!("<pre><code>{}</code></pre>", code.join("\n")));
    }
    w.flush_all();

    w.out.join("\n") + "\n"
}
