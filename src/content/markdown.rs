//! Markdown rendering with syntax highlighting

use lazy_static::lazy_static;
use pulldown_cmark::{
    html, BrokenLink, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd,
};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::HighlightConfig;
use crate::helpers::escape_html;

lazy_static! {
    /// Opening or closing code fence: up to three spaces, then ``` or ~~~ runs
    static ref FENCE_RE: Regex = Regex::new(r"^( {0,3})(`{3,}|~{3,})(.*)$").unwrap();
    static ref LINK_DEF_RE: Regex = Regex::new(r"^ {0,3}\[[^\]^][^\]]*\]:\s*\S").unwrap();
}

const MORE_MARKER: &str = "<!-- more -->";

/// A non-fatal problem found while rendering a body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderWarning {
    /// 1-based line within the body
    pub line: usize,
    pub kind: RenderWarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderWarningKind {
    /// A code fence that is still open at the end of the document
    UnterminatedFence { fence: String },
    /// `[text][label]` where `label` has no definition
    UndefinedReference { label: String },
    /// `[text]()`
    EmptyLinkTarget,
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RenderWarningKind::UnterminatedFence { fence } => write!(
                f,
                "line {}: code fence `{}` is never closed",
                self.line, fence
            ),
            RenderWarningKind::UndefinedReference { label } => write!(
                f,
                "line {}: link reference [{}] is not defined",
                self.line, label
            ),
            RenderWarningKind::EmptyLinkTarget => {
                write!(f, "line {}: link has an empty destination", self.line)
            }
        }
    }
}

/// Output of [`MarkdownRenderer::render`]
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub warnings: Vec<RenderWarning>,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            highlight: config.enable,
            line_numbers: config.line_number,
        }
    }

    /// Render markdown to HTML, collecting warnings for broken fences and links
    pub fn render(&self, markdown: &str) -> Rendered {
        // Front-matter is split off before we get here, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser =
            Parser::new_with_broken_link_callback(markdown, options, Some(resolve_broken_link));

        let mut warnings = Vec::new();
        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<(Option<String>, String)> = None;
        // One entry per open link or image; `true` when it became a marker
        let mut link_stack: Vec<bool> = Vec::new();

        for (event, range) in parser.into_offset_iter() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            if let Some(fence) = unclosed_fence(&markdown[range.clone()]) {
                                let warning = RenderWarning {
                                    line: line_of(markdown, range.start),
                                    kind: RenderWarningKind::UnterminatedFence { fence },
                                };
                                events.push(Event::Html(CowStr::from(warning_marker(&warning))));
                                warnings.push(warning);
                            }
                            info.split_whitespace().next().map(|lang| lang.to_string())
                        }
                        CodeBlockKind::Indented => None,
                    };

                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let highlighted = self.highlight_code(&code, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. })) => {
                    let problem = match &tag {
                        Tag::Link {
                            link_type,
                            dest_url,
                            id,
                            ..
                        }
                        | Tag::Image {
                            link_type,
                            dest_url,
                            id,
                            ..
                        } => link_problem(*link_type, dest_url, id),
                        _ => None,
                    };

                    match problem {
                        Some(kind) => {
                            let warning = RenderWarning {
                                line: line_of(markdown, range.start),
                                kind,
                            };
                            events.push(Event::Html(CowStr::from(format!(
                                r#"<span class="render-warning" title="{}">"#,
                                escape_html(&warning.to_string())
                            ))));
                            warnings.push(warning);
                            link_stack.push(true);
                        }
                        None => {
                            events.push(Event::Start(tag));
                            link_stack.push(false);
                        }
                    }
                }
                Event::End(end @ (TagEnd::Link | TagEnd::Image)) => {
                    if link_stack.pop().unwrap_or(false) {
                        events.push(Event::Html(CowStr::from("</span>")));
                    } else {
                        events.push(Event::End(end));
                    }
                }
                _ => {
                    if code_block.is_none() {
                        events.push(event);
                    }
                }
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Rendered {
            html: html_output,
            warnings,
        }
    }

    /// Highlight a code block, keeping the language annotation on the wrapper
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = escape_html(lang.unwrap_or("text"));

        if !self.highlight {
            return format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                lang,
                escape_html(code)
            );
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(&lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(&lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme
            .and_then(|theme| {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
            })
            .unwrap_or_else(|| format!("<pre><code>{}</code></pre>", escape_html(code)));

        if self.line_numbers {
            let gutter = (1..=code.lines().count().max(1))
                .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                r#"<figure class="highlight {lang}" data-lang="{lang}"><table><tr><td class="gutter"><pre>{gutter}</pre></td><td class="code">{highlighted}</td></tr></table></figure>"#,
            )
        } else {
            format!(r#"<figure class="highlight {lang}" data-lang="{lang}">{highlighted}</figure>"#)
        }
    }

    /// Markdown before `<!-- more -->`, if the body has an excerpt marker
    pub fn excerpt(content: &str) -> Option<&str> {
        content.find(MORE_MARKER).map(|pos| content[..pos].trim())
    }

    /// Render the excerpt with the reference definitions of the whole body,
    /// so links resolved later in the document still resolve here
    pub fn render_excerpt(&self, content: &str) -> Option<String> {
        let excerpt = Self::excerpt(content)?;
        let definitions: Vec<&str> = content
            .lines()
            .filter(|line| is_link_definition(line))
            .collect();

        if definitions.is_empty() {
            return Some(self.render(excerpt).html);
        }

        let source = format!("{}\n\n{}\n", excerpt, definitions.join("\n"));
        Some(self.render(&source).html)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit reference links and images with no definition still become
/// links so the event loop can flag them; shortcut brackets such as `[Int]`
/// stay text.
fn resolve_broken_link<'a>(link: BrokenLink<'a>) -> Option<(CowStr<'a>, CowStr<'a>)> {
    match link.link_type {
        LinkType::Reference | LinkType::Collapsed => {
            Some((CowStr::Borrowed(""), CowStr::Borrowed("")))
        }
        _ => None,
    }
}

fn warning_marker(warning: &RenderWarning) -> String {
    format!(
        r#"<div class="render-warning">{}</div>"#,
        escape_html(&warning.to_string())
    )
}

/// 1-based line number of a byte offset
fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

/// Why a link or image cannot be rendered as one
fn link_problem(link_type: LinkType, dest_url: &str, id: &str) -> Option<RenderWarningKind> {
    match link_type {
        LinkType::ReferenceUnknown | LinkType::CollapsedUnknown => {
            Some(RenderWarningKind::UndefinedReference {
                label: id.to_string(),
            })
        }
        _ if dest_url.trim().is_empty() => Some(RenderWarningKind::EmptyLinkTarget),
        _ => None,
    }
}

/// Drop blockquote markers and indentation in front of a fence
fn strip_container_prefix(line: &str) -> &str {
    line.trim_start_matches(|c: char| c == '>' || c == ' ' || c == '\t')
}

/// Opening marker of a fenced block whose source never closes it.
/// Inside blockquotes and list items pulldown-cmark ends such a block with
/// its container, so the block source is checked instead of the whole body.
fn unclosed_fence(block: &str) -> Option<String> {
    let mut lines = block.lines().map(strip_container_prefix);
    let opening = FENCE_RE.captures(lines.next()?)?;
    let marker = &opening[2];

    let closed = lines
        .filter(|line| !line.trim().is_empty())
        .last()
        .and_then(|line| FENCE_RE.captures(line))
        .map(|closing| {
            closing[2].chars().next() == marker.chars().next()
                && closing[2].len() >= marker.len()
                && closing[3].trim().is_empty()
        })
        .unwrap_or(false);

    if closed {
        None
    } else {
        Some(marker.to_string())
    }
}

/// Reference definitions (`[label]: url`), footnotes excluded
fn is_link_definition(line: &str) -> bool {
    LINK_DEF_RE.is_match(line)
}
