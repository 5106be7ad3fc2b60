//! Block-level tokenization of a decision record.
//!
//! The YAML front matter is split off by hand (it must open on the very first
//! line and close with a `---` line); the body goes through `pulldown-cmark`
//! and only the top-level blocks are kept. Headings and paragraphs carry their
//! inline children, everything else is reduced to its kind.

use pulldown_cmark::{Event, Options, Parser, Tag};

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Raw front matter text, without the `---` fences.
    Metadata(String),
    Heading { depth: u8, children: Vec<Inline> },
    Paragraph { children: Vec<Inline> },
    Other(BlockKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    List,
    Code,
    Html,
    Table,
    ThematicBreak,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Run of plain text; soft line breaks are folded in as `\n`.
    Text(String),
    Code(String),
    /// Emphasis, strong or strikethrough, flattened to its text.
    Styled(String),
    Link { text: String, url: String },
    Html(String),
    Break,
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Inline::Text(s) | Inline::Code(s) | Inline::Styled(s) | Inline::Html(s) => s,
            Inline::Link { text, .. } => text,
            Inline::Break => "\n",
        }
    }
}

#[cfg(test)]
impl Block {
    pub fn heading(depth: u8, text: &str) -> Self {
        Block::Heading {
            depth,
            children: vec![Inline::Text(text.to_string())],
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Block::Paragraph {
            children: vec![Inline::Text(text.to_string())],
        }
    }
}

/// Split `text` into top-level blocks. Never fails; unknown constructs
/// become [`Block::Other`].
pub fn tokenize(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let body = match split_front_matter(text) {
        Some((raw, body)) => {
            blocks.push(Block::Metadata(raw.to_string()));
            body
        }
        None => text,
    };

    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut nesting = 0usize;
    let mut open: Option<OpenBlock> = None;
    let mut inlines = InlineCollector::default();

    for event in Parser::new_ext(body, options) {
        match event {
            Event::Start(tag) => {
                if nesting == 0 {
                    match &tag {
                        Tag::Heading { level, .. } => open = Some(OpenBlock::Heading(*level as u8)),
                        Tag::Paragraph => open = Some(OpenBlock::Paragraph),
                        other => blocks.push(Block::Other(kind_of(other))),
                    }
                } else if open.is_some() {
                    inlines.start(&tag);
                }
                nesting += 1;
            }
            Event::End(_) => {
                nesting = nesting.saturating_sub(1);
                if open.is_none() {
                    continue;
                }
                if nesting > 0 {
                    inlines.end();
                    continue;
                }
                let children = std::mem::take(&mut inlines).finish();
                match open.take() {
                    Some(OpenBlock::Heading(depth)) => blocks.push(Block::Heading { depth, children }),
                    Some(OpenBlock::Paragraph) => blocks.push(Block::Paragraph { children }),
                    None => {}
                }
            }
            Event::Rule if nesting == 0 => blocks.push(Block::Other(BlockKind::ThematicBreak)),
            Event::Html(_) if nesting == 0 => blocks.push(Block::Other(BlockKind::Html)),
            event => {
                if open.is_some() {
                    inlines.push(event);
                }
            }
        }
    }

    blocks
}

/// Returns `(raw_yaml, body)` when `text` opens with a `---` fence that is
/// closed by a later `---` line. Trailing spaces or tabs after either fence
/// are allowed.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?.trim_start_matches([' ', '\t']);
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn kind_of(tag: &Tag<'_>) -> BlockKind {
    match tag {
        Tag::List(_) => BlockKind::List,
        Tag::CodeBlock(_) => BlockKind::Code,
        Tag::HtmlBlock => BlockKind::Html,
        Tag::Table(_) => BlockKind::Table,
        _ => BlockKind::Other,
    }
}

enum OpenBlock {
    Heading(u8),
    Paragraph,
}

enum OpenInline {
    Styled(String),
    Link { text: String, url: String },
}

#[derive(Default)]
struct InlineCollector {
    children: Vec<Inline>,
    pending: String,
    open: Option<OpenInline>,
    depth: usize,
}

impl InlineCollector {
    fn start(&mut self, tag: &Tag<'_>) {
        if self.depth == 0 {
            self.flush();
            self.open = Some(match tag {
                Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => OpenInline::Link {
                    text: String::new(),
                    url: dest_url.to_string(),
                },
                _ => OpenInline::Styled(String::new()),
            });
        }
        self.depth += 1;
    }

    fn end(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 {
            return;
        }
        match self.open.take() {
            Some(OpenInline::Styled(text)) => self.children.push(Inline::Styled(text)),
            Some(OpenInline::Link { text, url }) => self.children.push(Inline::Link { text, url }),
            None => {}
        }
    }

    fn push(&mut self, event: Event<'_>) {
        if self.depth > 0 {
            let buf = match &mut self.open {
                Some(OpenInline::Styled(text)) | Some(OpenInline::Link { text, .. }) => text,
                None => return,
            };
            match event {
                Event::Text(s) | Event::Code(s) | Event::InlineHtml(s) => buf.push_str(&s),
                Event::SoftBreak | Event::HardBreak => buf.push('\n'),
                _ => {}
            }
            return;
        }

        match event {
            Event::Text(s) => self.pending.push_str(&s),
            Event::SoftBreak => self.pending.push('\n'),
            Event::Code(s) => {
                self.flush();
                self.children.push(Inline::Code(s.to_string()));
            }
            Event::HardBreak => {
                self.flush();
                self.children.push(Inline::Break);
            }
            Event::InlineHtml(s) | Event::Html(s) => {
                self.flush();
                self.children.push(Inline::Html(s.to_string()));
            }
            _ => {}
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.children.push(Inline::Text(text));
        }
    }

    fn finish(mut self) -> Vec<Inline> {
        self.flush();
        self.children
    }
}
