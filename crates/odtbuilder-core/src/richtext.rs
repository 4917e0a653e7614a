//! Rich-text normalization
//!
//! The editor's text fields hold a small subset of inline markup written by a
//! contenteditable surface: `<div>`/`<p>` blocks, `<br>` breaks, the empty
//! line idiom `<div><br></div>` and a few named entities. Normalization turns
//! that into plain text runs separated by hard line breaks.
//!
//! The transform runs as a fixed sequence of passes over a token stream:
//!
//! 1. `&nbsp;` becomes a space
//! 2. `<div><br></div>` (or `<p><br></p>`) becomes one line separator
//! 3. `<br>` becomes a line separator
//! 4. an opening `<div>` or `<p>` becomes a line separator
//! 5. every other tag is dropped
//! 6. `&amp;`, `&lt;`, `&gt;` and `&quot;` are unescaped
//! 7. the text is split on separators; every segment after the first is
//!    preceded by a break, empty segments contribute no text
//!
//! Pass order matters: entities are unescaped only after tags are gone, so
//! `&lt;b&gt;` stays visible text.

/// One piece of normalized output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A text run
    Text(String),
    /// A hard line break
    Break,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Tag(Tag),
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    /// Lower-cased element name (may be empty for things like `<!-- -->`)
    name: String,
    closing: bool,
}

impl Tag {
    fn is_block(&self) -> bool {
        matches!(self.name.as_str(), "div" | "p")
    }

    fn is_break(&self) -> bool {
        self.name == "br"
    }
}

/// Normalize editor markup into text runs and breaks
///
/// ```
/// use odtbuilder_core::richtext::{normalize, Segment};
///
/// let segments = normalize("Hallo<br>wereld");
/// assert_eq!(
///     segments,
///     vec![
///         Segment::Text("Hallo".into()),
///         Segment::Break,
///         Segment::Text("wereld".into()),
///     ]
/// );
/// ```
pub fn normalize(markup: &str) -> Vec<Segment> {
    let markup = markup.replace("&nbsp;", " ");

    let tokens = tokenize(&markup);
    let tokens = collapse_empty_lines(tokens);
    let tokens = replace_tags(tokens, |tag| !tag.closing && tag.is_break());
    let tokens = replace_tags(tokens, |tag| !tag.closing && tag.is_block());
    let tokens = strip_tags(tokens);

    split_lines(tokens)
}

/// Split markup into text and tag tokens
///
/// A tag is `<` followed by at least one character up to the next `>`. A
/// `<` without a closing `>` is ordinary text.
fn tokenize(markup: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = markup;

    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let end = match after.find('>') {
            Some(end) if end > 0 => end,
            _ => {
                text.push_str(&rest[..=start]);
                rest = after;
                continue;
            }
        };

        text.push_str(&rest[..start]);
        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut text)));
        }
        tokens.push(Token::Tag(parse_tag(&after[..end])));
        rest = &after[end + 1..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

fn parse_tag(inner: &str) -> Tag {
    let inner = inner.trim();
    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body.trim_start()),
        None => (false, inner),
    };
    let name = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    Tag { name, closing }
}

/// Replace `<div><br></div>` and `<p><br></p>` with a single separator
fn collapse_empty_lines(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let [Token::Tag(open), Token::Tag(br), Token::Tag(close), ..] = &tokens[i..] {
            if !open.closing
                && open.is_block()
                && !br.closing
                && br.is_break()
                && close.closing
                && close.name == open.name
            {
                out.push(Token::Separator);
                i += 3;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn replace_tags(tokens: Vec<Token>, matches: impl Fn(&Tag) -> bool) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|token| match token {
            Token::Tag(tag) if matches(&tag) => Token::Separator,
            other => other,
        })
        .collect()
}

fn strip_tags(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|token| !matches!(token, Token::Tag(_)))
        .collect()
}

/// Unescape the four remaining named entities in a single pass
fn unescape_entities(text: &str) -> String {
    const ENTITIES: [(&str, char); 4] = [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>'), ("&quot;", '"')];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| tail.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn split_lines(tokens: Vec<Token>) -> Vec<Segment> {
    let mut lines = vec![String::new()];
    for token in tokens {
        match token {
            Token::Text(text) => {
                if let Some(line) = lines.last_mut() {
                    line.push_str(&text);
                }
            }
            Token::Separator => lines.push(String::new()),
            Token::Tag(_) => {}
        }
    }

    let mut segments = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        if index > 0 {
            segments.push(Segment::Break);
        }
        let text = unescape_entities(&line);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
    }
    segments
}
