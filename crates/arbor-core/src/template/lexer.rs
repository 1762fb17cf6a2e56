use super::condition::{self, Condition};
use super::{CharRange, FieldRef, Segment, Syntax, Template, Ternary};

/// Single pass scanner turning template source into segments.
///
/// Every token delimiter is ASCII, so scanning works on bytes and literal text
/// is always sliced at character boundaries.
pub(super) struct Lexer<'a> {
    src: &'a str,
    syntax: Syntax,
}

impl<'a> Lexer<'a> {
    pub(super) fn new(src: &'a str, syntax: Syntax) -> Lexer<'a> {
        Lexer { src, syntax }
    }

    pub(super) fn parse(&self) -> Template {
        let bytes = self.src.as_bytes();
        let mut segments = vec![];
        let mut literal_start = 0;
        let mut pos = 0;

        while pos < bytes.len() {
            if bytes[pos] != b'{' {
                pos += 1;
                continue;
            }

            let token = if self.syntax == Syntax::Format && bytes.get(pos + 1) == Some(&b'?') {
                self.ternary(pos).map(|(t, end)| (Segment::Ternary(t), end))
            } else {
                self.field(pos).map(|(f, end)| (Segment::Field(f), end))
            };

            match token {
                Some((segment, end)) => {
                    if literal_start < pos {
                        segments.push(Segment::Literal(self.src[literal_start..pos].to_string()));
                    }
                    segments.push(segment);
                    pos = end;
                    literal_start = end;
                }
                None => pos += 1,
            }
        }

        if literal_start < self.src.len() {
            segments.push(Segment::Literal(self.src[literal_start..].to_string()));
        }

        Template { segments }
    }

    /// `{path}` starting at `start`, with an optional range suffix. Returns the
    /// field and the byte offset just past the token.
    fn field(&self, start: usize) -> Option<(FieldRef, usize)> {
        let close = start + 1 + self.src[start + 1..].find('}')?;
        let path = condition::parse_path(&self.src[start + 1..close]).ok()?;
        let mut end = close + 1;

        let mut range = None;
        if self.syntax == Syntax::Format && self.src[end..].starts_with('[') {
            if let Some(len) = self.src[end..].find(']') {
                if let Some(parsed) = parse_range(&self.src[end + 1..end + len]) {
                    range = Some(parsed);
                    end += len + 1;
                }
            }
        }

        Some((FieldRef { path, range }, end))
    }

    /// `{? condition ? then : else}` starting at `start`.
    fn ternary(&self, start: usize) -> Option<(Ternary, usize)> {
        let close = matching_brace(self.src, start)?;
        let body = &self.src[start + 2..close];

        let question = find_unquoted(body, b'?')?;
        let condition = Condition::parse(&body[..question]);
        let branches = &body[question + 1..];

        let (then, otherwise) = match find_branch_separator(branches) {
            Some(colon) => (&branches[..colon], &branches[colon + 1..]),
            None => (branches, ""),
        };

        let ternary = Ternary {
            condition,
            then: Template::parse(unquote(then.trim())),
            otherwise: Template::parse(unquote(otherwise.trim())),
            source: self.src[start..=close].to_string(),
        };

        Some((ternary, close + 1))
    }
}

/// Finds the `}` closing the `{` at `open`, counting nested braces.
fn matching_brace(src: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;

    for (i, b) in src.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

fn find_unquoted(src: &str, needle: u8) -> Option<usize> {
    let mut quote = None;

    for (i, b) in src.bytes().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if b == needle => return Some(i),
            None => {}
        }
    }

    None
}

/// Finds the `:` separating the branches, ignoring colons nested in
/// placeholders and inside a quoted then-branch.
fn find_branch_separator(src: &str) -> Option<usize> {
    let trimmed = src.trim_start();
    let mut from = src.len() - trimmed.len();

    if let Some(q) = trimmed.bytes().next().filter(|b| *b == b'\'' || *b == b'"') {
        let end = trimmed[1..].bytes().position(|b| b == q)?;
        from += end + 2;
    }

    let mut depth = 0usize;
    for (i, b) in src.bytes().enumerate().skip(from) {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => return Some(i),
            _ => {}
        }
    }

    None
}

fn unquote(src: &str) -> &str {
    for quote in ['\'', '"'] {
        if src.len() >= 2 && src.starts_with(quote) && src.ends_with(quote) {
            return &src[1..src.len() - 1];
        }
    }
    src
}

fn parse_range(src: &str) -> Option<CharRange> {
    let bound = |s: &str| -> Option<Option<usize>> {
        if s.is_empty() {
            Some(None)
        } else if s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().ok().map(Some)
        } else {
            None
        }
    };

    match src.split_once("..") {
        Some((from, to)) => match (bound(from)?, bound(to)?) {
            (None, None) => None,
            (from, to) => Some(CharRange::Slice(from, to)),
        },
        None => bound(src)?.map(CharRange::Index),
    }
}
