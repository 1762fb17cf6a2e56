//! Placeholder templates.
//!
//! Formatter fields, nested fields, and computable SQL expressions all embed
//! `{path}` placeholders. Formatter templates additionally support index and
//! slice suffixes (`{name}[0]`, `{name}[1..3]`) and ternaries
//! (`{? active ? Yes : No}`).

mod condition;
pub use condition::{CmpOp, Condition, Literal};

mod eval;

mod lexer;
use lexer::Lexer;

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text copied to the output verbatim
    Literal(String),

    /// `{path}` with an optional `[i]` / `[i..j]` suffix
    Field(FieldRef),

    /// `{? condition ? then : else}`
    Ternary(Ternary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// Dotted path split into segments
    pub path: Vec<String>,

    /// Code point index or slice applied to the stringified value
    pub range: Option<CharRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharRange {
    /// `[i]`
    Index(usize),

    /// `[i..j]`, `[i..]`, `[..j]`
    Slice(Option<usize>, Option<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ternary {
    /// The condition, or the reason it failed to parse
    pub condition: Result<Condition, String>,
    pub then: Template,
    pub otherwise: Template,

    /// Original token text, kept for diagnostics
    pub source: String,
}

/// Which constructs the parser recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    /// Placeholders, index/slice suffixes, and ternaries
    Format,

    /// Bare `{path}` placeholders only. Used for SQL expressions, where
    /// brackets and `?` carry their own meaning.
    Placeholders,
}

impl Template {
    /// Parses a formatter template. Parsing never fails: malformed tokens are
    /// kept as literal text, and unparseable ternary conditions are recorded
    /// so that evaluation falls back to the else branch.
    pub fn parse(src: &str) -> Template {
        Lexer::new(src, Syntax::Format).parse()
    }

    /// Parses a SQL expression template, recognizing only `{path}` placeholders.
    pub fn parse_placeholders(src: &str) -> Template {
        Lexer::new(src, Syntax::Placeholders).parse()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` if the template contains anything other than literal text.
    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| !matches!(segment, Segment::Literal(_)))
    }

    /// If the template is exactly one `{path}` placeholder with no suffix,
    /// returns that path.
    pub fn as_single_field(&self) -> Option<&[String]> {
        match &self.segments[..] {
            [Segment::Field(FieldRef { path, range: None })] => Some(path),
            _ => None,
        }
    }

    /// Every field path referenced by the template, including those inside
    /// ternary conditions and branches, in order of appearance.
    pub fn field_paths(&self) -> Vec<&[String]> {
        let mut out = vec![];
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a [String]>) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(_) => {}
                Segment::Field(field) => out.push(&field.path),
                Segment::Ternary(ternary) => {
                    if let Ok(condition) = &ternary.condition {
                        out.push(condition.path());
                    }
                    ternary.then.collect_paths(out);
                    ternary.otherwise.collect_paths(out);
                }
            }
        }
    }

    /// Rewrites every placeholder through `f`, keeping literal text. Used to
    /// turn computable expressions into SQL.
    pub fn rewrite<E>(&self, mut f: impl FnMut(&[String]) -> Result<String, E>) -> Result<String, E> {
        let mut out = String::new();
        self.rewrite_into(&mut out, &mut f)?;
        Ok(out)
    }

    fn rewrite_into<E>(
        &self,
        out: &mut String,
        f: &mut impl FnMut(&[String]) -> Result<String, E>,
    ) -> Result<(), E> {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(&f(&field.path)?),
                Segment::Ternary(ternary) => out.push_str(&ternary.source),
            }
        }
        Ok(())
    }
}

/// Returns `true` if `src` contains a `{path}` placeholder or a ternary.
pub fn has_placeholders(src: &str) -> bool {
    Template::parse(src).has_placeholders()
}
