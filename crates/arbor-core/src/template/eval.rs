use super::{CharRange, FieldRef, Segment, Template, Ternary};
use crate::{Document, Error, Value};

impl Template {
    /// Renders the template against an assembled document.
    ///
    /// Missing paths render as the empty string. A ternary whose condition
    /// failed to parse renders its else branch and logs a warning.
    pub fn render(&self, doc: &Document) -> String {
        let mut out = String::new();
        self.render_into(doc, &mut out);
        out
    }

    fn render_into(&self, doc: &Document, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => render_field(field, doc, out),
                Segment::Ternary(ternary) => render_ternary(ternary, doc, out),
            }
        }
    }
}

fn lookup<'a>(doc: &'a Document, path: &[String]) -> Option<&'a Value> {
    doc.get_segments(path.iter().map(String::as_str))
}

fn render_field(field: &FieldRef, doc: &Document, out: &mut String) {
    let text = lookup(doc, &field.path)
        .map(Value::to_text)
        .unwrap_or_default();

    match field.range {
        None => out.push_str(&text),
        Some(range) => out.extend(apply_range(&text, range)),
    }
}

fn render_ternary(ternary: &Ternary, doc: &Document, out: &mut String) {
    let holds = match &ternary.condition {
        Ok(condition) => condition.eval(lookup(doc, condition.path())),
        Err(reason) => {
            let err = Error::formatter(&ternary.source, reason);
            tracing::warn!(error = %err, "ternary condition did not parse; using else branch");
            false
        }
    };

    let branch = if holds {
        &ternary.then
    } else {
        &ternary.otherwise
    };
    branch.render_into(doc, out);
}

/// Indexes or slices `text` by code point. Anything out of range yields an
/// empty result.
fn apply_range(text: &str, range: CharRange) -> Vec<char> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    match range {
        CharRange::Index(i) => chars.get(i).copied().into_iter().collect(),
        CharRange::Slice(from, to) => {
            let from = from.unwrap_or(0);
            let to = to.unwrap_or(len);

            if to <= from || to > len {
                vec![]
            } else {
                chars[from..to].to_vec()
            }
        }
    }
}
