//! Search-text synthesis
//!
//! Every record is embedded through one synthesized sentence. The sentence is
//! rendered from the record's display fields by a fixed [`SearchTemplate`], so
//! two records with identical field values always get identical search text.
//!
//! Missing fields never fail a load: the template substitutes the schema's
//! default for that field, or `"<field> 정보 없음"` when none is configured.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A compiled sentence template with `{field}` placeholders.
///
/// `{{` and `}}` render literal braces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SearchTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl SearchTemplate {
    /// Parse a template such as `"{이름}는 {시대} 시대의 {종류}이며, {주소}에 있다."`
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(Error::InvalidTemplate(format!(
                            "unterminated placeholder in '{}'",
                            source
                        )));
                    }
                    let name = name.trim();
                    if name.is_empty() || name.contains('{') {
                        return Err(Error::InvalidTemplate(format!(
                            "empty or nested placeholder in '{}'",
                            source
                        )));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.to_string()));
                }
                '}' => {
                    return Err(Error::InvalidTemplate(format!(
                        "unmatched '}}' in '{}'",
                        source
                    )));
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// A template that renders one field verbatim.
    pub fn field(name: &str) -> Self {
        Self::builder().field(name).build()
    }

    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in template order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template against a record's display fields.
    pub fn render(&self, display: &Map<String, Value>, defaults: &BTreeMap<String, String>) -> String {
        let mut out = String::with_capacity(self.source.len() * 2);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => match scalar_text(display.get(name)) {
                    Some(value) => out.push_str(&value),
                    None => {
                        tracing::trace!(field = %name, "field missing, rendering default");
                        out.push_str(&default_for(defaults, name));
                    }
                },
            }
        }
        out
    }
}

impl TryFrom<String> for SearchTemplate {
    type Error = Error;

    fn try_from(source: String) -> Result<Self> {
        Self::parse(&source)
    }
}

impl From<SearchTemplate> for String {
    fn from(template: SearchTemplate) -> Self {
        template.source
    }
}

/// Infallible template construction for templates known at compile time
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    source: String,
    segments: Vec<Segment>,
}

impl TemplateBuilder {
    pub fn literal(mut self, text: &str) -> Self {
        for c in text.chars() {
            match c {
                '{' => self.source.push_str("{{"),
                '}' => self.source.push_str("}}"),
                _ => self.source.push(c),
            }
        }
        match self.segments.last_mut() {
            Some(Segment::Literal(prev)) => prev.push_str(text),
            _ => self.segments.push(Segment::Literal(text.to_string())),
        }
        self
    }

    pub fn field(mut self, name: &str) -> Self {
        self.source.push('{');
        self.source.push_str(name);
        self.source.push('}');
        self.segments.push(Segment::Field(name.to_string()));
        self
    }

    pub fn build(self) -> SearchTemplate {
        SearchTemplate {
            source: self.source,
            segments: self.segments,
        }
    }
}

/// Text of a scalar JSON value. Null, empty strings, arrays and objects count
/// as missing.
pub fn scalar_text(value: Option<&Value>) -> Option<Cow<'_, str>> {
    match value? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(Cow::Borrowed(s.trim())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The placeholder rendered for a missing field.
pub fn default_for<'a>(defaults: &'a BTreeMap<String, String>, field: &str) -> Cow<'a, str> {
    match defaults.get(field) {
        Some(value) => Cow::Borrowed(value.as_str()),
        None => Cow::Owned(format!("{} 정보 없음", field)),
    }
}
