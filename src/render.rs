//! Rendering of resolved documents into display markup.
//!
//! This is a collaborator of the prediction service, not part of the
//! resolver core: the façade hands it a [`ResolvedDocument`] and caches
//! whatever artifact it returns.

use crate::ensemble::ResolvedDocument;

pub trait Renderer: Send + Sync {
    fn render(&self, document: &ResolvedDocument) -> String;
}

/// Renders entities as `<mark>` spans over the escaped source text.
#[derive(Debug, Default, Clone)]
pub struct MarkupRenderer;

impl MarkupRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for MarkupRenderer {
    fn render(&self, document: &ResolvedDocument) -> String {
        let mut spans: Vec<_> = document.entities.iter().collect();
        spans.sort_by_key(|entity| (entity.start, entity.end));

        let chars: Vec<char> = document.text.chars().collect();
        let mut html = String::from("<div class=\"entities\">");
        let mut cursor = 0;

        for entity in spans {
            // Overlapping or out-of-range spans are dropped rather than
            // producing broken markup.
            if entity.start < cursor || entity.end > chars.len() || entity.start >= entity.end {
                continue;
            }
            push_escaped(&mut html, &chars[cursor..entity.start]);
            html.push_str("<mark class=\"entity\" data-label=\"");
            html.push_str(&escape(&entity.label));
            html.push_str("\">");
            push_escaped(&mut html, &chars[entity.start..entity.end]);
            html.push_str("</mark>");
            cursor = entity.end;
        }
        push_escaped(&mut html, &chars[cursor..]);
        html.push_str("</div>");
        html
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped_char(&mut escaped, c);
    }
    escaped
}

fn push_escaped(html: &mut String, chars: &[char]) {
    for &c in chars {
        push_escaped_char(html, c);
    }
}

fn push_escaped_char(html: &mut String, c: char) {
    match c {
        '&' => html.push_str("&amp;"),
        '<' => html.push_str("&lt;"),
        '>' => html.push_str("&gt;"),
        '"' => html.push_str("&quot;"),
        _ => html.push(c),
    }
}

#[cfg(test)]
mod tests {
    use crate::ensemble::CanonicalEntity;

    use super::*;

    fn entity(text: &str, label: &str, start: usize, end: usize) -> CanonicalEntity {
        CanonicalEntity {
            text: text.to_string(),
            label: label.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn render_wraps_entities_in_marks() {
        let document = ResolvedDocument {
            text: "Renault investit à Nantes".to_string(),
            entities: vec![
                entity("Renault", "ORG", 0, 7),
                entity("Nantes", "LOC", 19, 25),
            ],
        };

        let html = MarkupRenderer::new().render(&document);

        assert_eq!(
            html,
            "<div class=\"entities\"><mark class=\"entity\" data-label=\"ORG\">Renault</mark> \
             investit à <mark class=\"entity\" data-label=\"LOC\">Nantes</mark></div>"
        );
    }

    #[test]
    fn render_escapes_markup_in_text() {
        let document = ResolvedDocument {
            text: "a < b & Renault".to_string(),
            entities: vec![entity("Renault", "ORG", 8, 15)],
        };

        let html = MarkupRenderer::new().render(&document);

        assert!(html.contains("a &lt; b &amp; "));
        assert!(html.contains("<mark class=\"entity\" data-label=\"ORG\">Renault</mark>"));
    }

    #[test]
    fn render_drops_overlapping_and_out_of_range_spans() {
        let document = ResolvedDocument {
            text: "Renault".to_string(),
            entities: vec![
                entity("Renault", "ORG", 0, 7),
                entity("enault", "ORG", 1, 7),
                entity("hors", "LOC", 5, 99),
            ],
        };

        let html = MarkupRenderer::new().render(&document);

        assert_eq!(
            html,
            "<div class=\"entities\"><mark class=\"entity\" data-label=\"ORG\">Renault</mark></div>"
        );
    }

    #[test]
    fn render_without_entities_returns_escaped_text() {
        let document = ResolvedDocument {
            text: "Rien à signaler".to_string(),
            entities: vec![],
        };

        let html = MarkupRenderer::new().render(&document);

        assert_eq!(html, "<div class=\"entities\">Rien à signaler</div>");
    }
}
