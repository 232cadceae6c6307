
use scraper::{Html, Node};
use tracing::debug;

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Extract the visible text of an HTML document.
///
/// Every text node outside of script-like elements is whitespace-normalized,
/// empty nodes are dropped and the remainder is joined with newlines.
#[inline]
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let lines: Vec<String> = document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
                    Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
                    _ => false,
                });
                if hidden {
                    None
                } else {
                    let normalized = normalize_whitespace(text);
                    (!normalized.is_empty()).then_some(normalized)
                }
            }
            _ => None,
        })
        .collect();

    let text = lines.join("\n");
    debug!(
        "Extracted {} text nodes ({} chars) from {} bytes of HTML",
        lines.len(),
        text.len(),
        html.len()
    );
    text
}

/// Collapse every run of whitespace into a single space and trim the ends
#[inline]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
