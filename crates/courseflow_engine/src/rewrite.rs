use std::path::Path;

use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::repository::{CourseRepository, RepositoryError};
use crate::resolver::{AssetResolver, ResolveError};

/// Header levels checked for title duplication, largest first.
const HEADER_LEVELS: [&str; 3] = ["h1", "h2", "h3"];

/// Style class added to every image for fluid layout.
const RESPONSIVE_IMAGE_CLASS: &str = "img-responsive";

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Turns raw archived item markup into publish-safe HTML.
///
/// The input is parsed once and re-serialized in a single walk; asset and
/// image references are rewritten through the resolver on the way out.
/// Unknown asset identifiers leave their element unconverted, because
/// archival and publishing are decoupled and partial archives are expected.
pub struct ContentRewriter<'a> {
    repo: &'a CourseRepository,
    resolver: &'a mut AssetResolver,
}

impl<'a> ContentRewriter<'a> {
    pub fn new(repo: &'a CourseRepository, resolver: &'a mut AssetResolver) -> Self {
        Self { repo, resolver }
    }

    pub fn rewrite(
        &mut self,
        raw_markup: &str,
        course_slug: &str,
        item_name: &str,
    ) -> Result<String, RewriteError> {
        let normalized = normalize_leading_colons(raw_markup);
        let fragment = Html::parse_fragment(&normalized);
        let doomed_header = find_title_header(&fragment, item_name);

        let mut out = String::new();
        for child in fragment.root_element().children() {
            self.emit_node(child, course_slug, doomed_header, &mut out)?;
        }
        Ok(unescape_entities(&out))
    }

    fn emit_node(
        &mut self,
        node: NodeRef<'_, Node>,
        course_slug: &str,
        doomed_header: Option<NodeId>,
        out: &mut String,
    ) -> Result<(), RewriteError> {
        match node.value() {
            Node::Text(text) => {
                push_escaped_text(out, text);
                Ok(())
            }
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
                Ok(())
            }
            Node::Element(_) => {
                if doomed_header == Some(node.id()) {
                    // Header repeating the item title: dropped with its
                    // entire subtree.
                    return Ok(());
                }
                let Some(element) = ElementRef::wrap(node) else {
                    return Ok(());
                };
                match element.value().name() {
                    "asset" => self.emit_asset(element, course_slug, doomed_header, out),
                    "img" => self.emit_image(element, course_slug, out),
                    _ => self.emit_generic(element, course_slug, doomed_header, out),
                }
            }
            _ => Ok(()),
        }
    }

    fn emit_generic(
        &mut self,
        element: ElementRef<'_>,
        course_slug: &str,
        doomed_header: Option<NodeId>,
        out: &mut String,
    ) -> Result<(), RewriteError> {
        let name = element.value().name();
        out.push('<');
        out.push_str(name);
        for (attr, value) in element.value().attrs() {
            push_attribute(out, attr, value);
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&name) {
            return Ok(());
        }
        for child in element.children() {
            self.emit_node(child, course_slug, doomed_header, out)?;
        }
        out.push_str("</");
        out.push_str(name);
        out.push('>');
        Ok(())
    }

    /// Convert an `<asset>` element into a download link. The original
    /// attributes are kept; a human-readable label gains the file extension
    /// in parentheses when the visible name doesn't already carry it.
    fn emit_asset(
        &mut self,
        element: ElementRef<'_>,
        course_slug: &str,
        doomed_header: Option<NodeId>,
        out: &mut String,
    ) -> Result<(), RewriteError> {
        let attrs = element.value();
        let (Some(asset_id), Some(extension), Some(name)) = (
            attrs.attr("id"),
            attrs.attr("extension"),
            attrs.attr("name"),
        ) else {
            log::warn!("asset element missing id/extension/name attributes; left as is");
            return self.emit_generic(element, course_slug, doomed_header, out);
        };

        let Some(record) = self.repo.course_asset(asset_id)? else {
            log::debug!("unknown asset reference '{asset_id}'; element left unconverted");
            return self.emit_generic(element, course_slug, doomed_header, out);
        };

        let url = self
            .resolver
            .resolve(course_slug, Path::new(&record.saved_path), None)?;

        let dotted = format!(".{}", extension.trim_start_matches('.'));
        let mut label = name.to_string();
        if !label.ends_with(&dotted) {
            label.push_str(&format!("({extension})"));
        }

        out.push_str("<a");
        for (attr, value) in element.value().attrs() {
            push_attribute(out, attr, value);
        }
        push_attribute(out, "href", &url);
        push_attribute(out, "target", "_blank");
        out.push('>');
        push_escaped_text(out, &label);
        for child in element.children() {
            self.emit_node(child, course_slug, doomed_header, out)?;
        }
        out.push_str("</a>");
        Ok(())
    }

    /// Every image gets the responsive style class; the source URL is
    /// rewritten only when an asset identifier is present and known.
    fn emit_image(
        &mut self,
        element: ElementRef<'_>,
        course_slug: &str,
        out: &mut String,
    ) -> Result<(), RewriteError> {
        let mut resolved_src = None;
        if let Some(asset_id) = element.value().attr("assetid") {
            match self.repo.course_asset(asset_id)? {
                Some(record) => {
                    resolved_src = Some(self.resolver.resolve(
                        course_slug,
                        Path::new(&record.saved_path),
                        None,
                    )?);
                }
                None => {
                    log::debug!("unknown image asset reference '{asset_id}'; src kept");
                }
            }
        }

        out.push_str("<img");
        let mut saw_class = false;
        for (attr, value) in element.value().attrs() {
            match attr {
                "class" => {
                    saw_class = true;
                    let value = append_class(value, RESPONSIVE_IMAGE_CLASS);
                    push_attribute(out, "class", &value);
                }
                "src" => {
                    push_attribute(out, "src", resolved_src.as_deref().unwrap_or(value));
                }
                _ => push_attribute(out, attr, value),
            }
        }
        if !saw_class {
            push_attribute(out, "class", RESPONSIVE_IMAGE_CLASS);
        }
        out.push('>');
        Ok(())
    }
}

/// Locate the header element to strip: levels are scanned largest to
/// smallest, scanning stops at the first level present in the document, and
/// only that level's first element is compared against the item name.
fn find_title_header(fragment: &Html, item_name: &str) -> Option<NodeId> {
    for level in HEADER_LEVELS {
        let Ok(selector) = Selector::parse(level) else {
            continue;
        };
        if let Some(header) = fragment.select(&selector).next() {
            if normalize_header_text(&header.inner_html()) == item_name {
                return Some(header.id());
            }
            return None;
        }
    }
    None
}

/// Collapse any newline followed by whitespace and a colon into a bare
/// colon. Downstream markup consumers misread colon-at-start-of-line
/// sequences. Idempotent.
pub fn normalize_leading_colons(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\n' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && chars[j] == ':' {
                out.push(':');
                i = j + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn normalize_header_text(inner: &str) -> String {
    inner.replace('\n', " ").replace("  ", " ").trim().to_string()
}

fn append_class(existing: &str, class: &str) -> String {
    if existing.split_whitespace().any(|candidate| candidate == class) {
        existing.to_string()
    } else if existing.is_empty() {
        class.to_string()
    } else {
        format!("{existing} {class}")
    }
}

fn push_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out.push('"');
}

/// Decode HTML entities in the serialized output exactly once. Handles the
/// named entities that occur in archived markup plus numeric references;
/// anything unrecognized is left alone.
pub fn unescape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match decode_entity(rest) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one entity at the start of `text` (which begins with `&`),
/// returning the character and the number of bytes consumed.
fn decode_entity(text: &str) -> Option<(char, usize)> {
    let end = text[1..].find(';')? + 1;
    if end > 32 {
        return None;
    }
    let body = &text[1..end];
    let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        char::from_u32(u32::from_str_radix(hex, 16).ok()?)?
    } else if let Some(dec) = body.strip_prefix('#') {
        char::from_u32(dec.parse().ok()?)?
    } else {
        match body {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            _ => return None,
        }
    };
    Some((decoded, end + 1))
}
