//! Variant attribute resolution for published documents

use crate::line::LineKind;
use wbx_types::BuildVariant;

const APP_SCRIPT: &str = r#"type="text/javascript" name="app""#;

/// Resolve `srcDev`/`srcProd` on scripts and `hrefDev`/`hrefProd` on links
/// for `variant`. The matching value replaces the plain attribute, and both
/// variant attributes are removed. Lines carrying `marker` and every other
/// line are left alone.
#[must_use]
pub fn resolve_variant_attributes(text: &str, variant: BuildVariant, marker: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.contains(marker) {
                return line.to_string();
            }
            match LineKind::of(line) {
                LineKind::Link => resolve_attribute(line, "href", variant),
                LineKind::Script => resolve_attribute(line, "src", variant),
                _ => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Published copy of the entry document: marker attributes and the app
/// script name are removed.
#[must_use]
pub fn strip_managed(text: &str, marker: &str) -> String {
    text.replace(&format!(" {marker}"), "")
        .replace(APP_SCRIPT, r#"type="text/javascript""#)
}

fn resolve_attribute(line: &str, attribute: &str, variant: BuildVariant) -> String {
    let keep = format!("{attribute}{}", variant.attribute_suffix());
    let other = format!("{attribute}{}", variant.opposite().attribute_suffix());
    let mut line = line.to_string();

    if let Some(value) = attribute_value(&line, &keep).map(str::to_string) {
        line = remove_attribute(&line, &keep);
        line = match attribute_value(&line, attribute) {
            Some(current) => line.replacen(
                &format!(" {attribute}=\"{current}\""),
                &format!(" {attribute}=\"{value}\""),
                1,
            ),
            None => insert_attribute(&line, attribute, &value),
        };
    }
    if attribute_value(&line, &other).is_some() {
        line = remove_attribute(&line, &other);
    }
    line
}

/// Value of ` name="..."` in `line`
fn attribute_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {name}=\"");
    let start = line.find(&needle)? + needle.len();
    let len = line[start..].find('"')?;
    Some(&line[start..start + len])
}

fn remove_attribute(line: &str, name: &str) -> String {
    match attribute_value(line, name) {
        Some(value) => line.replacen(&format!(" {name}=\"{value}\""), "", 1),
        None => line.to_string(),
    }
}

fn insert_attribute(line: &str, name: &str, value: &str) -> String {
    let indent = line.len() - line.trim_start().len();
    let tag_end = line[indent..]
        .find(|c: char| c.is_whitespace() || c == '>')
        .map_or(line.len(), |i| indent + i);
    format!(
        "{} {name}=\"{value}\"{}",
        &line[..tag_end],
        &line[tag_end..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = r#"managed-by="wbx""#;

    #[test]
    fn keeps_the_requested_variant() {
        let line = r#"    <script src="/a.js" srcDev="/a.dev.js" srcProd="/a.min.js"></script>"#;
        assert_eq!(
            resolve_variant_attributes(line, BuildVariant::Debug, MARKER),
            r#"    <script src="/a.dev.js"></script>"#
        );
        assert_eq!(
            resolve_variant_attributes(line, BuildVariant::Release, MARKER),
            r#"    <script src="/a.min.js"></script>"#
        );
    }

    #[test]
    fn links_use_href_and_missing_plain_attribute_is_added() {
        let line = r#"<link rel="stylesheet" hrefProd="/s.min.css" hrefDev="/s.css">"#;
        assert_eq!(
            resolve_variant_attributes(line, BuildVariant::Release, MARKER),
            r#"<link href="/s.min.css" rel="stylesheet">"#
        );
    }

    #[test]
    fn other_variant_alone_is_removed() {
        let line = r#"<script src="/a.js" srcProd="/a.min.js"></script>"#;
        assert_eq!(
            resolve_variant_attributes(line, BuildVariant::Debug, MARKER),
            r#"<script src="/a.js"></script>"#
        );
    }

    #[test]
    fn managed_and_unrelated_lines_are_untouched() {
        let text = format!(
            "<script {MARKER} src=\"/a.js\" srcDev=\"/b.js\"></script>\n<img src=\"/x.png\" srcDev=\"/y.png\">\n<script data-src=\"/q.js\"></script>"
        );
        assert_eq!(
            resolve_variant_attributes(&text, BuildVariant::Debug, MARKER),
            text
        );
    }

    #[test]
    fn published_entry_document_loses_markers() {
        let text = format!(
            "<html {MARKER} lang=\"en-US\">\n        <script {MARKER} type=\"text/javascript\" name=\"app\" src=\"/app.js\" async></script>"
        );
        assert_eq!(
            strip_managed(&text, MARKER),
            "<html lang=\"en-US\">\n        <script type=\"text/javascript\" src=\"/app.js\" async></script>"
        );
    }
}
