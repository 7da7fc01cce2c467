//! Line classification and multi-line unit scanning

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
    Root,
    Title,
    Meta,
    Link,
    Script,
    HeadClose,
    Frame,
    BodyOpen,
    Other,
}

impl LineKind {
    pub(crate) fn of(line: &str) -> Self {
        let trimmed = line.trim_start();
        if trimmed.starts_with("<html") {
            Self::Root
        } else if trimmed.starts_with("<title") {
            Self::Title
        } else if trimmed.starts_with("<meta") {
            Self::Meta
        } else if trimmed.starts_with("<link") {
            Self::Link
        } else if trimmed.starts_with("<script") {
            Self::Script
        } else if trimmed.starts_with("<iframe") {
            Self::Frame
        } else if trimmed.starts_with("<body") {
            Self::BodyOpen
        } else if line.contains(HEAD_CLOSE) {
            Self::HeadClose
        } else {
            Self::Other
        }
    }

    fn closing_marker(self) -> Option<&'static str> {
        match self {
            Self::Title => Some("</title>"),
            Self::Script => Some("</script>"),
            Self::Frame => Some("</iframe>"),
            Self::Meta | Self::Link => Some(">"),
            _ => None,
        }
    }
}

pub(crate) const HEAD_CLOSE: &str = "</head>";

/// One tag, possibly spanning several lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Unit {
    pub kind: LineKind,
    pub lines: Range<usize>,
    pub managed: bool,
}

impl Unit {
    pub(crate) fn text<'a>(&self, lines: &'a [String]) -> &'a [String] {
        &lines[self.lines.clone()]
    }
}

/// Group `lines` into units. A tag whose closing marker is not on its first
/// line extends to the first later line containing it; when no later line
/// does, the unit is the first line alone.
pub(crate) fn scan_units(lines: &[String], marker: &str) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut index = 0;
    while index < lines.len() {
        let kind = LineKind::of(&lines[index]);
        let end = match kind.closing_marker() {
            Some(closing) if !closed_on_first_line(&lines[index], closing) => lines[index + 1..]
                .iter()
                .position(|line| line.contains(closing))
                .map_or(index + 1, |offset| index + offset + 2),
            _ => index + 1,
        };
        let managed = lines[index..end].iter().any(|line| line.contains(marker));
        units.push(Unit {
            kind,
            lines: index..end,
            managed,
        });
        index = end;
    }
    units
}

fn closed_on_first_line(line: &str, closing: &str) -> bool {
    // skip the opening `<` so a lone `>` marker is searched after the tag name
    let trimmed = line.trim_start();
    trimmed.get(1..).is_some_and(|rest| rest.contains(closing))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = r#"managed-by="wbx""#;

    fn lines(text: &str) -> Vec<String> {
        text.split('\n').map(str::to_string).collect()
    }

    #[test]
    fn classifies_by_leading_tag() {
        assert_eq!(LineKind::of(r#"<html lang="en">"#), LineKind::Root);
        assert_eq!(LineKind::of("  <title>x</title>"), LineKind::Title);
        assert_eq!(LineKind::of("\t<meta charset=\"utf-8\">"), LineKind::Meta);
        assert_eq!(LineKind::of("<link rel=icon>"), LineKind::Link);
        assert_eq!(LineKind::of("<script></script>"), LineKind::Script);
        assert_eq!(LineKind::of("    </head>"), LineKind::HeadClose);
        assert_eq!(LineKind::of("<iframe id=\"splash\">"), LineKind::Frame);
        assert_eq!(LineKind::of("  <body class=\"x\">"), LineKind::BodyOpen);
        assert_eq!(LineKind::of("    <head>"), LineKind::Other);
        assert_eq!(LineKind::of("<header>"), LineKind::Other);
    }

    #[test]
    fn multi_line_tags_form_one_unit() {
        let text = lines(&format!(
            "<title>\n  Hello\n</title>\n<script>\n  let {MARKER};\n</script>\n<meta\n  charset=\"utf-8\">\n<p>"
        ));
        let units = scan_units(&text, MARKER);
        let spans: Vec<_> = units.iter().map(|u| (u.kind, u.lines.clone(), u.managed)).collect();
        assert_eq!(
            spans,
            vec![
                (LineKind::Title, 0..3, false),
                (LineKind::Script, 3..6, true),
                (LineKind::Meta, 6..8, false),
                (LineKind::Other, 8..9, false),
            ]
        );
    }

    #[test]
    fn unterminated_tag_is_limited_to_its_first_line() {
        let text = lines("<iframe src=\"a\">\n<p>\n</body>");
        let units = scan_units(&text, MARKER);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].lines, 0..1);
        assert_eq!(units[0].kind, LineKind::Frame);
    }
}
