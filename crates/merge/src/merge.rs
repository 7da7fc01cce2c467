//! The merge of managed fragments into existing document lines

use crate::fragments::Fragments;
use crate::line::{scan_units, LineKind, Unit, HEAD_CLOSE};

const SPLASH_ID: &str = r#"id="splash""#;
const BODY_CLOSE: &str = "</body>";

/// What a merge did to the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// The document was generated from scratch
    pub generated: bool,
    /// Families whose fresh fragment took the place of existing lines
    pub replaced: usize,
    /// Families inserted because the document had none of their tags
    pub inserted: usize,
    /// Stale generator-owned units removed
    pub dropped: usize,
    /// Generated metas left out in favour of authored ones
    pub suppressed: usize,
    /// The merged text differs from the input
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub text: String,
    pub report: MergeReport,
}

#[derive(Debug, Default)]
struct Families {
    title: bool,
    meta: bool,
    link: bool,
    script: bool,
    splash: bool,
}

/// Merge `fragments` into `existing`, or generate a fresh document when
/// `existing` is `None`.
#[must_use]
pub fn merge(existing: Option<&str>, fragments: &Fragments) -> MergeOutcome {
    let Some(existing) = existing else {
        return MergeOutcome {
            text: fragments.generate(),
            report: MergeReport {
                generated: true,
                changed: true,
                ..MergeReport::default()
            },
        };
    };

    let marker = fragments.marker();
    let mut lines: Vec<String> = existing.split('\n').map(str::to_string).collect();
    let units = scan_units(&lines, marker);

    let present = families_of(&units, &lines);
    let authored_metas: Vec<String> = units
        .iter()
        .filter(|unit| unit.kind == LineKind::Meta && !unit.managed)
        .map(|unit| unit.text(&lines).join("\n"))
        .collect();
    let (metas, suppressed) = fragments.meta_lines(&authored_metas);
    let links = fragments.link_lines();
    let scripts = fragments.script_lines();

    let mut missing = Vec::new();
    if !present.title {
        missing.push(fragments.title_line());
    }
    if !present.meta {
        missing.extend(metas.iter().cloned());
    }
    if !present.link {
        missing.extend(links.iter().cloned());
    }
    if !present.script {
        missing.extend(scripts.iter().cloned());
    }

    let units = if !missing.is_empty() && split_head_close(&mut lines) {
        scan_units(&lines, marker)
    } else {
        units
    };

    let mut report = MergeReport {
        suppressed,
        ..MergeReport::default()
    };
    let mut done = Families::default();
    let mut head_closed = false;
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + missing.len());

    for unit in &units {
        let text = unit.text(&lines);
        match unit.kind {
            LineKind::Root if unit.managed => {
                let updated = update_lang(&text[0], fragments.lang());
                if updated != text[0] {
                    report.replaced += 1;
                }
                out.push(updated);
                out.extend(text[1..].iter().cloned());
            }
            LineKind::Title if unit.managed => {
                if done.title {
                    report.dropped += 1;
                } else {
                    done.title = true;
                    report.replaced += 1;
                    out.push(fragments.title_line());
                }
            }
            LineKind::Meta | LineKind::Link | LineKind::Script => {
                let (flag, fresh) = match unit.kind {
                    LineKind::Meta => (&mut done.meta, &metas),
                    LineKind::Link => (&mut done.link, &links),
                    _ => (&mut done.script, &scripts),
                };
                let first = !*flag;
                if first {
                    *flag = true;
                    report.replaced += 1;
                    out.extend(fresh.iter().cloned());
                }
                if !unit.managed {
                    out.extend(text.iter().cloned());
                } else if !first && !(text.len() == 1 && fresh.contains(&text[0])) {
                    report.dropped += 1;
                }
            }
            LineKind::Frame if unit.managed => {
                if done.splash {
                    report.dropped += 1;
                } else {
                    done.splash = true;
                    match fragments.splash_line() {
                        Some(splash) => {
                            report.replaced += 1;
                            out.push(splash.to_string());
                        }
                        None => report.dropped += 1,
                    }
                }
            }
            LineKind::HeadClose if !head_closed => {
                head_closed = true;
                if !missing.is_empty() {
                    report.inserted += 1;
                    out.append(&mut missing);
                }
                out.extend(text.iter().cloned());
            }
            LineKind::BodyOpen if !present.splash && !done.splash => {
                done.splash = true;
                let line = &text[0];
                match fragments.splash_line() {
                    Some(splash) => {
                        report.inserted += 1;
                        if let Some((open, rest)) = line.split_once(BODY_CLOSE) {
                            out.push(open.to_string());
                            out.push(splash.to_string());
                            out.push(format!("{}{BODY_CLOSE}{rest}", indent_of(line)));
                        } else {
                            out.push(line.clone());
                            out.push(splash.to_string());
                        }
                    }
                    None => out.push(line.clone()),
                }
                out.extend(text[1..].iter().cloned());
            }
            _ => out.extend(text.iter().cloned()),
        }
    }

    let text = out.join("\n");
    report.changed = text != existing;
    MergeOutcome { text, report }
}

fn families_of(units: &[Unit], lines: &[String]) -> Families {
    let mut families = Families::default();
    for unit in units {
        match unit.kind {
            LineKind::Title => families.title = true,
            LineKind::Meta => families.meta = true,
            LineKind::Link => families.link = true,
            LineKind::Script => families.script = true,
            LineKind::Frame => {
                if unit.text(lines).iter().any(|line| line.contains(SPLASH_ID)) {
                    families.splash = true;
                }
            }
            _ => {}
        }
    }
    families
}

/// Move a `</head>` that follows other content onto its own line so missing
/// families can be inserted in front of it. Returns whether a line was split.
fn split_head_close(lines: &mut Vec<String>) -> bool {
    let Some(index) = lines.iter().position(|line| line.contains(HEAD_CLOSE)) else {
        return false;
    };
    let line = &lines[index];
    let Some(position) = line.find(HEAD_CLOSE) else {
        return false;
    };
    let (before, after) = line.split_at(position);
    if before.trim().is_empty() {
        return false;
    }
    let head = format!("{}{after}", indent_of(line));
    let before = before.trim_end().to_string();
    lines[index] = before;
    lines.insert(index + 1, head);
    true
}

fn update_lang(line: &str, lang: &str) -> String {
    const ATTR: &str = "lang=\"";
    if let Some(start) = line.find(ATTR).map(|i| i + ATTR.len()) {
        if let Some(len) = line[start..].find('"') {
            if &line[start..start + len] == lang {
                return line.to_string();
            }
            return format!("{}{lang}{}", &line[..start], &line[start + len..]);
        }
        return line.to_string();
    }
    line.replacen("<html", &format!("<html lang=\"{lang}\""), 1)
}

fn indent_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}
