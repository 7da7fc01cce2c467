//! Generator-owned fragments of the entry document

use std::fmt::Write as _;
use wbx_errors::DocumentError;
use wbx_types::{AttrValue, Attributes, DocumentSpec, SplashSpec};

pub const DEFAULT_SPLASH_STYLE: &str = "height:100.0%;position:absolute;width:100.0%";

const BLOCK_INDENT: &str = "    ";
const ITEM_INDENT: &str = "        ";

/// Everything the generator owns in the entry document, rendered on demand
#[derive(Debug, Clone)]
pub struct Fragments {
    marker: String,
    lang: String,
    title: String,
    metas: Vec<Attributes>,
    links: Vec<Attributes>,
    scripts: Vec<Attributes>,
    manifest_href: Option<String>,
    app_script: Option<String>,
    splash: Option<String>,
}

impl Fragments {
    /// Fragments described by `spec`, tagged with `marker`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidSplash`] if the splash sets both or
    /// neither of `path` and `body`.
    pub fn new(spec: &DocumentSpec, marker: impl Into<String>) -> Result<Self, DocumentError> {
        let marker = marker.into();
        let splash = spec
            .splash
            .as_ref()
            .map(|splash| render_splash(&marker, splash))
            .transpose()?;

        Ok(Self {
            lang: spec.lang.clone(),
            title: spec.title.clone(),
            metas: spec.metas.clone(),
            links: spec.links.clone(),
            scripts: spec.scripts.clone(),
            manifest_href: None,
            app_script: None,
            splash,
            marker,
        })
    }

    /// Add the script tag loading the bundle of `target`
    #[must_use]
    pub fn with_app_script(mut self, target: &str) -> Self {
        self.app_script = Some(format!("/{}.js", target.to_lowercase()));
        self
    }

    /// Add a manifest link pointing at `href`
    #[must_use]
    pub fn with_manifest(mut self, href: impl Into<String>) -> Self {
        self.manifest_href = Some(href.into());
        self
    }

    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// The complete document used when none exists yet
    #[must_use]
    pub fn generate(&self) -> String {
        let mut lines = vec![
            "<!DOCTYPE html>".to_string(),
            self.root_line(),
            format!("{BLOCK_INDENT}<head>"),
            self.title_line(),
        ];
        lines.extend(self.meta_lines(&[]).0);
        lines.extend(self.link_lines());
        lines.extend(self.script_lines());
        lines.push(format!("{BLOCK_INDENT}</head>"));
        lines.push(format!("{BLOCK_INDENT}<body>"));
        lines.extend(self.splash_line().map(str::to_string));
        lines.push(format!("{BLOCK_INDENT}</body>"));
        lines.push("</html>".to_string());

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    pub(crate) fn root_line(&self) -> String {
        format!("<html {} lang=\"{}\">", self.marker, self.lang)
    }

    pub(crate) fn title_line(&self) -> String {
        format!("{ITEM_INDENT}<title {}>{}</title>", self.marker, self.title)
    }

    /// Meta lines, leaving out those an author already wrote by hand. A
    /// generated meta clashes with an authored one when both set `charset`
    /// or both carry the same `name`. Returns the lines and how many were
    /// left out.
    pub(crate) fn meta_lines(&self, authored: &[String]) -> (Vec<String>, usize) {
        let mut lines = Vec::with_capacity(self.metas.len());
        let mut suppressed = 0;
        for meta in &self.metas {
            if authored.iter().any(|line| clashes(meta, line)) {
                suppressed += 1;
            } else {
                lines.push(render_tag(&self.marker, "meta", meta, false));
            }
        }
        (lines, suppressed)
    }

    pub(crate) fn link_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .links
            .iter()
            .map(|link| render_tag(&self.marker, "link", link, false))
            .collect();
        if let Some(href) = &self.manifest_href {
            let manifest = Attributes::from([
                ("rel".to_string(), AttrValue::from("manifest")),
                ("href".to_string(), AttrValue::Text(href.clone())),
            ]);
            lines.push(render_tag(&self.marker, "link", &manifest, false));
        }
        lines
    }

    pub(crate) fn script_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .scripts
            .iter()
            .map(|script| render_tag(&self.marker, "script", script, true))
            .collect();
        if let Some(src) = &self.app_script {
            let attrs = [
                ("type", AttrValue::from("text/javascript")),
                ("name", AttrValue::from("app")),
                ("src", AttrValue::Text(src.clone())),
                ("async", AttrValue::Flag(true)),
            ];
            lines.push(render_tag(
                &self.marker,
                "script",
                attrs.iter().map(|(k, v)| (*k, v)),
                true,
            ));
        }
        lines
    }

    pub(crate) fn splash_line(&self) -> Option<&str> {
        self.splash.as_deref()
    }
}

fn render_tag<'a, K, I>(marker: &str, name: &str, attrs: I, closed: bool) -> String
where
    K: AsRef<str> + 'a,
    I: IntoIterator<Item = (K, &'a AttrValue)>,
{
    let mut tag = format!("{ITEM_INDENT}<{name} {marker}");
    for (key, value) in attrs {
        match value {
            AttrValue::Flag(true) => {
                let _ = write!(tag, " {}", key.as_ref());
            }
            AttrValue::Flag(false) => {}
            AttrValue::Text(text) => {
                let _ = write!(tag, " {}=\"{}\"", key.as_ref(), text.replace('"', "&quot;"));
            }
        }
    }
    tag.push('>');
    if closed {
        let _ = write!(tag, "</{name}>");
    }
    tag
}

fn render_splash(marker: &str, splash: &SplashSpec) -> Result<String, DocumentError> {
    let style = splash
        .iframe_style
        .as_deref()
        .unwrap_or(DEFAULT_SPLASH_STYLE);
    let open = format!(
        "{ITEM_INDENT}<iframe {marker} id=\"splash\" style=\"{style}\" frameBorder=\"0\" seamless"
    );

    match (&splash.path, &splash.body) {
        (Some(path), None) => Ok(format!("{open} src='{path}'></iframe>")),
        (None, Some(body)) => {
            let srcdoc = format!(
                "<html><head>{}{}{}</head><body>{body}</body></html>",
                splash.styles.concat(),
                splash.links.concat(),
                splash.scripts.concat(),
            );
            Ok(format!(
                "{open} srcdoc='{}'></iframe>",
                srcdoc.replace('\'', "&#39;")
            ))
        }
        (Some(_), Some(_)) => Err(DocumentError::InvalidSplash {
            message: "both `path` and `body` are set".to_string(),
        }),
        (None, None) => Err(DocumentError::InvalidSplash {
            message: "neither `path` nor `body` is set".to_string(),
        }),
    }
}

fn clashes(meta: &Attributes, authored: &str) -> bool {
    if meta.contains_key("charset") && authored.contains("charset=") {
        return true;
    }
    match meta.get("name") {
        Some(AttrValue::Text(name)) => authored.contains(&format!("name=\"{name}\"")),
        _ => false,
    }
}
