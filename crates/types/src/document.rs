//! Description of the generator-owned parts of the entry document

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute value of a generated tag. `true` renders a bare attribute, `false` omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Text(String),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Attributes of one generated tag, rendered in key order
pub type Attributes = BTreeMap<String, AttrValue>;

/// Splash screen shown in an iframe until the app takes over
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplashSpec {
    /// Page loaded through `src`
    #[serde(default)]
    pub path: Option<String>,
    /// Inline body markup loaded through `srcdoc`
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub iframe_style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_metas")]
    pub metas: Vec<Attributes>,
    #[serde(default)]
    pub links: Vec<Attributes>,
    #[serde(default)]
    pub scripts: Vec<Attributes>,
    #[serde(default)]
    pub splash: Option<SplashSpec>,
}

impl Default for DocumentSpec {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            title: default_title(),
            metas: default_metas(),
            links: Vec::new(),
            scripts: Vec::new(),
            splash: None,
        }
    }
}

fn default_lang() -> String {
    "en-US".to_string()
}

fn default_title() -> String {
    "&lrm;".to_string()
}

fn default_metas() -> Vec<Attributes> {
    let charset = Attributes::from([("charset".to_string(), AttrValue::from("utf-8"))]);
    let viewport = Attributes::from([
        ("name".to_string(), AttrValue::from("viewport")),
        (
            "content".to_string(),
            AttrValue::from("width=device-width, initial-scale=1"),
        ),
    ]);
    vec![charset, viewport]
}
