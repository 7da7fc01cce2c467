use std::borrow::Cow;
use std::fmt;
use wbx_types::BuildVariant;

/// Identifier of an artifact family tracked by the gate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKind(Cow<'static, str>);

impl ArtifactKind {
    pub const RUNTIME_PACKAGE: Self = Self::const_str("runtime-package");

    const fn const_str(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    /// Compiled module of one executable target
    #[must_use]
    pub fn compiled(target: &str, variant: BuildVariant) -> Self {
        Self(Cow::Owned(format!("compiled:{target}:{variant}")))
    }

    /// Web documents published to one variant's output folder
    #[must_use]
    pub fn document(variant: BuildVariant) -> Self {
        Self(Cow::Owned(format!("document:{variant}")))
    }

    /// Compiled stylesheets of one variant's output folder
    #[must_use]
    pub fn stylesheet(variant: BuildVariant) -> Self {
        Self(Cow::Owned(format!("stylesheet:{variant}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ArtifactKind {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl From<&'static str> for ArtifactKind {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_kinds_are_keyed_by_variant() {
        assert_ne!(
            ArtifactKind::document(BuildVariant::Debug),
            ArtifactKind::document(BuildVariant::Release)
        );
        assert_ne!(
            ArtifactKind::stylesheet(BuildVariant::Debug),
            ArtifactKind::stylesheet(BuildVariant::Release)
        );
        assert_ne!(
            ArtifactKind::document(BuildVariant::Debug),
            ArtifactKind::stylesheet(BuildVariant::Debug)
        );
    }
}
