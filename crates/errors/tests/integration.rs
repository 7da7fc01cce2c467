//! Integration tests for error types

#[cfg(test)]
mod tests {
    use wbx_errors::*;

    #[test]
    fn test_error_conversion() {
        let build_err = BuildError::NoTargets;
        let err: Error = build_err.into();
        assert!(matches!(err, Error::Build(BuildError::NoTargets)));

        let toml_err = toml::from_str::<toml::Value>("[project").unwrap_err();
        let err: Error = toml_err.into();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_error_display() {
        let err: Error = BuildError::MissingTarget {
            name: "App".into(),
        }
        .into();
        assert!(err.to_string().starts_with("build error: "));
        assert!(err.to_string().contains("App"));
    }

    #[test]
    fn test_user_facing_details_pass_through() {
        let err: Error = BuildError::OutputMissing {
            path: "/project/.build/.wasi/debug/App.wasm".into(),
            reason: "compiler produced no module".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("build.output_missing"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());

        let config: Error = ConfigError::MissingField {
            field: "project.app_target".into(),
        }
        .into();
        assert!(config.user_hint().is_some());
    }
}
