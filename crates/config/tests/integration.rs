//! Integration tests for config crate

#[cfg(test)]
mod tests {
    use std::path::Path;
    use wbx_config::*;
    use wbx_types::BuildVariant;

    #[test]
    fn test_paths_follow_project_section() {
        let mut config = Config::default();
        config.project.dev_output = "public/dev".into();
        config.project.index_file = "main.html".into();

        let paths = config.paths(Path::new("/work/shop"));
        assert_eq!(paths.output(BuildVariant::Debug), Path::new("/work/shop/public/dev"));
        assert_eq!(paths.output(BuildVariant::Release), Path::new("/work/shop/DistPublic"));
        assert_eq!(paths.index, Path::new("/work/shop/WebSources/main.html"));
        assert_eq!(
            paths.compiled(BuildVariant::Release),
            Path::new("/work/shop/.build/.wasi/release")
        );
        assert!(paths.checkout("JavaScriptKit").starts_with(&paths.build_root));
    }

    #[tokio::test]
    async fn test_explicit_config_file_beats_project_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            Config::project_path(dir.path()),
            "[project]\napp_target = \"FromProject\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("ci.toml");
        std::fs::write(&explicit, "[project]\napp_target = \"FromFlag\"\n").unwrap();

        let config = Config::load_or_default(Some(&explicit), dir.path())
            .await
            .unwrap();
        assert_eq!(config.project.app_target, "FromFlag");

        let config = Config::load_or_default(None, dir.path()).await.unwrap();
        assert_eq!(config.project.app_target, "FromProject");
    }

    #[test]
    fn test_retry_policy_lookup() {
        let mut config = Config::default();
        config.retry.flaky_steps = vec!["bundle".to_string()];
        assert!(config.retry.is_flaky("bundle"));
        assert!(!config.retry.is_flaky("runtime-build"));
    }
}
