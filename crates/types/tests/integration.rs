//! Integration tests for types

#[cfg(test)]
mod tests {
    use wbx_types::*;

    #[test]
    fn test_request_shares_the_abort_signal() {
        let abort = AbortHandler::new();
        let request = BuildRequest::new(BuildVariant::Release)
            .with_target("App")
            .with_force(true)
            .with_abort(abort.clone());

        assert_eq!(request.target.as_deref(), Some("App"));
        assert!(request.force);
        assert!(!request.abort.is_aborted());

        abort.abort();
        assert!(request.abort.is_aborted());
        assert!(request.clone().abort.is_aborted());
    }

    #[test]
    fn test_variant_vocabulary() {
        assert_eq!(BuildVariant::default(), BuildVariant::Debug);
        assert_eq!(BuildVariant::Release.bundler_mode(), "production");
        assert_eq!(BuildVariant::Debug.attribute_suffix(), "Dev");
        assert_eq!(BuildVariant::Debug.opposite(), BuildVariant::Release);
        assert_eq!(
            serde_json::to_string(&BuildVariant::Release).unwrap(),
            "\"release\""
        );
    }

    #[test]
    fn test_phase_stages() {
        assert_eq!(PhaseKind::VerifyTargets.stage(), BuildStage::Resolving);
        assert_eq!(PhaseKind::RuntimePackage.stage(), BuildStage::Compiling);
        assert_eq!(PhaseKind::Compression.stage(), BuildStage::PostProcessing);
        assert_eq!(PhaseKind::VerifyTargets.to_string(), "verify_targets");
    }

    #[test]
    fn test_target_set_lookup() {
        let targets = TargetSet {
            executables: vec!["App".into(), "Service".into()],
            service_workers: vec!["Service".into()],
        };
        assert!(targets.has_executable("Service"));
        assert!(targets.has_service_worker("Service"));
        assert!(!targets.has_service_worker("App"));
        assert!(TargetSet::default().is_empty());
    }
}
