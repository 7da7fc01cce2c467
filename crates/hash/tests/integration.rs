//! Integration tests for hash crate

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use tokio::fs;
    use wbx_hash::*;

    #[tokio::test]
    async fn test_combined_digest_depends_on_order_and_content() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("package.json");
        let lock = dir.path().join("package-lock.json");
        fs::write(&manifest, br#"{"name":"runtime"}"#).await.unwrap();
        fs::write(&lock, br#"{"lockfileVersion":3}"#).await.unwrap();

        let forward = Hash::hash_files(&[&manifest, &lock]).await.unwrap();
        let reverse = Hash::hash_files(&[&lock, &manifest]).await.unwrap();
        assert_ne!(forward, reverse);

        fs::write(&lock, br#"{"lockfileVersion":2}"#).await.unwrap();
        let edited = Hash::hash_files(&[&manifest, &lock]).await.unwrap();
        assert_ne!(forward, edited);
    }

    #[tokio::test]
    async fn test_short_form_is_a_prefix() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("Package.resolved");
        fs::write(&file, b"{}").await.unwrap();

        let hash = Hash::hash_file(&file).await.unwrap();
        assert_eq!(hash.short().len(), 16);
        assert!(hash.to_hex().starts_with(&hash.short()));
    }
}
