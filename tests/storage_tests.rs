use press_portal::{
    error::ApiError,
    storage::{self, MockStorageService, S3StorageClient, StorageService},
};

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let key = "articles/cover.png";
        let url = mock
            .get_presigned_upload_url(key, "image/png")
            .await
            .unwrap();

        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.get_presigned_upload_url("articles/a.png", "image/png").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let url = mock
            .get_presigned_upload_url("../../etc/passwd", "image/png")
            .await
            .unwrap();

        assert!(!url.contains(".."));
        assert!(url.contains("etc/passwd"));
    }
}

mod key_tests {
    use super::*;

    #[test]
    fn test_sanitize_key_drops_traversal_segments() {
        assert_eq!(storage::sanitize_key("a//./b/../c"), "a/b/c");
        assert_eq!(storage::sanitize_key("/articles/x.png"), "articles/x.png");
    }

    #[test]
    fn test_image_key_uses_only_the_extension() {
        let key = storage::image_key_for("../../My Holiday.JPEG", "Image/JPEG").unwrap();
        assert!(key.starts_with("articles/"));
        assert!(key.ends_with(".jpeg"));
        assert!(!key.contains("Holiday"));

        let other = storage::image_key_for("cover.jpeg", "image/jpeg").unwrap();
        assert_ne!(key, other);
    }

    #[test]
    fn test_image_key_rejects_other_uploads() {
        let err = storage::image_key_for("report.pdf", "application/pdf").unwrap_err();
        let ApiError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.contains("filename"));
        assert!(fields.contains("content_type"));

        // No extension at all.
        let err = storage::image_key_for("cover", "image/png").unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref f) if f.contains("filename")));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;

        let key = storage::image_key_for("cover.png", "image/png").unwrap();
        // Presigning is local; no request reaches the endpoint.
        let url = client
            .get_presigned_upload_url(&key, "image/png")
            .await
            .unwrap();

        assert!(url.contains("localhost:9000"));
        assert!(url.contains("testbucket"));
        assert!(url.contains(&key));
        assert!(url.contains("X-Amz-Expires=600"));
    }
}
