use ::common::storage::Fingerprint;

use crate::common::{TestApp, TestResponse, routes};

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

mod upload {
    use super::*;

    #[tokio::test]
    async fn new_file_starts_at_version_1() {
        let app = TestApp::spawn().await;

        let res = app.upload_file(1, "a.txt", b"hello".to_vec()).await;

        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        assert_eq!(res.body["name"].as_str().unwrap(), "a.txt");
        assert_eq!(res.body["version"].as_i64().unwrap(), 1);
        assert_eq!(res.body["size"].as_i64().unwrap(), 5);
        assert_eq!(res.body["content_hash"].as_str().unwrap(), HELLO_SHA256);
        assert!(res.body["file_id"].as_i64().is_some());
    }

    #[tokio::test]
    async fn reupload_bumps_version_and_keeps_file_id() {
        let app = TestApp::spawn().await;

        let first = app.upload_file(1, "a.txt", b"hello".to_vec()).await;
        assert_eq!(first.status, 201);

        let second = app.upload_file(1, "a.txt", b"hello world".to_vec()).await;
        assert_eq!(second.status, 201);

        assert_eq!(second.file_id(), first.file_id());
        assert_eq!(second.body["version"].as_i64().unwrap(), 2);
        assert_eq!(second.body["size"].as_i64().unwrap(), 11);
        assert_ne!(
            second.body["content_hash"].as_str().unwrap(),
            first.body["content_hash"].as_str().unwrap()
        );

        // The blob slot now holds the new content.
        let (status, _, bytes) = app.download_file(first.file_id()).await;
        assert_eq!(status, 200);
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn byte_identical_reupload_still_bumps_version() {
        let app = TestApp::spawn().await;

        let first = app.upload_file(1, "same.txt", b"unchanged".to_vec()).await;
        let second = app.upload_file(1, "same.txt", b"unchanged".to_vec()).await;

        assert_eq!(second.status, 201);
        assert_eq!(second.file_id(), first.file_id());
        assert_eq!(second.body["version"].as_i64().unwrap(), 2);
        assert_eq!(
            second.body["content_hash"].as_str().unwrap(),
            first.body["content_hash"].as_str().unwrap()
        );
    }

    #[tokio::test]
    async fn versions_count_up_without_gaps() {
        let app = TestApp::spawn().await;

        for expected_version in 1..=5 {
            let res = app
                .upload_file(1, "counter.txt", format!("rev {expected_version}").into_bytes())
                .await;
            assert_eq!(res.status, 201);
            assert_eq!(res.body["version"].as_i64().unwrap(), expected_version);
        }
    }

    #[tokio::test]
    async fn zero_length_upload_is_valid() {
        let app = TestApp::spawn().await;

        let res = app.upload_file(1, "empty.bin", Vec::new()).await;

        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        assert_eq!(res.body["size"].as_i64().unwrap(), 0);
        assert_eq!(res.body["content_hash"].as_str().unwrap(), EMPTY_SHA256);

        let (status, _, bytes) = app.download_file(res.file_id()).await;
        assert_eq!(status, 200);
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let res = app
            .client
            .post(app.url(&routes::owner_files(1)))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send request");
        let res = TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn name_with_path_separator_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload_file(1, "dir/escape.txt", b"data".to_vec()).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected() {
        let app = TestApp::spawn().await;

        let payload = vec![0u8; (crate::common::TEST_MAX_BLOB_SIZE + 1) as usize];
        let res = app.upload_file(1, "big.bin", payload).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }
}

mod list {
    use super::*;

    #[tokio::test]
    async fn unknown_owner_has_empty_list() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::owner_files(99)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"].as_u64().unwrap(), 0);
        assert!(res.body["files"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn most_recent_upload_comes_first() {
        let app = TestApp::spawn().await;

        app.upload_file(1, "first.txt", b"1".to_vec()).await;
        app.upload_file(1, "second.txt", b"2".to_vec()).await;
        app.upload_file(1, "third.txt", b"3".to_vec()).await;

        let res = app.get(&routes::owner_files(1)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"].as_u64().unwrap(), 3);
        let names: Vec<&str> = res.body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["third.txt", "second.txt", "first.txt"]);
    }

    #[tokio::test]
    async fn reupload_does_not_change_list_position() {
        let app = TestApp::spawn().await;

        app.upload_file(1, "old.txt", b"v1".to_vec()).await;
        app.upload_file(1, "new.txt", b"v1".to_vec()).await;
        // Re-uploading refreshes content, not the original upload time.
        app.upload_file(1, "old.txt", b"v2".to_vec()).await;

        let res = app.get(&routes::owner_files(1)).await;

        let names: Vec<&str> = res.body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["new.txt", "old.txt"]);
    }

    #[tokio::test]
    async fn owners_are_isolated() {
        let app = TestApp::spawn().await;

        let res1 = app.upload_file(1, "shared.txt", b"mine".to_vec()).await;
        let res2 = app.upload_file(2, "shared.txt", b"yours".to_vec()).await;

        assert_ne!(res1.file_id(), res2.file_id());
        // Each owner gets a fresh record at version 1.
        assert_eq!(res2.body["version"].as_i64().unwrap(), 1);

        let list1 = app.get(&routes::owner_files(1)).await;
        let list2 = app.get(&routes::owner_files(2)).await;
        assert_eq!(list1.body["total"].as_u64().unwrap(), 1);
        assert_eq!(list2.body["total"].as_u64().unwrap(), 1);

        let (_, _, bytes) = app.download_file(res1.file_id()).await;
        assert_eq!(bytes, b"mine");
    }
}

mod get {
    use super::*;

    #[tokio::test]
    async fn returns_the_record() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload_file(1, "a.txt", b"hello".to_vec()).await;

        let res = app.get(&routes::file(uploaded.file_id())).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"].as_str().unwrap(), "a.txt");
        assert_eq!(res.body["content_hash"].as_str().unwrap(), HELLO_SHA256);
        assert_eq!(res.body["version"].as_i64().unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::file(4242)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn returns_bytes_and_headers() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload_file(1, "notes.txt", b"hello".to_vec()).await;

        let (status, headers, bytes) = app.download_file(uploaded.file_id()).await;

        assert_eq!(status, 200);
        assert_eq!(bytes, b"hello");

        let disposition = headers["content-disposition"].to_str().unwrap();
        assert!(disposition.contains("notes.txt"), "{disposition}");
        assert!(headers["content-type"].to_str().unwrap().starts_with("text/plain"));
        assert_eq!(
            headers["etag"].to_str().unwrap(),
            format!("\"{HELLO_SHA256}\"")
        );

        // The served bytes re-fingerprint to the stored hash.
        assert_eq!(Fingerprint::compute(&bytes).to_hex(), HELLO_SHA256);
    }

    #[tokio::test]
    async fn matching_etag_returns_not_modified() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload_file(1, "cached.txt", b"hello".to_vec()).await;

        let status = app
            .download_with_etag(uploaded.file_id(), &format!("\"{HELLO_SHA256}\""))
            .await;

        assert_eq!(status, 304);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let app = TestApp::spawn().await;

        let (status, _, _) = app.download_file(31337).await;

        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn missing_blob_surfaces_as_storage_read_error() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload_file(1, "vanishing.txt", b"data".to_vec()).await;

        // Remove the blob behind the server's back: the record now points at
        // nothing, which the read path must report rather than mask.
        std::fs::remove_file(app.blob_path(1, "vanishing.txt")).unwrap();

        let res = app.get(&routes::download(uploaded.file_id())).await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"].as_str().unwrap(), "STORAGE_READ_ERROR");
    }

    #[tokio::test]
    async fn tampered_blob_surfaces_as_inconsistency() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload_file(1, "tampered.txt", b"original".to_vec()).await;

        std::fs::write(app.blob_path(1, "tampered.txt"), b"swapped bytes").unwrap();

        let res = app.get(&routes::download(uploaded.file_id())).await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"].as_str().unwrap(), "INCONSISTENT_STATE");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_record_and_blob() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload_file(1, "doomed.txt", b"bye".to_vec()).await;
        let file_id = uploaded.file_id();

        let res = app.delete(&routes::file(file_id)).await;
        assert_eq!(res.status, 204);

        let got = app.get(&routes::file(file_id)).await;
        assert_eq!(got.status, 404);
        assert_eq!(got.body["code"].as_str().unwrap(), "NOT_FOUND");

        let (status, _, _) = app.download_file(file_id).await;
        assert_eq!(status, 404);

        assert!(!app.blob_path(1, "doomed.txt").exists());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::file(777)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn deleted_name_can_be_uploaded_fresh() {
        let app = TestApp::spawn().await;

        let first = app.upload_file(1, "recycled.txt", b"v1".to_vec()).await;
        app.upload_file(1, "recycled.txt", b"v2".to_vec()).await;
        app.delete(&routes::file(first.file_id())).await;

        let fresh = app.upload_file(1, "recycled.txt", b"reborn".to_vec()).await;

        assert_eq!(fresh.status, 201);
        assert_eq!(fresh.body["version"].as_i64().unwrap(), 1);
        assert_ne!(fresh.file_id(), first.file_id());
    }
}

mod scenario {
    use super::*;

    /// The end-to-end walk: upload, re-upload, download, delete.
    #[tokio::test]
    async fn upload_reupload_delete_lifecycle() {
        let app = TestApp::spawn().await;

        let first = app.upload_file(1, "a.txt", b"hello".to_vec()).await;
        assert_eq!(first.status, 201);
        assert_eq!(first.body["version"].as_i64().unwrap(), 1);
        assert_eq!(first.body["content_hash"].as_str().unwrap(), HELLO_SHA256);
        assert_eq!(first.body["size"].as_i64().unwrap(), 5);

        let second = app.upload_file(1, "a.txt", b"hello world".to_vec()).await;
        assert_eq!(second.body["version"].as_i64().unwrap(), 2);
        assert_eq!(second.file_id(), first.file_id());
        assert_ne!(
            second.body["content_hash"].as_str().unwrap(),
            first.body["content_hash"].as_str().unwrap()
        );

        let (status, _, bytes) = app.download_file(second.file_id()).await;
        assert_eq!(status, 200);
        assert_eq!(
            Fingerprint::compute(&bytes).to_hex(),
            second.body["content_hash"].as_str().unwrap()
        );

        let res = app.delete(&routes::file(second.file_id())).await;
        assert_eq!(res.status, 204);

        let (status, _, _) = app.download_file(second.file_id()).await;
        assert_eq!(status, 404);
    }
}
