use serde_json::json;

use crate::common::{GIF_BYTES, TestApp, image_part, product_form, routes};

mod create_product {
    use super::*;

    #[tokio::test]
    async fn inline_png_is_stored_and_reported() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::PRODUCTS,
                &json!({
                    "title": "Linen Shirt",
                    "description": "Breathable",
                    "rating": 4.5,
                    "price": 39.9,
                    "discount": 10,
                    "image": "data:image/png;base64,AAAA",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let image = res.body["image"].as_str().unwrap();
        assert!(image.starts_with("/uploads/base64-"), "{image}");
        assert!(image.ends_with(".png"), "{image}");
        assert_eq!(res.body["imageExists"], true);
        assert_eq!(
            res.body["fullImageUrl"].as_str().unwrap(),
            format!("http://catalog.test{image}")
        );
        assert_eq!(res.body["title"], "Linen Shirt");
        assert!(app.blob_exists(image).await);
    }

    #[tokio::test]
    async fn multipart_file_upload_is_stored() {
        let app = TestApp::spawn().await;

        let form = product_form("Gif Product").part("image", image_part("pixel.gif", "image/gif", GIF_BYTES));
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        let image = res.body["image"].as_str().unwrap();
        assert!(image.starts_with("/uploads/image-"), "{image}");
        assert!(image.ends_with(".gif"), "{image}");
        assert_eq!(res.body["imageExists"], true);
        assert_eq!(res.body["price"], 20.0);
        assert_eq!(res.body["discount"], 15.0);

        let key = TestApp::key_of(image);
        let stored = tokio::fs::read(app.upload_path(key.as_str())).await.unwrap();
        assert_eq!(stored, GIF_BYTES);
    }

    #[tokio::test]
    async fn multipart_inline_text_image_is_accepted() {
        let app = TestApp::spawn().await;

        let form = product_form("Inline").text("image", "data:image/webp;base64,AAAA");
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["image"].as_str().unwrap().ends_with(".webp"));
    }

    #[tokio::test]
    async fn external_url_is_recorded_as_is() {
        let app = TestApp::spawn().await;

        let url = "https://cdn.example.com/products/1.jpg";
        let res = app
            .post_json(routes::PRODUCTS, &json!({"title": "External", "price": 1, "image": url}))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["image"], url);
        assert_eq!(res.body["fullImageUrl"], url);
        assert_eq!(res.body["imageExists"], true);
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn missing_image_is_rejected_without_record() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::PRODUCTS, &json!({"title": "No image", "price": 5}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "MISSING_IMAGE");
        let list = app.get(routes::PRODUCTS).await;
        assert_eq!(list.body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn malformed_inline_image_is_rejected() {
        let app = TestApp::spawn().await;

        for bad in [
            "data:image/png,AAAA",
            "data:text/plain;base64,AAAA",
            "image/png;base64,AAAA",
        ] {
            let res = app
                .post_json(routes::PRODUCTS, &json!({"title": "Bad", "price": 1, "image": bad}))
                .await;
            assert_eq!(res.status, 400, "{bad}: {}", res.text);
            assert_eq!(res.code(), "INVALID_IMAGE_FORMAT", "{bad}");
        }
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn non_image_upload_is_unsupported() {
        let app = TestApp::spawn().await;

        let form = product_form("Pdf").part("image", image_part("doc.pdf", "application/pdf", b"%PDF"));
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 415, "{}", res.text);
        assert_eq!(res.code(), "UNSUPPORTED_MEDIA_TYPE");
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = TestApp::spawn_with_max_upload(16).await;

        let form = product_form("Big").part("image", image_part("big.png", "image/png", &[0u8; 64]));
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 413, "{}", res.text);
        assert_eq!(res.code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_fields_drop_uploaded_file() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new()
            .part("image", image_part("pixel.gif", "image/gif", GIF_BYTES))
            .text("title", "Rated")
            .text("rating", "9");
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn unparsable_number_drops_uploaded_file() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new()
            .part("image", image_part("pixel.gif", "image/gif", GIF_BYTES))
            .text("title", "Priced")
            .text("price", "cheap");
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(app.blob_count().await, 0);
    }

    #[tokio::test]
    async fn plain_text_body_is_unsupported() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::PRODUCTS))
            .header("Content-Type", "text/plain")
            .body("hello")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 415);
    }
}

mod read_product {
    use super::*;

    #[tokio::test]
    async fn missing_blob_reports_false_with_url() {
        let app = TestApp::spawn().await;
        let id = app.insert_raw_product("Legacy", Some("/uploads/missing.jpg")).await;

        let res = app.get(&routes::product(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["imageExists"], false);
        assert_eq!(
            res.body["fullImageUrl"],
            "http://catalog.test/uploads/missing.jpg"
        );
    }

    #[tokio::test]
    async fn list_annotates_every_product() {
        let app = TestApp::spawn().await;
        app.create_product("First").await;
        app.insert_raw_product("Broken", Some("/uploads/gone.png")).await;

        let res = app.get(routes::PRODUCTS).await;

        assert_eq!(res.status, 200);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["title"], "First");
        assert_eq!(data[0]["imageExists"], true);
        assert_eq!(data[1]["imageExists"], false);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::product(404)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }
}

mod update_product {
    use super::*;

    #[tokio::test]
    async fn new_image_replaces_and_deletes_old_blob() {
        let app = TestApp::spawn().await;
        let id = app.create_product("Shirt").await;
        let old_image = app.get(&routes::product(id)).await.body["image"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app
            .patch_json(
                &routes::product(id),
                &json!({"image": "data:image/jpeg;base64,AAAA"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new_image = res.body["image"].as_str().unwrap();
        assert_ne!(new_image, old_image);
        assert!(new_image.ends_with(".jpeg"));
        assert!(app.blob_exists(new_image).await);
        assert!(!app.blob_exists(&old_image).await);
    }

    #[tokio::test]
    async fn multipart_upload_replaces_image() {
        let app = TestApp::spawn().await;
        let id = app.create_product("Shirt").await;

        let form = reqwest::multipart::Form::new()
            .part("image", image_part("pixel.gif", "image/gif", GIF_BYTES));
        let res = app.patch_form(&routes::product(id), form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["image"].as_str().unwrap().ends_with(".gif"));
        assert_eq!(app.blob_count().await, 1);
    }

    #[tokio::test]
    async fn fields_only_keeps_image() {
        let app = TestApp::spawn().await;
        let id = app.create_product("Shirt").await;
        let before = app.get(&routes::product(id)).await;

        let res = app
            .patch_json(&routes::product(id), &json!({"title": "Sweater", "price": 45}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Sweater");
        assert_eq!(res.body["price"], 45.0);
        assert_eq!(res.body["image"], before.body["image"]);
        assert_eq!(res.body["imageExists"], true);
    }

    #[tokio::test]
    async fn invalid_discount_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_product("Shirt").await;

        let res = app
            .patch_json(&routes::product(id), &json!({"discount": 150}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .patch_json(
                &routes::product(77),
                &json!({"image": "data:image/png;base64,AAAA"}),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(app.blob_count().await, 0);
    }
}

mod delete_product {
    use super::*;

    #[tokio::test]
    async fn removes_record_and_blob() {
        let app = TestApp::spawn().await;
        let id = app.create_product("Shirt").await;
        let image = app.get(&routes::product(id)).await.body["image"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app.delete(&routes::product(id)).await;
        assert_eq!(res.status, 204);

        assert!(!app.blob_exists(&image).await);
        assert_eq!(app.get(&routes::product(id)).await.status, 404);
        assert_eq!(app.delete(&routes::product(id)).await.status, 404);
    }

    #[tokio::test]
    async fn succeeds_when_blob_is_already_missing() {
        let app = TestApp::spawn().await;
        let id = app.insert_raw_product("Legacy", Some("/uploads/missing.jpg")).await;

        let res = app.delete(&routes::product(id)).await;
        assert_eq!(res.status, 204);
    }
}

mod image_status {
    use super::*;

    #[tokio::test]
    async fn report_counts_present_missing_and_absent() {
        let app = TestApp::spawn().await;
        app.create_product("Present").await;
        app.insert_raw_product("Missing", Some("/uploads/missing.jpg")).await;
        app.insert_raw_product("Absent", None).await;

        let res = app.get(routes::IMAGE_STATUS).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total"], 3);
        assert_eq!(res.body["withImage"], 1);
        assert_eq!(res.body["missingImage"], 1);
        assert_eq!(res.body["withoutImage"], 1);

        let products = res.body["products"].as_array().unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[1]["title"], "Missing");
        assert_eq!(products[1]["imageExists"], false);
        assert!(products[2]["image"].is_null());
    }
}
