use crate::common::{TestApp, routes};

#[tokio::test]
async fn reports_store_and_catalog_counts() {
    let app = TestApp::spawn().await;
    app.create_product("One").await;
    app.create_product("Two").await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["uploadDirExists"], true);
    assert_eq!(res.body["fileCount"], 2);
    assert_eq!(res.body["totalBytes"], 6);
    assert_eq!(res.body["productCount"], 2);
}

#[tokio::test]
async fn missing_upload_dir_is_reported() {
    let app = TestApp::spawn().await;
    tokio::fs::remove_dir_all(&app.upload_dir).await.unwrap();

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["uploadDirExists"], false);
    assert_eq!(res.body["fileCount"], 0);
}

#[tokio::test]
async fn openapi_document_lists_catalog_routes() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::OPENAPI).await;

    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/v1/products"));
    assert!(paths.contains_key("/api/v1/products/{id}"));
    assert!(paths.contains_key("/api/v1/products/image-status"));
    assert!(paths.contains_key("/api/v1/health"));
}
