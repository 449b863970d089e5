use crate::common::{GIF_BYTES, TestApp, image_part, product_form, routes};

#[tokio::test]
async fn stored_image_is_served_with_long_cache() {
    let app = TestApp::spawn().await;
    let form = product_form("Gif").part("image", image_part("pixel.gif", "image/gif", GIF_BYTES));
    let created = app.post_form(routes::PRODUCTS, form).await;
    assert_eq!(created.status, 201, "{}", created.text);
    let image = created.body["image"].as_str().unwrap();

    let res = app.client.get(app.url(image)).send().await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "image/gif");
    assert_eq!(
        res.headers()["cache-control"],
        "public, max-age=31536000, immutable"
    );
    assert_eq!(res.bytes().await.unwrap().as_ref(), GIF_BYTES);
}

#[tokio::test]
async fn unknown_key_is_not_found() {
    let app = TestApp::spawn().await;
    let res = app.get("/uploads/nothing-here.png").await;
    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
}

#[tokio::test]
async fn hidden_and_traversal_keys_are_not_served() {
    let app = TestApp::spawn().await;
    assert_eq!(app.get("/uploads/.tmp").await.status, 404);
    assert_eq!(app.get("/uploads/..%2Fsecret").await.status, 404);
}
