//! Browser client, compiled into the binary and served at `/`.

use axum::response::Html;

pub const INDEX_HTML: &str = include_str!("../static/index.html");

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
