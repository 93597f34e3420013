//! Static file serving module
//!
//! Maps `<base_path>/<sub-path>` requests onto files below a directory,
//! negotiates the content type from the extension and streams the file.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use hyper::{Response, StatusCode};
use tokio::fs::{self, File};

use crate::error::Result;
use crate::http::{self, mime, RouterBody};
use crate::logger;
use crate::router::{Route, RouteMethod};

const HTML: &str = "text/html";
const FALLBACK_CONTENT_TYPE: &str = "text/plain";

/// Serve files from `base_path` relative to the working directory
///
/// `serve("/public")` answers `GET /public/<sub-path>` from `./public/<sub-path>`.
pub fn serve(base_path: &str) -> Result<Route> {
    serve_from(base_path, ".")
}

/// Serve files from `base_path`, resolving it under `root` instead of the
/// working directory
pub fn serve_from(base_path: &str, root: impl AsRef<Path>) -> Result<Route> {
    let base = base_path.trim_matches('/');
    let pattern = if base.is_empty() {
        "/(.+)".to_string()
    } else {
        format!("/{}/(.+)", regex::escape(base))
    };

    let site = Arc::new(StaticSite {
        url_base: if base.is_empty() {
            String::new()
        } else {
            format!("/{base}")
        },
        dir: root.as_ref().join(base),
    });

    Route::new(&pattern, RouteMethod::Get, move |req| {
        let site = Arc::clone(&site);
        async move { site.respond(req.capture(1)).await }
    })
}

/// Directory behind one static route
#[derive(Debug)]
struct StaticSite {
    /// URL prefix without trailing slash, used in error pages
    url_base: String,
    dir: PathBuf,
}

impl StaticSite {
    async fn respond(&self, sub_path: Option<&str>) -> Result<Response<RouterBody>> {
        let Some(sub_path) = sub_path.filter(|s| !s.is_empty()) else {
            return Ok(http::build_error_response(
                StatusCode::NOT_IMPLEMENTED,
                "<h1>Serving the base path itself is not implemented</h1>",
            ));
        };

        let Some(relative) = sanitize(sub_path) else {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {}/{sub_path}",
                self.url_base
            ));
            return Ok(http::build_403_response(&format!(
                "{}/{sub_path}",
                self.url_base
            )));
        };

        let (relative, content_type) = negotiate(relative);
        let url_path = format!("{}/{}", self.url_base, relative.display());
        let disk_path = self.dir.join(&relative);

        // Missing files (and missing parents) fail canonicalization
        let Ok(canonical) = fs::canonicalize(&disk_path).await else {
            return Ok(not_found(&url_path));
        };
        let root = fs::canonicalize(&self.dir).await?;
        if !canonical.starts_with(&root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {url_path} -> {}",
                canonical.display()
            ));
            return Ok(http::build_403_response(&url_path));
        }

        let file = File::open(&canonical).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Ok(not_found(&url_path));
        }

        Ok(http::build_file_response(file, content_type, metadata.len()))
    }
}

/// Rebuild the sub-path from plain components only
///
/// Returns `None` for `..`, absolute or prefixed paths, and for paths with no
/// file component left.
fn sanitize(sub_path: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in Path::new(sub_path).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

/// Pick the on-disk file and its content type from the extension
///
/// No extension means an HTML page (`about` -> `about.html`), `.htm` is
/// served from the `.html` file, anything else goes through the MIME table.
fn negotiate(mut path: PathBuf) -> (PathBuf, &'static str) {
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        None => {
            let mut name = path.file_name().unwrap_or_default().to_os_string();
            name.push(".html");
            path.set_file_name(name);
            HTML
        }
        Some("htm") => {
            path.set_extension("html");
            HTML
        }
        Some(ext) => mime::content_type(ext).unwrap_or(FALLBACK_CONTENT_TYPE),
    };
    (path, content_type)
}

fn not_found(url_path: &str) -> Response<RouterBody> {
    http::build_error_response(
        StatusCode::NOT_FOUND,
        &format!("<h1>No such file</h1><p>{}</p>", http::escape_html(url_path)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouteTable;
    use http_body_util::BodyExt;
    use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use hyper::Method;
    use tempfile::TempDir;

    const TEST_HTML: &str = "<html><body><h1>Test page</h1></body></html>\n";

    fn site() -> (TempDir, RouteTable) {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(public.join("docs")).unwrap();
        std::fs::write(public.join("test.html"), TEST_HTML).unwrap();
        std::fs::write(public.join("about.html"), "about us").unwrap();
        std::fs::write(public.join("legacy.html"), "legacy page").unwrap();
        std::fs::write(public.join("data.json"), r#"{"ok":true}"#).unwrap();
        std::fs::write(public.join("notes.weird"), "plain notes").unwrap();
        std::fs::write(public.join("docs/guide.html"), "guide").unwrap();
        std::fs::write(dir.path().join("secret.txt"), "top secret").unwrap();

        let mut table = RouteTable::new();
        table.register(serve_from("/public", dir.path()).unwrap());
        (dir, table)
    }

    async fn get(table: &RouteTable, url: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = table.dispatch(&Method::GET, url).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let (_dir, table) = site();
        let response = table
            .dispatch(&Method::GET, "/public/test.html")
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
        assert_eq!(
            response.headers()[CONTENT_LENGTH],
            TEST_HTML.len().to_string().as_str()
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), TEST_HTML.as_bytes());
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let (_dir, table) = site();
        let (status, _, body) = get(&table, "/public/missing.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains("/public/missing.txt"));
        // Never leak the on-disk location
        assert!(!body.contains(&*std::env::temp_dir().to_string_lossy()));
    }

    #[tokio::test]
    async fn test_extensionless_resolves_html() {
        let (_dir, table) = site();
        let (status, content_type, body) = get(&table, "/public/about").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(body, b"about us");

        let (status, _, body) = get(&table, "/public/docs/guide").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"guide");
    }

    #[tokio::test]
    async fn test_htm_rewritten_to_html() {
        let (_dir, table) = site();
        let (status, content_type, body) = get(&table, "/public/legacy.htm").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(body, b"legacy page");
    }

    #[tokio::test]
    async fn test_content_type_from_extension() {
        let (_dir, table) = site();
        let (_, content_type, _) = get(&table, "/public/data.json").await;
        assert_eq!(content_type.as_deref(), Some("application/json"));

        let (status, content_type, body) = get(&table, "/public/notes.weird").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain"));
        assert_eq!(body, b"plain notes");
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, table) = site();
        for url in [
            "/public/../secret.txt",
            "/public/%2e%2e/secret.txt",
            "/public/docs/../../secret.txt",
        ] {
            let (status, _, body) = get(&table, url).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{url}");
            assert!(!String::from_utf8(body).unwrap().contains("top secret"));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_rejected() {
        let (dir, table) = site();
        std::os::unix::fs::symlink(
            dir.path().join("secret.txt"),
            dir.path().join("public/link.txt"),
        )
        .unwrap();

        let (status, _, _) = get(&table, "/public/link.txt").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_directory_is_404() {
        let (dir, table) = site();
        // `docs` exists as a directory, but resolves to `docs.html`
        let (status, _, _) = get(&table, "/public/docs").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        std::fs::create_dir(dir.path().join("public/folder.html")).unwrap();
        let (status, _, _) = get(&table, "/public/folder.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_only_get_and_prefix() {
        let (_dir, table) = site();
        let response = table
            .dispatch(&Method::POST, "/public/test.html")
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let (status, _, _) = get(&table, "/public/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = get(&table, "/publicity/test.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_repeat_requests_identical() {
        let (_dir, table) = site();
        let first = get(&table, "/public/test.html").await;
        let second = get(&table, "/public/test.html").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_sub_path_is_501() {
        let site = StaticSite {
            url_base: "/public".to_string(),
            dir: PathBuf::from("public"),
        };
        let response = site.respond(None).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let response = site.respond(Some("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn test_negotiate() {
        assert_eq!(
            negotiate(PathBuf::from("about")),
            (PathBuf::from("about.html"), "text/html")
        );
        assert_eq!(
            negotiate(PathBuf::from("v1.2/readme")),
            (PathBuf::from("v1.2/readme.html"), "text/html")
        );
        assert_eq!(
            negotiate(PathBuf::from("page.htm")),
            (PathBuf::from("page.html"), "text/html")
        );
        assert_eq!(
            negotiate(PathBuf::from("logo.png")),
            (PathBuf::from("logo.png"), "image/png")
        );
        assert_eq!(
            negotiate(PathBuf::from("file.unknown")),
            (PathBuf::from("file.unknown"), "text/plain")
        );
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("a/./b.txt"), Some(PathBuf::from("a/b.txt")));
        assert_eq!(sanitize("../x"), None);
        assert_eq!(sanitize("a/../../x"), None);
        assert_eq!(sanitize("/etc/passwd"), None);
        assert_eq!(sanitize("./"), None);
    }
}
