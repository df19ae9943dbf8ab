use crate::routing::{Handler, HandlerFuture, RequestContext};
use actix_web::http::header::ALLOW;
use actix_web::http::Method;
use actix_web::HttpResponse;
use futures::FutureExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A directory tree served as-is under a fixed URL prefix.
#[derive(Debug, Clone)]
pub struct StaticMount {
    prefix: String,
    route: String,
    directory: PathBuf,
}

impl StaticMount {
    pub fn new(prefix: &str, directory: PathBuf) -> Self {
        Self {
            prefix: prefix.to_string(),
            route: format!("{}/*filepath", prefix),
            directory,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Label the middleware chain sees for requests below this mount.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// The part of `path` below this mount, keeping its leading slash.
    pub fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
            .filter(|rest| rest.starts_with('/'))
    }

    #[tracing::instrument(name = "Serve static file", skip(self), fields(prefix = %self.prefix))]
    pub async fn serve(&self, method: &Method, relative: &str) -> HttpResponse {
        if method != Method::GET && method != Method::HEAD {
            return HttpResponse::MethodNotAllowed()
                .insert_header((ALLOW, "GET, HEAD"))
                .finish();
        }

        match resolve(&self.directory, relative) {
            Some(file) => file_response(&file).await,
            None => HttpResponse::NotFound().finish(),
        }
    }
}

impl Handler for StaticMount {
    fn call(&self, ctx: RequestContext) -> HandlerFuture {
        let mount = self.clone();
        async move {
            let relative = mount.relative(ctx.path()).unwrap_or("/");
            Ok(mount.serve(ctx.method(), relative).await)
        }
        .boxed_local()
    }
}

// Joins the decoded request path below `directory`, refusing anything that climbs out of it
fn resolve(directory: &Path, relative: &str) -> Option<PathBuf> {
    let mut resolved = directory.to_path_buf();
    for raw in relative.split('/') {
        let segment = urlencoding::decode(raw).ok()?;
        match segment.as_ref() {
            "" | "." => continue,
            ".." => return None,
            s if s.contains(&['/', '\\', '\0'][..]) => return None,
            s => resolved.push(s),
        }
    }
    Some(resolved)
}

/// Reads a file from disk into a response; a directory serves its `index.html`.
pub async fn file_response(path: &Path) -> HttpResponse {
    let mut path = path.to_path_buf();
    if let Ok(metadata) = tokio::fs::metadata(&path).await {
        if metadata.is_dir() {
            path.push("index.html");
        }
    }

    match tokio::fs::read(&path).await {
        Ok(content) => {
            let extension = path.extension().and_then(|e| e.to_str());
            HttpResponse::Ok()
                .content_type(content_type(extension))
                .body(content)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => HttpResponse::NotFound().finish(),
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                path = %path.display(),
                "Failed to read static file"
            );
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn content_type(extension: Option<&str>) -> &'static str {
    match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("js" | "mjs") => "application/javascript",
        Some("json" | "map") => "application/json",
        Some("xml") => "application/xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
