use crate::routing::{file_response, Handler, RequestContext};
use std::path::PathBuf;

/// Serves one HTML file of the admin UI, e.g. `/login` -> `admin/login.html`.
pub fn page(path: PathBuf) -> impl Handler {
    move |_ctx: RequestContext| {
        let path = path.clone();
        async move { Ok::<_, actix_web::Error>(file_response(&path).await) }
    }
}
