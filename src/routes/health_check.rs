use crate::routing::RequestContext;
use actix_web::HttpResponse;

pub async fn health_check(_ctx: RequestContext) -> Result<HttpResponse, actix_web::Error> {
    Ok(HttpResponse::Ok().finish())
}
