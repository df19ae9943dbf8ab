use crate::bucket_client::{AccessPolicy, BucketClient, BucketError};
use crate::domain::{is_remote_url, DataUrl, DataUrlError, NewsletterFilter, NewsletterPayload};
use crate::routing::RequestContext;
use crate::storage::NewsletterStore;
use crate::utils::error_chain_fmt;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum NewsletterError {
    #[error("Invalid newsletter payload")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("Invalid {side} image")]
    InvalidImage {
        side: &'static str,
        #[source]
        source: DataUrlError,
    },
    #[error("Failed to upload the {side} image")]
    UploadFailed {
        side: &'static str,
        #[source]
        source: BucketError,
    },
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for NewsletterError {
    fn status_code(&self) -> StatusCode {
        match self {
            NewsletterError::InvalidPayload(_) | NewsletterError::InvalidImage { .. } => {
                StatusCode::BAD_REQUEST
            }
            NewsletterError::UploadFailed { .. } => StatusCode::BAD_GATEWAY,
            NewsletterError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Debug for NewsletterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[tracing::instrument(name = "Get newsletters", skip(ctx))]
pub async fn get_letters(ctx: RequestContext) -> Result<HttpResponse, NewsletterError> {
    // `?type=` with an empty value lists everything
    let filter = NewsletterFilter {
        letter_no: None,
        kind: ctx.query_param("type").filter(|kind| !kind.is_empty()),
    };
    find_letters(&ctx, filter).await
}

#[tracing::instrument(name = "Get newsletters by number", skip(ctx))]
pub async fn letters_by_number(ctx: RequestContext) -> Result<HttpResponse, NewsletterError> {
    let filter = NewsletterFilter {
        letter_no: ctx.param("letterNo"),
        kind: None,
    };
    find_letters(&ctx, filter).await
}

async fn find_letters(
    ctx: &RequestContext,
    filter: NewsletterFilter,
) -> Result<HttpResponse, NewsletterError> {
    let store = ctx.data::<dyn NewsletterStore>()?;
    let newsletters = store
        .find(&filter)
        .await
        .context("Failed to fetch newsletters")?;
    Ok(HttpResponse::Ok().json(newsletters))
}

#[tracing::instrument(
    name = "Upload a newsletter",
    skip(ctx),
    fields(newsletter_id = tracing::field::Empty, letter_no = tracing::field::Empty)
)]
pub async fn upload_letter(ctx: RequestContext) -> Result<HttpResponse, NewsletterError> {
    let payload: NewsletterPayload = ctx.json().map_err(NewsletterError::InvalidPayload)?;
    let store = ctx.data::<dyn NewsletterStore>()?;
    let bucket = ctx.data::<BucketClient>()?;

    let mut newsletter = payload.into_newsletter(Uuid::new_v4());
    tracing::Span::current()
        .record("newsletter_id", tracing::field::display(&newsletter.id))
        .record("letter_no", tracing::field::display(&newsletter.letter_no));
    if newsletter.date.trim().is_empty() {
        newsletter.date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    }

    let front_key = format!("{}{}", Uuid::new_v4(), newsletter.letter_no);
    let back_key = format!("{}{}2", Uuid::new_v4(), newsletter.letter_no);
    // The back image is only sent once the front one is stored. The bucket has
    // no delete, so a failed back upload still leaves the front object behind.
    newsletter.image = store_image(&bucket, "front", &newsletter.image, &front_key).await?;
    newsletter.back_image =
        store_image(&bucket, "back", &newsletter.back_image, &back_key).await?;

    store
        .insert(&newsletter)
        .await
        .context("Failed to store newsletter")?;

    Ok(HttpResponse::Created().json(newsletter))
}

// Replaces an inline data URL with the public URL of the uploaded object.
// Empty values and already-hosted images are kept as they are.
async fn store_image(
    bucket: &BucketClient,
    side: &'static str,
    value: &str,
    key: &str,
) -> Result<String, NewsletterError> {
    let value = value.trim();
    if value.is_empty() || is_remote_url(value) {
        return Ok(value.to_string());
    }

    let image =
        DataUrl::parse(value).map_err(|source| NewsletterError::InvalidImage { side, source })?;
    bucket
        .put(
            key,
            image.bytes,
            &image.content_type,
            AccessPolicy::PublicReadWrite,
        )
        .await
        .map_err(|source| NewsletterError::UploadFailed { side, source })
}
