use crate::configuration::CorsSettings;
use actix_cors::Cors;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::http::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginRule {
    Any,
    Exact(String),
    // One `*` inside an origin, e.g. `https://*.example.com`
    Wildcard { prefix: String, suffix: String },
}

impl OriginRule {
    fn parse(origin: &str) -> Self {
        let origin = origin.trim().to_ascii_lowercase();
        if origin == "*" {
            return OriginRule::Any;
        }
        match origin.split_once('*') {
            Some((prefix, suffix)) => OriginRule::Wildcard {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => OriginRule::Exact(origin),
        }
    }

    fn allows(&self, origin: &str) -> bool {
        let origin = origin.to_ascii_lowercase();
        match self {
            OriginRule::Any => true,
            OriginRule::Exact(exact) => *exact == origin,
            OriginRule::Wildcard { prefix, suffix } => {
                origin.len() >= prefix.len() + suffix.len()
                    && origin.starts_with(prefix.as_str())
                    && origin.ends_with(suffix.as_str())
            }
        }
    }
}

/// The cross-origin policy wrapped around the whole router.
///
/// Settings are validated once at startup. Every worker then builds its own
/// [`Cors`] middleware from them with [`CorsEnvelope::cors`].
#[derive(Debug, Clone)]
pub struct CorsEnvelope {
    origins: Vec<OriginRule>,
    methods: Vec<String>,
    // `None` allows any request header
    headers: Option<Vec<String>>,
    exposed_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Option<usize>,
}

impl CorsEnvelope {
    pub fn from_settings(settings: &CorsSettings) -> Result<Self, anyhow::Error> {
        let methods = settings
            .allowed_methods
            .iter()
            .map(|method| {
                let method = method.trim().to_ascii_uppercase();
                match Method::from_bytes(method.as_bytes()) {
                    Ok(_) => Ok(method),
                    Err(_) => Err(anyhow::anyhow!("Invalid CORS method `{}`", method)),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let headers = if settings.allowed_headers.iter().any(|h| h.trim() == "*") {
            None
        } else {
            Some(header_names(&settings.allowed_headers)?)
        };

        Ok(Self {
            origins: settings
                .allowed_origins
                .iter()
                .map(|origin| OriginRule::parse(origin))
                .collect(),
            methods,
            headers,
            exposed_headers: header_names(&settings.exposed_headers)?,
            allow_credentials: settings.allow_credentials,
            max_age: settings.max_age_secs,
        })
    }

    fn any_origin(&self) -> bool {
        self.origins.contains(&OriginRule::Any)
    }

    pub fn cors(&self) -> Cors {
        let cors = Cors::default()
            .allowed_methods(self.methods.iter().map(String::as_str))
            .max_age(self.max_age)
            // Other origins are still served, only without CORS headers
            .block_on_origin_mismatch(false);

        let cors = if self.any_origin() {
            // Browsers reject `*` on credentialed requests, the origin is echoed instead
            match self.allow_credentials {
                true => cors.allow_any_origin(),
                false => cors.allow_any_origin().send_wildcard(),
            }
        } else {
            let rules = self.origins.clone();
            cors.allowed_origin_fn(move |origin: &HeaderValue, _| {
                origin
                    .to_str()
                    .map(|origin| rules.iter().any(|rule| rule.allows(origin)))
                    .unwrap_or(false)
            })
        };

        let cors = match &self.headers {
            None => cors.allow_any_header(),
            Some(headers) => cors.allowed_headers(headers.iter().map(String::as_str)),
        };

        let cors = match self.exposed_headers.is_empty() {
            true => cors,
            false => cors.expose_headers(self.exposed_headers.iter().map(String::as_str)),
        };

        match self.allow_credentials {
            true => cors.supports_credentials(),
            false => cors,
        }
    }
}

fn header_names(headers: &[String]) -> Result<Vec<String>, anyhow::Error> {
    headers
        .iter()
        .map(|header| {
            let header = header.trim().to_ascii_lowercase();
            match HeaderName::from_bytes(header.as_bytes()) {
                Ok(_) => Ok(header),
                Err(_) => Err(anyhow::anyhow!("Invalid CORS header `{}`", header)),
            }
        })
        .collect()
}
