use crate::routing::RouterError;
use std::borrow::Cow;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    // Literal beats parameter beats catch-all when several patterns match one path
    fn rank(&self) -> u8 {
        match self {
            Segment::Literal(_) => 2,
            Segment::Param(_) => 1,
            Segment::CatchAll(_) => 0,
        }
    }
}

/// A compiled route pattern such as `/letters/:letterNo` or `/assets/*filepath`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, RouterError> {
        let invalid = |reason: &str| RouterError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        if !raw.starts_with('/') {
            return Err(invalid("pattern must start with '/'"));
        }

        let pieces = split_path(raw);
        let mut segments = Vec::with_capacity(pieces.len());
        for (index, piece) in pieces.iter().enumerate() {
            let segment = if let Some(name) = piece.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter name cannot be empty"));
                }
                Segment::Param(name.to_string())
            } else if let Some(name) = piece.strip_prefix('*') {
                if name.is_empty() {
                    return Err(invalid("catch-all name cannot be empty"));
                }
                if index + 1 != pieces.len() {
                    return Err(invalid("catch-all is only allowed as the last segment"));
                }
                Segment::CatchAll(name.to_string())
            } else {
                Segment::Literal(piece.to_string())
            };
            segments.push(segment);
        }

        let mut names: Vec<&str> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        if names.len() != total {
            return Err(invalid("parameter names must be unique"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Two patterns with the same shape match exactly the same paths,
    /// whatever their parameters are called.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    (Segment::CatchAll(_), Segment::CatchAll(_)) => true,
                    _ => false,
                })
    }

    pub fn matches(&self, path: &str) -> Option<PathParams> {
        self.matches_segments(&decode_segments(path)?)
    }

    /// Matches already decoded path segments, see [`decode_segments`].
    pub fn matches_segments(&self, pieces: &[String]) -> Option<PathParams> {
        let mut params = PathParams::default();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if pieces.get(index) != Some(literal) {
                        return None;
                    }
                }
                Segment::Param(name) => match pieces.get(index) {
                    Some(value) if !value.is_empty() => params.push(name, value),
                    _ => return None,
                },
                Segment::CatchAll(name) => {
                    // The remainder keeps its leading slash: `/assets/*f` on `/assets/a/b` gives `/a/b`
                    if pieces.len() <= index {
                        return None;
                    }
                    let rest = format!("/{}", pieces[index..].join("/"));
                    params.push(name, &rest);
                    return Some(params);
                }
            }
        }

        (pieces.len() == self.segments.len()).then_some(params)
    }

    /// Orders matching patterns from most to least specific.
    pub fn specificity_cmp(&self, other: &PathPattern) -> Ordering {
        let ranks = |pattern: &PathPattern| -> Vec<u8> {
            pattern.segments.iter().map(Segment::rank).collect()
        };
        ranks(self).cmp(&ranks(other))
    }
}

/// Splits a raw request path and percent-decodes every segment on its own, so
/// an encoded `/` stays inside its segment. `None` when a segment is not UTF-8.
pub fn decode_segments(path: &str) -> Option<Vec<String>> {
    split_path(path)
        .into_iter()
        .map(|segment| urlencoding::decode(segment).ok().map(Cow::into_owned))
        .collect()
}

fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Parameters extracted from the request path, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    fn push(&mut self, name: &str, value: &str) {
        self.0.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
