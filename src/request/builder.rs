//! Request building.
//!
//! # Data Flow
//! ```text
//! endpoint + interface path + method path
//!     → template substitution (declaration order)
//!     → values percent-encoded, dot segments rejected
//!     → matrix params on the last segment
//!     → query pairs
//! defaults ⊕ call headers → Accept / Content-Type resolution
//! ```

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::binding::model::MethodBinding;
use crate::error::BindingError;
use crate::request::binder::BoundCall;
use crate::request::entity::Entity;
use crate::request::headers::HeaderMultiMap;

const CONTENT_TYPE: &str = "Content-Type";
const ACCEPT: &str = "Accept";

/// Where the request content type comes from when several sources apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentTypePrecedence {
    /// Call-level header, then consumed media type, then client default header.
    #[default]
    CallHeader,
    /// Any resolved header (client defaults included), then consumed media type.
    AnyHeader,
}

/// Per-client request settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub default_headers: HeaderMultiMap,
    pub content_type_precedence: ContentTypePrecedence,
}

impl ClientConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            default_headers: HeaderMultiMap::new(),
            content_type_precedence: ContentTypePrecedence::default(),
        }
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.append(name, value);
        self
    }

    pub fn with_precedence(mut self, precedence: ContentTypePrecedence) -> Self {
        self.content_type_precedence = precedence;
        self
    }
}

/// One fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    /// Merged headers, without `Accept` and `Content-Type`.
    pub headers: HeaderMultiMap,
    pub accept: Vec<String>,
    /// Set only when a body is present.
    pub content_type: Option<String>,
    pub body: Option<Entity>,
}

impl RequestDescriptor {
    pub fn target(&self) -> &str {
        self.url.as_str()
    }
}

/// Compose the request for one bound call.
pub fn build(
    config: &ClientConfig,
    binding: &MethodBinding,
    bound: BoundCall,
) -> Result<RequestDescriptor, BindingError> {
    let url = build_url(config, binding, &bound)?;

    let mut headers = bound.headers.merge_onto(&config.default_headers);
    let accept_headers = headers.take(ACCEPT);
    let resolved_content_types = headers.take(CONTENT_TYPE);

    let accept = if binding.produces.is_empty() {
        accept_headers
    } else {
        binding.produces.clone()
    };

    let content_type = match &bound.body {
        None => None,
        Some(_) => match config.content_type_precedence {
            ContentTypePrecedence::CallHeader => bound
                .headers
                .get(CONTENT_TYPE)
                .map(str::to_string)
                .or_else(|| binding.consumes.first().cloned())
                .or_else(|| config.default_headers.get(CONTENT_TYPE).map(str::to_string)),
            ContentTypePrecedence::AnyHeader => resolved_content_types
                .into_iter()
                .next()
                .or_else(|| binding.consumes.first().cloned()),
        },
    };

    Ok(RequestDescriptor {
        method: binding.verb.clone(),
        url,
        headers,
        accept,
        content_type,
        body: bound.body,
    })
}

fn build_url(
    config: &ClientConfig,
    binding: &MethodBinding,
    bound: &BoundCall,
) -> Result<Url, BindingError> {
    let invalid = |reason: String| BindingError::InvalidTarget {
        method: binding.name.clone(),
        reason,
    };

    let mut segments = Vec::new();
    for template in [binding.interface.path.as_deref(), binding.path.as_deref()]
        .into_iter()
        .flatten()
    {
        for raw in split_segments(template) {
            let segment = substitute(raw, &bound.path_params).map_err(|variable| {
                BindingError::UnresolvedTemplate {
                    method: binding.name.clone(),
                    variable,
                }
            })?;
            if is_dot_segment(&segment) {
                return Err(invalid(format!(
                    "path segment `{raw}` resolves to the dot segment `{segment}`"
                )));
            }
            segments.push(segment);
        }
    }

    let matrix: String = bound
        .matrix_params
        .iter()
        .map(|(k, v)| format!(";{}={}", encode_segment(k), encode_segment(v)))
        .collect();

    let mut url = config.endpoint.clone();
    if segments.is_empty() && matrix.is_empty() {
        return Ok(with_query(url, &bound.query_params));
    }
    if url.cannot_be_a_base() {
        return Err(invalid(format!(
            "endpoint `{}` cannot carry a path",
            config.endpoint
        )));
    }

    let mut path = url.path().trim_end_matches('/').to_string();
    for segment in &segments {
        path.push('/');
        path.push_str(segment);
    }
    path.push_str(&matrix);
    url.set_path(&path);

    Ok(with_query(url, &bound.query_params))
}

fn with_query(mut url: Url, pairs: &[(String, String)]) -> Url {
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

/// Characters escaped in substituted path values and matrix parameters.
const SEGMENT_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT_VALUE).to_string()
}

/// `.` and `..` (also percent-encoded) are collapsed by URL path parsing.
fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e." | ".%2e" | "%2e%2e"
    )
}

/// Split a path template on `/` outside of `{...}` groups.
fn split_segments(template: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in template.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                segments.push(&template[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&template[start..]);
    segments.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Replace `{name}` / `{name: regex}` groups with percent-encoded bound values.
///
/// Returns the name of the first variable that has no value.
fn substitute(segment: &str, params: &[(String, String)]) -> Result<String, String> {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let group = &rest[open + 1..];

        let mut depth = 1usize;
        let mut close = None;
        for (i, c) in group.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else {
            return Err(group.trim().to_string());
        };

        let inner = &group[..close];
        let name = inner.split(':').next().unwrap_or(inner).trim();
        let value = params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| name.to_string())?;
        out.push_str(&encode_segment(value));
        rest = &group[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
