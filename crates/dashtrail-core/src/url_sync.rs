//! Leaf-token encoding of a trail into the `breadcrumb` query parameter.
//!
//! A trail is written as its ids joined by commas, oldest first. Decoding
//! only yields raw tokens; they become items once resolved against the
//! directory, and tokens the directory does not know are dropped.

use tracing::debug;

use crate::error::TrailError;
use crate::model::BreadcrumbItem;
use crate::params::{QueryParams, BREADCRUMB_PARAM};

pub const TOKEN_SEPARATOR: char = ',';
pub const MAX_TOKEN_LEN: usize = 128;

/// Encode trail ids in order. Bytes outside `[A-Za-z0-9_-]` are written
/// as `%XX` so any opaque id survives the trip through the URL.
pub fn encode_trail(items: &[BreadcrumbItem]) -> String {
    let tokens: Vec<String> = items.iter().map(|item| escape_token(&item.id)).collect();
    tokens.join(",")
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

fn escape_token(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if is_token_byte(byte) {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn unescape_token(token: &str) -> Result<String, String> {
    let bytes = token.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let byte = bytes[index];
        if byte == b'%' {
            let hex = token
                .get(index + 1..index + 3)
                .ok_or_else(|| "truncated escape".to_string())?;
            let value = u8::from_str_radix(hex, 16)
                .map_err(|_| format!("invalid escape %{hex}"))?;
            out.push(value);
            index += 3;
        } else if is_token_byte(byte) {
            out.push(byte);
            index += 1;
        } else {
            return Err(format!("illegal character {:?}", char::from(byte)));
        }
    }
    String::from_utf8(out).map_err(|_| "escape is not valid UTF-8".to_string())
}

/// Split a `breadcrumb` value into leaf tokens, undoing `%XX` escapes.
///
/// Empty tokens, characters outside `[A-Za-z0-9_-]` and broken escapes are
/// rejected as `MalformedEncoding`. Repeated tokens keep their first
/// occurrence.
pub fn decode_tokens(raw: &str) -> Result<Vec<String>, TrailError> {
    let mut tokens: Vec<String> = Vec::new();
    for (position, token) in raw.split(TOKEN_SEPARATOR).enumerate() {
        let token = token.trim();
        if token.is_empty() {
            return Err(TrailError::malformed(
                raw,
                format!("empty token at position {position}"),
            ));
        }
        let token = unescape_token(token).map_err(|reason| {
            TrailError::malformed(raw, format!("{reason} in token at position {position}"))
        })?;
        if token.chars().count() > MAX_TOKEN_LEN {
            return Err(TrailError::malformed(
                raw,
                format!("token at position {position} exceeds {MAX_TOKEN_LEN} characters"),
            ));
        }
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    Ok(tokens)
}

/// Tokens carried by a location's query, if it has a non-blank `breadcrumb`.
pub fn tokens_from_query(params: &QueryParams) -> Option<Result<Vec<String>, TrailError>> {
    let raw = params.get(BREADCRUMB_PARAM)?;
    if raw.trim().is_empty() {
        return None;
    }
    Some(decode_tokens(raw))
}

/// Copy of `params` with `breadcrumb` set to the encoded trail, or removed
/// when the trail is empty.
pub fn with_breadcrumb(params: &QueryParams, items: &[BreadcrumbItem]) -> QueryParams {
    let mut out = params.clone();
    if items.is_empty() {
        out.remove(BREADCRUMB_PARAM);
    } else {
        out.insert(BREADCRUMB_PARAM.to_string(), encode_trail(items));
    }
    out
}

/// Turn tokens into items with `resolve`, preserving order and dropping
/// tokens it cannot resolve.
pub fn resolve_tokens<F>(tokens: &[String], mut resolve: F) -> Vec<BreadcrumbItem>
where
    F: FnMut(&str) -> Option<BreadcrumbItem>,
{
    let mut items = Vec::with_capacity(tokens.len());
    for token in tokens {
        match resolve(token) {
            Some(item) => items.push(item),
            None => debug!(token = %token, "dropping breadcrumb token without directory match"),
        }
    }
    items
}
