/* src/server/core/rust/src/location.rs */

//! Request URL <-> `Location` conversion.
//!
//! A `Location` synthesized from a raw request URL always carries
//! [`SERVER_RENDER_LOCATION_KEY`]; locations produced by client navigation
//! carry a fresh key that can never collide with it.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Key marking a location produced by the server-side render pass.
pub const SERVER_RENDER_LOCATION_KEY: &str = "@@serverRender";

const KEY_LEN: usize = 6;
const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
  #[serde(default)]
  pub pathname: String,
  /// Query string including the leading `?`, or empty.
  #[serde(default)]
  pub search: String,
  /// Fragment including the leading `#`, or empty.
  #[serde(default)]
  pub hash: String,
  #[serde(default)]
  pub key: String,
  /// Host-level components of absolute URLs (protocol, auth, host, hostname, port).
  #[serde(flatten)]
  pub extra: BTreeMap<String, String>,
}

impl Location {
  /// Location for a client-side navigation entry, keyed with a fresh random key.
  pub fn navigate(url: &str) -> Self {
    Self::with_key(url, generate_key())
  }

  pub fn with_key(url: &str, key: impl Into<String>) -> Self {
    Self { key: key.into(), ..create_location_from_url(url) }
  }

  pub fn is_server_render(&self) -> bool {
    self.key == SERVER_RENDER_LOCATION_KEY
  }
}

/// Parse a request URL into a `Location` keyed with the server-render sentinel.
/// Never fails: whatever cannot be parsed ends up as empty components.
pub fn create_location_from_url(url: &str) -> Location {
  let (pathname, search, hash, extra) = match parse_absolute(url) {
    Some(parts) => parts,
    None => {
      let (pathname, search, hash) = split_relative(url);
      (pathname.to_string(), search.to_string(), hash.to_string(), BTreeMap::new())
    }
  };

  Location { pathname, search, hash, key: SERVER_RENDER_LOCATION_KEY.to_string(), extra }
}

/// Navigable path string of a location. Drops `key` and `extra`, so this is
/// not an inverse of [`create_location_from_url`] for absolute URLs.
pub fn get_url_from_location(location: &Location) -> String {
  format!("{}{}{}", location.pathname, location.search, location.hash)
}

/// `(pathname, search, hash)` of a scheme-less URL, split verbatim.
fn split_relative(url: &str) -> (&str, &str, &str) {
  let (rest, hash) = match url.find('#') {
    Some(idx) => url.split_at(idx),
    None => (url, ""),
  };
  let (pathname, search) = match rest.find('?') {
    Some(idx) => rest.split_at(idx),
    None => (rest, ""),
  };
  (pathname, search, hash)
}

fn has_scheme(url: &str) -> bool {
  let Some((scheme, _)) = url.split_once(':') else {
    return false;
  };
  let mut chars = scheme.chars();
  chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

type Parts = (String, String, String, BTreeMap<String, String>);

fn parse_absolute(url: &str) -> Option<Parts> {
  if !has_scheme(url) {
    return None;
  }
  let parsed = url::Url::parse(url).ok()?;

  let mut extra = BTreeMap::new();
  extra.insert("protocol".to_string(), format!("{}:", parsed.scheme()));
  if !parsed.username().is_empty() {
    let auth = match parsed.password() {
      Some(pw) => format!("{}:{pw}", parsed.username()),
      None => parsed.username().to_string(),
    };
    extra.insert("auth".to_string(), auth);
  }
  if let Some(hostname) = parsed.host_str() {
    let host = match parsed.port() {
      Some(port) => {
        extra.insert("port".to_string(), port.to_string());
        format!("{hostname}:{port}")
      }
      None => hostname.to_string(),
    };
    extra.insert("hostname".to_string(), hostname.to_string());
    extra.insert("host".to_string(), host);
  }

  // Path, query and fragment come from the raw input: dot segments stay put.
  let Some(rest) = raw_after_authority(url) else {
    let search = parsed.query().map(|q| format!("?{q}")).unwrap_or_default();
    let hash = parsed.fragment().map(|f| format!("#{f}")).unwrap_or_default();
    return Some((parsed.path().to_string(), search, hash, extra));
  };
  let (pathname, search, hash) = split_relative(rest);
  let pathname = if pathname.is_empty() { "/".to_string() } else { escape_unsafe(pathname) };
  Some((pathname, escape_unsafe(search), escape_unsafe(hash), extra))
}

/// Input after `scheme://authority`, or `None` for URLs without an authority.
fn raw_after_authority(url: &str) -> Option<&str> {
  let (_, rest) = url.split_once(':')?;
  let rest = rest.strip_prefix("//")?;
  let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
  Some(&rest[end..])
}

/// Percent-encode the characters a request line cannot carry literally.
fn escape_unsafe(part: &str) -> String {
  const UNSAFE: &[char] = &[' ', '"', '\'', '<', '>', '`', '{', '|', '}', '^', '\\'];
  if !part.contains(UNSAFE) {
    return part.to_string();
  }
  let mut out = String::with_capacity(part.len() + 8);
  for c in part.chars() {
    if UNSAFE.contains(&c) {
      out.push_str(&format!("%{:02X}", c as u32));
    } else {
      out.push(c);
    }
  }
  out
}

fn generate_key() -> String {
  let mut rng = rand::thread_rng();
  (0..KEY_LEN).map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char).collect()
}
