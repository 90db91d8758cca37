//! `(query, page)` pair and its URL query-string form.
//!
//! `q` carries the query text and is omitted when empty; `page` carries the
//! page number and is omitted when it is 1.

/// Search state mirrored into the URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub page: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: 1,
        }
    }
}

impl SearchParams {
    pub fn new(query: impl Into<String>, page: u32) -> Self {
        Self {
            query: query.into(),
            page: page.max(1),
        }
    }

    /// Read `q` and `page` from a location, a query string, or a full URL
    ///
    /// A missing, non-numeric or zero `page` reads as 1. When a parameter
    /// repeats, the first occurrence wins.
    pub fn from_location(location: &str) -> Self {
        let search = search_part(location);
        let mut query = None;
        let mut page = None;

        for pair in search.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match decode(key).as_str() {
                "q" if query.is_none() => query = Some(decode(value)),
                "page" if page.is_none() => page = Some(decode(value)),
                _ => {}
            }
        }

        let page = page
            .and_then(|page| page.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);

        Self {
            query: query.unwrap_or_default(),
            page,
        }
    }

    /// Render as a query string without the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if !self.query.is_empty() {
            parts.push(format!("q={}", encode(&self.query)));
        }
        if self.page > 1 {
            parts.push(format!("page={}", self.page));
        }
        parts.join("&")
    }
}

/// The part of `location` after `?`, without any fragment
fn search_part(location: &str) -> &str {
    let location = location.split('#').next().unwrap_or("");
    match location.split_once('?') {
        Some((_, search)) => search,
        None if location.contains('=') => location,
        None => "",
    }
}

/// Form decoding: `+` is a space
fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Form encoding: spaces become `+`
fn encode(raw: &str) -> String {
    urlencoding::encode(raw).replace("%20", "+")
}
