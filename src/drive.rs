//! Google Drive share links.
//!
//! A share link points at a viewer page, not the file. Small files are
//! served from `uc?export=download`; large ones first answer with a
//! "can't scan for viruses" page whose download form (or `confirm` token)
//! leads to the actual bytes.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

const DIRECT_BASE: &str = "https://drive.google.com/uc";

static FILE_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/file/d/([A-Za-z0-9_-]+)").expect("drive file path pattern is valid")
});

static FORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<form[^>]*id="download-form"[^>]*>(.*?)</form>"#)
        .expect("drive form pattern is valid")
});

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<form[^>]*action="([^"]+)""#).expect("drive action pattern is valid")
});

static HIDDEN_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input[^>]*type="hidden"[^>]*name="([^"]+)"[^>]*value="([^"]*)""#)
        .expect("drive input pattern is valid")
});

static CONFIRM_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(/uc\?export=download[^"]*)""#).expect("drive href pattern is valid")
});

static CONFIRM_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"confirm=([0-9A-Za-z_-]+)").expect("drive confirm pattern is valid")
});

pub fn is_drive_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .map(|host| host == "drive.google.com" || host == "drive.usercontent.google.com")
        .unwrap_or(false)
}

/// File id of a Drive link, from `/file/d/<id>/...` or an `id=` query.
pub fn file_id(url: &str) -> Option<String> {
    if !is_drive_url(url) {
        return None;
    }
    if let Some(caps) = FILE_PATH_RE.captures(url) {
        return Some(caps[1].to_string());
    }
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

/// Rewrites a Drive share link to its direct-download form. Other URLs,
/// and links already pointing at a download endpoint, come back unchanged.
pub fn direct_url(url: &str) -> String {
    match file_id(url) {
        Some(id) if FILE_PATH_RE.is_match(url) || url.contains("/open") => {
            format!("{DIRECT_BASE}?export=download&id={id}")
        }
        _ => url.to_string(),
    }
}

/// The follow-up URL hidden in a Drive confirmation page, if any.
pub fn confirmation_url(html: &str, page_url: &str) -> Option<String> {
    if let Some(form) = FORM_RE.captures(html) {
        let action = ACTION_RE.captures(&form[0])?;
        let action = unescape(&action[1]);
        let params: Vec<(String, String)> = HIDDEN_INPUT_RE
            .captures_iter(&form[1])
            .map(|caps| (unescape(&caps[1]), unescape(&caps[2])))
            .collect();
        return Url::parse_with_params(&action, &params)
            .ok()
            .map(String::from);
    }

    if let Some(caps) = CONFIRM_HREF_RE.captures(html) {
        let base = Url::parse(page_url).ok()?;
        return base.join(&unescape(&caps[1])).ok().map(String::from);
    }

    let token = CONFIRM_TOKEN_RE.captures(html)?;
    let mut url = Url::parse(page_url).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "confirm")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("confirm", &token[1]);
    Some(url.into())
}

fn unescape(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
