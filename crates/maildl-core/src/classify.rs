//! Per-URL downloader classification for the dispatching-download goal.
//!
//! Order matters and the first match wins: the cheap numeric-ID check runs
//! before hostname parsing, and anything the allow-list does not claim
//! degrades to the plain wget fetch (including tokens whose hostname cannot
//! be parsed at all, which keep their original text as the argument).

use url::Url;

/// Domain labels handled by you-get. Data-driven so new sites are an entry
/// here, not a code change.
pub const YOU_GET_SITES: &[&str] = &[
    "163", "56", "acfun", "archive", "baidu", "bandcamp", "baomihua", "bilibili", "cntv", "cbs",
    "dailymotion", "dilidili", "dongting", "douban", "douyutv", "ehow", "facebook", "flickr",
    "freesound", "fun", "google", "heavy-music", "iask", "ifeng", "in", "instagram", "interest",
    "iqilu", "iqiyi", "isuntv", "joy", "jpopsuki", "kankanews", "khanacademy", "ku6", "kugou",
    "kuwo", "letv", "lizhi", "magisto", "metacafe", "miomio", "mixcloud", "mtv81", "musicplayon",
    "7gogo", "nicovideo", "pinterest", "pixnet", "pptv", "qianmo", "qq", "sina", "smgbb", "sohu",
    "soundcloud", "ted", "theplatform", "tucao", "tudou", "tumblr", "twitter", "vidto", "vimeo",
    "weibo", "veoh", "vine", "vk", "xiami", "xiaokaxiu", "yinyuetai", "miaopai", "youku", "youtu",
    "youtube", "zhanqi",
];

/// Which downloader a token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlClass {
    /// Bare or `av`-prefixed numeric video id; the canonical URL is rebuilt
    /// from the digits.
    Bilibili { id: String },
    /// Hostname carries an allow-listed label; token passed to you-get verbatim.
    YouGet,
    /// Everything else, including unparseable tokens: plain resuming fetch.
    Wget,
}

/// Digits of a bare or `av`-prefixed numeric id, or None.
pub fn numeric_id(token: &str) -> Option<&str> {
    let digits = token.strip_prefix("av").unwrap_or(token);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

/// Canonical video URL for a numeric id. One form for every code path; the
/// site-specific goal and the dispatcher must agree.
pub fn bilibili_url(id: &str) -> String {
    format!("https://www.bilibili.com/video/av{id}")
}

/// Classify one URL-like token.
pub fn classify(token: &str) -> UrlClass {
    if let Some(id) = numeric_id(token) {
        return UrlClass::Bilibili { id: id.to_string() };
    }

    let with_scheme = if token.contains("://") {
        token.to_string()
    } else {
        format!("http://{token}")
    };

    match Url::parse(&with_scheme) {
        Ok(parsed) => {
            if let Some(host) = parsed.host_str() {
                if host.split('.').any(|label| YOU_GET_SITES.contains(&label)) {
                    return UrlClass::YouGet;
                }
            }
            UrlClass::Wget
        }
        // Unparseable token: fall back to wget with the original token.
        Err(_) => UrlClass::Wget,
    }
}
