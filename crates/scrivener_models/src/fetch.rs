//! URL to article text.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use scrivener_interface::ArticleFetcher;
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const WECHAT_HOST: &str = "mp.weixin.qq.com";

/// Tags whose text never counts as article content.
const CHROME_TAGS: &[&str] = &["script", "style", "nav", "footer", "header"];

/// Fetches pages over HTTP and extracts readable text.
#[derive(Debug, Clone)]
pub struct HttpArticleFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl HttpArticleFetcher {
    /// Create a fetcher that truncates articles to `max_chars` characters.
    pub fn new(max_chars: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self { client, max_chars }
    }

    async fn fetch_html(&self, url: &Url) -> Result<String, reqwest::Error> {
        let host = url.host_str().unwrap_or_default();
        let referer = if host.contains(WECHAT_HOST) {
            format!("https://{}/", WECHAT_HOST)
        } else {
            format!("{}://{}/", url.scheme(), host)
        };
        self.client
            .get(url.as_str())
            .header(reqwest::header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8")
            .header(reqwest::header::REFERER, referer)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Option<String> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "Invalid article URL");
                return None;
            }
        };
        match self.fetch_html(&parsed).await {
            Ok(html) => {
                let text = extract_article(parsed.host_str().unwrap_or_default(), &html, self.max_chars);
                debug!(chars = text.as_ref().map(|t| t.chars().count()), "Article extracted");
                text
            }
            Err(e) => {
                error!(error = %e, "Article fetch failed");
                None
            }
        }
    }
}

/// Extract article text from a page.
///
/// WeChat article pages use the `#activity-name` title and `#js_content`
/// body. Other pages keep every non-empty line outside script, style and
/// page chrome. Returns `None` when nothing readable remains.
///
/// ```
/// use scrivener_models::extract_article;
///
/// let html = "<html><body><nav>菜单</nav><p> 第一段 </p><p>第二段</p></body></html>";
/// assert_eq!(extract_article("example.com", html, 100).as_deref(), Some("第一段\n第二段"));
/// ```
pub fn extract_article(host: &str, html: &str, max_chars: usize) -> Option<String> {
    let document = Html::parse_document(html);

    if host.contains(WECHAT_HOST) {
        if let Some(text) = wechat_article(&document) {
            return Some(truncate(&text, max_chars));
        }
    }

    let root = document.root_element();
    let merged = text_pieces(root, CHROME_TAGS)
        .join("\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!merged.is_empty()).then(|| truncate(&merged, max_chars))
}

fn wechat_article(document: &Html) -> Option<String> {
    let content = select_first(document, "#js_content")?;
    let title = select_first(document, "#activity-name")
        .map(|node| {
            node.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    let body = text_pieces(content, &["script", "style"])
        .iter()
        .map(|piece| piece.trim())
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let merged = format!("{}\n\n{}", title, body).trim().to_string();
    (!merged.is_empty()).then_some(merged)
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn text_pieces(root: ElementRef<'_>, skip: &[&str]) -> Vec<String> {
    root.descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| skip.contains(&element.name()))
            })
        })
        .map(|(_, text)| text.to_string())
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
