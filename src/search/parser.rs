//! HTML parsing for BDTD pages
//!
//! All knowledge of the site's markup lives here: the result-listing entries
//! (`div.media`), the pagination block, the record detail layout, and the
//! full-text anchor scan used by the PDF harvest. The markup is an external,
//! unversioned contract; parsing is lenient wherever a field is optional and
//! strict only where a missing piece makes the row meaningless.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::SearchHit;
use crate::RecordDetail;

fn selector(s: &str) -> Selector {
    Selector::parse(s).expect("static selector is valid")
}

static MEDIA: Lazy<Selector> = Lazy::new(|| selector("div.media"));
static FORMAT: Lazy<Selector> = Lazy::new(|| selector("span.format2"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector("a.title.getFull"));
static AUTHOR_DIV: Lazy<Selector> = Lazy::new(|| selector("div#rowAutor div"));
static AUTHOR_LINK: Lazy<Selector> = Lazy::new(|| selector("div#rowAutor div a"));
static DATE_ROW: Lazy<Selector> = Lazy::new(|| selector("div#datePublish"));
static FULLTEXT_LINK: Lazy<Selector> = Lazy::new(|| selector("a.fulltext"));
static PAGINATION_LINKS: Lazy<Selector> = Lazy::new(|| selector("ul.pagination a"));
static RECORD_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"h3[property="name"]"#));
static RECORD_ABSTRACT: Lazy<Selector> = Lazy::new(|| selector("div.col-sm-12 p"));
static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static TABLE_ROW: Lazy<Selector> = Lazy::new(|| selector("tr"));
static TABLE_CELL: Lazy<Selector> = Lazy::new(|| selector("th, td"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));

/// Label preceding the defense date in the listing.
const DEFENSE_DATE_LABEL: &str = "Data de Defesa";

/// Placeholder used when a record page carries no abstract.
const ABSTRACT_FALLBACK: &str = "Resumo não disponível.";

/// Parse errors for pages whose structure must be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A required element was not found
    #[error("missing {what} in {context}")]
    MissingElement {
        /// CSS description of the element
        what: &'static str,
        /// Which page kind was being parsed
        context: &'static str,
    },

    /// The page structure contradicts itself
    #[error("malformed page: {0}")]
    Malformed(String),
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// Extract the record id from a record URL (`.../Record/<id>[/...]`).
pub fn record_id_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("Record/")?;
    let id: String = rest
        .chars()
        .take_while(|c| !matches!(c, '/' | '?' | '#'))
        .collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Discover the total page count from the pagination block.
///
/// Takes the maximum `page=` value among the pagination anchors rather than
/// trusting any single link, so reordered or duplicated controls cannot skew
/// the count. `None` when the page has no pagination block (a single page of
/// results).
pub fn parse_total_pages(html: &str) -> Option<usize> {
    let document = Html::parse_document(html);

    document
        .select(&PAGINATION_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(page_param)
        .max()
}

fn page_param(href: &str) -> Option<usize> {
    let (_, rest) = href.split_once("page=")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Parse one results-listing page into search hits.
///
/// Lenient per entry: a listing row without a usable title link is skipped
/// with a warning instead of failing the page, so one broken entry never
/// hides its page-mates. A page with no `div.media` entries yields an empty
/// vector, which the pagination driver treats as the end of real content.
pub fn parse_search_page(html: &str, base: &Url) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let mut hits = Vec::new();

    for (position, entry) in document.select(&MEDIA).enumerate() {
        match parse_listing_entry(entry, base) {
            Ok(hit) => hits.push(hit),
            Err(e) => {
                warn!(position, error = %e, "Skipping malformed listing entry");
            }
        }
    }

    hits
}

fn parse_listing_entry(entry: ElementRef<'_>, base: &Url) -> Result<SearchHit, ParseError> {
    let title_link = entry
        .select(&TITLE_LINK)
        .next()
        .ok_or(ParseError::MissingElement {
            what: "a.title.getFull",
            context: "listing entry",
        })?;

    let title = element_text(title_link);
    if title.is_empty() {
        return Err(ParseError::MissingElement {
            what: "title text",
            context: "listing entry",
        });
    }

    let href = title_link
        .value()
        .attr("href")
        .ok_or(ParseError::MissingElement {
            what: "title href",
            context: "listing entry",
        })?;
    let record_url = base
        .join(href)
        .map_err(|e| ParseError::Malformed(format!("bad record link '{href}': {e}")))?
        .to_string();

    let id = record_id_from_url(&record_url).ok_or_else(|| {
        ParseError::Malformed(format!("record link without Record/ segment: {record_url}"))
    })?;

    let material_type = entry
        .select(&FORMAT)
        .next()
        .map(element_text)
        .unwrap_or_default();

    // Prefer the author anchor text; the surrounding div carries the label.
    let author_link = entry.select(&AUTHOR_LINK).next();
    let author = author_link
        .map(element_text)
        .filter(|s| !s.is_empty())
        .or_else(|| entry.select(&AUTHOR_DIV).next().map(element_text))
        .unwrap_or_default();
    let author_url = author_link
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| base.join(href).ok())
        .map(|u| u.to_string());

    let defense_date = entry
        .select(&DATE_ROW)
        .next()
        .map(element_text)
        .map(|text| match text.split_once(DEFENSE_DATE_LABEL) {
            Some((_, rest)) => rest.trim_start_matches(':').trim().to_string(),
            None => text,
        })
        .unwrap_or_default();

    let fulltext_url = entry
        .select(&FULLTEXT_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| base.join(href).ok())
        .map(|u| u.to_string());

    Ok(SearchHit {
        id,
        material_type,
        title,
        author,
        defense_date,
        record_url,
        author_url,
        fulltext_url,
    })
}

/// Parse one record detail page.
///
/// The title is required; everything else degrades gracefully (missing
/// abstract becomes the site's own "Resumo não disponível." placeholder, a
/// missing description table yields no extra fields).
pub fn parse_record_page(html: &str, id: &str) -> Result<RecordDetail, ParseError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&RECORD_TITLE)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingElement {
            what: r#"h3[property="name"]"#,
            context: "record page",
        })?;

    let abstract_text = document
        .select(&RECORD_ABSTRACT)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| ABSTRACT_FALLBACK.to_string());

    let fields = document
        .select(&TABLE)
        .next()
        .map(parse_description_table)
        .unwrap_or_default();

    Ok(RecordDetail {
        id: id.to_string(),
        title,
        abstract_text,
        fields,
    })
}

fn parse_description_table(table: ElementRef<'_>) -> Vec<(String, String)> {
    let mut fields = Vec::new();

    for row in table.select(&TABLE_ROW) {
        let cells: Vec<String> = row.select(&TABLE_CELL).map(element_text).collect();
        if cells.len() < 2 {
            continue;
        }
        let key = cells[0].trim_end_matches(':').trim().to_string();
        if key.is_empty() {
            continue;
        }
        fields.push((key, cells[1..].join(" ").trim().to_string()));
    }

    fields
}

/// Collect PDF links from a full-text landing page.
///
/// Matches any anchor whose href contains ".pdf" case-insensitively,
/// resolved against the page URL. Duplicates are dropped, first occurrence
/// wins, document order preserved.
pub fn extract_pdf_links(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().contains(".pdf") {
            continue;
        }
        let Ok(resolved) = page_url.join(href) else {
            warn!(href, "Skipping unresolvable PDF link");
            continue;
        };
        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}
