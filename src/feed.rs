//! RSS rendering of the cached result batch
//!
//! Builds an RSS 2.0 document through `quick-xml`'s writer, which escapes
//! every text node and attribute value on the way out.

use crate::show::ResultItem;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
const FEED_DESCRIPTION: &str = "torrent search";
const FEED_LANGUAGE: &str = "en-us";

/// Errors that can occur while rendering a feed
#[derive(Debug, Error)]
pub enum FeedError {
    /// The XML writer rejected an event
    #[error("Failed to write feed XML: {0}")]
    Write(String),

    /// The rendered document is not valid UTF-8
    #[error("Rendered feed is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Renders a result batch as an RSS 2.0 document
///
/// The channel carries the provider's name and URL, a self-referencing
/// `atom:link`, and one `<item>` per result. Output depends only on the
/// arguments, so equal inputs render byte-identical documents.
///
/// # Examples
///
/// ```
/// use kat_search::{ResultItem, render_feed};
///
/// let batch = vec![ResultItem {
///     title: "Law & Order S01E01".to_string(),
///     link: "http://kat.ph/law.torrent".to_string(),
/// }];
/// let xml = render_feed("KickAss", "http://kat.ph/", &batch).unwrap();
/// assert!(xml.contains("<title>Law &amp; Order S01E01</title>"));
/// ```
pub fn render_feed(
    provider_name: &str,
    provider_url: &str,
    batch: &[ResultItem],
) -> Result<String, FeedError> {
    let mut writer = Writer::new(Vec::new());

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(
        &mut writer,
        Event::Start(
            BytesStart::new("rss").with_attributes([("xmlns:atom", ATOM_NAMESPACE), ("version", "2.0")]),
        ),
    )?;
    emit(&mut writer, Event::Start(BytesStart::new("channel")))?;

    text_element(&mut writer, "title", provider_name)?;
    text_element(&mut writer, "link", provider_url)?;
    text_element(&mut writer, "description", FEED_DESCRIPTION)?;
    text_element(&mut writer, "language", FEED_LANGUAGE)?;
    emit(
        &mut writer,
        Event::Empty(BytesStart::new("atom:link").with_attributes([
            ("href", provider_url),
            ("rel", "self"),
            ("type", "application/rss+xml"),
        ])),
    )?;

    for item in batch {
        emit(&mut writer, Event::Start(BytesStart::new("item")))?;
        text_element(&mut writer, "title", &item.title)?;
        text_element(&mut writer, "link", &item.link)?;
        emit(&mut writer, Event::End(BytesEnd::new("item")))?;
    }

    emit(&mut writer, Event::End(BytesEnd::new("channel")))?;
    emit(&mut writer, Event::End(BytesEnd::new("rss")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

/// Writes `<name>text</name>` with the text escaped
fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), FeedError> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), FeedError> {
    writer
        .write_event(event)
        .map_err(|e| FeedError::Write(e.to_string()))
}
