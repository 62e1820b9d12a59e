// src/ingest/xml.rs
//! Event-driven RSS 2.0 / Atom reader used by the raw-content strategies.
//!
//! Collects the direct children of every `<item>` (RSS) or `<entry>` (Atom)
//! as text, plus the attribute-only image elements (`media:content`,
//! `media:thumbnail`, `enclosure`) and Atom `<link href>`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::ingest::types::Enclosure;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub author: Option<String>,
    pub media_url: Option<String>,
    pub enclosure: Option<Enclosure>,
}

pub fn parse_feed(xml: &str) -> Result<Vec<XmlItem>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    // Feeds in the wild embed sloppy HTML; do not fail on mismatched tags.
    reader.config_mut().check_end_names = false;

    let mut items = Vec::new();
    let mut current: Option<XmlItem> = None;
    // Elements open inside the current item; `open[0]` is the field being read.
    let mut open: Vec<String> = Vec::new();
    let mut buf = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = qname(e.name());
                match current.as_mut() {
                    Some(item) => {
                        take_attributes(item, &name, &e);
                        if open.is_empty() {
                            buf.clear();
                        }
                        open.push(name);
                    }
                    None if is_entry(&name) => {
                        current = Some(XmlItem::default());
                        open.clear();
                    }
                    None => {}
                }
            }
            Event::Empty(e) => {
                if let Some(item) = current.as_mut() {
                    take_attributes(item, &qname(e.name()), &e);
                }
            }
            Event::Text(e) => {
                if current.is_none() || open.is_empty() || skip_inner(&open) {
                    continue;
                }
                let text = match e.unescape() {
                    Ok(t) => t.into_owned(),
                    // HTML entities like &nbsp; are not XML; decode them leniently
                    Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(&e))
                        .into_owned(),
                };
                push_text(&mut buf, &text);
            }
            Event::CData(e) => {
                if current.is_some() && !open.is_empty() && !skip_inner(&open) {
                    push_text(&mut buf, &String::from_utf8_lossy(&e));
                }
            }
            Event::End(e) => {
                let Some(item) = current.as_mut() else {
                    continue;
                };
                let name = qname(e.name());
                if let Some(pos) = open.iter().rposition(|n| *n == name) {
                    // Unclosed markup inside a field (`<br>`) closes with it.
                    open.truncate(pos + 1);
                    let closed = open.pop();
                    if let (true, Some(field)) = (open.is_empty(), closed) {
                        assign_field(item, &field, std::mem::take(&mut buf));
                    }
                } else if is_entry(&name) {
                    if let Some(field) = open.first() {
                        assign_field(item, field, std::mem::take(&mut buf));
                    }
                    open.clear();
                    if let Some(done) = current.take() {
                        items.push(done);
                    }
                }
                // Anything else is a stray end tag from embedded markup.
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

fn qname(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).to_ascii_lowercase()
}

fn is_entry(name: &str) -> bool {
    matches!(name, "item" | "entry")
}

fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

// Atom <author> carries <email>/<uri> next to <name>; keep only the name.
fn skip_inner(open: &[String]) -> bool {
    open.first().map(String::as_str) == Some("author")
        && matches!(open.last().map(String::as_str), Some("email" | "uri"))
}

fn take_attributes(item: &mut XmlItem, name: &str, e: &BytesStart<'_>) {
    match name {
        "media:content" | "media:thumbnail" | "thumbnail" => {
            if item.media_url.is_some() {
                return;
            }
            let medium_ok = attr(e, "medium").map_or(true, |m| m.eq_ignore_ascii_case("image"));
            let type_ok = attr(e, "type").map_or(true, |t| t.starts_with("image/"));
            if medium_ok && type_ok {
                item.media_url = attr(e, "url");
            }
        }
        "enclosure" => {
            if item.enclosure.is_none() {
                if let Some(url) = attr(e, "url") {
                    item.enclosure = Some(Enclosure {
                        url,
                        mime: attr(e, "type"),
                    });
                }
            }
        }
        "link" => {
            let rel_ok = attr(e, "rel").map_or(true, |r| r == "alternate");
            if item.link.is_none() && rel_ok {
                item.link = attr(e, "href");
            }
        }
        _ => {}
    }
}

fn assign_field(item: &mut XmlItem, name: &str, value: String) {
    if value.trim().is_empty() {
        return;
    }
    let slot = match name {
        "title" => &mut item.title,
        "description" => &mut item.description,
        "content:encoded" | "content" => &mut item.content,
        "summary" => &mut item.summary,
        "link" => &mut item.link,
        "pubdate" | "published" => {
            // explicit publish dates beat `updated`
            item.published = Some(value);
            return;
        }
        "updated" | "dc:date" | "date" => &mut item.published,
        "author" | "dc:creator" | "creator" => &mut item.author,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(value);
    }
}

fn push_text(buf: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Channel title</title>
    <image><url>https://x/logo.png</url></image>
    <item>
      <title>First &amp; foremost</title>
      <link>https://x/1</link>
      <description><![CDATA[<p>Talks <b>resume</b></p>]]></description>
      <pubDate>Mon, 15 Jan 2024 10:00:00 GMT</pubDate>
      <dc:creator>Jane Doe</dc:creator>
      <media:content url="https://x/1.jpg" medium="image"/>
    </item>
    <item>
      <title>Second</title>
      <link>https://x/2</link>
      <description>Plain&nbsp;text</description>
      <enclosure url="https://x/2.mp3" type="audio/mpeg" length="1"/>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom feed</title>
  <entry>
    <title>Atom entry</title>
    <link rel="alternate" href="https://y/a"/>
    <updated>2024-02-01T09:00:00Z</updated>
    <published>2024-02-01T08:00:00Z</published>
    <author><name>Sam</name><email>sam@y</email></author>
    <summary>Short summary</summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items_with_media_and_creator() {
        let items = parse_feed(RSS).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.title.as_deref(), Some("First & foremost"));
        assert_eq!(first.link.as_deref(), Some("https://x/1"));
        assert_eq!(first.description.as_deref(), Some("<p>Talks <b>resume</b></p>"));
        assert_eq!(first.published.as_deref(), Some("Mon, 15 Jan 2024 10:00:00 GMT"));
        assert_eq!(first.author.as_deref(), Some("Jane Doe"));
        assert_eq!(first.media_url.as_deref(), Some("https://x/1.jpg"));

        let second = &items[1];
        assert_eq!(second.description.as_deref(), Some("Plain\u{a0}text"));
        let enc = second.enclosure.as_ref().unwrap();
        assert_eq!(enc.mime.as_deref(), Some("audio/mpeg"));
        assert!(second.media_url.is_none());
    }

    #[test]
    fn parses_atom_entries() {
        let items = parse_feed(ATOM).unwrap();
        assert_eq!(items.len(), 1);
        let e = &items[0];
        assert_eq!(e.link.as_deref(), Some("https://y/a"));
        assert_eq!(e.published.as_deref(), Some("2024-02-01T08:00:00Z"));
        assert_eq!(e.author.as_deref(), Some("Sam"));
        assert_eq!(e.summary.as_deref(), Some("Short summary"));
    }

    #[test]
    fn unclosed_html_in_a_field_does_not_swallow_later_items() {
        let xml = "<rss><channel>\
            <item><title>A</title><description>one<br>two</description><link>https://x/a</link></item>\
            <item><title>B</title><link>https://x/b</link></item>\
            </channel></rss>";
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description.as_deref(), Some("one two"));
        assert_eq!(items[0].link.as_deref(), Some("https://x/a"));
        assert_eq!(items[1].title.as_deref(), Some("B"));
        assert_eq!(items[1].link.as_deref(), Some("https://x/b"));
    }

    #[test]
    fn stray_end_tags_and_unclosed_fields_are_tolerated() {
        let xml = "<rss><channel>\
            <item><title>A</title></p><description>text<i>open</item>\
            <item><title>B</title></item>\
            </channel></rss>";
        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("A"));
        assert_eq!(items[0].description.as_deref(), Some("text open"));
        assert_eq!(items[1].title.as_deref(), Some("B"));
    }

    #[test]
    fn document_without_entries_yields_nothing() {
        let items = parse_feed("<rss><channel><title>x</title></channel></rss>").unwrap();
        assert!(items.is_empty());
    }
}
