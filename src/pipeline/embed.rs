//! Embed resolution: one embedded record becomes one content part.
//!
//! Only referenced posts are rendered. Every other record kind is reported
//! as unhandled so the caller can drop the embed and keep the message.

use crate::error::EmbedError;
use crate::lexicon::{EmbeddedRecord, MessageEmbed, RecordValue, ViewRecord};
use crate::pipeline::types::ContentPart;

/// Body used when a referenced record is not a feed post.
pub const UNPARSED_RECORD_TEXT: &str = "not parsed";

const POST_COLLECTION: &str = "app.bsky.feed.post";
const WEB_BASE_URL: &str = "https://bsky.app";

/// Unwrap the record view of a message embed and resolve it.
pub fn resolve_embed(embed: &MessageEmbed) -> Result<ContentPart, EmbedError> {
    match embed {
        MessageEmbed::Record(view) => match &view.record {
            Some(record) => resolve_record(record),
            None => Err(EmbedError::MissingRecord),
        },
        MessageEmbed::Unknown => Err(EmbedError::UnhandledEmbedKind(embed.kind())),
    }
}

/// Convert a single embedded record into a content part.
pub fn resolve_record(record: &EmbeddedRecord) -> Result<ContentPart, EmbedError> {
    match record {
        EmbeddedRecord::ReferencedPost(post) => {
            let text = decode_record_value(&post.value);
            Ok(ContentPart::text(text).with_html(render_post_html(post, text)))
        }
        EmbeddedRecord::NotFound(_)
        | EmbeddedRecord::Blocked(_)
        | EmbeddedRecord::Detached(_)
        | EmbeddedRecord::FeedGenerator(_)
        | EmbeddedRecord::List(_)
        | EmbeddedRecord::Labeler(_)
        | EmbeddedRecord::StarterPack(_)
        | EmbeddedRecord::Unknown => Err(EmbedError::UnhandledRecordKind(record.kind())),
    }
}

/// Display text of a referenced record. Never fails.
pub fn decode_record_value(value: &RecordValue) -> &str {
    match value {
        RecordValue::FeedPost(post) => &post.text,
        RecordValue::Unknown => UNPARSED_RECORD_TEXT,
    }
}

/// Web URL of a post, from its `at://<authority>/<collection>/<rkey>` URI.
///
/// Uses the author's handle when known so the link is readable.
pub fn post_web_url(post: &ViewRecord) -> Option<String> {
    let rest = post.uri.strip_prefix("at://")?;
    let mut segments = rest.split('/');
    let authority = segments.next().filter(|s| !s.is_empty())?;
    let collection = segments.next()?;
    let rkey = segments.next().filter(|s| !s.is_empty())?;
    if collection != POST_COLLECTION || segments.next().is_some() {
        return None;
    }
    let profile = if post.author.handle.is_empty() {
        authority
    } else {
        post.author.handle.as_str()
    };
    Some(format!("{WEB_BASE_URL}/profile/{profile}/post/{rkey}"))
}

/// HTML rendering of a quoted post: link line plus a blockquote card.
fn render_post_html(post: &ViewRecord, text: &str) -> String {
    let url = post_web_url(post);
    let author = &post.author;
    let handle = if author.handle.is_empty() {
        author.did.as_str()
    } else {
        author.handle.as_str()
    };
    let author_label = match author.display_name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => format!("{} (@{})", escape_html(name), escape_html(handle)),
        None => format!("@{}", escape_html(handle)),
    };

    let mut html = String::new();
    if let Some(url) = &url {
        let url = escape_html(url);
        html.push_str(&format!("<a href=\"{url}\">{url}</a>\n"));
    }
    html.push_str("<blockquote class=\"bsky-embed\">");

    html.push_str("<p class=\"bsky-embed-author\">");
    if let Some(avatar) = author.avatar.as_deref().filter(|a| !a.is_empty()) {
        html.push_str(&format!(
            "<img data-mx-emoticon height=\"24\" src=\"{}\" alt=\"\">&nbsp;",
            escape_html(avatar)
        ));
    }
    match &url {
        Some(url) => html.push_str(&format!(
            "<a href=\"{}\">{author_label}</a>",
            escape_html(url)
        )),
        None => html.push_str(&author_label),
    }
    html.push_str("</p>");

    html.push_str(&format!(
        "<p class=\"bsky-embed-description\">{}</p>",
        escape_html(text).replace('\n', "<br>")
    ));

    if let Some(likes) = post.like_count {
        html.push_str(&format!(
            "<table class=\"bsky-embed-fields\"><tr><th>Likes</th></tr><tr><td>{likes}</td></tr></table>"
        ));
    }

    html.push_str("<p class=\"bsky-embed-footer\"><sub>Bluesky");
    if !post.indexed_at.is_empty() {
        html.push_str(&format!(
            " • <time datetime=\"{0}\">{0}</time>",
            escape_html(&post.indexed_at)
        ));
    }
    html.push_str("</sub></p></blockquote>");
    html
}

/// Escape text for interpolation into HTML bodies and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
