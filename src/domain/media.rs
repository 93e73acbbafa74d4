//! Which media URLs a project keeps after a save, and which media the
//! gallery puts forward when rendering it.

use serde::Serialize;

use crate::entities::{project::ProjectRecord, upload::StoredUpload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// GIFs and videos, shown as the clickable demo preview.
    Animated,
    /// Any other image, shown as the card thumbnail.
    Still,
    Unsupported,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "image/gif" || essence.starts_with("video/") {
            MediaKind::Animated
        } else if essence.starts_with("image/") {
            MediaKind::Still
        } else {
            MediaKind::Unsupported
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaFields {
    pub image_url: Option<String>,
    pub gif_url: Option<String>,
}

/// Save-time rule.
///
/// Without an upload the typed URLs are kept. An animated upload replaces
/// `gif_url` and clears `image_url`; a still image does the opposite. An
/// upload of any other type was still stored, but changes neither field.
pub fn resolve_on_save(current: MediaFields, upload: Option<&StoredUpload>) -> MediaFields {
    let Some(upload) = upload else {
        return current;
    };

    match MediaKind::from_mime(&upload.mime_type) {
        MediaKind::Animated => MediaFields {
            image_url: None,
            gif_url: Some(upload.public_url.clone()),
        },
        MediaKind::Still => MediaFields {
            image_url: Some(upload.public_url.clone()),
            gif_url: None,
        },
        MediaKind::Unsupported => {
            tracing::warn!(
                mime_type = %upload.mime_type,
                url = %upload.public_url,
                "uploaded file type is neither image nor video; media fields left unchanged"
            );
            current
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoPreview {
    pub url: String,
    pub title: String,
    pub alt_text: String,
}

impl DemoPreview {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let title = title.into();
        DemoPreview {
            url: url.into(),
            alt_text: format!("Démonstration de {}", title),
            title,
        }
    }
}

/// Render-time rule. The thumbnail and the demo preview are independent:
/// a card may show both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryMedia<'a> {
    pub thumbnail: Option<&'a str>,
    pub demo_preview: Option<DemoPreview>,
}

impl<'a> GalleryMedia<'a> {
    pub fn for_record(record: &'a ProjectRecord) -> Self {
        GalleryMedia {
            thumbnail: record.image_url.as_deref(),
            demo_preview: record
                .gif_url
                .as_deref()
                .map(|url| DemoPreview::new(url, record.title.as_str())),
        }
    }

    /// Media that carries the clickable demo affordance, if any.
    pub fn primary_demo(&self) -> Option<&str> {
        self.demo_preview.as_ref().map(|p| p.url.as_str())
    }
}

/// Input delivered to the enlarged preview by the gallery front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    OutsideClick,
    InsideClick,
    KeyPressed(String),
}

/// The enlarged demo view. At most one preview is open at a time.
///
/// The server only hands out `DemoPreview` data on gallery cards; this state
/// machine is exported for front ends built on the crate, which own the
/// overlay and feed it their click and key events.
#[derive(Debug, Default)]
pub struct PreviewOverlay {
    active: Option<DemoPreview>,
}

impl PreviewOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, preview: DemoPreview) {
        self.active = Some(preview);
    }

    pub fn active(&self) -> Option<&DemoPreview> {
        self.active.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Returns `true` when the event closed an open preview.
    pub fn handle(&mut self, event: OverlayEvent) -> bool {
        let closes = match &event {
            OverlayEvent::OutsideClick => true,
            OverlayEvent::KeyPressed(key) => key == "Escape",
            OverlayEvent::InsideClick => false,
        };

        closes && self.active.take().is_some()
    }
}
