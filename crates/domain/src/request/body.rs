//! HTTP request body types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

/// Declared content kind of a raw request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// No body
    #[default]
    None,
    /// JSON text
    Json,
    /// Plain text
    Text,
    /// XML text
    Xml,
    /// HTML text
    Html,
    /// JavaScript source
    Javascript,
    /// `application/x-www-form-urlencoded` text (`a=1&b=2`)
    FormUrlEncoded,
}

impl BodyKind {
    /// Returns the MIME type this kind is sent with, if any.
    #[must_use]
    pub fn mime_type(self) -> Option<mime::Mime> {
        match self {
            Self::None => None,
            Self::Json => Some(mime::APPLICATION_JSON),
            Self::Text => Some(mime::TEXT_PLAIN),
            Self::Xml => Some(mime::TEXT_XML),
            Self::Html => Some(mime::TEXT_HTML),
            Self::Javascript => Some(mime::APPLICATION_JAVASCRIPT),
            Self::FormUrlEncoded => Some(mime::APPLICATION_WWW_FORM_URLENCODED),
        }
    }

    /// Returns the snake-case name used in files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Json => "json",
            Self::Text => "text",
            Self::Xml => "xml",
            Self::Html => "html",
            Self::Javascript => "javascript",
            Self::FormUrlEncoded => "form_url_encoded",
        }
    }

    /// Infers a body kind from a `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored. Unknown types map to `Text`.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Self {
        let Ok(parsed) = content_type.parse::<mime::Mime>() else {
            return Self::Text;
        };
        let subtype = parsed.subtype();
        let suffix = parsed.suffix();
        if subtype == mime::JSON || suffix == Some(mime::JSON) {
            Self::Json
        } else if subtype == mime::XML || suffix == Some(mime::XML) {
            Self::Xml
        } else if parsed.type_() == mime::TEXT && subtype == mime::HTML {
            Self::Html
        } else if subtype == mime::JAVASCRIPT {
            Self::Javascript
        } else if subtype == mime::WWW_FORM_URLENCODED {
            Self::FormUrlEncoded
        } else {
            Self::Text
        }
    }
}

impl FromStr for BodyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "xml" => Ok(Self::Xml),
            "html" => Ok(Self::Html),
            "javascript" => Ok(Self::Javascript),
            "form_url_encoded" | "urlencoded" => Ok(Self::FormUrlEncoded),
            other => Err(DomainError::UnsupportedBodyKind(other.to_string())),
        }
    }
}

/// Raw request body text plus its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct RequestBody {
    /// The declared kind
    #[serde(default)]
    pub kind: BodyKind,
    /// The body text. May contain `{{variable}}` placeholders.
    #[serde(default)]
    pub content: String,
}

impl RequestBody {
    /// Creates an empty body.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            kind: BodyKind::None,
            content: String::new(),
        }
    }

    /// Creates a body of the given kind.
    #[must_use]
    pub fn new(kind: BodyKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    /// Creates a JSON body.
    #[must_use]
    pub fn json(content: impl Into<String>) -> Self {
        Self::new(BodyKind::Json, content)
    }

    /// Creates a plain text body.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(BodyKind::Text, content)
    }

    /// Returns whether nothing would be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind == BodyKind::None || self.content.is_empty()
    }

    /// Returns the `Content-Type` to send, if the body is not empty.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        self.kind.mime_type().map(|m| m.essence_str().to_string())
    }
}
