//! One-shot messages carried across a redirect in a short-lived cookie.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{self, HeaderName};
use axum::http::request::Parts;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};

use crate::extractors::cookie_value;

pub const FLASH_COOKIE: &str = "miniinsta_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Error,
    Success,
    Info,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Error => "error",
            FlashKind::Success => "success",
            FlashKind::Info => "info",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "error" => Some(FlashKind::Error),
            "success" => Some(FlashKind::Success),
            "info" => Some(FlashKind::Info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

impl FlashMessage {
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Error, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Info, message)
    }

    /// Cookie value: `<kind>.<hex message>`. Hex keeps the value within the
    /// cookie-octet alphabet whatever the message contains.
    fn encode(&self) -> String {
        format!("{}.{}", self.kind.as_str(), hex::encode(self.message.as_bytes()))
    }

    fn decode(value: &str) -> Option<Self> {
        let (kind, payload) = value.split_once('.')?;
        let kind = FlashKind::parse(kind)?;
        let bytes = hex::decode(payload).ok()?;
        let message = String::from_utf8(bytes).ok()?;
        Some(Self { kind, message })
    }

    pub fn set_cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=60",
            FLASH_COOKIE,
            self.encode()
        )
    }
}

pub fn clear_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", FLASH_COOKIE)
}

/// 303 redirect carrying a flash message.
pub fn redirect(to: &str, flash: FlashMessage) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, flash.set_cookie())]),
        Redirect::to(to),
    )
        .into_response()
}

/// The pending flash message, if the request carried one.
#[derive(Debug, Clone, Default)]
pub struct Flash(pub Option<FlashMessage>);

impl Flash {
    /// Header that consumes the message; add it to whatever response shows it.
    pub fn clear_header(&self) -> Option<(HeaderName, String)> {
        self.0.as_ref().map(|_| (header::SET_COOKIE, clear_cookie()))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(
            cookie_value(&parts.headers, FLASH_COOKIE).and_then(FlashMessage::decode),
        ))
    }
}
