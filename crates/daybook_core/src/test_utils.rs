//! Test utilities for daybook_core
//!
//! Shared date helpers and attachment sources used across test modules.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{NaiveDate, NaiveDateTime};
use tokio::io::{AsyncRead, ReadBuf};

use crate::fs::{BoxFuture, ByteReader};
use crate::ingest::AttachmentSource;
use crate::naming::MonthKey;

/// Calendar date, panicking on invalid input.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Local wall-clock time, panicking on invalid input.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    date(year, month, day)
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

/// Month key, panicking on invalid input.
pub fn month(year: i32, month: u32) -> MonthKey {
    MonthKey::new(year, month).unwrap()
}

/// A source whose bytes can never be opened.
#[derive(Debug, Clone, Copy)]
pub struct UnreadableSource;

impl AttachmentSource for UnreadableSource {
    fn display_name(&self) -> Option<String> {
        Some("gone.jpg".to_string())
    }

    fn mime_type(&self) -> Option<String> {
        Some("image/jpeg".to_string())
    }

    fn open(&self) -> BoxFuture<'_, io::Result<ByteReader>> {
        Box::pin(async { Err(io::Error::new(io::ErrorKind::NotFound, "source vanished")) })
    }
}

/// A stream that opens fine but refuses every read.
#[derive(Debug, Clone, Copy)]
pub struct DeniedReader;

impl AsyncRead for DeniedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "source revoked mid-read",
        )))
    }
}

/// A source that opens but fails with `PermissionDenied` on the first read.
#[derive(Debug, Clone, Copy)]
pub struct DeniedSource;

impl AttachmentSource for DeniedSource {
    fn display_name(&self) -> Option<String> {
        Some("locked.png".to_string())
    }

    fn mime_type(&self) -> Option<String> {
        Some("image/png".to_string())
    }

    fn open(&self) -> BoxFuture<'_, io::Result<ByteReader>> {
        Box::pin(async { Ok(Box::new(DeniedReader) as ByteReader) })
    }
}
