//! Opaque keyset cursor and page envelope primitives.
//!
//! Feeds page by comparing an ordered column (creation time) against a
//! cursor rather than by offset. The cursor is an opaque base64 token so
//! clients cannot depend on its internals, and the page envelope derives
//! `has_more` from a single over-fetched row instead of a count query.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap applied to every page request, whatever the client asks for.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Errors raised while decoding a client-supplied cursor token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token is not valid base64.
    #[error("cursor is not valid base64")]
    Encoding,
    /// The decoded payload does not carry a recognisable key.
    #[error("cursor payload is malformed")]
    Payload,
}

#[derive(Serialize, Deserialize)]
struct CursorPayload {
    created_at: DateTime<Utc>,
}

/// Opaque keyset cursor wrapping a creation timestamp.
///
/// Rows strictly older than the cursor's timestamp belong to the next page.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use pagination::Cursor;
///
/// let cursor = Cursor::new(Utc::now());
/// let decoded = Cursor::decode(&cursor.encode()).expect("token round-trips");
/// assert_eq!(decoded, cursor);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(DateTime<Utc>);

impl Cursor {
    /// Wrap a creation timestamp as a cursor.
    #[must_use]
    pub const fn new(created_at: DateTime<Utc>) -> Self {
        Self(created_at)
    }

    /// The timestamp the next page must be strictly older than.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Encode the cursor as an opaque URL-safe token.
    #[must_use]
    pub fn encode(&self) -> String {
        let payload = CursorPayload { created_at: self.0 };
        // Serialising a single timestamp cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a client-supplied token back into a cursor.
    ///
    /// # Errors
    /// Returns [`CursorError`] when the token is not base64 or its payload
    /// is not the expected shape.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CursorError::Encoding)?;
        let payload: CursorPayload =
            serde_json::from_slice(&bytes).map_err(|_| CursorError::Payload)?;
        Ok(Self(payload.created_at))
    }
}

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`.
///
/// A missing limit means "as much as allowed", mirroring the feed contract.
#[must_use]
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.map_or(MAX_PAGE_SIZE, |limit| limit.clamp(1, MAX_PAGE_SIZE))
}

/// Number of rows to fetch for a page: one extra row proves `has_more`
/// without a separate count query.
#[must_use]
pub const fn fetch_size(limit: i64) -> i64 {
    limit + 1
}

/// Page envelope carrying the items, the over-fetch verdict, and the cursor
/// for the follow-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, at most the clamped limit.
    pub items: Vec<T>,
    /// Whether an older row exists beyond this page.
    pub has_more: bool,
    /// Cursor for the next page; only present when `has_more` is true.
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Build a page from rows fetched with [`fetch_size`] extra-row
    /// over-fetching.
    ///
    /// `cursor_of` extracts the keyset position of a row so the envelope
    /// can expose the next cursor when a further page exists.
    pub fn from_over_fetched(
        mut rows: Vec<T>,
        limit: i64,
        cursor_of: impl Fn(&T) -> Cursor,
    ) -> Self {
        let limit = usize::try_from(limit).unwrap_or_default();
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(&cursor_of)
        } else {
            None
        };
        Self {
            items: rows,
            has_more,
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn timestamp(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
    }

    #[rstest]
    #[case(None, MAX_PAGE_SIZE)]
    #[case(Some(2), 2)]
    #[case(Some(50), 50)]
    #[case(Some(51), 50)]
    #[case(Some(10_000), 50)]
    #[case(Some(0), 1)]
    #[case(Some(-3), 1)]
    fn clamp_limit_caps_requests(#[case] requested: Option<i64>, #[case] expected: i64) {
        assert_eq!(clamp_limit(requested), expected);
    }

    #[rstest]
    fn cursor_token_round_trips() {
        let cursor = Cursor::new(timestamp(1_700_000_000));
        let token = cursor.encode();
        assert_eq!(Cursor::decode(&token), Ok(cursor));
    }

    #[rstest]
    fn cursor_rejects_garbage_tokens() {
        assert_eq!(Cursor::decode("не base64"), Err(CursorError::Encoding));
        let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
        assert_eq!(Cursor::decode(&not_json), Err(CursorError::Payload));
    }

    #[rstest]
    fn page_with_extra_row_reports_more() {
        let rows = vec![timestamp(3), timestamp(2), timestamp(1)];
        let page = Page::from_over_fetched(rows, 2, |row| Cursor::new(*row));

        assert_eq!(page.items, vec![timestamp(3), timestamp(2)]);
        assert!(page.has_more);
        assert_eq!(page.next_cursor, Some(Cursor::new(timestamp(2))));
    }

    #[rstest]
    fn page_without_extra_row_is_final() {
        let rows = vec![timestamp(1)];
        let page = Page::from_over_fetched(rows, 2, |row| Cursor::new(*row));

        assert_eq!(page.items.len(), 1);
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
    }

    #[rstest]
    fn empty_fetch_yields_empty_final_page() {
        let page = Page::from_over_fetched(Vec::<DateTime<Utc>>::new(), 2, |row| Cursor::new(*row));

        assert!(page.items.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
    }
}
