//! Byte ranges and `ETag` revalidation for static assets.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// An inclusive byte range that fits inside the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn content_range(&self, total: usize) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Serve only this slice with a 206.
    Partial(ByteRange),
    /// The range starts past the end; 416.
    NotSatisfiable,
    /// No usable range (absent, multi-range, other units or malformed); serve it all.
    Full,
}

/// Parses a single `bytes=` range against an asset of `size` bytes.
///
/// Accepts `start-end`, `start-` and `-suffix`. Multiple ranges are served as the full body.
pub fn parse_range(header: Option<&str>, size: usize) -> RangeOutcome {
    let Some(ranges) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if ranges.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((start, end)) = ranges.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        let Ok(suffix) = end.parse::<usize>() else {
            return RangeOutcome::Full;
        };
        if suffix == 0 || size == 0 {
            return RangeOutcome::NotSatisfiable;
        }
        return RangeOutcome::Partial(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        });
    }

    let Ok(start) = start.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if start >= size {
        return RangeOutcome::NotSatisfiable;
    }

    let end = if end.is_empty() {
        size - 1
    } else {
        match end.parse::<usize>() {
            Ok(end) if end >= start => end.min(size - 1),
            Ok(_) => return RangeOutcome::NotSatisfiable,
            Err(_) => return RangeOutcome::Full,
        }
    };

    RangeOutcome::Partial(ByteRange { start, end })
}

/// Quoted strong `ETag` for a body.
pub fn etag_for(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

/// True when `If-None-Match` lists `etag` (or `*`), i.e. the client copy is current.
pub fn etag_matches(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|tags| {
        tags.split(',').any(|tag| {
            let tag = tag.trim();
            tag == "*" || tag.trim_start_matches("W/") == etag
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range(None, 100), RangeOutcome::Full);
        assert_eq!(parse_range(Some("items=0-9"), 100), RangeOutcome::Full);
    }

    #[test]
    fn test_bounded_range() {
        let RangeOutcome::Partial(range) = parse_range(Some("bytes=0-9"), 100) else {
            panic!("expected a partial range");
        };
        assert_eq!(range, ByteRange { start: 0, end: 9 });
        assert_eq!(range.len(), 10);
        assert_eq!(range.content_range(100), "bytes 0-9/100");
    }

    #[test]
    fn test_open_and_clamped_ranges() {
        assert_eq!(
            parse_range(Some("bytes=50-"), 100),
            RangeOutcome::Partial(ByteRange { start: 50, end: 99 })
        );
        assert_eq!(
            parse_range(Some("bytes=90-500"), 100),
            RangeOutcome::Partial(ByteRange { start: 90, end: 99 })
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range(Some("bytes=-20"), 100),
            RangeOutcome::Partial(ByteRange { start: 80, end: 99 })
        );
        assert_eq!(
            parse_range(Some("bytes=-500"), 100),
            RangeOutcome::Partial(ByteRange { start: 0, end: 99 })
        );
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(parse_range(Some("bytes=200-"), 100), RangeOutcome::NotSatisfiable);
        assert_eq!(parse_range(Some("bytes=9-3"), 100), RangeOutcome::NotSatisfiable);
        assert_eq!(parse_range(Some("bytes=-0"), 100), RangeOutcome::NotSatisfiable);
        assert_eq!(parse_range(Some("bytes=0-"), 0), RangeOutcome::NotSatisfiable);
    }

    #[test]
    fn test_malformed_or_multi_range_serves_full() {
        assert_eq!(parse_range(Some("bytes=a-b"), 100), RangeOutcome::Full);
        assert_eq!(parse_range(Some("bytes=0-9,20-29"), 100), RangeOutcome::Full);
        assert_eq!(parse_range(Some("bytes=5"), 100), RangeOutcome::Full);
    }

    #[test]
    fn test_etag_matching() {
        let etag = etag_for(b"console.log(1)");
        assert_eq!(etag, etag_for(b"console.log(1)"));
        assert_ne!(etag, etag_for(b"console.log(2)"));

        assert!(etag_matches(Some(&etag), &etag));
        assert!(etag_matches(Some(&format!("\"other\", {}", etag)), &etag));
        assert!(etag_matches(Some(&format!("W/{}", etag)), &etag));
        assert!(etag_matches(Some("*"), &etag));
        assert!(!etag_matches(Some("\"other\""), &etag));
        assert!(!etag_matches(None, &etag));
    }
}
