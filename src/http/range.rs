//! HTTP Range request parsing module
//!
//! Single byte-range parsing (RFC 7233) so large assets such as source maps
//! and media can be fetched partially.

/// Parsed Range request, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    #[cfg(test)]
    pub const fn content_length(self) -> usize {
        self.end - self.start + 1
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Valid range request, already clamped to the file
    Valid(ByteRange),
    /// Range not satisfiable - should return 416
    NotSatisfiable,
    /// No Range header or malformed (ignore, return full content)
    None,
}

/// Parse HTTP Range header (single range only, bytes unit)
///
/// Supported formats:
/// - `bytes=start-end` - Specific range
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };

    // Multi-range requests are answered with the full body
    if spec.contains(',') {
        return RangeParseResult::None;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }
    let last = file_size - 1;

    if start_str.is_empty() {
        // Suffix range: "-500" means last 500 bytes
        return match end_str.parse::<usize>() {
            Ok(0) => RangeParseResult::NotSatisfiable,
            Ok(suffix) => RangeParseResult::Valid(ByteRange {
                start: file_size.saturating_sub(suffix),
                end: last,
            }),
            Err(_) => RangeParseResult::None,
        };
    }

    let Ok(start) = start_str.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if start > last {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        last
    } else {
        match end_str.parse::<usize>() {
            Ok(e) => e.min(last),
            Err(_) => return RangeParseResult::None,
        }
    };

    if start > end {
        return RangeParseResult::NotSatisfiable;
    }
    RangeParseResult::Valid(ByteRange { start, end })
}
