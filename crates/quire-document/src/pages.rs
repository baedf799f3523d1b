// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range parsing and client-side page selection checks.
//
// Ranges are written the way users type them: `1-3, 5, 8-10`.  Page numbers
// are 1-based.

use std::collections::BTreeSet;

use quire_core::error::{QuireError, Result};
use quire_core::types::PageRange;

/// Parse `"1-3, 5"` into ranges, keeping the user's order.
pub fn parse_page_ranges(input: &str) -> Result<Vec<PageRange>> {
    let mut ranges = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let range = match part.split_once('-') {
            Some((start, end)) => PageRange {
                start: parse_page(start, part)?,
                end: parse_page(end, part)?,
            },
            None => PageRange::single(parse_page(part, part)?),
        };

        if range.start > range.end {
            return Err(QuireError::InvalidPageRange(format!(
                "'{part}' runs backwards"
            )));
        }
        ranges.push(range);
    }

    if ranges.is_empty() {
        return Err(QuireError::InvalidPageRange("no pages given".into()));
    }
    Ok(ranges)
}

fn parse_page(text: &str, part: &str) -> Result<u32> {
    let page: u32 = text
        .trim()
        .parse()
        .map_err(|_| QuireError::InvalidPageRange(format!("'{part}' is not a page number")))?;
    if page == 0 {
        return Err(QuireError::InvalidPageRange("pages start at 1".into()));
    }
    Ok(page)
}

/// Inverse of [`parse_page_ranges`]: `1-3,5`.
pub fn format_page_ranges(ranges: &[PageRange]) -> String {
    ranges
        .iter()
        .map(PageRange::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Expand ranges into a sorted, de-duplicated page list.
pub fn expand_pages(ranges: &[PageRange]) -> Vec<u32> {
    ranges
        .iter()
        .flat_map(|r| r.start..=r.end)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every range must be well formed and lie inside a document of
/// `page_count` pages.
pub fn check_ranges(page_count: u32, ranges: &[PageRange]) -> Result<()> {
    if ranges.is_empty() {
        return Err(QuireError::InvalidPageRange("no pages given".into()));
    }
    for range in ranges {
        if range.start == 0 {
            return Err(QuireError::InvalidPageRange("pages start at 1".into()));
        }
        if range.start > range.end {
            return Err(QuireError::InvalidPageRange(format!(
                "'{}-{}' runs backwards",
                range.start, range.end
            )));
        }
        if range.end > page_count {
            return Err(QuireError::InvalidPageRange(format!(
                "'{range}' is past the last page ({page_count})"
            )));
        }
    }
    Ok(())
}

/// Pre-flight check for page removal.
///
/// The remote service does not refuse a selection that removes every page,
/// so the check happens here.  Ranges are bounded by `page_count` before
/// they are expanded.
pub fn check_removal(page_count: u32, ranges: &[PageRange]) -> Result<()> {
    if ranges.is_empty() {
        return Err(QuireError::Preflight("Select at least one page to remove.".into()));
    }
    check_ranges(page_count, ranges)?;
    if expand_pages(ranges).len() as u32 >= page_count {
        return Err(QuireError::Preflight(
            "You can't remove every page of the document.".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_ranges() {
        let ranges = parse_page_ranges(" 1-3, 5 ,8-10").unwrap();
        assert_eq!(
            ranges,
            vec![
                PageRange { start: 1, end: 3 },
                PageRange::single(5),
                PageRange { start: 8, end: 10 },
            ]
        );
        assert_eq!(format_page_ranges(&ranges), "1-3,5,8-10");
    }

    #[test]
    fn rejects_bad_input() {
        for input in ["", " , ", "0", "3-1", "a-b", "1-", "2,x"] {
            assert!(
                matches!(parse_page_ranges(input), Err(QuireError::InvalidPageRange(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn expand_dedups_and_sorts() {
        let ranges = parse_page_ranges("4-5,1-2,2").unwrap();
        assert_eq!(expand_pages(&ranges), vec![1, 2, 4, 5]);
    }

    #[test]
    fn ranges_must_fit_document() {
        let ranges = parse_page_ranges("1-3").unwrap();
        assert!(check_ranges(3, &ranges).is_ok());
        assert!(check_ranges(2, &ranges).is_err());
    }

    #[test]
    fn hand_built_ranges_are_checked() {
        let bad = [
            vec![],
            vec![PageRange { start: 0, end: 2 }],
            vec![PageRange { start: 3, end: 1 }],
        ];
        for ranges in bad {
            assert!(
                matches!(check_ranges(5, &ranges), Err(QuireError::InvalidPageRange(_))),
                "{ranges:?} should be rejected"
            );
        }
    }

    #[test]
    fn removing_every_page_is_refused() {
        let err = check_removal(3, &parse_page_ranges("1-3").unwrap()).unwrap_err();
        assert!(matches!(err, QuireError::Preflight(_)));
        // Overlaps do not make up the difference.
        assert!(check_removal(3, &parse_page_ranges("1-2,2").unwrap()).is_ok());
    }

    #[test]
    fn removal_selection_checks() {
        assert!(matches!(check_removal(3, &[]), Err(QuireError::Preflight(_))));
        assert!(matches!(
            check_removal(3, &[PageRange::single(4)]),
            Err(QuireError::InvalidPageRange(_))
        ));
        assert!(check_removal(3, &[PageRange::single(2)]).is_ok());
    }

    #[test]
    fn oversized_removal_is_refused_before_expanding() {
        let ranges = parse_page_ranges("1-4000000000").unwrap();
        assert!(matches!(
            check_removal(3, &ranges),
            Err(QuireError::InvalidPageRange(_))
        ));
    }
}
