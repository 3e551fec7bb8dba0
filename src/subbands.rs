//! Subband specifications: the textual range syntax (`77..324,400`) and the
//! integer lists it stands for.

use itertools::Itertools;
use vec1::Vec1;

use crate::{constants::MAX_SUBBAND, error::SubbandSpecError};

/// Parse a subband specification into an ascending list of unique subband
/// indices. Items are separated by commas; each is either a single index or
/// an inclusive range `first..last`. No index may be above
/// [`MAX_SUBBAND`].
pub fn parse_subbands(spec: &str) -> Result<Vec1<u32>, SubbandSpecError> {
    let bad_item = |item: &str| SubbandSpecError::BadItem {
        spec: spec.to_string(),
        item: item.to_string(),
    };
    let in_range = |subband: u32| {
        if subband > MAX_SUBBAND {
            Err(SubbandSpecError::OutOfRange {
                spec: spec.to_string(),
                subband,
                max: MAX_SUBBAND,
            })
        } else {
            Ok(subband)
        }
    };

    let mut subbands = vec![];
    for item in spec.split(',').map(str::trim) {
        if item.is_empty() {
            if spec.trim().is_empty() {
                return Err(SubbandSpecError::Empty);
            }
            return Err(bad_item(item));
        }
        match item.split_once("..") {
            Some((first, last)) => {
                let first: u32 = first.trim().parse().map_err(|_| bad_item(item))?;
                let last: u32 = last.trim().parse().map_err(|_| bad_item(item))?;
                if last < first {
                    return Err(SubbandSpecError::Reversed {
                        spec: spec.to_string(),
                        first,
                        last,
                    });
                }
                subbands.extend(first..=in_range(last)?);
            }
            None => subbands.push(in_range(item.parse().map_err(|_| bad_item(item))?)?),
        }
    }
    subbands.sort_unstable();
    subbands.dedup();
    Vec1::try_from_vec(subbands).map_err(|_| SubbandSpecError::Empty)
}

/// Keep the lowest `max(n, 1)` subbands.
pub fn truncate_subbands(subbands: &Vec1<u32>, n: usize) -> Vec1<u32> {
    let mut truncated = subbands.clone();
    // Can't fail; we never ask for fewer than one.
    let _ = truncated.truncate(n.max(1));
    truncated
}

/// Write an ascending list of subbands back in range syntax, collapsing
/// consecutive runs, e.g. `[12, 13, 14, 20]` becomes `12..14,20`.
pub fn format_subbands(subbands: &[u32]) -> String {
    let mut runs: Vec<(u32, u32)> = vec![];
    for &sb in subbands {
        match runs.last_mut() {
            Some((_, last)) if *last + 1 == sb => *last = sb,
            _ => runs.push((sb, sb)),
        }
    }
    runs.into_iter()
        .map(|(first, last)| {
            if first == last {
                first.to_string()
            } else {
                format!("{first}..{last}")
            }
        })
        .join(",")
}
