/// Set of characters stored as sorted, disjoint, non-adjacent inclusive
/// ranges of scalar values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharSet {
    ranges: Vec<(u32, u32)>,
}

const SURROGATES: (u32, u32) = (0xD800, 0xDFFF);

impl CharSet {
    pub fn from_ranges(ranges: impl IntoIterator<Item = (char, char)>) -> Self {
        let mut raw: Vec<(u32, u32)> = ranges
            .into_iter()
            .filter(|(lo, hi)| lo <= hi)
            .map(|(lo, hi)| (lo as u32, hi as u32))
            .collect();
        raw.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(raw.len());
        for (lo, hi) in raw {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }

        // a range like '\u{D7FF}'..='\u{E000}' spans the surrogate gap
        let mut ranges = Vec::with_capacity(merged.len());
        for (lo, hi) in merged {
            if lo < SURROGATES.0 && hi > SURROGATES.1 {
                ranges.push((lo, SURROGATES.0 - 1));
                ranges.push((SURROGATES.1 + 1, hi));
            } else {
                ranges.push((lo, hi));
            }
        }
        Self { ranges }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of characters in the set.
    pub fn len(&self) -> u32 {
        self.ranges.iter().map(|(lo, hi)| hi - lo + 1).sum()
    }

    pub fn contains(&self, c: char) -> bool {
        let c = c as u32;
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if hi < c {
                    std::cmp::Ordering::Less
                } else if lo > c {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// The `index`-th character in ascending order.
    pub fn nth(&self, mut index: u32) -> Option<char> {
        for &(lo, hi) in &self.ranges {
            let width = hi - lo + 1;
            if index < width {
                return char::from_u32(lo + index);
            }
            index -= width;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_and_adjacent_ranges_merge() {
        let set = CharSet::from_ranges([('a', 'c'), ('b', 'f'), ('g', 'g'), ('x', 'z'), ('0', '9')]);
        assert_eq!(set.len(), 10 + 7 + 3);
        assert_eq!(set.nth(0), Some('0'));
        assert_eq!(set.nth(10), Some('a'));
        assert_eq!(set.nth(17), Some('x'));
        assert_eq!(set.nth(20), None);
        assert!(set.contains('g') && !set.contains('h'));
    }

    #[test]
    fn surrogate_gap_is_skipped() {
        let set = CharSet::from_ranges([('\u{D7FF}', '\u{E000}')]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.nth(1), Some('\u{E000}'));
    }

    #[test]
    fn duplicates_count_once() {
        let set = CharSet::from_ranges([('a', 'a'), ('a', 'a')]);
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
        assert!(CharSet::default().is_empty());
    }
}
