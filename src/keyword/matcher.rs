use std::sync::OnceLock;

use minivec::MiniVec;
use strum::VariantArray;

use super::Keyword;

/// Length-dispatched keyword matcher. Identifier runs of 2 bytes hit a
/// direct-index table, 3..=8 bytes a packed u64 binary search, 9..=12
/// bytes a packed u128 binary search. Everything else is an identifier.
#[derive(Debug)]
pub(crate) struct KeywordMatcher {
    ultra_short_matcher: UltraShortMatcher,
    short_matcher: ShortMatcher,
    long_matcher: LongMatcher,
}

impl KeywordMatcher {
    pub(crate) fn get() -> &'static KeywordMatcher {
        static MATCHER: OnceLock<KeywordMatcher> = OnceLock::new();
        MATCHER.get_or_init(KeywordMatcher::new)
    }

    pub(crate) fn new() -> Self {
        let ultra_short = Keyword::VARIANTS
            .iter()
            .filter(|k| k.as_ref().len() == 2)
            .copied()
            .collect::<Vec<_>>();

        let short = Keyword::VARIANTS
            .iter()
            .filter(|k| {
                let len = k.as_ref().len();
                (3..=8).contains(&len)
            })
            .copied()
            .collect::<MiniVec<_>>();

        let long = Keyword::VARIANTS
            .iter()
            .filter(|k| {
                let len = k.as_ref().len();
                (9..=12).contains(&len)
            })
            .copied()
            .collect::<MiniVec<_>>();

        Self {
            ultra_short_matcher: UltraShortMatcher::new(&ultra_short),
            short_matcher: ShortMatcher::new(short),
            long_matcher: LongMatcher::new(long),
        }
    }

    pub(crate) fn match_keyword(&self, bytes: &[u8]) -> Option<Keyword> {
        match bytes.len() {
            2 => self.ultra_short_matcher.match_keyword(bytes),
            3..=8 => self.short_matcher.match_keyword(bytes),
            9..=12 => self.long_matcher.match_keyword(bytes),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct UltraShortMatcher {
    two_char: [Option<Keyword>; 65536],
}

impl UltraShortMatcher {
    fn new(two_char_list: &[Keyword]) -> Self {
        let mut two_char = [None; 65536];

        for keyword in two_char_list {
            let bytes = keyword.as_ref().as_bytes();
            let index = ((bytes[0] as usize) << 8) | bytes[1] as usize;

            two_char[index] = Some(*keyword);
        }

        Self { two_char }
    }

    fn match_keyword(&self, bytes: &[u8]) -> Option<Keyword> {
        let index = ((bytes[0] as usize) << 8) | bytes[1] as usize;
        self.two_char[index]
    }
}

#[derive(Debug)]
struct ShortMatcher {
    keys: MiniVec<u64>,
    keywords: MiniVec<Keyword>,
}

impl ShortMatcher {
    fn new(mut keywords: MiniVec<Keyword>) -> Self {
        keywords.sort_by_key(|k| Self::create_short_pattern(k.as_ref().as_bytes()));

        let keys = keywords
            .iter()
            .map(|keyword| Self::create_short_pattern(keyword.as_ref().as_bytes()))
            .collect();

        Self { keys, keywords }
    }

    // 将关键字字节打包到 u64 中（小端序）
    fn create_short_pattern(bytes: &[u8]) -> u64 {
        let mut data = 0u64;

        for (i, &byte) in bytes.iter().enumerate() {
            data |= (byte as u64) << (i * 8);
        }

        data
    }

    fn match_keyword(&self, bytes: &[u8]) -> Option<Keyword> {
        let data = Self::create_short_pattern(bytes);

        if let Ok(position) = self.keys.binary_search(&data) {
            Some(self.keywords[position])
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct LongMatcher {
    keys: MiniVec<u128>,
    keywords: MiniVec<Keyword>,
}

impl LongMatcher {
    fn new(mut keywords: MiniVec<Keyword>) -> Self {
        keywords.sort_by_key(|k| Self::create_long_pattern(k.as_ref().as_bytes()));

        let keys = keywords
            .iter()
            .map(|keyword| Self::create_long_pattern(keyword.as_ref().as_bytes()))
            .collect();

        Self { keys, keywords }
    }

    // 同 ShortMatcher，u128 容纳 9..=12 字节
    fn create_long_pattern(bytes: &[u8]) -> u128 {
        let mut data = 0u128;

        for (i, &byte) in bytes.iter().enumerate() {
            data |= (byte as u128) << (i * 8);
        }

        data
    }

    fn match_keyword(&self, bytes: &[u8]) -> Option<Keyword> {
        let data = Self::create_long_pattern(bytes);

        if let Ok(position) = self.keys.binary_search(&data) {
            Some(self.keywords[position])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_matches() {
        let matcher = KeywordMatcher::new();
        for keyword in Keyword::VARIANTS {
            assert_eq!(
                matcher.match_keyword(keyword.as_ref().as_bytes()),
                Some(*keyword),
                "{keyword:?}"
            );
        }
    }

    #[test]
    fn test_near_misses_are_identifiers() {
        let matcher = KeywordMatcher::new();
        for miss in [
            "quer",
            "querys",
            "Query",
            "QUERY",
            "fragmen",
            "fragments",
            "onn",
            "o",
            "typename",
            "__typenam",
            "__typenames",
            "subscriptions",
            "subscriptio",
            "nul",
            "nulll",
            "Int",
            "Float",
            "String",
            "Boolean",
            "ID",
            "id",
            "x",
            "extremely_long_identifier_name",
        ] {
            assert_eq!(matcher.match_keyword(miss.as_bytes()), None, "{miss}");
        }
    }

    #[test]
    fn test_length_buckets_do_not_alias() {
        // "on" lives in the two-byte table, so a 3-byte lookup starting
        // with the same bytes must miss the u64 bucket entirely
        let matcher = KeywordMatcher::new();
        assert_eq!(matcher.match_keyword(b"ont"), None);
        assert_eq!(matcher.match_keyword(b"nullx"), None);
    }
}
