use std::sync::OnceLock;

pub(crate) mod scalar;
pub(crate) mod wide;

pub use scalar::CharTable;
pub(crate) use scalar::CHAR_TABLE;

/// Widest usable vector width on this machine, probed once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdCapability {
    Avx512,
    Avx2,
    Sse42,
    Neon,
    Scalar,
}

impl SimdCapability {
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx512bw") {
                return SimdCapability::Avx512;
            }
            if is_x86_feature_detected!("avx2") {
                return SimdCapability::Avx2;
            }
            if is_x86_feature_detected!("sse4.2") {
                return SimdCapability::Sse42;
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                return SimdCapability::Neon;
            }
        }

        SimdCapability::Scalar
    }

    /// Bytes per vector window for this capability.
    pub fn lane_width(self) -> usize {
        match self {
            SimdCapability::Avx512 => 64,
            SimdCapability::Avx2 => 32,
            SimdCapability::Sse42 | SimdCapability::Neon => 16,
            SimdCapability::Scalar => 1,
        }
    }
}

/// Dispatch table of scanning primitives, selected once at startup.
///
/// Every entry has a wide and a scalar implementation producing identical
/// results on all inputs; the wide ones fall through to the scalar tail
/// past the last full window.
#[derive(Debug)]
pub struct Scanner {
    capability: SimdCapability,
    skip_whitespace: fn(&[u8], usize) -> usize,
    skip_comment: fn(&[u8], usize) -> usize,
    find_identifier_end: fn(&[u8], usize) -> usize,
    find_number_end: fn(&[u8], usize, &mut bool) -> usize,
    find_string_end: fn(&[u8], usize, u8) -> (usize, bool),
    find_block_string_end: fn(&[u8], usize) -> (usize, bool),
}

impl Scanner {
    pub fn get() -> &'static Scanner {
        static SCANNER: OnceLock<Scanner> = OnceLock::new();
        SCANNER.get_or_init(|| {
            let capability = SimdCapability::detect();
            log::debug!("selected byte scanner capability: {capability:?}");
            Scanner::for_capability(capability)
        })
    }

    pub fn for_capability(capability: SimdCapability) -> Scanner {
        match capability {
            SimdCapability::Avx512 => Scanner::wide_set::<64>(capability),
            SimdCapability::Avx2 => Scanner::wide_set::<32>(capability),
            SimdCapability::Sse42 | SimdCapability::Neon => Scanner::wide_set::<16>(capability),
            SimdCapability::Scalar => Scanner::scalar_set(),
        }
    }

    fn wide_set<const N: usize>(capability: SimdCapability) -> Scanner {
        Scanner {
            capability,
            skip_whitespace: wide::skip_whitespace::<N>,
            skip_comment: wide::skip_comment::<N>,
            find_identifier_end: wide::find_identifier_end::<N>,
            find_number_end: wide::find_number_end::<N>,
            find_string_end: wide::find_string_end::<N>,
            find_block_string_end: wide::find_block_string_end::<N>,
        }
    }

    fn scalar_set() -> Scanner {
        Scanner {
            capability: SimdCapability::Scalar,
            skip_whitespace: scalar::skip_whitespace,
            skip_comment: scalar::skip_comment,
            find_identifier_end: scalar::find_identifier_end,
            find_number_end: scalar::find_number_end,
            find_string_end: scalar::find_string_end,
            find_block_string_end: scalar::find_block_string_end,
        }
    }

    pub fn capability(&self) -> SimdCapability {
        self.capability
    }

    /// First index `>= i` whose byte is not in `{space, tab, lf, cr}`.
    #[inline]
    pub fn skip_whitespace(&self, text: &[u8], i: usize) -> usize {
        (self.skip_whitespace)(text, i)
    }

    /// Index just past the comment starting at `i`, or `i` when no
    /// comment starts there. Unterminated block comments consume to the
    /// end of input.
    #[inline]
    pub fn skip_comment(&self, text: &[u8], i: usize) -> usize {
        (self.skip_comment)(text, i)
    }

    /// Smallest `j >= i` with `text[j]` outside `[A-Za-z0-9_]`.
    #[inline]
    pub fn find_identifier_end(&self, text: &[u8], i: usize) -> usize {
        (self.find_identifier_end)(text, i)
    }

    /// End of the maximal run matching `-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?`.
    #[inline]
    pub fn find_number_end(&self, text: &[u8], i: usize, has_decimal: &mut bool) -> usize {
        (self.find_number_end)(text, i, has_decimal)
    }

    /// For a regular string opened at `i`: `(index past the closing
    /// quote, true)` on success, `(stop index, false)` on a raw newline
    /// or end of input. A backslash escapes exactly the next byte.
    #[inline]
    pub fn find_string_end(&self, text: &[u8], i: usize, quote: u8) -> (usize, bool) {
        (self.find_string_end)(text, i, quote)
    }

    /// For a block string whose `"""` opens at `i`: index just past the
    /// closing `"""`, or `(len, false)` when unterminated.
    #[inline]
    pub fn find_block_string_end(&self, text: &[u8], i: usize) -> (usize, bool) {
        (self.find_block_string_end)(text, i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_scanners() -> Vec<Scanner> {
        // portable simd runs on every host, so all widths are testable
        vec![
            Scanner::for_capability(SimdCapability::Avx512),
            Scanner::for_capability(SimdCapability::Avx2),
            Scanner::for_capability(SimdCapability::Sse42),
            Scanner::for_capability(SimdCapability::Neon),
            Scanner::for_capability(SimdCapability::Scalar),
        ]
    }

    fn corpus() -> Vec<String> {
        let mut inputs = vec![
            String::new(),
            " ".to_string(),
            "   \t\r\n   x".to_string(),
            "hello".to_string(),
            "hello world".to_string(),
            "_under_score_123 rest".to_string(),
            "123".to_string(),
            "-123".to_string(),
            "12.5".to_string(),
            "2.5e-1".to_string(),
            "1e10!".to_string(),
            "1.".to_string(),
            "1.e5".to_string(),
            "1e".to_string(),
            "1e+".to_string(),
            "# comment\nrest".to_string(),
            "// comment\nrest".to_string(),
            "/* block */rest".to_string(),
            "/* unterminated".to_string(),
            "/".to_string(),
            "\"short\" tail".to_string(),
            "\"esc\\\"aped\" tail".to_string(),
            "\"newline\nbroken\"".to_string(),
            "\"unterminated".to_string(),
            "\"\"".to_string(),
            "\"\"\"block \" string\"\"\" tail".to_string(),
            "\"\"\"unterminated block".to_string(),
        ];

        // window-straddling shapes around the 16/32/64 byte boundaries
        for n in [15, 16, 17, 31, 32, 33, 63, 64, 65, 130] {
            inputs.push(" ".repeat(n) + "x");
            inputs.push("a".repeat(n) + " tail");
            inputs.push("7".repeat(n) + " tail");
            inputs.push(format!("{}.25e+7 tail", "7".repeat(n)));
            inputs.push(format!("\"{}\" tail", "s".repeat(n)));
            inputs.push(format!("\"{}\\\"{}\" tail", "s".repeat(n), "t".repeat(7)));
            inputs.push(format!("#{}\nrest", "c".repeat(n)));
            inputs.push(format!("/*{}*/rest", "c".repeat(n)));
            inputs.push(format!("/*{}*{}*/rest", "c".repeat(n), "d".repeat(3)));
            inputs.push(format!("\"\"\"{}\"\"\" tail", "b\nb".repeat(n / 2 + 1)));
        }

        // a '*' or quote sitting exactly on a window boundary
        for n in [15, 31, 63] {
            inputs.push(format!("/*{}*/x", "c".repeat(n)));
            inputs.push(format!("\"{}\\\\\"x", "c".repeat(n)));
        }

        inputs
    }

    #[test]
    fn test_detect_is_stable() {
        assert_eq!(SimdCapability::detect(), SimdCapability::detect());
    }

    #[test]
    fn test_all_widths_agree_on_whitespace() {
        let scanners = all_scanners();
        for input in corpus() {
            let text = input.as_bytes();
            let expected = scalar::skip_whitespace(text, 0);
            for scanner in &scanners {
                assert_eq!(
                    scanner.skip_whitespace(text, 0),
                    expected,
                    "{:?} on {input:?}",
                    scanner.capability()
                );
            }
        }
    }

    #[test]
    fn test_all_widths_agree_on_comments() {
        let scanners = all_scanners();
        for input in corpus() {
            let text = input.as_bytes();
            let expected = scalar::skip_comment(text, 0);
            for scanner in &scanners {
                assert_eq!(
                    scanner.skip_comment(text, 0),
                    expected,
                    "{:?} on {input:?}",
                    scanner.capability()
                );
            }
        }
    }

    #[test]
    fn test_all_widths_agree_on_identifiers() {
        let scanners = all_scanners();
        for input in corpus() {
            let text = input.as_bytes();
            let expected = scalar::find_identifier_end(text, 0);
            for scanner in &scanners {
                assert_eq!(
                    scanner.find_identifier_end(text, 0),
                    expected,
                    "{:?} on {input:?}",
                    scanner.capability()
                );
            }
        }
    }

    #[test]
    fn test_all_widths_agree_on_numbers() {
        let scanners = all_scanners();
        for input in corpus() {
            let text = input.as_bytes();
            let mut expected_decimal = false;
            let expected = scalar::find_number_end(text, 0, &mut expected_decimal);
            for scanner in &scanners {
                let mut has_decimal = false;
                assert_eq!(
                    scanner.find_number_end(text, 0, &mut has_decimal),
                    expected,
                    "{:?} on {input:?}",
                    scanner.capability()
                );
                assert_eq!(has_decimal, expected_decimal, "{input:?}");
            }
        }
    }

    #[test]
    fn test_all_widths_agree_on_strings() {
        let scanners = all_scanners();
        for input in corpus() {
            let text = input.as_bytes();
            if text.first() != Some(&b'"') {
                continue;
            }
            let expected = scalar::find_string_end(text, 0, b'"');
            let expected_block = scalar::find_block_string_end(text, 0);
            for scanner in &scanners {
                assert_eq!(
                    scanner.find_string_end(text, 0, b'"'),
                    expected,
                    "{:?} on {input:?}",
                    scanner.capability()
                );
                assert_eq!(
                    scanner.find_block_string_end(text, 0),
                    expected_block,
                    "{:?} on {input:?}",
                    scanner.capability()
                );
            }
        }
    }

    #[test]
    fn test_primitive_contracts() {
        let scanner = Scanner::get();

        assert_eq!(scanner.skip_whitespace(b"  \t\nx", 0), 4);
        assert_eq!(scanner.skip_whitespace(b"x", 0), 0);
        assert_eq!(scanner.skip_whitespace(b"   ", 0), 3);

        assert_eq!(scanner.skip_comment(b"# c\nx", 0), 4);
        assert_eq!(scanner.skip_comment(b"// c\nx", 0), 5);
        assert_eq!(scanner.skip_comment(b"/* c */x", 0), 7);
        assert_eq!(scanner.skip_comment(b"/* open", 0), 7);
        assert_eq!(scanner.skip_comment(b"/x", 0), 0);
        assert_eq!(scanner.skip_comment(b"x", 0), 0);

        assert_eq!(scanner.find_identifier_end(b"abc_9 x", 0), 5);
        assert_eq!(scanner.find_identifier_end(b"a-b", 0), 1);

        let mut has_decimal = false;
        assert_eq!(scanner.find_number_end(b"-12.5e-3,", 0, &mut has_decimal), 8);
        assert!(has_decimal);
        assert_eq!(scanner.find_number_end(b"42]", 0, &mut has_decimal), 2);
        assert!(!has_decimal);
        // '.' not followed by a digit stays outside the number
        assert_eq!(scanner.find_number_end(b"1.x", 0, &mut has_decimal), 1);
        // exponent without digits stays outside too
        assert_eq!(scanner.find_number_end(b"1e+", 0, &mut has_decimal), 1);

        assert_eq!(scanner.find_string_end(b"\"ab\" x", 0, b'"'), (4, true));
        assert_eq!(scanner.find_string_end(b"\"a\\\"b\"", 0, b'"'), (6, true));
        assert_eq!(scanner.find_string_end(b"\"a\nb\"", 0, b'"'), (2, false));
        assert_eq!(scanner.find_string_end(b"\"ab", 0, b'"'), (3, false));

        assert_eq!(scanner.find_block_string_end(b"\"\"\"a\"b\"\"\" x", 0), (9, true));
        assert_eq!(scanner.find_block_string_end(b"\"\"\"open", 0), (7, false));
    }
}
