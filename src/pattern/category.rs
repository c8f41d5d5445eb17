//! Character tables for `\d \D \s \S \w \W`.
//!
//! Positive classes draw from small ASCII tables so samples stay readable.
//! Negated classes instead exclude a Unicode-aware superset of each
//! category, which keeps their samples valid for Unicode matchers too.
use super::ast::Category;

const DIGITS: &str = "0123456789";
const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;
const WHITESPACE: &str = " \t\n\r\x0b\x0c";

impl Category {
    /// Characters a positive class containing this category draws from.
    pub fn table(self) -> impl Iterator<Item = char> {
        let parts: [&'static str; 3] = match self {
            Category::Digit => [DIGITS, "", ""],
            Category::NotDigit => [LETTERS, PUNCTUATION, ""],
            Category::Space => [WHITESPACE, "", ""],
            Category::NotSpace => [DIGITS, LETTERS, PUNCTUATION],
            Category::Word => [LETTERS, DIGITS, "_"],
            Category::NotWord => [PUNCTUATION, WHITESPACE, ""],
        };
        let skip_underscore = self == Category::NotWord;
        parts.into_iter().flat_map(str::chars).filter(move |&c| !(skip_underscore && c == '_'))
    }

    /// True for every character the category can match under Unicode rules,
    /// and possibly a few more.
    pub fn covers(self, c: char) -> bool {
        match self {
            Category::Digit => c.is_numeric(),
            Category::NotDigit => !c.is_ascii_digit(),
            Category::Space => c.is_whitespace(),
            Category::NotSpace => !c.is_ascii_whitespace(),
            Category::Word => c == '_' || c.is_alphanumeric() || !c.is_ascii(),
            Category::NotWord => !(c == '_' || c.is_ascii_alphanumeric()),
        }
    }
}
