//! Recursive-descent parser for the pattern dialect accepted by
//! [`compile_pattern`](super::compile_pattern).
//!
//! Offsets in errors count `char`s from the start of the pattern.
use std::collections::HashMap;

use super::ast::{Assertion, Category, ClassItem, Node};
use crate::error::{Error, Result};

pub fn parse(pattern: &str) -> Result<Vec<Node>> {
    let mut parser = Parser::new(pattern);
    let nodes = parser.parse_alternation()?;
    if let Some(c) = parser.peek() {
        // only a stray `)` stops the top-level alternation early
        return Err(parser.error(parser.pos, format!("unbalanced parenthesis `{c}`")));
    }
    tracing::trace!(pattern, groups = parser.next_group - 1, "parsed pattern");
    Ok(nodes)
}

struct Parser<'p> {
    pattern: &'p str,
    chars: Vec<char>,
    pos: usize,
    next_group: u32,
    names: HashMap<String, u32>,
}

/// One side of a class range, or an item that cannot be one.
enum ClassAtom {
    Char(char),
    Item(ClassItem),
}

impl<'p> Parser<'p> {
    fn new(pattern: &'p str) -> Self {
        Self { pattern, chars: pattern.chars().collect(), pos: 0, next_group: 1, names: HashMap::new() }
    }

    // ————————————————————————————————————————————————————————————————————————
    // CURSOR
    // ————————————————————————————————————————————————————————————————————————

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let n = s.chars().count();
        let matches = s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += n;
        }
        matches
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> Error {
        Error::RegexSyntax { pattern: self.pattern.to_string(), offset, message: message.into() }
    }

    // ————————————————————————————————————————————————————————————————————————
    // STRUCTURE
    // ————————————————————————————————————————————————————————————————————————

    fn parse_alternation(&mut self) -> Result<Vec<Node>> {
        let mut alternatives = vec![self.parse_sequence()?];
        while self.eat('|') {
            alternatives.push(self.parse_sequence()?);
        }
        if alternatives.len() == 1 {
            Ok(alternatives.pop().unwrap_or_default())
        } else {
            Ok(vec![Node::Branch(alternatives)])
        }
    }

    fn parse_sequence(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                '|' | ')' => break,
                '*' | '+' | '?' => {
                    self.bump();
                    let (min, max) = match c {
                        '*' => (0, None),
                        '+' => (1, None),
                        _ => (0, Some(1)),
                    };
                    self.apply_repeat(&mut nodes, start, min, max)?;
                }
                '{' => match self.parse_braces(start)? {
                    Some((min, max)) => self.apply_repeat(&mut nodes, start, min, max)?,
                    None => {
                        self.bump();
                        nodes.push(Node::Literal('{'));
                    }
                },
                _ => nodes.push(self.parse_atom()?),
            }
        }
        Ok(nodes)
    }

    /// `{n}`, `{n,}`, `{,m}`, `{n,m}`. Anything else leaves the cursor on
    /// the `{` and returns `None`.
    fn parse_braces(&mut self, start: usize) -> Result<Option<(u32, Option<u32>)>> {
        self.bump();
        if self.peek() == Some('}') {
            self.pos = start;
            return Ok(None);
        }
        let lo = self.digits();
        let hi = if self.eat(',') { self.digits() } else { lo.clone() };
        if !self.eat('}') {
            self.pos = start;
            return Ok(None);
        }
        let number = |digits: &str| -> Result<Option<u32>> {
            if digits.is_empty() {
                return Ok(None);
            }
            digits
                .parse::<u32>()
                .map(Some)
                .map_err(|_| self.error(start, "the repetition number is too large"))
        };
        let min = number(&lo)?.unwrap_or(0);
        let max = number(&hi)?;
        if let Some(max) = max {
            if min > max {
                return Err(self.error(start, "min repeat greater than max repeat"));
            }
        }
        Ok(Some((min, max)))
    }

    fn digits(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            out.push(c);
            self.pos += 1;
        }
        out
    }

    fn apply_repeat(&mut self, nodes: &mut Vec<Node>, start: usize, min: u32, max: Option<u32>) -> Result<()> {
        let greedy = !self.eat('?');
        match nodes.pop() {
            None | Some(Node::Assertion(_)) => Err(self.error(start, "nothing to repeat")),
            Some(Node::Repeat { .. }) => Err(self.error(start, "multiple repeat")),
            Some(node) => {
                nodes.push(Node::Repeat { min, max, greedy, children: vec![node] });
                Ok(())
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Node> {
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Err(self.error(start, "unexpected end of pattern"));
        };
        match c {
            '(' => self.parse_group(start),
            '[' => self.parse_class(start),
            '.' => Ok(Node::AnyChar),
            '^' => Ok(Node::Assertion(Assertion::Start)),
            '$' => Ok(Node::Assertion(Assertion::End)),
            '\\' => self.parse_escape(start),
            c => Ok(Node::Literal(c)),
        }
    }

    // ————————————————————————————————————————————————————————————————————————
    // GROUPS
    // ————————————————————————————————————————————————————————————————————————

    fn parse_group(&mut self, start: usize) -> Result<Node> {
        if !self.eat('?') {
            let id = self.open_group();
            let children = self.parse_group_body(start)?;
            return Ok(Node::Group { id: Some(id), children });
        }

        if self.eat(':') {
            let children = self.parse_group_body(start)?;
            return Ok(Node::Group { id: None, children });
        }
        if matches!(self.peek(), Some('=' | '!')) {
            let negated = self.bump() == Some('!');
            let children = self.parse_group_body(start)?;
            return Ok(Node::Assertion(Assertion::Lookahead { negated, children }));
        }
        if self.eat_str("<=") || self.eat_str("<!") {
            let negated = self.chars[self.pos - 1] == '!';
            let children = self.parse_group_body(start)?;
            return Ok(Node::Assertion(Assertion::Lookbehind { negated, children }));
        }
        if self.eat_str("P<") || self.eat('<') {
            let name = self.parse_name('>')?;
            if self.names.contains_key(&name) {
                return Err(self.error(start, format!("redefinition of group name `{name}`")));
            }
            let id = self.open_group();
            self.names.insert(name, id);
            let children = self.parse_group_body(start)?;
            return Ok(Node::Group { id: Some(id), children });
        }
        if self.eat_str("P=") {
            let name = self.parse_name(')')?;
            return match self.names.get(&name) {
                Some(&id) => Ok(Node::Backreference(id)),
                None => Err(self.error(start, format!("unknown group name `{name}`"))),
            };
        }
        if self.eat('(') {
            return self.parse_conditional(start);
        }

        match self.peek() {
            Some('>') => Err(Error::unsupported("atomic group (?>...)")),
            Some('#') => Err(Error::unsupported("comment group (?#...)")),
            Some(c) if "aiLmsux-".contains(c) => Err(Error::unsupported(format!("inline flags (?{c}...)"))),
            Some(c) => Err(self.error(self.pos, format!("unknown extension ?{c}"))),
            None => Err(self.error(self.pos, "unexpected end of pattern")),
        }
    }

    fn open_group(&mut self) -> u32 {
        let id = self.next_group;
        self.next_group += 1;
        id
    }

    fn parse_group_body(&mut self, start: usize) -> Result<Vec<Node>> {
        let children = self.parse_alternation()?;
        if !self.eat(')') {
            return Err(self.error(start, "missing ), unterminated subpattern"));
        }
        Ok(children)
    }

    /// Group name up to (and consuming) `terminator`.
    fn parse_name(&mut self, terminator: char) -> Result<String> {
        let start = self.pos;
        let mut name = String::new();
        loop {
            match self.bump() {
                Some(c) if c == terminator => break,
                Some(c) => name.push(c),
                None => return Err(self.error(start, "missing group name terminator")),
            }
        }
        let valid = name.chars().next().is_some_and(|c| c == '_' || c.is_alphabetic())
            && name.chars().all(|c| c == '_' || c.is_alphanumeric());
        if !valid {
            return Err(self.error(start, format!("bad character in group name `{name}`")));
        }
        Ok(name)
    }

    fn parse_conditional(&mut self, start: usize) -> Result<Node> {
        let name_start = self.pos;
        let mut reference = String::new();
        loop {
            match self.bump() {
                Some(')') => break,
                Some(c) => reference.push(c),
                None => return Err(self.error(name_start, "missing ), unterminated name")),
            }
        }
        let group = match reference.parse::<u32>() {
            Ok(0) => return Err(self.error(name_start, "bad group number")),
            Ok(id) => id,
            Err(_) => match self.names.get(&reference) {
                Some(&id) => id,
                None => return Err(self.error(name_start, format!("unknown group name `{reference}`"))),
            },
        };
        let yes = self.parse_sequence()?;
        let no = if self.eat('|') { self.parse_sequence()? } else { Vec::new() };
        if self.peek() == Some('|') {
            return Err(self.error(self.pos, "conditional backref with more than two branches"));
        }
        if !self.eat(')') {
            return Err(self.error(start, "missing ), unterminated subpattern"));
        }
        Ok(Node::Conditional { group, yes, no })
    }

    // ————————————————————————————————————————————————————————————————————————
    // ESCAPES
    // ————————————————————————————————————————————————————————————————————————

    fn parse_escape(&mut self, start: usize) -> Result<Node> {
        let Some(c) = self.bump() else {
            return Err(self.error(start, "bad escape (end of pattern)"));
        };
        let node = match c {
            'd' => Node::category(Category::Digit),
            'D' => Node::category(Category::NotDigit),
            's' => Node::category(Category::Space),
            'S' => Node::category(Category::NotSpace),
            'w' => Node::category(Category::Word),
            'W' => Node::category(Category::NotWord),
            'b' => Node::Assertion(Assertion::WordBoundary),
            'B' => Node::Assertion(Assertion::NotWordBoundary),
            'A' => Node::Assertion(Assertion::Start),
            'Z' => Node::Assertion(Assertion::End),
            'p' | 'P' => {
                let name = self.parse_property_name(start)?;
                let items = vec![ClassItem::Property { name, negated: c == 'P' }];
                Node::CharClass { items, negated: false }
            }
            '1'..='9' => self.parse_numeric_reference(start, c)?,
            c => Node::Literal(self.parse_char_escape(start, c)?),
        };
        Ok(node)
    }

    /// `\1`–`\99` refer to groups; three octal digits are a character.
    fn parse_numeric_reference(&mut self, start: usize, first: char) -> Result<Node> {
        let second = self.peek().filter(char::is_ascii_digit);
        if let Some(second) = second {
            let third = self.peek_at(1).filter(|c| c.is_digit(8));
            if let (true, true, Some(third)) = (first.is_digit(8), second.is_digit(8), third) {
                self.pos += 2;
                return self.octal_char(start, &[first, second, third]).map(Node::Literal);
            }
            self.pos += 1;
        }
        let digits: String = std::iter::once(first).chain(second).collect();
        let id = digits
            .parse::<u32>()
            .map_err(|_| self.error(start, format!("invalid group reference {digits}")))?;
        Ok(Node::Backreference(id))
    }

    /// Escapes that stand for one character, shared by both contexts.
    fn parse_char_escape(&mut self, start: usize, c: char) -> Result<char> {
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            'f' => Ok('\x0c'),
            'v' => Ok('\x0b'),
            'a' => Ok('\x07'),
            '0'..='7' => {
                let mut digits = vec![c];
                while digits.len() < 3 {
                    match self.peek().filter(|d| d.is_digit(8)) {
                        Some(d) => {
                            digits.push(d);
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                self.octal_char(start, &digits)
            }
            'x' => self.hex_char(start, 2),
            'u' => self.hex_char(start, 4),
            'U' => self.hex_char(start, 8),
            c if c.is_ascii_alphanumeric() => Err(self.error(start, format!("bad escape \\{c}"))),
            c => Ok(c),
        }
    }

    fn octal_char(&self, start: usize, digits: &[char]) -> Result<char> {
        let text: String = digits.iter().collect();
        u32::from_str_radix(&text, 8)
            .ok()
            .filter(|v| *v <= 0o377)
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(start, format!("octal escape value \\{text} outside of range 0-0o377")))
    }

    fn hex_char(&mut self, start: usize, len: usize) -> Result<char> {
        let mut text = String::with_capacity(len);
        for _ in 0..len {
            match self.peek().filter(char::is_ascii_hexdigit) {
                Some(c) => {
                    text.push(c);
                    self.pos += 1;
                }
                None => return Err(self.error(start, format!("incomplete escape, expected {len} hex digits"))),
            }
        }
        u32::from_str_radix(&text, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(start, format!("bad escape, {text:?} is not a scalar value")))
    }

    fn parse_property_name(&mut self, start: usize) -> Result<String> {
        if !self.eat('{') {
            return match self.bump() {
                Some(c) if c.is_ascii_alphabetic() => Ok(c.to_string()),
                _ => Err(self.error(start, "bad property escape")),
            };
        }
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('}') if !name.is_empty() => return Ok(name),
                Some(c) if c.is_ascii_alphanumeric() || "_=-".contains(c) => name.push(c),
                _ => return Err(self.error(start, "bad property escape")),
            }
        }
    }

    // ————————————————————————————————————————————————————————————————————————
    // CLASSES
    // ————————————————————————————————————————————————————————————————————————

    fn parse_class(&mut self, start: usize) -> Result<Node> {
        let negated = self.eat('^');
        let mut items = Vec::new();
        let mut first = true;
        loop {
            let item_start = self.pos;
            let atom = match self.bump() {
                None => return Err(self.error(start, "unterminated character set")),
                Some(']') if !first => break,
                Some('\\') => self.parse_class_escape(item_start)?,
                Some(c) => ClassAtom::Char(c),
            };
            first = false;

            let is_range = self.peek() == Some('-') && !matches!(self.peek_at(1), None | Some(']'));
            match (atom, is_range) {
                (ClassAtom::Char(lo), true) => {
                    self.bump();
                    let hi_start = self.pos;
                    let hi = match self.bump() {
                        Some('\\') => self.parse_class_escape(hi_start)?,
                        Some(c) => ClassAtom::Char(c),
                        None => return Err(self.error(start, "unterminated character set")),
                    };
                    let ClassAtom::Char(hi) = hi else {
                        return Err(self.error(item_start, "bad character range"));
                    };
                    if lo > hi {
                        return Err(self.error(item_start, format!("bad character range {lo}-{hi}")));
                    }
                    items.push(ClassItem::Range(lo, hi));
                }
                (ClassAtom::Item(_), true) => return Err(self.error(item_start, "bad character range")),
                (ClassAtom::Char(c), false) => items.push(ClassItem::Literal(c)),
                (ClassAtom::Item(item), false) => items.push(item),
            }
        }

        Ok(match (items.as_slice(), negated) {
            ([ClassItem::Literal(c)], false) => Node::Literal(*c),
            ([ClassItem::Literal(c)], true) => Node::NotLiteral(*c),
            _ => Node::CharClass { items, negated },
        })
    }

    fn parse_class_escape(&mut self, start: usize) -> Result<ClassAtom> {
        let Some(c) = self.bump() else {
            return Err(self.error(start, "bad escape (end of pattern)"));
        };
        let category = |category: Category| -> Result<ClassAtom> {
            Ok(ClassAtom::Item(ClassItem::Category(category)))
        };
        match c {
            'd' => category(Category::Digit),
            'D' => category(Category::NotDigit),
            's' => category(Category::Space),
            'S' => category(Category::NotSpace),
            'w' => category(Category::Word),
            'W' => category(Category::NotWord),
            'b' => Ok(ClassAtom::Char('\x08')),
            'p' | 'P' => {
                let name = self.parse_property_name(start)?;
                Ok(ClassAtom::Item(ClassItem::Property { name, negated: c == 'P' }))
            }
            c => self.parse_char_escape(start, c).map(ClassAtom::Char),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lit(s: &str) -> Vec<Node> {
        s.chars().map(Node::Literal).collect()
    }

    fn syntax_offset(pattern: &str) -> usize {
        match parse(pattern) {
            Err(Error::RegexSyntax { offset, .. }) => offset,
            other => panic!("{pattern}: expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn literals_and_counted_repeat() {
        assert_eq!(
            parse("a[0-9]{2,3}").unwrap(),
            vec![
                Node::Literal('a'),
                Node::Repeat {
                    min: 2,
                    max: Some(3),
                    greedy: true,
                    children: vec![Node::CharClass { items: vec![ClassItem::Range('0', '9')], negated: false }],
                },
            ]
        );
    }

    #[test]
    fn alternation_inside_a_group_with_backreference() {
        assert_eq!(
            parse(r"(ab|cd)\1").unwrap(),
            vec![
                Node::Group { id: Some(1), children: vec![Node::Branch(vec![lit("ab"), lit("cd")])] },
                Node::Backreference(1),
            ]
        );
    }

    #[test]
    fn quantifier_forms() {
        let repeat = |min, max, greedy| Node::Repeat { min, max, greedy, children: vec![Node::Literal('x')] };
        assert_eq!(parse("x*").unwrap(), vec![repeat(0, None, true)]);
        assert_eq!(parse("x+?").unwrap(), vec![repeat(1, None, false)]);
        assert_eq!(parse("x?").unwrap(), vec![repeat(0, Some(1), true)]);
        assert_eq!(parse("x{3}").unwrap(), vec![repeat(3, Some(3), true)]);
        assert_eq!(parse("x{2,}").unwrap(), vec![repeat(2, None, true)]);
        assert_eq!(parse("x{,4}").unwrap(), vec![repeat(0, Some(4), true)]);
    }

    #[test]
    fn braces_that_are_not_quantifiers_are_literal() {
        assert_eq!(parse("x{}").unwrap(), lit("x{}"));
        assert_eq!(parse("{a}").unwrap(), lit("{a}"));
        assert_eq!(parse("x{1").unwrap(), lit("x{1"));
    }

    #[test]
    fn single_item_classes_collapse() {
        assert_eq!(parse("[a]").unwrap(), vec![Node::Literal('a')]);
        assert_eq!(parse("[^a]").unwrap(), vec![Node::NotLiteral('a')]);
        assert_eq!(parse("[]]").unwrap(), vec![Node::Literal(']')]);
    }

    #[test]
    fn class_items() {
        assert_eq!(
            parse(r"[^\d_a-f-]").unwrap(),
            vec![Node::CharClass {
                items: vec![
                    ClassItem::Category(Category::Digit),
                    ClassItem::Literal('_'),
                    ClassItem::Range('a', 'f'),
                    ClassItem::Literal('-'),
                ],
                negated: true,
            }]
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(parse(r"\n\x41é\.\0").unwrap(), lit("\nAé.\0"));
        assert_eq!(parse(r"\w").unwrap(), vec![Node::category(Category::Word)]);
        assert_eq!(parse(r"\101").unwrap(), vec![Node::Literal('A')]);
        assert_eq!(parse(r"\12").unwrap(), vec![Node::Backreference(12)]);
    }

    #[test]
    fn named_groups_and_references() {
        assert_eq!(
            parse(r"(?P<x>a)(?<y>b)(?P=x)").unwrap(),
            vec![
                Node::Group { id: Some(1), children: lit("a") },
                Node::Group { id: Some(2), children: lit("b") },
                Node::Backreference(1),
            ]
        );
    }

    #[test]
    fn group_ids_follow_opening_order() {
        assert_eq!(
            parse("((a)(?:b)(c))").unwrap(),
            vec![Node::Group {
                id: Some(1),
                children: vec![
                    Node::Group { id: Some(2), children: lit("a") },
                    Node::Group { id: None, children: lit("b") },
                    Node::Group { id: Some(3), children: lit("c") },
                ],
            }]
        );
    }

    #[test]
    fn lookaround_and_conditional() {
        assert_eq!(
            parse("(?=a)(?<!b)").unwrap(),
            vec![
                Node::Assertion(Assertion::Lookahead { negated: false, children: lit("a") }),
                Node::Assertion(Assertion::Lookbehind { negated: true, children: lit("b") }),
            ]
        );
        assert_eq!(
            parse("(a)?(?(1)b|c)").unwrap()[1],
            Node::Conditional { group: 1, yes: lit("b"), no: lit("c") }
        );
    }

    #[test]
    fn properties_parse_as_class_items() {
        assert_eq!(
            parse(r"\p{L}").unwrap(),
            vec![Node::CharClass {
                items: vec![ClassItem::Property { name: "L".into(), negated: false }],
                negated: false,
            }]
        );
    }

    #[test]
    fn syntax_errors_report_offsets() {
        assert_eq!(syntax_offset("*a"), 0);
        assert_eq!(syntax_offset("a**"), 2);
        assert_eq!(syntax_offset("ab)"), 2);
        assert_eq!(syntax_offset("(ab"), 0);
        assert_eq!(syntax_offset("x[z-a]"), 2);
        assert_eq!(syntax_offset("[abc"), 0);
        assert_eq!(syntax_offset("a{3,1}"), 1);
        assert_eq!(syntax_offset(r"\q"), 0);
        assert_eq!(syntax_offset("^*"), 1);
        assert_eq!(syntax_offset("(?P=nope)"), 0);
    }

    #[test]
    fn extensions_without_a_generator_are_unsupported() {
        for pattern in ["(?i)abc", "(?>a)", "(?#note)"] {
            assert!(matches!(parse(pattern), Err(Error::RegexUnsupportedOpcode { .. })), "{pattern}");
        }
    }
}
