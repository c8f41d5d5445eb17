//! Parsed pattern tree. Sequences are plain `Vec<Node>`; concatenation is
//! implicit.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Literal(char),
    /// `[^c]`, a single excluded character.
    NotLiteral(char),
    /// `.`, never a newline.
    AnyChar,
    CharClass { items: Vec<ClassItem>, negated: bool },
    /// Two or more alternatives.
    Branch(Vec<Vec<Node>>),
    /// Capturing groups carry their 1-based id.
    Group { id: Option<u32>, children: Vec<Node> },
    Backreference(u32),
    /// `max: None` is unbounded.
    Repeat { min: u32, max: Option<u32>, greedy: bool, children: Vec<Node> },
    Assertion(Assertion),
    /// `(?(id)yes|no)`.
    Conditional { group: u32, yes: Vec<Node>, no: Vec<Node> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
    Literal(char),
    /// Inclusive, `lo <= hi`.
    Range(char, char),
    Category(Category),
    /// `\p{..}` / `\P{..}`.
    Property { name: String, negated: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Digit,
    NotDigit,
    Space,
    NotSpace,
    Word,
    NotWord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    Start,
    End,
    WordBoundary,
    NotWordBoundary,
    Lookahead { negated: bool, children: Vec<Node> },
    Lookbehind { negated: bool, children: Vec<Node> },
}

impl Node {
    /// Class with a single category, as produced by `\d` outside brackets.
    pub fn category(category: Category) -> Self {
        Node::CharClass { items: vec![ClassItem::Category(category)], negated: false }
    }
}
