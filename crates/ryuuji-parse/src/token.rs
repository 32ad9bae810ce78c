use std::ops::{Index, IndexMut};

use crate::error::ParseError;

/// Stable handle to a token in a [`TokenStream`].
///
/// Handles are minted on insertion and never reused, so they stay valid
/// while the stream is spliced, merged and compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(u32);

/// Token categories produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    /// Text not yet claimed by any pass.
    Unknown,
    /// An opening or closing bracket character.
    Bracket,
    /// A single delimiter character.
    Delimiter,
    /// Text claimed by a pass.
    Identifier,
    /// Tombstone left behind by a merge, dropped on compaction.
    Invalid,
}

/// A single token from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub category: TokenCategory,
    pub content: String,
    /// Whether this token sits inside a bracket pair.
    /// Always true for `Bracket` tokens.
    pub enclosed: bool,
}

impl Token {
    pub fn new(category: TokenCategory, content: impl Into<String>, enclosed: bool) -> Self {
        Self {
            category,
            content: content.into(),
            enclosed,
        }
    }

    pub fn is(&self, category: TokenCategory) -> bool {
        self.category == category
    }
}

/// One category requirement of a [`TokenFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryTest {
    Is(TokenCategory),
    IsNot(TokenCategory),
}

impl CategoryTest {
    fn matches(self, category: TokenCategory) -> bool {
        match self {
            Self::Is(c) => category == c,
            Self::IsNot(c) => category != c,
        }
    }
}

/// Enclosure requirement of a [`TokenFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enclosure {
    Any,
    Enclosed,
    NotEnclosed,
}

/// Predicate for token navigation.
///
/// A token matches when its enclosure satisfies `enclosure` and at least
/// one of `tests` holds for its category. An empty test list accepts every
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenFilter {
    pub tests: &'static [CategoryTest],
    pub enclosure: Enclosure,
}

impl TokenFilter {
    pub const ANY: Self = Self::new(&[]);
    pub const VALID: Self = Self::new(&[CategoryTest::IsNot(TokenCategory::Invalid)]);
    pub const NOT_DELIMITER: Self = Self::new(&[CategoryTest::IsNot(TokenCategory::Delimiter)]);
    pub const UNKNOWN: Self = Self::new(&[CategoryTest::Is(TokenCategory::Unknown)]);
    pub const BRACKET: Self = Self::new(&[CategoryTest::Is(TokenCategory::Bracket)]);
    pub const DELIMITER: Self = Self::new(&[CategoryTest::Is(TokenCategory::Delimiter)]);
    pub const IDENTIFIER: Self = Self::new(&[CategoryTest::Is(TokenCategory::Identifier)]);
    pub const BRACKET_OR_IDENTIFIER: Self = Self::new(&[
        CategoryTest::Is(TokenCategory::Bracket),
        CategoryTest::Is(TokenCategory::Identifier),
    ]);

    pub const fn new(tests: &'static [CategoryTest]) -> Self {
        Self {
            tests,
            enclosure: Enclosure::Any,
        }
    }

    pub const fn enclosed(self) -> Self {
        Self {
            enclosure: Enclosure::Enclosed,
            ..self
        }
    }

    pub const fn not_enclosed(self) -> Self {
        Self {
            enclosure: Enclosure::NotEnclosed,
            ..self
        }
    }

    pub fn matches(&self, token: &Token) -> bool {
        let enclosure = match self.enclosure {
            Enclosure::Any => true,
            Enclosure::Enclosed => token.enclosed,
            Enclosure::NotEnclosed => !token.enclosed,
        };
        enclosure
            && (self.tests.is_empty() || self.tests.iter().any(|t| t.matches(token.category)))
    }
}

/// Ordered, mutable sequence of tokens addressed by [`TokenId`].
///
/// Tokens live in an arena that only grows; the live order is a separate
/// list of handles. Merged-away tokens are tombstoned as `Invalid` and
/// leave the order on [`TokenStream::compact`].
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    arena: Vec<Token>,
    order: Vec<TokenId>,
    /// Position in `order` of each arena slot, `None` once removed.
    slots: Vec<Option<usize>>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn mint(&mut self, token: Token) -> TokenId {
        let id = TokenId(self.arena.len() as u32);
        self.arena.push(token);
        self.slots.push(None);
        id
    }

    fn reindex(&mut self, from: usize) {
        for (i, id) in self.order[from..].iter().enumerate() {
            self.slots[id.0 as usize] = Some(from + i);
        }
    }

    /// Append a token at the end of the stream.
    pub fn push(&mut self, token: Token) -> TokenId {
        let id = self.mint(token);
        self.slots[id.0 as usize] = Some(self.order.len());
        self.order.push(id);
        id
    }

    /// Insert a token at `index`.
    ///
    /// Returns `Ok(None)` without inserting when the token already at
    /// `index` has the same content.
    pub fn insert_at(&mut self, index: usize, token: Token) -> Result<Option<TokenId>, ParseError> {
        if index > self.order.len() {
            return Err(ParseError::IndexOutOfRange {
                index,
                len: self.order.len(),
            });
        }
        if let Some(&existing) = self.order.get(index) {
            if self[existing].content == token.content {
                return Ok(None);
            }
        }
        let id = self.mint(token);
        self.order.insert(index, id);
        self.reindex(index);
        Ok(Some(id))
    }

    /// Snapshot of the live handles in order.
    pub fn ids(&self) -> Vec<TokenId> {
        self.order.clone()
    }

    /// Live tokens in order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &Token)> + '_ {
        self.order.iter().map(|&id| (id, &self[id]))
    }

    pub fn position(&self, id: TokenId) -> Result<usize, ParseError> {
        self.slots
            .get(id.0 as usize)
            .copied()
            .flatten()
            .ok_or(ParseError::TokenNotFound(id))
    }

    pub fn at(&self, index: usize) -> Option<TokenId> {
        self.order.get(index).copied()
    }

    pub fn first(&self, filter: TokenFilter) -> Option<TokenId> {
        self.order.iter().copied().find(|&id| filter.matches(&self[id]))
    }

    pub fn last(&self, filter: TokenFilter) -> Option<TokenId> {
        self.order.iter().rev().copied().find(|&id| filter.matches(&self[id]))
    }

    /// First matching token after `from`.
    pub fn next(&self, from: TokenId, filter: TokenFilter) -> Result<Option<TokenId>, ParseError> {
        let pos = self.position(from)?;
        Ok(self.order[pos + 1..]
            .iter()
            .copied()
            .find(|&id| filter.matches(&self[id])))
    }

    /// Nearest matching token before `from`.
    pub fn previous(
        &self,
        from: TokenId,
        filter: TokenFilter,
    ) -> Result<Option<TokenId>, ParseError> {
        let pos = self.position(from)?;
        Ok(self.order[..pos]
            .iter()
            .rev()
            .copied()
            .find(|&id| filter.matches(&self[id])))
    }

    /// Matching tokens from `begin` through `end` inclusive. A missing `end`
    /// runs to the end of the stream.
    pub fn slice(
        &self,
        filter: TokenFilter,
        begin: TokenId,
        end: Option<TokenId>,
    ) -> Result<Vec<TokenId>, ParseError> {
        let b = self.position(begin)?;
        let e = match end {
            Some(end) => self.position(end)?,
            None => self.order.len().saturating_sub(1),
        };
        if e < b {
            return Err(ParseError::InvertedRange);
        }
        Ok(self.order[b..=e]
            .iter()
            .copied()
            .filter(|&id| filter.matches(&self[id]))
            .collect())
    }

    /// Signed index delta from `begin` to `end`. A missing `end` counts as
    /// the last token.
    pub fn distance(&self, begin: TokenId, end: Option<TokenId>) -> Result<isize, ParseError> {
        let b = self.position(begin)? as isize;
        let e = match end {
            Some(end) => self.position(end)? as isize,
            None => self.order.len() as isize - 1,
        };
        Ok(e - b)
    }

    /// Whether the nearest non-delimiter tokens on both sides are brackets.
    pub fn is_isolated(&self, id: TokenId) -> Result<bool, ParseError> {
        let is_bracket = |t: Option<TokenId>| t.is_some_and(|t| self[t].is(TokenCategory::Bracket));
        Ok(is_bracket(self.previous(id, TokenFilter::NOT_DELIMITER)?)
            && is_bracket(self.next(id, TokenFilter::NOT_DELIMITER)?))
    }

    /// Append the content of `source` to `target` and tombstone `source`.
    pub fn merge_into(&mut self, source: TokenId, target: TokenId) -> Result<(), ParseError> {
        self.position(source)?;
        self.position(target)?;
        let content = std::mem::take(&mut self[source].content);
        self[source].category = TokenCategory::Invalid;
        self[target].content.push_str(&content);
        Ok(())
    }

    /// Drop every tombstoned token from the live order.
    pub fn compact(&mut self) {
        let arena = &self.arena;
        let slots = &mut self.slots;
        self.order.retain(|id| {
            let live = arena[id.0 as usize].category != TokenCategory::Invalid;
            if !live {
                slots[id.0 as usize] = None;
            }
            live
        });
        self.reindex(0);
    }
}

impl Index<TokenId> for TokenStream {
    type Output = Token;

    fn index(&self, id: TokenId) -> &Token {
        &self.arena[id.0 as usize]
    }
}

impl IndexMut<TokenId> for TokenStream {
    fn index_mut(&mut self, id: TokenId) -> &mut Token {
        &mut self.arena[id.0 as usize]
    }
}
