// 🃏 Card Notation - Normalizer
// "K♠", "K ♠" and "King of Spades" are three spellings of ONE card
//
// Every reference table keys its rows by the compact glyph form ("K♠").
// Anything a user types (or a table cell carries) goes through normalize()
// before it is compared or looked up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// RANK
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Symbol used inside table keys ("A", "2" .. "10", "J", "Q", "K")
    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }

    /// English word for display ("King")
    pub fn name(&self) -> &'static str {
        match self {
            Rank::Ace => "Ace",
            Rank::Two => "Two",
            Rank::Three => "Three",
            Rank::Four => "Four",
            Rank::Five => "Five",
            Rank::Six => "Six",
            Rank::Seven => "Seven",
            Rank::Eight => "Eight",
            Rank::Nine => "Nine",
            Rank::Ten => "Ten",
            Rank::Jack => "Jack",
            Rank::Queen => "Queen",
            Rank::King => "King",
        }
    }

    /// Parse a rank symbol ("K", "10", "a")
    pub fn from_symbol(symbol: &str) -> Option<Rank> {
        let upper = symbol.trim().to_ascii_uppercase();
        Rank::ALL.iter().copied().find(|r| r.symbol() == upper)
    }

    /// Parse a rank word ("king", "Ten"), falling back to the symbol form
    pub fn from_word(word: &str) -> Option<Rank> {
        let word = word.trim();
        Rank::ALL
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(word))
            .or_else(|| Rank::from_symbol(word))
    }
}

// ============================================================================
// SUIT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Hearts,
    Clubs,
    Diamonds,
    Spades,
}

impl Suit {
    /// Cardology order: hearts, clubs, diamonds, spades
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Clubs, Suit::Diamonds, Suit::Spades];

    pub fn glyph(&self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Clubs => '♣',
            Suit::Diamonds => '♦',
            Suit::Spades => '♠',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Suit::Hearts => "Hearts",
            Suit::Clubs => "Clubs",
            Suit::Diamonds => "Diamonds",
            Suit::Spades => "Spades",
        }
    }

    /// Accepts the filled glyphs used by the tables and their outline variants
    pub fn from_glyph(glyph: char) -> Option<Suit> {
        match glyph {
            '♥' | '♡' => Some(Suit::Hearts),
            '♣' | '♧' => Some(Suit::Clubs),
            '♦' | '♢' => Some(Suit::Diamonds),
            '♠' | '♤' => Some(Suit::Spades),
            _ => None,
        }
    }

    /// Singular or plural English word, case-insensitive
    pub fn from_word(word: &str) -> Option<Suit> {
        let lower = word.trim().to_lowercase();
        match lower.as_str() {
            "hearts" | "heart" => Some(Suit::Hearts),
            "clubs" | "club" => Some(Suit::Clubs),
            "diamonds" | "diamond" => Some(Suit::Diamonds),
            "spades" | "spade" => Some(Suit::Spades),
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Suit::from_glyph(c),
                    _ => None,
                }
            }
        }
    }
}

// ============================================================================
// CARD
// ============================================================================

/// Card - identity is (rank, suit), never the spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Card { rank, suit }
    }

    /// Full 52-card deck, suit-major in cardology order
    pub fn deck() -> Vec<Card> {
        Suit::ALL
            .iter()
            .flat_map(|suit| Rank::ALL.iter().map(move |rank| Card::new(*rank, *suit)))
            .collect()
    }

    /// Compact glyph form, the canonical table key ("K♠")
    pub fn token(&self) -> String {
        format!("{}{}", self.rank.symbol(), self.suit.glyph())
    }

    /// Spaced glyph form ("K ♠")
    pub fn spaced(&self) -> String {
        format!("{} {}", self.rank.symbol(), self.suit.glyph())
    }

    /// Full English name ("King of Spades")
    pub fn english_name(&self) -> String {
        format!("{} of {}", self.rank.name(), self.suit.name())
    }

    /// Parse any of the three notations
    ///
    /// Examples:
    /// - "K♠" → King of Spades
    /// - "10 ♥" → Ten of Hearts
    /// - "queen of diamonds" → Queen of Diamonds
    pub fn parse(input: &str) -> Option<Card> {
        // Emoji presentation selector ("♥️") is noise for our purposes
        let cleaned: String = input.chars().filter(|c| *c != '\u{FE0F}').collect();
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            return None;
        }

        // English form: "<rank> of <suit>", compared word by word
        let words: Vec<&str> = cleaned.split_whitespace().collect();
        if let Some(pos) = words.iter().position(|w| w.eq_ignore_ascii_case("of")) {
            let rank = Rank::from_word(&words[..pos].join(" "))?;
            let suit = Suit::from_word(&words[pos + 1..].join(" "))?;
            return Some(Card::new(rank, suit));
        }

        // Glyph form, with or without whitespace between rank and suit
        let compact: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();
        let glyph = compact.chars().last()?;
        let suit = Suit::from_glyph(glyph)?;
        let rank = Rank::from_symbol(&compact[..compact.len() - glyph.len_utf8()])?;

        Some(Card::new(rank, suit))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.glyph())
    }
}

impl FromStr for Card {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Card::parse(s).ok_or_else(|| anyhow::anyhow!("Unrecognized card notation: {}", s))
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.token()
    }
}

impl TryFrom<String> for Card {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// NORMALIZER
// ============================================================================

/// Normalize any card notation to the canonical table token
///
/// Best-effort: input that is not a recognizable card comes back unchanged,
/// so callers must be ready for a lookup miss. Empty input gives "".
pub fn normalize(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    match Card::parse(input) {
        Some(card) => card.token(),
        None => input.to_string(),
    }
}

/// Strip every whitespace character (secondary lookup key)
pub(crate) fn compact_key(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

// ============================================================================
// TESTS
// ============================================================================
