//! Token model: the closed vocabulary of grammar positions and their matchers.
//!
//! Every value-bearing [`TokenKind`] owns two pure predicates: a full match
//! used by the parser (returning a [`MatchRank`] for tie-breaking) and a
//! prefix match used by completion to decide whether a partially typed token
//! could still become a match.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Classification of a grammar position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TokenKind {
    // ── Structural markers ──────────────────────────────────────────────
    /// `(`: start of a required alternation.
    ParenOpen,
    /// `)`: end of a required alternation.
    ParenClose,
    /// `{`: start of a brace group; in the tree, the group node itself.
    BraceOpen,
    /// `}`: end of a brace group.
    BraceClose,
    /// `[`: start of an optional alternation.
    BracketOpen,
    /// `]`: end of an optional alternation.
    BracketClose,
    /// Boundary between positions; used for forest roots.
    Separator,
    /// `|`: alternative separator in grammars, modifier separator in lines.
    Pipe,
    /// `>`: output redirection marker.
    Redirect,
    /// Wildcard position that accepts any single token.
    Any,
    /// `?`: a request for context help.
    Question,

    // ── Value-bearing kinds ─────────────────────────────────────────────
    /// Literal keyword; accepts the full text or an abbreviation of it.
    Keyword,
    /// `*alias=keyword`: alternative spelling of a keyword.
    Alias,
    /// `WORD`: any single token.
    Word,
    /// `<min-max>`: bounded unsigned integer.
    Range,
    /// `LINE`: the rest of the line.
    Line,
    /// `A.B.C.D`
    Ipv4,
    /// `A.B.C.D/M`
    Ipv4Prefix,
    /// `X:X::X:X`
    Ipv6,
    /// `X:X::X:X/M`
    Ipv6Prefix,
    /// `HH:MM:SS`
    Time,
    /// `AA:NN`
    Community,
    /// `XXXX.XXXX.XXXX`
    MacAddress,
    /// `IFNAME`
    IfName,
}

/// Placeholder spellings and the kinds they compile to.
const PLACEHOLDERS: &[(&str, TokenKind)] = &[
    ("A.B.C.D", TokenKind::Ipv4),
    ("A.B.C.D/M", TokenKind::Ipv4Prefix),
    ("X:X::X:X", TokenKind::Ipv6),
    ("X:X::X:X/M", TokenKind::Ipv6Prefix),
    ("WORD", TokenKind::Word),
    ("LINE", TokenKind::Line),
    ("HH:MM:SS", TokenKind::Time),
    ("AA:NN", TokenKind::Community),
    ("XXXX.XXXX.XXXX", TokenKind::MacAddress),
    ("IFNAME", TokenKind::IfName),
];

impl TokenKind {
    /// Structural markers never bind arguments.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            TokenKind::ParenOpen
                | TokenKind::ParenClose
                | TokenKind::BraceOpen
                | TokenKind::BraceClose
                | TokenKind::BracketOpen
                | TokenKind::BracketClose
                | TokenKind::Separator
                | TokenKind::Pipe
                | TokenKind::Redirect
                | TokenKind::Any
                | TokenKind::Question
        )
    }

    /// Keywords and aliases: the completion text is the literal itself.
    pub fn is_literal(self) -> bool {
        matches!(self, TokenKind::Keyword | TokenKind::Alias)
    }

    /// Canonical placeholder spelling, for kinds that have one.
    pub fn placeholder(self) -> Option<&'static str> {
        PLACEHOLDERS
            .iter()
            .find(|(_, k)| *k == self)
            .map(|(text, _)| *text)
    }

    /// Kind for a placeholder spelling (`A.B.C.D`, `WORD`, ...).
    pub fn from_placeholder(text: &str) -> Option<TokenKind> {
        PLACEHOLDERS
            .iter()
            .find(|(p, _)| *p == text)
            .map(|(_, k)| *k)
    }

    /// Sort class used for deterministic child and completion order:
    /// literals, then placeholders, then structural nodes.
    pub(crate) fn sort_class(self) -> u8 {
        if self.is_literal() {
            0
        } else if self.is_structural() {
            2
        } else {
            1
        }
    }
}

/// How well a token matched a node. Higher ranks win; equal top ranks are
/// ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchRank {
    /// Rest-of-line.
    Line,
    /// Free-form word.
    Word,
    /// Bounded number.
    Range,
    /// Interface name.
    IfName,
    /// Typed value: address, prefix, MAC, time, or community.
    Value,
    /// Abbreviation of a keyword.
    PartialKeyword,
    /// Exact alias spelling.
    Alias,
    /// Exact keyword.
    ExactKeyword,
}

/// Inclusive numeric bounds of a range token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumRange {
    /// Smallest accepted value.
    pub min: u32,
    /// Largest accepted value.
    pub max: u32,
}

impl NumRange {
    /// Whether `value` lies within the bounds.
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// A single grammar position: its kind, its literal or pattern text, and for
/// ranges the numeric bounds.
///
/// Two positions are the same node when their `TokenSpec`s are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenSpec {
    /// Kind of the position.
    pub kind: TokenKind,
    /// Keyword text, `alias=keyword`, range text, placeholder, or group text.
    pub text: String,
    /// Bounds for [`TokenKind::Range`].
    pub range: Option<NumRange>,
}

impl TokenSpec {
    /// A literal keyword.
    pub fn keyword(text: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Keyword,
            text: text.into(),
            range: None,
        }
    }

    /// An alias: `alias` typed by the operator stands for `keyword`.
    pub fn alias(alias: &str, keyword: &str) -> Self {
        Self {
            kind: TokenKind::Alias,
            text: format!("{alias}={keyword}"),
            range: None,
        }
    }

    /// A numeric range `<min-max>`.
    pub fn range(min: u32, max: u32) -> Self {
        Self {
            kind: TokenKind::Range,
            text: format!("<{min}-{max}>"),
            range: Some(NumRange { min, max }),
        }
    }

    /// A placeholder kind, spelled canonically. `recursive` prefixes a `.`.
    pub fn placeholder(kind: TokenKind, recursive: bool) -> Self {
        let base = kind.placeholder().unwrap_or_default();
        let text = if recursive {
            format!(".{base}")
        } else {
            base.to_string()
        };
        Self {
            kind,
            text,
            range: None,
        }
    }

    /// A structural position (group node or forest root).
    pub(crate) fn structural(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            range: None,
        }
    }

    /// `(alias, keyword)` for alias positions.
    pub fn alias_parts(&self) -> Option<(&str, &str)> {
        if self.kind == TokenKind::Alias {
            self.text.split_once('=')
        } else {
            None
        }
    }

    /// Text the position binds as an argument when it is a literal inside a group.
    pub fn canonical(&self) -> &str {
        match self.alias_parts() {
            Some((_, keyword)) => keyword,
            None => &self.text,
        }
    }

    /// Text shown by completion and describe.
    pub fn display(&self) -> &str {
        match self.alias_parts() {
            Some((alias, _)) => alias,
            None => &self.text,
        }
    }

    /// Full match of `input` against this position.
    ///
    /// `allow_plus` permits a leading `+` on numeric ranges.
    pub fn matches(&self, input: &str, allow_plus: bool) -> Option<MatchRank> {
        if input.is_empty() {
            return None;
        }
        match self.kind {
            TokenKind::Keyword => {
                if input == self.text {
                    Some(MatchRank::ExactKeyword)
                } else if self.text.starts_with(input) {
                    Some(MatchRank::PartialKeyword)
                } else {
                    None
                }
            }
            TokenKind::Alias => self
                .alias_parts()
                .filter(|(alias, _)| *alias == input)
                .map(|_| MatchRank::Alias),
            TokenKind::Word | TokenKind::Any => Some(MatchRank::Word),
            TokenKind::Line => Some(MatchRank::Line),
            TokenKind::Range => {
                let digits = match input.strip_prefix('+') {
                    Some(rest) if allow_plus => rest,
                    Some(_) => return None,
                    None => input,
                };
                let value = parse_decimal(digits)?;
                self.range
                    .filter(|r| r.contains(value))
                    .map(|_| MatchRank::Range)
            }
            TokenKind::Ipv4 => is_ipv4(input).then_some(MatchRank::Value),
            TokenKind::Ipv4Prefix => is_ipv4_prefix(input).then_some(MatchRank::Value),
            TokenKind::Ipv6 => is_ipv6(input).then_some(MatchRank::Value),
            TokenKind::Ipv6Prefix => is_ipv6_prefix(input).then_some(MatchRank::Value),
            TokenKind::Time => is_time(input).then_some(MatchRank::Value),
            TokenKind::Community => is_community(input).then_some(MatchRank::Value),
            TokenKind::MacAddress => is_mac(input).then_some(MatchRank::Value),
            TokenKind::IfName => is_ifname(input).then_some(MatchRank::IfName),
            _ => None,
        }
    }

    /// Whether `partial` could still grow into a full match.
    ///
    /// An empty prefix is consistent with every value-bearing position.
    pub fn matches_prefix(&self, partial: &str) -> bool {
        if self.kind.is_structural() {
            return false;
        }
        if partial.is_empty() {
            return true;
        }
        match self.kind {
            TokenKind::Keyword => self.text.starts_with(partial),
            TokenKind::Alias => self
                .alias_parts()
                .is_some_and(|(alias, _)| alias.starts_with(partial)),
            TokenKind::Word | TokenKind::Line => true,
            TokenKind::Range => {
                let digits = partial.strip_prefix('+').unwrap_or(partial);
                digits.is_empty()
                    || parse_decimal(digits)
                        .zip(self.range)
                        .is_some_and(|(v, r)| v <= r.max)
            }
            TokenKind::Ipv4 => ipv4_prefix_ok(partial),
            TokenKind::Ipv4Prefix => match partial.split_once('/') {
                Some((addr, len)) => {
                    is_ipv4(addr) && (len.is_empty() || parse_decimal(len).is_some_and(|l| l <= 32))
                }
                None => ipv4_prefix_ok(partial),
            },
            TokenKind::Ipv6 => ipv6_chars_ok(partial),
            TokenKind::Ipv6Prefix => match partial.split_once('/') {
                Some((addr, len)) => {
                    is_ipv6(addr) && (len.is_empty() || parse_decimal(len).is_some_and(|l| l <= 128))
                }
                None => ipv6_chars_ok(partial),
            },
            TokenKind::Time => {
                partial.chars().all(|c| c.is_ascii_digit() || c == ':')
                    && partial.matches(':').count() <= 2
            }
            TokenKind::Community => {
                partial.chars().all(|c| c.is_ascii_digit() || c == ':')
                    && partial.matches(':').count() <= 1
            }
            TokenKind::MacAddress => partial
                .chars()
                .all(|c| c.is_ascii_hexdigit() || matches!(c, '.' | ':' | '-')),
            TokenKind::IfName => {
                let mut chars = partial.chars();
                chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | ':' | '-'))
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for TokenSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Alias => write!(f, "*{}", self.text),
            _ => f.write_str(&self.text),
        }
    }
}

// ── Shape matchers ──────────────────────────────────────────────────────

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9]$").expect("time pattern is valid")
});

static COMMUNITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,5}):([0-9]{1,5})$").expect("community pattern is valid"));

static MAC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}|(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2})$",
    )
    .expect("mac pattern is valid")
});

static IFNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z-]*[0-9]+(?:[/.:][0-9]+)*$").expect("ifname pattern is valid")
});

/// Unsigned decimal without sign, overflow-checked.
fn parse_decimal(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn is_ipv4(text: &str) -> bool {
    text.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(text: &str) -> bool {
    text.parse::<Ipv6Addr>().is_ok()
}

fn is_ipv4_prefix(text: &str) -> bool {
    text.split_once('/')
        .is_some_and(|(addr, len)| is_ipv4(addr) && parse_decimal(len).is_some_and(|l| l <= 32))
}

fn is_ipv6_prefix(text: &str) -> bool {
    text.split_once('/')
        .is_some_and(|(addr, len)| is_ipv6(addr) && parse_decimal(len).is_some_and(|l| l <= 128))
}

fn is_time(text: &str) -> bool {
    TIME_RE.is_match(text)
}

fn is_community(text: &str) -> bool {
    COMMUNITY_RE.captures(text).is_some_and(|caps| {
        [1, 2].iter().all(|&i| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .is_some_and(|v| v <= u32::from(u16::MAX))
        })
    })
}

fn is_mac(text: &str) -> bool {
    MAC_RE.is_match(text)
}

fn is_ifname(text: &str) -> bool {
    IFNAME_RE.is_match(text)
}

/// Partial dotted quad: at most four octets, each at most three digits and 255.
fn ipv4_prefix_ok(partial: &str) -> bool {
    let octets: Vec<&str> = partial.split('.').collect();
    octets.len() <= 4
        && octets.iter().enumerate().all(|(i, o)| {
            if o.is_empty() {
                // Only the octet being typed may be empty.
                i == octets.len() - 1
            } else {
                o.len() <= 3 && parse_decimal(o).is_some_and(|v| v <= 255)
            }
        })
}

fn ipv6_chars_ok(partial: &str) -> bool {
    partial
        .chars()
        .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_exact_beats_partial() {
        let show = TokenSpec::keyword("show");
        assert_eq!(show.matches("show", true), Some(MatchRank::ExactKeyword));
        assert_eq!(show.matches("sh", true), Some(MatchRank::PartialKeyword));
        assert_eq!(show.matches("shows", true), None);
        assert!(MatchRank::ExactKeyword > MatchRank::PartialKeyword);
    }

    #[test]
    fn priority_order_matches_tie_break_rule() {
        let ordered = [
            MatchRank::ExactKeyword,
            MatchRank::Alias,
            MatchRank::PartialKeyword,
            MatchRank::Value,
            MatchRank::IfName,
            MatchRank::Range,
            MatchRank::Word,
            MatchRank::Line,
        ];
        assert!(ordered.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn alias_matches_only_its_spelling() {
        let a = TokenSpec::alias("s", "show");
        assert_eq!(a.matches("s", true), Some(MatchRank::Alias));
        assert_eq!(a.matches("show", true), None);
        assert_eq!(a.canonical(), "show");
        assert_eq!(a.display(), "s");
        assert_eq!(a.to_string(), "*s=show");
    }

    #[test]
    fn range_bounds_and_plus_sign() {
        let r = TokenSpec::range(1, 100);
        assert_eq!(r.text, "<1-100>");
        assert_eq!(r.matches("1", true), Some(MatchRank::Range));
        assert_eq!(r.matches("100", true), Some(MatchRank::Range));
        assert_eq!(r.matches("0", true), None);
        assert_eq!(r.matches("101", true), None);
        assert_eq!(r.matches("+5", true), Some(MatchRank::Range));
        assert_eq!(r.matches("+5", false), None);
        assert_eq!(r.matches("-5", true), None);
        assert_eq!(r.matches("99999999999", true), None);
    }

    #[test]
    fn address_shapes() {
        let v4 = TokenSpec::placeholder(TokenKind::Ipv4, false);
        assert_eq!(v4.matches("10.0.0.1", true), Some(MatchRank::Value));
        assert_eq!(v4.matches("10.0.0", true), None);
        assert_eq!(v4.matches("10.0.0.256", true), None);

        let p4 = TokenSpec::placeholder(TokenKind::Ipv4Prefix, false);
        assert!(p4.matches("10.0.0.0/8", true).is_some());
        assert!(p4.matches("10.0.0.0/33", true).is_none());
        assert!(p4.matches("10.0.0.0", true).is_none());

        let v6 = TokenSpec::placeholder(TokenKind::Ipv6, false);
        assert!(v6.matches("2001:db8::1", true).is_some());
        assert!(v6.matches("2001:db8::g", true).is_none());

        let p6 = TokenSpec::placeholder(TokenKind::Ipv6Prefix, false);
        assert!(p6.matches("2001:db8::/32", true).is_some());
        assert!(p6.matches("2001:db8::/129", true).is_none());
    }

    #[test]
    fn time_community_mac_ifname_shapes() {
        let time = TokenSpec::placeholder(TokenKind::Time, false);
        assert!(time.matches("23:59:59", true).is_some());
        assert!(time.matches("24:00:00", true).is_none());

        let comm = TokenSpec::placeholder(TokenKind::Community, false);
        assert!(comm.matches("65000:100", true).is_some());
        assert!(comm.matches("70000:1", true).is_none());

        let mac = TokenSpec::placeholder(TokenKind::MacAddress, false);
        assert!(mac.matches("0011.2233.4455", true).is_some());
        assert!(mac.matches("00:11:22:33:44:55", true).is_some());
        assert!(mac.matches("0011.2233", true).is_none());

        let ifname = TokenSpec::placeholder(TokenKind::IfName, false);
        assert_eq!(ifname.matches("eth0", true), Some(MatchRank::IfName));
        assert!(ifname.matches("ge1/0/1", true).is_some());
        assert!(ifname.matches("vlan1.100", true).is_some());
        assert!(ifname.matches("eth", true).is_none());
    }

    #[test]
    fn prefix_consistency() {
        let v4 = TokenSpec::placeholder(TokenKind::Ipv4, false);
        assert!(v4.matches_prefix("10.0."));
        assert!(!v4.matches_prefix("10.0.300"));
        assert!(!v4.matches_prefix("abc"));

        let r = TokenSpec::range(10, 20);
        assert!(r.matches_prefix("1"));
        assert!(!r.matches_prefix("30"));

        let kw = TokenSpec::keyword("interface");
        assert!(kw.matches_prefix("int"));
        assert!(!kw.matches_prefix("ip"));
        assert!(kw.matches_prefix(""));
    }

    #[test]
    fn placeholder_table_roundtrip() {
        for kind in [
            TokenKind::Ipv4,
            TokenKind::Ipv4Prefix,
            TokenKind::Ipv6,
            TokenKind::Ipv6Prefix,
            TokenKind::Word,
            TokenKind::Line,
            TokenKind::Time,
            TokenKind::Community,
            TokenKind::MacAddress,
            TokenKind::IfName,
        ] {
            let text = kind.placeholder().unwrap();
            assert_eq!(TokenKind::from_placeholder(text), Some(kind));
        }
        assert_eq!(TokenKind::from_placeholder("NAME"), None);
        assert_eq!(TokenKind::Keyword.placeholder(), None);
    }
}
