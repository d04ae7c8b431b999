use crate::{Result, constants::KEYPAD_LAYOUT, error::Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// A reserved function key (A-D column of the keypad).
///
/// Reserved keys are accepted by the scanner but semantically inert
/// unless a deployment binds one (see
/// [`ControllerConfig::cancel_key`](crate::config::ControllerConfig)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservedKey {
    A,
    B,
    C,
    D,
}

impl ReservedKey {
    /// Get the keypad glyph for this key.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            ReservedKey::A => 'A',
            ReservedKey::B => 'B',
            ReservedKey::C => 'C',
            ReservedKey::D => 'D',
        }
    }
}

impl fmt::Display for ReservedKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One of the 16 keypad glyphs.
///
/// The glyph set partitions into digits, the `*` clear key, the `#`
/// submit key, and the reserved `A`-`D` function keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Clear key (`*`): discards the current entry.
    Clear,

    /// Submit key (`#`): submits the current entry.
    Submit,

    /// Reserved function key (`A`-`D`).
    Reserved(ReservedKey),
}

impl Symbol {
    /// Create a digit symbol with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidSymbol` if the digit is greater than 9.
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(Error::InvalidSymbol(char::from(b'0' + d.min(9))));
        }
        Ok(Symbol::Digit(d))
    }

    /// Map a keypad glyph to its symbol.
    ///
    /// # Errors
    /// Returns `Error::InvalidSymbol` for characters outside the 16-key set.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Ok(Symbol::Digit(c as u8 - b'0')),
            '*' => Ok(Symbol::Clear),
            '#' => Ok(Symbol::Submit),
            'A' => Ok(Symbol::Reserved(ReservedKey::A)),
            'B' => Ok(Symbol::Reserved(ReservedKey::B)),
            'C' => Ok(Symbol::Reserved(ReservedKey::C)),
            'D' => Ok(Symbol::Reserved(ReservedKey::D)),
            _ => Err(Error::InvalidSymbol(c)),
        }
    }

    /// Resolve the symbol at a keypad matrix position.
    ///
    /// Positions come from the row-major scan order of
    /// [`KEYPAD_LAYOUT`](crate::constants::KEYPAD_LAYOUT).
    ///
    /// # Errors
    /// Returns `Error::InvalidSymbol` if the position is outside the matrix.
    pub fn at_position(row: usize, col: usize) -> Result<Self> {
        let c = KEYPAD_LAYOUT
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .ok_or(Error::InvalidSymbol('?'))?;
        Self::from_char(c)
    }

    /// Get the keypad glyph for this symbol.
    #[must_use]
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Digit(d) => char::from(b'0' + d),
            Symbol::Clear => '*',
            Symbol::Submit => '#',
            Symbol::Reserved(k) => k.as_char(),
        }
    }

    /// Check if this symbol is a digit.
    #[must_use]
    pub fn is_digit(&self) -> bool {
        matches!(self, Symbol::Digit(_))
    }

    /// Get the digit value if this is a digit symbol.
    #[must_use]
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Symbol::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Electrical edge of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Pressed,
    Released,
}

/// A debounced key event produced by the scanner.
///
/// Consumed exactly once by the PIN accumulator; not retained.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    /// The confirmed key.
    pub symbol: Symbol,

    /// Press or release edge.
    pub edge: Edge,

    /// When the event was confirmed.
    pub at: DateTime<Utc>,
}

impl KeyEvent {
    /// Create a press event timestamped now.
    #[must_use]
    pub fn pressed(symbol: Symbol) -> Self {
        Self {
            symbol,
            edge: Edge::Pressed,
            at: Utc::now(),
        }
    }

    /// Create a release event timestamped now.
    #[must_use]
    pub fn released(symbol: Symbol) -> Self {
        Self {
            symbol,
            edge: Edge::Released,
            at: Utc::now(),
        }
    }
}

/// Fixed-length numeric PIN.
///
/// # Security
/// Equality is constant-time to prevent timing attacks when comparing
/// entered PINs against directory entries.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct PinCode(String);

impl PinCode {
    /// Create a PIN with validation.
    ///
    /// # Errors
    /// Returns `Error::MalformedPin` on a wrong length and
    /// `Error::InvalidSymbol` on a non-digit character.
    pub fn new(digits: &str, expected_len: usize) -> Result<Self> {
        if digits.len() != expected_len {
            return Err(Error::MalformedPin {
                expected: expected_len,
                actual: digits.len(),
            });
        }
        if let Some(c) = digits.chars().find(|c| !c.is_ascii_digit()) {
            return Err(Error::InvalidSymbol(c));
        }
        Ok(PinCode(digits.to_string()))
    }

    /// Get the PIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PinCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Constant-time comparison implementation for PinCode.
impl PartialEq for PinCode {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for PinCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Opaque handle to a stored reference image.
///
/// The directory hands these out; only the reference loader knows how
/// to resolve one (local path, object-store key, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle(String);

impl ImageHandle {
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An authorized-user record.
///
/// Owned by the directory; each decision works against an immutable
/// snapshot, so a record never changes mid-decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable external identifier.
    pub id: String,

    /// The user's PIN (unique key within a directory snapshot).
    pub pin: PinCode,

    /// Display name.
    pub name: String,

    /// Stored enrollment image used as ground truth for face checks.
    pub reference_image: ImageHandle,
}

/// Why a match attempt ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    /// Both faces were acquired and the matcher produced a score.
    Acquired,

    /// No face was found in the live sample.
    NoFaceDetected,

    /// The stored reference image contains no detectable face.
    NoReferenceFace,

    /// Capture or matcher backend failed.
    MatcherError,
}

/// Outcome of one face verification.
///
/// `matched` is `true` only when `reason` is [`MatchReason::Acquired`]
/// and the score passed the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    pub score: f32,
    pub reason: MatchReason,
}

impl MatchResult {
    /// Build a result for a completed comparison.
    #[must_use]
    pub fn acquired(score: f32, matched: bool) -> Self {
        Self {
            matched,
            score,
            reason: MatchReason::Acquired,
        }
    }

    /// Build a failed result. `matched` is always `false`.
    #[must_use]
    pub fn failed(reason: MatchReason) -> Self {
        debug_assert!(reason != MatchReason::Acquired);
        Self {
            matched: false,
            score: 0.0,
            reason,
        }
    }
}

/// Which way the matcher score is compared against the threshold.
///
/// Distance metrics (LBPH confidence) pass when the score is at or
/// below the threshold; similarity metrics pass at or above. Matcher
/// backends disagree on the sense, so the deployment must declare it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDirection {
    /// Lower score means a closer match (distance metric).
    LowerIsCloser,

    /// Higher score means a closer match (similarity metric).
    HigherIsCloser,
}

impl ScoreDirection {
    /// Check whether a score passes the threshold under this direction.
    #[must_use]
    pub fn accepts(self, score: f32, threshold: f32) -> bool {
        match self {
            ScoreDirection::LowerIsCloser => score <= threshold,
            ScoreDirection::HigherIsCloser => score >= threshold,
        }
    }
}

/// Final outcome of an access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessOutcome {
    Granted,
    Denied,
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The entered PIN matches no directory record.
    UnknownPin,

    /// A submit arrived with the wrong number of digits.
    MalformedPin,

    /// The live face did not match the stored reference.
    FaceMismatch,

    /// No face was found in the live sample.
    NoFace,

    /// The stored reference image contains no detectable face.
    NoReferenceFace,

    /// Capture or matcher backend failed.
    MatcherError,
}

impl DenyReason {
    /// Map a verification failure onto its denial reason.
    ///
    /// [`MatchReason::Acquired`] maps to [`DenyReason::FaceMismatch`]:
    /// the comparison completed but the score failed the threshold.
    #[must_use]
    pub fn from_match_reason(reason: MatchReason) -> Self {
        match reason {
            MatchReason::Acquired => DenyReason::FaceMismatch,
            MatchReason::NoFaceDetected => DenyReason::NoFace,
            MatchReason::NoReferenceFace => DenyReason::NoReferenceFace,
            MatchReason::MatcherError => DenyReason::MatcherError,
        }
    }
}

/// The immutable record of one completed access attempt.
///
/// Created exactly once per cycle and handed to the event logger.
/// Constructed only through [`Decision::granted`] and
/// [`Decision::denied`], which uphold the grant invariant: a grant
/// always carries the matched user and never a denial reason.
///
/// The serialized field order is the durable audit-trail format and
/// must remain stable across versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// When the decision was made (ISO-8601 in the serialized form).
    pub timestamp: DateTime<Utc>,

    /// The PIN as entered, whether or not it matched.
    pub pin_entered: String,

    /// The matched user, if the PIN hit a directory record.
    pub user_id: Option<String>,

    /// Granted or denied.
    pub outcome: AccessOutcome,

    /// Denial reason; `None` on a grant.
    pub reason: Option<DenyReason>,
}

impl Decision {
    /// Record a granted attempt.
    #[must_use]
    pub fn granted(user_id: impl Into<String>, pin_entered: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            pin_entered: pin_entered.into(),
            user_id: Some(user_id.into()),
            outcome: AccessOutcome::Granted,
            reason: None,
        }
    }

    /// Record a denied attempt.
    ///
    /// `user_id` is present when the PIN matched a user who then failed
    /// verification, absent when the PIN itself was unknown.
    #[must_use]
    pub fn denied(
        user_id: Option<String>,
        pin_entered: impl Into<String>,
        reason: DenyReason,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            pin_entered: pin_entered.into(),
            user_id,
            outcome: AccessOutcome::Denied,
            reason: Some(reason),
        }
    }

    /// Check if this decision granted access.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self.outcome, AccessOutcome::Granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('0', Symbol::Digit(0))]
    #[case('9', Symbol::Digit(9))]
    #[case('*', Symbol::Clear)]
    #[case('#', Symbol::Submit)]
    #[case('B', Symbol::Reserved(ReservedKey::B))]
    fn test_symbol_from_char(#[case] input: char, #[case] expected: Symbol) {
        let symbol = Symbol::from_char(input).unwrap();
        assert_eq!(symbol, expected);
        assert_eq!(symbol.as_char(), input);
    }

    #[rstest]
    #[case('x')]
    #[case('E')]
    #[case(' ')]
    fn test_symbol_from_char_invalid(#[case] input: char) {
        assert!(Symbol::from_char(input).is_err());
    }

    #[test]
    fn test_symbol_at_position() {
        assert_eq!(Symbol::at_position(0, 0).unwrap(), Symbol::Digit(1));
        assert_eq!(Symbol::at_position(3, 0).unwrap(), Symbol::Clear);
        assert_eq!(Symbol::at_position(3, 2).unwrap(), Symbol::Submit);
        assert_eq!(
            Symbol::at_position(1, 3).unwrap(),
            Symbol::Reserved(ReservedKey::B)
        );
        assert!(Symbol::at_position(4, 0).is_err());
    }

    #[test]
    fn test_symbol_digit_bounds() {
        assert!(Symbol::digit(9).is_ok());
        assert!(Symbol::digit(10).is_err());
    }

    #[rstest]
    #[case("1234", 4)]
    #[case("000000", 6)]
    fn test_pin_code_valid(#[case] digits: &str, #[case] len: usize) {
        let pin = PinCode::new(digits, len).unwrap();
        assert_eq!(pin.as_str(), digits);
    }

    #[rstest]
    #[case("123", 4)]
    #[case("12345", 4)]
    #[case("12a4", 4)]
    fn test_pin_code_invalid(#[case] digits: &str, #[case] len: usize) {
        assert!(PinCode::new(digits, len).is_err());
    }

    #[test]
    fn test_pin_code_constant_time_eq() {
        let a = PinCode::new("1234", 4).unwrap();
        let b = PinCode::new("1234", 4).unwrap();
        let c = PinCode::new("4321", 4).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[rstest]
    #[case(ScoreDirection::LowerIsCloser, 40.0, 60.0, true)]
    #[case(ScoreDirection::LowerIsCloser, 75.0, 60.0, false)]
    #[case(ScoreDirection::LowerIsCloser, 60.0, 60.0, true)]
    #[case(ScoreDirection::HigherIsCloser, 75.0, 60.0, true)]
    #[case(ScoreDirection::HigherIsCloser, 40.0, 60.0, false)]
    fn test_score_direction(
        #[case] direction: ScoreDirection,
        #[case] score: f32,
        #[case] threshold: f32,
        #[case] expected: bool,
    ) {
        assert_eq!(direction.accepts(score, threshold), expected);
    }

    #[test]
    fn test_match_result_failed_never_matches() {
        for reason in [
            MatchReason::NoFaceDetected,
            MatchReason::NoReferenceFace,
            MatchReason::MatcherError,
        ] {
            let result = MatchResult::failed(reason);
            assert!(!result.matched);
            assert_eq!(result.reason, reason);
        }
    }

    #[test]
    fn test_decision_granted_invariant() {
        let decision = Decision::granted("user-1", "1234");
        assert!(decision.is_granted());
        assert_eq!(decision.user_id.as_deref(), Some("user-1"));
        assert!(decision.reason.is_none());
    }

    #[test]
    fn test_decision_denied_unknown_pin() {
        let decision = Decision::denied(None, "9999", DenyReason::UnknownPin);
        assert!(!decision.is_granted());
        assert_eq!(decision.user_id, None);
        assert_eq!(decision.reason, Some(DenyReason::UnknownPin));
    }

    #[test]
    fn test_decision_serialized_field_order_is_stable() {
        let decision = Decision::denied(None, "9999", DenyReason::UnknownPin);
        let json = serde_json::to_string(&decision).unwrap();

        let ts = json.find("\"timestamp\"").unwrap();
        let pin = json.find("\"pin_entered\"").unwrap();
        let user = json.find("\"user_id\"").unwrap();
        let outcome = json.find("\"outcome\"").unwrap();
        let reason = json.find("\"reason\"").unwrap();
        assert!(ts < pin && pin < user && user < outcome && outcome < reason);

        assert!(json.contains("\"outcome\":\"denied\""));
        assert!(json.contains("\"reason\":\"unknown_pin\""));
        assert!(json.contains("\"user_id\":null"));
    }

    #[test]
    fn test_deny_reason_mapping() {
        assert_eq!(
            DenyReason::from_match_reason(MatchReason::Acquired),
            DenyReason::FaceMismatch
        );
        assert_eq!(
            DenyReason::from_match_reason(MatchReason::NoFaceDetected),
            DenyReason::NoFace
        );
        assert_eq!(
            DenyReason::from_match_reason(MatchReason::MatcherError),
            DenyReason::MatcherError
        );
    }
}
