//! Timestamp primitives for Cadence streams
//!
//! Every packet and every stream bound carries a [`Timestamp`]. Besides
//! ordinary values the space has explicit special cases, ordered as:
//!
//! `Unset < PreStream < Value(i64::MIN) < .. < Value(i64::MAX) < PostStream < Done`

use std::fmt;

/// Totally ordered stream timestamp.
///
/// The derived ordering follows variant order first and the inner value
/// second, so `min`/`max` and comparisons respect the full enumeration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Timestamp {
    /// Nothing yet. Never allowed on a packet.
    #[default]
    Unset,
    /// Precedes every ordinary value. A packet here must be the only one.
    PreStream,
    /// Ordinary timestamp.
    Value(i64),
    /// Follows every ordinary value. A packet here must be the last one.
    PostStream,
    /// The stream is permanently exhausted.
    Done,
}

impl Timestamp {
    pub const MIN: Timestamp = Timestamp::Value(i64::MIN);
    pub const MAX: Timestamp = Timestamp::Value(i64::MAX);

    #[inline]
    pub fn new(value: i64) -> Self {
        Timestamp::Value(value)
    }

    /// Ordinary value, if this is one.
    #[inline]
    pub fn value(self) -> Option<i64> {
        match self {
            Timestamp::Value(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn is_done(self) -> bool {
        self == Timestamp::Done
    }

    /// Whether a packet may carry this timestamp.
    #[inline]
    pub fn is_allowed_in_stream(self) -> bool {
        matches!(
            self,
            Timestamp::PreStream | Timestamp::Value(_) | Timestamp::PostStream
        )
    }

    /// Smallest timestamp a following packet may carry once a packet at
    /// `self` has been seen.
    ///
    /// Nothing may follow `PreStream`, `PostStream` or `MAX`, so those map
    /// to `Done`. Timestamps that are not allowed in a stream map to
    /// themselves.
    pub fn next_allowed_in_stream(self) -> Timestamp {
        match self {
            Timestamp::Value(v) if v < i64::MAX => Timestamp::Value(v + 1),
            Timestamp::Value(_) | Timestamp::PreStream | Timestamp::PostStream => Timestamp::Done,
            other => other,
        }
    }
}

impl From<i64> for Timestamp {
    #[inline]
    fn from(value: i64) -> Self {
        Timestamp::Value(value)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Unset => f.write_str("Unset"),
            Timestamp::PreStream => f.write_str("PreStream"),
            Timestamp::Value(v) => write!(f, "ts({})", v),
            Timestamp::PostStream => f.write_str("PostStream"),
            Timestamp::Done => f.write_str("Done"),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_special_values_order() {
        assert!(Timestamp::Unset < Timestamp::PreStream);
        assert!(Timestamp::PreStream < Timestamp::MIN);
        assert!(Timestamp::MIN < Timestamp::new(0));
        assert!(Timestamp::MAX < Timestamp::PostStream);
        assert!(Timestamp::PostStream < Timestamp::Done);
        assert_eq!(Timestamp::default(), Timestamp::Unset);
    }

    #[test]
    fn test_allowed_in_stream() {
        assert!(!Timestamp::Unset.is_allowed_in_stream());
        assert!(Timestamp::PreStream.is_allowed_in_stream());
        assert!(Timestamp::new(-3).is_allowed_in_stream());
        assert!(Timestamp::PostStream.is_allowed_in_stream());
        assert!(!Timestamp::Done.is_allowed_in_stream());
    }

    #[test]
    fn test_next_allowed_in_stream() {
        assert_eq!(Timestamp::new(4).next_allowed_in_stream(), Timestamp::new(5));
        assert_eq!(Timestamp::MAX.next_allowed_in_stream(), Timestamp::Done);
        assert_eq!(Timestamp::PreStream.next_allowed_in_stream(), Timestamp::Done);
        assert_eq!(Timestamp::PostStream.next_allowed_in_stream(), Timestamp::Done);
        assert_eq!(Timestamp::Done.next_allowed_in_stream(), Timestamp::Done);
    }

    #[test]
    fn test_value_and_done() {
        assert_eq!(Timestamp::from(7), Timestamp::new(7));
        assert_eq!(Timestamp::new(7).value(), Some(7));
        assert_eq!(Timestamp::PostStream.value(), None);
        assert!(Timestamp::Done.is_done());
        assert!(!Timestamp::MAX.is_done());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", Timestamp::new(42)), "ts(42)");
        assert_eq!(Timestamp::Done.to_string(), "Done");
    }

    fn any_timestamp() -> impl Strategy<Value = Timestamp> {
        prop_oneof![
            Just(Timestamp::Unset),
            Just(Timestamp::PreStream),
            any::<i64>().prop_map(Timestamp::Value),
            Just(Timestamp::PostStream),
            Just(Timestamp::Done),
        ]
    }

    proptest! {
        #[test]
        fn prop_order_is_total(a in any_timestamp(), b in any_timestamp()) {
            let lt = a < b;
            let eq = a == b;
            let gt = a > b;
            prop_assert_eq!(lt as u8 + eq as u8 + gt as u8, 1);
        }

        #[test]
        fn prop_values_order_like_integers(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(Timestamp::new(a).cmp(&Timestamp::new(b)), a.cmp(&b));
        }

        #[test]
        fn prop_next_allowed_is_strictly_later(a in any_timestamp()) {
            prop_assume!(a.is_allowed_in_stream());
            prop_assert!(a.next_allowed_in_stream() > a);
        }
    }
}
