use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// An object version directory name such as `v1` or `v0003`.
///
/// Versions compare by their embedded integer, never lexicographically, so
/// `v10 > v9`. The zero-padding width is carried along so that successive
/// versions keep the naming convention established by the first one, but it
/// takes no part in equality or ordering.
#[derive(Clone, Copy, Debug)]
pub struct VersionNumber {
    number: u32,
    /// Total digit count for zero-padded names, `0` for unpadded names.
    width: usize,
}

impl VersionNumber {
    /// The first unpadded version, `v1`.
    pub const fn first() -> Self {
        Self {
            number: 1,
            width: 0,
        }
    }

    /// Create an unpadded version number. `number` must be positive.
    pub fn new(number: u32) -> Result<Self, TypeError> {
        if number == 0 {
            return Err(TypeError::InvalidVersion("v0".into()));
        }
        Ok(Self { number, width: 0 })
    }

    /// Create a zero-padded version number with the given digit width.
    pub fn padded(number: u32, width: usize) -> Result<Self, TypeError> {
        let v = Self { number, width };
        if number == 0 || width < 2 || number >= v.padded_limit() {
            return Err(TypeError::InvalidVersion(format!("v{number:0width$}")));
        }
        Ok(v)
    }

    /// The integer value.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Digit width for zero-padded names, `0` when unpadded.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns `true` if the name is zero-padded (`v01`, `v001`, ...).
    pub fn is_padded(&self) -> bool {
        self.width > 0
    }

    /// The version before this one, keeping the padding convention.
    pub fn previous(&self) -> Option<Self> {
        (self.number > 1).then(|| Self {
            number: self.number - 1,
            width: self.width,
        })
    }

    /// The version after this one, keeping the padding convention.
    ///
    /// Zero-padded names must keep a leading zero, so `v09` cannot advance.
    pub fn next(&self) -> Result<Self, TypeError> {
        let next = self
            .number
            .checked_add(1)
            .ok_or_else(|| TypeError::VersionOverflow(self.to_string()))?;
        if self.is_padded() && next >= self.padded_limit() {
            return Err(TypeError::VersionOverflow(self.to_string()));
        }
        Ok(Self {
            number: next,
            width: self.width,
        })
    }

    fn padded_limit(&self) -> u32 {
        10u32.saturating_pow(self.width.saturating_sub(1) as u32)
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for VersionNumber {}

impl Hash for VersionNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width > 0 {
            write!(f, "v{:0width$}", self.number, width = self.width)
        } else {
            write!(f, "v{}", self.number)
        }
    }
}

impl FromStr for VersionNumber {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidVersion(s.to_string());
        let digits = s.strip_prefix('v').ok_or_else(invalid)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u32 = digits.parse().map_err(|_| invalid())?;
        if number == 0 {
            return Err(invalid());
        }
        let width = if digits.starts_with('0') { digits.len() } else { 0 };
        Ok(Self { number, width })
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn parse_unpadded() {
        let v: VersionNumber = "v12".parse().unwrap();
        assert_eq!(v.number(), 12);
        assert!(!v.is_padded());
        assert_eq!(v.to_string(), "v12");
    }

    #[test]
    fn parse_padded() {
        let v: VersionNumber = "v003".parse().unwrap();
        assert_eq!(v.number(), 3);
        assert_eq!(v.width(), 3);
        assert_eq!(v.to_string(), "v003");
    }

    #[test]
    fn reject_malformed() {
        for bad in ["", "v", "1", "v0", "v00", "V1", "v1a", "v-1", "v+1", "version1"] {
            assert!(bad.parse::<VersionNumber>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn numeric_not_lexicographic_order() {
        let v9: VersionNumber = "v9".parse().unwrap();
        let v10: VersionNumber = "v10".parse().unwrap();
        assert!(v10 > v9);
    }

    #[test]
    fn padding_ignored_for_equality() {
        let a: VersionNumber = "v2".parse().unwrap();
        let b: VersionNumber = "v002".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn next_keeps_padding() {
        let v: VersionNumber = "v08".parse().unwrap();
        let next = v.next().unwrap();
        assert_eq!(next.to_string(), "v09");
        assert!(next.next().is_err());
    }

    #[test]
    fn previous_of_first_is_none() {
        assert!(VersionNumber::first().previous().is_none());
        let v3 = VersionNumber::new(3).unwrap();
        assert_eq!(v3.previous().unwrap().number(), 2);
    }

    #[test]
    fn padded_constructor_checks_range() {
        assert!(VersionNumber::padded(9, 2).is_ok());
        assert!(VersionNumber::padded(10, 2).is_err());
        assert!(VersionNumber::padded(1, 1).is_err());
    }

    #[test]
    fn btreemap_keys_sort_numerically() {
        let mut map = BTreeMap::new();
        for name in ["v10", "v2", "v1", "v9"] {
            map.insert(name.parse::<VersionNumber>().unwrap(), ());
        }
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"v1":null,"v2":null,"v9":null,"v10":null}"#);
        let back: BTreeMap<VersionNumber, ()> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 4);
    }

    proptest::proptest! {
        #[test]
        fn padded_names_keep_their_width(number in 1u32..999, width in 4usize..6) {
            let v = VersionNumber::padded(number, width).unwrap();
            let next = v.next().unwrap();
            proptest::prop_assert_eq!(next.to_string().len(), v.to_string().len());
            proptest::prop_assert!(next > v);
            proptest::prop_assert_eq!(next.previous(), Some(v));
            proptest::prop_assert_eq!(v.to_string().parse::<VersionNumber>().unwrap().width(), width);
        }
    }
}
