//! Wrapper for values that must never reach logs

use std::fmt;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// Sensitive value - redacted in Debug/Display, zeroized on drop.
///
/// Deserializable so that account passwords arriving on the fabrication
/// channel land in a redacted wrapper straight from the wire.
pub struct Sensitive<T: Zeroize>(T);

impl<T: Zeroize> Sensitive<T> {
    /// Wrap a value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly).
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: Zeroize> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Sensitive<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Zeroize + PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'de, T: Zeroize + Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_debug_and_display() {
        let password = Sensitive::new(String::from("hunter2"));
        assert_eq!(format!("{password:?}"), "[REDACTED]");
        assert_eq!(format!("{password}"), "[REDACTED]");
    }

    #[test]
    fn exposes_inner_value() {
        let password = Sensitive::new(String::from("hunter2"));
        assert_eq!(password.expose(), "hunter2");
    }

    #[test]
    fn deserializes_from_wire_payload() {
        let password: Sensitive<String> = serde_json::from_str("\"hunter2\"").unwrap();
        assert_eq!(password.expose(), "hunter2");
        assert_eq!(format!("{password:?}"), "[REDACTED]");
    }
}
