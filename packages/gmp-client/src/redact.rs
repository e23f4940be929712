//! Secret redaction for wallet keys in logs and debug output.
//!
//! [`Redacted`] wraps a value whose `Debug`, `Display` and `Serialize` output is
//! always `"<redacted>"`. Code that needs the secret calls [`Redacted::expose`].

use std::fmt::{self, Debug, Display};

/// Wrapper that hides its inner value when formatted or serialized.
///
/// ```ignore
/// use gmp_client::Redacted;
///
/// let key = Redacted("0xac09...".to_string());
/// tracing::info!(key = %key, "Loaded wallet");
/// // Logs: key = <redacted>
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Redacted<T>(pub T);

impl<T> Redacted<T> {
    /// Borrow the secret value.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> serde::Serialize for Redacted<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        "<redacted>".serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_hides_value() {
        let secret = Redacted("private-key".to_string());
        assert_eq!(format!("{}", secret), "<redacted>");
        assert_eq!(format!("{:?}", secret), "<redacted>");
        assert_eq!(secret.expose(), "private-key");
    }

    #[test]
    fn test_serialize_hides_value() {
        let json = serde_json::to_string(&Redacted(42u64)).unwrap();
        assert_eq!(json, "\"<redacted>\"");
    }
}
