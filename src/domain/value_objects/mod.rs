use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalised contact number: optional leading `+` followed by 7 to 15 digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut digits = String::with_capacity(rest.len());
        for ch in rest.chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return None,
            }
        }

        if !(7..=15).contains(&digits.len()) {
            return None;
        }

        Some(Self(if plus { format!("+{digits}") } else { digits }))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::PhoneNumber;

    #[test]
    fn strips_separators() {
        assert_eq!(PhoneNumber::parse("024-123.4567").unwrap().as_str(), "0241234567");
        assert_eq!(PhoneNumber::parse(" +1 (555) 010 9999 ").unwrap().as_str(), "+15550109999");
    }

    #[test]
    fn rejects_letters_and_bad_lengths() {
        assert!(PhoneNumber::parse("12345").is_none());
        assert!(PhoneNumber::parse("1234567890123456").is_none());
        assert!(PhoneNumber::parse("0800-FLOWERS").is_none());
        assert!(PhoneNumber::parse("++233241234567").is_none());
    }
}
