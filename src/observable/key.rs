//! Keys addressing entries of an observable container.

use std::fmt;

/// A record field name or a sequence index.
///
/// Listeners always see the string form, so `Key::Index(3)` and
/// `Key::Name("3")` address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl Key {
    /// Interpret the key as a sequence index, if it is one.
    ///
    /// Only canonical decimal names count, so `"01"` and `"+1"` stay names.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(name) => name
                .parse()
                .ok()
                .filter(|i: &usize| i.to_string() == *name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_form() {
        assert_eq!(Key::from("some").to_string(), "some");
        assert_eq!(Key::from(3usize).to_string(), "3");
    }

    #[test]
    fn test_as_index() {
        assert_eq!(Key::from(2usize).as_index(), Some(2));
        assert_eq!(Key::from("7").as_index(), Some(7));
        assert_eq!(Key::from("a").as_index(), None);
        assert_eq!(Key::from("-1").as_index(), None);
        assert_eq!(Key::from("0").as_index(), Some(0));
        assert_eq!(Key::from("01").as_index(), None);
        assert_eq!(Key::from("+1").as_index(), None);
        assert_eq!(Key::from(" 1").as_index(), None);
    }
}
