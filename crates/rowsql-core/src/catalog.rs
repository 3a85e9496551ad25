//! Column types offered when creating a table.

use serde::Serialize;

/// A numeric column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericType {
    /// Type name as written in DDL.
    pub name: &'static str,
    /// Whether the type accepts a display size, e.g. `INT(11)`.
    pub has_size: bool,
    /// Whether the type accepts precision digits, e.g. `DECIMAL(10, 2)`.
    pub has_digits: bool,
    /// Whether the type can back an auto-increment primary key.
    pub auto_increment: bool,
}

impl NumericType {
    pub(crate) const fn plain(name: &'static str) -> Self {
        Self {
            name,
            has_size: false,
            has_digits: false,
            auto_increment: false,
        }
    }

    pub(crate) const fn integer(name: &'static str) -> Self {
        Self {
            auto_increment: true,
            ..Self::plain(name)
        }
    }

    pub(crate) const fn decimal(name: &'static str) -> Self {
        Self {
            has_digits: true,
            ..Self::plain(name)
        }
    }

    pub(crate) const fn with_size(mut self) -> Self {
        self.has_size = true;
        self
    }
}

/// A string, binary or temporal column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringType {
    /// Type name as written in DDL.
    pub name: &'static str,
    /// Whether the type accepts a length, e.g. `VARCHAR(255)`.
    pub has_size: bool,
    /// Whether the type takes a list of allowed values (`ENUM`, `SET`).
    pub has_values: bool,
}

impl StringType {
    pub(crate) const fn plain(name: &'static str) -> Self {
        Self {
            name,
            has_size: false,
            has_values: false,
        }
    }

    pub(crate) const fn sized(name: &'static str) -> Self {
        Self {
            has_size: true,
            ..Self::plain(name)
        }
    }

    pub(crate) const fn enumerated(name: &'static str) -> Self {
        Self {
            has_values: true,
            ..Self::plain(name)
        }
    }
}

/// The column types one dialect offers.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TypeCatalog {
    /// Numeric types.
    pub numeric: &'static [NumericType],
    /// String and other non-numeric types.
    pub string: &'static [StringType],
}

impl TypeCatalog {
    pub(crate) const fn new(numeric: &'static [NumericType], string: &'static [StringType]) -> Self {
        Self { numeric, string }
    }

    /// Returns true if a column of type `name` may auto-increment.
    #[must_use]
    pub fn supports_auto_increment(&self, name: &str) -> bool {
        self.numeric
            .iter()
            .any(|t| t.auto_increment && t.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Returns true if the catalog lists `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.numeric.iter().any(|t| t.name.eq_ignore_ascii_case(name))
            || self.string.iter().any(|t| t.name.eq_ignore_ascii_case(name))
    }
}
