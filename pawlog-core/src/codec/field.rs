//! Declarative field tables and the local/wire naming convention.

/// How a field's value is represented on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Same JSON value on both sides.
    Plain,
    /// `DateTime<Utc>` locally, RFC 3339 string (millisecond precision) on the wire.
    Timestamp,
    /// `NaiveDate` locally, `YYYY-MM-DD` on the wire.
    Date,
    /// Nested structure locally, JSON-encoded string on the wire.
    Json,
}

/// One entry of an entity's field table.
///
/// Only the local (camelCase) name is declared; the wire name is derived with
/// [`camel_to_snake`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub local: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn plain(local: &'static str) -> Self {
        Self {
            local,
            kind: FieldKind::Plain,
        }
    }

    pub const fn timestamp(local: &'static str) -> Self {
        Self {
            local,
            kind: FieldKind::Timestamp,
        }
    }

    pub const fn date(local: &'static str) -> Self {
        Self {
            local,
            kind: FieldKind::Date,
        }
    }

    pub const fn json(local: &'static str) -> Self {
        Self {
            local,
            kind: FieldKind::Json,
        }
    }

    /// Field name on the wire.
    pub fn wire_name(&self) -> String {
        camel_to_snake(self.local)
    }
}

/// Looks up a field by its local name.
pub fn by_local<'a>(fields: &'a [Field], local: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.local == local)
}

/// Looks up a field by its wire name.
pub fn by_wire<'a>(fields: &'a [Field], wire: &str) -> Option<&'a Field> {
    let local = snake_to_camel(wire);
    fields.iter().find(|f| f.local == local)
}

/// `ownerId` -> `owner_id`, `caloriesPer100g` -> `calories_per100g`.
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `owner_id` -> `ownerId`. Inverse of [`camel_to_snake`] for camelCase
/// identifiers without consecutive capitals.
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
