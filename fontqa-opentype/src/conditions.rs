//! Conditions checks in this crate may require.

use fontqa_core::Condition;
use skrifa::Tag;

pub fn all() -> Vec<Condition> {
    vec![
        Condition::one("is_variable_font", |t| Ok(t.is_variable_font())),
        Condition::one("is_ttf", |t| Ok(t.has_table(Tag::new(b"glyf")))),
        Condition::one("is_cff", |t| {
            Ok(t.has_table(Tag::new(b"CFF ")) || t.has_table(Tag::new(b"CFF2")))
        }),
        Condition::one("has_stat", |t| Ok(t.has_table(Tag::new(b"STAT")))),
    ]
}
