//! Helpers for check authors

use crate::check::Context;

/// Lists longer than this are cut short unless [Context::full_lists] is set
pub const MAX_LIST_ITEMS: usize = 10;

/// Render items as `* item` lines.
pub fn bullet_list<T: AsRef<str>>(context: &Context, items: &[T]) -> String {
    let shown = if context.full_lists {
        items.len()
    } else {
        items.len().min(MAX_LIST_ITEMS)
    };
    let mut lines: Vec<String> = items[..shown]
        .iter()
        .map(|item| format!("* {}", item.as_ref()))
        .collect();
    if shown < items.len() {
        lines.push(format!("* And {} more.", items.len() - shown));
    }
    lines.join("\n")
}
