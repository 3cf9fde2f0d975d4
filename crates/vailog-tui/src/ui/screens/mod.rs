//! Screen renderers, one module per route.

pub mod home;
pub mod login;
pub mod profile;
pub mod register;

use ratatui::text::{Line, Span};

use super::styles;

/// Visible width of a text input, in characters
pub(super) const INPUT_WIDTH: usize = 30;

/// Last `width` characters of `value`, so the cursor end stays visible.
pub(super) fn tail(value: &str, width: usize) -> String {
    let len = value.chars().count();
    value.chars().skip(len.saturating_sub(width)).collect()
}

/// `Label: [value▌]` line for a form field, masked when `secret`.
pub(super) fn field_line(label: &str, value: &str, focused: bool, secret: bool) -> Line<'static> {
    let shown = if secret {
        "*".repeat(value.chars().count().min(INPUT_WIDTH))
    } else {
        tail(value, INPUT_WIDTH)
    };
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::styled(format!("  {:<16}[", format!("{}:", label)), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = INPUT_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Field-level validation message, indented under its field.
pub(super) fn field_error(message: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {:<16} {}", "", message),
        styles::error_style(),
    ))
}

/// `[ label ]` button, with arrows when focused.
pub(super) fn button_line(label: &str, focused: bool, indent: usize) -> Line<'static> {
    let (text, style) = if focused {
        (format!(" ▶ {} ◀ ", label), styles::selected_style())
    } else {
        (format!("   {}   ", label), styles::list_item_style())
    };
    Line::from(vec![
        Span::raw(format!("{}[", " ".repeat(indent))),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}
