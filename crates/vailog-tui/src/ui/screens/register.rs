use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use vailog_core::forms::RegisterField;

use crate::app::App;
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

use super::{button_line, field_error, field_line};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("  Crie sua conta", styles::title_style())),
        Line::from(""),
    ];

    for (i, field) in RegisterField::ALL.iter().enumerate() {
        lines.push(field_line(
            field.label(),
            app.register.value(*field),
            app.register_focus == i,
            field.is_secret(),
        ));
        if let Some(msg) = app.register_errors.get(field) {
            lines.push(field_error(msg));
        }
    }

    lines.push(Line::from(""));
    let button = if app.register.can_submit() { "Criar conta" } else { "Criar conta (preencha os campos)" };
    lines.push(button_line(
        button,
        app.register_focus == RegisterField::ALL.len(),
        12,
    ));
    lines.push(Line::from(Span::styled(
        "  [Esc] Voltar para o login",
        styles::muted_style(),
    )));

    if let Some(ref error) = app.register_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let height = lines.len() as u16 + 2;
    let dialog = centered_rect_fixed(64, height, area);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(Span::styled(" Criar conta ", styles::title_style()))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}
