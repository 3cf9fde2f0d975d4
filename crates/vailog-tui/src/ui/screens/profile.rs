use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use vailog_core::forms::ProfileField;

use crate::app::App;
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

use super::{button_line, field_error, field_line};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let user = app.current_user().unwrap_or_default();

    let mut lines = vec![
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!(" {} ", user.initials()), styles::avatar_style()),
            Span::raw("  "),
            Span::styled(user.display_name().to_string(), styles::title_style()),
        ]),
        Line::from(Span::styled(
            format!("       {}", user.email.as_deref().unwrap_or("")),
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    for (i, field) in ProfileField::ALL.iter().enumerate() {
        lines.push(field_line(
            field.label(),
            app.profile.value(*field),
            app.profile_focus == i,
            false,
        ));
        if let Some(msg) = app.profile_errors.get(field) {
            lines.push(field_error(msg));
        }
    }
    if let Some(ref url) = user.avatar_url {
        lines.push(Line::from(Span::styled(
            format!("  Foto atual: {}", url),
            styles::muted_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(button_line(
        "Salvar",
        app.profile_focus == ProfileField::ALL.len(),
        12,
    ));
    lines.push(Line::from(Span::styled("  [Esc] Cancelar", styles::muted_style())));

    if let Some(ref error) = app.profile_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    } else if let Some(ref message) = app.profile_success {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", message), styles::success_style())));
    }

    let height = lines.len() as u16 + 2;
    let dialog = centered_rect_fixed(64, height, area);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(Span::styled(" Editar Perfil ", styles::title_style()))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}
