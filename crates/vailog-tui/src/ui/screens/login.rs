use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use vailog_core::forms::LoginField;

use crate::app::{App, LoginFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

use super::{button_line, field_error, field_line};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("  Bem-vindo de volta", styles::title_style())),
        Line::from(Span::styled(
            "  Entre para falar com a assistente de decisões",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    lines.push(field_line(
        "E-mail",
        &app.login.email,
        app.login_focus == LoginFocus::Email,
        false,
    ));
    if let Some(msg) = app.login_errors.get(&LoginField::Email) {
        lines.push(field_error(msg));
    }
    lines.push(field_line(
        "Senha",
        &app.login.password,
        app.login_focus == LoginFocus::Password,
        true,
    ));
    if let Some(msg) = app.login_errors.get(&LoginField::Password) {
        lines.push(field_error(msg));
    }

    let check = if app.login.remember { "[x]" } else { "[ ]" };
    let remember_style = if app.login_focus == LoginFocus::Remember {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{} Lembrar de mim", check), remember_style),
    ]));
    lines.push(Line::from(""));

    // Disabled until both fields are filled in
    let button = if app.login.can_submit() { "Entrar" } else { "Entrar (preencha os campos)" };
    lines.push(button_line(button, app.login_focus == LoginFocus::Button, 12));

    let register_style = if app.login_focus == LoginFocus::Register {
        styles::selected_style()
    } else {
        styles::highlight_style()
    };
    lines.push(Line::from(vec![
        Span::styled("  Não tem conta? ", styles::muted_style()),
        Span::styled("Criar conta", register_style),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }

    let height = lines.len() as u16 + 2;
    let dialog = centered_rect_fixed(60, height, area);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .title(Span::styled(" Entrar ", styles::title_style()))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}
