//! Assistant screen: transcript, suggestions, input line and the history drawer.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use vailog_core::chat::SUGGESTIONS;
use vailog_core::models::Role;
use vailog_core::utils::truncate_string;
use vailog_core::Operation;

use crate::app::{App, HomeFocus};
use crate::ui::styles;

use super::tail;

/// Width of the history drawer, borders included
const DRAWER_WIDTH: u16 = 36;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chat_area = if app.drawer_open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(DRAWER_WIDTH), Constraint::Min(20)])
            .split(area);
        render_drawer(frame, app, columns[0]);
        columns[1]
    } else {
        area
    };

    let show_suggestions = app.chat.show_suggestions();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(if show_suggestions { SUGGESTIONS.len() as u16 + 1 } else { 0 }),
            Constraint::Length(if app.chat.error.is_some() { 1 } else { 0 }),
            Constraint::Length(3),
        ])
        .split(chat_area);

    render_transcript(frame, app, rows[0]);
    if show_suggestions {
        render_suggestions(frame, app, rows[1]);
    }
    if let Some(ref error) = app.chat.error {
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", error), styles::error_style())),
            rows[2],
        );
    }
    render_input(frame, app, rows[3]);
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    for message in app.chat.messages() {
        let (who, style) = match message.role {
            Role::User => ("Você", styles::user_message_style()),
            Role::Assistant => ("Assistente", styles::assistant_message_style()),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", who), styles::highlight_style()),
            Span::styled(
                message.ts.with_timezone(&chrono::Local).format("%H:%M").to_string(),
                styles::muted_style(),
            ),
        ]));
        for text in message.content.lines() {
            lines.push(Line::from(Span::styled(text.to_string(), style)));
        }
        lines.push(Line::from(""));
    }
    if app.flights.is_busy(Operation::SendChat) {
        lines.push(Line::from(Span::styled("Assistente está digitando...", styles::muted_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.home_focus == HomeFocus::Input));

    // Keep the newest message in view
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let total_rows: usize = lines
        .iter()
        .map(|l| l.width().max(1).div_ceil(inner_width))
        .sum();
    let offset = total_rows.saturating_sub(inner_height) as u16;

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn render_suggestions(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        " Sugestões (↑/↓ para escolher, Enter para enviar)",
        styles::muted_style(),
    ))];
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        let style = if app.suggestion_selection == Some(i) {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(Span::styled(format!("  • {}", suggestion), style)));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.home_focus == HomeFocus::Input;
    let width = area.width.saturating_sub(4) as usize;
    let content = if app.chat_input.is_empty() && !focused {
        Span::styled("Pergunte algo...", styles::muted_style())
    } else {
        let cursor = if focused { "▌" } else { "" };
        Span::styled(format!("{}{}", tail(&app.chat_input, width), cursor), styles::list_item_style())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .title(Span::styled(" Mensagem ", styles::muted_style()));
    frame.render_widget(Paragraph::new(Line::from(content)).block(block), area);
}

fn render_drawer(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.home_focus == HomeFocus::History;
    let text_width = area.width.saturating_sub(4) as usize;
    let mut lines = Vec::new();

    match app.current_user() {
        Some(user) => {
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", user.initials()), styles::avatar_style()),
                Span::raw(" "),
                Span::styled(
                    truncate_string(user.display_name(), text_width.saturating_sub(4)),
                    styles::title_style(),
                ),
            ]));
            if let Some(ref email) = user.email {
                lines.push(Line::from(Span::styled(
                    truncate_string(email, text_width),
                    styles::muted_style(),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled("Usuário", styles::muted_style()))),
    }
    lines.push(Line::from(Span::styled("[^P] Editar perfil  [^L] Sair", styles::muted_style())));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Histórico", styles::highlight_style())));

    if app.flights.is_busy(Operation::LoadHistory) {
        lines.push(Line::from(Span::styled("Carregando...", styles::muted_style())));
    } else if let Some(ref error) = app.history_error {
        lines.push(Line::from(Span::styled(error.clone(), styles::error_style())));
    } else if app.history.is_empty() {
        lines.push(Line::from(Span::styled("Nenhuma conversa ainda.", styles::muted_style())));
    }

    for (i, conversation) in app.history.iter().enumerate() {
        let selected = focused && i == app.history_selection;
        let style = if selected {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(Span::styled(
            truncate_string(&conversation.title, text_width),
            style,
        )));
        let updated = conversation.updated_display();
        if !updated.is_empty() {
            lines.push(Line::from(Span::styled(format!("  {}", updated), styles::muted_style())));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .title(Span::styled(" Conversas ", styles::title_style()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
