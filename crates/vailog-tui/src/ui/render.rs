use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use vailog_core::{Operation, Route};

use crate::app::{App, AppState};

use super::screens::{home, login, profile, register};
use super::styles;

/// Operations in the order their label wins in the status bar
const BUSY_LABELS: [(Operation, &str); 6] = [
    (Operation::Login, "Entrando..."),
    (Operation::Register, "Criando conta..."),
    (Operation::SaveProfile, "Salvando..."),
    (Operation::OpenConversation, "Abrindo conversa..."),
    (Operation::SendChat, "Pensando..."),
    (Operation::LoadHistory, "Carregando histórico..."),
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(10),   // Screen
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_screen(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  Vai Logística · {}", app.route.title());
    let right = match app.route {
        Route::Home | Route::ProfileEdit => app
            .current_user()
            .map(|u| format!("{}  [F1] Ajuda", u.display_name()))
            .unwrap_or_else(|| "[F1] Ajuda".to_string()),
        Route::Login | Route::Register => "[F1] Ajuda".to_string(),
    };
    let padding = (area.width as usize)
        .saturating_sub(title.chars().count() + right.chars().count() + 2);

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_screen(frame: &mut Frame, app: &App, area: Rect) {
    match app.route {
        Route::Login => login::render(frame, app, area),
        Route::Register => register::render(frame, app, area),
        Route::Home => home::render(frame, app, area),
        Route::ProfileEdit => profile::render(frame, app, area),
    }
}

fn busy_label(app: &App) -> Option<&'static str> {
    if !app.is_busy() {
        return None;
    }
    BUSY_LABELS
        .iter()
        .find(|(op, _)| app.flights.is_busy(*op))
        .map(|(_, label)| *label)
}

fn shortcuts(route: Route) -> &'static str {
    match route {
        Route::Login => "[Tab] campo | [Enter] entrar | [Esc] sair",
        Route::Register => "[Tab] campo | [Enter] criar | [Esc] voltar",
        Route::Home => "[Tab] histórico | [^P] perfil | [^L] sair da conta",
        Route::ProfileEdit => "[Tab] campo | [Enter] salvar | [Esc] voltar",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if let Some(label) = busy_label(app) {
        format!(" {} ", label)
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        String::new()
    };
    let right_text = format!(" {} ", shortcuts(app.route));

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::highlight_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, _app: &App) {
    let area = centered_rect_fixed(56, 24, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Vai Logística · Assistente de Decisões", styles::title_style())),
        Line::from(Span::styled(format!("  versão {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Formulários", styles::highlight_style())),
        help_line("Tab/↓", "Próximo campo"),
        help_line("S-Tab/↑", "Campo anterior"),
        help_line("Enter", "Avançar / confirmar"),
        help_line("Espaço", "Marcar \"lembrar de mim\""),
        help_line("Esc", "Voltar (ou sair no login)"),
        Line::from(""),
        Line::from(Span::styled(" Assistente", styles::highlight_style())),
        help_line("Enter", "Enviar pergunta"),
        help_line("↑/↓", "Escolher sugestão"),
        help_line("Tab", "Abrir/fechar histórico"),
        help_line("Ctrl+N", "Nova conversa"),
        help_line("Ctrl+P", "Editar perfil"),
        help_line("Ctrl+L", "Sair da conta"),
        Line::from(""),
        help_line("Ctrl+C", "Fechar o aplicativo"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Pressione ", styles::muted_style()),
            Span::styled("F1", styles::help_key_style()),
            Span::styled(" ou ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" para fechar", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Deseja fechar o aplicativo?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Pressione ", styles::muted_style()),
            Span::styled("[S]", styles::help_key_style()),
            Span::styled(" para sair, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" para cancelar", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        assert_eq!(centered_rect_fixed(50, 10, outer), Rect::new(25, 15, 50, 10));

        // Clamped to the available area
        let small = Rect::new(0, 0, 20, 5);
        assert_eq!(centered_rect_fixed(50, 10, small), Rect::new(0, 0, 20, 5));
    }
}
