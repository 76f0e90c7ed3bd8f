use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, InputMode, Screen, UploadField};
use crate::message::ChatMessage;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let banner_height = banner_height(app);
    let input_height = match app.screen() {
        // Staged image list + path input + prompt input
        Screen::Upload => staged_list_height(app) + 6,
        Screen::Chat => 3,
    };

    // Main layout: header, banner, chat, inputs, footer
    let [header_area, banner_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(banner_height),
        Constraint::Min(0),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    if banner_height > 0 {
        render_banner(app, frame, banner_area);
    }
    render_chat(app, frame, chat_area);

    match app.screen() {
        Screen::Upload => render_upload_panel(app, frame, input_area),
        Screen::Chat => render_edit_input(app, frame, input_area),
    }

    render_footer(app, frame, footer_area);
}

fn banner_height(app: &App) -> u16 {
    if let Some(error) = &app.error {
        // Blocked-content details span several lines; cap the banner
        (error.lines().count().min(5) as u16) + 2
    } else if app.status.is_some() {
        1
    } else {
        0
    }
}

fn staged_list_height(app: &App) -> u16 {
    (app.staged_images.len().clamp(1, 4) as u16) + 2
}

fn render_header(_app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Visioneer AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "diseño de espacios ",
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_banner(app: &App, frame: &mut Frame, area: Rect) {
    if let Some(error) = &app.error {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Error (Esc para cerrar) ");
        let banner = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(banner, area);
    } else if let Some(status) = &app.status {
        let banner = Paragraph::new(status.as_str()).style(Style::default().fg(Color::Green));
        frame.render_widget(banner, area);
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversación ");

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.messages.messages() {
        match msg {
            ChatMessage::User { text } => {
                push_user_header(&mut lines);
                for line in text.lines() {
                    lines.push(Line::from(line));
                }
                lines.push(Line::default());
            }
            ChatMessage::UserWithImages { text, images } => {
                push_user_header(&mut lines);
                for line in text.lines() {
                    lines.push(Line::from(line));
                }
                for image in images {
                    lines.push(Line::from(Span::styled(
                        format!("  [imagen] {}", image.path.display()),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines.push(Line::default());
            }
            ChatMessage::Ai { text, image } => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )));
                for line in text.lines() {
                    lines.push(Line::from(line));
                }
                if let Some(image) = image {
                    lines.push(Line::from(Span::styled(
                        format!("  [diseño generado: {}] — 's' para guardar", image.mime_type),
                        Style::default().fg(Color::Magenta),
                    )));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Pensando{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn push_user_header(lines: &mut Vec<Line>) {
    lines.push(Line::from(Span::styled(
        "Tú:",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )));
}

fn render_upload_panel(app: &App, frame: &mut Frame, area: Rect) {
    let [staged_area, path_area, prompt_area] = Layout::vertical([
        Constraint::Length(staged_list_height(app)),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(area);

    let staged_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Imágenes ({}) ", app.staged_images.len()));

    let staged_text = if app.staged_images.is_empty() {
        Text::from(Span::styled(
            "Agrega fotos de tu espacio escribiendo su ruta abajo...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let lines: Vec<Line> = app
            .staged_images
            .iter()
            .map(|image| {
                Line::from(vec![
                    Span::styled("• ", Style::default().fg(Color::Green)),
                    Span::raw(image.path.display().to_string()),
                    Span::styled(
                        format!("  ({})", image.mime_type),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect();
        Text::from(lines)
    };

    frame.render_widget(Paragraph::new(staged_text).block(staged_block), staged_area);

    render_input_box(
        app,
        frame,
        path_area,
        " Ruta de imagen (Enter para agregar) ",
        &app.path_input,
        app.path_cursor,
        app.upload_field == UploadField::Path,
    );
    render_input_box(
        app,
        frame,
        prompt_area,
        " Instrucción (Enter para generar) ",
        &app.prompt_input,
        app.prompt_cursor,
        app.upload_field == UploadField::Prompt,
    );
}

fn render_edit_input(app: &App, frame: &mut Frame, area: Rect) {
    render_input_box(
        app,
        frame,
        area,
        " Pide un cambio al diseño (Enter para enviar) ",
        &app.prompt_input,
        app.prompt_cursor,
        true,
    );
}

fn render_input_box(
    app: &App,
    frame: &mut Frame,
    area: Rect,
    title: &str,
    text: &str,
    cursor: usize,
    focused: bool,
) {
    let border_color = if focused && app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    // Horizontal scrolling keeps the cursor visible in long input
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor >= inner_width {
        cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = text.chars().skip(scroll_offset).take(inner_width).collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if focused && app.input_mode == InputMode::Editing {
        let cursor_x = (cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen() {
        Screen::Upload => " SUBIR ",
        Screen::Chat => " EDITAR ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match (app.screen(), app.input_mode) {
        (Screen::Upload, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" agregar/generar ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" campo ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" normal ", label_style),
        ],
        (Screen::Upload, InputMode::Normal) => vec![
            Span::styled(" i ", key_style),
            Span::styled(" escribir ", label_style),
            Span::styled(" d ", key_style),
            Span::styled(" quitar imagen ", label_style),
            Span::styled(" u ", key_style),
            Span::styled(" deshacer ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" salir ", label_style),
        ],
        (Screen::Chat, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" enviar ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" normal ", label_style),
        ],
        (Screen::Chat, InputMode::Normal) => vec![
            Span::styled(" i ", key_style),
            Span::styled(" escribir ", label_style),
            Span::styled(" s ", key_style),
            Span::styled(" guardar diseño ", label_style),
            Span::styled(" u ", key_style),
            Span::styled(" deshacer ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" desplazar ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" salir ", label_style),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);
    if app.is_loading() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            " generando... ",
            Style::default().bg(Color::Magenta).fg(Color::White),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
