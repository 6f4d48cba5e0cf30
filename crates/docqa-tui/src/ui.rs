use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};
use docqa_core::{format_chunk, manager::accepts, NoticeLevel};
use crate::app::{App, FocusPane, InputMode, Screen};

/// Wrap text to fit within a given width, returning multiple lines
/// Uses word boundaries for wrapping (doesn't break mid-word)
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len == 0 {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Documents => render_documents_screen(app, frame, body_area),
        Screen::Ask => render_ask_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // Popups (in order of priority)
    if app.manager.pending_delete().is_some() {
        render_delete_confirm(app, frame, area);
    } else if app.screen == Screen::Ask && app.console.preview.is_some() {
        render_preview(app, frame, body_area);
    }

    render_notifications(app, frame, body_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Smart Document Q&A ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("{} ", app.backend_url), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Documents => " DOCUMENTS ",
        Screen::Ask => " ASK ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |keys: &'static str, label: &'static str| {
        [Span::styled(keys, key_style), Span::styled(label, label_style)]
    };

    let hints: Vec<Span> = if app.manager.pending_delete().is_some() {
        [hint(" y ", " delete "), hint(" n ", " cancel ")].concat()
    } else {
        match (app.screen, app.input_mode) {
            (Screen::Documents, InputMode::Normal) => [
                hint(" j/k ", " nav "),
                hint(" o ", " choose file "),
                hint(" u ", " upload "),
                hint(" a ", " ask "),
                hint(" d ", " delete "),
                hint(" r ", " reload "),
                hint(" Tab ", " Q&A "),
                hint(" q ", " quit "),
            ]
            .concat(),
            (Screen::Documents, InputMode::Editing) => {
                [hint(" Enter ", " select "), hint(" Esc ", " cancel ")].concat()
            }
            (Screen::Ask, InputMode::Normal) if app.console.preview.is_some() => {
                [hint(" j/k ", " scroll "), hint(" Esc ", " close preview ")].concat()
            }
            (Screen::Ask, InputMode::Normal) => {
                let mut hints = hint(" Tab ", " focus ").to_vec();
                match app.focus {
                    FocusPane::Documents => {
                        hints.extend(hint(" j/k ", " nav "));
                        hints.extend(hint(" Enter ", " select "));
                    }
                    FocusPane::Question => {
                        hints.extend(hint(" Enter ", " ask "));
                        hints.extend(hint(" j/k ", " scroll answer "));
                    }
                    FocusPane::Sources => {
                        hints.extend(hint(" j/k ", " nav "));
                        hints.extend(hint(" Space ", " expand "));
                        hints.extend(hint(" e/E ", " all "));
                    }
                    FocusPane::History => {
                        hints.extend(hint(" j/k ", " scroll "));
                    }
                }
                hints.extend(hint(" i ", " type "));
                hints.extend(hint(" p ", " preview "));
                hints.extend(hint(" Esc ", " documents "));
                hints
            }
            (Screen::Ask, InputMode::Editing) => {
                [hint(" Enter ", " ask "), hint(" Esc ", " stop typing ")].concat()
            }
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_documents_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let upload_height = if app.manager.uploading { 7 } else { 6 };
    let [upload_area, list_area] = Layout::vertical([
        Constraint::Length(upload_height),
        Constraint::Min(0),
    ])
    .areas(area);

    render_upload_panel(app, frame, upload_area);
    render_document_list(app, frame, list_area);
}

fn render_upload_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Blue)
        })
        .title(" Upload: drop a PDF or TXT file here, or press o to type a path ");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [input_area, status_area, gauge_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .areas(inner);

    // Path field
    let label = Span::styled("Path: ", Style::default().fg(Color::DarkGray));
    let input_line = if app.path_input.is_empty() && !editing {
        Line::from(vec![
            label,
            Span::styled("(none)", Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)),
        ])
    } else {
        Line::from(vec![label, Span::raw(app.path_input.clone())])
    };
    frame.render_widget(Paragraph::new(input_line), input_area);

    if editing {
        let cursor_x = (6 + app.path_cursor).min(input_area.width.saturating_sub(1) as usize) as u16;
        frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
    }

    // Selection status
    let status = match app.manager.selected_file() {
        Some(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let mut spans = vec![
                Span::styled("Selected: ", Style::default().fg(Color::DarkGray)),
                Span::styled(name, Style::default().fg(Color::Green).bold()),
            ];
            if !accepts(path) {
                spans.push(Span::styled(
                    "  (expected .pdf or .txt)",
                    Style::default().fg(Color::Yellow),
                ));
            }
            Line::from(spans)
        }
        None => Line::from(Span::styled(
            "No file selected",
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(Paragraph::new(status), status_area);

    if app.manager.uploading {
        let progress = app.manager.progress.unwrap_or_default();
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Blue).bg(Color::Black))
            .ratio(progress.ratio())
            .label(format!("Uploading{} {}%", dots, progress.percent));
        frame.render_widget(gauge, gauge_area);
    }
}

fn render_document_list(app: &mut App, frame: &mut Frame, area: Rect) {
    app.list_area = Some(area);
    app.answer_area = None;
    app.sources_area = None;
    app.history_area = None;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Uploaded Documents ({}) ", app.manager.documents.len()));

    if app.manager.loading && app.manager.documents.is_empty() {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let loading = Paragraph::new(format!("Loading documents{}", dots))
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(loading, area);
        return;
    }

    if app.manager.documents.is_empty() {
        let empty = Paragraph::new("No documents uploaded yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .manager
        .documents
        .iter()
        .map(|doc| {
            let mut meta = doc.uploaded_at_local();
            if let Some(chunks) = doc.chunks() {
                meta.push_str(&format!("  {} chunks", chunks));
            }
            ListItem::new(Text::from(vec![
                Line::from(Span::styled(doc.filename.clone(), Style::default().bold())),
                Line::from(Span::styled(format!("  {}", meta), Style::default().fg(Color::DarkGray))),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.documents_state);
}

fn render_ask_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [left_area, right_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(area);

    let picker_height = (app.console.documents.len().clamp(1, 6) + 2) as u16;
    let [picker_area, question_area, history_area] = Layout::vertical([
        Constraint::Length(picker_height),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(left_area);

    let [answer_area, sources_area] = if app.console.sources.is_empty() {
        [right_area, Rect::default()]
    } else {
        Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(right_area)
    };

    // Store areas for mouse hit-testing
    app.list_area = Some(picker_area);
    app.answer_area = Some(answer_area);
    app.sources_area = if app.console.sources.is_empty() { None } else { Some(sources_area) };
    app.history_area = Some(history_area);

    render_picker(app, frame, picker_area);
    render_question(app, frame, question_area);
    render_history(app, frame, history_area);
    render_answer(app, frame, answer_area);
    if !app.console.sources.is_empty() {
        render_sources(app, frame, sources_area);
    }
}

fn render_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Documents))
        .title(" Select Document ");

    if app.console.documents.is_empty() {
        let text = if app.console.documents_loading {
            "Loading documents..."
        } else {
            "No documents found"
        };
        let empty = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let selected = app.console.selected().map(str::to_string);
    let items: Vec<ListItem> = app
        .console
        .documents
        .iter()
        .map(|doc| {
            let is_current = selected.as_deref() == Some(doc.document_id.as_str());
            let prefix = if is_current { "* " } else { "  " };
            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", prefix, doc.filename)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.picker_state);
}

fn render_question(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let focused = app.focus == FocusPane::Question;

    let title = if app.console.loading {
        " Ask a Question (generating...) "
    } else {
        " Ask a Question "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if editing {
            Style::default().fg(Color::Yellow)
        } else {
            border_style(focused)
        })
        .title(title);

    let content = if app.console.question.is_empty() && !editing {
        Paragraph::new(Span::styled(
            "Type your question here... (press i)",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(app.console.question.as_str())
    };

    let inner = block.inner(area);
    frame.render_widget(content.block(block), area);

    if editing {
        let cursor_x = app.question_cursor.min(inner.width.saturating_sub(1) as usize) as u16;
        frame.set_cursor_position((inner.x + cursor_x, inner.y));
    }
}

fn render_history(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::History))
        .title(" Conversation History ");

    if app.console.history.is_empty() {
        let empty = Paragraph::new("No previous interactions yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for entry in &app.console.history {
        lines.push(Line::from(vec![
            Span::styled("Q: ", Style::default().fg(Color::Cyan).bold()),
            Span::styled(entry.question.clone(), Style::default().bold()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("A: ", Style::default().fg(Color::Yellow).bold()),
            Span::raw(entry.answer.clone()),
        ]));
        if let Some(time) = entry.time_label() {
            lines.push(Line::from(Span::styled(
                format!("   {}", time),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::default());
    }

    let history = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.history_scroll, 0));
    frame.render_widget(history, area);
}

fn render_answer(app: &App, frame: &mut Frame, area: Rect) {
    let title = match app.console.last_latency {
        Some(secs) if !app.console.answer.is_empty() => format!(" AI-Generated Answer ({:.2}s) ", secs),
        _ => " AI-Generated Answer ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Question))
        .title(title);

    let text = if app.console.thinking {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Text::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if !app.console.answer.is_empty() {
        Text::from(
            app.console
                .answer
                .visible()
                .lines()
                .map(|l| Line::from(l.to_string()))
                .collect::<Vec<_>>(),
        )
    } else {
        Text::from(Span::styled(
            "Ask a question to see the AI's response",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let answer = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.answer_scroll, 0));
    frame.render_widget(answer, area);
}

fn render_sources(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if app.focus == FocusPane::Sources {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        })
        .title(format!(" Source References ({}) ", app.console.sources.len()));

    // Leave room for borders and the highlight symbol
    let wrap_width = area.width.saturating_sub(6) as usize;

    let items: Vec<ListItem> = app
        .console
        .sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let expanded = app.console.is_expanded(i);
            let marker = if expanded { "▼" } else { "▶" };
            let mut lines = vec![Line::from(Span::styled(
                format!("{} Chunk {}", marker, i + 1),
                Style::default().fg(Color::Green).bold(),
            ))];

            if expanded {
                let formatted = format_chunk(&source.chunk_text);
                for text_line in &formatted.lines {
                    let mut first = true;
                    for wrapped in wrap_text_to_width(text_line, wrap_width.saturating_sub(2)) {
                        let lead = if formatted.bulleted && first { "• " } else { "  " };
                        first = false;
                        lines.push(Line::from(vec![
                            Span::styled(lead, Style::default().fg(Color::Green)),
                            Span::raw(wrapped),
                        ]));
                    }
                }
                lines.push(Line::default());
            }

            ListItem::new(Text::from(lines))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.sources_state);
}

fn render_preview(app: &App, frame: &mut Frame, area: Rect) {
    let Some(preview) = app.console.preview.as_ref() else {
        return;
    };

    let popup_area = centered(area, area.width.saturating_sub(8), area.height.saturating_sub(4));
    frame.render_widget(Clear, popup_area);

    let title = app
        .console
        .selected_document()
        .map(|d| format!(" Preview: {} ", d.filename))
        .unwrap_or_else(|| " Preview ".to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let text = if preview.preview_text.trim().is_empty() {
        Text::from(Span::styled(
            "No readable text found.",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(preview.preview_text.as_str())
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));
    frame.render_widget(paragraph, popup_area);
}

fn render_delete_confirm(app: &App, frame: &mut Frame, area: Rect) {
    let Some(id) = app.manager.pending_delete() else {
        return;
    };
    let name = app
        .manager
        .documents
        .iter()
        .find(|d| d.document_id == id)
        .map(|d| d.filename.clone())
        .unwrap_or_else(|| id.to_string());

    let popup_area = centered(area, 50, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Delete this document? ");

    let text = Text::from(vec![
        Line::from(Span::styled(name, Style::default().bold())),
        Line::from(Span::styled(
            "y to delete, n to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    frame.render_widget(Paragraph::new(text).block(block), popup_area);
}

fn render_notifications(app: &App, frame: &mut Frame, area: Rect) {
    let width = 44.min(area.width);
    let mut y = area.y;

    for notice in app.notices.iter() {
        let lines = wrap_text_to_width(&notice.message, width.saturating_sub(4) as usize);
        let height = lines.len() as u16 + 2;
        if y + height > area.y + area.height {
            break;
        }

        let color = match notice.level {
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        let toast_area = Rect::new(area.x + area.width - width, y, width, height);
        frame.render_widget(Clear, toast_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let text = Text::from(lines.into_iter().map(Line::from).collect::<Vec<_>>());
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(color)).block(block),
            toast_area,
        );

        y += height;
    }
}
