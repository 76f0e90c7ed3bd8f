use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, InputMode, Screen, UploadField};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Esc => {
            app.error = None;
            app.status = None;
        }

        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('u') => {
            app.undo();
        }

        KeyCode::Char('s') => {
            app.save_latest_design();
        }

        // Drop the most recently staged image (uploader only)
        KeyCode::Char('d') => {
            if app.screen() == Screen::Upload {
                app.remove_last_staged();
            }
        }

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        KeyCode::Tab => {
            if app.screen() == Screen::Upload {
                app.upload_field = match app.upload_field {
                    UploadField::Path => UploadField::Prompt,
                    UploadField::Prompt => UploadField::Path,
                };
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }

        KeyCode::Tab => {
            if app.screen() == Screen::Upload {
                app.upload_field = match app.upload_field {
                    UploadField::Path => UploadField::Prompt,
                    UploadField::Prompt => UploadField::Path,
                };
            }
        }

        KeyCode::Enter => match app.screen() {
            Screen::Upload => match app.upload_field {
                UploadField::Path => {
                    app.stage_image_from_input();
                }
                UploadField::Prompt => {
                    app.start_design();
                }
            },
            Screen::Chat => {
                app.start_edit();
            }
        },

        KeyCode::Backspace => {
            let (input, cursor) = active_input(app);
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let (input, cursor) = active_input(app);
            let char_count = input.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            let (_, cursor) = active_input(app);
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let (input, cursor) = active_input(app);
            let char_count = input.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            let (_, cursor) = active_input(app);
            *cursor = 0;
        }
        KeyCode::End => {
            let (input, cursor) = active_input(app);
            *cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let (input, cursor) = active_input(app);
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

/// The input field the cursor currently lives in: the path box on the
/// uploader when focused, the prompt box everywhere else.
fn active_input(app: &mut App) -> (&mut String, &mut usize) {
    if app.screen() == Screen::Upload && app.upload_field == UploadField::Path {
        (&mut app.path_input, &mut app.path_cursor)
    } else {
        (&mut app.prompt_input, &mut app.prompt_cursor)
    }
}
