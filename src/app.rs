use std::path::Path;

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::designer::{self, Design};
use crate::gemini::GeminiClient;
use crate::media;
use crate::message::{ChatMessage, MessageLog, SourceImage};

pub const GREETING: &str = "¡Hola! Soy Visioneer AI. Sube una foto de tu espacio, ya sea un \
jardín o una habitación, y dime qué te gustaría crear. Juntos, podemos diseñar el espacio \
de tus sueños.";

const APOLOGY_GENERATE: &str = "Lo siento, encontré un error al generar el diseño. Por \
favor, revisa el mensaje de error de arriba.";
const APOLOGY_EDIT: &str = "Lo siento, encontré un error al editar el diseño. Por favor, \
revisa el mensaje de error de arriba.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Upload,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadField {
    Path,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Generate,
    Edit,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub upload_field: UploadField,

    // Chat state
    pub messages: MessageLog,
    pub error: Option<String>,
    pub status: Option<String>,

    // Upload state
    pub staged_images: Vec<SourceImage>,
    pub path_input: String,
    pub path_cursor: usize,

    // Prompt state (shared by the upload panel and the edit box)
    pub prompt_input: String,
    pub prompt_cursor: usize,

    // Chat viewport (updated during render, used for scroll calculations)
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8,

    // Outstanding generation round-trip; at most one at a time
    pending: Option<(PendingKind, JoinHandle<Result<Design>>)>,

    client: GeminiClient,
}

impl App {
    pub fn new(client: GeminiClient, staged_images: Vec<SourceImage>) -> Self {
        let mut messages = MessageLog::new();
        messages.push(ChatMessage::Ai {
            text: GREETING.to_string(),
            image: None,
        });

        let upload_field = if staged_images.is_empty() {
            UploadField::Path
        } else {
            UploadField::Prompt
        };

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            upload_field,
            messages,
            error: None,
            status: None,
            staged_images,
            path_input: String::new(),
            path_cursor: 0,
            prompt_input: String::new(),
            prompt_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            pending: None,
            client,
        }
    }

    /// The uploader is shown until the first design lands; afterwards the
    /// view switches to the single-line edit prompt.
    pub fn screen(&self) -> Screen {
        if self.messages.has_design() {
            Screen::Chat
        } else {
            Screen::Upload
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Validate the typed path and add it to the staged set.
    pub fn stage_image_from_input(&mut self) {
        let raw = self.path_input.trim();
        if raw.is_empty() {
            return;
        }
        match media::stage_source_image(Path::new(raw)) {
            Ok(image) => {
                self.staged_images.push(image);
                self.path_input.clear();
                self.path_cursor = 0;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn remove_last_staged(&mut self) {
        self.staged_images.pop();
    }

    /// Start a design from the staged photos. Appends the user message
    /// immediately, then hands the round-trip to a background task. No-op
    /// while a request is already outstanding.
    pub fn start_design(&mut self) {
        if self.pending.is_some() {
            return;
        }
        if self.staged_images.is_empty() {
            self.error = Some("Agrega al menos una imagen de tu espacio.".to_string());
            return;
        }
        let prompt = self.prompt_input.trim().to_string();
        if prompt.is_empty() {
            self.error = Some("Escribe una instrucción para el diseño.".to_string());
            return;
        }

        self.error = None;
        self.status = None;
        self.messages.push(ChatMessage::UserWithImages {
            text: prompt.clone(),
            images: self.staged_images.clone(),
        });
        self.prompt_input.clear();
        self.prompt_cursor = 0;
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        let images = self.staged_images.clone();
        let handle = tokio::spawn(async move {
            designer::generate_initial_design(&client, &images, &prompt).await
        });
        self.pending = Some((PendingKind::Generate, handle));
    }

    /// Ask for a change to the most recent design. Fails fast, with no
    /// message appended and no network call, when no prior design exists.
    pub fn start_edit(&mut self) {
        if self.pending.is_some() {
            return;
        }
        let prompt = self.prompt_input.trim().to_string();
        if prompt.is_empty() {
            return;
        }
        let Some(base) = self.messages.last_design().cloned() else {
            self.error = Some("No se encontró una imagen anterior para editar.".to_string());
            return;
        };

        self.error = None;
        self.status = None;
        self.messages.push(ChatMessage::User {
            text: prompt.clone(),
        });
        self.prompt_input.clear();
        self.prompt_cursor = 0;
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        let handle =
            tokio::spawn(async move { designer::edit_design(&client, &base, &prompt).await });
        self.pending = Some((PendingKind::Edit, handle));
    }

    /// Collect the finished generation task, if any. Every initiated round
    /// terminates in exactly one appended AI message: the design on
    /// success, a conversational apology plus the banner text on failure.
    pub async fn poll_pending(&mut self) {
        let finished = matches!(&self.pending, Some((_, handle)) if handle.is_finished());
        if !finished {
            return;
        }
        let Some((kind, handle)) = self.pending.take() else {
            return;
        };
        let outcome = match handle.await {
            Ok(result) => result,
            Err(join_error) => Err(anyhow::anyhow!("La tarea de generación falló: {join_error}")),
        };

        match outcome {
            Ok(design) => {
                self.messages.push(ChatMessage::Ai {
                    text: design.description,
                    image: Some(design.image),
                });
                if kind == PendingKind::Generate {
                    self.staged_images.clear();
                }
            }
            Err(e) => {
                self.error = Some(format!("{e:#}"));
                let apology = match kind {
                    PendingKind::Generate => APOLOGY_GENERATE,
                    PendingKind::Edit => APOLOGY_EDIT,
                };
                self.messages.push(ChatMessage::Ai {
                    text: apology.to_string(),
                    image: None,
                });
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Revert the trailing user/AI exchange and clear any displayed error.
    /// Silently a no-op when the tail is not an exchange.
    pub fn undo(&mut self) {
        self.messages.undo_exchange();
        self.error = None;
    }

    /// Write the most recent design to a timestamped PNG in the working
    /// directory. Local-only; no network involved.
    pub fn save_latest_design(&mut self) {
        let Some(image) = self.messages.last_design().cloned() else {
            self.error = Some("No hay ningún diseño para guardar.".to_string());
            return;
        };
        match media::save_design(&image, Path::new(".")) {
            Ok(path) => {
                self.status = Some(format!("Imagen guardada en {}", path.display()));
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll the chat so the newest entry (or the thinking indicator) is
    /// visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.messages.messages() {
            total_lines += 1; // Header line ("Tú:" or "AI:")
            let (text, extra) = match msg {
                ChatMessage::User { text } => (text, 0u16),
                ChatMessage::UserWithImages { text, images } => (text, images.len() as u16),
                ChatMessage::Ai { text, image } => (text, u16::from(image.is_some())),
            };
            for line in text.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += extra; // Image chips
            total_lines += 1; // Blank line after message
        }

        if self.is_loading() {
            total_lines += 2; // "AI:" + "Pensando..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::DesignImage;
    use std::path::PathBuf;
    use std::time::Duration;

    fn test_app(staged: Vec<SourceImage>) -> App {
        let client = GeminiClient::new("clave-de-prueba", "modelo-imagen", "modelo-texto");
        App::new(client, staged)
    }

    fn missing_image() -> SourceImage {
        SourceImage {
            path: PathBuf::from("/no/existe/sala.png"),
            mime_type: "image/png".to_string(),
        }
    }

    async fn settle(app: &mut App) {
        while app.is_loading() {
            app.poll_pending().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_start_design_appends_user_message_synchronously() {
        let mut app = test_app(vec![missing_image(), missing_image()]);
        app.prompt_input = "hazlo moderno".to_string();

        app.start_design();

        assert!(app.is_loading());
        let last = app.messages.messages().last().unwrap();
        match last {
            ChatMessage::UserWithImages { text, images } => {
                assert_eq!(text, "hazlo moderno");
                assert_eq!(images.len(), 2);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_successful_design_appends_ai_message_with_image() {
        let mut app = test_app(vec![missing_image(), missing_image()]);
        app.prompt_input = "hazlo moderno".to_string();
        app.start_design();

        // Stand in for the settled round-trip without touching the network.
        let (_, stale) = app.pending.take().unwrap();
        stale.abort();
        app.pending = Some((
            PendingKind::Generate,
            tokio::spawn(async {
                Ok::<_, anyhow::Error>(Design {
                    image: DesignImage {
                        data: "bnVldm8=".to_string(),
                        mime_type: "image/png".to_string(),
                    },
                    description: "Cambié la pared a blanco.".to_string(),
                })
            }),
        ));
        settle(&mut app).await;

        match app.messages.messages().last().unwrap() {
            ChatMessage::Ai { text, image } => {
                assert_eq!(text, "Cambié la pared a blanco.");
                let image = image.as_ref().expect("design image expected");
                assert_eq!(image.mime_type, "image/png");
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(app.error.is_none());
        assert_eq!(app.screen(), Screen::Chat);
        assert!(app.staged_images.is_empty());
    }

    #[tokio::test]
    async fn test_failed_design_appends_apology_and_banner() {
        let mut app = test_app(vec![missing_image()]);
        app.prompt_input = "hazlo moderno".to_string();
        let before = app.messages.len();

        app.start_design();
        settle(&mut app).await;

        // Exactly one user and one AI message for the whole round.
        assert_eq!(app.messages.len(), before + 2);
        match app.messages.messages().last().unwrap() {
            ChatMessage::Ai { text, image } => {
                assert!(text.contains("error al generar el diseño"));
                assert!(image.is_none());
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(app.error.is_some());
        // The failed round never produced a design, so the uploader stays.
        assert_eq!(app.screen(), Screen::Upload);
        assert!(!app.staged_images.is_empty());
    }

    #[tokio::test]
    async fn test_start_design_requires_images_and_prompt() {
        let mut app = test_app(vec![]);
        app.prompt_input = "hazlo moderno".to_string();
        app.start_design();
        assert!(!app.is_loading());
        assert!(app.error.as_deref().unwrap().contains("al menos una imagen"));

        let mut app = test_app(vec![missing_image()]);
        app.prompt_input = "   ".to_string();
        app.start_design();
        assert!(!app.is_loading());
        assert!(app.error.as_deref().unwrap().contains("instrucción"));
    }

    #[tokio::test]
    async fn test_edit_without_design_is_local_validation_error() {
        let mut app = test_app(vec![]);
        app.prompt_input = "añade plantas".to_string();
        let before = app.messages.len();

        app.start_edit();

        assert!(!app.is_loading());
        assert_eq!(app.messages.len(), before);
        assert_eq!(
            app.error.as_deref(),
            Some("No se encontró una imagen anterior para editar.")
        );
    }

    #[tokio::test]
    async fn test_edit_uses_most_recent_design_as_base() {
        let mut app = test_app(vec![]);
        app.messages.push(ChatMessage::User {
            text: "primero".to_string(),
        });
        app.messages.push(ChatMessage::Ai {
            text: "v1".to_string(),
            image: Some(DesignImage {
                data: "primera".to_string(),
                mime_type: "image/png".to_string(),
            }),
        });
        app.messages.push(ChatMessage::User {
            text: "segundo".to_string(),
        });
        app.messages.push(ChatMessage::Ai {
            text: "v2".to_string(),
            image: Some(DesignImage {
                data: "segunda".to_string(),
                mime_type: "image/png".to_string(),
            }),
        });

        assert_eq!(app.messages.last_design().unwrap().data, "segunda");

        app.prompt_input = "añade plantas".to_string();
        app.start_edit();
        assert!(app.is_loading());
        match app.messages.messages().last().unwrap() {
            ChatMessage::User { text } => assert_eq!(text, "añade plantas"),
            other => panic!("unexpected message: {other:?}"),
        }
        // The in-flight request is abandoned with the runtime; its outcome
        // is not part of this test.
    }

    #[tokio::test]
    async fn test_undo_reverts_exchange_and_clears_error() {
        let mut app = test_app(vec![missing_image()]);
        app.prompt_input = "hazlo moderno".to_string();

        app.start_design();
        settle(&mut app).await;
        assert!(app.error.is_some());

        let len_after_round = app.messages.len();
        app.undo();
        assert_eq!(app.messages.len(), len_after_round - 2);
        assert!(app.error.is_none());

        // Only the greeting remains, which is not an exchange: undo again
        // must leave the log untouched.
        let before = app.messages.len();
        app.undo();
        assert_eq!(app.messages.len(), before);
    }

    #[tokio::test]
    async fn test_submission_gated_while_pending() {
        let mut app = test_app(vec![missing_image()]);
        app.prompt_input = "hazlo moderno".to_string();
        app.start_design();
        assert!(app.is_loading());

        let len = app.messages.len();
        app.prompt_input = "otra cosa".to_string();
        app.start_design();
        app.start_edit();
        assert_eq!(app.messages.len(), len);

        settle(&mut app).await;
    }
}
