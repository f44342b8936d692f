use crate::catalog::{Catalog, LoadOutcome};
use crate::error::LabError;
use crate::input::Action;
use crate::model::{CommandKind, LabImage, OsVariant};
use crate::resolver::{ResolvedCommands, resolve};
use crate::selection::SelectionState;
use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    LoadCatalog,
    Execute {
        image_id: String,
        kind: CommandKind,
        resolved: ResolvedCommands,
    },
    Copy {
        image_id: String,
        kind: CommandKind,
        command: String,
    },
}

pub struct App {
    running: bool,
    editing_filter: bool,
    catalog: Catalog,
    selection: SelectionState,
    filter: String,
    filter_before_edit: String,
    selected: usize,
    detail_focus: CommandKind,
    status: String,
    show_help: bool,
    pending_g: bool,
    loading: bool,
    catalog_source: String,
    bridge_label: Option<String>,
    page_size: usize,
    detail_scroll: u16,
}

impl App {
    pub fn new(catalog_source: String, bridge_label: Option<String>) -> Self {
        Self {
            running: true,
            editing_filter: false,
            catalog: Catalog::default(),
            selection: SelectionState::new(),
            filter: String::new(),
            filter_before_edit: String::new(),
            selected: 0,
            detail_focus: CommandKind::Pull,
            status: "Ready".to_string(),
            show_help: false,
            pending_g: false,
            loading: false,
            catalog_source,
            bridge_label,
            page_size: 10,
            detail_scroll: 0,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        if self.editing_filter {
            InputMode::Filter
        } else if self.selection.open_image_id().is_some() {
            InputMode::Detail
        } else {
            InputMode::Normal
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn catalog_source(&self) -> &str {
        &self.catalog_source
    }

    pub fn bridge_label(&self) -> Option<&str> {
        self.bridge_label.as_deref()
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn detail_focus(&self) -> CommandKind {
        self.detail_focus
    }

    pub fn last_refresh(&self) -> Option<String> {
        self.catalog
            .last_loaded()
            .map(|loaded| loaded.format("%H:%M:%S").to_string())
    }

    pub fn visible_images(&self) -> Vec<&LabImage> {
        self.catalog.filter(&self.filter)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let len = self.visible_images().len();
        if len == 0 {
            None
        } else {
            Some(self.selected.min(len - 1))
        }
    }

    pub fn selected_image(&self) -> Option<&LabImage> {
        let index = self.selected_index()?;
        self.visible_images().get(index).copied()
    }

    pub fn variant_for(&self, image_id: &str) -> OsVariant {
        self.selection.variant(image_id)
    }

    pub fn open_image_id(&self) -> Option<&str> {
        self.selection.open_image_id()
    }

    /// The open image, if it is still part of the current catalog.
    pub fn open_image(&self) -> Option<&LabImage> {
        let image_id = self.selection.open_image_id()?;
        self.catalog.find(image_id)
    }

    pub fn open_resolved(&self) -> Option<ResolvedCommands> {
        let image = self.open_image()?;
        Some(resolve(image, self.selection.variant(&image.id)))
    }

    pub fn set_page_size(&mut self, rows: usize) {
        self.page_size = rows.max(1);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = normalize_status_text(status.into());
    }

    pub fn begin_catalog_load(&mut self) {
        self.loading = true;
        self.set_status(format!("Loading lab catalog from {}…", self.catalog_source));
    }

    pub fn apply_catalog_load(
        &mut self,
        result: Result<Vec<LabImage>, LabError>,
        loaded_at: DateTime<Local>,
    ) -> LoadOutcome {
        let previous = self.selected_image().map(|image| image.id.clone());
        let error = result.as_ref().err().map(ToString::to_string);
        let outcome = self.catalog.apply_load(result, loaded_at);
        self.loading = false;
        self.reselect(previous.as_deref());

        let status = match (outcome, error) {
            (LoadOutcome::Replaced { images, .. }, _) => {
                format!("Loaded {images} lab images")
            }
            (LoadOutcome::RetainedPrevious { images }, Some(error)) => format!(
                "{} (showing {images} cached)",
                summarize_error_line(&error)
            ),
            (LoadOutcome::RetainedPrevious { images }, None) => {
                format!("Catalog unchanged (showing {images} cached)")
            }
        };
        self.set_status(status);
        outcome
    }

    pub fn record_dispatch(&mut self, kind: CommandKind, result: Result<(), LabError>) {
        match result {
            Ok(()) => {
                let bridge = self.bridge_label.as_deref().unwrap_or("bridge");
                self.set_status(format!("Sent {} command to {bridge}", kind.label()));
            }
            Err(error) => self.set_status(warning_status(&error)),
        }
    }

    pub fn record_copy(&mut self, kind: CommandKind, result: Result<(), LabError>) {
        match result {
            Ok(()) => self.set_status(format!("Copied {} command", kind.label())),
            Err(error) => self.set_status(warning_status(&error)),
        }
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if !matches!(action, Action::GPrefix) {
            self.pending_g = false;
        }

        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
        }

        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::Down => {
                if self.mode() == InputMode::Detail {
                    self.detail_focus = self.detail_focus.other();
                } else {
                    self.move_selection(1);
                }
                AppCommand::None
            }
            Action::Up => {
                if self.mode() == InputMode::Detail {
                    self.detail_focus = self.detail_focus.other();
                } else {
                    self.move_selection(-1);
                }
                AppCommand::None
            }
            Action::PageDown => {
                if self.mode() == InputMode::Detail {
                    self.detail_scroll = self.detail_scroll.saturating_add(self.detail_page());
                } else {
                    self.move_selection(self.page_step());
                }
                AppCommand::None
            }
            Action::PageUp => {
                if self.mode() == InputMode::Detail {
                    self.detail_scroll = self.detail_scroll.saturating_sub(self.detail_page());
                } else {
                    self.move_selection(-self.page_step());
                }
                AppCommand::None
            }
            Action::Top => {
                self.selected = 0;
                AppCommand::None
            }
            Action::Bottom => {
                self.selected = self.visible_images().len().saturating_sub(1);
                AppCommand::None
            }
            Action::GPrefix => {
                if self.pending_g {
                    self.pending_g = false;
                    self.selected = 0;
                } else {
                    self.pending_g = true;
                }
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::StartFilter => {
                self.editing_filter = true;
                self.filter_before_edit = self.filter.clone();
                self.status = "Filter mode (type a subject name)".to_string();
                AppCommand::None
            }
            Action::ClearFilter => {
                if self.filter.is_empty() {
                    self.status = "Nothing to clear".to_string();
                } else {
                    self.update_filter(String::new());
                    self.status = "Filter cleared".to_string();
                }
                AppCommand::None
            }
            Action::SubmitInput => {
                self.editing_filter = false;
                self.status = if self.filter.is_empty() {
                    "Showing all labs".to_string()
                } else {
                    format!("Filter: {}", self.filter)
                };
                AppCommand::None
            }
            Action::CancelInput => {
                self.editing_filter = false;
                let previous = std::mem::take(&mut self.filter_before_edit);
                self.update_filter(previous);
                self.status = "Input cancelled".to_string();
                AppCommand::None
            }
            Action::Backspace => {
                let mut next = self.filter.clone();
                next.pop();
                self.update_filter(next);
                AppCommand::None
            }
            Action::DeleteWord => {
                let mut next = self.filter.clone();
                while next.ends_with(' ') {
                    next.pop();
                }
                while !next.ends_with(' ') && !next.is_empty() {
                    next.pop();
                }
                self.update_filter(next);
                AppCommand::None
            }
            Action::InputChar(c) => {
                let mut next = self.filter.clone();
                next.push(c);
                self.update_filter(next);
                AppCommand::None
            }
            Action::Refresh => {
                if self.loading {
                    self.status = "Catalog load already in progress".to_string();
                    return AppCommand::None;
                }
                self.begin_catalog_load();
                AppCommand::LoadCatalog
            }
            Action::OpenDetail => {
                let Some((image_id, title)) = self
                    .selected_image()
                    .map(|image| (image.id.clone(), image.title()))
                else {
                    self.status = "No lab image selected".to_string();
                    return AppCommand::None;
                };
                self.selection.open(&image_id);
                self.detail_focus = CommandKind::Pull;
                self.detail_scroll = 0;
                self.set_status(format!("Opened {title}"));
                AppCommand::None
            }
            Action::CloseDetail => {
                self.selection.close();
                self.status = "Closed details".to_string();
                AppCommand::None
            }
            Action::SelectVariant(variant) => {
                if let Some(image_id) = self.open_image_id().map(str::to_string) {
                    self.selection.set_variant(&image_id, variant);
                    self.set_status(format!("Showing {} commands", variant.title()));
                }
                AppCommand::None
            }
            Action::ToggleVariant => {
                if let Some(image_id) = self.open_image_id().map(str::to_string) {
                    let variant = self.selection.toggle_variant(&image_id);
                    self.set_status(format!("Showing {} commands", variant.title()));
                }
                AppCommand::None
            }
            Action::CopyCommand => self.prepare_copy(),
            Action::RunCommand => self.prepare_run(),
        }
    }

    fn prepare_copy(&mut self) -> AppCommand {
        let kind = self.detail_focus;
        let Some((image_id, resolved)) = self.open_target() else {
            return AppCommand::None;
        };

        match resolved.command(kind) {
            Ok(command) => AppCommand::Copy {
                image_id,
                kind,
                command: command.to_string(),
            },
            Err(error) => {
                self.set_status(warning_status(&error));
                AppCommand::None
            }
        }
    }

    fn prepare_run(&mut self) -> AppCommand {
        let kind = self.detail_focus;
        let Some((image_id, resolved)) = self.open_target() else {
            return AppCommand::None;
        };

        AppCommand::Execute {
            image_id,
            kind,
            resolved,
        }
    }

    fn open_target(&mut self) -> Option<(String, ResolvedCommands)> {
        let Some(image_id) = self.open_image_id().map(str::to_string) else {
            self.status = "Open a lab image first".to_string();
            return None;
        };

        let Some(resolved) = self.open_resolved() else {
            self.status = "Lab image is no longer in the catalog".to_string();
            return None;
        };

        Some((image_id, resolved))
    }

    fn update_filter(&mut self, filter: String) {
        let previous = self.selected_image().map(|image| image.id.clone());
        self.filter = filter;
        self.reselect(previous.as_deref());
    }

    /// Keeps the highlighted row on the same image when it is still visible,
    /// otherwise clamps the index into the new list.
    fn reselect(&mut self, image_id: Option<&str>) {
        let visible = self.visible_images();
        let position =
            image_id.and_then(|image_id| visible.iter().position(|image| image.id == image_id));
        let len = visible.len();
        self.selected = match position {
            Some(index) => index,
            None => self.selected.min(len.saturating_sub(1)),
        };
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible_images().len();
        if len == 0 {
            self.selected = 0;
            return;
        }

        let current = self.selected.min(len - 1) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    fn detail_page(&self) -> u16 {
        u16::try_from(self.page_size / 2).unwrap_or(u16::MAX).max(1)
    }

    fn page_step(&self) -> isize {
        self.page_size.saturating_sub(1).max(1) as isize
    }
}

fn warning_status(error: &LabError) -> String {
    match error {
        LabError::MissingCommand { .. } => format!("Command missing: {error}"),
        LabError::ExecutionUnavailable => {
            "Execution unavailable: no execution bridge on this host (copy still works)".to_string()
        }
        LabError::Clipboard(_) | LabError::CatalogLoad(_) => error.to_string(),
    }
}

fn summarize_error_line(error: &str) -> String {
    error
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

fn normalize_status_text(status: String) -> String {
    const MAX_STATUS_LEN: usize = 180;
    if status.chars().count() <= MAX_STATUS_LEN {
        return status;
    }

    let mut shortened = status
        .chars()
        .take(MAX_STATUS_LEN.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}
