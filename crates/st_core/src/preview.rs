//! Preview mode, carried explicitly by every resolution call.

use serde::{Deserialize, Serialize};

pub const ENTER_PREVIEW_PATH: &str = "/api/preview";
pub const EXIT_PREVIEW_PATH: &str = "/api/exit-preview";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub enabled: bool,
    pub reference: Option<String>,
}

/// The only transition available from a given preview state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAction {
    Enter,
    Exit,
}

impl PreviewAction {
    pub fn path(self) -> &'static str {
        match self {
            PreviewAction::Enter => ENTER_PREVIEW_PATH,
            PreviewAction::Exit => EXIT_PREVIEW_PATH,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PreviewAction::Enter => "Entrar do modo Preview",
            PreviewAction::Exit => "Sair do modo Preview",
        }
    }
}

impl Preview {
    pub fn off() -> Self {
        Self::default()
    }

    pub fn on(reference: Option<String>) -> Self {
        Self {
            enabled: true,
            reference,
        }
    }

    pub fn enter(&mut self, token: Option<String>) {
        self.enabled = true;
        self.reference = token.filter(|t| !t.is_empty());
    }

    pub fn exit(&mut self) {
        self.enabled = false;
        self.reference = None;
    }

    pub fn toggle(&self) -> PreviewAction {
        if self.enabled {
            PreviewAction::Exit
        } else {
            PreviewAction::Enter
        }
    }

    /// Content reference to query with. Drafts are only visible in preview.
    pub fn content_ref(&self) -> Option<&str> {
        if self.enabled {
            self.reference.as_deref()
        } else {
            None
        }
    }
}
