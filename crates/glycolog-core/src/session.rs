//! Login state and screen gating.
//!
//! A [`Session`] is created once at startup and handed to whatever needs it.
//! Only [`gate`] reads it to decide which screen to show.

use serde::{Deserialize, Serialize};

/// Who is logged in, if anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<SessionUser>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub display_name: String,
    pub id_token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_in(&mut self, user: SessionUser) {
        tracing::info!(user = %user.display_name, "logged in");
        self.user = Some(user);
    }

    pub fn log_out(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(user = %user.display_name, "logged out");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }
}

/// Screens of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Home,
    Glycemia,
    Treatment,
    Doctor,
    Nutritionist,
    Meals,
    Stats,
    Login,
    Register,
}

impl Screen {
    /// Login and registration are the only screens reachable while logged out.
    pub fn requires_login(&self) -> bool {
        !matches!(self, Screen::Login | Screen::Register)
    }
}

/// Resolve the screen to show for a navigation request.
pub fn gate(session: &Session, requested: Screen) -> Screen {
    match (session.is_logged_in(), requested.requires_login()) {
        (true, true) | (false, false) => requested,
        (false, true) => Screen::Login,
        (true, false) => Screen::Home,
    }
}
