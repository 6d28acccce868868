//! View router: picks what to show from the session state and local view
//! toggles.

use tokio::sync::watch;

use crate::session::SessionSnapshot;

/// Which unauthenticated form is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScreen {
    #[default]
    Login,
    Register,
}

/// Authenticated screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Chat,
    SymptomChecker,
    DrugChecker,
    LabInterpreter,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Chat => "Chat",
            Screen::SymptomChecker => "Symptom Checker",
            Screen::DrugChecker => "Drug Interactions",
            Screen::LabInterpreter => "Lab Results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Login,
    Register,
    Main(Screen),
}

impl View {
    pub fn is_protected(&self) -> bool {
        matches!(self, View::Main(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewRouter {
    auth_screen: AuthScreen,
    screen: Screen,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_login(&mut self) {
        self.auth_screen = AuthScreen::Login;
    }

    pub fn show_register(&mut self) {
        self.auth_screen = AuthScreen::Register;
    }

    pub fn open(&mut self, screen: Screen) {
        self.screen = screen;
    }

    /// Leave a wizard and return to the chat.
    pub fn back(&mut self) {
        self.screen = Screen::Chat;
    }

    /// Protected screens are only reachable once loading has finished and a
    /// credential is held.
    pub fn route(&self, session: &SessionSnapshot) -> View {
        if session.loading {
            return View::Loading;
        }
        if !session.authenticated {
            return match self.auth_screen {
                AuthScreen::Login => View::Login,
                AuthScreen::Register => View::Register,
            };
        }
        View::Main(self.screen)
    }
}

/// Wait for the bootstrap to settle and return the resulting snapshot. If the
/// session has gone away, the last published state is returned.
pub async fn wait_until_ready(updates: &mut watch::Receiver<SessionSnapshot>) -> SessionSnapshot {
    if let Ok(snapshot) = updates.wait_for(|snapshot| !snapshot.loading).await {
        return snapshot.clone();
    }
    updates.borrow().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::UserProfile;

    fn snapshot(loading: bool, authenticated: bool) -> SessionSnapshot {
        SessionSnapshot {
            loading,
            authenticated,
            profile: None,
        }
    }

    #[test]
    fn test_loading_blocks_everything() {
        let mut router = ViewRouter::new();
        router.open(Screen::LabInterpreter);
        assert_eq!(router.route(&snapshot(true, false)), View::Loading);
        assert_eq!(router.route(&snapshot(true, true)), View::Loading);
    }

    #[test]
    fn test_unauthenticated_toggle() {
        let mut router = ViewRouter::new();
        assert_eq!(router.route(&snapshot(false, false)), View::Login);

        router.show_register();
        assert_eq!(router.route(&snapshot(false, false)), View::Register);

        router.show_login();
        assert_eq!(router.route(&snapshot(false, false)), View::Login);
    }

    #[test]
    fn test_authenticated_screens() {
        let mut router = ViewRouter::new();
        let session = snapshot(false, true);
        assert_eq!(router.route(&session), View::Main(Screen::Chat));

        router.open(Screen::DrugChecker);
        assert_eq!(router.route(&session), View::Main(Screen::DrugChecker));
        assert!(router.route(&session).is_protected());

        router.back();
        assert_eq!(router.route(&session), View::Main(Screen::Chat));
    }

    #[test]
    fn test_selected_screen_hidden_after_logout() {
        let mut router = ViewRouter::new();
        router.open(Screen::SymptomChecker);
        assert_eq!(router.route(&snapshot(false, false)), View::Login);
    }

    #[tokio::test]
    async fn test_wait_until_ready() {
        let (tx, mut rx) = watch::channel(snapshot(true, false));

        let waiter = tokio::spawn(async move { wait_until_ready(&mut rx).await });
        tx.send_replace(SessionSnapshot {
            loading: false,
            authenticated: true,
            profile: Some(UserProfile {
                username: "a".to_string(),
                ..Default::default()
            }),
        });

        let ready = waiter.await.unwrap();
        assert!(!ready.loading);
        assert_eq!(ready.profile.unwrap().username, "a");
    }

    #[tokio::test]
    async fn test_wait_until_ready_when_sender_gone() {
        let (tx, mut rx) = watch::channel(snapshot(true, false));
        drop(tx);
        assert!(wait_until_ready(&mut rx).await.loading);
    }
}
