use crate::audio::{AudioSink, Sound};
use crate::config::Settings;
use crate::game::Game;

// ============================================================================
// Menu
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ButtonKind {
    Start,
    Options,
    Quit,
    Back,
}

impl ButtonKind {
    pub fn label(self) -> &'static str {
        match self {
            ButtonKind::Start => "Start",
            ButtonKind::Options => "Options",
            ButtonKind::Quit => "Quit",
            ButtonKind::Back => "Back",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Button {
    pub kind: ButtonKind,
    pub hovered: bool,
}

impl Button {
    fn new(kind: ButtonKind) -> Self {
        Self {
            kind,
            hovered: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuKey {
    Up,
    Down,
    Select,
    Back,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuAction {
    None,
    StartGame,
    Quit,
}

/// Title screen. The options page replaces the three main buttons with a
/// single Back button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MainMenu {
    main_buttons: [Button; 3],
    back_button: Button,
    selected: usize,
    pub options_open: bool,
}

impl MainMenu {
    pub fn new() -> Self {
        let mut menu = Self {
            main_buttons: [
                Button::new(ButtonKind::Start),
                Button::new(ButtonKind::Options),
                Button::new(ButtonKind::Quit),
            ],
            back_button: Button::new(ButtonKind::Back),
            selected: 0,
            options_open: false,
        };
        menu.refresh_hover();
        menu
    }

    /// Buttons currently on screen.
    pub fn buttons(&self) -> &[Button] {
        if self.options_open {
            std::slice::from_ref(&self.back_button)
        } else {
            &self.main_buttons
        }
    }

    pub fn hovered(&self) -> ButtonKind {
        self.buttons()[self.selected].kind
    }

    fn refresh_hover(&mut self) {
        let selected = self.selected;
        for (i, button) in self.main_buttons.iter_mut().enumerate() {
            button.hovered = !self.options_open && i == selected;
        }
        self.back_button.hovered = self.options_open;
    }

    pub fn handle_key(&mut self, key: MenuKey) -> MenuAction {
        let count = self.buttons().len();
        match key {
            MenuKey::Up => self.selected = (self.selected + count - 1) % count,
            MenuKey::Down => self.selected = (self.selected + 1) % count,
            MenuKey::Back => {
                if self.options_open {
                    self.close_options();
                }
            }
            MenuKey::Select => match self.hovered() {
                ButtonKind::Start => return MenuAction::StartGame,
                ButtonKind::Quit => return MenuAction::Quit,
                ButtonKind::Options => {
                    self.options_open = true;
                    self.selected = 0;
                }
                ButtonKind::Back => self.close_options(),
            },
        }
        self.refresh_hover();
        MenuAction::None
    }

    fn close_options(&mut self) {
        self.options_open = false;
        self.selected = 1;
    }
}

impl Default for MainMenu {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// State Manager
// ============================================================================

pub enum Screen {
    MainMenu(MainMenu),
    Playing(Game),
}

/// Owns the one active screen and replaces it whole on every transition.
pub struct StateManager {
    pub screen: Screen,
    settings: Settings,
    quit: bool,
}

impl StateManager {
    pub fn new(settings: Settings) -> Self {
        Self {
            screen: Screen::MainMenu(MainMenu::new()),
            settings,
            quit: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn game_mut(&mut self) -> Option<&mut Game> {
        match &mut self.screen {
            Screen::Playing(game) => Some(game),
            Screen::MainMenu(_) => None,
        }
    }

    pub fn handle_menu_key(&mut self, key: MenuKey, audio: &mut dyn AudioSink) {
        let Screen::MainMenu(menu) = &mut self.screen else {
            return;
        };
        if key == MenuKey::Select {
            audio.play(Sound::Click);
        }
        match menu.handle_key(key) {
            MenuAction::None => {}
            MenuAction::StartGame => self.start_game(),
            MenuAction::Quit => self.quit = true,
        }
    }

    pub fn start_game(&mut self) {
        self.screen = Screen::Playing(Game::new(&self.settings));
    }

    pub fn back_to_menu(&mut self) {
        self.screen = Screen::MainMenu(MainMenu::new());
    }
}
