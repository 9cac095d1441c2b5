//! Application loop and screen routing.
//!
//! The loop never touches mission state directly. It draws the controller's
//! latest snapshot and turns keys into controller commands.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::config::MissionDefaults;
use crate::model::MissionConfig;
use crate::stream::StreamController;

use super::screens::{MissionScreen, SetupScreen};

/// How long to wait for input before redrawing with fresh state.
const TICK: Duration = Duration::from_millis(100);

/// Which screen is currently displayed.
enum Screen {
    Setup(SetupScreen),
    Mission {
        view: MissionScreen,
        setup: SetupScreen,
    },
}

/// What the setup screen wants to happen.
#[derive(Debug)]
pub enum SetupAction {
    Start(MissionConfig),
}

/// What the mission screen wants to happen.
#[derive(Debug)]
pub enum MissionAction {
    SaveDocument(String),
}

/// Runs the TUI event loop until the user quits.
pub fn run(controller: &mut StreamController, defaults: &MissionDefaults) -> io::Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, controller, defaults);
    ratatui::restore();
    controller.stop();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    controller: &mut StreamController,
    defaults: &MissionDefaults,
) -> io::Result<()> {
    let mut screen = Screen::Setup(SetupScreen::new(defaults));

    loop {
        let snapshot = controller.snapshot();
        terminal.draw(|frame| match &screen {
            Screen::Setup(s) => s.render(frame, controller.can_start(&s.config())),
            Screen::Mission { view, .. } => view.render(frame, &snapshot),
        })?;

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if is_interrupt(key) {
            return Ok(());
        }

        screen = match screen {
            Screen::Setup(mut setup) => match key.code {
                KeyCode::Esc => return Ok(()),
                KeyCode::Up | KeyCode::BackTab => {
                    setup.move_up();
                    Screen::Setup(setup)
                }
                KeyCode::Down | KeyCode::Tab => {
                    setup.move_down();
                    Screen::Setup(setup)
                }
                KeyCode::Left => {
                    setup.on_left();
                    Screen::Setup(setup)
                }
                KeyCode::Right => {
                    setup.on_right();
                    Screen::Setup(setup)
                }
                KeyCode::Backspace => {
                    setup.on_backspace();
                    Screen::Setup(setup)
                }
                KeyCode::Char(_) => {
                    if let Some(c) = typed_char(key) {
                        setup.on_char(c);
                    }
                    Screen::Setup(setup)
                }
                KeyCode::Enter => match setup.on_enter() {
                    Some(SetupAction::Start(config)) => match controller.start(config.clone()) {
                        Ok(_) => Screen::Mission {
                            view: MissionScreen::new(config),
                            setup,
                        },
                        Err(e) => {
                            // The form already shows why; keep it up.
                            tracing::debug!(error = %e, "start refused");
                            Screen::Setup(setup)
                        }
                    },
                    None => Screen::Setup(setup),
                },
                _ => Screen::Setup(setup),
            },

            Screen::Mission { mut view, setup } if view.is_editing() => {
                match key.code {
                    KeyCode::Esc => view.cancel_edit(),
                    KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        if let Some(MissionAction::SaveDocument(text)) = view.save_edit() {
                            controller.edit_document(text);
                        }
                    }
                    KeyCode::Enter => view.on_char('\n'),
                    KeyCode::Backspace => view.on_backspace(),
                    KeyCode::Char(_) => {
                        if let Some(c) = typed_char(key) {
                            view.on_char(c);
                        }
                    }
                    _ => {}
                }
                Screen::Mission { view, setup }
            }

            Screen::Mission { mut view, setup } => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Esc if !controller.is_running() => Screen::Setup(setup),
                KeyCode::Char('s') => {
                    controller.stop();
                    Screen::Mission { view, setup }
                }
                KeyCode::Char('e') => {
                    view.begin_edit(&snapshot);
                    Screen::Mission { view, setup }
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    view.on_scroll_up();
                    Screen::Mission { view, setup }
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    view.on_scroll_down();
                    Screen::Mission { view, setup }
                }
                _ => Screen::Mission { view, setup },
            },
        };
    }
}

fn is_interrupt(key: KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// The character a key press types into a text field. Chords type nothing.
fn typed_char(key: KeyEvent) -> Option<char> {
    let chord = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    match key.code {
        KeyCode::Char(c) if !chord => Some(c),
        _ => None,
    }
}
