use crossterm::event::KeyCode;
use candlewick::input::{parse_command, UiCommand};

#[test]
fn parse_command_maps_case_insensitive_char_keys() {
    assert_eq!(parse_command(&KeyCode::Char('q')), Some(UiCommand::Quit));
    assert_eq!(parse_command(&KeyCode::Char('Q')), Some(UiCommand::Quit));
    assert_eq!(
        parse_command(&KeyCode::Char('S')),
        Some(UiCommand::ToggleRunning)
    );
    assert_eq!(parse_command(&KeyCode::Char('v')), Some(UiCommand::NextView));
    assert_eq!(parse_command(&KeyCode::Char('r')), Some(UiCommand::ResetSymbol));
    assert_eq!(parse_command(&KeyCode::Char('X')), Some(UiCommand::ResetAll));
}

#[test]
fn parse_command_maps_navigation_keys() {
    assert_eq!(parse_command(&KeyCode::Tab), Some(UiCommand::NextSymbol));
    assert_eq!(parse_command(&KeyCode::Right), Some(UiCommand::NextSymbol));
    assert_eq!(parse_command(&KeyCode::Char('l')), Some(UiCommand::NextSymbol));
    assert_eq!(parse_command(&KeyCode::BackTab), Some(UiCommand::PrevSymbol));
    assert_eq!(parse_command(&KeyCode::Left), Some(UiCommand::PrevSymbol));
    assert_eq!(parse_command(&KeyCode::Char('h')), Some(UiCommand::PrevSymbol));
    assert_eq!(parse_command(&KeyCode::Esc), Some(UiCommand::Quit));
}

#[test]
fn parse_command_ignores_unmapped_keys() {
    assert_eq!(parse_command(&KeyCode::Char('z')), None);
    assert_eq!(parse_command(&KeyCode::Enter), None);
    assert_eq!(parse_command(&KeyCode::F(1)), None);
}
