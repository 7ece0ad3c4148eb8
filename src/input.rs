use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Quit,
    ToggleRunning,
    NextView,
    NextSymbol,
    PrevSymbol,
    ResetSymbol,
    ResetAll,
}

pub fn parse_command(key_code: &KeyCode) -> Option<UiCommand> {
    match key_code {
        KeyCode::Esc => Some(UiCommand::Quit),
        KeyCode::Tab | KeyCode::Right => Some(UiCommand::NextSymbol),
        KeyCode::BackTab | KeyCode::Left => Some(UiCommand::PrevSymbol),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'q' => Some(UiCommand::Quit),
            's' => Some(UiCommand::ToggleRunning),
            'v' => Some(UiCommand::NextView),
            'l' => Some(UiCommand::NextSymbol),
            'h' => Some(UiCommand::PrevSymbol),
            'r' => Some(UiCommand::ResetSymbol),
            'x' => Some(UiCommand::ResetAll),
            _ => None,
        },
        _ => None,
    }
}
