use crate::nav::Direction;

/// Terminal-independent input, produced once per key press by the event loop
/// and handed to the screen on top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Move(Direction),
    Activate,
    Back,
    PageUp,
    PageDown,
    ToggleRead,
    StartCache,
    StopCache,
    Refresh,
    LoadEarlier,
    Dismiss,
    ToggleAutoRefresh,
    NextField,
    PrevField,
    Char(char),
    Erase,
    Quit,
}

impl Input {
    /// Keys that still mean something while a text field has focus.
    pub fn is_text_safe(&self) -> bool {
        matches!(
            self,
            Input::Char(_)
                | Input::Erase
                | Input::NextField
                | Input::PrevField
                | Input::Activate
                | Input::Back
                | Input::Move(Direction::Up | Direction::Down)
        )
    }
}
