use shelfdeck_core::{ServerSettings, ServerSettingsUpdate, SettingsError, SettingsUpdateResponse};

use crate::input::Input;
use crate::nav::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Address,
    Username,
    Password,
    Save,
    Back,
    Logs,
}

impl FormField {
    const ORDER: [FormField; 6] = [
        FormField::Address,
        FormField::Username,
        FormField::Password,
        FormField::Save,
        FormField::Back,
        FormField::Logs,
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            FormField::Address | FormField::Username | FormField::Password
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit(ServerSettingsUpdate),
    Invalid(SettingsError),
    Back,
    OpenLogs,
}

/// Media server credentials form.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub address: String,
    pub username: String,
    password: String,
    focus: FormField,
    loaded: bool,
    saving: bool,
}

impl Default for SettingsForm {
    fn default() -> Self {
        Self {
            address: String::new(),
            username: String::new(),
            password: String::new(),
            focus: FormField::Address,
            loaded: false,
            saving: false,
        }
    }
}

impl SettingsForm {
    pub fn focus(&self) -> FormField {
        self.focus
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn masked_password(&self) -> String {
        "•".repeat(self.password.chars().count())
    }

    pub fn load(&mut self, settings: ServerSettings) {
        self.address = settings.ip;
        self.username = settings.username;
        self.loaded = true;
    }

    fn field_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Address => Some(&mut self.address),
            FormField::Username => Some(&mut self.username),
            FormField::Password => Some(&mut self.password),
            FormField::Save | FormField::Back | FormField::Logs => None,
        }
    }

    /// Validates locally; an invalid form is never turned into a request.
    pub fn submit(&mut self) -> Result<ServerSettingsUpdate, SettingsError> {
        let update = ServerSettingsUpdate::new(&self.address, &self.username, &self.password)?;
        self.saving = true;
        Ok(update)
    }

    pub fn on_saved(&mut self, response: SettingsUpdateResponse) -> String {
        self.saving = false;
        self.password.clear();
        if let Some(current) = response.current_settings {
            self.load(current);
        }
        response
            .message
            .unwrap_or_else(|| "Settings saved".to_string())
    }

    pub fn on_save_failed(&mut self) {
        self.saving = false;
    }

    pub fn handle(&mut self, input: Input) -> FormAction {
        match input {
            Input::NextField | Input::Move(Direction::Down) => {
                self.focus = self.focus.next();
                FormAction::None
            }
            Input::PrevField | Input::Move(Direction::Up) => {
                self.focus = self.focus.prev();
                FormAction::None
            }
            Input::Move(Direction::Left) if !self.focus.is_text() => {
                self.focus = self.focus.prev();
                FormAction::None
            }
            Input::Move(Direction::Right) if !self.focus.is_text() => {
                self.focus = self.focus.next();
                FormAction::None
            }
            Input::Char(c) => {
                if let Some(field) = self.field_mut() {
                    field.push(c);
                }
                FormAction::None
            }
            Input::Erase => {
                if let Some(field) = self.field_mut() {
                    field.pop();
                }
                FormAction::None
            }
            Input::Back => FormAction::Back,
            Input::Activate => match self.focus {
                FormField::Back => FormAction::Back,
                FormField::Logs => FormAction::OpenLogs,
                FormField::Address
                | FormField::Username
                | FormField::Password
                | FormField::Save => {
                    if self.saving {
                        return FormAction::None;
                    }
                    match self.submit() {
                        Ok(update) => FormAction::Submit(update),
                        Err(err) => FormAction::Invalid(err),
                    }
                }
            },
            _ => FormAction::None,
        }
    }
}
