//! Create/edit dialog state machine shared by every resource page.

use std::mem;

use domain::ValidationErrors;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogState<F> {
    Closed,
    Open {
        mode: DialogMode,
        form: F,
        errors: ValidationErrors,
    },
    Submitting {
        mode: DialogMode,
        form: F,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error("dialog is already open")]
    AlreadyOpen,
    #[error("dialog is not open")]
    NotOpen,
    #[error("a submission is already in progress")]
    Submitting,
}

/// Holds the form of at most one record being created or edited.
#[derive(Debug, Clone)]
pub struct FormDialog<F> {
    state: DialogState<F>,
}

impl<F> Default for FormDialog<F> {
    fn default() -> Self {
        Self {
            state: DialogState::Closed,
        }
    }
}

impl<F: Clone> FormDialog<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DialogState<F> {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, DialogState::Closed)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, DialogState::Submitting { .. })
    }

    /// The submit control is only enabled while the form is editable.
    pub fn can_submit(&self) -> bool {
        matches!(self.state, DialogState::Open { .. })
    }

    pub fn mode(&self) -> Option<DialogMode> {
        match &self.state {
            DialogState::Closed => None,
            DialogState::Open { mode, .. } | DialogState::Submitting { mode, .. } => Some(*mode),
        }
    }

    /// Record the dialog is editing, if any.
    pub fn bound_record(&self) -> Option<Uuid> {
        match self.mode() {
            Some(DialogMode::Edit(id)) => Some(id),
            _ => None,
        }
    }

    pub fn form(&self) -> Option<&F> {
        match &self.state {
            DialogState::Closed => None,
            DialogState::Open { form, .. } | DialogState::Submitting { form, .. } => Some(form),
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut F> {
        match &mut self.state {
            DialogState::Open { form, .. } => Some(form),
            _ => None,
        }
    }

    pub fn errors(&self) -> Option<&ValidationErrors> {
        match &self.state {
            DialogState::Open { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn open_create(&mut self, form: F) -> Result<(), DialogError> {
        self.open(DialogMode::Create, form)
    }

    pub fn open_edit(&mut self, id: Uuid, form: F) -> Result<(), DialogError> {
        self.open(DialogMode::Edit(id), form)
    }

    fn open(&mut self, mode: DialogMode, form: F) -> Result<(), DialogError> {
        match self.state {
            DialogState::Closed => {
                debug!(?mode, "dialog opened");
                self.state = DialogState::Open {
                    mode,
                    form,
                    errors: ValidationErrors::new(),
                };
                Ok(())
            }
            DialogState::Open { .. } => Err(DialogError::AlreadyOpen),
            DialogState::Submitting { .. } => Err(DialogError::Submitting),
        }
    }

    /// Discards the form. Closing a closed dialog is a no-op.
    pub fn cancel(&mut self) -> Result<(), DialogError> {
        match self.state {
            DialogState::Submitting { .. } => Err(DialogError::Submitting),
            _ => {
                self.state = DialogState::Closed;
                Ok(())
            }
        }
    }

    /// Open → Submitting. Hands back the mode and a copy of the form to send.
    pub fn begin_submit(&mut self) -> Result<(DialogMode, F), DialogError> {
        match mem::replace(&mut self.state, DialogState::Closed) {
            DialogState::Open { mode, form, .. } => {
                let payload = form.clone();
                self.state = DialogState::Submitting { mode, form };
                Ok((mode, payload))
            }
            other @ DialogState::Submitting { .. } => {
                self.state = other;
                Err(DialogError::Submitting)
            }
            DialogState::Closed => Err(DialogError::NotOpen),
        }
    }

    /// Submitting → Closed.
    pub fn succeed(&mut self) {
        if self.is_submitting() {
            self.state = DialogState::Closed;
        } else {
            debug!("ignoring submit success outside of a submission");
        }
    }

    /// Submitting → Open, keeping the form so the user can correct it.
    pub fn fail(&mut self, errors: ValidationErrors) {
        match mem::replace(&mut self.state, DialogState::Closed) {
            DialogState::Submitting { mode, form } => {
                self.state = DialogState::Open { mode, form, errors };
            }
            other => {
                debug!("ignoring submit failure outside of a submission");
                self.state = other;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_round_trip_closes_on_success() {
        let mut dialog = FormDialog::new();
        dialog.open_create("draft".to_string()).unwrap();
        assert!(dialog.can_submit());

        let (mode, form) = dialog.begin_submit().unwrap();
        assert_eq!(mode, DialogMode::Create);
        assert_eq!(form, "draft");
        assert!(!dialog.can_submit());

        dialog.succeed();
        assert_eq!(dialog.state(), &DialogState::Closed);
    }

    #[test]
    fn test_failure_returns_to_open_with_form_and_errors() {
        let id = Uuid::new_v4();
        let mut dialog = FormDialog::new();
        dialog.open_edit(id, 7u32).unwrap();
        dialog.begin_submit().unwrap();

        let mut errors = ValidationErrors::new();
        errors.push("amount", "is required");
        dialog.fail(errors);

        assert_eq!(dialog.bound_record(), Some(id));
        assert_eq!(dialog.form(), Some(&7));
        assert!(dialog.errors().unwrap().for_field("amount").is_some());
    }

    #[test]
    fn test_illegal_transitions_are_rejected() {
        let mut dialog: FormDialog<u32> = FormDialog::new();
        assert_eq!(dialog.begin_submit(), Err(DialogError::NotOpen));

        dialog.open_edit(Uuid::new_v4(), 1).unwrap();
        assert_eq!(dialog.open_create(2), Err(DialogError::AlreadyOpen));

        dialog.begin_submit().unwrap();
        assert_eq!(dialog.begin_submit(), Err(DialogError::Submitting));
        assert_eq!(dialog.cancel(), Err(DialogError::Submitting));
        assert_eq!(dialog.open_create(3), Err(DialogError::Submitting));
        assert!(dialog.form_mut().is_none());
    }

    #[test]
    fn test_cancel_discards_the_form() {
        let mut dialog = FormDialog::new();
        dialog.open_create(1u8).unwrap();
        *dialog.form_mut().unwrap() = 2;
        dialog.cancel().unwrap();
        assert!(!dialog.is_open());
        assert!(dialog.form().is_none());
        dialog.cancel().unwrap();
    }
}
