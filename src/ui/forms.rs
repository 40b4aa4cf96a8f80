use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Student, StudentFields};

/// Internal representation of the student detail form. The form is always
/// visible; whether keystrokes land in it depends on the app mode. `error`
/// is sticky so a failed save stays explained until the user edits again.
#[derive(Default, Clone)]
pub(crate) struct StudentForm {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) age: String,
    pub(crate) active: StudentField,
    pub(crate) error: Option<String>,
}

/// Fields available within the student form.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum StudentField {
    Name,
    Email,
    Age,
}

impl Default for StudentField {
    fn default() -> Self {
        StudentField::Name
    }
}

impl StudentForm {
    /// Populate the form from the record under the table selection.
    pub(crate) fn from_student(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            email: student.email.clone(),
            age: student.age.to_string(),
            active: StudentField::Name,
            error: None,
        }
    }

    /// Reset all three fields, the focus, and any lingering error.
    pub(crate) fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
        self.age.clear();
        self.active = StudentField::Name;
        self.error = None;
    }

    /// Cycle focus forward across the three fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            StudentField::Name => StudentField::Email,
            StudentField::Email => StudentField::Age,
            StudentField::Age => StudentField::Name,
        };
    }

    /// Cycle focus backward across the three fields.
    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            StudentField::Name => StudentField::Age,
            StudentField::Email => StudentField::Name,
            StudentField::Age => StudentField::Email,
        };
    }

    /// Append a character to the active field, filtering allowed input. The
    /// age field only ever accepts digits, which keeps most invalid ages from
    /// being typed in the first place; `parse_inputs` still enforces the full
    /// contract for values that arrive another way.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            StudentField::Age => {
                if ch.is_ascii_digit() {
                    self.age.push(ch);
                    true
                } else {
                    false
                }
            }
            StudentField::Name => {
                if !ch.is_control() {
                    self.name.push(ch);
                    true
                } else {
                    false
                }
            }
            StudentField::Email => {
                if !ch.is_control() {
                    self.email.push(ch);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            StudentField::Name => {
                self.name.pop();
            }
            StudentField::Email => {
                self.email.pop();
            }
            StudentField::Age => {
                self.age.pop();
            }
        }
    }

    /// Validate the inputs and return the normalized triple ready for
    /// persistence. Failures abort the pending write; nothing partial is
    /// ever sent to the store.
    pub(crate) fn parse_inputs(&self) -> Result<StudentFields> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Name is required."));
        }

        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(anyhow!("A valid email is required."));
        }

        let age_raw = self.age.trim();
        if age_raw.is_empty() || !age_raw.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(anyhow!("Age must be a positive integer."));
        }
        let age = age_raw
            .parse::<i64>()
            .map_err(|_| anyhow!("Age must be a positive integer."))?;
        if age <= 0 {
            return Err(anyhow!("Age must be greater than zero."));
        }

        Ok(StudentFields {
            name: name.to_string(),
            email: email.to_string(),
            age,
        })
    }

    /// Render a single line for the form panel, highlighting the focused
    /// field and ghosting placeholders for empty ones.
    pub(crate) fn build_line(&self, field_name: &str, field: StudentField) -> Line<'static> {
        let (value, is_active) = match field {
            StudentField::Name => (&self.name, self.active == StudentField::Name),
            StudentField::Email => (&self.email, self.active == StudentField::Email),
            StudentField::Age => (&self.age, self.active == StudentField::Age),
        };

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Return the character count for the requested field, used to place the
    /// cursor while editing.
    pub(crate) fn value_len(&self, field: StudentField) -> usize {
        match field {
            StudentField::Name => self.name.chars().count(),
            StudentField::Email => self.email.chars().count(),
            StudentField::Age => self.age.chars().count(),
        }
    }
}

/// Everything the delete confirmation dialog needs to describe the record it
/// is about to remove.
#[derive(Clone)]
pub(crate) struct ConfirmStudentDelete {
    pub(crate) id: String,
    pub(crate) summary: String,
}

impl ConfirmStudentDelete {
    /// Build the confirmation state from the selected row.
    pub(crate) fn new(id: String, student: &Student) -> Self {
        Self {
            id,
            summary: student.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with(name: &str, email: &str, age: &str) -> StudentForm {
        StudentForm {
            name: name.to_string(),
            email: email.to_string(),
            age: age.to_string(),
            ..StudentForm::default()
        }
    }

    #[test]
    fn valid_inputs_yield_the_normalized_triple() {
        let fields = form_with("Ann", "a@b.com", "21").parse_inputs().unwrap();
        assert_eq!(
            fields,
            StudentFields {
                name: "Ann".to_string(),
                email: "a@b.com".to_string(),
                age: 21,
            }
        );
    }

    #[test]
    fn name_and_email_are_trimmed() {
        let fields = form_with("  Ann Lee ", " ann@x.com  ", "30")
            .parse_inputs()
            .unwrap();
        assert_eq!(fields.name, "Ann Lee");
        assert_eq!(fields.email, "ann@x.com");
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = form_with("   ", "a@b.com", "21").parse_inputs().unwrap_err();
        assert_eq!(err.to_string(), "Name is required.");
    }

    #[test]
    fn email_must_contain_an_at_sign() {
        let err = form_with("Ann", "", "21").parse_inputs().unwrap_err();
        assert_eq!(err.to_string(), "A valid email is required.");

        let err = form_with("Ann", "ann.example.com", "21")
            .parse_inputs()
            .unwrap_err();
        assert_eq!(err.to_string(), "A valid email is required.");
    }

    #[test]
    fn non_numeric_and_non_positive_ages_are_rejected() {
        for bad in ["", "abc", "-5", "1.5"] {
            let err = form_with("Ann", "a@b.com", bad).parse_inputs().unwrap_err();
            assert_eq!(err.to_string(), "Age must be a positive integer.");
        }

        let err = form_with("Ann", "a@b.com", "0").parse_inputs().unwrap_err();
        assert_eq!(err.to_string(), "Age must be greater than zero.");
    }

    #[test]
    fn age_field_only_accepts_digits() {
        let mut form = StudentForm::default();
        form.active = StudentField::Age;
        assert!(form.push_char('2'));
        assert!(!form.push_char('x'));
        assert!(!form.push_char('-'));
        assert_eq!(form.age, "2");
    }

    #[test]
    fn focus_cycles_forward_and_backward() {
        let mut form = StudentForm::default();
        form.toggle_field();
        assert!(form.active == StudentField::Email);
        form.toggle_field();
        assert!(form.active == StudentField::Age);
        form.toggle_field();
        assert!(form.active == StudentField::Name);
        form.previous_field();
        assert!(form.active == StudentField::Age);
    }

    #[test]
    fn clear_resets_fields_focus_and_error() {
        let mut form = form_with("Ann", "a@b.com", "21");
        form.active = StudentField::Age;
        form.error = Some("Name is required.".to_string());
        form.clear();
        assert!(form.name.is_empty());
        assert!(form.email.is_empty());
        assert!(form.age.is_empty());
        assert!(form.active == StudentField::Name);
        assert!(form.error.is_none());
    }

    #[test]
    fn from_student_carries_every_field() {
        let student = Student {
            id: None,
            name: "Ann Lee".to_string(),
            email: "ann@x.com".to_string(),
            age: 34,
        };
        let form = StudentForm::from_student(&student);
        assert_eq!(form.name, "Ann Lee");
        assert_eq!(form.email, "ann@x.com");
        assert_eq!(form.age, "34");
    }
}
