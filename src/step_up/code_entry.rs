//! Six-digit code entry buffer.
//!
//! Keeps one digit per position and tracks which position has focus. Typing
//! advances focus, backspace on an empty position moves back, and pasting fills
//! from the first position with the digits found in the pasted text.

pub const CODE_LENGTH: usize = 6;

/// Keeps only ASCII digits and truncates to [`CODE_LENGTH`].
#[must_use]
pub fn sanitize_code(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(CODE_LENGTH)
        .collect()
}

/// What the presentation layer should do after an edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryEffect {
    Focus(usize),
    Submit,
    Ignored,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeEntry {
    digits: [Option<char>; CODE_LENGTH],
    focus: usize,
}

impl CodeEntry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the digit at `index`. Non-digits are ignored.
    pub fn input(&mut self, index: usize, value: char) -> EntryEffect {
        if index >= CODE_LENGTH || !value.is_ascii_digit() {
            return EntryEffect::Ignored;
        }
        self.digits[index] = Some(value);

        if self.is_complete() {
            self.focus = CODE_LENGTH - 1;
            return EntryEffect::Submit;
        }
        self.focus = (index + 1).min(CODE_LENGTH - 1);
        EntryEffect::Focus(self.focus)
    }

    /// Replaces the buffer with the digits found in `text`.
    pub fn paste(&mut self, text: &str) -> EntryEffect {
        let code = sanitize_code(text);
        if code.is_empty() {
            return EntryEffect::Ignored;
        }

        self.digits = [None; CODE_LENGTH];
        for (slot, digit) in self.digits.iter_mut().zip(code.chars()) {
            *slot = Some(digit);
        }

        if self.is_complete() {
            self.focus = CODE_LENGTH - 1;
            EntryEffect::Submit
        } else {
            self.focus = code.len();
            EntryEffect::Focus(self.focus)
        }
    }

    /// Clears the digit at `index`, or the previous one if `index` is already empty.
    pub fn backspace(&mut self, index: usize) -> EntryEffect {
        if index >= CODE_LENGTH {
            return EntryEffect::Ignored;
        }
        if self.digits[index].take().is_some() {
            self.focus = index;
        } else if index > 0 {
            self.digits[index - 1] = None;
            self.focus = index - 1;
        } else {
            return EntryEffect::Ignored;
        }
        EntryEffect::Focus(self.focus)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The entered digits in order, stopping at the first gap.
    #[must_use]
    pub fn code(&self) -> String {
        self.digits.iter().map_while(|digit| *digit).collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    #[must_use]
    pub const fn focus(&self) -> usize {
        self.focus
    }

    #[must_use]
    pub const fn digits(&self) -> &[Option<char>; CODE_LENGTH] {
        &self.digits
    }
}
