//! Normalization of free-text plate number entry.

/// Characters that separate plate tokens.
const SEPARATORS: [char; 5] = ['-', '_', '.', '/', '|'];

pub struct PlateFormatter;

impl PlateFormatter {
    /// Normalizes a plate number into its canonical form.
    ///
    /// Arabic-Indic digits become ASCII digits, ASCII letters are
    /// upper-cased, separators collapse to a single space and anything else
    /// that is not a letter or digit is dropped. Never fails; the result is
    /// stable under repeated formatting.
    ///
    /// # Examples
    ///
    /// ```
    /// use plate_archive::domain::PlateFormatter;
    ///
    /// assert_eq!(PlateFormatter::format("  abc-١٢٣ "), "ABC 123");
    /// assert_eq!(PlateFormatter::format(""), "");
    /// ```
    pub fn format(raw: &str) -> String {
        let mut tokens: Vec<String> = Vec::new();
        let mut current = String::new();

        for ch in raw.chars() {
            if ch.is_whitespace() || SEPARATORS.contains(&ch) {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                continue;
            }

            if let Some(digit) = Self::ascii_digit(ch) {
                current.push(digit);
            } else if ch.is_alphanumeric() {
                current.push(ch.to_ascii_uppercase());
            }
        }

        if !current.is_empty() {
            tokens.push(current);
        }

        tokens.join(" ")
    }

    fn ascii_digit(ch: char) -> Option<char> {
        let offset = match ch {
            '0'..='9' => return Some(ch),
            '\u{0660}'..='\u{0669}' => ch as u32 - 0x0660,
            '\u{06F0}'..='\u{06F9}' => ch as u32 - 0x06F0,
            _ => return None,
        };
        char::from_digit(offset, 10)
    }
}
