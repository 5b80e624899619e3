//! Naming helpers: snake_case identifiers, singularization, column letters.

/// Converts arbitrary header or sheet text into a snake_case identifier.
///
/// Punctuation separates words, case boundaries split words (`OrderLines`,
/// `HTTPServer`), everything is lower-cased and joined with `_`.
#[must_use]
pub fn snake_case(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            flush(&mut words, &mut current);
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                flush(&mut words, &mut current);
            }
        }
        current.extend(c.to_lowercase());
    }
    flush(&mut words, &mut current);
    words.join("_")
}

fn flush(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

/// Singularizes the last word of a name.
///
/// Rules: `ies` → `y`, `sses` → drop `es`, trailing `s` → drop. Words
/// ending in `ss`, `us` or `is` are left alone.
#[must_use]
pub fn singularize(name: &str) -> String {
    let lower = name.to_lowercase();
    // Byte lengths are equal for the ASCII suffixes we strip.
    if lower.len() != name.len() {
        return name.to_string();
    }
    let last_word_start = lower
        .rfind(|c: char| !c.is_alphanumeric())
        .map_or(0, |i| i + 1);
    let word = &lower[last_word_start..];

    if word.len() > 3 && word.ends_with("ies") {
        return format!("{}y", &name[..name.len() - 3]);
    }
    if word.len() > 4 && word.ends_with("sses") {
        return name[..name.len() - 2].to_string();
    }
    if word.len() > 1
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return name[..name.len() - 1].to_string();
    }
    name.to_string()
}

/// Returns the spreadsheet column letters for a zero-based index (`0` → `A`).
#[must_use]
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parses spreadsheet column letters into a zero-based index (`AB` → 27).
#[must_use]
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut index = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}

/// Returns an A1-style cell reference for zero-based coordinates.
#[must_use]
pub fn cell_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

/// Returns the generated name for a headerless column (`Column_A`).
#[must_use]
pub fn generated_column_name(col: usize) -> String {
    format!("Column_{}", column_letter(col))
}
