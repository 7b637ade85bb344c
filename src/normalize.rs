//! Reduction of raw name cells to the key used for equality matching.
//!
//! Keys are uppercase, contain no whitespace, and only keep the letters
//! `A`-`Z` plus the Turkish `Ç Ğ Ö Ş Ü`. The Turkish dotted and dotless
//! `i` variants are folded onto a plain `I` before uppercasing, independent
//! of the process locale.

use crate::model::CellValue;

/// Letters that fold onto `I` before case conversion.
const I_VARIANTS: [char; 3] = ['ı', 'i', 'İ'];

/// Normalizes a typed cell. Blank cells yield an empty key.
pub fn normalize_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => String::new(),
        other => normalize_text(&other.display_text()),
    }
}

/// Normalizes already-coerced cell text.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .trim()
        .chars()
        .map(|ch| if I_VARIANTS.contains(&ch) { 'I' } else { ch })
        .collect();

    folded
        .to_uppercase()
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .filter(|ch| is_key_letter(*ch))
        .collect()
}

fn is_key_letter(ch: char) -> bool {
    ch.is_ascii_uppercase() || matches!(ch, 'Ç' | 'Ğ' | 'Ö' | 'Ş' | 'Ü')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_yields_empty_key() {
        assert_eq!(normalize_cell(&CellValue::Empty), "");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   \t"), "");
    }

    #[test]
    fn case_whitespace_and_dotless_i_are_folded() {
        let expected = normalize_text("ALI YILMAZ");
        assert_eq!(expected, "ALIYILMAZ");
        assert_eq!(normalize_text("ali  Yılmaz"), expected);
        assert_eq!(normalize_text("Alı Yilmaz"), expected);
        assert_eq!(normalize_text("İLKER"), "ILKER");
    }

    #[test]
    fn turkish_letters_survive_uppercasing() {
        assert_eq!(normalize_text("çağrı öztürk"), "ÇAĞRIÖZTÜRK");
        assert_eq!(normalize_text("Şule Ünal"), "ŞULEÜNAL");
    }

    #[test]
    fn punctuation_digits_and_foreign_diacritics_are_dropped() {
        assert_eq!(normalize_text("O'Brien-Smith 2nd."), "OBRIENSMITHND");
        assert_eq!(normalize_text("José Müller"), "JOSMÜLLER");
        assert_eq!(normalize_text("12345"), "");
    }

    #[test]
    fn numeric_cells_are_coerced_to_text_first() {
        assert_eq!(normalize_cell(&CellValue::Number(7.0)), "");
        assert_eq!(normalize_cell(&CellValue::Bool(true)), "TRUE");
        assert_eq!(normalize_cell(&CellValue::from("  veli ")), "VELI");
    }

    #[test]
    fn canonical_keys_are_fixed_points() {
        for raw in ["ali  Yılmaz", "Şule Ünal", "O'Brien", "", "çağrı"] {
            let key = normalize_text(raw);
            assert_eq!(normalize_text(&key), key);
        }
    }
}
