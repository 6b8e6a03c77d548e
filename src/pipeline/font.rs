//! Helvetica metrics and WinAnsi text encoding for the PDF exporter.
//!
//! The exporter uses the standard-14 Helvetica fonts, which every PDF viewer
//! ships, so no font file is embedded. The price is the WinAnsi character
//! repertoire: letters outside it (č, ć, đ, …) are transliterated to their
//! base letter and anything else becomes `?`. Widths come from the Adobe
//! Helvetica AFM (units of 1/1000 em).

/// Advance widths for U+0020..=U+007E.
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // a..z
    334, 260, 334, 584, // {..~
];

/// Width used for glyphs we have no metric for.
const DEFAULT_WIDTH: u16 = 556;

/// WinAnsi code points 0x80..=0x9F that differ from Latin-1.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '€'),
    (0x82, '‚'),
    (0x83, 'ƒ'),
    (0x84, '„'),
    (0x85, '…'),
    (0x86, '†'),
    (0x87, '‡'),
    (0x88, 'ˆ'),
    (0x89, '‰'),
    (0x8A, 'Š'),
    (0x8B, '‹'),
    (0x8C, 'Œ'),
    (0x8E, 'Ž'),
    (0x91, '‘'),
    (0x92, '’'),
    (0x93, '“'),
    (0x94, '”'),
    (0x95, '•'),
    (0x96, '–'),
    (0x97, '—'),
    (0x98, '˜'),
    (0x99, '™'),
    (0x9A, 'š'),
    (0x9B, '›'),
    (0x9C, 'œ'),
    (0x9E, 'ž'),
    (0x9F, 'Ÿ'),
];

/// Fold a character into the WinAnsi repertoire.
fn fold(ch: char) -> char {
    match ch {
        'č' | 'ć' => 'c',
        'Č' | 'Ć' => 'C',
        'đ' => 'd',
        'Đ' => 'Ð',
        'ǆ' => 'd',
        'ǅ' | 'Ǆ' => 'D',
        'ǉ' => 'l',
        'ǈ' | 'Ǉ' => 'L',
        'ǌ' => 'n',
        'ǋ' | 'Ǌ' => 'N',
        '\t' => ' ',
        other => other,
    }
}

/// Encode one character as a WinAnsi byte.
pub fn encode_char(ch: char) -> u8 {
    let ch = fold(ch);
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return cp as u8;
    }
    WINANSI_HIGH
        .iter()
        .find(|(_, c)| *c == ch)
        .map(|(b, _)| *b)
        .unwrap_or(b'?')
}

/// Encode a line of text as WinAnsi bytes.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

/// Decode a WinAnsi byte. Undefined slots map to U+FFFD.
pub fn decode_byte(b: u8) -> char {
    match b {
        0x20..=0x7E | 0xA0..=0xFF => b as char,
        0x09 | 0x0A | 0x0D => b as char,
        _ => WINANSI_HIGH
            .iter()
            .find(|(code, _)| *code == b)
            .map(|(_, c)| *c)
            .unwrap_or('\u{FFFD}'),
    }
}

/// Decode WinAnsi bytes to a `String`.
pub fn decode_winansi(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| decode_byte(b)).collect()
}

/// Base letter used to look up the width of an accented Latin-1 glyph.
fn width_proxy(ch: char) -> char {
    match ch {
        'À'..='Å' => 'A',
        'Æ' => 'W',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ð' => 'D',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'Š' => 'S',
        'Ž' => 'Z',
        'ß' => 'b',
        'à'..='å' => 'a',
        'æ' => 'm',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' => 's',
        'ž' => 'z',
        '–' => '-',
        '—' | '…' => 'M',
        '‘' | '’' | '‚' => '\'',
        '“' | '”' | '„' => '"',
        other => other,
    }
}

/// Advance width of one character in 1/1000 em.
pub fn char_width(ch: char) -> u16 {
    let ch = width_proxy(fold(ch));
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) {
        ASCII_WIDTHS[(cp - 0x20) as usize]
    } else {
        DEFAULT_WIDTH
    }
}

/// Width of `text` in points when set at `font_size`.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    units as f32 * font_size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_widths_match_afm() {
        assert_eq!(char_width(' '), 278);
        assert_eq!(char_width('W'), 944);
        assert_eq!(char_width('i'), 222);
        assert_eq!(char_width('~'), 584);
    }

    #[test]
    fn text_width_scales_with_size() {
        let w12 = text_width("Hello", 12.0);
        let w24 = text_width("Hello", 24.0);
        assert!((w24 - 2.0 * w12).abs() < 0.001);
        // H=722 e=556 l=222 l=222 o=556 → 2278 units
        assert!((w12 - 27.336).abs() < 0.001);
    }

    #[test]
    fn swedish_letters_round_trip() {
        let text = "Åsa åt äpplen på ön";
        assert_eq!(decode_winansi(&encode_winansi(text)), text);
    }

    #[test]
    fn balkan_letters_fold() {
        assert_eq!(decode_winansi(&encode_winansi("čćšžđ")), "ccšžd");
        assert_eq!(decode_winansi(&encode_winansi("ČĆŠŽĐ")), "CCŠŽÐ");
    }

    #[test]
    fn unknown_characters_become_question_marks() {
        assert_eq!(encode_winansi("日本"), b"??".to_vec());
    }
}
