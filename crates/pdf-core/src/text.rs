//! Text rendering utilities
//!
//! Operator generation for the two text paths: hex glyph strings for wide
//! (Identity-H) fonts and WinAnsi literal strings for simple fonts.

use crate::document::Color;
use crate::{Align, ColorMode};

/// Context for rendering one buffered text operation
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
    /// Text color
    pub color: Color,
    /// Output color space
    pub color_mode: ColorMode,
}

/// The encoded form of a text show argument
pub enum EncodedText {
    /// Hex string of 16-bit glyph ids, e.g. `<00480065>`
    Hex(String),
    /// WinAnsi bytes shown as an escaped literal string
    Literal(Vec<u8>),
}

/// Generate PDF operators for one text run
///
/// Emits BT .. ET with the non-stroking color, font selection, position and
/// a single Tj. The x offset for center/right alignment is derived from the
/// pre-measured text width.
pub fn generate_text_operators(
    encoded: &EncodedText,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };
    let final_x = x + x_offset;

    let mut ops: Vec<u8> = Vec::new();
    ops.extend_from_slice(b"BT\n");
    ops.extend_from_slice(color_operator(ctx.color, ctx.color_mode).as_bytes());
    ops.extend_from_slice(format!("/{} {} Tf\n", ctx.font_name, ctx.font_size).as_bytes());
    ops.extend_from_slice(format!("{final_x} {y} Td\n").as_bytes());
    match encoded {
        EncodedText::Hex(hex) => {
            ops.extend_from_slice(hex.as_bytes());
        }
        EncodedText::Literal(bytes) => {
            ops.push(b'(');
            for &b in bytes {
                match b {
                    b'(' | b')' | b'\\' => {
                        ops.push(b'\\');
                        ops.push(b);
                    }
                    _ => ops.push(b),
                }
            }
            ops.push(b')');
        }
    }
    ops.extend_from_slice(b" Tj\nET\n");
    ops
}

/// Non-stroking color operator for the given color mode
pub(crate) fn color_operator(color: Color, mode: ColorMode) -> String {
    match mode {
        ColorMode::Rgb => format!("{} {} {} rg\n", color.r, color.g, color.b),
        ColorMode::Cmyk => {
            let (c, m, y, k) = color.to_cmyk();
            format!("{c} {m} {y} {k} k\n")
        }
    }
}

/// Encode text as WinAnsi bytes
///
/// ASCII and Latin-1 map directly; the Windows-1252 specials in 0x80..=0x9F
/// are translated; anything unmappable becomes a question mark.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars().map(char_to_winansi).collect()
}

fn char_to_winansi(c: char) -> u8 {
    let code = c as u32;
    match code {
        0x20..=0x7E => code as u8,
        0xA0..=0xFF => code as u8,
        _ => match c {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}

/// Decode one WinAnsi code back to a character (used for width tables)
pub(crate) fn winansi_to_char(code: u8) -> char {
    match code {
        0x80 => '€',
        0x82 => '‚',
        0x83 => 'ƒ',
        0x84 => '„',
        0x85 => '…',
        0x86 => '†',
        0x87 => '‡',
        0x88 => 'ˆ',
        0x89 => '‰',
        0x8A => 'Š',
        0x8B => '‹',
        0x8C => 'Œ',
        0x8E => 'Ž',
        0x91 => '‘',
        0x92 => '’',
        0x93 => '“',
        0x94 => '”',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x98 => '˜',
        0x99 => '™',
        0x9A => 'š',
        0x9B => '›',
        0x9C => 'œ',
        0x9E => 'ž',
        0x9F => 'Ÿ',
        _ => code as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(font_name: &str, font_size: f32, text_width: f64) -> TextRenderContext {
        TextRenderContext {
            font_name: font_name.to_string(),
            font_size,
            text_width,
            color: Color::black(),
            color_mode: ColorMode::Rgb,
        }
    }

    #[test]
    fn test_operators_left() {
        let encoded = EncodedText::Hex("<00480065006C006C006F>".to_string());
        let ops = generate_text_operators(&encoded, 100.0, 700.0, Align::Left, &ctx("F1", 12.0, 100.0));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("BT"));
        assert!(ops_str.contains("/F1 12 Tf"));
        assert!(ops_str.contains("100 700 Td"));
        assert!(ops_str.contains("<00480065006C006C006F> Tj"));
        assert!(ops_str.contains("ET"));
    }

    #[test]
    fn test_operators_center() {
        let encoded = EncodedText::Hex("<0054>".to_string());
        let ops =
            generate_text_operators(&encoded, 200.0, 600.0, Align::Center, &ctx("F2", 14.0, 100.0));
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("150 600 Td")); // 200 - 50
    }

    #[test]
    fn test_operators_right() {
        let encoded = EncodedText::Hex("<0052>".to_string());
        let ops =
            generate_text_operators(&encoded, 300.0, 500.0, Align::Right, &ctx("F3", 16.0, 80.0));
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("220 500 Td")); // 300 - 80
    }

    #[test]
    fn test_operators_literal_escaping() {
        let encoded = EncodedText::Literal(encode_winansi(r"a(b)c\d"));
        let ops = generate_text_operators(&encoded, 10.0, 10.0, Align::Left, &ctx("F1", 10.0, 0.0));
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains(r"(a\(b\)c\\d) Tj"));
    }

    #[test]
    fn test_operators_cmyk_color() {
        let context = TextRenderContext {
            font_name: "F1".to_string(),
            font_size: 12.0,
            text_width: 0.0,
            color: Color::rgb(1.0, 0.0, 0.0),
            color_mode: ColorMode::Cmyk,
        };
        let encoded = EncodedText::Hex("<0041>".to_string());
        let ops = generate_text_operators(&encoded, 0.0, 0.0, Align::Left, &context);
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains(" k\n"));
        assert!(!ops_str.contains(" rg\n"));
    }

    #[test]
    fn test_operators_rgb_color() {
        let mut context = ctx("F1", 12.0, 0.0);
        context.color = Color::rgb(1.0, 0.0, 0.0);
        let encoded = EncodedText::Hex("<0041>".to_string());
        let ops = generate_text_operators(&encoded, 0.0, 0.0, Align::Left, &context);
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("1 0 0 rg"));
    }

    #[test]
    fn test_encode_winansi_ascii() {
        assert_eq!(encode_winansi("Hello"), b"Hello".to_vec());
    }

    #[test]
    fn test_encode_winansi_latin1() {
        assert_eq!(encode_winansi("café"), vec![b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_encode_winansi_specials() {
        assert_eq!(encode_winansi("€"), vec![0x80]);
        assert_eq!(encode_winansi("–"), vec![0x96]);
        assert_eq!(encode_winansi("”"), vec![0x94]);
    }

    #[test]
    fn test_encode_winansi_unmappable() {
        assert_eq!(encode_winansi("你"), vec![b'?']);
    }

    #[test]
    fn test_winansi_round_trip() {
        for code in 0x20u8..=0x7E {
            assert_eq!(char_to_winansi(winansi_to_char(code)), code);
        }
        for code in [0x80u8, 0x85, 0x96, 0x99, 0xE9, 0xFC] {
            assert_eq!(char_to_winansi(winansi_to_char(code)), code);
        }
    }
}
