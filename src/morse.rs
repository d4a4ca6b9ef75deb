//! Morse code packing for the ring's scrolling text.
//!
//! The firmware stores morse as 2-bit units, four per byte with the least significant unit
//! first: `0` is a gap, `1` a dot, `2` a dash and `3` terminates the stream.

use std::iter;

use crate::error::{PrismError, Result};

/// Unit terminating the packed stream.
const END: u8 = 3;

/// Morse symbols indexed by their unit value.
const SYMBOLS: [char; 3] = [' ', '.', '-'];

/// Supported characters and their morse representation.
///
/// Lookups from morse back to text return the first match, so `Å` wins over `Á`.
const ALPHABET: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('Ä', ".-.-"),
    ('Å', ".--.-"),
    ('Á', ".--.-"),
    ('É', "..-.."),
    ('Ñ', "--.--"),
    ('Ö', "---."),
    ('Ü', "..--"),
    ('&', ".-..."),
    ('\'', ".----."),
    ('@', ".--.-."),
    (')', "-.--.-"),
    ('(', "-.--."),
    (':', "---..."),
    (',', "--..--"),
    ('=', "-...-"),
    ('!', "-.-.--"),
    ('.', ".-.-.-"),
    ('-', "-....-"),
    ('+', ".-.-."),
    ('"', ".-..-."),
    ('?', "..--.."),
    ('/', "-..-."),
    (' ', " "),
];

/// Check if the text only consists of morse symbols.
pub fn is_morse_code(text: &str) -> bool {
    text.trim().chars().all(|c| SYMBOLS.contains(&c))
}

/// Get all distinct characters of the text which have no morse representation.
pub fn invalid_characters(text: &str) -> String {
    let mut invalid = String::new();
    for c in text.trim().to_uppercase().chars() {
        if char_to_morse(c).is_none() && !invalid.contains(c) {
            invalid.push(c);
        }
    }
    invalid
}

/// Convert text to morse.
///
/// Text which already is morse code is only trimmed.
pub fn to_morse(text: &str) -> Result<String> {
    if is_morse_code(text) {
        return Ok(text.trim().to_string());
    }

    let mut morse = String::new();
    for (i, c) in text.trim().to_uppercase().chars().enumerate() {
        if i > 0 {
            morse.push(' ');
        }

        let code = char_to_morse(c).ok_or(PrismError::UnsupportedCharacter(c))?;
        morse.push_str(code);
    }

    Ok(morse)
}

/// Convert morse symbols back to text.
///
/// Gaps of three symbols separate words, shorter gaps only separate letters.
pub fn from_morse(morse: &str) -> Result<String> {
    let mut text = String::new();

    let mut rest = morse;
    while let Some(first) = rest.chars().next() {
        let is_gap = first == ' ';
        let end = rest.find(|c: char| (c == ' ') != is_gap).unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);

        if is_gap {
            text.extend(iter::repeat(' ').take(run.len() / 3));
        } else {
            let c = morse_to_char(run)
                .ok_or_else(|| PrismError::UnknownMorseSequence(run.to_string()))?;
            text.push(c);
        }

        rest = tail;
    }

    Ok(text.trim().to_string())
}

/// Pack text or morse code into the device format.
pub fn encode(text: &str) -> Result<Vec<u8>> {
    let morse = to_morse(text)?;

    let units: Vec<u8> = morse.chars().map(symbol_unit).chain([0, END]).collect();

    let bytes = units
        .chunks(4)
        .map(|chunk| {
            chunk.iter().enumerate().fold(0, |byte, (i, unit)| byte | (unit << (2 * i)))
        })
        .collect();

    Ok(bytes)
}

/// Unpack the device format to text, or raw morse code if `as_morse` is set.
///
/// Everything after the first terminator is ignored.
pub fn decode(bytes: &[u8], as_morse: bool) -> Result<String> {
    let mut morse = String::new();

    'bytes: for byte in bytes {
        for shift in (0..8).step_by(2) {
            let unit = (byte >> shift) & 0b11;
            if unit == END {
                break 'bytes;
            }
            morse.push(SYMBOLS[unit as usize]);
        }
    }

    if as_morse {
        Ok(morse)
    } else {
        from_morse(&morse)
    }
}

fn char_to_morse(c: char) -> Option<&'static str> {
    ALPHABET.iter().find(|(symbol, _)| *symbol == c).map(|(_, code)| *code)
}

fn morse_to_char(code: &str) -> Option<char> {
    ALPHABET.iter().find(|(_, symbol_code)| *symbol_code == code).map(|(c, _)| *c)
}

fn symbol_unit(symbol: char) -> u8 {
    match symbol {
        '.' => 1,
        '-' => 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_to_morse() {
        assert_eq!(to_morse("abc").unwrap(), ".- -... -.-.");
        assert_eq!(to_morse("  sos ").unwrap(), "... --- ...");
    }

    #[test]
    fn words_are_separated_by_three_gaps() {
        assert_eq!(to_morse("a b").unwrap(), ".-   -...");
        assert_eq!(from_morse(".-   -...").unwrap(), "A B");
    }

    #[test]
    fn morse_input_is_kept() {
        assert!(is_morse_code(" .- -... "));
        assert!(!is_morse_code("e."));
        assert_eq!(to_morse(" .- -... ").unwrap(), ".- -...");
    }

    #[test]
    fn abc_through_device_format() {
        let morse = to_morse("abc").unwrap();
        let bytes = encode(&morse).unwrap();
        // The gap written before the terminator is kept in raw morse.
        assert_eq!(decode(&bytes, true).unwrap(), ".- -... -.-. ");
        assert_eq!(decode(&bytes, false).unwrap(), "ABC");
    }

    #[test]
    fn packs_least_significant_unit_first() {
        // ". -" + gap + terminator.
        assert_eq!(encode(". -").unwrap(), vec![0x21, 0x03]);
        assert_eq!(encode("e").unwrap(), vec![0x31]);
        assert_eq!(encode("t").unwrap(), vec![0x32]);
    }

    #[test]
    fn empty_text_is_only_terminated() {
        assert_eq!(encode("").unwrap(), vec![0x0c]);
        assert_eq!(decode(&[0x0c], false).unwrap(), "");
    }

    #[test]
    fn terminator_on_byte_boundary() {
        // ".-   -" is 6 symbols, so the terminator is the last unit of the second byte.
        let bytes = encode("a t").unwrap();
        assert_eq!(bytes.len(), 2);
        assert_eq!(bytes[1] >> 6, END);
        assert_eq!(decode(&bytes, false).unwrap(), "A T");
    }

    #[test]
    fn decode_stops_at_terminator() {
        let mut bytes = encode("hi").unwrap();
        bytes.extend_from_slice(&[0x55, 0xaa, 0x00]);
        assert_eq!(decode(&bytes, false).unwrap(), "HI");
    }

    #[test]
    fn decode_blank_payload() {
        assert_eq!(decode(&[0; 120], false).unwrap(), "");
    }

    #[test]
    fn raw_decode_only_yields_symbols() {
        let bytes = encode("Hello, World! 42?").unwrap();
        let morse = decode(&bytes, true).unwrap();
        assert!(morse.chars().all(|c| SYMBOLS.contains(&c)));
        assert!(morse.len() < bytes.len() * 4);
    }

    #[test]
    fn text_roundtrip() {
        for text in ["sos", " Hello World ", "wraith prism 2020", "a+b=c?", "Ünïcode"] {
            if !invalid_characters(text).is_empty() {
                assert!(encode(text).is_err());
                continue;
            }
            let bytes = encode(text).unwrap();
            assert_eq!(decode(&bytes, false).unwrap(), text.trim().to_uppercase());
        }
    }

    #[test]
    fn accented_letters() {
        let bytes = encode("äöü é ñ").unwrap();
        assert_eq!(decode(&bytes, false).unwrap(), "ÄÖÜ É Ñ");
    }

    #[test]
    fn unsupported_character() {
        assert_eq!(encode("a#b"), Err(PrismError::UnsupportedCharacter('#')));
        assert_eq!(invalid_characters("a#b#%"), "#%");
        assert_eq!(invalid_characters("abc"), "");
    }

    #[test]
    fn unknown_sequence() {
        assert_eq!(
            from_morse("........"),
            Err(PrismError::UnknownMorseSequence("........".into()))
        );
    }
}
