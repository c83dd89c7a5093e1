//! Mathematical alphanumeric code points and their StarMath spelling
//!
//! Converters emit styled letters from the Mathematical Alphanumeric Symbols
//! block (and plain Greek letters), while StarMath expects ASCII control
//! words. Every entry maps exactly one code point, and no code point is
//! listed twice, so the order of substitution is irrelevant.

use once_cell::sync::Lazy;
use std::collections::HashMap;

const LATIN_ALPHABET_SIZE: u32 = 26;

/// Styled Latin alphabets: first capital, first small, StarMath attributes
const LATIN_STYLES: &[(u32, u32, &str)] = &[
    (0x1D400, 0x1D41A, "bold nitalic"),
    (0x1D434, 0x1D44E, "italic"),
    (0x1D468, 0x1D482, "bold italic"),
    (0x1D5D4, 0x1D5EE, "font sans bold nitalic"),
];

/// Unicode leaves a hole in the italic small alphabet for the Planck constant
const ITALIC_SMALL_H: (u32, u32) = (0x1D455, 0x210E);

const GREEK_PLAIN_CAPITALS: [u32; 26] = [
    0x0391, 0x0392, 0x0393, 0x0394, 0x0395, 0x0396, 0x0397, 0x0398, 0x0399, 0x039A, 0x039B,
    0x039C, 0x039D, 0x039E, 0x039F, 0x03A0, 0x03A1, 0x03F4, 0x03A3, 0x03A4, 0x03A5, 0x03A6,
    0x03A7, 0x03A8, 0x03A9, 0x2207,
];

const GREEK_CAPITALS: [Option<&str>; 26] = [
    Some("%ALPHA"),
    Some("%BETA"),
    Some("%GAMMA"),
    Some("%DELTA"),
    Some("%EPSILON"),
    Some("%ZETA"),
    Some("%ETA"),
    Some("%THETA"),
    Some("%IOTA"),
    Some("%KAPPA"),
    Some("%LAMBDA"),
    Some("%MU"),
    Some("%NU"),
    Some("%XI"),
    Some("%OMICRON"),
    Some("%PI"),
    Some("%RHO"),
    None,
    Some("%SIGMA"),
    Some("%TAU"),
    Some("%UPSILON"),
    Some("%PHI"),
    Some("%CHI"),
    Some("%PSI"),
    Some("%OMEGA"),
    Some("%NABLA"),
];

const GREEK_ITALIC_CAPITALS: [Option<&str>; 26] = [
    Some("%iALPHA"),
    Some("%iBETA"),
    Some("%iGAMMA"),
    Some("%iDELTA"),
    Some("%iEPSILON"),
    Some("%iZETA"),
    Some("%iETA"),
    Some("%iTHETA"),
    Some("%iIOTA"),
    Some("%iKAPPA"),
    Some("%iLAMBDA"),
    Some("%iMU"),
    Some("%iNU"),
    Some("%iXI"),
    Some("%iOMICRON"),
    Some("%iPI"),
    Some("%iRHO"),
    None,
    Some("%iSIGMA"),
    Some("%iTAU"),
    Some("%iUPSILON"),
    Some("%iPHI"),
    Some("%iCHI"),
    Some("%iPSI"),
    Some("%iOMEGA"),
    Some("italic %NABLA"),
];

const GREEK_PLAIN_SMALLS: [u32; 32] = [
    0x03B1, 0x03B2, 0x03B3, 0x03B4, 0x03B5, 0x03B6, 0x03B7, 0x03B8, 0x03B9, 0x03BA, 0x03BB,
    0x03BC, 0x03BD, 0x03BE, 0x03BF, 0x03C0, 0x03C1, 0x03C2, 0x03C3, 0x03C4, 0x03C5, 0x03C6,
    0x03C7, 0x03C8, 0x03C9, 0x2202, 0x03F5, 0x03D1, 0x03F0, 0x03D5, 0x03F1, 0x03D6,
];

const GREEK_SMALLS: [Option<&str>; 32] = [
    Some("%alpha"),
    Some("%beta"),
    Some("%gamma"),
    Some("%delta"),
    Some("%varepsilon"),
    Some("%zeta"),
    Some("%eta"),
    Some("%theta"),
    Some("%iota"),
    Some("%kappa"),
    Some("%lambda"),
    Some("%mu"),
    Some("%nu"),
    Some("%xi"),
    Some("%omicron"),
    Some("%pi"),
    Some("%rho"),
    Some("%varsigma"),
    Some("%sigma"),
    Some("%tau"),
    Some("%upsilon"),
    Some("%varphi"),
    Some("%chi"),
    Some("%psi"),
    Some("%omega"),
    Some("partial"),
    Some("%epsilon"),
    Some("%vartheta"),
    None,
    Some("%phi"),
    Some("%varrho"),
    Some("%varpi"),
];

const GREEK_ITALIC_SMALLS: [Option<&str>; 32] = [
    Some("%ialpha"),
    Some("%ibeta"),
    Some("%igamma"),
    Some("%idelta"),
    Some("%ivarepsilon"),
    Some("%izeta"),
    Some("%ieta"),
    Some("%itheta"),
    Some("%iiota"),
    Some("%ikappa"),
    Some("%ilambda"),
    Some("%imu"),
    Some("%inu"),
    Some("%ixi"),
    Some("%iomicron"),
    Some("%ipi"),
    Some("%irho"),
    Some("%ivarsigma"),
    Some("%isigma"),
    Some("%itau"),
    Some("%iupsilon"),
    Some("%ivarphi"),
    Some("%ichi"),
    Some("%ipsi"),
    Some("%iomega"),
    Some("partial"),
    Some("%iepsilon"),
    Some("%ivartheta"),
    None,
    Some("%iphi"),
    Some("%ivarrho"),
    Some("%ivarpi"),
];

/// Greek styles: bold/italic flags, first capital, first small (plain uses the tables above)
const GREEK_STYLES: &[(bool, bool, Option<(u32, u32)>)] = &[
    (false, false, None),
    (true, false, Some((0x1D6A8, 0x1D6C2))),
    (false, true, Some((0x1D6E2, 0x1D6FC))),
    (true, true, Some((0x1D71C, 0x1D736))),
];

pub(crate) static CHARACTER_TABLE: Lazy<HashMap<char, String>> = Lazy::new(build_table);

fn build_table() -> HashMap<char, String> {
    let mut table = HashMap::new();

    for &(capital, small, attributes) in LATIN_STYLES {
        for i in 0..LATIN_ALPHABET_SIZE {
            let upper = char::from(b'A' + i as u8);
            let lower = char::from(b'a' + i as u8);
            insert(&mut table, capital + i, format!("{{{attributes} {upper}}}"));

            let mut small_point = small + i;
            if small_point == ITALIC_SMALL_H.0 {
                small_point = ITALIC_SMALL_H.1;
            }
            insert(&mut table, small_point, format!("{{{attributes} {lower}}}"));
        }
    }

    for &(bold, italic, styled) in GREEK_STYLES {
        let names_capital = if italic {
            &GREEK_ITALIC_CAPITALS
        } else {
            &GREEK_CAPITALS
        };
        let names_small = if italic {
            &GREEK_ITALIC_SMALLS
        } else {
            &GREEK_SMALLS
        };

        for (i, name) in names_capital.iter().enumerate() {
            let Some(name) = name else { continue };
            let point = match styled {
                Some((first, _)) => first + i as u32,
                None => GREEK_PLAIN_CAPITALS[i],
            };
            insert(&mut table, point, greek_word(bold, name));
        }

        for (i, name) in names_small.iter().enumerate() {
            let Some(name) = name else { continue };
            let point = match styled {
                Some((_, first)) => first + i as u32,
                None => GREEK_PLAIN_SMALLS[i],
            };
            insert(&mut table, point, greek_word(bold, name));
        }
    }

    table
}

fn greek_word(bold: bool, name: &str) -> String {
    if bold {
        format!("{{bold {name}}}")
    } else {
        format!("{{{name}}}")
    }
}

fn insert(table: &mut HashMap<char, String>, point: u32, replacement: String) {
    if let Some(c) = char::from_u32(point) {
        table.insert(c, replacement);
    }
}

/// Replace every known styled code point by its control-word spelling
pub fn canonicalize_characters(formula: &str) -> String {
    let mut result = String::with_capacity(formula.len());
    for c in formula.chars() {
        match CHARACTER_TABLE.get(&c) {
            Some(replacement) => result.push_str(replacement),
            None => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_styles() {
        assert_eq!(canonicalize_characters("\u{1D400}"), "{bold nitalic A}");
        assert_eq!(canonicalize_characters("\u{1D41B}"), "{bold nitalic b}");
        assert_eq!(canonicalize_characters("\u{1D44E}"), "{italic a}");
        assert_eq!(canonicalize_characters("\u{1D48F}"), "{bold italic n}");
        assert_eq!(
            canonicalize_characters("\u{1D5D4}"),
            "{font sans bold nitalic A}"
        );
    }

    #[test]
    fn test_italic_small_h_uses_planck_constant() {
        assert_eq!(canonicalize_characters("\u{210E}"), "{italic h}");
        assert!(!CHARACTER_TABLE.contains_key(&'\u{1D455}'));
    }

    #[test]
    fn test_greek_letters() {
        assert_eq!(canonicalize_characters("α"), "{%alpha}");
        assert_eq!(canonicalize_characters("Ω"), "{%OMEGA}");
        assert_eq!(canonicalize_characters("ε"), "{%varepsilon}");
        assert_eq!(canonicalize_characters("ϵ"), "{%epsilon}");
        assert_eq!(canonicalize_characters("∂"), "{partial}");
        assert_eq!(canonicalize_characters("∇"), "{%NABLA}");
        // bold capital alpha, italic small beta, bold italic capital nabla
        assert_eq!(canonicalize_characters("\u{1D6A8}"), "{bold %ALPHA}");
        assert_eq!(canonicalize_characters("\u{1D6FD}"), "{%ibeta}");
        assert_eq!(canonicalize_characters("\u{1D735}"), "{bold italic %NABLA}");
        assert_eq!(canonicalize_characters("\u{1D6DB}"), "{bold partial}");
    }

    #[test]
    fn test_unmapped_symbols_are_kept() {
        // capital theta symbol and kappa symbol have no StarMath spelling
        assert_eq!(canonicalize_characters("ϴ ϰ x + 1"), "ϴ ϰ x + 1");
    }

    #[test]
    fn test_table_size() {
        // 4 Latin styles x 52 letters, 4 Greek styles x (25 capitals + 31 smalls)
        assert_eq!(CHARACTER_TABLE.len(), 4 * 52 + 4 * (25 + 31));
    }
}
