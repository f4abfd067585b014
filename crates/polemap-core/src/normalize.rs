//! Canonical form for pole plate identifiers.
//!
//! Plate text arrives in whatever width and script the contributor's keyboard
//! produced: full-width digits from Japanese IMEs, half-width katakana from
//! legacy devices, stray spaces from OCR-assisted entry. Two labels that look
//! identical on a plate must compare equal, so every identifier is reduced to
//! a single canonical form and all equality checks run on that form only.
//!
//! # Steps (order is significant)
//!
//! 1. Full-width digits (U+FF10..=U+FF19) → ASCII digits.
//! 2. Half-width katakana → full-width katakana. A kana followed by a
//!    half-width voiced/semi-voiced mark is composed as a unit *before* the
//!    single-character table is consulted; mapping the base kana first would
//!    leave a stray mark and a wrong (unvoiced) kana.
//! 3. Full-width Latin letters → ASCII letters.
//! 4. All whitespace removed, including the ideographic space U+3000.
//!
//! The function is total: anything outside these classes passes through
//! unchanged. It is also idempotent, since every output character is already
//! in canonical form.

/// Normalize raw plate text into its canonical identifier form.
///
/// Two raw strings denote the same identifier iff their normalized forms are
/// byte-equal. There is no fuzzy or substring matching anywhere in the
/// engine.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        // Composed sequences take priority over the single-kana table.
        if let Some(&mark) = chars.peek()
            && let Some(composed) = compose_half_width(c, mark)
        {
            out.push(composed);
            chars.next();
            continue;
        }

        let mapped = match c {
            // Full-width digit block sits at a fixed offset from ASCII.
            '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
                char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
            }
            _ => half_width_kana(c).unwrap_or(c),
        };

        if !mapped.is_whitespace() {
            out.push(mapped);
        }
    }

    out
}

/// Compose a half-width kana followed by a half-width voiced (U+FF9E) or
/// semi-voiced (U+FF9F) sound mark into the corresponding full-width kana.
fn compose_half_width(base: char, mark: char) -> Option<char> {
    match mark {
        '\u{FF9E}' => match base {
            'ｶ' => Some('ガ'),
            'ｷ' => Some('ギ'),
            'ｸ' => Some('グ'),
            'ｹ' => Some('ゲ'),
            'ｺ' => Some('ゴ'),
            'ｻ' => Some('ザ'),
            'ｼ' => Some('ジ'),
            'ｽ' => Some('ズ'),
            'ｾ' => Some('ゼ'),
            'ｿ' => Some('ゾ'),
            'ﾀ' => Some('ダ'),
            'ﾁ' => Some('ヂ'),
            'ﾂ' => Some('ヅ'),
            'ﾃ' => Some('デ'),
            'ﾄ' => Some('ド'),
            'ﾊ' => Some('バ'),
            'ﾋ' => Some('ビ'),
            'ﾌ' => Some('ブ'),
            'ﾍ' => Some('ベ'),
            'ﾎ' => Some('ボ'),
            'ｳ' => Some('ヴ'),
            'ﾜ' => Some('ヷ'),
            'ｦ' => Some('ヺ'),
            _ => None,
        },
        '\u{FF9F}' => match base {
            'ﾊ' => Some('パ'),
            'ﾋ' => Some('ピ'),
            'ﾌ' => Some('プ'),
            'ﾍ' => Some('ペ'),
            'ﾎ' => Some('ポ'),
            _ => None,
        },
        _ => None,
    }
}

/// Map a lone half-width katakana character (U+FF61..=U+FF9F) to its
/// full-width form.
fn half_width_kana(c: char) -> Option<char> {
    let mapped = match c {
        '｡' => '。',
        '｢' => '「',
        '｣' => '」',
        '､' => '、',
        '･' => '・',
        'ｦ' => 'ヲ',
        'ｧ' => 'ァ',
        'ｨ' => 'ィ',
        'ｩ' => 'ゥ',
        'ｪ' => 'ェ',
        'ｫ' => 'ォ',
        'ｬ' => 'ャ',
        'ｭ' => 'ュ',
        'ｮ' => 'ョ',
        'ｯ' => 'ッ',
        'ｰ' => 'ー',
        'ｱ' => 'ア',
        'ｲ' => 'イ',
        'ｳ' => 'ウ',
        'ｴ' => 'エ',
        'ｵ' => 'オ',
        'ｶ' => 'カ',
        'ｷ' => 'キ',
        'ｸ' => 'ク',
        'ｹ' => 'ケ',
        'ｺ' => 'コ',
        'ｻ' => 'サ',
        'ｼ' => 'シ',
        'ｽ' => 'ス',
        'ｾ' => 'セ',
        'ｿ' => 'ソ',
        'ﾀ' => 'タ',
        'ﾁ' => 'チ',
        'ﾂ' => 'ツ',
        'ﾃ' => 'テ',
        'ﾄ' => 'ト',
        'ﾅ' => 'ナ',
        'ﾆ' => 'ニ',
        'ﾇ' => 'ヌ',
        'ﾈ' => 'ネ',
        'ﾉ' => 'ノ',
        'ﾊ' => 'ハ',
        'ﾋ' => 'ヒ',
        'ﾌ' => 'フ',
        'ﾍ' => 'ヘ',
        'ﾎ' => 'ホ',
        'ﾏ' => 'マ',
        'ﾐ' => 'ミ',
        'ﾑ' => 'ム',
        'ﾒ' => 'メ',
        'ﾓ' => 'モ',
        'ﾔ' => 'ヤ',
        'ﾕ' => 'ユ',
        'ﾖ' => 'ヨ',
        'ﾗ' => 'ラ',
        'ﾘ' => 'リ',
        'ﾙ' => 'ル',
        'ﾚ' => 'レ',
        'ﾛ' => 'ロ',
        'ﾜ' => 'ワ',
        'ﾝ' => 'ン',
        '\u{FF9E}' => '゛',
        '\u{FF9F}' => '゜',
        _ => return None,
    };
    Some(mapped)
}
