//! Chinese numeral conversion for chapter and cross-reference numbers.

/// Convert a Chinese numeral between 1 and 99 to an integer.
///
/// Grammar: `一`..`九`, `十`, `<d>十`, `十<d>`, `<d>十<d>`. Anything else,
/// including the empty string, yields 0, which callers treat as absent.
pub fn chinese_to_int(s: &str) -> u32 {
    let chars: Vec<char> = s.trim().chars().collect();

    match chars.as_slice() {
        ['十'] => 10,
        [d] => digit(*d).unwrap_or(0),
        ['十', u] => digit(*u).map(|u| 10 + u).unwrap_or(0),
        [t, '十'] => digit(*t).map(|t| t * 10).unwrap_or(0),
        [t, '十', u] => match (digit(*t), digit(*u)) {
            (Some(t), Some(u)) => t * 10 + u,
            _ => 0,
        },
        _ => 0,
    }
}

fn digit(c: char) -> Option<u32> {
    match c {
        '一' => Some(1),
        '二' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}
