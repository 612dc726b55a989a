use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Cyrillic → Latin substitutions, one entry per letter and case.
static TABLE: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    [
        ('А', "A"), ('а', "a"),
        ('Б', "B"), ('б', "b"),
        ('В', "V"), ('в', "v"),
        ('Г', "G"), ('г', "g"),
        ('Д', "D"), ('д', "d"),
        ('Е', "E"), ('е', "e"),
        ('Ё', "E"), ('ё', "e"),
        ('Ж', "ZH"), ('ж', "zh"),
        ('З', "Z"), ('з', "z"),
        ('И', "I"), ('и', "i"),
        ('Й', "I"), ('й', "i"),
        ('К', "K"), ('к', "k"),
        ('Л', "L"), ('л', "l"),
        ('М', "M"), ('м', "m"),
        ('Н', "N"), ('н', "n"),
        ('О', "O"), ('о', "o"),
        ('П', "P"), ('п', "p"),
        ('Р', "R"), ('р', "r"),
        ('С', "S"), ('с', "s"),
        ('Т', "T"), ('т', "t"),
        ('У', "U"), ('у', "u"),
        ('Ф', "F"), ('ф', "f"),
        ('Х', "H"), ('х', "h"),
        ('Ц', "TS"), ('ц', "ts"),
        ('Ч', "CH"), ('ч', "ch"),
        ('Ш', "SH"), ('ш', "sh"),
        ('Щ', "SCH"), ('щ', "sch"),
        ('Ъ', "_"), ('ъ', "_"),
        ('Ы', "I"), ('ы', "i"),
        ('Ь', "_"), ('ь', "_"),
        ('Э', "E"), ('э', "e"),
        ('Ю', "YU"), ('ю', "yu"),
        ('Я', "Ya"), ('я', "ya"),
    ]
    .into_iter()
    .collect()
});

/// Transliterate `text` character by character. Anything outside the table is copied as is.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match TABLE.get(&ch) {
            Some(latin) => out.push_str(latin),
            None => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_table_letters() {
        assert_eq!(transliterate("Щ"), "SCH");
        assert_eq!(transliterate("ъ"), "_");
        assert_eq!(transliterate("ё"), "e");
        assert_eq!(transliterate("Ё"), "E");
        assert_eq!(transliterate("Иванов"), "Ivanov");
        assert_eq!(transliterate("Щукин"), "SCHukin");
        assert_eq!(transliterate("Юдин"), "YUdin");
        assert_eq!(transliterate("Яковлев"), "Yakovlev");
    }

    #[test]
    fn covers_both_cases_of_the_alphabet() {
        let upper = "АБВГДЕЁЖЗИЙКЛМНОПРСТУФХЦЧШЩЪЫЬЭЮЯ";
        let lower = "абвгдеёжзийклмнопрстуфхцчшщъыьэюя";
        for ch in upper.chars().chain(lower.chars()) {
            assert!(TABLE.contains_key(&ch), "missing {ch}");
            assert!(transliterate(&ch.to_string()).is_ascii());
        }
        assert_eq!(TABLE.len(), upper.chars().count() + lower.chars().count());
    }

    #[test]
    fn no_lookahead_between_letters() {
        // "с" followed by "х" is not a digraph
        assert_eq!(transliterate("схема"), "shema");
        assert_eq!(transliterate("Подъезд"), "Pod_ezd");
    }

    #[test]
    fn passes_through_non_table_chars() {
        proptest::proptest!(|(s in "[A-Za-z0-9 .,;:()\\-_'\"]{0,64}")| {
            proptest::prop_assert_eq!(transliterate(&s), s);
        })
    }

    #[test]
    fn mixed_text_only_touches_cyrillic() {
        assert_eq!(transliterate("Test Тест 2020"), "Test Test 2020");
    }
}
