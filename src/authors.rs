//! Separating author names from affiliation footnotes.
//!
//! The authors block of a publication page is read as one flat run of strings: names, each
//! optionally followed by a numeric footnote marker, and then the affiliation list where every
//! entry is introduced by the same marker. The split below pairs the two sides by marker value.

/// Authors in order of appearance, and `(author, affiliation)` pairs.
pub type Split = (Vec<String>, Vec<(String, String)>);

fn is_marker(s: &str) -> bool {
    marker_value(s).is_some()
}

fn marker_value(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Split `tokens` into authors and affiliations.
///
/// Token 0 is always an author. A marker after a name is matched against the last equal marker
/// further down the run (scanning back from the penultimate token), and the token right after that
/// match is the affiliation. The earliest matched position bounds where author names stop.
pub fn split_authors(tokens: &[String]) -> Split {
    let mut authors = Vec::new();
    let mut affiliations = Vec::new();

    if !tokens.iter().any(|t| is_marker(t)) {
        return (tokens.to_vec(), affiliations);
    }

    let max_index = tokens.len() - 1;
    let mut affiliations_start = max_index;
    let mut last_author = tokens[0].clone();
    authors.push(tokens[0].clone());

    for i in 1..=max_index {
        let s = &tokens[i];
        if let Some(marker) = marker_value(s) {
            // j runs from max_index - 1 down to i + 1
            for j in (i + 1..max_index).rev() {
                if marker_value(&tokens[j]) == Some(marker) {
                    affiliations.push((last_author.clone(), tokens[j + 1].clone()));
                    affiliations_start = affiliations_start.min(j + 1);
                    break;
                }
            }
        } else if i >= affiliations_start {
            break;
        } else {
            last_author = s.clone();
            authors.push(s.clone());
        }
    }

    (authors, affiliations)
}

/// "Surname Given Names" → "Surname, Given Names". Single-word names are returned unchanged.
pub fn to_bibtex_name(name: &str) -> String {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((surname, given)) if !given.trim().is_empty() => {
            format!("{}, {}", surname, given.trim())
        }
        _ => name.to_string(),
    }
}

/// First whitespace-separated word of a display name.
pub fn surname(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or("")
}
