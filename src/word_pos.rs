/// A (word, part-of-speech) pair, the key used wherever a word sense
/// must be disambiguated. The POS is always stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WordPos {
    pub word: String,
    pub pos: String,
}

impl WordPos {
    pub fn new(word: &str, pos: &str) -> WordPos {
        WordPos { word: word.to_string(), pos: pos.to_uppercase() }
    }
}

/// Split a string on a delimiter and return everything before the last
/// field together with the last field. A string that does not contain
/// the delimiter yields itself and an empty last field.
pub fn splitpop(s: &str, delimiter: char) -> (&str, &str) {
    match s.rfind(delimiter) {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

/// Parse a compound `word_POS` token. Only the last underscore separates
/// the POS, so words containing underscores survive intact. A token with
/// no underscore parses to an empty word with the whole token as POS.
pub fn read_word_pos(s: &str) -> WordPos {
    match s.rsplit_once('_') {
        Some((word, pos)) => WordPos::new(word, pos),
        None => WordPos::new("", s),
    }
}

pub fn to_str(wp: &WordPos) -> String {
    format!("{}_{}", wp.word, wp.pos)
}

/// Expand a `word.p` target (short POS code) into the compound form for
/// the most common full tag of that class, e.g. `running.v` -> `running_VB`.
pub fn get_base_form(word_dot_pos: &str) -> Result<String, Box<dyn std::error::Error>> {
    let (w, p) = splitpop(word_dot_pos, '.');
    let pos = match p {
        "n" => "NN",
        "r" => "RB",
        "j" | "a" => "JJ",
        "v" => "VB",
        other => return Err(format!("unknown POS code '{}' in target {}", other, word_dot_pos).into()),
    };
    Ok(format!("{}_{}", w, pos))
}
