use std::io::BufRead;

/// One tagged sentence with a marked target word, as read from the
/// tab-separated instance file: `target.P \t id \t index \t tokens`.
/// Tokens are compound `word_POS` strings.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceInstance {
    /// target with short POS code, e.g. `bug.n`
    pub target: String,
    pub id: i64,
    pub index: usize,
    pub toks: Vec<String>,
}

impl SentenceInstance {
    /// The tagged token at the target index.
    pub fn orig_target(&self) -> &str {
        &self.toks[self.index]
    }
}

/// Read word-in-context instances from a tab-separated file. Blank lines
/// and lines without a tab are skipped; a non-integer id or index is a
/// hard error.
pub fn read_semeval_tsv(filename: &str) -> Result<Vec<SentenceInstance>, Box<dyn std::error::Error>> {
    let fin = std::io::BufReader::new(std::fs::File::open(filename)?);
    let mut instances = Vec::new();
    for line in fin.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || !line.contains('\t') {
            continue;
        }
        let fields: Vec<&str> = line.splitn(4, '\t').collect();
        if fields.len() != 4 {
            return Err(format!("bad instance line: {}", line).into());
        }
        instances.push(SentenceInstance {
            target: fields[0].to_string(),
            id: fields[1].parse::<i64>()?,
            index: fields[2].parse::<usize>()?,
            toks: fields[3].split_whitespace().map(|t| t.to_string()).collect(),
        });
    }
    Ok(instances)
}
