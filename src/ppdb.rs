use regex::Regex;

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use crate::word_pos::{read_word_pos, WordPos};

/// One scored paraphrase record: the candidate term (multi-word phrases
/// joined with underscores) and one score per requested score type, in
/// request order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParaphraseEntry {
    pub term: String,
    pub scores: Vec<f32>,
}

/// Pluggable transform applied to a record's source word before it is
/// compared against the query vocabulary.
pub trait Lemmatizer {
    fn lemma(&self, word: &str) -> String;
}

/// Decides the word/POS key under which a first-order paraphrase is
/// looked up during second-order expansion.
pub trait ExpansionPolicy {
    fn expand(&self, source: &WordPos, candidate: &str) -> WordPos;
}

/// A paraphrase is assumed to keep its source's part of speech.
pub struct SamePos;

impl ExpansionPolicy for SamePos {
    fn expand(&self, source: &WordPos, candidate: &str) -> WordPos {
        WordPos { word: candidate.to_string(), pos: source.pos.clone() }
    }
}

const KNOWN_SCORES: &[&str] = &[
    "PPDB2.0Score",
    "PPDB1.0Score",
    "RarityPenalty",
    "AGigaSim",
    "GoogleNgramSim",
    "Independent",
];

/// Pattern matching `Name=<nonnegative decimal>` in a record's feature
/// string. Unknown names are a caller bug and fail hard.
fn score_pattern(name: &str) -> Result<Regex, Box<dyn std::error::Error>> {
    if !KNOWN_SCORES.contains(&name) {
        return Err(format!("unknown score type: {}", name).into());
    }
    Ok(Regex::new(&format!(r"{}=\d+[.\d]*", regex::escape(name)))?)
}

/// The fields of one `|||`-delimited database line that the scan cares
/// about. Lines with fewer than four fields parse to None.
struct Record<'a> {
    pos: String,
    word: &'a str,
    phrase: &'a str,
    feats: &'a str,
}

fn parse_record(line: &str) -> Option<Record> {
    let mut fields = line.split("|||");
    let pos = fields.next()?.trim().replace(['[', ']'], "");
    let word = fields.next()?.trim();
    let phrase = fields.next()?.trim();
    let feats = fields.next()?;
    Some(Record { pos, word, phrase, feats })
}

/// Extract the requested scores from a feature string; None when any
/// requested score is absent or its value does not parse.
fn extract_scores(patterns: &[Regex], feats: &str) -> Option<Vec<f32>> {
    patterns.iter()
        .map(|re| {
            let found = re.find(feats)?.as_str();
            let (_, val) = found.split_once('=')?;
            val.parse::<f32>().ok()
        })
        .collect()
}

/// Open a paraphrase database file for line-wise reading, transparently
/// decompressing when the path ends in `gz`.
pub fn open_ppdb(path: &str) -> Result<Box<dyn BufRead>, Box<dyn std::error::Error>> {
    let f = std::fs::File::open(path)?;
    if path.ends_with("gz") {
        Ok(Box::new(std::io::BufReader::new(flate2::read::GzDecoder::new(f))))
    } else {
        Ok(Box::new(std::io::BufReader::new(f)))
    }
}

/// Pull scored paraphrase lists for every word/POS in `wposlist` from the
/// database file `masterfile` in a single streaming pass.
///
/// Every queried WordPos gets an entry in the result, empty when nothing
/// matched. Output list order is file order; duplicate (query, term)
/// pairs from multiple lines are kept. Records missing a requested score
/// are skipped silently. An empty `scores` request yields entries with
/// empty score vectors; consumers that need a score drop those entries.
pub fn fetch_scored_pp_lists(
    wposlist: &[WordPos],
    masterfile: &str,
    scores: &[&str],
    singlewordonly: bool,
    lemmatizer: Option<&dyn Lemmatizer>,
) -> Result<HashMap<WordPos, Vec<ParaphraseEntry>>, Box<dyn std::error::Error>> {
    let patterns = scores.iter()
        .map(|s| score_pattern(s))
        .collect::<Result<Vec<_>, _>>()?;

    let mut pp_lists: HashMap<WordPos, Vec<ParaphraseEntry>> =
        wposlist.iter().map(|wp| (wp.clone(), Vec::new())).collect();

    eprintln!("fetching scored paraphrases from {}...", masterfile);
    let fin = open_ppdb(masterfile)?;
    for line in fin.lines() {
        let line = line?;
        let rec = match parse_record(&line) {
            Some(r) => r,
            None => continue,
        };
        if singlewordonly && rec.phrase.split_whitespace().nth(1).is_some() {
            continue;
        }
        let word = match lemmatizer {
            Some(lem) => lem.lemma(rec.word),
            None => rec.word.to_string(),
        };
        let key = WordPos::new(&word, &rec.pos);
        let list = match pp_lists.get_mut(&key) {
            Some(l) => l,
            None => continue,
        };
        let scorevec = match extract_scores(&patterns, rec.feats) {
            Some(v) => v,
            None => continue,
        };
        let term = rec.phrase.split_whitespace().collect::<Vec<_>>().join("_");
        list.push(ParaphraseEntry { term, scores: scorevec });
    }
    Ok(pp_lists)
}

/// Sets of PPDB paraphrases for a vocabulary of word/POS terms, flattened
/// to a single chosen score type, optionally expanded to second order
/// (paraphrases of paraphrases).
pub struct Ppdb {
    pub ppdbfile: String,
    pub ppsets: HashMap<WordPos, HashMap<String, f32>>,
    pub vocab: HashSet<WordPos>,
    pub scoretype: String,
    pub singleword: bool,
    pub lemmatizer: Option<Box<dyn Lemmatizer>>,
}

impl Ppdb {
    pub fn new(ppdbfile: &str, score: &str, singleword: bool) -> Ppdb {
        Ppdb {
            ppdbfile: ppdbfile.to_string(),
            ppsets: HashMap::new(),
            vocab: HashSet::new(),
            scoretype: score.to_string(),
            singleword,
            lemmatizer: None,
        }
    }

    pub fn set_vocab<I: IntoIterator<Item = WordPos>>(&mut self, vocab: I) {
        self.vocab = vocab.into_iter().collect();
    }

    /// Vocabulary file: one `word_POS` term per line.
    pub fn read_vocabfile(&mut self, vocabfile: &str) -> Result<(), Box<dyn std::error::Error>> {
        let fin = std::io::BufReader::new(std::fs::File::open(vocabfile)?);
        let mut vocab = HashSet::new();
        for line in fin.lines() {
            let line = line?;
            let term = line.trim();
            if term.is_empty() {
                continue;
            }
            vocab.insert(read_word_pos(term));
        }
        self.vocab = vocab;
        Ok(())
    }

    /// Load paraphrase sets for the configured vocabulary, collapsing
    /// each candidate list to candidate -> score (last seen wins). With
    /// `secondorder`, every first-order candidate is queried again under
    /// the key chosen by `policy`, and second-order entries overwrite
    /// colliding first-order keys.
    pub fn load_paraphrases(&mut self, secondorder: bool, policy: &dyn ExpansionPolicy)
            -> Result<(), Box<dyn std::error::Error>> {
        if self.vocab.is_empty() {
            eprintln!("vocab is zero-length; load vocab before calling load_paraphrases");
            return Ok(());
        }
        eprintln!("loading paraphrases for {} vocabulary terms...", self.vocab.len());
        let vocab: Vec<WordPos> = self.vocab.iter().cloned().collect();
        let firstorder = self.fetch(&vocab)?;
        self.ppsets = collapse(firstorder);

        if secondorder {
            let expanded: HashSet<WordPos> = self.ppsets.iter()
                .flat_map(|(wp, pdict)| {
                    pdict.keys().map(move |pp| policy.expand(wp, pp))
                })
                .collect();
            let expanded: Vec<WordPos> = expanded.into_iter().collect();
            let secondorderppsets = collapse(self.fetch(&expanded)?);
            self.ppsets.extend(secondorderppsets);
        }
        eprintln!("done");
        Ok(())
    }

    /// Paraphrase sets for a word/POS, empty when none were found.
    pub fn paraphrases(&self, wp: &WordPos) -> Option<&HashMap<String, f32>> {
        self.ppsets.get(wp)
    }

    fn fetch(&self, queries: &[WordPos])
            -> Result<HashMap<WordPos, Vec<ParaphraseEntry>>, Box<dyn std::error::Error>> {
        fetch_scored_pp_lists(queries, &self.ppdbfile, &[self.scoretype.as_str()],
                              self.singleword, self.lemmatizer.as_deref())
    }
}

fn collapse(pplists: HashMap<WordPos, Vec<ParaphraseEntry>>)
        -> HashMap<WordPos, HashMap<String, f32>> {
    pplists.into_iter()
        .map(|(wp, entries)| {
            let pdict = entries.into_iter()
                .filter_map(|e| e.scores.first().copied().map(|s| (e.term, s)))
                .collect();
            (wp, pdict)
        })
        .collect()
}
