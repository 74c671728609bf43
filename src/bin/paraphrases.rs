use addcos::ppdb::{Ppdb, SamePos};
use addcos::word_pos::{read_word_pos, to_str};

use clap::Parser;

const VERSION: &str = git_version::git_version!(args=["--tags", "--always", "--dirty"], fallback="unknown");

/// Dump scored PPDB paraphrase sets for a vocabulary of word_POS terms
#[derive(Parser, Debug)]
#[clap(author, version=VERSION, about)]
struct Args {
    /// PPDB lexical paraphrase file, plain text or gzipped
    ppdb: String,

    /// vocabulary file with one word_POS term per line; stdin when omitted
    #[clap(long)]
    vocab: Option<String>,

    /// score type to extract from each record
    #[clap(long, default_value = "PPDB2.0Score")]
    score: String,

    /// skip multi-word paraphrase phrases
    #[clap(long, default_value_t = false)]
    single_word: bool,

    /// also load paraphrases of paraphrases
    #[clap(long, default_value_t = false)]
    second_order: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut ppdb = Ppdb::new(&args.ppdb, &args.score, args.single_word);
    match &args.vocab {
        Some(vocabfile) => ppdb.read_vocabfile(vocabfile)?,
        None => {
            let mut vocab = Vec::new();
            for line in std::io::stdin().lines() {
                let unwrapped = line?;
                let term = unwrapped.trim();
                if term.is_empty() {
                    continue;
                }
                vocab.push(read_word_pos(term));
            }
            ppdb.set_vocab(vocab);
        },
    }

    ppdb.load_paraphrases(args.second_order, &SamePos)?;

    let mut keys: Vec<_> = ppdb.ppsets.keys().cloned().collect();
    keys.sort_by(|a, b| (&a.word, &a.pos).cmp(&(&b.word, &b.pos)));
    for wp in keys {
        let pdict = &ppdb.ppsets[&wp];
        let mut entries: Vec<_> = pdict.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (term, score) in entries {
            println!("{}\t{}\t{}", to_str(&wp), term, score);
        }
    }

    Ok(())
}
